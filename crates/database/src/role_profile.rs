//! Role extension storage: entrepreneur and investor attribute sets.
//!
//! Each profile gets at most one extension, and only for its own role. All
//! role-specific dispatch happens on the `Profile.role` tag explicitly.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{EntrepreneurProfile, InvestorProfile, Profile, Role};
use crate::validation::{validate_text, MAX_TITLE_LENGTH};

/// Attributes of an entrepreneur extension.
#[derive(Debug, Clone, Default)]
pub struct EntrepreneurAttrs {
    pub startup_name: String,
    pub business_description: Option<String>,
    pub industry: Option<String>,
    pub funding_stage: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

/// Attributes of an investor extension.
#[derive(Debug, Clone, Default)]
pub struct InvestorAttrs {
    pub investment_preferences: Option<String>,
    pub industry_focus: Option<String>,
    pub funding_capacity: Option<String>,
    pub location: Option<String>,
}

async fn require_role(pool: &SqlitePool, profile_id: i64, role: Role) -> Result<()> {
    let profile = crate::profile::get_profile(pool, profile_id).await?;
    if profile.role != role {
        return Err(DatabaseError::InvalidState {
            entity: "Profile",
            id: profile_id.to_string(),
            state: format!("a {}, not a {}", profile.role.as_str(), role.as_str()),
        });
    }
    Ok(())
}

/// Create the entrepreneur extension for a profile.
pub async fn create_entrepreneur_profile(
    pool: &SqlitePool,
    profile_id: i64,
    attrs: &EntrepreneurAttrs,
) -> Result<EntrepreneurProfile> {
    validate_text("startup_name", &attrs.startup_name, MAX_TITLE_LENGTH)?;
    require_role(pool, profile_id, Role::Entrepreneur).await?;

    sqlx::query(
        r#"
        INSERT INTO entrepreneur_profiles
            (profile_id, startup_name, business_description, industry,
             funding_stage, location, website)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(profile_id)
    .bind(attrs.startup_name.trim())
    .bind(&attrs.business_description)
    .bind(&attrs.industry)
    .bind(&attrs.funding_stage)
    .bind(&attrs.location)
    .bind(&attrs.website)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "EntrepreneurProfile",
                    id: profile_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_entrepreneur_profile(pool, profile_id).await
}

/// Create the investor extension for a profile.
pub async fn create_investor_profile(
    pool: &SqlitePool,
    profile_id: i64,
    attrs: &InvestorAttrs,
) -> Result<InvestorProfile> {
    require_role(pool, profile_id, Role::Investor).await?;

    sqlx::query(
        r#"
        INSERT INTO investor_profiles
            (profile_id, investment_preferences, industry_focus,
             funding_capacity, location)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(profile_id)
    .bind(&attrs.investment_preferences)
    .bind(&attrs.industry_focus)
    .bind(&attrs.funding_capacity)
    .bind(&attrs.location)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "InvestorProfile",
                    id: profile_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_investor_profile(pool, profile_id).await
}

/// Get the entrepreneur extension for a profile.
pub async fn get_entrepreneur_profile(
    pool: &SqlitePool,
    profile_id: i64,
) -> Result<EntrepreneurProfile> {
    sqlx::query_as::<_, EntrepreneurProfile>(
        r#"
        SELECT id, profile_id, startup_name, business_description, industry,
               funding_stage, location, website, created_at, updated_at
        FROM entrepreneur_profiles
        WHERE profile_id = ?
        "#,
    )
    .bind(profile_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "EntrepreneurProfile",
        id: profile_id.to_string(),
    })
}

/// Get the investor extension for a profile.
pub async fn get_investor_profile(pool: &SqlitePool, profile_id: i64) -> Result<InvestorProfile> {
    sqlx::query_as::<_, InvestorProfile>(
        r#"
        SELECT id, profile_id, investment_preferences, industry_focus,
               funding_capacity, location, created_at, updated_at
        FROM investor_profiles
        WHERE profile_id = ?
        "#,
    )
    .bind(profile_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "InvestorProfile",
        id: profile_id.to_string(),
    })
}

/// Update the entrepreneur extension for a profile.
pub async fn update_entrepreneur_profile(
    pool: &SqlitePool,
    profile_id: i64,
    attrs: &EntrepreneurAttrs,
) -> Result<EntrepreneurProfile> {
    validate_text("startup_name", &attrs.startup_name, MAX_TITLE_LENGTH)?;

    let result = sqlx::query(
        r#"
        UPDATE entrepreneur_profiles
        SET startup_name = ?, business_description = ?, industry = ?,
            funding_stage = ?, location = ?, website = ?,
            updated_at = datetime('now')
        WHERE profile_id = ?
        "#,
    )
    .bind(attrs.startup_name.trim())
    .bind(&attrs.business_description)
    .bind(&attrs.industry)
    .bind(&attrs.funding_stage)
    .bind(&attrs.location)
    .bind(&attrs.website)
    .bind(profile_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "EntrepreneurProfile",
            id: profile_id.to_string(),
        });
    }

    get_entrepreneur_profile(pool, profile_id).await
}

/// Update the investor extension for a profile.
pub async fn update_investor_profile(
    pool: &SqlitePool,
    profile_id: i64,
    attrs: &InvestorAttrs,
) -> Result<InvestorProfile> {
    let result = sqlx::query(
        r#"
        UPDATE investor_profiles
        SET investment_preferences = ?, industry_focus = ?,
            funding_capacity = ?, location = ?, updated_at = datetime('now')
        WHERE profile_id = ?
        "#,
    )
    .bind(&attrs.investment_preferences)
    .bind(&attrs.industry_focus)
    .bind(&attrs.funding_capacity)
    .bind(&attrs.location)
    .bind(profile_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "InvestorProfile",
            id: profile_id.to_string(),
        });
    }

    get_investor_profile(pool, profile_id).await
}

/// Extract the matching attributes (industry-like field, location) for a
/// profile, dispatching on its role tag. Missing extensions yield `None`s.
pub async fn matching_attributes(
    pool: &SqlitePool,
    profile: &Profile,
) -> Result<(Option<String>, Option<String>)> {
    let attrs = match profile.role {
        Role::Entrepreneur => sqlx::query_as::<_, (Option<String>, Option<String>)>(
            r#"
            SELECT industry, location
            FROM entrepreneur_profiles
            WHERE profile_id = ?
            "#,
        )
        .bind(profile.id)
        .fetch_optional(pool)
        .await?,
        Role::Investor => sqlx::query_as::<_, (Option<String>, Option<String>)>(
            r#"
            SELECT industry_focus, location
            FROM investor_profiles
            WHERE profile_id = ?
            "#,
        )
        .bind(profile.id)
        .fetch_optional(pool)
        .await?,
    };

    Ok(attrs.unwrap_or((None, None)))
}
