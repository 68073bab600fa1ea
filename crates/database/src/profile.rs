//! Profile CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Profile, Role};
use crate::validation::{clamp_limit, clamp_offset};

const PROFILE_COLUMNS: &str = "id, user_id, role, profile_picture, bio, created_at, updated_at";

/// Create a profile for an external identity.
///
/// Exactly one profile may exist per identity.
pub async fn create_profile(
    pool: &SqlitePool,
    user_id: &str,
    role: Role,
    profile_picture: Option<&str>,
    bio: Option<&str>,
) -> Result<Profile> {
    let result = sqlx::query(
        r#"
        INSERT INTO profiles (user_id, role, profile_picture, bio)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(role)
    .bind(profile_picture)
    .bind(bio)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Profile",
                    id: user_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    tracing::debug!(user_id, role = role.as_str(), "created profile");

    get_profile(pool, result.last_insert_rowid()).await
}

/// Get a profile by ID.
pub async fn get_profile(pool: &SqlitePool, id: i64) -> Result<Profile> {
    sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Profile",
        id: id.to_string(),
    })
}

/// Resolve the profile owned by an external identity.
///
/// This is the caller-resolution step every authenticated operation starts
/// from; the acting profile is always threaded in explicitly from here.
pub async fn get_profile_by_user(pool: &SqlitePool, user_id: &str) -> Result<Profile> {
    sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Profile",
        id: user_id.to_string(),
    })
}

/// Update the self-service fields of a profile.
pub async fn update_profile(
    pool: &SqlitePool,
    id: i64,
    profile_picture: Option<&str>,
    bio: Option<&str>,
) -> Result<Profile> {
    let result = sqlx::query(
        r#"
        UPDATE profiles
        SET profile_picture = ?, bio = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(profile_picture)
    .bind(bio)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Profile",
            id: id.to_string(),
        });
    }

    get_profile(pool, id).await
}

/// Change a profile's role.
///
/// Refused once a role extension exists for the profile, so extension data
/// can never be orphaned by a role flip.
pub async fn change_role(pool: &SqlitePool, id: i64, new_role: Role) -> Result<Profile> {
    let profile = get_profile(pool, id).await?;
    if profile.role == new_role {
        return Ok(profile);
    }

    if has_role_extension(pool, id).await? {
        return Err(DatabaseError::InvalidState {
            entity: "Profile",
            id: id.to_string(),
            state: "already extended with role-specific data".to_string(),
        });
    }

    sqlx::query(
        r#"
        UPDATE profiles
        SET role = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(new_role)
    .bind(id)
    .execute(pool)
    .await?;

    get_profile(pool, id).await
}

/// List profiles, optionally filtered by role.
pub async fn list_profiles(
    pool: &SqlitePool,
    role: Option<Role>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Profile>> {
    let limit = clamp_limit(limit, 20);
    let offset = clamp_offset(offset);

    let profiles = match role {
        Some(role) => {
            sqlx::query_as::<_, Profile>(&format!(
                r#"
                SELECT {PROFILE_COLUMNS}
                FROM profiles
                WHERE role = ?
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#
            ))
            .bind(role)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Profile>(&format!(
                r#"
                SELECT {PROFILE_COLUMNS}
                FROM profiles
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(profiles)
}

/// Whether any role extension row exists for the profile.
pub(crate) async fn has_role_extension(pool: &SqlitePool, profile_id: i64) -> Result<bool> {
    let row = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1 FROM entrepreneur_profiles WHERE profile_id = ?
        UNION
        SELECT 1 FROM investor_profiles WHERE profile_id = ?
        LIMIT 1
        "#,
    )
    .bind(profile_id)
    .bind(profile_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}
