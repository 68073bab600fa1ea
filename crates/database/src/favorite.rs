//! Favorites: one-directional profile bookmarks.

use sqlx::{FromRow, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{Favorite, FavoriteWithProfile, NotificationPayload, ProfileSummary, Role};
use crate::notification::insert_notification;
use crate::validation::{clamp_limit, clamp_offset, ValidationError};

const FAVORITE_COLUMNS: &str = "id, profile_id, favorited_profile_id, created_at";

/// Get a favorite by ID.
pub async fn get_favorite(pool: &SqlitePool, id: i64) -> Result<Favorite> {
    sqlx::query_as::<_, Favorite>(&format!(
        "SELECT {FAVORITE_COLUMNS} FROM favorites WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Favorite",
        id: id.to_string(),
    })
}

/// Bookmark another profile and notify it.
///
/// The pair is ordered: A favoriting B says nothing about B favoriting A.
pub async fn add_favorite(
    pool: &SqlitePool,
    profile_id: i64,
    favorited_profile_id: i64,
) -> Result<Favorite> {
    if profile_id == favorited_profile_id {
        return Err(ValidationError::SelfReference("favorite").into());
    }

    crate::profile::get_profile(pool, favorited_profile_id).await?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO favorites (profile_id, favorited_profile_id)
        VALUES (?, ?)
        "#,
    )
    .bind(profile_id)
    .bind(favorited_profile_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Favorite",
                    id: format!("{}/{}", profile_id, favorited_profile_id),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;
    let favorite_id = result.last_insert_rowid();

    insert_notification(
        &mut tx,
        favorited_profile_id,
        NotificationPayload::Favorite { favorite_id },
        "Someone added your profile to their favorites",
    )
    .await?;

    tx.commit().await?;

    get_favorite(pool, favorite_id).await
}

/// Remove a favorite; only its owner may.
pub async fn remove_favorite(
    pool: &SqlitePool,
    favorite_id: i64,
    acting_profile_id: i64,
) -> Result<()> {
    let favorite = get_favorite(pool, favorite_id).await?;
    if favorite.profile_id != acting_profile_id {
        return Err(DatabaseError::Forbidden {
            entity: "Favorite",
            id: favorite_id.to_string(),
        });
    }

    sqlx::query("DELETE FROM favorites WHERE id = ?")
        .bind(favorite_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[derive(FromRow)]
struct FavoritePeerRow {
    id: i64,
    profile_id: i64,
    favorited_profile_id: i64,
    created_at: String,
    peer_id: i64,
    peer_role: Role,
    peer_profile_picture: Option<String>,
    peer_bio: Option<String>,
    peer_created_at: String,
}

/// List a profile's favorites, newest first, enriched with the bookmarked
/// profile's summary.
pub async fn list_favorites(
    pool: &SqlitePool,
    profile_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<FavoriteWithProfile>> {
    let limit = clamp_limit(limit, 20);
    let offset = clamp_offset(offset);

    let rows = sqlx::query_as::<_, FavoritePeerRow>(
        r#"
        SELECT f.id, f.profile_id, f.favorited_profile_id, f.created_at,
               p.id AS peer_id, p.role AS peer_role,
               p.profile_picture AS peer_profile_picture,
               p.bio AS peer_bio, p.created_at AS peer_created_at
        FROM favorites f
        INNER JOIN profiles p ON p.id = f.favorited_profile_id
        WHERE f.profile_id = ?
        ORDER BY f.created_at DESC, f.id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(profile_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| FavoriteWithProfile {
            favorite: Favorite {
                id: row.id,
                profile_id: row.profile_id,
                favorited_profile_id: row.favorited_profile_id,
                created_at: row.created_at,
            },
            profile: ProfileSummary {
                id: row.peer_id,
                role: row.peer_role,
                profile_picture: row.peer_profile_picture,
                bio: row.peer_bio,
                created_at: row.peer_created_at,
            },
        })
        .collect())
}

/// Whether `profile_id` has favorited `other_profile_id`.
pub async fn is_favorited(
    pool: &SqlitePool,
    profile_id: i64,
    other_profile_id: i64,
) -> Result<bool> {
    let row = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1 FROM favorites
        WHERE profile_id = ? AND favorited_profile_id = ?
        "#,
    )
    .bind(profile_id)
    .bind(other_profile_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}
