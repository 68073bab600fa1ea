//! Pitch videos and view accounting.
//!
//! The binary itself lives in external object storage; this module persists
//! the reference plus the view counter and the raw view-event logs.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Video;
use crate::validation::{clamp_limit, clamp_offset, validate_text, validate_video_upload, MAX_TITLE_LENGTH};

const VIDEO_COLUMNS: &str = "id, profile_id, title, description, video_url, thumbnail_url, \
                             duration, views_count, created_at, updated_at";

/// Declared metadata of an upload already placed in object storage.
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    /// Duration in seconds, if known.
    pub duration: Option<i64>,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Editable fields of an existing video.
#[derive(Debug, Clone, Default)]
pub struct VideoEdits {
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Get a video by ID.
pub async fn get_video(pool: &SqlitePool, id: i64) -> Result<Video> {
    sqlx::query_as::<_, Video>(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Video",
            id: id.to_string(),
        })
}

/// Persist a video row after validating the declared upload metadata.
pub async fn create_video(pool: &SqlitePool, profile_id: i64, upload: &VideoUpload) -> Result<Video> {
    validate_video_upload(
        &upload.title,
        &upload.video_url,
        &upload.mime_type,
        upload.size_bytes,
    )?;
    crate::profile::get_profile(pool, profile_id).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO videos (profile_id, title, description, video_url, thumbnail_url, duration)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(profile_id)
    .bind(upload.title.trim())
    .bind(&upload.description)
    .bind(upload.video_url.trim())
    .bind(&upload.thumbnail_url)
    .bind(upload.duration)
    .execute(pool)
    .await?;

    tracing::debug!(profile_id, video_id = result.last_insert_rowid(), "video created");

    get_video(pool, result.last_insert_rowid()).await
}

/// List a profile's videos, newest first.
pub async fn list_videos(
    pool: &SqlitePool,
    profile_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Video>> {
    let limit = clamp_limit(limit, 20);
    let offset = clamp_offset(offset);

    let videos = sqlx::query_as::<_, Video>(&format!(
        r#"
        SELECT {VIDEO_COLUMNS}
        FROM videos
        WHERE profile_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(profile_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(videos)
}

/// Edit a video's metadata; only the owner may.
pub async fn update_video(
    pool: &SqlitePool,
    video_id: i64,
    acting_profile_id: i64,
    edits: &VideoEdits,
) -> Result<Video> {
    validate_text("title", &edits.title, MAX_TITLE_LENGTH)?;

    let video = get_video(pool, video_id).await?;
    if video.profile_id != acting_profile_id {
        return Err(DatabaseError::Forbidden {
            entity: "Video",
            id: video_id.to_string(),
        });
    }

    sqlx::query(
        r#"
        UPDATE videos
        SET title = ?, description = ?, thumbnail_url = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(edits.title.trim())
    .bind(&edits.description)
    .bind(&edits.thumbnail_url)
    .bind(video_id)
    .execute(pool)
    .await?;

    get_video(pool, video_id).await
}

/// Delete a video; only the owner may.
pub async fn delete_video(pool: &SqlitePool, video_id: i64, acting_profile_id: i64) -> Result<()> {
    let video = get_video(pool, video_id).await?;
    if video.profile_id != acting_profile_id {
        return Err(DatabaseError::Forbidden {
            entity: "Video",
            id: video_id.to_string(),
        });
    }

    sqlx::query("DELETE FROM videos WHERE id = ?")
        .bind(video_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Resolve a claimed viewer to an existing profile id, or record anonymously.
async fn resolve_viewer(pool: &SqlitePool, viewer_profile_id: Option<i64>) -> Result<Option<i64>> {
    let Some(id) = viewer_profile_id else {
        return Ok(None);
    };
    let exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM profiles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(exists.map(|_| id))
}

/// Record one view of a video.
///
/// The counter bump is an in-database increment and commits together with
/// the event row, so concurrent viewers can never lose an update and the
/// counter always equals the number of recorded events.
pub async fn record_video_view(
    pool: &SqlitePool,
    video_id: i64,
    viewer_profile_id: Option<i64>,
) -> Result<()> {
    let viewer = resolve_viewer(pool, viewer_profile_id).await?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE videos SET views_count = views_count + 1 WHERE id = ?")
        .bind(video_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Video",
            id: video_id.to_string(),
        });
    }

    sqlx::query("INSERT INTO video_views (video_id, viewer_id) VALUES (?, ?)")
        .bind(video_id)
        .bind(viewer)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Record one view of a profile page.
pub async fn record_profile_view(
    pool: &SqlitePool,
    viewed_profile_id: i64,
    viewer_profile_id: Option<i64>,
) -> Result<()> {
    crate::profile::get_profile(pool, viewed_profile_id).await?;
    let viewer = resolve_viewer(pool, viewer_profile_id).await?;

    sqlx::query("INSERT INTO profile_views (viewed_profile_id, viewer_id) VALUES (?, ?)")
        .bind(viewed_profile_id)
        .bind(viewer)
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::test_support::{seed_profile, test_db};

    fn upload(title: &str) -> VideoUpload {
        VideoUpload {
            title: title.to_string(),
            description: None,
            video_url: "https://storage.example/pitch.mp4".to_string(),
            thumbnail_url: None,
            duration: Some(90),
            mime_type: "video/mp4".to_string(),
            size_bytes: 10 * 1024 * 1024,
        }
    }

    #[tokio::test]
    async fn test_create_validates_upload() {
        let db = test_db().await;
        let pool = db.pool();
        let owner = seed_profile(pool, "owner", Role::Entrepreneur).await;

        let video = create_video(pool, owner.id, &upload("My pitch")).await.unwrap();
        assert_eq!(video.views_count, 0);
        assert_eq!(video.title, "My pitch");

        let mut bad = upload("My pitch");
        bad.mime_type = "application/pdf".to_string();
        assert!(matches!(
            create_video(pool, owner.id, &bad).await,
            Err(DatabaseError::Validation(_))
        ));

        let mut huge = upload("My pitch");
        huge.size_bytes = 600 * 1024 * 1024;
        assert!(matches!(
            create_video(pool, owner.id, &huge).await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_owner_only_mutations() {
        let db = test_db().await;
        let pool = db.pool();
        let owner = seed_profile(pool, "owner", Role::Entrepreneur).await;
        let other = seed_profile(pool, "other", Role::Investor).await;

        let video = create_video(pool, owner.id, &upload("My pitch")).await.unwrap();

        let edits = VideoEdits {
            title: "Renamed".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            update_video(pool, video.id, other.id, &edits).await,
            Err(DatabaseError::Forbidden { .. })
        ));
        assert!(matches!(
            delete_video(pool, video.id, other.id).await,
            Err(DatabaseError::Forbidden { .. })
        ));

        let renamed = update_video(pool, video.id, owner.id, &edits).await.unwrap();
        assert_eq!(renamed.title, "Renamed");

        delete_video(pool, video.id, owner.id).await.unwrap();
        assert!(matches!(
            get_video(pool, video.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_view_count_matches_event_rows() {
        let db = test_db().await;
        let pool = db.pool();
        let owner = seed_profile(pool, "owner", Role::Entrepreneur).await;
        let viewer = seed_profile(pool, "viewer", Role::Investor).await;

        let video = create_video(pool, owner.id, &upload("My pitch")).await.unwrap();

        for _ in 0..5 {
            record_video_view(pool, video.id, Some(viewer.id)).await.unwrap();
        }
        record_video_view(pool, video.id, None).await.unwrap();

        let video = get_video(pool, video.id).await.unwrap();
        assert_eq!(video.views_count, 6);

        let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM video_views WHERE video_id = ?")
            .bind(video.id)
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(events, 6);
    }

    #[tokio::test]
    async fn test_view_of_missing_video_writes_nothing() {
        let db = test_db().await;
        let pool = db.pool();
        seed_profile(pool, "owner", Role::Entrepreneur).await;

        assert!(matches!(
            record_video_view(pool, 9999, None).await,
            Err(DatabaseError::NotFound { .. })
        ));
        let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM video_views")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(events, 0);
    }

    #[tokio::test]
    async fn test_unknown_viewer_falls_back_to_anonymous() {
        let db = test_db().await;
        let pool = db.pool();
        let owner = seed_profile(pool, "owner", Role::Entrepreneur).await;
        let video = create_video(pool, owner.id, &upload("My pitch")).await.unwrap();

        record_video_view(pool, video.id, Some(9999)).await.unwrap();

        let viewer: Option<i64> =
            sqlx::query_scalar("SELECT viewer_id FROM video_views WHERE video_id = ?")
                .bind(video.id)
                .fetch_one(pool)
                .await
                .unwrap();
        assert_eq!(viewer, None);
    }
}
