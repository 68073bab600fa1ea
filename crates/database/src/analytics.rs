//! Read-side analytics aggregation over the raw event logs.

use sqlx::{FromRow, SqlitePool};

use crate::error::Result;
use crate::models::{ProfileStats, ProfileSummary, RecentProfileView, Role};

/// Time window for view aggregation. Connection and video totals are
/// deliberately not window-filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    Days7,
    Days30,
    #[default]
    All,
}

impl Window {
    /// Parse a window from user input (`7d`, `30d`, `all`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "7d" => Some(Window::Days7),
            "30d" => Some(Window::Days30),
            "all" => Some(Window::All),
            _ => None,
        }
    }

    /// SQLite datetime modifier for the window's lower bound, if bounded.
    fn modifier(&self) -> Option<&'static str> {
        match self {
            Window::Days7 => Some("-7 days"),
            Window::Days30 => Some("-30 days"),
            Window::All => None,
        }
    }
}

async fn count_profile_views(
    pool: &SqlitePool,
    profile_id: i64,
    window: Window,
) -> Result<i64> {
    let count = match window.modifier() {
        Some(modifier) => {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM profile_views
                WHERE viewed_profile_id = ? AND created_at >= datetime('now', ?)
                "#,
            )
            .bind(profile_id)
            .bind(modifier)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM profile_views WHERE viewed_profile_id = ?",
            )
            .bind(profile_id)
            .fetch_one(pool)
            .await?
        }
    };

    Ok(count)
}

#[derive(FromRow)]
struct RecentViewRow {
    viewed_at: String,
    viewer_id: Option<i64>,
    viewer_role: Option<Role>,
    viewer_profile_picture: Option<String>,
    viewer_bio: Option<String>,
    viewer_created_at: Option<String>,
}

async fn recent_profile_views(
    pool: &SqlitePool,
    profile_id: i64,
    window: Window,
) -> Result<Vec<RecentProfileView>> {
    let base = r#"
        SELECT pv.created_at AS viewed_at,
               p.id AS viewer_id, p.role AS viewer_role,
               p.profile_picture AS viewer_profile_picture,
               p.bio AS viewer_bio, p.created_at AS viewer_created_at
        FROM profile_views pv
        LEFT JOIN profiles p ON p.id = pv.viewer_id
        WHERE pv.viewed_profile_id = ?
    "#;
    let tail = "ORDER BY pv.created_at DESC, pv.id DESC LIMIT 10";

    let rows = match window.modifier() {
        Some(modifier) => {
            sqlx::query_as::<_, RecentViewRow>(&format!(
                "{base} AND pv.created_at >= datetime('now', ?) {tail}"
            ))
            .bind(profile_id)
            .bind(modifier)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, RecentViewRow>(&format!("{base} {tail}"))
                .bind(profile_id)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows
        .into_iter()
        .map(|row| RecentProfileView {
            viewed_at: row.viewed_at,
            viewer: match (row.viewer_id, row.viewer_role, row.viewer_created_at) {
                (Some(id), Some(role), Some(created_at)) => Some(ProfileSummary {
                    id,
                    role,
                    profile_picture: row.viewer_profile_picture,
                    bio: row.viewer_bio,
                    created_at,
                }),
                _ => None,
            },
        })
        .collect())
}

/// Aggregate a profile's analytics for the given window.
pub async fn profile_stats(
    pool: &SqlitePool,
    profile_id: i64,
    window: Window,
) -> Result<ProfileStats> {
    crate::profile::get_profile(pool, profile_id).await?;

    let total_profile_views = count_profile_views(pool, profile_id, window).await?;

    let total_connections = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM connections
        WHERE (requester_id = ?1 OR recipient_id = ?1) AND status = 'accepted'
        "#,
    )
    .bind(profile_id)
    .fetch_one(pool)
    .await?;

    let pending_connection_requests = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM connections
        WHERE recipient_id = ? AND status = 'pending'
        "#,
    )
    .bind(profile_id)
    .fetch_one(pool)
    .await?;

    let total_video_uploads =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM videos WHERE profile_id = ?")
            .bind(profile_id)
            .fetch_one(pool)
            .await?;

    let total_video_views = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(views_count), 0) FROM videos WHERE profile_id = ?",
    )
    .bind(profile_id)
    .fetch_one(pool)
    .await?;

    let favorited_by_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM favorites WHERE favorited_profile_id = ?",
    )
    .bind(profile_id)
    .fetch_one(pool)
    .await?;

    let recent = recent_profile_views(pool, profile_id, window).await?;

    Ok(ProfileStats {
        total_profile_views,
        total_connections,
        pending_connection_requests,
        total_video_uploads,
        total_video_views,
        favorited_by_count,
        recent_profile_views: recent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{request_connection, respond_to_connection};
    use crate::favorite::add_favorite;
    use crate::models::{ConnectionDecision, Role};
    use crate::test_support::{seed_profile, test_db};
    use crate::video::{create_video, record_profile_view, record_video_view, VideoUpload};

    #[test]
    fn test_window_parse() {
        assert_eq!(Window::parse("7d"), Some(Window::Days7));
        assert_eq!(Window::parse("30D"), Some(Window::Days30));
        assert_eq!(Window::parse("all"), Some(Window::All));
        assert_eq!(Window::parse("90d"), None);
    }

    #[tokio::test]
    async fn test_profile_stats_aggregation() {
        let db = test_db().await;
        let pool = db.pool();
        let subject = seed_profile(pool, "subject", Role::Entrepreneur).await;
        let fan = seed_profile(pool, "fan", Role::Investor).await;
        let pending = seed_profile(pool, "pending", Role::Investor).await;

        // One accepted connection, one pending request aimed at the subject.
        let accepted = request_connection(pool, subject.id, fan.id).await.unwrap();
        respond_to_connection(pool, accepted.id, fan.id, ConnectionDecision::Accept)
            .await
            .unwrap();
        request_connection(pool, pending.id, subject.id).await.unwrap();

        add_favorite(pool, fan.id, subject.id).await.unwrap();

        let video = create_video(
            pool,
            subject.id,
            &VideoUpload {
                title: "Pitch".to_string(),
                description: None,
                video_url: "https://storage.example/pitch.mp4".to_string(),
                thumbnail_url: None,
                duration: None,
                mime_type: "video/mp4".to_string(),
                size_bytes: 1024,
            },
        )
        .await
        .unwrap();
        record_video_view(pool, video.id, Some(fan.id)).await.unwrap();
        record_video_view(pool, video.id, None).await.unwrap();

        record_profile_view(pool, subject.id, Some(fan.id)).await.unwrap();
        record_profile_view(pool, subject.id, None).await.unwrap();

        let stats = profile_stats(pool, subject.id, Window::All).await.unwrap();
        assert_eq!(stats.total_profile_views, 2);
        assert_eq!(stats.total_connections, 1);
        assert_eq!(stats.pending_connection_requests, 1);
        assert_eq!(stats.total_video_uploads, 1);
        assert_eq!(stats.total_video_views, 2);
        assert_eq!(stats.favorited_by_count, 1);

        assert_eq!(stats.recent_profile_views.len(), 2);
        // Newest first; the anonymous event carries no viewer.
        assert!(stats.recent_profile_views[0].viewer.is_none());
        assert_eq!(
            stats.recent_profile_views[1].viewer.as_ref().map(|v| v.id),
            Some(fan.id)
        );
    }

    #[tokio::test]
    async fn test_windowed_views_exclude_old_events() {
        let db = test_db().await;
        let pool = db.pool();
        let subject = seed_profile(pool, "subject", Role::Entrepreneur).await;

        record_profile_view(pool, subject.id, None).await.unwrap();
        // Backdate one event beyond both windows.
        sqlx::query(
            r#"
            INSERT INTO profile_views (viewed_profile_id, viewer_id, created_at)
            VALUES (?, NULL, datetime('now', '-40 days'))
            "#,
        )
        .bind(subject.id)
        .execute(pool)
        .await
        .unwrap();

        let all = profile_stats(pool, subject.id, Window::All).await.unwrap();
        assert_eq!(all.total_profile_views, 2);
        assert_eq!(all.recent_profile_views.len(), 2);

        let week = profile_stats(pool, subject.id, Window::Days7).await.unwrap();
        assert_eq!(week.total_profile_views, 1);
        assert_eq!(week.recent_profile_views.len(), 1);

        let month = profile_stats(pool, subject.id, Window::Days30)
            .await
            .unwrap();
        assert_eq!(month.total_profile_views, 1);
    }
}
