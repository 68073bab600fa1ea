//! Notification feed: append-only events with a read flag.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{Notification, NotificationPayload};
use crate::validation::{clamp_limit, clamp_offset};

const NOTIFICATION_COLUMNS: &str =
    "id, profile_id, type, content, reference_id, is_read, created_at";

/// Insert a notification row.
///
/// Called from the connection/message/favorite mutations inside their own
/// transactions, so the triggering write and its notification land together.
pub(crate) async fn insert_notification(
    conn: &mut SqliteConnection,
    profile_id: i64,
    payload: NotificationPayload,
    content: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (profile_id, type, content, reference_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(profile_id)
    .bind(payload.kind())
    .bind(content)
    .bind(payload.reference_id())
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Get a notification by ID.
pub async fn get_notification(pool: &SqlitePool, id: i64) -> Result<Notification> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Notification",
        id: id.to_string(),
    })
}

/// List a profile's notifications, newest first, optionally filtered by
/// read state.
pub async fn list_notifications(
    pool: &SqlitePool,
    profile_id: i64,
    is_read: Option<bool>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Notification>> {
    let limit = clamp_limit(limit, 20);
    let offset = clamp_offset(offset);

    let notifications = match is_read {
        Some(is_read) => {
            sqlx::query_as::<_, Notification>(&format!(
                r#"
                SELECT {NOTIFICATION_COLUMNS}
                FROM notifications
                WHERE profile_id = ? AND is_read = ?
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#
            ))
            .bind(profile_id)
            .bind(is_read)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Notification>(&format!(
                r#"
                SELECT {NOTIFICATION_COLUMNS}
                FROM notifications
                WHERE profile_id = ?
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#
            ))
            .bind(profile_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(notifications)
}

/// Count a profile's unread notifications.
pub async fn unread_count(pool: &SqlitePool, profile_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM notifications
        WHERE profile_id = ? AND is_read = 0
        "#,
    )
    .bind(profile_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Mark a single notification read; only the owner may flip it.
pub async fn mark_one_read(
    pool: &SqlitePool,
    notification_id: i64,
    acting_profile_id: i64,
) -> Result<Notification> {
    let notification = get_notification(pool, notification_id).await?;
    if notification.profile_id != acting_profile_id {
        return Err(DatabaseError::Forbidden {
            entity: "Notification",
            id: notification_id.to_string(),
        });
    }

    sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
        .bind(notification_id)
        .execute(pool)
        .await?;

    get_notification(pool, notification_id).await
}

/// Mark all of a profile's unread notifications read.
///
/// Returns the number flipped; a second call in a row returns 0.
pub async fn mark_all_read(pool: &SqlitePool, profile_id: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET is_read = 1
        WHERE profile_id = ? AND is_read = 0
        "#,
    )
    .bind(profile_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
