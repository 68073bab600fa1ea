//! Messaging inside accepted connections.

use sqlx::SqlitePool;

use crate::connection::get_connection;
use crate::error::{DatabaseError, Result};
use crate::models::{ConnectionStatus, Message, NotificationPayload};
use crate::notification::insert_notification;
use crate::validation::{clamp_limit, clamp_offset, validate_text, MAX_MESSAGE_LENGTH};

const MESSAGE_COLUMNS: &str = "id, connection_id, sender_id, content, is_read, created_at";

/// Field a message listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageSort {
    #[default]
    CreatedAt,
    Id,
}

impl MessageSort {
    /// Parse a sort field from user input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "created_at" | "createdat" => Some(MessageSort::CreatedAt),
            "id" => Some(MessageSort::Id),
            _ => None,
        }
    }

    // Column names come from this enum, never from raw input.
    fn column(&self) -> &'static str {
        match self {
            MessageSort::CreatedAt => "created_at",
            MessageSort::Id => "id",
        }
    }
}

/// Listing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse an order from user input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Get a message by ID.
pub async fn get_message(pool: &SqlitePool, id: i64) -> Result<Message> {
    sqlx::query_as::<_, Message>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Message",
        id: id.to_string(),
    })
}

/// Send a message on an accepted connection and notify the counterpart.
///
/// Fails without writing anything when the connection is absent, not
/// accepted, the sender is not a party, or the content trims empty.
pub async fn send_message(
    pool: &SqlitePool,
    sender_id: i64,
    connection_id: i64,
    content: &str,
) -> Result<Message> {
    let connection = get_connection(pool, connection_id).await?;

    if connection.status != ConnectionStatus::Accepted {
        return Err(DatabaseError::Forbidden {
            entity: "Connection",
            id: connection_id.to_string(),
        });
    }

    let recipient_id = connection
        .counterpart_of(sender_id)
        .ok_or(DatabaseError::Forbidden {
            entity: "Connection",
            id: connection_id.to_string(),
        })?;

    validate_text("content", content, MAX_MESSAGE_LENGTH)?;
    let content = content.trim();

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO messages (connection_id, sender_id, content)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(connection_id)
    .bind(sender_id)
    .bind(content)
    .execute(&mut *tx)
    .await?;
    let message_id = result.last_insert_rowid();

    insert_notification(
        &mut tx,
        recipient_id,
        NotificationPayload::Message { message_id },
        "You have a new message",
    )
    .await?;

    tx.commit().await?;

    get_message(pool, message_id).await
}

/// Mark a message read; only the non-sender party of the connection may.
pub async fn mark_read(
    pool: &SqlitePool,
    message_id: i64,
    acting_profile_id: i64,
) -> Result<Message> {
    let message = get_message(pool, message_id).await?;
    let connection = get_connection(pool, message.connection_id).await?;

    if acting_profile_id == message.sender_id || !connection.involves(acting_profile_id) {
        return Err(DatabaseError::Forbidden {
            entity: "Message",
            id: message_id.to_string(),
        });
    }

    sqlx::query("UPDATE messages SET is_read = 1 WHERE id = ?")
        .bind(message_id)
        .execute(pool)
        .await?;

    get_message(pool, message_id).await
}

/// List a connection's messages; only a party may read them.
///
/// Default order is `created_at` ascending, ties broken by `id`.
pub async fn list_messages(
    pool: &SqlitePool,
    connection_id: i64,
    acting_profile_id: i64,
    sort: MessageSort,
    order: SortOrder,
    limit: i64,
    offset: i64,
) -> Result<Vec<Message>> {
    let connection = get_connection(pool, connection_id).await?;
    if !connection.involves(acting_profile_id) {
        return Err(DatabaseError::Forbidden {
            entity: "Connection",
            id: connection_id.to_string(),
        });
    }

    let limit = clamp_limit(limit, 50);
    let offset = clamp_offset(offset);

    let messages = sqlx::query_as::<_, Message>(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM messages
        WHERE connection_id = ?
        ORDER BY {column} {order}, id {order}
        LIMIT ? OFFSET ?
        "#,
        column = sort.column(),
        order = order.sql(),
    ))
    .bind(connection_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Count unread messages addressed to a party of the connection.
pub async fn unread_count(
    pool: &SqlitePool,
    connection_id: i64,
    acting_profile_id: i64,
) -> Result<i64> {
    let connection = get_connection(pool, connection_id).await?;
    if !connection.involves(acting_profile_id) {
        return Err(DatabaseError::Forbidden {
            entity: "Connection",
            id: connection_id.to_string(),
        });
    }

    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages
        WHERE connection_id = ? AND sender_id <> ? AND is_read = 0
        "#,
    )
    .bind(connection_id)
    .bind(acting_profile_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
