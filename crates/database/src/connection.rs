//! Connection graph: request, respond, list, check.
//!
//! Connections are stored directionally (requester/recipient) but are unique
//! over the unordered pair; a mirrored request in either direction conflicts.
//! The pair index in the schema closes the race a pre-check alone would leave.

use sqlx::{FromRow, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{
    Connection, ConnectionDecision, ConnectionDirection, ConnectionLink, ConnectionStatus,
    ConnectionWithCounterpart, NotificationPayload, ProfileSummary,
};
use crate::notification::insert_notification;
use crate::validation::{clamp_limit, clamp_offset, ValidationError};

const CONNECTION_COLUMNS: &str =
    "id, requester_id, recipient_id, status, created_at, updated_at";

fn pair_conflict(a: i64, b: i64) -> DatabaseError {
    DatabaseError::AlreadyExists {
        entity: "Connection",
        id: format!("{}/{}", a.min(b), a.max(b)),
    }
}

/// Get a connection by ID.
pub async fn get_connection(pool: &SqlitePool, id: i64) -> Result<Connection> {
    sqlx::query_as::<_, Connection>(&format!(
        "SELECT {CONNECTION_COLUMNS} FROM connections WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Connection",
        id: id.to_string(),
    })
}

/// Find the connection between two profiles, in either direction.
pub(crate) async fn find_between(
    pool: &SqlitePool,
    a: i64,
    b: i64,
) -> Result<Option<Connection>> {
    let connection = sqlx::query_as::<_, Connection>(&format!(
        r#"
        SELECT {CONNECTION_COLUMNS}
        FROM connections
        WHERE (requester_id = ? AND recipient_id = ?)
           OR (requester_id = ? AND recipient_id = ?)
        "#
    ))
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .fetch_optional(pool)
    .await?;

    Ok(connection)
}

/// Create a pending connection request and notify the recipient.
pub async fn request_connection(
    pool: &SqlitePool,
    requester_id: i64,
    recipient_id: i64,
) -> Result<Connection> {
    if requester_id == recipient_id {
        return Err(ValidationError::SelfReference("connect to").into());
    }

    // NotFound for an absent recipient, before any conflict checks.
    crate::profile::get_profile(pool, recipient_id).await?;

    if find_between(pool, requester_id, recipient_id).await?.is_some() {
        return Err(pair_conflict(requester_id, recipient_id));
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO connections (requester_id, recipient_id)
        VALUES (?, ?)
        "#,
    )
    .bind(requester_id)
    .bind(recipient_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            // Lost the race against a mirrored request.
            if db_err.is_unique_violation() {
                return pair_conflict(requester_id, recipient_id);
            }
        }
        DatabaseError::Sqlx(e)
    })?;
    let connection_id = result.last_insert_rowid();

    insert_notification(
        &mut tx,
        recipient_id,
        NotificationPayload::ConnectionRequest { connection_id },
        "You have a new connection request",
    )
    .await?;

    tx.commit().await?;

    tracing::debug!(requester_id, recipient_id, connection_id, "connection requested");

    get_connection(pool, connection_id).await
}

/// Resolve a pending connection; only the recipient may act, and the
/// resulting status is terminal. Acceptance notifies the requester;
/// rejection stays silent.
pub async fn respond_to_connection(
    pool: &SqlitePool,
    connection_id: i64,
    acting_profile_id: i64,
    decision: ConnectionDecision,
) -> Result<Connection> {
    let connection = get_connection(pool, connection_id).await?;

    if connection.recipient_id != acting_profile_id {
        return Err(DatabaseError::Forbidden {
            entity: "Connection",
            id: connection_id.to_string(),
        });
    }

    if connection.status != ConnectionStatus::Pending {
        return Err(DatabaseError::InvalidState {
            entity: "Connection",
            id: connection_id.to_string(),
            state: format!("already {}", connection.status.as_str()),
        });
    }

    let new_status = decision.status();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE connections
        SET status = ?, updated_at = datetime('now')
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(new_status)
    .bind(connection_id)
    .execute(&mut *tx)
    .await?;

    if new_status == ConnectionStatus::Accepted {
        insert_notification(
            &mut tx,
            connection.requester_id,
            NotificationPayload::ConnectionRequest { connection_id },
            "Your connection request was accepted",
        )
        .await?;
    }

    tx.commit().await?;

    tracing::debug!(
        connection_id,
        status = new_status.as_str(),
        "connection resolved"
    );

    get_connection(pool, connection_id).await
}

#[derive(FromRow)]
struct ConnectionPeerRow {
    id: i64,
    requester_id: i64,
    recipient_id: i64,
    status: ConnectionStatus,
    created_at: String,
    updated_at: String,
    peer_id: i64,
    peer_role: crate::models::Role,
    peer_profile_picture: Option<String>,
    peer_bio: Option<String>,
    peer_created_at: String,
}

impl ConnectionPeerRow {
    fn split(self) -> ConnectionWithCounterpart {
        ConnectionWithCounterpart {
            connection: Connection {
                id: self.id,
                requester_id: self.requester_id,
                recipient_id: self.recipient_id,
                status: self.status,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            counterpart: ProfileSummary {
                id: self.peer_id,
                role: self.peer_role,
                profile_picture: self.peer_profile_picture,
                bio: self.peer_bio,
                created_at: self.peer_created_at,
            },
        }
    }
}

/// List a profile's connections (either party), enriched with the
/// counterpart's profile summary.
pub async fn list_connections(
    pool: &SqlitePool,
    profile_id: i64,
    status: Option<ConnectionStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ConnectionWithCounterpart>> {
    let limit = clamp_limit(limit, 50);
    let offset = clamp_offset(offset);

    let base = r#"
        SELECT c.id, c.requester_id, c.recipient_id, c.status,
               c.created_at, c.updated_at,
               p.id AS peer_id, p.role AS peer_role,
               p.profile_picture AS peer_profile_picture,
               p.bio AS peer_bio, p.created_at AS peer_created_at
        FROM connections c
        INNER JOIN profiles p
            ON p.id = CASE WHEN c.requester_id = ?1 THEN c.recipient_id
                           ELSE c.requester_id END
        WHERE (c.requester_id = ?1 OR c.recipient_id = ?1)
    "#;

    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, ConnectionPeerRow>(&format!(
                "{base} AND c.status = ?2 ORDER BY c.created_at DESC, c.id DESC LIMIT ?3 OFFSET ?4"
            ))
            .bind(profile_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ConnectionPeerRow>(&format!(
                "{base} ORDER BY c.created_at DESC, c.id DESC LIMIT ?2 OFFSET ?3"
            ))
            .bind(profile_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(ConnectionPeerRow::split).collect())
}

/// Check the relationship between two profiles, from `profile_id`'s point
/// of view. `None` means no connection exists in either direction.
pub async fn check_connection(
    pool: &SqlitePool,
    profile_id: i64,
    other_profile_id: i64,
) -> Result<Option<ConnectionLink>> {
    let connection = match find_between(pool, profile_id, other_profile_id).await? {
        Some(connection) => connection,
        None => return Ok(None),
    };

    let direction = if connection.requester_id == profile_id {
        ConnectionDirection::Sent
    } else {
        ConnectionDirection::Received
    };

    Ok(Some(ConnectionLink {
        connection_id: connection.id,
        status: connection.status,
        direction,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationType, Role};
    use crate::notification;
    use crate::test_support::{seed_profile, test_db};

    #[tokio::test]
    async fn test_request_is_unique_per_pair() {
        let db = test_db().await;
        let pool = db.pool();
        let a = seed_profile(pool, "a", Role::Entrepreneur).await;
        let b = seed_profile(pool, "b", Role::Investor).await;

        let connection = request_connection(pool, a.id, b.id).await.unwrap();
        assert_eq!(connection.status, ConnectionStatus::Pending);

        // Same direction and mirrored direction both conflict.
        assert!(matches!(
            request_connection(pool, a.id, b.id).await,
            Err(DatabaseError::AlreadyExists { .. })
        ));
        assert!(matches!(
            request_connection(pool, b.id, a.id).await,
            Err(DatabaseError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_request_rejects_self_and_missing_recipient() {
        let db = test_db().await;
        let pool = db.pool();
        let a = seed_profile(pool, "a", Role::Entrepreneur).await;

        assert!(matches!(
            request_connection(pool, a.id, a.id).await,
            Err(DatabaseError::Validation(_))
        ));
        assert!(matches!(
            request_connection(pool, a.id, 9999).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_request_notifies_recipient_once() {
        let db = test_db().await;
        let pool = db.pool();
        let a = seed_profile(pool, "a", Role::Entrepreneur).await;
        let b = seed_profile(pool, "b", Role::Investor).await;

        let connection = request_connection(pool, a.id, b.id).await.unwrap();

        let notifications = notification::list_notifications(pool, b.id, None, 10, 0)
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationType::ConnectionRequest);
        assert_eq!(notifications[0].reference_id, Some(connection.id));
        assert!(notification::list_notifications(pool, a.id, None, 10, 0)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_only_recipient_may_respond() {
        let db = test_db().await;
        let pool = db.pool();
        let a = seed_profile(pool, "a", Role::Entrepreneur).await;
        let b = seed_profile(pool, "b", Role::Investor).await;

        let connection = request_connection(pool, a.id, b.id).await.unwrap();

        let result =
            respond_to_connection(pool, connection.id, a.id, ConnectionDecision::Accept).await;
        assert!(matches!(result, Err(DatabaseError::Forbidden { .. })));

        let accepted =
            respond_to_connection(pool, connection.id, b.id, ConnectionDecision::Accept)
                .await
                .unwrap();
        assert_eq!(accepted.status, ConnectionStatus::Accepted);
    }

    #[tokio::test]
    async fn test_terminal_status_is_sticky() {
        let db = test_db().await;
        let pool = db.pool();
        let a = seed_profile(pool, "a", Role::Entrepreneur).await;
        let b = seed_profile(pool, "b", Role::Investor).await;

        let connection = request_connection(pool, a.id, b.id).await.unwrap();
        respond_to_connection(pool, connection.id, b.id, ConnectionDecision::Accept)
            .await
            .unwrap();

        // Re-responding always fails the same way, with either decision.
        for decision in [ConnectionDecision::Accept, ConnectionDecision::Reject] {
            let result = respond_to_connection(pool, connection.id, b.id, decision).await;
            assert!(matches!(result, Err(DatabaseError::InvalidState { .. })));
        }

        let unchanged = get_connection(pool, connection.id).await.unwrap();
        assert_eq!(unchanged.status, ConnectionStatus::Accepted);
    }

    #[tokio::test]
    async fn test_acceptance_notifies_requester_but_rejection_does_not() {
        let db = test_db().await;
        let pool = db.pool();
        let a = seed_profile(pool, "a", Role::Entrepreneur).await;
        let b = seed_profile(pool, "b", Role::Investor).await;
        let c = seed_profile(pool, "c", Role::Investor).await;

        let accepted = request_connection(pool, a.id, b.id).await.unwrap();
        respond_to_connection(pool, accepted.id, b.id, ConnectionDecision::Accept)
            .await
            .unwrap();

        let rejected = request_connection(pool, a.id, c.id).await.unwrap();
        respond_to_connection(pool, rejected.id, c.id, ConnectionDecision::Reject)
            .await
            .unwrap();

        let requester_feed = notification::list_notifications(pool, a.id, None, 10, 0)
            .await
            .unwrap();
        assert_eq!(requester_feed.len(), 1);
        assert_eq!(requester_feed[0].reference_id, Some(accepted.id));
    }

    #[tokio::test]
    async fn test_check_connection_direction() {
        let db = test_db().await;
        let pool = db.pool();
        let a = seed_profile(pool, "a", Role::Entrepreneur).await;
        let b = seed_profile(pool, "b", Role::Investor).await;

        assert!(check_connection(pool, a.id, b.id).await.unwrap().is_none());

        let connection = request_connection(pool, a.id, b.id).await.unwrap();

        let from_a = check_connection(pool, a.id, b.id).await.unwrap().unwrap();
        assert_eq!(from_a.direction, ConnectionDirection::Sent);
        assert_eq!(from_a.status, ConnectionStatus::Pending);
        assert_eq!(from_a.connection_id, connection.id);

        let from_b = check_connection(pool, b.id, a.id).await.unwrap().unwrap();
        assert_eq!(from_b.direction, ConnectionDirection::Received);
    }

    #[tokio::test]
    async fn test_list_connections_enriched_and_filtered() {
        let db = test_db().await;
        let pool = db.pool();
        let a = seed_profile(pool, "a", Role::Entrepreneur).await;
        let b = seed_profile(pool, "b", Role::Investor).await;
        let c = seed_profile(pool, "c", Role::Investor).await;

        let with_b = request_connection(pool, a.id, b.id).await.unwrap();
        respond_to_connection(pool, with_b.id, b.id, ConnectionDecision::Accept)
            .await
            .unwrap();
        request_connection(pool, c.id, a.id).await.unwrap();

        let all = list_connections(pool, a.id, None, 10, 0).await.unwrap();
        assert_eq!(all.len(), 2);
        // Counterpart is always the other party, whichever way the request ran.
        for item in &all {
            assert_ne!(item.counterpart.id, a.id);
            assert_eq!(
                item.connection.counterpart_of(a.id),
                Some(item.counterpart.id)
            );
        }

        let accepted = list_connections(pool, a.id, Some(ConnectionStatus::Accepted), 10, 0)
            .await
            .unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].counterpart.id, b.id);
    }
}
