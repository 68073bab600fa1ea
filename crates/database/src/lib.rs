//! SQLite persistence layer for PitchMatch.
//!
//! This crate holds the whole matching domain: profiles and their role
//! extensions, the connection graph, messaging, favorites, notifications,
//! the recommendation scorer, and video/view accounting, using SQLx with
//! SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{models::Role, profile, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:pitchmatch.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a profile for an external identity
//!     let founder =
//!         profile::create_profile(db.pool(), "auth0|abc123", Role::Entrepreneur, None, None)
//!             .await?;
//!     println!("profile {}", founder.id);
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod connection;
pub mod error;
pub mod favorite;
pub mod message;
pub mod models;
pub mod notification;
pub mod profile;
pub mod recommend;
pub mod role_profile;
pub mod validation;
pub mod video;

pub use analytics::Window;
pub use error::{DatabaseError, Result};
pub use message::{MessageSort, SortOrder};
pub use models::{
    Connection, ConnectionDecision, ConnectionDirection, ConnectionLink, ConnectionStatus,
    ConnectionWithCounterpart, EntrepreneurProfile, Favorite, FavoriteWithProfile, InvestorProfile,
    Message, Notification, NotificationPayload, NotificationType, Profile, ProfileStats,
    ProfileSummary, ProfileView, RecentProfileView, Recommendation, Role, Video, VideoView,
};
pub use role_profile::{EntrepreneurAttrs, InvestorAttrs};
pub use validation::ValidationError;
pub use video::{VideoEdits, VideoUpload};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Sized for concurrent request handling at the API boundary.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/pitchmatch.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::{Profile, Role};

    pub(crate) async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    pub(crate) async fn seed_profile(pool: &SqlitePool, user_id: &str, role: Role) -> Profile {
        profile::create_profile(pool, user_id, role, None, None)
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConnectionDecision, ConnectionStatus, Role};
    use crate::test_support::{seed_profile, test_db};

    // The full happy path: request, accept, message, then a stale re-response.
    #[tokio::test]
    async fn test_connect_accept_message_flow() {
        let db = test_db().await;
        let pool = db.pool();

        let founder = seed_profile(pool, "founder", Role::Entrepreneur).await;
        let investor = seed_profile(pool, "investor", Role::Investor).await;

        let pending = connection::request_connection(pool, founder.id, investor.id)
            .await
            .unwrap();
        assert_eq!(pending.status, ConnectionStatus::Pending);

        let accepted = connection::respond_to_connection(
            pool,
            pending.id,
            investor.id,
            ConnectionDecision::Accept,
        )
        .await
        .unwrap();
        assert_eq!(accepted.status, ConnectionStatus::Accepted);

        // The requester got notified of the acceptance.
        let feed = notification::list_notifications(pool, founder.id, None, 10, 0)
            .await
            .unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].reference_id, Some(pending.id));

        // Messaging is open now.
        let message = message::send_message(pool, founder.id, pending.id, "Let's talk")
            .await
            .unwrap();
        assert_eq!(message.sender_id, founder.id);

        // Responding again is a state conflict, not a silent no-op.
        let stale = connection::respond_to_connection(
            pool,
            pending.id,
            investor.id,
            ConnectionDecision::Accept,
        )
        .await;
        assert!(matches!(stale, Err(DatabaseError::InvalidState { .. })));
    }
}
