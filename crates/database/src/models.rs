//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The side of the marketplace a profile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Entrepreneur,
    Investor,
}

impl Role {
    /// The role recommended candidates must have for a viewer of this role.
    pub fn opposite(&self) -> Role {
        match self {
            Role::Entrepreneur => Role::Investor,
            Role::Investor => Role::Entrepreneur,
        }
    }

    /// Parse a role from user input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "entrepreneur" => Some(Role::Entrepreneur),
            "investor" => Some(Role::Investor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Entrepreneur => "entrepreneur",
            Role::Investor => "investor",
        }
    }
}

/// Lifecycle state of a connection between two profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ConnectionStatus {
    /// Parse a status from user input (for list filters).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ConnectionStatus::Pending),
            "accepted" => Some(ConnectionStatus::Accepted),
            "rejected" => Some(ConnectionStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Rejected => "rejected",
        }
    }
}

/// The recipient's verdict on a pending connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDecision {
    Accept,
    Reject,
}

impl ConnectionDecision {
    /// Parse a decision from user input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "accepted" | "accept" => Some(ConnectionDecision::Accept),
            "rejected" | "reject" => Some(ConnectionDecision::Reject),
            _ => None,
        }
    }

    /// The terminal status this decision resolves a pending connection to.
    pub fn status(&self) -> ConnectionStatus {
        match self {
            ConnectionDecision::Accept => ConnectionStatus::Accepted,
            ConnectionDecision::Reject => ConnectionStatus::Rejected,
        }
    }
}

/// Which party of a connection the inspecting profile is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionDirection {
    /// The inspecting profile sent the request.
    Sent,
    /// The inspecting profile received the request.
    Received,
}

/// The matching-domain identity wrapping an external user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: i64,
    /// External identity this profile belongs to (opaque to the domain).
    pub user_id: String,
    pub role: Role,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Reduced profile shape used when enriching lists with a counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProfileSummary {
    pub id: i64,
    pub role: Role,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
}

/// Role extension for entrepreneurs, 1:1 with a Profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EntrepreneurProfile {
    pub id: i64,
    pub profile_id: i64,
    pub startup_name: String,
    pub business_description: Option<String>,
    pub industry: Option<String>,
    pub funding_stage: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Role extension for investors, 1:1 with a Profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct InvestorProfile {
    pub id: i64,
    pub profile_id: i64,
    pub investment_preferences: Option<String>,
    pub industry_focus: Option<String>,
    pub funding_capacity: Option<String>,
    pub location: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A relationship request/acceptance record between two profiles.
///
/// Storage is directional (who asked whom) but uniqueness holds over the
/// unordered pair, enforced by an index on the normalized pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Connection {
    pub id: i64,
    pub requester_id: i64,
    pub recipient_id: i64,
    pub status: ConnectionStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Connection {
    /// Whether the given profile is one of the two parties.
    pub fn involves(&self, profile_id: i64) -> bool {
        self.requester_id == profile_id || self.recipient_id == profile_id
    }

    /// The other party relative to the given profile, if it is a party.
    pub fn counterpart_of(&self, profile_id: i64) -> Option<i64> {
        if profile_id == self.requester_id {
            Some(self.recipient_id)
        } else if profile_id == self.recipient_id {
            Some(self.requester_id)
        } else {
            None
        }
    }
}

/// A connection enriched with the counterpart's profile summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionWithCounterpart {
    pub connection: Connection,
    pub counterpart: ProfileSummary,
}

/// Result of checking the relationship between two profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionLink {
    pub connection_id: i64,
    pub status: ConnectionStatus,
    pub direction: ConnectionDirection,
}

/// A chat message inside an accepted connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub connection_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}

/// A one-directional bookmark from one profile to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: i64,
    pub profile_id: i64,
    pub favorited_profile_id: i64,
    pub created_at: String,
}

/// A favorite enriched with the bookmarked profile's summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteWithProfile {
    pub favorite: Favorite,
    pub profile: ProfileSummary,
}

/// Discriminator for notification rows; determines how `reference_id` is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ConnectionRequest,
    Favorite,
    Message,
}

/// Typed view of a notification's originating entity.
///
/// Persisted as `(type, reference_id)`; all interpretation of the loose
/// integer goes through this union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    ConnectionRequest { connection_id: i64 },
    Favorite { favorite_id: i64 },
    Message { message_id: i64 },
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationType {
        match self {
            NotificationPayload::ConnectionRequest { .. } => NotificationType::ConnectionRequest,
            NotificationPayload::Favorite { .. } => NotificationType::Favorite,
            NotificationPayload::Message { .. } => NotificationType::Message,
        }
    }

    pub fn reference_id(&self) -> i64 {
        match *self {
            NotificationPayload::ConnectionRequest { connection_id } => connection_id,
            NotificationPayload::Favorite { favorite_id } => favorite_id,
            NotificationPayload::Message { message_id } => message_id,
        }
    }
}

/// An append-only event informing a profile of activity concerning it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub profile_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub content: String,
    pub reference_id: Option<i64>,
    pub is_read: bool,
    pub created_at: String,
}

impl Notification {
    /// Reconstruct the typed payload from the persisted pair.
    pub fn payload(&self) -> Option<NotificationPayload> {
        let reference_id = self.reference_id?;
        Some(match self.kind {
            NotificationType::ConnectionRequest => NotificationPayload::ConnectionRequest {
                connection_id: reference_id,
            },
            NotificationType::Favorite => NotificationPayload::Favorite {
                favorite_id: reference_id,
            },
            NotificationType::Message => NotificationPayload::Message {
                message_id: reference_id,
            },
        })
    }
}

/// A pitch video owned by a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: i64,
    pub profile_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    /// Duration in seconds, when the uploader declared one.
    pub duration: Option<i64>,
    pub views_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A raw profile-view event; `viewer_id` is NULL for anonymous viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProfileView {
    pub id: i64,
    pub viewer_id: Option<i64>,
    pub viewed_profile_id: i64,
    pub created_at: String,
}

/// A raw video-view event; `viewer_id` is NULL for anonymous viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct VideoView {
    pub id: i64,
    pub viewer_id: Option<i64>,
    pub video_id: i64,
    pub created_at: String,
}

/// A ranked browse candidate produced by the recommendation scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub profile_id: i64,
    pub role: Role,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub score: i64,
    pub created_at: String,
}

/// A recent profile-view event joined with the viewer's summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentProfileView {
    pub viewed_at: String,
    /// None when the view was anonymous.
    pub viewer: Option<ProfileSummary>,
}

/// Aggregated analytics for a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub total_profile_views: i64,
    pub total_connections: i64,
    pub pending_connection_requests: i64,
    pub total_video_uploads: i64,
    pub total_video_views: i64,
    pub favorited_by_count: i64,
    pub recent_profile_views: Vec<RecentProfileView>,
}
