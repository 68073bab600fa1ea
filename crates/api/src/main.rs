use std::env;
use std::net::SocketAddr;

use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use database::{
    analytics, connection, favorite, message, notification, profile, recommend, role_profile,
    video, ConnectionDecision, ConnectionStatus, Database, DatabaseError, EntrepreneurAttrs,
    InvestorAttrs, MessageSort, Profile, Role, SortOrder, VideoEdits, VideoUpload, Window,
};

#[derive(Clone)]
struct AppState {
    db: Database,
}

#[derive(Debug, Deserialize)]
struct CreateProfileRequest {
    role: String,
    #[serde(default)]
    profile_picture: Option<String>,
    #[serde(default)]
    bio: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    #[serde(default)]
    profile_picture: Option<String>,
    #[serde(default)]
    bio: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChangeRoleRequest {
    role: String,
}

#[derive(Debug, Deserialize)]
struct EntrepreneurRequest {
    startup_name: String,
    #[serde(default)]
    business_description: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    funding_stage: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    website: Option<String>,
}

impl EntrepreneurRequest {
    fn into_attrs(self) -> EntrepreneurAttrs {
        EntrepreneurAttrs {
            startup_name: self.startup_name,
            business_description: self.business_description,
            industry: self.industry,
            funding_stage: self.funding_stage,
            location: self.location,
            website: self.website,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InvestorRequest {
    #[serde(default)]
    investment_preferences: Option<String>,
    #[serde(default)]
    industry_focus: Option<String>,
    #[serde(default)]
    funding_capacity: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

impl InvestorRequest {
    fn into_attrs(self) -> InvestorAttrs {
        InvestorAttrs {
            investment_preferences: self.investment_preferences,
            industry_focus: self.industry_focus,
            funding_capacity: self.funding_capacity,
            location: self.location,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConnectionRequestBody {
    recipient_id: i64,
}

#[derive(Debug, Deserialize)]
struct RespondRequest {
    decision: String,
}

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    content: String,
}

#[derive(Debug, Deserialize)]
struct FavoriteRequest {
    favorited_profile_id: i64,
}

#[derive(Debug, Deserialize)]
struct CreateVideoRequest {
    title: String,
    #[serde(default)]
    description: Option<String>,
    video_url: String,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    duration: Option<i64>,
    mime_type: String,
    size_bytes: u64,
}

#[derive(Debug, Deserialize)]
struct UpdateVideoRequest {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageParams {
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ListProfilesParams {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ListConnectionsParams {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ListMessagesParams {
    #[serde(default)]
    sort: Option<String>,
    #[serde(default)]
    order: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ListNotificationsParams {
    #[serde(default)]
    is_read: Option<bool>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AnalyticsParams {
    #[serde(default)]
    window: Option<String>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
}

#[derive(Debug, Serialize)]
struct Affected {
    updated: u64,
}

#[derive(Debug, Serialize)]
struct UnreadCount {
    unread: i64,
}

#[derive(Debug)]
enum ApiError {
    Unauthorized,
    BadRequest(String),
    Domain(DatabaseError),
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => {
                warn!("Unauthenticated request");
                (StatusCode::UNAUTHORIZED, "Unauthenticated".to_string())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Domain(err) => {
                let status = match &err {
                    DatabaseError::NotFound { .. } => StatusCode::NOT_FOUND,
                    DatabaseError::AlreadyExists { .. } | DatabaseError::InvalidState { .. } => {
                        StatusCode::CONFLICT
                    }
                    DatabaseError::Forbidden { .. } => StatusCode::FORBIDDEN,
                    DatabaseError::Validation(_) => StatusCode::BAD_REQUEST,
                    DatabaseError::Sqlx(_) | DatabaseError::Migration(_) => {
                        // Storage details stay in the logs, not the response.
                        error!(error = %err, "storage failure");
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(serde_json::json!({ "error": { "message": "Internal error" } })),
                        )
                            .into_response();
                    }
                };
                (status, err.to_string())
            }
        };

        let body = serde_json::json!({ "error": { "message": message } });
        (status, Json(body)).into_response()
    }
}

/// Resolve the acting profile from the caller identity header.
async fn require_caller(state: &AppState, headers: &HeaderMap) -> Result<Profile, ApiError> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or(ApiError::Unauthorized)?;

    Ok(profile::get_profile_by_user(state.db.pool(), user_id).await?)
}

/// Resolve the caller if present; anonymous callers stay `None`.
async fn optional_caller(state: &AppState, headers: &HeaderMap) -> Option<Profile> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())?;

    profile::get_profile_by_user(state.db.pool(), user_id)
        .await
        .ok()
}

/// Foreign ids must be positive; anything else is treated as absent.
fn check_id(id: i64, entity: &'static str) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(ApiError::Domain(DatabaseError::NotFound {
            entity,
            id: id.to_string(),
        }));
    }
    Ok(id)
}

fn page(params: (Option<i64>, Option<i64>)) -> (i64, i64) {
    (params.0.unwrap_or(0), params.1.unwrap_or(0))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let addr = env::var("PITCHMATCH_ADDR").unwrap_or_else(|_| "127.0.0.1:8686".to_string());
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:pitchmatch.db?mode=rwc".to_string());

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");
    db.migrate().await.expect("Failed to run migrations");

    let state = AppState { db };

    let app = Router::new()
        .route("/health", get(health))
        .route("/profiles", post(create_profile).get(list_profiles))
        .route("/profiles/me", get(get_my_profile).patch(update_my_profile))
        .route("/profiles/me/role", patch(change_my_role))
        .route(
            "/profiles/me/entrepreneur",
            post(create_entrepreneur).patch(update_entrepreneur),
        )
        .route(
            "/profiles/me/investor",
            post(create_investor).patch(update_investor),
        )
        .route("/profiles/:id", get(get_profile))
        .route("/profiles/:id/entrepreneur", get(get_entrepreneur))
        .route("/profiles/:id/investor", get(get_investor))
        .route("/profiles/:id/views", post(record_profile_view))
        .route("/profiles/:id/videos", get(list_profile_videos))
        .route("/connections", post(request_connection).get(list_connections))
        .route("/connections/check/:other_id", get(check_connection))
        .route("/connections/:id/respond", post(respond_to_connection))
        .route(
            "/connections/:id/messages",
            post(send_message).get(list_messages),
        )
        .route("/connections/:id/messages/unread", get(unread_messages))
        .route("/messages/:id/read", post(mark_message_read))
        .route("/favorites", post(add_favorite).get(list_favorites))
        .route("/favorites/:id", delete(remove_favorite))
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread", get(unread_notifications))
        .route("/notifications/read-all", post(mark_all_notifications_read))
        .route("/notifications/:id/read", post(mark_notification_read))
        .route("/recommendations", get(recommendations))
        .route("/videos", post(create_video))
        .route(
            "/videos/:id",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/videos/:id/views", post(record_video_view))
        .route("/analytics", get(profile_analytics))
        .with_state(state);

    let addr: SocketAddr = addr.parse().expect("Invalid PITCHMATCH_ADDR");
    info!(%addr, "PitchMatch API listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn create_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateProfileRequest>,
) -> Result<Response, ApiError> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let role = Role::parse(&payload.role)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown role '{}'", payload.role)))?;

    let created = profile::create_profile(
        state.db.pool(),
        user_id,
        role,
        payload.profile_picture.as_deref(),
        payload.bio.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn list_profiles(
    State(state): State<AppState>,
    Query(params): Query<ListProfilesParams>,
) -> Result<Response, ApiError> {
    let role = match params.role.as_deref() {
        Some(raw) => Some(
            Role::parse(raw).ok_or_else(|| ApiError::BadRequest(format!("unknown role '{raw}'")))?,
        ),
        None => None,
    };
    let (limit, offset) = page((params.limit, params.offset));

    let profiles = profile::list_profiles(state.db.pool(), role, limit, offset).await?;
    Ok(Json(profiles).into_response())
}

async fn get_my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    Ok(Json(caller).into_response())
}

async fn update_my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let updated = profile::update_profile(
        state.db.pool(),
        caller.id,
        payload.profile_picture.as_deref(),
        payload.bio.as_deref(),
    )
    .await?;
    Ok(Json(updated).into_response())
}

async fn change_my_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let role = Role::parse(&payload.role)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown role '{}'", payload.role)))?;
    let updated = profile::change_role(state.db.pool(), caller.id, role).await?;
    Ok(Json(updated).into_response())
}

async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let id = check_id(id, "Profile")?;
    let found = profile::get_profile(state.db.pool(), id).await?;
    Ok(Json(found).into_response())
}

async fn create_entrepreneur(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<EntrepreneurRequest>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let created =
        role_profile::create_entrepreneur_profile(state.db.pool(), caller.id, &payload.into_attrs())
            .await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn update_entrepreneur(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<EntrepreneurRequest>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let updated =
        role_profile::update_entrepreneur_profile(state.db.pool(), caller.id, &payload.into_attrs())
            .await?;
    Ok(Json(updated).into_response())
}

async fn create_investor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<InvestorRequest>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let created =
        role_profile::create_investor_profile(state.db.pool(), caller.id, &payload.into_attrs())
            .await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn update_investor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<InvestorRequest>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let updated =
        role_profile::update_investor_profile(state.db.pool(), caller.id, &payload.into_attrs())
            .await?;
    Ok(Json(updated).into_response())
}

async fn get_entrepreneur(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let id = check_id(id, "Profile")?;
    let found = role_profile::get_entrepreneur_profile(state.db.pool(), id).await?;
    Ok(Json(found).into_response())
}

async fn get_investor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let id = check_id(id, "Profile")?;
    let found = role_profile::get_investor_profile(state.db.pool(), id).await?;
    Ok(Json(found).into_response())
}

async fn record_profile_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let id = check_id(id, "Profile")?;
    let viewer = optional_caller(&state, &headers).await.map(|p| p.id);
    video::record_profile_view(state.db.pool(), id, viewer).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_profile_videos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let id = check_id(id, "Profile")?;
    let (limit, offset) = page((params.limit, params.offset));
    let videos = video::list_videos(state.db.pool(), id, limit, offset).await?;
    Ok(Json(videos).into_response())
}

async fn request_connection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ConnectionRequestBody>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let recipient_id = check_id(payload.recipient_id, "Profile")?;
    let created = connection::request_connection(state.db.pool(), caller.id, recipient_id).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn list_connections(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListConnectionsParams>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let status = match params.status.as_deref() {
        Some(raw) => Some(
            ConnectionStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown status '{raw}'")))?,
        ),
        None => None,
    };
    let (limit, offset) = page((params.limit, params.offset));

    let connections =
        connection::list_connections(state.db.pool(), caller.id, status, limit, offset).await?;
    Ok(Json(connections).into_response())
}

async fn check_connection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(other_id): Path<i64>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let other_id = check_id(other_id, "Profile")?;
    let link = connection::check_connection(state.db.pool(), caller.id, other_id).await?;
    Ok(Json(link).into_response())
}

async fn respond_to_connection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<RespondRequest>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let id = check_id(id, "Connection")?;
    let decision = ConnectionDecision::parse(&payload.decision)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown decision '{}'", payload.decision)))?;

    let updated =
        connection::respond_to_connection(state.db.pool(), id, caller.id, decision).await?;
    Ok(Json(updated).into_response())
}

async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let id = check_id(id, "Connection")?;
    let sent = message::send_message(state.db.pool(), caller.id, id, &payload.content).await?;
    Ok((StatusCode::CREATED, Json(sent)).into_response())
}

async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<ListMessagesParams>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let id = check_id(id, "Connection")?;
    let sort = match params.sort.as_deref() {
        Some(raw) => MessageSort::parse(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown sort field '{raw}'")))?,
        None => MessageSort::default(),
    };
    let order = match params.order.as_deref() {
        Some(raw) => SortOrder::parse(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown sort order '{raw}'")))?,
        None => SortOrder::default(),
    };
    let (limit, offset) = page((params.limit, params.offset));

    let messages =
        message::list_messages(state.db.pool(), id, caller.id, sort, order, limit, offset).await?;
    Ok(Json(messages).into_response())
}

async fn unread_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let id = check_id(id, "Connection")?;
    let unread = message::unread_count(state.db.pool(), id, caller.id).await?;
    Ok(Json(UnreadCount { unread }).into_response())
}

async fn mark_message_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let id = check_id(id, "Message")?;
    let updated = message::mark_read(state.db.pool(), id, caller.id).await?;
    Ok(Json(updated).into_response())
}

async fn add_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<FavoriteRequest>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let target = check_id(payload.favorited_profile_id, "Profile")?;
    let created = favorite::add_favorite(state.db.pool(), caller.id, target).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn list_favorites(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let (limit, offset) = page((params.limit, params.offset));
    let favorites = favorite::list_favorites(state.db.pool(), caller.id, limit, offset).await?;
    Ok(Json(favorites).into_response())
}

async fn remove_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let id = check_id(id, "Favorite")?;
    favorite::remove_favorite(state.db.pool(), id, caller.id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListNotificationsParams>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let (limit, offset) = page((params.limit, params.offset));
    let notifications = notification::list_notifications(
        state.db.pool(),
        caller.id,
        params.is_read,
        limit,
        offset,
    )
    .await?;
    Ok(Json(notifications).into_response())
}

async fn unread_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let unread = notification::unread_count(state.db.pool(), caller.id).await?;
    Ok(Json(UnreadCount { unread }).into_response())
}

async fn mark_notification_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let id = check_id(id, "Notification")?;
    let updated = notification::mark_one_read(state.db.pool(), id, caller.id).await?;
    Ok(Json(updated).into_response())
}

async fn mark_all_notifications_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let updated = notification::mark_all_read(state.db.pool(), caller.id).await?;
    Ok(Json(Affected { updated }).into_response())
}

async fn recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let (limit, offset) = page((params.limit, params.offset));
    let ranked = recommend::recommend(state.db.pool(), caller.id, limit, offset).await?;
    Ok(Json(ranked).into_response())
}

async fn create_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateVideoRequest>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let upload = VideoUpload {
        title: payload.title,
        description: payload.description,
        video_url: payload.video_url,
        thumbnail_url: payload.thumbnail_url,
        duration: payload.duration,
        mime_type: payload.mime_type,
        size_bytes: payload.size_bytes,
    };
    let created = video::create_video(state.db.pool(), caller.id, &upload).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let id = check_id(id, "Video")?;
    let found = video::get_video(state.db.pool(), id).await?;
    Ok(Json(found).into_response())
}

async fn update_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let id = check_id(id, "Video")?;
    let edits = VideoEdits {
        title: payload.title,
        description: payload.description,
        thumbnail_url: payload.thumbnail_url,
    };
    let updated = video::update_video(state.db.pool(), id, caller.id, &edits).await?;
    Ok(Json(updated).into_response())
}

async fn delete_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let id = check_id(id, "Video")?;
    video::delete_video(state.db.pool(), id, caller.id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn record_video_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let id = check_id(id, "Video")?;
    let viewer = optional_caller(&state, &headers).await.map(|p| p.id);
    video::record_video_view(state.db.pool(), id, viewer).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn profile_analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AnalyticsParams>,
) -> Result<Response, ApiError> {
    let caller = require_caller(&state, &headers).await?;
    let window = match params.window.as_deref() {
        Some(raw) => Window::parse(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown window '{raw}'")))?,
        None => Window::default(),
    };
    let stats = analytics::profile_stats(state.db.pool(), caller.id, window).await?;
    Ok(Json(stats).into_response())
}
