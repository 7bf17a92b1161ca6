//! HTTP room API.
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | POST | `/room/create` | create a room |
//! | POST | `/room/join` | take the second slot |
//! | GET | `/room/info/{room_id}` | room snapshot |
//! | DELETE | `/room/delete` | admin: delete the room |
//! | POST | `/room/delete/user` | admin: clear the second slot |
//! | GET | `/room/start/{room_id}` | start the game |
//! | POST | `/room/leave` | a player leaves |
//!
//! Failures are `{"error": "..."}` with the status from [`ApiError`].

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tictac_protocol::{Room, RoomId};
use tictac_room::{LeaveOutcome, RoomError, RoomService};
use tictac_store::RoomStore;

/// Builds the room API router over a shared room service.
pub fn router<S: RoomStore>(rooms: Arc<RoomService<S>>) -> Router {
    Router::new()
        .route("/room/create", post(create_room::<S>))
        .route("/room/join", post(join_room::<S>))
        .route("/room/info/{room_id}", get(room_info::<S>))
        .route("/room/delete", delete(delete_room::<S>))
        .route("/room/delete/user", post(remove_user::<S>))
        .route("/room/start/{room_id}", get(start_game::<S>))
        .route("/room/leave", post(leave_room::<S>))
        .with_state(rooms)
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub admin: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
    pub user1: String,
    /// Always `null`: nobody has joined yet.
    pub user2: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    #[serde(default, rename = "roomID")]
    pub room_id: String,
    #[serde(default)]
    pub user: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
    pub user1: String,
    pub user2: String,
}

/// Body of the admin-only operations.
#[derive(Debug, Deserialize)]
pub struct AdminRequest {
    #[serde(default, rename = "roomID")]
    pub room_id: String,
    #[serde(default)]
    pub admin: String,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRoomRequest {
    #[serde(default, rename = "roomID")]
    pub room_id: String,
    #[serde(default)]
    pub user: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// A failed request: status code plus the message for `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn invalid_request(rejection: &JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "failed to parse request");
        Self::bad_request("Invalid request")
    }

    fn validation_failed() -> Self {
        Self::bad_request("Validation failed")
    }

    /// Store failures are 500 with a fixed message; anything else is
    /// passed through `other`.
    fn from_room(err: RoomError, internal: &str, other: impl FnOnce(RoomError) -> Self) -> Self {
        if err.is_store_failure() {
            tracing::error!(error = %err, "room store failure");
            Self::new(StatusCode::INTERNAL_SERVER_ERROR, internal)
        } else {
            other(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, message = %self.message, "request failed");
        (
            self.status,
            Json(serde_json::json!({"error": self.message})),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn create_room<S: RoomStore>(
    State(rooms): State<Arc<RoomService<S>>>,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<Json<CreateRoomResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::invalid_request(&e))?;
    if req.admin.is_empty() {
        return Err(ApiError::validation_failed());
    }

    let room = rooms.create_room(&req.admin).await.map_err(|e| {
        ApiError::from_room(e, "Failed to create room", |e| ApiError::bad_request(e.to_string()))
    })?;
    Ok(Json(CreateRoomResponse {
        room_id: room.id,
        user1: room.user1,
        user2: None,
    }))
}

pub async fn join_room<S: RoomStore>(
    State(rooms): State<Arc<RoomService<S>>>,
    payload: Result<Json<JoinRoomRequest>, JsonRejection>,
) -> Result<Json<JoinRoomResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::invalid_request(&e))?;
    if req.room_id.is_empty() || req.user.is_empty() {
        return Err(ApiError::validation_failed());
    }

    let room = rooms
        .join_room(&RoomId::from(req.room_id), &req.user)
        .await
        .map_err(|e| {
            ApiError::from_room(e, "Failed to join room", |e| ApiError::bad_request(e.to_string()))
        })?;
    Ok(Json(JoinRoomResponse {
        room_id: room.id,
        user1: room.user1,
        user2: room.user2,
    }))
}

pub async fn room_info<S: RoomStore>(
    State(rooms): State<Arc<RoomService<S>>>,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    let room_id = RoomId::from(room_id);
    tracing::debug!(%room_id, "fetching room info");
    let room = rooms.get_room_info(&room_id).await.map_err(|e| {
        ApiError::from_room(e, "Failed to get room info", |_| {
            ApiError::new(StatusCode::NOT_FOUND, "Room not found")
        })
    })?;
    Ok(Json(room))
}

pub async fn delete_room<S: RoomStore>(
    State(rooms): State<Arc<RoomService<S>>>,
    payload: Result<Json<AdminRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let room_id = authorize(&rooms, payload, "Only the admin can delete the room").await?;
    rooms.delete_room(&room_id).await.map_err(|e| {
        ApiError::from_room(e, "Failed to delete room", |e| ApiError::bad_request(e.to_string()))
    })?;
    Ok(MessageResponse::new("Room deleted successfully"))
}

pub async fn remove_user<S: RoomStore>(
    State(rooms): State<Arc<RoomService<S>>>,
    payload: Result<Json<AdminRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let room_id = authorize(&rooms, payload, "Only the admin can remove a user").await?;
    rooms.remove_user(&room_id).await.map_err(|e| {
        ApiError::from_room(e, "Failed to remove user", |e| ApiError::bad_request(e.to_string()))
    })?;
    Ok(MessageResponse::new("User removed successfully"))
}

pub async fn start_game<S: RoomStore>(
    State(rooms): State<Arc<RoomService<S>>>,
    Path(room_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    rooms
        .start_game(&RoomId::from(room_id))
        .await
        .map_err(|e| {
            ApiError::from_room(e, "Failed to start game", |e| ApiError::bad_request(e.to_string()))
        })?;
    Ok(MessageResponse::new("Game started"))
}

pub async fn leave_room<S: RoomStore>(
    State(rooms): State<Arc<RoomService<S>>>,
    payload: Result<Json<LeaveRoomRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::invalid_request(&e))?;
    if req.room_id.is_empty() || req.user.is_empty() {
        return Err(ApiError::validation_failed());
    }

    let outcome = rooms
        .leave_room(&RoomId::from(req.room_id), &req.user)
        .await
        .map_err(|e| {
            ApiError::from_room(e, "Failed to leave room", |e| ApiError::bad_request(e.to_string()))
        })?;
    Ok(MessageResponse::new(match outcome {
        LeaveOutcome::RoomDeleted => "Room deleted",
        LeaveOutcome::SlotCleared => "Left room",
    }))
}

/// Parses and validates an admin body, then checks the admin owns the
/// room. Returns the room id on success.
async fn authorize<S: RoomStore>(
    rooms: &RoomService<S>,
    payload: Result<Json<AdminRequest>, JsonRejection>,
    forbidden: &str,
) -> Result<RoomId, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::invalid_request(&e))?;
    if req.room_id.is_empty() || req.admin.is_empty() {
        return Err(ApiError::validation_failed());
    }
    let room_id = RoomId::from(req.room_id);
    rooms
        .authorize_admin(&room_id, &req.admin)
        .await
        .map_err(|e| {
            ApiError::from_room(e, "Failed to check room admin", |_| {
                ApiError::new(StatusCode::FORBIDDEN, forbidden)
            })
        })?;
    Ok(room_id)
}

#[cfg(test)]
mod tests {
    //! Handlers are called directly with extracted arguments; routing is
    //! covered by the server integration tests.

    use super::*;
    use tictac_protocol::RoomStatus;
    use tictac_store::MemoryStore;

    type Rooms = Arc<RoomService<MemoryStore>>;

    fn rooms() -> Rooms {
        Arc::new(RoomService::new(MemoryStore::new()))
    }

    async fn create(rooms: &Rooms, admin: &str) -> RoomId {
        create_room(
            State(Arc::clone(rooms)),
            Ok(Json(CreateRoomRequest {
                admin: admin.into(),
            })),
        )
        .await
        .unwrap()
        .0
        .room_id
    }

    async fn join(rooms: &Rooms, room_id: &RoomId, user: &str) -> Result<Json<JoinRoomResponse>, ApiError> {
        join_room(
            State(Arc::clone(rooms)),
            Ok(Json(JoinRoomRequest {
                room_id: room_id.to_string(),
                user: user.into(),
            })),
        )
        .await
    }

    fn admin_body(room_id: &RoomId, admin: &str) -> Result<Json<AdminRequest>, JsonRejection> {
        Ok(Json(AdminRequest {
            room_id: room_id.to_string(),
            admin: admin.into(),
        }))
    }

    #[tokio::test]
    async fn test_create_room_response_shape() {
        let rooms = rooms();
        let response = create_room(
            State(Arc::clone(&rooms)),
            Ok(Json(CreateRoomRequest {
                admin: "alice".into(),
            })),
        )
        .await
        .unwrap()
        .0;

        assert!(response.room_id.as_str().starts_with("room-"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["user1"], "alice");
        assert!(json["user2"].is_null());
        assert_eq!(json["roomID"], response.room_id.as_str());
    }

    #[tokio::test]
    async fn test_create_room_validation_and_store_errors() {
        let rooms = rooms();
        let err = create_room(
            State(Arc::clone(&rooms)),
            Ok(Json(CreateRoomRequest { admin: String::new() })),
        )
        .await
        .unwrap_err();
        assert_eq!(err, ApiError::validation_failed());

        rooms.store().set_available(false);
        let err = create_room(
            State(Arc::clone(&rooms)),
            Ok(Json(CreateRoomRequest {
                admin: "alice".into(),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to create room");
    }

    #[tokio::test]
    async fn test_join_then_info() {
        let rooms = rooms();
        let id = create(&rooms, "alice").await;

        let joined = join(&rooms, &id, "bob").await.unwrap().0;
        assert_eq!(joined.user1, "alice");
        assert_eq!(joined.user2, "bob");

        let info = room_info(State(Arc::clone(&rooms)), Path(id.to_string()))
            .await
            .unwrap()
            .0;
        assert_eq!(info.user2, "bob");
        assert_eq!(info.status, RoomStatus::Waiting);
    }

    #[tokio::test]
    async fn test_join_errors_are_bad_request() {
        let rooms = rooms();
        let id = create(&rooms, "alice").await;

        let err = join(&rooms, &id, "alice").await.unwrap_err();
        assert_eq!(err, ApiError::bad_request("nickname already in use"));

        assert_eq!(join(&rooms, &id, "bob").await.unwrap().0.user2, "bob");
        let err = join(&rooms, &id, "carol").await.unwrap_err();
        assert_eq!(err, ApiError::bad_request("room is full"));

        let err = join(&rooms, &RoomId::from("room-none"), "carol").await.unwrap_err();
        assert_eq!(err, ApiError::bad_request("room not found"));

        let err = join(&rooms, &RoomId::from(""), "carol").await.unwrap_err();
        assert_eq!(err, ApiError::validation_failed());
    }

    #[tokio::test]
    async fn test_room_info_missing_is_404() {
        let rooms = rooms();
        let err = room_info(State(rooms), Path("room-missing".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Room not found");
    }

    #[tokio::test]
    async fn test_delete_room_requires_admin() {
        let rooms = rooms();
        let id = create(&rooms, "alice").await;

        let err = delete_room(State(Arc::clone(&rooms)), admin_body(&id, "bob"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Only the admin can delete the room");

        let ok = delete_room(State(Arc::clone(&rooms)), admin_body(&id, "alice"))
            .await
            .unwrap()
            .0;
        assert_eq!(ok.message, "Room deleted successfully");
        assert!(rooms.store().is_empty().await);

        // Gone rooms are forbidden too, not 404.
        let err = delete_room(State(Arc::clone(&rooms)), admin_body(&id, "alice"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_remove_user_requires_admin() {
        let rooms = rooms();
        let id = create(&rooms, "alice").await;
        assert_eq!(join(&rooms, &id, "bob").await.unwrap().0.user2, "bob");

        let err = remove_user(State(Arc::clone(&rooms)), admin_body(&id, "bob"))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Only the admin can remove a user");

        let ok = remove_user(State(Arc::clone(&rooms)), admin_body(&id, "alice"))
            .await
            .unwrap()
            .0;
        assert_eq!(ok.message, "User removed successfully");
        assert_eq!(rooms.get_room_info(&id).await.unwrap().user2, "");
    }

    #[tokio::test]
    async fn test_start_game() {
        let rooms = rooms();
        let id = create(&rooms, "alice").await;

        let err = start_game(State(Arc::clone(&rooms)), Path(id.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::bad_request("cannot start game, room is not full"));

        assert_eq!(join(&rooms, &id, "bob").await.unwrap().0.user2, "bob");
        let ok = start_game(State(Arc::clone(&rooms)), Path(id.to_string()))
            .await
            .unwrap()
            .0;
        assert_eq!(ok.message, "Game started");
        assert_eq!(
            rooms.get_room_info(&id).await.unwrap().status,
            RoomStatus::Started
        );

        let err = start_game(State(rooms), Path("room-none".into()))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::bad_request("room not found"));
    }

    #[tokio::test]
    async fn test_leave_room() {
        let rooms = rooms();
        let id = create(&rooms, "alice").await;
        assert_eq!(join(&rooms, &id, "bob").await.unwrap().0.user2, "bob");

        let leave = |user: &str| {
            let rooms = Arc::clone(&rooms);
            let body = LeaveRoomRequest {
                room_id: id.to_string(),
                user: user.into(),
            };
            async move { leave_room(State(rooms), Ok(Json(body))).await }
        };

        let err = leave("mallory").await.unwrap_err();
        assert_eq!(err, ApiError::bad_request("user not found in room"));

        assert_eq!(leave("bob").await.unwrap().0.message, "Left room");
        assert_eq!(leave("alice").await.unwrap().0.message, "Room deleted");
        assert!(rooms.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_api_error_renders_error_body() {
        let response = ApiError::new(StatusCode::FORBIDDEN, "nope").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
