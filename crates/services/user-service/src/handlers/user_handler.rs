//! User handlers.
//!
//! Each handler performs one repository call. Failures are translated and
//! logged once through [`AppError::reply`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tracing::info;

use common::{parse_id, AppResult, BodyRejection, JsonBody, MessageResponse, OptionExt};
use domain::{CreateUser, Resource, UpdateUser, User};

use crate::state::AppState;

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Malformed JSON body", body = common::ErrorResponse),
        (status = 500, description = "Missing field or store failure (e.g. duplicate email)", body = common::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<JsonBody<CreateUser>, BodyRejection>,
) -> Response {
    let result: AppResult<User> = async {
        let JsonBody(payload) = payload?;
        let new_user = payload.into_new_user()?;
        state.users.create(new_user).await
    }
    .await;

    match result {
        Ok(user) => {
            info!(
                userId = user.id,
                name = user.name.as_str(),
                email = user.email.as_str(),
                "User created"
            );
            (StatusCode::CREATED, Json(user)).into_response()
        }
        Err(err) => err.reply(User::NAME, "create", None),
    }
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users ordered by ID", body = Vec<User>),
        (status = 500, description = "Store failure", body = common::ErrorResponse)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Response {
    match state.users.list().await {
        Ok(users) => {
            info!(count = users.len(), "Users listed");
            Json(users).into_response()
        }
        Err(err) => err.reply(User::NAME, "list", None),
    }
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "User not found", body = common::ErrorResponse),
        (status = 500, description = "Store failure", body = common::ErrorResponse)
    )
)]
pub async fn get_user(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let result: AppResult<User> = async {
        let id = parse_id(&raw_id)?;
        state.users.find_by_id(id).await?.ok_or_not_found()
    }
    .await;

    match result {
        Ok(user) => {
            info!(userId = user.id, "User retrieved");
            Json(user).into_response()
        }
        Err(err) => err.reply(User::NAME, "get", Some(&raw_id)),
    }
}

/// Update user fields present in the body
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Malformed JSON body", body = common::ErrorResponse),
        (status = 404, description = "User not found", body = common::ErrorResponse),
        (status = 500, description = "Store failure", body = common::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<JsonBody<UpdateUser>, BodyRejection>,
) -> Response {
    let result: AppResult<User> = async {
        let id = parse_id(&raw_id)?;
        let JsonBody(changes) = payload?;
        state.users.update(id, changes).await
    }
    .await;

    match result {
        Ok(user) => {
            info!(
                userId = user.id,
                name = user.name.as_str(),
                email = user.email.as_str(),
                "User updated"
            );
            Json(user).into_response()
        }
        Err(err) => err.reply(User::NAME, "update", Some(&raw_id)),
    }
}

/// Delete user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "User not found", body = common::ErrorResponse),
        (status = 500, description = "Store failure", body = common::ErrorResponse)
    )
)]
pub async fn delete_user(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let result: AppResult<i32> = async {
        let id = parse_id(&raw_id)?;
        state.users.delete(id).await?;
        Ok(id)
    }
    .await;

    match result {
        Ok(id) => {
            info!(userId = id, "User deleted");
            Json(MessageResponse::new("User deleted successfully")).into_response()
        }
        Err(err) => err.reply(User::NAME, "delete", Some(&raw_id)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, extract::Request, http::header};
    use chrono::Utc;
    use common::{testing::LogCapture, AppError, ServiceContext};
    use domain::NewUser;
    use mockall::predicate::eq;
    use sea_orm::DbErr;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::repository::MockUserRepository;

    fn sample_user(id: i32) -> User {
        User {
            id,
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            created_at: Utc::now(),
        }
    }

    fn app(repo: MockUserRepository) -> Router {
        let ctx = ServiceContext::init("user-service", "0.1.0").unwrap();
        Router::new()
            .nest("/users", user_routes())
            .with_state(AppState::new(ctx, Arc::new(repo)))
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_user_returns_201() {
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .with(eq(NewUser {
                name: "Ann".to_string(),
                email: "ann@x.com".to_string(),
            }))
            .times(1)
            .returning(|_| Ok(sample_user(1)));

        let response = app(repo)
            .oneshot(request(
                "POST",
                "/users",
                Some(json!({"name": "Ann", "email": "ann@x.com"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["email"], "ann@x.com");
    }

    #[tokio::test]
    async fn test_create_user_missing_email_never_reaches_store() {
        let capture = LogCapture::new();
        let _guard = capture.install("user-service");
        let mut repo = MockUserRepository::new();
        repo.expect_create().never();

        let response = app(repo)
            .oneshot(request("POST", "/users", Some(json!({"name": "Ann"}))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({"error": "email is required"}));
        assert_eq!(capture.at_level("error").len(), 1);
    }

    #[tokio::test]
    async fn test_create_user_malformed_json_is_400() {
        let mut repo = MockUserRepository::new();
        repo.expect_create().never();

        let response = app(repo)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/users")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"name\":"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_get_user_not_found_logs_one_warning() {
        let capture = LogCapture::new();
        let _guard = capture.install("user-service");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .with(eq(42))
            .times(1)
            .returning(|_| Ok(None));

        let response = app(repo)
            .oneshot(request("GET", "/users/42", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({"error": "User not found"}));

        let warnings = capture.at_level("warn");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].metadata["id"], "42");
        assert_eq!(warnings[0].metadata["operation"], "get");
    }

    #[tokio::test]
    async fn test_non_integer_id_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().never();

        let response = app(repo)
            .oneshot(request("GET", "/users/abc", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_sentinel_maps_to_404() {
        let mut repo = MockUserRepository::new();
        repo.expect_update()
            .times(1)
            .returning(|_, _| Err(AppError::Store(DbErr::RecordNotUpdated)));

        let response = app(repo)
            .oneshot(request("PUT", "/users/7", Some(json!({"name": "Bob"}))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({"error": "User not found"}));
    }

    #[tokio::test]
    async fn test_update_passes_only_present_fields() {
        let mut repo = MockUserRepository::new();
        repo.expect_update()
            .with(
                eq(3),
                eq(UpdateUser {
                    name: Some("Bob".to_string()),
                    email: None,
                }),
            )
            .times(1)
            .returning(|id, _| {
                let mut user = sample_user(id);
                user.name = "Bob".to_string();
                Ok(user)
            });

        let response = app(repo)
            .oneshot(request("PUT", "/users/3", Some(json!({"name": "Bob"}))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["name"], "Bob");
        assert_eq!(body["email"], "ann@x.com");
    }

    #[tokio::test]
    async fn test_delete_user_returns_message() {
        let mut repo = MockUserRepository::new();
        repo.expect_delete().with(eq(5)).times(1).returning(|_| Ok(()));

        let response = app(repo)
            .oneshot(request("DELETE", "/users/5", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"message": "User deleted successfully"})
        );
    }

    #[tokio::test]
    async fn test_store_failure_returns_raw_message() {
        let mut repo = MockUserRepository::new();
        repo.expect_list()
            .times(1)
            .returning(|| Err(AppError::Store(DbErr::Custom("connection refused".to_string()))));

        let response = app(repo)
            .oneshot(request("GET", "/users", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
    }
}
