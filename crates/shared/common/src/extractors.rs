//! Request extractors.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{translate, AppError, AppResult};

/// JSON extractor rejecting with a [`BodyRejection`].
///
/// Handlers usually take `Result<JsonBody<T>, BodyRejection>` and propagate
/// the rejection with `?` as [`AppError::BadRequest`], so it is logged with
/// the resource and operation it belongs to.
pub struct JsonBody<T>(pub T);

/// A body that is not valid JSON for the endpoint's input type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRejection(pub String);

impl From<BodyRejection> for AppError {
    fn from(rejection: BodyRejection) -> Self {
        AppError::BadRequest(rejection.0)
    }
}

/// Used when a handler takes `JsonBody<T>` directly.
impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        let translation = translate(&AppError::from(self), "Body");
        translation.log("Body", "decode", None);
        translation.into_response()
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = BodyRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| BodyRejection(e.body_text()))?;

        Ok(JsonBody(value))
    }
}

/// Parse a raw path ID.
///
/// IDs are store-issued integers; anything else can never match a record.
pub fn parse_id(raw: &str) -> AppResult<i32> {
    raw.parse().map_err(|_| AppError::NotFound)
}
