//! Order domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ORDER_STATUS;
use crate::error::DomainResult;
use crate::resource::{require, Resource};

/// Order domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Order {
    /// Store-assigned identifier
    pub id: i32,
    /// Identifier of the ordering user (owned by user-service)
    pub user_id: i32,
    pub product: String,
    pub quantity: i32,
    /// Unit price
    pub price: f64,
    pub status: String,
    /// Creation timestamp assigned on insert
    pub created_at: DateTime<Utc>,
}

impl Resource for Order {
    const NAME: &'static str = "Order";
}

/// Order data that passed the presence check and is ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: i32,
    pub product: String,
    pub quantity: i32,
    pub price: f64,
    pub status: String,
}

/// Order creation request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateOrder {
    #[cfg_attr(feature = "openapi", schema(example = 1))]
    pub user_id: Option<i32>,
    #[cfg_attr(feature = "openapi", schema(example = "Keyboard"))]
    pub product: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = 2))]
    pub quantity: Option<i32>,
    #[cfg_attr(feature = "openapi", schema(example = 49.99))]
    pub price: Option<f64>,
    /// Defaults to `pending`
    pub status: Option<String>,
}

impl CreateOrder {
    /// Check that every required field is present and fill in defaults.
    pub fn into_new_order(self) -> DomainResult<NewOrder> {
        Ok(NewOrder {
            user_id: require(self.user_id, "userId")?,
            product: require(self.product, "product")?,
            quantity: require(self.quantity, "quantity")?,
            price: require(self.price, "price")?,
            status: self
                .status
                .unwrap_or_else(|| DEFAULT_ORDER_STATUS.to_string()),
        })
    }
}

/// Order update request body. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateOrder {
    pub user_id: Option<i32>,
    pub product: Option<String>,
    pub quantity: Option<i32>,
    pub price: Option<f64>,
    pub status: Option<String>,
}

impl UpdateOrder {
    /// True when the request carries no field to change.
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.product.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
            && self.status.is_none()
    }
}
