//! Order repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, DatabaseConnection, DbErr, EntityTrait, QueryOrder,
    Set,
};

use super::entities::order::{self, ActiveModel, Entity as OrderEntity};
use common::{AppError, AppResult};
use domain::{NewOrder, Order, UpdateOrder};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Order repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, new_order: NewOrder) -> AppResult<Order>;

    /// Newest first
    async fn list(&self) -> AppResult<Vec<Order>>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Order>>;

    /// Apply the present fields in one UPDATE; a missing row yields `RecordNotUpdated`
    async fn update(&self, id: i32, changes: UpdateOrder) -> AppResult<Order>;

    /// Zero rows affected yields `RecordNotFound`
    async fn delete(&self, id: i32) -> AppResult<()>;
}

/// SeaORM-backed implementation of OrderRepository
pub struct OrderStore {
    db: DatabaseConnection,
}

impl OrderStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderRepository for OrderStore {
    async fn create(&self, new_order: NewOrder) -> AppResult<Order> {
        let active_model = ActiveModel {
            user_id: Set(new_order.user_id),
            product: Set(new_order.product),
            quantity: Set(new_order.quantity),
            price: Set(new_order.price),
            status: Set(new_order.status),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Order::from(model))
    }

    async fn list(&self) -> AppResult<Vec<Order>> {
        let models = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Order::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Order>> {
        let result = OrderEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Order::from))
    }

    async fn update(&self, id: i32, changes: UpdateOrder) -> AppResult<Order> {
        let mut active = ActiveModel {
            id: Unchanged(id),
            ..Default::default()
        };
        if let Some(user_id) = changes.user_id {
            active.user_id = Set(user_id);
        }
        if let Some(product) = changes.product {
            active.product = Set(product);
        }
        if let Some(quantity) = changes.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }

        let model = active.update(&self.db).await?;
        Ok(Order::from(model))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = OrderEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::Store(DbErr::RecordNotFound(format!(
                "orders.id = {}",
                id
            ))));
        }

        Ok(())
    }
}
