//! Domain layer - Core business entities and request types.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Both services share these types; each service owns persistence for its own
//! resource.

pub mod constants;
pub mod error;
pub mod order;
pub mod resource;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use order::{CreateOrder, NewOrder, Order, UpdateOrder};
pub use resource::{require, Resource};
pub use user::{CreateUser, NewUser, UpdateUser, User};
