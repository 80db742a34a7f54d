//! `dentiva-core` — shared domain primitives for the storefront backend.
//!
//! Record identifiers, money, and the domain error model. No IO, no async.

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, ItemId, OrderId, RecurringOrderId};
pub use money::{Currency, Money};
