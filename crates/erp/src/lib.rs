//! `dentiva-erp` — seam to the external order system of record.
//!
//! The ERP owns orders, customers, and recurring-order templates. This crate
//! defines the [`OrderService`] contract the pipeline depends on, the
//! recurring-order record and its next-run date arithmetic, and an in-memory
//! implementation for dev/test. The production adapter (OAuth1-signed REST
//! client) lives outside this repository.

pub mod in_memory;
pub mod order;
pub mod recurring;

pub use in_memory::InMemoryOrderService;
pub use order::{ErpError, OrderService, OrderSource, SalesOrderDraft};
pub use recurring::{IntervalUnit, RecurringOrder, RecurringStatus};
