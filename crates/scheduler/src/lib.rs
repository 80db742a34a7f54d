//! `dentiva-scheduler` — recurring orders into the pipeline, once a day.
//!
//! A daily cycle queries the ERP for due recurring-order templates, submits
//! one sales order per template through the job queue (with the queue's
//! synchronous fallback), and advances each template's next-run date.
//!
//! Failure handling is deliberately asymmetric:
//! - a failed order creation skips the next-run update, so the template
//!   stays due and is retried the next day;
//! - a failed next-run update after a successful creation is logged but the
//!   cycle still counts the template as processed. Until the PATCH goes
//!   through, the template is recreated every day (known gap, see
//!   DESIGN.md).

pub mod cycle;
pub mod processor;
pub mod timer;

pub use cycle::{CycleReport, RecurringOrderScheduler, SchedulerError};
pub use processor::{OrderProcessor, ProcessError};
pub use timer::{DailyTimer, TimerHandle};
