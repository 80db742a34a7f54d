//! `dentiva-gateway` — seam to the payment gateway.
//!
//! The payment stage drives the gateway in three steps: ensure a gateway
//! customer exists, create an invoice against it, then create the charging
//! transaction. This crate defines that contract plus a scriptable mock; the
//! concrete Stripe/VersaPay adapters live outside this repository.

pub mod mock;

pub use mock::{FailAt, MockGateway};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dentiva_core::{CustomerId, Money, OrderId};

/// Gateway-side customer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayCustomerId(pub String);

/// Gateway-side invoice identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayInvoiceId(pub String);

/// A created gateway transaction plus its hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTransaction {
    pub transaction_id: String,
    pub payment_url: String,
}

/// Payment gateway boundary error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway refused the operation (e.g. card declined).
    #[error("gateway declined: {0}")]
    Declined(String),

    /// The request was malformed from the gateway's point of view.
    #[error("gateway rejected request: {0}")]
    InvalidRequest(String),

    /// Transport/availability failure.
    #[error("gateway unavailable: {0}")]
    Upstream(String),
}

/// Payment gateway contract.
///
/// Calls are not transactional across steps: a customer or invoice created
/// before a later step fails is not rolled back (no compensation, per the
/// pipeline design).
pub trait PaymentGateway: Send + Sync {
    /// Find-or-create the gateway customer for an ERP customer.
    fn ensure_customer(
        &self,
        customer_id: &CustomerId,
        email: &str,
    ) -> Result<GatewayCustomerId, GatewayError>;

    /// Create an invoice for the order amount against a gateway customer.
    fn create_invoice(
        &self,
        customer: &GatewayCustomerId,
        order_id: &OrderId,
        amount: Money,
    ) -> Result<GatewayInvoiceId, GatewayError>;

    /// Create the charging transaction for an invoice.
    fn create_transaction(
        &self,
        invoice: &GatewayInvoiceId,
    ) -> Result<GatewayTransaction, GatewayError>;
}

impl<T> PaymentGateway for std::sync::Arc<T>
where
    T: PaymentGateway + ?Sized,
{
    fn ensure_customer(
        &self,
        customer_id: &CustomerId,
        email: &str,
    ) -> Result<GatewayCustomerId, GatewayError> {
        (**self).ensure_customer(customer_id, email)
    }

    fn create_invoice(
        &self,
        customer: &GatewayCustomerId,
        order_id: &OrderId,
        amount: Money,
    ) -> Result<GatewayInvoiceId, GatewayError> {
        (**self).create_invoice(customer, order_id, amount)
    }

    fn create_transaction(
        &self,
        invoice: &GatewayInvoiceId,
    ) -> Result<GatewayTransaction, GatewayError> {
        (**self).create_transaction(invoice)
    }
}
