//! Scriptable mock gateway for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use dentiva_core::{CustomerId, Money, OrderId};

use crate::{
    GatewayCustomerId, GatewayError, GatewayInvoiceId, GatewayTransaction, PaymentGateway,
};

/// Which step the mock should fail at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FailAt {
    #[default]
    Nothing,
    Customer,
    Invoice,
    Transaction,
}

/// In-memory gateway double.
///
/// Customers are deduplicated by ERP customer id (so `ensure_customer` is
/// genuinely an upsert); invoices and transactions get sequential ids. A
/// failure point set via [`fail_at`](Self::fail_at) applies to every call
/// until changed, which lets tests exercise each abandonment path of the
/// payment stage.
#[derive(Debug, Default)]
pub struct MockGateway {
    customers: RwLock<HashMap<CustomerId, GatewayCustomerId>>,
    invoices: RwLock<Vec<(GatewayInvoiceId, GatewayCustomerId, OrderId, Money)>>,
    transactions: RwLock<Vec<(String, GatewayInvoiceId)>>,
    seq: AtomicU64,
    fail_at: RwLock<FailAt>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(&self, point: FailAt) {
        *self.fail_at.write().unwrap() = point;
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn should_fail(&self, point: FailAt) -> bool {
        *self.fail_at.read().unwrap() == point
    }

    /// Number of transactions created (i.e. charge attempts that got through).
    pub fn transaction_count(&self) -> usize {
        self.transactions.read().unwrap().len()
    }

    /// Number of distinct gateway customers.
    pub fn customer_count(&self) -> usize {
        self.customers.read().unwrap().len()
    }

    /// Number of invoices created, including ones whose transaction failed.
    pub fn invoice_count(&self) -> usize {
        self.invoices.read().unwrap().len()
    }
}

impl PaymentGateway for MockGateway {
    fn ensure_customer(
        &self,
        customer_id: &CustomerId,
        _email: &str,
    ) -> Result<GatewayCustomerId, GatewayError> {
        if self.should_fail(FailAt::Customer) {
            return Err(GatewayError::Upstream(
                "simulated customer failure".to_string(),
            ));
        }

        let mut customers = self.customers.write().unwrap();
        if let Some(existing) = customers.get(customer_id) {
            return Ok(existing.clone());
        }

        let id = GatewayCustomerId(format!("cus_{}", self.next_seq()));
        customers.insert(customer_id.clone(), id.clone());
        Ok(id)
    }

    fn create_invoice(
        &self,
        customer: &GatewayCustomerId,
        order_id: &OrderId,
        amount: Money,
    ) -> Result<GatewayInvoiceId, GatewayError> {
        if self.should_fail(FailAt::Invoice) {
            return Err(GatewayError::InvalidRequest(
                "simulated invoice failure".to_string(),
            ));
        }

        let id = GatewayInvoiceId(format!("inv_{}", self.next_seq()));
        self.invoices.write().unwrap().push((
            id.clone(),
            customer.clone(),
            order_id.clone(),
            amount,
        ));
        Ok(id)
    }

    fn create_transaction(
        &self,
        invoice: &GatewayInvoiceId,
    ) -> Result<GatewayTransaction, GatewayError> {
        if self.should_fail(FailAt::Transaction) {
            return Err(GatewayError::Declined(
                "simulated transaction decline".to_string(),
            ));
        }

        let txn_id = format!("txn_{}", self.next_seq());
        self.transactions
            .write()
            .unwrap()
            .push((txn_id.clone(), invoice.clone()));

        Ok(GatewayTransaction {
            payment_url: format!("https://pay.example.com/t/{txn_id}"),
            transaction_id: txn_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentiva_core::Currency;

    fn ids() -> (CustomerId, OrderId, Money) {
        (
            CustomerId::new("C-1").unwrap(),
            OrderId::new("SO-1").unwrap(),
            Money::new(1_000, Currency::Usd).unwrap(),
        )
    }

    #[test]
    fn ensure_customer_is_an_upsert() {
        let gw = MockGateway::new();
        let (customer, _, _) = ids();

        let a = gw.ensure_customer(&customer, "a@example.com").unwrap();
        let b = gw.ensure_customer(&customer, "a@example.com").unwrap();
        assert_eq!(a, b);
        assert_eq!(gw.customer_count(), 1);
    }

    #[test]
    fn full_flow_creates_transaction_with_payment_url() {
        let gw = MockGateway::new();
        let (customer, order, amount) = ids();

        let cus = gw.ensure_customer(&customer, "a@example.com").unwrap();
        let inv = gw.create_invoice(&cus, &order, amount).unwrap();
        let txn = gw.create_transaction(&inv).unwrap();

        assert!(txn.payment_url.contains(&txn.transaction_id));
        assert_eq!(gw.transaction_count(), 1);
    }

    #[test]
    fn invoice_failure_leaves_customer_behind() {
        // No compensation: the customer created before the failing invoice
        // step is kept.
        let gw = MockGateway::new();
        let (customer, order, amount) = ids();

        let cus = gw.ensure_customer(&customer, "a@example.com").unwrap();
        gw.fail_at(FailAt::Invoice);
        assert!(gw.create_invoice(&cus, &order, amount).is_err());
        assert_eq!(gw.customer_count(), 1);
        assert_eq!(gw.invoice_count(), 0);
    }
}
