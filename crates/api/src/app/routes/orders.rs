use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use dentiva_core::{Currency, CustomerId, ItemId, Money};
use dentiva_erp::{OrderSource, SalesOrderDraft};

use crate::app::dto::{CreateOrderRequest, CreateOrderResponse};
use crate::app::errors::{json_error, process_error_to_response};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// `POST /orders` — storefront checkout.
///
/// Creates the sales order in the ERP and publishes `order.created`; the
/// payment stage picks it up from there. The confirmation email address is
/// taken from the authenticated principal, not the body.
pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreateOrderRequest>,
) -> impl IntoResponse {
    let draft = match draft_from_request(&body, principal.email()) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    match services.processor.process(&draft) {
        Ok(order_id) => (
            StatusCode::CREATED,
            Json(CreateOrderResponse {
                order_id: order_id.into_string(),
            }),
        )
            .into_response(),
        Err(e) => process_error_to_response(e),
    }
}

fn draft_from_request(
    body: &CreateOrderRequest,
    email: &str,
) -> Result<SalesOrderDraft, axum::response::Response> {
    let invalid = |msg: String| json_error(StatusCode::BAD_REQUEST, "invalid_order", msg);

    let customer_id = CustomerId::new(&body.customer_id).map_err(|e| invalid(e.to_string()))?;
    let item_id = ItemId::new(&body.item_id).map_err(|e| invalid(e.to_string()))?;
    let currency = Currency::parse(&body.currency).map_err(|e| invalid(e.to_string()))?;
    let amount = Money::new(body.amount_cents, currency).map_err(|e| invalid(e.to_string()))?;

    if body.quantity == 0 {
        return Err(invalid("quantity must be at least 1".to_string()));
    }

    Ok(SalesOrderDraft {
        customer_id,
        customer_email: email.to_string(),
        item_id,
        quantity: body.quantity,
        amount,
        source: OrderSource::Storefront,
    })
}
