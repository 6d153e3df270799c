use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::product::Product;
use super::session::SessionId;

/// Upper bound for the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: i32 = 10_000;

pub fn ensure_line_quantity(quantity: i32) -> Result<(), DomainError> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(DomainError::InvalidInput(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}, got {quantity}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub id: Uuid,
    pub session_id: SessionId,
    pub product_id: Uuid,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

/// A cart line joined with its product. `product` is `None` when the product
/// was deleted after being added.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub line: CartLine,
    pub product: Option<Product>,
}
