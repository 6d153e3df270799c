use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image: Option<String>,
    pub category: Option<String>,
    pub is_new: Option<bool>,
    /// Key the external warehouse uses for this product.
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image: Option<String>,
    pub category: Option<String>,
    pub is_new: Option<bool>,
    pub external_id: Option<String>,
}

/// Most decimal places a price may carry.
pub const PRICE_SCALE: i64 = 2;
/// Longest name, category or warehouse id a product may have, in characters.
pub const MAX_TEXT_LEN: usize = 255;

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "product name must not be empty".to_string(),
            ));
        }
        ensure_text_len("name", Some(self.name.as_str()))?;
        ensure_text_len("category", self.category.as_deref())?;
        ensure_text_len("external_id", self.external_id.as_deref())?;
        ensure_price(&self.price)
    }
}

fn ensure_text_len(field: &str, value: Option<&str>) -> Result<(), DomainError> {
    match value {
        Some(v) if v.chars().count() > MAX_TEXT_LEN => Err(DomainError::InvalidInput(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        ))),
        _ => Ok(()),
    }
}

/// Prices are non-negative, have at most two decimals and stay below 10^10.
pub fn ensure_price(price: &BigDecimal) -> Result<(), DomainError> {
    if *price < BigDecimal::zero() {
        return Err(DomainError::InvalidInput(format!(
            "price must be non-negative, got {price}"
        )));
    }
    let (_, scale) = price.normalized().as_bigint_and_exponent();
    if scale > PRICE_SCALE {
        return Err(DomainError::InvalidInput(format!(
            "price may have at most {PRICE_SCALE} decimal places, got {price}"
        )));
    }
    if *price >= BigDecimal::from(10_000_000_000i64) {
        return Err(DomainError::InvalidInput(format!(
            "price must be below 10000000000, got {price}"
        )));
    }
    Ok(())
}

/// `price` at the scale it is stored with.
pub fn stored_price(price: BigDecimal) -> BigDecimal {
    price.with_scale(PRICE_SCALE)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn price(raw: &str) -> BigDecimal {
        BigDecimal::from_str(raw).expect("valid decimal")
    }

    fn product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            price: price("9.99"),
            image: None,
            category: None,
            is_new: None,
            external_id: None,
        }
    }

    #[test]
    fn accepts_prices_that_fit_the_column() {
        for raw in ["0", "1.9", "1.90", "1.900", "9999999999.99"] {
            assert!(ensure_price(&price(raw)).is_ok(), "{raw} should be accepted");
        }
    }

    #[test]
    fn rejects_more_than_two_decimals() {
        assert!(matches!(
            ensure_price(&price("1.999")),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_prices_of_ten_billion_or_more() {
        assert!(ensure_price(&price("10000000000")).is_err());
        assert!(ensure_price(&price("1e12")).is_err());
    }

    #[test]
    fn rejects_overlong_name_and_external_id() {
        assert!(product(&"n".repeat(MAX_TEXT_LEN)).validate().is_ok());
        assert!(product(&"n".repeat(MAX_TEXT_LEN + 1)).validate().is_err());

        let mut long_id = product("Desk");
        long_id.external_id = Some("x".repeat(MAX_TEXT_LEN + 1));
        assert!(matches!(long_id.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn stored_price_has_two_decimals() {
        assert_eq!(stored_price(price("1.9")).to_string(), "1.90");
        assert_eq!(stored_price(price("7")).to_string(), "7.00");
    }
}
