use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{ensure_price, stored_price, NewProduct, Product};

#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    pub fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        self.products.list()
    }

    pub fn get_product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.products
            .find_by_id(id)?
            .ok_or(DomainError::ProductNotFound(id))
    }

    /// Prices are stored with exactly two decimals, whatever the backend.
    pub fn create_product(&self, mut product: NewProduct) -> Result<Product, DomainError> {
        product.validate()?;
        product.price = stored_price(product.price);
        self.products.insert(product)
    }

    pub fn set_price(&self, id: Uuid, price: BigDecimal) -> Result<Product, DomainError> {
        ensure_price(&price)?;
        self.products
            .set_price(id, stored_price(price))?
            .ok_or(DomainError::ProductNotFound(id))
    }

    /// Cart lines pointing at the product are left in place.
    pub fn delete_product(&self, id: Uuid) -> Result<(), DomainError> {
        if self.products.delete(id)? {
            Ok(())
        } else {
            Err(DomainError::ProductNotFound(id))
        }
    }

    /// Insert the demo catalog if no product exists yet. Returns how many
    /// products were inserted.
    pub fn seed_sample_products(&self) -> Result<usize, DomainError> {
        if !self.products.list()?.is_empty() {
            return Ok(0);
        }
        let samples = sample_products()?;
        let count = samples.len();
        for product in samples {
            self.products.insert(product)?;
        }
        log::info!("Seeded catalog with {} sample products", count);
        Ok(count)
    }
}

fn price(raw: &str) -> Result<BigDecimal, DomainError> {
    BigDecimal::from_str(raw).map_err(|e| DomainError::Internal(e.to_string()))
}

fn sample_products() -> Result<Vec<NewProduct>, DomainError> {
    Ok(vec![
        NewProduct {
            name: "MacBook Pro M3".to_string(),
            description: "Professional laptop with the M3 chip and a 14-inch Retina display"
                .to_string(),
            price: price("1999.99")?,
            image: Some(
                "https://images.unsplash.com/photo-1517336714731-489689fd1ca8?w=800".to_string(),
            ),
            category: Some("Computers".to_string()),
            is_new: Some(true),
            external_id: Some("1".to_string()),
        },
        NewProduct {
            name: "Dell XPS 15".to_string(),
            description: "Premium ultrabook with an Intel i7 processor and 16GB RAM".to_string(),
            price: price("1599.99")?,
            image: Some(
                "https://images.unsplash.com/photo-1593642632823-8f785ba67e45?w=800".to_string(),
            ),
            category: Some("Computers".to_string()),
            is_new: Some(false),
            external_id: Some("2".to_string()),
        },
        NewProduct {
            name: "Gaming PC RTX 4090".to_string(),
            description: "High-performance gaming PC with an RTX 4090 and 32GB RAM".to_string(),
            price: price("3499.99")?,
            image: Some(
                "https://images.unsplash.com/photo-1587202372634-32705e3bf49c?w=800".to_string(),
            ),
            category: Some("Computers".to_string()),
            is_new: Some(true),
            external_id: Some("3".to_string()),
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryProductRepository;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(InMemoryProductRepository::new()))
    }

    #[test]
    fn seeding_is_idempotent() {
        let catalog = service();
        assert_eq!(catalog.seed_sample_products().expect("seed"), 3);
        assert_eq!(catalog.seed_sample_products().expect("seed again"), 0);

        let products = catalog.list_products().expect("list");
        assert_eq!(products.len(), 3);
        assert!(products.iter().all(|p| p.external_id.is_some()));
    }

    #[test]
    fn rejects_negative_price() {
        let catalog = service();
        catalog.seed_sample_products().expect("seed");
        let id = catalog.list_products().expect("list")[0].id;

        let err = catalog
            .set_price(id, BigDecimal::from(-1))
            .expect_err("negative price");
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn rejects_price_with_three_decimals() {
        let catalog = service();
        catalog.seed_sample_products().expect("seed");
        let id = catalog.list_products().expect("list")[0].id;

        let err = catalog
            .set_price(id, BigDecimal::from_str("1.999").expect("valid decimal"))
            .expect_err("too precise");
        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert_eq!(
            catalog.get_product(id).expect("product").price.to_string(),
            "1999.99"
        );
    }

    #[test]
    fn prices_are_kept_at_two_decimals() {
        let catalog = service();
        let created = catalog
            .create_product(NewProduct {
                name: "Pen".to_string(),
                description: String::new(),
                price: BigDecimal::from_str("1.9").expect("valid decimal"),
                image: None,
                category: None,
                is_new: None,
                external_id: None,
            })
            .expect("create");
        assert_eq!(created.price.to_string(), "1.90");
    }

    #[test]
    fn rejects_blank_name() {
        let err = service()
            .create_product(NewProduct {
                name: "  ".to_string(),
                description: String::new(),
                price: BigDecimal::from(1),
                image: None,
                category: None,
                is_new: None,
                external_id: None,
            })
            .expect_err("blank name");
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn unknown_product_is_not_found() {
        let catalog = service();
        let id = Uuid::new_v4();
        assert!(matches!(
            catalog.get_product(id),
            Err(DomainError::ProductNotFound(missing)) if missing == id
        ));
        assert!(matches!(
            catalog.delete_product(id),
            Err(DomainError::ProductNotFound(_))
        ));
    }
}
