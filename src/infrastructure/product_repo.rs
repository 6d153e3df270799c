use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{NewProduct, Product};
use crate::schema::products;

use super::models::ProductRow;

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            image: row.image,
            category: row.category,
            is_new: row.is_new,
            external_id: row.external_id,
            created_at: row.created_at,
        }
    }
}

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProductRepository for DieselProductRepository {
    fn list(&self) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = products::table
            .select(ProductRow::as_select())
            .order(products::created_at.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn insert(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(products::table)
            .values(&ProductRow {
                id: Uuid::new_v4(),
                name: product.name,
                description: product.description,
                price: product.price,
                image: product.image,
                category: product.category,
                is_new: product.is_new,
                external_id: product.external_id,
                created_at: Utc::now(),
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn set_price(&self, id: Uuid, price: BigDecimal) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.find(id))
            .set(products::price.eq(price))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(products::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::DieselProductRepository;
    use crate::domain::ports::ProductRepository;
    use crate::domain::product::NewProduct;
    use crate::infrastructure::test_db::setup_db;

    fn keyboard() -> NewProduct {
        NewProduct {
            name: "Mechanical keyboard".to_string(),
            description: "Tenkeyless, brown switches".to_string(),
            price: BigDecimal::from_str("89.90").expect("valid decimal"),
            image: None,
            category: Some("Peripherals".to_string()),
            is_new: Some(true),
            external_id: Some("KB-1".to_string()),
        }
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn insert_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let repo = DieselProductRepository::new(pool);

        let created = repo.insert(keyboard()).expect("insert failed");
        let found = repo
            .find_by_id(created.id)
            .expect("find failed")
            .expect("product should exist");

        assert_eq!(found.name, "Mechanical keyboard");
        assert_eq!(found.external_id.as_deref(), Some("KB-1"));
        assert_eq!(repo.list().expect("list failed").len(), 1);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn set_price_and_delete() {
        let (_container, pool) = setup_db().await;
        let repo = DieselProductRepository::new(pool);
        let created = repo.insert(keyboard()).expect("insert failed");

        let updated = repo
            .set_price(created.id, BigDecimal::from(120))
            .expect("update failed")
            .expect("product should exist");
        assert_eq!(updated.price, BigDecimal::from(120));

        assert!(repo.delete(created.id).expect("delete failed"));
        assert!(!repo.delete(created.id).expect("second delete failed"));
        assert!(repo.find_by_id(created.id).expect("find failed").is_none());
    }
}
