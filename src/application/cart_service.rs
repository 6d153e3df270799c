use std::sync::Arc;

use uuid::Uuid;

use crate::domain::cart::{ensure_line_quantity, CartLine, CartLineView, MAX_LINE_QUANTITY};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, ProductRepository};
use crate::domain::session::SessionId;

#[derive(Clone)]
pub struct CartService {
    products: Arc<dyn ProductRepository>,
    carts: Arc<dyn CartRepository>,
}

impl CartService {
    pub fn new(products: Arc<dyn ProductRepository>, carts: Arc<dyn CartRepository>) -> Self {
        Self { products, carts }
    }

    pub fn get_cart(&self, session: &SessionId) -> Result<Vec<CartLineView>, DomainError> {
        self.carts
            .lines_for_session(session)?
            .into_iter()
            .map(|line| {
                let product = self.products.find_by_id(line.product_id)?;
                Ok(CartLineView { line, product })
            })
            .collect()
    }

    pub fn add_to_cart(
        &self,
        session: &SessionId,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        ensure_line_quantity(quantity)?;
        if self.products.find_by_id(product_id)?.is_none() {
            return Err(DomainError::ProductNotFound(product_id));
        }

        let existing = self
            .carts
            .lines_for_session(session)?
            .into_iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity);
        if existing + quantity > MAX_LINE_QUANTITY {
            return Err(DomainError::InvalidInput(format!(
                "cart already holds {existing} of product {product_id}; \
                 a line may hold at most {MAX_LINE_QUANTITY}"
            )));
        }
        self.carts.add(session, product_id, quantity)
    }

    /// Set a line's quantity. A quantity of zero or less removes the line, in
    /// which case `None` is returned.
    pub fn update_line_quantity(
        &self,
        session: &SessionId,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartLine>, DomainError> {
        if quantity <= 0 {
            self.remove_line(session, line_id)?;
            return Ok(None);
        }
        ensure_line_quantity(quantity)?;
        self.carts
            .set_quantity(session, line_id, quantity)?
            .map(Some)
            .ok_or(DomainError::CartLineNotFound(line_id))
    }

    pub fn remove_line(&self, session: &SessionId, line_id: Uuid) -> Result<(), DomainError> {
        if self.carts.remove(session, line_id)? {
            Ok(())
        } else {
            Err(DomainError::CartLineNotFound(line_id))
        }
    }

    pub fn clear_cart(&self, session: &SessionId) -> Result<usize, DomainError> {
        self.carts.clear(session)
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::product::NewProduct;
    use crate::infrastructure::in_memory::{InMemoryCartRepository, InMemoryProductRepository};

    struct Fixture {
        products: Arc<InMemoryProductRepository>,
        cart: CartService,
        session: SessionId,
    }

    fn fixture() -> Fixture {
        let products = Arc::new(InMemoryProductRepository::new());
        let cart = CartService::new(products.clone(), Arc::new(InMemoryCartRepository::new()));
        Fixture {
            products,
            cart,
            session: SessionId::parse("session_test").expect("valid session"),
        }
    }

    fn add_product(products: &InMemoryProductRepository, name: &str) -> Uuid {
        products
            .insert(NewProduct {
                name: name.to_string(),
                description: String::new(),
                price: BigDecimal::from(10),
                image: None,
                category: None,
                is_new: None,
                external_id: Some(name.to_lowercase()),
            })
            .expect("insert product")
            .id
    }

    #[test]
    fn adding_twice_sums_quantities_on_one_line() {
        let f = fixture();
        let p = add_product(&f.products, "A");

        f.cart.add_to_cart(&f.session, p, 2).expect("add");
        f.cart.add_to_cart(&f.session, p, 3).expect("add");

        let cart = f.cart.get_cart(&f.session).expect("cart");
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].line.quantity, 5);
        assert_eq!(cart[0].product.as_ref().map(|p| p.name.as_str()), Some("A"));
    }

    #[test]
    fn add_rejects_non_positive_quantity() {
        let f = fixture();
        let p = add_product(&f.products, "A");
        assert!(matches!(
            f.cart.add_to_cart(&f.session, p, 0),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(f.cart.get_cart(&f.session).expect("cart").is_empty());
    }

    #[test]
    fn add_rejects_totals_above_line_limit() {
        let f = fixture();
        let p = add_product(&f.products, "A");

        assert!(matches!(
            f.cart.add_to_cart(&f.session, p, i32::MAX),
            Err(DomainError::InvalidInput(_))
        ));
        f.cart
            .add_to_cart(&f.session, p, MAX_LINE_QUANTITY)
            .expect("add up to the limit");
        assert!(matches!(
            f.cart.add_to_cart(&f.session, p, 1),
            Err(DomainError::InvalidInput(_))
        ));

        let cart = f.cart.get_cart(&f.session).expect("cart still readable");
        assert_eq!(cart[0].line.quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn update_rejects_quantity_above_line_limit() {
        let f = fixture();
        let p = add_product(&f.products, "A");
        let line = f.cart.add_to_cart(&f.session, p, 1).expect("add");

        assert!(matches!(
            f.cart
                .update_line_quantity(&f.session, line.id, MAX_LINE_QUANTITY + 1),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn add_rejects_unknown_product() {
        let f = fixture();
        assert!(matches!(
            f.cart.add_to_cart(&f.session, Uuid::new_v4(), 1),
            Err(DomainError::ProductNotFound(_))
        ));
    }

    #[test]
    fn update_to_positive_sets_exact_quantity() {
        let f = fixture();
        let p = add_product(&f.products, "A");
        let line = f.cart.add_to_cart(&f.session, p, 2).expect("add");

        let updated = f
            .cart
            .update_line_quantity(&f.session, line.id, 7)
            .expect("update")
            .expect("line kept");
        assert_eq!(updated.quantity, 7);
    }

    #[test]
    fn update_to_zero_or_less_removes_line() {
        let f = fixture();
        let a = add_product(&f.products, "A");
        let b = add_product(&f.products, "B");
        let line_a = f.cart.add_to_cart(&f.session, a, 2).expect("add");
        let line_b = f.cart.add_to_cart(&f.session, b, 2).expect("add");

        assert!(f
            .cart
            .update_line_quantity(&f.session, line_a.id, 0)
            .expect("update")
            .is_none());
        assert!(f
            .cart
            .update_line_quantity(&f.session, line_b.id, -3)
            .expect("update")
            .is_none());
        assert!(f.cart.get_cart(&f.session).expect("cart").is_empty());
    }

    #[test]
    fn cart_shows_deleted_product_as_missing() {
        let f = fixture();
        let p = add_product(&f.products, "A");
        f.cart.add_to_cart(&f.session, p, 1).expect("add");
        f.products.delete(p).expect("delete");

        let cart = f.cart.get_cart(&f.session).expect("cart");
        assert_eq!(cart.len(), 1);
        assert!(cart[0].product.is_none());
    }

    #[test]
    fn foreign_line_is_not_found() {
        let f = fixture();
        let p = add_product(&f.products, "A");
        let line = f.cart.add_to_cart(&f.session, p, 1).expect("add");
        let other = SessionId::parse("someone_else").expect("valid session");

        assert!(matches!(
            f.cart.remove_line(&other, line.id),
            Err(DomainError::CartLineNotFound(_))
        ));
        assert!(matches!(
            f.cart.update_line_quantity(&other, line.id, 4),
            Err(DomainError::CartLineNotFound(_))
        ));
    }
}
