use diesel::prelude::*;
use diesel::upsert::excluded;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::CartLine;
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::domain::session::SessionId;
use crate::schema::cart_lines;

use super::models::{CartLineRow, NewCartLineRow};

impl TryFrom<CartLineRow> for CartLine {
    type Error = DomainError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        Ok(CartLine {
            id: row.id,
            session_id: SessionId::parse(&row.session_id)?,
            product_id: row.product_id,
            quantity: row.quantity,
            added_at: row.added_at,
        })
    }
}

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CartRepository for DieselCartRepository {
    fn lines_for_session(&self, session: &SessionId) -> Result<Vec<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;
        cart_lines::table
            .filter(cart_lines::session_id.eq(session.as_str()))
            .order(cart_lines::added_at.asc())
            .select(CartLineRow::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(CartLine::try_from)
            .collect()
    }

    fn add(
        &self,
        session: &SessionId,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        let mut conn = self.pool.get()?;
        // One statement, so concurrent adds for the same product cannot
        // create a second line.
        let row = diesel::insert_into(cart_lines::table)
            .values(&NewCartLineRow {
                id: Uuid::new_v4(),
                session_id: session.as_str(),
                product_id,
                quantity,
            })
            .on_conflict((cart_lines::session_id, cart_lines::product_id))
            .do_update()
            .set(cart_lines::quantity.eq(cart_lines::quantity + excluded(cart_lines::quantity)))
            .returning(CartLineRow::as_returning())
            .get_result(&mut conn)?;
        row.try_into()
    }

    fn set_quantity(
        &self,
        session: &SessionId,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(
            cart_lines::table
                .filter(cart_lines::id.eq(line_id))
                .filter(cart_lines::session_id.eq(session.as_str())),
        )
        .set(cart_lines::quantity.eq(quantity))
        .returning(CartLineRow::as_returning())
        .get_result(&mut conn)
        .optional()?;
        row.map(CartLine::try_from).transpose()
    }

    fn remove(&self, session: &SessionId, line_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(
            cart_lines::table
                .filter(cart_lines::id.eq(line_id))
                .filter(cart_lines::session_id.eq(session.as_str())),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn clear(&self, session: &SessionId) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(
            cart_lines::table.filter(cart_lines::session_id.eq(session.as_str())),
        )
        .execute(&mut conn)?;
        Ok(deleted)
    }
}
