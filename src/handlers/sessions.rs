use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::session::SessionId;

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: String,
}

/// Mint a fresh session id. Clients may also bring their own; nothing is
/// stored until something is added to the cart.
#[utoipa::path(
    post,
    path = "/sessions",
    responses((status = 201, description = "Session id minted", body = SessionResponse)),
    tag = "sessions"
)]
pub async fn create_session() -> HttpResponse {
    let session = SessionId::generate();
    HttpResponse::Created().json(SessionResponse {
        session_id: session.to_string(),
    })
}
