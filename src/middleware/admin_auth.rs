use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::db::AppState;
use crate::session::Session;

/// The authenticated admin, inserted into request extensions by
/// [`admin_auth`].
#[derive(Clone)]
pub struct AdminContext {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    /// Bearer token of the session that authenticated this request
    pub session_token: String,
}

impl AdminContext {
    fn new(token: &str, session: Session) -> Self {
        Self {
            user_id: session.user_id,
            email: session.email,
            name: session.name,
            session_token: token.to_string(),
        }
    }
}

/// Require a valid admin session token on `Authorization: Bearer <token>`.
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let session = state.sessions.get(token).ok_or(StatusCode::UNAUTHORIZED)?;

    // Build the context before touching extensions; `token` borrows the headers
    let context = AdminContext::new(token, session);
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}
