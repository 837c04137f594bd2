use axum::{extract::Request, middleware::Next, response::Response};
use tripdesk_core::SessionId;

const SESSION_HEADER: &str = "x-session-id";
const SESSION_COOKIE: &str = "sessionId";

/// Resolves the acting session for every request: `x-session-id` header
/// first, then the `sessionId` cookie, else the shared anonymous identity.
/// The token is taken at face value; see the trust model notes in core.
pub async fn session_middleware(mut req: Request, next: Next) -> Response {
    let from_header = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let session = from_header
        .or_else(|| cookie_value(&req, SESSION_COOKIE))
        .map(SessionId::new)
        .unwrap_or_else(SessionId::anonymous);

    req.extensions_mut().insert(session);
    next.run(req).await
}

fn cookie_value(req: &Request, name: &str) -> Option<String> {
    let raw = req
        .headers()
        .get(axum::http::header::COOKIE)?
        .to_str()
        .ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}
