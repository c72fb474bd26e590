//! Basic-auth middleware
//!
//! Credentials are optional at this layer: a well-formed `Authorization:
//! Basic` header must authenticate or the request is rejected with 401, but
//! an absent or malformed header passes through as an anonymous caller.
//! Whether anonymity is acceptable is the policy table's decision, made
//! per-operation in the handlers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::schema::Resource;

use super::routes::{error_body, AppState};

/// The authenticated caller, if any, attached to every request.
#[derive(Clone)]
pub struct AuthUser(pub Option<Resource>);

/// Extracts and verifies basic credentials before the handlers run.
pub async fn basic_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let mut user = None;

    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        if let Some((username, password)) = parse_basic(value) {
            match state.store.authenticate(&username, &password) {
                Ok(u) => user = Some(u),
                Err(e) => {
                    let mut resp = (
                        StatusCode::UNAUTHORIZED,
                        error_body(format!("Unauthorized: {e}")),
                    )
                        .into_response();
                    resp.headers_mut().insert(
                        header::WWW_AUTHENTICATE,
                        HeaderValue::from_static("Basic realm=\"Restricted\""),
                    );
                    return resp;
                }
            }
        }
    }

    req.extensions_mut().insert(AuthUser(user));
    next.run(req).await
}

/// Decodes `Basic <base64(user:pass)>`; anything malformed yields `None`.
fn parse_basic(value: &HeaderValue) -> Option<(String, String)> {
    let header = value.to_str().ok()?;
    let encoded = header
        .strip_prefix("Basic ")
        .or_else(|| header.strip_prefix("basic "))?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
