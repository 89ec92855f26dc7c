use std::io::{Cursor, Read};

use serde_json::Value;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::handlers::{api, demo};
use crate::state::AppState;

type HttpResponse = Response<Cursor<Vec<u8>>>;

/// Uploads larger than this are refused before decoding.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn respond_with(status: u16, content_type: &str, body: Vec<u8>) -> HttpResponse {
    let len = body.len();
    // Header::from_bytes only fails on non-ASCII input; every value here is a literal.
    let headers = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
        .into_iter()
        .collect();
    Response::new(StatusCode(status), headers, Cursor::new(body), Some(len), None)
}

pub fn html_response(status: u16, body: String) -> HttpResponse {
    respond_with(status, "text/html; charset=utf-8", body.into_bytes())
}

pub fn json_response(status: u16, body: &Value) -> HttpResponse {
    respond_with(status, "application/json", body.to_string().into_bytes())
}

pub fn text_response(status: u16, body: &str) -> HttpResponse {
    respond_with(status, "text/plain; charset=utf-8", body.as_bytes().to_vec())
}

pub fn not_found() -> HttpResponse {
    text_response(404, "404 Not Found")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn content_type(request: &Request) -> String {
    request.headers().iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default()
}

fn read_body(request: &mut Request) -> Result<Vec<u8>, ApiError> {
    let declared = request.body_length();
    read_limited(request.as_reader(), declared, MAX_BODY_BYTES)
}

/// Reads at most `limit` bytes; a longer body, declared or actual, is refused.
fn read_limited<R: Read>(reader: R, declared: Option<usize>, limit: usize) -> Result<Vec<u8>, ApiError> {
    if declared.map_or(false, |len| len > limit) {
        return Err(ApiError::PayloadTooLarge { limit });
    }
    let mut body = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut body)?;
    if body.len() > limit {
        return Err(ApiError::PayloadTooLarge { limit });
    }
    Ok(body)
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

pub fn dispatch(mut request: Request, state: &AppState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let (path, query) = match url.split_once('?') {
        Some((p, q)) => (p.to_owned(), q.to_owned()),
        None => (url.clone(), String::new()),
    };
    debug!(%method, %path, "request");

    let response = match (&method, path.as_str()) {
        // ── JSON API ─────────────────────────────────────────────────────
        (Method::Get, "/") => text_response(200, api::HOME_TEXT),
        (Method::Post, "/predict") => {
            let ct = content_type(&request);
            match read_body(&mut request) {
                Ok(body) => {
                    let (status, value) = api::predict(state, &ct, &body);
                    json_response(status, &value)
                }
                Err(e) => {
                    warn!(error = %e, "could not read /predict body");
                    json_response(e.status(), &e.to_json())
                }
            }
        }
        (Method::Get, "/logs") => json_response(200, &api::logs(state, &query)),
        (Method::Get, "/stats") => json_response(200, &api::stats(state)),
        (Method::Get, "/test") => json_response(200, &api::model_info(state)),

        // ── Browser pages ────────────────────────────────────────────────
        (Method::Get, "/admin") => html_response(200, demo::admin(state)),
        (Method::Get, "/demo") => html_response(200, demo::upload_form(state)),
        (Method::Post, "/demo") => {
            let ct = content_type(&request);
            match read_body(&mut request) {
                Ok(body) => {
                    let (status, html) = demo::submit(state, &ct, &body);
                    html_response(status, html)
                }
                Err(e) => text_response(e.status(), &e.to_string()),
            }
        }
        (Method::Get, "/demo/logs") => html_response(200, demo::log_page(state, &query)),
        (Method::Get, "/demo/stats") => html_response(200, demo::stats_page(state)),

        _ => not_found(),
    };

    if let Err(e) = request.respond(response) {
        warn!(error = %e, %path, "failed to send response");
    }
}
