//! The menu publishing service and its sole request handler.
//!
//! The whole flow is one stateless read-modify-write against GitHub: fetch
//! the stored menu file's current revision SHA (tolerating "not found"),
//! then commit the posted menu back with that SHA so a concurrent writer
//! can't be silently overwritten.

use axum::body::{self, Body};
use axum::extract::Request;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum_macros::debug_handler;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::PublishError;
use crate::github::{self, GithubError};
use crate::response::Response;

/// The origins allowed to call this API from a browser.
const ALLOWED_ORIGINS: &[&str] = &[
    "https://lalgeriarestaurant.com",
    "https://www.lalgeriarestaurant.com",
    "http://localhost:3000",
];

/// The maximum accepted size of a request body, in bytes.
const BODY_LIMIT: usize = 1024 * 1024;

/// The JSON body of a successful publish response.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PublishedBody {
    /// Always `true`; the front-end admin page keys off this field.
    success: bool,

    /// A human-readable confirmation.
    message: &'static str,

    /// The web URL of the commit that saved the menu.
    commit_url: String,
}

/// The service function to handle all incoming requests.
///
/// The CORS headers are applied here, outside the main flow, so that every
/// response to an allow-listed origin carries them, errors included.
#[debug_handler]
pub async fn handler(request: Request) -> Response {
    let origin = allowed_origin(request.headers());

    let mut response = respond_to(request).await;

    if let Some(origin) = origin {
        response
            .header(ACCESS_CONTROL_ALLOW_ORIGIN, origin)
            .header_valid(ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS")
            .header_valid(ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type")
            .header_valid(ACCESS_CONTROL_ALLOW_CREDENTIALS, "true");
    }

    response
}

/// Returns the request's `Origin` header if it's on the allow-list.
fn allowed_origin(headers: &HeaderMap) -> Option<HeaderValue> {
    let origin = headers.get(ORIGIN)?;
    let origin_str = origin.to_str().ok()?;

    ALLOWED_ORIGINS
        .contains(&origin_str)
        .then(|| origin.clone())
}

/// Handles the request, minus the CORS headers applied by [`handler`].
async fn respond_to(request: Request) -> Response {
    // Pre-flight succeeds unconditionally, before configuration is even
    // looked at.
    if request.method() == Method::OPTIONS {
        return Response::new();
    }

    if request.method() != Method::POST {
        return PublishError::MethodNotAllowed.into_response();
    }

    let menu = match menu_from_body(request.into_body()).await {
        Ok(menu) => menu,
        Err(error) => return error.into_response(),
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => return PublishError::from(error).into_response(),
    };

    match publish(&config, &menu).await {
        Ok(commit_url) => Response::new().json(&PublishedBody {
            success: true,
            message: "Menu updated successfully!",
            commit_url,
        }),
        Err(source) => PublishError::Upstream {
            source,
            file: config.file,
        }
        .into_response(),
    }
}

/// Reads the request body and parses it as a menu document.
///
/// The menu's contents are opaque to this server, but the document must at
/// least be a JSON object; `null`, arrays, and primitives are rejected
/// before any network access.
async fn menu_from_body(request_body: Body) -> Result<Value, PublishError> {
    let bytes = body::to_bytes(request_body, BODY_LIMIT)
        .await
        .map_err(|_| PublishError::InvalidMenu)?;

    let menu: Value = serde_json::from_slice(&bytes).map_err(|_| PublishError::InvalidMenu)?;

    if menu.is_object() {
        Ok(menu)
    } else {
        Err(PublishError::InvalidMenu)
    }
}

/// Publishes the menu: reads the stored file's current revision SHA, then
/// writes the menu back as its new revision.
///
/// Returns the web URL of the resulting commit.
///
/// # Errors
///
/// Fails if either round trip to GitHub fails. A write rejected for a stale
/// SHA (a concurrent writer got there first) fails like any other upstream
/// error; the caller may simply retry, which re-reads from scratch.
async fn publish(config: &Config, menu: &Value) -> Result<String, GithubError> {
    let client = reqwest::Client::new();

    let sha = github::fetch_sha(&client, config).await?;

    github::upsert(&client, config, sha.as_deref(), menu).await
}
