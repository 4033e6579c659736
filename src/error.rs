//! The publish endpoint's error taxonomy and its translation to HTTP.

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::github::{GithubError, StoredFile};
use crate::response::Response;

/// Everything that can fail while handling a publish request.
///
/// Each variant maps to one response status and one JSON body shape, so the
/// API contract lives entirely in [`PublishError::into_response`].
#[derive(Error, Debug)]
pub enum PublishError {
    /// The request used a method other than `POST` or `OPTIONS`.
    #[error("only POST requests are accepted")]
    MethodNotAllowed,

    /// The request body wasn't a JSON object.
    #[error("the request body must be a JSON menu object")]
    InvalidMenu,

    /// The server deployment is missing required configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backing store rejected the read or the write.
    #[error("couldn't update the menu")]
    Upstream {
        /// The underlying GitHub failure.
        source: GithubError,

        /// The file the request was writing, echoed back so operators can
        /// tell which deployment configuration was in effect.
        file: StoredFile,
    },
}

/// The JSON body of a client or configuration error response.
#[derive(Serialize, Debug)]
struct ErrorBody<'a> {
    /// A short category for the failure.
    error: &'a str,

    /// A human-readable description of the failure.
    message: String,
}

/// The JSON body of an upstream-failure response.
///
/// The `details` and `statusCode` fields are diagnostic aids, not a stable
/// contract; only `error` and `request` are meant for programmatic use.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UpstreamBody<'a> {
    /// A human-readable description of the failure.
    error: String,

    /// The full upstream error, including any sub-errors GitHub reported.
    details: String,

    /// The HTTP status GitHub answered with, if the failure got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,

    /// The file the request was writing.
    request: &'a StoredFile,
}

impl PublishError {
    /// The HTTP status this error responds with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidMenu => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error as its JSON HTTP response.
    ///
    /// Upstream failures carry GitHub's diagnostic detail; no variant ever
    /// includes the configured token.
    pub fn into_response(self) -> Response {
        let mut response = Response::new();
        response.status(self.status());

        match &self {
            Self::MethodNotAllowed => response.json(&ErrorBody {
                error: "Method not allowed",
                message: self.to_string(),
            }),
            Self::InvalidMenu => response.json(&ErrorBody {
                error: "Invalid menu data",
                message: self.to_string(),
            }),
            Self::Config(source) => response.json(&ErrorBody {
                error: "Incomplete server configuration",
                message: source.to_string(),
            }),
            Self::Upstream { source, file } => {
                let error = match source {
                    GithubError::Api { message, .. } => {
                        format!("Couldn't update the menu: {message}")
                    }
                    GithubError::Transport(_) => "Couldn't update the menu".to_owned(),
                };

                let details = match source {
                    GithubError::Api { errors, .. } if !errors.is_empty() => {
                        format!("{source} ({})", errors.join("; "))
                    }
                    _ => source.to_string(),
                };

                response.json(&UpstreamBody {
                    error,
                    details,
                    status_code: source.status().map(|status| status.as_u16()),
                    request: file,
                })
            }
        }
    }
}
