//! A minimal client for the GitHub repository contents API.
//!
//! GitHub is this server's datastore: the menu lives as a single JSON file in
//! a repository, and every save is a commit. Updates use GitHub's optimistic
//! concurrency check, so each write must carry the blob SHA of the revision
//! it supersedes (or no SHA at all when creating the file).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Local;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// The `User-Agent` GitHub requires on every API request.
const API_USER_AGENT: &str = concat!("menu-publisher/", env!("CARGO_PKG_VERSION"));

/// The media type for GitHub's REST API.
const API_MEDIA_TYPE: &str = "application/vnd.github+json";

/// A single addressable file in the backing repository.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct StoredFile {
    /// The account that owns the repository.
    pub owner: String,

    /// The repository name.
    pub repo: String,

    /// The file's path within the repository.
    pub path: String,
}

impl StoredFile {
    /// Returns the contents API URL for this file under the given API root.
    fn url(&self, api_root: &str) -> String {
        let Self { owner, repo, path } = self;

        format!("{api_root}/repos/{owner}/{repo}/contents/{path}")
    }
}

/// An error from a round trip to the GitHub API.
///
/// A missing file on a read isn't an error; [`fetch_sha`] reports it as
/// [`None`] so callers branch on it explicitly.
#[derive(Error, Debug)]
pub enum GithubError {
    /// GitHub answered with a non-success status.
    #[error("GitHub responded with {status}: {message}")]
    Api {
        /// The HTTP status GitHub answered with.
        status: StatusCode,

        /// The `message` field of GitHub's error payload.
        message: String,

        /// The messages of any sub-errors in GitHub's error payload.
        errors: Vec<String>,
    },

    /// The request never completed, or its response couldn't be decoded.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl GithubError {
    /// The HTTP status GitHub answered with, if the failure got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(source) => source.status(),
        }
    }
}

/// The subset of GitHub's file metadata response this server reads.
#[derive(Deserialize, Debug)]
struct FileMetadata {
    /// The blob SHA of the file's current revision.
    sha: String,
}

/// The request body for GitHub's create-or-update contents endpoint.
#[derive(Serialize, Debug)]
struct UpsertRequest<'a> {
    /// The commit message.
    message: String,

    /// The new file contents, base64-encoded.
    content: String,

    /// The blob SHA of the revision being replaced.
    ///
    /// GitHub distinguishes an absent `sha` (create the file) from an empty
    /// one, so this field must be omitted entirely on the creation path.
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// The subset of GitHub's upsert response this server reads.
#[derive(Deserialize, Debug)]
struct UpsertResponse {
    /// The commit the upsert produced.
    commit: Commit,
}

/// The subset of a commit object this server reads.
#[derive(Deserialize, Debug)]
struct Commit {
    /// The commit's canonical web URL.
    html_url: String,
}

/// The shape of GitHub's error payloads, parsed best-effort.
#[derive(Deserialize, Default, Debug)]
struct ErrorPayload {
    /// The top-level error message.
    message: Option<String>,

    /// Any sub-errors detailing the failure.
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

/// A sub-error in GitHub's error payloads.
#[derive(Deserialize, Debug)]
struct ErrorDetail {
    /// The sub-error's message, when it has one.
    message: Option<String>,
}

/// Fetches the blob SHA of the stored file's current revision, or [`None`]
/// if the file doesn't exist yet.
///
/// # Errors
///
/// Fails if the request doesn't complete or GitHub answers with any
/// non-success status other than `404 Not Found`.
pub async fn fetch_sha(
    client: &reqwest::Client,
    config: &Config,
) -> Result<Option<String>, GithubError> {
    let response = client
        .get(config.file.url(&config.api_root))
        .bearer_auth(&config.token)
        .header(ACCEPT, API_MEDIA_TYPE)
        .header(USER_AGENT, API_USER_AGENT)
        .send()
        .await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let metadata: FileMetadata = check_status(response).await?.json().await?;

    Ok(Some(metadata.sha))
}

/// Writes the menu back as the stored file's new revision, creating the file
/// if `sha` is [`None`], and returns the resulting commit's web URL.
///
/// The menu is committed as indented JSON so the file stays readable in the
/// repository, then base64-encoded as the contents API requires.
///
/// # Errors
///
/// Fails if the request doesn't complete or GitHub rejects the write. A
/// stale `sha` (a concurrent writer won) surfaces here as an [`Api`] error;
/// it's the caller's caller that decides whether to try again.
///
/// [`Api`]: GithubError::Api
pub async fn upsert(
    client: &reqwest::Client,
    config: &Config,
    sha: Option<&str>,
    menu: &serde_json::Value,
) -> Result<String, GithubError> {
    let contents =
        serde_json::to_string_pretty(menu).expect("JSON value serialization should be infallible");

    let timestamp = Local::now().format("%d/%m/%Y %H:%M:%S");

    let body = UpsertRequest {
        message: format!("Menu update - {timestamp}"),
        content: BASE64.encode(contents),
        sha,
    };

    let response = client
        .put(config.file.url(&config.api_root))
        .bearer_auth(&config.token)
        .header(ACCEPT, API_MEDIA_TYPE)
        .header(USER_AGENT, API_USER_AGENT)
        .json(&body)
        .send()
        .await?;

    let upserted: UpsertResponse = check_status(response).await?.json().await?;

    Ok(upserted.commit.html_url)
}

/// Passes success responses through, and converts anything else into
/// [`GithubError::Api`], keeping whatever diagnostic detail GitHub's error
/// payload carries.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GithubError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    // GitHub error bodies aren't guaranteed to be JSON (proxies, HTML error
    // pages), so parsing is best-effort.
    let payload: ErrorPayload = response.json().await.unwrap_or_default();

    Err(GithubError::Api {
        status,
        message: payload
            .message
            .unwrap_or_else(|| "unknown error".to_owned()),
        errors: payload
            .errors
            .into_iter()
            .filter_map(|detail| detail.message)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// A configuration pointing at a mock GitHub server.
    fn config(api_root: &str) -> Config {
        Config {
            token: "test-token".to_owned(),
            api_root: api_root.to_owned(),
            file: StoredFile {
                owner: "owner".to_owned(),
                repo: "repo".to_owned(),
                path: "menu.json".to_owned(),
            },
        }
    }

    #[tokio::test]
    async fn fetch_sha_returns_the_current_revision() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/owner/repo/contents/menu.json"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "abc123",
                "content": "e30=",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sha = fetch_sha(&reqwest::Client::new(), &config(&server.uri())).await?;

        assert_eq!(sha.as_deref(), Some("abc123"));

        Ok(())
    }

    #[tokio::test]
    async fn fetch_sha_treats_a_missing_file_as_none() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found",
            })))
            .mount(&server)
            .await;

        let sha = fetch_sha(&reqwest::Client::new(), &config(&server.uri())).await?;

        assert_eq!(sha, None, "a 404 should be the creation path, not an error");

        Ok(())
    }

    #[tokio::test]
    async fn fetch_sha_propagates_other_failures() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "message": "Bad credentials",
            })))
            .mount(&server)
            .await;

        let error = fetch_sha(&reqwest::Client::new(), &config(&server.uri()))
            .await
            .expect_err("a 403 shouldn't be tolerated");

        match error {
            GithubError::Api { status, message, .. } => {
                assert_eq!(status, StatusCode::FORBIDDEN, "status should be preserved");
                assert_eq!(message, "Bad credentials", "message should be preserved");
            }
            GithubError::Transport(_) => panic!("a 403 should be an API error"),
        }
    }

    #[tokio::test]
    async fn upsert_omits_the_sha_field_when_creating() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/repos/owner/repo/contents/menu.json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "commit": { "html_url": "https://github.com/owner/repo/commit/1" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let menu = json!({ "a": 1 });

        let commit_url = upsert(
            &reqwest::Client::new(),
            &config(&server.uri()),
            None,
            &menu,
        )
        .await?;

        assert_eq!(commit_url, "https://github.com/owner/repo/commit/1");

        let requests = server
            .received_requests()
            .await
            .expect("request recording should be enabled");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body)?;

        assert_eq!(
            body.get("sha"),
            None,
            "the sha field must be omitted entirely on the creation path"
        );

        let encoded = body["content"]
            .as_str()
            .expect("content should be a base64 string");
        let decoded: serde_json::Value = serde_json::from_slice(&BASE64.decode(encoded)?)?;

        assert_eq!(decoded, menu, "the committed contents should be the menu");

        Ok(())
    }

    #[tokio::test]
    async fn upsert_carries_the_sha_when_updating() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(body_partial_json(json!({ "sha": "abc123" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "commit": { "html_url": "https://github.com/owner/repo/commit/2" },
            })))
            .expect(1)
            .mount(&server)
            .await;

        upsert(
            &reqwest::Client::new(),
            &config(&server.uri()),
            Some("abc123"),
            &json!({ "a": 2 }),
        )
        .await?;

        Ok(())
    }

    #[tokio::test]
    async fn upsert_surfaces_sub_errors() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "menu.json does not match",
                "errors": [{ "message": "sha mismatch" }],
            })))
            .mount(&server)
            .await;

        let error = upsert(
            &reqwest::Client::new(),
            &config(&server.uri()),
            Some("stale"),
            &json!({}),
        )
        .await
        .expect_err("a conflict should fail the write");

        match error {
            GithubError::Api { errors, .. } => {
                assert_eq!(errors, ["sha mismatch"], "sub-errors should be kept");
            }
            GithubError::Transport(_) => panic!("a conflict should be an API error"),
        }
    }

    #[test]
    fn transport_encoding_round_trips_non_ascii() -> anyhow::Result<()> {
        let menu = json!({ "x": "é" });

        let encoded = BASE64.encode(serde_json::to_string_pretty(&menu)?);
        let decoded: serde_json::Value = serde_json::from_slice(&BASE64.decode(encoded)?)?;

        assert_eq!(decoded, menu, "encoding shouldn't mangle non-ASCII text");

        Ok(())
    }
}
