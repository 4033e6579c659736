//! See [`Response`].

use axum::body::Body;
use axum::http::{self, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

/// A wrapper for [`axum::response::Response`] with a simpler API.
pub struct Response {
    /// The [`axum::response::Response`] value being wrapped.
    inner: axum::response::Response,
}

impl Response {
    /// Constructs a new [`Response`].
    pub fn new() -> Self {
        Self {
            inner: axum::response::Response::new(Body::empty()),
        }
    }

    /// Sets a [`StatusCode`] on the response.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        *self.inner.status_mut() = status;

        self
    }

    /// Sets a header on the response.
    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.inner.headers_mut().insert(name, value);

        self
    }

    /// Sets a header on the response, panicking if the header is invalid.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value isn't valid. For example, passing a string panics if it
    /// contains a character that isn't visible ASCII (32-127).
    pub fn header_valid<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        let name = <HeaderName as TryFrom<K>>::try_from(key)
            .map_err(Into::into)
            .expect("header name should be valid");
        let value = <HeaderValue as TryFrom<V>>::try_from(value)
            .map_err(Into::into)
            .expect("header value should be valid");

        self.header(name, value)
    }

    /// Serializes a value as a JSON body on the response, setting the
    /// `Content-Type` accordingly.
    ///
    /// # Panics
    ///
    /// Panics if the value fails to serialize. All of this server's response
    /// bodies are plain data structs, for which serialization is infallible.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.header_valid("Content-Type", "application/json");

        *self.inner.body_mut() = Body::from(
            serde_json::to_string(value).expect("response body should serialize to JSON"),
        );

        self
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl axum::response::IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        self.inner
    }
}
