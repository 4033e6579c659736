//! The menu publisher's backend web server.
//!
//! This server exposes a single endpoint that accepts a JSON menu document
//! and saves it by committing it to a GitHub repository. The repository file
//! is the datastore; there is no database.

pub mod config;
pub mod error;
pub mod github;
pub mod publisher;
pub mod response;
