//! Blocking client for the tabledb REST API.
//!
//! # Overview
//! Resolves endpoint path templates (`/teams/{TEAM_ID}/databases/{DATABASE_ID}/...`)
//! against a configured host, sends one request per operation, and returns a
//! normalized `HttpResponse` whatever the status code.
//!
//! # Design
//! - `SharedDefaults` carries the default team and database ids; it is an
//!   explicit handle rather than hidden global state.
//! - Per-call overrides travel in a `RequestContext` consumed by the call.
//! - The network sits behind the `Transport` trait; `UreqTransport` is the
//!   default and tests substitute a recording fake.
//! - Private-cloud hosts (anything but the public service) take a different
//!   URL layout, `/<team>/api/<version>/...`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod template;
pub mod transport;
pub mod types;

pub use client::{TableDbClient, DOWNLOAD_TIMEOUT, UPLOAD_TIMEOUT};
pub use config::{
    api_key_from_env, set_fixed_database, set_fixed_team, ClientOptions, SharedDefaults,
};
pub use error::{Error, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, TransportOptions};
pub use template::{RequestContext, UrlTemplate};
pub use transport::{RawResponse, Transport, UreqTransport};
pub use types::{RecordInput, RecordQuery, UpsertInput};
