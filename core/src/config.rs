//! Client configuration and host resolution.
//!
//! # Design
//! The default team and database ids live in `SharedDefaults`, an explicit
//! handle that every client built from it observes. Clients constructed with
//! `TableDbClient::new` share the process handle returned by
//! `SharedDefaults::global()`; callers wanting isolation pass their own.
//!
//! Host resolution runs once at construction. A host that does not point at
//! the public service is a private-cloud deployment, and its URL may carry
//! the team id as a `/<team>/api` segment.

use std::env;
use std::sync::{Arc, LazyLock, OnceLock, PoisonError, RwLock};

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::TransportOptions;

/// Host substring identifying the public multi-tenant service.
pub const PUBLIC_HOST: &str = "api.tabledb.cloud";

/// Host used when no override is configured.
pub const DEFAULT_HOST: &str = "https://api.tabledb.cloud";

/// API version segment used when no override is configured.
pub const DEFAULT_VERSION: &str = "/v1";

static PRIVATE_TEAM_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([A-Za-z0-9]+)/api(?:/v1)?").expect("static regex"));

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("static regex"));

#[derive(Debug, Default)]
struct Defaults {
    team: Option<String>,
    database: Option<String>,
}

/// Default team and database ids shared by every client holding this handle.
///
/// Setting a value affects all subsequent URL builds on every client that
/// shares the handle, until it is changed or cleared with `None`.
#[derive(Debug, Clone, Default)]
pub struct SharedDefaults {
    inner: Arc<RwLock<Defaults>>,
}

impl SharedDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide handle used by `TableDbClient::new`.
    pub fn global() -> &'static SharedDefaults {
        static GLOBAL: OnceLock<SharedDefaults> = OnceLock::new();
        GLOBAL.get_or_init(SharedDefaults::new)
    }

    pub fn set_team<S: Into<String>>(&self, team: Option<S>) {
        let mut defaults = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        defaults.team = team.map(Into::into);
    }

    pub fn set_database<S: Into<String>>(&self, database: Option<S>) {
        let mut defaults = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        defaults.database = database.map(Into::into);
    }

    pub fn team(&self) -> Option<String> {
        let defaults = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        defaults.team.clone()
    }

    pub fn database(&self) -> Option<String> {
        let defaults = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        defaults.database.clone()
    }
}

/// Set the default team id on the process-wide handle.
pub fn set_fixed_team<S: Into<String>>(team: Option<S>) {
    SharedDefaults::global().set_team(team);
}

/// Set the default database id on the process-wide handle.
pub fn set_fixed_database<S: Into<String>>(database: Option<S>) {
    SharedDefaults::global().set_database(database);
}

/// Construction options for `TableDbClient`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientOptions {
    /// Base URL override.
    #[serde(default)]
    pub host: Option<String>,

    /// API version segment override, with or without the leading slash.
    #[serde(default)]
    pub version: Option<String>,

    /// Transport options merged over the base options on every request.
    #[serde(default, alias = "curl")]
    pub transport: TransportOptions,
}

impl ClientOptions {
    /// Read `TABLEDB_HOST` and `TABLEDB_VERSION` from the environment.
    pub fn from_env() -> Self {
        Self {
            host: non_empty_var("TABLEDB_HOST"),
            version: non_empty_var("TABLEDB_VERSION"),
            transport: TransportOptions::default(),
        }
    }
}

/// Read the API key from `TABLEDB_API_KEY`.
pub fn api_key_from_env() -> Result<String> {
    non_empty_var("TABLEDB_API_KEY").ok_or(Error::MissingApiKey)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Outcome of `resolve_host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHost {
    pub host: String,
    pub is_private_cloud: bool,
}

/// Normalize a raw host string and classify it.
///
/// For private-cloud hosts a `/<team>/api` segment is cut out of the host and
/// its team id becomes the default team on `defaults`.
pub fn resolve_host(raw: &str, defaults: &SharedDefaults) -> ResolvedHost {
    let mut host = raw
        .trim_matches(|c: char| c.is_whitespace() || c == '/')
        .to_string();
    if let Some(stripped) = host.strip_suffix("/v1") {
        host = stripped.to_string();
    }

    let is_private_cloud = !host.contains(PUBLIC_HOST);

    if is_private_cloud {
        let start = path_start(&host);
        let found = PRIVATE_TEAM_SEGMENT
            .captures(&host[start..])
            .and_then(|caps| Some((caps.get(0)?.range(), caps.get(1)?.as_str().to_string())));
        if let Some((range, team)) = found {
            debug!(team = %team, "team id taken from private-cloud host");
            host.replace_range(start + range.start..start + range.end, "");
            defaults.set_team(Some(team));
        }
    }

    if !SCHEME.is_match(&host) {
        host = format!("https://{host}");
    }

    ResolvedHost {
        host,
        is_private_cloud,
    }
}

/// Byte offset where the path begins, past any `scheme://authority`.
fn path_start(host: &str) -> usize {
    let authority = SCHEME.find(host).map_or(0, |m| m.end());
    host[authority..]
        .find('/')
        .map_or(host.len(), |i| authority + i)
}

/// `/` followed by the trimmed version, or `/v1` when none is given.
pub fn normalize_version(version: Option<&str>) -> String {
    match version.map(|v| v.trim().trim_matches('/')) {
        Some(v) if !v.is_empty() => format!("/{v}"),
        _ => DEFAULT_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn public_host_is_not_private() {
        let defaults = SharedDefaults::new();
        let resolved = resolve_host("https://api.tabledb.cloud/v1/", &defaults);
        assert_eq!(resolved.host, "https://api.tabledb.cloud");
        assert!(!resolved.is_private_cloud);
        assert_eq!(defaults.team(), None);
    }

    #[test]
    fn private_host_yields_team_id() {
        let defaults = SharedDefaults::new();
        let resolved = resolve_host("https://example.com/myteam/api/v1", &defaults);
        assert!(resolved.is_private_cloud);
        assert_eq!(resolved.host, "https://example.com");
        assert_eq!(defaults.team().as_deref(), Some("myteam"));
    }

    #[test]
    fn private_host_without_team_segment_is_untouched() {
        let defaults = SharedDefaults::new();
        let resolved = resolve_host("  https://db.internal.example/ ", &defaults);
        assert!(resolved.is_private_cloud);
        assert_eq!(resolved.host, "https://db.internal.example");
        assert_eq!(defaults.team(), None);
    }

    #[test]
    fn scheme_is_added_when_missing() {
        let defaults = SharedDefaults::new();
        let resolved = resolve_host("db.internal.example/acme/api", &defaults);
        assert_eq!(resolved.host, "https://db.internal.example");
        assert_eq!(defaults.team().as_deref(), Some("acme"));

        let resolved = resolve_host("http://127.0.0.1:8080", &defaults);
        assert_eq!(resolved.host, "http://127.0.0.1:8080");
    }

    #[test]
    fn team_segment_is_only_read_from_the_path() {
        let defaults = SharedDefaults::new();
        let resolved = resolve_host("https://apihost/api", &defaults);
        assert!(resolved.is_private_cloud);
        assert_eq!(resolved.host, "https://apihost/api");
        assert_eq!(defaults.team(), None);

        let resolved = resolve_host("http://localhost/api/v1", &defaults);
        assert_eq!(resolved.host, "http://localhost/api");
        assert_eq!(defaults.team(), None);

        let resolved = resolve_host("localhost:8080/acme/api/v1", &defaults);
        assert_eq!(resolved.host, "https://localhost:8080");
        assert_eq!(defaults.team().as_deref(), Some("acme"));
    }

    #[test]
    fn version_is_normalized() {
        assert_eq!(normalize_version(None), "/v1");
        assert_eq!(normalize_version(Some("v2")), "/v2");
        assert_eq!(normalize_version(Some(" /v3/ ")), "/v3");
        assert_eq!(normalize_version(Some("")), "/v1");
    }

    #[test]
    fn shared_defaults_are_visible_through_clones() {
        let a = SharedDefaults::new();
        let b = a.clone();
        a.set_team(Some("T1"));
        b.set_database(Some("D1"));
        assert_eq!(b.team().as_deref(), Some("T1"));
        assert_eq!(a.database().as_deref(), Some("D1"));
        a.set_team(None::<String>);
        assert_eq!(b.team(), None);
    }

    #[test]
    fn fixed_setters_write_the_global_handle() {
        set_fixed_team(Some("G1"));
        set_fixed_database(Some("GD"));
        assert_eq!(SharedDefaults::global().team().as_deref(), Some("G1"));
        assert_eq!(SharedDefaults::global().database().as_deref(), Some("GD"));
        set_fixed_team(None::<String>);
        set_fixed_database(None::<String>);
        assert_eq!(SharedDefaults::global().team(), None);
    }

    #[test]
    fn options_accept_curl_alias() {
        let opts: ClientOptions = serde_json::from_str(
            r#"{"host":"https://example.com","curl":{"timeout":5,"verify_tls":false}}"#,
        )
        .unwrap();
        assert_eq!(opts.host.as_deref(), Some("https://example.com"));
        assert_eq!(opts.transport.timeout, Some(Duration::from_secs(5)));
        assert_eq!(opts.transport.verify_tls, Some(false));
        assert!(opts.version.is_none());
    }

    #[test]
    fn options_reject_unknown_curl_keys() {
        let result = serde_json::from_str::<ClientOptions>(r#"{"curl":{"proxy":"http://p"}}"#);
        assert!(result.is_err());
    }
}
