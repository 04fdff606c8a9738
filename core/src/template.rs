//! URL templates with team and database placeholders.
//!
//! Endpoint paths are written once with `{TEAM_ID}` and `{DATABASE_ID}` and
//! resolved per call: a `RequestContext` override wins, then the shared
//! default, and with neither the literal token stays in the URL.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::config::SharedDefaults;
use crate::error::Result;

pub const TEAM_ID: &str = "{TEAM_ID}";
pub const DATABASE_ID: &str = "{DATABASE_ID}";

const TEAM_PREFIX: &str = "/teams/{TEAM_ID}";

/// Unreserved characters stay literal, everything else is escaped.
const ID_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Team and database overrides for a single call.
///
/// Built fresh for each request and consumed by it, so an override can never
/// carry over into a later call. Empty strings count as no override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub team: Option<String>,
    pub database: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Override for both ids; `None` leaves that id to the defaults.
    pub fn scoped(team: Option<&str>, database: Option<&str>) -> Self {
        Self {
            team: team.map(str::to_string),
            database: database.map(str::to_string),
        }
    }
}

fn effective(override_id: Option<&str>, default_id: Option<String>) -> Option<String> {
    override_id
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| default_id.filter(|id| !id.is_empty()))
}

/// Resolves endpoint paths against a host, version, and shared defaults.
#[derive(Debug, Clone)]
pub struct UrlTemplate {
    host: String,
    version: String,
    is_private_cloud: bool,
    defaults: SharedDefaults,
}

impl UrlTemplate {
    pub fn new(
        host: impl Into<String>,
        version: impl Into<String>,
        is_private_cloud: bool,
        defaults: SharedDefaults,
    ) -> Self {
        Self {
            host: host.into(),
            version: version.into(),
            is_private_cloud,
            defaults,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_private_cloud(&self) -> bool {
        self.is_private_cloud
    }

    pub fn defaults(&self) -> &SharedDefaults {
        &self.defaults
    }

    /// Resolve `path` into the request path (placeholders substituted,
    /// query appended), without the host.
    pub fn resolve_path(
        &self,
        path: &str,
        query: Option<&Map<String, Value>>,
        ctx: &RequestContext,
    ) -> Result<String> {
        let mut path = match (self.is_private_cloud, path.strip_prefix(TEAM_PREFIX)) {
            (true, Some(rest)) => format!("/{TEAM_ID}/api{}{rest}", self.version),
            _ => path.to_string(),
        };

        if let Some(query) = query.filter(|q| !q.is_empty()) {
            let encoded = encode_query(query)?;
            if !encoded.is_empty() {
                path.push('?');
                path.push_str(&encoded);
            }
        }

        if let Some(team) = effective(ctx.team.as_deref(), self.defaults.team()) {
            path = path.replace(TEAM_ID, &encode_segment(&team));
        }
        if let Some(database) = effective(ctx.database.as_deref(), self.defaults.database()) {
            path = path.replace(DATABASE_ID, &encode_segment(&database));
        }

        Ok(path)
    }

    /// Build the absolute URL for `path`.
    pub fn build(
        &self,
        path: &str,
        query: Option<&Map<String, Value>>,
        ctx: &RequestContext,
    ) -> Result<String> {
        Ok(self.absolute(&self.resolve_path(path, query, ctx)?))
    }

    /// Prefix a resolved path with the host. Private-cloud paths already
    /// carry the version after the team rewrite.
    pub fn absolute(&self, resolved_path: &str) -> String {
        if self.is_private_cloud {
            format!("{}{resolved_path}", self.host)
        } else {
            format!("{}{}{resolved_path}", self.host, self.version)
        }
    }
}

/// Percent-encode one path segment (a table id, record id or file name).
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, ID_ENCODE_SET).to_string()
}

/// Form-encode query parameters (`a[0]=x&b[c]=y`). Null values are dropped
/// at every depth; array indices are renumbered after a drop.
pub fn encode_query(query: &Map<String, Value>) -> Result<String> {
    Ok(serde_qs::to_string(&without_nulls_in_map(query))?)
}

fn without_nulls_in_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), without_nulls(v)))
        .collect()
}

fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(without_nulls_in_map(map)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|v| !v.is_null())
                .map(without_nulls)
                .collect(),
        ),
        other => other.clone(),
    }
}
