//! Request executor and endpoint operations.
//!
//! # Design
//! Every operation follows the same three steps: resolve a path template
//! into a URL (`build_url`), assemble an `HttpRequest` with the default
//! headers (`build_request`), and hand it to the `Transport` (`send`).
//! `build_request` is pure, which keeps request shapes testable without a
//! network.
//!
//! Team and database overrides arrive as a `RequestContext` that each
//! operation takes by value. It is consumed by the URL build, so nothing
//! from one call is visible to the next, even when several threads share a
//! client.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::{
    api_key_from_env, normalize_version, resolve_host, ClientOptions, SharedDefaults, DEFAULT_HOST,
};
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, TransportOptions};
use crate::template::{encode_segment, RequestContext, UrlTemplate};
use crate::transport::{Transport, UreqTransport};
use crate::types::{RecordInput, RecordQuery, UpsertInput};

/// Default timeout for file uploads.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for file downloads.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

const DATABASE_ROOT: &str = "/teams/{TEAM_ID}/databases/{DATABASE_ID}";

/// Blocking client for the tabledb REST API.
pub struct TableDbClient {
    urls: UrlTemplate,
    headers: Vec<String>,
    transport_options: TransportOptions,
    transport: Box<dyn Transport>,
    last_path: Mutex<String>,
}

impl std::fmt::Debug for TableDbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableDbClient")
            .field("host", &self.urls.host())
            .field("version", &self.urls.version())
            .field("is_private_cloud", &self.urls.is_private_cloud())
            .field("headers", &"********")
            .field("transport_options", &self.transport_options)
            .finish()
    }
}

impl TableDbClient {
    /// Create a client using the process-wide `SharedDefaults`.
    pub fn new(api_key: &str, options: ClientOptions, fixed_team: Option<&str>) -> Self {
        Self::with_defaults(api_key, options, fixed_team, SharedDefaults::global().clone())
    }

    /// Create a client bound to an explicit `SharedDefaults` handle.
    ///
    /// A team id found in a private-cloud host and a non-empty `fixed_team`
    /// are both written into `defaults`; `fixed_team` is applied last.
    pub fn with_defaults(
        api_key: &str,
        options: ClientOptions,
        fixed_team: Option<&str>,
        defaults: SharedDefaults,
    ) -> Self {
        let raw_host = options.host.as_deref().unwrap_or(DEFAULT_HOST);
        let resolved = resolve_host(raw_host, &defaults);
        if let Some(team) = fixed_team.filter(|t| !t.is_empty()) {
            defaults.set_team(Some(team));
        }
        let version = normalize_version(options.version.as_deref());
        debug!(
            host = %resolved.host,
            version = %version,
            private_cloud = resolved.is_private_cloud,
            "client configured"
        );

        Self {
            urls: UrlTemplate::new(resolved.host, version, resolved.is_private_cloud, defaults),
            headers: vec![format!("Authorization: Bearer {api_key}")],
            transport_options: options.transport,
            transport: Box::new(UreqTransport::new()),
            last_path: Mutex::new(String::new()),
        }
    }

    /// Create a client from `TABLEDB_API_KEY`, `TABLEDB_HOST` and `TABLEDB_VERSION`.
    pub fn from_env() -> Result<Self> {
        let api_key = api_key_from_env()?;
        Ok(Self::new(&api_key, ClientOptions::from_env(), None))
    }

    /// Replace the transport, e.g. with a recording fake in tests.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    pub fn host(&self) -> &str {
        self.urls.host()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn version(&self) -> &str {
        self.urls.version()
    }

    /// Path and query of the most recently built URL.
    pub fn path(&self) -> String {
        self.last_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }

    pub fn set_transport_options(&mut self, options: TransportOptions) {
        self.transport_options = options;
    }

    pub fn is_private_cloud(&self) -> bool {
        self.urls.is_private_cloud()
    }

    pub fn defaults(&self) -> &SharedDefaults {
        self.urls.defaults()
    }

    // -----------------------------------------------------------------------
    // Executor
    // -----------------------------------------------------------------------

    /// Resolve a path template into an absolute URL, consuming the overrides.
    pub fn build_url(
        &self,
        path: &str,
        query: Option<&Map<String, Value>>,
        ctx: RequestContext,
    ) -> Result<String> {
        let resolved = self.urls.resolve_path(path, query, &ctx)?;
        let url = self.urls.absolute(&resolved);
        *self.last_path.lock().unwrap_or_else(PoisonError::into_inner) = resolved;
        Ok(url)
    }

    /// Assemble a request: default headers, then `extra_headers`, then a JSON
    /// content type when `body` is present.
    pub fn build_request(
        &self,
        method: HttpMethod,
        url: String,
        body: Option<&Value>,
        extra_headers: &[String],
    ) -> Result<HttpRequest> {
        let mut headers = self.headers.clone();
        headers.extend(extra_headers.iter().cloned());

        let body = match body {
            Some(body) => {
                headers.push("Content-Type: application/json".to_string());
                Some(serde_json::to_vec(body)?)
            }
            None => None,
        };
        trace!(count = headers.len(), "request headers merged");

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Execute `request` once. Non-2xx statuses come back as ordinary
    /// responses; only transport failures are errors.
    pub fn send(
        &self,
        request: &HttpRequest,
        call_options: &TransportOptions,
        sink: Option<&mut dyn Write>,
    ) -> Result<HttpResponse> {
        let options = TransportOptions::base()
            .merged(&self.transport_options)
            .merged(call_options);

        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let raw = self.transport.execute(request, &options, sink)?;
        let response = HttpResponse::from_raw(&raw.bytes, raw.header_size, raw.status);
        debug!(
            method = request.method.as_str(),
            url = %request.url,
            status = response.status,
            "response received"
        );
        Ok(response)
    }

    /// Build and send a JSON request in one step.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: Option<&Map<String, Value>>,
        body: Option<&Value>,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let url = self.build_url(path, query, ctx)?;
        let request = self.build_request(method, url, body, &[])?;
        self.send(&request, &TransportOptions::default(), None)
    }

    // -----------------------------------------------------------------------
    // Teams and databases
    // -----------------------------------------------------------------------

    pub fn list_teams(&self) -> Result<HttpResponse> {
        self.request(HttpMethod::Get, "/teams", None, None, RequestContext::new())
    }

    pub fn list_databases(&self, ctx: RequestContext) -> Result<HttpResponse> {
        self.request(HttpMethod::Get, "/teams/{TEAM_ID}/databases", None, None, ctx)
    }

    /// True when the API key is accepted by the backend.
    pub fn validate_key(&self) -> Result<bool> {
        let response = if self.is_private_cloud() {
            self.list_databases(RequestContext::new())?
        } else {
            self.list_teams()?
        };
        Ok(response.is_success())
    }

    // -----------------------------------------------------------------------
    // Tables and records
    // -----------------------------------------------------------------------

    pub fn list_tables(&self, ctx: RequestContext) -> Result<HttpResponse> {
        let path = format!("{DATABASE_ROOT}/tables");
        self.request(HttpMethod::Get, &path, None, None, ctx)
    }

    pub fn table_info(&self, table_id: &str, ctx: RequestContext) -> Result<HttpResponse> {
        let path = table_path(table_id);
        self.request(HttpMethod::Get, &path, None, None, ctx)
    }

    pub fn query_records(
        &self,
        table_id: &str,
        query: &RecordQuery,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let path = format!("{}/records", table_path(table_id));
        let params = query.to_params()?;
        self.request(HttpMethod::Get, &path, Some(&params), None, ctx)
    }

    pub fn get_record(
        &self,
        table_id: &str,
        record_id: &str,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let path = record_path(table_id, record_id);
        self.request(HttpMethod::Get, &path, None, None, ctx)
    }

    /// Update one record's fields through the upsert endpoint.
    pub fn update_record(
        &self,
        table_id: &str,
        record_id: &str,
        fields: Map<String, Value>,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let record = RecordInput::with_id(record_id, fields);
        self.upsert_records(table_id, record.into(), ctx)
    }

    /// Insert records without an id, update those with one.
    pub fn upsert_records(
        &self,
        table_id: &str,
        records: UpsertInput,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let path = format!("{}/records", table_path(table_id));
        let body = serde_json::to_value(records.into_records())?;
        self.request(HttpMethod::Post, &path, None, Some(&body), ctx)
    }

    pub fn delete_record(
        &self,
        table_id: &str,
        record_id: &str,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let path = record_path(table_id, record_id);
        self.request(HttpMethod::Delete, &path, None, None, ctx)
    }

    /// Evaluate an expression server-side. The expression is sent verbatim.
    pub fn eval_query(&self, query: &str, ctx: RequestContext) -> Result<HttpResponse> {
        let path = format!("{DATABASE_ROOT}/query");
        let body = json!({ "query": query });
        self.request(HttpMethod::Post, &path, None, Some(&body), ctx)
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    pub fn list_record_files(
        &self,
        table_id: &str,
        record_id: &str,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let path = format!("{}/files", record_path(table_id, record_id));
        self.request(HttpMethod::Get, &path, None, None, ctx)
    }

    /// Upload a local file to a record with the default upload timeout.
    pub fn upload_file(
        &self,
        table_id: &str,
        record_id: &str,
        file: &Path,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let bytes = std::fs::read(file)?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        self.upload_bytes(table_id, record_id, &file_name, &bytes, None, ctx)
    }

    /// Upload `bytes` as the multipart field `file`.
    pub fn upload_bytes(
        &self,
        table_id: &str,
        record_id: &str,
        file_name: &str,
        bytes: &[u8],
        timeout: Option<Duration>,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let path = format!("{}/files", record_path(table_id, record_id));
        let url = self.build_url(&path, None, ctx)?;

        let boundary = format!("tabledb-{}", Uuid::new_v4().simple());
        let mut request = self.build_request(
            HttpMethod::Post,
            url,
            None,
            &[format!("Content-Type: multipart/form-data; boundary={boundary}")],
        )?;
        request.body = Some(multipart_body(&boundary, file_name, bytes));

        let options = TransportOptions::default().with_timeout(timeout.unwrap_or(UPLOAD_TIMEOUT));
        self.send(&request, &options, None)
    }

    pub fn delete_file(
        &self,
        table_id: &str,
        record_id: &str,
        file_name: &str,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let path = file_path(table_id, record_id, file_name);
        self.request(HttpMethod::Delete, &path, None, None, ctx)
    }

    /// Download a record file into `dest`.
    ///
    /// `dest` is opened before any request is made; failure to open it is
    /// `Error::DestinationNotWritable`. The response body is written to the
    /// file whatever the status, so check `is_success()`.
    pub fn download_file(
        &self,
        table_id: &str,
        record_id: &str,
        file_name: &str,
        dest: &Path,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let mut file = File::create(dest).map_err(|source| Error::DestinationNotWritable {
            path: dest.to_path_buf(),
            source,
        })?;
        let response = self.download_to(table_id, record_id, file_name, &mut file, None, ctx)?;
        file.flush()?;
        Ok(response)
    }

    /// Stream a record file into `writer`.
    pub fn download_to(
        &self,
        table_id: &str,
        record_id: &str,
        file_name: &str,
        writer: &mut dyn Write,
        timeout: Option<Duration>,
        ctx: RequestContext,
    ) -> Result<HttpResponse> {
        let path = file_path(table_id, record_id, file_name);
        let url = self.build_url(&path, None, ctx)?;
        let request = self.build_request(HttpMethod::Get, url, None, &[])?;
        let options = TransportOptions {
            buffer_response: Some(false),
            timeout: Some(timeout.unwrap_or(DOWNLOAD_TIMEOUT)),
            ..Default::default()
        };
        self.send(&request, &options, Some(writer))
    }
}

fn table_path(table_id: &str) -> String {
    format!("{DATABASE_ROOT}/tables/{}", encode_segment(table_id))
}

fn record_path(table_id: &str, record_id: &str) -> String {
    format!("{}/records/{}", table_path(table_id), encode_segment(record_id))
}

fn file_path(table_id: &str, record_id: &str, file_name: &str) -> String {
    format!(
        "{}/files/{}",
        record_path(table_id, record_id),
        encode_segment(file_name)
    )
}

/// A `multipart/form-data` body with the single field `file`.
fn multipart_body(boundary: &str, file_name: &str, bytes: &[u8]) -> Vec<u8> {
    let file_name = file_name.replace('"', "%22");
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::transport::RawResponse;

    const OK_HEAD: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n";

    /// Records every request and answers with a canned response.
    #[derive(Clone)]
    struct Recorder {
        seen: Arc<Mutex<Vec<(HttpRequest, TransportOptions)>>>,
        status: u16,
        body: &'static str,
    }

    impl Recorder {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                seen: Arc::new(Mutex::new(Vec::new())),
                status,
                body,
            }
        }

        fn last(&self) -> (HttpRequest, TransportOptions) {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }

        fn urls(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|(r, _)| r.url.clone())
                .collect()
        }
    }

    impl Transport for Recorder {
        fn execute(
            &self,
            request: &HttpRequest,
            options: &TransportOptions,
            sink: Option<&mut dyn Write>,
        ) -> Result<RawResponse> {
            self.seen
                .lock()
                .unwrap()
                .push((request.clone(), options.clone()));
            let mut bytes = OK_HEAD.as_bytes().to_vec();
            match sink {
                Some(sink) => sink.write_all(self.body.as_bytes())?,
                None => bytes.extend_from_slice(self.body.as_bytes()),
            }
            Ok(RawResponse {
                bytes,
                header_size: OK_HEAD.len(),
                status: self.status,
            })
        }
    }

    fn public_client(recorder: &Recorder) -> TableDbClient {
        let defaults = SharedDefaults::new();
        defaults.set_team(Some("T1"));
        defaults.set_database(Some("D1"));
        TableDbClient::with_defaults("secret", ClientOptions::default(), None, defaults)
            .with_transport(recorder.clone())
    }

    #[test]
    fn construction_normalizes_host_and_version() {
        let options = ClientOptions {
            host: Some("https://api.tabledb.cloud/v1/".into()),
            version: Some("v2".into()),
            ..Default::default()
        };
        let client = TableDbClient::with_defaults("k", options, None, SharedDefaults::new());
        assert_eq!(client.host(), "https://api.tabledb.cloud");
        assert_eq!(client.version(), "/v2");
        assert!(!client.is_private_cloud());
        assert_eq!(client.headers(), ["Authorization: Bearer k"]);
    }

    #[test]
    fn fixed_team_wins_over_host_team() {
        let options = ClientOptions {
            host: Some("https://example.com/hostteam/api/v1".into()),
            ..Default::default()
        };
        let defaults = SharedDefaults::new();
        let client = TableDbClient::with_defaults("k", options, Some("fixed"), defaults.clone());
        assert!(client.is_private_cloud());
        assert_eq!(client.host(), "https://example.com");
        assert_eq!(defaults.team().as_deref(), Some("fixed"));
    }

    #[test]
    fn debug_hides_api_key() {
        let client = public_client(&Recorder::new(200, ""));
        assert!(!format!("{client:?}").contains("secret"));
    }

    #[test]
    fn list_databases_uses_defaults() {
        let recorder = Recorder::new(200, "[]");
        let resp = public_client(&recorder)
            .list_databases(RequestContext::new())
            .unwrap();
        assert!(resp.is_success());
        let (req, _) = recorder.last();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.tabledb.cloud/v1/teams/T1/databases");
        assert_eq!(req.headers, vec!["Authorization: Bearer secret"]);
        assert!(req.body.is_none());
    }

    #[test]
    fn overrides_apply_to_one_call_only() {
        let recorder = Recorder::new(200, "[]");
        let client = public_client(&recorder);
        client
            .list_tables(RequestContext::new().with_team("T9").with_database("D9"))
            .unwrap();
        client.list_tables(RequestContext::new()).unwrap();
        assert_eq!(
            recorder.urls(),
            vec![
                "https://api.tabledb.cloud/v1/teams/T9/databases/D9/tables",
                "https://api.tabledb.cloud/v1/teams/T1/databases/D1/tables",
            ]
        );
    }

    #[test]
    fn path_accessor_reports_last_build() {
        let recorder = Recorder::new(200, "{}");
        let client = public_client(&recorder);
        client.table_info("A", RequestContext::new()).unwrap();
        assert_eq!(client.path(), "/teams/T1/databases/D1/tables/A");
    }

    #[test]
    fn query_records_coerces_booleans() {
        let recorder = Recorder::new(200, "[]");
        let client = public_client(&recorder);
        let query = RecordQuery::new().param("desc", 1).param("new", 0).per_page(5);
        client.query_records("A", &query, RequestContext::new()).unwrap();
        let (req, _) = recorder.last();
        assert!(req
            .url
            .starts_with("https://api.tabledb.cloud/v1/teams/T1/databases/D1/tables/A/records?"));
        assert!(req.url.contains("desc=true"));
        assert!(req.url.contains("new=false"));
        assert!(req.url.contains("perPage=5"));
    }

    #[test]
    fn update_record_posts_single_element_list() {
        let recorder = Recorder::new(200, "[]");
        let client = public_client(&recorder);
        let fields = json!({"Name": "Ada"}).as_object().cloned().unwrap();
        client
            .update_record("A", "12", fields, RequestContext::new())
            .unwrap();
        let (req, _) = recorder.last();
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.url.ends_with("/tables/A/records"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        let body: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!([{"id": "12", "fields": {"Name": "Ada"}}]));
    }

    #[test]
    fn eval_query_sends_expression_verbatim() {
        let recorder = Recorder::new(200, "3");
        let client = public_client(&recorder);
        let resp = client
            .eval_query("count(select Customers)", RequestContext::new())
            .unwrap();
        assert_eq!(resp.body, Some(json!(3)));
        let (req, _) = recorder.last();
        assert!(req.url.ends_with("/teams/T1/databases/D1/query"));
        let body: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"query": "count(select Customers)"}));
    }

    #[test]
    fn non_success_is_not_an_error() {
        let recorder = Recorder::new(404, r#"{"message":"not found"}"#);
        let resp = public_client(&recorder)
            .get_record("A", "99", RequestContext::new())
            .unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.body.unwrap()["message"], "not found");
    }

    #[test]
    fn transport_options_are_layered() {
        let recorder = Recorder::new(200, "");
        let mut client = public_client(&recorder);
        client.set_transport_options(TransportOptions {
            verify_tls: Some(false),
            timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        assert_eq!(client.transport_options().verify_tls, Some(false));

        client.list_teams().unwrap();
        let (_, opts) = recorder.last();
        assert_eq!(opts.verify_tls, Some(false));
        assert_eq!(opts.timeout, Some(Duration::from_secs(5)));
        assert_eq!(opts.fail_on_error, Some(false));
        assert_eq!(opts.buffer_response, Some(true));

        client
            .upload_bytes("A", "1", "a.txt", b"hi", None, RequestContext::new())
            .unwrap();
        let (_, opts) = recorder.last();
        assert_eq!(opts.timeout, Some(UPLOAD_TIMEOUT));
    }

    #[test]
    fn upload_sends_multipart_post() {
        let recorder = Recorder::new(200, "");
        let client = public_client(&recorder);
        client
            .upload_bytes("A", "1", "notes.txt", b"hello", None, RequestContext::new())
            .unwrap();
        let (req, _) = recorder.last();
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.url.ends_with("/tables/A/records/1/files"));
        let content_type = req.header("Content-Type").unwrap();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();
        let body = String::from_utf8(req.body.clone().unwrap()).unwrap();
        assert!(body.starts_with(&format!("--{boundary}\r\n")));
        assert!(body.contains("name=\"file\"; filename=\"notes.txt\""));
        assert!(body.contains("\r\n\r\nhello\r\n"));
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn download_streams_into_destination() {
        let recorder = Recorder::new(200, "file contents");
        let client = public_client(&recorder);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.txt");
        let resp = client
            .download_file("A", "1", "my file.txt", &dest, RequestContext::new())
            .unwrap();
        assert!(resp.body.is_none());
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "file contents");

        let (req, opts) = recorder.last();
        assert!(req.url.ends_with("/records/1/files/my%20file.txt"));
        assert_eq!(opts.timeout, Some(DOWNLOAD_TIMEOUT));
        assert_eq!(opts.buffer_response, Some(false));
    }

    #[test]
    fn unwritable_destination_fails_before_request() {
        let recorder = Recorder::new(200, "");
        let client = public_client(&recorder);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing").join("out.txt");
        let err = client
            .download_file("A", "1", "x", &dest, RequestContext::new())
            .unwrap_err();
        assert!(matches!(err, Error::DestinationNotWritable { .. }));
        assert!(recorder.urls().is_empty());
    }

    #[test]
    fn validate_key_uses_teams_on_public_host() {
        let recorder = Recorder::new(401, "");
        assert!(!public_client(&recorder).validate_key().unwrap());
        assert_eq!(recorder.urls(), vec!["https://api.tabledb.cloud/v1/teams"]);
    }

    #[test]
    fn validate_key_uses_databases_on_private_cloud() {
        let recorder = Recorder::new(200, "[]");
        let options = ClientOptions {
            host: Some("https://example.com/acme/api/v1".into()),
            ..Default::default()
        };
        let client = TableDbClient::with_defaults("k", options, None, SharedDefaults::new())
            .with_transport(recorder.clone());
        assert!(client.validate_key().unwrap());
        assert_eq!(
            recorder.urls(),
            vec!["https://example.com/acme/api/v1/databases"]
        );
    }
}
