use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const TEST_API_KEY: &str = "test-key";
pub const SEED_TEAM: &str = "T1";
pub const SEED_DATABASE: &str = "D1";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Database {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: u64,
    pub fields: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FileInfo {
    pub name: String,
    pub size: usize,
}

#[derive(Deserialize)]
pub struct UpsertRecord {
    #[serde(default)]
    pub id: Option<Value>,
    pub fields: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct EvalQuery {
    pub query: String,
}

/// In-memory backend: one team, one database, two tables.
#[derive(Debug)]
pub struct Backend {
    teams: Vec<Team>,
    databases: Vec<Database>,
    tables: Vec<Table>,
    records: HashMap<String, BTreeMap<u64, Record>>,
    files: HashMap<(String, u64), BTreeMap<String, Vec<u8>>>,
    next_id: u64,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            teams: vec![Team {
                id: SEED_TEAM.to_string(),
                name: "Acme".to_string(),
            }],
            databases: vec![Database {
                id: SEED_DATABASE.to_string(),
                name: "CRM".to_string(),
            }],
            tables: vec![
                Table {
                    id: "A".to_string(),
                    name: "Customers".to_string(),
                },
                Table {
                    id: "B".to_string(),
                    name: "Orders".to_string(),
                },
            ],
            records: HashMap::new(),
            files: HashMap::new(),
            next_id: 1,
        }
    }
}

pub type Db = Arc<RwLock<Backend>>;

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    db: Db,
}

#[derive(Deserialize)]
struct TeamPath {
    team: String,
}

#[derive(Deserialize)]
struct DatabasePath {
    team: String,
    db: String,
}

#[derive(Deserialize)]
struct TablePath {
    team: String,
    db: String,
    table: String,
}

#[derive(Deserialize)]
struct RecordPath {
    team: String,
    db: String,
    table: String,
    record: u64,
}

#[derive(Deserialize)]
struct FilePath {
    team: String,
    db: String,
    table: String,
    record: u64,
    name: String,
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "not found")
}

impl Backend {
    fn has_database(&self, team: &str, db: &str) -> bool {
        team == SEED_TEAM && self.databases.iter().any(|d| d.id == db)
    }

    fn table(&self, team: &str, db: &str, table: &str) -> Option<&Table> {
        if !self.has_database(team, db) {
            return None;
        }
        self.tables.iter().find(|t| t.id == table)
    }

    fn has_record(&self, table: &str, record: u64) -> bool {
        self.records
            .get(table)
            .is_some_and(|rows| rows.contains_key(&record))
    }
}

pub fn app() -> Router {
    app_with_key(TEST_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        db: Arc::new(RwLock::new(Backend::default())),
    };

    Router::new()
        .route("/teams", get(list_teams))
        .route("/v1/teams", get(list_teams))
        .nest("/v1/teams/{team}", team_routes())
        .nest("/{team}/api/v1", team_routes())
        .layer(middleware::from_fn_with_state(state.clone(), require_key))
        .with_state(state)
}

/// Routes under a team, mounted at both the public and private-cloud prefixes.
fn team_routes() -> Router<AppState> {
    Router::new()
        .route("/databases", get(list_databases))
        .route("/databases/{db}/tables", get(list_tables))
        .route("/databases/{db}/tables/{table}", get(table_info))
        .route(
            "/databases/{db}/tables/{table}/records",
            get(query_records).post(upsert_records),
        )
        .route(
            "/databases/{db}/tables/{table}/records/{record}",
            get(get_record).delete(delete_record),
        )
        .route(
            "/databases/{db}/tables/{table}/records/{record}/files",
            get(list_files).post(upload_file),
        )
        .route(
            "/databases/{db}/tables/{table}/records/{record}/files/{name}",
            get(download_file).delete(delete_file),
        )
        .route("/databases/{db}/query", post(eval_query))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.api_key);
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "invalid API key");
    }
    next.run(req).await
}

async fn list_teams(State(state): State<AppState>) -> Json<Vec<Team>> {
    Json(state.db.read().await.teams.clone())
}

async fn list_databases(State(state): State<AppState>, Path(p): Path<TeamPath>) -> Response {
    if p.team != SEED_TEAM {
        return not_found();
    }
    Json(state.db.read().await.databases.clone()).into_response()
}

async fn list_tables(State(state): State<AppState>, Path(p): Path<DatabasePath>) -> Response {
    let backend = state.db.read().await;
    if !backend.has_database(&p.team, &p.db) {
        return not_found();
    }
    Json(backend.tables.clone()).into_response()
}

async fn table_info(State(state): State<AppState>, Path(p): Path<TablePath>) -> Response {
    let backend = state.db.read().await;
    match backend.table(&p.team, &p.db, &p.table) {
        Some(table) => Json(table.clone()).into_response(),
        None => not_found(),
    }
}

fn parse_flag(params: &HashMap<String, String>, key: &str) -> Result<bool, Response> {
    match params.get(key).map(String::as_str) {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(error(
            StatusCode::BAD_REQUEST,
            &format!("{key} must be true or false, got {other}"),
        )),
    }
}

async fn query_records(
    State(state): State<AppState>,
    Path(p): Path<TablePath>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let backend = state.db.read().await;
    if backend.table(&p.team, &p.db, &p.table).is_none() {
        return not_found();
    }

    let desc = match parse_flag(&params, "desc") {
        Ok(desc) => desc,
        Err(resp) => return resp,
    };
    let filters: Map<String, Value> = match params.get("filters") {
        Some(raw) => match serde_json::from_str(raw) {
            Ok(filters) => filters,
            Err(_) => return error(StatusCode::BAD_REQUEST, "filters must be a JSON object"),
        },
        None => Map::new(),
    };
    let per_page: usize = params
        .get("perPage")
        .and_then(|v| v.parse().ok())
        .unwrap_or(100);
    let page: usize = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(0);

    let mut rows: Vec<Record> = backend
        .records
        .get(&p.table)
        .map(|rows| rows.values().cloned().collect())
        .unwrap_or_default();
    rows.retain(|r| filters.iter().all(|(k, v)| r.fields.get(k) == Some(v)));
    if desc {
        rows.reverse();
    }
    let rows: Vec<Record> = rows.into_iter().skip(page * per_page).take(per_page).collect();
    Json(rows).into_response()
}

fn parse_id(id: &Value) -> Option<u64> {
    match id {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

async fn upsert_records(
    State(state): State<AppState>,
    Path(p): Path<TablePath>,
    Json(input): Json<Vec<UpsertRecord>>,
) -> Response {
    let mut backend = state.db.write().await;
    if backend.table(&p.team, &p.db, &p.table).is_none() {
        return not_found();
    }

    let mut saved = Vec::with_capacity(input.len());
    for item in input {
        let id = match item.id.as_ref().map(parse_id) {
            Some(Some(id)) => id,
            Some(None) => return error(StatusCode::BAD_REQUEST, "invalid record id"),
            None => {
                let id = backend.next_id;
                backend.next_id += 1;
                id
            }
        };
        let rows = backend.records.entry(p.table.clone()).or_default();
        let record = rows.entry(id).or_insert_with(|| Record {
            id,
            fields: Map::new(),
        });
        record.fields.extend(item.fields);
        saved.push(record.clone());
        if id >= backend.next_id {
            backend.next_id = id + 1;
        }
    }
    Json(saved).into_response()
}

async fn get_record(State(state): State<AppState>, Path(p): Path<RecordPath>) -> Response {
    let backend = state.db.read().await;
    if backend.table(&p.team, &p.db, &p.table).is_none() {
        return not_found();
    }
    backend
        .records
        .get(&p.table)
        .and_then(|rows| rows.get(&p.record))
        .map(|r| Json(r.clone()).into_response())
        .unwrap_or_else(not_found)
}

async fn delete_record(State(state): State<AppState>, Path(p): Path<RecordPath>) -> Response {
    let mut backend = state.db.write().await;
    if backend.table(&p.team, &p.db, &p.table).is_none() {
        return not_found();
    }
    let removed = backend
        .records
        .get_mut(&p.table)
        .and_then(|rows| rows.remove(&p.record));
    match removed {
        Some(_) => {
            backend.files.remove(&(p.table.clone(), p.record));
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(),
    }
}

async fn eval_query(
    State(state): State<AppState>,
    Path(p): Path<DatabasePath>,
    Json(input): Json<EvalQuery>,
) -> Response {
    let backend = state.db.read().await;
    if !backend.has_database(&p.team, &p.db) {
        return not_found();
    }
    // Only `count(<table id>)` is understood.
    let table = input
        .query
        .trim()
        .strip_prefix("count(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim);
    match table {
        Some(table) if backend.tables.iter().any(|t| t.id == table) => {
            let count = backend.records.get(table).map_or(0, BTreeMap::len);
            Json(json!(count)).into_response()
        }
        _ => error(StatusCode::BAD_REQUEST, "unsupported expression"),
    }
}

async fn list_files(State(state): State<AppState>, Path(p): Path<RecordPath>) -> Response {
    let backend = state.db.read().await;
    if backend.table(&p.team, &p.db, &p.table).is_none() || !backend.has_record(&p.table, p.record)
    {
        return not_found();
    }
    let files: Vec<FileInfo> = backend
        .files
        .get(&(p.table.clone(), p.record))
        .map(|files| {
            files
                .iter()
                .map(|(name, bytes)| FileInfo {
                    name: name.clone(),
                    size: bytes.len(),
                })
                .collect()
        })
        .unwrap_or_default();
    Json(files).into_response()
}

async fn upload_file(
    State(state): State<AppState>,
    Path(p): Path<RecordPath>,
    mut multipart: Multipart,
) -> Response {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let name = field.file_name().unwrap_or("file").to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((name, bytes)),
                    Err(_) => return error(StatusCode::BAD_REQUEST, "unreadable file field"),
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(_) => return error(StatusCode::BAD_REQUEST, "malformed multipart body"),
        }
    }
    let Some((name, bytes)) = upload else {
        return error(StatusCode::BAD_REQUEST, "missing file field");
    };

    let mut backend = state.db.write().await;
    if backend.table(&p.team, &p.db, &p.table).is_none() || !backend.has_record(&p.table, p.record)
    {
        return not_found();
    }
    let info = FileInfo {
        name: name.clone(),
        size: bytes.len(),
    };
    backend
        .files
        .entry((p.table.clone(), p.record))
        .or_default()
        .insert(name, bytes.to_vec());
    Json(info).into_response()
}

async fn download_file(State(state): State<AppState>, Path(p): Path<FilePath>) -> Response {
    let backend = state.db.read().await;
    if backend.table(&p.team, &p.db, &p.table).is_none() {
        return not_found();
    }
    match backend
        .files
        .get(&(p.table.clone(), p.record))
        .and_then(|files| files.get(&p.name))
    {
        Some(bytes) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            Bytes::from(bytes.clone()),
        )
            .into_response(),
        None => not_found(),
    }
}

async fn delete_file(State(state): State<AppState>, Path(p): Path<FilePath>) -> Response {
    let mut backend = state.db.write().await;
    if backend.table(&p.team, &p.db, &p.table).is_none() {
        return not_found();
    }
    let removed = backend
        .files
        .get_mut(&(p.table.clone(), p.record))
        .and_then(|files| files.remove(&p.name));
    match removed {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_to_json() {
        let mut fields = Map::new();
        fields.insert("Name".to_string(), json!("Ada"));
        let record = Record { id: 3, fields };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, json!({"id": 3, "fields": {"Name": "Ada"}}));
    }

    #[test]
    fn upsert_record_id_is_optional() {
        let input: UpsertRecord = serde_json::from_str(r#"{"fields":{"A":1}}"#).unwrap();
        assert!(input.id.is_none());
        assert_eq!(input.fields["A"], 1);
    }

    #[test]
    fn upsert_record_rejects_missing_fields() {
        let result: Result<UpsertRecord, _> = serde_json::from_str(r#"{"id":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn parse_id_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_id(&json!(4)), Some(4));
        assert_eq!(parse_id(&json!("12")), Some(12));
        assert_eq!(parse_id(&json!("B2")), None);
        assert_eq!(parse_id(&json!(null)), None);
    }

    #[test]
    fn seeded_backend_knows_its_tables() {
        let backend = Backend::default();
        assert!(backend.table(SEED_TEAM, SEED_DATABASE, "A").is_some());
        assert!(backend.table(SEED_TEAM, SEED_DATABASE, "Z").is_none());
        assert!(backend.table("other", SEED_DATABASE, "A").is_none());
    }
}
