//! Mock forms backend served by axum on a random local port.

#![allow(dead_code)]

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use intake::domain::{FormRecord, FormSchema};
use intake::engine::registry::FieldTypeRegistry;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// One multipart part as the backend saw it
#[derive(Debug, Clone)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct BackendState {
    pub forms: Vec<FormRecord>,
    pub applications: Vec<Value>,
    /// Parts of each stored application, aligned with `applications`
    pub stored_parts: Vec<Vec<ReceivedPart>>,
    pub received: Vec<Vec<ReceivedPart>>,
    pub authorization: Vec<Option<String>>,
    pub submit_delay: Option<Duration>,
    pub fail_submissions: bool,
}

pub type SharedState = Arc<Mutex<BackendState>>;

pub struct MockBackend {
    pub addr: SocketAddr,
    pub base_url: String,
    pub state: SharedState,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: SharedState = Arc::new(Mutex::new(BackendState::default()));

        let app = Router::new()
            .route("/field-types/", get(list_field_types))
            .route("/forms/", get(list_forms).post(create_form))
            .route("/forms/:id", get(get_form).delete(delete_form))
            .route("/applications/submit/:form_id", post(submit))
            .route("/applications/form/:form_id", get(list_applications))
            .route("/applications/:id/download-file/:field_id", get(download))
            .with_state(state.clone());

        // Start server on random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockBackend {
            addr,
            base_url,
            state,
        }
    }

    pub async fn add_form(&self, schema: FormSchema) -> i64 {
        let mut state = self.state.lock().await;
        let id = 482913 + state.forms.len() as i64;
        state.forms.push(FormRecord {
            id,
            schema,
            creator_id: Some(1),
            created_at: None,
        });
        id
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn list_field_types() -> Json<Value> {
    let types: Vec<_> = FieldTypeRegistry::builtin().iter().cloned().collect();
    Json(json!(types))
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    100
}

async fn list_forms(State(state): State<SharedState>, Query(page): Query<PageQuery>) -> Json<Value> {
    let state = state.lock().await;
    let forms: Vec<_> = state.forms.iter().skip(page.skip).take(page.limit).collect();
    Json(json!(forms))
}

async fn get_form(State(state): State<SharedState>, Path(id): Path<i64>) -> Response {
    let state = state.lock().await;
    match state.forms.iter().find(|f| f.id == id) {
        Some(form) => Json(json!(form)).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Form not found"),
    }
}

async fn delete_form(State(state): State<SharedState>, Path(id): Path<i64>) -> Response {
    let mut state = state.lock().await;
    let before = state.forms.len();
    state.forms.retain(|f| f.id != id);
    if state.forms.len() == before {
        return detail(StatusCode::NOT_FOUND, "Form not found");
    }
    Json(json!({ "message": "Form deleted successfully" })).into_response()
}

async fn create_form(State(state): State<SharedState>, Json(schema): Json<FormSchema>) -> Response {
    if let Err(errors) = FieldTypeRegistry::builtin().check_schema(&schema) {
        return detail(StatusCode::BAD_REQUEST, &errors[0].to_string());
    }
    let mut state = state.lock().await;
    let id = 482913 + state.forms.len() as i64;
    let record = FormRecord {
        id,
        schema,
        creator_id: Some(1),
        created_at: None,
    };
    state.forms.push(record.clone());
    Json(json!(record)).into_response()
}

async fn submit(
    State(state): State<SharedState>,
    Path(form_id): Path<i64>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let (delay, fail) = {
        let mut state = state.lock().await;
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        state.authorization.push(auth);
        (state.submit_delay, state.fail_submissions)
    };

    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let data = field.bytes().await.unwrap_or_default().to_vec();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut state = state.lock().await;
    state.received.push(parts.clone());
    if fail {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    if !state.forms.iter().any(|f| f.id == form_id) {
        return detail(StatusCode::NOT_FOUND, "Form not found");
    }

    let raw = parts
        .iter()
        .find(|p| p.name == "form_data")
        .map(|p| String::from_utf8_lossy(&p.data).into_owned())
        .unwrap_or_default();
    let mut form_data: Map<String, Value> = match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(_) => return detail(StatusCode::BAD_REQUEST, "Invalid form data JSON"),
    };
    // File-only fields are accepted; the client never lists them in form_data.
    for part in parts.iter().filter(|p| p.name == "files") {
        if let Some((field_id, name)) = part.file_name.as_deref().and_then(|n| n.split_once("___")) {
            form_data.insert(field_id.to_string(), Value::String(name.to_string()));
        }
    }

    let application = json!({
        "id": state.applications.len() as i64 + 1,
        "form_id": form_id,
        "form_data": form_data,
        "status": "submitted",
    });
    state.applications.push(application.clone());
    state.stored_parts.push(parts);
    Json(application).into_response()
}

async fn list_applications(
    State(state): State<SharedState>,
    Path(form_id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> Json<Value> {
    let state = state.lock().await;
    let apps: Vec<_> = state
        .applications
        .iter()
        .filter(|a| a["form_id"] == form_id)
        .skip(page.skip)
        .take(page.limit)
        .cloned()
        .collect();
    Json(json!(apps))
}

async fn download(
    State(state): State<SharedState>,
    Path((id, field_id)): Path<(i64, String)>,
) -> Response {
    let state = state.lock().await;
    let Some(parts) = state.stored_parts.get((id - 1) as usize) else {
        return detail(StatusCode::NOT_FOUND, "Application not found");
    };
    let prefix = format!("{}___", field_id);
    let Some(part) = parts
        .iter()
        .find(|p| p.file_name.as_deref().is_some_and(|n| n.starts_with(&prefix)))
    else {
        return detail(StatusCode::NOT_FOUND, "File not found");
    };

    let name = part
        .file_name
        .as_deref()
        .and_then(|n| n.strip_prefix(&prefix))
        .unwrap_or_default()
        .to_string();
    let content_type = part
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    (
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        part.data.clone(),
    )
        .into_response()
}
