//! Mock FICCT backend for integration tests
//!
//! An axum server on an ephemeral port answers the endpoints the client
//! talks to, in the same mix of shapes the real backend uses.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use ficct_client::{ApiClientConfig, ApiGateway};
use ficct_session::SessionStore;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::net::TcpListener;

pub const VALID_EMAIL: &str = "docente@ficct.edu.bo";
pub const VALID_PASSWORD: &str = "secret";
pub const TAKEN_EMAIL: &str = "taken@ficct.edu.bo";

// Ensure tracing is initialised only once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

/// Observable state of the mock backend
#[derive(Default)]
pub struct MockState {
    hits: AtomicUsize,
    pub logout_fails: AtomicBool,
    last_query: Mutex<HashMap<String, String>>,
}

impl MockState {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> HashMap<String, String> {
        self.last_query.lock().clone()
    }
}

type Shared = Arc<MockState>;

pub struct TestBackend {
    pub base_url: String,
    pub state: Shared,
}

impl TestBackend {
    /// Gateway with a fresh in-memory session
    pub fn gateway(&self) -> ApiGateway {
        self.gateway_with(SessionStore::in_memory())
    }

    pub fn gateway_with(&self, session: SessionStore) -> ApiGateway {
        let config = ApiClientConfig::default()
            .with_base_url(&self.base_url)
            .with_timeout(10);
        ApiGateway::new(config, session).expect("Failed to build gateway")
    }
}

pub async fn spawn_backend() -> TestBackend {
    LazyLock::force(&TRACING);

    let state: Shared = Arc::new(MockState::default());
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Mock backend stopped");
    });

    TestBackend {
        base_url: format!("http://127.0.0.1:{}/api", port),
        state,
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/echo-headers", get(echo_headers))
        .route("/api/docentes", get(list_docentes).post(create_docente))
        .route("/api/docentes/{id}", get(get_docente))
        .route("/api/docentes/{id}/estado", patch(toggle_estado))
        .route("/api/roles", get(list_roles))
        .route("/api/carreras", get(list_carreras))
        .route("/api/periodos", get(list_periodos))
        .route("/api/materias", get(forbidden))
        .route("/api/mi-horario", get(mi_horario))
        .route("/api/slow", get(slow))
        .route("/api/broken", get(broken))
        .route("/api/empty", get(empty))
        .with_state(state)
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    state.hit();
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if email == VALID_EMAIL && password == VALID_PASSWORD {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Login exitoso",
                "data": {
                    "token": "abc",
                    "user": {"id": 1, "name": "Ana Pérez", "email": VALID_EMAIL},
                    "rol": "docente",
                    "permisos": ["x"]
                }
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Credenciales inválidas"})),
        )
    }
}

async fn logout(State(state): State<Shared>) -> impl IntoResponse {
    state.hit();
    if state.logout_fails.load(Ordering::SeqCst) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "message": "Error del servidor"})),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({"success": true, "message": "Sesión cerrada"})),
        )
    }
}

async fn echo_headers(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    state.hit();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "success": true,
        "data": {
            "authorization": header("authorization"),
            "accept": header("accept"),
            "content_type": header("content-type"),
            "x_client": header("x-client")
        }
    }))
}

async fn list_docentes(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.hit();
    let page: u64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    *state.last_query.lock() = params;

    // Bare paginator, as list endpoints return it
    Json(json!({
        "data": [{"id": page * 10, "nombre": "Ana", "apellido": "Pérez", "activo": true}],
        "current_page": page,
        "last_page": 3,
        "per_page": 1,
        "total": 3
    }))
}

async fn create_docente(State(state): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    state.hit();
    if body["email"] == TAKEN_EMAIL {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "message": "The email has already been taken.",
                "errors": {"email": ["The email has already been taken."]}
            })),
        );
    }

    let mut docente = body;
    docente["id"] = json!(42);
    (
        StatusCode::CREATED,
        Json(json!({"success": true, "data": docente})),
    )
}

async fn get_docente(State(state): State<Shared>, Path(id): Path<u64>) -> impl IntoResponse {
    state.hit();
    if id == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "Docente no encontrado"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"success": true, "data": {"id": id, "nombre": "Luis", "codigo": "D-7"}})),
    )
}

async fn toggle_estado(State(state): State<Shared>, Path(id): Path<u64>) -> Json<Value> {
    state.hit();
    Json(json!({"success": true, "data": {"id": id, "activo": false}}))
}

async fn list_roles(State(state): State<Shared>) -> Json<Value> {
    state.hit();
    Json(json!([
        {"id": 1, "nombre": "admin"},
        {"id": 2, "nombre": "coordinador"}
    ]))
}

async fn list_carreras(State(state): State<Shared>) -> Json<Value> {
    state.hit();
    Json(json!({
        "success": true,
        "data": [
            {"id": 1, "nombre": "Ingeniería Informática"},
            {"id": 2, "nombre": "Ingeniería de Sistemas"},
            {"id": 3, "nombre": "Redes y Telecomunicaciones"}
        ]
    }))
}

async fn list_periodos(State(state): State<Shared>) -> Json<Value> {
    state.hit();
    Json(json!({
        "success": true,
        "data": [{"id": 1, "nombre": "1/2025"}, {"id": 2, "nombre": "2/2025"}]
    }))
}

async fn forbidden(State(state): State<Shared>) -> impl IntoResponse {
    state.hit();
    (
        StatusCode::FORBIDDEN,
        Json(json!({"success": false, "message": "No autorizado"})),
    )
}

async fn mi_horario(State(state): State<Shared>) -> Json<Value> {
    state.hit();
    Json(json!({
        "success": true,
        "data": [
            {"dia": "Lunes", "hora_inicio": "07:00", "hora_fin": "08:30", "materia": "INF110"},
            {"dia": "Miércoles", "hora_inicio": "07:00:00", "hora_fin": "08:30:00", "materia": "INF110"}
        ]
    }))
}

async fn slow(State(state): State<Shared>) -> Json<Value> {
    state.hit();
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({"success": true}))
}

async fn broken(State(state): State<Shared>) -> impl IntoResponse {
    state.hit();
    (StatusCode::OK, "<html>maintenance</html>")
}

async fn empty(State(state): State<Shared>) -> StatusCode {
    state.hit();
    StatusCode::NO_CONTENT
}
