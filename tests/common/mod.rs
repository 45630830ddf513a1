//! In-process stand-in for a Yopass service.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

const EXPIRATIONS: [u64; 3] = [3600, 86400, 604800];
const PGP_MESSAGE_HEADER: &str = "-----BEGIN PGP MESSAGE-----";

struct Stored {
    message: String,
    one_time: bool,
}

#[derive(Default)]
pub struct ServiceState {
    secrets: Mutex<HashMap<String, Stored>>,
    requests: AtomicUsize,
    last_store: Mutex<Option<Value>>,
    last_accept: Mutex<Option<String>>,
}

pub struct FakeYopass {
    pub base_url: String,
    state: Arc<ServiceState>,
}

impl FakeYopass {
    /// Start a service that behaves like Yopass: validates expiration,
    /// accepts only armored PGP messages, hands out UUIDs, 404s unknown ids and deletes one-time secrets on read.
    pub fn spawn() -> Self {
        let state = Arc::new(ServiceState::default());
        let router = Router::new()
            .route("/secret", post(create_secret))
            .route("/secret/:id", get(read_secret))
            .with_state(state.clone());
        Self {
            base_url: serve(router),
            state,
        }
    }

    /// Number of requests the service has seen.
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// JSON body of the most recent `POST /secret`.
    pub fn last_store(&self) -> Option<Value> {
        self.state.last_store.lock().unwrap().clone()
    }

    /// `Accept` header of the most recent `GET /secret/{id}`.
    pub fn last_accept(&self) -> Option<String> {
        self.state.last_accept.lock().unwrap().clone()
    }

    /// Envelope stored under `id`, without consuming it.
    pub fn envelope(&self, id: &str) -> Option<String> {
        self.state
            .secrets
            .lock()
            .unwrap()
            .get(id)
            .map(|stored| stored.message.clone())
    }
}

async fn create_secret(
    State(state): State<Arc<ServiceState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.requests.fetch_add(1, Ordering::SeqCst);
    *state.last_store.lock().unwrap() = Some(body.clone());

    let expiration = body["expiration"].as_u64().unwrap_or_default();
    if !EXPIRATIONS.contains(&expiration) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Invalid expiration specified"})),
        );
    }
    let Some(message) = body["message"].as_str() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Unable to parse json"})),
        );
    };
    if !message.starts_with(PGP_MESSAGE_HEADER) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Message must be PGP encrypted"})),
        );
    }

    let id = uuid::Uuid::new_v4().to_string();
    state.secrets.lock().unwrap().insert(
        id.clone(),
        Stored {
            message: message.to_string(),
            one_time: body["one_time"].as_bool().unwrap_or(true),
        },
    );
    (StatusCode::OK, Json(json!({ "message": id })))
}

async fn read_secret(
    State(state): State<Arc<ServiceState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.requests.fetch_add(1, Ordering::SeqCst);
    *state.last_accept.lock().unwrap() = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut secrets = state.secrets.lock().unwrap();
    let message = match secrets.get(&id).map(|stored| stored.one_time) {
        Some(true) => secrets.remove(&id).map(|stored| stored.message),
        Some(false) => secrets.get(&id).map(|stored| stored.message.clone()),
        None => None,
    };
    match message {
        Some(message) => (StatusCode::OK, Json(json!({ "message": message }))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Secret not found"})),
        ),
    }
}

/// Serve `router` on an ephemeral localhost port from a background thread,
/// returning its base URL.
pub fn serve(router: Router) -> String {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("failed to bind");
            tx.send(listener.local_addr().expect("no local address"))
                .expect("failed to report address");
            axum::serve(listener, router).await.expect("server failed");
        });
    });
    let addr = rx.recv().expect("server did not start");
    format!("http://{}", addr)
}

/// A base URL nothing listens on.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let addr = listener.local_addr().expect("no local address");
    drop(listener);
    format!("http://{}", addr)
}
