//! In-process fake of the IPM API
//!
//! A small stateful axum app that honours the same contract as the real
//! server: bearer-token login, user CRUD with hard deletes and a numeric
//! prediction endpoint. Knobs on [`FakeApiOptions`] make it misbehave in
//! the ways the harness is meant to catch.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub const FAKE_TOKEN: &str = "fake-access-token";

#[derive(Debug, Clone, Default)]
pub struct FakeApiOptions {
    /// DELETE answers 204 but the record stays retrievable and listed
    pub soft_delete: bool,
    /// Hand out string ids (`"usr-1"`) instead of integers
    pub string_ids: bool,
    /// Fixed `/predict` body instead of the computed one
    pub prediction_body: Option<Value>,
}

#[derive(Debug, Default)]
struct FakeStore {
    users: BTreeMap<u64, Value>,
    next_id: u64,
    requests: Vec<String>,
}

#[derive(Clone)]
struct FakeState {
    options: FakeApiOptions,
    store: Arc<Mutex<FakeStore>>,
}

impl FakeState {
    fn store(&self) -> std::sync::MutexGuard<'_, FakeStore> {
        self.store
            .lock()
            .expect("fake store lock poisoned")
    }

    fn id_value(&self, id: u64) -> Value {
        if self.options.string_ids {
            json!(format!("usr-{}", id))
        } else {
            json!(id)
        }
    }

    fn parse_id(&self, raw: &str) -> Option<u64> {
        let raw = if self.options.string_ids {
            raw.strip_prefix("usr-")?
        } else {
            raw
        };
        raw.parse().ok()
    }
}

/// Handle to a running fake
pub struct FakeApi {
    pub base_url: String,
    state: FakeState,
}

impl FakeApi {
    pub async fn spawn() -> Self {
        Self::spawn_with(FakeApiOptions::default()).await
    }

    pub async fn spawn_with(options: FakeApiOptions) -> Self {
        let state = FakeState {
            options,
            store: Arc::new(Mutex::new(FakeStore {
                next_id: 1,
                ..Default::default()
            })),
        };

        let app = Router::new()
            .route("/login", post(login))
            .route("/users", post(create_user).get(list_users))
            .route(
                "/users/{id}",
                get(get_user).put(update_user).delete(delete_user),
            )
            .route("/predict", post(predict))
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API listener");
        let addr = listener.local_addr().expect("Fake API has no local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Every request seen so far, as `"METHOD /path"`
    pub fn requests(&self) -> Vec<String> {
        self.state.store().requests.clone()
    }

    /// Records still retrievable
    pub fn user_count(&self) -> usize {
        self.state.store().users.len()
    }

    /// Stored record for an id as the client sees it
    pub fn user(&self, id: &Value) -> Option<Value> {
        let raw = match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let key = self.state.parse_id(&raw)?;
        self.state.store().users.get(&key).cloned()
    }
}

async fn record_request(State(state): State<FakeState>, request: Request, next: Next) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    state.store().requests.push(line);
    next.run(request).await
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"msg": "Missing or invalid Authorization header"})),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", FAKE_TOKEN))
        .unwrap_or(false)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"erro": "Usuário não encontrado"}))).into_response()
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

async fn login(Json(credentials): Json<Credentials>) -> Response {
    if credentials.username == "admin" && credentials.password == "admin" {
        (StatusCode::OK, Json(json!({"access_token": FAKE_TOKEN}))).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"msg": "Credenciais inválidas"}))).into_response()
    }
}

#[derive(Deserialize)]
struct UserPayload {
    nome: String,
    email: String,
}

async fn create_user(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(payload): Json<UserPayload>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut store = state.store();
    let id = store.next_id;
    store.next_id += 1;

    let user = json!({
        "id": state.id_value(id),
        "nome": payload.nome,
        "email": payload.email,
    });
    store.users.insert(id, user.clone());

    (StatusCode::CREATED, Json(user)).into_response()
}

async fn list_users(State(state): State<FakeState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let store = state.store();
    let users: Vec<Value> = store.users.values().cloned().collect();

    (StatusCode::OK, Json(Value::Array(users))).into_response()
}

async fn get_user(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let store = state.store();
    let Some(id) = state.parse_id(&raw_id) else {
        return not_found();
    };
    match store.users.get(&id) {
        Some(user) => (StatusCode::OK, Json(user.clone())).into_response(),
        None => not_found(),
    }
}

async fn update_user(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Json(payload): Json<UserPayload>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut store = state.store();
    let Some(id) = state.parse_id(&raw_id) else {
        return not_found();
    };
    let Some(user) = store.users.get_mut(&id) else {
        return not_found();
    };
    user["nome"] = json!(payload.nome);
    user["email"] = json!(payload.email);

    (StatusCode::OK, Json(user.clone())).into_response()
}

async fn delete_user(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut store = state.store();
    let Some(id) = state
        .parse_id(&raw_id)
        .filter(|id| store.users.contains_key(id))
    else {
        return not_found();
    };

    if state.options.soft_delete {
        if let Some(user) = store.users.get_mut(&id) {
            user["ativo"] = json!(false);
        }
    } else {
        store.users.remove(&id);
    }

    StatusCode::NO_CONTENT.into_response()
}

#[derive(Deserialize)]
struct PredictPayload {
    entrada: Vec<f64>,
}

async fn predict(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(payload): Json<PredictPayload>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    if let Some(body) = &state.options.prediction_body {
        return (StatusCode::OK, Json(body.clone())).into_response();
    }

    // Stand-in linear model
    let predicao: Vec<f64> = payload.entrada.iter().map(|x| 2.5 * x + 1.0).collect();
    (StatusCode::OK, Json(json!({"predicao": predicao}))).into_response()
}
