use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flock {
    pub id: Uuid,
    pub name: String,
    pub songs: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateFlock {
    pub name: String,
    #[serde(default)]
    pub songs: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateFlock {
    pub name: Option<String>,
    pub songs: Option<Vec<String>>,
}

/// Error body returned with every non-2xx response this server produces.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// What `/echo` saw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Flock>>>;

type ApiError = (StatusCode, Json<ErrorBody>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn not_found() -> ApiError {
    error(StatusCode::NOT_FOUND, "flock not found")
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/flocks", get(list_flocks).post(create_flock))
        .route("/flocks/{id}", get(get_flock).put(update_flock).delete(delete_flock))
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/delay/{ms}", get(delay))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn list_flocks(State(db): State<Db>) -> Json<Vec<Flock>> {
    let flocks = db.read().await;
    let mut flocks: Vec<Flock> = flocks.values().cloned().collect();
    flocks.sort_by(|a, b| a.name.cmp(&b.name));
    Json(flocks)
}

async fn create_flock(
    State(db): State<Db>,
    Json(input): Json<CreateFlock>,
) -> Result<(StatusCode, Json<Flock>), ApiError> {
    if input.name.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "name must not be empty"));
    }
    let flock = Flock {
        id: Uuid::new_v4(),
        name: input.name,
        songs: input.songs,
    };
    tracing::debug!(id = %flock.id, name = %flock.name, "flock created");
    db.write().await.insert(flock.id, flock.clone());
    Ok((StatusCode::CREATED, Json(flock)))
}

async fn get_flock(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Flock>, ApiError> {
    let flocks = db.read().await;
    flocks.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn update_flock(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateFlock>,
) -> Result<Json<Flock>, ApiError> {
    let mut flocks = db.write().await;
    let flock = flocks.get_mut(&id).ok_or_else(not_found)?;
    if let Some(name) = input.name {
        flock.name = name;
    }
    if let Some(songs) = input.songs {
        flock.songs = songs;
    }
    Ok(Json(flock.clone()))
}

async fn delete_flock(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    let mut flocks = db.write().await;
    flocks
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}

/// Reflects the request back as JSON. Header order is preserved.
async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(Echo {
        method: method.as_str().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Responds with the requested status and an `ErrorBody` naming it.
async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<ErrorBody>), ApiError> {
    let status = StatusCode::from_u16(code)
        .map_err(|_| error(StatusCode::BAD_REQUEST, format!("invalid status code {code}")))?;
    Ok(error(status, format!("status {code}")))
}

/// Waits `ms` milliseconds, then responds `200 OK` with body `done`.
async fn delay(Path(ms): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    "done"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flock_serializes_to_json() {
        let flock = Flock {
            id: Uuid::nil(),
            name: "Starlings".to_string(),
            songs: vec!["murmur".to_string()],
        };
        let json = serde_json::to_value(&flock).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "Starlings");
        assert_eq!(json["songs"][0], "murmur");
    }

    #[test]
    fn create_flock_defaults_songs_to_empty() {
        let input: CreateFlock = serde_json::from_str(r#"{"name":"Rooks"}"#).unwrap();
        assert_eq!(input.name, "Rooks");
        assert!(input.songs.is_empty());
    }

    #[test]
    fn create_flock_rejects_missing_name() {
        let result: Result<CreateFlock, _> = serde_json::from_str(r#"{"songs":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_flock_all_fields_optional() {
        let input: UpdateFlock = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.name.is_none());
        assert!(input.songs.is_none());
    }
}
