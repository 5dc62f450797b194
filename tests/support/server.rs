//! A stand-in for the remote REST endpoint family, served by axum over an
//! `InMemoryRepository`.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use managed_store::{ClientError, InMemoryRepository, Model, Repository};
use serde::Serialize;
use serde_json::{json, Value};

/// Routes `/{COLLECTION}` and `/{COLLECTION}/:id`, plus `/slow` (sleeps) and
/// `/broken` (200 with a non-JSON body).
pub fn router<M: Model>(repo: InMemoryRepository<M>) -> Router {
    Router::new()
        .route(
            &format!("/{}", M::COLLECTION),
            get(list_handler::<M>).post(create_handler::<M>),
        )
        .route(
            &format!("/{}/:id", M::COLLECTION),
            get(get_handler::<M>)
                .put(update_handler::<M>)
                .delete(delete_handler::<M>),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "data": [] }))
            }),
        )
        .route("/broken", get(|| async { "<html>oops</html>" }))
        .with_state(repo)
}

/// Bind to port 0 and return the base URL.
pub async fn start_server<M: Model>(repo: InMemoryRepository<M>) -> String {
    let app = router(repo);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn list_handler<M: Model>(State(repo): State<InMemoryRepository<M>>) -> Response {
    reply(repo.list().await, StatusCode::OK)
}

async fn get_handler<M: Model>(
    State(repo): State<InMemoryRepository<M>>,
    Path(id): Path<String>,
) -> Response {
    reply(repo.get_by_id(&id).await, StatusCode::OK)
}

async fn create_handler<M: Model>(
    State(repo): State<InMemoryRepository<M>>,
    Json(input): Json<Value>,
) -> Response {
    let model = match serde_json::from_value::<M>(input) {
        Ok(model) => model,
        Err(e) => return message(StatusCode::BAD_REQUEST, e.to_string()),
    };
    reply(repo.create(&model).await, StatusCode::CREATED)
}

async fn update_handler<M: Model>(
    State(repo): State<InMemoryRepository<M>>,
    Path(id): Path<String>,
    Json(changes): Json<Value>,
) -> Response {
    reply(repo.update(&id, &changes).await, StatusCode::OK)
}

async fn delete_handler<M: Model>(
    State(repo): State<InMemoryRepository<M>>,
    Path(id): Path<String>,
) -> Response {
    match repo.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => failure(err),
    }
}

fn reply<T: Serialize>(result: Result<T, ClientError>, ok: StatusCode) -> Response {
    match result {
        Ok(data) => (ok, Json(json!({ "data": data }))).into_response(),
        Err(err) => failure(err),
    }
}

fn failure(err: ClientError) -> Response {
    let status = err
        .status()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let text = match err {
        ClientError::Server { message, .. } => message,
        other => other.to_string(),
    };
    message(status, text)
}

fn message(status: StatusCode, text: String) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}
