use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mall_client::{ChatClient, ChatConfig, ChatError, Connectivity};
use serde_json::{Value, json};

#[derive(Default)]
struct Assistant {
    transcripts: Mutex<HashMap<String, Vec<Value>>>,
}

type Shared = Arc<Assistant>;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn send(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let message = body["message"].as_str().unwrap_or_default().to_string();
    if message == "boom" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response();
    }

    // Sessions the service has never seen are replaced with a server-issued id.
    let requested = body["session_id"].as_str().unwrap_or_default().to_string();
    let mut transcripts = state.transcripts.lock().unwrap();
    let session_id = if transcripts.contains_key(&requested) {
        requested
    } else {
        format!("srv-{}", transcripts.len() + 1)
    };

    let answer = format!("You said: {message}");
    let transcript = transcripts.entry(session_id.clone()).or_default();
    transcript.push(json!({ "role": "user", "content": message }));
    transcript.push(json!({ "role": "assistant", "content": answer, "timestamp": "2026-03-01T10:00:00Z" }));

    Json(json!({ "response": answer, "session_id": session_id })).into_response()
}

async fn history(State(state): State<Shared>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let session = params.get("session_id").cloned().unwrap_or_default();
    let messages = state.transcripts.lock().unwrap().get(&session).cloned().unwrap_or_default();
    Json(json!({ "messages": messages }))
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let app = Router::new()
            .route("/health", get(health))
            .route("/chat/send", post(send))
            .route("/chat/history", get(history))
            .with_state(Shared::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn conversation_round_trip() {
    let server = TestServer::spawn().await;
    let chat = ChatClient::new(ChatConfig::new(&server.base_url)).unwrap();
    let mut updates = chat.subscribe();

    assert_eq!(chat.check_health().await, Connectivity::Online);
    assert!(updates.has_changed().unwrap());
    assert_eq!(*updates.borrow_and_update(), Connectivity::Online);

    let first = chat.send("  ¿A qué hora abre el cine?  ").await.unwrap();
    assert_eq!(first.response, "You said: ¿A qué hora abre el cine?");
    assert_eq!(first.session_id, "srv-1");
    assert_eq!(chat.session_id(), "srv-1");

    chat.send("gracias").await.unwrap();
    let history = chat.history().await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, "user");
    assert_eq!(history[3].content, "You said: gracias");
    assert!(history[3].timestamp.is_some());

    assert_eq!(chat.send("   ").await.unwrap_err(), ChatError::EmptyMessage);
}

#[tokio::test]
async fn service_errors_keep_the_client_online() {
    let server = TestServer::spawn().await;
    let chat = ChatClient::new(ChatConfig::new(&server.base_url)).unwrap();
    chat.check_health().await;

    let err = chat.send("boom").await.unwrap_err();
    assert_eq!(
        err,
        ChatError::Api {
            status: 500,
            message: "model crashed".to_string()
        }
    );
    assert_eq!(chat.connectivity(), Connectivity::Online);
}

#[tokio::test]
async fn losing_the_service_goes_offline() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Answers one health probe, then the port is closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let once = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await.unwrap();
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
    });

    let chat = ChatClient::new(ChatConfig::new(format!("http://{addr}"))).unwrap();
    assert_eq!(chat.check_health().await, Connectivity::Online);
    once.await.unwrap();

    let err = chat.send("hola").await.unwrap_err();
    assert!(matches!(err, ChatError::Network(_)));
    assert_eq!(chat.connectivity(), Connectivity::Offline);
    assert_eq!(
        chat.send("hola").await.unwrap_err(),
        ChatError::Unavailable(Connectivity::Offline)
    );
    assert_eq!(chat.check_health().await, Connectivity::Offline);
}
