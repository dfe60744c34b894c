//! HTTP transport to the shopping agent endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

use crate::conversation::Message;

use super::{AgentReply, AgentRequest, AgentTransport, ReplyEnvelope, TransportError};

pub struct HttpTransport {
    client: Client,
    url: String,
    /// Thread the agent assigned to the current chat; cleared on reset
    thread_id: Mutex<Option<String>>,
}

#[derive(Debug, Serialize)]
struct RunBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_id: Option<String>,
    #[serde(flatten)]
    request: &'a AgentRequest,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            thread_id: Mutex::new(None),
        })
    }

    fn thread_id(&self) -> Option<String> {
        self.thread_id.lock().ok().and_then(|t| t.clone())
    }

    fn remember_thread(&self, thread_id: Option<String>) {
        if let (Some(id), Ok(mut current)) = (thread_id, self.thread_id.lock()) {
            *current = Some(id);
        }
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn run(&self, request: AgentRequest) -> Result<AgentReply, TransportError> {
        let body = RunBody {
            thread_id: self.thread_id(),
            request: &request,
        };

        let response = self.client.post(&self.url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::InvalidResponse(format!("{}: {}", status, body)));
        }

        let envelope: ReplyEnvelope = response.json().await?;
        self.remember_thread(envelope.thread_id);

        let messages = Message::decode_all(envelope.messages)?;
        tracing::debug!("Agent {} replied with {} message(s)", request.agent, messages.len());

        Ok(AgentReply { messages })
    }

    fn reset(&self) {
        if let Ok(mut thread_id) = self.thread_id.lock() {
            *thread_id = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AgentState;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::Arc;

    type Seen = Arc<Mutex<Vec<Value>>>;

    async fn spawn_agent(reply: Value, seen: Seen) -> String {
        let app = Router::new().route(
            "/copilotkit",
            post(move |Json(body): Json<Value>| {
                let reply = reply.clone();
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(body);
                    Json(reply)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/copilotkit", addr)
    }

    fn request() -> AgentRequest {
        AgentRequest {
            agent: "shopping_agent".into(),
            messages: vec![Message::user("Budget 4K monitors under $400")],
            state: AgentState::default(),
            actions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_run_decodes_messages_and_tracks_thread() {
        let seen: Seen = Arc::default();
        let url = spawn_agent(
            json!({
                "thread_id": "t-1",
                "messages": [{
                    "type": "TextMessage",
                    "id": "a1",
                    "role": "assistant",
                    "content": "Looking for monitors",
                    "created_at": "2024-05-01T10:00:00Z"
                }]
            }),
            seen.clone(),
        )
        .await;
        let transport = HttpTransport::new(url, Duration::from_secs(5)).unwrap();

        let reply = transport.run(request()).await.unwrap();
        assert_eq!(reply.messages.len(), 1);
        assert_eq!(reply.messages[0].id(), "a1");

        transport.run(request()).await.unwrap();
        transport.reset();
        transport.run(request()).await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen[0].get("thread_id").is_none());
        assert_eq!(seen[0]["agent"], "shopping_agent");
        assert_eq!(seen[0]["messages"][0]["type"], "TextMessage");
        assert_eq!(seen[1]["thread_id"], "t-1");
        assert!(seen[2].get("thread_id").is_none());
    }

    #[tokio::test]
    async fn test_unknown_message_from_agent_is_an_error() {
        let url = spawn_agent(
            json!({ "messages": [{ "type": "VideoMessage", "id": "v" }] }),
            Arc::default(),
        )
        .await;
        let transport = HttpTransport::new(url, Duration::from_secs(5)).unwrap();

        let err = transport.run(request()).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }
}
