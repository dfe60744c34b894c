//! API routes
//!
//! Refused operations (deleting the last conversation, empty renames, unknown
//! ids) are not errors: the handler answers with the unchanged listing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::actions::ActionDefinition;
use crate::conversation::{ConversationId, ConversationSummary, Message};
use crate::core::{
    AgentState, ProposalChoice, ProposalPreview, RelayError, RelayOutcome, ShoppingSession,
    StatePatch, View,
};
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ConversationList {
    pub active: ConversationId,
    pub conversations: Vec<ConversationSummary>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub view: View,
    /// Set when opening the report started an agent run to produce one
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub generating_report: bool,
}

#[derive(Debug, Serialize)]
pub struct ProposalResponse {
    pub products: Vec<ProposalPreview>,
    pub buffered: usize,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub resolved: bool,
    pub state: Option<AgentState>,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub url: String,
}

/// Error body returned to the UI
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        let status = match err {
            RelayError::EmptyMessage => StatusCode::BAD_REQUEST,
            RelayError::Transport(_) | RelayError::MaxRoundsExceeded => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn listing(session: &ShoppingSession) -> Json<ConversationList> {
    Json(ConversationList {
        active: session.active_id(),
        conversations: session.conversations(),
    })
}

fn current_state(session: &ShoppingSession) -> Json<Option<AgentState>> {
    Json(session.current_state().cloned())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ========== Conversations ==========

async fn list_conversations(State(state): State<AppState>) -> Json<ConversationList> {
    let session = state.relay.session().lock().await;
    listing(&session)
}

async fn create_conversation(
    State(state): State<AppState>,
) -> (StatusCode, Json<ConversationList>) {
    state.relay.new_conversation().await;
    let session = state.relay.session().lock().await;
    (StatusCode::CREATED, listing(&session))
}

async fn rename_conversation(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
    Json(request): Json<RenameRequest>,
) -> Json<ConversationList> {
    let mut session = state.relay.session().lock().await;
    session.rename_conversation(id, &request.name);
    listing(&session)
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
) -> Json<ConversationList> {
    state.relay.delete_conversation(id).await;
    let session = state.relay.session().lock().await;
    listing(&session)
}

async fn switch_conversation(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
) -> Json<ConversationList> {
    state.relay.switch_conversation(id).await;
    let session = state.relay.session().lock().await;
    listing(&session)
}

async fn messages(State(state): State<AppState>) -> Json<Vec<Message>> {
    let session = state.relay.session().lock().await;
    Json(session.current_messages().to_vec())
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<RelayOutcome>, ApiError> {
    let outcome = state.relay.send(&request.message).await?;
    Ok(Json(outcome))
}

// ========== Shared state ==========

async fn get_state(State(state): State<AppState>) -> Json<Option<AgentState>> {
    let session = state.relay.session().lock().await;
    current_state(&session)
}

async fn patch_state(
    State(state): State<AppState>,
    Json(patch): Json<StatePatch>,
) -> Json<Option<AgentState>> {
    let mut session = state.relay.session().lock().await;
    session.set_state(patch).await;
    current_state(&session)
}

async fn toggle_wishlist(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Json<Option<AgentState>> {
    let mut session = state.relay.session().lock().await;
    session.toggle_wishlist(&product_id).await;
    current_state(&session)
}

async fn clear_wishlist(State(state): State<AppState>) -> Json<Option<AgentState>> {
    let mut session = state.relay.session().lock().await;
    session.clear_wishlist().await;
    current_state(&session)
}

async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Json<Option<AgentState>> {
    let mut session = state.relay.session().lock().await;
    session.delete_product(&product_id).await;
    current_state(&session)
}

async fn product_link(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<LinkResponse>, ApiError> {
    let session = state.relay.session().lock().await;
    session
        .product_link(&product_id)
        .map(|url| Json(LinkResponse { url }))
        .ok_or_else(|| ApiError::not_found(format!("No link for product {}", product_id)))
}

// ========== Views ==========

fn view(session: &ShoppingSession) -> Json<ViewResponse> {
    Json(ViewResponse {
        view: session.view(),
        generating_report: false,
    })
}

async fn get_view(State(state): State<AppState>) -> Json<ViewResponse> {
    view(&*state.relay.session().lock().await)
}

async fn view_products(State(state): State<AppState>) -> Json<ViewResponse> {
    let mut session = state.relay.session().lock().await;
    session.exit_to_products();
    view(&session)
}

async fn view_wishlist(State(state): State<AppState>) -> Json<ViewResponse> {
    let mut session = state.relay.session().lock().await;
    session.go_to_wishlist();
    view(&session)
}

async fn view_report(State(state): State<AppState>) -> Json<ViewResponse> {
    let (view, missing) = {
        let mut session = state.relay.session().lock().await;
        let missing = session.go_to_report();
        (session.view(), missing)
    };

    if missing {
        let relay = state.relay.clone();
        tokio::spawn(async move {
            if let Err(e) = relay.run().await {
                tracing::warn!("Report generation failed: {}", e);
            }
            relay.session().lock().await.finish_report();
        });
    }

    Json(ViewResponse {
        view,
        generating_report: missing,
    })
}

// ========== Proposals ==========

async fn get_proposal(State(state): State<AppState>) -> Json<Option<ProposalResponse>> {
    let session = state.relay.session().lock().await;
    Json(session.pending_proposal().map(|proposal| ProposalResponse {
        products: proposal.preview(),
        buffered: proposal.buffer.len(),
    }))
}

async fn resolve(state: AppState, choice: ProposalChoice) -> Json<ResolveResponse> {
    let mut session = state.relay.session().lock().await;
    let resolved = session.resolve_proposal(choice).await;
    Json(ResolveResponse {
        resolved,
        state: session.current_state().cloned(),
    })
}

async fn accept_proposal(State(state): State<AppState>) -> Json<ResolveResponse> {
    resolve(state, ProposalChoice::Accept).await
}

async fn reject_proposal(State(state): State<AppState>) -> Json<ResolveResponse> {
    resolve(state, ProposalChoice::Reject).await
}

async fn more_proposal(State(state): State<AppState>) -> Json<ResolveResponse> {
    resolve(state, ProposalChoice::RequestMore).await
}

// ========== Session ==========

async fn persist(State(state): State<AppState>) -> StatusCode {
    state.relay.session().lock().await.persist_history().await;
    StatusCode::NO_CONTENT
}

async fn suggestions(State(state): State<AppState>) -> Json<Vec<String>> {
    let view = state.relay.session().lock().await.view();
    Json(state.config.assistant.suggestions.for_view(view).to_vec())
}

async fn actions(State(state): State<AppState>) -> Json<Vec<ActionDefinition>> {
    Json(state.relay.actions().definitions())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/v1/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/v1/conversations/:id",
            patch(rename_conversation).delete(delete_conversation),
        )
        .route("/v1/conversations/:id/switch", post(switch_conversation))
        .route("/v1/messages", get(messages))
        .route("/v1/chat", post(chat))
        .route("/v1/state", get(get_state).patch(patch_state))
        .route("/v1/wishlist", delete(clear_wishlist))
        .route("/v1/wishlist/:product_id/toggle", post(toggle_wishlist))
        .route("/v1/products/:product_id", delete(delete_product))
        .route("/v1/products/:product_id/link", get(product_link))
        .route("/v1/view", get(get_view))
        .route("/v1/view/products", post(view_products))
        .route("/v1/view/wishlist", post(view_wishlist))
        .route("/v1/view/report", post(view_report))
        .route("/v1/proposal", get(get_proposal))
        .route("/v1/proposal/accept", post(accept_proposal))
        .route("/v1/proposal/reject", post(reject_proposal))
        .route("/v1/proposal/more", post(more_proposal))
        .route("/v1/session/persist", post(persist))
        .route("/v1/suggestions", get(suggestions))
        .route("/v1/actions", get(actions))
}
