//! `POST /query`: one question through the pipeline, answered as JSON.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use inventra_agent::PipelineController;
use inventra_core::domain::conversation::SessionId;
use inventra_core::errors::{ApplicationError, InterfaceError};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct QueryState {
    controller: Arc<PipelineController>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QueryResponse {
    pub response: String,
    pub intent: String,
    pub region: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QueryError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(controller: Arc<PipelineController>) -> Router {
    Router::new().route("/query", post(answer)).with_state(QueryState { controller })
}

fn reject(error: InterfaceError) -> (StatusCode, Json<QueryError>) {
    let status = match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = QueryError {
        error: error.user_message().to_string(),
        correlation_id: error.correlation_id().to_string(),
    };
    (status, Json(body))
}

pub async fn answer(
    State(state): State<QueryState>,
    Json(body): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<QueryError>)> {
    let correlation_id = Uuid::new_v4().to_string();
    let query = body.query.trim();
    if query.is_empty() {
        return Err(reject(InterfaceError::BadRequest {
            message: "query must not be empty".to_string(),
            correlation_id,
        }));
    }

    let session = body.session_id.filter(|id| !id.trim().is_empty()).map(SessionId);
    let outcome = state.controller.run_in_session(query, session.as_ref()).await.map_err(|failure| {
        let failure = ApplicationError::from(failure);
        error!(
            event_name = "http.query.failed",
            correlation_id = %correlation_id,
            error = %failure,
            "query failed"
        );
        reject(failure.into_interface(correlation_id.clone()))
    })?;

    let classification = outcome.classification;
    info!(
        event_name = "http.query.answered",
        correlation_id = %correlation_id,
        intent = classification.intent.as_str(),
        "query answered"
    );

    Ok(Json(QueryResponse {
        response: outcome.response,
        intent: classification.intent.as_str().to_string(),
        region: classification.region.map(|region| region.as_str().to_string()),
        category: classification.category,
        sku: classification.sku,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use inventra_agent::llm::ChatReply;
    use inventra_agent::testing::{ScriptedChatModel, ScriptedLlm};
    use inventra_agent::{PipelineController, WeatherService};
    use inventra_core::config::AppConfig;
    use inventra_core::domain::conversation::SessionId;
    use inventra_core::domain::inventory::InventoryItem;
    use inventra_db::repositories::{ConversationRepository, InMemoryInventoryRepository};
    use inventra_db::Repositories;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::query::router;

    fn item(sku: &str, region: &str, qty: i64) -> InventoryItem {
        InventoryItem {
            sku: sku.to_string(),
            name: format!("Item {sku}"),
            category: "Beverages".to_string(),
            region: region.to_string(),
            qty,
            reorder_threshold: 10,
            vendor_id: None,
            unit_price: Decimal::from(40),
        }
    }

    fn app(repositories: &Repositories, llm: ScriptedLlm) -> Router {
        let controller = PipelineController::assemble(
            &AppConfig::default(),
            repositories,
            Arc::new(llm),
            Arc::new(ScriptedChatModel::always(ChatReply::text("unused"))),
            Arc::new(WeatherService::offline()),
        );
        router(Arc::new(controller))
    }

    async fn post(app: Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let response = app.oneshot(request).await.expect("route responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn inventory_question_returns_formatted_status() {
        let mut repositories = Repositories::in_memory();
        repositories.inventory = Arc::new(InMemoryInventoryRepository::with_items([
            item("BEV-N01", "North", 4),
            item("BEV-S01", "South", 2),
        ]));
        let llm = ScriptedLlm::new(["intent: inventory_status\nregion: north\ncategory: none\nsku: none"]);

        let (status, body) = post(
            app(&repositories, llm),
            json!({"query": "What's low on stock in north?", "session_id": "web-1"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent"], "inventory_status");
        assert_eq!(body["region"], "north");
        assert_eq!(body["category"], Value::Null);
        let response = body["response"].as_str().unwrap_or_default();
        assert!(response.starts_with("INVENTORY STATUS in North region"), "{response}");

        let history = repositories
            .conversations
            .session_history(&SessionId("web-1".to_string()), 10)
            .await
            .expect("history");
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn blank_query_is_a_bad_request() {
        let (status, body) =
            post(app(&Repositories::in_memory(), ScriptedLlm::new(Vec::<String>::new())), json!({"query": "   "}))
                .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn model_failure_is_reported_without_internals() {
        let (status, body) = post(
            app(&Repositories::in_memory(), ScriptedLlm::failing("connection refused at 10.0.0.7")),
            json!({"query": "How are sales?"}),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "The assistant is temporarily unavailable. Please retry shortly.");
        assert!(!body.to_string().contains("10.0.0.7"));
    }
}
