use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error};

use inventra_core::config::AppConfig;
use inventra_core::domain::conversation::{ConversationMetadata, NewConversation, SessionId};
use inventra_core::domain::intent::Intent;
use inventra_core::pipeline::{
    format_response, route_after_classify, route_after_gather, transition, Classified,
    ClassifyRoute, GatherRoute, PipelineOutcome, PipelineStage,
};
use inventra_db::repositories::{ConversationRepository, Repositories};

use crate::classifier::QueryClassifier;
use crate::decision::DecisionMaker;
use crate::error::PipelineError;
use crate::executor::AnalysisExecutor;
use crate::gatherer::DataGatherer;
use crate::llm::{ChatModel, LlmClient, OpenAiClient};
use crate::weather::WeatherService;

/// Runs classify → gather → decide → respond for one query at a time. Holds no per-query state,
/// so one instance is shared across concurrent requests.
pub struct PipelineController {
    classifier: QueryClassifier,
    gatherer: DataGatherer,
    decision_maker: DecisionMaker,
    conversations: Option<Arc<dyn ConversationRepository>>,
}

impl PipelineController {
    pub fn new(classifier: QueryClassifier, gatherer: DataGatherer, decision_maker: DecisionMaker) -> Self {
        Self { classifier, gatherer, decision_maker, conversations: None }
    }

    /// Wires the pipeline from explicit model handles. Every exchange is appended to the
    /// conversation store; queries without a session are recorded under a fresh one.
    pub fn assemble(
        config: &AppConfig,
        repositories: &Repositories,
        llm: Arc<dyn LlmClient>,
        chat: Arc<dyn ChatModel>,
        weather: Arc<WeatherService>,
    ) -> Self {
        let executor = AnalysisExecutor::new(chat, config.pipeline.max_iterations);
        Self::new(
            QueryClassifier::new(llm),
            DataGatherer::new(repositories),
            DecisionMaker::new(repositories, executor, weather, config.pipeline.forecast_days),
        )
        .with_conversation_log(repositories.conversations.clone())
    }

    pub fn from_config(config: &AppConfig, repositories: &Repositories) -> Result<Self> {
        let client = Arc::new(OpenAiClient::from_config(&config.llm)?);
        let weather = Arc::new(WeatherService::from_config(&config.weather)?);
        Ok(Self::assemble(config, repositories, client.clone(), client, weather))
    }

    pub fn with_conversation_log(mut self, conversations: Arc<dyn ConversationRepository>) -> Self {
        self.conversations = Some(conversations);
        self
    }

    pub fn decision_maker(&self) -> &DecisionMaker {
        &self.decision_maker
    }

    pub async fn run(&self, query: &str) -> Result<PipelineOutcome, PipelineError> {
        self.run_in_session(query, None).await
    }

    pub async fn run_in_session(
        &self,
        query: &str,
        session_id: Option<&SessionId>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let classification =
            self.classifier.classify(query).await.map_err(PipelineError::Classification)?;
        let classified = Classified::new(query, classification);
        let intent = classified.intent();

        let decided = match route_after_classify(intent) {
            ClassifyRoute::Respond => {
                advance(PipelineStage::Classify, PipelineStage::Respond, intent)?;
                classified.skip_to_respond()
            }
            ClassifyRoute::Gather => {
                advance(PipelineStage::Classify, PipelineStage::Gather, intent)?;
                let request = &classified.classification;
                let data = self.gatherer.gather(intent, request.region, request.sku.as_deref()).await?;
                let gathered = classified.gathered(data);

                match route_after_gather(intent) {
                    GatherRoute::Respond => {
                        advance(PipelineStage::Gather, PipelineStage::Respond, intent)?;
                        gathered.skip_decision()
                    }
                    GatherRoute::Decide => {
                        advance(PipelineStage::Gather, PipelineStage::Decide, intent)?;
                        let request = &gathered.classification;
                        let decision = self
                            .decision_maker
                            .decide(
                                intent,
                                request.region,
                                request.category.as_deref(),
                                request.sku.as_deref(),
                            )
                            .await?;
                        advance(PipelineStage::Decide, PipelineStage::Respond, intent)?;
                        gathered.decided(decision)
                    }
                }
            }
        };

        let response = format_response(
            intent,
            &decided.data,
            &decided.decision,
            decided.classification.region,
        );
        advance(PipelineStage::Respond, PipelineStage::Done, intent)?;
        let outcome = decided.respond(response);

        let session_id = session_id.cloned().unwrap_or_else(SessionId::generate);
        self.log_exchange(&session_id, &outcome).await;
        Ok(outcome)
    }

    async fn log_exchange(&self, session_id: &SessionId, outcome: &PipelineOutcome) {
        let Some(conversations) = &self.conversations else {
            return;
        };
        let classification = &outcome.classification;
        let exchange = NewConversation {
            session_id: session_id.clone(),
            user_message: outcome.query.clone(),
            assistant_message: outcome.response.clone(),
            intent: Some(classification.intent.as_str().to_string()),
            metadata: ConversationMetadata {
                region: classification.region.map(|region| region.as_str().to_string()),
                category: classification.category.clone(),
                sku: classification.sku.clone(),
            },
        };

        if let Err(err) = conversations.append(exchange).await {
            error!(
                event_name = "conversation.append_failed",
                session_id = session_id.as_str(),
                error = %err,
                "failed to record conversation; query result unaffected"
            );
        }
    }
}

fn advance(from: PipelineStage, to: PipelineStage, intent: Intent) -> Result<(), PipelineError> {
    let step = transition(from, to, intent)?;
    debug!(
        event_name = "pipeline.stage.transition",
        intent = intent.as_str(),
        from = step.from.as_str(),
        to = step.to.as_str(),
        "pipeline stage transition"
    );
    Ok(())
}
