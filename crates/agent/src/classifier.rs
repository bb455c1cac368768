use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use inventra_core::domain::classification::QueryClassification;
use inventra_core::domain::intent::Intent;
use inventra_core::domain::region::Region;

use crate::llm::LlmClient;

/// Classification prompt for `query`. The query is embedded verbatim.
pub fn build_classification_prompt(query: &str) -> String {
    let intents = Intent::ALL
        .iter()
        .map(|intent| format!("- {}: {}", intent.as_str(), intent.description()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze this query and classify the intent:\n\n\
         Query: \"{query}\"\n\n\
         Intents:\n{intents}\n\n\
         Extract: region (north/south/east/west/central), category, sku (if mentioned, else \"none\")\n\n\
         Format:\n\
         intent: <name>\n\
         region: <value_or_none>\n\
         category: <value_or_none>\n\
         sku: <value_or_none>"
    )
}

fn optional_value(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && !value.eq_ignore_ascii_case("none")).then_some(value)
}

/// Reads `key: value` lines out of a model reply. Never fails: anything unrecognised leaves the
/// field at its default, and an unknown region is treated as absent.
pub fn parse_classification_reply(reply: &str) -> QueryClassification {
    let mut classification = QueryClassification::default();

    for line in reply.lines().map(str::trim) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "intent" => classification.intent = Intent::parse_lenient(value),
            "region" => {
                classification.region =
                    optional_value(value).and_then(|value| value.parse::<Region>().ok());
            }
            "category" => classification.category = optional_value(value).map(str::to_string),
            "sku" => classification.sku = optional_value(value).map(str::to_string),
            _ => {}
        }
    }

    classification
}

pub struct QueryClassifier {
    llm: Arc<dyn LlmClient>,
}

impl QueryClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, query: &str) -> Result<QueryClassification> {
        let reply = self.llm.complete(&build_classification_prompt(query)).await?;
        let classification = parse_classification_reply(&reply);

        info!(
            event_name = "pipeline.classify.resolved",
            intent = classification.intent.as_str(),
            region = classification.region.map(|region| region.as_str()),
            category = classification.category.as_deref(),
            sku = classification.sku.as_deref(),
            "query classified"
        );
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use inventra_core::domain::classification::QueryClassification;
    use inventra_core::domain::intent::Intent;
    use inventra_core::domain::region::Region;

    use super::{build_classification_prompt, parse_classification_reply, QueryClassifier};
    use crate::testing::ScriptedLlm;

    #[test]
    fn prompt_lists_every_intent_and_embeds_the_query() {
        let prompt = build_classification_prompt("What's low on stock in north?");

        assert!(prompt.contains("Query: \"What's low on stock in north?\""));
        for intent in Intent::ALL {
            assert!(prompt.contains(&format!("- {}: {}", intent.as_str(), intent.description())));
        }
        assert!(prompt.ends_with("sku: <value_or_none>"));
    }

    #[test]
    fn reply_fields_are_read_and_none_means_absent() {
        let parsed = parse_classification_reply("intent: sales_analysis\nregion: none\nsku: ABC123\n");
        assert_eq!(parsed, QueryClassification::new(Intent::SalesAnalysis).with_sku("ABC123"));
    }

    #[test]
    fn empty_or_noisy_replies_fall_back_to_defaults() {
        assert_eq!(parse_classification_reply(""), QueryClassification::default());

        let parsed = parse_classification_reply(
            "Sure! Here you go\n  Intent :  INVENTORY_STATUS \nconfidence: high\nregion: North\n\
             category: Beverages\nregion-note: ignore me",
        );
        assert_eq!(
            parsed,
            QueryClassification::new(Intent::InventoryStatus)
                .with_region(Region::North)
                .with_category("Beverages")
        );
    }

    #[test]
    fn unrecognised_values_never_error() {
        let parsed = parse_classification_reply("intent: weather_report\nregion: atlantis\nsku: NONE");
        assert_eq!(parsed, QueryClassification::default());
    }

    #[tokio::test]
    async fn classifier_sends_the_prompt_and_parses_the_reply() {
        let llm = Arc::new(ScriptedLlm::new(["intent: ticket_status\nregion: none"]));
        let classifier = QueryClassifier::new(llm.clone());

        let classification = classifier.classify("show me pending tickets").await.expect("classify");

        assert_eq!(classification.intent, Intent::TicketStatus);
        assert!(llm.prompts().await[0].contains("show me pending tickets"));
    }

    #[tokio::test]
    async fn model_failures_propagate() {
        let classifier = QueryClassifier::new(Arc::new(ScriptedLlm::failing("model offline")));
        let error = classifier.classify("hello").await.expect_err("should fail");
        assert!(error.to_string().contains("model offline"));
    }
}
