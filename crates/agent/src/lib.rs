//! Language-model side of Inventra: query classification, the data gatherer, the bounded
//! analysis executor with its weather tool, and the controller that runs a query through
//! classify → gather → decide → respond.
//!
//! The model only classifies queries and writes analysis prose. Which data is read, which
//! stages run, and how numbers are rendered are all decided here and in `inventra-core`.

pub mod classifier;
pub mod decision;
pub mod error;
pub mod executor;
pub mod gatherer;
pub mod llm;
pub mod runtime;
pub mod testing;
pub mod tickets;
pub mod tools;
pub mod weather;

pub use classifier::QueryClassifier;
pub use decision::{
    DecisionMaker, DecisionPlan, FinancialHealthAnalysis, RegionalAnalysis, RegionalAnalysisKind,
};
pub use error::PipelineError;
pub use executor::AnalysisExecutor;
pub use gatherer::{DataGatherer, GatherPlan};
pub use llm::{ChatModel, LlmClient, OpenAiClient};
pub use runtime::PipelineController;
pub use tickets::TicketService;
pub use weather::{WeatherForecastTool, WeatherService};
