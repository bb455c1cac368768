pub mod formatter;
pub mod payload;
pub mod router;
pub mod state;
pub mod states;

pub use formatter::{format_currency, format_response};
pub use payload::{
    DataResult, DecisionResult, OpportunityDecision, ReorderDecision, Report, VendorDecision,
};
pub use router::{
    next_stage, route_after_classify, route_after_gather, stage_path, transition,
    PipelineTransitionError,
};
pub use state::{Classified, Decided, Gathered, PipelineOutcome};
pub use states::{ClassifyRoute, GatherRoute, PipelineStage, StageTransition};
