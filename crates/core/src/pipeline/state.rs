//! Per-query values handed from stage to stage. Each stage consumes the previous value, so a
//! query can only move forward and nothing is shared across invocations.

use serde::{Deserialize, Serialize};

use crate::domain::classification::QueryClassification;
use crate::domain::intent::Intent;
use crate::pipeline::payload::{DataResult, DecisionResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classified {
    pub query: String,
    pub classification: QueryClassification,
}

impl Classified {
    pub fn new(query: impl Into<String>, classification: QueryClassification) -> Self {
        Self { query: query.into(), classification }
    }

    pub fn intent(&self) -> Intent {
        self.classification.intent
    }

    pub fn gathered(self, data: DataResult) -> Gathered {
        Gathered { query: self.query, classification: self.classification, data }
    }

    /// Intents that need no data skip straight to the response.
    pub fn skip_to_respond(self) -> Decided {
        self.gathered(DataResult::Empty).skip_decision()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gathered {
    pub query: String,
    pub classification: QueryClassification,
    pub data: DataResult,
}

impl Gathered {
    pub fn intent(&self) -> Intent {
        self.classification.intent
    }

    pub fn decided(self, decision: DecisionResult) -> Decided {
        Decided {
            query: self.query,
            classification: self.classification,
            data: self.data,
            decision,
        }
    }

    pub fn skip_decision(self) -> Decided {
        self.decided(DecisionResult::Empty)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decided {
    pub query: String,
    pub classification: QueryClassification,
    pub data: DataResult,
    pub decision: DecisionResult,
}

impl Decided {
    pub fn intent(&self) -> Intent {
        self.classification.intent
    }

    pub fn respond(self, response: String) -> PipelineOutcome {
        PipelineOutcome {
            query: self.query,
            classification: self.classification,
            data: self.data,
            decision: self.decision,
            response,
        }
    }
}

/// Final value of one pipeline pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub query: String,
    pub classification: QueryClassification,
    pub data: DataResult,
    pub decision: DecisionResult,
    pub response: String,
}
