use serde::{Deserialize, Serialize};

use crate::domain::intent::Intent;
use crate::domain::region::Region;

/// Structured reading of one user query. Produced once by the classifier and never mutated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryClassification {
    pub intent: Intent,
    pub region: Option<Region>,
    pub category: Option<String>,
    pub sku: Option<String>,
}

impl QueryClassification {
    pub fn new(intent: Intent) -> Self {
        Self { intent, ..Self::default() }
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }
}
