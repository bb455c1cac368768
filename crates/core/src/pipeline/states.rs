use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Classify,
    Gather,
    Decide,
    Respond,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::Gather => "gather",
            Self::Decide => "decide",
            Self::Respond => "respond",
            Self::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifyRoute {
    Gather,
    Respond,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatherRoute {
    Decide,
    Respond,
}

impl From<ClassifyRoute> for PipelineStage {
    fn from(route: ClassifyRoute) -> Self {
        match route {
            ClassifyRoute::Gather => Self::Gather,
            ClassifyRoute::Respond => Self::Respond,
        }
    }
}

impl From<GatherRoute> for PipelineStage {
    fn from(route: GatherRoute) -> Self {
        match route {
            GatherRoute::Decide => Self::Decide,
            GatherRoute::Respond => Self::Respond,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: PipelineStage,
    pub to: PipelineStage,
}
