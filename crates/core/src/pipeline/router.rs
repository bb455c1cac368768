use thiserror::Error;

use crate::domain::intent::Intent;
use crate::pipeline::states::{ClassifyRoute, GatherRoute, PipelineStage, StageTransition};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineTransitionError {
    #[error("pipeline stage {stage:?} is terminal")]
    Terminal { stage: PipelineStage },
    #[error("pipeline cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: PipelineStage, to: PipelineStage },
}

/// Every intent with a gather or decide rule leaves classify for gather.
pub fn route_after_classify(intent: Intent) -> ClassifyRoute {
    match intent {
        Intent::InventoryStatus
        | Intent::SalesAnalysis
        | Intent::FinancialReport
        | Intent::TicketStatus
        | Intent::ReorderRecommendation
        | Intent::SalesOpportunity
        | Intent::VendorSelection => ClassifyRoute::Gather,
        Intent::General => ClassifyRoute::Respond,
    }
}

pub fn route_after_gather(intent: Intent) -> GatherRoute {
    match intent {
        Intent::ReorderRecommendation | Intent::SalesOpportunity | Intent::VendorSelection => {
            GatherRoute::Decide
        }
        Intent::InventoryStatus
        | Intent::SalesAnalysis
        | Intent::FinancialReport
        | Intent::TicketStatus
        | Intent::General => GatherRoute::Respond,
    }
}

pub fn next_stage(
    stage: PipelineStage,
    intent: Intent,
) -> Result<PipelineStage, PipelineTransitionError> {
    match stage {
        PipelineStage::Classify => Ok(route_after_classify(intent).into()),
        PipelineStage::Gather => Ok(route_after_gather(intent).into()),
        PipelineStage::Decide => Ok(PipelineStage::Respond),
        PipelineStage::Respond => Ok(PipelineStage::Done),
        PipelineStage::Done => Err(PipelineTransitionError::Terminal { stage }),
    }
}

/// Checks a proposed move against the routing table for `intent`.
pub fn transition(
    from: PipelineStage,
    to: PipelineStage,
    intent: Intent,
) -> Result<StageTransition, PipelineTransitionError> {
    let expected = next_stage(from, intent)?;
    if expected != to {
        return Err(PipelineTransitionError::InvalidTransition { from, to });
    }
    Ok(StageTransition { from, to })
}

/// Full stage sequence a query with `intent` walks through, from classify to done.
pub fn stage_path(intent: Intent) -> Vec<PipelineStage> {
    let mut path = vec![PipelineStage::Classify];
    let mut current = PipelineStage::Classify;
    while let Ok(next) = next_stage(current, intent) {
        path.push(next);
        current = next;
    }
    path
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::domain::intent::Intent;
    use crate::pipeline::router::{
        next_stage, route_after_classify, route_after_gather, stage_path, transition,
        PipelineTransitionError,
    };
    use crate::pipeline::states::{ClassifyRoute, GatherRoute, PipelineStage};

    #[test]
    fn only_general_skips_gathering() {
        for intent in Intent::ALL {
            let expected =
                if intent == Intent::General { ClassifyRoute::Respond } else { ClassifyRoute::Gather };
            assert_eq!(route_after_classify(intent), expected, "{intent}");
        }
    }

    #[test]
    fn judgment_intents_and_only_those_decide() {
        for intent in Intent::ALL {
            let expected =
                if intent.requires_judgment() { GatherRoute::Decide } else { GatherRoute::Respond };
            assert_eq!(route_after_gather(intent), expected, "{intent}");
        }
    }

    #[test]
    fn arbitrary_intent_tokens_route_like_general() {
        for token in ["", "weather_report", "INVENTORY", "hello there"] {
            let intent = Intent::parse_lenient(token);
            assert_eq!(route_after_classify(intent), ClassifyRoute::Respond);
        }
    }

    #[test]
    fn stage_paths_have_no_cycles_and_end_in_done() {
        use PipelineStage::{Classify, Decide, Done, Gather, Respond};

        assert_eq!(stage_path(Intent::General), vec![Classify, Respond, Done]);
        assert_eq!(stage_path(Intent::InventoryStatus), vec![Classify, Gather, Respond, Done]);
        assert_eq!(
            stage_path(Intent::VendorSelection),
            vec![Classify, Gather, Decide, Respond, Done]
        );

        for intent in Intent::ALL {
            let path = stage_path(intent);
            let unique: HashSet<_> = path.iter().collect();
            assert_eq!(unique.len(), path.len(), "{intent} revisits a stage");
            assert_eq!(path.last(), Some(&Done));
        }
    }

    #[test]
    fn done_is_terminal() {
        let error = next_stage(PipelineStage::Done, Intent::InventoryStatus)
            .expect_err("done has no successor");
        assert_eq!(error, PipelineTransitionError::Terminal { stage: PipelineStage::Done });
    }

    #[test]
    fn off_table_transition_is_rejected() {
        let error = transition(PipelineStage::Classify, PipelineStage::Decide, Intent::VendorSelection)
            .expect_err("classify cannot jump to decide");
        assert!(matches!(error, PipelineTransitionError::InvalidTransition { .. }));

        let ok = transition(PipelineStage::Gather, PipelineStage::Decide, Intent::SalesOpportunity)
            .expect("gather -> decide");
        assert_eq!(ok.to, PipelineStage::Decide);
    }
}
