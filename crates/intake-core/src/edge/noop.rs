//! Safe NOOP defaults for every edge capability (§4.7 table).

use super::{
    AntiMev, AssembleConstraints, AssembledBundle, BundleAssembler, CapitalAuthorization,
    CapitalPolicy, InclusionPredictor, InclusionPrediction, RelayRouter, RouteDecision, RouteHints,
    TaggedTxs,
};
use crate::model::IntentRecord;

pub struct NoopAssembler;

impl BundleAssembler for NoopAssembler {
    fn assemble(&self, intents: &[IntentRecord], _constraints: &AssembleConstraints) -> AssembledBundle {
        AssembledBundle {
            txs: intents
                .iter()
                .filter_map(|i| i.payload.extra.get("raw_tx").and_then(|v| v.as_str()).map(String::from))
                .collect(),
            noop: true,
        }
    }

    fn is_noop(&self) -> bool {
        true
    }
}

pub struct NoopRelayRouter;

impl RelayRouter for NoopRelayRouter {
    fn route(&self, _bundle: &AssembledBundle, _hints: &RouteHints) -> RouteDecision {
        RouteDecision {
            relays: Vec::new(),
            strategy: "none".to_string(),
        }
    }
}

pub struct NoopInclusionPredictor;

impl InclusionPredictor for NoopInclusionPredictor {
    fn predict(&self, _bundle: &AssembledBundle) -> InclusionPrediction {
        InclusionPrediction {
            probability: 0.0,
            target_block: None,
        }
    }
}

pub struct NoopAntiMev;

impl AntiMev for NoopAntiMev {
    fn filter_and_tag(&self, txs: &[String]) -> TaggedTxs {
        TaggedTxs {
            txs: txs.to_vec(),
            tags: Vec::new(),
        }
    }
}

pub struct NoopCapitalPolicy;

impl CapitalPolicy for NoopCapitalPolicy {
    fn authorize(&self, _bundle: &AssembledBundle) -> CapitalAuthorization {
        CapitalAuthorization {
            authorized: true,
            reason: None,
            max_gas_wei: None,
        }
    }
}
