//! Principle aggregation and the report handed back to callers.

mod aggregator;
pub mod views;

pub use aggregator::{PrincipleAggregator, PrincipleScore};
pub use views::{IndicatorView, PrincipleView, ReportView};

use std::collections::BTreeMap;

use serde::Serialize;

use crate::evaluation::{IndicatorId, IndicatorResult, Principle};
use views::{indicator_view, principle_label, round2};

/// Complete evaluation output. Every catalog indicator appears in `results`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub profile: String,
    pub locale: String,
    pub item_id: String,
    pub results: BTreeMap<IndicatorId, IndicatorResult>,
    pub principles: BTreeMap<Principle, PrincipleScore>,
    pub overall_score: f64,
}

impl EvaluationReport {
    pub fn result(&self, indicator: IndicatorId) -> Option<&IndicatorResult> {
        self.results.get(&indicator)
    }

    pub fn principle_score(&self, principle: Principle) -> f64 {
        self.principles
            .get(&principle)
            .map(|score| score.score)
            .unwrap_or_default()
    }

    pub fn view(&self) -> ReportView {
        ReportView {
            item_id: self.item_id.clone(),
            profile: self.profile.clone(),
            locale: self.locale.clone(),
            findable: self.principle_view(Principle::Findable),
            accessible: self.principle_view(Principle::Accessible),
            interoperable: self.principle_view(Principle::Interoperable),
            reusable: self.principle_view(Principle::Reusable),
            overall_score: round2(self.overall_score),
        }
    }

    fn principle_view(&self, principle: Principle) -> PrincipleView {
        let indicators = self
            .results
            .values()
            .filter(|result| result.principle == principle)
            .map(|result| (result.id.to_string(), indicator_view(result)))
            .collect();

        PrincipleView {
            label: principle_label(principle),
            score: round2(self.principle_score(principle)),
            indicators,
        }
    }
}
