use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::EvaluationReport;
use crate::evaluation::{IndicatorId, IndicatorResult, Principle};

/// Score of one principle and the indicators it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrincipleScore {
    pub score: f64,
    pub indicators: Vec<IndicatorId>,
}

/// Groups indicator results by principle.
///
/// A principle scores the plain arithmetic mean of its indicators' points;
/// weights are carried for reporting and never change the mean. The overall
/// score is the mean of the four principle scores.
pub struct PrincipleAggregator;

impl PrincipleAggregator {
    pub fn aggregate(
        profile: &str,
        locale: &str,
        item_id: &str,
        results: impl IntoIterator<Item = IndicatorResult>,
    ) -> EvaluationReport {
        let results: BTreeMap<IndicatorId, IndicatorResult> = results
            .into_iter()
            .map(|result| (result.id, result))
            .collect();

        let principles: BTreeMap<Principle, PrincipleScore> = Principle::ALL
            .into_iter()
            .map(|principle| {
                let members: Vec<&IndicatorResult> = results
                    .values()
                    .filter(|result| result.principle == principle)
                    .collect();
                let score = mean(members.iter().map(|result| f64::from(result.points)));
                (
                    principle,
                    PrincipleScore {
                        score,
                        indicators: members.iter().map(|result| result.id).collect(),
                    },
                )
            })
            .collect();

        let overall_score = mean(principles.values().map(|principle| principle.score));

        debug!(
            profile,
            indicators = results.len(),
            overall_score,
            "aggregated principle scores"
        );

        EvaluationReport {
            profile: profile.to_string(),
            locale: locale.to_string(),
            item_id: item_id.to_string(),
            results,
            principles,
            overall_score,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: IndicatorId, points: u8) -> IndicatorResult {
        IndicatorResult::new(id, points, "")
    }

    #[test]
    fn principle_score_is_plain_mean_regardless_of_weight() {
        let report = PrincipleAggregator::aggregate(
            "p",
            "en",
            "item",
            [
                result(IndicatorId::F1_01M, 100),
                result(IndicatorId::F2_01M, 25),
                result(IndicatorId::A1_2_01D, 0),
                result(IndicatorId::A1_01M, 100),
                result(IndicatorId::I1_01M, 50),
                result(IndicatorId::R1_01M, 75),
            ],
        );

        assert_eq!(report.principles[&Principle::Findable].score, 62.5);
        assert_eq!(report.principles[&Principle::Accessible].score, 50.0);
        assert_eq!(report.principles[&Principle::Interoperable].score, 50.0);
        assert_eq!(report.principles[&Principle::Reusable].score, 75.0);
        assert_eq!(report.overall_score, (62.5 + 50.0 + 50.0 + 75.0) / 4.0);
        assert_eq!(
            report.principles[&Principle::Findable].indicators,
            vec![IndicatorId::F1_01M, IndicatorId::F2_01M]
        );
    }

    #[test]
    fn principle_without_indicators_scores_zero() {
        let report =
            PrincipleAggregator::aggregate("p", "en", "item", [result(IndicatorId::F4_01M, 100)]);

        assert_eq!(report.principles.len(), 4);
        assert_eq!(report.principles[&Principle::Reusable].score, 0.0);
        assert!(report.principles[&Principle::Reusable].indicators.is_empty());
        assert_eq!(report.overall_score, 25.0);
    }
}
