//! Indicator evaluation: catalog, scoring policies, repository overrides and the engine.

mod context;
mod indicator;
mod policy;
mod profiles;
mod registry;
mod rules;

#[cfg(test)]
mod tests;

pub use context::{Diagnostic, DiagnosticLevel, DiagnosticSink, EvaluationContext, IndicatorContext};
pub use indicator::{
    IndicatorEvaluationError, IndicatorId, IndicatorOutcome, IndicatorResult, IndicatorStatus,
    Principle, Weight,
};
pub use profiles::{AI4OS, DIGITAL_CSIC};
pub use registry::IndicatorRegistry;
pub use rules::default_rule;

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, RuleConfig};
use crate::metadata::{MetadataCollection, MetadataIndex};
use crate::report::{EvaluationReport, PrincipleAggregator};
use crate::vocabulary::VocabularyMatcher;

/// Signature shared by generic and repository-specific indicator implementations.
pub type IndicatorFn =
    fn(&IndicatorContext<'_>) -> Result<IndicatorOutcome, IndicatorEvaluationError>;

/// Failures that prevent a complete report from being produced.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("invalid rule configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("evaluation did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("indicator worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
    #[error("evaluation produced no result for {0}")]
    Incomplete(IndicatorId),
}

/// Runs every catalog indicator for one metadata collection and aggregates the results.
pub struct EvaluationEngine {
    registry: IndicatorRegistry,
    matcher: Arc<VocabularyMatcher>,
}

impl EvaluationEngine {
    pub fn new(registry: IndicatorRegistry, matcher: Arc<VocabularyMatcher>) -> Self {
        Self { registry, matcher }
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    pub fn matcher(&self) -> &Arc<VocabularyMatcher> {
        &self.matcher
    }

    /// Evaluate `collection` under `config`. Indicators run in parallel on the
    /// blocking pool; a failing indicator is reported with 0 points and the
    /// rest of the evaluation proceeds.
    pub async fn evaluate(
        &self,
        collection: &MetadataCollection,
        config: &Arc<RuleConfig>,
        ctx: &EvaluationContext,
    ) -> Result<EvaluationReport, EvaluationError> {
        self.matcher.seed(config);

        let index = Arc::new(MetadataIndex::build(collection));
        let harvest = Arc::new(collection.harvest().clone());
        debug!(
            profile = config.profile.as_str(),
            item = harvest.item_id.as_str(),
            statements = index.len(),
            "evaluating metadata collection"
        );

        let mut workers = JoinSet::new();
        for &indicator in IndicatorId::ALL {
            let implementation = self.registry.resolve(&config.profile, indicator);
            let index = Arc::clone(&index);
            let config = Arc::clone(config);
            let matcher = Arc::clone(&self.matcher);
            let harvest = Arc::clone(&harvest);
            let sink = ctx.sink().clone();

            workers.spawn_blocking(move || {
                let indicator_ctx = IndicatorContext {
                    indicator,
                    index: &index,
                    config: &config,
                    vocabulary: &matcher,
                    harvest: &harvest,
                    sink: &sink,
                };
                (indicator, run_indicator(indicator, implementation, &indicator_ctx))
            });
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = workers.join_next().await {
            let (indicator, outcome) = joined?;
            let result = match outcome {
                Ok(result) => result,
                Err(err) => {
                    warn!(indicator = %indicator, error = %err, "indicator evaluation failed");
                    ctx.sink().error(indicator, err.to_string());
                    IndicatorResult::new(indicator, 0, format!("indicator evaluation failed: {err}"))
                }
            };
            results.insert(indicator, result);
        }

        if let Some(missing) = IndicatorId::ALL.iter().find(|id| !results.contains_key(*id)) {
            return Err(EvaluationError::Incomplete(*missing));
        }

        let report = PrincipleAggregator::aggregate(
            &config.profile,
            ctx.locale(),
            &harvest.item_id,
            results.into_values(),
        );
        info!(
            profile = config.profile.as_str(),
            item = harvest.item_id.as_str(),
            overall = report.overall_score,
            "evaluation complete"
        );
        Ok(report)
    }

    /// [`evaluate`](Self::evaluate) bounded by `timeout`. No partial report is returned.
    pub async fn evaluate_within(
        &self,
        timeout: Duration,
        collection: &MetadataCollection,
        config: &Arc<RuleConfig>,
        ctx: &EvaluationContext,
    ) -> Result<EvaluationReport, EvaluationError> {
        tokio::time::timeout(timeout, self.evaluate(collection, config, ctx))
            .await
            .map_err(|_| EvaluationError::TimedOut(timeout))?
    }

    /// Resolve raw global and profile documents, then evaluate. Configuration
    /// errors abort before any indicator runs.
    pub async fn evaluate_documents(
        &self,
        collection: &MetadataCollection,
        profile: &str,
        global: &Value,
        profile_document: &Value,
        ctx: &EvaluationContext,
    ) -> Result<EvaluationReport, EvaluationError> {
        let config = Arc::new(RuleConfig::resolve(profile, global, profile_document)?);
        self.evaluate(collection, &config, ctx).await
    }
}

fn run_indicator(
    indicator: IndicatorId,
    implementation: IndicatorFn,
    ctx: &IndicatorContext<'_>,
) -> Result<IndicatorResult, IndicatorEvaluationError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| implementation(ctx))).map_err(
        |payload| IndicatorEvaluationError::Panicked {
            indicator,
            reason: panic_message(payload.as_ref()),
        },
    )??;

    let points = u8::try_from(outcome.points)
        .ok()
        .filter(|points| *points <= 100)
        .ok_or(IndicatorEvaluationError::PointsOutOfRange {
            indicator,
            points: outcome.points,
        })?;

    let mut message = outcome.message;
    for vocabulary in &outcome.degraded_vocabularies {
        message.push_str(&format!(" [vocabulary '{vocabulary}' served from bundled snapshot]"));
        ctx.sink.warn(
            indicator,
            format!("vocabulary '{vocabulary}' served from bundled snapshot"),
        );
    }

    debug!(indicator = %indicator, points, "indicator evaluated");
    Ok(IndicatorResult::new(indicator, points, message))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
