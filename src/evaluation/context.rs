use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::indicator::IndicatorId;
use crate::config::RuleConfig;
use crate::metadata::{HarvestInfo, MetadataIndex};
use crate::vocabulary::VocabularyMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub indicator: Option<String>,
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Append-only diagnostics for one evaluation. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, indicator: Option<IndicatorId>, level: DiagnosticLevel, message: impl Into<String>) {
        self.entries.lock().push(Diagnostic {
            indicator: indicator.map(|id| id.to_string()),
            level,
            message: message.into(),
        });
    }

    pub fn info(&self, indicator: IndicatorId, message: impl Into<String>) {
        self.record(Some(indicator), DiagnosticLevel::Info, message);
    }

    pub fn warn(&self, indicator: IndicatorId, message: impl Into<String>) {
        self.record(Some(indicator), DiagnosticLevel::Warning, message);
    }

    pub fn error(&self, indicator: IndicatorId, message: impl Into<String>) {
        self.record(Some(indicator), DiagnosticLevel::Error, message);
    }

    /// Snapshot of everything recorded so far, in recording order.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Per-call state threaded through an evaluation: requested locale and diagnostics.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    locale: String,
    sink: DiagnosticSink,
}

impl EvaluationContext {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            sink: DiagnosticSink::new(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn sink(&self) -> &DiagnosticSink {
        &self.sink
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new("en")
    }
}

/// Read-only inputs handed to each indicator function.
pub struct IndicatorContext<'a> {
    pub indicator: IndicatorId,
    pub index: &'a MetadataIndex,
    pub config: &'a RuleConfig,
    pub vocabulary: &'a VocabularyMatcher,
    pub harvest: &'a HarvestInfo,
    pub sink: &'a DiagnosticSink,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_buffer() {
        let context = EvaluationContext::default();
        let sink = context.sink().clone();

        sink.warn(IndicatorId::A2_01M, "preservation policy not configured");
        context.sink().record(None, DiagnosticLevel::Info, "evaluation finished");

        let entries = context.sink().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].indicator.as_deref(), Some("RDA-A2-01M"));
        assert_eq!(entries[1].indicator, None);
        assert_eq!(context.locale(), "en");
    }
}
