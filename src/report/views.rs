use std::collections::BTreeMap;

use serde::Serialize;

use crate::evaluation::{IndicatorResult, IndicatorStatus, Principle, Weight};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorView {
    pub points: u8,
    pub weight: Weight,
    pub weight_label: &'static str,
    pub message: String,
    pub status: IndicatorStatus,
    pub summary: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrincipleView {
    pub label: &'static str,
    pub score: f64,
    pub indicators: BTreeMap<String, IndicatorView>,
}

/// Nested `{principle: {score, indicators: {id: {...}}}, overall_score}` shape
/// consumed by JSON and rendering layers. Scores are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub item_id: String,
    pub profile: String,
    pub locale: String,
    pub findable: PrincipleView,
    pub accessible: PrincipleView,
    pub interoperable: PrincipleView,
    pub reusable: PrincipleView,
    pub overall_score: f64,
}

pub(crate) fn principle_label(principle: Principle) -> &'static str {
    match principle {
        Principle::Findable => "Findable",
        Principle::Accessible => "Accessible",
        Principle::Interoperable => "Interoperable",
        Principle::Reusable => "Reusable",
    }
}

pub(crate) fn weight_label(weight: Weight) -> &'static str {
    match weight {
        Weight::Essential => "Essential",
        Weight::Recommended => "Recommended",
        Weight::Optional => "Optional",
    }
}

pub(crate) fn indicator_view(result: &IndicatorResult) -> IndicatorView {
    IndicatorView {
        points: result.points,
        weight: result.weight,
        weight_label: weight_label(result.weight),
        message: result.message.clone(),
        status: result.status(),
        summary: result.id.summary(),
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
