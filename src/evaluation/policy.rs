use std::collections::BTreeSet;

use super::context::IndicatorContext;
use super::indicator::IndicatorOutcome;
use crate::config::{RuleSet, VocabularyDescriptor};
use crate::metadata::{file_extension, IdentifierScheme, MetadataIndex};
use crate::vocabulary::VocabularyMatch;

/// Protocols that can be used without fees or proprietary clients.
pub(crate) const OPEN_PROTOCOLS: [&str; 3] = ["http", "https", "ftp"];

/// `round(100 * part / total)`, half away from zero; 0 when `total` is 0.
pub(crate) fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * part as f64 / total as f64).round() as u32
}

fn render_found(found: &[(&crate::config::TermRule, Vec<&str>)]) -> String {
    found
        .iter()
        .map(|(rule, values)| format!("{rule} = {}", values.join("; ")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 100 when any rule of the set has a value.
pub(crate) fn presence(index: &MetadataIndex, rules: &RuleSet, subject: &str) -> IndicatorOutcome {
    if rules.is_empty() {
        return IndicatorOutcome::fail(format!(
            "no terms configured for {subject}; indicator not applicable"
        ));
    }

    let found = index.values_by_rule(rules);
    if found.is_empty() {
        IndicatorOutcome::fail(format!(
            "no {subject} found in terms: {}",
            rules.describe()
        ))
    } else {
        IndicatorOutcome::pass(format!("{subject} found: {}", render_found(&found)))
    }
}

/// Share of the rule set present in the record.
pub(crate) fn richness(index: &MetadataIndex, rules: &RuleSet, subject: &str) -> IndicatorOutcome {
    let total = rules.len();
    if total == 0 {
        return IndicatorOutcome::fail(format!(
            "no terms configured for {subject}; indicator not applicable"
        ));
    }

    let present = index.match_count(rules);
    let missing: Vec<String> = rules
        .iter()
        .filter(|rule| index.rule_values(rule).is_empty())
        .map(ToString::to_string)
        .collect();

    let mut message = format!("{present} of {total} {subject} terms present");
    if !missing.is_empty() {
        message.push_str(&format!("; missing: {}", missing.join(", ")));
    }
    IndicatorOutcome::new(percent(present, total), message)
}

/// Values of a rule set classified against vocabularies.
pub(crate) struct Classification<'a> {
    pub total: usize,
    pub controlled: Vec<(&'a str, VocabularyMatch)>,
    consulted_degraded: BTreeSet<String>,
}

impl Classification<'_> {
    pub fn vocabularies(&self) -> BTreeSet<String> {
        self.controlled
            .iter()
            .map(|(_, found)| found.vocabulary.clone())
            .collect()
    }

    /// Degraded vocabularies consulted for any value, matched or not.
    pub fn degraded(&self) -> BTreeSet<String> {
        self.consulted_degraded.clone()
    }
}

/// Classify every value of `rules`. With `only` set, values are checked against
/// that vocabulary alone; otherwise against the vocabularies declared for the term.
pub(crate) fn classify_values<'a>(
    ctx: &IndicatorContext<'a>,
    rules: &RuleSet,
    only: Option<&str>,
) -> Classification<'a> {
    let mut classification = Classification {
        total: 0,
        controlled: Vec::new(),
        consulted_degraded: BTreeSet::new(),
    };

    for rule in rules.iter() {
        let descriptors: Vec<&VocabularyDescriptor> = match only {
            Some(name) => ctx.config.vocabularies.get(name).into_iter().collect(),
            None => ctx.config.vocabularies_for(rule),
        };
        for value in ctx.index.rule_values(rule) {
            classification.total += 1;
            let answer = ctx.vocabulary.is_controlled(value, &descriptors);
            classification.consulted_degraded.extend(answer.degraded);
            if let Some(found) = answer.found {
                classification.controlled.push((value, found));
            }
        }
    }

    classification
}

/// Proportion of values drawn from a controlled vocabulary.
pub(crate) fn controlled_proportion(
    ctx: &IndicatorContext<'_>,
    rules: &RuleSet,
    only: Option<&str>,
    subject: &str,
) -> IndicatorOutcome {
    if rules.is_empty() {
        return IndicatorOutcome::fail(format!(
            "no terms configured for {subject}; indicator not applicable"
        ));
    }

    let classification = classify_values(ctx, rules, only);
    if classification.total == 0 {
        return IndicatorOutcome::fail(format!(
            "no {subject} values found in terms: {}",
            rules.describe()
        ));
    }

    let controlled = classification.controlled.len();
    let mut message = format!(
        "{controlled} of {} {subject} values use a controlled vocabulary",
        classification.total
    );
    let vocabularies = classification.vocabularies();
    if !vocabularies.is_empty() {
        message.push_str(&format!(
            " ({})",
            vocabularies.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }

    IndicatorOutcome::new(percent(controlled, classification.total), message)
        .with_degraded(classification.degraded())
}

/// 100 when any value of `rules` is controlled.
pub(crate) fn any_controlled(
    ctx: &IndicatorContext<'_>,
    rules: &RuleSet,
    only: Option<&str>,
    subject: &str,
) -> IndicatorOutcome {
    let classification = classify_values(ctx, rules, only);
    if classification.total == 0 {
        return IndicatorOutcome::fail(format!("no {subject} found"));
    }

    let outcome = match classification.controlled.first() {
        Some((value, found)) => IndicatorOutcome::pass(format!(
            "{subject} '{value}' belongs to vocabulary '{}'",
            found.vocabulary
        )),
        None => IndicatorOutcome::fail(format!(
            "{} {subject} found but none belongs to a declared vocabulary",
            classification.total
        )),
    };
    outcome.with_degraded(classification.degraded())
}

/// 100 when `protocol` is in the accepted set.
pub(crate) fn protocol_match(
    protocol: Option<&str>,
    accepted: &BTreeSet<String>,
    subject: &str,
) -> IndicatorOutcome {
    match protocol {
        None => IndicatorOutcome::fail(format!("no access protocol known for {subject}")),
        Some(protocol) if accepted.contains(protocol) => IndicatorOutcome::pass(format!(
            "{subject} is accessed through the standard protocol {protocol}"
        )),
        Some(protocol) => IndicatorOutcome::fail(format!(
            "protocol {protocol} used for {subject} is not among the accepted protocols"
        )),
    }
}

/// Data identifier values with the HTTP(S) location they resolve through.
pub(crate) fn data_links<'a>(ctx: &IndicatorContext<'a>) -> Vec<(&'a str, Option<String>)> {
    ctx.index
        .values_for_rules(&ctx.config.data_identifier_rules)
        .into_iter()
        .map(|value| {
            let url = IdentifierScheme::detect(value).and_then(|scheme| scheme.resolution_url(value));
            (value, url)
        })
        .collect()
}

/// 100 when a data file extension is among the supported ones.
pub(crate) fn extension_match(ctx: &IndicatorContext<'_>, subject: &str) -> IndicatorOutcome {
    let mut candidates: Vec<&str> = ctx
        .index
        .values_for_rules(&ctx.config.data_identifier_rules);
    candidates.extend(ctx.index.values_for_rules(&ctx.config.format_rules));

    let extensions: BTreeSet<String> = candidates
        .iter()
        .filter_map(|value| file_extension(value))
        .collect();

    if extensions.is_empty() {
        return IndicatorOutcome::fail(format!("no file extension found to assess {subject}"));
    }

    let supported: Vec<&String> = extensions
        .iter()
        .filter(|extension| ctx.config.supported_extensions.contains(*extension))
        .collect();

    if supported.is_empty() {
        IndicatorOutcome::fail(format!(
            "file extensions {} are not among the supported formats",
            extensions.into_iter().collect::<Vec<_>>().join(", ")
        ))
    } else {
        IndicatorOutcome::pass(format!(
            "{subject} uses supported formats: {}",
            supported
                .into_iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }
}
