//! Generic indicator implementations, one per catalog entry.

use std::collections::BTreeSet;

use super::context::IndicatorContext;
use super::indicator::{IndicatorEvaluationError, IndicatorId, IndicatorOutcome};
use super::policy::{
    any_controlled, classify_values, controlled_proportion, data_links, extension_match,
    presence, protocol_match, richness, OPEN_PROTOCOLS,
};
use super::IndicatorFn;
use crate::config::RuleSet;
use crate::metadata::{url_scheme, IdentifierScheme};

type Outcome = Result<IndicatorOutcome, IndicatorEvaluationError>;

/// The generic implementation of `id`. Every indicator has one.
pub fn default_rule(id: IndicatorId) -> IndicatorFn {
    match id {
        IndicatorId::F1_01M => f1_01m,
        IndicatorId::F1_01D => f1_01d,
        IndicatorId::F1_02M => f1_02m,
        IndicatorId::F1_02D => f1_02d,
        IndicatorId::F2_01M => f2_01m,
        IndicatorId::F3_01M => f3_01m,
        IndicatorId::F4_01M => f4_01m,
        IndicatorId::A1_01M => a1_01m,
        IndicatorId::A1_02M => a1_02m,
        IndicatorId::A1_02D => a1_02d,
        IndicatorId::A1_03M => a1_03m,
        IndicatorId::A1_03D => a1_03d,
        IndicatorId::A1_04M => a1_04m,
        IndicatorId::A1_04D => a1_04d,
        IndicatorId::A1_05D => a1_05d,
        IndicatorId::A1_1_01M => a1_1_01m,
        IndicatorId::A1_1_01D => a1_1_01d,
        IndicatorId::A1_2_01D => a1_2_01d,
        IndicatorId::A2_01M => a2_01m,
        IndicatorId::I1_01M => i1_01m,
        IndicatorId::I1_01D => i1_01d,
        IndicatorId::I1_02M => i1_02m,
        IndicatorId::I1_02D => i1_02d,
        IndicatorId::I2_01M => i2_01m,
        IndicatorId::I2_01D => i2_01d,
        IndicatorId::I3_01M => i3_01m,
        IndicatorId::I3_01D => i3_01d,
        IndicatorId::I3_02M => i3_02m,
        IndicatorId::I3_02D => i3_02d,
        IndicatorId::I3_03M => i3_03m,
        IndicatorId::I3_04M => i3_04m,
        IndicatorId::R1_01M => r1_01m,
        IndicatorId::R1_1_01M => r1_1_01m,
        IndicatorId::R1_1_02M => r1_1_02m,
        IndicatorId::R1_1_03M => r1_1_03m,
        IndicatorId::R1_2_01M => r1_2_01m,
        IndicatorId::R1_2_02M => r1_2_02m,
        IndicatorId::R1_3_01M => r1_3_01m,
        IndicatorId::R1_3_01D => r1_3_01d,
        IndicatorId::R1_3_02M => r1_3_02m,
        IndicatorId::R1_3_02D => r1_3_02d,
    }
}

fn identifiers<'a>(
    ctx: &IndicatorContext<'a>,
    rules: &RuleSet,
) -> Vec<(&'a str, Option<IdentifierScheme>)> {
    ctx.index
        .values_for_rules(rules)
        .into_iter()
        .map(|value| (value, IdentifierScheme::detect(value)))
        .collect()
}

fn describe_identifiers<'a>(found: impl Iterator<Item = (&'a str, IdentifierScheme)>) -> String {
    found
        .map(|(value, scheme)| format!("{value} ({})", scheme.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn persistence(ctx: &IndicatorContext<'_>, rules: &RuleSet, subject: &str) -> IndicatorOutcome {
    let found = identifiers(ctx, rules);
    let persistent: Vec<(&str, IdentifierScheme)> = found
        .iter()
        .filter_map(|(value, scheme)| scheme.filter(|s| s.is_persistent()).map(|s| (*value, s)))
        .collect();

    if !persistent.is_empty() {
        return IndicatorOutcome::pass(format!(
            "{subject} identified by persistent identifier(s): {}",
            describe_identifiers(persistent.into_iter())
        ));
    }
    if found.is_empty() {
        IndicatorOutcome::fail(format!(
            "no {subject} identifier found in terms: {}",
            rules.describe()
        ))
    } else {
        IndicatorOutcome::fail(format!(
            "{subject} identifiers found but none is persistent: {}",
            found.iter().map(|(value, _)| *value).collect::<Vec<_>>().join(", ")
        ))
    }
}

fn uniqueness(ctx: &IndicatorContext<'_>, rules: &RuleSet, subject: &str) -> IndicatorOutcome {
    let found = identifiers(ctx, rules);
    let unique: Vec<(&str, IdentifierScheme)> = found
        .iter()
        .filter_map(|(value, scheme)| {
            scheme
                .filter(|s| s.is_globally_unique())
                .map(|s| (*value, s))
        })
        .collect();

    if !unique.is_empty() {
        IndicatorOutcome::pass(format!(
            "{subject} identified by globally unique identifier(s): {}",
            describe_identifiers(unique.into_iter())
        ))
    } else if found.is_empty() {
        IndicatorOutcome::fail(format!(
            "no {subject} identifier found in terms: {}",
            rules.describe()
        ))
    } else {
        IndicatorOutcome::fail(format!(
            "{subject} identifiers do not follow a globally unique scheme: {}",
            found.iter().map(|(value, _)| *value).collect::<Vec<_>>().join(", ")
        ))
    }
}

fn resolvable(ctx: &IndicatorContext<'_>, rules: &RuleSet, subject: &str) -> IndicatorOutcome {
    let found = identifiers(ctx, rules);
    let resolved = found.iter().find_map(|(value, scheme)| {
        scheme
            .and_then(|s| s.resolution_url(value))
            .map(|url| (*value, url))
    });

    match resolved {
        Some((value, url)) if value == url => {
            IndicatorOutcome::pass(format!("{subject} resolves at {url}"))
        }
        Some((value, url)) => {
            IndicatorOutcome::pass(format!("{subject} identifier {value} resolves at {url}"))
        }
        None if found.is_empty() => IndicatorOutcome::fail(format!(
            "no {subject} identifier found in terms: {}",
            rules.describe()
        )),
        None => IndicatorOutcome::fail(format!(
            "{subject} identifiers cannot be resolved over HTTP: {}",
            found.iter().map(|(value, _)| *value).collect::<Vec<_>>().join(", ")
        )),
    }
}

/// Lower-cased schemes of the locations data identifiers resolve through.
fn data_protocols(ctx: &IndicatorContext<'_>) -> Vec<String> {
    let mut protocols: Vec<String> = data_links(ctx)
        .into_iter()
        .filter_map(|(_, url)| url)
        .filter_map(|url| url_scheme(&url))
        .collect();
    protocols.sort();
    protocols.dedup();
    protocols
}

fn free_protocol(protocol: Option<&str>, ctx: &IndicatorContext<'_>, subject: &str) -> IndicatorOutcome {
    match protocol {
        None => IndicatorOutcome::fail(format!("no access protocol known for {subject}")),
        Some(protocol)
            if ctx.config.access_protocols.contains(protocol)
                && OPEN_PROTOCOLS.contains(&protocol) =>
        {
            IndicatorOutcome::pass(format!("{subject} is accessible through the free protocol {protocol}"))
        }
        Some(protocol) => IndicatorOutcome::fail(format!(
            "protocol {protocol} used for {subject} is not an accepted free protocol"
        )),
    }
}

fn accepted_schema(ctx: &IndicatorContext<'_>) -> Option<String> {
    ctx.index
        .schemas()
        .find(|schema| ctx.config.metadata_standards.contains(*schema))
        .map(str::to_string)
}

fn machine_understandable(ctx: &IndicatorContext<'_>, subject: &str) -> IndicatorOutcome {
    match accepted_schema(ctx) {
        Some(schema) => IndicatorOutcome::pass(format!(
            "{subject} is expressed with the accepted metadata standard {schema}"
        )),
        None => IndicatorOutcome::fail(format!(
            "schemas used ({}) are not among the accepted metadata standards",
            ctx.index.schemas().collect::<Vec<_>>().join(", ")
        )),
    }
}

fn fair_vocabularies(ctx: &IndicatorContext<'_>, subject: &str) -> IndicatorOutcome {
    let classification = classify_values(ctx, &ctx.config.cv_rules, None);
    let resolvable: Vec<String> = classification
        .vocabularies()
        .into_iter()
        .filter(|name| {
            ctx.config
                .vocabularies
                .get(name)
                .and_then(|descriptor| descriptor.base_uri.as_deref())
                .and_then(url_scheme)
                .is_some_and(|scheme| matches!(scheme.as_str(), "http" | "https"))
        })
        .collect();

    let outcome = if classification.total == 0 {
        IndicatorOutcome::fail(format!("no controlled-vocabulary terms found in {subject}"))
    } else if resolvable.is_empty() {
        IndicatorOutcome::fail(format!(
            "{subject} uses no vocabulary with a resolvable identifier"
        ))
    } else {
        IndicatorOutcome::pass(format!(
            "{subject} uses resolvable vocabularies: {}",
            resolvable.join(", ")
        ))
    };
    outcome.with_degraded(classification.degraded())
}

fn community_standard(ctx: &IndicatorContext<'_>) -> IndicatorOutcome {
    let Some(vocabulary) = ctx.config.standards_vocabulary.as_deref() else {
        return IndicatorOutcome::fail("no metadata standards vocabulary configured");
    };
    let Some(descriptor) = ctx.config.vocabularies.get(vocabulary) else {
        return IndicatorOutcome::fail(format!("vocabulary '{vocabulary}' is not declared"));
    };

    let mut degraded = BTreeSet::new();
    let mut listed = None;
    for schema in ctx
        .index
        .schemas()
        .filter(|schema| ctx.config.metadata_standards.contains(*schema))
    {
        let answer = ctx.vocabulary.classify(schema, descriptor);
        degraded.extend(answer.degraded);
        if let Some(found) = answer.found {
            listed = Some((schema, found));
            break;
        }
    }

    let outcome = match listed {
        Some((schema, found)) => IndicatorOutcome::pass(format!(
            "metadata standard {schema} is listed by {}",
            found.vocabulary
        )),
        None => IndicatorOutcome::fail(format!(
            "no accepted metadata standard listed by {vocabulary}; schemas used: {}",
            ctx.index.schemas().collect::<Vec<_>>().join(", ")
        )),
    };
    outcome.with_degraded(degraded)
}

fn f1_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    let outcome = persistence(ctx, &ctx.config.identifier_rules, "metadata");
    if outcome.points == 0 {
        if let Some(policy) = ctx.config.metadata_persistence_policy.as_deref() {
            return Ok(IndicatorOutcome::pass(format!(
                "metadata persistence is guaranteed by policy: {policy}"
            )));
        }
    }
    Ok(outcome)
}

fn f1_01d(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(persistence(ctx, &ctx.config.data_identifier_rules, "data"))
}

fn f1_02m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(uniqueness(ctx, &ctx.config.identifier_rules, "metadata"))
}

fn f1_02d(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(uniqueness(ctx, &ctx.config.data_identifier_rules, "data"))
}

fn f2_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    let rules = ctx.config.generic_rules.union(&ctx.config.discipline_rules);
    Ok(richness(ctx.index, &rules, "discovery"))
}

fn f3_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(presence(ctx.index, &ctx.config.data_identifier_rules, "data identifier"))
}

fn f4_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(if ctx.index.is_empty() {
        IndicatorOutcome::fail(format!(
            "no metadata could be harvested for {}",
            ctx.harvest.item_id
        ))
    } else {
        IndicatorOutcome::pass(format!(
            "{} metadata statements harvested for {}",
            ctx.index.len(),
            ctx.harvest.item_id
        ))
    })
}

fn a1_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(presence(ctx.index, &ctx.config.access_rules, "access information"))
}

/// Metadata a person can read: an HTTP(S) landing page with descriptive terms to show.
fn a1_02m(ctx: &IndicatorContext<'_>) -> Outcome {
    let landing = identifiers(ctx, &ctx.config.identifier_rules)
        .into_iter()
        .find_map(|(value, scheme)| {
            scheme?
                .resolution_url(value)
                .filter(|url| url_scheme(url).is_some_and(|scheme| matches!(scheme.as_str(), "http" | "https")))
        });
    let Some(landing) = landing else {
        return Ok(IndicatorOutcome::fail(
            "no HTTP landing page found; metadata cannot be accessed manually",
        ));
    };

    let total = ctx.config.generic_rules.len();
    let present = ctx.index.match_count(&ctx.config.generic_rules);
    Ok(if present == 0 {
        IndicatorOutcome::fail(format!(
            "landing page {landing} has no descriptive metadata to show in terms: {}",
            ctx.config.generic_rules.describe()
        ))
    } else {
        IndicatorOutcome::pass(format!(
            "metadata can be accessed manually at {landing} ({present} of {total} descriptive terms present)"
        ))
    })
}

fn a1_02d(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(presence(ctx.index, &ctx.config.access_rules, "data access information"))
}

fn a1_03m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(resolvable(ctx, &ctx.config.identifier_rules, "metadata record"))
}

fn a1_03d(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(resolvable(ctx, &ctx.config.data_identifier_rules, "data"))
}

fn a1_04m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(protocol_match(
        ctx.harvest.protocol().as_deref(),
        &ctx.config.access_protocols,
        "metadata",
    ))
}

fn a1_04d(ctx: &IndicatorContext<'_>) -> Outcome {
    let protocols = data_protocols(ctx);
    let accepted = protocols
        .iter()
        .find(|protocol| ctx.config.access_protocols.contains(*protocol));
    Ok(match (accepted, protocols.first()) {
        (Some(protocol), _) => {
            protocol_match(Some(protocol.as_str()), &ctx.config.access_protocols, "data")
        }
        (None, first) => protocol_match(first.map(String::as_str), &ctx.config.access_protocols, "data"),
    })
}

fn a1_05d(ctx: &IndicatorContext<'_>) -> Outcome {
    let links = data_links(ctx);
    let downloadable = links.iter().find_map(|(_, url)| {
        let url = url.as_deref()?;
        let extension = crate::metadata::file_extension(url)?;
        ctx.config
            .supported_extensions
            .contains(&extension)
            .then(|| url.to_string())
    });

    Ok(match downloadable {
        Some(url) => IndicatorOutcome::pass(format!("data can be downloaded automatically from {url}")),
        None if links.is_empty() => IndicatorOutcome::fail("no data link found in metadata"),
        None => IndicatorOutcome::fail(
            "data links found but none points to a file in a supported format",
        ),
    })
}

fn a1_1_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(free_protocol(ctx.harvest.protocol().as_deref(), ctx, "metadata"))
}

fn a1_1_01d(ctx: &IndicatorContext<'_>) -> Outcome {
    let protocols = data_protocols(ctx);
    let open = protocols
        .iter()
        .find(|protocol| OPEN_PROTOCOLS.contains(&protocol.as_str()));
    Ok(free_protocol(
        open.or(protocols.first()).map(String::as_str),
        ctx,
        "data",
    ))
}

fn a1_2_01d(ctx: &IndicatorContext<'_>) -> Outcome {
    const AUTH_KEYWORDS: [&str; 5] = ["authentication", "authorisation", "authorization", "login", "restricted"];

    let Some(protocol) = ctx.harvest.protocol() else {
        return Ok(IndicatorOutcome::fail("no access protocol known for data"));
    };

    let mentions_auth = ctx
        .index
        .values_for_rules(&ctx.config.access_rules)
        .iter()
        .any(|value| {
            let lower = value.to_lowercase();
            AUTH_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
        });

    Ok(if protocol == "https" && mentions_auth {
        IndicatorOutcome::pass("data is served over https with authentication and authorisation")
    } else {
        IndicatorOutcome::fail(format!(
            "{protocol} is an open protocol; no authentication or authorisation is declared"
        ))
    })
}

fn a2_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(match ctx.config.preservation_policy.as_deref() {
        Some(policy) => IndicatorOutcome::pass(format!("metadata preservation policy: {policy}")),
        None => IndicatorOutcome::new(
            50,
            "metadata preservation depends on the repository authority; no policy configured",
        ),
    })
}

fn i1_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(controlled_proportion(ctx, &ctx.config.cv_rules, None, "controlled-vocabulary"))
}

fn i1_01d(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(extension_match(ctx, "data"))
}

fn i1_02m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(machine_understandable(ctx, "metadata"))
}

fn i1_02d(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(machine_understandable(ctx, "data description"))
}

fn i2_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(fair_vocabularies(ctx, "metadata"))
}

fn i2_01d(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(fair_vocabularies(ctx, "data description"))
}

fn i3_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(any_controlled(ctx, &ctx.config.reference_rules, None, "metadata reference"))
}

fn i3_01d(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(any_controlled(ctx, &ctx.config.relation_rules, None, "data reference"))
}

fn i3_02m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(presence(ctx.index, &ctx.config.relation_rules, "reference to other data"))
}

fn i3_02d(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(any_controlled(ctx, &ctx.config.relation_rules, None, "qualified data reference"))
}

fn i3_03m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(any_controlled(ctx, &ctx.config.relation_rules, None, "qualified metadata reference"))
}

fn i3_04m(_ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(IndicatorOutcome::fail(
        "qualified references to other data cannot be assessed from metadata alone",
    ))
}

fn r1_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(richness(ctx.index, &ctx.config.reusability_rules, "reusability"))
}

fn r1_1_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(presence(ctx.index, &ctx.config.license_rules, "license"))
}

fn r1_1_02m(ctx: &IndicatorContext<'_>) -> Outcome {
    let Some(vocabulary) = ctx.config.license_vocabulary.as_deref() else {
        return Ok(IndicatorOutcome::fail("no license vocabulary configured"));
    };
    Ok(any_controlled(ctx, &ctx.config.license_rules, Some(vocabulary), "standard license"))
}

fn r1_1_03m(ctx: &IndicatorContext<'_>) -> Outcome {
    let Some(vocabulary) = ctx.config.license_vocabulary.as_deref() else {
        return Ok(IndicatorOutcome::fail("no license vocabulary configured"));
    };

    let classification = classify_values(ctx, &ctx.config.license_rules, Some(vocabulary));
    let machine_readable = classification
        .controlled
        .iter()
        .find(|(value, _)| url_scheme(value).is_some());

    let outcome = match machine_readable {
        Some((value, found)) => IndicatorOutcome::pass(format!(
            "license {value} is machine readable ({})",
            found.vocabulary
        )),
        None if classification.total == 0 => IndicatorOutcome::fail("no license found"),
        None => IndicatorOutcome::fail(format!(
            "no license is given as a URL recognised by {vocabulary}"
        )),
    };
    Ok(outcome.with_degraded(classification.degraded()))
}

fn r1_2_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(presence(ctx.index, &ctx.config.provenance_rules, "provenance information"))
}

fn r1_2_02m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(any_controlled(ctx, &ctx.config.provenance_rules, None, "provenance value"))
}

fn r1_3_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(community_standard(ctx))
}

fn r1_3_01d(ctx: &IndicatorContext<'_>) -> Outcome {
    let Some(vocabulary) = ctx.config.format_vocabulary.as_deref() else {
        return Ok(IndicatorOutcome::fail("no data format vocabulary configured"));
    };
    Ok(controlled_proportion(ctx, &ctx.config.format_rules, Some(vocabulary), "data format"))
}

fn r1_3_02m(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(community_standard(ctx))
}

fn r1_3_02d(ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(extension_match(ctx, "data"))
}
