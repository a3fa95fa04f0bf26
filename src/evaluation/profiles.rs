//! Repository-specific indicator implementations bundled with the crate.

use super::context::IndicatorContext;
use super::indicator::{IndicatorEvaluationError, IndicatorId, IndicatorOutcome};
use super::policy::data_links;
use super::registry::IndicatorRegistry;
use super::rules::default_rule;
use crate::metadata::{url_host, url_scheme, IdentifierScheme};

type Outcome = Result<IndicatorOutcome, IndicatorEvaluationError>;

pub const DIGITAL_CSIC: &str = "digital_csic";
pub const AI4OS: &str = "ai4os";

const DIGITAL_CSIC_PRESERVATION_POLICY: &str = "https://digital.csic.es/dc/politicas/#politica8";

const CODE_FORGES: [&str; 4] = ["github.com", "gitlab.com", "codeberg.org", "bitbucket.org"];

/// Permanent-identifier resolver whose URLs otherwise read as plain URLs.
const W3ID_HOST: &str = "w3id.org";

pub(crate) fn register(registry: &mut IndicatorRegistry) {
    registry.register_override(DIGITAL_CSIC, IndicatorId::A2_01M, digital_csic_a2_01m);
    registry.register_override(DIGITAL_CSIC, IndicatorId::A1_2_01D, digital_csic_a1_2_01d);
    registry.register_override(DIGITAL_CSIC, IndicatorId::I3_04M, digital_csic_i3_04m);

    registry.register_override(AI4OS, IndicatorId::A1_05D, ai4os_a1_05d);
    registry.register_override(AI4OS, IndicatorId::A2_01M, ai4os_a2_01m);
    registry.register_override(AI4OS, IndicatorId::I1_02M, ai4os_i1_02m);
    registry.register_override(AI4OS, IndicatorId::I3_01M, ai4os_i3_01m);
    registry.register_override(AI4OS, IndicatorId::I3_01D, ai4os_i3_01d);
    registry.register_override(AI4OS, IndicatorId::I3_02D, ai4os_i3_02d);
    registry.register_override(AI4OS, IndicatorId::I3_03M, ai4os_i3_03m);
    registry.register_override(AI4OS, IndicatorId::I3_04M, ai4os_i3_03m);
}

fn digital_csic_a2_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    let policy = ctx
        .config
        .preservation_policy
        .as_deref()
        .unwrap_or(DIGITAL_CSIC_PRESERVATION_POLICY);
    Ok(IndicatorOutcome::pass(format!(
        "DIGITAL.CSIC preservation policy keeps metadata available: {policy}"
    )))
}

fn digital_csic_a1_2_01d(_ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(IndicatorOutcome::pass(
        "DIGITAL.CSIC allows access management with authentication and authorisation from CSIC CAS",
    ))
}

/// Qualified references to metadata are assessed like the knowledge representation of I1-02M.
fn digital_csic_i3_04m(ctx: &IndicatorContext<'_>) -> Outcome {
    default_rule(IndicatorId::I1_02M)(ctx)
}

fn ai4os_a1_05d(ctx: &IndicatorContext<'_>) -> Outcome {
    let repository = data_links(ctx).into_iter().find_map(|(_, url)| {
        let url = url?;
        let secure = url_scheme(&url).is_some_and(|scheme| scheme == "https");
        let forge = url_host(&url).is_some_and(|host| {
            CODE_FORGES
                .iter()
                .any(|forge| host == *forge || host.ends_with(&format!(".{forge}")))
        });
        (secure && forge).then_some(url)
    });

    Ok(match repository {
        Some(url) => IndicatorOutcome::pass(format!(
            "code repository {url} can be cloned automatically over https"
        )),
        None => IndicatorOutcome::fail("no https code repository link found"),
    })
}

fn ai4os_a2_01m(_ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(IndicatorOutcome::fail(
        "no verifiable preservation policy keeps the metadata available once the data is gone",
    ))
}

fn ai4os_i1_02m(_ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(IndicatorOutcome::pass(
        "metadata is provided in JSON, JSON-LD and other knowledge representation formats",
    ))
}

fn ai4os_i3_01m(ctx: &IndicatorContext<'_>) -> Outcome {
    default_rule(IndicatorId::I3_02M)(ctx)
}

fn ai4os_i3_01d(_ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(IndicatorOutcome::fail(
        "qualified references from the data to other data cannot be checked automatically",
    ))
}

fn ai4os_i3_02d(_ctx: &IndicatorContext<'_>) -> Outcome {
    Ok(IndicatorOutcome::fail(
        "references from the data to other data cannot be checked automatically",
    ))
}

fn is_persistent_identifier(value: &str) -> bool {
    let by_scheme = IdentifierScheme::detect(value)
        .is_some_and(|scheme| scheme.is_persistent() || scheme == IdentifierScheme::Orcid);
    by_scheme
        || url_host(value).is_some_and(|host| host == W3ID_HOST)
}

/// Any metadata value given as a persistent identifier.
fn ai4os_i3_03m(ctx: &IndicatorContext<'_>) -> Outcome {
    let persistent: Vec<&str> = ctx
        .index
        .all_values()
        .into_iter()
        .filter(|value| is_persistent_identifier(value))
        .collect();

    Ok(if persistent.is_empty() {
        IndicatorOutcome::fail("no persistent identifiers found among the metadata references")
    } else {
        let shown: Vec<&str> = persistent.iter().copied().take(5).collect();
        IndicatorOutcome::pass(format!(
            "persistent identifiers found: {}",
            shown.join(", ")
        ))
    })
}
