use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::RuleConfig;
use crate::evaluation::{
    DiagnosticSink, EvaluationEngine, IndicatorContext, IndicatorFn, IndicatorId,
    IndicatorOutcome, IndicatorRegistry,
};
use crate::metadata::{HarvestInfo, MetadataCollection, MetadataIndex, MetadataStatement};
use crate::vocabulary::VocabularyMatcher;

pub(super) const ENDPOINT: &str = "https://digital.csic.es/dspace-oai/request";

pub(super) fn statement(term: &str, qualifier: Option<&str>, value: &str) -> MetadataStatement {
    MetadataStatement::new("dc", term, qualifier, value)
}

pub(super) fn collection(statements: Vec<MetadataStatement>) -> MetadataCollection {
    MetadataCollection::new(HarvestInfo::new("10261/157765", Some(ENDPOINT)), statements)
}

pub(super) fn collection_at(endpoint: Option<&str>, statements: Vec<MetadataStatement>) -> MetadataCollection {
    MetadataCollection::new(HarvestInfo::new("10261/157765", endpoint), statements)
}

pub(super) fn global_document() -> Value {
    json!({
        "identifier_rules": [["identifier", "doi"], ["identifier", "uri"]],
        "data_identifier_rules": [["identifier", "doi"], ["relation", "haspart"]],
        "generic_rules": [["title", null], ["creator", null], ["date", "issued"], ["subject", null]],
        "access_rules": [["rights", "accessrights"]],
        "cv_rules": [["subject", null]],
        "reference_rules": [["relation", "ispartof"]],
        "relation_rules": [["relation", null]],
        "license_rules": [["rights", "uri"], ["rights", null]],
        "reusability_rules": [["rights", "uri"], ["date", "issued"]],
        "provenance_rules": [["description", "provenance"]],
        "format_rules": [["format", "mimetype"]],
        "access_protocols": ["http", "https", "ftp"],
        "metadata_standards": ["dc", "datacite"],
        "supported_extensions": ["csv", "json"],
        "vocabularies": {
            "LibraryOfCongress": {"base_uri": "http://id.loc.gov/authorities/subjects"},
            "COAR_resource_types": {"base_uri": "http://purl.org/coar/resource_type"},
            "spdx": {
                "base_uri": "https://spdx.org/licenses/",
                "reference_list": "spdx",
                "remote_url": "https://spdx.org/licenses/licenses.json"
            },
            "iana_media_types": {"reference_list": "iana_media_types"},
            "fairsharing_standards": {"reference_list": "fairsharing_standards"}
        },
        "license_vocabulary": "spdx",
        "format_vocabulary": "iana_media_types",
        "standards_vocabulary": "fairsharing_standards"
    })
}

pub(super) fn rule_config(profile: &str, overrides: Value) -> Arc<RuleConfig> {
    Arc::new(RuleConfig::resolve(profile, &global_document(), &overrides).expect("test config resolves"))
}

pub(super) fn default_config() -> Arc<RuleConfig> {
    rule_config("test", json!({}))
}

/// Run one implementation synchronously against a fresh index and matcher.
pub(super) fn run_with(
    implementation: IndicatorFn,
    indicator: IndicatorId,
    collection: &MetadataCollection,
    config: &RuleConfig,
    matcher: &VocabularyMatcher,
) -> IndicatorOutcome {
    matcher.seed(config);
    let index = MetadataIndex::build(collection);
    let sink = DiagnosticSink::new();
    let ctx = IndicatorContext {
        indicator,
        index: &index,
        config,
        vocabulary: matcher,
        harvest: collection.harvest(),
        sink: &sink,
    };
    implementation(&ctx).expect("indicator succeeds")
}

pub(super) fn run_default(
    indicator: IndicatorId,
    collection: &MetadataCollection,
    config: &RuleConfig,
) -> IndicatorOutcome {
    run_with(
        crate::evaluation::default_rule(indicator),
        indicator,
        collection,
        config,
        &VocabularyMatcher::new(),
    )
}

pub(super) fn engine() -> EvaluationEngine {
    EvaluationEngine::new(IndicatorRegistry::standard(), Arc::new(VocabularyMatcher::new()))
}

pub(super) fn rich_record() -> MetadataCollection {
    collection(vec![
        statement("identifier", Some("doi"), "10.20350/digitalCSIC/8537"),
        statement("identifier", Some("uri"), "http://hdl.handle.net/10261/157765"),
        statement("title", None, "Soil temperature series"),
        statement("creator", None, "García, Ana"),
        statement("date", Some("issued"), "2017-11-02"),
        statement("subject", None, "http://id.loc.gov/authorities/subjects/sh85124341"),
        statement("subject", None, "Soil temperature"),
        statement("rights", Some("accessrights"), "openAccess"),
        statement("rights", Some("uri"), "https://spdx.org/licenses/CC-BY-4.0.html"),
        statement(
            "relation",
            Some("haspart"),
            "https://digital.csic.es/bitstream/10261/157765/1/soil_temperature.csv",
        ),
        statement("format", Some("mimetype"), "text/csv"),
        statement("description", Some("provenance"), "Submitted by Ana García"),
    ])
}
