use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::vocabulary::bundled_snapshot;

/// A `(term, qualifier)` pair; a `None` qualifier matches any or no qualifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TermRule {
    pub term: String,
    pub qualifier: Option<String>,
}

impl TermRule {
    pub fn new(term: impl Into<String>, qualifier: Option<&str>) -> Self {
        Self {
            term: term.into(),
            qualifier: qualifier.map(str::to_string),
        }
    }
}

impl fmt::Display for TermRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}[{}]", self.term, qualifier),
            None => write!(f, "{}", self.term),
        }
    }
}

/// Closed set of term rules. Duplicates collapse; declaration order is kept for messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<TermRule>,
}

impl RuleSet {
    pub fn from_rules(rules: impl IntoIterator<Item = TermRule>) -> Self {
        let mut set = Self::default();
        for rule in rules {
            set.insert(rule);
        }
        set
    }

    fn insert(&mut self, rule: TermRule) {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
    }

    pub fn union(&self, other: &RuleSet) -> RuleSet {
        Self::from_rules(self.rules.iter().chain(other.rules.iter()).cloned())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TermRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains(&self, rule: &TermRule) -> bool {
        self.rules.contains(rule)
    }

    /// Comma separated rendering used in indicator messages.
    pub fn describe(&self) -> String {
        self.rules
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// How values of one controlled vocabulary are recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocabularyDescriptor {
    pub name: String,
    pub base_uri: Option<String>,
    pub reference_list: Option<String>,
    pub remote_url: Option<String>,
}

impl VocabularyDescriptor {
    pub fn with_base_uri(name: impl Into<String>, base_uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_uri: Some(base_uri.into()),
            reference_list: None,
            remote_url: None,
        }
    }

    pub fn with_reference_list(name: impl Into<String>, reference_list: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_uri: None,
            reference_list: Some(reference_list.into()),
            remote_url: None,
        }
    }
}

/// Resolved, validated rule configuration for one repository profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleConfig {
    pub profile: String,
    pub identifier_rules: RuleSet,
    pub data_identifier_rules: RuleSet,
    pub generic_rules: RuleSet,
    pub discipline_rules: RuleSet,
    pub access_rules: RuleSet,
    pub cv_rules: RuleSet,
    pub reference_rules: RuleSet,
    pub relation_rules: RuleSet,
    pub license_rules: RuleSet,
    pub reusability_rules: RuleSet,
    pub provenance_rules: RuleSet,
    pub format_rules: RuleSet,
    pub access_protocols: BTreeSet<String>,
    pub metadata_standards: BTreeSet<String>,
    pub supported_extensions: BTreeSet<String>,
    pub vocabularies: BTreeMap<String, VocabularyDescriptor>,
    pub term_vocabularies: BTreeMap<String, Vec<String>>,
    pub license_vocabulary: Option<String>,
    pub format_vocabulary: Option<String>,
    pub standards_vocabulary: Option<String>,
    pub metadata_persistence_policy: Option<String>,
    pub preservation_policy: Option<String>,
}

/// Rejections raised while resolving rule configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{source_name}: configuration document must be a JSON object")]
    NotAnObject { source_name: String },
    #[error("{path}: expected a list of term rules")]
    InvalidRuleSet { path: String },
    #[error("{path}: expected \"term\", [term, qualifier] or {{\"term\", \"qualifier\"}}")]
    InvalidRule { path: String },
    #[error("{path}: expected {expected}")]
    InvalidField { path: String, expected: &'static str },
    #[error("{path}: vocabulary '{name}' has no resolvable base URI or reference list")]
    UnresolvableVocabulary { path: String, name: String },
    #[error("{path}: vocabulary '{name}' is not declared under 'vocabularies'")]
    UndefinedVocabulary { path: String, name: String },
    #[error("unknown repository profile '{profile}' (looked in {dir})")]
    UnknownProfile { profile: String, dir: PathBuf },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

const RULE_SET_KEYS: [&str; 12] = [
    "identifier_rules",
    "data_identifier_rules",
    "generic_rules",
    "discipline_rules",
    "access_rules",
    "cv_rules",
    "reference_rules",
    "relation_rules",
    "license_rules",
    "reusability_rules",
    "provenance_rules",
    "format_rules",
];

const OTHER_KEYS: [&str; 10] = [
    "access_protocols",
    "metadata_standards",
    "supported_extensions",
    "vocabularies",
    "term_vocabularies",
    "license_vocabulary",
    "format_vocabulary",
    "standards_vocabulary",
    "metadata_persistence_policy",
    "preservation_policy",
];

/// Merged document plus the source each key came from, for error paths.
struct MergedDocument {
    values: Map<String, Value>,
    origins: BTreeMap<String, String>,
}

impl MergedDocument {
    fn path(&self, key: &str) -> String {
        let origin = self
            .origins
            .get(key)
            .map(String::as_str)
            .unwrap_or("config");
        format!("{origin}: {key}")
    }

    fn vocabulary_path(&self, name: &str) -> String {
        let origin = self
            .origins
            .get(&format!("vocabularies.{name}"))
            .map(String::as_str)
            .unwrap_or("config");
        format!("{origin}: vocabularies.{name}")
    }
}

fn as_object<'a>(document: &'a Value, source_name: &str) -> Result<&'a Map<String, Value>, ConfigError> {
    match document {
        Value::Object(map) => Ok(map),
        Value::Null => {
            static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
            Ok(EMPTY.get_or_init(Map::new))
        }
        _ => Err(ConfigError::NotAnObject {
            source_name: source_name.to_string(),
        }),
    }
}

fn merge(
    global: &Value,
    global_name: &str,
    profile: &Value,
    profile_name: &str,
) -> Result<MergedDocument, ConfigError> {
    let global = as_object(global, global_name)?;
    let profile = as_object(profile, profile_name)?;

    let mut values = Map::new();
    let mut origins = BTreeMap::new();
    let mut vocabularies = Map::new();

    for (source, document) in [(global_name, global), (profile_name, profile)] {
        for (key, value) in document {
            if key == "vocabularies" {
                let Value::Object(entries) = value else {
                    return Err(ConfigError::InvalidField {
                        path: format!("{source}: vocabularies"),
                        expected: "an object of vocabulary descriptors",
                    });
                };
                for (name, descriptor) in entries {
                    vocabularies.insert(name.clone(), descriptor.clone());
                    origins.insert(format!("vocabularies.{name}"), source.to_string());
                }
                origins.insert(key.clone(), source.to_string());
                continue;
            }
            values.insert(key.clone(), value.clone());
            origins.insert(key.clone(), source.to_string());
        }
    }

    if !vocabularies.is_empty() {
        values.insert("vocabularies".to_string(), Value::Object(vocabularies));
    }

    Ok(MergedDocument { values, origins })
}

impl RuleConfig {
    /// Resolve the global and profile documents into a validated configuration.
    pub fn resolve(profile: &str, global: &Value, profile_document: &Value) -> Result<Self, ConfigError> {
        Self::resolve_named(profile, global, "global", profile_document, &format!("profile '{profile}'"))
    }

    pub(crate) fn resolve_named(
        profile: &str,
        global: &Value,
        global_name: &str,
        profile_document: &Value,
        profile_name: &str,
    ) -> Result<Self, ConfigError> {
        let merged = merge(global, global_name, profile_document, profile_name)?;

        for key in merged.values.keys() {
            if !RULE_SET_KEYS.contains(&key.as_str()) && !OTHER_KEYS.contains(&key.as_str()) {
                debug!(profile, key = key.as_str(), "ignoring unknown configuration key");
            }
        }

        let rule_set = |key: &str| parse_rule_set(merged.values.get(key), &merged.path(key));
        let string_set = |key: &str, normalize: fn(&str) -> String| {
            parse_string_set(merged.values.get(key), &merged.path(key), normalize)
        };
        let optional = |key: &str| parse_optional_string(merged.values.get(key), &merged.path(key));

        let vocabularies = parse_vocabularies(&merged)?;

        let mut config = RuleConfig {
            profile: profile.to_string(),
            identifier_rules: rule_set("identifier_rules")?,
            data_identifier_rules: rule_set("data_identifier_rules")?,
            generic_rules: rule_set("generic_rules")?,
            discipline_rules: rule_set("discipline_rules")?,
            access_rules: rule_set("access_rules")?,
            cv_rules: rule_set("cv_rules")?,
            reference_rules: rule_set("reference_rules")?,
            relation_rules: rule_set("relation_rules")?,
            license_rules: rule_set("license_rules")?,
            reusability_rules: rule_set("reusability_rules")?,
            provenance_rules: rule_set("provenance_rules")?,
            format_rules: rule_set("format_rules")?,
            access_protocols: string_set("access_protocols", |value| value.to_ascii_lowercase())?,
            metadata_standards: string_set("metadata_standards", str::to_string)?,
            supported_extensions: string_set("supported_extensions", |value| {
                value.trim_start_matches('.').to_ascii_lowercase()
            })?,
            vocabularies,
            term_vocabularies: BTreeMap::new(),
            license_vocabulary: optional("license_vocabulary")?,
            format_vocabulary: optional("format_vocabulary")?,
            standards_vocabulary: optional("standards_vocabulary")?,
            metadata_persistence_policy: optional("metadata_persistence_policy")?,
            preservation_policy: optional("preservation_policy")?,
        };

        config.term_vocabularies = parse_term_vocabularies(&merged, &config.vocabularies)?;

        for key in ["license_vocabulary", "format_vocabulary", "standards_vocabulary"] {
            let declared = match key {
                "license_vocabulary" => config.license_vocabulary.as_deref(),
                "format_vocabulary" => config.format_vocabulary.as_deref(),
                _ => config.standards_vocabulary.as_deref(),
            };
            if let Some(name) = declared {
                if !config.vocabularies.contains_key(name) {
                    return Err(ConfigError::UndefinedVocabulary {
                        path: merged.path(key),
                        name: name.to_string(),
                    });
                }
            }
        }

        debug!(
            profile,
            vocabularies = config.vocabularies.len(),
            cv_rules = config.cv_rules.len(),
            "resolved rule configuration"
        );

        Ok(config)
    }

    /// Vocabularies that apply to values of `rule`: the term-specific list when one
    /// is declared, every declared vocabulary otherwise.
    pub fn vocabularies_for(&self, rule: &TermRule) -> Vec<&VocabularyDescriptor> {
        match self.term_vocabularies.get(&rule.term) {
            Some(names) => names
                .iter()
                .filter_map(|name| self.vocabularies.get(name))
                .collect(),
            None => self.vocabularies.values().collect(),
        }
    }
}

fn parse_rule_set(value: Option<&Value>, path: &str) -> Result<RuleSet, ConfigError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(RuleSet::default()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ConfigError::InvalidRuleSet {
                path: path.to_string(),
            })
        }
    };

    let mut rules = RuleSet::default();
    for (idx, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{idx}]");
        rules.insert(parse_rule(item, &item_path)?);
    }
    Ok(rules)
}

fn parse_rule(value: &Value, path: &str) -> Result<TermRule, ConfigError> {
    let invalid = || ConfigError::InvalidRule {
        path: path.to_string(),
    };
    let non_empty = |term: &str| -> Result<String, ConfigError> {
        let term = term.trim();
        if term.is_empty() {
            Err(invalid())
        } else {
            Ok(term.to_string())
        }
    };
    let qualifier = |value: Option<&Value>| -> Result<Option<String>, ConfigError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
            Some(Value::String(raw)) => Ok(Some(raw.trim().to_string())),
            Some(_) => Err(invalid()),
        }
    };

    match value {
        Value::String(term) => Ok(TermRule {
            term: non_empty(term)?,
            qualifier: None,
        }),
        Value::Array(pair) if (1..=2).contains(&pair.len()) => match pair.first() {
            Some(Value::String(term)) => Ok(TermRule {
                term: non_empty(term)?,
                qualifier: qualifier(pair.get(1))?,
            }),
            _ => Err(invalid()),
        },
        Value::Object(fields) => match fields.get("term") {
            Some(Value::String(term)) => Ok(TermRule {
                term: non_empty(term)?,
                qualifier: qualifier(fields.get("qualifier"))?,
            }),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

fn parse_string_set(
    value: Option<&Value>,
    path: &str,
    normalize: fn(&str) -> String,
) -> Result<BTreeSet<String>, ConfigError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(BTreeSet::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ConfigError::InvalidField {
                path: path.to_string(),
                expected: "a list of strings",
            })
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::String(raw) if !raw.trim().is_empty() => Ok(normalize(raw.trim())),
            _ => Err(ConfigError::InvalidField {
                path: format!("{path}[{idx}]"),
                expected: "a non-empty string",
            }),
        })
        .collect()
}

fn parse_optional_string(value: Option<&Value>, path: &str) -> Result<Option<String>, ConfigError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => Ok(Some(raw.trim().to_string())),
        Some(_) => Err(ConfigError::InvalidField {
            path: path.to_string(),
            expected: "a string",
        }),
    }
}

fn parse_vocabularies(
    merged: &MergedDocument,
) -> Result<BTreeMap<String, VocabularyDescriptor>, ConfigError> {
    let Some(Value::Object(entries)) = merged.values.get("vocabularies") else {
        return Ok(BTreeMap::new());
    };

    let mut vocabularies = BTreeMap::new();
    for (name, entry) in entries {
        let path = merged.vocabulary_path(name);
        let descriptor = match entry {
            Value::String(base_uri) => VocabularyDescriptor {
                name: name.clone(),
                base_uri: Some(base_uri.trim().to_string()).filter(|uri| !uri.is_empty()),
                reference_list: None,
                remote_url: None,
            },
            Value::Object(fields) => VocabularyDescriptor {
                name: name.clone(),
                base_uri: parse_optional_string(fields.get("base_uri"), &format!("{path}.base_uri"))?,
                reference_list: parse_optional_string(
                    fields.get("reference_list"),
                    &format!("{path}.reference_list"),
                )?,
                remote_url: parse_optional_string(
                    fields.get("remote_url"),
                    &format!("{path}.remote_url"),
                )?,
            },
            _ => {
                return Err(ConfigError::InvalidField {
                    path,
                    expected: "a base URI string or a vocabulary descriptor object",
                })
            }
        };

        let list_resolvable = descriptor.reference_list.as_deref().is_some_and(|list| {
            bundled_snapshot(list).is_some() || descriptor.remote_url.is_some()
        });
        if descriptor.base_uri.is_none() && !list_resolvable {
            return Err(ConfigError::UnresolvableVocabulary {
                path,
                name: name.clone(),
            });
        }

        vocabularies.insert(name.clone(), descriptor);
    }

    Ok(vocabularies)
}

fn parse_term_vocabularies(
    merged: &MergedDocument,
    vocabularies: &BTreeMap<String, VocabularyDescriptor>,
) -> Result<BTreeMap<String, Vec<String>>, ConfigError> {
    let path = merged.path("term_vocabularies");
    let entries = match merged.values.get("term_vocabularies") {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            return Err(ConfigError::InvalidField {
                path,
                expected: "an object mapping terms to vocabulary names",
            })
        }
    };

    let mut mapping = BTreeMap::new();
    for (term, names) in entries {
        let term_path = format!("{path}.{term}");
        let names = parse_string_set(Some(names), &term_path, str::to_string)?;
        for name in &names {
            if !vocabularies.contains_key(name) {
                return Err(ConfigError::UndefinedVocabulary {
                    path: term_path,
                    name: name.clone(),
                });
            }
        }
        mapping.insert(term.clone(), names.into_iter().collect());
    }
    Ok(mapping)
}
