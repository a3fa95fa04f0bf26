//! Controlled-vocabulary recognition.
//!
//! A value is controlled when it carries a vocabulary's base URI or equals an
//! item of its reference list. Reference lists start from the bundled
//! snapshots and may be replaced by a remote refresh; a failed refresh keeps
//! the snapshot and marks the vocabulary degraded.

mod remote;
mod snapshot;

pub use remote::{HttpReferenceFetcher, ReferenceFetcher};
pub use snapshot::bundled_snapshot;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{RuleConfig, VocabularyDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum VocabularyError {
    #[error("failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} returned no usable reference items")]
    Body { url: String },
    #[error("reference list '{name}' unavailable after {attempts} attempts: {reason}")]
    Exhausted {
        name: String,
        attempts: u32,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceOrigin {
    Snapshot,
    Remote,
}

#[derive(Debug, Clone)]
struct ReferenceEntry {
    items: BTreeSet<String>,
    origin: ReferenceOrigin,
    degraded: bool,
    refreshed_at: Option<DateTime<Utc>>,
}

impl ReferenceEntry {
    fn from_snapshot(list: &str) -> Self {
        Self {
            items: bundled_snapshot(list)
                .unwrap_or_default()
                .iter()
                .map(|item| normalize(item))
                .collect(),
            origin: ReferenceOrigin::Snapshot,
            degraded: false,
            refreshed_at: None,
        }
    }
}

/// A successful classification of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyMatch {
    pub vocabulary: String,
    /// Set when the deciding reference list is a fallback snapshot after a failed refresh.
    pub degraded: bool,
}

/// Answer for one value. `degraded` names every consulted reference list that
/// is served from a fallback snapshot, whether or not the value matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyAnswer {
    pub found: Option<VocabularyMatch>,
    pub degraded: BTreeSet<String>,
}

impl VocabularyAnswer {
    pub fn is_controlled(&self) -> bool {
        self.found.is_some()
    }
}

/// Reported per reference list by [`VocabularyMatcher::status`].
#[derive(Debug, Clone, Serialize)]
pub struct VocabularyStatus {
    pub vocabulary: String,
    pub origin: ReferenceOrigin,
    pub items: usize,
    pub degraded: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Shared, read-mostly matcher. Readers clone the current table; writers
/// copy the table under the write lock and swap the copy in.
#[derive(Debug, Default)]
pub struct VocabularyMatcher {
    entries: RwLock<Arc<HashMap<String, ReferenceEntry>>>,
    refreshing: tokio::sync::Mutex<()>,
}

impl VocabularyMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed reference lists for every vocabulary of `config` from the bundled snapshots.
    pub fn from_config(config: &RuleConfig) -> Self {
        let matcher = Self::new();
        matcher.seed(config);
        matcher
    }

    /// Add snapshot entries for vocabularies not seen yet. Existing entries are kept.
    pub fn seed(&self, config: &RuleConfig) {
        let mut guard = self.entries.write();
        let mut table = HashMap::clone(&guard);
        for descriptor in config.vocabularies.values() {
            if let Some(list) = descriptor.reference_list.as_deref() {
                table
                    .entry(descriptor.name.clone())
                    .or_insert_with(|| ReferenceEntry::from_snapshot(list));
            }
        }
        *guard = Arc::new(table);
    }

    /// Classify `value` against `descriptor`.
    pub fn classify(&self, value: &str, descriptor: &VocabularyDescriptor) -> VocabularyAnswer {
        self.is_controlled(value, &[descriptor])
    }

    /// First vocabulary among `descriptors` that controls `value`.
    pub fn is_controlled(&self, value: &str, descriptors: &[&VocabularyDescriptor]) -> VocabularyAnswer {
        let table = self.entries.read().clone();
        answer_with(&table, value, descriptors)
    }

    pub fn is_degraded(&self, vocabulary: &str) -> bool {
        self.entries
            .read()
            .get(vocabulary)
            .is_some_and(|entry| entry.degraded)
    }

    /// Refresh every reference list of `config` that declares a remote URL.
    /// Failures keep the snapshot and mark the vocabulary degraded. Fetched
    /// lists are merged into the table current at the end, so entries seeded
    /// meanwhile survive. Concurrent refreshes run one after the other.
    pub async fn refresh(&self, fetcher: &dyn ReferenceFetcher, config: &RuleConfig) -> Vec<VocabularyStatus> {
        let _refreshing = self.refreshing.lock().await;
        self.seed(config);

        let mut fetched = Vec::new();
        for descriptor in config.vocabularies.values() {
            let (Some(list), Some(url)) = (
                descriptor.reference_list.as_deref(),
                descriptor.remote_url.as_deref(),
            ) else {
                continue;
            };

            let entry = match fetcher.fetch(&descriptor.name, url).await {
                Ok(items) => {
                    info!(vocabulary = descriptor.name.as_str(), items = items.len(), "refreshed reference list");
                    ReferenceEntry {
                        items: items.iter().map(|item| normalize(item)).collect(),
                        origin: ReferenceOrigin::Remote,
                        degraded: false,
                        refreshed_at: Some(Utc::now()),
                    }
                }
                Err(err) => {
                    warn!(
                        vocabulary = descriptor.name.as_str(),
                        error = %err,
                        "reference list refresh failed, serving bundled snapshot"
                    );
                    let mut fallback = ReferenceEntry::from_snapshot(list);
                    fallback.degraded = true;
                    fallback
                }
            };
            fetched.push((descriptor.name.clone(), entry));
        }

        {
            let mut guard = self.entries.write();
            let mut table = HashMap::clone(&guard);
            table.extend(fetched);
            *guard = Arc::new(table);
        }
        self.status()
    }

    pub fn status(&self) -> Vec<VocabularyStatus> {
        let table = self.entries.read().clone();
        let mut status: Vec<VocabularyStatus> = table
            .iter()
            .map(|(name, entry)| VocabularyStatus {
                vocabulary: name.clone(),
                origin: entry.origin,
                items: entry.items.len(),
                degraded: entry.degraded,
                refreshed_at: entry.refreshed_at,
            })
            .collect();
        status.sort_by(|a, b| a.vocabulary.cmp(&b.vocabulary));
        status
    }
}

fn normalize(item: &str) -> String {
    item.trim().to_lowercase()
}

fn answer_with(
    table: &HashMap<String, ReferenceEntry>,
    value: &str,
    descriptors: &[&VocabularyDescriptor],
) -> VocabularyAnswer {
    let mut answer = VocabularyAnswer::default();
    let value = value.trim();
    if value.is_empty() {
        return answer;
    }
    let lowered = value.to_lowercase();
    let normalized = normalize(value);

    for descriptor in descriptors {
        let base_uri = descriptor
            .base_uri
            .as_deref()
            .map(|uri| uri.trim().to_lowercase())
            .filter(|uri| !uri.is_empty());
        if base_uri.is_some_and(|uri| lowered.contains(&uri)) {
            answer.found = Some(VocabularyMatch {
                vocabulary: descriptor.name.clone(),
                degraded: false,
            });
            return answer;
        }

        let Some(entry) = table.get(&descriptor.name) else {
            continue;
        };
        if entry.degraded {
            answer.degraded.insert(descriptor.name.clone());
        }
        if entry.items.contains(&normalized) {
            answer.found = Some(VocabularyMatch {
                vocabulary: descriptor.name.clone(),
                degraded: entry.degraded,
            });
            return answer;
        }
    }

    answer
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Notify;

    struct FailingFetcher;

    #[async_trait]
    impl ReferenceFetcher for FailingFetcher {
        async fn fetch(&self, name: &str, _url: &str) -> Result<Vec<String>, VocabularyError> {
            Err(VocabularyError::Exhausted {
                name: name.to_string(),
                attempts: 3,
                reason: "connection refused".to_string(),
            })
        }
    }

    struct StaticFetcher(Vec<&'static str>);

    #[async_trait]
    impl ReferenceFetcher for StaticFetcher {
        async fn fetch(&self, _name: &str, _url: &str) -> Result<Vec<String>, VocabularyError> {
            Ok(self.0.iter().map(|item| item.to_string()).collect())
        }
    }

    #[derive(Default)]
    struct GatedFetcher {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ReferenceFetcher for GatedFetcher {
        async fn fetch(&self, _name: &str, _url: &str) -> Result<Vec<String>, VocabularyError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(vec!["Custom-License-1.0".to_string()])
        }
    }

    fn config() -> RuleConfig {
        RuleConfig::resolve(
            "test",
            &json!({
                "vocabularies": {
                    "LibraryOfCongress": {"base_uri": "http://id.loc.gov/authorities/subjects"},
                    "spdx": {
                        "base_uri": "https://spdx.org/licenses/",
                        "reference_list": "spdx",
                        "remote_url": "https://spdx.org/licenses/licenses.json"
                    }
                }
            }),
            &json!({}),
        )
        .expect("config resolves")
    }

    #[test]
    fn base_uri_and_reference_items_control_values() {
        let config = config();
        let matcher = VocabularyMatcher::from_config(&config);
        let loc = &config.vocabularies["LibraryOfCongress"];
        let spdx = &config.vocabularies["spdx"];

        assert!(matcher
            .classify("http://id.loc.gov/authorities/subjects/sh85029027", loc)
            .is_controlled());
        assert!(!matcher.classify("Computer science", loc).is_controlled());
        assert!(matcher.classify("cc-by-4.0", spdx).is_controlled());
        assert!(!matcher.classify("", spdx).is_controlled());
        assert!(matcher.classify("cc-by-4.0", spdx).degraded.is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_serves_snapshot_as_degraded() {
        let config = config();
        let matcher = VocabularyMatcher::from_config(&config);

        let status = matcher.refresh(&FailingFetcher, &config).await;

        let spdx = status
            .iter()
            .find(|entry| entry.vocabulary == "spdx")
            .expect("spdx status");
        assert!(spdx.degraded);
        assert_eq!(spdx.origin, ReferenceOrigin::Snapshot);
        let answer = matcher.classify("MIT", &config.vocabularies["spdx"]);
        let found = answer.found.expect("snapshot still answers");
        assert!(found.degraded);
        assert!(answer.degraded.contains("spdx"));
        assert!(matcher.is_degraded("spdx"));
    }

    #[tokio::test]
    async fn successful_refresh_replaces_snapshot() {
        let config = config();
        let matcher = VocabularyMatcher::from_config(&config);

        matcher
            .refresh(&StaticFetcher(vec!["Custom-License-1.0"]), &config)
            .await;

        let spdx = &config.vocabularies["spdx"];
        assert!(matcher.classify("custom-license-1.0", spdx).is_controlled());
        assert!(!matcher.classify("MIT", spdx).is_controlled());
        assert!(!matcher.is_degraded("spdx"));
        assert!(matcher.status()[0].refreshed_at.is_some());
    }

    #[tokio::test]
    async fn unmatched_value_against_degraded_list_reports_degradation() {
        let config = config();
        let matcher = VocabularyMatcher::from_config(&config);
        matcher.refresh(&FailingFetcher, &config).await;

        let answer = matcher.classify("Some-New-License-2.0", &config.vocabularies["spdx"]);
        assert!(!answer.is_controlled());
        assert_eq!(answer.degraded, BTreeSet::from(["spdx".to_string()]));

        let loc = matcher.classify("Computer science", &config.vocabularies["LibraryOfCongress"]);
        assert!(loc.degraded.is_empty());
    }

    #[tokio::test]
    async fn seeding_during_refresh_is_kept() {
        let config = config();
        let iana = RuleConfig::resolve(
            "iana",
            &json!({"vocabularies": {"iana": {"reference_list": "iana_media_types"}}}),
            &json!({}),
        )
        .expect("iana config resolves");
        let matcher = Arc::new(VocabularyMatcher::from_config(&config));
        let fetcher = Arc::new(GatedFetcher::default());

        let refresh = tokio::spawn({
            let matcher = Arc::clone(&matcher);
            let fetcher = Arc::clone(&fetcher);
            let config = config.clone();
            async move { matcher.refresh(fetcher.as_ref(), &config).await }
        });

        fetcher.started.notified().await;
        matcher.seed(&iana);
        fetcher.release.notify_one();
        refresh.await.expect("refresh task completes");

        assert!(matcher.classify("text/csv", &iana.vocabularies["iana"]).is_controlled());
        assert!(matcher
            .classify("custom-license-1.0", &config.vocabularies["spdx"])
            .is_controlled());
        assert!(!matcher.classify("MIT", &config.vocabularies["spdx"]).is_controlled());
    }
}
