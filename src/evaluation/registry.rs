use std::collections::BTreeMap;

use super::indicator::IndicatorId;
use super::profiles;
use super::rules::default_rule;
use super::IndicatorFn;

/// Maps `(profile, indicator)` to an implementation, falling back to the
/// generic implementation when a profile does not override an indicator.
#[derive(Clone, Default)]
pub struct IndicatorRegistry {
    overrides: BTreeMap<(String, IndicatorId), IndicatorFn>,
}

impl IndicatorRegistry {
    /// Generic implementations only.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Generic implementations plus the overrides bundled for known repositories.
    pub fn standard() -> Self {
        let mut registry = Self::with_defaults();
        profiles::register(&mut registry);
        registry
    }

    /// Replace `indicator` for `profile`. A later registration wins.
    pub fn register_override(&mut self, profile: impl Into<String>, indicator: IndicatorId, implementation: IndicatorFn) {
        self.overrides.insert((profile.into(), indicator), implementation);
    }

    pub fn resolve(&self, profile: &str, indicator: IndicatorId) -> IndicatorFn {
        self.overrides
            .get(&(profile.to_string(), indicator))
            .copied()
            .unwrap_or_else(|| default_rule(indicator))
    }

    pub fn is_overridden(&self, profile: &str, indicator: IndicatorId) -> bool {
        self.overrides.contains_key(&(profile.to_string(), indicator))
    }

    /// Indicators `profile` overrides, in catalog order.
    pub fn overrides_for(&self, profile: &str) -> Vec<IndicatorId> {
        self.overrides
            .keys()
            .filter(|(owner, _)| owner == profile)
            .map(|(_, indicator)| *indicator)
            .collect()
    }

    /// Profiles with at least one override.
    pub fn profiles(&self) -> Vec<&str> {
        let mut profiles: Vec<&str> = self.overrides.keys().map(|(owner, _)| owner.as_str()).collect();
        profiles.dedup();
        profiles
    }
}

impl std::fmt::Debug for IndicatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorRegistry")
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}
