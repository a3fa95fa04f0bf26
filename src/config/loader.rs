use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use super::rules::{ConfigError, RuleConfig};

const GLOBAL_DOCUMENT: &str = "global.json";
const PROFILES_DIR: &str = "profiles";

/// Reads `global.json` and `profiles/<profile>.json` from a configuration directory.
#[derive(Debug, Clone)]
pub struct RuleConfigLoader {
    dir: PathBuf,
}

impl RuleConfigLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve the named profile against the global document. A missing global
    /// document is treated as empty; a missing profile is an error.
    pub fn load(&self, profile: &str) -> Result<RuleConfig, ConfigError> {
        let profile_path = self.profile_path(profile)?;
        let global_path = self.dir.join(GLOBAL_DOCUMENT);

        let global = match read_document(&global_path) {
            Ok(document) => document,
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!(path = %global_path.display(), "no global rule document, using profile only");
                Value::Null
            }
            Err(err) => return Err(err),
        };

        let profile_document = match read_document(&profile_path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::UnknownProfile {
                    profile: profile.to_string(),
                    dir: self.dir.join(PROFILES_DIR),
                })
            }
            other => other?,
        };

        let config = RuleConfig::resolve_named(
            profile,
            &global,
            &global_path.display().to_string(),
            &profile_document,
            &profile_path.display().to_string(),
        )?;

        info!(profile, dir = %self.dir.display(), "loaded rule configuration");
        Ok(config)
    }

    /// Profile names available under `profiles/`, sorted.
    pub fn profiles(&self) -> Result<Vec<String>, ConfigError> {
        let dir = self.dir.join(PROFILES_DIR);
        let entries = fs::read_dir(&dir).map_err(|source| ConfigError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut profiles = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ConfigError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                profiles.push(stem.to_string());
            }
        }
        profiles.sort();
        Ok(profiles)
    }

    fn profile_path(&self, profile: &str) -> Result<PathBuf, ConfigError> {
        let valid = !profile.is_empty()
            && profile
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
        if !valid {
            return Err(ConfigError::UnknownProfile {
                profile: profile.to_string(),
                dir: self.dir.join(PROFILES_DIR),
            });
        }
        Ok(self.dir.join(PROFILES_DIR).join(format!("{profile}.json")))
    }
}

fn read_document(path: &Path) -> Result<Value, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, contents).expect("write document");
    }

    #[test]
    fn loads_profile_over_global_document() {
        let temp = TempDir::new().expect("temp dir");
        write(
            temp.path(),
            "global.json",
            r#"{"generic_rules": [["title", null]], "access_protocols": ["http"]}"#,
        );
        write(
            temp.path(),
            "profiles/oai-pmh.json",
            r#"{"generic_rules": [["title", null], ["creator", null]]}"#,
        );

        let loader = RuleConfigLoader::new(temp.path());
        let config = loader.load("oai-pmh").expect("profile loads");

        assert_eq!(config.profile, "oai-pmh");
        assert_eq!(config.generic_rules.len(), 2);
        assert!(config.access_protocols.contains("http"));
        assert_eq!(loader.profiles().expect("lists"), vec!["oai-pmh".to_string()]);
    }

    #[test]
    fn missing_profile_is_reported_by_name() {
        let temp = TempDir::new().expect("temp dir");
        write(temp.path(), "profiles/ai4os.json", "{}");

        match RuleConfigLoader::new(temp.path()).load("dspace7") {
            Err(ConfigError::UnknownProfile { profile, .. }) => assert_eq!(profile, "dspace7"),
            other => panic!("expected unknown profile, got {other:?}"),
        }
        assert!(matches!(
            RuleConfigLoader::new(temp.path()).load("../ai4os"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn error_paths_name_the_offending_file() {
        let temp = TempDir::new().expect("temp dir");
        write(temp.path(), "profiles/broken.json", r#"{"cv_rules": [["subject", 7]]}"#);

        match RuleConfigLoader::new(temp.path()).load("broken") {
            Err(ConfigError::InvalidRule { path }) => {
                assert!(path.ends_with("broken.json: cv_rules[0]"), "path was {path}")
            }
            other => panic!("expected invalid rule, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let temp = TempDir::new().expect("temp dir");
        write(temp.path(), "global.json", "{ not json");
        write(temp.path(), "profiles/p.json", "{}");

        assert!(matches!(
            RuleConfigLoader::new(temp.path()).load("p"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
