use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::errors::{PurgeError, Result};
use crate::rules::{parse_extension_list, RuleSet};
use crate::volume::LocalVolume;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "FILEPURGE_CONFIG";

/// Global filepurge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Settings applied to every rule set before its own
    #[serde(default)]
    pub defaults: RuleConfig,

    /// Named storage roots, referenced by rule sets
    #[serde(default)]
    pub volumes: BTreeMap<String, PathBuf>,

    /// Named rule sets
    #[serde(default)]
    pub rule_sets: BTreeMap<String, RuleConfig>,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// One rule set as written in the config file. Every field is optional so
/// rule sets can be layered over `[defaults]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directories: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_empty_directory: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions_blacklist: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_old: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub older_than: Option<DateTime<Utc>>,
}

/// `"a,b"` or `["a", "b"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    /// Directory form: a single string is one path
    pub fn into_paths(self) -> Vec<String> {
        match self {
            StringOrList::One(path) => vec![path],
            StringOrList::Many(paths) => paths,
        }
    }

    /// Extension form: a single string is comma-separated
    pub fn into_extensions(self) -> Vec<String> {
        match self {
            StringOrList::One(list) => parse_extension_list(&list),
            StringOrList::Many(list) => list,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root of the file cache store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// A named rule set resolved against the config: rules plus volume binding.
#[derive(Debug, Clone)]
pub struct PurgeJob {
    pub name: String,
    pub rules: RuleSet,
    volume_name: Option<String>,
    volume_root: Option<PathBuf>,
}

impl PurgeJob {
    pub fn volume_name(&self) -> Option<&str> {
        self.volume_name.as_deref()
    }

    /// Open the bound volume. Fails when the rule set names no volume or
    /// names one that `[volumes]` does not declare.
    pub fn open_volume(&self) -> Result<LocalVolume> {
        match (&self.volume_name, &self.volume_root) {
            (None, _) => Err(PurgeError::NoVolume {
                rule_set: self.name.clone(),
            }),
            (Some(name), None) => Err(PurgeError::VolumeNotFound { name: name.clone() }),
            (Some(_), Some(root)) => Ok(LocalVolume::new(root)),
        }
    }
}

impl RuleConfig {
    /// Overlay `other` on top of `self`, field by field
    pub fn merged_with(&self, other: &RuleConfig) -> RuleConfig {
        RuleConfig {
            volume: other.volume.clone().or_else(|| self.volume.clone()),
            directories: other.directories.clone().or_else(|| self.directories.clone()),
            recursive: other.recursive.or(self.recursive),
            delete_empty_directory: other.delete_empty_directory.or(self.delete_empty_directory),
            extensions: other.extensions.clone().or_else(|| self.extensions.clone()),
            extensions_blacklist: other
                .extensions_blacklist
                .clone()
                .or_else(|| self.extensions_blacklist.clone()),
            minutes_old: other.minutes_old.or(self.minutes_old),
            older_than: other.older_than.or(self.older_than),
        }
    }

    /// Build the rule set. An explicit `older_than` wins over `minutes_old`.
    pub fn to_rule_set(&self) -> RuleSet {
        let mut builder = RuleSet::builder();

        if let Some(dirs) = &self.directories {
            builder = builder.directories(dirs.clone().into_paths());
        }
        if let Some(recursive) = self.recursive {
            builder = builder.recursive(recursive);
        }
        if let Some(delete_empty) = self.delete_empty_directory {
            builder = builder.delete_empty_directories(delete_empty);
        }
        if let Some(exts) = &self.extensions {
            builder = builder.extensions(exts.clone().into_extensions());
        }
        if let Some(exts) = &self.extensions_blacklist {
            builder = builder.extensions_blacklist(exts.clone().into_extensions());
        }
        if let Some(minutes) = self.minutes_old {
            builder = builder.minutes_old(minutes);
        }
        if let Some(cutoff) = self.older_than {
            builder = builder.older_than(cutoff);
        }

        builder.build()
    }
}

fn default_rule_config() -> RuleConfig {
    RuleConfig {
        volume: None,
        directories: Some(StringOrList::One("/".into())),
        recursive: Some(false),
        delete_empty_directory: Some(false),
        extensions: None,
        extensions_blacklist: Some(StringOrList::Many(vec![
            ".gitignore".into(),
            ".gitkeep".into(),
        ])),
        minutes_old: Some(60 * 24 * 365),
        older_than: None,
    }
}

impl Config {
    /// Get the filepurge data directory (~/.filepurge)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".filepurge")
    }

    /// Default config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Load from `path`, or return defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::template());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| PurgeError::io(path, e))?;
        Self::parse(&contents, path)
    }

    /// Parse TOML text; `origin` is only used in error messages
    pub fn parse(contents: &str, origin: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|e| PurgeError::ConfigError {
            path: origin.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    /// Config written by `config init`: built-in defaults, nothing else
    pub fn template() -> Self {
        Config {
            defaults: default_rule_config(),
            ..Config::default()
        }
    }

    /// Save config to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| PurgeError::io(dir, e))?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| PurgeError::ConfigError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, contents).map_err(|e| PurgeError::io(path, e))
    }

    /// Configured rule set names, in name order
    pub fn rule_set_names(&self) -> Vec<String> {
        self.rule_sets.keys().cloned().collect()
    }

    /// Resolve a named rule set: built-in defaults, then `[defaults]`,
    /// then the rule set's own fields.
    pub fn job(&self, name: &str) -> Result<PurgeJob> {
        let own = self
            .rule_sets
            .get(name)
            .ok_or_else(|| PurgeError::RuleSetNotFound {
                name: name.to_string(),
            })?;

        let merged = default_rule_config()
            .merged_with(&self.defaults)
            .merged_with(own);

        let volume_root = merged
            .volume
            .as_ref()
            .and_then(|volume| self.volumes.get(volume))
            .cloned();

        Ok(PurgeJob {
            name: name.to_string(),
            rules: merged.to_rule_set(),
            volume_name: merged.volume,
            volume_root,
        })
    }

    /// Cache directory: the explicit override, else `[cache].path`
    pub fn cache_dir(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.cache.path.clone())
            .ok_or(PurgeError::NoCacheDirectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[defaults]
extensions_blacklist = [".gitignore"]
minutes_old = 10

[volumes]
local = "/srv/storage"

[rule_sets.logs]
volume = "local"
directories = ["/*/filters/", "/*/products/"]
extensions = "log, TXT"
recursive = true

[rule_sets.orphan]
directories = "tmp"

[rule_sets.dangling]
volume = "remote"

[rule_sets.pinned]
volume = "local"
minutes_old = 5
older_than = "2020-01-01T00:00:00Z"

[cache]
path = "/srv/storage/framework/cache"
"#;

    fn sample() -> Config {
        Config::parse(SAMPLE, Path::new("sample.toml")).unwrap()
    }

    #[test]
    fn test_rule_set_layering() {
        let job = sample().job("logs").unwrap();
        let rules = &job.rules;
        assert_eq!(rules.directories(), &["/*/filters/", "/*/products/"]);
        assert!(rules.recursive());
        assert!(!rules.delete_empty_directories());
        let allow: Vec<_> = rules.extension_allow().unwrap().iter().cloned().collect();
        assert_eq!(allow, vec![".log", ".txt"]);
        let deny: Vec<_> = rules.extension_deny().unwrap().iter().cloned().collect();
        assert_eq!(deny, vec![".gitignore"]);
        assert_eq!(job.volume_name(), Some("local"));
        assert_eq!(job.open_volume().unwrap().root(), Path::new("/srv/storage"));
    }

    #[test]
    fn test_single_directory_string() {
        let job = sample().job("orphan").unwrap();
        assert_eq!(job.rules.directories(), &["tmp"]);
    }

    #[test]
    fn test_older_than_wins() {
        let job = sample().job("pinned").unwrap();
        assert_eq!(
            job.rules.older_than(),
            DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z").unwrap()
        );
    }

    #[test]
    fn test_missing_volume_binding() {
        let config = sample();
        assert!(matches!(
            config.job("orphan").unwrap().open_volume(),
            Err(PurgeError::NoVolume { .. })
        ));
        assert!(matches!(
            config.job("dangling").unwrap().open_volume(),
            Err(PurgeError::VolumeNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_rule_set() {
        let err = sample().job("nope").unwrap_err();
        assert!(matches!(err, PurgeError::RuleSetNotFound { ref name } if name == "nope"));
    }

    #[test]
    fn test_rule_set_names_sorted() {
        assert_eq!(
            sample().rule_set_names(),
            vec!["dangling", "logs", "orphan", "pinned"]
        );
    }

    #[test]
    fn test_cache_dir() {
        let config = sample();
        assert_eq!(
            config.cache_dir(None).unwrap(),
            PathBuf::from("/srv/storage/framework/cache")
        );
        assert_eq!(
            config.cache_dir(Some(Path::new("/other"))).unwrap(),
            PathBuf::from("/other")
        );
        assert!(matches!(
            Config::default().cache_dir(None),
            Err(PurgeError::NoCacheDirectory)
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::parse("rule_sets = 3", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, PurgeError::ConfigError { .. }));
    }

    #[test]
    fn test_template_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested/config.toml");
        Config::template().save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.defaults, default_rule_config());
        assert!(loaded.rule_sets.is_empty());
    }

    #[test]
    fn test_missing_file_gives_template() {
        let config = Config::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.defaults.minutes_old, Some(60 * 24 * 365));
    }
}
