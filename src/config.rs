use crate::error::SwitchError;
use crate::fetcher::DEFAULT_TIMEOUT;
use crate::resources::filename_from_url;
use crate::types::ResourceEntry;
use log::debug;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

pub const RESOURCE_PLACEHOLDER: &str = "{{resource}}";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchConfig {
    #[serde(default)]
    pub download_local: bool,
    #[serde(default)]
    pub link_local: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub blocks: BTreeMap<String, BlockConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockConfig {
    pub download_path: PathBuf,
    /// Prefix written into local-mode markup. Defaults to `download_path`.
    #[serde(default)]
    pub local_ref_path: Option<String>,
    pub html: String,
    pub resources: Vec<ResourceEntry>,
    #[serde(default)]
    pub injections: Vec<String>,
}

/// A block paired with its name, as handed to the reconciler and the markup layer.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    pub name: &'a str,
    pub config: &'a BlockConfig,
}

/// `vendor`, `./vendor` and `vendor/` all name the same directory.
fn lexical_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl BlockConfig {
    pub fn local_ref_path(&self) -> String {
        match &self.local_ref_path {
            Some(p) => p.trim_end_matches('/').to_string(),
            None => self.download_path.to_string_lossy().trim_end_matches('/').to_string(),
        }
    }
}

impl SwitchConfig {
    pub async fn load(path: &Path) -> Result<Self, SwitchError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let config = Self::from_json(&contents)?;
        debug!("Loaded {} blocks from {}", config.blocks.len(), path.display());
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self, SwitchError> {
        let config: SwitchConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn blocks(&self) -> impl Iterator<Item = Block<'_>> {
        self.blocks.iter().map(|(name, config)| Block { name, config })
    }

    /// Checks that need the whole configuration. Per-block resource checks run
    /// at reconciliation so one broken block does not stop its siblings.
    fn validate(&self) -> Result<(), SwitchError> {
        if self.blocks.is_empty() {
            return Err(SwitchError::Config("no blocks defined".into()));
        }
        if self.timeout_secs == 0 {
            return Err(SwitchError::Config("timeout_secs must be positive".into()));
        }

        let mut owners: HashMap<(PathBuf, &str), &str> = HashMap::new();
        for block in self.blocks() {
            if !block.config.html.contains(RESOURCE_PLACEHOLDER) {
                return Err(SwitchError::Config(format!(
                    "block '{}': html template has no {} placeholder",
                    block.name, RESOURCE_PLACEHOLDER
                )));
            }

            for entry in &block.config.resources {
                let filename = match entry {
                    ResourceEntry::Url(url) => filename_from_url(url),
                    ResourceEntry::Descriptor(d) => d.filename.as_str(),
                };
                let key = (lexical_dir(&block.config.download_path), filename);
                if let Some(other) = owners.insert(key, block.name) {
                    if other != block.name {
                        return Err(SwitchError::Config(format!(
                            "blocks '{}' and '{}' both write '{}' into {}",
                            other,
                            block.name,
                            filename,
                            block.config.download_path.display()
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "download_local": true,
        "blocks": {
            "js": {
                "download_path": "build/vendor/js/",
                "html": "<script src=\"{{resource}}\"></script>",
                "resources": [
                    "https://cdn.example/app.js",
                    {"url": "https://cdn.example/x/lib.min.js", "filename": "lib.js"}
                ],
                "injections": ["<script>init()</script>"]
            },
            "css": {
                "download_path": "build/vendor/css",
                "local_ref_path": "/vendor/css/",
                "html": "<link rel=\"stylesheet\" href=\"{{resource}}\">",
                "resources": ["https://cdn.example/site.css"]
            }
        }
    }"#;

    #[test]
    fn parses_with_defaults() {
        let config = SwitchConfig::from_json(SAMPLE).unwrap();
        assert!(config.download_local);
        assert!(!config.link_local);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);

        let names: Vec<_> = config.blocks().map(|b| b.name).collect();
        assert_eq!(names, vec!["css", "js"]);

        let js = &config.blocks["js"];
        assert_eq!(js.resources.len(), 2);
        assert_eq!(js.local_ref_path(), "build/vendor/js");
        assert_eq!(config.blocks["css"].local_ref_path(), "/vendor/css");
        assert!(config.blocks["css"].injections.is_empty());
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = SwitchConfig::from_json(r#"{"blocks": {}, "punctuation": "."}"#).unwrap_err();
        assert!(matches!(err, SwitchError::Json(_)));
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let err = SwitchConfig::from_json(
            r#"{"blocks": {"js": {"download_path": "d", "html": "<script></script>", "resources": []}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SwitchError::Config(msg) if msg.contains("js")));
    }

    #[test]
    fn rejects_empty_blocks_and_zero_timeout() {
        assert!(SwitchConfig::from_json(r#"{"blocks": {}}"#).is_err());
        let err = SwitchConfig::from_json(
            r#"{"timeout_secs": 0, "blocks": {"a": {"download_path": "d", "html": "{{resource}}", "resources": []}}}"#,
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn rejects_blocks_sharing_a_cached_file() {
        let err = SwitchConfig::from_json(
            r#"{"blocks": {
                "a": {"download_path": "shared", "html": "{{resource}}", "resources": ["https://x.example/app.js"]},
                "b": {"download_path": "shared", "html": "{{resource}}", "resources": ["https://y.example/app.js"]}
            }}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SwitchError::Config(msg) if msg.contains("app.js")));
    }

    #[test]
    fn duplicates_within_one_block_are_left_to_reconciliation() {
        let config = SwitchConfig::from_json(
            r#"{"blocks": {
                "a": {"download_path": "d", "html": "{{resource}}",
                      "resources": ["https://x.example/app.js", "https://y.example/app.js"]}
            }}"#,
        );
        assert!(config.is_ok());
    }

    #[test]
    fn shared_cache_detected_through_dot_segments() {
        let err = SwitchConfig::from_json(
            r#"{"blocks": {
                "a": {"download_path": "vendor", "html": "{{resource}}", "resources": ["https://x.example/app.js"]},
                "b": {"download_path": "./vendor/", "html": "{{resource}}", "resources": ["https://y.example/app.js"]}
            }}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SwitchError::Config(msg) if msg.contains("app.js")));
    }
}
