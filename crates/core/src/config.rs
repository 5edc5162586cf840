//! Packaging configuration.
//!
//! Read from a TOML file named by `$PDFA3PACK_CONFIG`, or from an explicit
//! path. Every field has a default, so an empty file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PackError, PackResult};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "PDFA3PACK_CONFIG";

/// `pdfa3pack <crate version>`, the default producer and creator tool.
pub fn default_producer() -> String {
    format!("pdfa3pack {}", env!("CARGO_PKG_VERSION"))
}

/// Top-level config, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackConfig {
    #[serde(default)]
    pub attachment: AttachmentConfig,

    #[serde(default)]
    pub document: DocumentConfig,

    #[serde(default)]
    pub output_intent: OutputIntentConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// `[attachment]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// Display name used when the caller passes a blank one.
    #[serde(default = "default_attachment_name")]
    pub default_name: String,

    #[serde(default = "default_mime_type")]
    pub mime_type: String,

    #[serde(default = "default_relationship")]
    pub relationship: String,

    /// Prepended to the display name to form `/Desc`.
    #[serde(default = "default_description_prefix")]
    pub description_prefix: String,

    /// Flate-compress the embedded payload.
    #[serde(default)]
    pub compress: bool,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            default_name: default_attachment_name(),
            mime_type: default_mime_type(),
            relationship: default_relationship(),
            description_prefix: default_description_prefix(),
            compress: false,
        }
    }
}

fn default_attachment_name() -> String {
    "invoice.xml".into()
}
fn default_mime_type() -> String {
    "application/xml".into()
}
fn default_relationship() -> String {
    "Data".into()
}
fn default_description_prefix() -> String {
    "Embedded UBL: ".into()
}

/// `[document]` section: values used for blank document info fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_author")]
    pub author: String,

    #[serde(default = "default_producer")]
    pub producer: String,

    #[serde(default = "default_producer")]
    pub creator_tool: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            author: default_author(),
            producer: default_producer(),
            creator_tool: default_producer(),
        }
    }
}

fn default_title() -> String {
    "PDF/A-3 with UBL".into()
}
fn default_author() -> String {
    "pdfa3pack".into()
}

/// `[output_intent]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputIntentConfig {
    /// ICC profile to embed instead of the built-in sRGB profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icc_profile_path: Option<PathBuf>,

    /// Fail instead of substituting the built-in profile when
    /// `icc_profile_path` is unset or unreadable.
    #[serde(default)]
    pub require_configured_profile: bool,

    #[serde(default = "default_output_condition")]
    pub output_condition: String,
}

impl Default for OutputIntentConfig {
    fn default() -> Self {
        Self {
            icc_profile_path: None,
            require_configured_profile: false,
            output_condition: default_output_condition(),
        }
    }
}

fn default_output_condition() -> String {
    "sRGB IEC61966-2.1".into()
}

/// `[validation]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Upper bound on a strict validation run, in seconds. 0 disables it.
    #[serde(default = "default_strict_timeout")]
    pub strict_timeout_secs: u64,

    /// Nesting limit for object graph walks.
    #[serde(default = "default_max_walk_depth")]
    pub max_walk_depth: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict_timeout_secs: default_strict_timeout(),
            max_walk_depth: default_max_walk_depth(),
        }
    }
}

impl ValidationConfig {
    pub fn strict_timeout(&self) -> Option<Duration> {
        (self.strict_timeout_secs > 0).then(|| Duration::from_secs(self.strict_timeout_secs))
    }
}

fn default_strict_timeout() -> u64 {
    30
}
fn default_max_walk_depth() -> usize {
    crate::graph::DEFAULT_MAX_DEPTH
}

impl PackConfig {
    /// Load from `$PDFA3PACK_CONFIG` when set, otherwise defaults.
    pub fn load() -> PackResult<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load_from(Path::new(&path)),
            _ => {
                tracing::debug!("{CONFIG_ENV_VAR} not set, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific TOML file.
    pub fn load_from(path: &Path) -> PackResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PackError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml(&content)
            .map_err(|e| PackError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Parse TOML text.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_serializes() {
        let config = PackConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("invoice.xml"));
        assert!(toml_str.contains("Embedded UBL: "));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = PackConfig::from_toml(
            r#"
[attachment]
compress = true

[validation]
strict_timeout_secs = 0
"#,
        )
        .expect("parse");
        assert!(config.attachment.compress);
        assert_eq!(config.attachment.default_name, "invoice.xml");
        assert_eq!(config.document.title, "PDF/A-3 with UBL");
        assert_eq!(config.validation.strict_timeout(), None);
        assert_eq!(config.validation.max_walk_depth, 512);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[document]\nauthor = \"ACME d.o.o.\"").expect("write");
        let config = PackConfig::load_from(file.path()).expect("load");
        assert_eq!(config.document.author, "ACME d.o.o.");
        assert!(config.document.producer.starts_with("pdfa3pack "));
    }

    #[test]
    fn bad_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[attachment\ncompress = yes").expect("write");
        let err = PackConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, PackError::Config(msg) if msg.contains("failed to parse")));
    }
}
