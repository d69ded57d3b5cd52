//! Configuration types for a Snare mock.

use std::path::Path;

use hyper::header::HeaderValue;
use serde::{Deserialize, Serialize};

/// Behaviour switches for a [`Mock`](crate::Mock).
///
/// Every field has a default, so a YAML file only needs the keys it changes:
///
/// ```yaml
/// verify_on_drop: true
/// json_content_type: application/vnd.api+json
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MockConfig {
    /// Verify when the last `Mock` handle is dropped, panicking on violations.
    pub verify_on_drop: bool,

    /// Record every intercepted request in the journal.
    pub record_requests: bool,

    /// Content type attached to JSON responses.
    pub json_content_type: String,

    /// Maximum number of body characters quoted in an unexpected-request report.
    pub body_preview_limit: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            verify_on_drop: false,
            record_requests: true,
            json_content_type: "application/json".to_string(),
            body_preview_limit: 500,
        }
    }
}

impl MockConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, anyhow::Error> {
        let config: MockConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.json_content_type_header()?;
        Ok(())
    }

    /// The JSON content type as a header value.
    pub(crate) fn json_content_type_header(&self) -> Result<HeaderValue, anyhow::Error> {
        if self.json_content_type.trim().is_empty() {
            anyhow::bail!("json_content_type must not be empty");
        }
        HeaderValue::from_str(&self.json_content_type).map_err(|_| {
            anyhow::anyhow!(
                "json_content_type '{}' is not a valid header value",
                self.json_content_type
            )
        })
    }
}
