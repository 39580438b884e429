//! PTV Timetable API configuration

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PtvError;
use crate::signer::Credentials;

/// Placeholder substituted with the line id in [`PtvConfig::map_url_template`]
pub const LINE_ID_PLACEHOLDER: &str = "{line_id}";

/// Configuration for the PTV Timetable API client
#[derive(Clone, Serialize, Deserialize)]
pub struct PtvConfig {
    /// Base origin of the timetable API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Line map page URL, containing the `{line_id}` placeholder
    #[serde(default = "default_map_url_template")]
    pub map_url_template: String,

    /// Developer id issued by PTV (sent as `devid`)
    #[serde(default)]
    pub developer_id: Option<String>,

    /// Security key issued by PTV (sensitive - uses SecretString)
    #[serde(default, skip_serializing)]
    pub security_key: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl std::fmt::Debug for PtvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtvConfig")
            .field("base_url", &self.base_url)
            .field("map_url_template", &self.map_url_template)
            .field(
                "developer_id",
                &self.developer_id.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "security_key",
                &self.security_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn default_base_url() -> String {
    "http://timetableapi.ptv.vic.gov.au".to_string()
}

fn default_map_url_template() -> String {
    format!("http://ptv.vic.gov.au/route/view/{LINE_ID_PLACEHOLDER}")
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("ptv_timetable/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for PtvConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            map_url_template: default_map_url_template(),
            developer_id: None,
            security_key: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl PtvConfig {
    /// Load configuration from `ptv.toml` (optional) and `PTV__*` environment variables
    ///
    /// Environment variables override file values, e.g. `PTV__DEVELOPER_ID`,
    /// `PTV__SECURITY_KEY` or `PTV__BASE_URL`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("ptv").required(false))
            .add_source(
                config::Environment::with_prefix("PTV")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            developer_id: Some("dev1".to_string()),
            security_key: Some(SecretString::from("sek".to_string())),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    /// Replace the credentials
    #[must_use]
    pub fn with_credentials(
        mut self,
        developer_id: impl Into<String>,
        security_key: impl Into<String>,
    ) -> Self {
        self.developer_id = Some(developer_id.into());
        self.security_key = Some(SecretString::from(security_key.into()));
        self
    }

    /// Build the signing credentials from this configuration
    pub fn credentials(&self) -> Result<Credentials, PtvError> {
        let developer_id = self
            .developer_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| PtvError::ConfigurationError("developer_id is not set".to_string()))?;

        let security_key = self
            .security_key
            .clone()
            .ok_or_else(|| PtvError::ConfigurationError("security_key is not set".to_string()))?;

        Ok(Credentials::from_secret(developer_id, security_key))
    }

    /// Parsed base origin
    pub fn base_url(&self) -> Result<Url, PtvError> {
        Url::parse(&self.base_url)
            .map_err(|e| PtvError::ConfigurationError(format!("invalid base_url: {e}")))
    }

    /// Map page URL for a line
    pub fn map_page_url(&self, line_id: u32) -> Result<Url, PtvError> {
        let url = self
            .map_url_template
            .replace(LINE_ID_PLACEHOLDER, &line_id.to_string());
        Url::parse(&url)
            .map_err(|e| PtvError::ConfigurationError(format!("invalid map_url_template: {e}")))
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), PtvError> {
        if self.base_url.is_empty() {
            return Err(PtvError::ConfigurationError(
                "base_url must not be empty".to_string(),
            ));
        }

        self.base_url()?;

        if !self.map_url_template.contains(LINE_ID_PLACEHOLDER) {
            return Err(PtvError::ConfigurationError(format!(
                "map_url_template must contain {LINE_ID_PLACEHOLDER}"
            )));
        }

        self.map_page_url(0)?;

        if self.timeout_secs == 0 {
            return Err(PtvError::ConfigurationError(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
