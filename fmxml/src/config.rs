//! Connection configuration.
//!
//! Loaded from a TOML file shaped like:
//!
//! ```toml
//! [server]
//! host = "fm.example.com"
//! account_name = "web"
//! password = "${FM_PASSWORD}"
//! database = "Contacts"
//! raise_on_401 = true
//! ```

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    coerce::ContainerBase,
    errors::{FmError, Result},
    resultset::ParseOptions,
    transport::RequestContext,
};

/// Path of the XML gateway on the Web Publishing Engine.
pub const XML_GATEWAY_PATH: &str = "/fmi/xml/fmresultset.xml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    server: ConnectionConfig,
}

/// Settings for one FileMaker server connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    /// Defaults to 443 with SSL and 80 without.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default = "default_true")]
    pub ssl: bool,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub password: String,
    /// Database used by [`crate::Server::layout`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default)]
    pub raise_on_401: bool,
    #[serde(default)]
    pub include_portals: bool,
    /// Log each outgoing action at info level.
    #[serde(default)]
    pub log_actions: bool,
    /// Log each raw response body at info level.
    #[serde(default)]
    pub log_responses: bool,
    /// Handed to the transport through [`RequestContext`].
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,
    /// Handed to the transport through [`RequestContext`].
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_redirects() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            ssl: true,
            account_name: String::new(),
            password: String::new(),
            database: None,
            raise_on_401: false,
            include_portals: false,
            log_actions: false,
            log_responses: false,
            max_redirects: default_max_redirects(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Parses the `[server]` table of a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).map_err(|err| FmError::Config {
            message: format!("failed to parse config: {err}"),
        })?;
        Ok(file.server)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| FmError::Config {
            message: format!("failed to read {}: {err}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(&ConfigFile { server: self.clone() }).map_err(|err| FmError::Config {
            message: format!("failed to serialize config: {err}"),
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    pub fn with_credentials(mut self, account_name: impl Into<String>, password: impl Into<String>) -> Self {
        self.account_name = account_name.into();
        self.password = password.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_raise_on_401(mut self, raise: bool) -> Self {
        self.raise_on_401 = raise;
        self
    }

    pub fn with_portals(mut self, include: bool) -> Self {
        self.include_portals = include;
        self
    }

    pub fn scheme(&self) -> &'static str {
        if self.ssl { "https" } else { "http" }
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.ssl { 443 } else { 80 })
    }

    /// Account name with `${VAR}` references expanded.
    pub fn account_name(&self) -> Result<String> {
        expand_env(&self.account_name)
    }

    /// Password with `${VAR}` references expanded.
    pub fn password(&self) -> Result<String> {
        expand_env(&self.password)
    }

    /// URL of the XML gateway on this server.
    pub fn gateway_url(&self) -> Result<Url> {
        let raw = format!(
            "{}://{}:{}{}",
            self.scheme(),
            self.host,
            self.effective_port(),
            XML_GATEWAY_PATH
        );
        Url::parse(&raw).map_err(|err| FmError::Config {
            message: format!("invalid server address '{raw}': {err}"),
        })
    }

    pub fn container_base(&self) -> ContainerBase {
        ContainerBase::new(self.scheme(), self.host.clone(), self.effective_port())
    }

    /// Resolved credentials and transport limits for one exchange.
    pub fn request_context(&self) -> Result<RequestContext> {
        Ok(RequestContext {
            account_name: self.account_name()?,
            password: self.password()?,
            max_redirects: self.max_redirects,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }

    /// Parser settings for responses received over this connection.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new()
            .with_raise_on_401(self.raise_on_401)
            .with_portals(self.include_portals)
            .with_container(self.container_base())
    }
}

fn expand_env(value: &str) -> Result<String> {
    match value.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        Some(var_name) => std::env::var(var_name).map_err(|_| FmError::Config {
            message: format!("environment variable {var_name} not set"),
        }),
        None => Ok(value.to_string()),
    }
}
