//! Client configuration, built in code or read from the environment

use log::debug;
use serde::{Deserialize, Serialize};

use crate::api::error::{Result, ShotgunError};
use crate::api::models::Credentials;

/// Port used when a proxy string names none
pub const DEFAULT_PROXY_PORT: u16 = 8080;

/// Client configuration, fixed once the client is built
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub script_name: String,
    pub api_key: String,
    #[serde(default = "default_true")]
    pub convert_datetimes_to_utc: bool,
    #[serde(default = "default_true")]
    pub ensure_ascii: bool,
    /// IANA zone name; the host's zone when unset
    #[serde(default)]
    pub local_timezone: Option<String>,
    #[serde(default)]
    pub http_proxy: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_records_per_page")]
    pub records_per_page: u32,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_records_per_page() -> u32 {
    500
}

/// Proxy settings parsed from `http_proxy`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub server: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
}

impl ProxyConfig {
    /// Parse `host[:port]`, `user:pass@host[:port]` or a full URL
    pub fn parse(proxy: &str) -> Result<Self> {
        let invalid = |why: &str| ShotgunError::configuration(format!("invalid http_proxy '{}': {}", proxy, why));

        let rest = proxy.split_once("://").map(|(_, rest)| rest).unwrap_or(proxy);
        let authority = rest.split('/').next().unwrap_or_default();

        let (userinfo, host_port) = match authority.rsplit_once('@') {
            Some((userinfo, host_port)) => (Some(userinfo), host_port),
            None => (None, authority),
        };

        let (server, port) = match host_port.rsplit_once(':') {
            Some((server, port)) => (server, port.parse::<u16>().map_err(|_| invalid("bad port"))?),
            None => (host_port, DEFAULT_PROXY_PORT),
        };
        if server.is_empty() {
            return Err(invalid("missing host"));
        }

        let (user, pass) = match userinfo {
            Some(userinfo) => {
                let (user, pass) = userinfo.split_once(':').ok_or_else(|| invalid("credentials must be user:pass"))?;
                (Some(user.to_string()), Some(pass.to_string()))
            }
            None => (None, None),
        };

        Ok(Self {
            server: server.to_string(),
            port,
            user,
            pass,
        })
    }

    /// URL form accepted by the HTTP transport
    pub fn url(&self) -> String {
        match (&self.user, &self.pass) {
            (Some(user), Some(pass)) => format!("http://{}:{}@{}:{}", user, pass, self.server, self.port),
            _ => format!("http://{}:{}", self.server, self.port),
        }
    }
}

impl Config {
    pub fn new(base_url: impl Into<String>, script_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            script_name: script_name.into(),
            api_key: api_key.into(),
            convert_datetimes_to_utc: true,
            ensure_ascii: true,
            local_timezone: None,
            http_proxy: None,
            timeout_secs: default_timeout_secs(),
            records_per_page: default_records_per_page(),
        }
    }

    /// Read settings from `SG_*` environment variables
    pub fn from_env() -> Result<Self> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| ShotgunError::configuration(format!("{} is not set", name)))
        };

        let mut config = Self::new(required("SG_SERVER_URL")?, required("SG_SCRIPT_NAME")?, required("SG_API_KEY")?);

        if let Ok(proxy) = std::env::var("SG_HTTP_PROXY") {
            config = config.with_http_proxy(proxy)?;
        }
        if let Ok(flag) = std::env::var("SG_CONVERT_DATETIMES_TO_UTC") {
            config.convert_datetimes_to_utc = parse_flag("SG_CONVERT_DATETIMES_TO_UTC", &flag)?;
        }
        if let Ok(flag) = std::env::var("SG_ENSURE_ASCII") {
            config.ensure_ascii = parse_flag("SG_ENSURE_ASCII", &flag)?;
        }
        if let Ok(zone) = std::env::var("SG_TIMEZONE") {
            config.local_timezone = Some(zone);
        }

        debug!("Loaded config for {} from environment", config.base_url);
        Ok(config)
    }

    pub fn with_http_proxy(mut self, proxy: impl Into<String>) -> Result<Self> {
        let proxy = proxy.into();
        ProxyConfig::parse(&proxy)?;
        self.http_proxy = Some(proxy);
        Ok(self)
    }

    pub fn with_convert_datetimes_to_utc(mut self, convert: bool) -> Self {
        self.convert_datetimes_to_utc = convert;
        self
    }

    pub fn with_ensure_ascii(mut self, ensure_ascii: bool) -> Self {
        self.ensure_ascii = ensure_ascii;
        self
    }

    pub fn with_local_timezone(mut self, zone: impl Into<String>) -> Self {
        self.local_timezone = Some(zone.into());
        self
    }

    pub fn proxy(&self) -> Result<Option<ProxyConfig>> {
        self.http_proxy.as_deref().map(ProxyConfig::parse).transpose()
    }

    pub fn proxy_server(&self) -> Option<String> {
        self.proxy().ok().flatten().map(|p| p.server)
    }

    pub fn proxy_port(&self) -> Option<u16> {
        self.proxy().ok().flatten().map(|p| p.port)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::Script {
            script_name: self.script_name.clone(),
            api_key: self.api_key.clone(),
        }
    }

    /// Check everything that can be checked without the network
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ShotgunError::configuration(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.script_name.is_empty() || self.api_key.is_empty() {
            return Err(ShotgunError::configuration("script_name and api_key are required"));
        }
        if self.records_per_page == 0 {
            return Err(ShotgunError::configuration("records_per_page must be positive"));
        }
        self.proxy()?;
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("script_name", &self.script_name)
            .field("api_key", &"[REDACTED]")
            .field("convert_datetimes_to_utc", &self.convert_datetimes_to_utc)
            .field("ensure_ascii", &self.ensure_ascii)
            .field("local_timezone", &self.local_timezone)
            .field("http_proxy", &self.http_proxy.as_ref().map(|_| "[SET]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("records_per_page", &self.records_per_page)
            .finish()
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ShotgunError::configuration(format!("{} must be a boolean, got '{}'", name, other))),
    }
}
