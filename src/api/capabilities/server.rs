//! Server capability negotiation
//!
//! The server advertises its version in the `info` metadata as a 3- or
//! 4-element array, e.g. `[3, 4, 0]` or `[3, 4, 0, "Dev"]`. Features are
//! gated on that version through one central table.

use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use crate::api::error::{Result, ShotgunError};

/// Tag marking a development build of the server
pub const DEV_TAG: &str = "Dev";

/// Version-gated server features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// The `/api3/json` endpoint this client talks to
    JsonApi,
}

/// Minimum server version per feature
const FEATURE_MIN_VERSIONS: &[(Feature, (u32, u32, u32))] = &[(Feature::JsonApi, (2, 4, 0))];

impl Feature {
    pub fn min_version(&self) -> (u32, u32, u32) {
        FEATURE_MIN_VERSIONS
            .iter()
            .find(|(feature, _)| feature == self)
            .map(|(_, version)| *version)
            .unwrap_or((0, 0, 0))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Feature::JsonApi => "JSON API",
        }
    }
}

/// Server version, ordered by its numeric triple only
#[derive(Debug, Clone, Eq)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Any 4th element other than the dev tag
    pub tag: Option<String>,
}

impl ServerVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch, tag: None }
    }

    pub fn as_tuple(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }

    /// Parse the advertised version array
    ///
    /// Returns the version and whether it is a dev build. The dev tag is
    /// stripped; any other string tag is kept on the version.
    pub fn parse(value: &Value) -> Result<(Self, bool)> {
        let parts = value.as_array().ok_or_else(|| {
            ShotgunError::configuration(format!("server version must be an array, got {}", value))
        })?;

        if parts.len() != 3 && parts.len() != 4 {
            return Err(ShotgunError::configuration(format!(
                "server version must have 3 or 4 elements, got {}",
                parts.len()
            )));
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(parts) {
            *slot = part
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    ShotgunError::configuration(format!("invalid server version component {}", part))
                })?;
        }

        let (tag, is_dev) = match parts.get(3) {
            None => (None, false),
            Some(Value::String(tag)) if tag == DEV_TAG => (None, true),
            Some(Value::String(tag)) => (Some(tag.clone()), false),
            Some(other) => {
                return Err(ShotgunError::configuration(format!(
                    "invalid server version tag {}",
                    other
                )));
            }
        };

        let [major, minor, patch] = numbers;
        Ok((Self { major, minor, patch, tag }, is_dev))
    }
}

impl PartialEq for ServerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.as_tuple() == other.as_tuple()
    }
}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_tuple().cmp(&other.as_tuple())
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(tag) = &self.tag {
            write!(f, "-{}", tag)?;
        }
        Ok(())
    }
}

/// What the connected server supports
#[derive(Debug, Clone)]
pub struct ServerCapabilities {
    pub host: String,
    pub version: ServerVersion,
    pub is_dev: bool,
}

impl ServerCapabilities {
    /// Build from the metadata returned by the `info` call
    pub fn new(host: impl Into<String>, meta: &Value) -> Result<Self> {
        let version = meta
            .get("version")
            .ok_or_else(|| ShotgunError::configuration("server metadata has no 'version' field"))?;

        let (version, is_dev) = ServerVersion::parse(version)?;

        Ok(Self {
            host: host.into(),
            version,
            is_dev,
        })
    }

    pub fn version_tuple(&self) -> (u32, u32, u32) {
        self.version.as_tuple()
    }

    pub fn at_least(&self, major: u32, minor: u32, patch: u32) -> bool {
        self.version_tuple() >= (major, minor, patch)
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.version_tuple() >= feature.min_version()
    }

    /// Fail with a configuration error when the server lacks a feature
    pub fn ensure(&self, feature: Feature) -> Result<()> {
        if self.supports(feature) {
            return Ok(());
        }
        let (major, minor, patch) = feature.min_version();
        Err(ShotgunError::configuration(format!(
            "{} requires server version {}.{}.{} or higher, {} runs {}",
            feature.name(),
            major,
            minor,
            patch,
            self.host,
            self.version
        )))
    }
}
