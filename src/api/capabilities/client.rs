//! Client platform detection
//!
//! Local file links carry one path per platform (`local_path_mac`,
//! `local_path_windows`, `local_path_linux`). The platform is detected once
//! when the client is built and selects which of those fields applies.

use std::collections::BTreeMap;
use std::fmt;

use crate::api::entity::FieldValue;

/// Version of the compiler this crate was built with
pub const RUSTC_VERSION: &str = env!("SG_RUSTC_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPlatform {
    Mac,
    Windows,
    Linux,
}

impl ClientPlatform {
    /// Map an operating-system name (`Darwin`, `Windows`, `Linux`)
    pub fn from_system_name(name: &str) -> Option<Self> {
        match name {
            "Darwin" => Some(ClientPlatform::Mac),
            "Windows" => Some(ClientPlatform::Windows),
            "Linux" => Some(ClientPlatform::Linux),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientPlatform::Mac => "mac",
            ClientPlatform::Windows => "windows",
            ClientPlatform::Linux => "linux",
        }
    }
}

impl fmt::Display for ClientPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System name of the running host, in the `Darwin`/`Windows`/`Linux` vocabulary
pub fn host_system_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "Darwin",
        "windows" => "Windows",
        "linux" => "Linux",
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCapabilities {
    pub platform: Option<ClientPlatform>,
    pub local_path_field: Option<String>,
    /// `major.minor` of the compiler the client was built with, for diagnostics only
    pub runtime_version: String,
}

impl ClientCapabilities {
    /// Detect the running host
    pub fn detect() -> Self {
        Self::from_parts(host_system_name(), RUSTC_VERSION)
    }

    pub fn from_parts(system_name: &str, runtime_version: &str) -> Self {
        let platform = ClientPlatform::from_system_name(system_name);
        Self {
            platform,
            local_path_field: platform.map(|p| format!("local_path_{}", p)),
            runtime_version: major_minor(runtime_version),
        }
    }

    pub fn platform_name(&self) -> Option<&'static str> {
        self.platform.as_ref().map(ClientPlatform::as_str)
    }

    /// Point local file links at this platform's path
    ///
    /// Any map with `link_type == "local"` that carries this platform's path
    /// field gets `local_path` and a `file://` url filled in. Nested values
    /// are visited as well.
    pub fn localize_paths(&self, value: &mut FieldValue) {
        match value {
            FieldValue::Map(map) => {
                self.localize_link(map);
                for nested in map.values_mut() {
                    self.localize_paths(nested);
                }
            }
            FieldValue::List(items) => {
                for item in items {
                    self.localize_paths(item);
                }
            }
            _ => {}
        }
    }

    fn localize_link(&self, map: &mut BTreeMap<String, FieldValue>) {
        let Some(field) = &self.local_path_field else {
            return;
        };
        if map.get("link_type").and_then(FieldValue::as_str) != Some("local") {
            return;
        }
        let Some(path) = map.get(field).and_then(FieldValue::as_str).map(str::to_string) else {
            return;
        };

        map.insert("url".to_string(), FieldValue::Text(format!("file://{}", path)));
        map.insert("local_path".to_string(), FieldValue::Text(path));
    }
}

/// First two dot-separated components of a version string
fn major_minor(version: &str) -> String {
    version.split('.').take(2).collect::<Vec<_>>().join(".")
}
