//! Description of the machine a model was uploaded from.
//!
//! Sent with every model upload so that the registry can be searched by
//! language and platform.

use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::request::Metadata;

/// Language reported for models uploaded by this client.
pub const LANGUAGE: &str = "rust";

/// Platform and toolchain descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub system: String,
    pub system_release: String,
    pub distribution: String,
    pub distribution_version: String,
    pub language: String,
    pub language_version: String,
    pub architecture: String,
    pub processor: String,
}

impl EnvironmentInfo {
    /// Gather descriptors for the current host.
    pub fn detect() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();

        let processor = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or_else(|| std::env::consts::ARCH.to_string());

        Self {
            system: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            system_release: System::kernel_version().unwrap_or_default(),
            distribution: System::distribution_id(),
            distribution_version: System::os_version().unwrap_or_default(),
            language: LANGUAGE.to_string(),
            language_version: language_version(),
            architecture: architecture().to_string(),
            processor,
        }
    }

    /// Replace the reported language version, e.g. with the exact toolchain
    /// a model was built with.
    pub fn with_language_version(mut self, version: impl Into<String>) -> Self {
        self.language_version = version.into();
        self
    }

    pub fn to_metadata(&self) -> Metadata {
        Metadata::new()
            .with("system", self.system.as_str())
            .with("system_release", self.system_release.as_str())
            .with("distribution", self.distribution.as_str())
            .with("distribution_version", self.distribution_version.as_str())
            .with("language", self.language.as_str())
            .with("language_version", self.language_version.as_str())
            .with("architecture", self.architecture.as_str())
            .with("processor", self.processor.as_str())
    }
}

fn language_version() -> String {
    option_env!("CARGO_PKG_RUST_VERSION")
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

fn architecture() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "64bit"
    } else {
        "32bit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_fills_fields() {
        let info = EnvironmentInfo::detect();
        assert_eq!(info.language, "rust");
        assert!(!info.system.is_empty());
        assert!(!info.processor.is_empty());
        assert!(info.architecture.ends_with("bit"));
    }

    #[test]
    fn test_metadata_fields() {
        let meta = EnvironmentInfo::detect()
            .with_language_version("1.80.0")
            .to_metadata();
        assert_eq!(meta.len(), 8);
        assert_eq!(meta.text("language_version"), Some("1.80.0"));
        assert!(meta.get("distribution_version").is_some());
    }
}
