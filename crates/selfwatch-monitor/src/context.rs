//! Default common context provider
//!
//! Supplies the ambient fields merged into every diagnostic record. Static
//! facts (OS, SDK version) are collected once; per-fault facts (current
//! thread) are read on every call. Never includes hostname or username.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use selfwatch_core::ports::IContextProvider;

/// Non-identifying operating system information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsInfo {
    pub os: String,
    pub kernel: String,
    pub arch: String,
}

impl OsInfo {
    /// Collect OS information from the current system.
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            kernel: read_kernel_version(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

fn read_kernel_version() -> String {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Context provider used when the host does not supply one
#[derive(Debug, Clone)]
pub struct CommonContextProvider {
    service: Option<String>,
    os: OsInfo,
}

impl CommonContextProvider {
    pub fn new() -> Self {
        Self {
            service: None,
            os: OsInfo::collect(),
        }
    }

    /// Tags records with the host service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }
}

impl Default for CommonContextProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IContextProvider for CommonContextProvider {
    fn context(&self) -> Map<String, Value> {
        let mut context = Map::new();
        context.insert("sdk_version".into(), json!(env!("CARGO_PKG_VERSION")));
        if let Some(service) = &self.service {
            context.insert("service".into(), json!(service));
        }
        let os = serde_json::to_value(&self.os).unwrap_or(Value::Null);
        context.insert("os".into(), os);
        context.insert(
            "thread".into(),
            json!(std::thread::current().name().unwrap_or("<unnamed>")),
        );
        context.insert("pid".into(), json!(std::process::id()));
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_os_info() {
        let info = OsInfo::collect();
        assert_eq!(info.os, std::env::consts::OS);
        assert!(!info.arch.is_empty());
    }

    #[test]
    fn test_context_fields() {
        let provider = CommonContextProvider::new().with_service("checkout-web");
        let context = provider.context();
        assert_eq!(context["service"], "checkout-web");
        assert_eq!(context["sdk_version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(context["os"]["os"], std::env::consts::OS);
        assert_eq!(context["pid"], std::process::id());
    }

    #[test]
    fn test_context_reflects_calling_thread() {
        let provider = CommonContextProvider::new();
        let context = std::thread::Builder::new()
            .name("flush-worker".into())
            .spawn(move || provider.context())
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(context["thread"], "flush-worker");
    }

    #[test]
    fn test_service_omitted_by_default() {
        let context = CommonContextProvider::new().context();
        assert!(!context.contains_key("service"));
    }
}
