//! The mesh configuration value and its defaults.
//!
//! [`default_mesh_config`] is the value every cache starts from and the base
//! every file is merged onto. It is built once per process, on first use, and
//! never changes afterwards; caches hold it by `Arc` rather than reaching for a
//! mutable global.

mod config;
pub(crate) mod duration;
mod validation;

pub use config::{
    AccessLogEncoding, IngressControllerMode, MeshConfig, OutboundTrafficMode,
    OutboundTrafficPolicy, ProxyConfig,
};

use crate::merge::{Format, OverlayMerge};
use std::path::Path;
use std::sync::{Arc, LazyLock};

static DEFAULT_MESH_CONFIG: LazyLock<Arc<MeshConfig>> = LazyLock::new(|| {
    Arc::new(MeshConfig {
        ingress_class: "istio".to_string(),
        ingress_controller_mode: IngressControllerMode::Strict,
        ..MeshConfig::default()
    })
});

/// Process-wide default mesh configuration.
///
/// Mesh defaults with the ingress controller pinned to the `istio` class in
/// strict mode. Every call returns the same immutable instance.
pub fn default_mesh_config() -> Arc<MeshConfig> {
    Arc::clone(&DEFAULT_MESH_CONFIG)
}

impl MeshConfig {
    /// Merge collaborator for a mesh config file at `path`.
    ///
    /// The format follows the file extension (YAML when there is none, as with
    /// a mounted ConfigMap key) and trust domain aliases accumulate onto the
    /// defaults instead of replacing them.
    pub fn merger_for(path: &Path) -> OverlayMerge {
        OverlayMerge::new(Format::from_path(path)).with_union_key("trustDomainAliases")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Validate;

    #[test]
    fn test_default_mesh_config_is_shared() {
        let a = default_mesh_config();
        let b = default_mesh_config();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_default_mesh_config_ingress() {
        let cfg = default_mesh_config();
        assert_eq!(cfg.ingress_class, "istio");
        assert_eq!(cfg.ingress_controller_mode, IngressControllerMode::Strict);
        assert!(cfg.validate().is_ok());
    }
}
