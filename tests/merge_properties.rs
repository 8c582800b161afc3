//! Property tests for the overlay merge of mesh configuration files.

use meshconfig_cache::prelude::*;
use proptest::prelude::*;
use serde_json::json;
use std::path::Path;
use std::result::Result;

fn yaml_merger() -> OverlayMerge {
    MeshConfig::merger_for(Path::new("mesh.yaml"))
}

fn json_merger() -> OverlayMerge {
    MeshConfig::merger_for(Path::new("mesh.json"))
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_yield_invalid_config(raw in proptest::collection::vec(any::<u8>(), 0..256)) {
        let defaults = default_mesh_config();
        let merged: Result<MeshConfig, MergeError> = yaml_merger().merge(&raw, &*defaults);
        if let Ok(config) = merged {
            prop_assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn listen_port_validity_follows_range(port in 0u32..70_000) {
        let defaults = default_mesh_config();
        let raw = format!("proxyListenPort: {}\n", port);
        let merged: Result<MeshConfig, MergeError> = yaml_merger().merge(raw.as_bytes(), &*defaults);

        let expect_ok = (1..=65_535).contains(&port) && port != defaults.proxy_inbound_listen_port;
        prop_assert_eq!(merged.is_ok(), expect_ok, "port {}", port);
        if let Ok(config) = merged {
            prop_assert_eq!(config.proxy_listen_port, port);
            prop_assert_eq!(config.proxy_inbound_listen_port, defaults.proxy_inbound_listen_port);
        }
    }

    #[test]
    fn merging_same_document_again_is_stable(
        service in "gw-[a-z0-9]{1,12}",
        tracing in any::<bool>(),
        aliases in proptest::collection::vec("[a-z]{1,8}\\.example\\.com", 0..5),
    ) {
        let defaults = default_mesh_config();
        let raw = serde_json::to_vec(&json!({
            "ingressService": &service,
            "enableTracing": tracing,
            "trustDomainAliases": &aliases,
        }))
        .unwrap();

        let merger = json_merger();
        let once: MeshConfig = merger.merge(&raw, &*defaults).unwrap();
        let twice: MeshConfig = merger.merge(&raw, &once).unwrap();

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(&once.ingress_service, &service);
        prop_assert_eq!(once.enable_tracing, tracing);

        let mut expected_aliases = aliases.clone();
        expected_aliases.sort();
        expected_aliases.dedup();
        prop_assert_eq!(&once.trust_domain_aliases, &expected_aliases);
    }

    #[test]
    fn untouched_fields_keep_defaults(timeout_ms in 1u64..600_000) {
        let defaults = default_mesh_config();
        let raw = format!("connectTimeout: {}ms\n", timeout_ms);
        let config: MeshConfig = yaml_merger().merge(raw.as_bytes(), &*defaults).unwrap();

        prop_assert_eq!(config.connect_timeout.as_millis() as u64, timeout_ms);
        let restored = MeshConfig {
            connect_timeout: defaults.connect_timeout,
            ..config
        };
        prop_assert_eq!(&restored, &*defaults);
    }
}
