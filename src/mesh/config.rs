//! Mesh-wide configuration value.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Mesh-wide configuration, as read from the mesh config file.
///
/// Keys are camelCase in the file and unknown keys are rejected, so a typo in
/// the file is a reload failure rather than a silently ignored setting. Every
/// field has a default, which lets a file specify only what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MeshConfig {
    /// Port the sidecar captures outbound traffic on.
    pub proxy_listen_port: u32,
    /// Port the sidecar captures inbound traffic on.
    pub proxy_inbound_listen_port: u32,
    /// Upstream connection timeout.
    #[serde(with = "super::duration")]
    pub connect_timeout: Duration,
    /// How long to wait for the client to send data before treating it as opaque TCP.
    /// Zero disables protocol sniffing timeouts.
    #[serde(with = "super::duration")]
    pub protocol_detection_timeout: Duration,
    /// Ingress class handled by the ingress controller.
    pub ingress_class: String,
    /// Service fronting the ingress gateway.
    pub ingress_service: String,
    /// Which ingress resources the controller picks up.
    pub ingress_controller_mode: IngressControllerMode,
    /// Whether request tracing is enabled.
    pub enable_tracing: bool,
    /// Access log destination; empty disables access logging.
    pub access_log_file: String,
    /// Access log encoding.
    pub access_log_encoding: AccessLogEncoding,
    /// Proxy settings applied to every workload unless overridden.
    pub default_config: ProxyConfig,
    /// Namespace holding mesh-wide resources.
    pub root_namespace: String,
    /// Trust domain of the mesh identity.
    pub trust_domain: String,
    /// Additional trust domains treated as equivalent to `trust_domain`.
    ///
    /// Aliases from the file are added to the defaults, never replacing them.
    pub trust_domain_aliases: Vec<String>,
    /// Refresh interval for DNS-resolved clusters.
    #[serde(with = "super::duration")]
    pub dns_refresh_rate: Duration,
    /// Whether mutual TLS is negotiated automatically.
    pub enable_auto_mtls: bool,
    /// Policy for traffic leaving the mesh.
    pub outbound_traffic_policy: OutboundTrafficPolicy,
    /// Default visibility of services.
    pub default_service_export_to: Vec<String>,
    /// Default visibility of virtual services.
    pub default_virtual_service_export_to: Vec<String>,
    /// Default visibility of destination rules.
    pub default_destination_rule_export_to: Vec<String>,
}

/// Per-proxy defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Directory for generated proxy configuration.
    pub config_path: String,
    /// Path to the proxy binary.
    pub binary_path: String,
    /// Service cluster reported by the proxy.
    pub service_cluster: String,
    /// Time the proxy spends draining connections on shutdown.
    #[serde(with = "super::duration")]
    pub drain_duration: Duration,
    /// Address of the discovery service, `host:port`.
    pub discovery_address: String,
    /// Port of the proxy admin interface.
    pub proxy_admin_port: u32,
    /// Port of the agent status server.
    pub status_port: u32,
    /// Worker threads; unset means one per core.
    pub concurrency: Option<u32>,
}

/// Ingress controller mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngressControllerMode {
    /// Not set.
    Unspecified,
    /// Ingress handling disabled.
    Off,
    /// Handle ingress resources without a class or with the configured class.
    #[default]
    Default,
    /// Only handle ingress resources with the configured class.
    Strict,
}

/// Access log encoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLogEncoding {
    /// Plain text lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Outbound traffic policy.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct OutboundTrafficPolicy {
    /// Whether unknown destinations are allowed.
    pub mode: OutboundTrafficMode,
}

/// Outbound traffic mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundTrafficMode {
    /// Only registered destinations are reachable.
    RegistryOnly,
    /// Any destination is reachable.
    #[default]
    AllowAny,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            proxy_listen_port: 15001,
            proxy_inbound_listen_port: 15006,
            connect_timeout: Duration::from_secs(10),
            protocol_detection_timeout: Duration::ZERO,
            ingress_class: String::new(),
            ingress_service: "istio-ingressgateway".to_string(),
            ingress_controller_mode: IngressControllerMode::Default,
            enable_tracing: true,
            access_log_file: String::new(),
            access_log_encoding: AccessLogEncoding::Text,
            default_config: ProxyConfig::default(),
            root_namespace: "istio-system".to_string(),
            trust_domain: "cluster.local".to_string(),
            trust_domain_aliases: Vec::new(),
            dns_refresh_rate: Duration::from_secs(60),
            enable_auto_mtls: true,
            outbound_traffic_policy: OutboundTrafficPolicy::default(),
            default_service_export_to: vec!["*".to_string()],
            default_virtual_service_export_to: vec!["*".to_string()],
            default_destination_rule_export_to: vec!["*".to_string()],
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            config_path: "./etc/istio/proxy".to_string(),
            binary_path: "/usr/local/bin/envoy".to_string(),
            service_cluster: "istio-proxy".to_string(),
            drain_duration: Duration::from_secs(45),
            discovery_address: "istiod.istio-system.svc:15012".to_string(),
            proxy_admin_port: 15000,
            status_port: 15020,
            concurrency: Some(2),
        }
    }
}
