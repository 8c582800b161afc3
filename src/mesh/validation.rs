//! Semantic checks applied to every merged mesh configuration.

use super::{MeshConfig, ProxyConfig};
use crate::core::Validate;
use crate::error::ValidationError;
use std::time::Duration;

const MIN_TIMEOUT: Duration = Duration::from_millis(1);

impl Validate for MeshConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        check_port(&mut errors, "proxyListenPort", self.proxy_listen_port);
        check_port(
            &mut errors,
            "proxyInboundListenPort",
            self.proxy_inbound_listen_port,
        );
        if self.proxy_listen_port == self.proxy_inbound_listen_port {
            errors.push(ValidationError::invalid_field(
                "proxyInboundListenPort",
                "must differ from proxyListenPort",
            ));
        }

        check_timeout(&mut errors, "connectTimeout", self.connect_timeout);
        check_timeout(&mut errors, "dnsRefreshRate", self.dns_refresh_rate);

        if self.trust_domain.trim().is_empty() {
            errors.push(ValidationError::invalid_field(
                "trustDomain",
                "must not be empty",
            ));
        }
        for alias in &self.trust_domain_aliases {
            if alias.trim().is_empty() {
                errors.push(ValidationError::invalid_field(
                    "trustDomainAliases",
                    "aliases must not be empty",
                ));
            }
        }

        if let Err(err) = self.default_config.validate() {
            match err {
                ValidationError::Multiple(nested) => errors.extend(nested),
                other => errors.push(other),
            }
        }

        ValidationError::from_errors(errors)
    }
}

impl Validate for ProxyConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        if self.service_cluster.trim().is_empty() {
            errors.push(ValidationError::invalid_field(
                "defaultConfig.serviceCluster",
                "must not be empty",
            ));
        }
        check_timeout(
            &mut errors,
            "defaultConfig.drainDuration",
            self.drain_duration,
        );
        check_port(
            &mut errors,
            "defaultConfig.proxyAdminPort",
            self.proxy_admin_port,
        );
        check_port(&mut errors, "defaultConfig.statusPort", self.status_port);
        if self.proxy_admin_port == self.status_port {
            errors.push(ValidationError::invalid_field(
                "defaultConfig.statusPort",
                "must differ from proxyAdminPort",
            ));
        }
        if let Err(reason) = check_host_port(&self.discovery_address) {
            errors.push(ValidationError::invalid_field(
                "defaultConfig.discoveryAddress",
                reason,
            ));
        }

        ValidationError::from_errors(errors)
    }
}

fn check_port(errors: &mut Vec<ValidationError>, field: &str, port: u32) {
    if !(1..=65535).contains(&port) {
        errors.push(ValidationError::invalid_field(
            field,
            format!("port number {} must be in the range 1..65535", port),
        ));
    }
}

fn check_timeout(errors: &mut Vec<ValidationError>, field: &str, value: Duration) {
    if value < MIN_TIMEOUT {
        errors.push(ValidationError::invalid_field(
            field,
            "duration must be at least 1ms",
        ));
    }
}

fn check_host_port(address: &str) -> Result<(), String> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| format!("'{}' is not of the form host:port", address))?;
    if host.is_empty() {
        return Err(format!("'{}' has an empty host", address));
    }
    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(()),
        _ => Err(format!("'{}' has an invalid port", address)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(MeshConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_port() {
        let cfg = MeshConfig {
            proxy_listen_port: 70000,
            ..MeshConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("proxyListenPort"));
    }

    #[test]
    fn test_collects_nested_errors() {
        let mut cfg = MeshConfig {
            connect_timeout: Duration::ZERO,
            trust_domain: String::new(),
            ..MeshConfig::default()
        };
        cfg.default_config.discovery_address = "istiod".to_string();

        match cfg.validate().unwrap_err() {
            ValidationError::Multiple(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_host_port() {
        assert!(check_host_port("istiod.istio-system.svc:15012").is_ok());
        assert!(check_host_port("[::1]:15012").is_ok());
        assert!(check_host_port(":15012").is_err());
        assert!(check_host_port("istiod:0").is_err());
        assert!(check_host_port("istiod:http").is_err());
    }
}
