use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by all controllers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Upper bound on passes running at the same time across all keys.
    pub max_concurrent_reconciles: usize,
    /// Longest wait between passes over an active grant.
    #[serde(with = "humantime_serde")]
    pub grant_recheck_interval: Duration,
    /// How often group memberships are re-resolved.
    #[serde(with = "humantime_serde")]
    pub directory_resync_interval: Duration,
    /// Delay before a pass that failed with a retryable error runs again.
    #[serde(with = "humantime_serde")]
    pub error_requeue_delay: Duration,
    pub argocd: ArgoCdConfig,
    /// Provider config referenced by every Project child.
    pub provider_config: String,
    /// Permissions granted to product members and approvers.
    pub default_permissions: Vec<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_reconciles: 16,
            grant_recheck_interval: Duration::from_secs(5 * 60),
            directory_resync_interval: Duration::from_secs(10 * 60),
            error_requeue_delay: Duration::from_secs(30),
            argocd: ArgoCdConfig::default(),
            provider_config: "gcp-provider".to_string(),
            default_permissions: vec!["roles/viewer".to_string()],
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_reconciles == 0 {
            return Err("controllers.max_concurrent_reconciles must be > 0".into());
        }
        if self.grant_recheck_interval.is_zero() {
            return Err("controllers.grant_recheck_interval must be > 0".into());
        }
        if self.directory_resync_interval.is_zero() {
            return Err("controllers.directory_resync_interval must be > 0".into());
        }
        if self.error_requeue_delay.is_zero() {
            return Err("controllers.error_requeue_delay must be > 0".into());
        }
        if self.provider_config.trim().is_empty() {
            return Err("controllers.provider_config must not be empty".into());
        }
        if self.argocd.namespace.trim().is_empty() {
            return Err("controllers.argocd.namespace must not be empty".into());
        }
        Ok(())
    }
}

/// Where and how deployment applications are created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgoCdConfig {
    pub namespace: String,
    pub project: String,
    pub destination_server: String,
    /// Path of the claims manifests inside the asset repository.
    pub path: String,
    pub sync_options: Vec<String>,
}

impl Default for ArgoCdConfig {
    fn default() -> Self {
        Self {
            namespace: "argocd".to_string(),
            project: "default".to_string(),
            destination_server: "https://kubernetes.default.svc".to_string(),
            path: "claims".to_string(),
            sync_options: vec!["CreateNamespace=true".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grant_recheck_interval, Duration::from_secs(300));
        assert_eq!(config.argocd.namespace, "argocd");
    }

    #[test]
    fn test_humantime_durations() {
        let config: ControllerConfig = serde_json::from_value(serde_json::json!({
            "grant_recheck_interval": "90s",
            "error_requeue_delay": "1m 30s"
        }))
        .unwrap();
        assert_eq!(config.grant_recheck_interval, Duration::from_secs(90));
        assert_eq!(config.error_requeue_delay, Duration::from_secs(90));
        assert_eq!(config.max_concurrent_reconciles, 16);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = ControllerConfig {
            max_concurrent_reconciles: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_error_requeue_delay() {
        let config = ControllerConfig {
            error_requeue_delay: Duration::ZERO,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("error_requeue_delay"));
    }
}
