use super::cache::TtlCache;
use super::config;
use super::polygon_client::{EndpointStatus, KeyCheck, PolygonClient};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;

/// Key validation and plan probing, memoized per API key
pub struct Diagnostics {
    client: Arc<PolygonClient>,
    key_checks: TtlCache<String, KeyCheck>,
    plan_probes: TtlCache<String, Vec<EndpointStatus>>,
}

impl Diagnostics {
    pub fn new(client: Arc<PolygonClient>) -> Self {
        Self {
            client,
            key_checks: TtlCache::new(config::KEY_VALIDATION_TTL),
            plan_probes: TtlCache::new(config::PLAN_PROBE_TTL),
        }
    }

    pub async fn check_key(&self, api_key: &str) -> KeyCheck {
        let key = api_key.trim().to_string();
        let result = self
            .key_checks
            .get_or_try_insert(key.clone(), || async {
                info!(key = %config::mask_key(&key), "validating API key");
                Ok::<_, Infallible>(self.client.validate_key(&key).await)
            })
            .await;
        match result {
            Ok(check) => check,
            Err(never) => match never {},
        }
    }

    pub async fn check_plan(&self, api_key: &str) -> Vec<EndpointStatus> {
        let key = api_key.trim().to_string();
        let result = self
            .plan_probes
            .get_or_try_insert(key.clone(), || async {
                info!(key = %config::mask_key(&key), "probing plan capabilities");
                Ok::<_, Infallible>(self.client.plan_capabilities(&key).await)
            })
            .await;
        match result {
            Ok(statuses) => statuses,
            Err(never) => match never {},
        }
    }
}

/// Shape checks on a credential before it is sent anywhere
pub fn key_format_warnings(api_key: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    if api_key.is_empty() {
        return warnings;
    }

    let len = api_key.chars().count();
    if len < 20 {
        warnings.push("API key seems too short (should be ~32 chars)".to_string());
    } else if len > 50 {
        warnings.push("API key seems too long".to_string());
    }
    if api_key.trim() != api_key {
        warnings.push("API key has leading/trailing spaces!".to_string());
    }
    if !api_key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        warnings.push("API key contains unusual characters".to_string());
    }
    warnings
}
