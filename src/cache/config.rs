//! Cache configuration.

use std::time::Duration;

use crate::cache::keys::IdentityHint;

const DEFAULT_KEY_PREFIX: &str = "vetrina";
const DEFAULT_ANON_TTL_SECS: u64 = 60;
const DEFAULT_IDENTITY_TTL_SECS: u64 = 300;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 2_000;

/// Resolved cache configuration.
///
/// `url: None` means the cache is disabled: every read is a miss and every
/// write is a no-op. Anonymous entries use the short TTL because all
/// anonymous traffic shares one cache slot per page; identity-scoped entries
/// keep theirs longer.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: Option<String>,
    pub key_prefix: String,
    pub anon_ttl: Duration,
    pub identity_ttl: Duration,
    pub connect_timeout: Duration,
    pub operation_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            anon_ttl: Duration::from_secs(DEFAULT_ANON_TTL_SECS),
            identity_ttl: Duration::from_secs(DEFAULT_IDENTITY_TTL_SECS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            operation_timeout: Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS),
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// TTL policy: longer for identity-scoped entries, shorter for the shared
    /// anonymous slot.
    pub fn ttl_for(&self, identity: Option<&IdentityHint>) -> Duration {
        if identity.is_some() {
            self.identity_ttl
        } else {
            self.anon_ttl
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            url: settings.url.clone(),
            key_prefix: settings.key_prefix.clone(),
            anon_ttl: settings.anon_ttl,
            identity_ttl: settings.identity_ttl,
            connect_timeout: settings.connect_timeout,
            operation_timeout: settings.operation_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_url() {
        let config = CacheConfig::default();
        assert!(!config.is_enabled());
    }

    #[test]
    fn ttl_policy_prefers_identity() {
        let config = CacheConfig::default();
        let hint = IdentityHint::new("Bearer abc");
        assert_eq!(config.ttl_for(None), Duration::from_secs(60));
        assert_eq!(config.ttl_for(Some(&hint)), Duration::from_secs(300));
    }
}
