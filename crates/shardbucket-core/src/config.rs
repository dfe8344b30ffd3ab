//! Process-wide configuration for the proxy.
//!
//! All configuration is driven by environment variables and is immutable
//! after load. The loaded [`ProxyConfig`] is shared by reference into every
//! component; there is no mutable global state.

use crate::error::ProxyError;

/// An ordered, fixed-at-startup sequence of physical bucket identifiers.
///
/// The order determines hash-to-index mapping, so it must not change across
/// a deployment's lifetime without a full re-shard.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BucketSet(pub(crate) Vec<String>);

impl BucketSet {
    /// Create a bucket set from an ordered list of bucket identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Config`] if the list is empty or contains an
    /// empty identifier.
    pub fn new(buckets: impl IntoIterator<Item = String>) -> Result<Self, ProxyError> {
        let buckets: Vec<String> = buckets.into_iter().collect();
        if buckets.is_empty() {
            return Err(ProxyError::Config(
                "bucket set must contain at least one bucket".to_owned(),
            ));
        }
        if buckets.iter().any(String::is_empty) {
            return Err(ProxyError::Config(
                "bucket identifiers must be non-empty".to_owned(),
            ));
        }
        Ok(Self(buckets))
    }

    /// Parse a comma-separated bucket list, as supplied via the `BUCKETS`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Config`] if the list is empty after trimming.
    pub fn parse(spec: &str) -> Result<Self, ProxyError> {
        Self::new(
            spec.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned),
        )
    }

    /// Number of physical buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty. Always `false` for a constructed set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The bucket identifier at the given index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Iterate over the bucket identifiers in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether the given identifier is a member of this set.
    #[must_use]
    pub fn contains(&self, bucket: &str) -> bool {
        self.0.iter().any(|b| b == bucket)
    }
}

/// An access-key identifier plus its secret key.
///
/// Two independent instances exist process-wide: the client-facing pair used
/// to verify inbound requests and the backend-facing pair used to sign
/// outbound requests.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    /// The access key identifier.
    pub access_key_id: String,
    /// The secret access key.
    pub secret_access_key: String,
}

impl CredentialPair {
    /// Create a credential pair.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

// Never derive Debug: the secret key must not leak into logs.
impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

/// Global configuration for the proxy, immutable after load.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Bind address for the gateway.
    pub gateway_listen: String,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// The virtual bucket name reported in list responses.
    pub virtual_bucket: String,
    /// Backend storage account identifier.
    pub backend_account_id: String,
    /// Backend storage domain (the host template is
    /// `{backend_account_id}.{backend_domain}`).
    pub backend_domain: String,
    /// The ordered set of physical buckets behind the virtual bucket.
    pub buckets: BucketSet,
    /// Credentials clients sign requests with.
    pub client_credentials: CredentialPair,
    /// Credentials the proxy signs backend requests with.
    pub backend_credentials: CredentialPair,
}

impl ProxyConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `BACKEND_ACCOUNT_ID`, `BUCKETS`, `CLIENT_ACCESS_KEY_ID`,
    /// `CLIENT_SECRET_ACCESS_KEY`, `BACKEND_ACCESS_KEY_ID`,
    /// `BACKEND_SECRET_ACCESS_KEY`. Everything else has a default.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Config`] if a required variable is missing or
    /// the bucket list is empty.
    pub fn from_env() -> Result<Self, ProxyError> {
        let gateway_listen =
            std::env::var("GATEWAY_LISTEN").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
        let virtual_bucket =
            std::env::var("VIRTUAL_BUCKET_NAME").unwrap_or_else(|_| "shardbucket".to_owned());
        let backend_domain = std::env::var("BACKEND_DOMAIN")
            .unwrap_or_else(|_| "r2.cloudflarestorage.com".to_owned());

        let backend_account_id = require_env("BACKEND_ACCOUNT_ID")?;
        let buckets = BucketSet::parse(&require_env("BUCKETS")?)?;

        let client_credentials = CredentialPair::new(
            require_env("CLIENT_ACCESS_KEY_ID")?,
            require_env("CLIENT_SECRET_ACCESS_KEY")?,
        );
        let backend_credentials = CredentialPair::new(
            require_env("BACKEND_ACCESS_KEY_ID")?,
            require_env("BACKEND_SECRET_ACCESS_KEY")?,
        );

        Ok(Self {
            gateway_listen,
            log_level,
            virtual_bucket,
            backend_account_id,
            backend_domain,
            buckets,
            client_credentials,
            backend_credentials,
        })
    }

    /// The backend host the proxy dials, e.g. `acct.r2.cloudflarestorage.com`.
    #[must_use]
    pub fn backend_host(&self) -> String {
        format!("{}.{}", self.backend_account_id, self.backend_domain)
    }
}

fn require_env(name: &str) -> Result<String, ProxyError> {
    std::env::var(name)
        .map_err(|_| ProxyError::Config(format!("missing required environment variable: {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_reject_empty_bucket_set() {
        assert!(BucketSet::new(vec![]).is_err());
        assert!(BucketSet::parse("").is_err());
        assert!(BucketSet::parse(" , ,").is_err());
    }

    #[test]
    fn test_should_parse_comma_separated_buckets() {
        let set = BucketSet::parse("shard-0, shard-1,shard-2").unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(1), Some("shard-1"));
        assert!(set.contains("shard-2"));
        assert!(!set.contains("shard-3"));
    }

    #[test]
    fn test_should_preserve_bucket_order() {
        let set = BucketSet::parse("b,a,c").unwrap();
        let order: Vec<&str> = set.iter().collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_should_redact_secret_key_in_debug_output() {
        let pair = CredentialPair::new("AKID", "super-secret");
        let debug = format!("{pair:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_should_build_backend_host() {
        let config = ProxyConfig {
            gateway_listen: "0.0.0.0:8080".to_owned(),
            log_level: "info".to_owned(),
            virtual_bucket: "virtual".to_owned(),
            backend_account_id: "acct123".to_owned(),
            backend_domain: "r2.cloudflarestorage.com".to_owned(),
            buckets: BucketSet::parse("a,b").unwrap(),
            client_credentials: CredentialPair::new("ck", "cs"),
            backend_credentials: CredentialPair::new("bk", "bs"),
        };
        assert_eq!(config.backend_host(), "acct123.r2.cloudflarestorage.com");
    }
}
