//! Cache key construction.
//!
//! Keys follow `{prefix}:{namespace}:{param}:{param}...[:{hint}]`. Two
//! logically-equivalent requests always produce the same key; any differing
//! parameter, namespace, or identity hint produces a different key. The hint
//! segment is a truncated digest so raw credentials never reach the backend
//! or the logs.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the identity digest.
const HINT_DIGEST_LEN: usize = 16;

/// An opaque, hashed derivative of a caller credential.
///
/// Constructed directly from the raw `Authorization` or `Cookie` header
/// value; the raw value is discarded here and only the truncated SHA-256
/// digest is retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityHint(String);

impl IdentityHint {
    pub fn new(raw: &str) -> Self {
        let digest = Sha256::digest(raw.as_bytes());
        let mut hx = hex::encode(digest);
        hx.truncate(HINT_DIGEST_LEN);
        Self(hx)
    }

    pub fn digest(&self) -> &str {
        &self.0
    }
}

/// Deterministic cache key builder for one deployment prefix.
#[derive(Debug, Clone)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Build a key from a namespace, ordered parameters, and an optional
    /// identity hint. Parameter order matters and must match between the
    /// read and write call sites for the same logical resource.
    pub fn build(&self, namespace: &str, params: &[&str], identity: Option<&IdentityHint>) -> String {
        let mut key = String::with_capacity(self.prefix.len() + namespace.len() + 32);
        key.push_str(&self.prefix);
        key.push(':');
        key.push_str(namespace);
        for param in params {
            key.push(':');
            key.push_str(param);
        }
        if let Some(hint) = identity {
            key.push(':');
            key.push_str(hint.digest());
        }
        key
    }

    /// Key for one page of the blog list.
    pub fn blog_list(&self, page: u32, page_size: u32, identity: Option<&IdentityHint>) -> String {
        self.build(
            "blog:list",
            &[&page.to_string(), &page_size.to_string()],
            identity,
        )
    }

    /// Key for a single post by slug.
    pub fn blog_post(&self, slug: &str, identity: Option<&IdentityHint>) -> String {
        self.build("blog:post", &[slug], identity)
    }

    /// Prefix covering every blog entry (list pages and single posts),
    /// used for coarse invalidation on write.
    pub fn blog_prefix(&self) -> String {
        format!("{}:blog:", self.prefix)
    }
}
