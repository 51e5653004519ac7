//! Namespace key derivation
//!
//! One document per endpoint: the key is
//! `<prefix>_<version>_<endpoint domain>`. A new endpoint opens a new
//! namespace; nothing migrates between them.

/// Document format version embedded in every namespace key
pub const STORAGE_VERSION: &str = "1";

/// Extract the domain from an endpoint url
///
/// `https://www.dc.services.com/v2/track?auth=1` yields `dc.services.com`.
/// Anything without a scheme or path is returned as-is up to the first `/`.
pub fn endpoint_domain(endpoint: &str) -> &str {
    let rest = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    // a query string ends the host just like a path does
    let end = rest.find(['/', '?']).unwrap_or(rest.len());
    &rest[..end]
}

/// Build the namespace key for a prefix and endpoint url
pub fn storage_key(prefix: &str, endpoint: &str) -> String {
    format!("{}_{}_{}", prefix, STORAGE_VERSION, endpoint_domain(endpoint))
}
