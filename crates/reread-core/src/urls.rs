//! URL canonicalization for cache keys.
//!
//! The metadata cache is keyed by URL, so two saves of "the same" page must
//! produce the same key. Canonicalization is deliberately conservative:
//! parse, normalize what the URL standard normalizes (scheme/host case,
//! default ports, percent-encoding), and strip the fragment. Query strings
//! are kept because they routinely identify distinct documents.

use url::Url;

use crate::error::{Error, Result};

/// Parse and canonicalize a user-supplied URL into its cache-key form.
///
/// Accepts only `http` and `https` URLs with a host. The fragment is
/// dropped; everything else survives in the form `Url` serializes.
pub fn canonicalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("URL must not be empty".to_string()));
    }

    let mut url = Url::parse(trimmed)
        .map_err(|e| Error::InvalidInput(format!("invalid URL '{}': {}", trimmed, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::InvalidInput(format!(
                "unsupported URL scheme '{}': only http and https can be bookmarked",
                other
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(Error::InvalidInput(format!(
            "URL '{}' has no host",
            trimmed
        )));
    }

    url.set_fragment(None);
    Ok(url.into())
}
