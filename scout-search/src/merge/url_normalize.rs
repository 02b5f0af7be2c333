//! URL keys for result deduplication.
//!
//! Two results refer to the same page when their URLs agree after the
//! query string and fragment are removed and the whole URL is lowercased.
//! Tracking parameters, pagination hints and referral tags therefore
//! never produce duplicates.

use url::Url;

/// Compute the deduplication key for a URL.
///
/// Applies the following transformations:
///
/// 1. Remove the query string and fragment.
/// 2. Remove a trailing slash from the path (unless the path is exactly `"/"`).
/// 3. Lowercase the result.
///
/// Default ports (`:80` for HTTP, `:443` for HTTPS) are already dropped by
/// [`Url::parse`].
///
/// If the input cannot be parsed as a URL, the trimmed, lowercased input is returned.
///
/// # Examples
///
/// ```
/// use scout_search::merge::url_normalize::dedup_key;
///
/// let a = dedup_key("https://x.com/a?ref=1");
/// let b = dedup_key("https://X.com/A/?ref=2#top");
/// assert_eq!(a, b);
/// ```
pub fn dedup_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        return trimmed.to_lowercase();
    };

    parsed.set_fragment(None);
    parsed.set_query(None);

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(&path[..path.len() - 1]);
    }

    parsed.to_string().to_lowercase()
}
