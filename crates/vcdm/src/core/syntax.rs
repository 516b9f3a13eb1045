//! # Syntax Checks

use chrono::DateTime;
use url::Url;

/// Returns `true` if `value` is a syntactically valid absolute URI, including
/// non-hierarchical schemes such as `did:` and `urn:`.
#[must_use]
pub fn is_uri(value: &str) -> bool {
    Url::parse(value).is_ok()
}

/// Returns `true` if `value` is a data URI of the form
/// `data:<mimetype>,<payload>`.
#[must_use]
pub fn is_data_uri(value: &str) -> bool {
    value.strip_prefix("data:").is_some_and(|rest| rest.contains(','))
}

/// Returns `true` if `value` is an RFC 3339 date-time.
#[must_use]
pub fn is_rfc3339(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

/// Returns `true` if `value` is a well-formed BCP 47 language tag: a 2-8
/// letter primary language subtag (or the `x`/`i` prefix) followed by
/// hyphen-separated subtags of 1-8 letters or digits.
#[must_use]
pub fn is_language_tag(value: &str) -> bool {
    let mut subtags = value.split('-');
    let primary_ok = subtags.next().is_some_and(|primary| {
        let prefix = primary.eq_ignore_ascii_case("x") || primary.eq_ignore_ascii_case("i");
        (prefix || matches!(primary.len(), 2..=8))
            && primary.chars().all(|c| c.is_ascii_alphabetic())
    });
    primary_ok
        && subtags.all(|subtag| {
            matches!(subtag.len(), 1..=8) && subtag.chars().all(|c| c.is_ascii_alphanumeric())
        })
}
