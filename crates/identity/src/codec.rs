//! Compact identity bag codec
//!
//! Several identity fragments share one cookie slot using a flat
//! `key:value` list:
//!
//! ```text
//! uuid:6f1c0a52-...&emailHash:9e107d9d372bb6826bd81d3542a419d6
//! ^^^^ ^^^^^^^^^^^^ ^
//! key  value        segment separator
//! ```
//!
//! # Quirks
//!
//! The format has no escaping. Decoding splits each segment on the *first*
//! `:`, so a value containing `:` keeps everything after that colon, while a
//! value containing `&` cannot be represented at all. A string with fewer
//! than two segments is not a bag; it degrades to an opaque scalar, which is
//! how a bare `_snrs_uuid`-style value stays readable. Deployed cookies rely
//! on these rules, so they are kept as-is.

use indexmap::IndexMap;

/// Separator between segments
pub const SEGMENT_SEPARATOR: char = '&';

/// Separator between key and value inside a segment
pub const KEY_VALUE_SEPARATOR: char = ':';

/// Ordered key/value identity fields stored in one cookie
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityBag {
    fields: IndexMap<String, String>,
}

impl IdentityBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Set or overwrite a field, keeping its original position when present
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Remove a field
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.shift_remove(key)
    }

    /// Number of fields (including empty ones that encoding would drop)
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the bag has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode into the compact cookie format
    pub fn encode(&self) -> String {
        encode(self)
    }
}

impl<K, V> FromIterator<(K, V)> for IdentityBag
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Result of decoding a cookie string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Two or more segments, parsed into fields
    Bag(IdentityBag),
    /// Not a bag; the raw string unchanged
    Scalar(String),
}

impl Decoded {
    /// Borrow the bag, if decoding produced one
    pub fn as_bag(&self) -> Option<&IdentityBag> {
        match self {
            Self::Bag(bag) => Some(bag),
            Self::Scalar(_) => None,
        }
    }

    /// Turn the decoded value into a bag suitable for a read-modify-write
    ///
    /// A scalar normally starts an empty bag. A scalar that is a single
    /// `key:value` segment (what encoding a one-field bag produces) is lifted
    /// into a one-entry bag so the field survives the rewrite.
    pub fn into_bag(self) -> IdentityBag {
        match self {
            Self::Bag(bag) => bag,
            Self::Scalar(raw) => match raw.split_once(KEY_VALUE_SEPARATOR) {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                    std::iter::once((key, value)).collect()
                }
                _ => IdentityBag::new(),
            },
        }
    }
}

/// Encode fields as `key:value` pairs joined by `&`
///
/// Fields with an empty value are omitted, so an empty string can never be
/// stored deliberately.
pub fn encode(bag: &IdentityBag) -> String {
    bag.iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}{KEY_VALUE_SEPARATOR}{value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Decode a compact cookie string
///
/// Fewer than two segments degrades to [`Decoded::Scalar`]. Segments without
/// a colon decode to an empty value; a repeated key keeps the last value.
pub fn decode(raw: &str) -> Decoded {
    let segments: Vec<&str> = raw.split(SEGMENT_SEPARATOR).collect();
    if segments.len() < 2 {
        return Decoded::Scalar(raw.to_string());
    }

    let bag = segments
        .into_iter()
        .map(|segment| {
            segment
                .split_once(KEY_VALUE_SEPARATOR)
                .unwrap_or((segment, ""))
        })
        .collect();

    Decoded::Bag(bag)
}

/// Find the value of the first `key:` prefixed segment in a raw string
///
/// Works on both bags and single-segment scalars, which is how identifiers
/// are recovered from cookies without trusting them to decode as a bag.
pub fn find_segment<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    raw.split(SEGMENT_SEPARATOR).find_map(|segment| {
        segment
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(KEY_VALUE_SEPARATOR))
    })
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
