//! Slug canonicalization and candidate key generation
//!
//! Every attribute value, whether it comes from a shopper's selection or from
//! a stored assignment record, goes through [`sanitize`] so that query-time
//! and storage-time keys are byte-identical.

use crate::record::ingest::scalar_text;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::Value;

/// Delimiter joining slugs into a combination key
pub const COMBO_DELIMITER: &str = "_svipro_";

/// Canonicalize a raw label into a URL-safe slug
///
/// Compatible with the subset of WordPress `sanitize_title` that attribute
/// labels exercise: tags are stripped, Latin accents folded, entities dropped,
/// remaining non-ASCII percent-encoded, whitespace turned into dashes.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let text = strip_entities(&strip_tags(raw)).to_lowercase();

    let mut encoded = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            'a'..='z' | '0'..='9' | '_' | '-' => encoded.push(c),
            '.' => encoded.push('-'),
            '%' => {
                // Keep already-encoded octets, drop stray percent signs.
                let mut lookahead = chars.clone();
                match (lookahead.next(), lookahead.next()) {
                    (Some(h), Some(l)) if h.is_ascii_hexdigit() && l.is_ascii_hexdigit() => {
                        encoded.push('%');
                        encoded.push(h.to_ascii_lowercase());
                        encoded.push(l.to_ascii_lowercase());
                        chars.next();
                        chars.next();
                    }
                    _ => {}
                }
            }
            c if c.is_whitespace() => encoded.push(' '),
            c if c.is_ascii() => {}
            c => match fold_accent(c) {
                Some(folded) => encoded.push_str(folded),
                None => {
                    let mut buf = [0u8; 4];
                    let octets = utf8_percent_encode(c.encode_utf8(&mut buf), NON_ALPHANUMERIC);
                    encoded.push_str(&octets.to_string().to_ascii_lowercase());
                }
            },
        }
    }

    let mut slug = String::with_capacity(encoded.len());
    for c in encoded.chars() {
        let c = if c == ' ' { '-' } else { c };
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn strip_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail[1..].find(';') {
            Some(end) if end > 0 => rest = &tail[end + 2..],
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn fold_accent(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// Join already-canonical slugs into a combination key
#[must_use]
pub fn combination_key<S: AsRef<str>>(slugs: &[S]) -> String {
    let joined = slugs
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(COMBO_DELIMITER);
    sanitize(&joined)
}

/// Ordered candidate keys for one attribute selection
///
/// Single slugs come first in selection order, followed by prefix
/// combinations of increasing length; the full combination is last.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CandidateKeys {
    slug_count: usize,
    keys: Vec<String>,
}

impl CandidateKeys {
    /// All keys in emission order
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.keys
    }

    /// The individual slugs of the selection
    #[inline]
    #[must_use]
    pub fn slugs(&self) -> &[String] {
        &self.keys[..self.slug_count]
    }

    /// Combination keys (prefixes and the full key)
    #[inline]
    #[must_use]
    pub fn combinations(&self) -> &[String] {
        &self.keys[self.slug_count..]
    }

    /// Full-selection key, the last candidate emitted
    #[inline]
    #[must_use]
    pub fn full_key(&self) -> Option<&str> {
        self.keys.last().map(String::as_str)
    }

    /// Iterate keys in emission order
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.keys.iter()
    }

    /// Number of candidate keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the selection produced no keys
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn push_unique(&mut self, key: String) {
        if !key.is_empty() && !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }
}

impl<'a> IntoIterator for &'a CandidateKeys {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

/// Produce candidate keys for a selection of raw attribute values
pub fn normalize<I, S>(values: I) -> CandidateKeys
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keys = CandidateKeys::default();
    for value in values {
        let value = value.as_ref().trim();
        if value.is_empty() {
            continue;
        }
        keys.push_unique(sanitize(&value.to_lowercase()));
    }
    keys.slug_count = keys.keys.len();

    let slugs = keys.keys.clone();
    if slugs.len() > 1 {
        for len in 2..=slugs.len() {
            keys.push_unique(combination_key(&slugs[..len]));
        }
    }

    tracing::trace!(candidates = ?keys.keys, "normalized selection");
    keys
}

/// Produce candidate keys from loosely-typed values, ignoring non-scalars
pub fn normalize_scalars(values: &[Value]) -> CandidateKeys {
    normalize(values.iter().filter_map(scalar_text))
}
