//! Ontology → target identifier mapping.
//!
//! Deterministic mappings from OWL local names to class names, attribute
//! names, primitive type tokens and module paths.

use std::collections::BTreeSet;

use crate::config::NamingConfig;
use crate::ir::{ANY, PRIMITIVES};

/// Splits a dot- or slash-segmented module path into its non-empty segments.
pub fn module_segments(module: &str) -> impl Iterator<Item = &str> {
    module
        .split(['.', '/'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Normalizes a module path to dot-separated form.
///
/// E.g. `"grid_stix/assets"` → `"grid_stix.assets"`.
pub fn normalize_module(module: &str) -> String {
    module_segments(module).collect::<Vec<_>>().join(".")
}

/// Maps a datatype local name to its canonical primitive token, case-insensitively.
///
/// Returns `None` for anything that is not a known primitive.
pub fn primitive_token(name: &str) -> Option<&'static str> {
    let token = match name.to_ascii_lowercase().as_str() {
        "string" | "str" | "anyuri" | "datetime" | "datetimestamp" | "date" | "time"
        | "token" | "normalizedstring" | "language" => "str",
        "integer" | "int" | "long" | "short" | "byte" | "nonnegativeinteger"
        | "positiveinteger" | "nonpositiveinteger" | "negativeinteger" | "unsignedint"
        | "unsignedlong" | "unsignedshort" | "unsignedbyte" => "int",
        "float" | "double" | "decimal" => "float",
        "boolean" | "bool" => "bool",
        _ => return None,
    };
    debug_assert!(PRIMITIVES.contains(&token));
    Some(token)
}

/// Returns true if the range needs no import: a primitive or `Any`.
pub fn is_builtin_range(range: &str) -> bool {
    range == ANY || PRIMITIVES.contains(&range)
}

fn is_delimiter(ch: char) -> bool {
    ch == '-' || ch == '_' || ch.is_whitespace()
}

/// Upper-cases the first character, leaving the rest untouched.
fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Splits on internal capitalization boundaries: `"gridComponent"` →
/// `["grid", "Component"]`. Upper-case runs stay together with the
/// following segment boundary (`"OTDevice"` → `["O", "T", "Device"]`).
fn split_camel(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        if i > start && ch.is_uppercase() {
            parts.push(&s[start..i]);
            start = i;
        }
    }
    if start < s.len() {
        parts.push(&s[start..]);
    }
    parts
}

/// Keeps only the alphanumeric characters of `s`.
fn alphanumeric(s: &str) -> String {
    s.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Converts a raw local name to PascalCase, without acronym or keyword handling.
///
/// Hyphens, underscores and whitespace delimit words; each word is stripped
/// of punctuation, then capitalized. A name with no delimiter is split on
/// capitalization boundaries instead, so existing PascalCase survives
/// unchanged.
pub fn to_pascal_case(raw: &str) -> String {
    let name = raw.trim();
    let joined: String = if name.contains(is_delimiter) {
        name.split(is_delimiter)
            .map(alphanumeric)
            .filter(|p| !p.is_empty())
            .map(|p| capitalize(&p))
            .collect()
    } else {
        let stripped = alphanumeric(name);
        split_camel(&stripped).into_iter().map(upper_first).collect()
    };
    // Upper-casing can emit combining marks.
    alphanumeric(&joined)
}

/// Returns true if lower-casing `ch` changes it.
fn lowers(ch: char) -> bool {
    ch.is_uppercase() && !ch.to_lowercase().eq(std::iter::once(ch))
}

/// Converts a camelCase, PascalCase or delimited label into a snake_case identifier.
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev: Option<char> = None;
    for ch in s.trim().chars() {
        if is_delimiter(ch) {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
        } else if ch.is_alphanumeric() {
            if lowers(ch) {
                // Don't add underscore before consecutive uppercase (e.g., "HTTPPort")
                if let Some(p) = prev {
                    if (p.is_lowercase() || p.is_ascii_digit()) && !result.ends_with('_') {
                        result.push('_');
                    }
                }
            }
            result.extend(ch.to_lowercase().filter(|c| c.is_alphanumeric()));
        }
        prev = Some(ch);
    }
    result.trim_end_matches('_').to_string()
}

/// Returns true if `name` is a valid identifier: a letter or underscore,
/// then letters, digits or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Class and attribute naming rules for one run.
#[derive(Debug, Clone)]
pub struct Naming {
    reserved_suffix: String,
    reserved_attr_suffix: String,
    /// Longest key first, so `Otdevice` wins over `Ot`.
    acronyms: Vec<(String, String)>,
    reserved: BTreeSet<String>,
    reserved_members: BTreeSet<String>,
}

impl Naming {
    /// Builds the rules from configuration plus the target's reserved words.
    pub fn new(config: &NamingConfig, reserved: &[&str], reserved_members: &[&str]) -> Self {
        let mut acronyms: Vec<(String, String)> = config
            .acronyms
            .iter()
            .filter(|(k, _)| !k.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        acronyms.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self {
            reserved_suffix: config.reserved_suffix.clone(),
            reserved_attr_suffix: config.reserved_attr_suffix.clone(),
            acronyms,
            reserved: reserved.iter().map(|w| w.to_lowercase()).collect(),
            reserved_members: reserved_members.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Sanitizes a raw class local name.
    ///
    /// Returns an empty string when nothing usable remains; callers skip such
    /// classes rather than invent a name. Applying this twice gives the same
    /// result as applying it once.
    pub fn class_name(&self, raw: &str) -> String {
        let raw = raw.trim();
        if let Some(stem) = self.already_suffixed(raw) {
            if self.is_reserved(stem) && self.base_class_name(stem) == stem {
                return raw.to_string();
            }
        }
        let mut name = self.base_class_name(raw);
        if !name.is_empty() && self.is_reserved(&name) {
            name.push_str(&self.reserved_suffix);
        }
        name
    }

    /// Sanitizes a raw property local name into an attribute name.
    pub fn attr_name(&self, raw: &str) -> String {
        let mut name = to_snake_case(raw);
        if name.is_empty() {
            return name;
        }
        if self.is_reserved(&name) || self.reserved_members.contains(&name) {
            name.push_str(&self.reserved_attr_suffix);
        }
        name
    }

    fn already_suffixed<'a>(&self, raw: &'a str) -> Option<&'a str> {
        if self.reserved_suffix.is_empty() {
            return None;
        }
        raw.strip_suffix(self.reserved_suffix.as_str())
            .filter(|stem| !stem.is_empty())
    }

    fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(&name.to_lowercase())
    }

    fn base_class_name(&self, raw: &str) -> String {
        let mut name = self.apply_acronyms(&to_pascal_case(raw));
        // Some case mappings outside ASCII settle only after another pass.
        for _ in 0..4 {
            let next = self.apply_acronyms(&to_pascal_case(&name));
            if next == name {
                break;
            }
            name = next;
        }
        name
    }

    /// Replaces whole segments only: a key matches where it is followed by the
    /// end of the name or a non-lowercase character, so `It` rewrites
    /// `ItSystem` but leaves `Item` alone.
    fn apply_acronyms(&self, name: &str) -> String {
        if self.acronyms.is_empty() {
            return name.to_string();
        }
        let mut out = String::with_capacity(name.len());
        let mut rest = name;
        'scan: while !rest.is_empty() {
            for (key, replacement) in &self.acronyms {
                if let Some(after) = rest.strip_prefix(key.as_str()) {
                    let boundary = after.chars().next().map_or(true, |c| !c.is_lowercase());
                    let at_segment_start =
                        out.is_empty() || key.chars().next().is_some_and(char::is_uppercase);
                    if boundary && at_segment_start {
                        out.push_str(replacement);
                        rest = after;
                        continue 'scan;
                    }
                }
            }
            let mut chars = rest.chars();
            if let Some(ch) = chars.next() {
                out.push(ch);
                // Skip to the next segment start so keys never match mid-word.
                let tail = chars.as_str();
                let next = tail
                    .char_indices()
                    .find(|(_, c)| c.is_uppercase())
                    .map_or(tail.len(), |(i, _)| i);
                out.push_str(&tail[..next]);
                rest = &tail[next..];
            }
        }
        out
    }
}
