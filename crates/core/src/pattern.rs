//! Glob matching against compound keys.
//!
//! `*` matches any run of characters, `?` exactly one, everything else literally and
//! case-sensitively. A pattern without any wildcard is a substring search; a pattern with
//! at least one wildcard must match the whole key. A wildcard pattern that names no
//! namespace (no `:`) may instead match the whole name part of the key.

use regex::Regex;

use crate::GlueError;

#[derive(Debug, Clone)]
pub enum Pattern {
    /// Bare fragment, implicitly `*fragment*`.
    Substring(String),
    /// Anchored glob translated to a regex.
    Glob { raw: String, regex: Regex, any_namespace: bool },
}

impl Pattern {
    pub fn new(raw: &str) -> Result<Self, GlueError> {
        if !raw.contains(['*', '?']) {
            return Ok(Pattern::Substring(raw.to_string()));
        }
        let mut re = String::with_capacity(raw.len() * 2 + 8);
        re.push_str("^(?s:");
        for c in raw.chars() {
            match c {
                '*' => re.push_str(".*"),
                '?' => re.push('.'),
                _ => re.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
            }
        }
        re.push_str(")$");
        let regex = Regex::new(&re).map_err(|e| GlueError::InvalidPattern(format!("{}: {}", raw, e)))?;
        Ok(Pattern::Glob { raw: raw.to_string(), regex, any_namespace: !raw.contains(':') })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Substring(s) => s,
            Pattern::Glob { raw, .. } => raw,
        }
    }

    pub fn is_match(&self, key: &str) -> bool {
        match self {
            Pattern::Substring(s) => key.contains(s.as_str()),
            Pattern::Glob { regex, any_namespace, .. } => {
                regex.is_match(key)
                    || (*any_namespace && key.split_once(':').is_some_and(|(_, name)| regex.is_match(name)))
            }
        }
    }
}

/// One-shot form of [`Pattern::is_match`]. An uncompilable pattern matches nothing.
pub fn matches(pattern: &str, key: &str) -> bool {
    Pattern::new(pattern).map(|p| p.is_match(key)).unwrap_or(false)
}
