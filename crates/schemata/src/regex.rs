//! Pattern matching for `pattern`, `patternProperties` and the `regex` type.
use std::fmt;

use crate::options::PatternEngine;

pub(crate) trait RegexEngine: Send + Sync {
    fn is_match(&self, text: &str) -> bool;

    fn pattern(&self) -> &str;
}

impl RegexEngine for fancy_regex::Regex {
    fn is_match(&self, text: &str) -> bool {
        // Backtracking limit errors count as a mismatch
        fancy_regex::Regex::is_match(self, text).unwrap_or(false)
    }

    fn pattern(&self) -> &str {
        self.as_str()
    }
}

impl RegexEngine for regex::Regex {
    fn is_match(&self, text: &str) -> bool {
        regex::Regex::is_match(self, text)
    }

    fn pattern(&self) -> &str {
        self.as_str()
    }
}

/// [`RegexEngine`] for literal patterns: either `starts_with` (prefix) or `==` (exact).
pub(crate) enum LiteralMatcher {
    Prefix { literal: String, original: String },
    Exact { exact: String, original: String },
}

impl RegexEngine for LiteralMatcher {
    #[inline]
    fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Prefix { literal, .. } => text.starts_with(literal.as_str()),
            Self::Exact { exact, .. } => text == exact.as_str(),
        }
    }

    fn pattern(&self) -> &str {
        match self {
            Self::Prefix { original, .. } | Self::Exact { original, .. } => original.as_str(),
        }
    }
}

/// Result of analyzing a regex pattern for literal-match optimizations.
#[derive(Debug, PartialEq)]
pub(crate) enum PatternOptimization {
    /// `^prefix`, matched with `starts_with(prefix)`.
    Prefix(String),
    /// `^exact$`, matched with `== exact`.
    Exact(String),
}

/// Analyze a pattern and return a [`PatternOptimization`] if one applies, or `None` if a full
/// regex engine is required.
///
/// Accepts unescaped alphanumeric chars, `-`, `_`, `/` and the escapes `\/`, `\-`, `\_`, `\$`,
/// `\.` in the literal body. A trailing unescaped `$` makes the match exact.
pub(crate) fn analyze_pattern(pattern: &str) -> Option<PatternOptimization> {
    let suffix = pattern.strip_prefix('^')?;
    let mut literal = String::new();
    let mut chars = suffix.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                c @ ('/' | '-' | '_' | '$' | '.') => literal.push(c),
                _ => return None,
            }
        } else if c == '$' {
            // Unescaped `$` is only valid as the end anchor
            if chars.peek().is_none() {
                return Some(PatternOptimization::Exact(literal));
            }
            return None;
        } else if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/') {
            literal.push(c);
        } else {
            return None;
        }
    }
    Some(PatternOptimization::Prefix(literal))
}

/// A compiled pattern.
pub(crate) struct Pattern(Box<dyn RegexEngine>);

impl Pattern {
    /// Compile `pattern` with the given engine, skipping the engine for literal patterns.
    pub(crate) fn new(pattern: &str, engine: PatternEngine) -> Result<Pattern, String> {
        let original = pattern.to_string();
        let matcher: Box<dyn RegexEngine> = match analyze_pattern(pattern) {
            Some(PatternOptimization::Prefix(literal)) => {
                Box::new(LiteralMatcher::Prefix { literal, original })
            }
            Some(PatternOptimization::Exact(exact)) => {
                Box::new(LiteralMatcher::Exact { exact, original })
            }
            None => match engine {
                PatternEngine::FancyRegex => Box::new(
                    fancy_regex::Regex::new(pattern).map_err(|error| error.to_string())?,
                ),
                PatternEngine::Regex => {
                    Box::new(regex::Regex::new(pattern).map_err(|error| error.to_string())?)
                }
            },
        };
        Ok(Pattern(matcher))
    }

    #[inline]
    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub(crate) fn as_str(&self) -> &str {
        self.0.pattern()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}
