//! Signature-shape blacklist.
//!
//! Rules match the *whole* formatted signature (`Type.name(p1, p2)`), never a
//! substring, and never look at call-site content. The same callable therefore
//! gets the same treatment at every call site.

use tracing::{debug, trace};

use crate::core::{
    errors::EngineError,
    signature::{CallableSignature, SignatureFormatter},
};

/// Built-in rules, in evaluation order.
///
/// Single-argument shapes are not listed: arity below two is gated before any
/// pattern runs (see [`BlacklistMatcher::is_blacklisted`]).
pub const DEFAULT_BLACKLIST: &[&str] = &[
    // Whole owning types whose calls read fine without names
    r"SimpleMoney\..*",
    r"Iterables\..*",
    r"Assert\..*",
    r"Assertions\..*",
    r"Preconditions\..*",
    r"Objects\..*",
    r"Optional\..*",
    r"(Strict)?Math\..*",
    // Paired parameter names that explain each other
    r".*\(expected[^,]*, actual[^,]*\)",
    r".*\(begin[^,]*, end[^,]*\)",
    r".*\(start[^,]*, end[^,]*\)",
    r".*\(first[^,]*, last[^,]*\)",
    r".*\(first[^,]*, second[^,]*\)",
    r".*\(from[^,]*, to[^,]*\)",
    r".*\(min[^,]*, max[^,]*\)",
    r".*\(low[^,]*, high[^,]*\)",
    r".*\(lower[^,]*, upper[^,]*\)",
    r".*\(left[^,]*, right[^,]*\)",
    r".*\(width, height\)",
    r".*\(row, col(umn)?\)",
    r".*\(key, value\)",
    r".*\(k, v\)",
    r".*\(name, value\)",
    r".*\(index, element\)",
    r".*\(format, arg[^,]*\)",
    r".*\(message, error\)",
    r".*\(message, cause\)",
    // Setters and map-like writes
    r".*\.set\([^,]*, [^,]*\)",
    r".*\.setProperty\([^,]*, [^,]*\)",
    r".*\.put\([^,]*, [^,]*\)",
    // Comparison families
    r".*\.compare\(.*\)",
    r".*\.compareTo\(.*\)",
    r".*\.equals\(.*\)",
    // Conversion and factory families
    r".*\.valueOf\(.*\)",
    r".*\.of\(.*\)",
    r".*\.create\(.*\)",
    // Literal collection builders
    r"Immutable.*\.(of|copyOf)\(.*\)",
    r"(Arrays|Collections)\.asList\(.*\)",
    r"(List|Set|Map)\.(of|ofEntries|entry)\(.*\)",
    r"String\.format\(.*\)",
    r".*\.(substring|subList|subSequence)\(.*\)",
];

/// One compiled rule; keeps its source text for listing.
#[derive(Debug, Clone)]
pub struct BlacklistRule {
    source: String,
    regex: regex::Regex,
}

impl BlacklistRule {
    /// Compile `pattern` anchored at both ends.
    pub fn new(pattern: &str) -> Result<Self, EngineError> {
        let regex = regex::Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            EngineError::Pattern { pattern: pattern.to_string(), source }
        })?;
        Ok(Self { source: pattern.to_string(), regex })
    }

    pub fn matches(&self, signature: &str) -> bool {
        self.regex.is_match(signature)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Ordered rule set.
#[derive(Debug, Clone, Default)]
pub struct BlacklistMatcher {
    rules: Vec<BlacklistRule>,
}

impl BlacklistMatcher {
    /// Matcher holding [`DEFAULT_BLACKLIST`].
    pub fn builtin() -> Result<Self, EngineError> {
        Self::from_patterns(DEFAULT_BLACKLIST.iter().copied())
    }

    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .map(|p| BlacklistRule::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Append rules after the existing ones.
    pub fn extend<I, S>(&mut self, patterns: I) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for p in patterns {
            self.rules.push(BlacklistRule::new(p.as_ref())?);
        }
        Ok(())
    }

    /// True if any rule matches the full signature text.
    pub fn matches(&self, signature: &str) -> bool {
        self.rules.iter().any(|rule| {
            let hit = rule.matches(signature);
            if hit {
                trace!(rule = rule.as_str(), signature, "blacklist rule matched");
            }
            hit
        })
    }

    /// Whole-call exemption check.
    ///
    /// Fewer than two parameters is the primary gate; an unknown owning type
    /// fails closed; otherwise the formatted signature goes through the rules.
    pub fn is_blacklisted(&self, signature: &CallableSignature) -> bool {
        if signature.arity() < 2 {
            return true;
        }
        let Some(text) = SignatureFormatter::format(signature) else {
            debug!(callable = %signature, "owning type unavailable; treating as blacklisted");
            return true;
        };
        debug!(signature = %text, "method signature");
        self.matches(&text)
    }

    pub fn rules(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(BlacklistRule::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
