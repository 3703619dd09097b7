//! Canonical callable signatures.
//!
//! A signature is a matching key, never a semantic handle: `Type.name(p1, p2)`
//! with bare parameter names in declaration order.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::core::errors::EngineError;

/// Owning type, callable name, and ordered parameter names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallableSignature {
    /// Simple name of the declaring type; `None` for members of anonymous bodies
    pub owner: Option<String>,

    /// Method name, or the type name for constructors
    pub name: String,

    /// Parameter names in declaration order
    pub params: Vec<String>,

    /// Last parameter is variadic (`T... rest`)
    pub variadic: bool,
}

impl CallableSignature {
    pub fn new(
        owner: Option<impl Into<String>>,
        name: impl Into<String>,
        params: impl IntoIterator<Item = impl Into<String>>,
        variadic: bool,
    ) -> Self {
        Self {
            owner: owner.map(Into::into),
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
            variadic,
        }
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether a call with `arg_count` arguments can bind to this signature.
    pub fn accepts(&self, arg_count: usize) -> bool {
        if self.variadic {
            arg_count + 1 >= self.arity()
        } else {
            arg_count == self.arity()
        }
    }

    /// True when `index` aligns with the variadic parameter.
    /// Every position at or past the last parameter aligns with it.
    pub fn is_variadic_at(&self, index: usize) -> bool {
        self.variadic && index + 1 >= self.arity()
    }

    /// Parse a library stub such as `java.util.Map.put(key, value)` or
    /// `String.format(format, args...)`. Parameters may carry a type
    /// (`int count`); only the trailing identifier is kept.
    pub fn parse_stub(text: &str) -> Result<Self, EngineError> {
        let invalid = || EngineError::Stub(text.to_string());

        let trimmed = text.trim();
        let open = trimmed.find('(').ok_or_else(invalid)?;
        let inner = trimmed[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
        if inner.contains(['(', ')']) {
            return Err(invalid());
        }

        // `java.util.Map.put` keeps only the simple type name
        let head = trimmed[..open].trim_end();
        let (owner, name) = match head.rsplit_once('.') {
            Some((qualifier, name)) => (qualifier.rsplit('.').next().map(str::to_string), name),
            None => (None, head),
        };
        if !is_identifier(name) || owner.as_deref().is_some_and(|o| !is_identifier(o)) {
            return Err(invalid());
        }

        let mut variadic = false;
        let mut params = Vec::new();
        let raw = inner.trim();
        if !raw.is_empty() {
            let pieces: Vec<&str> = raw.split(',').map(str::trim).collect();
            let last = pieces.len() - 1;
            for (i, piece) in pieces.into_iter().enumerate() {
                // `Object... args` and bare `args...` both mark a spread
                let piece = match piece.rsplit_once("...") {
                    Some((before, after)) => {
                        if i != last {
                            return Err(invalid());
                        }
                        variadic = true;
                        if after.trim().is_empty() { before } else { after }
                    }
                    None => piece,
                };
                let word = piece.split_whitespace().last().unwrap_or("");
                if !is_identifier(word) {
                    return Err(invalid());
                }
                params.push(word.to_string());
            }
        }

        Ok(Self { owner, name: name.to_string(), params, variadic })
    }
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

impl fmt::Display for CallableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owner = self.owner.as_deref().unwrap_or("<anonymous>");
        write!(f, "{owner}.{}({}", self.name, self.params.iter().join(", "))?;
        if self.variadic {
            f.write_str("...")?;
        }
        f.write_str(")")
    }
}

/// Builds the text that blacklist rules are matched against.
pub struct SignatureFormatter;

impl SignatureFormatter {
    /// `Type.name(p1, p2, ...)`, or `None` when the owning type is unknown.
    /// An unformattable callable is treated as blacklisted by callers.
    pub fn format(signature: &CallableSignature) -> Option<String> {
        let owner = signature.owner.as_deref()?;
        Some(format!(
            "{owner}.{}({})",
            signature.name,
            signature.params.iter().join(", ")
        ))
    }
}
