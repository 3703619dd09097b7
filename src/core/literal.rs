//! Literal classification for argument expressions.

use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;
use tree_sitter::Node;

use crate::core::errors::EngineError;

/// Types whose literals document themselves.
pub const DEFAULT_EXEMPT_TYPES: &[&str] = &["java.lang.String", "char"];

/// Zero-argument factory calls that stand in for a literal "nothing".
const SENTINEL_SHAPES: &str = concat!(
    r"^(?:",
    r"(?:java\.util\.)?Optional\.(?:<[a-zA-Z0-9]*>)?empty\(\)",
    r"|",
    r"(?:com\.google\.common\.base\.)?Optional\.(?:<[a-zA-Z0-9]*>)?absent\(\)",
    r")$"
);

/// What an argument expression is, for annotation purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralVerdict {
    /// Number, boolean, or `null` token
    PlainLiteral,

    /// String or character literal
    ExemptTypeLiteral,

    /// `Optional.empty()` / `Optional.absent()` and qualified variants
    EmptySentinel,

    /// `(T) operand`, classified by its operand
    CastOfLiteral(Box<LiteralVerdict>),

    NotLiteral,
}

impl LiteralVerdict {
    /// Plain literals, sentinels, and casts around either need a comment.
    pub fn needs_annotation(&self) -> bool {
        match self {
            LiteralVerdict::PlainLiteral | LiteralVerdict::EmptySentinel => true,
            LiteralVerdict::CastOfLiteral(inner) => inner.needs_annotation(),
            LiteralVerdict::ExemptTypeLiteral | LiteralVerdict::NotLiteral => false,
        }
    }
}

/// Static type text of a literal token, or `None` for anything else.
pub fn literal_type(node: Node<'_>, source: &[u8]) -> Option<&'static str> {
    let text = || node.utf8_text(source).unwrap_or("");
    let ty = match node.kind() {
        "string_literal" | "text_block" => "java.lang.String",
        "character_literal" => "char",
        "decimal_integer_literal"
        | "hex_integer_literal"
        | "octal_integer_literal"
        | "binary_integer_literal" => {
            if text().ends_with(['l', 'L']) {
                "long"
            } else {
                "int"
            }
        }
        "decimal_floating_point_literal" | "hex_floating_point_literal" => {
            if text().ends_with(['f', 'F']) {
                "float"
            } else {
                "double"
            }
        }
        "true" | "false" => "boolean",
        "null_literal" => "null",
        _ => return None,
    };
    Some(ty)
}

/// Classifies argument expressions.
#[derive(Debug, Clone)]
pub struct LiteralClassifier {
    exempt_types: HashSet<String>,
    sentinel: Regex,
}

impl LiteralClassifier {
    /// Classifier with [`DEFAULT_EXEMPT_TYPES`].
    pub fn builtin() -> Result<Self, EngineError> {
        Self::new(DEFAULT_EXEMPT_TYPES.iter().copied())
    }

    pub fn new<I, S>(exempt_types: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sentinel = Regex::new(SENTINEL_SHAPES).map_err(|source| EngineError::Pattern {
            pattern: SENTINEL_SHAPES.to_string(),
            source,
        })?;
        Ok(Self { exempt_types: exempt_types.into_iter().map(Into::into).collect(), sentinel })
    }

    pub fn exempt_types(&self) -> impl Iterator<Item = &str> {
        self.exempt_types.iter().map(String::as_str)
    }

    pub fn classify(&self, expr: Node<'_>, source: &[u8]) -> LiteralVerdict {
        if let Some(ty) = literal_type(expr, source) {
            return if self.is_exempt(ty) {
                LiteralVerdict::ExemptTypeLiteral
            } else {
                LiteralVerdict::PlainLiteral
            };
        }

        match expr.kind() {
            "method_invocation" => match expr.utf8_text(source) {
                Ok(text) if self.sentinel.is_match(text) => LiteralVerdict::EmptySentinel,
                _ => LiteralVerdict::NotLiteral,
            },
            "cast_expression" => match expr.child_by_field_name("value") {
                Some(operand) => {
                    LiteralVerdict::CastOfLiteral(Box::new(self.classify(operand, source)))
                }
                None => LiteralVerdict::NotLiteral,
            },
            _ => LiteralVerdict::NotLiteral,
        }
    }

    /// Exact type text, or the simple name of a qualified exempt type.
    fn is_exempt(&self, ty: &str) -> bool {
        let simple = ty.rsplit('.').next();
        self.exempt_types.iter().map(String::as_str).any(|exempt| {
            exempt == ty || exempt.rsplit('.').next() == Some(ty) || simple == Some(exempt)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::JavaParser;

    /// Classify every argument of the call `f(args_src)`.
    fn classify_args(args_src: &str) -> Vec<LiteralVerdict> {
        let src = format!("class T {{ void m() {{ f({args_src}); }} }}");
        let parser = JavaParser::new().unwrap();
        let tree = parser.parse(&src).unwrap();
        let classifier = LiteralClassifier::builtin().unwrap();

        let mut out = Vec::new();
        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            if node.kind() == "argument_list" && out.is_empty() {
                let mut cursor = node.walk();
                for arg in node.named_children(&mut cursor) {
                    if !arg.kind().ends_with("comment") {
                        out.push(classifier.classify(arg, src.as_bytes()));
                    }
                }
                break;
            }
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor));
        }
        out
    }

    #[test]
    fn primitives_are_plain_literals() {
        let v = classify_args("0, 0f, 0.0, 0L, false, true, null, 0x1F");
        assert!(v.iter().all(|x| *x == LiteralVerdict::PlainLiteral), "{v:?}");
    }

    #[test]
    fn strings_and_chars_are_exempt() {
        let v = classify_args(r#""hello", 'a', """
            block
            """"#);
        assert!(v.iter().all(|x| *x == LiteralVerdict::ExemptTypeLiteral), "{v:?}");
        assert!(v.iter().all(|x| !x.needs_annotation()));
    }

    #[test]
    fn casts_wrap_their_operand() {
        let v = classify_args("(short) 0, (Object) \"s\", (int) x");
        assert_eq!(v[0], LiteralVerdict::CastOfLiteral(Box::new(LiteralVerdict::PlainLiteral)));
        assert!(v[0].needs_annotation());
        assert!(!v[1].needs_annotation());
        assert_eq!(v[2], LiteralVerdict::CastOfLiteral(Box::new(LiteralVerdict::NotLiteral)));
        assert!(!v[2].needs_annotation());
    }

    #[test]
    fn optional_sentinels_in_all_spellings() {
        let v = classify_args(
            "Optional.empty(), Optional.<String>empty(), java.util.Optional.empty(), \
             com.google.common.base.Optional.<String>absent(), Optional.absent()",
        );
        assert!(v.iter().all(|x| *x == LiteralVerdict::EmptySentinel), "{v:?}");
    }

    #[test]
    fn other_calls_and_expressions_are_not_literals() {
        let v = classify_args("Optional.of(5), new Object(), x, -1, (1), a + 2");
        assert!(v.iter().all(|x| *x == LiteralVerdict::NotLiteral), "{v:?}");
    }

    #[test]
    fn simple_name_exemption_matches_qualified_default() -> Result<(), EngineError> {
        let c = LiteralClassifier::new(["String"])?;
        assert!(c.is_exempt("java.lang.String"));
        assert!(!c.is_exempt("int"));
        Ok(())
    }
}
