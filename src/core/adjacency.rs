//! Comment adjacency inside argument lists.
//!
//! Comments are not children of argument expressions; tree-sitter leaves them as
//! siblings interleaved with `(`, `,`, `)` and the expressions themselves:
//!
//! ```text
//! argument_list: "(" block_comment decimal_integer_literal "," decimal_integer_literal ")"
//! ```
//!
//! So "is this argument commented" is a walk over siblings up to the nearest
//! delimiter token, and "which position is this" is a count of `,` tokens.

use tree_sitter::Node;

use crate::core::errors::AnalyzeError;

/// Node kinds tree-sitter-java uses for comments (older grammars use `comment`).
pub fn is_comment(node: Node<'_>) -> bool {
    matches!(node.kind(), "block_comment" | "line_comment" | "comment")
}

fn is_delimiter(node: Node<'_>) -> bool {
    matches!(node.kind(), "(" | "," | ")")
}

/// Sibling-walking helpers around one argument expression.
pub struct CommentAdjacencyScanner;

impl CommentAdjacencyScanner {
    /// True if a comment sits between the argument and the `(`/`,` before it.
    pub fn has_preceding_comment(argument: Node<'_>) -> bool {
        Self::preceding_comments(argument).next().is_some()
    }

    /// Comments before the argument, nearest first, stopping at `(` or `,`.
    pub fn preceding_comments<'t>(argument: Node<'t>) -> impl Iterator<Item = Node<'t>> + 't {
        std::iter::successors(argument.prev_sibling(), |n| n.prev_sibling())
            .take_while(|n| !is_delimiter(*n))
            .filter(|n| is_comment(*n))
    }

    /// Comments after the argument, nearest first, stopping at `,` or `)`.
    pub fn trailing_comments<'t>(argument: Node<'t>) -> impl Iterator<Item = Node<'t>> + 't {
        std::iter::successors(argument.next_sibling(), |n| n.next_sibling())
            .take_while(|n| !is_delimiter(*n))
            .filter(|n| is_comment(*n))
    }

    /// Argument expressions of `list` paired with their comma-counted position.
    ///
    /// Positions come from delimiter tokens, not from expression indices, so a
    /// comment between a comma and its expression never shifts alignment.
    pub fn positions<'t>(list: Node<'t>) -> Result<Vec<(usize, Node<'t>)>, AnalyzeError> {
        let mut out = Vec::with_capacity(list.named_child_count());
        let mut position = 0usize;
        let mut filled = false;

        let mut cursor = list.walk();
        for child in list.children(&mut cursor) {
            if child.is_error() || child.is_missing() {
                return Err(AnalyzeError::Malformed { byte: child.start_byte() });
            }
            match child.kind() {
                "(" | ")" => {}
                "," => {
                    position += 1;
                    filled = false;
                }
                _ if is_comment(child) => {}
                _ => {
                    if filled {
                        return Err(AnalyzeError::MissingDelimiter { index: position });
                    }
                    filled = true;
                    out.push((position, child));
                }
            }
        }
        Ok(out)
    }

    /// Comma-counted position of `argument` inside its argument list.
    pub fn position_of(argument: Node<'_>) -> usize {
        std::iter::successors(argument.prev_sibling(), |n| n.prev_sibling())
            .filter(|n| n.kind() == ",")
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::JavaParser;

    fn with_args<R>(args_src: &str, f: impl FnOnce(Node<'_>) -> R) -> R {
        let src = format!("class T {{ void m() {{ f({args_src}); }} }}");
        let tree = JavaParser::new().unwrap().parse(&src).unwrap();
        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            if node.kind() == "argument_list" {
                return f(node);
            }
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor));
        }
        panic!("no argument list in {src}");
    }

    #[test]
    fn leading_block_comment_marks_argument() {
        with_args("/* a= */ 1, 2", |list| {
            let pos = CommentAdjacencyScanner::positions(list).unwrap();
            assert_eq!(pos.len(), 2);
            assert!(CommentAdjacencyScanner::has_preceding_comment(pos[0].1));
            assert!(!CommentAdjacencyScanner::has_preceding_comment(pos[1].1));
        });
    }

    #[test]
    fn trailing_comment_does_not_mark_next_argument() {
        with_args("1 /* a= */, 2", |list| {
            let pos = CommentAdjacencyScanner::positions(list).unwrap();
            assert!(!CommentAdjacencyScanner::has_preceding_comment(pos[1].1));
            assert_eq!(CommentAdjacencyScanner::trailing_comments(pos[0].1).count(), 1);
        });
    }

    #[test]
    fn positions_count_commas_not_expressions() {
        with_args("/* x */ 1, /* y */ /* z */ 2,\n // w\n 3", |list| {
            let pos = CommentAdjacencyScanner::positions(list).unwrap();
            let idx: Vec<usize> = pos.iter().map(|(i, _)| *i).collect();
            assert_eq!(idx, vec![0, 1, 2]);
            assert_eq!(CommentAdjacencyScanner::position_of(pos[2].1), 2);
            assert_eq!(CommentAdjacencyScanner::preceding_comments(pos[1].1).count(), 2);
            assert!(CommentAdjacencyScanner::has_preceding_comment(pos[2].1));
        });
    }

    #[test]
    fn nested_call_comments_stay_inside_their_own_list() {
        with_args("g(/* inner */ 1), 2", |list| {
            let pos = CommentAdjacencyScanner::positions(list).unwrap();
            assert!(!CommentAdjacencyScanner::has_preceding_comment(pos[0].1));
        });
    }

    #[test]
    fn empty_list_has_no_positions() {
        with_args("", |list| {
            assert!(CommentAdjacencyScanner::positions(list).unwrap().is_empty());
        });
    }
}
