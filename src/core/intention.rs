//! Cursor-driven annotation.
//!
//! Same fix as the inspection, but on request: any argument of a resolvable
//! call can be annotated, literal or not, blacklisted shape or not. Only the
//! parameter has to exist and the argument must not already carry a comment.

use tracing::debug;
use tree_sitter::{Node, Tree};

use crate::{
    core::{
        adjacency::{CommentAdjacencyScanner, is_comment},
        errors::AnnotateError,
        fix::{ArgumentRef, CommentFixApplier, FixOutcome, JavaDocument},
        resolve::CallResolver,
    },
    infra::line_index::NewlineIndex,
};

/// What the cursor resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationTarget {
    pub argument: ArgumentRef,
    pub index: usize,
    pub parameter: String,
    pub callable: String,
}

/// Find the argument under `byte` and the parameter it fills.
pub fn target_at<R: CallResolver + ?Sized>(
    resolver: &R,
    tree: &Tree,
    source: &[u8],
    byte: usize,
) -> Result<AnnotationTarget, &'static str> {
    // A cursor just past an argument still means that argument
    let (argument, list) = match locate(tree, byte) {
        Ok(found) => found,
        Err(_) if byte > 0 => locate(tree, byte - 1)?,
        Err(reason) => return Err(reason),
    };

    let call = list.parent().ok_or("argument list has no call")?;
    let signature = resolver.resolve(call, source).ok_or("call does not resolve to a single callable")?;
    let index = CommentAdjacencyScanner::position_of(argument);
    let Some(parameter) = signature.params.get(index) else {
        return Err("no parameter at this position");
    };
    if CommentAdjacencyScanner::has_preceding_comment(argument) {
        return Err("argument already has a comment");
    }

    Ok(AnnotationTarget {
        argument: ArgumentRef::of(argument),
        index,
        parameter: parameter.clone(),
        callable: signature.to_string(),
    })
}

/// Innermost argument list around `byte` and the argument on the path to it.
fn locate(tree: &Tree, byte: usize) -> Result<(Node<'_>, Node<'_>), &'static str> {
    let mut node = tree
        .root_node()
        .descendant_for_byte_range(byte, byte)
        .ok_or("position is outside the syntax tree")?;
    while let Some(parent) = node.parent() {
        if parent.kind() == "argument_list" {
            return if node.is_named() && !is_comment(node) {
                Ok((node, parent))
            } else {
                Err("cursor is not on an argument")
            };
        }
        node = parent;
    }
    Err("cursor is not inside an argument list")
}

/// Annotate the argument at a 1-based `line:column` of `doc`.
pub fn annotate_at<R: CallResolver + ?Sized>(
    doc: &mut JavaDocument<'_>,
    resolver: &R,
    applier: &CommentFixApplier<'_>,
    line: usize,
    column: usize,
) -> Result<(AnnotationTarget, FixOutcome), AnnotateError> {
    let bytes = doc.source().as_bytes();
    let byte = NewlineIndex::build(bytes)
        .byte_of_position(line, column, bytes)
        .ok_or(AnnotateError::OutOfRange { line, column })?;

    let target = target_at(resolver, doc.tree(), bytes, byte)
        .map_err(|reason| AnnotateError::Unavailable { line, column, reason })?;
    debug!(parameter = %target.parameter, callable = %target.callable, "annotating at cursor");

    let outcome = applier.apply(doc, target.argument, &target.parameter)?;
    Ok((target, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::resolve::SignatureIndex, infra::settings::MemorySettings, parsers::JavaParser};

    const SRC: &str = "class A {\n  void f(String name, int size) {}\n  void g(int q) { f(\"x\", q); f(\"y\", /* size= */ 2); }\n}\n";

    fn run(line: usize, column: usize) -> Result<String, AnnotateError> {
        let parser = JavaParser::new().unwrap();
        let mut doc = JavaDocument::parse(&parser, SRC).unwrap();
        let mut index = SignatureIndex::new();
        index.add_declarations(parser.declarations(doc.tree(), SRC).unwrap());
        let settings = MemorySettings::new();
        annotate_at(&mut doc, &index, &CommentFixApplier::new(&settings), line, column)?;
        Ok(doc.into_source())
    }

    fn column_of(needle: &str) -> usize {
        SRC.lines().nth(2).unwrap().find(needle).unwrap() + 1
    }

    #[test]
    fn any_argument_can_be_annotated_on_request() {
        let out = run(3, column_of("\"x\"")).unwrap();
        assert!(out.contains("f(/* name= */ \"x\", q)"), "{out}");
    }

    #[test]
    fn cursor_just_after_argument_still_applies() {
        let out = run(3, column_of("q);") + 1).unwrap();
        assert!(out.contains("f(\"x\", /* size= */ q)"), "{out}");
    }

    #[test]
    fn commented_argument_is_unavailable() {
        let err = run(3, column_of("2)")).unwrap_err();
        assert!(matches!(err, AnnotateError::Unavailable { reason: "argument already has a comment", .. }));
    }

    #[test]
    fn outside_any_call_is_unavailable() {
        let err = run(1, 1).unwrap_err();
        assert!(matches!(err, AnnotateError::Unavailable { .. }));
        assert!(matches!(run(9, 1).unwrap_err(), AnnotateError::OutOfRange { .. }));
    }
}
