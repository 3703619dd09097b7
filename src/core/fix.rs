//! Annotation fix.
//!
//! [`JavaDocument`] is source text plus its tree, with the three mutations the
//! fix needs: insert before a byte, delete a byte range, and reformat argument
//! lists in a range. Every mutation re-parses, so node lookups always see the
//! current text. Arguments are addressed by [`ArgumentRef`] byte spans rather
//! than nodes, since nodes die with the tree they came from.

use std::ops::Range;

use tracing::{debug, trace};
use tree_sitter::{Node, Tree};

use crate::{
    core::{
        adjacency::CommentAdjacencyScanner,
        errors::EngineError,
        template::{TemplateSettings, normalize_comment},
    },
    infra::settings::SettingsStore,
    parsers::JavaParser,
};

/// Byte span of one argument expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArgumentRef {
    pub start: usize,
    pub end: usize,
}

impl ArgumentRef {
    pub fn of(node: Node<'_>) -> Self {
        Self { start: node.start_byte(), end: node.end_byte() }
    }

    /// This span after `edits` were applied to the text. An insertion
    /// right at `end` lands after the argument, not inside it.
    pub fn shifted(self, edits: &[TextEdit]) -> Self {
        let end = self.end;
        Self {
            start: shift(self.start, edits, |e| e.range.end <= self.start),
            end: shift(end, edits, |e| e.range.end < end || (e.range.end == end && e.range.start < end)),
        }
    }
}

/// One replacement, in pre-edit coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub replacement: String,
}

fn shift(offset: usize, edits: &[TextEdit], before: impl Fn(&TextEdit) -> bool) -> usize {
    edits
        .iter()
        .filter(|e| before(e))
        .fold(offset as isize, |acc, e| {
            acc + e.replacement.len() as isize - e.range.len() as isize
        })
        .max(0) as usize
}

/// Java source with a live syntax tree.
pub struct JavaDocument<'p> {
    parser: &'p JavaParser,
    source: String,
    tree: Tree,
}

impl<'p> JavaDocument<'p> {
    pub fn parse(parser: &'p JavaParser, source: impl Into<String>) -> Result<Self, EngineError> {
        let source = source.into();
        let tree = parser.parse(&source)?;
        Ok(Self { parser, source, tree })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_source(self) -> String {
        self.source
    }

    fn reparse(&mut self) -> Result<(), EngineError> {
        self.tree = self.parser.parse(&self.source)?;
        Ok(())
    }

    /// Insert `text` at byte `at`.
    pub fn insert_before(&mut self, at: usize, text: &str) -> Result<(), EngineError> {
        if at > self.source.len() || !self.source.is_char_boundary(at) {
            return Err(EngineError::StaleArgument { start: at, end: at });
        }
        self.source.insert_str(at, text);
        self.reparse()
    }

    /// Remove `range` from the text.
    pub fn delete(&mut self, range: Range<usize>) -> Result<(), EngineError> {
        if range.end > self.source.len()
            || !self.source.is_char_boundary(range.start)
            || !self.source.is_char_boundary(range.end)
        {
            return Err(EngineError::StaleArgument { start: range.start, end: range.end });
        }
        self.source.replace_range(range, "");
        self.reparse()
    }

    /// Normalize single-line gaps between the tokens of every argument list
    /// inside `range`. Returns the applied edits in pre-edit coordinates.
    pub fn reformat_range(&mut self, range: Range<usize>) -> Result<Vec<TextEdit>, EngineError> {
        let mut edits = Vec::new();
        let mut stack = vec![self.tree.root_node()];
        while let Some(node) = stack.pop() {
            if node.end_byte() <= range.start || node.start_byte() >= range.end {
                continue;
            }
            if node.kind() == "argument_list"
                && node.start_byte() >= range.start
                && node.end_byte() <= range.end
            {
                gap_edits(node, self.source.as_bytes(), &mut edits);
            }
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor));
        }
        if edits.is_empty() {
            return Ok(edits);
        }

        edits.sort_by_key(|e| e.range.start);
        for edit in edits.iter().rev() {
            self.source.replace_range(edit.range.clone(), &edit.replacement);
        }
        trace!(edits = edits.len(), "argument list reformatted");
        self.reparse()?;
        Ok(edits)
    }

    /// The argument expression spanning exactly `arg`.
    pub fn argument(&self, arg: ArgumentRef) -> Result<Node<'_>, EngineError> {
        let stale = || EngineError::StaleArgument { start: arg.start, end: arg.end };
        let mut node = self
            .tree
            .root_node()
            .descendant_for_byte_range(arg.start, arg.end)
            .ok_or_else(stale)?;
        while let Some(parent) = node.parent() {
            if parent.kind() == "argument_list" {
                break;
            }
            node = parent;
        }
        let in_list = node.parent().is_some_and(|p| p.kind() == "argument_list");
        if in_list && node.start_byte() == arg.start && node.end_byte() == arg.end {
            Ok(node)
        } else {
            Err(stale())
        }
    }
}

/// Gap policy: nothing after `(` or before `,`/`)`, one space elsewhere.
/// Gaps spanning lines are left as written.
fn gap_edits(list: Node<'_>, source: &[u8], edits: &mut Vec<TextEdit>) {
    let mut cursor = list.walk();
    let children: Vec<Node> = list.children(&mut cursor).collect();
    for pair in children.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let gap = prev.end_byte()..next.start_byte();
        let Some(current) = source.get(gap.clone()) else { continue };
        if current.contains(&b'\n') || !current.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let want = if prev.kind() == "(" || matches!(next.kind(), "," | ")") { "" } else { " " };
        if current != want.as_bytes() {
            edits.push(TextEdit { range: gap, replacement: want.to_string() });
        }
    }
}

/// Comment insertion and adjacency helpers over an editable document.
pub trait CommentEditing {
    /// A comment in `arg`'s preceding window normalizes to the same text.
    fn has_matching_preceding_comment(&self, arg: ArgumentRef, text: &str) -> Result<bool, EngineError>;

    /// Insert `text` and a space before `arg`; returns the shifted argument.
    fn insert_comment_before(&mut self, arg: ArgumentRef, text: &str) -> Result<ArgumentRef, EngineError>;

    /// Delete the first trailing comment of `arg` that normalizes to `text`.
    fn remove_trailing_duplicate(&mut self, arg: ArgumentRef, text: &str) -> Result<bool, EngineError>;

    /// Reformat the call owning `arg`; returns the argument's new span.
    fn reformat_call(&mut self, arg: ArgumentRef) -> Result<ArgumentRef, EngineError>;
}

impl CommentEditing for JavaDocument<'_> {
    fn has_matching_preceding_comment(&self, arg: ArgumentRef, text: &str) -> Result<bool, EngineError> {
        let wanted = normalize_comment(text);
        let node = self.argument(arg)?;
        let bytes = self.source.as_bytes();
        Ok(CommentAdjacencyScanner::preceding_comments(node)
            .any(|c| c.utf8_text(bytes).is_ok_and(|t| normalize_comment(t) == wanted)))
    }

    fn insert_comment_before(&mut self, arg: ArgumentRef, text: &str) -> Result<ArgumentRef, EngineError> {
        self.argument(arg)?;
        let inserted = format!("{text} ");
        self.insert_before(arg.start, &inserted)?;
        Ok(ArgumentRef { start: arg.start + inserted.len(), end: arg.end + inserted.len() })
    }

    fn remove_trailing_duplicate(&mut self, arg: ArgumentRef, text: &str) -> Result<bool, EngineError> {
        let wanted = normalize_comment(text);
        let span = {
            let node = self.argument(arg)?;
            let bytes = self.source.as_bytes();
            CommentAdjacencyScanner::trailing_comments(node)
                .find(|c| c.utf8_text(bytes).is_ok_and(|t| normalize_comment(t) == wanted))
                .map(|c| {
                    // Take the whitespace before the comment with it
                    let from = c.prev_sibling().map_or(c.start_byte(), |p| p.end_byte());
                    from..c.end_byte()
                })
        };
        match span {
            Some(range) => {
                debug!(start = range.start, end = range.end, "removing trailing duplicate comment");
                self.delete(range)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn reformat_call(&mut self, arg: ArgumentRef) -> Result<ArgumentRef, EngineError> {
        let call = {
            let node = self.argument(arg)?;
            let list = node.parent().ok_or(EngineError::StaleArgument { start: arg.start, end: arg.end })?;
            list.parent().unwrap_or(list).byte_range()
        };
        let edits = self.reformat_range(call)?;
        Ok(arg.shifted(&edits))
    }
}

/// Result of one [`CommentFixApplier::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixOutcome {
    pub inserted: bool,
    pub removed_duplicate: bool,
    /// Where the argument sits after the fix
    pub argument: ArgumentRef,
}

/// Inserts the rendered template before an argument.
pub struct CommentFixApplier<'s> {
    settings: &'s dyn SettingsStore,
}

impl<'s> CommentFixApplier<'s> {
    pub fn new(settings: &'s dyn SettingsStore) -> Self {
        Self { settings }
    }

    /// Annotate `arg` with `parameter`. Applying twice leaves one comment.
    pub fn apply<D: CommentEditing + ?Sized>(
        &self,
        doc: &mut D,
        arg: ArgumentRef,
        parameter: &str,
    ) -> Result<FixOutcome, EngineError> {
        let text = self.comment_template().render(parameter);

        let (inserted, arg) = if doc.has_matching_preceding_comment(arg, &text)? {
            (false, arg)
        } else {
            (true, doc.insert_comment_before(arg, &text)?)
        };
        let removed_duplicate = doc.remove_trailing_duplicate(arg, &text)?;
        let argument = doc.reformat_call(arg)?;

        debug!(parameter, inserted, removed_duplicate, "annotation applied");
        Ok(FixOutcome { inserted, removed_duplicate, argument })
    }
}

impl TemplateSettings for CommentFixApplier<'_> {
    fn settings_store(&self) -> &dyn SettingsStore {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::settings::MemorySettings;

    /// Span of the `nth` occurrence of `needle` in `src`.
    fn span(src: &str, needle: &str, nth: usize) -> ArgumentRef {
        let start = src.match_indices(needle).nth(nth).map(|(i, _)| i).unwrap();
        ArgumentRef { start, end: start + needle.len() }
    }

    fn fix(src: &str, needle: &str, nth: usize, parameter: &str) -> (String, FixOutcome) {
        let parser = JavaParser::new().unwrap();
        let mut doc = JavaDocument::parse(&parser, src).unwrap();
        let settings = MemorySettings::new();
        let outcome = CommentFixApplier::new(&settings)
            .apply(&mut doc, span(src, needle, nth), parameter)
            .unwrap();
        (doc.into_source(), outcome)
    }

    const BODY: &str = "class T { void g() { f(1, true); } }";

    #[test]
    fn inserts_comment_before_argument() {
        let (out, outcome) = fix(BODY, "true", 0, "b");
        assert_eq!(out, "class T { void g() { f(1, /* b= */ true); } }");
        assert!(outcome.inserted);
        assert_eq!(&out[outcome.argument.start..outcome.argument.end], "true");
    }

    #[test]
    fn applying_twice_leaves_one_comment() {
        let parser = JavaParser::new().unwrap();
        let settings = MemorySettings::new();
        let applier = CommentFixApplier::new(&settings);
        let mut doc = JavaDocument::parse(&parser, BODY).unwrap();

        let first = applier.apply(&mut doc, span(BODY, "1", 0), "a").unwrap();
        let second = applier.apply(&mut doc, first.argument, "a").unwrap();

        assert!(!second.inserted);
        assert_eq!(doc.source().matches("/* a= */").count(), 1);
        assert_eq!(doc.source(), "class T { void g() { f(/* a= */ 1, true); } }");
    }

    #[test]
    fn trailing_duplicate_is_moved_in_front() {
        let src = "class T { void g() { f(1 /*a=*/, 2); } }";
        let (out, outcome) = fix(src, "1", 0, "a");
        assert!(outcome.removed_duplicate);
        assert_eq!(out, "class T { void g() { f(/* a= */ 1, 2); } }");
    }

    #[test]
    fn unrelated_trailing_comment_is_kept() {
        let src = "class T { void g() { f(1 /* seconds */, 2); } }";
        let (out, _) = fix(src, "1", 0, "a");
        assert_eq!(out, "class T { void g() { f(/* a= */ 1 /* seconds */, 2); } }");
    }

    #[test]
    fn spacing_inserted_after_argument_stays_outside_it() {
        let src = "class T { void g() { f(1/* seconds */, 2); } }";
        let (out, outcome) = fix(src, "1", 0, "a");
        assert_eq!(out, "class T { void g() { f(/* a= */ 1 /* seconds */, 2); } }");
        assert_eq!(&out[outcome.argument.start..outcome.argument.end], "1");
    }

    #[test]
    fn existing_matching_comment_in_other_style_is_reused() {
        let src = "class T { void g() { f(/*A =*/ 1, 2); } }";
        let (out, outcome) = fix(src, "1", 0, "a");
        assert!(!outcome.inserted);
        assert_eq!(out, src);
    }

    #[test]
    fn multiline_argument_lists_keep_their_line_breaks() {
        let src = "class T { void g() {\n  f(\n      1,\n      2);\n} }";
        let (out, _) = fix(src, "2", 0, "b");
        assert_eq!(out, "class T { void g() {\n  f(\n      1,\n      /* b= */ 2);\n} }");
    }

    #[test]
    fn custom_template_is_used() {
        let parser = JavaParser::new().unwrap();
        let settings = MemorySettings::new();
        let applier = CommentFixApplier::new(&settings);
        assert!(applier.set_comment_template("/* %s: */"));

        let mut doc = JavaDocument::parse(&parser, BODY).unwrap();
        applier.apply(&mut doc, span(BODY, "true", 0), "enabled").unwrap();
        assert!(doc.source().contains("f(1, /* enabled: */ true)"));
    }

    #[test]
    fn stale_reference_is_an_error() {
        let parser = JavaParser::new().unwrap();
        let doc = JavaDocument::parse(&parser, BODY).unwrap();
        let err = doc.argument(ArgumentRef { start: 0, end: 5 }).unwrap_err();
        assert!(matches!(err, EngineError::StaleArgument { .. }));
    }

    #[test]
    fn shifted_spans_follow_earlier_edits() {
        let edits = vec![
            TextEdit { range: 2..4, replacement: String::new() },
            TextEdit { range: 10..10, replacement: "xyz".into() },
        ];
        let moved = ArgumentRef { start: 6, end: 8 }.shifted(&edits);
        assert_eq!(moved, ArgumentRef { start: 4, end: 6 });

        // Zero-width inserts at the boundaries: before start moves the span,
        // at end leaves it alone
        let boundary = vec![
            TextEdit { range: 6..6, replacement: " ".into() },
            TextEdit { range: 8..8, replacement: " ".into() },
        ];
        let moved = ArgumentRef { start: 6, end: 8 }.shifted(&boundary);
        assert_eq!(moved, ArgumentRef { start: 7, end: 9 });
    }
}
