//! Per-call analysis.
//!
//! One call expression in, a list of flagged argument slots out. Every failure
//! mode collapses to "nothing flagged for this call": unresolved callables and
//! blacklisted shapes silently, iteration failures with an `error!` carrying the
//! call-site context.

use serde::Serialize;
use tracing::{error, trace};
use tree_sitter::{Node, Tree};

use crate::core::{
    adjacency::CommentAdjacencyScanner,
    blacklist::BlacklistMatcher,
    errors::AnalyzeError,
    literal::{LiteralClassifier, LiteralVerdict},
    resolve::{CALL_KINDS, CallResolver},
    signature::{CallableSignature, SignatureFormatter},
};

/// Method call vs constructor call; only the diagnostic wording differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallKind {
    Method,
    Constructor,
}

impl CallKind {
    pub fn of(call: Node<'_>) -> Option<Self> {
        match call.kind() {
            "method_invocation" => Some(CallKind::Method),
            "object_creation_expression" | "explicit_constructor_invocation" => {
                Some(CallKind::Constructor)
            }
            _ => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CallKind::Method => "method",
            CallKind::Constructor => "constructor",
        }
    }

    /// Diagnostic message for a flagged argument of this call kind.
    pub fn message(self) -> String {
        format!("Magic value passed to a {} without a comment.", self.description())
    }
}

/// One argument position of a call, aligned with its parameter.
#[derive(Debug, Clone)]
pub struct ArgumentSlot<'t> {
    /// Comma-counted, zero-based
    pub index: usize,
    pub expr: Node<'t>,
    /// Aligned parameter; the variadic one covers every trailing position
    pub parameter: Option<String>,
    pub variadic: bool,
    pub commented: bool,
}

/// A slot that needs an annotation comment.
#[derive(Debug, Clone)]
pub struct FlaggedArgument<'t> {
    pub slot: ArgumentSlot<'t>,
    pub parameter: String,
    pub kind: CallKind,
    pub verdict: LiteralVerdict,
    /// Formatted signature of the resolved callable
    pub signature: String,
}

/// Resolver, blacklist, and classifier applied to one call at a time.
pub struct CallSiteAnalyzer<'r, R: ?Sized> {
    resolver: &'r R,
    blacklist: &'r BlacklistMatcher,
    classifier: &'r LiteralClassifier,
}

impl<'r, R: CallResolver + ?Sized> CallSiteAnalyzer<'r, R> {
    pub fn new(resolver: &'r R, blacklist: &'r BlacklistMatcher, classifier: &'r LiteralClassifier) -> Self {
        Self { resolver, blacklist, classifier }
    }

    /// Arguments of `call` that need an annotation comment.
    pub fn analyze<'t>(&self, call: Node<'t>, source: &[u8]) -> Vec<FlaggedArgument<'t>> {
        let Some(kind) = CallKind::of(call) else { return Vec::new() };
        let Some(signature) = self.resolver.resolve(call, source) else { return Vec::new() };
        if signature.params.is_empty() {
            return Vec::new();
        }
        if self.blacklist.is_blacklisted(signature) {
            trace!(callable = %signature, "call shape blacklisted");
            return Vec::new();
        }

        let mut reached = 0usize;
        match self.flag(call, signature, kind, source, &mut reached) {
            Ok(flags) => flags,
            Err(err) => {
                error!(
                    call = %String::from_utf8_lossy(&source[call.byte_range()]),
                    callable = %signature,
                    params = signature.arity(),
                    index = reached,
                    error = %err,
                    "argument iteration failed; call skipped"
                );
                Vec::new()
            }
        }
    }

    /// Every flagged argument in `tree`, in source order.
    pub fn analyze_tree<'t>(&self, tree: &'t Tree, source: &[u8]) -> Vec<FlaggedArgument<'t>> {
        let mut out = Vec::new();
        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            if CALL_KINDS.contains(&node.kind()) {
                out.extend(self.analyze(node, source));
            }
            let mut cursor = node.walk();
            stack.extend(node.named_children(&mut cursor));
        }
        out.sort_by_key(|f| f.slot.expr.start_byte());
        out
    }

    fn flag<'t>(
        &self,
        call: Node<'t>,
        signature: &CallableSignature,
        kind: CallKind,
        source: &[u8],
        reached: &mut usize,
    ) -> Result<Vec<FlaggedArgument<'t>>, AnalyzeError> {
        let mut flags = Vec::new();
        let formatted = SignatureFormatter::format(signature).unwrap_or_default();

        for slot in argument_slots(call, signature)? {
            *reached = slot.index;
            // Overflow into varargs is never flagged
            if slot.index >= signature.arity() {
                break;
            }
            if slot.variadic || slot.commented {
                continue;
            }
            let verdict = self.classifier.classify(slot.expr, source);
            trace!(index = slot.index, ?verdict, "argument classified");
            if !verdict.needs_annotation() {
                continue;
            }
            let Some(parameter) = slot.parameter.clone() else { continue };
            // Surfaces invalid text before anything is reported
            slot.expr.utf8_text(source)?;
            flags.push(FlaggedArgument {
                slot,
                parameter,
                kind,
                verdict,
                signature: formatted.clone(),
            });
        }
        Ok(flags)
    }
}

/// Argument slots of `call` aligned with `signature`'s parameters.
pub fn argument_slots<'t>(
    call: Node<'t>,
    signature: &CallableSignature,
) -> Result<Vec<ArgumentSlot<'t>>, AnalyzeError> {
    let Some(list) = call.child_by_field_name("arguments") else { return Ok(Vec::new()) };
    let slots = CommentAdjacencyScanner::positions(list)?
        .into_iter()
        .map(|(index, expr)| {
            let parameter = signature
                .params
                .get(index)
                .or_else(|| signature.variadic.then(|| signature.params.last()).flatten())
                .cloned();
            ArgumentSlot {
                index,
                expr,
                parameter,
                variadic: signature.is_variadic_at(index),
                commented: CommentAdjacencyScanner::has_preceding_comment(expr),
            }
        })
        .collect();
    Ok(slots)
}
