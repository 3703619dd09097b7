//! Call resolution.
//!
//! The analyzer only needs "which callable does this call bind to", so that is
//! the whole seam: [`CallResolver`]. The production implementation is a
//! syntactic index over every scanned file plus configured library stubs. It
//! answers `None` whenever the answer is not unique, which the analyzer treats
//! as "skip this call".

use std::collections::{HashMap, HashSet};

use tracing::trace;
use tree_sitter::Node;

use crate::{
    core::{adjacency::is_comment, signature::CallableSignature},
    parsers::java_parser::{JavaDeclarations, TYPE_DECLARATIONS, owning_type, simple_type_name},
};

/// Node kinds that invoke a callable with an argument list.
pub const CALL_KINDS: &[&str] = &[
    "method_invocation",
    "object_creation_expression",
    "explicit_constructor_invocation",
];

/// Resolve the callable invoked by a call node.
pub trait CallResolver {
    /// Signature bound by `call`, or `None` if unresolvable or ambiguous.
    fn resolve(&self, call: Node<'_>, source: &[u8]) -> Option<&CallableSignature>;
}

/// Declarations keyed for lookup by name and owner.
#[derive(Debug, Clone, Default)]
pub struct SignatureIndex {
    /// Method name → declarations
    methods: HashMap<String, Vec<CallableSignature>>,

    /// Type simple name → constructor declarations
    constructors: HashMap<String, Vec<CallableSignature>>,

    /// Type → superclass, simple names
    supertypes: HashMap<String, String>,

    /// Every declared or stubbed type name
    types: HashSet<String>,
}

impl SignatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index one file's declarations.
    pub fn add_declarations(&mut self, decls: JavaDeclarations) {
        for d in decls.callables {
            if d.constructor {
                self.add_constructor(d.signature);
            } else {
                self.add_method(d.signature);
            }
        }
        for (ty, sup) in decls.supertypes {
            self.supertypes.insert(ty, sup);
        }
        self.types.extend(decls.types);
    }

    /// Index a method; stubs named after their owner are taken as constructors.
    pub fn add_stub(&mut self, signature: CallableSignature) {
        if signature.owner.as_deref() == Some(signature.name.as_str()) {
            self.add_constructor(signature);
        } else {
            self.add_method(signature);
        }
    }

    fn add_method(&mut self, signature: CallableSignature) {
        if let Some(owner) = &signature.owner {
            self.types.insert(owner.clone());
        }
        self.methods.entry(signature.name.clone()).or_default().push(signature);
    }

    fn add_constructor(&mut self, signature: CallableSignature) {
        let Some(owner) = signature.owner.clone() else { return };
        self.types.insert(owner.clone());
        self.constructors.entry(owner).or_default().push(signature);
    }

    pub fn method_count(&self) -> usize {
        self.methods.values().map(Vec::len).sum()
    }

    pub fn constructor_count(&self) -> usize {
        self.constructors.values().map(Vec::len).sum()
    }

    /// `ty` followed by its known superclasses, nearest first.
    fn lineage(&self, ty: &str) -> Vec<String> {
        let mut chain = vec![ty.to_string()];
        let mut current = ty;
        while let Some(sup) = self.supertypes.get(current) {
            if chain.iter().any(|seen| seen == sup) {
                break;
            }
            chain.push(sup.clone());
            current = sup;
        }
        chain
    }

    fn resolve_method<'a>(&'a self, call: Node<'_>, source: &[u8], args: usize) -> Option<&'a CallableSignature> {
        let name = call.child_by_field_name("name")?.utf8_text(source).ok()?;
        let all = self.methods.get(name)?;

        let in_lineage = |ty: &str| -> Vec<&'a CallableSignature> {
            let lineage = self.lineage(ty);
            all.iter().filter(|s| s.owner.as_ref().is_some_and(|o| lineage.contains(o))).collect()
        };

        let scoped: Vec<&CallableSignature> = match call.child_by_field_name("object") {
            // Innermost enclosing type with a compatible declaration wins
            None => enclosing_types(call, source)
                .iter()
                .map(|ty| in_lineage(ty).into_iter().filter(|s| s.accepts(args)).collect::<Vec<_>>())
                .find(|found| !found.is_empty())?,
            Some(receiver) => {
                let ty = self.receiver_type(receiver, call, source)?;
                in_lineage(&ty)
            }
        };

        unique_compatible(scoped, args)
    }

    /// Indexed simple type of a call's receiver expression, or `None` when
    /// it cannot be read off the syntax.
    fn receiver_type(&self, receiver: Node<'_>, call: Node<'_>, source: &[u8]) -> Option<String> {
        let ty = match receiver.kind() {
            "this" => enclosing_type(call, source)?,
            "super" => self.supertypes.get(&enclosing_type(call, source)?)?.clone(),
            "identifier" => {
                let name = receiver.utf8_text(source).ok()?;
                match declared_type(receiver, name, source) {
                    Some(Binding::Typed(ty)) => ty,
                    Some(Binding::Untyped) => return None,
                    // `Math.max(...)` style: not a variable, so a type name
                    None => name.to_string(),
                }
            }
            "field_access" => {
                let object = receiver.child_by_field_name("object")?;
                let field = receiver.child_by_field_name("field")?.utf8_text(source).ok()?;
                if object.kind() == "this" {
                    match field_type(receiver, field, source)? {
                        Binding::Typed(ty) => ty,
                        Binding::Untyped => return None,
                    }
                } else {
                    qualified_type_name(receiver, source)?
                }
            }
            "scoped_identifier" => qualified_type_name(receiver, source)?,
            "object_creation_expression" => simple_type_name(receiver.child_by_field_name("type")?, source)?,
            "parenthesized_expression" => {
                let inner = receiver.named_child(0)?;
                return self.receiver_type(inner, call, source);
            }
            _ => return None,
        };
        let known = self.types.contains(&ty);
        if !known {
            trace!(receiver = %ty, "receiver type is not indexed");
        }
        known.then_some(ty)
    }

    fn resolve_constructor<'a>(&'a self, call: Node<'_>, source: &[u8], args: usize) -> Option<&'a CallableSignature> {
        let ty = match call.kind() {
            "object_creation_expression" => simple_type_name(call.child_by_field_name("type")?, source)?,
            _ => {
                let target = call.child_by_field_name("constructor")?;
                let here = enclosing_type(call, source)?;
                match target.kind() {
                    "this" => here,
                    "super" => self.supertypes.get(&here)?.clone(),
                    _ => return None,
                }
            }
        };
        let candidates = self.constructors.get(&ty)?;
        unique_compatible(candidates.iter().collect(), args)
    }
}

impl CallResolver for SignatureIndex {
    fn resolve(&self, call: Node<'_>, source: &[u8]) -> Option<&CallableSignature> {
        let args = argument_count(call)?;
        let resolved = match call.kind() {
            "method_invocation" => self.resolve_method(call, source, args),
            "object_creation_expression" | "explicit_constructor_invocation" => {
                self.resolve_constructor(call, source, args)
            }
            _ => None,
        };
        if resolved.is_none() {
            trace!(
                kind = call.kind(),
                byte = call.start_byte(),
                "call did not resolve to a unique signature"
            );
        }
        resolved
    }
}

/// The single distinct signature compatible with `args`; exact arity wins
/// over variadic binding, identical overload shapes collapse.
fn unique_compatible(candidates: Vec<&CallableSignature>, args: usize) -> Option<&CallableSignature> {
    let compatible: Vec<&CallableSignature> = candidates.into_iter().filter(|s| s.accepts(args)).collect();
    let exact: Vec<&CallableSignature> = compatible
        .iter()
        .copied()
        .filter(|s| !s.variadic && s.arity() == args)
        .collect();
    let pool = if exact.is_empty() { compatible } else { exact };

    let first = *pool.first()?;
    pool.iter().all(|s| *s == first).then_some(first)
}

/// Number of argument expressions in the call's argument list.
pub fn argument_count(call: Node<'_>) -> Option<usize> {
    let list = call.child_by_field_name("arguments")?;
    let mut cursor = list.walk();
    let count = list.named_children(&mut cursor).filter(|c| !is_comment(*c)).count();
    Some(count)
}

/// Simple name of the type declaration lexically enclosing `node`.
/// Anonymous class bodies yield `None`.
pub fn enclosing_type(node: Node<'_>, source: &[u8]) -> Option<String> {
    owning_type(node, source)
}

/// Types whose members an unqualified call can reach, innermost first.
/// An anonymous body contributes the type it instantiates.
fn enclosing_types(node: Node<'_>, source: &[u8]) -> Vec<String> {
    let mut types = Vec::new();
    let mut child = node;
    let mut current = node.parent();
    while let Some(parent) = current {
        if TYPE_DECLARATIONS.contains(&parent.kind()) {
            if let Some(name) = parent.child_by_field_name("name").and_then(|n| n.utf8_text(source).ok()) {
                types.push(name.to_string());
            }
        } else if child.kind() == "class_body"
            && parent.kind() == "object_creation_expression"
            && let Some(ty) = parent.child_by_field_name("type").and_then(|t| simple_type_name(t, source))
        {
            types.push(ty);
        }
        child = parent;
        current = parent.parent();
    }
    types
}

/// What a name in scope is declared as.
#[derive(Debug, Clone, PartialEq)]
enum Binding {
    /// Declared with a readable type
    Typed(String),
    /// Declared, but the type is not written down (`var`, lambda parameter)
    Untyped,
}

/// Binding of variable `name` visible at `at`: locals declared earlier,
/// parameters, then fields of each enclosing body. `None` if nothing
/// in scope declares it.
fn declared_type(at: Node<'_>, name: &str, source: &[u8]) -> Option<Binding> {
    let mut child = at;
    let mut current = at.parent();
    while let Some(node) = current {
        let found = match node.kind() {
            "block" | "constructor_body" | "switch_block_statement_group" => {
                let mut cursor = node.walk();
                node.named_children(&mut cursor)
                    .filter(|s| s.end_byte() <= child.start_byte())
                    .filter(|s| s.kind() == "local_variable_declaration")
                    .find_map(|s| declarator_binding(s, name, source))
            }
            "for_statement" => node
                .child_by_field_name("init")
                .filter(|init| init.kind() == "local_variable_declaration")
                .and_then(|init| declarator_binding(init, name, source)),
            "enhanced_for_statement" | "resource" => named_binding(node, name, source),
            "catch_clause" => {
                let mut cursor = node.walk();
                node.named_children(&mut cursor)
                    .find(|c| c.kind() == "catch_formal_parameter")
                    .and_then(|param| catch_binding(param, name, source))
            }
            "try_with_resources_statement" => {
                node.child_by_field_name("resources").and_then(|resources| {
                    let mut cursor = resources.walk();
                    resources.named_children(&mut cursor).find_map(|r| named_binding(r, name, source))
                })
            }
            "method_declaration" | "constructor_declaration" | "record_declaration" => node
                .child_by_field_name("parameters")
                .and_then(|params| parameter_binding(params, name, source)),
            "lambda_expression" => node
                .child_by_field_name("parameters")
                .and_then(|params| match params.kind() {
                    "formal_parameters" => parameter_binding(params, name, source),
                    // `x -> ...` and `(x, y) -> ...`
                    _ => {
                        let mut cursor = params.walk();
                        let idents: Vec<Node> = if params.kind() == "identifier" {
                            vec![params]
                        } else {
                            params.named_children(&mut cursor).collect()
                        };
                        idents
                            .iter()
                            .any(|i| i.utf8_text(source).ok() == Some(name))
                            .then_some(Binding::Untyped)
                    }
                }),
            "class_body" | "interface_body" | "enum_body_declarations" => field_in_body(node, name, source),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
        child = node;
        current = node.parent();
    }
    None
}

/// Type of field `name` declared by the nearest body enclosing `at`.
fn field_type(at: Node<'_>, name: &str, source: &[u8]) -> Option<Binding> {
    let mut current = at.parent();
    while let Some(node) = current {
        match node.kind() {
            "class_body" | "interface_body" => return field_in_body(node, name, source),
            "enum_body" => {
                let mut cursor = node.walk();
                let decls = node.named_children(&mut cursor).find(|c| c.kind() == "enum_body_declarations");
                return decls.and_then(|d| field_in_body(d, name, source));
            }
            _ => current = node.parent(),
        }
    }
    None
}

fn field_in_body(body: Node<'_>, name: &str, source: &[u8]) -> Option<Binding> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter(|m| matches!(m.kind(), "field_declaration" | "constant_declaration"))
        .find_map(|m| declarator_binding(m, name, source))
}

/// Binding from a `Type a = .., b;` declaration that declares `name`.
fn declarator_binding(decl: Node<'_>, name: &str, source: &[u8]) -> Option<Binding> {
    let ty = decl.child_by_field_name("type")?;
    let mut cursor = decl.walk();
    let declarator = decl
        .children_by_field_name("declarator", &mut cursor)
        .find(|d| d.child_by_field_name("name").and_then(|n| n.utf8_text(source).ok()) == Some(name))?;

    if ty.utf8_text(source).ok() == Some("var") {
        // `var x = new Foo(..)` is the one inferred shape we can read
        let value = declarator.child_by_field_name("value");
        return Some(
            value
                .filter(|v| v.kind() == "object_creation_expression")
                .and_then(|v| v.child_by_field_name("type"))
                .and_then(|t| simple_type_name(t, source))
                .map_or(Binding::Untyped, Binding::Typed),
        );
    }
    Some(typed(ty, source))
}

/// Binding from a node carrying `type` and `name` fields.
fn named_binding(node: Node<'_>, name: &str, source: &[u8]) -> Option<Binding> {
    let declared = node.child_by_field_name("name")?.utf8_text(source).ok()?;
    if declared != name {
        return None;
    }
    Some(node.child_by_field_name("type").map_or(Binding::Untyped, |t| typed(t, source)))
}

fn parameter_binding(params: Node<'_>, name: &str, source: &[u8]) -> Option<Binding> {
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "formal_parameter" => {
                if let Some(b) = named_binding(param, name, source) {
                    return Some(b);
                }
            }
            "spread_parameter" => {
                let mut inner = param.walk();
                let declares = param
                    .named_children(&mut inner)
                    .filter(|c| c.kind() == "variable_declarator")
                    .filter_map(|d| d.child_by_field_name("name"))
                    .any(|n| n.utf8_text(source).ok() == Some(name));
                // An array; no methods to bind
                if declares {
                    return Some(Binding::Untyped);
                }
            }
            _ => {}
        }
    }
    None
}

fn catch_binding(param: Node<'_>, name: &str, source: &[u8]) -> Option<Binding> {
    let declared = param.child_by_field_name("name")?.utf8_text(source).ok()?;
    if declared != name {
        return None;
    }
    let mut cursor = param.walk();
    let catch_type = param.named_children(&mut cursor).find(|c| c.kind() == "catch_type");
    let single = catch_type.filter(|t| t.named_child_count() == 1).and_then(|t| t.named_child(0));
    Some(single.map_or(Binding::Untyped, |t| typed(t, source)))
}

/// Array and primitive types have no indexed methods.
fn typed(ty: Node<'_>, source: &[u8]) -> Binding {
    match ty.kind() {
        "array_type" | "integral_type" | "floating_point_type" | "boolean_type" => Binding::Untyped,
        _ => simple_type_name(ty, source).map_or(Binding::Untyped, Binding::Typed),
    }
}

/// `Outer.Inner` or `pkg.Type` used as a static qualifier. The leading
/// segment must not be a variable in scope.
fn qualified_type_name(receiver: Node<'_>, source: &[u8]) -> Option<String> {
    let text = receiver.utf8_text(source).ok()?;
    let segments: Vec<&str> = text.split('.').map(str::trim).collect();
    let dotted = segments
        .iter()
        .all(|s| !s.is_empty() && s.chars().all(|c| c == '_' || c == '$' || c.is_alphanumeric()));
    let (head, last) = (*segments.first()?, *segments.last()?);
    let looks_static = last.starts_with(|c: char| c.is_uppercase());
    (dotted && looks_static && declared_type(receiver, head, source).is_none()).then(|| last.to_string())
}
