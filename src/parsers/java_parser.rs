//! Filepath: src/parsers/java_parser.rs
//! ------------------------------------------------------------------
//! Java parsing and declaration extraction on Tree-sitter 0.25.x.
//! Goals:
//!   - One parser entry point shared by analysis and fixing.
//!   - Extract every callable declared in a file: methods,
//!     constructors, and record canonical constructors.
//!   - Owning type = innermost named type declaration. Members
//!     of anonymous class bodies have no owning type.
//!   - Record `extends` clauses so `super(...)` can resolve.
//!
//! Notes:
//!   - Queries stay broad (no predicates); ancestry decides
//!     ownership, like the method/function split elsewhere.
//!   - Parameter names come from the `name` field, which the
//!     grammar hoists out of `_variable_declarator_id`. Spread
//!     parameters wrap a `variable_declarator` instead.
//! ------------------------------------------------------------------

use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator, Tree};

use crate::core::{errors::EngineError, signature::CallableSignature};

/// Node kinds that name a type and own their members.
pub const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

/// Broad query over callable declarations and class headers.
const DECLARATION_QUERY: &str = r#"
    (method_declaration
      name: (identifier) @name
      parameters: (formal_parameters) @params) @callable

    (constructor_declaration
      name: (identifier) @name
      parameters: (formal_parameters) @params) @callable

    (record_declaration
      name: (identifier) @name
      parameters: (formal_parameters) @params) @callable

    (class_declaration
      name: (identifier) @name
      superclass: (superclass) @super) @class
"#;

/// Everything a file declares that call resolution cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JavaDeclarations {
    /// Methods and constructors, in source order
    pub callables: Vec<Declared>,

    /// `(type, superclass)` simple-name pairs
    pub supertypes: Vec<(String, String)>,

    /// Simple names of every named type declared in the file
    pub types: Vec<String>,
}

/// A declared callable and whether it is a constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct Declared {
    pub signature: CallableSignature,
    pub constructor: bool,
}

/// Java parser plus the compiled declaration query.
pub struct JavaParser {
    /// Java language handle for Tree-sitter.
    language: Language,
    /// Broad declaration query, compiled once.
    query: Query,
}

impl JavaParser {
    /// Load the grammar and compile the declaration query.
    pub fn new() -> Result<Self, EngineError> {
        let language: Language = tree_sitter_java::LANGUAGE.into();
        let query = Query::new(&language, DECLARATION_QUERY)
            .map_err(|e| EngineError::Parse(format!("declaration query: {e}")))?;
        Ok(Self { language, query })
    }

    /// Parse `source` into a fresh tree.
    pub fn parse(&self, source: &str) -> Result<Tree, EngineError> {
        // Parsers are cheap and not Sync; one per call keeps JavaParser shareable.
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        parser
            .parse(source, None)
            .ok_or_else(|| EngineError::Parse(format!("{} bytes of Java", source.len())))
    }

    /// Collect callables, type names, and superclass links from `tree`.
    pub fn declarations(&self, tree: &Tree, source: &str) -> Result<JavaDeclarations, EngineError> {
        let bytes = source.as_bytes();
        let cap_names: Vec<&str> = self.query.capture_names().to_vec();

        let mut out = JavaDeclarations::default();
        let mut found: Vec<(usize, Declared)> = Vec::new();

        // Type names come from a plain walk; the query only sees classes
        // with a superclass clause.
        collect_type_names(tree.root_node(), bytes, &mut out.types);

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, tree.root_node(), bytes);
        while let Some(m) = matches.next() {
            let mut callable: Option<Node> = None;
            let mut class: Option<Node> = None;
            let mut name: Option<&str> = None;
            let mut params: Option<Node> = None;
            let mut superclass: Option<Node> = None;

            for cap in m.captures {
                match cap_names[cap.index as usize] {
                    "callable" => callable = Some(cap.node),
                    "class" => class = Some(cap.node),
                    "name" => name = cap.node.utf8_text(bytes).ok(),
                    "params" => params = Some(cap.node),
                    "super" => superclass = Some(cap.node),
                    _ => {}
                }
            }

            let Some(name) = name else { continue };

            if let (Some(_), Some(sup)) = (class, superclass) {
                if let Some(parent) = sup.named_child(0).and_then(|t| simple_type_name(t, bytes)) {
                    out.supertypes.push((name.to_string(), parent));
                }
                continue;
            }

            let (Some(node), Some(params)) = (callable, params) else { continue };
            let (names, variadic) = parameter_names(params, bytes);

            // A record header is its own canonical constructor.
            let (owner, constructor) = match node.kind() {
                "record_declaration" => (Some(name.to_string()), true),
                "constructor_declaration" => (owning_type(node, bytes), true),
                _ => (owning_type(node, bytes), false),
            };

            found.push((
                node.start_byte(),
                Declared {
                    signature: CallableSignature {
                        owner,
                        name: name.to_string(),
                        params: names,
                        variadic,
                    },
                    constructor,
                },
            ));
        }

        // Keep source order regardless of match order.
        found.sort_by_key(|(start, _)| *start);
        out.callables = found.into_iter().map(|(_, d)| d).collect();
        Ok(out)
    }
}

/// Parameter names of a `formal_parameters` node and the variadic flag.
pub fn parameter_names(params: Node<'_>, bytes: &[u8]) -> (Vec<String>, bool) {
    let mut names = Vec::new();
    let mut variadic = false;

    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "formal_parameter" => {
                if let Some(n) = param.child_by_field_name("name").and_then(|n| n.utf8_text(bytes).ok()) {
                    names.push(n.to_string());
                }
            }
            "spread_parameter" => {
                let mut inner = param.walk();
                let declarator = param
                    .named_children(&mut inner)
                    .find(|c| c.kind() == "variable_declarator");
                if let Some(n) = declarator
                    .and_then(|d| d.child_by_field_name("name"))
                    .and_then(|n| n.utf8_text(bytes).ok())
                {
                    names.push(n.to_string());
                    variadic = true;
                }
            }
            // receiver_parameter (`Foo this`) binds no argument
            _ => {}
        }
    }
    (names, variadic)
}

/// Simple name of the innermost type declaration enclosing `node`.
/// Stops when leaving an anonymous class body, which has no name to match
/// on. Constructor arguments are not inside that body.
pub fn owning_type(node: Node<'_>, bytes: &[u8]) -> Option<String> {
    let mut child = node;
    let mut current = node.parent();
    while let Some(parent) = current {
        if TYPE_DECLARATIONS.contains(&parent.kind()) {
            return parent
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(bytes).ok())
                .map(str::to_string);
        }
        if child.kind() == "class_body" && matches!(parent.kind(), "object_creation_expression" | "enum_constant") {
            return None;
        }
        child = parent;
        current = parent.parent();
    }
    None
}

/// `java.util.List<String>` → `List`.
pub fn simple_type_name(ty: Node<'_>, bytes: &[u8]) -> Option<String> {
    let text = ty.utf8_text(bytes).ok()?;
    let without_args = text.split('<').next()?.trim();
    let simple = without_args.rsplit('.').next()?.trim();
    (!simple.is_empty()).then(|| simple.to_string())
}

fn collect_type_names(root: Node<'_>, bytes: &[u8], out: &mut Vec<String>) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if TYPE_DECLARATIONS.contains(&node.kind())
            && let Some(name) = node.child_by_field_name("name").and_then(|n| n.utf8_text(bytes).ok())
        {
            out.push(name.to_string());
        }
        let mut cursor = node.walk();
        stack.extend(node.named_children(&mut cursor));
    }
    out.sort();
    out.dedup();
}
