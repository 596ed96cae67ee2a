//! C# parser (spec.md §4.3): attributes as decorators, constructors stored
//! as `ClassName.ctor` (the distinguishing suffix spec.md §9 mandates, not
//! the source repo's colliding `ClassName` bug), interface method stubs
//! flagged `is_stub`.
//!
//! Grounded on `examples/bartolli-codanna/src/parsing/csharp/parser.rs`'s
//! `node.kind()` dispatch table and field-name-based extraction.

use super::{node_range, node_text, LanguageParser, ParseOutput, RawCallSite, RawSymbol, RawSymbolKind};
use crate::error::ParseError;
use std::collections::HashMap;
use tree_sitter::{Node, Parser};

pub struct CSharpParser {
    parser: Parser,
}

impl CSharpParser {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
            .expect("c# grammar should load");
        Self { parser }
    }
}

impl Default for CSharpParser {
    fn default() -> Self {
        Self::new()
    }
}

struct Walker<'a> {
    source: &'a str,
    out: ParseOutput,
    current_class: Option<String>,
    /// field name -> declared type, for receiver-static-type resolution on
    /// `_field.Method()` calls (spec.md §8 scenario 2).
    field_types: HashMap<String, String>,
    inside_interface: bool,
}

impl LanguageParser for CSharpParser {
    fn parse(&mut self, source: &str) -> Result<ParseOutput, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ParseError::ParserInit { language: "csharp".into(), reason: "parser returned no tree".into() })?;
        if tree.root_node().has_error() {
            let pos = tree.root_node().start_position();
            return Err(ParseError::Syntax { line: pos.row as u32 + 1, column: pos.column as u32, reason: "c# syntax error".into() });
        }

        let mut walker = Walker {
            source,
            out: ParseOutput::default(),
            current_class: None,
            field_types: HashMap::new(),
            inside_interface: false,
        };
        walker.walk(tree.root_node());
        Ok(walker.out)
    }
}

fn preceding_attributes(node: Node, source: &str) -> Vec<String> {
    let mut attrs = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(n) = sibling {
        if n.kind() == "attribute_list" {
            let mut cursor = n.walk();
            for attr in n.children(&mut cursor) {
                if attr.kind() == "attribute" {
                    attrs.push(node_text(attr, source).to_string());
                }
            }
            sibling = n.prev_sibling();
        } else {
            break;
        }
    }
    attrs.reverse();
    attrs
}

impl<'a> Walker<'a> {
    fn walk(&mut self, node: Node) {
        match node.kind() {
            "class_declaration" | "record_declaration" => self.handle_class(node),
            "interface_declaration" => self.handle_interface(node),
            "method_declaration" => self.handle_method(node),
            "constructor_declaration" => self.handle_constructor(node),
            "field_declaration" => self.handle_field(node),
            _ => self.descend(node),
        }
    }

    fn descend(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }

    fn handle_class(&mut self, node: Node) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = node_text(name_node, self.source).to_string();
        let bases = base_list(node, self.source);

        let mut symbol = RawSymbol::new(name.clone(), RawSymbolKind::Class { bases_syntactic: bases }, node_range(node));
        symbol.decorators = preceding_attributes(node, self.source);
        symbol.is_exported = true;
        self.out.symbols.push(symbol);

        let previous_class = self.current_class.replace(name);
        let previous_fields = std::mem::take(&mut self.field_types);
        let previous_interface = std::mem::replace(&mut self.inside_interface, false);
        if let Some(body) = node.child_by_field_name("body") {
            self.descend(body);
        }
        self.current_class = previous_class;
        self.field_types = previous_fields;
        self.inside_interface = previous_interface;
    }

    fn handle_interface(&mut self, node: Node) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = node_text(name_node, self.source).to_string();

        let mut methods_declared = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                if child.kind() == "method_declaration" {
                    if let Some(m) = child.child_by_field_name("name") {
                        methods_declared.push(node_text(m, self.source).to_string());
                    }
                }
            }
        }

        let mut symbol = RawSymbol::new(name.clone(), RawSymbolKind::Interface { methods_declared }, node_range(node));
        symbol.decorators = preceding_attributes(node, self.source);
        symbol.is_exported = true;
        self.out.symbols.push(symbol);

        let previous_class = self.current_class.replace(name);
        let previous_interface = std::mem::replace(&mut self.inside_interface, true);
        if let Some(body) = node.child_by_field_name("body") {
            self.descend(body);
        }
        self.current_class = previous_class;
        self.inside_interface = previous_interface;
    }

    fn handle_field(&mut self, node: Node) {
        let Some(decl) = find_child(node, "variable_declaration") else { return };
        let Some(type_node) = decl.child_by_field_name("type") else { return };
        let type_name = node_text(type_node, self.source).to_string();
        let mut cursor = decl.walk();
        for declarator in decl.children(&mut cursor) {
            if declarator.kind() == "variable_declarator" {
                if let Some(name_node) = declarator.child_by_field_name("name") {
                    self.field_types.insert(node_text(name_node, self.source).to_string(), type_name.clone());
                }
            }
        }
    }

    fn handle_method(&mut self, node: Node) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = node_text(name_node, self.source).to_string();
        let decorators = preceding_attributes(node, self.source);
        let is_stub = self.inside_interface || node.child_by_field_name("body").is_none();

        let Some(owner) = self.current_class.clone() else { return };
        let kind = RawSymbolKind::Method {
            owner_name: owner.clone(),
            is_override: decorators.iter().any(|d| d.starts_with("override")),
            is_property: false,
            is_ctor: false,
            is_stub,
        };

        let mut symbol = RawSymbol::new(name.clone(), kind, node_range(node));
        symbol.decorators = decorators;
        symbol.is_test = symbol
            .decorators
            .iter()
            .any(|d| matches!(d.split('(').next().unwrap_or(""), "Fact" | "Test" | "TestMethod"));
        symbol.signature = node.child_by_field_name("parameters").map(|p| node_text(p, self.source).to_string());
        if let Some(body) = node.child_by_field_name("body") {
            symbol.body_snippet = Some(node_text(body, self.source).chars().take(400).collect());
        }
        let qualified = symbol.qualified_name();
        self.out.symbols.push(symbol);

        if let Some(body) = node.child_by_field_name("body") {
            self.collect_calls(body, &qualified);
        }
    }

    fn handle_constructor(&mut self, node: Node) {
        let Some(owner) = self.current_class.clone() else { return };
        let kind = RawSymbolKind::Method { owner_name: owner.clone(), is_override: false, is_property: false, is_ctor: true, is_stub: false };
        let mut symbol = RawSymbol::new("ctor".to_string(), kind, node_range(node));
        symbol.decorators = preceding_attributes(node, self.source);
        symbol.signature = node.child_by_field_name("parameters").map(|p| node_text(p, self.source).to_string());
        let qualified = symbol.qualified_name();
        self.out.symbols.push(symbol);

        if let Some(body) = node.child_by_field_name("body") {
            self.collect_calls(body, &qualified);
        }
    }

    fn collect_calls(&mut self, node: Node, caller_qualified_name: &str) {
        if node.kind() == "invocation_expression" {
            if let Some(func) = node.child_by_field_name("function") {
                let (callee_name, receiver_expr, receiver_static_type) = match func.kind() {
                    "member_access_expression" => {
                        let attr = func.child_by_field_name("name").map(|a| node_text(a, self.source).to_string()).unwrap_or_default();
                        let obj = func.child_by_field_name("expression").map(|o| node_text(o, self.source).to_string());
                        let static_type = obj.as_deref().and_then(|o| self.field_types.get(o)).cloned();
                        (attr, obj, static_type)
                    }
                    _ => (node_text(func, self.source).to_string(), None, None),
                };
                self.out.calls.push(RawCallSite {
                    caller_qualified_name: caller_qualified_name.to_string(),
                    callee_name,
                    receiver_expr,
                    receiver_static_type,
                    range: node_range(node),
                });
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(child.kind(), "method_declaration" | "constructor_declaration" | "class_declaration" | "interface_declaration") {
                continue;
            }
            self.collect_calls(child, caller_qualified_name);
        }
    }
}

fn find_child<'n>(node: Node<'n>, kind: &str) -> Option<Node<'n>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

fn base_list(node: Node, source: &str) -> Vec<String> {
    let Some(bases) = node.child_by_field_name("bases") else { return Vec::new() };
    let mut out = Vec::new();
    let mut cursor = bases.walk();
    for child in bases.children(&mut cursor) {
        if matches!(child.kind(), "identifier" | "generic_name" | "qualified_name") {
            out.push(node_text(child, source).to_string());
        }
    }
    out
}
