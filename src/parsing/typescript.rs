//! TypeScript parser (spec.md §4.3): `export` forms, interfaces/type
//! aliases/enums, typed parameters and return types for the type-reference
//! resolver (§4.7), JSX-as-call like the JavaScript parser.

use super::{node_range, node_text, LanguageParser, ParseOutput, RawCallSite, RawImport, RawSymbol, RawSymbolKind};
use crate::error::ParseError;
use std::collections::HashSet;
use tree_sitter::{Node, Parser};

pub struct TypeScriptParser {
    parser: Parser,
}

impl TypeScriptParser {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .expect("typescript grammar should load");
        Self { parser }
    }
}

impl Default for TypeScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

struct Walker<'a> {
    source: &'a str,
    out: ParseOutput,
    current_class: Option<String>,
    exported: HashSet<String>,
    default_exported: HashSet<String>,
}

impl LanguageParser for TypeScriptParser {
    fn parse(&mut self, source: &str) -> Result<ParseOutput, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ParseError::ParserInit { language: "typescript".into(), reason: "parser returned no tree".into() })?;
        if tree.root_node().has_error() {
            let pos = tree.root_node().start_position();
            return Err(ParseError::Syntax { line: pos.row as u32 + 1, column: pos.column as u32, reason: "typescript syntax error".into() });
        }

        let mut walker = Walker { source, out: ParseOutput::default(), current_class: None, exported: HashSet::new(), default_exported: HashSet::new() };
        walker.walk(tree.root_node());
        for symbol in &mut walker.out.symbols {
            if walker.exported.contains(&symbol.name) || walker.default_exported.contains(&symbol.name) {
                symbol.is_exported = true;
            }
            if walker.default_exported.contains(&symbol.name) {
                symbol.is_default_export = true;
            }
        }
        Ok(walker.out)
    }
}

impl<'a> Walker<'a> {
    fn walk(&mut self, node: Node) {
        match node.kind() {
            "function_declaration" => self.handle_function(node, None),
            "class_declaration" => self.handle_class(node),
            "interface_declaration" => self.handle_interface(node),
            "type_alias_declaration" => self.handle_type_alias(node),
            "enum_declaration" => self.handle_enum(node),
            "export_statement" => self.handle_export(node),
            "import_statement" => self.handle_import(node),
            "jsx_element" | "jsx_self_closing_element" => {
                self.track_jsx(node);
                self.descend(node);
            }
            _ => self.descend(node),
        }
    }

    fn descend(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }

    fn handle_export(&mut self, node: Node) {
        let mut cursor = node.walk();
        let has_default = node.children(&mut cursor).any(|c| c.kind() == "default");
        if has_default {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "identifier" => {
                        self.default_exported.insert(node_text(child, self.source).to_string());
                    }
                    "function_declaration" => {
                        if let Some(name) = child.child_by_field_name("name") {
                            self.default_exported.insert(node_text(name, self.source).to_string());
                        }
                        self.handle_function(child, None);
                    }
                    "class_declaration" => {
                        if let Some(name) = child.child_by_field_name("name") {
                            self.default_exported.insert(node_text(name, self.source).to_string());
                        }
                        self.handle_class(child);
                    }
                    _ => {}
                }
            }
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "export_clause" {
                let mut c2 = child.walk();
                for spec in child.children(&mut c2) {
                    if spec.kind() == "export_specifier" {
                        if let Some(name) = spec.child_by_field_name("name") {
                            self.exported.insert(node_text(name, self.source).to_string());
                        }
                    }
                }
            } else {
                self.walk(child);
            }
        }
    }

    fn handle_import(&mut self, node: Node) {
        let Some(source_node) = node.child_by_field_name("source") else { return };
        let specifier = node_text(source_node, self.source).trim_matches(|c| c == '"' || c == '\'').to_string();
        let mut symbols = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "import_clause" {
                collect_import_names(child, self.source, &mut symbols);
            }
        }
        self.out.imports.push(RawImport { specifier, symbols, range: node_range(node) });
    }

    fn track_jsx(&mut self, node: Node) {
        let component_name = match node.kind() {
            "jsx_element" => node.child_by_field_name("open_tag").and_then(|t| t.child_by_field_name("name")).map(|n| node_text(n, self.source)),
            "jsx_self_closing_element" => node.child_by_field_name("name").map(|n| node_text(n, self.source)),
            _ => None,
        };
        if let Some(name) = component_name {
            if name.chars().next().is_some_and(|c| c.is_uppercase()) {
                self.out.calls.push(RawCallSite {
                    caller_qualified_name: self.current_class.clone().unwrap_or_default(),
                    callee_name: name.to_string(),
                    receiver_expr: None,
                    receiver_static_type: None,
                    range: node_range(node),
                });
            }
        }
    }

    fn handle_function(&mut self, node: Node, owner_name: Option<String>) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = node_text(name_node, self.source).to_string();

        let kind = match owner_name {
            Some(owner) => RawSymbolKind::Method { owner_name: owner, is_override: false, is_property: false, is_ctor: name == "constructor", is_stub: false },
            None => RawSymbolKind::Function,
        };

        let mut symbol = RawSymbol::new(name.clone(), kind, node_range(node));
        symbol.param_types = node.child_by_field_name("parameters").map(|p| typed_params(p, self.source)).unwrap_or_default();
        symbol.return_type = node.child_by_field_name("return_type").map(|r| node_text(r, self.source).trim_start_matches(':').trim().to_string());
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

    fn handle_class(&mut self, node: Node) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = node_text(name_node, self.source).to_string();
        let mut bases = Vec::new();
        if let Some(heritage) = node.child_by_field_name("heritage") {
            if let Some(id) = find_identifier(heritage) {
                bases.push(node_text(id, self.source).to_string());
            }
        }

        let mut symbol = RawSymbol::new(name.clone(), RawSymbolKind::Class { bases_syntactic: bases }, node_range(node));
        symbol.is_exported = false;
        self.out.symbols.push(symbol);

        let previous = self.current_class.replace(name);
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                if child.kind() == "method_definition" {
                    self.handle_function(child, self.current_class.clone());
                }
            }
        }
        self.current_class = previous;
    }

    fn handle_interface(&mut self, node: Node) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = node_text(name_node, self.source).to_string();
        let mut methods_declared = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                if child.kind() == "method_signature" {
                    if let Some(m) = child.child_by_field_name("name") {
                        methods_declared.push(node_text(m, self.source).to_string());
                    }
                }
            }
        }
        let mut symbol = RawSymbol::new(name, RawSymbolKind::Interface { methods_declared }, node_range(node));
        symbol.is_exported = false;
        self.out.symbols.push(symbol);
    }

    fn handle_type_alias(&mut self, node: Node) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = node_text(name_node, self.source).to_string();
        let target = node.child_by_field_name("value").map(|v| node_text(v, self.source).to_string()).unwrap_or_default();
        self.out.symbols.push(RawSymbol::new(name, RawSymbolKind::TypeAlias { target_syntactic: target }, node_range(node)));
    }

    fn handle_enum(&mut self, node: Node) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = node_text(name_node, self.source).to_string();
        let mut variants = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                if child.kind() == "property_identifier" || child.kind() == "enum_assignment" {
                    variants.push(node_text(child, self.source).to_string());
                }
            }
        }
        self.out.symbols.push(RawSymbol::new(name, RawSymbolKind::Enum { variants }, node_range(node)));
    }

    fn collect_calls(&mut self, node: Node, caller_qualified_name: &str) {
        if node.kind() == "call_expression" {
            if let Some(func) = node.child_by_field_name("function") {
                let (callee_name, receiver_expr) = match func.kind() {
                    "member_expression" => {
                        let prop = func.child_by_field_name("property").map(|p| node_text(p, self.source).to_string()).unwrap_or_default();
                        let obj = func.child_by_field_name("object").map(|o| node_text(o, self.source).to_string());
                        (prop, obj)
                    }
                    _ => (node_text(func, self.source).to_string(), None),
                };
                self.out.calls.push(RawCallSite {
                    caller_qualified_name: caller_qualified_name.to_string(),
                    callee_name,
                    receiver_expr,
                    receiver_static_type: None,
                    range: node_range(node),
                });
            }
        }
        if matches!(node.kind(), "jsx_element" | "jsx_self_closing_element") {
            self.track_jsx(node);
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(child.kind(), "function_declaration" | "class_declaration" | "method_definition") {
                continue;
            }
            self.collect_calls(child, caller_qualified_name);
        }
    }
}

fn typed_params(params: Node, source: &str) -> Vec<String> {
    let mut types = Vec::new();
    let mut cursor = params.walk();
    for child in params.children(&mut cursor) {
        if matches!(child.kind(), "required_parameter" | "optional_parameter") {
            if let Some(type_node) = child.child_by_field_name("type") {
                types.push(node_text(type_node, source).trim_start_matches(':').trim().to_string());
            }
        }
    }
    types
}

fn collect_import_names(node: Node, source: &str, out: &mut Vec<String>) {
    match node.kind() {
        "identifier" => out.push(node_text(node, source).to_string()),
        "named_imports" => {
            let mut cursor = node.walk();
            for spec in node.children(&mut cursor) {
                if spec.kind() == "import_specifier" {
                    if let Some(name) = spec.child_by_field_name("name") {
                        out.push(node_text(name, source).to_string());
                    }
                }
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_import_names(child, source, out);
            }
        }
    }
}

fn find_identifier(node: Node) -> Option<Node> {
    if node.kind() == "identifier" {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_identifier(child) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_and_type_alias_are_extracted() {
        let mut parser = TypeScriptParser::new();
        let out = parser.parse("interface IUserService {\n  getUser(id: number): User;\n}\ntype Id = number;\n").unwrap();
        assert!(out.symbols.iter().any(|s| s.name == "IUserService"));
        assert!(out.symbols.iter().any(|s| s.name == "Id"));
    }

    #[test]
    fn typed_parameters_are_captured() {
        let mut parser = TypeScriptParser::new();
        let out = parser.parse("function f(x: Foo): Bar { return x; }\n").unwrap();
        assert_eq!(out.symbols[0].param_types, vec!["Foo".to_string()]);
        assert_eq!(out.symbols[0].return_type.as_deref(), Some("Bar"));
    }

    #[test]
    fn default_export_function_is_exported() {
        let mut parser = TypeScriptParser::new();
        let out = parser.parse("export default function handler() {}\n").unwrap();
        assert!(out.symbols[0].is_exported);
    }
}
