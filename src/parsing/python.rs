//! Python parser (spec.md §4.3): decorators, `__init__.py`/dunder
//! recognition, `@property` flag.

use super::{node_range, node_text, LanguageParser, ParseOutput, RawCallSite, RawImport, RawSymbol, RawSymbolKind};
use crate::error::ParseError;
use tree_sitter::{Node, Parser};

pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("python grammar should load");
        Self { parser }
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

struct Walker<'a> {
    source: &'a str,
    out: ParseOutput,
    current_class: Option<String>,
}

impl LanguageParser for PythonParser {
    fn parse(&mut self, source: &str) -> Result<ParseOutput, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ParseError::ParserInit { language: "python".into(), reason: "parser returned no tree".into() })?;
        if tree.root_node().has_error() {
            let node = first_error_node(tree.root_node()).unwrap_or_else(|| tree.root_node());
            let pos = node.start_position();
            return Err(ParseError::Syntax {
                line: pos.row as u32 + 1,
                column: pos.column as u32,
                reason: "python syntax error".into(),
            });
        }

        let mut walker = Walker { source, out: ParseOutput::default(), current_class: None };
        walker.walk_block(tree.root_node());
        Ok(walker.out)
    }
}

fn first_error_node(node: Node) -> Option<Node> {
    if node.is_error() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(e) = first_error_node(child) {
            return Some(e);
        }
    }
    None
}

impl<'a> Walker<'a> {
    fn walk_block(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk_statement(child);
        }
    }

    fn walk_statement(&mut self, node: Node) {
        match node.kind() {
            "decorated_definition" => self.handle_decorated(node),
            "function_definition" => self.handle_function(node, Vec::new()),
            "class_definition" => self.handle_class(node, Vec::new()),
            "if_statement" => self.handle_main_guard(node),
            "import_statement" | "import_from_statement" => self.handle_import(node),
            "expression_statement" => self.collect_calls(node),
            _ => {
                // Recurse into compound statements (if/for/while/try/with) so
                // top-level calls inside them still get captured.
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() != node.kind() {
                        self.collect_calls(child);
                    }
                }
            }
        }
    }

    fn handle_main_guard(&mut self, node: Node) {
        let condition = node.child_by_field_name("condition");
        let is_main_guard = condition
            .map(|c| node_text(c, self.source).contains("__name__") && node_text(c, self.source).contains("__main__"))
            .unwrap_or(false);
        if is_main_guard {
            if let Some(body) = node.child_by_field_name("consequence") {
                let mut symbol = RawSymbol::new("__main__", RawSymbolKind::Function, node_range(node));
                symbol.is_test = false;
                symbol.body_snippet = Some(node_text(body, self.source).chars().take(400).collect());
                self.out.symbols.push(symbol);
                self.collect_calls(body);
            }
        } else {
            self.collect_calls(node);
        }
    }

    fn handle_decorated(&mut self, node: Node) {
        let mut decorators = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "decorator" {
                let text = node_text(child, self.source).trim_start_matches('@').trim().to_string();
                decorators.push(text);
            }
        }
        if let Some(def) = node.child_by_field_name("definition") {
            match def.kind() {
                "function_definition" => self.handle_function(def, decorators),
                "class_definition" => self.handle_class(def, decorators),
                _ => {}
            }
        }
    }

    fn handle_class(&mut self, node: Node, decorators: Vec<String>) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = node_text(name_node, self.source).to_string();

        let mut bases = Vec::new();
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for arg in superclasses.children(&mut cursor) {
                if matches!(arg.kind(), "identifier" | "attribute") {
                    bases.push(node_text(arg, self.source).to_string());
                }
            }
        }

        let mut symbol = RawSymbol::new(name.clone(), RawSymbolKind::Class { bases_syntactic: bases }, node_range(node));
        symbol.decorators = decorators;
        symbol.is_exported = true;
        self.out.symbols.push(symbol);

        let previous_class = self.current_class.replace(name);
        if let Some(body) = node.child_by_field_name("body") {
            self.walk_block(body);
        }
        self.current_class = previous_class;
    }

    fn handle_function(&mut self, node: Node, decorators: Vec<String>) {
        let Some(name_node) = node.child_by_field_name("name") else { return };
        let name = node_text(name_node, self.source).to_string();
        let is_property = decorators.iter().any(|d| d == "property");

        let param_types = node
            .child_by_field_name("parameters")
            .map(|p| extract_typed_params(p, self.source))
            .unwrap_or_default();
        let return_type = node
            .child_by_field_name("return_type")
            .map(|r| node_text(r, self.source).to_string());

        let kind = if let Some(owner) = &self.current_class {
            RawSymbolKind::Method {
                owner_name: owner.clone(),
                is_override: false,
                is_property,
                is_ctor: name == "__init__",
                is_stub: false,
            }
        } else {
            RawSymbolKind::Function
        };

        let mut symbol = RawSymbol::new(name.clone(), kind, node_range(node));
        symbol.decorators = decorators;
        symbol.is_test = name.starts_with("test_");
        symbol.is_exported = self.current_class.is_none();
        symbol.param_types = param_types;
        symbol.return_type = return_type;
        symbol.signature = node.child_by_field_name("parameters").map(|p| node_text(p, self.source).to_string());
        if let Some(body) = node.child_by_field_name("body") {
            symbol.body_snippet = Some(node_text(body, self.source).chars().take(400).collect());
        }
        let qualified = symbol.qualified_name();
        self.out.symbols.push(symbol);

        if let Some(body) = node.child_by_field_name("body") {
            self.collect_calls_with_caller(body, &qualified);
        }
    }

    fn handle_import(&mut self, node: Node) {
        let range = node_range(node);
        match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "dotted_name" {
                        self.out.imports.push(RawImport { specifier: node_text(child, self.source).to_string(), symbols: Vec::new(), range });
                    }
                }
            }
            "import_from_statement" => {
                let module = node.child_by_field_name("module_name").map(|m| node_text(m, self.source).to_string());
                let mut names = Vec::new();
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "dotted_name" && Some(node_text(child, self.source)) != module.as_deref() {
                        names.push(node_text(child, self.source).to_string());
                    } else if child.kind() == "wildcard_import" {
                        names.push("*".to_string());
                    }
                }
                if let Some(spec) = module {
                    self.out.imports.push(RawImport { specifier: spec, symbols: names, range });
                }
            }
            _ => {}
        }
    }

    fn collect_calls(&mut self, node: Node) {
        let caller = self.current_class.clone().unwrap_or_default();
        self.collect_calls_with_caller(node, &caller);
    }

    fn collect_calls_with_caller(&mut self, node: Node, caller_qualified_name: &str) {
        if node.kind() == "call" {
            if let Some(func) = node.child_by_field_name("function") {
                let (callee_name, receiver_expr) = match func.kind() {
                    "attribute" => {
                        let attr = func.child_by_field_name("attribute").map(|a| node_text(a, self.source).to_string()).unwrap_or_default();
                        let obj = func.child_by_field_name("object").map(|o| node_text(o, self.source).to_string());
                        (attr, obj)
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
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            // Don't descend into nested function/class definitions; they are
            // walked separately with their own caller context.
            if matches!(child.kind(), "function_definition" | "class_definition" | "decorated_definition") {
                continue;
            }
            self.collect_calls_with_caller(child, caller_qualified_name);
        }
    }
}

fn extract_typed_params(params: Node, source: &str) -> Vec<String> {
    let mut types = Vec::new();
    let mut cursor = params.walk();
    for child in params.children(&mut cursor) {
        if child.kind() == "typed_parameter" || child.kind() == "typed_default_parameter" {
            if let Some(type_node) = child.child_by_field_name("type") {
                types.push(node_text(type_node, source).to_string());
            }
        }
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_and_call() {
        let mut parser = PythonParser::new();
        let out = parser.parse("def f():\n    g()\n").unwrap();
        assert_eq!(out.symbols.len(), 1);
        assert_eq!(out.symbols[0].name, "f");
        assert_eq!(out.calls.len(), 1);
        assert_eq!(out.calls[0].callee_name, "g");
    }

    #[test]
    fn recognizes_decorator_and_entry_candidate() {
        let mut parser = PythonParser::new();
        let out = parser.parse("@app.route(\"/x\")\ndef handler():\n    pass\n").unwrap();
        assert_eq!(out.symbols[0].decorators, vec!["app.route(\"/x\")".to_string()]);
    }

    #[test]
    fn class_with_bases_and_init_is_ctor() {
        let src = "class Dog(Animal):\n    def __init__(self):\n        pass\n";
        let mut parser = PythonParser::new();
        let out = parser.parse(src).unwrap();
        let class = out.symbols.iter().find(|s| s.name == "Dog").unwrap();
        match &class.kind {
            RawSymbolKind::Class { bases_syntactic } => assert_eq!(bases_syntactic, &vec!["Animal".to_string()]),
            _ => panic!("expected class"),
        }
        let method = out.symbols.iter().find(|s| s.name == "__init__").unwrap();
        match &method.kind {
            RawSymbolKind::Method { is_ctor, .. } => assert!(is_ctor),
            _ => panic!("expected method"),
        }
    }

    #[test]
    fn syntax_error_is_reported() {
        let mut parser = PythonParser::new();
        let result = parser.parse("def f(:\n");
        assert!(result.is_err());
    }
}
