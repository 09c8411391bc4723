//! Printer
//!
//! Serializes an arena tree back to JavaScript. Parentheses are derived from a
//! precedence table rather than remembered from the source, so rewritten trees
//! print correctly no matter how they were assembled. Output is deterministic:
//! two-space indentation, one statement per line.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ast::{Ast, Function, FunctionFlavor, Literal, MethodKind, NodeId, NodeKind, PropertyKind};

lazy_static! {
    /// Expression statements that would otherwise parse as something else.
    static ref AMBIGUOUS_START_RE: Regex =
        Regex::new(r"^(\{|function\b|class\b|async\s+function\b|let\s*\[)").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRECEDENCE
// ═══════════════════════════════════════════════════════════════════════════════

const PREC_SEQUENCE: u8 = 1;
const PREC_ASSIGN: u8 = 2;
const PREC_CONDITIONAL: u8 = 3;
const PREC_PREFIX: u8 = 16;
const PREC_POSTFIX: u8 = 17;
const PREC_CALL: u8 = 18;
const PREC_MEMBER: u8 = 19;
const PREC_PRIMARY: u8 = 20;

fn binary_precedence(operator: &str) -> u8 {
    match operator {
        "|" => 7,
        "^" => 8,
        "&" => 9,
        "==" | "!=" | "===" | "!==" => 10,
        "<" | "<=" | ">" | ">=" | "in" | "instanceof" => 11,
        "<<" | ">>" | ">>>" => 12,
        "+" | "-" => 13,
        "*" | "/" | "%" => 14,
        "**" => 15,
        _ => PREC_PRIMARY,
    }
}

fn logical_precedence(operator: &str) -> u8 {
    match operator {
        "??" => 4,
        "||" => 5,
        _ => 6,
    }
}

fn precedence(ast: &Ast, id: NodeId) -> u8 {
    match ast.kind(id) {
        NodeKind::Sequence { .. } => PREC_SEQUENCE,
        NodeKind::Assignment { .. } | NodeKind::Yield { .. } => PREC_ASSIGN,
        NodeKind::Function(func) if func.flavor == FunctionFlavor::Arrow => PREC_ASSIGN,
        NodeKind::Conditional { .. } => PREC_CONDITIONAL,
        NodeKind::Logical { operator, .. } => logical_precedence(operator.as_str()),
        NodeKind::Binary { operator, .. } => binary_precedence(operator.as_str()),
        NodeKind::Unary { .. } | NodeKind::Await { .. } => PREC_PREFIX,
        NodeKind::Update { prefix: true, .. } => PREC_PREFIX,
        NodeKind::Update { prefix: false, .. } => PREC_POSTFIX,
        NodeKind::Call { .. } | NodeKind::TaggedTemplate { .. } => PREC_CALL,
        NodeKind::Member { .. } | NodeKind::New { .. } => PREC_MEMBER,
        NodeKind::Literal(Literal::Number(value)) if value.is_sign_negative() => PREC_PREFIX,
        _ => PREC_PRIMARY,
    }
}

pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{}", value)
    }
}

fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRINTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Prints the subtree at `root`: a program, a statement or an expression.
pub fn print(ast: &Ast, root: NodeId) -> String {
    let mut printer = Printer { ast, out: String::new(), indent: 0 };
    if let NodeKind::Program { body, directives } = ast.kind(root) {
        printer.program(body, directives);
    } else if ast.is_statement(root) || matches!(ast.kind(root), NodeKind::Raw { .. }) {
        printer.statement(root);
    } else {
        printer.expression(root, PREC_SEQUENCE);
    }
    printer.out
}

struct Printer<'a> {
    ast: &'a Ast,
    out: String,
    indent: usize,
}

impl Printer<'_> {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn program(&mut self, body: &[NodeId], directives: &[String]) {
        for directive in directives {
            self.push(&format!("\"{}\";\n", directive));
        }
        for stmt in body {
            self.statement(*stmt);
            self.out.push('\n');
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATEMENTS
    // ═══════════════════════════════════════════════════════════════════════════

    fn block(&mut self, body: &[NodeId], directives: &[String]) {
        if body.is_empty() && directives.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{");
        self.indent += 1;
        for directive in directives {
            self.newline();
            self.push(&format!("\"{}\";", directive));
        }
        for stmt in body {
            self.newline();
            self.statement(*stmt);
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    fn statement(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Program { body, directives } => self.program(body, directives),
            NodeKind::Block { body } => self.block(body, &[]),
            NodeKind::Empty => self.push(";"),
            NodeKind::Debugger => self.push("debugger;"),
            NodeKind::Expression { expression } => {
                let start = self.out.len();
                self.expression(*expression, PREC_SEQUENCE);
                if AMBIGUOUS_START_RE.is_match(&self.out[start..]) {
                    self.out.insert(start, '(');
                    self.push(")");
                }
                self.push(";");
            }
            NodeKind::If { test, consequent, alternate } => {
                self.push("if (");
                self.expression(*test, PREC_SEQUENCE);
                self.push(") ");
                // `if (a) if (b) x; else y;` would bind the `else` to the inner `if`.
                let dangling = alternate.is_some()
                    && matches!(ast.kind(*consequent), NodeKind::If { alternate: None, .. });
                if dangling {
                    self.block(&[*consequent], &[]);
                } else {
                    self.statement(*consequent);
                }
                if let Some(alternate) = alternate {
                    if dangling || matches!(ast.kind(*consequent), NodeKind::Block { .. }) {
                        self.push(" else ");
                    } else {
                        self.newline();
                        self.push("else ");
                    }
                    self.statement(*alternate);
                }
            }
            NodeKind::Labeled { label, body } => {
                self.push(&format!("{}: ", label));
                self.statement(*body);
            }
            NodeKind::Break { label } => match label {
                Some(label) => self.push(&format!("break {};", label)),
                None => self.push("break;"),
            },
            NodeKind::Continue { label } => match label {
                Some(label) => self.push(&format!("continue {};", label)),
                None => self.push("continue;"),
            },
            NodeKind::With { object, body } => {
                self.push("with (");
                self.expression(*object, PREC_SEQUENCE);
                self.push(") ");
                self.statement(*body);
            }
            NodeKind::Switch { discriminant, cases } => {
                self.push("switch (");
                self.expression(*discriminant, PREC_SEQUENCE);
                self.push(") {");
                self.indent += 1;
                for case in cases {
                    self.newline();
                    self.switch_case(*case);
                }
                self.indent -= 1;
                self.newline();
                self.push("}");
            }
            NodeKind::SwitchCase { .. } => self.switch_case(id),
            NodeKind::Return { argument } => match argument {
                Some(argument) => {
                    self.push("return ");
                    self.expression(*argument, PREC_SEQUENCE);
                    self.push(";");
                }
                None => self.push("return;"),
            },
            NodeKind::Throw { argument } => {
                self.push("throw ");
                self.expression(*argument, PREC_SEQUENCE);
                self.push(";");
            }
            NodeKind::Try { block, handler, finalizer } => {
                self.push("try ");
                self.statement(*block);
                if let Some(handler) = handler {
                    if let NodeKind::CatchClause { param, body } = ast.kind(*handler) {
                        match param {
                            Some(param) => {
                                self.push(" catch (");
                                self.pattern(*param);
                                self.push(") ");
                            }
                            None => self.push(" catch "),
                        }
                        self.statement(*body);
                    }
                }
                if let Some(finalizer) = finalizer {
                    self.push(" finally ");
                    self.statement(*finalizer);
                }
            }
            NodeKind::While { test, body } => {
                self.push("while (");
                self.expression(*test, PREC_SEQUENCE);
                self.push(") ");
                self.statement(*body);
            }
            NodeKind::DoWhile { body, test } => {
                self.push("do ");
                self.statement(*body);
                self.push(" while (");
                self.expression(*test, PREC_SEQUENCE);
                self.push(");");
            }
            NodeKind::For { init, test, update, body } => {
                self.push("for (");
                if let Some(init) = init {
                    self.for_head(*init);
                }
                self.push(";");
                if let Some(test) = test {
                    self.push(" ");
                    self.expression(*test, PREC_SEQUENCE);
                }
                self.push(";");
                if let Some(update) = update {
                    self.push(" ");
                    self.expression(*update, PREC_SEQUENCE);
                }
                self.push(") ");
                self.statement(*body);
            }
            NodeKind::ForIn { left, right, body } => {
                self.push("for (");
                self.for_head(*left);
                self.push(" in ");
                self.expression(*right, PREC_SEQUENCE);
                self.push(") ");
                self.statement(*body);
            }
            NodeKind::ForOf { left, right, body, is_await } => {
                self.push(if *is_await { "for await (" } else { "for (" });
                self.for_head(*left);
                self.push(" of ");
                self.expression(*right, PREC_ASSIGN);
                self.push(") ");
                self.statement(*body);
            }
            NodeKind::VariableDeclaration { .. } => {
                self.declaration(id);
                self.push(";");
            }
            NodeKind::ExportNamed { declaration } => {
                self.push("export ");
                self.statement(*declaration);
            }
            NodeKind::ExportDefault { declaration } => {
                self.push("export default ");
                if ast.is_statement(*declaration) {
                    self.statement(*declaration);
                } else {
                    self.expression(*declaration, PREC_ASSIGN);
                    self.push(";");
                }
            }
            NodeKind::Raw { text } => self.push(text),
            NodeKind::Function(func) => self.function(func),
            NodeKind::Class { .. } => self.class(id),
            _ => {
                self.expression(id, PREC_SEQUENCE);
                self.push(";");
            }
        }
    }

    fn switch_case(&mut self, id: NodeId) {
        let ast = self.ast;
        let NodeKind::SwitchCase { test, consequent } = ast.kind(id) else {
            return;
        };
        match test {
            Some(test) => {
                self.push("case ");
                self.expression(*test, PREC_SEQUENCE);
                self.push(":");
            }
            None => self.push("default:"),
        }
        self.indent += 1;
        for stmt in consequent {
            self.newline();
            self.statement(*stmt);
        }
        self.indent -= 1;
    }

    /// The `init` or `left` slot of a loop header: a declaration without its
    /// semicolon, a pattern, or an expression.
    fn for_head(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::VariableDeclaration { .. } => self.declaration(id),
            NodeKind::ArrayPattern { .. } | NodeKind::ObjectPattern { .. } => self.pattern(id),
            // `in` inside a `for` initializer would end the initializer.
            NodeKind::Binary { operator, .. } if operator.as_str() == "in" => {
                self.push("(");
                self.expression(id, PREC_SEQUENCE);
                self.push(")");
            }
            _ => self.expression(id, PREC_SEQUENCE),
        }
    }

    fn declaration(&mut self, id: NodeId) {
        let ast = self.ast;
        let NodeKind::VariableDeclaration { kind, declarations } = ast.kind(id) else {
            return;
        };
        self.push(kind.as_str());
        self.push(" ");
        for (i, declarator) in declarations.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if let NodeKind::VariableDeclarator { id, init } = ast.kind(*declarator) {
                self.pattern(*id);
                if let Some(init) = init {
                    self.push(" = ");
                    self.expression(*init, PREC_ASSIGN);
                }
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FUNCTIONS AND CLASSES
    // ═══════════════════════════════════════════════════════════════════════════

    fn params(&mut self, params: &[NodeId]) {
        self.push("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.pattern(*param);
        }
        self.push(")");
    }

    fn function_body(&mut self, func: &Function) {
        let ast = self.ast;
        match ast.kind(func.body) {
            NodeKind::Block { body } => self.block(body, &func.directives),
            _ => self.statement(func.body),
        }
    }

    fn function(&mut self, func: &Function) {
        if func.flavor == FunctionFlavor::Arrow {
            self.arrow(func);
            return;
        }
        if func.is_async {
            self.push("async ");
        }
        self.push("function");
        if func.generator {
            self.push("*");
        }
        if let Some(name) = &func.id {
            self.push(" ");
            self.push(name);
        }
        self.params(&func.params);
        self.push(" ");
        self.function_body(func);
    }

    fn arrow(&mut self, func: &Function) {
        if func.is_async {
            self.push("async ");
        }
        self.params(&func.params);
        self.push(" => ");
        let ast = self.ast;
        let concise = match ast.kind(func.body) {
            NodeKind::Block { body } if body.len() == 1 && func.directives.is_empty() => {
                match ast.kind(body[0]) {
                    NodeKind::Return { argument: Some(argument) } => Some(*argument),
                    _ => None,
                }
            }
            _ => None,
        };
        match concise {
            Some(argument) if matches!(ast.kind(argument), NodeKind::Object { .. }) => {
                self.push("(");
                self.expression(argument, PREC_SEQUENCE);
                self.push(")");
            }
            Some(argument) => self.expression(argument, PREC_ASSIGN),
            None => self.function_body(func),
        }
    }

    /// `async *name(params) { ... }` for methods and accessors.
    fn method_tail(&mut self, key: NodeId, computed: bool, value: NodeId, prefix: &str) {
        let ast = self.ast;
        let func = ast.function(value);
        if let Some(func) = func {
            if func.is_async {
                self.push("async ");
            }
            if func.generator {
                self.push("*");
            }
        }
        self.push(prefix);
        self.property_key(key, computed);
        match func {
            Some(func) => {
                self.params(&func.params);
                self.push(" ");
                self.function_body(func);
            }
            None => {
                self.push("() ");
                self.expression(value, PREC_ASSIGN);
            }
        }
    }

    fn class(&mut self, id: NodeId) {
        let ast = self.ast;
        let NodeKind::Class { id: name, super_class, body, .. } = ast.kind(id) else {
            return;
        };
        self.push("class");
        if let Some(name) = name {
            self.push(" ");
            self.push(name);
        }
        if let Some(super_class) = super_class {
            self.push(" extends ");
            self.expression(*super_class, PREC_CALL);
        }
        if body.is_empty() {
            self.push(" {}");
            return;
        }
        self.push(" {");
        self.indent += 1;
        for member in body {
            self.newline();
            match ast.kind(*member) {
                NodeKind::Method { key, value, kind, computed, is_static } => {
                    if *is_static {
                        self.push("static ");
                    }
                    let prefix = match kind {
                        MethodKind::Get => "get ",
                        MethodKind::Set => "set ",
                        MethodKind::Method | MethodKind::Constructor => "",
                    };
                    self.method_tail(*key, *computed, *value, prefix);
                }
                NodeKind::PropertyDefinition { key, value, computed, is_static } => {
                    if *is_static {
                        self.push("static ");
                    }
                    self.property_key(*key, *computed);
                    if let Some(value) = value {
                        self.push(" = ");
                        self.expression(*value, PREC_ASSIGN);
                    }
                    self.push(";");
                }
                _ => self.statement(*member),
            }
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PATTERNS AND PROPERTIES
    // ═══════════════════════════════════════════════════════════════════════════

    fn pattern(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::ArrayPattern { elements } => self.elements(elements),
            NodeKind::ObjectPattern { properties } => self.properties(properties),
            NodeKind::AssignmentPattern { left, right } => {
                self.pattern(*left);
                self.push(" = ");
                self.expression(*right, PREC_ASSIGN);
            }
            NodeKind::RestElement { argument } => {
                self.push("...");
                self.pattern(*argument);
            }
            _ => self.expression(id, PREC_CALL),
        }
    }

    fn elements(&mut self, elements: &[Option<NodeId>]) {
        self.push("[");
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if let Some(element) = element {
                self.pattern_or_expression(*element);
            }
        }
        // A trailing hole needs its own comma to count.
        if matches!(elements.last(), Some(None)) {
            self.push(",");
        }
        self.push("]");
    }

    fn properties(&mut self, properties: &[NodeId]) {
        if properties.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{ ");
        for (i, property) in properties.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.property(*property);
        }
        self.push(" }");
    }

    fn pattern_or_expression(&mut self, id: NodeId) {
        match self.ast.kind(id) {
            NodeKind::ArrayPattern { .. }
            | NodeKind::ObjectPattern { .. }
            | NodeKind::AssignmentPattern { .. }
            | NodeKind::RestElement { .. } => self.pattern(id),
            _ => self.expression(id, PREC_ASSIGN),
        }
    }

    fn property_key(&mut self, key: NodeId, computed: bool) {
        if computed {
            self.push("[");
            self.expression(key, PREC_ASSIGN);
            self.push("]");
            return;
        }
        let ast = self.ast;
        match ast.kind(key) {
            NodeKind::Identifier { name } => self.push(name),
            _ => self.expression(key, PREC_PRIMARY),
        }
    }

    fn property(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Property { key, value, kind, computed, shorthand, method } => {
                match kind {
                    PropertyKind::Get => return self.method_tail(*key, *computed, *value, "get "),
                    PropertyKind::Set => return self.method_tail(*key, *computed, *value, "set "),
                    PropertyKind::Init if *method => return self.method_tail(*key, *computed, *value, ""),
                    PropertyKind::Init => {}
                }
                if *shorthand && !*computed && self.is_shorthand(*key, *value) {
                    self.pattern_or_expression(*value);
                    return;
                }
                self.property_key(*key, *computed);
                self.push(": ");
                self.pattern_or_expression(*value);
            }
            NodeKind::Spread { argument } => {
                self.push("...");
                self.expression(*argument, PREC_ASSIGN);
            }
            _ => self.pattern_or_expression(id),
        }
    }

    /// `{ a }` and `{ a = 1 }` only print short when the value still names the key.
    fn is_shorthand(&self, key: NodeId, value: NodeId) -> bool {
        let Some(key) = self.ast.identifier_name(key) else {
            return false;
        };
        let target = match self.ast.kind(value) {
            NodeKind::AssignmentPattern { left, .. } => *left,
            _ => value,
        };
        self.ast.identifier_name(target) == Some(key)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPRESSIONS
    // ═══════════════════════════════════════════════════════════════════════════

    fn arguments(&mut self, arguments: &[NodeId]) {
        self.push("(");
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expression(*argument, PREC_ASSIGN);
        }
        self.push(")");
    }

    /// Whether the callee chain of a `new` reaches a call, which would
    /// otherwise take the `new`'s arguments.
    fn chain_has_call(&self, id: NodeId) -> bool {
        match self.ast.kind(id) {
            NodeKind::Call { .. } => true,
            NodeKind::Member { object, .. } => self.chain_has_call(*object),
            NodeKind::TaggedTemplate { tag, .. } => self.chain_has_call(*tag),
            _ => false,
        }
    }

    fn expression(&mut self, id: NodeId, min: u8) {
        let needs_parens = precedence(self.ast, id) < min;
        if needs_parens {
            self.push("(");
        }
        self.expression_inner(id);
        if needs_parens {
            self.push(")");
        }
    }

    fn expression_inner(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::Identifier { name } => self.push(name),
            NodeKind::Literal(literal) => self.literal(literal),
            NodeKind::Template { quasis, expressions } => self.template(quasis, expressions),
            NodeKind::TaggedTemplate { tag, quasi } => {
                self.expression(*tag, PREC_CALL);
                self.expression_inner(*quasi);
            }
            NodeKind::This => self.push("this"),
            NodeKind::Super => self.push("super"),
            NodeKind::MetaProperty { meta, property } => self.push(&format!("{}.{}", meta, property)),
            NodeKind::Array { elements } => self.elements(elements),
            NodeKind::Object { properties } => self.properties(properties),
            NodeKind::Property { .. } => self.property(id),
            NodeKind::Spread { argument } => {
                self.push("...");
                self.expression(*argument, PREC_ASSIGN);
            }
            NodeKind::Unary { operator, argument } => {
                let op = operator.as_str();
                self.push(op);
                let start = self.out.len();
                if op.chars().all(|c| c.is_ascii_alphabetic()) {
                    self.push(" ");
                }
                self.expression(*argument, PREC_PREFIX);
                // `- -x` and `+ +x` must not fuse into `--x`.
                let fused = matches!(op, "-" | "+") && self.out[start..].starts_with(op);
                if fused {
                    self.out.insert(start, ' ');
                }
            }
            NodeKind::Update { operator, prefix, argument } => {
                if *prefix {
                    self.push(operator.as_str());
                    self.expression(*argument, PREC_PREFIX);
                } else {
                    self.expression(*argument, PREC_POSTFIX);
                    self.push(operator.as_str());
                }
            }
            NodeKind::Binary { operator, left, right } => {
                let op = operator.as_str();
                let prec = binary_precedence(op);
                // `**` is right-associative and rejects a unary left operand.
                let (left_min, right_min) = if op == "**" { (PREC_POSTFIX, prec) } else { (prec, prec + 1) };
                self.expression(*left, left_min);
                self.push(&format!(" {} ", op));
                self.expression(*right, right_min);
            }
            NodeKind::Logical { operator, left, right } => {
                let op = operator.as_str();
                let prec = logical_precedence(op);
                self.logical_operand(*left, op, prec);
                self.push(&format!(" {} ", op));
                self.logical_operand(*right, op, prec + 1);
            }
            NodeKind::Assignment { operator, left, right } => {
                self.pattern(*left);
                self.push(&format!(" {} ", operator.as_str()));
                self.expression(*right, PREC_ASSIGN);
            }
            NodeKind::Conditional { test, consequent, alternate } => {
                self.expression(*test, PREC_CONDITIONAL + 1);
                self.push(" ? ");
                self.expression(*consequent, PREC_ASSIGN);
                self.push(" : ");
                self.expression(*alternate, PREC_ASSIGN);
            }
            NodeKind::Call { callee, arguments, optional } => {
                self.expression(*callee, PREC_CALL);
                if *optional {
                    self.push("?.");
                }
                self.arguments(arguments);
            }
            NodeKind::New { callee, arguments } => {
                self.push("new ");
                if self.chain_has_call(*callee) {
                    self.push("(");
                    self.expression(*callee, PREC_SEQUENCE);
                    self.push(")");
                } else {
                    self.expression(*callee, PREC_MEMBER);
                }
                self.arguments(arguments);
            }
            NodeKind::Member { object, property, computed, optional } => {
                let bare_integer = !*computed
                    && matches!(ast.kind(*object), NodeKind::Literal(Literal::Number(v)) if v.fract() == 0.0 && v.is_finite() && !v.is_sign_negative());
                if bare_integer {
                    self.push("(");
                    self.expression(*object, PREC_SEQUENCE);
                    self.push(")");
                } else {
                    self.expression(*object, PREC_CALL);
                }
                if *computed {
                    self.push(if *optional { "?.[" } else { "[" });
                    self.expression(*property, PREC_SEQUENCE);
                    self.push("]");
                } else {
                    self.push(if *optional { "?." } else { "." });
                    self.property_key(*property, false);
                }
            }
            NodeKind::Sequence { expressions } => {
                for (i, expr) in expressions.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expression(*expr, PREC_ASSIGN);
                }
            }
            NodeKind::Yield { argument, delegate } => {
                self.push(if *delegate { "yield*" } else { "yield" });
                if let Some(argument) = argument {
                    self.push(" ");
                    self.expression(*argument, PREC_ASSIGN);
                }
            }
            NodeKind::Await { argument } => {
                self.push("await ");
                self.expression(*argument, PREC_PREFIX);
            }
            NodeKind::Function(func) => self.function(func),
            NodeKind::Class { .. } => self.class(id),
            NodeKind::ArrayPattern { .. }
            | NodeKind::ObjectPattern { .. }
            | NodeKind::AssignmentPattern { .. }
            | NodeKind::RestElement { .. } => self.pattern(id),
            NodeKind::Raw { text } => self.push(text),
            NodeKind::VariableDeclarator { id: target, init } => {
                self.pattern(*target);
                if let Some(init) = init {
                    self.push(" = ");
                    self.expression(*init, PREC_ASSIGN);
                }
            }
            _ if ast.is_statement(id) => self.statement(id),
            _ => {}
        }
    }

    /// `??` may not be mixed with `||` or `&&` without parentheses.
    fn logical_operand(&mut self, operand: NodeId, parent: &str, min: u8) {
        let mixed = match self.ast.kind(operand) {
            NodeKind::Logical { operator, .. } => (parent == "??") != (operator.as_str() == "??"),
            _ => false,
        };
        if mixed {
            self.push("(");
            self.expression(operand, PREC_SEQUENCE);
            self.push(")");
        } else {
            self.expression(operand, min);
        }
    }

    fn literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Null => self.push("null"),
            Literal::Boolean(value) => self.push(if *value { "true" } else { "false" }),
            Literal::Number(value) => self.push(&format_number(*value)),
            Literal::String(value) => self.push(&quote(value)),
            Literal::RegExp { pattern, flags } => self.push(&format!("/{}/{}", pattern, flags)),
            Literal::BigInt(digits) => self.push(&format!("{}n", digits)),
        }
    }

    fn template(&mut self, quasis: &[String], expressions: &[NodeId]) {
        self.push("`");
        for (i, quasi) in quasis.iter().enumerate() {
            self.push(quasi);
            if let Some(expr) = expressions.get(i) {
                self.push("${");
                self.expression(*expr, PREC_SEQUENCE);
                self.push("}");
            }
        }
        self.push("`");
    }
}
