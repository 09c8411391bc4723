//! Arena syntax tree for the resumable-function pass.
//!
//! Every node lives in one [`Ast`] and is addressed by a [`NodeId`] handed out at
//! creation time. A parent refers to its children only by id, so replacing a
//! child is a single slot write and no node is ever reachable from two parents.

use oxc_span::{Span, SPAN};
use oxc_syntax::operator::{
    AssignmentOperator, BinaryOperator, LogicalOperator, UnaryOperator, UpdateOperator,
};

// ═══════════════════════════════════════════════════════════════════════════════
// NODE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl DeclKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Var => "var",
            DeclKind::Let => "let",
            DeclKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionFlavor {
    Declaration,
    Expression,
    Arrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Get,
    Set,
    Constructor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    RegExp { pattern: String, flags: String },
    BigInt(String),
}

#[derive(Debug, Clone)]
pub struct Function {
    pub id: Option<String>,
    pub params: Vec<NodeId>,
    /// Always a `Block`; arrow expression bodies are lowered to `{ return e; }`.
    pub body: NodeId,
    pub flavor: FunctionFlavor,
    pub generator: bool,
    pub is_async: bool,
    pub directives: Vec<String>,
}

/// Closed set of node kinds. Child ids are stored inline in the variant.
#[derive(Debug, Clone)]
pub enum NodeKind {
    // Statements
    Program { body: Vec<NodeId>, directives: Vec<String> },
    Block { body: Vec<NodeId> },
    Empty,
    Debugger,
    Expression { expression: NodeId },
    If { test: NodeId, consequent: NodeId, alternate: Option<NodeId> },
    Labeled { label: String, body: NodeId },
    Break { label: Option<String> },
    Continue { label: Option<String> },
    With { object: NodeId, body: NodeId },
    Switch { discriminant: NodeId, cases: Vec<NodeId> },
    SwitchCase { test: Option<NodeId>, consequent: Vec<NodeId> },
    Return { argument: Option<NodeId> },
    Throw { argument: NodeId },
    Try { block: NodeId, handler: Option<NodeId>, finalizer: Option<NodeId> },
    CatchClause { param: Option<NodeId>, body: NodeId },
    While { test: NodeId, body: NodeId },
    DoWhile { body: NodeId, test: NodeId },
    For { init: Option<NodeId>, test: Option<NodeId>, update: Option<NodeId>, body: NodeId },
    ForIn { left: NodeId, right: NodeId, body: NodeId },
    ForOf { left: NodeId, right: NodeId, body: NodeId, is_await: bool },
    VariableDeclaration { kind: DeclKind, declarations: Vec<NodeId> },
    VariableDeclarator { id: NodeId, init: Option<NodeId> },
    ExportNamed { declaration: NodeId },
    ExportDefault { declaration: NodeId },
    /// Source text carried through untouched (imports, type-level statements,
    /// expressions the front end does not model).
    Raw { text: String },

    // Functions and classes
    Function(Function),
    Class { id: Option<String>, super_class: Option<NodeId>, body: Vec<NodeId>, is_declaration: bool },
    Method { key: NodeId, value: NodeId, kind: MethodKind, computed: bool, is_static: bool },
    PropertyDefinition { key: NodeId, value: Option<NodeId>, computed: bool, is_static: bool },

    // Expressions
    Identifier { name: String },
    Literal(Literal),
    Template { quasis: Vec<String>, expressions: Vec<NodeId> },
    TaggedTemplate { tag: NodeId, quasi: NodeId },
    This,
    Super,
    Array { elements: Vec<Option<NodeId>> },
    Object { properties: Vec<NodeId> },
    Property { key: NodeId, value: NodeId, kind: PropertyKind, computed: bool, shorthand: bool, method: bool },
    Spread { argument: NodeId },
    Unary { operator: UnaryOperator, argument: NodeId },
    Update { operator: UpdateOperator, prefix: bool, argument: NodeId },
    Binary { operator: BinaryOperator, left: NodeId, right: NodeId },
    Logical { operator: LogicalOperator, left: NodeId, right: NodeId },
    Assignment { operator: AssignmentOperator, left: NodeId, right: NodeId },
    Conditional { test: NodeId, consequent: NodeId, alternate: NodeId },
    Call { callee: NodeId, arguments: Vec<NodeId>, optional: bool },
    New { callee: NodeId, arguments: Vec<NodeId> },
    Member { object: NodeId, property: NodeId, computed: bool, optional: bool },
    Sequence { expressions: Vec<NodeId> },
    Yield { argument: Option<NodeId>, delegate: bool },
    Await { argument: NodeId },
    MetaProperty { meta: String, property: String },

    // Patterns
    ArrayPattern { elements: Vec<Option<NodeId>> },
    ObjectPattern { properties: Vec<NodeId> },
    AssignmentPattern { left: NodeId, right: NodeId },
    RestElement { argument: NodeId },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Address of a child inside its parent: the field name plus the position for
/// sequence fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub field: &'static str,
    pub index: Option<usize>,
}

impl Slot {
    pub fn field(field: &'static str) -> Self {
        Slot { field, index: None }
    }

    pub fn at(field: &'static str, index: usize) -> Self {
        Slot { field, index: Some(index) }
    }
}

fn seq_slot(children: &mut [NodeId], index: Option<usize>) -> Option<&mut NodeId> {
    index.and_then(move |i| children.get_mut(i))
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARENA
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.alloc_at(kind, SPAN)
    }

    pub fn alloc_at(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn function(&self, id: NodeId) -> Option<&Function> {
        match self.kind(id) {
            NodeKind::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn function_mut(&mut self, id: NodeId) -> Option<&mut Function> {
        match self.kind_mut(id) {
            NodeKind::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Identifier { name } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_literal(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Literal(_))
    }

    pub fn is_statement(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Program { .. }
            | NodeKind::Block { .. }
            | NodeKind::Empty
            | NodeKind::Debugger
            | NodeKind::Expression { .. }
            | NodeKind::If { .. }
            | NodeKind::Labeled { .. }
            | NodeKind::Break { .. }
            | NodeKind::Continue { .. }
            | NodeKind::With { .. }
            | NodeKind::Switch { .. }
            | NodeKind::Return { .. }
            | NodeKind::Throw { .. }
            | NodeKind::Try { .. }
            | NodeKind::While { .. }
            | NodeKind::DoWhile { .. }
            | NodeKind::For { .. }
            | NodeKind::ForIn { .. }
            | NodeKind::ForOf { .. }
            | NodeKind::VariableDeclaration { .. }
            | NodeKind::ExportNamed { .. }
            | NodeKind::ExportDefault { .. } => true,
            NodeKind::Function(func) => func.flavor == FunctionFlavor::Declaration,
            NodeKind::Class { is_declaration, .. } => *is_declaration,
            _ => false,
        }
    }

    pub fn is_declaration(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::VariableDeclaration { .. } | NodeKind::VariableDeclarator { .. } => true,
            NodeKind::Function(func) => func.flavor == FunctionFlavor::Declaration,
            NodeKind::Class { is_declaration, .. } => *is_declaration,
            _ => false,
        }
    }

    /// Scope-opening nodes: blocks, loop headers, functions, catch clauses and
    /// the program itself.
    pub fn opens_scope(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            NodeKind::Program { .. }
                | NodeKind::Block { .. }
                | NodeKind::For { .. }
                | NodeKind::ForIn { .. }
                | NodeKind::ForOf { .. }
                | NodeKind::Function(_)
                | NodeKind::CatchClause { .. }
        )
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CHILD SLOTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Direct children in source order. Absent optional slots and holes are skipped.
    pub fn children(&self, id: NodeId) -> Vec<(Slot, NodeId)> {
        let mut out = Vec::new();
        let one = |out: &mut Vec<(Slot, NodeId)>, field: &'static str, child: NodeId| {
            out.push((Slot::field(field), child));
        };
        let opt = |out: &mut Vec<(Slot, NodeId)>, field: &'static str, child: Option<NodeId>| {
            if let Some(child) = child {
                out.push((Slot::field(field), child));
            }
        };
        let seq = |out: &mut Vec<(Slot, NodeId)>, field: &'static str, children: &[NodeId]| {
            for (i, child) in children.iter().enumerate() {
                out.push((Slot::at(field, i), *child));
            }
        };
        let holes = |out: &mut Vec<(Slot, NodeId)>, field: &'static str, children: &[Option<NodeId>]| {
            for (i, child) in children.iter().enumerate() {
                if let Some(child) = child {
                    out.push((Slot::at(field, i), *child));
                }
            }
        };

        match self.kind(id) {
            NodeKind::Program { body, .. } | NodeKind::Block { body } => seq(&mut out, "body", body),
            NodeKind::Empty
            | NodeKind::Debugger
            | NodeKind::Break { .. }
            | NodeKind::Continue { .. }
            | NodeKind::Raw { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::Literal(_)
            | NodeKind::This
            | NodeKind::Super
            | NodeKind::MetaProperty { .. } => {}
            NodeKind::Expression { expression } => one(&mut out, "expression", *expression),
            NodeKind::If { test, consequent, alternate } => {
                one(&mut out, "test", *test);
                one(&mut out, "consequent", *consequent);
                opt(&mut out, "alternate", *alternate);
            }
            NodeKind::Labeled { body, .. } => one(&mut out, "body", *body),
            NodeKind::With { object, body } => {
                one(&mut out, "object", *object);
                one(&mut out, "body", *body);
            }
            NodeKind::Switch { discriminant, cases } => {
                one(&mut out, "discriminant", *discriminant);
                seq(&mut out, "cases", cases);
            }
            NodeKind::SwitchCase { test, consequent } => {
                opt(&mut out, "test", *test);
                seq(&mut out, "consequent", consequent);
            }
            NodeKind::Return { argument } => opt(&mut out, "argument", *argument),
            NodeKind::Throw { argument } => one(&mut out, "argument", *argument),
            NodeKind::Try { block, handler, finalizer } => {
                one(&mut out, "block", *block);
                opt(&mut out, "handler", *handler);
                opt(&mut out, "finalizer", *finalizer);
            }
            NodeKind::CatchClause { param, body } => {
                opt(&mut out, "param", *param);
                one(&mut out, "body", *body);
            }
            NodeKind::While { test, body } => {
                one(&mut out, "test", *test);
                one(&mut out, "body", *body);
            }
            NodeKind::DoWhile { body, test } => {
                one(&mut out, "body", *body);
                one(&mut out, "test", *test);
            }
            NodeKind::For { init, test, update, body } => {
                opt(&mut out, "init", *init);
                opt(&mut out, "test", *test);
                opt(&mut out, "update", *update);
                one(&mut out, "body", *body);
            }
            NodeKind::ForIn { left, right, body } | NodeKind::ForOf { left, right, body, .. } => {
                one(&mut out, "left", *left);
                one(&mut out, "right", *right);
                one(&mut out, "body", *body);
            }
            NodeKind::VariableDeclaration { declarations, .. } => {
                seq(&mut out, "declarations", declarations)
            }
            NodeKind::VariableDeclarator { id: target, init } => {
                one(&mut out, "id", *target);
                opt(&mut out, "init", *init);
            }
            NodeKind::ExportNamed { declaration } | NodeKind::ExportDefault { declaration } => {
                one(&mut out, "declaration", *declaration)
            }
            NodeKind::Function(func) => {
                seq(&mut out, "params", &func.params);
                one(&mut out, "body", func.body);
            }
            NodeKind::Class { super_class, body, .. } => {
                opt(&mut out, "superClass", *super_class);
                seq(&mut out, "body", body);
            }
            NodeKind::Method { key, value, .. } => {
                one(&mut out, "key", *key);
                one(&mut out, "value", *value);
            }
            NodeKind::PropertyDefinition { key, value, .. } => {
                one(&mut out, "key", *key);
                opt(&mut out, "value", *value);
            }
            NodeKind::Template { expressions, .. } => seq(&mut out, "expressions", expressions),
            NodeKind::TaggedTemplate { tag, quasi } => {
                one(&mut out, "tag", *tag);
                one(&mut out, "quasi", *quasi);
            }
            NodeKind::Array { elements } | NodeKind::ArrayPattern { elements } => {
                holes(&mut out, "elements", elements)
            }
            NodeKind::Object { properties } | NodeKind::ObjectPattern { properties } => {
                seq(&mut out, "properties", properties)
            }
            NodeKind::Property { key, value, .. } => {
                one(&mut out, "key", *key);
                one(&mut out, "value", *value);
            }
            NodeKind::Spread { argument }
            | NodeKind::Unary { argument, .. }
            | NodeKind::Update { argument, .. }
            | NodeKind::Await { argument }
            | NodeKind::RestElement { argument } => one(&mut out, "argument", *argument),
            NodeKind::Yield { argument, .. } => opt(&mut out, "argument", *argument),
            NodeKind::Binary { left, right, .. }
            | NodeKind::Logical { left, right, .. }
            | NodeKind::Assignment { left, right, .. }
            | NodeKind::AssignmentPattern { left, right } => {
                one(&mut out, "left", *left);
                one(&mut out, "right", *right);
            }
            NodeKind::Conditional { test, consequent, alternate } => {
                one(&mut out, "test", *test);
                one(&mut out, "consequent", *consequent);
                one(&mut out, "alternate", *alternate);
            }
            NodeKind::Call { callee, arguments, .. } | NodeKind::New { callee, arguments } => {
                one(&mut out, "callee", *callee);
                seq(&mut out, "arguments", arguments);
            }
            NodeKind::Member { object, property, .. } => {
                one(&mut out, "object", *object);
                one(&mut out, "property", *property);
            }
            NodeKind::Sequence { expressions } => seq(&mut out, "expressions", expressions),
        }
        out
    }

    fn slot_mut(&mut self, parent: NodeId, slot: Slot) -> Option<&mut NodeId> {
        let index = slot.index;
        match (self.kind_mut(parent), slot.field) {
            (NodeKind::Program { body, .. }, "body") | (NodeKind::Block { body }, "body") => seq_slot(body, index),
            (NodeKind::Expression { expression }, "expression") => Some(expression),
            (NodeKind::If { test, .. }, "test") => Some(test),
            (NodeKind::If { consequent, .. }, "consequent") => Some(consequent),
            (NodeKind::If { alternate, .. }, "alternate") => alternate.as_mut(),
            (NodeKind::Labeled { body, .. }, "body") => Some(body),
            (NodeKind::With { object, .. }, "object") => Some(object),
            (NodeKind::With { body, .. }, "body") => Some(body),
            (NodeKind::Switch { discriminant, .. }, "discriminant") => Some(discriminant),
            (NodeKind::Switch { cases, .. }, "cases") => seq_slot(cases, index),
            (NodeKind::SwitchCase { test, .. }, "test") => test.as_mut(),
            (NodeKind::SwitchCase { consequent, .. }, "consequent") => seq_slot(consequent, index),
            (NodeKind::Return { argument }, "argument") => argument.as_mut(),
            (NodeKind::Throw { argument }, "argument") => Some(argument),
            (NodeKind::Try { block, .. }, "block") => Some(block),
            (NodeKind::Try { handler, .. }, "handler") => handler.as_mut(),
            (NodeKind::Try { finalizer, .. }, "finalizer") => finalizer.as_mut(),
            (NodeKind::CatchClause { param, .. }, "param") => param.as_mut(),
            (NodeKind::CatchClause { body, .. }, "body") => Some(body),
            (NodeKind::While { test, .. }, "test") | (NodeKind::DoWhile { test, .. }, "test") => {
                Some(test)
            }
            (NodeKind::While { body, .. }, "body") | (NodeKind::DoWhile { body, .. }, "body") => {
                Some(body)
            }
            (NodeKind::For { init, .. }, "init") => init.as_mut(),
            (NodeKind::For { test, .. }, "test") => test.as_mut(),
            (NodeKind::For { update, .. }, "update") => update.as_mut(),
            (NodeKind::For { body, .. }, "body") => Some(body),
            (NodeKind::ForIn { left, .. }, "left") | (NodeKind::ForOf { left, .. }, "left") => {
                Some(left)
            }
            (NodeKind::ForIn { right, .. }, "right") | (NodeKind::ForOf { right, .. }, "right") => {
                Some(right)
            }
            (NodeKind::ForIn { body, .. }, "body") | (NodeKind::ForOf { body, .. }, "body") => {
                Some(body)
            }
            (NodeKind::VariableDeclaration { declarations, .. }, "declarations") => seq_slot(declarations, index),
            (NodeKind::VariableDeclarator { id, .. }, "id") => Some(id),
            (NodeKind::VariableDeclarator { init, .. }, "init") => init.as_mut(),
            (NodeKind::ExportNamed { declaration }, "declaration")
            | (NodeKind::ExportDefault { declaration }, "declaration") => Some(declaration),
            (NodeKind::Function(func), "params") => seq_slot(&mut func.params, index),
            (NodeKind::Function(func), "body") => Some(&mut func.body),
            (NodeKind::Class { super_class, .. }, "superClass") => super_class.as_mut(),
            (NodeKind::Class { body, .. }, "body") => seq_slot(body, index),
            (NodeKind::Method { key, .. }, "key")
            | (NodeKind::PropertyDefinition { key, .. }, "key")
            | (NodeKind::Property { key, .. }, "key") => Some(key),
            (NodeKind::Method { value, .. }, "value") | (NodeKind::Property { value, .. }, "value") => {
                Some(value)
            }
            (NodeKind::PropertyDefinition { value, .. }, "value") => value.as_mut(),
            (NodeKind::Template { expressions, .. }, "expressions")
            | (NodeKind::Sequence { expressions }, "expressions") => seq_slot(expressions, index),
            (NodeKind::TaggedTemplate { tag, .. }, "tag") => Some(tag),
            (NodeKind::TaggedTemplate { quasi, .. }, "quasi") => Some(quasi),
            (NodeKind::Array { elements }, "elements")
            | (NodeKind::ArrayPattern { elements }, "elements") => {
                index.and_then(|i| elements.get_mut(i)).and_then(|e| e.as_mut())
            }
            (NodeKind::Object { properties }, "properties")
            | (NodeKind::ObjectPattern { properties }, "properties") => seq_slot(properties, index),
            (NodeKind::Spread { argument }, "argument")
            | (NodeKind::Unary { argument, .. }, "argument")
            | (NodeKind::Update { argument, .. }, "argument")
            | (NodeKind::Await { argument }, "argument")
            | (NodeKind::RestElement { argument }, "argument") => Some(argument),
            (NodeKind::Yield { argument, .. }, "argument") => argument.as_mut(),
            (NodeKind::Binary { left, .. }, "left")
            | (NodeKind::Logical { left, .. }, "left")
            | (NodeKind::Assignment { left, .. }, "left")
            | (NodeKind::AssignmentPattern { left, .. }, "left") => Some(left),
            (NodeKind::Binary { right, .. }, "right")
            | (NodeKind::Logical { right, .. }, "right")
            | (NodeKind::Assignment { right, .. }, "right")
            | (NodeKind::AssignmentPattern { right, .. }, "right") => Some(right),
            (NodeKind::Conditional { test, .. }, "test") => Some(test),
            (NodeKind::Conditional { consequent, .. }, "consequent") => Some(consequent),
            (NodeKind::Conditional { alternate, .. }, "alternate") => Some(alternate),
            (NodeKind::Call { callee, .. }, "callee") | (NodeKind::New { callee, .. }, "callee") => {
                Some(callee)
            }
            (NodeKind::Call { arguments, .. }, "arguments")
            | (NodeKind::New { arguments, .. }, "arguments") => seq_slot(arguments, index),
            (NodeKind::Member { object, .. }, "object") => Some(object),
            (NodeKind::Member { property, .. }, "property") => Some(property),
            _ => None,
        }
    }

    /// Writes `child` into `slot` of `parent`. Returns false when the slot does
    /// not exist on that kind (or is an absent optional).
    pub fn set_child(&mut self, parent: NodeId, slot: Slot, child: NodeId) -> bool {
        match self.slot_mut(parent, slot) {
            Some(target) => {
                *target = child;
                true
            }
            None => false,
        }
    }

    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let node = self.nodes[id.index()].clone();
        let copy = self.alloc_at(node.kind, node.span);
        for (slot, child) in self.children(copy) {
            let cloned = self.deep_clone(child);
            self.set_child(copy, slot, cloned);
        }
        copy
    }

    /// Names bound by a binding or assignment pattern. Member targets bind nothing.
    pub fn bound_names(&self, pattern: NodeId) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_bound_names(pattern, &mut names);
        names
    }

    fn collect_bound_names(&self, pattern: NodeId, names: &mut Vec<String>) {
        match self.kind(pattern) {
            NodeKind::Identifier { name } => names.push(name.clone()),
            NodeKind::ArrayPattern { elements } => {
                for element in elements.iter().flatten() {
                    self.collect_bound_names(*element, names);
                }
            }
            NodeKind::ObjectPattern { properties } => {
                for property in properties {
                    match self.kind(*property) {
                        NodeKind::Property { value, .. } => self.collect_bound_names(*value, names),
                        _ => self.collect_bound_names(*property, names),
                    }
                }
            }
            NodeKind::AssignmentPattern { left, .. } => self.collect_bound_names(*left, names),
            NodeKind::RestElement { argument } => self.collect_bound_names(*argument, names),
            _ => {}
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BUILDERS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn ident(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Identifier { name: name.into() })
    }

    pub fn num(&mut self, value: f64) -> NodeId {
        self.alloc(NodeKind::Literal(Literal::Number(value)))
    }

    pub fn string(&mut self, value: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Literal(Literal::String(value.into())))
    }

    pub fn boolean(&mut self, value: bool) -> NodeId {
        self.alloc(NodeKind::Literal(Literal::Boolean(value)))
    }

    pub fn null(&mut self) -> NodeId {
        self.alloc(NodeKind::Literal(Literal::Null))
    }

    pub fn this(&mut self) -> NodeId {
        self.alloc(NodeKind::This)
    }

    /// `object.name`
    pub fn member(&mut self, object: NodeId, name: &str) -> NodeId {
        let property = self.ident(name);
        self.alloc(NodeKind::Member { object, property, computed: false, optional: false })
    }

    /// `base.name` where `base` is a plain identifier.
    pub fn path(&mut self, base: &str, name: &str) -> NodeId {
        let object = self.ident(base);
        self.member(object, name)
    }

    pub fn call(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Call { callee, arguments, optional: false })
    }

    pub fn assign(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::Assignment { operator: AssignmentOperator::Assign, left, right })
    }

    pub fn binary(&mut self, operator: BinaryOperator, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::Binary { operator, left, right })
    }

    pub fn not(&mut self, argument: NodeId) -> NodeId {
        self.alloc(NodeKind::Unary { operator: UnaryOperator::LogicalNot, argument })
    }

    pub fn sequence(&mut self, expressions: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Sequence { expressions })
    }

    pub fn expr_stmt(&mut self, expression: NodeId) -> NodeId {
        self.alloc(NodeKind::Expression { expression })
    }

    pub fn block(&mut self, body: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Block { body })
    }

    pub fn ret(&mut self, argument: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::Return { argument })
    }

    pub fn declarator(&mut self, name: &str, init: Option<NodeId>) -> NodeId {
        let id = self.ident(name);
        self.alloc(NodeKind::VariableDeclarator { id, init })
    }

    pub fn var_decl(&mut self, declarations: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::VariableDeclaration { kind: DeclKind::Var, declarations })
    }
}
