//! Declaration hoisting
//!
//! Locals of a resumable function must survive across dispatch calls, so every
//! declaration in its body is turned into a plain assignment and the names are
//! collected into one `var` statement placed ahead of the dispatch factory.
//! Nested functions are not entered; their declarations belong to them.

use oxc_syntax::operator::AssignmentOperator;

use crate::ast::{Ast, FunctionFlavor, NodeId, NodeKind};
use crate::scope::UniqueNames;
use rustc_hash::FxHashSet;

/// Hoists the declarations of the function `func`. Returns the consolidated
/// `var` declaration, or `None` when nothing was declared outside the
/// parameter list.
pub fn hoist(ast: &mut Ast, func: NodeId, names: &mut UniqueNames) -> Option<NodeId> {
    let (params, body) = {
        let func = ast.function(func)?;
        (func.params.clone(), func.body)
    };
    let mut excluded = FxHashSet::default();
    for param in params {
        excluded.extend(ast.bound_names(param));
    }

    let mut hoister = Hoister { ast, names, vars: Vec::new(), seen: FxHashSet::default() };
    hoister.statement(body);
    let Hoister { ast, vars, .. } = hoister;

    let declarations: Vec<NodeId> = vars
        .into_iter()
        .filter(|name| !excluded.contains(name))
        .map(|name| ast.declarator(&name, None))
        .collect();
    if declarations.is_empty() {
        None
    } else {
        Some(ast.var_decl(declarations))
    }
}

struct Hoister<'a> {
    ast: &'a mut Ast,
    names: &'a mut UniqueNames,
    vars: Vec<String>,
    seen: FxHashSet<String>,
}

/// What a declaration statement turned into.
enum Lowered {
    /// Replace the declaration with this statement.
    InPlace(NodeId),
    /// Function declaration: the assignment must run before the rest of the block.
    Hoisted(NodeId),
    Removed,
}

impl Hoister<'_> {
    fn record(&mut self, name: String) {
        if self.seen.insert(name.clone()) {
            self.vars.push(name);
        }
    }

    fn record_pattern(&mut self, pattern: NodeId) {
        for name in self.ast.bound_names(pattern) {
            self.record(name);
        }
    }

    /// Turns a declaration into assignments of its initialized entries.
    fn declaration_to_expression(&mut self, decl: NodeId) -> Option<NodeId> {
        let NodeKind::VariableDeclaration { declarations, .. } = self.ast.kind(decl).clone() else {
            return None;
        };
        let mut assignments = Vec::new();
        for declarator in declarations {
            let NodeKind::VariableDeclarator { id, init } = *self.ast.kind(declarator) else {
                continue;
            };
            self.record_pattern(id);
            if let Some(init) = init {
                let span = self.ast.span(declarator);
                assignments.push(self.ast.alloc_at(
                    NodeKind::Assignment {
                        operator: AssignmentOperator::Assign,
                        left: id,
                        right: init,
                    },
                    span,
                ));
            }
        }
        match assignments.len() {
            0 => None,
            1 => assignments.pop(),
            _ => Some(self.ast.sequence(assignments)),
        }
    }

    fn lower_declaration(&mut self, stmt: NodeId) -> Option<Lowered> {
        let span = self.ast.span(stmt);
        match self.ast.kind(stmt).clone() {
            NodeKind::VariableDeclaration { .. } => {
                Some(match self.declaration_to_expression(stmt) {
                    Some(expr) => Lowered::InPlace(self.ast.alloc_at(NodeKind::Expression { expression: expr }, span)),
                    None => Lowered::Removed,
                })
            }
            NodeKind::Function(func) if func.flavor == FunctionFlavor::Declaration => {
                let name = func.id.clone().unwrap_or_default();
                self.record(name.clone());
                let internal = self.names.fresh(&name);
                if let Some(func) = self.ast.function_mut(stmt) {
                    func.flavor = FunctionFlavor::Expression;
                    func.id = Some(internal);
                }
                let target = self.ast.ident(name);
                let assign = self.ast.assign(target, stmt);
                Some(Lowered::Hoisted(self.ast.alloc_at(NodeKind::Expression { expression: assign }, span)))
            }
            NodeKind::Class { id: Some(name), is_declaration: true, .. } => {
                self.record(name.clone());
                if let NodeKind::Class { is_declaration, .. } = self.ast.kind_mut(stmt) {
                    *is_declaration = false;
                }
                let target = self.ast.ident(name);
                let assign = self.ast.assign(target, stmt);
                Some(Lowered::InPlace(self.ast.alloc_at(NodeKind::Expression { expression: assign }, span)))
            }
            _ => None,
        }
    }

    /// Rewrites a statement list whose parent is a block.
    fn block_body(&mut self, body: Vec<NodeId>) -> Vec<NodeId> {
        let mut hoisted = Vec::new();
        let mut rest = Vec::with_capacity(body.len());
        for stmt in body {
            match self.lower_declaration(stmt) {
                Some(Lowered::InPlace(replacement)) => rest.push(replacement),
                Some(Lowered::Hoisted(assignment)) => hoisted.push(assignment),
                Some(Lowered::Removed) => {}
                None => {
                    self.statement(stmt);
                    rest.push(stmt);
                }
            }
        }
        hoisted.extend(rest);
        hoisted
    }

    /// Rewrites a statement list that is not a block (switch case bodies), where
    /// function declarations stay in position.
    fn list_in_place(&mut self, body: Vec<NodeId>) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(body.len());
        for stmt in body {
            match self.lower_declaration(stmt) {
                Some(Lowered::InPlace(replacement)) | Some(Lowered::Hoisted(replacement)) => {
                    out.push(replacement)
                }
                Some(Lowered::Removed) => {}
                None => {
                    self.statement(stmt);
                    out.push(stmt);
                }
            }
        }
        out
    }

    /// A statement sitting in a single-statement slot (`if` branch, loop body).
    fn single(&mut self, stmt: NodeId) -> NodeId {
        match self.lower_declaration(stmt) {
            Some(Lowered::InPlace(replacement)) | Some(Lowered::Hoisted(replacement)) => replacement,
            Some(Lowered::Removed) => {
                let span = self.ast.span(stmt);
                self.ast.alloc_at(NodeKind::Empty, span)
            }
            None => {
                self.statement(stmt);
                stmt
            }
        }
    }

    fn statement(&mut self, stmt: NodeId) {
        match self.ast.kind(stmt).clone() {
            NodeKind::Block { body } => {
                let body = self.block_body(body);
                *self.ast.kind_mut(stmt) = NodeKind::Block { body };
            }
            NodeKind::If { test, consequent, alternate } => {
                let consequent = self.single(consequent);
                let alternate = alternate.map(|alt| self.single(alt));
                *self.ast.kind_mut(stmt) = NodeKind::If { test, consequent, alternate };
            }
            NodeKind::Labeled { label, body } => {
                let body = self.single(body);
                *self.ast.kind_mut(stmt) = NodeKind::Labeled { label, body };
            }
            NodeKind::With { object, body } => {
                let body = self.single(body);
                *self.ast.kind_mut(stmt) = NodeKind::With { object, body };
            }
            NodeKind::While { test, body } => {
                let body = self.single(body);
                *self.ast.kind_mut(stmt) = NodeKind::While { test, body };
            }
            NodeKind::DoWhile { body, test } => {
                let body = self.single(body);
                *self.ast.kind_mut(stmt) = NodeKind::DoWhile { body, test };
            }
            NodeKind::For { init, test, update, body } => {
                let init = match init {
                    Some(init) if matches!(self.ast.kind(init), NodeKind::VariableDeclaration { .. }) => {
                        self.declaration_to_expression(init)
                    }
                    other => other,
                };
                let body = self.single(body);
                *self.ast.kind_mut(stmt) = NodeKind::For { init, test, update, body };
            }
            NodeKind::ForIn { left, right, body } => {
                let left = self.loop_target(left);
                let body = self.single(body);
                *self.ast.kind_mut(stmt) = NodeKind::ForIn { left, right, body };
            }
            NodeKind::ForOf { left, right, body, is_await } => {
                let left = self.loop_target(left);
                let body = self.single(body);
                *self.ast.kind_mut(stmt) = NodeKind::ForOf { left, right, body, is_await };
            }
            NodeKind::Switch { cases, .. } => {
                for case in cases {
                    if let NodeKind::SwitchCase { test, consequent } = self.ast.kind(case).clone() {
                        let consequent = self.list_in_place(consequent);
                        *self.ast.kind_mut(case) = NodeKind::SwitchCase { test, consequent };
                    }
                }
            }
            NodeKind::Try { block, handler, finalizer } => {
                self.statement(block);
                if let Some(handler) = handler {
                    self.catch_clause(handler);
                }
                if let Some(finalizer) = finalizer {
                    self.statement(finalizer);
                }
            }
            _ => {}
        }
    }

    /// `for (var x in o)` keeps `x` as the assignment target.
    fn loop_target(&mut self, left: NodeId) -> NodeId {
        let NodeKind::VariableDeclaration { declarations, .. } = self.ast.kind(left).clone() else {
            return left;
        };
        let Some(first) = declarations.first() else {
            return left;
        };
        let NodeKind::VariableDeclarator { id, .. } = *self.ast.kind(*first) else {
            return left;
        };
        self.record_pattern(id);
        id
    }

    /// Destructured catch parameters are bound to a plain generated name and
    /// unpacked at the top of the handler body.
    fn catch_clause(&mut self, handler: NodeId) {
        let NodeKind::CatchClause { param, body } = self.ast.kind(handler).clone() else {
            return;
        };
        let param = match param {
            Some(pattern) if !matches!(self.ast.kind(pattern), NodeKind::Identifier { .. }) => {
                self.record_pattern(pattern);
                let generated = self.names.fresh("e");
                let source = self.ast.ident(generated.as_str());
                let unpack = self.ast.assign(pattern, source);
                let unpack = self.ast.expr_stmt(unpack);
                if let NodeKind::Block { body: stmts } = self.ast.kind_mut(body) {
                    stmts.insert(0, unpack);
                }
                Some(self.ast.ident(generated))
            }
            other => other,
        };
        *self.ast.kind_mut(handler) = NodeKind::CatchClause { param, body };
        self.statement(body);
    }
}
