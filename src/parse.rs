//! Front-end bridge
//!
//! Source text is parsed with oxc and lowered into the crate's arena. The
//! lowering keeps the shapes the pass cares about and erases the rest:
//! TypeScript wrappers disappear, type-only statements are dropped, and
//! constructs the pass never looks inside (imports, JSX, static blocks, enums)
//! are carried as verbatim source slices.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast as js;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use regex::Regex;

use crate::ast::{
    Ast, DeclKind, Function, FunctionFlavor, Literal, MethodKind, NodeId, NodeKind, PropertyKind,
};
use crate::options::SourceKind;
use crate::validate::TransformError;

type Result<T> = std::result::Result<T, TransformError>;

lazy_static! {
    /// Verbatim text that could hide a suspension point.
    static ref SUSPENDING_RE: Regex = Regex::new(r"\byield\b|\bawait\b|\basync\b|function\s*\*").unwrap();
}

#[derive(Debug)]
pub struct ParsedProgram {
    pub ast: Ast,
    pub program: NodeId,
}

fn source_type(kind: SourceKind) -> SourceType {
    match kind {
        SourceKind::Module => SourceType::default().with_module(true).with_jsx(true),
        SourceKind::Script => SourceType::default(),
        SourceKind::Typescript => SourceType::default().with_module(true).with_typescript(true),
    }
}

/// Parses `source` and lowers it into a fresh arena.
pub fn parse_program(source: &str, kind: SourceKind) -> Result<ParsedProgram> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type(kind)).parse();
    if let Some(error) = ret.errors.first() {
        let at = error
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| label.offset() as u32)
            .unwrap_or(0);
        return Err(TransformError::Parse { message: error.to_string(), at });
    }
    if ret.panicked {
        return Err(TransformError::Parse { message: "parser gave up".to_string(), at: 0 });
    }

    let mut lowering = Lowering { source, ast: Ast::new(), resumable: vec![false] };
    let program = lowering.program(&ret.program)?;
    Ok(ParsedProgram { ast: lowering.ast, program })
}

struct Lowering<'s> {
    source: &'s str,
    ast: Ast,
    /// One flag per function being lowered: is it a generator or async?
    resumable: Vec<bool>,
}

impl Lowering<'_> {
    fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.ast.alloc_at(kind, span)
    }

    fn ident_at(&mut self, name: &str, span: Span) -> NodeId {
        self.alloc(NodeKind::Identifier { name: name.to_string() }, span)
    }

    fn slice(&self, span: Span) -> &str {
        self.source.get(span.start as usize..span.end as usize).unwrap_or_default()
    }

    /// Carries a construct through as source text. Inside a resumable function
    /// the text must not hide a suspension, or the dispatch loop would miss it.
    fn raw(&mut self, span: Span, what: &str) -> Result<NodeId> {
        let text = self.slice(span).to_string();
        if self.resumable.last().copied().unwrap_or(false) && SUSPENDING_RE.is_match(&text) {
            return Err(TransformError::unsupported(what, span.start));
        }
        Ok(self.alloc(NodeKind::Raw { text }, span))
    }

    fn program(&mut self, program: &js::Program<'_>) -> Result<NodeId> {
        let directives = program.directives.iter().map(|d| d.directive.to_string()).collect();
        let body = self.statements(&program.body)?;
        Ok(self.alloc(NodeKind::Program { body, directives }, program.span))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATEMENTS
    // ═══════════════════════════════════════════════════════════════════════════

    fn statements(&mut self, stmts: &[js::Statement<'_>]) -> Result<Vec<NodeId>> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            if let Some(id) = self.statement(stmt)? {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// A statement in a single-statement slot; dropped statements become `;`.
    fn body_statement(&mut self, stmt: &js::Statement<'_>) -> Result<NodeId> {
        match self.statement(stmt)? {
            Some(id) => Ok(id),
            None => Ok(self.alloc(NodeKind::Empty, stmt.span())),
        }
    }

    fn block(&mut self, block: &js::BlockStatement<'_>) -> Result<NodeId> {
        let body = self.statements(&block.body)?;
        Ok(self.alloc(NodeKind::Block { body }, block.span))
    }

    /// Lowers one statement. `None` means the statement only existed for the
    /// type checker.
    fn statement(&mut self, stmt: &js::Statement<'_>) -> Result<Option<NodeId>> {
        let span = stmt.span();
        let id = match stmt {
            js::Statement::BlockStatement(block) => self.block(block)?,
            js::Statement::EmptyStatement(_) => self.alloc(NodeKind::Empty, span),
            js::Statement::DebuggerStatement(_) => self.alloc(NodeKind::Debugger, span),
            js::Statement::ExpressionStatement(stmt) => {
                let expression = self.expression(&stmt.expression)?;
                self.alloc(NodeKind::Expression { expression }, span)
            }
            js::Statement::IfStatement(stmt) => {
                let test = self.expression(&stmt.test)?;
                let consequent = self.body_statement(&stmt.consequent)?;
                let alternate = match &stmt.alternate {
                    Some(alt) => Some(self.body_statement(alt)?),
                    None => None,
                };
                self.alloc(NodeKind::If { test, consequent, alternate }, span)
            }
            js::Statement::LabeledStatement(stmt) => {
                let body = self.body_statement(&stmt.body)?;
                self.alloc(NodeKind::Labeled { label: stmt.label.name.to_string(), body }, span)
            }
            js::Statement::BreakStatement(stmt) => {
                let label = stmt.label.as_ref().map(|l| l.name.to_string());
                self.alloc(NodeKind::Break { label }, span)
            }
            js::Statement::ContinueStatement(stmt) => {
                let label = stmt.label.as_ref().map(|l| l.name.to_string());
                self.alloc(NodeKind::Continue { label }, span)
            }
            js::Statement::WithStatement(stmt) => {
                let object = self.expression(&stmt.object)?;
                let body = self.body_statement(&stmt.body)?;
                self.alloc(NodeKind::With { object, body }, span)
            }
            js::Statement::SwitchStatement(stmt) => {
                let discriminant = self.expression(&stmt.discriminant)?;
                let mut cases = Vec::with_capacity(stmt.cases.len());
                for case in &stmt.cases {
                    let test = match &case.test {
                        Some(test) => Some(self.expression(test)?),
                        None => None,
                    };
                    let consequent = self.statements(&case.consequent)?;
                    cases.push(self.alloc(NodeKind::SwitchCase { test, consequent }, case.span));
                }
                self.alloc(NodeKind::Switch { discriminant, cases }, span)
            }
            js::Statement::ReturnStatement(stmt) => {
                let argument = match &stmt.argument {
                    Some(arg) => Some(self.expression(arg)?),
                    None => None,
                };
                self.alloc(NodeKind::Return { argument }, span)
            }
            js::Statement::ThrowStatement(stmt) => {
                let argument = self.expression(&stmt.argument)?;
                self.alloc(NodeKind::Throw { argument }, span)
            }
            js::Statement::TryStatement(stmt) => {
                let block = self.block(&stmt.block)?;
                let handler = match &stmt.handler {
                    Some(clause) => {
                        let param = match &clause.param {
                            Some(param) => Some(self.binding(&param.pattern)?),
                            None => None,
                        };
                        let body = self.block(&clause.body)?;
                        Some(self.alloc(NodeKind::CatchClause { param, body }, clause.span))
                    }
                    None => None,
                };
                let finalizer = match &stmt.finalizer {
                    Some(block) => Some(self.block(block)?),
                    None => None,
                };
                self.alloc(NodeKind::Try { block, handler, finalizer }, span)
            }
            js::Statement::WhileStatement(stmt) => {
                let test = self.expression(&stmt.test)?;
                let body = self.body_statement(&stmt.body)?;
                self.alloc(NodeKind::While { test, body }, span)
            }
            js::Statement::DoWhileStatement(stmt) => {
                let body = self.body_statement(&stmt.body)?;
                let test = self.expression(&stmt.test)?;
                self.alloc(NodeKind::DoWhile { body, test }, span)
            }
            js::Statement::ForStatement(stmt) => {
                let init = match &stmt.init {
                    Some(js::ForStatementInit::VariableDeclaration(decl)) => {
                        Some(self.variable_declaration(decl)?)
                    }
                    Some(init) => match init.as_expression() {
                        Some(expr) => Some(self.expression(expr)?),
                        None => return Err(TransformError::unsupported("`for` initializer", span.start)),
                    },
                    None => None,
                };
                let test = match &stmt.test {
                    Some(test) => Some(self.expression(test)?),
                    None => None,
                };
                let update = match &stmt.update {
                    Some(update) => Some(self.expression(update)?),
                    None => None,
                };
                let body = self.body_statement(&stmt.body)?;
                self.alloc(NodeKind::For { init, test, update, body }, span)
            }
            js::Statement::ForInStatement(stmt) => {
                let left = self.for_left(&stmt.left)?;
                let right = self.expression(&stmt.right)?;
                let body = self.body_statement(&stmt.body)?;
                self.alloc(NodeKind::ForIn { left, right, body }, span)
            }
            js::Statement::ForOfStatement(stmt) => {
                let left = self.for_left(&stmt.left)?;
                let right = self.expression(&stmt.right)?;
                let body = self.body_statement(&stmt.body)?;
                self.alloc(NodeKind::ForOf { left, right, body, is_await: stmt.r#await }, span)
            }
            js::Statement::VariableDeclaration(decl) => {
                if decl.declare {
                    return Ok(None);
                }
                self.variable_declaration(decl)?
            }
            js::Statement::FunctionDeclaration(func) => {
                // Overload signatures and `declare function` have no body.
                if func.body.is_none() {
                    return Ok(None);
                }
                self.function(func, FunctionFlavor::Declaration)?
            }
            js::Statement::ClassDeclaration(class) => {
                if class.declare {
                    return Ok(None);
                }
                self.class(class, true)?
            }
            js::Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(declaration) => match self.declaration(declaration)? {
                    Some(declaration) => self.alloc(NodeKind::ExportNamed { declaration }, span),
                    None => return Ok(None),
                },
                None if export.export_kind.is_type() => return Ok(None),
                None => self.raw(span, "export list")?,
            },
            js::Statement::ExportDefaultDeclaration(export) => {
                let declaration = match &export.declaration {
                    js::ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                        self.function(func, FunctionFlavor::Declaration)?
                    }
                    js::ExportDefaultDeclarationKind::ClassDeclaration(class) => self.class(class, true)?,
                    js::ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => return Ok(None),
                    other => match other.as_expression() {
                        Some(expr) => self.expression(expr)?,
                        None => return Err(TransformError::unsupported("default export", span.start)),
                    },
                };
                self.alloc(NodeKind::ExportDefault { declaration }, span)
            }
            js::Statement::ImportDeclaration(import) => {
                if import.import_kind.is_type() {
                    return Ok(None);
                }
                self.raw(span, "import declaration")?
            }
            js::Statement::TSTypeAliasDeclaration(_) | js::Statement::TSInterfaceDeclaration(_) => {
                return Ok(None)
            }
            js::Statement::TSModuleDeclaration(module) if module.declare => return Ok(None),
            _ => self.raw(span, "statement")?,
        };
        Ok(Some(id))
    }

    fn declaration(&mut self, declaration: &js::Declaration<'_>) -> Result<Option<NodeId>> {
        let span = declaration.span();
        match declaration {
            js::Declaration::VariableDeclaration(decl) if decl.declare => Ok(None),
            js::Declaration::VariableDeclaration(decl) => Ok(Some(self.variable_declaration(decl)?)),
            js::Declaration::FunctionDeclaration(func) if func.body.is_none() => Ok(None),
            js::Declaration::FunctionDeclaration(func) => {
                Ok(Some(self.function(func, FunctionFlavor::Declaration)?))
            }
            js::Declaration::ClassDeclaration(class) if class.declare => Ok(None),
            js::Declaration::ClassDeclaration(class) => Ok(Some(self.class(class, true)?)),
            js::Declaration::TSTypeAliasDeclaration(_) | js::Declaration::TSInterfaceDeclaration(_) => Ok(None),
            _ => Ok(Some(self.raw(span, "declaration")?)),
        }
    }

    fn variable_declaration(&mut self, decl: &js::VariableDeclaration<'_>) -> Result<NodeId> {
        let kind = match decl.kind {
            js::VariableDeclarationKind::Var => DeclKind::Var,
            js::VariableDeclarationKind::Let => DeclKind::Let,
            js::VariableDeclarationKind::Const => DeclKind::Const,
            _ => return Err(TransformError::unsupported("`using` declaration", decl.span.start)),
        };
        let mut declarations = Vec::with_capacity(decl.declarations.len());
        for declarator in &decl.declarations {
            let id = self.binding(&declarator.id)?;
            let init = match &declarator.init {
                Some(init) => Some(self.expression(init)?),
                None => None,
            };
            declarations.push(self.alloc(NodeKind::VariableDeclarator { id, init }, declarator.span));
        }
        Ok(self.alloc(NodeKind::VariableDeclaration { kind, declarations }, decl.span))
    }

    fn for_left(&mut self, left: &js::ForStatementLeft<'_>) -> Result<NodeId> {
        match left {
            js::ForStatementLeft::VariableDeclaration(decl) => self.variable_declaration(decl),
            other => match other.as_assignment_target() {
                Some(target) => self.assignment_target(target),
                None => Err(TransformError::unsupported("loop target", other.span().start)),
            },
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FUNCTIONS AND CLASSES
    // ═══════════════════════════════════════════════════════════════════════════

    fn params(&mut self, params: &js::FormalParameters<'_>) -> Result<Vec<NodeId>> {
        let mut out = Vec::with_capacity(params.items.len() + 1);
        for param in &params.items {
            out.push(self.binding(&param.pattern)?);
        }
        if let Some(rest) = &params.rest {
            let argument = self.binding(&rest.rest.argument)?;
            out.push(self.alloc(NodeKind::RestElement { argument }, rest.span));
        }
        Ok(out)
    }

    fn function_body(&mut self, body: &js::FunctionBody<'_>) -> Result<(NodeId, Vec<String>)> {
        let directives = body.directives.iter().map(|d| d.directive.to_string()).collect();
        let stmts = self.statements(&body.statements)?;
        Ok((self.alloc(NodeKind::Block { body: stmts }, body.span), directives))
    }

    fn function(&mut self, func: &js::Function<'_>, flavor: FunctionFlavor) -> Result<NodeId> {
        self.resumable.push(func.generator || func.r#async);
        let lowered = self.function_parts(func);
        self.resumable.pop();
        let (params, body, directives) = lowered?;
        let function = Function {
            id: func.id.as_ref().map(|id| id.name.to_string()),
            params,
            body,
            flavor,
            generator: func.generator,
            is_async: func.r#async,
            directives,
        };
        Ok(self.alloc(NodeKind::Function(function), func.span))
    }

    fn function_parts(&mut self, func: &js::Function<'_>) -> Result<(Vec<NodeId>, NodeId, Vec<String>)> {
        let params = self.params(&func.params)?;
        let (body, directives) = match &func.body {
            Some(body) => self.function_body(body)?,
            None => (self.alloc(NodeKind::Block { body: vec![] }, func.span), vec![]),
        };
        Ok((params, body, directives))
    }

    fn arrow(&mut self, arrow: &js::ArrowFunctionExpression<'_>) -> Result<NodeId> {
        self.resumable.push(arrow.r#async);
        let lowered = self.arrow_parts(arrow);
        self.resumable.pop();
        let (params, body, directives) = lowered?;
        let function = Function {
            id: None,
            params,
            body,
            flavor: FunctionFlavor::Arrow,
            generator: false,
            is_async: arrow.r#async,
            directives,
        };
        Ok(self.alloc(NodeKind::Function(function), arrow.span))
    }

    fn arrow_parts(
        &mut self,
        arrow: &js::ArrowFunctionExpression<'_>,
    ) -> Result<(Vec<NodeId>, NodeId, Vec<String>)> {
        let params = self.params(&arrow.params)?;
        if arrow.expression {
            // `x => e` is stored as `x => { return e; }`.
            let expr = match arrow.body.statements.first() {
                Some(js::Statement::ExpressionStatement(stmt)) => self.expression(&stmt.expression)?,
                _ => return Err(TransformError::unsupported("arrow body", arrow.span.start)),
            };
            let span = self.ast.span(expr);
            let ret = self.alloc(NodeKind::Return { argument: Some(expr) }, span);
            let body = self.alloc(NodeKind::Block { body: vec![ret] }, arrow.body.span);
            return Ok((params, body, vec![]));
        }
        let (body, directives) = self.function_body(&arrow.body)?;
        Ok((params, body, directives))
    }

    fn class(&mut self, class: &js::Class<'_>, is_declaration: bool) -> Result<NodeId> {
        let super_class = match &class.super_class {
            Some(expr) => Some(self.expression(expr)?),
            None => None,
        };
        let mut body = Vec::with_capacity(class.body.body.len());
        for element in &class.body.body {
            match element {
                js::ClassElement::MethodDefinition(method) => {
                    // Abstract members and overloads have no runtime presence.
                    if method.value.body.is_none() {
                        continue;
                    }
                    let key = self.property_key(&method.key)?;
                    let value = self.function(&method.value, FunctionFlavor::Expression)?;
                    let kind = match method.kind {
                        js::MethodDefinitionKind::Constructor => MethodKind::Constructor,
                        js::MethodDefinitionKind::Method => MethodKind::Method,
                        js::MethodDefinitionKind::Get => MethodKind::Get,
                        js::MethodDefinitionKind::Set => MethodKind::Set,
                    };
                    body.push(self.alloc(
                        NodeKind::Method {
                            key,
                            value,
                            kind,
                            computed: method.computed,
                            is_static: method.r#static,
                        },
                        method.span,
                    ));
                }
                js::ClassElement::PropertyDefinition(property) => {
                    if property.declare {
                        continue;
                    }
                    let key = self.property_key(&property.key)?;
                    let value = match &property.value {
                        Some(value) => Some(self.expression(value)?),
                        None => None,
                    };
                    body.push(self.alloc(
                        NodeKind::PropertyDefinition {
                            key,
                            value,
                            computed: property.computed,
                            is_static: property.r#static,
                        },
                        property.span,
                    ));
                }
                js::ClassElement::TSIndexSignature(_) => {}
                other => body.push(self.raw(other.span(), "class element")?),
            }
        }
        let id = class.id.as_ref().map(|id| id.name.to_string());
        Ok(self.alloc(NodeKind::Class { id, super_class, body, is_declaration }, class.span))
    }

    fn property_key(&mut self, key: &js::PropertyKey<'_>) -> Result<NodeId> {
        match key {
            js::PropertyKey::StaticIdentifier(id) => Ok(self.ident_at(&id.name, id.span)),
            js::PropertyKey::PrivateIdentifier(id) => Ok(self.ident_at(&format!("#{}", id.name), id.span)),
            other => match other.as_expression() {
                Some(expr) => self.expression(expr),
                None => Err(TransformError::unsupported("property key", other.span().start)),
            },
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PATTERNS
    // ═══════════════════════════════════════════════════════════════════════════

    fn binding(&mut self, pattern: &js::BindingPattern<'_>) -> Result<NodeId> {
        match pattern {
            js::BindingPattern::BindingIdentifier(id) => Ok(self.ident_at(&id.name, id.span)),
            js::BindingPattern::ObjectPattern(object) => {
                let mut properties = Vec::with_capacity(object.properties.len() + 1);
                for property in &object.properties {
                    let key = self.property_key(&property.key)?;
                    let value = self.binding(&property.value)?;
                    properties.push(self.alloc(
                        NodeKind::Property {
                            key,
                            value,
                            kind: PropertyKind::Init,
                            computed: property.computed,
                            shorthand: property.shorthand,
                            method: false,
                        },
                        property.span,
                    ));
                }
                if let Some(rest) = &object.rest {
                    let argument = self.binding(&rest.argument)?;
                    properties.push(self.alloc(NodeKind::RestElement { argument }, rest.span));
                }
                Ok(self.alloc(NodeKind::ObjectPattern { properties }, object.span))
            }
            js::BindingPattern::ArrayPattern(array) => {
                let mut elements = Vec::with_capacity(array.elements.len() + 1);
                for element in &array.elements {
                    elements.push(match element {
                        Some(element) => Some(self.binding(element)?),
                        None => None,
                    });
                }
                if let Some(rest) = &array.rest {
                    let argument = self.binding(&rest.argument)?;
                    elements.push(Some(self.alloc(NodeKind::RestElement { argument }, rest.span)));
                }
                Ok(self.alloc(NodeKind::ArrayPattern { elements }, array.span))
            }
            js::BindingPattern::AssignmentPattern(assign) => {
                let left = self.binding(&assign.left)?;
                let right = self.expression(&assign.right)?;
                Ok(self.alloc(NodeKind::AssignmentPattern { left, right }, assign.span))
            }
        }
    }

    fn assignment_target(&mut self, target: &js::AssignmentTarget<'_>) -> Result<NodeId> {
        match target {
            js::AssignmentTarget::AssignmentTargetIdentifier(id) => Ok(self.ident_at(&id.name, id.span)),
            js::AssignmentTarget::StaticMemberExpression(member) => self.static_member(member),
            js::AssignmentTarget::ComputedMemberExpression(member) => self.computed_member(member),
            js::AssignmentTarget::PrivateFieldExpression(member) => self.private_field(member),
            js::AssignmentTarget::ArrayAssignmentTarget(array) => self.array_target(array),
            js::AssignmentTarget::ObjectAssignmentTarget(object) => self.object_target(object),
            js::AssignmentTarget::TSAsExpression(e) => self.target_expression(&e.expression),
            js::AssignmentTarget::TSSatisfiesExpression(e) => self.target_expression(&e.expression),
            js::AssignmentTarget::TSNonNullExpression(e) => self.target_expression(&e.expression),
            js::AssignmentTarget::TSTypeAssertion(e) => self.target_expression(&e.expression),
            #[allow(unreachable_patterns)]
            other => Err(TransformError::unsupported("assignment target", other.span().start)),
        }
    }

    fn simple_target(&mut self, target: &js::SimpleAssignmentTarget<'_>) -> Result<NodeId> {
        match target {
            js::SimpleAssignmentTarget::AssignmentTargetIdentifier(id) => Ok(self.ident_at(&id.name, id.span)),
            js::SimpleAssignmentTarget::StaticMemberExpression(member) => self.static_member(member),
            js::SimpleAssignmentTarget::ComputedMemberExpression(member) => self.computed_member(member),
            js::SimpleAssignmentTarget::PrivateFieldExpression(member) => self.private_field(member),
            js::SimpleAssignmentTarget::TSAsExpression(e) => self.target_expression(&e.expression),
            js::SimpleAssignmentTarget::TSSatisfiesExpression(e) => self.target_expression(&e.expression),
            js::SimpleAssignmentTarget::TSNonNullExpression(e) => self.target_expression(&e.expression),
            js::SimpleAssignmentTarget::TSTypeAssertion(e) => self.target_expression(&e.expression),
            #[allow(unreachable_patterns)]
            other => Err(TransformError::unsupported("update target", other.span().start)),
        }
    }

    /// A TypeScript-wrapped target; only identifiers and member reads are valid
    /// beneath the wrapper.
    fn target_expression(&mut self, expr: &js::Expression<'_>) -> Result<NodeId> {
        let lowered = self.expression(expr)?;
        match self.ast.kind(lowered) {
            NodeKind::Identifier { .. } | NodeKind::Member { .. } => Ok(lowered),
            _ => Err(TransformError::unsupported("assignment target", expr.span().start)),
        }
    }

    fn maybe_default_target(&mut self, target: &js::AssignmentTargetMaybeDefault<'_>) -> Result<NodeId> {
        match target {
            js::AssignmentTargetMaybeDefault::AssignmentTargetWithDefault(with_default) => {
                let left = self.assignment_target(&with_default.binding)?;
                let right = self.expression(&with_default.init)?;
                Ok(self.alloc(NodeKind::AssignmentPattern { left, right }, with_default.span))
            }
            other => match other.as_assignment_target() {
                Some(target) => self.assignment_target(target),
                None => Err(TransformError::unsupported("assignment target", other.span().start)),
            },
        }
    }

    fn array_target(&mut self, array: &js::ArrayAssignmentTarget<'_>) -> Result<NodeId> {
        let mut elements = Vec::with_capacity(array.elements.len() + 1);
        for element in &array.elements {
            elements.push(match element {
                Some(element) => Some(self.maybe_default_target(element)?),
                None => None,
            });
        }
        if let Some(rest) = &array.rest {
            let argument = self.assignment_target(&rest.target)?;
            elements.push(Some(self.alloc(NodeKind::RestElement { argument }, rest.span)));
        }
        Ok(self.alloc(NodeKind::ArrayPattern { elements }, array.span))
    }

    fn object_target(&mut self, object: &js::ObjectAssignmentTarget<'_>) -> Result<NodeId> {
        let mut properties = Vec::with_capacity(object.properties.len() + 1);
        for property in &object.properties {
            let lowered = match property {
                js::AssignmentTargetProperty::AssignmentTargetPropertyIdentifier(prop) => {
                    let key = self.ident_at(&prop.binding.name, prop.binding.span);
                    let name = self.ident_at(&prop.binding.name, prop.binding.span);
                    let value = match &prop.init {
                        Some(init) => {
                            let right = self.expression(init)?;
                            self.alloc(NodeKind::AssignmentPattern { left: name, right }, prop.span)
                        }
                        None => name,
                    };
                    NodeKind::Property {
                        key,
                        value,
                        kind: PropertyKind::Init,
                        computed: false,
                        shorthand: true,
                        method: false,
                    }
                }
                js::AssignmentTargetProperty::AssignmentTargetPropertyProperty(prop) => {
                    let key = self.property_key(&prop.name)?;
                    let value = self.maybe_default_target(&prop.binding)?;
                    NodeKind::Property {
                        key,
                        value,
                        kind: PropertyKind::Init,
                        computed: prop.computed,
                        shorthand: false,
                        method: false,
                    }
                }
            };
            properties.push(self.alloc(lowered, property.span()));
        }
        if let Some(rest) = &object.rest {
            let argument = self.assignment_target(&rest.target)?;
            properties.push(self.alloc(NodeKind::RestElement { argument }, rest.span));
        }
        Ok(self.alloc(NodeKind::ObjectPattern { properties }, object.span))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPRESSIONS
    // ═══════════════════════════════════════════════════════════════════════════

    fn static_member(&mut self, member: &js::StaticMemberExpression<'_>) -> Result<NodeId> {
        let object = self.expression(&member.object)?;
        let property = self.ident_at(&member.property.name, member.property.span);
        Ok(self.alloc(
            NodeKind::Member { object, property, computed: false, optional: member.optional },
            member.span,
        ))
    }

    fn computed_member(&mut self, member: &js::ComputedMemberExpression<'_>) -> Result<NodeId> {
        let object = self.expression(&member.object)?;
        let property = self.expression(&member.expression)?;
        Ok(self.alloc(
            NodeKind::Member { object, property, computed: true, optional: member.optional },
            member.span,
        ))
    }

    fn private_field(&mut self, member: &js::PrivateFieldExpression<'_>) -> Result<NodeId> {
        let object = self.expression(&member.object)?;
        let property = self.ident_at(&format!("#{}", member.field.name), member.field.span);
        Ok(self.alloc(
            NodeKind::Member { object, property, computed: false, optional: member.optional },
            member.span,
        ))
    }

    fn call(&mut self, call: &js::CallExpression<'_>) -> Result<NodeId> {
        let callee = self.expression(&call.callee)?;
        let arguments = self.arguments(&call.arguments)?;
        Ok(self.alloc(NodeKind::Call { callee, arguments, optional: call.optional }, call.span))
    }

    fn arguments(&mut self, arguments: &[js::Argument<'_>]) -> Result<Vec<NodeId>> {
        let mut out = Vec::with_capacity(arguments.len());
        for argument in arguments {
            out.push(match argument {
                js::Argument::SpreadElement(spread) => {
                    let argument = self.expression(&spread.argument)?;
                    self.alloc(NodeKind::Spread { argument }, spread.span)
                }
                other => match other.as_expression() {
                    Some(expr) => self.expression(expr)?,
                    None => return Err(TransformError::unsupported("call argument", other.span().start)),
                },
            });
        }
        Ok(out)
    }

    fn template(&mut self, template: &js::TemplateLiteral<'_>) -> Result<NodeId> {
        let quasis = template.quasis.iter().map(|q| q.value.raw.to_string()).collect();
        let mut expressions = Vec::with_capacity(template.expressions.len());
        for expr in &template.expressions {
            expressions.push(self.expression(expr)?);
        }
        Ok(self.alloc(NodeKind::Template { quasis, expressions }, template.span))
    }

    fn object(&mut self, object: &js::ObjectExpression<'_>) -> Result<NodeId> {
        let mut properties = Vec::with_capacity(object.properties.len());
        for property in &object.properties {
            properties.push(match property {
                js::ObjectPropertyKind::ObjectProperty(prop) => {
                    let key = self.property_key(&prop.key)?;
                    let value = self.expression(&prop.value)?;
                    let kind = match prop.kind {
                        js::PropertyKind::Init => PropertyKind::Init,
                        js::PropertyKind::Get => PropertyKind::Get,
                        js::PropertyKind::Set => PropertyKind::Set,
                    };
                    self.alloc(
                        NodeKind::Property {
                            key,
                            value,
                            kind,
                            computed: prop.computed,
                            shorthand: prop.shorthand,
                            method: prop.method,
                        },
                        prop.span,
                    )
                }
                js::ObjectPropertyKind::SpreadProperty(spread) => {
                    let argument = self.expression(&spread.argument)?;
                    self.alloc(NodeKind::Spread { argument }, spread.span)
                }
            });
        }
        Ok(self.alloc(NodeKind::Object { properties }, object.span))
    }

    fn expression(&mut self, expr: &js::Expression<'_>) -> Result<NodeId> {
        let span = expr.span();
        let kind = match expr {
            // Wrappers that only exist for the type checker or the printer.
            js::Expression::ParenthesizedExpression(e) => return self.expression(&e.expression),
            js::Expression::TSAsExpression(e) => return self.expression(&e.expression),
            js::Expression::TSSatisfiesExpression(e) => return self.expression(&e.expression),
            js::Expression::TSNonNullExpression(e) => return self.expression(&e.expression),
            js::Expression::TSTypeAssertion(e) => return self.expression(&e.expression),
            js::Expression::TSInstantiationExpression(e) => return self.expression(&e.expression),

            js::Expression::BooleanLiteral(lit) => NodeKind::Literal(Literal::Boolean(lit.value)),
            js::Expression::NullLiteral(_) => NodeKind::Literal(Literal::Null),
            js::Expression::NumericLiteral(lit) => NodeKind::Literal(Literal::Number(lit.value)),
            js::Expression::StringLiteral(lit) => NodeKind::Literal(Literal::String(lit.value.to_string())),
            js::Expression::BigIntLiteral(_) => {
                NodeKind::Literal(Literal::BigInt(self.slice(span).trim_end_matches('n').to_string()))
            }
            js::Expression::RegExpLiteral(_) => {
                let text = self.slice(span);
                let close = text.rfind('/').unwrap_or(text.len());
                let pattern = text.get(1..close).unwrap_or_default().to_string();
                let flags = text.get(close + 1..).unwrap_or_default().to_string();
                NodeKind::Literal(Literal::RegExp { pattern, flags })
            }
            js::Expression::TemplateLiteral(template) => return self.template(template),
            js::Expression::Identifier(id) => NodeKind::Identifier { name: id.name.to_string() },
            js::Expression::ThisExpression(_) => NodeKind::This,
            js::Expression::Super(_) => NodeKind::Super,
            js::Expression::MetaProperty(meta) => NodeKind::MetaProperty {
                meta: meta.meta.name.to_string(),
                property: meta.property.name.to_string(),
            },

            js::Expression::ArrayExpression(array) => {
                let mut elements = Vec::with_capacity(array.elements.len());
                for element in &array.elements {
                    elements.push(match element {
                        js::ArrayExpressionElement::Elision(_) => None,
                        js::ArrayExpressionElement::SpreadElement(spread) => {
                            let argument = self.expression(&spread.argument)?;
                            Some(self.alloc(NodeKind::Spread { argument }, spread.span))
                        }
                        other => match other.as_expression() {
                            Some(expr) => Some(self.expression(expr)?),
                            None => return Err(TransformError::unsupported("array element", span.start)),
                        },
                    });
                }
                NodeKind::Array { elements }
            }
            js::Expression::ObjectExpression(object) => return self.object(object),
            js::Expression::FunctionExpression(func) => return self.function(func, FunctionFlavor::Expression),
            js::Expression::ArrowFunctionExpression(arrow) => return self.arrow(arrow),
            js::Expression::ClassExpression(class) => return self.class(class, false),

            js::Expression::UnaryExpression(unary) => {
                let argument = self.expression(&unary.argument)?;
                NodeKind::Unary { operator: unary.operator, argument }
            }
            js::Expression::UpdateExpression(update) => {
                let argument = self.simple_target(&update.argument)?;
                NodeKind::Update { operator: update.operator, prefix: update.prefix, argument }
            }
            js::Expression::BinaryExpression(binary) => {
                let left = self.expression(&binary.left)?;
                let right = self.expression(&binary.right)?;
                NodeKind::Binary { operator: binary.operator, left, right }
            }
            js::Expression::PrivateInExpression(private_in) => {
                let left = self.ident_at(&format!("#{}", private_in.left.name), private_in.left.span);
                let right = self.expression(&private_in.right)?;
                NodeKind::Binary { operator: oxc_syntax::operator::BinaryOperator::In, left, right }
            }
            js::Expression::LogicalExpression(logical) => {
                let left = self.expression(&logical.left)?;
                let right = self.expression(&logical.right)?;
                NodeKind::Logical { operator: logical.operator, left, right }
            }
            js::Expression::AssignmentExpression(assign) => {
                let left = self.assignment_target(&assign.left)?;
                let right = self.expression(&assign.right)?;
                NodeKind::Assignment { operator: assign.operator, left, right }
            }
            js::Expression::ConditionalExpression(cond) => {
                let test = self.expression(&cond.test)?;
                let consequent = self.expression(&cond.consequent)?;
                let alternate = self.expression(&cond.alternate)?;
                NodeKind::Conditional { test, consequent, alternate }
            }
            js::Expression::SequenceExpression(seq) => {
                let mut expressions = Vec::with_capacity(seq.expressions.len());
                for expr in &seq.expressions {
                    expressions.push(self.expression(expr)?);
                }
                NodeKind::Sequence { expressions }
            }

            js::Expression::CallExpression(call) => return self.call(call),
            js::Expression::NewExpression(new) => {
                let callee = self.expression(&new.callee)?;
                let arguments = self.arguments(&new.arguments)?;
                NodeKind::New { callee, arguments }
            }
            js::Expression::StaticMemberExpression(member) => return self.static_member(member),
            js::Expression::ComputedMemberExpression(member) => return self.computed_member(member),
            js::Expression::PrivateFieldExpression(member) => return self.private_field(member),
            js::Expression::ChainExpression(chain) => return self.chain_element(&chain.expression),
            js::Expression::TaggedTemplateExpression(tagged) => {
                let tag = self.expression(&tagged.tag)?;
                let quasi = self.template(&tagged.quasi)?;
                NodeKind::TaggedTemplate { tag, quasi }
            }

            js::Expression::YieldExpression(y) => {
                let argument = match &y.argument {
                    Some(arg) => Some(self.expression(arg)?),
                    None => None,
                };
                NodeKind::Yield { argument, delegate: y.delegate }
            }
            js::Expression::AwaitExpression(a) => {
                let argument = self.expression(&a.argument)?;
                NodeKind::Await { argument }
            }

            _ => return self.raw(span, "expression"),
        };
        Ok(self.alloc(kind, span))
    }

    /// Optional chains keep their `?.` flags on the member and call nodes.
    fn chain_element(&mut self, element: &js::ChainElement<'_>) -> Result<NodeId> {
        match element {
            js::ChainElement::CallExpression(call) => self.call(call),
            js::ChainElement::StaticMemberExpression(member) => self.static_member(member),
            js::ChainElement::ComputedMemberExpression(member) => self.computed_member(member),
            js::ChainElement::PrivateFieldExpression(member) => self.private_field(member),
            js::ChainElement::TSNonNullExpression(e) => self.expression(&e.expression),
            #[allow(unreachable_patterns)]
            other => Err(TransformError::unsupported("optional chain", other.span().start)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParsedProgram {
        parse_program(source, SourceKind::Module).unwrap()
    }

    fn body(parsed: &ParsedProgram) -> Vec<NodeId> {
        match parsed.ast.kind(parsed.program) {
            NodeKind::Program { body, .. } => body.clone(),
            _ => vec![],
        }
    }

    #[test]
    fn test_parse_error_has_code() {
        let err = parse_program("let = ;", SourceKind::Module).unwrap_err();
        assert_eq!(err.code(), crate::validate::INV_PARSE);
    }

    #[test]
    fn test_typescript_wrappers_are_erased() {
        let parsed = parse_program(
            "type T = number; interface I {} let x = (y as T)!;",
            SourceKind::Typescript,
        )
        .unwrap();
        let stmts = body(&parsed);
        assert_eq!(stmts.len(), 1);
        let NodeKind::VariableDeclaration { declarations, .. } = parsed.ast.kind(stmts[0]) else {
            panic!("expected a declaration");
        };
        let NodeKind::VariableDeclarator { init: Some(init), .. } = parsed.ast.kind(declarations[0]) else {
            panic!("expected an initializer");
        };
        assert_eq!(parsed.ast.identifier_name(*init), Some("y"));
    }

    #[test]
    fn test_arrow_expression_body_becomes_return() {
        let parsed = parse("const f = (a) => a + 1;");
        let stmts = body(&parsed);
        let NodeKind::VariableDeclaration { declarations, .. } = parsed.ast.kind(stmts[0]) else {
            panic!("expected a declaration");
        };
        let NodeKind::VariableDeclarator { init: Some(init), .. } = parsed.ast.kind(declarations[0]) else {
            panic!("expected an initializer");
        };
        let func = parsed.ast.function(*init).unwrap();
        assert_eq!(func.flavor, FunctionFlavor::Arrow);
        let NodeKind::Block { body } = parsed.ast.kind(func.body) else {
            panic!("expected a block body");
        };
        assert!(matches!(parsed.ast.kind(body[0]), NodeKind::Return { argument: Some(_) }));
    }

    #[test]
    fn test_imports_are_carried_verbatim() {
        let parsed = parse("import { a } from \"./a.js\";\nfunction* g() {}");
        let stmts = body(&parsed);
        assert!(matches!(
            parsed.ast.kind(stmts[0]),
            NodeKind::Raw { text } if text == "import { a } from \"./a.js\";"
        ));
        assert!(parsed.ast.function(stmts[1]).is_some_and(|f| f.generator));
    }

    #[test]
    fn test_verbatim_text_hiding_a_suspension_is_rejected() {
        let err = parse_program("function* g() { <div>{yield 1}</div>; }", SourceKind::Module);
        assert!(err.is_err());
    }

    #[test]
    fn test_regexp_and_bigint_literals() {
        let parsed = parse("/ab+c/gi; 10n;");
        let stmts = body(&parsed);
        let NodeKind::Expression { expression } = parsed.ast.kind(stmts[0]) else {
            panic!("expected an expression statement");
        };
        assert!(matches!(
            parsed.ast.kind(*expression),
            NodeKind::Literal(Literal::RegExp { pattern, flags }) if pattern == "ab+c" && flags == "gi"
        ));
        let NodeKind::Expression { expression } = parsed.ast.kind(stmts[1]) else {
            panic!("expected an expression statement");
        };
        assert!(matches!(
            parsed.ast.kind(*expression),
            NodeKind::Literal(Literal::BigInt(digits)) if digits == "10"
        ));
    }
}
