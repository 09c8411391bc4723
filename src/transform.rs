//! Driver
//!
//! Finds every generator and async function in a program and rewrites each one
//! into a plain function that hands a dispatch loop to the runtime:
//!
//! ```text
//! function* g(a) { ... }
//! // becomes
//! function g(a) {
//!   var x, y;
//!   return resyncRuntime.mark(function _rs_callee_g(context) {
//!     while (true) { switch (context.prev = context.next) { ... } }
//!   }, null).call(this);
//! }
//! ```
//!
//! Functions are processed innermost first, so by the time an outer function
//! is exploded its nested resumable functions are already plain functions.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(feature = "napi")]
use napi_derive::napi;

use crate::ast::{Ast, Function, FunctionFlavor, NodeId, NodeKind};
use crate::codegen::print;
use crate::emit::emit_body;
use crate::hoist::hoist;
use crate::meta::Meta;
use crate::options::CompileOptions;
use crate::parse::parse_program;
use crate::scope::{ScopeMap, UniqueNames};
use crate::validate::{CompilerError, TransformError};
use crate::visitor::{walk, Flow, VisitContext, Visitor};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct CompileOutput {
    pub code: String,
    /// Names of the rewritten functions in processing order (innermost first).
    pub transformed_functions: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFORM CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// State owned by one compile. Nothing in here is shared between runs, so
/// independent sources can be compiled on separate threads.
pub struct TransformContext<'o> {
    pub options: &'o CompileOptions,
    pub meta: Meta,
    pub scopes: ScopeMap,
    pub names: UniqueNames,
    pub transformed: Vec<String>,
}

impl<'o> TransformContext<'o> {
    /// Prepares a context for `program`, reserving every name it already uses.
    pub fn new(options: &'o CompileOptions, ast: &mut Ast, program: NodeId) -> Self {
        let mut names = UniqueNames::new(&options.name_prefix);
        names.collect(ast, program);
        names.reserve(&options.runtime_name);
        TransformContext {
            options,
            meta: Meta::new(),
            scopes: ScopeMap::new(),
            names,
            transformed: Vec::new(),
        }
    }

    /// Rewrites every resumable function under `program`.
    pub fn run(&mut self, ast: &mut Ast, program: NodeId) -> Result<(), TransformError> {
        let mut finder = ResumableFinder { found: Vec::new() };
        walk(ast, program, &mut finder);
        // Pre-order puts outer functions first; innermost must go first.
        for func in finder.found.into_iter().rev() {
            let name = function_label(ast, func);
            if let Err(err) = self.transform_function(ast, func) {
                warn!(function = %name, code = err.code(), "rejected resumable function: {}", err);
                return Err(err);
            }
            self.transformed.push(name);
        }
        Ok(())
    }

    fn transform_function(&mut self, ast: &mut Ast, func: NodeId) -> Result<(), TransformError> {
        let at = ast.span(func).start;
        let (id, body, generator, is_async) = match ast.function(func) {
            Some(f) => (f.id.clone(), f.body, f.generator, f.is_async),
            None => return Ok(()),
        };
        if generator && is_async {
            return Err(TransformError::unsupported("async generator function", at));
        }
        check_body(ast, body)?;

        if is_async {
            let runtime = self.options.runtime_name.clone();
            let mut awaits = AwaitRewriter { runtime };
            walk(ast, body, &mut awaits);
        }
        let arguments_alias = self.alias_arguments(ast, body);

        self.scopes.annotate(ast, func, false);
        let hoisted = hoist(ast, func, &mut self.names);

        // Fresh per function: an enclosing catch body may later rewrite free
        // references in this body to its own `<context>.tN`.
        let context_name = pick_context_name(&mut self.names, &self.options.context_name);
        let emission = emit_body(
            ast,
            &mut self.meta,
            &self.scopes,
            body,
            &context_name,
            &self.options.runtime_name,
        )?;
        debug!(
            function = id.as_deref().unwrap_or("<anonymous>"),
            cases = emission.marks.len(),
            temps = emission.temps,
            has_try = emission.try_locs.is_some(),
            "exploded resumable function"
        );

        let callee_name = match &id {
            Some(name) => self.names.fresh(&format!("callee_{}", name)),
            None => self.names.fresh("callee"),
        };
        let context_param = ast.ident(context_name.as_str());
        let dispatch_body = ast.block(vec![emission.dispatch]);
        let callee = ast.alloc(NodeKind::Function(Function {
            id: Some(callee_name),
            params: vec![context_param],
            body: dispatch_body,
            flavor: FunctionFlavor::Expression,
            generator: false,
            is_async: false,
            directives: vec![],
        }));
        let try_locs = match emission.try_locs {
            Some(table) => table,
            None => ast.null(),
        };
        let entry = ast.path(&self.options.runtime_name, if generator { "mark" } else { "async" });
        let factory = ast.call(entry, vec![callee, try_locs]);
        let call_fn = ast.member(factory, "call");
        let this = ast.this();
        let invoke = ast.call(call_fn, vec![this]);
        let ret = ast.ret(Some(invoke));

        let mut declarations = Vec::new();
        if let Some(alias) = &arguments_alias {
            let source = ast.ident("arguments");
            declarations.push(ast.declarator(alias, Some(source)));
        }
        if let Some(NodeKind::VariableDeclaration { declarations: hoisted, .. }) =
            hoisted.map(|decl| ast.kind(decl).clone())
        {
            declarations.extend(hoisted);
        }
        let mut new_body = Vec::with_capacity(2);
        if !declarations.is_empty() {
            new_body.push(ast.var_decl(declarations));
        }
        new_body.push(ret);
        let span = ast.span(body);
        let new_body = ast.alloc_at(NodeKind::Block { body: new_body }, span);

        if let Some(f) = ast.function_mut(func) {
            f.body = new_body;
            f.generator = false;
            f.is_async = false;
        }
        Ok(())
    }

    /// Points implicit `arguments` references at an alias captured before the
    /// dispatch function shadows them. Returns the alias when any were found.
    fn alias_arguments(&mut self, ast: &mut Ast, body: NodeId) -> Option<String> {
        let mut finder = ArgumentsFinder { found: false };
        walk(ast, body, &mut finder);
        if !finder.found {
            return None;
        }
        let alias = self.names.fresh("arguments");
        let mut rewriter = ArgumentsRewriter { alias: alias.clone() };
        walk(ast, body, &mut rewriter);
        Some(alias)
    }
}

fn pick_context_name(names: &mut UniqueNames, base: &str) -> String {
    let mut candidate = base.to_string();
    let mut n = 1;
    while names.is_used(&candidate) {
        candidate = format!("{}{}", base, n);
        n += 1;
    }
    names.reserve(&candidate);
    candidate
}

fn function_label(ast: &Ast, func: NodeId) -> String {
    ast.function(func)
        .and_then(|f| f.id.clone())
        .unwrap_or_else(|| "<anonymous>".to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRE-PASSES
// ═══════════════════════════════════════════════════════════════════════════════

/// Collects generator and async functions in pre-order.
struct ResumableFinder {
    found: Vec<NodeId>,
}

impl Visitor for ResumableFinder {
    fn visit_function(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if ctx.ast.function(id).is_some_and(|f| f.generator || f.is_async) {
            self.found.push(id);
        }
        Flow::Continue
    }
}

/// Constructs the dispatch loop cannot carry, looked for before anything is
/// rewritten. Nested functions are checked when their own turn comes.
struct BodyCheck {
    error: Option<TransformError>,
}

impl BodyCheck {
    fn fail(&mut self, error: TransformError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

impl Visitor for BodyCheck {
    fn visit_function(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Skip
    }

    fn visit_statement(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if matches!(ctx.ast.kind(id), NodeKind::With { .. }) {
            self.fail(TransformError::WithStatement { at: ctx.ast.span(id).start });
        }
        Flow::Continue
    }

    fn visit_loop(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if matches!(ctx.ast.kind(id), NodeKind::ForOf { is_await: true, .. }) {
            self.fail(TransformError::unsupported("`for await` loop", ctx.ast.span(id).start));
        }
        Flow::Continue
    }
}

/// `super` and `new.target` resolve against the enclosing function, which
/// stops being the dispatch function's own once the body moves into it.
struct HomeObjectFinder {
    at: Option<u32>,
}

impl Visitor for HomeObjectFinder {
    fn visit_function(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if owns_arguments(ctx.ast, id) {
            Flow::Skip
        } else {
            Flow::Continue
        }
    }

    fn visit_expression(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        let bound = match ctx.ast.kind(id) {
            NodeKind::Super => true,
            NodeKind::MetaProperty { meta, .. } => meta == "new",
            _ => false,
        };
        if bound && self.at.is_none() {
            self.at = Some(ctx.ast.span(id).start);
        }
        Flow::Continue
    }
}

fn check_body(ast: &mut Ast, body: NodeId) -> Result<(), TransformError> {
    let mut check = BodyCheck { error: None };
    walk(ast, body, &mut check);
    if let Some(error) = check.error {
        return Err(error);
    }
    let mut home = HomeObjectFinder { at: None };
    walk(ast, body, &mut home);
    if let Some(at) = home.at {
        return Err(TransformError::unsupported("`super` or `new.target` in a resumable function", at));
    }
    Ok(())
}

/// `await x` becomes `yield runtime.awrap(x)`; the runtime's async driver
/// resolves wrapped values before resuming.
struct AwaitRewriter {
    runtime: String,
}

impl Visitor for AwaitRewriter {
    fn visit_function(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Skip
    }

    fn visit_await(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        let NodeKind::Await { argument } = *ctx.ast.kind(id) else {
            return Flow::Continue;
        };
        let span = ctx.ast.span(id);
        let awrap = ctx.ast.path(&self.runtime, "awrap");
        let wrapped = ctx.ast.call(awrap, vec![argument]);
        let suspend = ctx.ast.alloc_at(NodeKind::Yield { argument: Some(wrapped), delegate: false }, span);
        ctx.replace(suspend);
        Flow::Continue
    }
}

/// Arrows share their parent's `arguments`; other functions have their own.
fn owns_arguments(ast: &Ast, id: NodeId) -> bool {
    ast.function(id).is_some_and(|f| f.flavor != FunctionFlavor::Arrow)
}

struct ArgumentsFinder {
    found: bool,
}

impl Visitor for ArgumentsFinder {
    fn visit_function(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if owns_arguments(ctx.ast, id) {
            Flow::Skip
        } else {
            Flow::Continue
        }
    }

    fn visit_identifier(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if ctx.ast.identifier_name(id) == Some("arguments") && ctx.is_reference() {
            self.found = true;
        }
        Flow::Continue
    }
}

struct ArgumentsRewriter {
    alias: String,
}

impl Visitor for ArgumentsRewriter {
    fn visit_function(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if owns_arguments(ctx.ast, id) {
            Flow::Skip
        } else {
            Flow::Continue
        }
    }

    fn visit_identifier(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if ctx.ast.identifier_name(id) == Some("arguments") && ctx.is_reference() {
            let alias = ctx.ast.ident(self.alias.as_str());
            ctx.replace(alias);
        }
        Flow::Continue
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

fn compile_inner(source: &str, options: &CompileOptions) -> Result<CompileOutput, TransformError> {
    options.validate()?;
    let parsed = parse_program(source, options.source_type)?;
    let mut ast = parsed.ast;
    let program = parsed.program;

    let mut ctx = TransformContext::new(options, &mut ast, program);
    ctx.run(&mut ast, program)?;

    Ok(CompileOutput { code: print(&ast, program), transformed_functions: ctx.transformed })
}

/// Compiles one source text. Every failure is reported with its diagnostic
/// code and the position it refers to.
pub fn compile(source: &str, options: &CompileOptions) -> Result<CompileOutput, CompilerError> {
    compile_inner(source, options).map_err(|err| err.to_compiler_error(source, &options.file_name))
}

/// Compiles independent sources in parallel. Results keep the input order.
pub fn compile_batch(
    sources: &[String],
    options: &CompileOptions,
) -> Vec<Result<CompileOutput, CompilerError>> {
    sources.par_iter().map(|source| compile(source, options)).collect()
}
