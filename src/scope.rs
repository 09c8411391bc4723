//! Scope annotation
//!
//! One pre-pass records, for every scope-opening node, the names bound directly
//! in it. `var` and function declarations land in the nearest function (or catch)
//! scope; `let`, `const` and class declarations land in the nearest block or loop
//! header. The map is computed before hoisting erases the declarations, so later
//! rewrites can still tell when a nested scope shadows a name.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{Ast, DeclKind, FunctionFlavor, NodeId, NodeKind};
use crate::visitor::{dispatch, walk, Flow, VisitContext, Visitor};

#[derive(Debug, Default)]
pub struct ScopeMap {
    bindings: FxHashMap<NodeId, FxHashSet<String>>,
}

impl ScopeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_annotated(&self, id: NodeId) -> bool {
        self.bindings.contains_key(&id)
    }

    pub fn binds(&self, id: NodeId, name: &str) -> bool {
        self.bindings.get(&id).is_some_and(|names| names.contains(name))
    }

    fn open(&mut self, id: NodeId) -> &mut FxHashSet<String> {
        let set = self.bindings.entry(id).or_default();
        set.clear();
        set
    }

    fn bind(&mut self, id: NodeId, name: String) {
        self.bindings.entry(id).or_default().insert(name);
    }

    /// Annotates every scope-opening node under `root`. Subtrees whose root is
    /// already annotated are left alone unless `force` is set.
    pub fn annotate(&mut self, ast: &mut Ast, root: NodeId, force: bool) {
        let mut annotator = Annotator { scopes: self, force };
        walk(ast, root, &mut annotator);
    }
}

struct Annotator<'s> {
    scopes: &'s mut ScopeMap,
    force: bool,
}

impl Annotator<'_> {
    /// Nearest enclosing function-opening or catch-opening ancestor.
    fn function_scope(ctx: &VisitContext<'_>) -> Option<NodeId> {
        ctx.ancestors().iter().rev().copied().find(|id| {
            matches!(
                ctx.ast.kind(*id),
                NodeKind::Function(_) | NodeKind::CatchClause { .. } | NodeKind::Program { .. }
            )
        })
    }

    fn block_scope(ctx: &VisitContext<'_>) -> Option<NodeId> {
        ctx.ancestors().iter().rev().copied().find(|id| ctx.ast.opens_scope(*id))
    }

    fn open_scope(&mut self, ast: &Ast, id: NodeId) {
        let mut seeded = Vec::new();
        match ast.kind(id) {
            NodeKind::Function(func) => {
                for param in &func.params {
                    seeded.extend(ast.bound_names(*param));
                }
                seeded.push("this".to_string());
                if func.flavor != FunctionFlavor::Arrow {
                    seeded.push("arguments".to_string());
                }
                if func.flavor == FunctionFlavor::Expression {
                    seeded.extend(func.id.clone());
                }
            }
            NodeKind::CatchClause { param: Some(param), .. } => {
                seeded.extend(ast.bound_names(*param));
            }
            _ => {}
        }
        let set = self.scopes.open(id);
        set.extend(seeded);
    }
}

impl Visitor for Annotator<'_> {
    fn visit_node(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        let mut already = false;
        if ctx.ast.opens_scope(id) {
            if self.scopes.is_annotated(id) && !self.force {
                already = true;
            } else {
                self.open_scope(ctx.ast, id);
            }
        }
        // Declarations still register in the enclosing scope even when the
        // subtree below them was annotated earlier.
        let flow = dispatch(self, ctx, id);
        if already {
            Flow::Skip
        } else {
            flow
        }
    }

    fn visit_variable_declaration(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        let NodeKind::VariableDeclaration { kind, declarations } = ctx.ast.kind(id) else {
            return Flow::Continue;
        };
        let target = if *kind == DeclKind::Var {
            Self::function_scope(ctx)
        } else {
            Self::block_scope(ctx)
        };
        let mut names = Vec::new();
        for declarator in declarations {
            if let NodeKind::VariableDeclarator { id: pattern, .. } = ctx.ast.kind(*declarator) {
                names.extend(ctx.ast.bound_names(*pattern));
            }
        }
        if let Some(target) = target {
            for name in names {
                self.scopes.bind(target, name);
            }
        }
        Flow::Continue
    }

    fn visit_function(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        let Some(func) = ctx.ast.function(id) else {
            return Flow::Continue;
        };
        if func.flavor == FunctionFlavor::Declaration {
            if let (Some(name), Some(target)) = (func.id.clone(), Self::function_scope(ctx)) {
                self.scopes.bind(target, name);
            }
        }
        Flow::Continue
    }

    fn visit_class(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if let NodeKind::Class { id: Some(name), is_declaration: true, .. } = ctx.ast.kind(id) {
            if let Some(target) = Self::block_scope(ctx) {
                self.scopes.bind(target, name.clone());
            }
        }
        Flow::Continue
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHADOW-AWARE REFERENCE REPLACEMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Replaces every reference to `name` under `root` with a fresh node built by
/// `make`, except inside scopes that re-bind `name`. `root` itself is checked
/// too. Returns the number of references replaced.
pub fn replace_free_references<F>(
    ast: &mut Ast,
    scopes: &ScopeMap,
    root: NodeId,
    name: &str,
    make: F,
) -> usize
where
    F: FnMut(&mut Ast) -> NodeId,
{
    let mut rewriter = ReferenceRewriter { scopes, name, make, replaced: 0 };
    walk(ast, root, &mut rewriter);
    rewriter.replaced
}

struct ReferenceRewriter<'s, F> {
    scopes: &'s ScopeMap,
    name: &'s str,
    make: F,
    replaced: usize,
}

impl<F> Visitor for ReferenceRewriter<'_, F>
where
    F: FnMut(&mut Ast) -> NodeId,
{
    fn visit_node(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if self.scopes.binds(id, self.name) {
            return Flow::Skip;
        }
        dispatch(self, ctx, id)
    }

    fn visit_identifier(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if ctx.ast.identifier_name(id) == Some(self.name) && ctx.is_reference() {
            let replacement = (self.make)(ctx.ast);
            if ctx.replace(replacement) {
                self.replaced += 1;
            }
        }
        Flow::Continue
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATED NAMES
// ═══════════════════════════════════════════════════════════════════════════════

/// Hands out prefixed names that collide with nothing in the program and with
/// nothing handed out earlier in the same run.
#[derive(Debug)]
pub struct UniqueNames {
    prefix: String,
    used: FxHashSet<String>,
}

impl UniqueNames {
    pub fn new(prefix: &str) -> Self {
        UniqueNames { prefix: prefix.to_string(), used: FxHashSet::default() }
    }

    /// Records every identifier, function name and class name under `root`.
    pub fn collect(&mut self, ast: &mut Ast, root: NodeId) {
        let mut collector = NameCollector { used: &mut self.used };
        walk(ast, root, &mut collector);
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }

    pub fn fresh(&mut self, base: &str) -> String {
        let base = base.trim_start_matches(|c: char| c == '_' || c.is_ascii_digit());
        let base = if base.is_empty() { "ref" } else { base };
        let mut candidate = format!("{}{}", self.prefix, base);
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}{}{}", self.prefix, base, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

struct NameCollector<'s> {
    used: &'s mut FxHashSet<String>,
}

impl Visitor for NameCollector<'_> {
    fn visit_identifier(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if let Some(name) = ctx.ast.identifier_name(id) {
            self.used.insert(name.to_string());
        }
        Flow::Continue
    }

    fn visit_function(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if let Some(name) = ctx.ast.function(id).and_then(|func| func.id.clone()) {
            self.used.insert(name);
        }
        Flow::Continue
    }

    fn visit_class(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        if let NodeKind::Class { id: Some(name), .. } = ctx.ast.kind(id) {
            self.used.insert(name.clone());
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Function;

    fn let_decl(ast: &mut Ast, kind: DeclKind, name: &str) -> NodeId {
        let one = ast.num(1.0);
        let declarator = ast.declarator(name, Some(one));
        ast.alloc(NodeKind::VariableDeclaration { kind, declarations: vec![declarator] })
    }

    #[test]
    fn test_var_binds_to_function_and_let_to_block() {
        let mut ast = Ast::new();
        let v = let_decl(&mut ast, DeclKind::Var, "v");
        let l = let_decl(&mut ast, DeclKind::Let, "l");
        let inner = ast.block(vec![v, l]);
        let body = ast.block(vec![inner]);
        let p = ast.ident("p");
        let func = ast.alloc(NodeKind::Function(Function {
            id: Some("f".to_string()),
            params: vec![p],
            body,
            flavor: FunctionFlavor::Declaration,
            generator: true,
            is_async: false,
            directives: vec![],
        }));
        let program = ast.alloc(NodeKind::Program { body: vec![func], directives: vec![] });

        let mut scopes = ScopeMap::new();
        scopes.annotate(&mut ast, program, false);

        assert!(scopes.binds(func, "p"));
        assert!(scopes.binds(func, "v"));
        assert!(scopes.binds(func, "arguments"));
        assert!(!scopes.binds(func, "l"));
        assert!(scopes.binds(inner, "l"));
        assert!(!scopes.binds(body, "v"));
        assert!(scopes.binds(program, "f"));
    }

    #[test]
    fn test_annotation_is_idempotent_unless_forced() {
        let mut ast = Ast::new();
        let block = ast.block(vec![]);
        let mut scopes = ScopeMap::new();
        scopes.annotate(&mut ast, block, false);
        scopes.bind(block, "manual".to_string());

        scopes.annotate(&mut ast, block, false);
        assert!(scopes.binds(block, "manual"));

        scopes.annotate(&mut ast, block, true);
        assert!(!scopes.binds(block, "manual"));
    }

    #[test]
    fn test_replace_skips_shadowing_scopes() {
        let mut ast = Ast::new();
        let shadow = let_decl(&mut ast, DeclKind::Let, "e");
        let use_e = ast.ident("e");
        let f = ast.ident("use");
        let call = ast.call(f, vec![use_e]);
        let used = ast.expr_stmt(call);
        let shadowed = ast.block(vec![shadow, used]);

        let open_e = ast.ident("e");
        let g = ast.ident("use");
        let open_call = ast.call(g, vec![open_e]);
        let open_use = ast.expr_stmt(open_call);
        let body = ast.block(vec![shadowed, open_use]);

        let mut scopes = ScopeMap::new();
        scopes.annotate(&mut ast, body, false);
        let count = replace_free_references(&mut ast, &scopes, body, "e", |ast| ast.path("ctx", "t0"));

        assert_eq!(count, 1);
        let NodeKind::Call { arguments, .. } = ast.kind(call) else { panic!() };
        assert_eq!(ast.identifier_name(arguments[0]), Some("e"));
        let NodeKind::Call { arguments, .. } = ast.kind(open_call) else { panic!() };
        assert!(matches!(ast.kind(arguments[0]), NodeKind::Member { .. }));
    }

    #[test]
    fn test_unique_names_avoid_program_identifiers() {
        let mut ast = Ast::new();
        let taken = ast.ident("_rs_callee");
        let stmt = ast.expr_stmt(taken);
        let mut names = UniqueNames::new("_rs_");
        names.collect(&mut ast, stmt);

        assert_eq!(names.fresh("callee"), "_rs_callee2");
        assert_eq!(names.fresh("callee"), "_rs_callee3");
        assert_eq!(names.fresh("_e"), "_rs_e");
        assert!(names.is_used("_rs_e"));
    }
}
