
#[cfg(test)]
mod tests {
    use crate::ast::{Ast, NodeId, NodeKind};
    use crate::codegen::print;
    use crate::emit::{emit_body, Completion, Emission, Emitter};
    use crate::hoist::hoist;
    use crate::meta::Meta;
    use crate::options::SourceKind;
    use crate::parse::parse_program;
    use crate::scope::{ScopeMap, UniqueNames};
    use crate::validate::TransformError;

    struct Exploded {
        ast: Ast,
        emission: Emission,
    }

    impl Exploded {
        fn dispatch(&self) -> String {
            print(&self.ast, self.emission.dispatch)
        }

        fn try_locs(&self) -> Option<String> {
            self.emission.try_locs.map(|t| print(&self.ast, t))
        }
    }

    fn first_function(ast: &Ast, program: NodeId) -> NodeId {
        let NodeKind::Program { body, .. } = ast.kind(program) else {
            panic!("expected a program");
        };
        body[0]
    }

    fn run(source: &str) -> Result<(Ast, Result<Emission, TransformError>), TransformError> {
        let parsed = parse_program(source, SourceKind::Module)?;
        let mut ast = parsed.ast;
        let func = first_function(&ast, parsed.program);
        let mut names = UniqueNames::new("_rs_");
        names.collect(&mut ast, parsed.program);
        let mut scopes = ScopeMap::new();
        scopes.annotate(&mut ast, func, false);
        hoist(&mut ast, func, &mut names);
        let body = ast.function(func).expect("not a function").body;
        let mut meta = Meta::new();
        let emission = emit_body(&mut ast, &mut meta, &scopes, body, "context", "resyncRuntime");
        Ok((ast, emission))
    }

    fn explode(source: &str) -> Exploded {
        let (ast, emission) = run(source).expect("parse failed");
        Exploded { ast, emission: emission.expect("emission failed") }
    }

    fn explode_err(source: &str) -> TransformError {
        let (_, emission) = run(source).expect("parse failed");
        match emission {
            Ok(_) => panic!("expected emission to fail"),
            Err(err) => err,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LISTING SHAPE
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_leap_free_statements_are_copied_verbatim() {
        let parsed = parse_program("function* g() { a(); b = 1; if (c) d(); }", SourceKind::Module)
            .expect("parse failed");
        let mut ast = parsed.ast;
        let func = first_function(&ast, parsed.program);
        let body = ast.function(func).expect("not a function").body;
        let NodeKind::Block { body: original } = ast.kind(body).clone() else {
            panic!("body is not a block");
        };
        let scopes = ScopeMap::new();
        let mut meta = Meta::new();
        let emission = emit_body(&mut ast, &mut meta, &scopes, body, "context", "resyncRuntime")
            .expect("emission failed");
        assert_eq!(emission.listing, original);
        assert_eq!(emission.marks, vec![0]);
    }

    #[test]
    fn test_single_yield() {
        let out = explode("function* g() { var x = yield 1; return x + 1; }");
        let expected = "while (true) {
  switch (context.prev = context.next) {
    case 0:
      context.next = 2;
      return 1;
    case 2:
      x = context.sent;
      return context.abrupt(\"return\", x + 1);
    case 4:
    case \"end\":
      return context.stop();
  }
}";
        assert_eq!(out.dispatch(), expected);
        assert_eq!(out.emission.marks, vec![0, 2]);
        assert!(out.try_locs().is_none());
    }

    #[test]
    fn test_marks_are_sorted_and_within_listing() {
        let out = explode(
            "function* g(n) { for (let i = 0; i < n; i++) { if (i % 2) continue; yield i; } do { yield 0; } while (n--); }",
        );
        let marks = &out.emission.marks;
        assert_eq!(marks[0], 0);
        assert!(marks.windows(2).all(|w| w[0] < w[1]));
        assert!(marks.iter().all(|m| *m <= out.emission.listing.len()));
        assert!(!out.dispatch().contains("-1"), "unpatched location:\n{}", out.dispatch());
    }

    #[test]
    fn test_statements_after_a_completion_are_dropped() {
        let out = explode("function* g() { yield 1; return 2; dead(); }");
        assert!(!out.dispatch().contains("dead()"), "{}", out.dispatch());
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOOPS AND JUMPS
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_while_loop() {
        let out = explode("function* g() { let i = 0; while (i < 3) { yield i; i++; } }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("case 0:\n      i = 0;\n    case 1:"), "{}", dispatch);
        assert!(dispatch.contains("if (!(i < 3)) {\n        context.next = 7;\n        break;\n      }"), "{}", dispatch);
        assert!(dispatch.contains("context.next = 4;\n      return i;"), "{}", dispatch);
        assert!(dispatch.contains("case 4:\n      i++;\n      context.next = 1;\n      break;"), "{}", dispatch);
        assert!(dispatch.contains("case 7:\n    case \"end\":"), "{}", dispatch);
        assert_eq!(out.emission.marks, vec![0, 1, 4, 7]);
    }

    #[test]
    fn test_negated_test_is_not_double_negated() {
        let out = explode("function* g() { while (!done()) { yield 1; } }");
        assert!(out.dispatch().contains("if (done()) {"), "{}", out.dispatch());
    }

    #[test]
    fn test_labeled_break_targets_outer_loop() {
        let out = explode("function* g() { outer: for (;;) { for (;;) { yield 1; break outer; } } }");
        assert!(out.dispatch().contains("return context.abrupt(\"break\", 7);"), "{}", out.dispatch());
    }

    #[test]
    fn test_stacked_labels_both_name_the_loop() {
        let out = explode("function* g() { let i = 0; a: b: while (i < 3) { i++; yield i; if (i > 1) continue a; continue b; } }");
        let dispatch = out.dispatch();
        assert_eq!(dispatch.matches("return context.abrupt(\"continue\", 1);").count(), 2, "{}", dispatch);
    }

    #[test]
    fn test_continue_targets_update() {
        let out = explode("function* g(n) { for (var i = 0; i < n; i++) { if (i) continue; yield i; } }");
        // The update location is the offset of `i++`.
        let dispatch = out.dispatch();
        let target = dispatch
            .split("context.abrupt(\"continue\", ")
            .nth(1)
            .and_then(|rest| rest.split(')').next())
            .expect("missing continue");
        assert!(dispatch.contains(&format!("case {}:\n      i++;", target)), "{}", dispatch);
    }

    #[test]
    fn test_for_of_uses_runtime_values() {
        let out = explode("function* g(xs) { for (const x of xs) { yield x; } }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("context.t0 = resyncRuntime.values(xs);"), "{}", dispatch);
        assert!(dispatch.contains("if ((context.t1 = context.t0.next()).done) {"), "{}", dispatch);
        assert!(dispatch.contains("x = context.t1.value;"), "{}", dispatch);
    }

    #[test]
    fn test_for_in_uses_runtime_keys() {
        let out = explode("function* g(o) { for (var k in o) { yield k; } }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("context.t0 = resyncRuntime.keys(o);"), "{}", dispatch);
        assert!(dispatch.contains("if ((context.t1 = context.t0()).done) {"), "{}", dispatch);
        assert!(dispatch.contains("k = context.t1.value;"), "{}", dispatch);
    }

    #[test]
    fn test_switch_without_default_falls_to_after() {
        let out = explode("function* g(x) { switch (x) { case 1: yield \"a\"; break; case 2: yield \"b\"; } }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("context.t0 = x;"), "{}", dispatch);
        assert!(
            dispatch.contains("context.next = context.t0 === 1 ? 3 : context.t0 === 2 ? 6 : 8;"),
            "{}",
            dispatch
        );
        assert!(dispatch.contains("return context.abrupt(\"break\", 8);"), "{}", dispatch);
    }

    #[test]
    fn test_switch_default_case() {
        let out = explode("function* g(x) { switch (x) { default: yield 0; case 1: yield 1; } }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("context.next = context.t0 === 1 ? "), "{}", dispatch);
        assert!(!dispatch.contains("-1"), "{}", dispatch);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXCEPTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_try_catch_finally() {
        let out = explode("function* g() { try { yield 1; } catch (e) { log(e); } finally { done(); } }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("case 0:\n      context.prev = 0;\n      context.next = 3;\n      return 1;"), "{}", dispatch);
        assert!(dispatch.contains("case 3:\n      context.next = 8;\n      break;"), "{}", dispatch);
        assert!(
            dispatch.contains("case 5:\n      context.prev = 5;\n      context.t0 = context.catch(0);\n      log(context.t0);"),
            "{}",
            dispatch
        );
        assert!(
            dispatch.contains("case 8:\n      context.prev = 8;\n      done();\n      return context.finish(8);"),
            "{}",
            dispatch
        );
        assert_eq!(out.try_locs().as_deref(), Some("[[0, 5, 8, 11]]"));
    }

    #[test]
    fn test_try_catch_without_finally_trims_row() {
        let out = explode("function* g() { try { yield 1; } catch (e) { yield e; } }");
        let table = out.try_locs().expect("missing try table");
        assert_eq!(table.matches(',').count(), 1, "row should be [try, catch]: {}", table);
    }

    #[test]
    fn test_try_finally_without_catch() {
        let out = explode("function* g() { try { yield 1; } finally { done(); } }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("return context.finish("), "{}", dispatch);
        let table = out.try_locs().expect("missing try table");
        assert!(table.contains(", , "), "catch slot should be a hole: {}", table);
    }

    #[test]
    fn test_catch_parameter_shadowed_in_nested_scope() {
        let out = explode(
            "function* g() { try { yield 1; } catch (e) { log(e); { let e = 2; use(e); } [1].map(function (e) { return e; }); } }",
        );
        let dispatch = out.dispatch();
        assert!(dispatch.contains("log(context.t0);"), "{}", dispatch);
        assert!(dispatch.contains("use(e);"), "{}", dispatch);
        assert!(dispatch.contains("function(e) {\n"), "{}", dispatch);
        assert!(dispatch.contains("return e;"), "{}", dispatch);
    }

    #[test]
    fn test_throw_is_kept() {
        let out = explode("function* g() { yield 1; throw new Error(\"x\"); }");
        assert!(out.dispatch().contains("throw new Error(\"x\");"), "{}", out.dispatch());
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPRESSIONS
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_yield_value_is_sent() {
        let out = explode("function* g() { log(yield 1); }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("context.t0 = log;"), "{}", dispatch);
        assert!(dispatch.contains("return 1;"), "{}", dispatch);
        assert!(dispatch.contains("context.t1 = context.sent;"), "{}", dispatch);
        assert!(dispatch.contains("context.t0(context.t1);"), "{}", dispatch);
    }

    #[test]
    fn test_delegate_yield() {
        let out = explode("function* g(inner) { var r = yield* inner(); }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("return context.delegateYield(inner(), \"t0\", 1);"), "{}", dispatch);
        assert!(dispatch.contains("r = context.t0;"), "{}", dispatch);
    }

    #[test]
    fn test_earlier_operands_are_saved_before_a_yield() {
        let out = explode("function* g() { var s = f() + (yield 1); }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("context.t0 = f();"), "{}", dispatch);
        assert!(dispatch.contains("s = context.t0 + context.t1;"), "{}", dispatch);
    }

    #[test]
    fn test_literal_operands_are_not_saved() {
        let out = explode("function* g() { var s = 1 + (yield 2); }");
        assert!(out.dispatch().contains("s = 1 + context.t0;"), "{}", out.dispatch());
    }

    #[test]
    fn test_method_call_keeps_receiver() {
        let out = explode("function* g(obj) { obj.method(yield 1); }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("context.t0 = obj;"), "{}", dispatch);
        assert!(dispatch.contains("context.t0.method.call(context.t0, context.t1);"), "{}", dispatch);
    }

    #[test]
    fn test_logical_expression_becomes_jump() {
        let out = explode("function* g(a) { var r = a || (yield 1); }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("context.t0 = a"), "{}", dispatch);
        assert!(dispatch.contains("if (context.t0) {"), "{}", dispatch);
        assert!(dispatch.contains("r = context.t0;"), "{}", dispatch);
    }

    #[test]
    fn test_conditional_expression_becomes_jump() {
        let out = explode("function* g(a) { var r = a ? yield 1 : 2; }");
        let dispatch = out.dispatch();
        assert!(dispatch.contains("if (!a) {"), "{}", dispatch);
        assert!(dispatch.contains("context.t0 = context.sent;"), "{}", dispatch);
        assert!(dispatch.contains("context.t0 = 2;"), "{}", dispatch);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_unhoisted_declaration_is_rejected() {
        let parsed = parse_program("function* g() { let x = yield 1; }", SourceKind::Module).expect("parse failed");
        let mut ast = parsed.ast;
        let func = first_function(&ast, parsed.program);
        let body = ast.function(func).expect("not a function").body;
        let scopes = ScopeMap::new();
        let mut meta = Meta::new();
        let err = emit_body(&mut ast, &mut meta, &scopes, body, "context", "resyncRuntime")
            .expect_err("declaration must be hoisted first");
        assert_eq!(err.code(), "RG-INPUT-003");
    }

    #[test]
    fn test_for_await_is_rejected() {
        let err = explode_err("async function g(xs) { for await (const x of xs) { await x; } }");
        assert_eq!(err.code(), "RG-INPUT-004");
    }

    #[test]
    fn test_unresolved_break() {
        let mut ast = Ast::new();
        let brk = ast.alloc(NodeKind::Break { label: Some("nowhere".into()) });
        let suspend = ast.alloc(NodeKind::Yield { argument: None, delegate: false });
        let suspend = ast.expr_stmt(suspend);
        let body = ast.block(vec![suspend, brk]);
        let scopes = ScopeMap::new();
        let mut meta = Meta::new();
        let err = emit_body(&mut ast, &mut meta, &scopes, body, "context", "resyncRuntime")
            .expect_err("break has no target");
        assert_eq!(err.code(), "RG-INPUT-002");
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_unmarked_location_is_reported() {
        let mut ast = Ast::new();
        let scopes = ScopeMap::new();
        let mut meta = Meta::new();
        let mut emitter = Emitter::new(&mut ast, &mut meta, &scopes, "context", "resyncRuntime");
        let dangling = emitter.loc();
        emitter.jump(dangling);
        let err = emitter.finish().expect_err("location was never marked");
        assert_eq!(err.code(), "RG-INTERNAL-002");
    }

    #[test]
    fn test_location_cannot_move() {
        let mut ast = Ast::new();
        let scopes = ScopeMap::new();
        let mut meta = Meta::new();
        let mut emitter = Emitter::new(&mut ast, &mut meta, &scopes, "context", "resyncRuntime");
        let loc = emitter.loc();
        emitter.mark(loc).expect("first mark");
        emitter.emit_abrupt_completion(Completion::Return(None)).expect("return");
        assert!(emitter.mark(loc).is_err());
    }
}
