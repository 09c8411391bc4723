
#[cfg(test)]
mod tests {
    use crate::ast::{Ast, NodeId, NodeKind};
    use crate::codegen::print;
    use crate::hoist::hoist;
    use crate::options::SourceKind;
    use crate::parse::parse_program;
    use crate::scope::UniqueNames;

    fn first_function(ast: &Ast, program: NodeId) -> NodeId {
        let NodeKind::Program { body, .. } = ast.kind(program) else {
            panic!("expected a program");
        };
        body[0]
    }

    /// Hoists the first top-level function and returns the printed `var`
    /// declaration and the printed body.
    fn hoisted(source: &str) -> (Option<String>, String) {
        let parsed = parse_program(source, SourceKind::Module).expect("parse failed");
        let mut ast = parsed.ast;
        let func = first_function(&ast, parsed.program);
        let mut names = UniqueNames::new("_rs_");
        names.collect(&mut ast, parsed.program);
        let decl = hoist(&mut ast, func, &mut names);
        let body = ast.function(func).expect("not a function").body;
        (decl.map(|d| print(&ast, d)), print(&ast, body))
    }

    #[test]
    fn test_var_and_let_become_assignments() {
        let (decl, body) = hoisted("function* g() { var a = 1, b; let c = 2; const d = 3; yield a; }");
        assert_eq!(decl.as_deref(), Some("var a, b, c, d;"));
        assert!(body.contains("a = 1;"));
        assert!(body.contains("c = 2;"));
        assert!(body.contains("d = 3;"));
        assert!(!body.contains("let "));
        assert!(!body.contains("const "));
    }

    #[test]
    fn test_multiple_initializers_become_a_sequence() {
        let (_, body) = hoisted("function* g() { var a = 1, b = 2; }");
        assert!(body.contains("a = 1, b = 2;"));
    }

    #[test]
    fn test_declaration_without_initializer_is_removed() {
        let (decl, body) = hoisted("function* g() { let x; yield x; }");
        assert_eq!(decl.as_deref(), Some("var x;"));
        assert_eq!(body, "{\n  yield x;\n}");
    }

    #[test]
    fn test_parameters_are_not_redeclared() {
        let (decl, body) = hoisted("function* g(a, { b }, ...rest) { var a = 1; var b; var rest; var c; }");
        assert_eq!(decl.as_deref(), Some("var c;"));
        assert!(body.contains("a = 1;"));
    }

    #[test]
    fn test_nothing_to_hoist() {
        let (decl, _) = hoisted("function* g(a) { yield a; }");
        assert!(decl.is_none());
    }

    #[test]
    fn test_function_declarations_move_to_the_top() {
        let (decl, body) = hoisted("function* g() { yield helper(); function helper() { return 1; } }");
        assert_eq!(decl.as_deref(), Some("var helper;"));
        let assign = body.find("helper = function _rs_helper()").expect("missing hoisted function");
        let use_site = body.find("yield helper();").expect("missing yield");
        assert!(assign < use_site, "function must be assigned first:\n{}", body);
    }

    #[test]
    fn test_function_declarations_keep_source_order() {
        let (_, body) = hoisted("function* g() { function a() {} yield 1; function b() {} }");
        let a = body.find("a = function").expect("missing a");
        let b = body.find("b = function").expect("missing b");
        let y = body.find("yield 1;").expect("missing yield");
        assert!(a < b && b < y, "unexpected order:\n{}", body);
    }

    #[test]
    fn test_class_declaration_becomes_assignment() {
        let (decl, body) = hoisted("function* g() { class C {} yield new C(); }");
        assert_eq!(decl.as_deref(), Some("var C;"));
        assert!(body.contains("C = class C {};"), "{}", body);
    }

    #[test]
    fn test_destructuring_declaration() {
        let (decl, body) = hoisted("function* g() { let [x, y] = pair; yield x + y; }");
        assert_eq!(decl.as_deref(), Some("var x, y;"));
        assert!(body.contains("[x, y] = pair;"), "{}", body);
    }

    #[test]
    fn test_loop_heads() {
        let (decl, body) = hoisted(
            "function* g(o, xs) { for (let i = 0; i < 3; i++) {} for (var k in o) {} for (const x of xs) {} }",
        );
        assert_eq!(decl.as_deref(), Some("var i, k, x;"));
        assert!(body.contains("for (i = 0; i < 3; i++) {}"), "{}", body);
        assert!(body.contains("for (k in o) {}"), "{}", body);
        assert!(body.contains("for (x of xs) {}"), "{}", body);
    }

    #[test]
    fn test_nested_blocks_and_branches() {
        let (decl, body) = hoisted("function* g(c) { if (c) { let a = 1; } else var b = 2; while (c) { var d; } }");
        assert_eq!(decl.as_deref(), Some("var a, b, d;"));
        assert!(body.contains("else b = 2;"), "{}", body);
    }

    #[test]
    fn test_switch_case_declarations() {
        let (decl, body) = hoisted("function* g(x) { switch (x) { case 1: let y = 2; yield y; } }");
        assert_eq!(decl.as_deref(), Some("var y;"));
        assert!(body.contains("y = 2;"));
    }

    #[test]
    fn test_nested_functions_keep_their_declarations() {
        let (decl, body) = hoisted("function* g() { const f = () => { let inner = 1; return inner; }; yield f; }");
        assert_eq!(decl.as_deref(), Some("var f;"));
        assert!(body.contains("let inner = 1;"), "{}", body);
    }

    #[test]
    fn test_destructured_catch_parameter() {
        let (decl, body) = hoisted("function* g() { try { yield 1; } catch ({ message }) { log(message); } }");
        assert_eq!(decl.as_deref(), Some("var message;"));
        assert!(body.contains("catch (_rs_e)"), "{}", body);
        assert!(body.contains("= _rs_e);"), "{}", body);
    }

    #[test]
    fn test_plain_catch_parameter_is_left_alone() {
        let (decl, body) = hoisted("function* g() { try { yield 1; } catch (e) { log(e); } }");
        assert!(decl.is_none());
        assert!(body.contains("catch (e)"));
    }

    #[test]
    fn test_hoisting_twice_finds_nothing_new() {
        let parsed = parse_program("function* g() { var a = 1; function f() {} }", SourceKind::Module)
            .expect("parse failed");
        let mut ast = parsed.ast;
        let func = first_function(&ast, parsed.program);
        let mut names = UniqueNames::new("_rs_");
        names.collect(&mut ast, parsed.program);
        assert!(hoist(&mut ast, func, &mut names).is_some());
        let body = ast.function(func).expect("not a function").body;
        let first = print(&ast, body);
        assert!(hoist(&mut ast, func, &mut names).is_none());
        assert_eq!(print(&ast, body), first);
    }
}
