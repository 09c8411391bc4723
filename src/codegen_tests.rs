
#[cfg(test)]
mod tests {
    use crate::ast::{Ast, NodeKind};
    use crate::codegen::{format_number, print};
    use crate::options::SourceKind;
    use crate::parse::parse_program;
    use oxc_syntax::operator::{BinaryOperator, UnaryOperator};

    fn reprint(source: &str) -> String {
        let parsed = parse_program(source, SourceKind::Module).expect("parse failed");
        print(&parsed.ast, parsed.program)
    }

    fn assert_stable(source: &str) {
        let once = reprint(source);
        assert_eq!(reprint(&once), once, "printing is not stable for {:?}", source);
    }

    #[test]
    fn test_statement_per_line() {
        assert_eq!(reprint("a();b()"), "a();\nb();\n");
    }

    #[test]
    fn test_precedence_parens() {
        assert_eq!(reprint("(a + b) * c;"), "(a + b) * c;\n");
        assert_eq!(reprint("a + b * c;"), "a + b * c;\n");
        assert_eq!(reprint("a - (b - c);"), "a - (b - c);\n");
        assert_eq!(reprint("x = (a, b);"), "x = (a, b);\n");
        assert_eq!(reprint("(a ? b : c) ? d : e;"), "(a ? b : c) ? d : e;\n");
    }

    #[test]
    fn test_exponent_operands() {
        assert_eq!(reprint("(-a) ** b;"), "(-a) ** b;\n");
        assert_eq!(reprint("a ** b ** c;"), "a ** b ** c;\n");
        assert_eq!(reprint("(a ** b) ** c;"), "(a ** b) ** c;\n");
    }

    #[test]
    fn test_nullish_mixing_keeps_parens() {
        assert_eq!(reprint("(a || b) ?? c;"), "(a || b) ?? c;\n");
        assert_eq!(reprint("a ?? (b && c);"), "a ?? (b && c);\n");
    }

    #[test]
    fn test_ambiguous_statement_starts() {
        assert_eq!(reprint("(function () {})();"), "(function() {}());\n");
        assert_eq!(reprint("({ a } = b);"), "({ a } = b);\n");
        assert_eq!(reprint("(class {});"), "(class {});\n");
    }

    #[test]
    fn test_new_with_call_in_callee() {
        assert_eq!(reprint("new (f())();"), "new (f())();\n");
        assert_eq!(reprint("new a.b.C();"), "new a.b.C();\n");
    }

    #[test]
    fn test_number_member_access() {
        assert_eq!(reprint("(1).toString();"), "(1).toString();\n");
        assert_eq!(reprint("1.5.toFixed();"), "1.5.toFixed();\n");
    }

    #[test]
    fn test_array_holes() {
        assert_eq!(reprint("x = [1, , 2];"), "x = [1, , 2];\n");
        assert_eq!(reprint("x = [1, ,];"), "x = [1, ,];\n");
        assert_eq!(reprint("x = [];"), "x = [];\n");
    }

    #[test]
    fn test_object_shorthand() {
        assert_eq!(reprint("x = { a, b: c, d: d };"), "x = { a, b: c, d };\n");
        assert_eq!(reprint("x = {};"), "x = {};\n");
    }

    #[test]
    fn test_strings_are_double_quoted() {
        assert_eq!(reprint("x = 'it\\'s';"), "x = \"it's\";\n");
        assert_eq!(reprint("x = 'say \"hi\"';"), "x = \"say \\\"hi\\\"\";\n");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(reprint("x = 0x10;"), "x = 16;\n");
    }

    #[test]
    fn test_unary_spacing() {
        assert_eq!(reprint("typeof x;"), "typeof x;\n");
        assert_eq!(reprint("void 0;"), "void 0;\n");

        let mut ast = Ast::new();
        let x = ast.ident("x");
        let inner = ast.alloc(NodeKind::Unary { operator: UnaryOperator::UnaryNegation, argument: x });
        let outer = ast.alloc(NodeKind::Unary { operator: UnaryOperator::UnaryNegation, argument: inner });
        assert_eq!(print(&ast, outer), "- -x");
    }

    #[test]
    fn test_built_nodes_get_parens() {
        let mut ast = Ast::new();
        let a = ast.ident("a");
        let b = ast.ident("b");
        let c = ast.ident("c");
        let sum = ast.binary(BinaryOperator::Addition, a, b);
        let product = ast.binary(BinaryOperator::Multiplication, sum, c);
        assert_eq!(print(&ast, product), "(a + b) * c");
    }

    #[test]
    fn test_if_else_shapes() {
        assert_eq!(reprint("if (a) b(); else c();"), "if (a) b();\nelse c();\n");
        assert_eq!(reprint("if (a) { b(); } else c();"), "if (a) {\n  b();\n} else c();\n");
        assert_eq!(
            reprint("if (a) { if (b) c(); } else d();"),
            "if (a) {\n  if (b) c();\n} else d();\n"
        );
    }

    #[test]
    fn test_functions_and_arrows() {
        assert_eq!(reprint("function f(a, b = 1, ...c) {}"), "function f(a, b = 1, ...c) {}\n");
        assert_eq!(reprint("f = (a) => a + 1;"), "f = (a) => a + 1;\n");
        assert_eq!(reprint("f = () => ({ a: 1 });"), "f = () => ({ a: 1 });\n");
        assert_eq!(reprint("f = async function* () {};"), "f = async function*() {};\n");
    }

    #[test]
    fn test_switch_and_try() {
        assert_eq!(
            reprint("switch (x) { case 1: a(); break; default: b(); }"),
            "switch (x) {\n  case 1:\n    a();\n    break;\n  default:\n    b();\n}\n"
        );
        assert_eq!(
            reprint("try { a(); } catch (e) { b(e); } finally { c(); }"),
            "try {\n  a();\n} catch (e) {\n  b(e);\n} finally {\n  c();\n}\n"
        );
    }

    #[test]
    fn test_for_heads() {
        assert_eq!(reprint("for (var i = 0; i < n; i++) {}"), "for (var i = 0; i < n; i++) {}\n");
        assert_eq!(reprint("for (const k in o) {}"), "for (const k in o) {}\n");
        assert_eq!(reprint("for (;;) {}"), "for (;;) {}\n");
    }

    #[test]
    fn test_classes() {
        let printed = reprint("class A extends B { static x = 1; get y() { return 2; } m() {} }");
        assert!(printed.starts_with("class A extends B {"), "{}", printed);
        assert!(printed.contains("static x = 1;"), "{}", printed);
        assert!(printed.contains("get y() {"), "{}", printed);
        assert!(printed.contains("m() {}"), "{}", printed);
    }

    #[test]
    fn test_reprint_is_stable() {
        assert_stable("const { a, b: [c, d = 2] } = obj; label: for (;;) { break label; }");
        assert_stable("x = a?.b?.[c]?.(d); y = `t${x}u`; z = /re/g.test(s); w = 10n;");
        assert_stable("export default function () { return new.target; }");
    }
}
