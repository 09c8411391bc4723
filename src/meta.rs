//! Leap and side-effect analysis
//!
//! `contains_leap` answers whether control can leave a subtree non-locally
//! (suspension, break, continue, return, throw). `has_side_effects` answers
//! whether evaluating a subtree can be observed. Both stop at nested function
//! boundaries and are memoized per node for the lifetime of one run.
//!
//! The memo is never invalidated. Query a subtree before rewriting it.

use rustc_hash::FxHashMap;

use crate::ast::{Ast, NodeId, NodeKind};

#[derive(Debug, Clone, Copy)]
enum Property {
    Leap,
    SideEffects,
}

#[derive(Debug, Default)]
pub struct Meta {
    leap: FxHashMap<NodeId, bool>,
    effects: FxHashMap<NodeId, bool>,
}

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_leap(&mut self, ast: &Ast, id: NodeId) -> bool {
        self.compute(ast, id, Property::Leap)
    }

    pub fn has_side_effects(&mut self, ast: &Ast, id: NodeId) -> bool {
        self.compute(ast, id, Property::SideEffects)
    }

    fn memo(&mut self, property: Property) -> &mut FxHashMap<NodeId, bool> {
        match property {
            Property::Leap => &mut self.leap,
            Property::SideEffects => &mut self.effects,
        }
    }

    fn compute(&mut self, ast: &Ast, id: NodeId, property: Property) -> bool {
        if let Some(known) = self.memo(property).get(&id) {
            return *known;
        }
        let result = match classify(ast.kind(id), property) {
            Some(fixed) => fixed,
            None => ast
                .children(id)
                .into_iter()
                .any(|(_, child)| self.compute(ast, child, property)),
        };
        self.memo(property).insert(id, result);
        result
    }
}

/// The answer a node's kind forces regardless of its children, if any.
fn classify(kind: &NodeKind, property: Property) -> Option<bool> {
    // Suspension inside a nested function belongs to that function.
    if matches!(kind, NodeKind::Function(_)) {
        return Some(false);
    }
    let forced = match property {
        Property::Leap => matches!(
            kind,
            NodeKind::Yield { .. }
                | NodeKind::Await { .. }
                | NodeKind::Break { .. }
                | NodeKind::Continue { .. }
                | NodeKind::Return { .. }
                | NodeKind::Throw { .. }
        ),
        Property::SideEffects => matches!(
            kind,
            NodeKind::Call { .. }
                | NodeKind::New { .. }
                | NodeKind::Assignment { .. }
                | NodeKind::Update { .. }
                | NodeKind::Unary { .. }
                | NodeKind::Binary { .. }
                | NodeKind::ForIn { .. }
                | NodeKind::ForOf { .. }
                | NodeKind::TaggedTemplate { .. }
                | NodeKind::Raw { .. }
        ),
    };
    forced.then_some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Function, FunctionFlavor};

    fn yield_of(ast: &mut Ast, argument: Option<NodeId>) -> NodeId {
        ast.alloc(NodeKind::Yield { argument, delegate: false })
    }

    #[test]
    fn test_leap_propagates_through_plain_nodes() {
        let mut ast = Ast::new();
        let one = ast.num(1.0);
        let y = yield_of(&mut ast, Some(one));
        let x = ast.ident("x");
        let assign = ast.assign(x, y);
        let stmt = ast.expr_stmt(assign);
        let block = ast.block(vec![stmt]);

        let mut meta = Meta::new();
        assert!(meta.contains_leap(&ast, block));
        assert!(!meta.contains_leap(&ast, x));
        assert!(meta.has_side_effects(&ast, block));
    }

    #[test]
    fn test_nested_functions_are_opaque() {
        let mut ast = Ast::new();
        let y = yield_of(&mut ast, None);
        let stmt = ast.expr_stmt(y);
        let body = ast.block(vec![stmt]);
        let inner = ast.alloc(NodeKind::Function(Function {
            id: None,
            params: vec![],
            body,
            flavor: FunctionFlavor::Expression,
            generator: true,
            is_async: false,
            directives: vec![],
        }));
        let wrapper = ast.expr_stmt(inner);

        let mut meta = Meta::new();
        assert!(!meta.contains_leap(&ast, wrapper));
        assert!(!meta.has_side_effects(&ast, wrapper));
        assert!(meta.contains_leap(&ast, body));
    }

    #[test]
    fn test_memo_is_not_invalidated_by_mutation() {
        let mut ast = Ast::new();
        let y = yield_of(&mut ast, None);
        let stmt = ast.expr_stmt(y);

        let mut meta = Meta::new();
        assert!(meta.contains_leap(&ast, stmt));
        let plain = ast.ident("plain");
        ast.set_child(stmt, crate::ast::Slot::field("expression"), plain);
        assert!(meta.contains_leap(&ast, stmt));
        assert!(!meta.contains_leap(&ast, plain));
    }

    #[test]
    fn test_member_reads_are_pure() {
        let mut ast = Ast::new();
        let member = ast.path("a", "b");
        let mut meta = Meta::new();
        assert!(!meta.has_side_effects(&ast, member));
        let f = ast.ident("f");
        let call = ast.call(f, vec![member]);
        assert!(meta.has_side_effects(&ast, call));
    }
}
