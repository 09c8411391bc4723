use crate::ast::{Ast, NodeId, NodeKind, Slot};

/// What the walker does after a visitor has seen a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Skip,
}

/// The state a visitor sees for the node it is visiting: the arena, the full
/// ancestor chain, and the slot path from the root down to the node.
pub struct VisitContext<'a> {
    pub ast: &'a mut Ast,
    ancestors: &'a [NodeId],
    path: &'a [Slot],
    replaced: Option<NodeId>,
}

impl<'a> VisitContext<'a> {
    pub fn ancestors(&self) -> &[NodeId] {
        self.ancestors
    }

    pub fn path(&self) -> &[Slot] {
        self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.ancestors.last().copied()
    }

    pub fn slot(&self) -> Option<Slot> {
        self.path.last().copied()
    }

    /// Swaps the visited node for `replacement` in its parent slot. The walker
    /// then descends into the replacement's children instead of the original's.
    pub fn replace(&mut self, replacement: NodeId) -> bool {
        let (Some(parent), Some(slot)) = (self.parent(), self.slot()) else {
            return false;
        };
        if self.ast.set_child(parent, slot, replacement) {
            self.replaced = Some(replacement);
            true
        } else {
            false
        }
    }

    /// True when the visited identifier sits in a reference position rather than
    /// naming a property or key.
    pub fn is_reference(&self) -> bool {
        let (Some(parent), Some(slot)) = (self.parent(), self.slot()) else {
            return true;
        };
        match self.ast.kind(parent) {
            NodeKind::Member { computed, .. } => *computed || slot.field != "property",
            NodeKind::Property { computed, .. }
            | NodeKind::Method { computed, .. }
            | NodeKind::PropertyDefinition { computed, .. } => *computed || slot.field != "key",
            _ => true,
        }
    }
}

/// Depth-first, pre-order visitor over the arena.
///
/// Rules:
/// 1. `visit_node` runs first for every node and, by default, dispatches to the
///    per-kind hook through [`dispatch`].
/// 2. Returning [`Flow::Skip`] suppresses descent into that node's children.
/// 3. Children are snapshotted before descent, so a visitor may rewrite the
///    node it is visiting through [`VisitContext::replace`].
pub trait Visitor {
    fn visit_node(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
        dispatch(self, ctx, id)
    }

    fn visit_identifier(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Continue
    }

    fn visit_function(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Continue
    }

    fn visit_class(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Continue
    }

    fn visit_variable_declaration(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Continue
    }

    fn visit_catch_clause(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Continue
    }

    fn visit_await(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Continue
    }

    fn visit_yield(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Continue
    }

    fn visit_loop(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Continue
    }

    fn visit_statement(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Continue
    }

    fn visit_expression(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
        Flow::Continue
    }
}

#[derive(Clone, Copy)]
enum Hook {
    Identifier,
    Function,
    Class,
    VariableDeclaration,
    CatchClause,
    Await,
    Yield,
    Loop,
    Statement,
    Expression,
}

fn hook_of(kind: &NodeKind) -> Hook {
    match kind {
        NodeKind::Identifier { .. } => Hook::Identifier,
        NodeKind::Function(_) => Hook::Function,
        NodeKind::Class { .. } => Hook::Class,
        NodeKind::VariableDeclaration { .. } => Hook::VariableDeclaration,
        NodeKind::CatchClause { .. } => Hook::CatchClause,
        NodeKind::Await { .. } => Hook::Await,
        NodeKind::Yield { .. } => Hook::Yield,
        NodeKind::While { .. }
        | NodeKind::DoWhile { .. }
        | NodeKind::For { .. }
        | NodeKind::ForIn { .. }
        | NodeKind::ForOf { .. } => Hook::Loop,
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
        | NodeKind::SwitchCase { .. }
        | NodeKind::Return { .. }
        | NodeKind::Throw { .. }
        | NodeKind::Try { .. }
        | NodeKind::VariableDeclarator { .. }
        | NodeKind::ExportNamed { .. }
        | NodeKind::ExportDefault { .. }
        | NodeKind::Raw { .. } => Hook::Statement,
        NodeKind::Method { .. }
        | NodeKind::PropertyDefinition { .. }
        | NodeKind::Literal(_)
        | NodeKind::Template { .. }
        | NodeKind::TaggedTemplate { .. }
        | NodeKind::This
        | NodeKind::Super
        | NodeKind::Array { .. }
        | NodeKind::Object { .. }
        | NodeKind::Property { .. }
        | NodeKind::Spread { .. }
        | NodeKind::Unary { .. }
        | NodeKind::Update { .. }
        | NodeKind::Binary { .. }
        | NodeKind::Logical { .. }
        | NodeKind::Assignment { .. }
        | NodeKind::Conditional { .. }
        | NodeKind::Call { .. }
        | NodeKind::New { .. }
        | NodeKind::Member { .. }
        | NodeKind::Sequence { .. }
        | NodeKind::MetaProperty { .. }
        | NodeKind::ArrayPattern { .. }
        | NodeKind::ObjectPattern { .. }
        | NodeKind::AssignmentPattern { .. }
        | NodeKind::RestElement { .. } => Hook::Expression,
    }
}

/// Routes a node to its per-kind hook.
pub fn dispatch<V: Visitor + ?Sized>(visitor: &mut V, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
    match hook_of(ctx.ast.kind(id)) {
        Hook::Identifier => visitor.visit_identifier(ctx, id),
        Hook::Function => visitor.visit_function(ctx, id),
        Hook::Class => visitor.visit_class(ctx, id),
        Hook::VariableDeclaration => visitor.visit_variable_declaration(ctx, id),
        Hook::CatchClause => visitor.visit_catch_clause(ctx, id),
        Hook::Await => visitor.visit_await(ctx, id),
        Hook::Yield => visitor.visit_yield(ctx, id),
        Hook::Loop => visitor.visit_loop(ctx, id),
        Hook::Statement => visitor.visit_statement(ctx, id),
        Hook::Expression => visitor.visit_expression(ctx, id),
    }
}

pub fn walk<V: Visitor + ?Sized>(ast: &mut Ast, root: NodeId, visitor: &mut V) {
    let mut ancestors = Vec::new();
    let mut path = Vec::new();
    walk_node(ast, root, visitor, &mut ancestors, &mut path);
}

fn walk_node<V: Visitor + ?Sized>(
    ast: &mut Ast,
    id: NodeId,
    visitor: &mut V,
    ancestors: &mut Vec<NodeId>,
    path: &mut Vec<Slot>,
) {
    let (flow, current) = {
        let mut ctx = VisitContext {
            ast: &mut *ast,
            ancestors: ancestors.as_slice(),
            path: path.as_slice(),
            replaced: None,
        };
        let flow = visitor.visit_node(&mut ctx, id);
        (flow, ctx.replaced.unwrap_or(id))
    };
    if flow == Flow::Skip {
        return;
    }

    let children = ast.children(current);
    ancestors.push(current);
    for (slot, child) in children {
        path.push(slot);
        walk_node(ast, child, visitor, ancestors, path);
        path.pop();
    }
    ancestors.pop();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collector {
        names: Vec<String>,
        depths: Vec<usize>,
    }

    impl Visitor for Collector {
        fn visit_identifier(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
            if let Some(name) = ctx.ast.identifier_name(id) {
                self.names.push(name.to_string());
                self.depths.push(ctx.ancestors().len());
            }
            Flow::Continue
        }

        fn visit_function(&mut self, _ctx: &mut VisitContext<'_>, _id: NodeId) -> Flow {
            Flow::Skip
        }
    }

    struct Renamer;

    impl Visitor for Renamer {
        fn visit_identifier(&mut self, ctx: &mut VisitContext<'_>, id: NodeId) -> Flow {
            if ctx.ast.identifier_name(id) == Some("old") && ctx.is_reference() {
                let fresh = ctx.ast.ident("fresh");
                ctx.replace(fresh);
            }
            Flow::Continue
        }
    }

    #[test]
    fn test_walk_visits_in_order_and_skips_functions() {
        let mut ast = Ast::new();
        let a = ast.ident("a");
        let b = ast.ident("b");
        let inner = ast.ident("inner");
        let ret = ast.ret(Some(inner));
        let body = ast.block(vec![ret]);
        let func = ast.alloc(NodeKind::Function(crate::ast::Function {
            id: None,
            params: vec![],
            body,
            flavor: crate::ast::FunctionFlavor::Expression,
            generator: false,
            is_async: false,
            directives: vec![],
        }));
        let call = ast.call(a, vec![b, func]);
        let stmt = ast.expr_stmt(call);

        let mut collector = Collector { names: vec![], depths: vec![] };
        walk(&mut ast, stmt, &mut collector);
        assert_eq!(collector.names, vec!["a", "b"]);
        assert_eq!(collector.depths, vec![2, 2]);
    }

    #[test]
    fn test_replace_rewrites_references_only() {
        let mut ast = Ast::new();
        let object = ast.ident("old");
        let member = ast.member(object, "old");
        let stmt = ast.expr_stmt(member);
        walk(&mut ast, stmt, &mut Renamer);

        let NodeKind::Member { object, property, .. } = ast.kind(member).clone() else {
            panic!("member expected");
        };
        assert_eq!(ast.identifier_name(object), Some("fresh"));
        assert_eq!(ast.identifier_name(property), Some("old"));
    }

    #[test]
    fn test_root_cannot_be_replaced() {
        let mut ast = Ast::new();
        let root = ast.ident("old");
        walk(&mut ast, root, &mut Renamer);
        assert_eq!(ast.identifier_name(root), Some("old"));
    }
}
