//! Dispatch-loop emission
//!
//! The emitter flattens the body of a resumable function into a listing of
//! plain statements. Offsets of the listing that control can jump to are
//! "marked"; each marked offset becomes one `case` of the dispatch switch:
//!
//! ```text
//! while (true) {
//!   switch (context.prev = context.next) {
//!     case 0: ...
//!     case 3: ...
//!     case 7:
//!     case "end": return context.stop();
//!   }
//! }
//! ```
//!
//! Statements and expressions without leaps are copied into the listing as
//! they are. Everything else is exploded: loops and conditionals become
//! conditional jumps between locations, suspension points become a `return`
//! out of the dispatch function with `context.next` pointing at the resumption
//! offset, and values computed before a suspension are parked in `context.tN`
//! temporaries so evaluation order survives the round trip.
//!
//! Locations ([`Loc`]) are handed out before their offset is known. Every use
//! of a location in generated code is a placeholder literal patched in
//! [`Emitter::finish`], at which point every issued location must be bound.

use std::collections::BTreeSet;

use oxc_syntax::operator::{AssignmentOperator, BinaryOperator, LogicalOperator, UnaryOperator};
use tracing::trace;

use crate::ast::{Ast, Literal, NodeId, NodeKind};
use crate::leap::{with_entry, CatchEntry, Entry, FinallyEntry, HasLeapManager, LeapManager, Loc};
use crate::meta::Meta;
use crate::scope::{replace_free_references, ScopeMap};
use crate::validate::TransformError;

type Result<T> = std::result::Result<T, TransformError>;

/// A compiler-issued temporary slot, `context.tN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temp(usize);

impl Temp {
    pub fn name(self) -> String {
        format!("t{}", self.0)
    }
}

/// Abrupt completion handed to the runtime's `abrupt` entry point.
#[derive(Debug, Clone, Copy)]
pub enum Completion {
    Break(Loc),
    Continue(Loc),
    Return(Option<NodeId>),
}

#[derive(Debug, Clone, Copy)]
struct TryRecord {
    first: Loc,
    catch: Option<Loc>,
    finally: Option<Loc>,
    after: Loc,
}

/// Output of one emitter run.
#[derive(Debug)]
pub struct Emission {
    /// `while (true) { switch (...) { ... } }`
    pub dispatch: NodeId,
    /// `[[try, catch, finally, after], ...]`, or `None` without try statements.
    pub try_locs: Option<NodeId>,
    /// Flat statement listing the cases were cut from.
    pub listing: Vec<NodeId>,
    /// Marked offsets in ascending order.
    pub marks: Vec<usize>,
    pub temps: usize,
}

pub struct Emitter<'a> {
    ast: &'a mut Ast,
    meta: &'a mut Meta,
    scopes: &'a ScopeMap,
    context: String,
    runtime: String,
    listing: Vec<NodeId>,
    marked: BTreeSet<usize>,
    locs: Vec<Option<usize>>,
    loc_refs: Vec<(NodeId, Loc)>,
    leaps: LeapManager,
    tries: Vec<TryRecord>,
    temps: usize,
    final_loc: Loc,
}

impl HasLeapManager for Emitter<'_> {
    fn leap_manager(&mut self) -> &mut LeapManager {
        &mut self.leaps
    }
}

impl<'a> Emitter<'a> {
    pub fn new(
        ast: &'a mut Ast,
        meta: &'a mut Meta,
        scopes: &'a ScopeMap,
        context: &str,
        runtime: &str,
    ) -> Self {
        let final_loc = Loc(0);
        let mut marked = BTreeSet::new();
        marked.insert(0);
        Emitter {
            ast,
            meta,
            scopes,
            context: context.to_string(),
            runtime: runtime.to_string(),
            listing: Vec::new(),
            marked,
            locs: vec![None],
            loc_refs: Vec::new(),
            leaps: LeapManager::new(final_loc),
            tries: Vec::new(),
            temps: 0,
            final_loc,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOCATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn loc(&mut self) -> Loc {
        self.locs.push(None);
        Loc((self.locs.len() - 1) as u32)
    }

    /// Placeholder literal for `loc`, patched once emission finishes.
    fn loc_ref(&mut self, loc: Loc) -> NodeId {
        let node = self.ast.num(-1.0);
        self.loc_refs.push((node, loc));
        node
    }

    fn bind(&mut self, loc: Loc, offset: usize) -> Result<()> {
        let slot = self
            .locs
            .get_mut(loc.index())
            .ok_or_else(|| TransformError::Location(format!("location #{} was not issued here", loc.0)))?;
        match *slot {
            None => *slot = Some(offset),
            Some(bound) if bound == offset => {}
            Some(bound) => {
                return Err(TransformError::Location(format!(
                    "location #{} is bound to {} and cannot move to {}",
                    loc.0, bound, offset
                )))
            }
        }
        Ok(())
    }

    /// Binds `loc` to the current end of the listing and makes it a case label.
    pub fn mark(&mut self, loc: Loc) -> Result<Loc> {
        let offset = self.listing.len();
        self.bind(loc, offset)?;
        self.marked.insert(offset);
        trace!(loc = loc.0, offset, "marked location");
        Ok(loc)
    }

    /// A location bound to the current offset without becoming a case label.
    pub fn get_unmarked_current_loc(&mut self) -> Result<Loc> {
        let loc = self.loc();
        self.bind(loc, self.listing.len())?;
        Ok(loc)
    }

    /// Records `loc` as the offset of the statements that follow, for the
    /// runtime's try table.
    fn update_context_prev_loc(&mut self, loc: Loc) -> Result<()> {
        self.bind(loc, self.listing.len())?;
        let prev = self.context_property("prev");
        let value = self.loc_ref(loc);
        self.emit_assign(prev, value);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LISTING PRIMITIVES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn emit(&mut self, stmt: NodeId) {
        let stmt = if self.ast.is_statement(stmt) { stmt } else { self.ast.expr_stmt(stmt) };
        self.listing.push(stmt);
    }

    fn context_property(&mut self, name: &str) -> NodeId {
        self.ast.path(&self.context, name)
    }

    fn runtime_property(&mut self, name: &str) -> NodeId {
        self.ast.path(&self.runtime, name)
    }

    pub fn make_temp_var(&mut self) -> Temp {
        let temp = Temp(self.temps);
        self.temps += 1;
        temp
    }

    fn temp_node(&mut self, temp: Temp) -> NodeId {
        self.context_property(&temp.name())
    }

    fn emit_assign(&mut self, left: NodeId, right: NodeId) {
        let assign = self.ast.assign(left, right);
        self.emit(assign);
    }

    /// Emits `context.tN = value;` and returns a fresh reference to the temp.
    fn assign_temp(&mut self, temp: Temp, value: NodeId) -> NodeId {
        let target = self.temp_node(temp);
        self.emit_assign(target, value);
        self.temp_node(temp)
    }

    fn jump_body(&mut self, target: NodeId) -> NodeId {
        let next = self.context_property("next");
        let assign = self.ast.assign(next, target);
        let assign = self.ast.expr_stmt(assign);
        let brk = self.ast.alloc(NodeKind::Break { label: None });
        self.ast.block(vec![assign, brk])
    }

    pub fn jump(&mut self, loc: Loc) {
        let target = self.loc_ref(loc);
        self.jump_to(target);
    }

    fn jump_to(&mut self, target: NodeId) {
        let next = self.context_property("next");
        self.emit_assign(next, target);
        let brk = self.ast.alloc(NodeKind::Break { label: None });
        self.emit(brk);
    }

    pub fn jump_if(&mut self, test: NodeId, loc: Loc) {
        let target = self.loc_ref(loc);
        let consequent = self.jump_body(target);
        let stmt = self.ast.alloc(NodeKind::If { test, consequent, alternate: None });
        self.emit(stmt);
    }

    pub fn jump_if_not(&mut self, test: NodeId, loc: Loc) {
        let negated = match self.ast.kind(test) {
            NodeKind::Unary { operator: UnaryOperator::LogicalNot, argument } => *argument,
            _ => self.ast.not(test),
        };
        self.jump_if(negated, loc);
    }

    pub fn emit_abrupt_completion(&mut self, completion: Completion) -> Result<()> {
        let mut arguments = Vec::new();
        match completion {
            Completion::Break(target) | Completion::Continue(target) => {
                if target.index() >= self.locs.len() {
                    return Err(TransformError::CompletionRecord(format!(
                        "jump target #{} was not issued by this emitter",
                        target.0
                    )));
                }
                let kind = if matches!(completion, Completion::Break(_)) { "break" } else { "continue" };
                arguments.push(self.ast.string(kind));
                arguments.push(self.loc_ref(target));
            }
            Completion::Return(value) => {
                arguments.push(self.ast.string("return"));
                arguments.extend(value);
            }
        }
        let abrupt = self.context_property("abrupt");
        let call = self.ast.call(abrupt, arguments);
        let stmt = self.ast.ret(Some(call));
        self.emit(stmt);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATEMENTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Explodes one statement into the listing. `labels` are the labels of
    /// the labeled statements this one is directly the body of.
    pub fn explode_statement(&mut self, stmt: NodeId, labels: Vec<String>) -> Result<()> {
        let at = self.ast.span(stmt).start;

        if let NodeKind::Block { body } = self.ast.kind(stmt) {
            for child in body.clone() {
                self.explode_statement(child, Vec::new())?;
            }
            return Ok(());
        }
        if self.ast.is_declaration(stmt) {
            return Err(TransformError::UnhoistedDeclaration { at });
        }
        if !self.meta.contains_leap(self.ast, stmt) {
            self.listing.push(stmt);
            return Ok(());
        }

        match self.ast.kind(stmt).clone() {
            NodeKind::Expression { expression } => {
                self.explode_expression(expression, true)?;
            }

            NodeKind::Labeled { label, body } => {
                let after = self.loc();
                let entry = Entry::Labeled { break_loc: after, label: label.clone() };
                let mut labels = labels;
                labels.push(label);
                with_entry(self, entry, |em| em.explode_statement(body, labels))?;
                self.mark(after)?;
            }

            NodeKind::While { test, body } => {
                let before = self.loc();
                let after = self.loc();
                self.mark(before)?;
                let test = self.explode_value(test)?;
                self.jump_if_not(test, after);
                let entry = Entry::Loop { break_loc: after, continue_loc: before, labels };
                with_entry(self, entry, |em| em.explode_statement(body, Vec::new()))?;
                self.jump(before);
                self.mark(after)?;
            }

            NodeKind::DoWhile { body, test } => {
                let first = self.loc();
                let test_loc = self.loc();
                let after = self.loc();
                self.mark(first)?;
                let entry = Entry::Loop { break_loc: after, continue_loc: test_loc, labels };
                with_entry(self, entry, |em| em.explode_statement(body, Vec::new()))?;
                self.mark(test_loc)?;
                let test = self.explode_value(test)?;
                self.jump_if(test, first);
                self.mark(after)?;
            }

            NodeKind::For { init, test, update, body } => {
                let head = self.loc();
                let update_loc = self.loc();
                let after = self.loc();
                if let Some(init) = init {
                    if self.ast.is_declaration(init) {
                        return Err(TransformError::UnhoistedDeclaration { at });
                    }
                    self.explode_expression(init, true)?;
                }
                self.mark(head)?;
                if let Some(test) = test {
                    let test = self.explode_value(test)?;
                    self.jump_if_not(test, after);
                }
                let entry = Entry::Loop { break_loc: after, continue_loc: update_loc, labels };
                with_entry(self, entry, |em| em.explode_statement(body, Vec::new()))?;
                self.mark(update_loc)?;
                if let Some(update) = update {
                    self.explode_expression(update, true)?;
                }
                self.jump(head);
                self.mark(after)?;
            }

            NodeKind::ForIn { left, right, body } => {
                self.explode_enumeration(left, right, body, labels, false, at)?;
            }

            NodeKind::ForOf { left, right, body, is_await } => {
                if is_await {
                    return Err(TransformError::unsupported("`for await` loop", at));
                }
                self.explode_enumeration(left, right, body, labels, true, at)?;
            }

            NodeKind::Break { label } => {
                let target = self.leaps.break_loc(label.as_deref()).ok_or_else(|| {
                    TransformError::UnresolvedJump {
                        keyword: "break",
                        target: jump_target(label.as_deref(), "loop or switch"),
                        at,
                    }
                })?;
                self.emit_abrupt_completion(Completion::Break(target))?;
            }

            NodeKind::Continue { label } => {
                let target = self.leaps.continue_loc(label.as_deref()).ok_or_else(|| {
                    TransformError::UnresolvedJump {
                        keyword: "continue",
                        target: jump_target(label.as_deref(), "loop"),
                        at,
                    }
                })?;
                self.emit_abrupt_completion(Completion::Continue(target))?;
            }

            NodeKind::Return { argument } => {
                let value = match argument {
                    Some(argument) => Some(self.explode_value(argument)?),
                    None => None,
                };
                self.emit_abrupt_completion(Completion::Return(value))?;
            }

            NodeKind::Throw { argument } => {
                let argument = self.explode_value(argument)?;
                let span = self.ast.span(stmt);
                let throw = self.ast.alloc_at(NodeKind::Throw { argument }, span);
                self.emit(throw);
            }

            NodeKind::If { test, consequent, alternate } => {
                let else_loc = alternate.map(|_| self.loc());
                let after = self.loc();
                let test = self.explode_value(test)?;
                self.jump_if_not(test, else_loc.unwrap_or(after));
                self.explode_statement(consequent, Vec::new())?;
                if let (Some(else_loc), Some(alternate)) = (else_loc, alternate) {
                    self.jump(after);
                    self.mark(else_loc)?;
                    self.explode_statement(alternate, Vec::new())?;
                }
                self.mark(after)?;
            }

            NodeKind::Switch { discriminant, cases } => self.explode_switch(discriminant, cases)?,

            NodeKind::Try { block, handler, finalizer } => self.explode_try(block, handler, finalizer)?,

            NodeKind::With { .. } => return Err(TransformError::WithStatement { at }),

            NodeKind::Empty | NodeKind::Debugger => self.emit(stmt),

            _ => return Err(TransformError::unsupported("statement kind in a resumable body", at)),
        }
        Ok(())
    }

    /// `for-in` steps `runtime.keys(obj)` by calling it; `for-of` steps
    /// `runtime.values(obj)` through `.next()`.
    fn explode_enumeration(
        &mut self,
        left: NodeId,
        right: NodeId,
        body: NodeId,
        labels: Vec<String>,
        values: bool,
        at: u32,
    ) -> Result<()> {
        if self.ast.is_declaration(left) {
            return Err(TransformError::UnhoistedDeclaration { at });
        }
        let head = self.loc();
        let after = self.loc();

        let iterator = self.make_temp_var();
        let right = self.explode_value(right)?;
        let source = self.runtime_property(if values { "values" } else { "keys" });
        let call = self.ast.call(source, vec![right]);
        self.assign_temp(iterator, call);

        self.mark(head)?;
        let step = self.make_temp_var();
        let step_target = self.temp_node(step);
        let iterator_ref = self.temp_node(iterator);
        let advance = if values { self.ast.member(iterator_ref, "next") } else { iterator_ref };
        let advance = self.ast.call(advance, vec![]);
        let stepped = self.ast.assign(step_target, advance);
        let done = self.ast.member(stepped, "done");
        self.jump_if(done, after);

        let step_ref = self.temp_node(step);
        let value = self.ast.member(step_ref, "value");
        self.emit_assign(left, value);

        let entry = Entry::Loop { break_loc: after, continue_loc: head, labels };
        with_entry(self, entry, |em| em.explode_statement(body, Vec::new()))?;
        self.jump(head);
        self.mark(after)?;
        Ok(())
    }

    fn explode_switch(&mut self, discriminant: NodeId, cases: Vec<NodeId>) -> Result<()> {
        let disc = self.make_temp_var();
        let value = self.explode_value(discriminant)?;
        self.assign_temp(disc, value);

        let after = self.loc();
        let default_loc = self.loc();
        let mut case_locs = vec![default_loc; cases.len()];
        let mut condition = self.loc_ref(default_loc);
        for (i, case) in cases.iter().enumerate().rev() {
            let NodeKind::SwitchCase { test: Some(test), .. } = *self.ast.kind(*case) else {
                continue;
            };
            let loc = self.loc();
            case_locs[i] = loc;
            let disc_ref = self.temp_node(disc);
            let matches = self.ast.binary(BinaryOperator::StrictEquality, disc_ref, test);
            let consequent = self.loc_ref(loc);
            condition = self.ast.alloc(NodeKind::Conditional { test: matches, consequent, alternate: condition });
        }
        let target = self.explode_value(condition)?;
        self.jump_to(target);

        with_entry(self, Entry::Switch { break_loc: after }, |em| {
            for (case, loc) in cases.iter().zip(case_locs.iter()) {
                em.mark(*loc)?;
                let consequent = match em.ast.kind(*case) {
                    NodeKind::SwitchCase { consequent, .. } => consequent.clone(),
                    _ => Vec::new(),
                };
                for stmt in consequent {
                    em.explode_statement(stmt, Vec::new())?;
                }
            }
            Ok(())
        })?;

        self.mark(after)?;
        if self.locs[default_loc.index()].is_none() {
            self.mark(default_loc)?;
        }
        Ok(())
    }

    fn explode_try(&mut self, block: NodeId, handler: Option<NodeId>, finalizer: Option<NodeId>) -> Result<()> {
        let after = self.loc();

        let catch = match handler {
            Some(handler) => {
                let NodeKind::CatchClause { param, body } = *self.ast.kind(handler) else {
                    return Err(TransformError::unsupported("malformed catch clause", self.ast.span(handler).start));
                };
                let name = match param {
                    Some(param) => Some(self.ast.identifier_name(param).map(str::to_string).ok_or_else(|| {
                        TransformError::unsupported("unhoisted destructuring catch parameter", self.ast.span(param).start)
                    })?),
                    None => None,
                };
                Some((CatchEntry { first_loc: self.loc(), param: name }, body))
            }
            None => None,
        };
        let finally = match finalizer {
            Some(finalizer) => Some((FinallyEntry { first_loc: self.loc(), after_loc: after }, finalizer)),
            None => None,
        };

        let first = self.get_unmarked_current_loc()?;
        self.tries.push(TryRecord {
            first,
            catch: catch.as_ref().map(|(entry, _)| entry.first_loc),
            finally: finally.as_ref().map(|(entry, _)| entry.first_loc),
            after,
        });
        self.update_context_prev_loc(first)?;

        let entry = Entry::Try {
            first_loc: first,
            catch: catch.as_ref().map(|(entry, _)| entry.clone()),
            finally: finally.as_ref().map(|(entry, _)| entry.clone()),
        };
        with_entry(self, entry, |em| {
            em.explode_statement(block, Vec::new())?;

            if let Some((catch_entry, body)) = catch {
                em.jump(finally.as_ref().map(|(entry, _)| entry.first_loc).unwrap_or(after));
                em.mark(catch_entry.first_loc)?;
                em.update_context_prev_loc(catch_entry.first_loc)?;

                let catch_fn = em.context_property("catch");
                let first_ref = em.loc_ref(first);
                let caught = em.ast.call(catch_fn, vec![first_ref]);
                match &catch_entry.param {
                    Some(name) => {
                        let temp = em.make_temp_var();
                        em.assign_temp(temp, caught);
                        let context = em.context.clone();
                        let slot = temp.name();
                        replace_free_references(em.ast, em.scopes, body, name, |ast| ast.path(&context, &slot));
                    }
                    None => em.emit(caught),
                }
                with_entry(em, Entry::Catch(catch_entry), |em| em.explode_statement(body, Vec::new()))?;
            }

            if let Some((finally_entry, finalizer)) = finally {
                let first_loc = finally_entry.first_loc;
                em.mark(first_loc)?;
                em.update_context_prev_loc(first_loc)?;
                with_entry(em, Entry::Finally(finally_entry), |em| em.explode_statement(finalizer, Vec::new()))?;
                let finish = em.context_property("finish");
                let loc = em.loc_ref(first_loc);
                let call = em.ast.call(finish, vec![loc]);
                let ret = em.ast.ret(Some(call));
                em.emit(ret);
            }
            Ok(())
        })?;

        self.mark(after)?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPRESSIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Explodes `expr`, emitting whatever must run before its value is
    /// available. Returns the expression yielding that value, or `None` when
    /// `ignore_result` is set.
    pub fn explode_expression(&mut self, expr: NodeId, ignore_result: bool) -> Result<Option<NodeId>> {
        if !self.meta.contains_leap(self.ast, expr) {
            return Ok(self.finish_expression(expr, ignore_result));
        }
        let at = self.ast.span(expr).start;
        let span = self.ast.span(expr);
        let children = self.ast.children(expr);
        let leaping = children.iter().any(|(_, child)| self.meta.contains_leap(self.ast, *child));

        match self.ast.kind(expr).clone() {
            NodeKind::Member { object, property, computed, optional } => {
                if optional {
                    return Err(TransformError::unsupported("optional chain around a suspension", at));
                }
                let object = self.saved(None, object, leaping)?;
                let property = if computed { self.saved(None, property, leaping)? } else { property };
                let member = self.ast.alloc_at(NodeKind::Member { object, property, computed, optional }, span);
                Ok(self.finish_expression(member, ignore_result))
            }

            NodeKind::Call { callee, arguments, optional } => {
                if optional {
                    return Err(TransformError::unsupported("optional call around a suspension", at));
                }
                let leaping_args = arguments.iter().any(|arg| self.meta.contains_leap(self.ast, *arg));
                let mut receiver = None;
                let callee = match self.ast.kind(callee).clone() {
                    NodeKind::Member { optional: true, .. } => {
                        return Err(TransformError::unsupported("optional chain around a suspension", at));
                    }
                    NodeKind::Member { object, .. } if matches!(self.ast.kind(object), NodeKind::Super) => {
                        if leaping_args {
                            return Err(TransformError::unsupported("`super` call with suspending arguments", at));
                        }
                        self.explode_value(callee)?
                    }
                    NodeKind::Member { object, property, computed, .. } if leaping_args => {
                        // Keep the receiver: `tA.m(...)` becomes `tA.m.call(tA, ...)`.
                        let temp = self.make_temp_var();
                        let object = self.saved(Some(temp), object, leaping)?;
                        let property = if computed { self.saved(None, property, leaping)? } else { property };
                        receiver = Some(temp);
                        let method = self.ast.alloc(NodeKind::Member { object, property, computed, optional: false });
                        self.ast.member(method, "call")
                    }
                    NodeKind::Member { .. } => self.explode_value(callee)?,
                    _ => {
                        let saved = self.saved(None, callee, leaping)?;
                        if matches!(self.ast.kind(saved), NodeKind::Member { .. }) {
                            // Drop the receiver a saved callee would otherwise pick up.
                            let zero = self.ast.num(0.0);
                            self.ast.sequence(vec![zero, saved])
                        } else {
                            saved
                        }
                    }
                };
                let arguments = if leaping_args {
                    let mut out = Vec::with_capacity(arguments.len() + 1);
                    if let Some(temp) = receiver {
                        out.push(self.temp_node(temp));
                    }
                    for argument in arguments {
                        out.push(self.saved_element(argument, leaping)?);
                    }
                    out
                } else {
                    arguments
                };
                let call = self.ast.alloc_at(NodeKind::Call { callee, arguments, optional: false }, span);
                Ok(self.finish_expression(call, ignore_result))
            }

            NodeKind::New { callee, arguments } => {
                let callee = self.saved(None, callee, leaping)?;
                let mut out = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    out.push(self.saved_element(argument, leaping)?);
                }
                let new = self.ast.alloc_at(NodeKind::New { callee, arguments: out }, span);
                Ok(self.finish_expression(new, ignore_result))
            }

            NodeKind::Object { properties } => {
                let mut out = Vec::with_capacity(properties.len());
                for property in properties {
                    out.push(self.saved_property(property, leaping, at)?);
                }
                let object = self.ast.alloc_at(NodeKind::Object { properties: out }, span);
                Ok(self.finish_expression(object, ignore_result))
            }

            NodeKind::Array { elements } => {
                let mut out = Vec::with_capacity(elements.len());
                for element in elements {
                    out.push(match element {
                        Some(element) => Some(self.saved_element(element, leaping)?),
                        None => None,
                    });
                }
                let array = self.ast.alloc_at(NodeKind::Array { elements: out }, span);
                Ok(self.finish_expression(array, ignore_result))
            }

            NodeKind::Template { quasis, expressions } => {
                let mut out = Vec::with_capacity(expressions.len());
                for expression in expressions {
                    out.push(self.saved(None, expression, leaping)?);
                }
                let template = self.ast.alloc_at(NodeKind::Template { quasis, expressions: out }, span);
                Ok(self.finish_expression(template, ignore_result))
            }

            NodeKind::Sequence { expressions } => {
                let last = expressions.len().saturating_sub(1);
                let mut result = None;
                for (i, expression) in expressions.into_iter().enumerate() {
                    if i == last {
                        result = self.explode_expression(expression, ignore_result)?;
                    } else {
                        self.explode_expression(expression, true)?;
                    }
                }
                Ok(result)
            }

            NodeKind::Logical { operator, left, right } => {
                let after = self.loc();
                let result = if ignore_result { None } else { Some(self.make_temp_var()) };
                let left = self.saved(result, left, leaping)?;
                self.jump_unless_short_circuit(operator, left, after);
                match result {
                    Some(temp) => {
                        self.saved(Some(temp), right, leaping)?;
                    }
                    None => {
                        self.explode_expression(right, true)?;
                    }
                }
                self.mark(after)?;
                Ok(result.map(|temp| self.temp_node(temp)))
            }

            NodeKind::Conditional { test, consequent, alternate } => {
                let else_loc = self.loc();
                let after = self.loc();
                let test = self.explode_value(test)?;
                self.jump_if_not(test, else_loc);
                let result = if ignore_result { None } else { Some(self.make_temp_var()) };
                self.branch(result, consequent, leaping)?;
                self.jump(after);
                self.mark(else_loc)?;
                self.branch(result, alternate, leaping)?;
                self.mark(after)?;
                Ok(result.map(|temp| self.temp_node(temp)))
            }

            NodeKind::Unary { operator, argument } => {
                let argument = self.explode_value(argument)?;
                let unary = self.ast.alloc_at(NodeKind::Unary { operator, argument }, span);
                Ok(self.finish_expression(unary, ignore_result))
            }

            NodeKind::Binary { operator, left, right } => {
                let left = self.saved(None, left, leaping)?;
                let right = self.saved(None, right, leaping)?;
                let binary = self.ast.alloc_at(NodeKind::Binary { operator, left, right }, span);
                Ok(self.finish_expression(binary, ignore_result))
            }

            NodeKind::Assignment { operator, left, right } => {
                self.explode_assignment(operator, left, right, leaping, ignore_result, span)
            }

            NodeKind::Update { operator, prefix, argument } => {
                let argument = self.explode_value(argument)?;
                let update = self.ast.alloc_at(NodeKind::Update { operator, prefix, argument }, span);
                Ok(self.finish_expression(update, ignore_result))
            }

            NodeKind::Yield { argument, delegate } => {
                let after = self.loc();
                let argument = match argument {
                    Some(argument) => Some(self.explode_value(argument)?),
                    None => None,
                };
                if delegate {
                    let argument = argument
                        .ok_or_else(|| TransformError::unsupported("`yield*` without an operand", at))?;
                    let result = self.make_temp_var();
                    let delegate_fn = self.context_property("delegateYield");
                    let slot = self.ast.string(result.name());
                    let resume = self.loc_ref(after);
                    let call = self.ast.call(delegate_fn, vec![argument, slot, resume]);
                    let ret = self.ast.alloc_at(NodeKind::Return { argument: Some(call) }, span);
                    self.emit(ret);
                    self.mark(after)?;
                    return Ok((!ignore_result).then(|| self.temp_node(result)));
                }
                let next = self.context_property("next");
                let resume = self.loc_ref(after);
                self.emit_assign(next, resume);
                let ret = self.ast.alloc_at(NodeKind::Return { argument }, span);
                self.emit(ret);
                self.mark(after)?;
                Ok((!ignore_result).then(|| self.context_property("sent")))
            }

            NodeKind::Await { .. } => Err(TransformError::unsupported("`await` outside an async function", at)),
            NodeKind::Class { .. } => Err(TransformError::unsupported("class expression containing a suspension", at)),
            NodeKind::TaggedTemplate { .. } => {
                Err(TransformError::unsupported("tagged template containing a suspension", at))
            }
            NodeKind::ArrayPattern { .. } | NodeKind::ObjectPattern { .. } | NodeKind::AssignmentPattern { .. } => {
                Err(TransformError::unsupported("destructuring default containing a suspension", at))
            }
            _ => Err(TransformError::unsupported("expression kind around a suspension", at)),
        }
    }

    fn finish_expression(&mut self, expr: NodeId, ignore_result: bool) -> Option<NodeId> {
        if !ignore_result {
            return Some(expr);
        }
        // Dropping a pure result is unobservable.
        if self.meta.has_side_effects(self.ast, expr) {
            self.emit(expr);
        }
        None
    }

    fn explode_value(&mut self, expr: NodeId) -> Result<NodeId> {
        let at = self.ast.span(expr).start;
        self.explode_expression(expr, false)?
            .ok_or_else(|| TransformError::unsupported("expression without a value", at))
    }

    /// Explodes `child` and parks the result in a temp when a later sibling
    /// could suspend, or always when `temp` is given.
    fn saved(&mut self, temp: Option<Temp>, child: NodeId, leaping: bool) -> Result<NodeId> {
        let value = self.explode_value(child)?;
        if temp.is_none() && !(leaping && !self.ast.is_literal(value)) {
            return Ok(value);
        }
        let temp = match temp {
            Some(temp) => temp,
            None => self.make_temp_var(),
        };
        Ok(self.assign_temp(temp, value))
    }

    /// Array elements and call arguments, where spreads wrap the saved value.
    fn saved_element(&mut self, element: NodeId, leaping: bool) -> Result<NodeId> {
        match *self.ast.kind(element) {
            NodeKind::Spread { argument } => {
                let span = self.ast.span(element);
                let argument = self.saved(None, argument, leaping)?;
                Ok(self.ast.alloc_at(NodeKind::Spread { argument }, span))
            }
            _ => self.saved(None, element, leaping),
        }
    }

    fn saved_property(&mut self, property: NodeId, leaping: bool, at: u32) -> Result<NodeId> {
        let span = self.ast.span(property);
        match self.ast.kind(property).clone() {
            NodeKind::Property { key, value, kind, computed, method: false, .. } => {
                let key = if computed { self.saved(None, key, leaping)? } else { key };
                let value = self.saved(None, value, leaping)?;
                Ok(self.ast.alloc_at(
                    NodeKind::Property { key, value, kind, computed, shorthand: false, method: false },
                    span,
                ))
            }
            NodeKind::Spread { .. } => self.saved_element(property, leaping),
            _ if self.meta.contains_leap(self.ast, property) => {
                Err(TransformError::unsupported("computed method key containing a suspension", at))
            }
            _ => Ok(property),
        }
    }

    fn branch(&mut self, result: Option<Temp>, expr: NodeId, leaping: bool) -> Result<()> {
        match result {
            Some(temp) => {
                self.saved(Some(temp), expr, leaping)?;
            }
            None => {
                self.explode_expression(expr, true)?;
            }
        }
        Ok(())
    }

    /// Jumps to `after` when `left` already decides a logical operator.
    fn jump_unless_short_circuit(&mut self, operator: LogicalOperator, left: NodeId, after: Loc) {
        match operator {
            LogicalOperator::And => self.jump_if_not(left, after),
            LogicalOperator::Or => self.jump_if(left, after),
            LogicalOperator::Coalesce => {
                let null = self.ast.null();
                let defined = self.ast.binary(BinaryOperator::Inequality, left, null);
                self.jump_if(defined, after);
            }
        }
    }

    /// An assignment target whose object and computed key are evaluated before
    /// the right-hand side runs.
    fn explode_target(&mut self, target: NodeId, leaping: bool) -> Result<NodeId> {
        let at = self.ast.span(target).start;
        let span = self.ast.span(target);
        match self.ast.kind(target).clone() {
            NodeKind::Member { optional: true, .. } => {
                Err(TransformError::unsupported("optional chain around a suspension", at))
            }
            NodeKind::Member { object, .. } if matches!(self.ast.kind(object), NodeKind::Super) => {
                self.explode_value(target)
            }
            NodeKind::Member { object, property, computed, .. } => {
                let object = self.saved(None, object, leaping)?;
                let property = if computed { self.saved(None, property, leaping)? } else { property };
                Ok(self.ast.alloc_at(NodeKind::Member { object, property, computed, optional: false }, span))
            }
            NodeKind::Identifier { .. } => Ok(target),
            _ if self.meta.contains_leap(self.ast, target) => {
                Err(TransformError::unsupported("destructuring default containing a suspension", at))
            }
            _ => Ok(target),
        }
    }

    fn explode_assignment(
        &mut self,
        operator: AssignmentOperator,
        left: NodeId,
        right: NodeId,
        leaping: bool,
        ignore_result: bool,
        span: oxc_span::Span,
    ) -> Result<Option<NodeId>> {
        let logical = match operator {
            AssignmentOperator::LogicalAnd => Some(LogicalOperator::And),
            AssignmentOperator::LogicalOr => Some(LogicalOperator::Or),
            AssignmentOperator::LogicalNullish => Some(LogicalOperator::Coalesce),
            _ => None,
        };

        if operator == AssignmentOperator::Assign {
            let left = self.explode_target(left, leaping)?;
            let right = self.explode_value(right)?;
            let assign = self.ast.alloc_at(NodeKind::Assignment { operator, left, right }, span);
            return Ok(self.finish_expression(assign, ignore_result));
        }

        if let Some(logical) = logical {
            // `a ||= b` only evaluates `b`, and only assigns, when `a` does not decide.
            let after = self.loc();
            let target = self.explode_target(left, leaping)?;
            let current = self.ast.deep_clone(target);
            let result = if ignore_result { None } else { Some(self.make_temp_var()) };
            let test = match result {
                Some(temp) => self.assign_temp(temp, current),
                None => current,
            };
            self.jump_unless_short_circuit(logical, test, after);
            let right = self.explode_value(right)?;
            let assign = self.ast.alloc_at(
                NodeKind::Assignment { operator: AssignmentOperator::Assign, left: target, right },
                span,
            );
            match result {
                Some(temp) => {
                    self.assign_temp(temp, assign);
                }
                None => self.emit(assign),
            }
            self.mark(after)?;
            return Ok(result.map(|temp| self.temp_node(temp)));
        }

        // `a.b += x` reads the target once into a temp, then writes it back.
        let target = self.explode_target(left, leaping)?;
        let read = self.ast.deep_clone(target);
        let temp = self.make_temp_var();
        let current = self.assign_temp(temp, read);
        let right = self.explode_value(right)?;
        let combined = self.ast.alloc(NodeKind::Assignment { operator, left: current, right });
        let assign = self.ast.alloc_at(
            NodeKind::Assignment { operator: AssignmentOperator::Assign, left: target, right: combined },
            span,
        );
        Ok(self.finish_expression(assign, ignore_result))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FINISH
    // ═══════════════════════════════════════════════════════════════════════════

    /// Binds the final location, checks that every location is bound, patches
    /// the placeholders and cuts the listing into dispatch cases.
    pub fn finish(mut self) -> Result<Emission> {
        let end = self.listing.len();
        self.bind(self.final_loc, end)?;
        trace!(offset = end, "final location");

        let try_locs = self.try_locs_table();

        for (i, slot) in self.locs.iter().enumerate() {
            if slot.is_none() {
                return Err(TransformError::Location(format!("location #{} was never marked", i)));
            }
        }
        for (node, loc) in std::mem::take(&mut self.loc_refs) {
            let offset = self.locs[loc.index()].unwrap_or_default();
            *self.ast.kind_mut(node) = NodeKind::Literal(Literal::Number(offset as f64));
        }

        let mut cases = Vec::new();
        let mut current: Option<(usize, Vec<NodeId>)> = None;
        let mut ended = false;
        for (offset, stmt) in self.listing.iter().copied().enumerate() {
            if self.marked.contains(&offset) {
                if let Some(case) = current.take() {
                    cases.push(case);
                }
                current = Some((offset, Vec::new()));
                ended = false;
            }
            if ended {
                continue;
            }
            if let Some((_, body)) = current.as_mut() {
                body.push(stmt);
            }
            ended = is_completion(self.ast, stmt);
        }
        cases.extend(current);

        let mut switch_cases = Vec::with_capacity(cases.len() + 2);
        for (offset, consequent) in cases {
            let test = self.ast.num(offset as f64);
            switch_cases.push(self.ast.alloc(NodeKind::SwitchCase { test: Some(test), consequent }));
        }
        let final_test = self.ast.num(end as f64);
        switch_cases.push(self.ast.alloc(NodeKind::SwitchCase { test: Some(final_test), consequent: vec![] }));
        let end_test = self.ast.string("end");
        let stop = self.context_property("stop");
        let stop = self.ast.call(stop, vec![]);
        let stop = self.ast.ret(Some(stop));
        switch_cases.push(self.ast.alloc(NodeKind::SwitchCase { test: Some(end_test), consequent: vec![stop] }));

        let prev = self.context_property("prev");
        let next = self.context_property("next");
        let discriminant = self.ast.assign(prev, next);
        let switch = self.ast.alloc(NodeKind::Switch { discriminant, cases: switch_cases });
        let forever = self.ast.boolean(true);
        let body = self.ast.block(vec![switch]);
        let dispatch = self.ast.alloc(NodeKind::While { test: forever, body });

        Ok(Emission {
            dispatch,
            try_locs,
            listing: self.listing,
            marks: self.marked.into_iter().collect(),
            temps: self.temps,
        })
    }

    fn try_locs_table(&mut self) -> Option<NodeId> {
        if self.tries.is_empty() {
            return None;
        }
        let mut rows = Vec::with_capacity(self.tries.len());
        for record in self.tries.clone() {
            let mut row = vec![
                Some(record.first),
                record.catch,
                record.finally,
                record.finally.map(|_| record.after),
            ];
            while matches!(row.last(), Some(None)) {
                row.pop();
            }
            let elements = row.into_iter().map(|loc| loc.map(|loc| self.loc_ref(loc))).collect();
            rows.push(Some(self.ast.alloc(NodeKind::Array { elements })));
        }
        Some(self.ast.alloc(NodeKind::Array { elements: rows }))
    }
}

fn jump_target(label: Option<&str>, fallback: &str) -> String {
    match label {
        Some(label) => format!("label `{}`", label),
        None => fallback.to_string(),
    }
}

fn is_completion(ast: &Ast, stmt: NodeId) -> bool {
    matches!(
        ast.kind(stmt),
        NodeKind::Break { .. } | NodeKind::Continue { .. } | NodeKind::Return { .. } | NodeKind::Throw { .. }
    )
}

/// Explodes a whole function body and returns the finished emission.
pub fn emit_body(
    ast: &mut Ast,
    meta: &mut Meta,
    scopes: &ScopeMap,
    body: NodeId,
    context: &str,
    runtime: &str,
) -> Result<Emission> {
    let mut emitter = Emitter::new(ast, meta, scopes, context, runtime);
    emitter.explode_statement(body, Vec::new())?;
    emitter.finish()
}
