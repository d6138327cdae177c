use crate::patterns::{ExprId, PatternVariable, ScopeFact, StmtId, VarId};
use std::collections::HashMap;

/// Position in a method body at which scope is recorded
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProgramPoint {
    /// Just before the expression is evaluated
    Expr(ExprId),

    /// Just before the statement is executed
    Stmt(StmtId),
}

/// Result of scoping pattern variables in one method body
///
/// Name resolution uses this to find out which pattern variable a simple name refers to, and
/// diagnostics use it to explain why a name isn't in scope.
#[derive(Debug, Default)]
pub struct PatternBindingTable {
    variables: Vec<PatternVariable>,

    /// Pattern variables in scope at each point, in declaration order
    in_scope: HashMap<ProgramPoint, Vec<VarId>>,

    /// Binding state of names at boolean expressions that involve patterns
    facts: HashMap<ExprId, ScopeFact>,

    /// Pattern variable each simple name or assignment target resolved to
    resolutions: HashMap<ExprId, VarId>,
}

impl PatternBindingTable {
    pub fn new() -> PatternBindingTable {
        PatternBindingTable::default()
    }

    pub(crate) fn declare(&mut self, variable: PatternVariable) -> VarId {
        let id = VarId(self.variables.len() as u32);
        self.variables.push(variable);
        id
    }

    pub(crate) fn variable_mut(&mut self, var: VarId) -> &mut PatternVariable {
        &mut self.variables[var.0 as usize]
    }

    pub(crate) fn record_scope(&mut self, point: ProgramPoint, vars: Vec<VarId>) {
        if !vars.is_empty() {
            self.in_scope.insert(point, vars);
        }
    }

    pub(crate) fn record_facts(&mut self, expr: ExprId, fact: ScopeFact) {
        self.facts.insert(expr, fact);
    }

    pub(crate) fn record_resolution(&mut self, expr: ExprId, var: VarId) {
        self.resolutions.insert(expr, var);
    }

    pub fn variable(&self, var: VarId) -> &PatternVariable {
        &self.variables[var.0 as usize]
    }

    pub fn variables(&self) -> impl Iterator<Item = (VarId, &PatternVariable)> {
        self.variables
            .iter()
            .enumerate()
            .map(|(i, v)| (VarId(i as u32), v))
    }

    /// Pattern variables in scope at a point
    pub fn in_scope_at(&self, point: ProgramPoint) -> impl Iterator<Item = &PatternVariable> {
        self.in_scope
            .get(&point)
            .into_iter()
            .flatten()
            .map(move |var| self.variable(*var))
    }

    /// Pattern variable a name refers to at a point
    pub fn lookup(&self, point: ProgramPoint, name: &str) -> Option<&PatternVariable> {
        self.in_scope
            .get(&point)?
            .iter()
            .rev()
            .map(|var| self.variable(*var))
            .find(|variable| variable.name == name)
    }

    pub fn facts(&self, expr: ExprId) -> Option<&ScopeFact> {
        self.facts.get(&expr)
    }

    /// Pattern variable that a [`Name`](crate::patterns::ExprKind::Name) or
    /// [`Assign`](crate::patterns::ExprKind::Assign) expression refers to
    pub fn resolution(&self, expr: ExprId) -> Option<&PatternVariable> {
        self.resolutions.get(&expr).map(|var| self.variable(*var))
    }
}
