use crate::patterns::completion::{breaks_out_of, breaks_to_label, can_complete_normally, is_constant};
use crate::patterns::diagnostics::normalize;
use crate::patterns::dominance::{dominates, is_unconditional, Dominance, NoHierarchy, TypeHierarchy};
use crate::patterns::{
    BindingSet, BindingState, Body, CaseBody, CaseLabel, Diagnostic, ExprId, ExprKind, Facts,
    Finality, LambdaBody, Modifiers, PatternBindingTable, PatternId, PatternKind, PatternVariable,
    Polarity, ProgramPoint, ScopeFact, Span, StmtId, StmtKind, Switch, VarId,
};
use crate::settings::{Feature, Settings};
use std::collections::HashSet;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FrameKind {
    /// Block, method body, `for` header, or switch arm
    Block,

    /// Pattern variables in scope because of how a condition evaluated
    Ambient,

    /// Same as `Ambient`, but for the operands of `?:`
    ConditionalBranch,

    Lambda,
}

#[derive(Copy, Clone, Debug)]
enum Entry {
    /// Local variable, parameter, or lambda parameter
    Local,
    Pattern(VarId),
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    entries: Vec<(String, Entry)>,
}

/// Outcome of scoping the pattern variables of a method body
#[derive(Debug)]
pub struct Analysis {
    pub table: PatternBindingTable,

    /// Sorted by position
    pub diagnostics: Vec<Diagnostic>,

    /// Some case label dominance question couldn't be answered with the available hierarchy
    pub ambiguous_dominance: bool,
}

impl Analysis {
    pub fn messages(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }
}

/// Works out where pattern variables are in scope
///
/// Boolean expressions are folded into [`Facts`]: the variables matched when the expression is
/// `true` and when it is `false`. Operators combine the facts of their operands, and statements
/// decide which facts reach which sub-statement and which survive the statement. Names visible
/// at a point live in a stack of frames that only grows and shrinks as nested constructs are
/// entered and left.
pub struct PatternScopeAnalyzer<'a> {
    body: &'a Body,
    settings: &'a Settings,
    hierarchy: &'a dyn TypeHierarchy,

    /// Names that resolve outside the body (fields, for example)
    known_names: HashSet<String>,

    frames: Vec<Frame>,

    table: PatternBindingTable,
    diagnostics: Vec<Diagnostic>,
    ambiguous_dominance: bool,
}

impl<'a> PatternScopeAnalyzer<'a> {
    pub fn new(body: &'a Body, settings: &'a Settings) -> PatternScopeAnalyzer<'a> {
        PatternScopeAnalyzer {
            body,
            settings,
            hierarchy: &NoHierarchy,
            known_names: HashSet::new(),
            frames: vec![],
            table: PatternBindingTable::new(),
            diagnostics: vec![],
            ambiguous_dominance: false,
        }
    }

    pub fn with_hierarchy(mut self, hierarchy: &'a dyn TypeHierarchy) -> PatternScopeAnalyzer<'a> {
        self.hierarchy = hierarchy;
        self
    }

    pub fn with_known_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> PatternScopeAnalyzer<'a> {
        self.known_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn analyze(mut self) -> Analysis {
        let body = self.body;
        self.push(FrameKind::Block);
        for parameter in &body.parameters {
            self.add_entry(parameter, Entry::Local);
        }
        if let Some(root) = body.root {
            self.stmt(root);
        }
        self.pop();

        normalize(&mut self.diagnostics);
        log::debug!(
            "scoped {} pattern variables, {} diagnostics",
            self.table.variables().count(),
            self.diagnostics.len()
        );
        Analysis {
            table: self.table,
            diagnostics: self.diagnostics,
            ambiguous_dominance: self.ambiguous_dominance,
        }
    }

    fn push(&mut self, kind: FrameKind) {
        self.frames.push(Frame {
            kind,
            entries: vec![],
        });
    }

    fn push_bindings(&mut self, kind: FrameKind, bindings: &BindingSet) {
        let entries = bindings
            .iter()
            .map(|var| (self.table.variable(var).name.clone(), Entry::Pattern(var)))
            .collect();
        self.frames.push(Frame { kind, entries });
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn add_entry(&mut self, name: &str, entry: Entry) {
        if let Some(frame) = self.frames.last_mut() {
            frame.entries.push((name.to_owned(), entry));
        }
    }

    /// Innermost declaration of a name, and the kind of frame it is in
    fn lookup(&self, name: &str) -> Option<(FrameKind, Entry)> {
        self.frames.iter().rev().find_map(|frame| {
            frame
                .entries
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, entry)| (frame.kind, *entry))
        })
    }

    fn visible_patterns(&self) -> Vec<VarId> {
        self.frames
            .iter()
            .flat_map(|frame| frame.entries.iter())
            .filter_map(|(_, entry)| match entry {
                Entry::Pattern(var) => Some(*var),
                Entry::Local => None,
            })
            .collect()
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        log::trace!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn require(&mut self, feature: Feature, span: Span) {
        if !self.settings.supports(feature) {
            self.report(Diagnostic::feature_unavailable(feature, span));
        }
    }

    fn record_facts(&mut self, expr: ExprId, facts: &Facts) {
        let ambient = self.visible_patterns();
        if ambient.is_empty() && facts.when_true.is_empty() && facts.when_false.is_empty() {
            return;
        }
        let mut fact = ScopeFact::default();
        let states = ambient
            .into_iter()
            .map(|var| (var, BindingState::BoundBoth))
            .chain(facts.when_true.iter().map(|var| (var, BindingState::BoundTrue)))
            .chain(facts.when_false.iter().map(|var| (var, BindingState::BoundFalse)));
        for (var, state) in states {
            fact.bind(&self.table.variable(var).name, state);
        }
        log::trace!("{:?}: {}", expr, fact);
        self.table.record_facts(expr, fact);
    }

    /// Declare the variables bound by a pattern, returning the ones that were legal
    fn declare_pattern(&mut self, pattern: PatternId) -> BindingSet {
        let mut declared = BindingSet::new();
        self.bind_pattern(pattern, &mut declared);
        declared
    }

    fn bind_pattern(&mut self, id: PatternId, declared: &mut BindingSet) {
        let body = self.body;
        let pattern = &body[id];
        match &pattern.kind {
            PatternKind::Unnamed => (),
            PatternKind::Record { components, .. } => {
                for component in components {
                    self.bind_pattern(*component, declared);
                }
            }
            PatternKind::Type {
                ty,
                name,
                modifiers,
            } => {
                if !(*modifiers - Modifiers::FINAL).is_empty() {
                    self.report(Diagnostic::illegal_modifier(name, pattern.span));
                }
                if name == PatternKind::UNNAMED {
                    return;
                }

                let var = self.table.declare(PatternVariable {
                    name: name.clone(),
                    ty: ty.clone(),
                    pattern: id,
                    finality: (*modifiers).into(),
                    polarity: Polarity::WhenTrue,
                    span: pattern.span,
                });

                let sibling = declared
                    .iter()
                    .any(|other| self.table.variable(other).name == *name);
                if sibling {
                    self.report(Diagnostic::duplicate_variable(name, pattern.span));
                    return;
                }
                match self.lookup(name) {
                    Some((FrameKind::ConditionalBranch, Entry::Pattern(_))) => {
                        self.report(Diagnostic::conditional_redeclaration(pattern.span));
                    }
                    Some(_) => self.report(Diagnostic::duplicate_variable(name, pattern.span)),
                    None => declared.insert(var),
                }
            }
        }
    }

    /// Report names bound by both sets (each set is from a different operand)
    fn check_conflicts(&mut self, first: &BindingSet, second: &BindingSet, conditional: bool) {
        for var in second.iter() {
            let variable = self.table.variable(var);
            let clash = first
                .iter()
                .any(|other| self.table.variable(other).name == variable.name);
            if clash {
                let diagnostic = if conditional {
                    Diagnostic::conditional_redeclaration(variable.span)
                } else {
                    Diagnostic::duplicate_variable(&variable.name, variable.span)
                };
                self.report(diagnostic);
            }
        }
    }

    fn resolve(&mut self, expr: ExprId, name: &str) -> Option<VarId> {
        match self.lookup(name) {
            Some((_, Entry::Pattern(var))) => {
                self.table.record_resolution(expr, var);
                Some(var)
            }
            Some((_, Entry::Local)) => None,
            None if self.known_names.contains(name) => None,
            None => {
                let span = self.body[expr].span;
                self.report(Diagnostic::unresolved_variable(name, span));
                None
            }
        }
    }

    /// Analyze an expression used as a condition by a statement
    fn condition(&mut self, expr: ExprId) -> Facts {
        let facts = self.expr(expr);
        for var in facts.when_true.iter() {
            self.table.variable_mut(var).polarity = Polarity::WhenTrue;
        }
        for var in facts.when_false.iter() {
            self.table.variable_mut(var).polarity = Polarity::WhenFalse;
        }
        facts
    }

    fn expr(&mut self, id: ExprId) -> Facts {
        self.table
            .record_scope(ProgramPoint::Expr(id), self.visible_patterns());

        let body = self.body;
        let expr = &body[id];
        match &expr.kind {
            ExprKind::Literal(_) => Facts::none(),

            ExprKind::Name(name) => {
                self.resolve(id, name);
                Facts::none()
            }

            ExprKind::Assign { target, value } => {
                self.expr(*value);
                if let Some(var) = self.resolve(id, target) {
                    if self.table.variable(var).finality == Finality::Final {
                        self.report(Diagnostic::final_pattern_assignment(target, expr.span));
                    }
                }
                Facts::none()
            }

            ExprKind::InstanceOf {
                expr: operand,
                pattern,
                ..
            } => {
                self.expr(*operand);
                let pattern = match pattern {
                    None => return Facts::none(),
                    Some(pattern) => *pattern,
                };
                if let PatternKind::Record { .. } = body[pattern].kind {
                    self.require(Feature::RecordPatterns, body[pattern].span);
                } else {
                    self.require(Feature::PatternMatchingInstanceof, expr.span);
                }
                let facts = Facts {
                    when_true: self.declare_pattern(pattern),
                    when_false: BindingSet::new(),
                };
                self.record_facts(id, &facts);
                facts
            }

            ExprKind::Not(inner) => {
                let facts = self.expr(*inner).negate();
                self.record_facts(id, &facts);
                facts
            }

            ExprKind::And(lhs, rhs) => {
                let left = self.expr(*lhs);
                self.push_bindings(FrameKind::Ambient, &left.when_true);
                let right = self.expr(*rhs);
                self.pop();

                // Both true at once is caught when declaring, since `rhs` sees `left.when_true`
                self.check_conflicts(&left.when_false, &right.when_false, false);

                let when_false = if is_constant(body, *lhs, true) {
                    right.when_false.clone()
                } else {
                    left.when_false
                        .intersection(&left.when_true.union(&right.when_false))
                };
                let facts = Facts {
                    when_true: left.when_true.union(&right.when_true),
                    when_false,
                };
                self.record_facts(id, &facts);
                facts
            }

            ExprKind::Or(lhs, rhs) => {
                let left = self.expr(*lhs);
                self.push_bindings(FrameKind::Ambient, &left.when_false);
                let right = self.expr(*rhs);
                self.pop();

                // Both false at once is caught when declaring, since `rhs` sees `left.when_false`
                self.check_conflicts(&left.when_true, &right.when_true, false);

                let when_true = if is_constant(body, *lhs, false) {
                    right.when_true.clone()
                } else {
                    left.when_true
                        .intersection(&left.when_false.union(&right.when_true))
                };
                let facts = Facts {
                    when_true,
                    when_false: left.when_false.union(&right.when_false),
                };
                self.record_facts(id, &facts);
                facts
            }

            ExprKind::Binary { lhs, rhs, .. } => {
                self.expr(*lhs);
                self.expr(*rhs);
                Facts::none()
            }

            ExprKind::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let cond = self.expr(*condition);
                self.push_bindings(FrameKind::ConditionalBranch, &cond.when_true);
                let then = self.expr(*then);
                self.pop();
                self.push_bindings(FrameKind::ConditionalBranch, &cond.when_false);
                let otherwise = self.expr(*otherwise);
                self.pop();

                self.check_conflicts(&cond.when_true, &otherwise.when_true, true);
                self.check_conflicts(&cond.when_true, &otherwise.when_false, true);
                self.check_conflicts(&cond.when_false, &then.when_true, true);
                self.check_conflicts(&cond.when_false, &then.when_false, true);
                self.check_conflicts(&then.when_true, &otherwise.when_true, true);
                self.check_conflicts(&then.when_false, &otherwise.when_false, true);
                Facts::none()
            }

            ExprKind::Call {
                receiver,
                arguments,
                ..
            } => {
                for operand in receiver.iter().chain(arguments) {
                    self.expr(*operand);
                }
                Facts::none()
            }

            ExprKind::Lambda {
                parameters,
                body: lambda_body,
            } => {
                for (name, span) in parameters {
                    if self.lookup(name).is_some() {
                        self.report(Diagnostic::lambda_redeclaration(name, *span));
                    }
                }
                self.push(FrameKind::Lambda);
                for (name, _) in parameters {
                    self.add_entry(name, Entry::Local);
                }
                match lambda_body {
                    LambdaBody::Expr(expr) => {
                        self.expr(*expr);
                    }
                    LambdaBody::Block(stmt) => {
                        self.stmt(*stmt);
                    }
                }
                self.pop();
                Facts::none()
            }

            ExprKind::Switch(switch) => {
                self.switch(switch);
                Facts::none()
            }
        }
    }

    /// Statement nested under another, seeing some extra pattern variables
    ///
    /// Anything the statement introduces stays inside it.
    fn branch(&mut self, stmt: StmtId, bindings: &BindingSet) {
        self.push_bindings(FrameKind::Ambient, bindings);
        self.stmt(stmt);
        self.pop();
    }

    /// Statements of a block, in the current frame
    fn block_statements(&mut self, stmts: &[StmtId]) {
        for stmt in stmts {
            let introduced = self.stmt(*stmt);
            for var in introduced.iter() {
                let variable = self.table.variable_mut(var);
                variable.polarity = Polarity::Unconditional;
                let name = variable.name.clone();
                log::trace!("{:?} introduces {}", stmt, name);
                self.add_entry(&name, Entry::Pattern(var));
            }
        }
    }

    /// Analyze a statement, returning the pattern variables it introduces into the enclosing
    /// block
    fn stmt(&mut self, id: StmtId) -> BindingSet {
        self.table
            .record_scope(ProgramPoint::Stmt(id), self.visible_patterns());

        let body = self.body;
        let stmt = &body[id];
        match &stmt.kind {
            StmtKind::Empty | StmtKind::Break(_) | StmtKind::Continue(_) => BindingSet::new(),

            StmtKind::Block(stmts) => {
                self.push(FrameKind::Block);
                self.block_statements(stmts);
                self.pop();
                BindingSet::new()
            }

            StmtKind::LocalVar { name, init, .. } => {
                if let Some(init) = init {
                    self.expr(*init);
                }
                if self.lookup(name).is_some() {
                    self.report(Diagnostic::duplicate_variable(name, stmt.span));
                }
                self.add_entry(name, Entry::Local);
                BindingSet::new()
            }

            StmtKind::Expr(expr) | StmtKind::Throw(expr) | StmtKind::Yield(expr) => {
                self.expr(*expr);
                BindingSet::new()
            }

            StmtKind::Return(expr) => {
                if let Some(expr) = expr {
                    self.expr(*expr);
                }
                BindingSet::new()
            }

            StmtKind::If {
                condition,
                then,
                otherwise,
            } => {
                let facts = self.condition(*condition);
                self.branch(*then, &facts.when_true);
                if let Some(otherwise) = otherwise {
                    self.branch(*otherwise, &facts.when_false);
                }

                let then_completes = can_complete_normally(body, *then);
                let otherwise_completes = otherwise.map_or(true, |o| can_complete_normally(body, o));
                match (then_completes, otherwise_completes) {
                    (false, true) => facts.when_false,
                    (true, false) => facts.when_true,
                    _ => BindingSet::new(),
                }
            }

            StmtKind::While {
                condition,
                body: loop_body,
            } => {
                let facts = self.condition(*condition);
                self.branch(*loop_body, &facts.when_true);
                if breaks_out_of(body, id) {
                    BindingSet::new()
                } else {
                    facts.when_false
                }
            }

            StmtKind::Do {
                body: loop_body,
                condition,
            } => {
                self.branch(*loop_body, &BindingSet::new());
                let facts = self.condition(*condition);
                if breaks_out_of(body, id) {
                    BindingSet::new()
                } else {
                    facts.when_false
                }
            }

            StmtKind::For {
                init,
                condition,
                update,
                body: loop_body,
            } => {
                self.push(FrameKind::Block);
                for stmt in init {
                    self.stmt(*stmt);
                }
                let facts = match condition {
                    Some(condition) => self.condition(*condition),
                    None => Facts::none(),
                };
                self.branch(*loop_body, &facts.when_true);
                self.push_bindings(FrameKind::Ambient, &facts.when_true);
                for expr in update {
                    self.expr(*expr);
                }
                self.pop();
                self.pop();

                if breaks_out_of(body, id) {
                    BindingSet::new()
                } else {
                    facts.when_false
                }
            }

            StmtKind::Switch(switch) => {
                self.switch(switch);
                BindingSet::new()
            }

            StmtKind::Labeled {
                label,
                body: labeled,
            } => {
                let introduced = self.stmt(*labeled);
                if breaks_to_label(body, *labeled, label) {
                    BindingSet::new()
                } else {
                    introduced
                }
            }
        }
    }

    fn switch(&mut self, switch: &'a Switch) {
        let body = self.body;
        self.expr(switch.selector);

        // Unguarded pattern labels seen so far
        let mut earlier_patterns: Vec<PatternId> = vec![];
        let mut seen_default = false;
        let mut seen_unconditional = false;
        let mut falls_through = false;

        for case in &switch.cases {
            self.push(FrameKind::Block);
            let mut bindings = BindingSet::new();
            let mut case_patterns = vec![];

            for label in &case.labels {
                match label {
                    CaseLabel::Default => {
                        if seen_unconditional {
                            self.report(Diagnostic::default_and_unconditional(case.span));
                        }
                        seen_default = true;
                    }
                    CaseLabel::Null => self.require(Feature::PatternMatchingSwitch, case.span),
                    CaseLabel::Constant(expr) => {
                        self.expr(*expr);
                    }
                    CaseLabel::Pattern(pattern) => {
                        let span = body[*pattern].span;
                        self.require(Feature::PatternMatchingSwitch, span);
                        if let PatternKind::Record { .. } = body[*pattern].kind {
                            self.require(Feature::RecordPatterns, span);
                        }
                        self.check_dominance(&earlier_patterns, *pattern);

                        if let Some(selector_type) = &switch.selector_type {
                            if is_unconditional(body, self.hierarchy, *pattern, selector_type) {
                                if seen_unconditional {
                                    self.report(Diagnostic::duplicate_unconditional(span));
                                }
                                if seen_default {
                                    self.report(Diagnostic::default_and_unconditional(span));
                                }
                                seen_unconditional = true;
                            }
                        }

                        let declared = self.declare_pattern(*pattern);
                        bindings = bindings.union(&declared);
                        case_patterns.push(*pattern);
                    }
                }
            }

            if falls_through && !bindings.is_empty() {
                self.report(Diagnostic::illegal_fall_through(case.span));
            }
            for var in bindings.iter() {
                let name = self.table.variable(var).name.clone();
                self.add_entry(&name, Entry::Pattern(var));
            }

            let guard = match case.guard {
                Some(guard) => self.condition(guard),
                None => {
                    earlier_patterns.extend(case_patterns);
                    Facts::none()
                }
            };

            self.push_bindings(FrameKind::Ambient, &guard.when_true);
            falls_through = match &case.body {
                CaseBody::Expr(expr) => {
                    self.expr(*expr);
                    false
                }
                CaseBody::Stmt(stmt) => {
                    self.stmt(*stmt);
                    false
                }
                CaseBody::Statements(stmts) => {
                    self.block_statements(stmts);
                    stmts.iter().all(|stmt| can_complete_normally(body, *stmt))
                }
            };
            self.pop();
            self.pop();
        }
    }

    fn check_dominance(&mut self, earlier_patterns: &[PatternId], pattern: PatternId) {
        if !self.settings.check_dominance {
            return;
        }
        for earlier in earlier_patterns {
            match dominates(self.body, self.hierarchy, *earlier, pattern) {
                Dominance::Dominates => {
                    let span = self.body[pattern].span;
                    self.report(Diagnostic::dominated_case_label(span));
                    return;
                }
                Dominance::Unknown => {
                    log::warn!(
                        "cannot tell whether case label {:?} is dominated by {:?}",
                        pattern,
                        earlier
                    );
                    self.ambiguous_dominance = true;
                }
                Dominance::DoesNotDominate => (),
            }
        }
    }
}

/// Scope the pattern variables of a method body
pub fn analyze(body: &Body, settings: &Settings) -> Analysis {
    PatternScopeAnalyzer::new(body, settings).analyze()
}
