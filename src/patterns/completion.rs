//! Normal completion of statements
//!
//! This follows the "can complete normally" rules of the language (JLS §14.22), restricted to the
//! statements in [`StmtKind`]. Pattern variables introduced by an `if` or a loop depend on these
//! answers: `if (!(o instanceof String s)) return;` makes `s` available afterwards only because
//! the `return` cannot complete normally.

use crate::patterns::{Body, CaseBody, CaseLabel, ExprId, ExprKind, Literal, StmtId, StmtKind};

/// Is the expression the constant `value`? (`true`, `!false`, ...)
pub fn is_constant(body: &Body, expr: ExprId, value: bool) -> bool {
    match &body[expr].kind {
        ExprKind::Literal(Literal::Boolean(b)) => *b == value,
        ExprKind::Not(inner) => is_constant(body, *inner, !value),
        _ => false,
    }
}

pub fn can_complete_normally(body: &Body, stmt: StmtId) -> bool {
    match &body[stmt].kind {
        StmtKind::Empty | StmtKind::LocalVar { .. } | StmtKind::Expr(_) => true,
        StmtKind::Block(stmts) => stmts.iter().all(|s| can_complete_normally(body, *s)),
        StmtKind::If {
            then, otherwise, ..
        } => match otherwise {
            None => true,
            Some(otherwise) => {
                can_complete_normally(body, *then) || can_complete_normally(body, *otherwise)
            }
        },
        StmtKind::While { condition, .. } => {
            !is_constant(body, *condition, true) || has_break(body, stmt)
        }
        StmtKind::Do { condition, .. } => {
            !is_constant(body, *condition, true) || has_break(body, stmt)
        }
        StmtKind::For { condition, .. } => {
            let infinite = condition.map_or(true, |c| is_constant(body, c, true));
            !infinite || has_break(body, stmt)
        }
        StmtKind::Switch(switch) => {
            let exhaustive = switch.cases.iter().any(|case| {
                case.guard.is_none()
                    && case.labels.iter().any(|l| matches!(l, CaseLabel::Default))
            });
            if !exhaustive || has_break(body, stmt) {
                return true;
            }
            match switch.cases.last() {
                None => true,
                Some(last) => match &last.body {
                    CaseBody::Statements(stmts) => {
                        stmts.iter().all(|s| can_complete_normally(body, *s))
                    }
                    _ => switch.cases.iter().any(|case| match &case.body {
                        CaseBody::Expr(_) => true,
                        CaseBody::Stmt(s) => can_complete_normally(body, *s),
                        CaseBody::Statements(stmts) => {
                            stmts.iter().all(|s| can_complete_normally(body, *s))
                        }
                    }),
                },
            }
        }
        StmtKind::Labeled { label, body: inner } => {
            can_complete_normally(body, *inner) || breaks_to_label(body, *inner, label)
        }
        StmtKind::Return(_)
        | StmtKind::Throw(_)
        | StmtKind::Break(_)
        | StmtKind::Continue(_)
        | StmtKind::Yield(_) => false,
    }
}

/// Does a reachable `break` exit the given loop or switch statement?
///
/// Unlabeled breaks count when they are not nested in another breakable statement. For a labeled
/// statement, `break label` counts too.
pub fn has_break(body: &Body, target: StmtId) -> bool {
    match &body[target].kind {
        StmtKind::Labeled { label, body: inner } => {
            has_break(body, *inner) || breaks_to_label(body, *inner, label)
        }
        _ => breakable_statements(body, target)
            .into_iter()
            .any(|stmt| find_break(body, stmt, true, BreakTarget::Unlabeled)),
    }
}

/// Does a reachable `break` leave the loop or switch statement for any target at all?
///
/// This is [`has_break`] plus labeled breaks to statements enclosing the loop: a `break outer`
/// in the body leaves the loop without its condition having been false. Labels declared inside
/// the body don't count.
pub fn breaks_out_of(body: &Body, target: StmtId) -> bool {
    breakable_statements(body, target)
        .into_iter()
        .any(|stmt| find_break(body, stmt, true, BreakTarget::Outside(&[])))
}

/// Does a reachable `break label` inside the statement target the label?
pub(crate) fn breaks_to_label(body: &Body, stmt: StmtId, label: &str) -> bool {
    find_break(body, stmt, false, BreakTarget::Label(label))
}

fn breakable_statements(body: &Body, target: StmtId) -> Vec<StmtId> {
    match &body[target].kind {
        StmtKind::While { body: inner, .. }
        | StmtKind::Do { body: inner, .. }
        | StmtKind::For { body: inner, .. } => vec![*inner],
        StmtKind::Switch(switch) => switch_statements(switch.cases.iter().map(|c| &c.body)),
        _ => vec![],
    }
}

fn switch_statements<'a>(bodies: impl Iterator<Item = &'a CaseBody>) -> Vec<StmtId> {
    let mut out = vec![];
    for case_body in bodies {
        match case_body {
            CaseBody::Expr(_) => (),
            CaseBody::Stmt(stmt) => out.push(*stmt),
            CaseBody::Statements(stmts) => out.extend(stmts.iter().copied()),
        }
    }
    out
}

/// Which labeled breaks [`find_break`] is looking for
#[derive(Copy, Clone)]
enum BreakTarget<'l> {
    /// Exactly this label
    Label(&'l str),

    /// None, only unlabeled breaks count
    Unlabeled,

    /// Any label not declared on the way down
    Outside(&'l [&'l str]),
}

impl<'l> BreakTarget<'l> {
    fn matches(self, label: &str) -> bool {
        match self {
            BreakTarget::Label(target) => target == label,
            BreakTarget::Unlabeled => false,
            BreakTarget::Outside(declared) => !declared.contains(&label),
        }
    }
}

/// Search for a `break` that leaves the statement being checked
///
/// `unlabeled` tracks whether an unlabeled `break` would still target it (it stops once we
/// descend into a nested loop or switch).
fn find_break(body: &Body, stmt: StmtId, unlabeled: bool, target: BreakTarget<'_>) -> bool {
    match &body[stmt].kind {
        StmtKind::Break(None) => unlabeled,
        StmtKind::Break(Some(label)) => target.matches(label),
        StmtKind::Block(stmts) => {
            for stmt in stmts {
                if find_break(body, *stmt, unlabeled, target) {
                    return true;
                }
                // Anything after this is unreachable
                if !can_complete_normally(body, *stmt) {
                    break;
                }
            }
            false
        }
        StmtKind::If {
            then, otherwise, ..
        } => {
            find_break(body, *then, unlabeled, target)
                || otherwise.map_or(false, |s| find_break(body, s, unlabeled, target))
        }
        StmtKind::While { body: inner, .. }
        | StmtKind::Do { body: inner, .. }
        | StmtKind::For { body: inner, .. } => find_break(body, *inner, false, target),
        StmtKind::Switch(switch) => switch_statements(switch.cases.iter().map(|c| &c.body))
            .into_iter()
            .any(|s| find_break(body, s, false, target)),
        StmtKind::Labeled { label, body: inner } => match target {
            BreakTarget::Outside(declared) => {
                let mut declared = declared.to_vec();
                declared.push(label.as_str());
                find_break(body, *inner, unlabeled, BreakTarget::Outside(&declared))
            }
            _ => find_break(body, *inner, unlabeled, target),
        },
        StmtKind::Empty
        | StmtKind::LocalVar { .. }
        | StmtKind::Expr(_)
        | StmtKind::Return(_)
        | StmtKind::Throw(_)
        | StmtKind::Continue(_)
        | StmtKind::Yield(_) => false,
    }
}
