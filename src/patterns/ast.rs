use bitflags::bitflags;
use std::ops::Index;

/// Byte range in the source file
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StmtId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternId(pub u32);

bitflags! {
    /// Modifiers written on a local declaration or pattern variable
    ///
    /// Only `final` is legal on a pattern variable, but the parser accepts the others.
    pub struct Modifiers: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
    }
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Literal(Literal),

    /// Simple name referring to a local, parameter, or pattern variable
    Name(String),

    /// `name = value`
    Assign { target: String, value: ExprId },

    /// `expr instanceof Type` has no pattern; `expr instanceof Type t` has one
    InstanceOf {
        expr: ExprId,
        ty: String,
        pattern: Option<PatternId>,
    },

    Not(ExprId),
    And(ExprId, ExprId),
    Or(ExprId, ExprId),

    /// Operators that evaluate both operands (`==`, `+`, `&`, ...)
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },

    Conditional {
        condition: ExprId,
        then: ExprId,
        otherwise: ExprId,
    },

    /// Method call (`receiver.name(args)`) or anything else that just evaluates operands
    Call {
        receiver: Option<ExprId>,
        name: String,
        arguments: Vec<ExprId>,
    },

    Lambda {
        parameters: Vec<(String, Span)>,
        body: LambdaBody,
    },

    Switch(Switch),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Boolean(bool),
    Int(i64),
    String(String),
    Null,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    BitAnd,
    BitOr,
    Xor,
}

#[derive(Clone, Debug)]
pub enum LambdaBody {
    Expr(ExprId),
    Block(StmtId),
}

#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    Empty,
    Block(Vec<StmtId>),
    LocalVar {
        name: String,
        ty: String,
        init: Option<ExprId>,
    },
    Expr(ExprId),
    If {
        condition: ExprId,
        then: StmtId,
        otherwise: Option<StmtId>,
    },
    While {
        condition: ExprId,
        body: StmtId,
    },
    Do {
        body: StmtId,
        condition: ExprId,
    },

    /// A missing condition behaves like `true`
    For {
        init: Vec<StmtId>,
        condition: Option<ExprId>,
        update: Vec<ExprId>,
        body: StmtId,
    },
    Switch(Switch),
    Return(Option<ExprId>),
    Throw(ExprId),
    Break(Option<String>),
    Continue(Option<String>),
    Yield(ExprId),
    Labeled {
        label: String,
        body: StmtId,
    },
}

/// Switch statement or expression
#[derive(Clone, Debug)]
pub struct Switch {
    pub selector: ExprId,

    /// Static type of the selector, if known (needed to spot unconditional patterns)
    pub selector_type: Option<String>,

    pub cases: Vec<SwitchCase>,
}

#[derive(Clone, Debug)]
pub struct SwitchCase {
    pub labels: Vec<CaseLabel>,

    /// `when` clause
    pub guard: Option<ExprId>,

    pub body: CaseBody,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum CaseLabel {
    Default,
    Null,
    Constant(ExprId),
    Pattern(PatternId),
}

#[derive(Clone, Debug)]
pub enum CaseBody {
    /// `case ... -> expr;`
    Expr(ExprId),

    /// `case ... -> { ... }` or `case ... -> throw ...;`
    Stmt(StmtId),

    /// `case ...:` followed by statements that may fall through to the next group
    Statements(Vec<StmtId>),
}

#[derive(Clone, Debug)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum PatternKind {
    /// `Type name`, `var name` (only as a record component), or `Type _`
    Type {
        ty: String,
        name: String,
        modifiers: Modifiers,
    },

    /// `Type(p1, p2, ...)`
    Record {
        ty: String,
        components: Vec<PatternId>,
    },

    /// `_` on its own as a record component
    Unnamed,
}

impl PatternKind {
    pub const UNNAMED: &'static str = "_";
    pub const VAR: &'static str = "var";
}

/// Syntax tree of one method body
///
/// Nodes are stored in arenas and refer to each other by index.
#[derive(Clone, Debug, Default)]
pub struct Body {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    patterns: Vec<Pattern>,

    /// Method parameters, which are in scope everywhere in the body
    pub parameters: Vec<String>,

    /// Outermost statement
    pub root: Option<StmtId>,

    /// Position handed out to nodes built without an explicit span
    cursor: usize,
}

impl Body {
    pub fn new() -> Body {
        Body::default()
    }

    pub fn with_parameters<S: Into<String>>(parameters: impl IntoIterator<Item = S>) -> Body {
        Body {
            parameters: parameters.into_iter().map(Into::into).collect(),
            ..Body::default()
        }
    }

    pub fn add_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr { kind, span });
        id
    }

    pub fn add_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt { kind, span });
        id
    }

    pub fn add_pattern(&mut self, kind: PatternKind, span: Span) -> PatternId {
        let id = PatternId(self.patterns.len() as u32);
        self.patterns.push(Pattern { kind, span });
        id
    }

    fn next_span(&mut self) -> Span {
        let start = self.cursor;
        self.cursor += 1;
        Span::new(start, start + 1)
    }

    pub fn expr(&mut self, kind: ExprKind) -> ExprId {
        let span = self.next_span();
        self.add_expr(kind, span)
    }

    pub fn stmt(&mut self, kind: StmtKind) -> StmtId {
        let span = self.next_span();
        self.add_stmt(kind, span)
    }

    pub fn pattern(&mut self, kind: PatternKind) -> PatternId {
        let span = self.next_span();
        self.add_pattern(kind, span)
    }

    pub fn name(&mut self, name: &str) -> ExprId {
        self.expr(ExprKind::Name(name.to_owned()))
    }

    pub fn boolean(&mut self, value: bool) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Boolean(value)))
    }

    pub fn not(&mut self, expr: ExprId) -> ExprId {
        self.expr(ExprKind::Not(expr))
    }

    pub fn and(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.expr(ExprKind::And(lhs, rhs))
    }

    pub fn or(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.expr(ExprKind::Or(lhs, rhs))
    }

    pub fn call(&mut self, receiver: Option<ExprId>, name: &str, arguments: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::Call {
            receiver,
            name: name.to_owned(),
            arguments,
        })
    }

    /// `expr instanceof Type name`
    pub fn instance_of(&mut self, expr: ExprId, ty: &str, binding: &str) -> ExprId {
        let pattern = self.type_pattern(ty, binding);
        self.instance_of_pattern(expr, pattern)
    }

    pub fn instance_of_pattern(&mut self, expr: ExprId, pattern: PatternId) -> ExprId {
        let ty = match &self[pattern].kind {
            PatternKind::Type { ty, .. } | PatternKind::Record { ty, .. } => ty.clone(),
            PatternKind::Unnamed => String::from(PatternKind::VAR),
        };
        self.expr(ExprKind::InstanceOf {
            expr,
            ty,
            pattern: Some(pattern),
        })
    }

    pub fn type_pattern(&mut self, ty: &str, name: &str) -> PatternId {
        self.pattern(PatternKind::Type {
            ty: ty.to_owned(),
            name: name.to_owned(),
            modifiers: Modifiers::empty(),
        })
    }

    pub fn record_pattern(&mut self, ty: &str, components: Vec<PatternId>) -> PatternId {
        self.pattern(PatternKind::Record {
            ty: ty.to_owned(),
            components,
        })
    }

    pub fn block(&mut self, stmts: Vec<StmtId>) -> StmtId {
        self.stmt(StmtKind::Block(stmts))
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn if_stmt(&mut self, condition: ExprId, then: StmtId, otherwise: Option<StmtId>) -> StmtId {
        self.stmt(StmtKind::If {
            condition,
            then,
            otherwise,
        })
    }

    pub fn local(&mut self, ty: &str, name: &str, init: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::LocalVar {
            name: name.to_owned(),
            ty: ty.to_owned(),
            init,
        })
    }
}

impl Index<ExprId> for Body {
    type Output = Expr;

    fn index(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }
}

impl Index<StmtId> for Body {
    type Output = Stmt;

    fn index(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0 as usize]
    }
}

impl Index<PatternId> for Body {
    type Output = Pattern;

    fn index(&self, id: PatternId) -> &Pattern {
        &self.patterns[id.0 as usize]
    }
}
