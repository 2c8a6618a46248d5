//! Syntax tree for template expressions and code-block statements

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    /// Shift the span by `offset`, turning a fragment-relative span into a
    /// template-relative one
    pub fn offset(mut self, offset: usize) -> Self {
        self.span = self.span.start + offset..self.span.end + offset;
        self
    }
}

/// Constant written directly in the template
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::In => "in",
            BinaryOp::NotIn => "not in",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Name(String),
    List(Vec<Spanned<Expr>>),
    /// `{key: value}`; bare identifier keys are stored as string literals
    Map(Vec<(Spanned<Expr>, Spanned<Expr>)>),
    /// `target.name`
    Attr(Box<Spanned<Expr>>, String),
    /// `target[index]`
    Index(Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    /// `callee(args)`
    Call(Box<Spanned<Expr>>, Vec<Spanned<Expr>>),
    Unary(UnaryOp, Box<Spanned<Expr>>),
    Binary(BinaryOp, Box<Spanned<Expr>>, Box<Spanned<Expr>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
}

/// Which block a terminator may close
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndKind {
    Any,
    For,
    If,
}

/// One statement of a code block
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `for x in items` or `for key, value in mapping`
    For {
        targets: Vec<String>,
        iterable: Spanned<Expr>,
    },
    If(Spanned<Expr>),
    Elif(Spanned<Expr>),
    Else,
    End(EndKind),
    Assign {
        target: String,
        op: AssignOp,
        value: Spanned<Expr>,
    },
    Pass,
}

impl Stmt {
    /// Shift every span in the statement by `offset`
    pub fn offset(self, offset: usize) -> Self {
        match self {
            Stmt::For { targets, iterable } => Stmt::For {
                targets,
                iterable: offset_expr(iterable, offset),
            },
            Stmt::If(cond) => Stmt::If(offset_expr(cond, offset)),
            Stmt::Elif(cond) => Stmt::Elif(offset_expr(cond, offset)),
            Stmt::Assign { target, op, value } => Stmt::Assign {
                target,
                op,
                value: offset_expr(value, offset),
            },
            other => other,
        }
    }
}

/// Shift the spans of an expression tree by `offset`
pub fn offset_expr(expr: Spanned<Expr>, offset: usize) -> Spanned<Expr> {
    let shift = |e: Box<Spanned<Expr>>| Box::new(offset_expr(*e, offset));
    let node = match expr.node {
        Expr::List(items) => Expr::List(
            items
                .into_iter()
                .map(|item| offset_expr(item, offset))
                .collect(),
        ),
        Expr::Map(entries) => Expr::Map(
            entries
                .into_iter()
                .map(|(k, v)| (offset_expr(k, offset), offset_expr(v, offset)))
                .collect(),
        ),
        Expr::Attr(target, name) => Expr::Attr(shift(target), name),
        Expr::Index(target, index) => Expr::Index(shift(target), shift(index)),
        Expr::Call(callee, args) => Expr::Call(
            shift(callee),
            args.into_iter().map(|a| offset_expr(a, offset)).collect(),
        ),
        Expr::Unary(op, operand) => Expr::Unary(op, shift(operand)),
        Expr::Binary(op, lhs, rhs) => Expr::Binary(op, shift(lhs), shift(rhs)),
        leaf => leaf,
    };
    Spanned::new(node, expr.span).offset(offset)
}
