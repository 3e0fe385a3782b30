//! Typed Python syntax tree handed to the normalizer.
//!
//! The shape follows Python's own `ast` module closely enough that every
//! declaration the normalizer cares about has a dedicated variant. Statements
//! the normalizer never looks inside are kept opaque: a closed [`StmtKind`]
//! tag plus their source text, so nothing is lost on the way through.
//!
//! Trees are built by a reader (see [`crate::input`]) or by hand in tests; the
//! normalizer only ever borrows them.

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `a = b = value`, `x, y = value`
    Assign(Assign),
    /// `x: T = value`, `x: T`
    AnnAssign(AnnAssign),
    /// `def` and `async def`
    FunctionDef(FunctionDef),
    /// `class`
    ClassDef(ClassDef),
    /// An expression evaluated for its side effects.
    Expr(Expr),
    /// Any statement the normalizer does not look inside.
    Opaque { kind: StmtKind, source: String },
}

impl Stmt {
    /// Python `ast` class name for this statement.
    pub fn kind_name(&self) -> &str {
        match self {
            Stmt::Assign(_) => "Assign",
            Stmt::AnnAssign(_) => "AnnAssign",
            Stmt::FunctionDef(f) if f.is_async => "AsyncFunctionDef",
            Stmt::FunctionDef(_) => "FunctionDef",
            Stmt::ClassDef(_) => "ClassDef",
            Stmt::Expr(_) => "Expr",
            Stmt::Opaque { kind, .. } => kind.as_str(),
        }
    }

    pub fn opaque(kind: StmtKind, source: impl Into<String>) -> Self {
        Stmt::Opaque {
            kind,
            source: source.into(),
        }
    }
}

/// Tag for statements carried opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    AugAssign,
    Return,
    Delete,
    Pass,
    Break,
    Continue,
    If,
    For,
    While,
    With,
    Try,
    Raise,
    Assert,
    Import,
    ImportFrom,
    Global,
    Nonlocal,
    Match,
    TypeAlias,
    /// A statement kind with no dedicated tag; holds the parser's own name.
    Other(String),
}

impl StmtKind {
    pub fn as_str(&self) -> &str {
        match self {
            StmtKind::AugAssign => "AugAssign",
            StmtKind::Return => "Return",
            StmtKind::Delete => "Delete",
            StmtKind::Pass => "Pass",
            StmtKind::Break => "Break",
            StmtKind::Continue => "Continue",
            StmtKind::If => "If",
            StmtKind::For => "For",
            StmtKind::While => "While",
            StmtKind::With => "With",
            StmtKind::Try => "Try",
            StmtKind::Raise => "Raise",
            StmtKind::Assert => "Assert",
            StmtKind::Import => "Import",
            StmtKind::ImportFrom => "ImportFrom",
            StmtKind::Global => "Global",
            StmtKind::Nonlocal => "Nonlocal",
            StmtKind::Match => "Match",
            StmtKind::TypeAlias => "TypeAlias",
            StmtKind::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    /// One entry per `=`; `a = b = 1` has two targets.
    pub targets: Vec<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnAssign {
    pub target: Expr,
    pub annotation: Expr,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub args: Arguments,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub returns: Option<Expr>,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub keywords: Vec<Keyword>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
}

/// A function's parameter list.
///
/// `defaults` line up with the *trailing* entries of `posonlyargs` followed by
/// `args`; `kw_defaults` has one slot per keyword-only parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments {
    pub posonlyargs: Vec<Arg>,
    pub args: Vec<Arg>,
    pub vararg: Option<Arg>,
    pub kwonlyargs: Vec<Arg>,
    pub kw_defaults: Vec<Option<Expr>>,
    pub kwarg: Option<Arg>,
    pub defaults: Vec<Expr>,
}

impl Arguments {
    pub fn is_empty(&self) -> bool {
        self.posonlyargs.is_empty()
            && self.args.is_empty()
            && self.vararg.is_none()
            && self.kwonlyargs.is_empty()
            && self.kwarg.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: String,
    pub annotation: Option<Expr>,
}

impl Arg {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
        }
    }

    pub fn annotated(name: impl Into<String>, annotation: Expr) -> Self {
        Self {
            name: name.into(),
            annotation: Some(annotation),
        }
    }
}

/// `name=value` in a call or class header; `name` is `None` for `**value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
}

/// Numeric literal as written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
    /// `2j`; the value is the imaginary part.
    Imaginary(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinOp {
    pub left: Box<Expr>,
    pub op: Operator,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoolOp {
    pub op: BoolOperator,
    /// Two or more operands; `a and b and c` is a single node.
    pub values: Vec<Expr>,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    Str(String),
    /// Bytes literal, kept as written.
    Bytes(String),
    /// f-string, kept as written.
    FormattedStr(String),
    Num(Num),
    Bool(bool),
    NoneLit,
    Ellipsis,
    /// Dict display. `None` keys stand for `**splat` entries.
    Dict {
        keys: Vec<Option<Expr>>,
        values: Vec<Expr>,
    },
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Set(Vec<Expr>),
    BinOp(BinOp),
    BoolOp(BoolOp),
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOperator>,
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        slice: Box<Expr>,
    },
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Starred(Box<Expr>),
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Lambda {
        args: Box<Arguments>,
        body: Box<Expr>,
    },
    NamedExpr {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Await(Box<Expr>),
    /// Anything else (comprehensions, `yield`, ...), kept as written.
    Other { kind: String, source: String },
}

impl Expr {
    pub fn name(id: impl Into<String>) -> Self {
        Expr::Name(id.into())
    }

    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn int(value: i64) -> Self {
        Expr::Num(Num::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Expr::Num(Num::Float(value))
    }

    pub fn binary(left: Expr, op: Operator, right: Expr) -> Self {
        Expr::BinOp(BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn boolean(op: BoolOperator, values: Vec<Expr>) -> Self {
        Expr::BoolOp(BoolOp { op, values })
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: Box::new(func),
            args,
            keywords: Vec::new(),
        }
    }

    pub fn attribute(value: Expr, attr: impl Into<String>) -> Self {
        Expr::Attribute {
            value: Box::new(value),
            attr: attr.into(),
        }
    }

    pub fn subscript(value: Expr, slice: Expr) -> Self {
        Expr::Subscript {
            value: Box::new(value),
            slice: Box::new(slice),
        }
    }

    pub fn dict(pairs: Vec<(Expr, Expr)>) -> Self {
        let (keys, values) = pairs.into_iter().map(|(k, v)| (Some(k), v)).unzip();
        Expr::Dict { keys, values }
    }

    /// Python `ast` class name for this expression.
    pub fn kind_name(&self) -> &str {
        match self {
            Expr::Name(_) => "Name",
            Expr::Str(_)
            | Expr::Bytes(_)
            | Expr::Num(_)
            | Expr::Bool(_)
            | Expr::NoneLit
            | Expr::Ellipsis => "Constant",
            Expr::FormattedStr(_) => "JoinedStr",
            Expr::Dict { .. } => "Dict",
            Expr::List(_) => "List",
            Expr::Tuple(_) => "Tuple",
            Expr::Set(_) => "Set",
            Expr::BinOp(_) => "BinOp",
            Expr::BoolOp(_) => "BoolOp",
            Expr::UnaryOp { .. } => "UnaryOp",
            Expr::Compare { .. } => "Compare",
            Expr::Call { .. } => "Call",
            Expr::Attribute { .. } => "Attribute",
            Expr::Subscript { .. } => "Subscript",
            Expr::Slice { .. } => "Slice",
            Expr::Starred(_) => "Starred",
            Expr::IfExp { .. } => "IfExp",
            Expr::Lambda { .. } => "Lambda",
            Expr::NamedExpr { .. } => "NamedExpr",
            Expr::Await(_) => "Await",
            Expr::Other { kind, .. } => kind,
        }
    }

    /// Dotted path for `a`, `a.b`, `a.b.c`; `None` for anything else.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Name(id) => Some(id.clone()),
            Expr::Attribute { value, attr } => {
                let base = value.dotted_name()?;
                Some(format!("{base}.{attr}"))
            }
            _ => None,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
}

impl Operator {
    /// Canonical infix symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mult => "*",
            Operator::MatMult => "@",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Pow => "**",
            Operator::LShift => "<<",
            Operator::RShift => ">>",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitAnd => "&",
            Operator::FloorDiv => "//",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mult,
            "@" => Operator::MatMult,
            "/" => Operator::Div,
            "%" => Operator::Mod,
            "**" => Operator::Pow,
            "<<" => Operator::LShift,
            ">>" => Operator::RShift,
            "|" => Operator::BitOr,
            "^" => Operator::BitXor,
            "&" => Operator::BitAnd,
            "//" => Operator::FloorDiv,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOperator {
    And,
    Or,
}

impl BoolOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            BoolOperator::And => "and",
            BoolOperator::Or => "or",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "and" => Some(BoolOperator::And),
            "or" => Some(BoolOperator::Or),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Invert,
    Not,
    UAdd,
    USub,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Invert => "~",
            UnaryOperator::Not => "not ",
            UnaryOperator::UAdd => "+",
            UnaryOperator::USub => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOperator {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOperator::Eq => "==",
            CmpOperator::NotEq => "!=",
            CmpOperator::Lt => "<",
            CmpOperator::LtE => "<=",
            CmpOperator::Gt => ">",
            CmpOperator::GtE => ">=",
            CmpOperator::Is => "is",
            CmpOperator::IsNot => "is not",
            CmpOperator::In => "in",
            CmpOperator::NotIn => "not in",
        }
    }

    /// Accepts the token text with any inner whitespace (`not   in`).
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let normalized = symbol.split_whitespace().collect::<Vec<_>>().join(" ");
        Some(match normalized.as_str() {
            "==" => CmpOperator::Eq,
            "!=" | "<>" => CmpOperator::NotEq,
            "<" => CmpOperator::Lt,
            "<=" => CmpOperator::LtE,
            ">" => CmpOperator::Gt,
            ">=" => CmpOperator::GtE,
            "is" => CmpOperator::Is,
            "is not" => CmpOperator::IsNot,
            "in" => CmpOperator::In,
            "not in" => CmpOperator::NotIn,
            _ => return None,
        })
    }
}
