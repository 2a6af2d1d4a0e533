//! Filter and ordering expressions.

use entiodata_codec::{ArithmeticOp, Value};
use std::fmt;

/// A `/`-separated property path, e.g. `Customer/Address/City`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    /// Parses a path, ignoring empty segments.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Creates a path from segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns the segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl From<&str> for PropertyPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `eq`
    Eq,
    /// `ne`
    Ne,
    /// `lt`
    Lt,
    /// `le`
    Le,
    /// `gt`
    Gt,
    /// `ge`
    Ge,
    /// `and`
    And,
    /// `or`
    Or,
    /// `add`
    Add,
    /// `sub`
    Sub,
    /// `mul`
    Mul,
    /// `div`
    Div,
    /// `mod`
    Mod,
}

impl BinaryOp {
    /// Returns the operator keyword.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::And => "and",
            Self::Or => "or",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
        }
    }

    /// Parses an operator keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "and" => Self::And,
            "or" => Self::Or,
            "add" => Self::Add,
            "sub" => Self::Sub,
            "mul" => Self::Mul,
            "div" => Self::Div,
            "mod" => Self::Mod,
            _ => return None,
        })
    }

    pub(crate) const fn arithmetic(self) -> Option<ArithmeticOp> {
        match self {
            Self::Add => Some(ArithmeticOp::Add),
            Self::Sub => Some(ArithmeticOp::Sub),
            Self::Mul => Some(ArithmeticOp::Mul),
            Self::Div => Some(ArithmeticOp::Div),
            Self::Mod => Some(ArithmeticOp::Mod),
            _ => None,
        }
    }
}

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// `substringof(needle, haystack)`
    SubstringOf,
    /// `startswith(s, prefix)`
    StartsWith,
    /// `endswith(s, suffix)`
    EndsWith,
    /// `length(s)`
    Length,
    /// `indexof(s, needle)`
    IndexOf,
    /// `substring(s, start[, len])`
    Substring,
    /// `tolower(s)`
    ToLower,
    /// `toupper(s)`
    ToUpper,
    /// `trim(s)`
    Trim,
    /// `concat(a, b)`
    Concat,
    /// `replace(s, find, with)`
    Replace,
    /// `year(dt)`
    Year,
    /// `month(dt)`
    Month,
    /// `day(dt)`
    Day,
    /// `hour(dt)`
    Hour,
    /// `minute(dt)`
    Minute,
    /// `second(dt)`
    Second,
    /// `round(n)`
    Round,
    /// `floor(n)`
    Floor,
    /// `ceiling(n)`
    Ceiling,
}

impl Function {
    /// Returns the function name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SubstringOf => "substringof",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Length => "length",
            Self::IndexOf => "indexof",
            Self::Substring => "substring",
            Self::ToLower => "tolower",
            Self::ToUpper => "toupper",
            Self::Trim => "trim",
            Self::Concat => "concat",
            Self::Replace => "replace",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Round => "round",
            Self::Floor => "floor",
            Self::Ceiling => "ceiling",
        }
    }

    /// Looks up a function by name.
    pub fn from_name(name: &str) -> Option<Self> {
        const ALL: [Function; 20] = [
            Function::SubstringOf,
            Function::StartsWith,
            Function::EndsWith,
            Function::Length,
            Function::IndexOf,
            Function::Substring,
            Function::ToLower,
            Function::ToUpper,
            Function::Trim,
            Function::Concat,
            Function::Replace,
            Function::Year,
            Function::Month,
            Function::Day,
            Function::Hour,
            Function::Minute,
            Function::Second,
            Function::Round,
            Function::Floor,
            Function::Ceiling,
        ];
        ALL.into_iter().find(|f| f.name() == name)
    }

    /// Accepted argument counts, inclusive.
    pub const fn arity(self) -> (usize, usize) {
        match self {
            Self::Length
            | Self::ToLower
            | Self::ToUpper
            | Self::Trim
            | Self::Year
            | Self::Month
            | Self::Day
            | Self::Hour
            | Self::Minute
            | Self::Second
            | Self::Round
            | Self::Floor
            | Self::Ceiling => (1, 1),
            Self::SubstringOf
            | Self::StartsWith
            | Self::EndsWith
            | Self::IndexOf
            | Self::Concat => (2, 2),
            Self::Substring => (2, 3),
            Self::Replace => (3, 3),
        }
    }
}

/// An expression over one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant.
    Literal(Value),
    /// A property path resolved against the record.
    Property(PropertyPath),
    /// Logical negation.
    Not(Box<Expr>),
    /// Arithmetic negation.
    Negate(Box<Expr>),
    /// A binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// A function call.
    Call {
        /// Function.
        function: Function,
        /// Arguments.
        args: Vec<Expr>,
    },
}

impl Expr {
    /// A literal expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// A property path expression.
    pub fn property(path: &str) -> Self {
        Self::Property(PropertyPath::parse(path))
    }

    /// `not inner`
    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Expr) -> Self {
        Self::Not(Box::new(inner))
    }

    /// `-inner`
    pub fn negate(inner: Expr) -> Self {
        Self::Negate(Box::new(inner))
    }

    /// A function call.
    pub fn call(function: Function, args: Vec<Expr>) -> Self {
        Self::Call { function, args }
    }

    /// `self op rhs`
    #[must_use]
    pub fn binary(self, op: BinaryOp, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    /// `self eq rhs`
    #[must_use]
    pub fn equals(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Eq, rhs)
    }

    /// `self ne rhs`
    #[must_use]
    pub fn not_equals(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Ne, rhs)
    }

    /// `self lt rhs`
    #[must_use]
    pub fn lt(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Lt, rhs)
    }

    /// `self le rhs`
    #[must_use]
    pub fn le(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Le, rhs)
    }

    /// `self gt rhs`
    #[must_use]
    pub fn gt(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Gt, rhs)
    }

    /// `self ge rhs`
    #[must_use]
    pub fn ge(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Ge, rhs)
    }

    /// `self and rhs`
    #[must_use]
    pub fn and(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::And, rhs)
    }

    /// `self or rhs`
    #[must_use]
    pub fn or(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Or, rhs)
    }

    /// `self add rhs`
    #[must_use]
    pub fn plus(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Add, rhs)
    }

    /// `self sub rhs`
    #[must_use]
    pub fn minus(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Sub, rhs)
    }

    /// `self mul rhs`
    #[must_use]
    pub fn times(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Mul, rhs)
    }

    /// `self div rhs`
    #[must_use]
    pub fn divided_by(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Div, rhs)
    }

    /// `self mod rhs`
    #[must_use]
    pub fn modulo(self, rhs: Expr) -> Self {
        self.binary(BinaryOp::Mod, rhs)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => match entiodata_codec::to_literal(v) {
                Ok(s) => f.write_str(&s),
                Err(_) => write!(f, "{v}"),
            },
            Self::Property(p) => write!(f, "{p}"),
            Self::Not(e) => write!(f, "not ({e})"),
            Self::Negate(e) => write!(f, "-({e})"),
            Self::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.keyword()),
            Self::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// One ordering key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Key expression.
    pub expr: Expr,
    /// Direction.
    pub direction: Direction,
}

impl OrderBy {
    /// Ascending by `expr`.
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: Direction::Ascending,
        }
    }

    /// Descending by `expr`.
    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: Direction::Descending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_parse() {
        let path = PropertyPath::parse("Customer/Address//City");
        assert_eq!(path.segments(), ["Customer", "Address", "City"]);
        assert_eq!(path.to_string(), "Customer/Address/City");
        assert!(PropertyPath::parse("").is_empty());
    }

    #[test]
    fn builders_nest() {
        let e = Expr::property("Total")
            .gt(Expr::literal(10))
            .and(Expr::not(Expr::property("Closed")));
        assert_eq!(e.to_string(), "((Total gt 10) and not (Closed))");
    }

    #[test]
    fn function_lookup() {
        assert_eq!(Function::from_name("startswith"), Some(Function::StartsWith));
        assert_eq!(Function::from_name("nope"), None);
        assert_eq!(Function::Substring.arity(), (2, 3));
    }

    #[test]
    fn operator_keywords() {
        for op in [BinaryOp::Eq, BinaryOp::And, BinaryOp::Mod] {
            assert_eq!(BinaryOp::from_keyword(op.keyword()), Some(op));
        }
        assert_eq!(BinaryOp::Add.arithmetic(), Some(ArithmeticOp::Add));
        assert_eq!(BinaryOp::Lt.arithmetic(), None);
    }
}
