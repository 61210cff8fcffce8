//! Scalar expressions and projection assignments.

use std::fmt;

use common_error::{StrataError, StrataResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Symbol;

/// A literal constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    /// Explicitly typed `BIGINT '<n>'` literal.
    BigInt(i64),
    /// Untyped integer literal.
    Long(i64),
    /// Boolean literal.
    Boolean(bool),
    /// String literal.
    Varchar(String),
    /// NULL.
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BigInt(value) => write!(f, "BIGINT '{value}'"),
            Self::Long(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Varchar(value) => write!(f, "'{value}'"),
            Self::Null => write!(f, "NULL"),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        };
        f.write_str(op)
    }
}

/// A scalar expression over symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    /// Reference to a symbol produced by the source.
    SymbolRef(Symbol),
    /// A constant.
    Literal(Literal),
    /// Scalar function call.
    FunctionCall {
        /// Function name.
        name: String,
        /// Arguments, in call order.
        args: Vec<Self>,
    },
    /// First non-null operand.
    Coalesce(Vec<Self>),
    /// Binary comparison.
    Comparison {
        /// Operator.
        op: ComparisonOp,
        /// Left operand.
        left: Box<Self>,
        /// Right operand.
        right: Box<Self>,
    },
}

impl Expression {
    /// Reference to `symbol`.
    pub fn symbol(symbol: &Symbol) -> Self {
        Self::SymbolRef(symbol.clone())
    }

    /// Function call.
    pub fn call(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// Comparison of two expressions.
    pub fn compare(op: ComparisonOp, left: Self, right: Self) -> Self {
        Self::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The referenced symbol, when this expression is exactly a symbol reference.
    pub fn as_symbol_ref(&self) -> Option<&Symbol> {
        match self {
            Self::SymbolRef(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// Every symbol referenced anywhere in this expression, in first-seen order.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut Vec<Symbol>) {
        match self {
            Self::SymbolRef(symbol) => {
                if !out.contains(symbol) {
                    out.push(symbol.clone());
                }
            }
            Self::Literal(_) => {}
            Self::FunctionCall { args, .. } | Self::Coalesce(args) => {
                for arg in args {
                    arg.collect_symbols(out);
                }
            }
            Self::Comparison { left, right, .. } => {
                left.collect_symbols(out);
                right.collect_symbols(out);
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SymbolRef(symbol) => write!(f, "{symbol}"),
            Self::Literal(literal) => write!(f, "{literal}"),
            Self::FunctionCall { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Coalesce(args) => {
                write!(f, "COALESCE(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Comparison { op, left, right } => write!(f, "({left} {op} {right})"),
        }
    }
}

/// Ordered `output symbol := expression` map of a projection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignments {
    map: IndexMap<Symbol, Expression>,
}

impl Assignments {
    /// Empty assignments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity assignments `s := s` for every symbol.
    pub fn identity<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> Self {
        Self {
            map: symbols
                .into_iter()
                .map(|s| (s.clone(), Expression::symbol(s)))
                .collect(),
        }
    }

    /// Add an assignment.
    ///
    /// Re-adding an identical assignment is a no-op; binding an already
    /// assigned symbol to a different expression is an internal error.
    pub fn put(&mut self, symbol: Symbol, expression: Expression) -> StrataResult<()> {
        match self.map.get(&symbol) {
            Some(existing) if *existing != expression => Err(StrataError::internal(format!(
                "symbol {symbol} is already assigned {existing}, cannot assign {expression}"
            ))),
            Some(_) => Ok(()),
            None => {
                self.map.insert(symbol, expression);
                Ok(())
            }
        }
    }

    /// Builder-style [`Assignments::put`] for assignments known to be fresh.
    #[must_use]
    pub fn with(mut self, symbol: Symbol, expression: Expression) -> Self {
        self.map.insert(symbol, expression);
        self
    }

    /// Expression assigned to `symbol`.
    pub fn get(&self, symbol: &Symbol) -> Option<&Expression> {
        self.map.get(symbol)
    }

    /// Output symbols in assignment order.
    pub fn outputs(&self) -> Vec<Symbol> {
        self.map.keys().cloned().collect()
    }

    /// Iterate assignments in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Expression)> {
        self.map.iter()
    }

    /// Number of assignments.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether there are no assignments.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Whether every assignment is `s := s`.
    pub fn is_identity(&self) -> bool {
        self.map
            .iter()
            .all(|(symbol, expression)| expression.as_symbol_ref() == Some(symbol))
    }
}
