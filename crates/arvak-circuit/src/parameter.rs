//! Symbolic parameter expressions and the symbol table.
//!
//! Numeric and symbolic evaluation semantics are deliberately minimal: the
//! circuit core only needs to carry expressions (for operation parameters and
//! the global phase), report their free symbols and substitute them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt;

/// Map from symbol name to the expression replacing it.
pub type SymbolMap = FxHashMap<String, ParameterExpression>;

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value.
    Constant(f64),
    /// A free symbol.
    Symbol(String),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// The constant zero.
    pub fn zero() -> Self {
        ParameterExpression::Constant(0.0)
    }

    /// Create a constant.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a free symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// Check if this expression contains any symbols.
    pub fn is_symbolic(&self) -> bool {
        match self {
            ParameterExpression::Symbol(_) => true,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) => e.is_symbolic(),
            ParameterExpression::Add(a, b) | ParameterExpression::Mul(a, b) => {
                a.is_symbolic() || b.is_symbolic()
            }
        }
    }

    /// Evaluate to a number if the expression has no free symbols.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterExpression::Constant(v) => Some(*v),
            ParameterExpression::Symbol(_) => None,
            ParameterExpression::Pi => Some(PI),
            ParameterExpression::Neg(e) => e.as_f64().map(|v| -v),
            ParameterExpression::Add(a, b) => Some(a.as_f64()? + b.as_f64()?),
            ParameterExpression::Mul(a, b) => Some(a.as_f64()? * b.as_f64()?),
        }
    }

    /// Whether the expression is numerically zero.
    pub fn is_zero(&self) -> bool {
        self.as_f64().is_some_and(|v| v.abs() < 1e-12)
    }

    /// Names of all free symbols.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        self.collect_symbols(&mut set);
        set
    }

    fn collect_symbols(&self, set: &mut BTreeSet<String>) {
        match self {
            ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
            ParameterExpression::Symbol(name) => {
                set.insert(name.clone());
            }
            ParameterExpression::Neg(e) => e.collect_symbols(set),
            ParameterExpression::Add(a, b) | ParameterExpression::Mul(a, b) => {
                a.collect_symbols(set);
                b.collect_symbols(set);
            }
        }
    }

    /// Replace symbols according to `map`, leaving unmapped symbols free.
    pub fn substitute(&self, map: &SymbolMap) -> Self {
        match self {
            ParameterExpression::Symbol(name) => {
                map.get(name).cloned().unwrap_or_else(|| self.clone())
            }
            ParameterExpression::Constant(_) | ParameterExpression::Pi => self.clone(),
            ParameterExpression::Neg(e) => ParameterExpression::Neg(Box::new(e.substitute(map))),
            ParameterExpression::Add(a, b) => ParameterExpression::Add(
                Box::new(a.substitute(map)),
                Box::new(b.substitute(map)),
            ),
            ParameterExpression::Mul(a, b) => ParameterExpression::Mul(
                Box::new(a.substitute(map)),
                Box::new(b.substitute(map)),
            ),
        }
    }

    /// Fold constant subexpressions.
    #[must_use]
    pub fn simplify(&self) -> Self {
        if let Some(v) = self.as_f64() {
            return ParameterExpression::Constant(v);
        }
        match self {
            ParameterExpression::Neg(e) => match e.simplify() {
                ParameterExpression::Neg(inner) => *inner,
                other => ParameterExpression::Neg(Box::new(other)),
            },
            ParameterExpression::Add(a, b) => {
                let (a, b) = (a.simplify(), b.simplify());
                if a.is_zero() {
                    b
                } else if b.is_zero() {
                    a
                } else {
                    ParameterExpression::Add(Box::new(a), Box::new(b))
                }
            }
            ParameterExpression::Mul(a, b) => {
                ParameterExpression::Mul(Box::new(a.simplify()), Box::new(b.simplify()))
            }
            _ => self.clone(),
        }
    }
}

impl Default for ParameterExpression {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Symbol(name) => write!(f, "{name}"),
            ParameterExpression::Pi => write!(f, "π"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl std::ops::Add for ParameterExpression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        ParameterExpression::Add(Box::new(self), Box::new(rhs)).simplify()
    }
}

impl std::ops::Mul for ParameterExpression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        ParameterExpression::Mul(Box::new(self), Box::new(rhs)).simplify()
    }
}

impl std::ops::Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self)).simplify()
    }
}

/// Registry of symbol names in use.
///
/// There is no process-wide table: callers own one and pass it to the
/// operations that introduce symbols, such as
/// [`Circuit::symbol_substitution`](crate::Circuit::symbol_substitution).
/// Entries are only ever added.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    names: BTreeSet<String>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a symbol name. Returns `false` if it was already known.
    pub fn register(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Record every symbol of an expression.
    pub fn register_all(&mut self, expr: &ParameterExpression) {
        self.names.extend(expr.free_symbols());
    }

    /// Whether a name is known.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Create, register and return a symbol name not yet in the table.
    ///
    /// `preferred` is used as is when free, otherwise it gets a numeric
    /// suffix.
    pub fn fresh_symbol(&mut self, preferred: &str) -> ParameterExpression {
        let mut candidate = preferred.to_string();
        let mut suffix = 0usize;
        while self.names.contains(&candidate) {
            candidate = format!("{preferred}_{suffix}");
            suffix += 1;
        }
        self.names.insert(candidate.clone());
        ParameterExpression::Symbol(candidate)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
