//! Symbolic and numeric arguments for parameterized operations.
//!
//! An [`Argument`] is a small expression tree over literal constants, named
//! symbols, the irrational constants π and e, and a fixed set of functions.
//! Literal sub-expressions are folded as soon as they are built, while
//! irrational constants stay exact so that `π/2` survives a round trip
//! through the wire format unchanged.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::f64::consts::{E, PI};
use std::fmt;
use std::ops;

use crate::error::{IrError, IrResult};

/// Relative tolerance used when comparing literal constants.
const LITERAL_EPS: f64 = 1e-12;

/// Irrational constants with an exact symbolic representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Irrational {
    /// π
    Pi,
    /// Euler's number e.
    Euler,
}

impl Irrational {
    /// Numeric value of the constant.
    pub fn value(self) -> f64 {
        match self {
            Irrational::Pi => PI,
            Irrational::Euler => E,
        }
    }
}

/// Function nodes of the argument algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    /// Sum of all operands.
    Add,
    /// Product of all operands.
    Mul,
    /// Quotient of two operands.
    Div,
    /// First operand raised to the second.
    Pow,
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Tangent.
    Tan,
    /// Natural exponential.
    Exp,
    /// Natural logarithm.
    Log,
    /// Identity.
    Identity,
}

impl FunctionKind {
    /// Lowercase name of the function.
    pub fn name(self) -> &'static str {
        match self {
            FunctionKind::Add => "add",
            FunctionKind::Mul => "mul",
            FunctionKind::Div => "div",
            FunctionKind::Pow => "pow",
            FunctionKind::Sin => "sin",
            FunctionKind::Cos => "cos",
            FunctionKind::Tan => "tan",
            FunctionKind::Exp => "exp",
            FunctionKind::Log => "log",
            FunctionKind::Identity => "identity",
        }
    }

    /// Fixed operand count, or `None` for variadic functions.
    pub fn arity(self) -> Option<usize> {
        match self {
            FunctionKind::Add | FunctionKind::Mul => None,
            FunctionKind::Div | FunctionKind::Pow => Some(2),
            FunctionKind::Sin
            | FunctionKind::Cos
            | FunctionKind::Tan
            | FunctionKind::Exp
            | FunctionKind::Log
            | FunctionKind::Identity => Some(1),
        }
    }
}

/// Result of evaluating an [`Argument`].
///
/// Integer and rational values stay exact until an operation without an
/// exact rational result (trigonometry, exp, log, irrational constants,
/// fractional powers, or overflow) forces a float.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Number {
    /// Exact integer.
    Integer(i64),
    /// Exact rational `num/den` in lowest terms with `den > 1`.
    Rational(i64, i64),
    /// Double precision float.
    Real(f64),
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    i64::try_from(a.unsigned_abs()).unwrap_or(1)
}

impl Number {
    /// Build a normalized rational.
    pub fn rational(num: i64, den: i64) -> IrResult<Number> {
        if den == 0 {
            return Err(IrError::Domain(format!("division of {num} by zero")));
        }
        let g = gcd(num, den).max(1);
        let (mut n, mut d) = (num / g, den / g);
        if d < 0 {
            match (n.checked_neg(), d.checked_neg()) {
                (Some(nn), Some(dd)) => {
                    n = nn;
                    d = dd;
                }
                _ => return Ok(Number::Real(num as f64 / den as f64)),
            }
        }
        if d == 1 {
            Ok(Number::Integer(n))
        } else {
            Ok(Number::Rational(n, d))
        }
    }

    /// Value as a float.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Rational(n, d) => n as f64 / d as f64,
            Number::Real(r) => r,
        }
    }

    /// The value as an integer, if it is exactly one.
    pub fn as_integer(self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(i),
            Number::Rational(..) => None,
            Number::Real(r) if r.fract() == 0.0 && r.abs() < i64::MAX as f64 => Some(r as i64),
            Number::Real(_) => None,
        }
    }

    /// Check whether the value is exactly zero.
    pub fn is_zero(self) -> bool {
        match self {
            Number::Integer(i) => i == 0,
            Number::Rational(..) => false,
            Number::Real(r) => r == 0.0,
        }
    }

    fn exact(self) -> Option<(i64, i64)> {
        match self {
            Number::Integer(i) => Some((i, 1)),
            Number::Rational(n, d) => Some((n, d)),
            Number::Real(_) => None,
        }
    }

    fn add(self, other: Number) -> Number {
        if let (Some((a, b)), Some((c, d))) = (self.exact(), other.exact()) {
            let num = a
                .checked_mul(d)
                .and_then(|x| c.checked_mul(b).and_then(|y| x.checked_add(y)));
            if let (Some(num), Some(den)) = (num, b.checked_mul(d)) {
                if let Ok(n) = Number::rational(num, den) {
                    return n;
                }
            }
        }
        Number::Real(self.to_f64() + other.to_f64())
    }

    fn mul(self, other: Number) -> Number {
        if let (Some((a, b)), Some((c, d))) = (self.exact(), other.exact()) {
            if let (Some(num), Some(den)) = (a.checked_mul(c), b.checked_mul(d)) {
                if let Ok(n) = Number::rational(num, den) {
                    return n;
                }
            }
        }
        Number::Real(self.to_f64() * other.to_f64())
    }

    fn div(self, other: Number) -> IrResult<Number> {
        if other.is_zero() {
            return Err(IrError::Domain(format!(
                "division of {} by zero",
                self.to_f64()
            )));
        }
        if let (Some((a, b)), Some((c, d))) = (self.exact(), other.exact()) {
            if let (Some(num), Some(den)) = (a.checked_mul(d), b.checked_mul(c)) {
                return Number::rational(num, den);
            }
        }
        Ok(Number::Real(self.to_f64() / other.to_f64()))
    }

    fn pow(self, exponent: Number) -> IrResult<Number> {
        if let (Some((a, b)), Number::Integer(e)) = (self.exact(), exponent) {
            if e < 0 && a == 0 {
                return Err(IrError::Domain("zero raised to a negative power".into()));
            }
            let (base_n, base_d) = if e < 0 { (b, a) } else { (a, b) };
            if let Ok(k) = u32::try_from(e.unsigned_abs()) {
                if let (Some(n), Some(d)) = (base_n.checked_pow(k), base_d.checked_pow(k)) {
                    return Number::rational(n, d);
                }
            }
        }
        let base = self.to_f64();
        let e = exponent.to_f64();
        if base == 0.0 && e < 0.0 {
            return Err(IrError::Domain("zero raised to a negative power".into()));
        }
        let value = base.powf(e);
        if value.is_nan() {
            return Err(IrError::Domain(format!("{base} raised to {e} is not real")));
        }
        Ok(Number::Real(value))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self.exact(), other.exact()) {
            (Some(a), Some(b)) => a == b,
            _ => approx_eq(self.to_f64(), other.to_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Rational(n, d) => write!(f, "{n}/{d}"),
            Number::Real(r) => write!(f, "{r}"),
        }
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= LITERAL_EPS * scale
}

/// A symbolic or numeric argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Argument {
    /// Integer literal.
    Integer(i64),
    /// Floating point literal.
    Real(f64),
    /// Boolean literal.
    Bool(bool),
    /// Named free symbol.
    Symbol(String),
    /// Exact irrational constant.
    Irrational(Irrational),
    /// Function applied to operands.
    Function(FunctionKind, Vec<Argument>),
}

impl Argument {
    /// Create a symbolic argument.
    pub fn symbol(name: impl Into<String>) -> Self {
        Argument::Symbol(name.into())
    }

    /// The constant π.
    pub fn pi() -> Self {
        Argument::Irrational(Irrational::Pi)
    }

    /// Euler's number.
    pub fn euler() -> Self {
        Argument::Irrational(Irrational::Euler)
    }

    /// `π * num / den`, kept exact.
    pub fn pi_frac(num: i64, den: i64) -> Self {
        let pi = if num == 1 {
            Argument::pi()
        } else {
            Argument::pi() * Argument::Integer(num)
        };
        if den == 1 { pi } else { pi / Argument::Integer(den) }
    }

    /// Build a function node, folding literal operands.
    pub fn function(kind: FunctionKind, args: Vec<Argument>) -> Self {
        match kind {
            FunctionKind::Add => {
                let mut args: Vec<Argument> = args
                    .into_iter()
                    .filter(|a| !matches!(a.literal(), Some(v) if v == 0.0))
                    .collect();
                match args.len() {
                    0 => return Argument::Integer(0),
                    1 => return args.remove(0),
                    _ => {}
                }
                Argument::fold(kind, args)
            }
            FunctionKind::Mul => {
                let mut args: Vec<Argument> = args
                    .into_iter()
                    .filter(|a| !matches!(a, Argument::Integer(1)))
                    .collect();
                match args.len() {
                    0 => return Argument::Integer(1),
                    1 => return args.remove(0),
                    _ => {}
                }
                Argument::fold(kind, args)
            }
            FunctionKind::Identity if args.len() == 1 => args.into_iter().next().unwrap_or_default(),
            _ => Argument::fold(kind, args),
        }
    }

    fn fold(kind: FunctionKind, args: Vec<Argument>) -> Self {
        if args.iter().all(|a| a.literal().is_some()) {
            match apply(kind, args.iter().map(Argument::to_number).collect::<IrResult<Vec<_>>>()) {
                Ok(n) => return Argument::from(n),
                Err(_) => {}
            }
        }
        Argument::Function(kind, args)
    }

    /// Literal numeric value, if this is an Integer/Real/Bool node.
    pub fn literal(&self) -> Option<f64> {
        match self {
            Argument::Integer(i) => Some(*i as f64),
            Argument::Real(r) => Some(*r),
            Argument::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    /// Check if the argument contains any free symbol.
    pub fn is_symbolic(&self) -> bool {
        match self {
            Argument::Symbol(_) => true,
            Argument::Function(_, args) => args.iter().any(Argument::is_symbolic),
            _ => false,
        }
    }

    /// All free symbol names.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        self.collect_symbols(&mut set);
        set
    }

    pub(crate) fn collect_symbols(&self, set: &mut BTreeSet<String>) {
        match self {
            Argument::Symbol(name) => {
                set.insert(name.clone());
            }
            Argument::Function(_, args) => args.iter().for_each(|a| a.collect_symbols(set)),
            _ => {}
        }
    }

    /// Replace every bound symbol; unbound symbols are left intact.
    pub fn substitute(&self, bindings: &HashMap<String, Argument>) -> Argument {
        match self {
            Argument::Symbol(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            Argument::Function(kind, args) => Argument::function(
                *kind,
                args.iter().map(|a| a.substitute(bindings)).collect(),
            ),
            _ => self.clone(),
        }
    }

    /// Substitute and reduce to a number.
    pub fn evaluate(&self, bindings: &HashMap<String, Argument>) -> IrResult<Number> {
        self.substitute(bindings).to_number()
    }

    /// Reduce a symbol-free argument to a number.
    pub fn to_number(&self) -> IrResult<Number> {
        match self {
            Argument::Integer(i) => Ok(Number::Integer(*i)),
            Argument::Real(r) => Ok(Number::Real(*r)),
            Argument::Bool(b) => Ok(Number::Integer(i64::from(*b))),
            Argument::Symbol(name) => Err(IrError::UnboundSymbol(name.clone())),
            Argument::Irrational(c) => Ok(Number::Real(c.value())),
            Argument::Function(kind, args) => apply(
                *kind,
                args.iter().map(Argument::to_number).collect::<IrResult<Vec<_>>>(),
            ),
        }
    }

    /// Reduce to a float.
    pub fn as_f64(&self) -> IrResult<f64> {
        self.to_number().map(Number::to_f64)
    }

    /// Raise to a power.
    pub fn pow(self, exponent: impl Into<Argument>) -> Argument {
        Argument::function(FunctionKind::Pow, vec![self, exponent.into()])
    }

    /// Square root.
    pub fn sqrt(self) -> Argument {
        self.pow(Argument::Real(0.5))
    }

    /// Sine.
    pub fn sin(self) -> Argument {
        Argument::function(FunctionKind::Sin, vec![self])
    }

    /// Cosine.
    pub fn cos(self) -> Argument {
        Argument::function(FunctionKind::Cos, vec![self])
    }

    /// Tangent.
    pub fn tan(self) -> Argument {
        Argument::function(FunctionKind::Tan, vec![self])
    }

    /// Natural exponential.
    pub fn exp(self) -> Argument {
        Argument::function(FunctionKind::Exp, vec![self])
    }

    /// Natural logarithm.
    pub fn ln(self) -> Argument {
        Argument::function(FunctionKind::Log, vec![self])
    }
}

fn apply(kind: FunctionKind, args: IrResult<Vec<Number>>) -> IrResult<Number> {
    let args = args?;
    if let Some(n) = kind.arity() {
        if args.len() != n {
            return Err(IrError::Domain(format!(
                "{} expects {n} operands, got {}",
                kind.name(),
                args.len()
            )));
        }
    }
    let unary = |f: fn(f64) -> f64| Number::Real(f(args[0].to_f64()));
    match kind {
        FunctionKind::Add => Ok(args
            .iter()
            .fold(Number::Integer(0), |acc, x| acc.add(*x))),
        FunctionKind::Mul => Ok(args
            .iter()
            .fold(Number::Integer(1), |acc, x| acc.mul(*x))),
        FunctionKind::Div => args[0].div(args[1]),
        FunctionKind::Pow => args[0].pow(args[1]),
        FunctionKind::Sin => Ok(unary(f64::sin)),
        FunctionKind::Cos => Ok(unary(f64::cos)),
        FunctionKind::Tan => {
            let x = args[0].to_f64();
            if x.cos() == 0.0 {
                return Err(IrError::Domain(format!("tan is undefined at {x}")));
            }
            Ok(Number::Real(x.tan()))
        }
        FunctionKind::Exp => Ok(unary(f64::exp)),
        FunctionKind::Log => {
            let x = args[0].to_f64();
            if x <= 0.0 {
                return Err(IrError::Domain(format!("log of non-positive value {x}")));
            }
            Ok(Number::Real(x.ln()))
        }
        FunctionKind::Identity => Ok(args[0]),
    }
}

impl Default for Argument {
    fn default() -> Self {
        Argument::Integer(0)
    }
}

impl PartialEq for Argument {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.literal(), other.literal()) {
            return approx_eq(a, b);
        }
        match (self, other) {
            (Argument::Symbol(a), Argument::Symbol(b)) => a == b,
            (Argument::Irrational(a), Argument::Irrational(b)) => a == b,
            (Argument::Function(ka, a), Argument::Function(kb, b)) => ka == kb && a == b,
            _ => false,
        }
    }
}

impl From<f64> for Argument {
    fn from(v: f64) -> Self {
        Argument::Real(v)
    }
}

impl From<i64> for Argument {
    fn from(v: i64) -> Self {
        Argument::Integer(v)
    }
}

impl From<i32> for Argument {
    fn from(v: i32) -> Self {
        Argument::Integer(i64::from(v))
    }
}

impl From<bool> for Argument {
    fn from(v: bool) -> Self {
        Argument::Bool(v)
    }
}

impl From<Irrational> for Argument {
    fn from(v: Irrational) -> Self {
        Argument::Irrational(v)
    }
}

impl From<Number> for Argument {
    fn from(n: Number) -> Self {
        match n {
            Number::Integer(i) => Argument::Integer(i),
            Number::Rational(num, den) => {
                Argument::Function(FunctionKind::Div, vec![Argument::Integer(num), Argument::Integer(den)])
            }
            Number::Real(r) => Argument::Real(r),
        }
    }
}

impl<T: Into<Argument>> ops::Add<T> for Argument {
    type Output = Argument;

    fn add(self, rhs: T) -> Argument {
        Argument::function(FunctionKind::Add, vec![self, rhs.into()])
    }
}

impl<T: Into<Argument>> ops::Sub<T> for Argument {
    type Output = Argument;

    fn sub(self, rhs: T) -> Argument {
        self + (-rhs.into())
    }
}

impl<T: Into<Argument>> ops::Mul<T> for Argument {
    type Output = Argument;

    fn mul(self, rhs: T) -> Argument {
        Argument::function(FunctionKind::Mul, vec![self, rhs.into()])
    }
}

impl<T: Into<Argument>> ops::Div<T> for Argument {
    type Output = Argument;

    fn div(self, rhs: T) -> Argument {
        let rhs = rhs.into();
        if matches!(rhs, Argument::Integer(1)) {
            return self;
        }
        Argument::function(FunctionKind::Div, vec![self, rhs])
    }
}

impl ops::Neg for Argument {
    type Output = Argument;

    fn neg(self) -> Argument {
        match self {
            Argument::Integer(i) => match i.checked_neg() {
                Some(n) => Argument::Integer(n),
                None => Argument::Real(-(i as f64)),
            },
            Argument::Real(r) => Argument::Real(-r),
            Argument::Function(FunctionKind::Mul, mut args)
                if args.len() == 2 && matches!(args[0], Argument::Integer(-1)) =>
            {
                args.remove(1)
            }
            other => Argument::Function(FunctionKind::Mul, vec![Argument::Integer(-1), other]),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Integer(i) => write!(f, "{i}"),
            Argument::Real(r) => write!(f, "{r}"),
            Argument::Bool(b) => write!(f, "{b}"),
            Argument::Symbol(s) => write!(f, "{s}"),
            Argument::Irrational(Irrational::Pi) => write!(f, "π"),
            Argument::Irrational(Irrational::Euler) => write!(f, "e"),
            Argument::Function(kind, args) => {
                let joined = |sep: &str| {
                    args.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(sep)
                };
                match kind {
                    FunctionKind::Add => write!(f, "({})", joined(" + ")),
                    FunctionKind::Mul => write!(f, "{}", joined("*")),
                    FunctionKind::Div => write!(f, "({})", joined("/")),
                    FunctionKind::Pow => write!(f, "({})", joined("^")),
                    FunctionKind::Identity => write!(f, "{}", joined(", ")),
                    _ => write!(f, "{}({})", kind.name(), joined(", ")),
                }
            }
        }
    }
}

/// A complex argument as a pair of real arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexArg {
    /// Real part.
    pub re: Argument,
    /// Imaginary part.
    pub im: Argument,
}

impl ComplexArg {
    /// Create from two parts.
    pub fn new(re: impl Into<Argument>, im: impl Into<Argument>) -> Self {
        Self {
            re: re.into(),
            im: im.into(),
        }
    }

    /// Reduce both parts to a complex number.
    pub fn to_complex(&self) -> IrResult<Complex64> {
        Ok(Complex64::new(self.re.as_f64()?, self.im.as_f64()?))
    }
}

impl From<Complex64> for ComplexArg {
    fn from(c: Complex64) -> Self {
        Self::new(c.re, c.im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(name: &str, value: impl Into<Argument>) -> HashMap<String, Argument> {
        let mut m = HashMap::new();
        m.insert(name.to_string(), value.into());
        m
    }

    #[test]
    fn test_constant_folding() {
        let a = Argument::Integer(2) + Argument::Integer(3);
        assert!(matches!(a, Argument::Integer(5)));

        let b = Argument::Real(0.5) * 4;
        assert_eq!(b, Argument::Integer(2));

        // Exact rationals keep their structure.
        let c = Argument::Integer(1) / Argument::Integer(3);
        assert!(matches!(c, Argument::Function(FunctionKind::Div, _)));
        assert_eq!(c.to_number().unwrap(), Number::Rational(1, 3));
    }

    #[test]
    fn test_rationals_fold_to_lowest_terms() {
        let a = Argument::Integer(2) / Argument::Integer(6);
        assert_eq!(a, Argument::Integer(1) / Argument::Integer(3));
        assert_eq!(a.to_string(), "(1/3)");

        let b = Argument::Integer(4) / Argument::Integer(-6);
        assert_eq!(b, Argument::Integer(-2) / Argument::Integer(3));
    }

    #[test]
    fn test_pi_stays_exact() {
        let half_pi = Argument::pi() / 2;
        assert!(matches!(half_pi, Argument::Function(FunctionKind::Div, _)));
        assert!((half_pi.as_f64().unwrap() - PI / 2.0).abs() < 1e-15);
    }

    #[test]
    fn test_substitute_leaves_unbound() {
        let expr = Argument::symbol("x") + Argument::symbol("y");
        let partial = expr.substitute(&bind("x", 1.5));
        assert!(partial.is_symbolic());
        assert_eq!(partial.symbols().into_iter().collect::<Vec<_>>(), vec!["y"]);

        let full = partial.substitute(&bind("y", 2.5));
        assert_eq!(full, Argument::Integer(4));
    }

    #[test]
    fn test_evaluate_unbound_symbol() {
        let expr = Argument::symbol("theta") * 2;
        let err = expr.evaluate(&HashMap::new()).unwrap_err();
        assert_eq!(err, IrError::UnboundSymbol("theta".into()));
    }

    #[test]
    fn test_evaluate_exact_rational() {
        let expr = Argument::symbol("a") / 6 + Argument::Integer(1) / 3;
        let n = expr.evaluate(&bind("a", 1)).unwrap();
        assert_eq!(n, Number::Rational(1, 2));

        let forced = (Argument::symbol("a") / 2).sin();
        assert!(matches!(
            forced.evaluate(&bind("a", 0)).unwrap(),
            Number::Real(_)
        ));
    }

    #[test]
    fn test_domain_errors() {
        let div = Argument::symbol("x") / Argument::symbol("y");
        let mut b = bind("x", 1);
        b.insert("y".into(), Argument::Integer(0));
        assert!(matches!(div.evaluate(&b), Err(IrError::Domain(_))));

        let log = Argument::symbol("x").ln();
        assert!(matches!(log.evaluate(&bind("x", -1.0)), Err(IrError::Domain(_))));
        assert!(matches!(log.evaluate(&bind("x", 0)), Err(IrError::Domain(_))));
    }

    #[test]
    fn test_double_negation() {
        let x = Argument::symbol("x");
        assert_eq!(-(-x.clone()), x);
        assert_eq!(-(-Argument::Real(0.3)), Argument::Real(0.3));
    }

    #[test]
    fn test_literal_equality_across_kinds() {
        assert_eq!(Argument::Integer(2), Argument::Real(2.0));
        assert_ne!(Argument::Integer(2), Argument::Real(2.5));
        assert_ne!(Argument::symbol("x"), Argument::symbol("y"));
    }

    #[test]
    fn test_display() {
        let expr = Argument::symbol("x") + 1;
        assert_eq!(expr.to_string(), "(x + 1)");
        assert_eq!((Argument::pi() / 4).to_string(), "(π/4)");
    }
}
