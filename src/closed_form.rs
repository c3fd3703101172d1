//! Closed forms in the iteration index `n`.
//!
//! Every expected value the engine produces is a finite sum
//!
//! ```text
//! f(n) = P_1(n) * b_1^n + ... + P_k(n) * b_k^n
//! ```
//!
//! of polynomials in `n` times exponentials with `n`-free bases. This class is
//! closed under everything the recurrence solver needs: addition, scaling by
//! polynomials in `n`, the shift `n -> n - 1`, and the geometric-convolution
//! sums computed by [`Algebra::closed_form_sum`][crate::algebra::Algebra::closed_form_sum].

use std::fmt;

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::symbol::Symbol;

/// An exponential polynomial `Σ P_i(n) * b_i^n`.
///
/// # Invariants
///
/// - Bases are nonzero, `n`-free, and pairwise distinct.
/// - Coefficients are nonzero polynomials in `n` (their denominators do not
///   mention `n`).
///
/// Equality is semantic: two closed forms are equal iff their difference has
/// no terms.
#[derive(Debug, Clone, Default)]
pub struct ClosedForm {
    terms: Vec<(Expr, Expr)>,
}

fn check_polynomial_in_n(expr: &Expr) -> Result<()> {
    if expr.denom().contains(&Symbol::n()) {
        return Err(Error::Unsupported(format!(
            "`{}` is not a polynomial in the iteration index",
            expr
        )));
    }
    Ok(())
}

impl ClosedForm {
    pub fn zero() -> Self {
        ClosedForm { terms: Vec::new() }
    }

    /// The closed form of an expression polynomial in `n`.
    pub fn from_expr(expr: &Expr) -> Result<Self> {
        ClosedForm::geometric(&Expr::one(), expr)
    }

    /// `coefficient * base^n`.
    pub fn geometric(base: &Expr, coefficient: &Expr) -> Result<Self> {
        if base.contains(&Symbol::n()) {
            return Err(Error::Unsupported(format!(
                "exponential base `{}` depends on the iteration index",
                base
            )));
        }
        check_polynomial_in_n(coefficient)?;
        let mut result = ClosedForm::zero();
        if !base.is_zero() {
            result.push_term(base.clone(), coefficient.clone());
        }
        Ok(result)
    }

    fn push_term(&mut self, base: Expr, coefficient: Expr) {
        if coefficient.is_zero() {
            return;
        }
        match self.terms.iter().position(|(b, _)| b.equals(&base)) {
            Some(i) => {
                self.terms[i].1 += &coefficient;
                if self.terms[i].1.is_zero() {
                    self.terms.remove(i);
                }
            }
            None => self.terms.push((base, coefficient)),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// `(base, coefficient)` pairs.
    pub fn terms(&self) -> impl Iterator<Item = (&Expr, &Expr)> {
        self.terms.iter().map(|(b, c)| (b, c))
    }

    /// Returns the expression if the closed form has no exponential part.
    pub fn as_polynomial(&self) -> Option<Expr> {
        match self.terms.as_slice() {
            [] => Some(Expr::zero()),
            [(base, coefficient)] if base.is_one() => Some(coefficient.clone()),
            _ => None,
        }
    }

    pub fn add(&self, other: &ClosedForm) -> ClosedForm {
        let mut result = self.clone();
        for (base, coefficient) in &other.terms {
            result.push_term(base.clone(), coefficient.clone());
        }
        result
    }

    pub fn sub(&self, other: &ClosedForm) -> ClosedForm {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> ClosedForm {
        ClosedForm {
            terms: self.terms.iter().map(|(b, c)| (b.clone(), -c)).collect(),
        }
    }

    /// Multiplies by an `n`-free factor.
    pub fn scale(&self, factor: &Expr) -> ClosedForm {
        if factor.is_zero() {
            return ClosedForm::zero();
        }
        ClosedForm {
            terms: self.terms.iter().map(|(b, c)| (b.clone(), c * factor)).collect(),
        }
    }

    /// Multiplies by a polynomial in `n`.
    pub fn mul_expr(&self, factor: &Expr) -> Result<ClosedForm> {
        check_polynomial_in_n(factor)?;
        Ok(self.scale(factor))
    }

    /// The shifted sequence `f(n - 1)`.
    pub fn shift(&self) -> Result<ClosedForm> {
        let n = Symbol::n();
        let previous = Expr::n() - Expr::one();
        let mut result = ClosedForm::zero();
        for (base, coefficient) in &self.terms {
            let shifted = coefficient.subs(&n, &previous)?.checked_div(base)?;
            result.push_term(base.clone(), shifted);
        }
        Ok(result)
    }

    /// Substitutes `symbol := value` in bases and coefficients.
    pub fn subs(&self, symbol: &Symbol, value: &Expr) -> Result<ClosedForm> {
        let mut result = ClosedForm::zero();
        for (base, coefficient) in &self.terms {
            let term = ClosedForm::geometric(&base.subs(symbol, value)?, &coefficient.subs(symbol, value)?)?;
            result = result.add(&term);
        }
        Ok(result)
    }

    /// Value at a concrete iteration.
    pub fn eval(&self, iteration: u32) -> Result<Expr> {
        let n = Symbol::n();
        let at = Expr::integer(i64::from(iteration));
        let mut result = Expr::zero();
        for (base, coefficient) in &self.terms {
            result += &(coefficient.subs(&n, &at)? * base.pow(iteration));
        }
        Ok(result)
    }
}

impl PartialEq for ClosedForm {
    fn eq(&self, other: &Self) -> bool {
        self.sub(other).is_zero()
    }
}

impl Eq for ClosedForm {}

/// Renders `expr` so it can stand as a factor in a product.
fn factor(expr: &Expr) -> String {
    let s = expr.to_string();
    if s.contains(' ') || s.contains('/') || s.starts_with('-') {
        format!("({})", s)
    } else {
        s
    }
}

fn base(expr: &Expr) -> String {
    let s = expr.to_string();
    if s.chars().all(|c| c.is_alphanumeric() || c == '_') {
        s
    } else {
        format!("({})", s)
    }
}

impl fmt::Display for ClosedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, (b, c)) in self.terms.iter().enumerate() {
            let negative = c.to_string().starts_with('-');
            let c = if negative { -c } else { c.clone() };
            let term = if b.is_one() && negative && c.to_string().contains(' ') {
                format!("({})", c)
            } else if b.is_one() {
                c.to_string()
            } else if c.is_one() {
                format!("{}^n", base(b))
            } else {
                format!("{}*{}^n", factor(&c), base(b))
            };
            match (i, negative) {
                (0, true) => write!(f, "-{}", term)?,
                (0, false) => write!(f, "{}", term)?,
                (_, true) => write!(f, " - {}", term)?,
                (_, false) => write!(f, " + {}", term)?,
            }
        }
        Ok(())
    }
}

/// A condition under which a summation result takes a special form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// The two expressions coincide.
    Equal(Expr, Expr),
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Equal(a, b) => write!(f, "{} = {}", a, b),
        }
    }
}

/// A case split: the first branch whose guard holds applies, otherwise the
/// default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piecewise {
    branches: Vec<(Guard, ClosedForm)>,
    otherwise: ClosedForm,
}

impl Piecewise {
    pub fn new(otherwise: ClosedForm) -> Self {
        Piecewise {
            branches: Vec::new(),
            otherwise,
        }
    }

    pub fn push(&mut self, guard: Guard, value: ClosedForm) {
        self.branches.push((guard, value));
    }

    pub fn branches(&self) -> &[(Guard, ClosedForm)] {
        &self.branches
    }

    pub fn otherwise(&self) -> &ClosedForm {
        &self.otherwise
    }

    pub fn into_otherwise(self) -> ClosedForm {
        self.otherwise
    }

    pub fn is_unconditional(&self) -> bool {
        self.branches.is_empty()
    }
}

impl fmt::Display for Piecewise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (guard, value) in &self.branches {
            write!(f, "{} if {}; ", value, guard)?;
        }
        write!(f, "{} otherwise", self.otherwise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn parse(s: &str) -> Expr {
        s.parse().unwrap()
    }

    fn geometric(base: &str, coefficient: &str) -> ClosedForm {
        ClosedForm::geometric(&parse(base), &parse(coefficient)).unwrap()
    }

    #[test]
    fn test_like_bases_merge() {
        let f = geometric("2", "n").add(&geometric("2", "1 - n"));
        assert_eq!(f.terms().count(), 1);
        assert_eq!(f, geometric("2", "1"));
        assert!(geometric("p", "1").sub(&geometric("p", "1")).is_zero());
    }

    #[test]
    fn test_semantic_equality_ignores_order() {
        let a = geometric("2", "1").add(&geometric("3", "n"));
        let b = geometric("3", "n").add(&geometric("2", "1"));
        assert_eq!(a, b);
        assert_ne!(a, geometric("2", "1"));
    }

    #[test]
    fn test_n_dependent_base_is_rejected() {
        assert!(ClosedForm::geometric(&Expr::n(), &Expr::one()).is_err());
        assert!(ClosedForm::from_expr(&parse("1/n")).is_err());
    }

    #[test]
    fn test_shift() {
        // 3 * 2^n shifted is 3 * 2^(n-1) = 3/2 * 2^n
        assert_eq!(geometric("2", "3").shift().unwrap(), geometric("2", "3/2"));
        // n^2 shifted is n^2 - 2n + 1
        assert_eq!(
            ClosedForm::from_expr(&parse("n^2")).unwrap().shift().unwrap(),
            ClosedForm::from_expr(&parse("n^2 - 2*n + 1")).unwrap()
        );
    }

    #[test]
    fn test_eval() {
        let f = geometric("2", "n").add(&ClosedForm::from_expr(&Expr::one()).unwrap());
        assert_eq!(f.eval(0).unwrap(), Expr::one());
        assert_eq!(f.eval(3).unwrap(), Expr::integer(25));
    }

    #[test]
    fn test_display() {
        assert_eq!(ClosedForm::zero().to_string(), "0");
        assert_eq!(geometric("2*p", "y0").to_string(), "y0*(2*p)^n");
        assert_eq!(
            ClosedForm::from_expr(&Expr::n()).unwrap().add(&geometric("2", "-1")).to_string(),
            "n - 2^n"
        );
    }

    #[test]
    fn test_piecewise() {
        let mut pw = Piecewise::new(geometric("p", "1"));
        assert!(pw.is_unconditional());
        pw.push(Guard::Equal(parse("p"), Expr::one()), ClosedForm::from_expr(&Expr::n()).unwrap());
        assert_eq!(pw.branches().len(), 1);
        assert_eq!(pw.to_string(), "n if p = 1; p^n otherwise");
        assert_eq!(pw.into_otherwise(), geometric("p", "1"));
    }
}
