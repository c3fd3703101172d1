//! The symbolic capabilities the engine relies on.
//!
//! The engine never manipulates expressions directly beyond ring arithmetic
//! and substitution; the few operations that need real algebra (expansion
//! into polynomials over the program variables, coefficient extraction, and
//! closed-form summation) go through the [`Algebra`] trait. [`ExactAlgebra`]
//! implements them over exact rationals.
//!
//! # Summation
//!
//! The particular solution of `f(n+1) = c * f(n) + g(n)` is
//!
//! ```text
//! S(n) = Σ_{k=0}^{n-1} c^k * g(n-1-k)
//! ```
//!
//! For every term `P(n) * b^n` of `g`, substituting `j = n-1-k` gives
//! `c^(n-1) * Σ_{j<n} P(j) * r^j` with `r = b/c`:
//!
//! - if `r = 1`, the sum is `Σ_m p_m * S_m(n)` with the Faulhaber power sums
//!   `S_m(n) = Σ_{j<n} j^m`;
//! - otherwise a polynomial `R` with `r * R(j+1) - R(j) = P(j)` telescopes
//!   the sum to `r^n * R(n) - R(0)`, so the term contributes
//!   `R(n)/c * b^n - R(0)/c * c^n`.
//!
//! When `b - c` is not provably nonzero, the result records the `b = c`
//! formula as a guarded branch.

use std::sync::Arc;

use log::debug;
use num_bigint::BigInt;
use num_rational::BigRational;

use crate::closed_form::{ClosedForm, Guard, Piecewise};
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::monomial::Monomial;
use crate::polynomial::Polynomial;
use crate::symbol::Symbol;
use crate::utils::{binomial, power_sum_coefficients};

/// Symbolic operations used by the [`Engine`][crate::engine::Engine].
pub trait Algebra {
    /// Expands `expr` into a polynomial over `gens`.
    fn expand(&self, expr: &Expr, gens: &Arc<[Symbol]>) -> Result<Polynomial>;

    /// Coefficient of `monomial` in `poly`.
    fn coefficient_of(&self, poly: &Polynomial, monomial: &Monomial) -> Expr;

    /// Closed form of `Σ_{k=0}^{n-1} c^k * g(n-1-k)`, split on degenerate
    /// parameter values.
    fn closed_form_sum(&self, c: &Expr, g: &ClosedForm) -> Result<Piecewise>;

    /// Collapses a case split by assuming every guard is false.
    fn resolve_non_degenerate_branch(&self, piecewise: Piecewise) -> ClosedForm;
}

/// Exact algebra over rational functions with rational coefficients.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactAlgebra;

impl Algebra for ExactAlgebra {
    fn expand(&self, expr: &Expr, gens: &Arc<[Symbol]>) -> Result<Polynomial> {
        Polynomial::from_expr(expr, gens.clone())
    }

    fn coefficient_of(&self, poly: &Polynomial, monomial: &Monomial) -> Expr {
        poly.coefficient_of(monomial)
    }

    fn closed_form_sum(&self, c: &Expr, g: &ClosedForm) -> Result<Piecewise> {
        let n = Symbol::n();
        if c.contains(&n) {
            return Err(Error::Unsupported(format!(
                "recurrence constant `{}` depends on the iteration index",
                c
            )));
        }
        if c.is_zero() {
            return Ok(Piecewise::new(g.shift()?));
        }

        let mut generic = ClosedForm::zero();
        let mut degenerate = Vec::new();
        for (base, coefficient) in g.terms() {
            let p = coefficient
                .coefficients_in(&n)
                .ok_or_else(|| Error::NotPolynomial(coefficient.to_string()))?;
            if base.equals(c) {
                generic = generic.add(&equal_base_sum(c, &p)?);
                continue;
            }
            let part = distinct_base_sum(c, base, &p)?;
            if !(base - c).is_nonzero() {
                degenerate.push((Guard::Equal(base.clone(), c.clone()), part.clone(), equal_base_sum(c, &p)?));
            }
            generic = generic.add(&part);
        }

        let mut result = Piecewise::new(generic.clone());
        for (guard, part, special) in degenerate {
            result.push(guard, generic.sub(&part).add(&special));
        }
        if !c.is_nonzero() {
            result.push(Guard::Equal(c.clone(), Expr::zero()), g.shift()?);
        }
        Ok(result)
    }

    fn resolve_non_degenerate_branch(&self, piecewise: Piecewise) -> ClosedForm {
        for (guard, value) in piecewise.branches() {
            debug!("Assuming {} does not hold (would give {})", guard, value);
        }
        piecewise.into_otherwise()
    }
}

fn rational(value: BigInt) -> Expr {
    Expr::constant(BigRational::from_integer(value))
}

/// `Σ_i a_i * n^i`
fn polynomial_in_n(coefficients: &[Expr]) -> Expr {
    let n = Expr::n();
    coefficients
        .iter()
        .zip(0u32..)
        .map(|(a, i)| a * &n.pow(i))
        .sum()
}

/// `c^(n-1) * Σ_{j<n} P(j)`
fn equal_base_sum(c: &Expr, p: &[Expr]) -> Result<ClosedForm> {
    let mut q = vec![Expr::zero(); p.len() + 1];
    for (m, pm) in p.iter().enumerate() {
        if pm.is_zero() {
            continue;
        }
        for (i, s) in power_sum_coefficients(m as u32).into_iter().enumerate() {
            q[i] += &(pm * &Expr::constant(s));
        }
    }
    ClosedForm::geometric(c, &polynomial_in_n(&q).checked_div(c)?)
}

/// `c^(n-1) * Σ_{j<n} P(j) * (b/c)^j` for `b != c`.
fn distinct_base_sum(c: &Expr, b: &Expr, p: &[Expr]) -> Result<ClosedForm> {
    let r = b.checked_div(c)?;
    let r_minus_one = &r - &Expr::one();

    // Back substitution from the highest power:
    // a_m = (p_m - r * Σ_{i>m} C(i, m) * a_i) / (r - 1)
    let mut a = vec![Expr::zero(); p.len()];
    for m in (0..p.len()).rev() {
        let mut acc = Expr::zero();
        for (i, ai) in a.iter().enumerate().skip(m + 1) {
            acc += &(ai * &rational(binomial(i as u32, m as u32)));
        }
        a[m] = (&p[m] - &(&r * &acc)).checked_div(&r_minus_one)?;
    }

    let at_n = polynomial_in_n(&a).checked_div(c)?;
    let at_zero = match a.first() {
        Some(a0) => a0.checked_div(c)?,
        None => Expr::zero(),
    };
    Ok(ClosedForm::geometric(b, &at_n)?.add(&ClosedForm::geometric(c, &-at_zero)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn parse(s: &str) -> Expr {
        s.parse().unwrap()
    }

    fn closed(s: &str) -> ClosedForm {
        ClosedForm::from_expr(&parse(s)).unwrap()
    }

    /// `Σ_{k<n} c^k g(n-1-k)` by direct expansion at a concrete `n`.
    fn direct_sum(c: &Expr, g: &ClosedForm, n: u32) -> Expr {
        (0..n)
            .map(|k| c.pow(k) * g.eval(n - 1 - k).unwrap())
            .sum()
    }

    #[test]
    fn test_sum_of_ones() {
        let algebra = ExactAlgebra;
        let s = algebra.closed_form_sum(&Expr::one(), &closed("1")).unwrap();
        assert!(s.is_unconditional());
        assert_eq!(s.into_otherwise(), closed("n"));
    }

    #[test]
    fn test_sum_of_odd_numbers() {
        // Σ_{k<n} (2(n-1-k) + 1) = n^2
        let algebra = ExactAlgebra;
        let s = algebra.closed_form_sum(&Expr::one(), &closed("2*n + 1")).unwrap();
        assert_eq!(s.into_otherwise(), closed("n^2"));
    }

    #[test]
    fn test_geometric_series() {
        // Σ_{k<n} 2^k = 2^n - 1
        let algebra = ExactAlgebra;
        let s = algebra.closed_form_sum(&Expr::integer(2), &closed("1")).unwrap();
        let expected = ClosedForm::geometric(&Expr::integer(2), &Expr::one())
            .unwrap()
            .sub(&closed("1"));
        assert!(s.is_unconditional());
        assert_eq!(s.into_otherwise(), expected);
    }

    #[test]
    fn test_matches_direct_summation() {
        let algebra = ExactAlgebra;
        let c = Expr::rational(1, 2);
        let g = ClosedForm::geometric(&Expr::integer(3), &parse("n^2 - 1"))
            .unwrap()
            .add(&ClosedForm::geometric(&c, &parse("2*n")).unwrap())
            .add(&closed("5"));
        let s = algebra.resolve_non_degenerate_branch(algebra.closed_form_sum(&c, &g).unwrap());
        for n in 0..7 {
            assert_eq!(s.eval(n).unwrap(), direct_sum(&c, &g, n), "n={}", n);
        }
    }

    #[test]
    fn test_symbolic_constant_records_degenerate_branches() {
        let algebra = ExactAlgebra;
        let p = Expr::from(Symbol::positive("p"));
        let c = Expr::integer(2) * &p;
        let s = algebra.closed_form_sum(&c, &closed("1")).unwrap();
        // 1 = 2p is possible, 2p = 0 is not
        assert_eq!(s.branches().len(), 1);
        assert_eq!(s.branches()[0].0, Guard::Equal(Expr::one(), c.clone()));
        // n * 1^n, written over the base 2p
        let degenerate = ClosedForm::geometric(&c, &Expr::n().checked_div(&c).unwrap()).unwrap();
        assert_eq!(s.branches()[0].1, degenerate);

        let generic = algebra.resolve_non_degenerate_branch(s);
        let at_three = generic.eval(3).unwrap();
        assert!(at_three.equals(&(Expr::one() + &c + c.pow(2))));
    }

    #[test]
    fn test_zero_constant_shifts() {
        let algebra = ExactAlgebra;
        let s = algebra.closed_form_sum(&Expr::zero(), &closed("n")).unwrap();
        assert_eq!(s.into_otherwise(), closed("n - 1"));
    }

    #[test]
    fn test_n_dependent_constant_is_unsupported() {
        let algebra = ExactAlgebra;
        let result = algebra.closed_form_sum(&Expr::n(), &closed("1"));
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }
}
