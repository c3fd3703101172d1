//! Polynomials over the program variables.
//!
//! A [`Polynomial`] splits an [`Expr`] into monomials over an ordered list of
//! generators (the program variables), each with a coefficient that may
//! mention free parameters and the iteration index, but no generator.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use num_rational::BigRational;
use num_traits::One;

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::monomial::Monomial;
use crate::poly::Poly;
use crate::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial {
    gens: Arc<[Symbol]>,
    terms: BTreeMap<Monomial, Expr>,
}

impl Polynomial {
    pub fn zero(gens: Arc<[Symbol]>) -> Self {
        Polynomial {
            gens,
            terms: BTreeMap::new(),
        }
    }

    pub fn constant(gens: Arc<[Symbol]>, value: Expr) -> Self {
        let mut poly = Polynomial::zero(gens);
        poly.add_term(Monomial::one(), value);
        poly
    }

    /// A single term `coefficient * monomial`.
    pub fn term(gens: Arc<[Symbol]>, monomial: Monomial, coefficient: Expr) -> Self {
        let mut poly = Polynomial::zero(gens);
        poly.add_term(monomial, coefficient);
        poly
    }

    /// Expands `expr` as a polynomial in `gens`.
    ///
    /// Fails with [`Error::NotPolynomial`] if a generator occurs in the
    /// denominator.
    pub fn from_expr(expr: &Expr, gens: Arc<[Symbol]>) -> Result<Self> {
        if gens.iter().any(|g| expr.denom().contains(g)) {
            return Err(Error::NotPolynomial(expr.to_string()));
        }

        let mut grouped: BTreeMap<Monomial, Poly> = BTreeMap::new();
        for (monomial, coefficient) in expr.numer().terms() {
            let (inside, outside) = monomial.partition(&gens);
            let part = Poly::term(outside, coefficient.clone());
            let entry = grouped.entry(inside).or_default();
            *entry = entry.add(&part);
        }

        let mut poly = Polynomial::zero(gens);
        for (monomial, numer) in grouped {
            let coefficient = Expr::from_parts(numer, expr.denom().clone())?;
            poly.add_term(monomial, coefficient);
        }
        Ok(poly)
    }

    fn add_term(&mut self, monomial: Monomial, coefficient: Expr) {
        if coefficient.is_zero() {
            return;
        }
        match self.terms.get_mut(&monomial) {
            Some(existing) => {
                *existing += &coefficient;
                if existing.is_zero() {
                    self.terms.remove(&monomial);
                }
            }
            None => {
                self.terms.insert(monomial, coefficient);
            }
        }
    }

    pub fn gens(&self) -> &Arc<[Symbol]> {
        &self.gens
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_constant(&self) -> bool {
        self.terms.keys().all(|m| m.is_one())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in descending monomial order.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &Expr)> {
        self.terms.iter().rev()
    }

    /// Non-constant monomials, in descending order.
    pub fn monomials(&self) -> impl Iterator<Item = &Monomial> {
        self.terms().map(|(m, _)| m).filter(|m| !m.is_one())
    }

    /// Coefficient of `monomial` (zero if absent).
    pub fn coefficient_of(&self, monomial: &Monomial) -> Expr {
        self.terms.get(monomial).cloned().unwrap_or_else(Expr::zero)
    }

    pub fn constant_term(&self) -> Expr {
        self.coefficient_of(&Monomial::one())
    }

    /// Drops the term of `monomial`.
    pub fn without(&self, monomial: &Monomial) -> Polynomial {
        let mut terms = self.terms.clone();
        terms.remove(monomial);
        Polynomial {
            gens: self.gens.clone(),
            terms,
        }
    }

    /// Distinct exponents of `variable`, in descending order.
    pub fn powers_of(&self, variable: &Symbol) -> Vec<u32> {
        let mut powers: Vec<u32> = self
            .terms
            .keys()
            .map(|m| m.degree_of(variable))
            .filter(|&e| e > 0)
            .collect();
        powers.sort_unstable_by(|a, b| b.cmp(a));
        powers.dedup();
        powers
    }

    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let mut result = self.clone();
        for (monomial, coefficient) in &other.terms {
            result.add_term(monomial.clone(), coefficient.clone());
        }
        result
    }

    pub fn scale(&self, factor: &Expr) -> Polynomial {
        let mut result = Polynomial::zero(self.gens.clone());
        for (monomial, coefficient) in &self.terms {
            result.add_term(monomial.clone(), coefficient * factor);
        }
        result
    }

    pub fn to_expr(&self) -> Expr {
        self.terms
            .iter()
            .map(|(m, c)| c * &Expr::from_poly(Poly::term(m.clone(), BigRational::one())))
            .sum()
    }

    /// Substitutes `symbol := value` and re-expands.
    pub fn substitute(&self, symbol: &Symbol, value: &Expr) -> Result<Polynomial> {
        Polynomial::from_expr(&self.to_expr().subs(symbol, value)?, self.gens.clone())
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_expr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn gens() -> Arc<[Symbol]> {
        Arc::from(vec![Symbol::new("x"), Symbol::new("y")])
    }

    fn parse(s: &str) -> Expr {
        s.parse().unwrap()
    }

    #[test]
    fn test_from_expr_groups_by_generator_monomials() {
        let poly = Polynomial::from_expr(&parse("a*x^2 + b*x^2 + 3*x*y - n + 1"), gens()).unwrap();
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        assert_eq!(poly.len(), 3);
        assert_eq!(
            poly.coefficient_of(&Monomial::var_pow(x.clone(), 2)),
            parse("a + b")
        );
        assert_eq!(
            poly.coefficient_of(&Monomial::from_powers([(x, 1), (y, 1)])),
            Expr::integer(3)
        );
        assert_eq!(poly.constant_term(), parse("1 - n"));
        assert_eq!(poly.monomials().count(), 2);
    }

    #[test]
    fn test_denominator_with_generator_is_rejected() {
        let result = Polynomial::from_expr(&parse("1/x"), gens());
        assert!(matches!(result, Err(Error::NotPolynomial(_))));
        // Parameters in the denominator are fine.
        let poly = Polynomial::from_expr(&parse("x/p"), gens()).unwrap();
        assert_eq!(poly.coefficient_of(&Monomial::var(Symbol::new("x"))), parse("1/p"));
    }

    #[test]
    fn test_powers_of() {
        let poly = Polynomial::from_expr(&parse("x^3*y + x*y^2 + x^3 + y"), gens()).unwrap();
        assert_eq!(poly.powers_of(&Symbol::new("x")), vec![3, 1]);
        assert_eq!(poly.powers_of(&Symbol::new("y")), vec![2, 1]);
    }

    #[test]
    fn test_substitute_and_round_trip() {
        let poly = Polynomial::from_expr(&parse("x^2 + y"), gens()).unwrap();
        let shifted = poly.substitute(&Symbol::new("x"), &parse("x + 1")).unwrap();
        assert_eq!(shifted.to_expr(), parse("x^2 + 2*x + 1 + y"));
        assert_eq!(shifted.without(&Monomial::one()).constant_term(), Expr::zero());
    }
}
