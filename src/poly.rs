//! Sparse multivariate polynomials with exact rational coefficients.
//!
//! [`Poly`] is the workhorse behind [`Expr`][crate::expr::Expr]: every
//! expression is a quotient of two `Poly`s. Terms are kept in a `BTreeMap`
//! keyed by [`Monomial`], so the leading term with respect to the lex order is
//! simply the last entry.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::monomial::Monomial;
use crate::symbol::Symbol;

/// A polynomial over `Q` in arbitrary symbols.
///
/// # Invariants
///
/// - No stored coefficient is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Poly {
    terms: BTreeMap<Monomial, BigRational>,
}

impl Poly {
    pub fn zero() -> Self {
        Poly::default()
    }

    pub fn one() -> Self {
        Poly::constant(BigRational::one())
    }

    pub fn constant(value: BigRational) -> Self {
        Poly::term(Monomial::one(), value)
    }

    pub fn integer(value: i64) -> Self {
        Poly::constant(BigRational::from_integer(BigInt::from(value)))
    }

    pub fn symbol(symbol: Symbol) -> Self {
        Poly::term(Monomial::var(symbol), BigRational::one())
    }

    pub fn term(monomial: Monomial, coefficient: BigRational) -> Self {
        let mut terms = BTreeMap::new();
        if !coefficient.is_zero() {
            terms.insert(monomial, coefficient);
        }
        Poly { terms }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.as_constant().is_some_and(|c| c.is_one())
    }

    /// Returns the value if the polynomial has no symbols.
    pub fn as_constant(&self) -> Option<BigRational> {
        match self.terms.len() {
            0 => Some(BigRational::zero()),
            1 => self.terms.get(&Monomial::one()).cloned(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl DoubleEndedIterator<Item = (&Monomial, &BigRational)> {
        self.terms.iter()
    }

    /// Leading term with respect to the lex monomial order.
    pub fn leading_term(&self) -> Option<(&Monomial, &BigRational)> {
        self.terms.last_key_value()
    }

    pub fn leading_coefficient(&self) -> BigRational {
        self.leading_term()
            .map(|(_, c)| c.clone())
            .unwrap_or_else(BigRational::zero)
    }

    pub fn coefficient(&self, monomial: &Monomial) -> BigRational {
        self.terms
            .get(monomial)
            .cloned()
            .unwrap_or_else(BigRational::zero)
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        self.terms
            .keys()
            .flat_map(|m| m.symbols().cloned())
            .collect()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.terms.keys().any(|m| m.contains(symbol))
    }

    pub fn degree_in(&self, symbol: &Symbol) -> u32 {
        self.terms
            .keys()
            .map(|m| m.degree_of(symbol))
            .max()
            .unwrap_or(0)
    }

    /// Coefficients with respect to `symbol`, indexed by its power.
    pub fn coefficients_in(&self, symbol: &Symbol) -> Vec<Poly> {
        let mut result = vec![Poly::zero(); self.degree_in(symbol) as usize + 1];
        for (monomial, coefficient) in &self.terms {
            let (exponent, rest) = monomial.split_off(symbol);
            result[exponent as usize].add_term(rest, coefficient.clone());
        }
        result
    }

    /// Greatest common monomial divisor of all terms.
    pub fn monomial_content(&self) -> Monomial {
        let mut terms = self.terms.keys();
        match terms.next() {
            None => Monomial::one(),
            Some(first) => terms.fold(first.clone(), |acc, m| acc.gcd(m)),
        }
    }

    fn add_term(&mut self, monomial: Monomial, coefficient: BigRational) {
        if coefficient.is_zero() {
            return;
        }
        let entry = self.terms.entry(monomial);
        match entry {
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(coefficient);
            }
            std::collections::btree_map::Entry::Occupied(mut e) => {
                *e.get_mut() += coefficient;
                if e.get().is_zero() {
                    e.remove();
                }
            }
        }
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let mut result = self.clone();
        for (m, c) in &other.terms {
            result.add_term(m.clone(), c.clone());
        }
        result
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        let mut result = self.clone();
        for (m, c) in &other.terms {
            result.add_term(m.clone(), -c);
        }
        result
    }

    pub fn neg(&self) -> Poly {
        Poly {
            terms: self.terms.iter().map(|(m, c)| (m.clone(), -c)).collect(),
        }
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        let mut result = Poly::zero();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &other.terms {
                result.add_term(m1.mul(m2), c1 * c2);
            }
        }
        result
    }

    pub fn scale(&self, factor: &BigRational) -> Poly {
        if factor.is_zero() {
            return Poly::zero();
        }
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), c * factor))
                .collect(),
        }
    }

    pub fn mul_monomial(&self, monomial: &Monomial) -> Poly {
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.mul(monomial), c.clone()))
                .collect(),
        }
    }

    /// Divides every term by `monomial`, which must divide all of them.
    pub fn div_monomial(&self, monomial: &Monomial) -> Option<Poly> {
        let mut terms = BTreeMap::new();
        for (m, c) in &self.terms {
            terms.insert(m.div(monomial)?, c.clone());
        }
        Some(Poly { terms })
    }

    pub fn pow(&self, k: u32) -> Poly {
        let mut result = Poly::one();
        let mut base = self.clone();
        let mut k = k;
        while k > 0 {
            if k & 1 == 1 {
                result = result.mul(&base);
            }
            k >>= 1;
            if k > 0 {
                base = base.mul(&base);
            }
        }
        result
    }

    /// Exact division: returns `q` with `self = q * divisor`, or `None` if
    /// `divisor` does not divide `self`.
    ///
    /// In any monomial order, `LT(q * d) = LT(q) * LT(d)`, so if the leading
    /// term of the remainder is not divisible by `LT(d)`, then `d` does not
    /// divide the remainder.
    pub fn div_exact(&self, divisor: &Poly) -> Option<Poly> {
        let (lead_m, lead_c) = divisor.leading_term()?;
        let mut remainder = self.clone();
        let mut quotient = Poly::zero();
        while let Some((m, c)) = remainder.leading_term() {
            let factor_m = m.div(lead_m)?;
            let factor_c = c / lead_c;
            let factor = Poly::term(factor_m, factor_c);
            remainder = remainder.sub(&divisor.mul(&factor));
            quotient = quotient.add(&factor);
        }
        Some(quotient)
    }

    /// Substitutes `symbol := value`.
    pub fn subs(&self, symbol: &Symbol, value: &Poly) -> Poly {
        if !self.contains(symbol) {
            return self.clone();
        }
        let mut powers: BTreeMap<u32, Poly> = BTreeMap::new();
        let mut result = Poly::zero();
        for (monomial, coefficient) in &self.terms {
            let (exponent, rest) = monomial.split_off(symbol);
            let power = powers
                .entry(exponent)
                .or_insert_with(|| value.pow(exponent));
            result = result.add(&power.mul_monomial(&rest).scale(coefficient));
        }
        result
    }

    /// Substitutes `symbol := numer / denom`, clearing denominators.
    ///
    /// Returns `(P, d)` such that the substituted polynomial equals
    /// `P / denom^d`, where `d` is the degree of `self` in `symbol`.
    pub fn subs_fraction(&self, symbol: &Symbol, numer: &Poly, denom: &Poly) -> (Poly, u32) {
        let degree = self.degree_in(symbol);
        if degree == 0 {
            return (self.clone(), 0);
        }
        let mut result = Poly::zero();
        for (k, coefficient) in self.coefficients_in(symbol).iter().enumerate() {
            if coefficient.is_zero() {
                continue;
            }
            let k = k as u32;
            let term = coefficient
                .mul(&numer.pow(k))
                .mul(&denom.pow(degree - k));
            result = result.add(&term);
        }
        (result, degree)
    }

    /// A sound sufficient check for strict positivity: every coefficient is
    /// positive and every symbol is assumed positive, or the polynomial is a
    /// positive constant.
    pub fn is_positive(&self) -> bool {
        !self.is_zero()
            && self
                .terms
                .iter()
                .all(|(m, c)| c.is_positive() && m.symbols().all(|s| s.is_positive()))
    }

    pub fn is_negative(&self) -> bool {
        self.neg().is_positive()
    }

    /// Rebuilds every symbol with its positivity assumption decided by `positive`.
    pub fn map_symbols(&self, positive: &impl Fn(&Symbol) -> bool) -> Poly {
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| {
                    let m = Monomial::from_powers(
                        m.powers()
                            .map(|(s, e)| (s.clone().with_positive(positive(s)), e)),
                    );
                    (m, c.clone())
                })
                .collect(),
        }
    }

    /// Evaluates with every symbol mapped to a rational value.
    pub fn eval(&self, value: &impl Fn(&Symbol) -> Option<BigRational>) -> Option<BigRational> {
        let mut acc = BigRational::zero();
        for (monomial, coefficient) in &self.terms {
            let mut term = coefficient.clone();
            for (symbol, exponent) in monomial.powers() {
                term *= value(symbol)?.pow(exponent as i32);
            }
            acc += term;
        }
        Some(acc)
    }
}

impl From<BigRational> for Poly {
    fn from(value: BigRational) -> Self {
        Poly::constant(value)
    }
}

impl From<Symbol> for Poly {
    fn from(symbol: Symbol) -> Self {
        Poly::symbol(symbol)
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        for (i, (monomial, coefficient)) in self.terms.iter().rev().enumerate() {
            let negative = coefficient.is_negative();
            match (i, negative) {
                (0, true) => write!(f, "-")?,
                (0, false) => {}
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }
            let abs = coefficient.abs();
            if monomial.is_one() {
                write!(f, "{}", abs)?;
            } else if abs.is_one() {
                write!(f, "{}", monomial)?;
            } else {
                write!(f, "{}*{}", abs, monomial)?;
            }
        }
        Ok(())
    }
}
