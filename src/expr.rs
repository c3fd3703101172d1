//! Exact symbolic scalars: rational functions with rational coefficients.
//!
//! An [`Expr`] is a quotient `num / den` of two [`Poly`]s. It is kept in a
//! normalized form, so that structural equality coincides with mathematical
//! equality for the expressions the engine produces:
//!
//! - common monomial factors of `num` and `den` are cancelled;
//! - if `den` divides `num` (or vice versa) the quotient is taken;
//! - the leading coefficient of `den` is `1`.
//!
//! Full multivariate GCD cancellation is not performed, so two equal rational
//! functions may in rare cases differ structurally; [`Expr::equals`] compares
//! by cross-multiplication and is always exact.

use std::collections::BTreeSet;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::error::{Error, Result};
use crate::poly::Poly;
use crate::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Expr {
    num: Poly,
    den: Poly,
}

impl Expr {
    pub fn zero() -> Self {
        Expr {
            num: Poly::zero(),
            den: Poly::one(),
        }
    }

    pub fn one() -> Self {
        Expr::integer(1)
    }

    pub fn integer(value: i64) -> Self {
        Expr::from_poly(Poly::integer(value))
    }

    /// The rational `numer / denom`.
    ///
    /// # Panics
    ///
    /// Panics if `denom == 0`.
    pub fn rational(numer: i64, denom: i64) -> Self {
        Expr::constant(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn constant(value: BigRational) -> Self {
        Expr::from_poly(Poly::constant(value))
    }

    pub fn symbol(name: &str) -> Self {
        Expr::from_poly(Poly::symbol(Symbol::new(name)))
    }

    /// The iteration index `n`.
    pub fn n() -> Self {
        Expr::from_poly(Poly::symbol(Symbol::n()))
    }

    pub fn from_poly(num: Poly) -> Self {
        Expr {
            num,
            den: Poly::one(),
        }
    }

    /// Builds `num / den`, failing on a zero denominator.
    pub fn from_parts(num: Poly, den: Poly) -> Result<Self> {
        if den.is_zero() {
            return Err(Error::DivisionByZero);
        }
        Ok(Expr::normalize(num, den))
    }

    fn normalize(num: Poly, den: Poly) -> Self {
        if num.is_zero() {
            return Expr::zero();
        }

        let (mut num, mut den) = (num, den);

        // Cancel the common monomial factor
        let common = num.monomial_content().gcd(&den.monomial_content());
        if !common.is_one() {
            if let (Some(a), Some(b)) = (num.div_monomial(&common), den.div_monomial(&common)) {
                num = a;
                den = b;
            }
        }

        if let Some(c) = den.as_constant() {
            return Expr::from_poly(num.scale(&c.recip()));
        }
        if let Some(q) = num.div_exact(&den) {
            return Expr::from_poly(q);
        }
        if let Some(q) = den.div_exact(&num) {
            num = Poly::one();
            den = q;
        }

        let lc = den.leading_coefficient().recip();
        Expr {
            num: num.scale(&lc),
            den: den.scale(&lc),
        }
    }

    pub fn numer(&self) -> &Poly {
        &self.num
    }

    pub fn denom(&self) -> &Poly {
        &self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.den.is_one() && self.num.is_one()
    }

    /// Returns the value if the expression has no symbols.
    pub fn as_rational(&self) -> Option<BigRational> {
        let n = self.num.as_constant()?;
        let d = self.den.as_constant()?;
        Some(n / d)
    }

    pub fn is_constant(&self) -> bool {
        self.as_rational().is_some()
    }

    pub fn is_polynomial(&self) -> bool {
        self.den.is_one()
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = self.num.free_symbols();
        symbols.extend(self.den.free_symbols());
        symbols
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.num.contains(symbol) || self.den.contains(symbol)
    }

    /// Coefficients with respect to `symbol`, indexed by its power.
    ///
    /// Returns `None` if `symbol` occurs in the denominator.
    pub fn coefficients_in(&self, symbol: &Symbol) -> Option<Vec<Expr>> {
        if self.den.contains(symbol) {
            return None;
        }
        Some(
            self.num
                .coefficients_in(symbol)
                .into_iter()
                .map(|c| Expr::normalize(c, self.den.clone()))
                .collect(),
        )
    }

    /// Mathematical equality, by cross-multiplication.
    pub fn equals(&self, other: &Expr) -> bool {
        self == other || self.num.mul(&other.den) == other.num.mul(&self.den)
    }

    pub fn recip(&self) -> Result<Expr> {
        Expr::from_parts(self.den.clone(), self.num.clone())
    }

    pub fn checked_div(&self, other: &Expr) -> Result<Expr> {
        Ok(self * &other.recip()?)
    }

    pub fn pow(&self, k: u32) -> Expr {
        // If `den^k` divided `num^k`, `den` would divide `num`, so the result is still normalized.
        Expr {
            num: self.num.pow(k),
            den: self.den.pow(k),
        }
    }

    /// Integer power; negative exponents fail on zero.
    pub fn powi(&self, k: i64) -> Result<Expr> {
        let magnitude = u32::try_from(k.unsigned_abs())
            .map_err(|_| Error::Unsupported(format!("exponent {} is too large", k)))?;
        if k >= 0 {
            Ok(self.pow(magnitude))
        } else {
            self.pow(magnitude).recip()
        }
    }

    /// Substitutes `symbol := value`.
    pub fn subs(&self, symbol: &Symbol, value: &Expr) -> Result<Expr> {
        if !self.contains(symbol) {
            return Ok(self.clone());
        }
        if value.den.is_one() {
            return Expr::from_parts(
                self.num.subs(symbol, &value.num),
                self.den.subs(symbol, &value.num),
            );
        }
        let (num, dn) = self.num.subs_fraction(symbol, &value.num, &value.den);
        let (den, dd) = self.den.subs_fraction(symbol, &value.num, &value.den);
        if dn >= dd {
            Expr::from_parts(num, den.mul(&value.den.pow(dn - dd)))
        } else {
            Expr::from_parts(num.mul(&value.den.pow(dd - dn)), den)
        }
    }

    /// A sound sufficient check for strict positivity under the symbols'
    /// positivity assumptions.
    pub fn is_positive(&self) -> bool {
        (self.num.is_positive() && self.den.is_positive())
            || (self.num.is_negative() && self.den.is_negative())
    }

    pub fn is_negative(&self) -> bool {
        (-self).is_positive()
    }

    /// Returns `true` if the expression is provably nonzero.
    pub fn is_nonzero(&self) -> bool {
        self.as_rational().is_some_and(|v| !v.is_zero()) || self.is_positive() || self.is_negative()
    }

    /// Re-tags every symbol's positivity assumption.
    pub fn with_positivity(&self, positive: impl Fn(&Symbol) -> bool) -> Expr {
        Expr {
            num: self.num.map_symbols(&positive),
            den: self.den.map_symbols(&positive),
        }
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::integer(value)
    }
}

impl From<BigRational> for Expr {
    fn from(value: BigRational) -> Self {
        Expr::constant(value)
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Expr::from_poly(Poly::symbol(symbol))
    }
}

impl From<Poly> for Expr {
    fn from(poly: Poly) -> Self {
        Expr::from_poly(poly)
    }
}

impl FromStr for Expr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::parser::parse_expr(s)
    }
}

impl Add<&Expr> for &Expr {
    type Output = Expr;

    fn add(self, rhs: &Expr) -> Expr {
        if self.is_zero() {
            return rhs.clone();
        }
        if rhs.is_zero() {
            return self.clone();
        }
        let (a, b) = (&self.num, &self.den);
        let (c, d) = (&rhs.num, &rhs.den);
        if b == d {
            return Expr::normalize(a.add(c), b.clone());
        }
        if let Some(q) = d.div_exact(b) {
            return Expr::normalize(a.mul(&q).add(c), d.clone());
        }
        if let Some(q) = b.div_exact(d) {
            return Expr::normalize(a.add(&c.mul(&q)), b.clone());
        }
        Expr::normalize(a.mul(d).add(&c.mul(b)), b.mul(d))
    }
}

impl Mul<&Expr> for &Expr {
    type Output = Expr;

    fn mul(self, rhs: &Expr) -> Expr {
        if self.is_zero() || rhs.is_zero() {
            return Expr::zero();
        }
        let (a, d) = cancel(&self.num, &rhs.den);
        let (c, b) = cancel(&rhs.num, &self.den);
        Expr::normalize(a.mul(&c), b.mul(&d))
    }
}

/// Cancels `q` out of `p` when it divides exactly.
fn cancel(p: &Poly, q: &Poly) -> (Poly, Poly) {
    if !q.is_one() {
        if let Some(r) = p.div_exact(q) {
            return (r, Poly::one());
        }
    }
    (p.clone(), q.clone())
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr {
            num: self.num.neg(),
            den: self.den.clone(),
        }
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        -&self
    }
}

impl Sub<&Expr> for &Expr {
    type Output = Expr;

    fn sub(self, rhs: &Expr) -> Expr {
        self + &(-rhs)
    }
}

macro_rules! forward_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Expr> for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                (&self).$method(&rhs)
            }
        }

        impl $imp<&Expr> for Expr {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                (&self).$method(rhs)
            }
        }

        impl $imp<Expr> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                self.$method(&rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);

impl AddAssign<&Expr> for Expr {
    fn add_assign(&mut self, rhs: &Expr) {
        *self = &*self + rhs;
    }
}

impl SubAssign<&Expr> for Expr {
    fn sub_assign(&mut self, rhs: &Expr) {
        *self = &*self - rhs;
    }
}

impl MulAssign<&Expr> for Expr {
    fn mul_assign(&mut self, rhs: &Expr) {
        *self = &*self * rhs;
    }
}

impl Sum for Expr {
    fn sum<I: Iterator<Item = Expr>>(iter: I) -> Expr {
        iter.fold(Expr::zero(), |acc, e| acc + e)
    }
}

impl Zero for Expr {
    fn zero() -> Self {
        Expr::zero()
    }

    fn is_zero(&self) -> bool {
        Expr::is_zero(self)
    }
}

/// Whether `poly` prints as a single factor (a number or a bare power product).
fn is_atomic(poly: &Poly) -> bool {
    match poly.len() {
        0 => true,
        1 => poly
            .terms()
            .all(|(m, c)| m.is_one() || (c.is_one() && m.symbols().count() == 1)),
        _ => false,
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den.is_one() {
            return write!(f, "{}", self.num);
        }
        if self.num.len() > 1 {
            write!(f, "({})", self.num)?;
        } else {
            write!(f, "{}", self.num)?;
        }
        if is_atomic(&self.den) {
            write!(f, "/{}", self.den)
        } else {
            write!(f, "/({})", self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn sym(name: &str) -> Expr {
        Expr::symbol(name)
    }

    #[test]
    fn test_rational_arithmetic() {
        let half = Expr::rational(1, 2);
        let third = Expr::rational(1, 3);
        assert_eq!(&half + &third, Expr::rational(5, 6));
        assert_eq!(&half * &third, Expr::rational(1, 6));
        assert_eq!((&half - &half), Expr::zero());
        assert_eq!(half.to_string(), "1/2");
    }

    #[test]
    fn test_cancellation() {
        // (u^2 - l^2) / (2*(u - l)) == (u + l) / 2
        let (u, l) = (sym("u"), sym("l"));
        let e = (&u * &u - &l * &l)
            .checked_div(&(Expr::integer(2) * (&u - &l)))
            .unwrap();
        assert_eq!(e, (&u + &l) * Expr::rational(1, 2));
        assert!(e.is_polynomial());
    }

    #[test]
    fn test_monomial_cancellation() {
        let (p, q) = (sym("p"), sym("q"));
        let e = (&p * &q).checked_div(&(&p * &p)).unwrap();
        assert_eq!(e, q.checked_div(&p).unwrap());
        assert_eq!(e.to_string(), "q/p");
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(Expr::one().checked_div(&Expr::zero()), Err(Error::DivisionByZero)));
        assert!(Expr::zero().recip().is_err());
    }

    #[test]
    fn test_subs() {
        let x = Symbol::new("x");
        let e = sym("x") * sym("x") + sym("y");
        let r = e.subs(&x, &(sym("y") + Expr::one())).unwrap();
        assert_eq!(r.to_string(), "y^2 + 3*y + 1");

        // x^2 with x := 1/p
        let r = (sym("x") * sym("x")).subs(&x, &sym("p").recip().unwrap()).unwrap();
        assert_eq!(r, sym("p").pow(2).recip().unwrap());
    }

    #[test]
    fn test_subs_into_denominator() {
        let x = Symbol::new("x");
        let e = Expr::one().checked_div(&sym("x")).unwrap();
        assert!(matches!(e.subs(&x, &Expr::zero()), Err(Error::DivisionByZero)));
        assert_eq!(e.subs(&x, &Expr::rational(1, 4)).unwrap(), Expr::integer(4));
    }

    #[test]
    fn test_equals_cross_multiplication() {
        let (a, b) = (sym("a"), sym("b"));
        let e1 = (&a * &b).checked_div(&(&a + &b)).unwrap();
        let e2 = (&a * &b * Expr::integer(2)).checked_div(&((&a + &b) * Expr::integer(2))).unwrap();
        assert!(e1.equals(&e2));
        assert_eq!(e1, e2);
    }

    #[test]
    fn test_positivity() {
        let p = Expr::from(Symbol::positive("p"));
        let one_minus_p = Expr::one() - &p;
        assert!(p.is_positive());
        assert!(!one_minus_p.is_positive());
        assert!(!one_minus_p.is_negative());
        assert!((Expr::integer(2) * &p + Expr::one()).is_nonzero());
        assert!(!sym("x").is_nonzero());
    }

    #[test]
    fn test_coefficients_in() {
        let n = Symbol::n();
        let e = (Expr::n() * Expr::n() * sym("a") + Expr::integer(3)).checked_div(&sym("b")).unwrap();
        let cs = e.coefficients_in(&n).unwrap();
        assert_eq!(cs.len(), 3);
        assert_eq!(cs[0], Expr::integer(3).checked_div(&sym("b")).unwrap());
        assert!(cs[1].is_zero());
        assert_eq!(cs[2], sym("a").checked_div(&sym("b")).unwrap());
    }

    #[test]
    fn test_display() {
        let e = (sym("a") + Expr::one()).checked_div(&(sym("b") + Expr::integer(2))).unwrap();
        assert_eq!(e.to_string(), "(a + 1)/(b + 2)");
        assert_eq!(Expr::zero().to_string(), "0");
        assert_eq!((-sym("x")).to_string(), "-x");
    }
}
