//! Expected-value variables.

use std::fmt;

use num_rational::BigRational;
use num_traits::One;

use crate::expr::Expr;
use crate::monomial::Monomial;
use crate::poly::Poly;

/// An EVAR `factor * monomial` over the program variables.
///
/// Identity includes the factor: `2*x` and `x` are different EVARs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Evar {
    factor: Expr,
    monomial: Monomial,
}

impl Evar {
    pub fn new(factor: Expr, monomial: Monomial) -> Self {
        Evar { factor, monomial }
    }

    /// The EVAR of a bare monomial.
    pub fn monic(monomial: Monomial) -> Self {
        Evar::new(Expr::one(), monomial)
    }

    pub fn factor(&self) -> &Expr {
        &self.factor
    }

    pub fn monomial(&self) -> &Monomial {
        &self.monomial
    }

    /// Whether no program variable occurs.
    pub fn is_constant(&self) -> bool {
        self.monomial.is_one()
    }

    pub fn to_expr(&self) -> Expr {
        &self.factor * &Expr::from_poly(Poly::term(self.monomial.clone(), BigRational::one()))
    }
}

impl fmt::Display for Evar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_expr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::symbol::Symbol;

    #[test]
    fn test_factor_is_part_of_identity() {
        let x = Monomial::var(Symbol::new("x"));
        let e1 = Evar::monic(x.clone());
        let e2 = Evar::new(Expr::integer(2), x.clone());
        assert_ne!(e1, e2);
        assert_eq!(e2.to_string(), "2*x");
        assert!(Evar::monic(Monomial::one()).is_constant());
    }
}
