//! Scalar first-order linear recurrences.

use log::debug;

use crate::algebra::Algebra;
use crate::closed_form::ClosedForm;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::symbol::Symbol;

/// `f(0) = initial; f(n+1) = constant * f(n) + inhomogeneous(n)`
#[derive(Debug, Clone)]
pub struct Recurrence {
    pub constant: Expr,
    pub initial: Expr,
    pub inhomogeneous: ClosedForm,
}

impl Recurrence {
    pub fn new(constant: Expr, initial: Expr, inhomogeneous: ClosedForm) -> Self {
        Recurrence {
            constant,
            initial,
            inhomogeneous,
        }
    }

    /// Solves the recurrence in closed form.
    ///
    /// ```text
    /// f(n) = c^n * f(0) + Σ_{k=0}^{n-1} c^k * g(n-1-k)
    /// ```
    ///
    /// With `c = 0` the solution is `g(n-1)`. Degenerate parameter values
    /// reported by the summation are assumed not to occur.
    pub fn solve<A: Algebra>(&self, algebra: &A) -> Result<ClosedForm> {
        debug!(
            "Solving f(n+1) = ({}) * f(n) + {}, f(0) = {}",
            self.constant, self.inhomogeneous, self.initial
        );

        if self.constant.contains(&Symbol::n()) {
            return Err(Error::Unsupported(format!(
                "recurrence constant `{}` depends on the iteration index",
                self.constant
            )));
        }
        if self.constant.is_zero() {
            return self.inhomogeneous.shift();
        }

        let homogeneous = ClosedForm::geometric(&self.constant, &self.initial)?;
        let sum = algebra.closed_form_sum(&self.constant, &self.inhomogeneous)?;
        let particular = algebra.resolve_non_degenerate_branch(sum);
        Ok(homogeneous.add(&particular))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::algebra::ExactAlgebra;

    use test_log::test;

    fn parse(s: &str) -> Expr {
        s.parse().unwrap()
    }

    #[test]
    fn test_constant_sequence() {
        let r = Recurrence::new(Expr::one(), parse("x0"), ClosedForm::zero());
        assert_eq!(r.solve(&ExactAlgebra).unwrap(), ClosedForm::from_expr(&parse("x0")).unwrap());
    }

    #[test]
    fn test_counter() {
        let r = Recurrence::new(Expr::one(), Expr::zero(), ClosedForm::from_expr(&Expr::one()).unwrap());
        assert_eq!(r.solve(&ExactAlgebra).unwrap(), ClosedForm::from_expr(&Expr::n()).unwrap());
    }

    #[test]
    fn test_affine_recurrence_agrees_with_iteration() {
        // f(n+1) = f(n)/3 + 2^n, f(0) = 5
        let c = Expr::rational(1, 3);
        let g = ClosedForm::geometric(&Expr::integer(2), &Expr::one()).unwrap();
        let r = Recurrence::new(c.clone(), Expr::integer(5), g);
        let solution = r.solve(&ExactAlgebra).unwrap();

        let mut value = Expr::integer(5);
        for n in 0..8u32 {
            assert_eq!(solution.eval(n).unwrap(), value, "n={}", n);
            value = &c * &value + Expr::integer(2).pow(n);
        }
    }

    #[test]
    fn test_zero_constant() {
        let g = ClosedForm::from_expr(&parse("n^2")).unwrap();
        let r = Recurrence::new(Expr::zero(), Expr::integer(7), g);
        assert_eq!(r.solve(&ExactAlgebra).unwrap(), ClosedForm::from_expr(&parse("n^2 - 2*n + 1")).unwrap());
    }

    #[test]
    fn test_n_dependent_constant() {
        let r = Recurrence::new(Expr::n(), Expr::one(), ClosedForm::zero());
        assert!(matches!(r.solve(&ExactAlgebra), Err(Error::Unsupported(_))));
    }
}
