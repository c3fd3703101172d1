//! Random variables with exact moments.

use std::fmt;

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::parser::split_top_level;
use crate::symbol::Symbol;
use crate::utils::{binomial, double_factorial};

/// A distribution with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RandomVar {
    /// `(value, probability)` pairs.
    Finite(Vec<(Expr, Expr)>),
    Uniform { low: Expr, high: Expr },
    /// Normal distribution, parameterized by mean and variance.
    Gaussian { mean: Expr, variance: Expr },
    /// Only the support is known.
    SymbolicSupport { low: Expr, high: Expr },
    /// Nothing is known; moments are opaque placeholders named after `name`.
    Unknown { name: String },
}

impl RandomVar {
    /// Parses the parameter list of `RV(...)`, e.g. `uniform, 0, 1`.
    ///
    /// `variable` names the drawn variable; symbols outside
    /// `program_variables` are assumed positive.
    pub fn parse(params: &str, variable: &str, program_variables: &[Symbol]) -> Result<RandomVar> {
        let mut parts = split_top_level(params, ',').into_iter().map(str::trim);
        let distribution = parts.next().unwrap_or_default().to_lowercase();
        let params: Vec<&str> = parts.collect();

        let expr = |text: &str| -> Result<Expr> {
            let e: Expr = text.parse()?;
            Ok(e.with_positivity(|s| !program_variables.contains(s)))
        };
        let pair = |params: &[&str]| -> Result<(Expr, Expr)> {
            match params {
                [a, b] => Ok((expr(*a)?, expr(*b)?)),
                _ => Err(Error::InvalidDistribution {
                    distribution: distribution.clone(),
                    message: format!("expected 2 parameters, got {}", params.len()),
                }),
            }
        };

        match distribution.as_str() {
            "finite" => {
                let mut outcomes = Vec::with_capacity(params.len());
                for param in &params {
                    let (value, probability) = param.split_once('@').ok_or_else(|| Error::InvalidDistribution {
                        distribution: distribution.clone(),
                        message: format!("`{}` is not of the form `value @ probability`", param),
                    })?;
                    outcomes.push((expr(value)?, expr(probability)?));
                }
                RandomVar::finite(variable, outcomes)
            }
            "uniform" => {
                let (low, high) = pair(&params)?;
                Ok(RandomVar::Uniform { low, high })
            }
            "gauss" | "normal" => {
                let (mean, variance) = pair(&params)?;
                Ok(RandomVar::Gaussian { mean, variance })
            }
            "symbolic-support" => {
                let (low, high) = pair(&params)?;
                Ok(RandomVar::SymbolicSupport { low, high })
            }
            "unknown" => {
                if !params.is_empty() {
                    return Err(Error::InvalidDistribution {
                        distribution: distribution.clone(),
                        message: format!("expected no parameters, got {}", params.len()),
                    });
                }
                Ok(RandomVar::Unknown {
                    name: variable.to_string(),
                })
            }
            _ => Err(Error::UnknownDistribution(distribution.clone())),
        }
    }

    /// A finite distribution; probabilities must sum to exactly one.
    pub fn finite(variable: &str, outcomes: Vec<(Expr, Expr)>) -> Result<RandomVar> {
        if outcomes.is_empty() {
            return Err(Error::InvalidDistribution {
                distribution: "finite".to_string(),
                message: "no outcomes".to_string(),
            });
        }
        let sum: Expr = outcomes.iter().map(|(_, p)| p.clone()).sum();
        if !sum.equals(&Expr::one()) {
            return Err(Error::ProbabilityMismatch {
                variable: variable.to_string(),
                sum: sum.to_string(),
            });
        }
        Ok(RandomVar::Finite(outcomes))
    }

    /// The raw moment `E[X^k]`.
    pub fn moment(&self, k: u32) -> Result<Expr> {
        if k == 0 {
            return Ok(Expr::one());
        }
        match self {
            RandomVar::Finite(outcomes) => Ok(outcomes.iter().map(|(v, p)| p * &v.pow(k)).sum()),
            RandomVar::Uniform { low, high } => {
                // (u^(k+1) - l^(k+1)) / ((k+1)(u - l))
                let numerator = high.pow(k + 1) - low.pow(k + 1);
                let denominator = Expr::integer(i64::from(k) + 1) * (high - low);
                numerator.checked_div(&denominator)
            }
            RandomVar::Gaussian { mean, variance } => Ok(gaussian_moment(mean, variance, k)),
            RandomVar::SymbolicSupport { .. } => Err(Error::Unsupported(format!(
                "moment {} of a distribution with only a symbolic support",
                k
            ))),
            RandomVar::Unknown { name } => Ok(Expr::from(Symbol::new(&format!("{}(0)", name))).pow(k)),
        }
    }

    /// An interval containing `X^k`, if the distribution has a known support.
    pub fn support(&self, k: u32) -> Option<(Bound, Bound)> {
        match self {
            RandomVar::Uniform { low, high } | RandomVar::SymbolicSupport { low, high } => Some(interval_to_power(
                &Bound::Finite(low.clone()),
                &Bound::Finite(high.clone()),
                k,
            )),
            RandomVar::Gaussian { .. } => Some(interval_to_power(&Bound::NegInfinity, &Bound::PosInfinity, k)),
            RandomVar::Finite(outcomes) => {
                let values: Option<Vec<_>> = outcomes.iter().map(|(v, _)| v.as_rational()).collect();
                let values = values?;
                let low = values.iter().min()?;
                let high = values.iter().max()?;
                Some(interval_to_power(
                    &Bound::Finite(Expr::constant(low.clone())),
                    &Bound::Finite(Expr::constant(high.clone())),
                    k,
                ))
            }
            RandomVar::Unknown { .. } => None,
        }
    }
}

/// `Σ_{j even} C(k, j) * μ^(k-j) * (σ²)^(j/2) * (j-1)!!`
fn gaussian_moment(mean: &Expr, variance: &Expr, k: u32) -> Expr {
    (0..=k)
        .step_by(2)
        .map(|j| {
            let factor = binomial(k, j) * double_factorial(i64::from(j) - 1);
            Expr::constant(factor.into()) * mean.pow(k - j) * variance.pow(j / 2)
        })
        .sum()
}

/// The first moment of a random variable.
pub fn expected_value(rv: &RandomVar) -> Result<Expr> {
    rv.moment(1)
}

/// An end of an interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    NegInfinity,
    Finite(Expr),
    PosInfinity,
}

impl Bound {
    fn pow(&self, k: u32) -> Bound {
        match self {
            _ if k == 0 => Bound::Finite(Expr::one()),
            Bound::Finite(e) => Bound::Finite(e.pow(k)),
            Bound::PosInfinity => Bound::PosInfinity,
            Bound::NegInfinity if k % 2 == 0 => Bound::PosInfinity,
            Bound::NegInfinity => Bound::NegInfinity,
        }
    }

    fn is_negative(&self) -> bool {
        match self {
            Bound::NegInfinity => true,
            Bound::Finite(e) => e.is_negative(),
            Bound::PosInfinity => false,
        }
    }

    fn is_nonnegative(&self) -> bool {
        match self {
            Bound::NegInfinity => false,
            Bound::Finite(e) => e.is_zero() || e.is_positive(),
            Bound::PosInfinity => true,
        }
    }

    /// An upper bound of both arguments, both nonnegative.
    fn max(a: &Bound, b: &Bound) -> Bound {
        match (a, b) {
            (Bound::Finite(x), Bound::Finite(y)) => match (x.as_rational(), y.as_rational()) {
                (Some(p), Some(q)) => Bound::Finite(if p >= q { x.clone() } else { y.clone() }),
                _ => Bound::Finite(x + y),
            },
            _ => Bound::PosInfinity,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInfinity => write!(f, "-oo"),
            Bound::Finite(e) => write!(f, "{}", e),
            Bound::PosInfinity => write!(f, "oo"),
        }
    }
}

/// For `x ∈ [low, high]`, an interval containing `x^k`.
///
/// For even powers over an interval that may contain negative values, the
/// lower end is `0`; when the order of `low^k` and `high^k` cannot be decided,
/// their sum serves as the upper end.
pub fn interval_to_power(low: &Bound, high: &Bound, k: u32) -> (Bound, Bound) {
    let l = low.pow(k);
    let h = high.pow(k);
    if k % 2 != 0 || k == 0 || low.is_nonnegative() {
        return (l, h);
    }
    if high.is_negative() {
        return (h, l);
    }
    (Bound::Finite(Expr::zero()), Bound::max(&h, &l))
}

impl fmt::Display for RandomVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RandomVar::Finite(outcomes) => {
                write!(f, "RV(finite")?;
                for (v, p) in outcomes {
                    write!(f, ", {} @ {}", v, p)?;
                }
                write!(f, ")")
            }
            RandomVar::Uniform { low, high } => write!(f, "RV(uniform, {}, {})", low, high),
            RandomVar::Gaussian { mean, variance } => write!(f, "RV(gauss, {}, {})", mean, variance),
            RandomVar::SymbolicSupport { low, high } => write!(f, "RV(symbolic-support, {}, {})", low, high),
            RandomVar::Unknown { .. } => write!(f, "RV(unknown)"),
        }
    }
}
