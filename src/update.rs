//! Per-variable transition rules.
//!
//! An update is written either as a probabilistic choice
//!
//! ```text
//! x + 1 @ 1/2; x - 1 @ 1/2
//! ```
//!
//! where at most one clause may omit its probability (it takes the remaining
//! mass), or as a draw `RV(distribution, params...)`.

use std::fmt;

use log::trace;

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::parser::split_top_level;
use crate::random_var::RandomVar;
use crate::symbol::Symbol;

/// One alternative of a probabilistic choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub expr: Expr,
    pub probability: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Nonzero-probability branches summing to one.
    Branching(Vec<Branch>),
    /// A fresh draw, independent of the previous value.
    RandomDraw(RandomVar),
}

impl Update {
    /// Parses the update of `variable`.
    ///
    /// Symbols outside `program_variables` are free parameters and are
    /// assumed positive.
    pub fn parse(variable: &str, text: &str, program_variables: &[Symbol]) -> Result<Update> {
        let trimmed = text.trim();
        if let Some(params) = trimmed.strip_prefix("RV(").and_then(|t| t.strip_suffix(')')) {
            let rv = RandomVar::parse(params, variable, program_variables)?;
            return Ok(Update::RandomDraw(rv));
        }

        let positivity = |e: Expr| e.with_positivity(|s| !program_variables.contains(s));

        let mut explicit = Vec::new();
        let mut implicit = None;
        for (index, clause) in split_top_level(trimmed, ';').into_iter().enumerate() {
            let clause = clause.trim();
            if clause.is_empty() {
                return Err(Error::parse(text, "empty branch"));
            }
            match clause.split_once('@') {
                Some((expr, probability)) => {
                    let expr = positivity(expr.parse()?);
                    let probability = positivity(probability.parse()?);
                    if let Some(s) = probability
                        .free_symbols()
                        .into_iter()
                        .find(|s| s.is_iteration_index() || program_variables.contains(s))
                    {
                        return Err(Error::InvalidProbability {
                            variable: variable.to_string(),
                            message: format!("probability `{}` mentions `{}`", probability, s),
                        });
                    }
                    explicit.push((index, Branch { expr, probability }));
                }
                None => {
                    if implicit.is_some() {
                        return Err(Error::InvalidProbability {
                            variable: variable.to_string(),
                            message: "more than one branch without a probability".to_string(),
                        });
                    }
                    implicit = Some((index, positivity(clause.parse()?)));
                }
            }
        }

        let mut branches = explicit;
        if let Some((index, expr)) = implicit {
            let rest: Expr = branches.iter().map(|(_, b)| b.probability.clone()).sum();
            let probability = Expr::one() - rest;
            trace!("Inferred probability {} for `{}` in update of {}", probability, expr, variable);
            branches.push((index, Branch { expr, probability }));
            branches.sort_by_key(|(i, _)| *i);
        }

        Update::branching(variable, branches.into_iter().map(|(_, b)| b).collect())
    }

    /// Validates a probabilistic choice: zero-probability branches are
    /// dropped and the rest must sum to exactly one.
    pub fn branching(variable: &str, branches: Vec<Branch>) -> Result<Update> {
        let branches: Vec<Branch> = branches.into_iter().filter(|b| !b.probability.is_zero()).collect();
        let sum: Expr = branches.iter().map(|b| b.probability.clone()).sum();
        if !sum.equals(&Expr::one()) {
            return Err(Error::ProbabilityMismatch {
                variable: variable.to_string(),
                sum: sum.to_string(),
            });
        }
        Ok(Update::Branching(branches))
    }

    /// `x := expr` with probability one.
    pub fn deterministic(expr: Expr) -> Update {
        Update::Branching(vec![Branch {
            expr,
            probability: Expr::one(),
        }])
    }

    pub fn random(rv: RandomVar) -> Update {
        Update::RandomDraw(rv)
    }

    pub fn is_random(&self) -> bool {
        matches!(self, Update::RandomDraw(_))
    }

    /// Branches of a probabilistic choice; empty for draws.
    pub fn branches(&self) -> &[Branch] {
        match self {
            Update::Branching(branches) => branches,
            Update::RandomDraw(_) => &[],
        }
    }

    /// `E[value^k]`, treating the previous values of all variables as fixed.
    pub fn power(&self, k: u32) -> Result<Expr> {
        match self {
            Update::Branching(branches) => Ok(branches.iter().map(|b| &b.probability * &b.expr.pow(k)).sum()),
            Update::RandomDraw(rv) => rv.moment(k),
        }
    }

    /// Symbols the update mentions.
    pub fn free_symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = match self {
            Update::Branching(branches) => branches.iter().flat_map(|b| b.expr.free_symbols()).collect(),
            Update::RandomDraw(RandomVar::Finite(outcomes)) => {
                outcomes.iter().flat_map(|(v, _)| v.free_symbols()).collect()
            }
            Update::RandomDraw(
                RandomVar::Uniform { low: a, high: b }
                | RandomVar::SymbolicSupport { low: a, high: b }
                | RandomVar::Gaussian { mean: a, variance: b },
            ) => a.free_symbols().into_iter().chain(b.free_symbols()).collect(),
            Update::RandomDraw(RandomVar::Unknown { .. }) => Vec::new(),
        };
        symbols.sort();
        symbols.dedup();
        symbols
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Branching(branches) => {
                for (i, b) in branches.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{} @ {}", b.expr, b.probability)?;
                }
                Ok(())
            }
            Update::RandomDraw(rv) => write!(f, "{}", rv),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn vars() -> Vec<Symbol> {
        vec![Symbol::new("x"), Symbol::new("y")]
    }

    fn parse(s: &str) -> Expr {
        s.parse().unwrap()
    }

    #[test]
    fn test_probabilities_must_sum_to_one() {
        let result = Update::parse("x", "x + 1 @ 0.5; x - 1 @ 0.4", &vars());
        match result {
            Err(Error::ProbabilityMismatch { variable, sum }) => {
                assert_eq!(variable, "x");
                assert_eq!(sum, "9/10");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_omitted_probability_is_inferred() {
        let update = Update::parse("x", "x + 1 @ 1/2; x - 1", &vars()).unwrap();
        let branches = update.branches();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[1].expr, parse("x - 1"));
        assert_eq!(branches[1].probability, Expr::rational(1, 2));
    }

    #[test]
    fn test_omitted_probability_keeps_clause_order() {
        let update = Update::parse("x", "0; x @ 1/4", &vars()).unwrap();
        let branches = update.branches();
        assert_eq!(branches[0].expr, Expr::zero());
        assert_eq!(branches[0].probability, Expr::rational(3, 4));
    }

    #[test]
    fn test_single_expression_is_deterministic() {
        let update = Update::parse("x", "x + y", &vars()).unwrap();
        assert_eq!(update, Update::deterministic(parse("x + y")));
    }

    #[test]
    fn test_zero_probability_branches_are_dropped() {
        let update = Update::parse("x", "x @ 1; 2*x @ 0", &vars()).unwrap();
        assert_eq!(update.branches().len(), 1);
    }

    #[test]
    fn test_decimals_are_exact() {
        let update = Update::parse("x", "x + 0.1 @ 0.3; x @ 0.7", &vars()).unwrap();
        let branches = update.branches();
        assert_eq!(branches[0].expr, parse("x + 1/10"));
        assert_eq!(branches[0].probability, Expr::rational(3, 10));
    }

    #[test]
    fn test_symbolic_probabilities() {
        let update = Update::parse("y", "2*y @ p; 0 @ 1 - p", &vars()).unwrap();
        let branches = update.branches();
        assert!(branches[0].probability.is_positive());
        assert_eq!(update.power(1).unwrap(), parse("2*p*y"));
    }

    #[test]
    fn test_invalid_probabilities() {
        assert!(matches!(
            Update::parse("x", "x @ y; 0 @ 1 - y", &vars()),
            Err(Error::InvalidProbability { .. })
        ));
        assert!(matches!(
            Update::parse("x", "x @ 1/n; 0", &vars()),
            Err(Error::InvalidProbability { .. })
        ));
        assert!(matches!(
            Update::parse("x", "x; 0", &vars()),
            Err(Error::InvalidProbability { .. })
        ));
        assert!(matches!(Update::parse("x", "x @ 1;", &vars()), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_random_draw() {
        let update = Update::parse("x", "RV(uniform, 0, 2)", &vars()).unwrap();
        assert!(update.is_random());
        assert!(update.branches().is_empty());
        assert_eq!(update.power(1).unwrap(), Expr::one());
        assert_eq!(update.power(2).unwrap(), Expr::rational(4, 3));
    }

    #[test]
    fn test_free_symbols() {
        let update = Update::parse("x", "x + y @ 1/2; a @ 1/2", &vars()).unwrap();
        let names: Vec<_> = update.free_symbols().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["a", "x", "y"]);
    }
}
