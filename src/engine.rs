//! The expected-value engine.
//!
//! For a monomial `m` over the program variables, the engine
//!
//! 1. derives the one-step recurrence `E[m'] = c * E[m] + Σ a_i * E[m_i] + a_0`
//!    by pushing `m` backwards through the loop body ([`Engine::get_recurrence`]);
//! 2. solves every `m_i` of the inhomogeneous part, recursively;
//! 3. solves `f(n+1) = c * f(n) + g(n)` with `f(0) = E[m at iteration 0]`.
//!
//! Solutions and recurrences are memoized for the lifetime of the engine, so
//! monomials shared between several dependency chains are solved once.
//!
//! # Traversal
//!
//! Step 2 is driven by an explicit worklist. Each open frame holds a monomial
//! whose recurrence is known and the dependencies it is still waiting for; a
//! frame is closed once every dependency has a solution. A dependency that is
//! already open further down the worklist is a cycle and is reported as
//! [`Error::CyclicDependency`].

use std::collections::BTreeMap;

use log::{debug, info, trace};
use num_rational::BigRational;
use num_traits::One;

use crate::algebra::{Algebra, ExactAlgebra};
use crate::cache::Cache;
use crate::closed_form::ClosedForm;
use crate::error::{Error, Result};
use crate::evar::Evar;
use crate::expr::Expr;
use crate::monomial::Monomial;
use crate::poly::Poly;
use crate::polynomial::Polynomial;
use crate::program::Program;
use crate::recurrence::Recurrence;
use crate::symbol::Symbol;
use crate::update::Update;

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Initial capacity of each memo store, as a power of two.
    pub cache_bits: usize,
    /// Maximum number of simultaneously open worklist frames.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_bits: 10,
            max_depth: 10_000,
        }
    }
}

impl EngineConfig {
    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Closed forms of the requested goals.
pub type Solutions = BTreeMap<Expr, ClosedForm>;

/// An open worklist frame.
#[derive(Debug)]
struct Frame {
    evar: Evar,
    constant: Expr,
    inhomogeneous: Polynomial,
    /// Dependencies not yet known to be solved; the last one is next.
    pending: Vec<Evar>,
}

/// Memoizing solver for the EVARs of one [`Program`].
pub struct Engine<'p, A: Algebra = ExactAlgebra> {
    program: &'p Program,
    algebra: A,
    config: EngineConfig,
    pub(crate) solutions: Cache<Evar, ClosedForm>,
    pub(crate) recurrences: Cache<Monomial, Polynomial>,
}

impl<'p> Engine<'p> {
    pub fn new(program: &'p Program) -> Self {
        Engine::with_config(program, EngineConfig::default())
    }

    pub fn with_config(program: &'p Program, config: EngineConfig) -> Self {
        Engine::with_algebra(program, ExactAlgebra, config)
    }
}

impl<'p, A: Algebra> Engine<'p, A> {
    pub fn with_algebra(program: &'p Program, algebra: A, config: EngineConfig) -> Self {
        Self {
            program,
            algebra,
            config,
            solutions: Cache::new(config.cache_bits),
            recurrences: Cache::new(config.cache_bits),
        }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn algebra(&self) -> &A {
        &self.algebra
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Every solution computed so far, including intermediate EVARs.
    pub fn solutions(&self) -> impl Iterator<Item = (&Evar, &ClosedForm)> {
        self.solutions.iter()
    }

    /// The EVAR of a polynomial that is a single term.
    pub fn evar_of(&self, expr: &Expr) -> Result<Evar> {
        let poly = self.algebra.expand(expr, &self.program.gens())?;
        let mut terms = poly.terms();
        match (terms.next(), terms.next()) {
            (None, _) => Ok(Evar::new(Expr::zero(), Monomial::one())),
            (Some((m, c)), None) => Ok(Evar::new(c.clone(), m.clone())),
            _ => Err(Error::Unsupported(format!("`{}` is not a single monomial", expr))),
        }
    }

    /// Closed form of `E[goal]` for a polynomial `goal`, by linearity.
    pub fn solve_expr(&mut self, goal: &Expr) -> Result<ClosedForm> {
        let poly = self.algebra.expand(goal, &self.program.gens())?;
        let n = Symbol::n();
        let mut result = ClosedForm::zero();
        for (monomial, coefficient) in poly.terms() {
            let term = if monomial.is_one() {
                ClosedForm::from_expr(coefficient)?
            } else if coefficient.contains(&n) {
                let solution = self.get_solution(&Evar::monic(monomial.clone()))?;
                solution.mul_expr(coefficient)?
            } else {
                self.get_solution(&Evar::new(coefficient.clone(), monomial.clone()))?
            };
            result = result.add(&term);
        }
        Ok(result)
    }

    /// Closed form of `E[evar]` after `n` iterations, memoized.
    pub fn get_solution(&mut self, evar: &Evar) -> Result<ClosedForm> {
        if evar.is_constant() {
            return ClosedForm::from_expr(evar.factor());
        }
        if let Some(solution) = self.solutions.get(evar) {
            return Ok(solution.clone());
        }

        debug!("Start get solution, {}", evar);
        let mut current = self.open_frame(evar.clone())?;
        let mut stack: Vec<Frame> = Vec::new();
        loop {
            match current.pending.last().cloned() {
                Some(dep) if self.solutions.contains(&dep) => {
                    current.pending.pop();
                }
                Some(dep) => {
                    if current.evar == dep || stack.iter().any(|f| f.evar == dep) {
                        return Err(Error::CyclicDependency(dep.to_string()));
                    }
                    if stack.len() + 1 >= self.config.max_depth {
                        return Err(Error::DepthExceeded(self.config.max_depth));
                    }
                    let child = self.open_frame(dep)?;
                    stack.push(std::mem::replace(&mut current, child));
                }
                None => {
                    let solution = self.close_frame(current)?;
                    match stack.pop() {
                        Some(parent) => current = parent,
                        None => return Ok(solution),
                    }
                }
            }
        }
    }

    fn open_frame(&mut self, evar: Evar) -> Result<Frame> {
        let recurrence = self.get_recurrence(evar.monomial())?;
        let constant = self.algebra.coefficient_of(&recurrence, evar.monomial());
        let inhomogeneous = recurrence.without(evar.monomial());
        let pending: Vec<Evar> = inhomogeneous
            .monomials()
            .map(|m| Evar::monic(m.clone()))
            .collect();
        debug!(
            "Recurrence of {}: constant {}, inhomogeneous part {}",
            evar, constant, inhomogeneous
        );
        Ok(Frame {
            evar,
            constant,
            inhomogeneous,
            pending,
        })
    }

    fn close_frame(&mut self, frame: Frame) -> Result<ClosedForm> {
        let Frame {
            evar,
            constant,
            inhomogeneous,
            ..
        } = frame;

        let mut g = ClosedForm::from_expr(&inhomogeneous.constant_term())?;
        for (monomial, coefficient) in inhomogeneous.terms() {
            if monomial.is_one() {
                continue;
            }
            let dependency = Evar::monic(monomial.clone());
            let solution = self
                .solutions
                .get(&dependency)
                .cloned()
                .ok_or_else(|| Error::CyclicDependency(dependency.to_string()))?;
            g = g.add(&solution.mul_expr(coefficient)?);
        }

        let initial = self.get_expected_initial_value(evar.monomial())?;
        let recurrence = Recurrence::new(constant, initial, g);
        let solution = recurrence.solve(&self.algebra)?.scale(evar.factor());

        info!("E[{}] = {}", evar, solution);
        self.solutions.insert(evar, solution.clone());
        Ok(solution)
    }

    /// One-step recurrence of `monomial`, memoized.
    pub fn get_recurrence(&mut self, monomial: &Monomial) -> Result<Polynomial> {
        if monomial.is_one() {
            return Ok(Polynomial::constant(self.program.gens(), Expr::one()));
        }
        if let Some(recurrence) = self.recurrences.get(monomial) {
            return Ok(recurrence.clone());
        }
        let recurrence = self.compute_recurrence(monomial)?;
        self.recurrences.insert(monomial.clone(), recurrence.clone());
        Ok(recurrence)
    }

    /// Pushes `monomial` backwards through the loop body, last update first.
    pub fn compute_recurrence(&self, monomial: &Monomial) -> Result<Polynomial> {
        debug!("Start compute recurrence, {}", monomial);
        let mut result = monomial_expr(monomial);
        for (variable, update) in self.program.updates().rev() {
            if !result.contains(variable) {
                continue;
            }
            result = match update {
                Update::RandomDraw(rv) => {
                    let coefficients = result
                        .coefficients_in(variable)
                        .ok_or_else(|| Error::NotPolynomial(result.to_string()))?;
                    let mut replaced = Expr::zero();
                    for (k, coefficient) in (0u32..).zip(&coefficients) {
                        if !coefficient.is_zero() {
                            replaced += &(coefficient * &rv.moment(k)?);
                        }
                    }
                    replaced
                }
                Update::Branching(branches) => {
                    trace!("Combining {} branches of {}", branches.len(), variable);
                    let mut combined = Expr::zero();
                    for branch in branches {
                        combined += &(&branch.probability * &result.subs(variable, &branch.expr)?);
                    }
                    combined
                }
            };
            trace!("After {}: {}", variable, result);
        }
        self.algebra.expand(&result, &self.program.gens())
    }

    /// The distinct outcomes of one loop iteration for `evar`, with their
    /// probabilities.
    ///
    /// Equal outcomes are merged. Random draws are replaced by their moments.
    pub fn branches_of(&self, evar: &Evar) -> Result<Vec<(Polynomial, Expr)>> {
        let mut branches: Vec<(Expr, Expr)> = vec![(evar.to_expr(), Expr::one())];
        for (variable, update) in self.program.updates().rev() {
            if !branches.iter().any(|(e, _)| e.contains(variable)) {
                continue;
            }
            let mut next: Vec<(Expr, Expr)> = Vec::new();
            for (expr, probability) in &branches {
                if !expr.contains(variable) {
                    merge(&mut next, expr.clone(), probability.clone());
                    continue;
                }
                match update {
                    Update::RandomDraw(rv) => {
                        let coefficients = expr
                            .coefficients_in(variable)
                            .ok_or_else(|| Error::NotPolynomial(expr.to_string()))?;
                        let mut replaced = Expr::zero();
                        for (k, coefficient) in (0u32..).zip(&coefficients) {
                            if !coefficient.is_zero() {
                                replaced += &(coefficient * &rv.moment(k)?);
                            }
                        }
                        merge(&mut next, replaced, probability.clone());
                    }
                    Update::Branching(update_branches) => {
                        for branch in update_branches {
                            let substituted = expr.subs(variable, &branch.expr)?;
                            merge(&mut next, substituted, probability * &branch.probability);
                        }
                    }
                }
            }
            branches = next;
        }

        let gens = self.program.gens();
        branches
            .into_iter()
            .map(|(e, p)| Ok((self.algebra.expand(&e, &gens)?, p)))
            .collect()
    }

    /// `E[monomial]` before the first iteration, assuming independent
    /// initial values.
    pub fn get_expected_initial_value(&self, monomial: &Monomial) -> Result<Expr> {
        let mut result = Expr::one();
        for (variable, exponent) in monomial.powers() {
            let update = self
                .program
                .initial_value(variable)
                .ok_or_else(|| Error::MissingUpdate(variable.to_string(), "initial value"))?;
            result *= &update.power(exponent)?;
        }
        result.subs(&Symbol::n(), &Expr::zero())
    }
}

fn monomial_expr(monomial: &Monomial) -> Expr {
    Expr::from_poly(Poly::term(monomial.clone(), BigRational::one()))
}

/// Adds `probability` to the branch equal to `expr`, or appends a new one.
fn merge(branches: &mut Vec<(Expr, Expr)>, expr: Expr, probability: Expr) {
    match branches.iter_mut().find(|(e, _)| e.equals(&expr)) {
        Some((_, p)) => *p += &probability,
        None => branches.push((expr, probability)),
    }
}

/// Solves `goals` (default: every variable raised to `power`) over a fresh
/// engine.
///
/// ```
/// use evar_rs::engine::solve;
/// use evar_rs::expr::Expr;
/// use evar_rs::program::Program;
///
/// let program = Program::builder()
///     .var("x", "0", "x + 1")
///     .build()
///     .unwrap();
/// let solutions = solve(&program, None, 2).unwrap();
/// let goal: Expr = "x^2".parse().unwrap();
/// assert_eq!(solutions[&goal].to_string(), "n^2");
/// ```
pub fn solve(program: &Program, goals: Option<&[Expr]>, power: u32) -> Result<Solutions> {
    let goals: Vec<Expr> = match goals {
        Some(goals) => goals.to_vec(),
        None => program
            .variables()
            .iter()
            .map(|v| Expr::from(v.clone()).pow(power))
            .collect(),
    };

    let mut engine = Engine::new(program);
    let mut solutions = Solutions::new();
    for goal in goals {
        let solution = engine.solve_expr(&goal)?;
        solutions.insert(goal, solution);
    }
    info!("{}", engine.stats());
    Ok(solutions)
}
