//! # evar-rs: Exact expected values for probabilistic loops
//!
//! **`evar-rs`** computes, for polynomial quantities over the variables of a probabilistic while-loop,
//! their expected value after `n` iterations as an exact closed form in `n`.
//!
//! ## What is an EVAR?
//!
//! An *expected-value variable* (EVAR) is a monomial such as `x`, `x^2`, or `x*y` over the program variables.
//! Pushing an EVAR backwards through one loop iteration yields a linear recurrence
//! relating its expectation at iteration `n+1` to expectations of (other) EVARs at iteration `n`.
//! Solving these recurrences bottom-up gives closed forms like `n^2` or `y0*(2*p)^n`.
//!
//! ## Key Features
//!
//! - **Exact**: all arithmetic is over rationals and rational functions of free parameters. Decimal literals such as `0.1` are read as exact fractions.
//! - **Symbolic parameters**: probabilities and update expressions may mention free parameters (`p`, `mu`, ...), which are assumed positive.
//! - **Random draws**: finite, uniform, Gaussian, symbolic-support, and unknown distributions, with exact moments.
//! - **Memoized**: every EVAR and every recurrence is derived once per [`Engine`][crate::engine::Engine].
//!
//! ## Basic Usage
//!
//! ```rust
//! use evar_rs::engine::solve;
//! use evar_rs::expr::Expr;
//! use evar_rs::program::Program;
//!
//! // A symmetric random walk starting at x0.
//! let program = Program::builder()
//!     .var("x", "x0", "x + 1 @ 1/2; x - 1 @ 1/2")
//!     .build()
//!     .unwrap();
//!
//! let goals: Vec<Expr> = vec!["x".parse().unwrap(), "x^2".parse().unwrap()];
//! let solutions = solve(&program, Some(goals.as_slice()), 1).unwrap();
//!
//! assert_eq!(solutions[&goals[0]].to_string(), "x0");
//! assert_eq!(solutions[&goals[1]].to_string(), "n + x0^2");
//! ```
//!
//! ## Core Components
//!
//! - **[`engine`]**: The [`Engine`][crate::engine::Engine] and the [`solve`][crate::engine::solve] entry point.
//! - **[`program`]**, **[`update`]**, **[`random_var`]**: The data model of probabilistic loops.
//! - **[`algebra`]**: The symbolic capabilities the engine relies on, and the closed-form summation.
//! - **[`expr`]**, **[`polynomial`]**, **[`closed_form`]**: Exact symbolic values.

pub mod algebra;
pub mod cache;
pub mod closed_form;
pub mod debug;
pub mod engine;
pub mod error;
pub mod evar;
pub mod expr;
pub mod monomial;
pub mod parser;
pub mod poly;
pub mod polynomial;
pub mod program;
pub mod random_var;
pub mod recurrence;
pub mod symbol;
pub mod update;
pub mod utils;

pub use error::{Error, Result};
