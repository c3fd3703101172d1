//! Named symbols: program variables, free parameters, and the iteration index.
//!
//! A [`Symbol`] is identified by its name alone. It additionally carries a
//! positivity assumption, which feeds the sign checks in
//! [`Expr::is_positive`][crate::expr::Expr::is_positive] but does not take part
//! in equality, hashing, or ordering.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Name of the reserved iteration-index symbol.
pub const ITERATION_INDEX: &str = "n";

/// A named symbol.
///
/// # Invariants
///
/// - The name is non-empty.
/// - Two symbols are equal iff their names are equal.
#[derive(Debug, Clone)]
pub struct Symbol {
    name: Arc<str>,
    positive: bool,
}

impl Symbol {
    /// Creates a new symbol without assumptions.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    pub fn new(name: &str) -> Self {
        assert!(!name.is_empty(), "Symbol names must be non-empty");
        Symbol {
            name: Arc::from(name),
            positive: false,
        }
    }

    /// Creates a new symbol assumed to be strictly positive.
    pub fn positive(name: &str) -> Self {
        Symbol::new(name).with_positive(true)
    }

    /// The iteration index `n`.
    pub fn n() -> Self {
        Symbol::new(ITERATION_INDEX)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }

    pub fn is_iteration_index(&self) -> bool {
        &*self.name == ITERATION_INDEX
    }

    pub fn with_positive(self, positive: bool) -> Self {
        Symbol { positive, ..self }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}
