//! Debug utilities for inspecting engine state.
//!
//! These are primarily useful in tests, benchmarks, and during development.

use std::fmt::Write;

use crate::algebra::Algebra;
use crate::engine::Engine;

/// Counters of the two memo stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Number of solved EVARs
    pub solutions: usize,
    pub solution_hits: usize,
    pub solution_misses: usize,
    /// Number of derived recurrences
    pub recurrences: usize,
    pub recurrence_hits: usize,
    pub recurrence_misses: usize,
}

impl std::fmt::Display for EngineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "solutions: {} (hits={}, misses={}), recurrences: {} (hits={}, misses={})",
            self.solutions,
            self.solution_hits,
            self.solution_misses,
            self.recurrences,
            self.recurrence_hits,
            self.recurrence_misses,
        )
    }
}

impl<A: Algebra> Engine<'_, A> {
    /// Snapshot of the memo store counters.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            solutions: self.solutions.len(),
            solution_hits: self.solutions.hits(),
            solution_misses: self.solutions.misses(),
            recurrences: self.recurrences.len(),
            recurrence_hits: self.recurrences.hits(),
            recurrence_misses: self.recurrences.misses(),
        }
    }

    /// Dump the program and every memoized recurrence and solution.
    pub fn dump_state(&self) -> String {
        let mut result = String::new();

        writeln!(&mut result, "=== Engine State ===").unwrap();
        write!(&mut result, "{}", self.program()).unwrap();
        writeln!(&mut result, "{}", self.stats()).unwrap();

        let mut recurrences: Vec<_> = self.recurrences.iter().collect();
        recurrences.sort_by(|a, b| b.0.cmp(a.0));
        writeln!(&mut result, "Recurrences:").unwrap();
        for (monomial, recurrence) in recurrences {
            writeln!(&mut result, "  {}' = {}", monomial, recurrence).unwrap();
        }

        let mut solutions: Vec<_> = self.solutions().map(|(e, s)| (e.to_string(), s)).collect();
        solutions.sort_by(|a, b| a.0.cmp(&b.0));
        writeln!(&mut result, "Solutions:").unwrap();
        for (evar, solution) in solutions {
            writeln!(&mut result, "  E[{}] = {}", evar, solution).unwrap();
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;
    use crate::expr::Expr;
    use crate::program::Program;

    #[test]
    fn test_stats_track_store_usage() {
        let program = Program::builder().var("x", "0", "x + 1").build().unwrap();
        let mut engine = Engine::new(&program);
        let goal: Expr = "x^2".parse().unwrap();

        engine.solve_expr(&goal).unwrap();
        let stats = engine.stats();
        assert_eq!(stats.solutions, 2);
        assert_eq!(stats.recurrences, 2);
        assert_eq!(stats.recurrence_hits, 0);

        engine.solve_expr(&goal).unwrap();
        let again = engine.stats();
        assert_eq!(again.solution_hits, stats.solution_hits + 1);
        assert_eq!(again.recurrence_misses, stats.recurrence_misses);
    }

    #[test]
    fn test_dump_state() {
        let program = Program::builder().var("x", "0", "x + 1").build().unwrap();
        let mut engine = Engine::new(&program);
        engine.solve_expr(&"x".parse().unwrap()).unwrap();

        let dump = engine.dump_state();
        assert!(dump.contains("=== Engine State ==="));
        assert!(dump.contains("x' = x + 1"));
        assert!(dump.contains("E[x] = n"));
    }
}
