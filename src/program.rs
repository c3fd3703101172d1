//! Probabilistic loops: variables, their updates, and their initial values.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::symbol::{Symbol, ITERATION_INDEX};
use crate::update::Update;

/// A loop body `while true { x1 = u1; ...; xk = uk }` together with the
/// distribution of each variable before the first iteration.
///
/// Updates are applied sequentially in declaration order within an iteration.
#[derive(Debug, Clone)]
pub struct Program {
    variables: Arc<[Symbol]>,
    updates: Vec<Update>,
    initial: Vec<Update>,
}

impl Program {
    /// Builds a program from already-constructed updates.
    pub fn new(
        variables: Vec<Symbol>,
        mut updates: HashMap<Symbol, Update>,
        mut initial: HashMap<Symbol, Update>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for v in &variables {
            if v.is_iteration_index() {
                return Err(Error::ReservedSymbol(v.to_string()));
            }
            if !seen.insert(v.clone()) {
                return Err(Error::DuplicateVariable(v.to_string()));
            }
        }
        if let Some(v) = updates.keys().chain(initial.keys()).find(|v| !seen.contains(*v)) {
            return Err(Error::UnknownVariable(v.to_string()));
        }

        let mut ordered_updates = Vec::with_capacity(variables.len());
        let mut ordered_initial = Vec::with_capacity(variables.len());
        for v in &variables {
            let update = updates
                .remove(v)
                .ok_or_else(|| Error::MissingUpdate(v.to_string(), "update"))?;
            let init = initial
                .remove(v)
                .ok_or_else(|| Error::MissingUpdate(v.to_string(), "initial value"))?;
            ordered_updates.push(update);
            ordered_initial.push(init);
        }

        let program = Program {
            variables: variables.into(),
            updates: ordered_updates,
            initial: ordered_initial,
        };
        debug!("Program:\n{}", program);
        Ok(program)
    }

    pub fn builder() -> ProgramBuilder {
        ProgramBuilder::default()
    }

    /// Program variables in declaration order.
    pub fn variables(&self) -> &[Symbol] {
        &self.variables
    }

    /// Program variables, as polynomial generators.
    pub fn gens(&self) -> Arc<[Symbol]> {
        self.variables.clone()
    }

    pub fn is_variable(&self, symbol: &Symbol) -> bool {
        self.variables.contains(symbol)
    }

    fn index_of(&self, variable: &Symbol) -> Option<usize> {
        self.variables.iter().position(|v| v == variable)
    }

    /// `(variable, update)` pairs in declaration order.
    pub fn updates(&self) -> impl DoubleEndedIterator<Item = (&Symbol, &Update)> {
        self.variables.iter().zip(self.updates.iter())
    }

    pub fn update(&self, variable: &Symbol) -> Option<&Update> {
        self.index_of(variable).map(|i| &self.updates[i])
    }

    pub fn initial_value(&self, variable: &Symbol) -> Option<&Update> {
        self.index_of(variable).map(|i| &self.initial[i])
    }

    /// For every variable, the program variables its update mentions.
    pub fn dependencies(&self) -> BTreeMap<Symbol, BTreeSet<Symbol>> {
        self.updates()
            .map(|(v, u)| {
                let deps = u.free_symbols().into_iter().filter(|s| self.is_variable(s)).collect();
                (v.clone(), deps)
            })
            .collect()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.variables.iter().enumerate() {
            writeln!(f, "{} = {}", v, self.initial[i])?;
        }
        writeln!(f, "while true:")?;
        for (v, u) in self.updates() {
            writeln!(f, "    {} = {}", v, u)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Source {
    Text(String),
    Update(Update),
}

/// Incremental construction of a [`Program`] from update strings.
///
/// ```
/// use evar_rs::program::Program;
///
/// let program = Program::builder()
///     .var("x", "0", "x + 1 @ 1/2; x - 1 @ 1/2")
///     .build()
///     .unwrap();
/// assert_eq!(program.variables().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    entries: Vec<(String, Source, Source)>,
}

impl ProgramBuilder {
    /// Declares a variable with its initial value and update as text.
    pub fn var(mut self, name: &str, initial: &str, update: &str) -> Self {
        self.entries.push((
            name.to_string(),
            Source::Text(initial.to_string()),
            Source::Text(update.to_string()),
        ));
        self
    }

    /// Declares a variable with pre-built updates.
    pub fn var_with(mut self, name: &str, initial: Update, update: Update) -> Self {
        self.entries
            .push((name.to_string(), Source::Update(initial), Source::Update(update)));
        self
    }

    pub fn build(self) -> Result<Program> {
        let mut variables = Vec::with_capacity(self.entries.len());
        for (name, _, _) in &self.entries {
            if name == ITERATION_INDEX {
                return Err(Error::ReservedSymbol(name.clone()));
            }
            if name.is_empty() {
                return Err(Error::parse(name.as_str(), "empty variable name"));
            }
            variables.push(Symbol::new(name));
        }

        let resolve = |name: &str, source: Source| -> Result<Update> {
            match source {
                Source::Text(text) => Update::parse(name, &text, &variables),
                Source::Update(update) => Ok(update),
            }
        };

        let mut updates = HashMap::new();
        let mut initial = HashMap::new();
        for ((name, init, update), variable) in self.entries.into_iter().zip(variables.iter()) {
            if updates.contains_key(variable) {
                return Err(Error::DuplicateVariable(name));
            }
            initial.insert(variable.clone(), resolve(&name, init)?);
            updates.insert(variable.clone(), resolve(&name, update)?);
        }

        Program::new(variables.clone(), updates, initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expr::Expr;

    use test_log::test;

    #[test]
    fn test_builder() {
        let program = Program::builder()
            .var("x", "0", "x + y @ 1/2; x")
            .var("y", "RV(uniform, 0, 1)", "RV(gauss, 0, 1)")
            .build()
            .unwrap();
        let names: Vec<_> = program.variables().iter().map(|v| v.name()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert!(program.update(&Symbol::new("y")).unwrap().is_random());
        assert!(program.initial_value(&Symbol::new("y")).unwrap().is_random());
        assert!(program.update(&Symbol::new("z")).is_none());

        let order: Vec<_> = program.updates().rev().map(|(v, _)| v.name()).collect();
        assert_eq!(order, vec!["y", "x"]);
    }

    #[test]
    fn test_reserved_and_duplicate_names() {
        let result = Program::builder().var("n", "0", "n + 1").build();
        assert!(matches!(result, Err(Error::ReservedSymbol(_))));

        let result = Program::builder().var("x", "0", "x").var("x", "1", "x").build();
        assert!(matches!(result, Err(Error::DuplicateVariable(v)) if v == "x"));
    }

    #[test]
    fn test_new_checks_update_maps() {
        let x = Symbol::new("x");
        let deterministic = || Update::deterministic(Expr::from(Symbol::new("x")));

        let result = Program::new(vec![x.clone()], HashMap::new(), HashMap::new());
        assert!(matches!(result, Err(Error::MissingUpdate(_, "update"))));

        let mut updates = HashMap::new();
        updates.insert(x.clone(), deterministic());
        updates.insert(Symbol::new("z"), deterministic());
        let mut initial = HashMap::new();
        initial.insert(x.clone(), Update::deterministic(Expr::zero()));
        let result = Program::new(vec![x.clone()], updates, initial);
        assert!(matches!(result, Err(Error::UnknownVariable(v)) if v == "z"));
    }

    #[test]
    fn test_var_with_prebuilt_updates() {
        let program = Program::builder()
            .var_with("x", Update::deterministic(Expr::zero()), Update::deterministic(Expr::symbol("x") + Expr::one()))
            .build()
            .unwrap();
        assert_eq!(
            program.update(&Symbol::new("x")).unwrap().branches()[0].expr,
            Expr::symbol("x") + Expr::one()
        );
    }

    #[test]
    fn test_dependencies() {
        let program = Program::builder()
            .var("x", "0", "x + y")
            .var("y", "0", "y @ p; 2*y + c @ 1 - p")
            .var("z", "0", "RV(uniform, 0, x)")
            .build()
            .unwrap();
        let deps = program.dependencies();
        let names = |v: &str| -> Vec<String> {
            deps[&Symbol::new(v)].iter().map(|s| s.name().to_string()).collect()
        };
        assert_eq!(names("x"), vec!["x", "y"]);
        assert_eq!(names("y"), vec!["y"]);
        assert_eq!(names("z"), vec!["x"]);
    }
}
