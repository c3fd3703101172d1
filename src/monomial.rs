//! Power products of symbols.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::symbol::Symbol;

/// A power product `x1^e1 * x2^e2 * ...` with positive exponents.
///
/// Monomials are ordered lexicographically, with symbols compared by name and
/// the alphabetically first symbol being the most significant. This is a
/// monomial order: it is total, compatible with multiplication, and
/// well-founded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Monomial(BTreeMap<Symbol, u32>);

impl Monomial {
    /// The empty product `1`.
    pub fn one() -> Self {
        Monomial(BTreeMap::new())
    }

    pub fn var(symbol: Symbol) -> Self {
        Monomial::var_pow(symbol, 1)
    }

    pub fn var_pow(symbol: Symbol, exponent: u32) -> Self {
        let mut powers = BTreeMap::new();
        if exponent > 0 {
            powers.insert(symbol, exponent);
        }
        Monomial(powers)
    }

    pub fn from_powers(powers: impl IntoIterator<Item = (Symbol, u32)>) -> Self {
        let mut result = Monomial::one();
        for (symbol, exponent) in powers {
            result = result.mul(&Monomial::var_pow(symbol, exponent));
        }
        result
    }

    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    /// Total degree.
    pub fn degree(&self) -> u32 {
        self.0.values().sum()
    }

    /// Exponent of `symbol` (zero if absent).
    pub fn degree_of(&self, symbol: &Symbol) -> u32 {
        self.0.get(symbol).copied().unwrap_or(0)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.0.contains_key(symbol)
    }

    pub fn powers(&self) -> impl Iterator<Item = (&Symbol, u32)> {
        self.0.iter().map(|(s, &e)| (s, e))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.0.keys()
    }

    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut powers = self.0.clone();
        for (symbol, &exponent) in &other.0 {
            *powers.entry(symbol.clone()).or_insert(0) += exponent;
        }
        Monomial(powers)
    }

    pub fn pow(&self, k: u32) -> Monomial {
        if k == 0 {
            return Monomial::one();
        }
        Monomial(self.0.iter().map(|(s, &e)| (s.clone(), e * k)).collect())
    }

    pub fn divides(&self, other: &Monomial) -> bool {
        self.0.iter().all(|(s, &e)| other.degree_of(s) >= e)
    }

    /// Returns `self / other` if `other` divides `self`.
    pub fn div(&self, other: &Monomial) -> Option<Monomial> {
        if !other.divides(self) {
            return None;
        }
        let mut powers = self.0.clone();
        for (symbol, &exponent) in &other.0 {
            let remaining = powers[symbol] - exponent;
            if remaining == 0 {
                powers.remove(symbol);
            } else {
                powers.insert(symbol.clone(), remaining);
            }
        }
        Some(Monomial(powers))
    }

    /// Greatest common divisor (componentwise minimum of exponents).
    pub fn gcd(&self, other: &Monomial) -> Monomial {
        Monomial(
            self.0
                .iter()
                .filter_map(|(s, &e)| {
                    let m = e.min(other.degree_of(s));
                    (m > 0).then(|| (s.clone(), m))
                })
                .collect(),
        )
    }

    /// Removes `symbol`, returning its exponent and the remaining product.
    pub fn split_off(&self, symbol: &Symbol) -> (u32, Monomial) {
        let mut powers = self.0.clone();
        let exponent = powers.remove(symbol).unwrap_or(0);
        (exponent, Monomial(powers))
    }

    /// Splits into the part over `symbols` and the rest.
    pub fn partition(&self, symbols: &[Symbol]) -> (Monomial, Monomial) {
        let (inside, outside): (BTreeMap<_, _>, BTreeMap<_, _>) = self
            .0
            .iter()
            .map(|(s, &e)| (s.clone(), e))
            .partition(|(s, _)| symbols.contains(s));
        (Monomial(inside), Monomial(outside))
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Monomial {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut lhs = self.0.iter().peekable();
        let mut rhs = other.0.iter().peekable();
        loop {
            match (lhs.peek(), rhs.peek()) {
                (None, None) => return Ordering::Equal,
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (Some((s1, e1)), Some((s2, e2))) => match s1.cmp(s2) {
                    // `self` has a positive power of a more significant symbol.
                    Ordering::Less => return Ordering::Greater,
                    Ordering::Greater => return Ordering::Less,
                    Ordering::Equal => match e1.cmp(e2) {
                        Ordering::Equal => {
                            lhs.next();
                            rhs.next();
                        }
                        ord => return ord,
                    },
                },
            }
        }
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_one() {
            return write!(f, "1");
        }
        for (i, (symbol, exponent)) in self.powers().enumerate() {
            if i > 0 {
                write!(f, "*")?;
            }
            if exponent == 1 {
                write!(f, "{}", symbol)?;
            } else {
                write!(f, "{}^{}", symbol, exponent)?;
            }
        }
        Ok(())
    }
}
