//! Memo stores for the solver.
//!
//! An [`Engine`][crate::engine::Engine] keeps two stores, both scoped to a
//! single analysis:
//!
//! | Store | Key | Value |
//! |-------|-----|-------|
//! | solutions | [`Evar`][crate::evar::Evar] | [`ClosedForm`][crate::closed_form::ClosedForm] |
//! | recurrences | [`Monomial`][crate::monomial::Monomial] | [`Polynomial`][crate::polynomial::Polynomial] |
//!
//! Both count hits and misses, which [`EngineStats`][crate::debug::EngineStats]
//! reports.
//!
//! # Example
//!
//! ```
//! use evar_rs::cache::Cache;
//!
//! let mut cache = Cache::<(u64, u64), i32>::new(4);
//! cache.insert((1, 2), 42);
//! assert_eq!(cache.get(&(1, 2)), Some(&42));
//! assert_eq!(cache.hits(), 1);
//! ```

mod hashmap;

pub use hashmap::HashMapCache;

/// Default cache implementation.
pub type Cache<K, V> = HashMapCache<K, V>;
