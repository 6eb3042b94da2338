// crates/sdk-test-helpers/src/type_behavior.rs
// ============================================================================
// Module: Type Behavior Checks
// Description: Contract checks for custom equality and hashing impls.
// Purpose: Catch asymmetric `PartialEq` or inconsistent `Hash` implementations.
// ============================================================================

//! ## Overview
//! [`check_eq_and_hash`] takes a list of value factories. Each factory must
//! produce values that are equal to each other and unequal to the values of
//! every other factory. The check verifies:
//! - For values `a`, `b` from the same factory: `a == a`, `a == b`, `b == a`,
//!   and `hash(a) == hash(b)`.
//! - For values `a`, `b` from different factories: `a != b` and `b != a`.
//!   Hashes of unequal values may collide.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::error::AssertionFailure;

// ============================================================================
// SECTION: Value Factories
// ============================================================================

/// Produces a fresh instance of a value on every call.
pub type ValueFactory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Creates a factory that returns clones of `values` in order, starting over
/// at the first after the last.
///
/// # Errors
///
/// Returns [`AssertionFailure`] if `values` is empty.
pub fn value_factory_from_instances<T>(values: Vec<T>) -> Result<ValueFactory<T>, AssertionFailure>
where
    T: Clone + Send + Sync + 'static,
{
    if values.is_empty() {
        return Err(AssertionFailure::new("value factory requires at least one instance"));
    }
    let counter = AtomicUsize::new(0);
    Ok(Box::new(move || {
        let index = counter.fetch_add(1, Ordering::Relaxed) % values.len();
        values[index].clone()
    }))
}

// ============================================================================
// SECTION: Contract Check
// ============================================================================

/// Runs the equality and hashing contract suite over `factories`.
///
/// # Errors
///
/// Returns [`AssertionFailure`] describing the first violated condition.
#[allow(
    clippy::use_debug,
    clippy::eq_op,
    reason = "Failure messages echo the offending values; self-equality is part of the contract."
)]
pub fn check_eq_and_hash<T>(factories: &[ValueFactory<T>]) -> Result<(), AssertionFailure>
where
    T: PartialEq + Hash + Debug,
{
    for (i, first) in factories.iter().enumerate() {
        for (j, second) in factories.iter().enumerate() {
            let a = first();
            let b = second();
            if i == j {
                if a != a {
                    return Err(AssertionFailure::new(format!(
                        "value was not equal to itself: {a:?}"
                    )));
                }
                if a != b {
                    return Err(AssertionFailure::new(format!("({a:?}) == ({b:?}) was false")));
                }
                if b != a {
                    return Err(AssertionFailure::new(format!(
                        "({a:?}) == ({b:?}) was true, but ({b:?}) == ({a:?}) was false"
                    )));
                }
                let (hash_a, hash_b) = (hash_of(&a), hash_of(&b));
                if hash_a != hash_b {
                    return Err(AssertionFailure::new(format!(
                        "hash of ({a:?}) was {hash_a} but hash of ({b:?}) was {hash_b}"
                    )));
                }
            } else {
                if a == b {
                    return Err(AssertionFailure::new(format!("({a:?}) == ({b:?}) was true")));
                }
                if b == a {
                    return Err(AssertionFailure::new(format!("({b:?}) == ({a:?}) was true")));
                }
            }
        }
    }
    Ok(())
}

/// Hashes a value with the standard library hasher.
fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
