//! Runtime invariant assertions with contract-test support
//!
//! Session bookkeeping relies on a handful of structural invariants (one
//! stats entry per angle, at most one photo per angle, completion exactly
//! when every angle is covered). Breaking one is a programming error, so
//! the check panics. Every checked invariant is also recorded per thread so
//! tests can prove the checks actually ran.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crabpose::invariant_ppt::*;
//!
//! assert_invariant!(
//!     photos.len() <= CaptureAngle::COUNT,
//!     "At most one photo per angle",
//!     "CaptureSession::add_photo"
//! );
//!
//! #[test]
//! fn contract_session() {
//!     // ...drive a session...
//!     contract_test("session", &["At most one photo per angle"]);
//! }
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::thread_local;

thread_local! {
    static INVARIANT_LOG: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Assert an invariant and record that it was checked.
///
/// # Panics
/// Panics if the condition is false.
#[macro_export]
macro_rules! assert_invariant {
    ($condition:expr, $message:expr) => {
        $crate::invariant_ppt::__assert_invariant_impl($condition, $message, None)
    };
    ($condition:expr, $message:expr, $context:expr) => {
        $crate::invariant_ppt::__assert_invariant_impl($condition, $message, Some($context))
    };
}

#[doc(hidden)]
pub fn __assert_invariant_impl(condition: bool, message: &str, context: Option<&str>) {
    INVARIANT_LOG.with(|log| {
        log.borrow_mut().insert(message.to_string());
    });

    if !condition {
        let ctx = context.unwrap_or("unknown");
        log::error!("Invariant violated in {}: {}", ctx, message);
        panic!("INVARIANT VIOLATION [{}]: {}", ctx, message);
    }
}

/// Whether an invariant with this message has been checked on this thread.
pub fn invariant_checked(message: &str) -> bool {
    INVARIANT_LOG.with(|log| log.borrow().contains(message))
}

/// Panic unless every listed invariant was checked on this thread.
pub fn contract_test(test_name: &str, required_invariants: &[&str]) {
    let missing: Vec<&str> = required_invariants
        .iter()
        .copied()
        .filter(|inv| !invariant_checked(inv))
        .collect();

    if !missing.is_empty() {
        panic!(
            "CONTRACT FAILURE [{}]: The following invariants were not checked:\n  - {}",
            test_name,
            missing.join("\n  - ")
        );
    }
}

/// Clear this thread's invariant log
pub fn clear_invariant_log() {
    INVARIANT_LOG.with(|log| {
        log.borrow_mut().clear();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_invariant_is_recorded() {
        clear_invariant_log();
        assert_invariant!(true, "unit: recorded");
        assert!(invariant_checked("unit: recorded"));
        contract_test("recorded", &["unit: recorded"]);
    }

    #[test]
    #[should_panic(expected = "INVARIANT VIOLATION [ctx]")]
    fn test_violation_panics() {
        assert_invariant!(false, "unit: must hold", "ctx");
    }

    #[test]
    #[should_panic(expected = "CONTRACT FAILURE")]
    fn test_contract_reports_unchecked() {
        clear_invariant_log();
        contract_test("missing", &["unit: never checked"]);
    }
}
