//! Session state as seen by the navigation gate.
//!
//! The gate only needs to know whether a session token is present. Anything
//! that can answer that question implements [`SessionState`]; the gate gets
//! one injected at construction and never writes through it.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Read-only view of the current session.
pub trait SessionState {
    /// Whether a session token is currently present
    fn has_token(&self) -> bool;

    /// Logical session phase derived from token presence
    fn phase(&self) -> SessionPhase {
        if self.has_token() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }
}

/// Logical session phase, inferred per call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No token present
    Anonymous,
    /// Token present
    Authenticated,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Fixed token presence
impl SessionState for bool {
    fn has_token(&self) -> bool {
        *self
    }
}

/// A token held directly; empty strings count as absent
impl SessionState for Option<String> {
    fn has_token(&self) -> bool {
        self.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl<T: SessionState + ?Sized> SessionState for &T {
    fn has_token(&self) -> bool {
        (**self).has_token()
    }
}

impl<T: SessionState + ?Sized> SessionState for Box<T> {
    fn has_token(&self) -> bool {
        (**self).has_token()
    }
}

impl<T: SessionState + ?Sized> SessionState for Rc<T> {
    fn has_token(&self) -> bool {
        (**self).has_token()
    }
}

impl<T: SessionState + ?Sized> SessionState for Arc<T> {
    fn has_token(&self) -> bool {
        (**self).has_token()
    }
}

/// Adapts a closure into a [`SessionState`].
///
/// ```
/// use ops_console_core::{SessionFn, SessionState};
///
/// let session = SessionFn(|| true);
/// assert!(session.has_token());
/// ```
#[derive(Clone, Copy)]
pub struct SessionFn<F>(pub F);

impl<F: Fn() -> bool> SessionState for SessionFn<F> {
    fn has_token(&self) -> bool {
        (self.0)()
    }
}

impl<F> fmt::Debug for SessionFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionFn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_phase_from_presence() {
        assert_eq!(true.phase(), SessionPhase::Authenticated);
        assert_eq!(false.phase(), SessionPhase::Anonymous);
    }

    #[test]
    fn test_option_token() {
        assert!(Some("abc".to_string()).has_token());
        assert!(!Some(String::new()).has_token());
        assert!(!None::<String>.has_token());
    }

    #[test]
    fn test_closure_is_read_each_time() {
        let present = Cell::new(false);
        let session = SessionFn(|| present.get());
        assert!(!session.has_token());
        present.set(true);
        assert!(session.has_token());
    }

    #[test]
    fn test_smart_pointers_delegate() {
        let shared: Arc<dyn SessionState + Send + Sync> = Arc::new(true);
        assert!(shared.has_token());
        let boxed: Box<dyn SessionState> = Box::new(Some("t".to_string()));
        assert!(boxed.has_token());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SessionPhase::Anonymous.to_string(), "anonymous");
        assert_eq!(SessionPhase::Authenticated.to_string(), "authenticated");
    }
}
