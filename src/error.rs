//! Error taxonomy for the dispatch engine.

use std::fmt::Debug;
use thiserror::Error;

/// Everything that can go wrong configuring or firing a state machine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error<S, T>
where
    S: Debug,
    T: Debug,
{
    /// A trigger's parameter types were registered more than once.
    #[error("trigger '{trigger:?}' already has parameters registered")]
    Reconfiguration { trigger: T },

    /// Fire was called with a different number of arguments than the trigger declares.
    #[error("trigger '{trigger:?}' expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        trigger: T,
        expected: usize,
        actual: usize,
    },

    /// One of fire's arguments did not match the trigger's declared parameter type.
    #[error("trigger '{trigger:?}' argument {index} expected type {expected}, got {actual}")]
    TypeMismatch {
        trigger: T,
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// No behaviour in the state or any ancestor handles this trigger.
    #[error("no transitions are permitted from state '{state:?}' on trigger '{trigger:?}'")]
    NoTransitionsPermitted { state: S, trigger: T },

    /// Behaviours exist for this trigger but every guard rejected it.
    #[error("trigger '{trigger:?}' is not permitted from state '{state:?}': {unmet:?}")]
    UnmetGuards {
        state: S,
        trigger: T,
        unmet: Vec<String>,
    },

    /// More than one behaviour for the same trigger had a passing guard.
    #[error("state '{state:?}' has more than one behaviour permitted for trigger '{trigger:?}'")]
    MultiplePermitted { state: S, trigger: T },

    /// An initial-transition target did not resolve to a direct substate at entry time.
    #[error("state '{state:?}' has an initial transition to '{target:?}', which is not a direct substate")]
    BadInitialTransition { state: S, target: S },

    /// substate_of would have introduced a cycle in the state hierarchy.
    #[error("making '{child:?}' a substate of '{parent:?}' would create a cycle")]
    CyclicHierarchy { child: S, parent: S },

    /// fire was called before a firing mode was configured.
    #[error("no firing mode has been configured for this engine")]
    MisconfiguredFiringMode,

    /// Configure was called while a fire was in progress on some handle of this engine.
    #[error("configuration cannot be changed while a fire is in progress")]
    ConfigurationDuringFire,

    /// Reserved for parity with the source material's error taxonomy. Rust's
    /// ownership rules make registering a literal null callback unrepresentable,
    /// so this port never constructs this variant.
    #[error("a null callback was registered")]
    NullCallback,
}
