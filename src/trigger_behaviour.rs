//! The trigger behaviour variants (§2 item 3, §3).

use std::rc::Rc;

use crate::actions::TransitionAction;
use crate::args::Args;
use crate::guard::Guard;

/// What happens when a particular trigger fires while this behaviour is the
/// one configured to handle it. A tagged variant rather than a class
/// hierarchy, dispatched with a single `match`.
pub enum TriggerBehaviour<S, T, C> {
    /// Exit current subtree up to the common ancestor, enter the destination's chain.
    Transitioning { destination: S, guard: Guard },
    /// Leave and re-enter a state; may target an ancestor (§4.4's last paragraph).
    Reentry { destination: S, guard: Guard },
    /// Runs an action with no exit/entry; current state is unchanged.
    Internal {
        action: TransitionAction<S, T, C>,
        guard: Guard,
        description: String,
    },
    /// Guard permitted -> trigger consumed with no effect.
    Ignored { guard: Guard },
    /// Destination computed per-fire from the arguments; then behaves as Transitioning.
    Dynamic {
        selector: Rc<dyn Fn(&Args) -> S>,
        guard: Guard,
        description: String,
    },
}

impl<S: Clone, T, C> TriggerBehaviour<S, T, C> {
    pub fn guard(&self) -> &Guard {
        match self {
            TriggerBehaviour::Transitioning { guard, .. } => guard,
            TriggerBehaviour::Reentry { guard, .. } => guard,
            TriggerBehaviour::Internal { guard, .. } => guard,
            TriggerBehaviour::Ignored { guard } => guard,
            TriggerBehaviour::Dynamic { guard, .. } => guard,
        }
    }
}

impl<S, T, C> std::fmt::Debug for TriggerBehaviour<S, T, C>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerBehaviour::Transitioning { destination, .. } => {
                f.debug_struct("Transitioning").field("destination", destination).finish()
            }
            TriggerBehaviour::Reentry { destination, .. } => {
                f.debug_struct("Reentry").field("destination", destination).finish()
            }
            TriggerBehaviour::Internal { description, .. } => {
                f.debug_struct("Internal").field("description", description).finish()
            }
            TriggerBehaviour::Ignored { .. } => f.debug_struct("Ignored").finish(),
            TriggerBehaviour::Dynamic { description, .. } => {
                f.debug_struct("Dynamic").field("description", description).finish()
            }
        }
    }
}

/// Outcome of resolving a trigger against a state (and, transitively, its
/// ancestors): either a handled result, or the aggregated unmet-guard
/// descriptions collected along the whole chain.
pub enum Resolution<S, T, C> {
    Ignored,
    Internal(TransitionAction<S, T, C>),
    Destination { state: S, reentry: bool },
    Unhandled { unmet: Vec<String> },
}
