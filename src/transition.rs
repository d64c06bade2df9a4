//! The immutable transition record threaded through a single fire (§3).

use crate::args::Args;

/// One (source, destination, trigger, arguments) tuple. `Clone` is cheap: `S`
/// and `T` are the small client-supplied key types, and `Args` is reference
/// counted. The engine constructs a fresh `Transition` each time it rewrites
/// `source` while ascending the hierarchy during exit (§4.4), and again for
/// every synthetic initial-transition step, so cheap cloning matters.
#[derive(Clone, Debug)]
pub struct Transition<S, T> {
    pub source: S,
    pub destination: S,
    pub trigger: T,
    pub args: Args,
}

impl<S: PartialEq, T> Transition<S, T> {
    pub fn new(source: S, destination: S, trigger: T, args: Args) -> Self {
        Transition {
            source,
            destination,
            trigger,
            args,
        }
    }

    /// A reentry transition's source equals its destination. This is re-evaluated
    /// fresh on the rewritten transition at each level the engine ascends/descends
    /// through, which is exactly what lets a plain Transitioning transition "become"
    /// a reentry once it reaches a level equal to its destination (§4.4).
    pub fn is_reentry(&self) -> bool {
        self.source == self.destination
    }
}
