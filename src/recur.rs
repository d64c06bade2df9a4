//! The nested-fire capability threaded alongside `&mut C` into every
//! transition action (§8 "Queued RTC" / "Immediate nested fire" scenarios).
//!
//! An action already receives the very `&mut C` the top-level fire is
//! carrying through the whole exit/entry traversal — not a fresh borrow off
//! some shared cell — so re-entering through this handle and reusing that
//! same reference needs no interior mutability and cannot panic on a
//! double borrow the way going back through a `Handle` would.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

use crate::args::Args;
use crate::context::Stateful;
use crate::error::Error;
use crate::machine::Engine;

pub struct Recur<'a, S, T, C> {
    pub(crate) engine: &'a Engine<S, T, C>,
    pub(crate) queue: &'a RefCell<VecDeque<(T, Args)>>,
    pub(crate) firing: &'a Cell<bool>,
}

impl<'a, S, T, C> Recur<'a, S, T, C>
where
    S: Eq + Hash + Clone + Debug + 'static,
    T: Eq + Hash + Clone + Debug + 'static,
    C: Stateful<S>,
{
    /// Fires `trigger` on the same handle that is currently mid-transition.
    /// Under Queued mode this enqueues behind the handle's FIFO and is
    /// observed only once the current top-level fire completes; under
    /// Immediate mode it runs synchronously, right here.
    pub fn fire(&self, ctx: &mut C, trigger: T, args: Args) -> Result<(), Error<S, T>> {
        self.engine.dispatch(self.queue, self.firing, ctx, trigger, args)
    }
}
