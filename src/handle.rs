//! A bound (engine, context) pair: the object clients actually fire triggers on (§4.13).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use crate::args::{Args, ParameterDescriptor};
use crate::context::Stateful;
use crate::error::Error;
use crate::machine::Engine;
use crate::reflection::StateMachineInfo;

/// Binds one context to one engine. Owns its own FIFO queue and reentrancy
/// flag (§9): these are per-handle, not per-engine, so that two handles
/// sharing an engine can each run their own independent run-to-completion
/// loop without any unsafe aliasing of a foreign context.
pub struct Handle<S, T, C> {
    engine: Rc<Engine<S, T, C>>,
    context: RefCell<C>,
    queue: RefCell<VecDeque<(T, Args)>>,
    firing: Cell<bool>,
}

impl<S, T, C> Handle<S, T, C>
where
    S: Eq + Hash + Clone + Debug + 'static,
    T: Eq + Hash + Clone + Debug + 'static,
    C: Stateful<S>,
{
    /// Writes `initial_state` into the context directly. No entry actions run
    /// for it — mirrors the constructor-only assignment of the library this
    /// core is modelled on (§4.13).
    pub(crate) fn new(engine: Rc<Engine<S, T, C>>, mut context: C, initial_state: S) -> Self {
        context.set_state(initial_state);
        Handle {
            engine,
            context: RefCell::new(context),
            queue: RefCell::new(VecDeque::new()),
            firing: Cell::new(false),
        }
    }

    pub fn fire(&self, trigger: T) -> Result<(), Error<S, T>> {
        self.fire_with_args(trigger, Args::none())
    }

    pub fn fire1<A1: 'static>(&self, trigger: T, arg1: A1) -> Result<(), Error<S, T>> {
        self.fire_with_args(trigger, Args::from_vec(vec![Box::new(arg1)]))
    }

    pub fn fire2<A1: 'static, A2: 'static>(&self, trigger: T, arg1: A1, arg2: A2) -> Result<(), Error<S, T>> {
        self.fire_with_args(trigger, Args::from_vec(vec![Box::new(arg1), Box::new(arg2)]))
    }

    pub fn fire3<A1: 'static, A2: 'static, A3: 'static>(
        &self,
        trigger: T,
        arg1: A1,
        arg2: A2,
        arg3: A3,
    ) -> Result<(), Error<S, T>> {
        self.fire_with_args(trigger, Args::from_vec(vec![Box::new(arg1), Box::new(arg2), Box::new(arg3)]))
    }

    fn fire_with_args(&self, trigger: T, args: Args) -> Result<(), Error<S, T>> {
        let mut context = self.context.borrow_mut();
        self.engine.dispatch(&self.queue, &self.firing, &mut context, trigger, args)
    }

    pub fn can_fire(&self, trigger: &T) -> bool {
        self.engine.can_fire(&self.context.borrow(), trigger, &Args::none())
    }

    pub fn can_fire_with_unmet(&self, trigger: &T) -> (bool, Vec<String>) {
        self.engine.can_fire_with_unmet(&self.context.borrow(), trigger, &Args::none())
    }

    pub fn is_in_state(&self, candidate: &S) -> bool {
        self.engine.is_in_state(&self.context.borrow(), candidate)
    }

    pub fn activate(&self) {
        let mut context = self.context.borrow_mut();
        self.engine.activate(&mut context);
    }

    pub fn deactivate(&self) {
        let mut context = self.context.borrow_mut();
        self.engine.deactivate(&mut context);
    }

    pub fn get_permitted_triggers(&self) -> Vec<T> {
        self.engine.permitted_triggers(&self.context.borrow(), &Args::none())
    }

    /// Every trigger declared on the current state or an ancestor, each
    /// paired with whether it currently passes, its unmet-guard descriptions
    /// if not, and its registered parameter descriptor if any — unlike
    /// `get_permitted_triggers`, rejected candidates are included too (§4.5).
    pub fn get_detailed_permitted_triggers(&self) -> Vec<(T, bool, Vec<String>, Option<ParameterDescriptor>)> {
        let context = self.context.borrow();
        self.engine
            .declared_triggers(&context)
            .into_iter()
            .map(|trigger| {
                let (permitted, unmet) = self.engine.can_fire_with_unmet(&context, &trigger, &Args::none());
                let descriptor = self.engine.parameter_descriptor(&trigger);
                (trigger, permitted, unmet, descriptor)
            })
            .collect()
    }

    pub fn get_info(&self) -> StateMachineInfo<S, T> {
        let initial = self.context.borrow().state().clone();
        self.engine.get_info(initial)
    }

    pub fn state(&self) -> S {
        self.context.borrow().state().clone()
    }

    /// Runs `f` against a read-only borrow of the bound context. Useful for
    /// clients that keep data on the context beyond the current state.
    pub fn with_context<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.context.borrow())
    }
}
