//! The dispatch engine (§4.6–§4.11): the public state-machine object.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use log::{debug, trace, warn};
use strum::VariantNames;

use crate::args::{Args, ParameterDescriptor, ParameterRegistry, TypeTag};
use crate::builder::StateConfiguration;
use crate::context::Stateful;
use crate::error::Error;
use crate::recur::Recur;
use crate::reflection::StateMachineInfo;
use crate::state_representation::{StateMap, StateRepresentation};
use crate::transition::Transition;
use crate::trigger_behaviour::Resolution;

/// Immediate (synchronous, no run-to-completion) or Queued (FIFO, RTC) (§4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display, strum_macros::EnumVariantNames)]
pub enum FiringMode {
    Immediate,
    Queued,
}

type UnhandledTriggerPolicy<S, T> = Rc<dyn Fn(&S, &T, &[String]) -> Result<(), Error<S, T>>>;
type Observer<S, T> = Rc<dyn Fn(&Transition<S, T>)>;

/// Owns the state-configuration map, the trigger-parameter registry, the
/// firing mode, the unhandled-trigger policy, and the transition observers.
/// `Rc`-held internally throughout, so this type is intentionally `!Send`
/// (§5): the library makes no attempt at cross-thread safety.
pub struct Engine<S, T, C> {
    pub(crate) states: RefCell<StateMap<S, T, C>>,
    parameters: RefCell<ParameterRegistry<S, T>>,
    firing_mode: Cell<Option<FiringMode>>,
    active_fires: Cell<u32>,
    unhandled_trigger_policy: RefCell<UnhandledTriggerPolicy<S, T>>,
    on_transitioned: RefCell<Vec<Observer<S, T>>>,
    on_transition_completed: RefCell<Vec<Observer<S, T>>>,
}

impl<S, T, C> Engine<S, T, C>
where
    S: Eq + Hash + Clone + Debug + 'static,
    T: Eq + Hash + Clone + Debug + 'static,
    C: Stateful<S>,
{
    pub fn new() -> Rc<Self> {
        Rc::new(Engine {
            states: RefCell::new(StateMap::new()),
            parameters: RefCell::new(ParameterRegistry::new()),
            firing_mode: Cell::new(Some(FiringMode::Queued)),
            active_fires: Cell::new(0),
            unhandled_trigger_policy: RefCell::new(Rc::new(default_unhandled_trigger_policy)),
            on_transitioned: RefCell::new(Vec::new()),
            on_transition_completed: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn guard_not_firing(&self) -> Result<(), Error<S, T>> {
        if self.active_fires.get() > 0 {
            return Err(Error::ConfigurationDuringFire);
        }
        Ok(())
    }

    pub(crate) fn ensure_state(&self, state: &S) {
        let mut states = self.states.borrow_mut();
        if !states.contains_key(state) {
            states.insert(state.clone(), StateRepresentation::new(state.clone()));
        }
    }

    pub fn configure(&self, state: S) -> StateConfiguration<'_, S, T, C> {
        self.ensure_state(&state);
        StateConfiguration { engine: self, state }
    }

    pub fn set_trigger_parameters(&self, trigger: T, tags: Vec<TypeTag>) -> Result<(), Error<S, T>> {
        self.parameters.borrow_mut().set_parameters(trigger, tags)
    }

    pub fn set_firing_mode(&self, mode: FiringMode) {
        debug!("firing mode set to {} (available: {:?})", mode, FiringMode::VARIANTS);
        self.firing_mode.set(Some(mode));
    }

    pub fn on_unhandled_trigger(&self, policy: impl Fn(&S, &T, &[String]) -> Result<(), Error<S, T>> + 'static) {
        *self.unhandled_trigger_policy.borrow_mut() = Rc::new(policy);
    }

    pub fn on_transitioned(&self, observer: impl Fn(&Transition<S, T>) + 'static) {
        self.on_transitioned.borrow_mut().push(Rc::new(observer));
    }

    pub fn on_transition_completed(&self, observer: impl Fn(&Transition<S, T>) + 'static) {
        self.on_transition_completed.borrow_mut().push(Rc::new(observer));
    }

    pub fn create_handle(self: &Rc<Self>, context: C, initial_state: S) -> crate::handle::Handle<S, T, C> {
        crate::handle::Handle::new(Rc::clone(self), context, initial_state)
    }

    pub fn get_info(&self, initial_state: S) -> StateMachineInfo<S, T> {
        crate::reflection::build_info(&self.states.borrow(), initial_state)
    }

    fn fire_transitioned(&self, transition: &Transition<S, T>) {
        for observer in self.on_transitioned.borrow().iter() {
            observer(transition);
        }
    }

    fn fire_transition_completed(&self, transition: &Transition<S, T>) {
        for observer in self.on_transition_completed.borrow().iter() {
            observer(transition);
        }
    }

    /// Entry point for a single handle's fire call. Handles the Queued-vs-Immediate
    /// policy; the handle owns the FIFO queue and reentrancy flag (§9).
    pub(crate) fn dispatch(
        &self,
        queue: &RefCell<std::collections::VecDeque<(T, Args)>>,
        firing: &Cell<bool>,
        ctx: &mut C,
        trigger: T,
        args: Args,
    ) -> Result<(), Error<S, T>> {
        let mode = self.firing_mode.get().ok_or(Error::MisconfiguredFiringMode)?;
        let recur = Recur {
            engine: self,
            queue,
            firing,
        };
        match mode {
            FiringMode::Immediate => {
                let _guard = ActiveFireGuard::new(&self.active_fires);
                self.fire_one(ctx, trigger, args, &recur)
            }
            FiringMode::Queued => {
                queue.borrow_mut().push_back((trigger, args));
                if firing.get() {
                    trace!("fire already in progress on this handle, queued");
                    return Ok(());
                }
                firing.set(true);
                let _guard = ActiveFireGuard::new(&self.active_fires);
                let result = (|| {
                    loop {
                        let next = queue.borrow_mut().pop_front();
                        match next {
                            Some((t, a)) => self.fire_one(ctx, t, a, &recur)?,
                            None => break,
                        }
                    }
                    Ok(())
                })();
                firing.set(false);
                result
            }
        }
    }

    fn fire_one(&self, ctx: &mut C, trigger: T, args: Args, recur: &Recur<'_, S, T, C>) -> Result<(), Error<S, T>> {
        self.parameters.borrow().validate(&trigger, &args)?;

        let source = ctx.state().clone();
        let resolution = {
            let states = self.states.borrow();
            let rep = states
                .get(&source)
                .unwrap_or_else(|| panic!("state {:?} was never configured", source));
            rep.try_find_handler(&trigger, &args, &states)?
        };

        match resolution {
            Resolution::Unhandled { unmet } => {
                debug!("{:?}: trigger {:?} unhandled, {} unmet guard(s)", source, trigger, unmet.len());
                let policy = self.unhandled_trigger_policy.borrow().clone();
                policy(&source, &trigger, &unmet)
            }
            Resolution::Ignored => {
                trace!("{:?}: trigger {:?} ignored", source, trigger);
                Ok(())
            }
            Resolution::Internal(action) => {
                debug!("{:?}: trigger {:?} handled internally", source, trigger);
                let current = ctx.state().clone();
                let transition = Transition::new(current.clone(), current, trigger, args);
                action(&transition, ctx, recur);
                Ok(())
            }
            Resolution::Destination { state: destination, reentry } => {
                self.ensure_state(&destination);
                if reentry {
                    self.handle_reentry(ctx, source, destination, trigger, args, recur)
                } else {
                    self.handle_transitioning(ctx, source, destination, trigger, args, recur)
                }
            }
        }
    }

    fn handle_transitioning(
        &self,
        ctx: &mut C,
        source: S,
        destination: S,
        trigger: T,
        args: Args,
        recur: &Recur<'_, S, T, C>,
    ) -> Result<(), Error<S, T>> {
        let transition = Transition::new(source.clone(), destination.clone(), trigger, args);
        debug!("{:?} -> {:?}: transitioning", transition.source, transition.destination);
        {
            let states = self.states.borrow();
            self.run_exit(&states, source.clone(), &transition, ctx, recur);
        }
        ctx.set_state(destination.clone());
        self.fire_transitioned(&transition);
        let final_state = self.run_entry_with_initial(&transition, ctx, destination, recur)?;
        if ctx.state() != &final_state {
            ctx.set_state(final_state.clone());
        }
        let completed = Transition::new(transition.source, final_state, transition.trigger, transition.args);
        self.fire_transition_completed(&completed);
        Ok(())
    }

    fn handle_reentry(
        &self,
        ctx: &mut C,
        source: S,
        destination: S,
        trigger: T,
        args: Args,
        recur: &Recur<'_, S, T, C>,
    ) -> Result<(), Error<S, T>> {
        let transition = Transition::new(source.clone(), destination.clone(), trigger, args);
        debug!("{:?} -> {:?}: reentering", transition.source, transition.destination);
        let rewritten_source = {
            let states = self.states.borrow();
            self.run_exit(&states, source.clone(), &transition, ctx, recur)
        };
        if rewritten_source != destination {
            let states = self.states.borrow();
            if let Some(rep) = states.get(&destination) {
                let extra = Transition::new(destination.clone(), destination.clone(), transition.trigger.clone(), transition.args.clone());
                rep.run_exit_actions(&extra, ctx, recur);
            }
        }
        self.fire_transitioned(&transition);
        let final_state = self.run_entry_with_initial(&transition, ctx, destination, recur)?;
        if ctx.state() != &final_state {
            ctx.set_state(final_state.clone());
        }
        let completed = Transition::new(transition.source, final_state, transition.trigger, transition.args);
        self.fire_transition_completed(&completed);
        Ok(())
    }

    /// Runs `exit` on `state` and, if needed, ascends to ancestors (§4.4).
    /// Returns the state at which the ascend stopped (the rewritten source).
    fn run_exit(&self, states: &StateMap<S, T, C>, state: S, transition: &Transition<S, T>, ctx: &mut C, recur: &Recur<'_, S, T, C>) -> S {
        let rep = match states.get(&state) {
            Some(r) => r,
            None => return state,
        };
        let level_transition = Transition::new(state.clone(), transition.destination.clone(), transition.trigger.clone(), transition.args.clone());
        if level_transition.is_reentry() {
            rep.run_exit_actions(&level_transition, ctx, recur);
            state
        } else if !rep.includes(&transition.destination, states) {
            rep.run_exit_actions(&level_transition, ctx, recur);
            match rep.superstate.clone() {
                Some(parent) => self.run_exit(states, parent, transition, ctx, recur),
                None => state,
            }
        } else {
            state
        }
    }

    /// Runs `enter` on `state` honoring ancestor ordering (§4.4), then follows
    /// any chain of initial-transition targets, honoring mid-entry divergence
    /// under Immediate mode (§4.10). Returns the final state actually reached.
    fn run_entry_with_initial(
        &self,
        outer: &Transition<S, T>,
        ctx: &mut C,
        destination: S,
        recur: &Recur<'_, S, T, C>,
    ) -> Result<S, Error<S, T>> {
        {
            let states = self.states.borrow();
            self.run_enter(&states, destination.clone(), outer, ctx, recur);
        }
        let immediate = self.firing_mode.get() == Some(FiringMode::Immediate);
        let mut final_state = destination;
        loop {
            if immediate && ctx.state() != &final_state {
                final_state = ctx.state().clone();
                break;
            }
            let target = {
                let states = self.states.borrow();
                let rep = states.get(&final_state).expect("state must be configured by now");
                rep.initial_transition_target.clone()
            };
            let target = match target {
                Some(t) => t,
                None => break,
            };
            {
                let has_substate = {
                    let states = self.states.borrow();
                    states
                        .get(&final_state)
                        .map(|r| r.substates.contains(&target))
                        .unwrap_or(false)
                };
                if !has_substate {
                    return Err(Error::BadInitialTransition {
                        state: final_state,
                        target,
                    });
                }
            }
            let synthetic = Transition::new(final_state.clone(), target.clone(), outer.trigger.clone(), outer.args.clone());
            self.fire_transitioned(&synthetic);
            ctx.set_state(target.clone());
            {
                // `target` is always a direct substate of `final_state` (checked
                // above), whose own entry already ran — enter only `target`
                // itself, not the ascend-and-enter-ancestors walk `run_enter`
                // does for a fresh transition, or the already-active ancestor's
                // entry/activate actions would fire a second time.
                let states = self.states.borrow();
                if let Some(rep) = states.get(&target) {
                    rep.run_entry_actions(&synthetic, ctx, recur);
                    rep.run_activate_actions(ctx);
                }
            }
            if immediate && ctx.state() != &target {
                final_state = ctx.state().clone();
                break;
            }
            final_state = target;
        }
        Ok(final_state)
    }

    fn run_enter(&self, states: &StateMap<S, T, C>, state: S, transition: &Transition<S, T>, ctx: &mut C, recur: &Recur<'_, S, T, C>) {
        let rep = match states.get(&state) {
            Some(r) => r,
            None => return,
        };
        let level_transition = Transition::new(transition.source.clone(), state.clone(), transition.trigger.clone(), transition.args.clone());
        if level_transition.is_reentry() {
            rep.run_entry_actions(&level_transition, ctx, recur);
            rep.run_activate_actions(ctx);
        } else if !rep.includes(&transition.source, states) {
            if let Some(parent) = rep.superstate.clone() {
                self.run_enter(states, parent, transition, ctx, recur);
            }
            rep.run_entry_actions(&level_transition, ctx, recur);
            rep.run_activate_actions(ctx);
        }
    }

    pub(crate) fn can_fire(&self, ctx: &C, trigger: &T, args: &Args) -> bool {
        let states = self.states.borrow();
        match states.get(ctx.state()) {
            Some(rep) => !matches!(
                rep.try_find_handler(trigger, args, &states),
                Ok(Resolution::Unhandled { .. }) | Err(_)
            ),
            None => false,
        }
    }

    pub(crate) fn can_fire_with_unmet(&self, ctx: &C, trigger: &T, args: &Args) -> (bool, Vec<String>) {
        let states = self.states.borrow();
        match states.get(ctx.state()).map(|rep| rep.try_find_handler(trigger, args, &states)) {
            Some(Ok(Resolution::Unhandled { unmet })) => (false, unmet),
            Some(Ok(_)) => (true, Vec::new()),
            _ => (false, Vec::new()),
        }
    }

    pub(crate) fn is_in_state(&self, ctx: &C, candidate: &S) -> bool {
        let states = self.states.borrow();
        states
            .get(ctx.state())
            .map(|rep| rep.is_included_in(candidate, &states))
            .unwrap_or(false)
    }

    pub(crate) fn permitted_triggers(&self, ctx: &C, args: &Args) -> Vec<T> {
        let states = self.states.borrow();
        states
            .get(ctx.state())
            .map(|rep| rep.permitted_triggers(args, &states))
            .unwrap_or_default()
    }

    pub(crate) fn declared_triggers(&self, ctx: &C) -> Vec<T> {
        let states = self.states.borrow();
        states
            .get(ctx.state())
            .map(|rep| rep.declared_triggers(&states))
            .unwrap_or_default()
    }

    /// The parameter shape registered for `trigger`, if any (§4.1, §4.5).
    pub(crate) fn parameter_descriptor(&self, trigger: &T) -> Option<ParameterDescriptor> {
        self.parameters.borrow().descriptor(trigger).cloned()
    }

    pub(crate) fn activate(&self, ctx: &mut C) {
        let state = ctx.state().clone();
        let mut chain = Vec::new();
        {
            let states = self.states.borrow();
            let mut cursor = Some(state);
            while let Some(s) = cursor {
                cursor = states.get(&s).and_then(|r| r.superstate.clone());
                chain.push(s);
            }
        }
        for state in chain.into_iter().rev() {
            let states = self.states.borrow();
            if let Some(rep) = states.get(&state) {
                if !rep.is_activated() {
                    rep.run_activate_actions(ctx);
                }
            }
        }
    }

    pub(crate) fn deactivate(&self, ctx: &mut C) {
        let state = ctx.state().clone();
        let mut chain = Vec::new();
        {
            let states = self.states.borrow();
            let mut cursor = Some(state);
            while let Some(s) = cursor {
                cursor = states.get(&s).and_then(|r| r.superstate.clone());
                chain.push(s);
            }
        }
        for state in chain {
            let states = self.states.borrow();
            if let Some(rep) = states.get(&state) {
                if rep.is_activated() {
                    rep.run_deactivate_actions(ctx);
                }
            }
        }
    }
}

fn default_unhandled_trigger_policy<S, T>(state: &S, trigger: &T, unmet: &[String]) -> Result<(), Error<S, T>>
where
    S: Clone + Debug,
    T: Clone + Debug,
{
    if unmet.is_empty() {
        warn!("{:?}: no transitions permitted for trigger {:?}", state, trigger);
        Err(Error::NoTransitionsPermitted {
            state: state.clone(),
            trigger: trigger.clone(),
        })
    } else {
        warn!("{:?}: trigger {:?} rejected, unmet guards: {:?}", state, trigger, unmet);
        Err(Error::UnmetGuards {
            state: state.clone(),
            trigger: trigger.clone(),
            unmet: unmet.to_vec(),
        })
    }
}

/// RAII guard incrementing/decrementing the engine's active-fire counter so
/// configuration-during-fire is rejected even when a fire errors out midway.
struct ActiveFireGuard<'a> {
    counter: &'a Cell<u32>,
}

impl<'a> ActiveFireGuard<'a> {
    fn new(counter: &'a Cell<u32>) -> Self {
        counter.set(counter.get() + 1);
        ActiveFireGuard { counter }
    }
}

impl<'a> Drop for ActiveFireGuard<'a> {
    fn drop(&mut self) {
        self.counter.set(self.counter.get() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx {
        state: &'static str,
        internal_calls: u32,
    }

    impl Stateful<&'static str> for Ctx {
        fn state(&self) -> &&'static str {
            &self.state
        }
        fn set_state(&mut self, state: &'static str) {
            self.state = state;
        }
    }

    #[test]
    fn internal_transition_leaves_state_unchanged_and_runs_no_observers_or_entry_exit() {
        let engine = Engine::<&'static str, &'static str, Ctx>::new();
        engine.set_firing_mode(FiringMode::Queued);
        engine.on_transitioned(|_| panic!("on_transitioned must not run for an internal transition"));
        engine.on_transition_completed(|_| panic!("on_transition_completed must not run for an internal transition"));

        engine
            .configure("A")
            .on_entry(|_t, _ctx: &mut Ctx, _recur| panic!("entry must not run for an internal transition"), "entry")
            .on_exit(|_t, _ctx: &mut Ctx, _recur| panic!("exit must not run for an internal transition"), "exit")
            .internal_transition("Ping", |_t, ctx: &mut Ctx, _recur| ctx.internal_calls += 1, "count ping")
            .unwrap();

        let handle = engine.create_handle(Ctx { state: "A", internal_calls: 0 }, "A");
        handle.fire("Ping").unwrap();

        assert!(handle.is_in_state(&"A"));
        handle.with_context(|c| assert_eq!(c.internal_calls, 1));
    }

    #[test]
    fn dynamic_transition_resolves_destination_from_selector() {
        let engine = Engine::<&'static str, &'static str, Ctx>::new();
        engine.set_firing_mode(FiringMode::Queued);

        engine
            .configure("A")
            .permit_dynamic(
                "Go",
                |args| if *args.get::<bool>(0).unwrap() { "B" } else { "C" },
                "choose B when true, else C",
            )
            .unwrap();
        engine.configure("B");
        engine.configure("C");

        let to_b = engine.create_handle(Ctx { state: "A", internal_calls: 0 }, "A");
        to_b.fire1("Go", true).unwrap();
        assert!(to_b.is_in_state(&"B"));

        let to_c = engine.create_handle(Ctx { state: "A", internal_calls: 0 }, "A");
        to_c.fire1("Go", false).unwrap();
        assert!(to_c.is_in_state(&"C"));
    }
}
