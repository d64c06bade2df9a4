//! State representation: the structural and behavioural record for one state (§4.3, §4.4).

use std::cell::Cell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;
use log::trace;

use crate::actions::{EntryAction, ExitAction, LifecycleAction};
use crate::args::Args;
use crate::trigger_behaviour::{Resolution, TriggerBehaviour};
use crate::transition::Transition;

pub(crate) type StateMap<S, T, C> = IndexMap<S, StateRepresentation<S, T, C>>;

pub struct StateRepresentation<S, T, C> {
    pub(crate) state: S,
    pub(crate) superstate: Option<S>,
    pub(crate) substates: Vec<S>,
    pub(crate) trigger_behaviours: IndexMap<T, Vec<TriggerBehaviour<S, T, C>>>,
    pub(crate) entry_actions: Vec<EntryAction<S, T, C>>,
    pub(crate) exit_actions: Vec<ExitAction<S, T, C>>,
    pub(crate) activate_actions: Vec<LifecycleAction<C>>,
    pub(crate) deactivate_actions: Vec<LifecycleAction<C>>,
    pub(crate) initial_transition_target: Option<S>,
    pub(crate) activated: Cell<bool>,
}

impl<S, T, C> StateRepresentation<S, T, C>
where
    S: Eq + Hash + Clone + Debug,
    T: Eq + Hash + Clone + Debug,
{
    pub(crate) fn new(state: S) -> Self {
        StateRepresentation {
            state,
            superstate: None,
            substates: Vec::new(),
            trigger_behaviours: IndexMap::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            activate_actions: Vec::new(),
            deactivate_actions: Vec::new(),
            initial_transition_target: None,
            activated: Cell::new(false),
        }
    }

    /// True if `candidate` is this state or a descendant of it (walks substates down).
    pub(crate) fn includes(&self, candidate: &S, states: &StateMap<S, T, C>) -> bool {
        if &self.state == candidate {
            return true;
        }
        self.substates
            .iter()
            .filter_map(|s| states.get(s))
            .any(|rep| rep.includes(candidate, states))
    }

    /// True if this state is `candidate` or a descendant of it (walks superstates up).
    pub(crate) fn is_included_in(&self, candidate: &S, states: &StateMap<S, T, C>) -> bool {
        if &self.state == candidate {
            return true;
        }
        match &self.superstate {
            Some(parent) => states
                .get(parent)
                .map(|rep| rep.is_included_in(candidate, states))
                .unwrap_or(false),
            None => false,
        }
    }

    /// Resolves a trigger against this state and, if unhandled here, its ancestors (§4.3).
    pub(crate) fn try_find_handler(
        &self,
        trigger: &T,
        args: &Args,
        states: &StateMap<S, T, C>,
    ) -> Result<Resolution<S, T, C>, crate::error::Error<S, T>> {
        let mut unmet = Vec::new();
        if let Some(behaviours) = self.trigger_behaviours.get(trigger) {
            let mut passing: Vec<&TriggerBehaviour<S, T, C>> = Vec::new();
            for behaviour in behaviours {
                if behaviour.guard().passes(args) {
                    passing.push(behaviour);
                } else {
                    unmet.extend(behaviour.guard().unmet(args));
                }
            }
            if passing.len() > 1 {
                return Err(crate::error::Error::MultiplePermitted {
                    state: self.state.clone(),
                    trigger: trigger.clone(),
                });
            }
            if let Some(found) = passing.into_iter().next() {
                trace!("{:?}: trigger {:?} resolved locally", self.state, trigger);
                return Ok(match found {
                    TriggerBehaviour::Ignored { .. } => Resolution::Ignored,
                    TriggerBehaviour::Internal { action, .. } => Resolution::Internal(action.clone()),
                    TriggerBehaviour::Transitioning { destination, .. } => Resolution::Destination {
                        state: destination.clone(),
                        reentry: false,
                    },
                    TriggerBehaviour::Reentry { destination, .. } => Resolution::Destination {
                        state: destination.clone(),
                        reentry: true,
                    },
                    TriggerBehaviour::Dynamic { selector, .. } => Resolution::Destination {
                        state: selector(args),
                        reentry: false,
                    },
                });
            }
        }
        if let Some(parent) = &self.superstate {
            if let Some(parent_rep) = states.get(parent) {
                return match parent_rep.try_find_handler(trigger, args, states)? {
                    Resolution::Unhandled { unmet: parent_unmet } => {
                        unmet.extend(parent_unmet);
                        Ok(Resolution::Unhandled { unmet })
                    }
                    resolved => Ok(resolved),
                };
            }
        }
        Ok(Resolution::Unhandled { unmet })
    }

    pub(crate) fn run_exit_actions(&self, transition: &Transition<S, T>, ctx: &mut C, recur: &crate::recur::Recur<'_, S, T, C>) {
        trace!("{:?}: running {} exit action(s)", self.state, self.exit_actions.len());
        for exit_action in &self.exit_actions {
            (exit_action.action)(transition, ctx, recur);
        }
    }

    pub(crate) fn run_entry_actions(&self, transition: &Transition<S, T>, ctx: &mut C, recur: &crate::recur::Recur<'_, S, T, C>) {
        trace!("{:?}: running entry action(s)", self.state);
        for entry_action in &self.entry_actions {
            if entry_action.applies_to(&transition.trigger) {
                (entry_action.action)(transition, ctx, recur);
            }
        }
    }

    /// Runs this state's activation actions unconditionally and marks it
    /// activated. Entry always calls this (a freshly-entered state is always
    /// activated); `Handle::activate` additionally checks `is_activated`
    /// first so a redundant explicit call is a no-op (§8 property 5).
    pub(crate) fn run_activate_actions(&self, ctx: &mut C) {
        for action in &self.activate_actions {
            (action.action)(ctx);
        }
        self.activated.set(true);
    }

    pub(crate) fn run_deactivate_actions(&self, ctx: &mut C) {
        for action in &self.deactivate_actions {
            (action.action)(ctx);
        }
        self.activated.set(false);
    }

    pub(crate) fn is_activated(&self) -> bool {
        self.activated.get()
    }

    /// All triggers that would not be rejected as unhandled from this state:
    /// every trigger declared here or on an ancestor with at least one
    /// passing-guard behaviour (Ignored behaviours count as permitted too,
    /// since firing them does not raise an error).
    pub(crate) fn permitted_triggers(&self, args: &Args, states: &StateMap<S, T, C>) -> Vec<T> {
        self.declared_triggers(states)
            .into_iter()
            .filter(|trigger| {
                !matches!(
                    self.try_find_handler(trigger, args, states),
                    Ok(Resolution::Unhandled { .. }) | Err(_)
                )
            })
            .collect()
    }

    /// Every trigger with a behaviour declared here or on an ancestor,
    /// regardless of whether its guard currently passes.
    pub(crate) fn declared_triggers(&self, states: &StateMap<S, T, C>) -> Vec<T> {
        let mut candidates: Vec<T> = Vec::new();
        let mut current: Option<&StateRepresentation<S, T, C>> = Some(self);
        while let Some(rep) = current {
            for trigger in rep.trigger_behaviours.keys() {
                if !candidates.contains(trigger) {
                    candidates.push(trigger.clone());
                }
            }
            current = rep.superstate.as_ref().and_then(|p| states.get(p));
        }
        candidates
    }
}
