//! Fluent state configuration (§4.12).

use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use crate::actions::{EntryAction, ExitAction, LifecycleAction};
use crate::args::Args;
use crate::error::Error;
use crate::guard::Guard;
use crate::machine::Engine;
use crate::recur::Recur;
use crate::transition::Transition;
use crate::trigger_behaviour::TriggerBehaviour;

/// Borrowed, fluent configuration handle for one state. Every mutating method
/// re-borrows the engine's state map for the duration of the call only, so
/// nothing is held across the fluent chain itself.
pub struct StateConfiguration<'e, S, T, C> {
    pub(crate) engine: &'e Engine<S, T, C>,
    pub(crate) state: S,
}

impl<'e, S, T, C> StateConfiguration<'e, S, T, C>
where
    S: Eq + Hash + Clone + Debug,
    T: Eq + Hash + Clone + Debug,
{
    fn add_behaviour(self, trigger: T, behaviour: TriggerBehaviour<S, T, C>) -> Result<Self, Error<S, T>> {
        self.engine.guard_not_firing()?;
        {
            let mut states = self.engine.states.borrow_mut();
            let rep = states
                .entry(self.state.clone())
                .or_insert_with(|| crate::state_representation::StateRepresentation::new(self.state.clone()));
            rep.trigger_behaviours
                .entry(trigger)
                .or_insert_with(Vec::new)
                .push(behaviour);
        }
        Ok(self)
    }

    pub fn permit(self, trigger: T, destination: S) -> Result<Self, Error<S, T>> {
        self.engine.ensure_state(&destination);
        self.add_behaviour(
            trigger,
            TriggerBehaviour::Transitioning {
                destination,
                guard: Guard::new(),
            },
        )
    }

    pub fn permit_if(self, trigger: T, destination: S, guard: Guard) -> Result<Self, Error<S, T>> {
        self.engine.ensure_state(&destination);
        self.add_behaviour(trigger, TriggerBehaviour::Transitioning { destination, guard })
    }

    /// Reenters this same state: exits then re-enters it.
    pub fn permit_reentry(self, trigger: T) -> Result<Self, Error<S, T>> {
        let destination = self.state.clone();
        self.add_behaviour(
            trigger,
            TriggerBehaviour::Reentry {
                destination,
                guard: Guard::new(),
            },
        )
    }

    pub fn permit_reentry_if(self, trigger: T, guard: Guard) -> Result<Self, Error<S, T>> {
        let destination = self.state.clone();
        self.add_behaviour(trigger, TriggerBehaviour::Reentry { destination, guard })
    }

    /// Reentry whose destination differs from this state — an ancestor, a
    /// sibling under a common ancestor, or any other configured state (§4.4's
    /// "reentry across a superstate boundary").
    pub fn permit_reentry_to(self, trigger: T, destination: S) -> Result<Self, Error<S, T>> {
        self.engine.ensure_state(&destination);
        self.add_behaviour(
            trigger,
            TriggerBehaviour::Reentry {
                destination,
                guard: Guard::new(),
            },
        )
    }

    pub fn ignore(self, trigger: T) -> Result<Self, Error<S, T>> {
        self.add_behaviour(trigger, TriggerBehaviour::Ignored { guard: Guard::new() })
    }

    pub fn ignore_if(self, trigger: T, guard: Guard) -> Result<Self, Error<S, T>> {
        self.add_behaviour(trigger, TriggerBehaviour::Ignored { guard })
    }

    pub fn internal_transition(
        self,
        trigger: T,
        action: impl Fn(&Transition<S, T>, &mut C, &Recur<'_, S, T, C>) + 'static,
        description: impl Into<String>,
    ) -> Result<Self, Error<S, T>> {
        self.add_behaviour(
            trigger,
            TriggerBehaviour::Internal {
                action: Rc::new(action),
                guard: Guard::new(),
                description: description.into(),
            },
        )
    }

    pub fn internal_transition_if(
        self,
        trigger: T,
        guard: Guard,
        action: impl Fn(&Transition<S, T>, &mut C, &Recur<'_, S, T, C>) + 'static,
        description: impl Into<String>,
    ) -> Result<Self, Error<S, T>> {
        self.add_behaviour(
            trigger,
            TriggerBehaviour::Internal {
                action: Rc::new(action),
                guard,
                description: description.into(),
            },
        )
    }

    pub fn permit_dynamic(
        self,
        trigger: T,
        selector: impl Fn(&Args) -> S + 'static,
        description: impl Into<String>,
    ) -> Result<Self, Error<S, T>> {
        self.add_behaviour(
            trigger,
            TriggerBehaviour::Dynamic {
                selector: Rc::new(selector),
                guard: Guard::new(),
                description: description.into(),
            },
        )
    }

    pub fn permit_dynamic_if(
        self,
        trigger: T,
        guard: Guard,
        selector: impl Fn(&Args) -> S + 'static,
        description: impl Into<String>,
    ) -> Result<Self, Error<S, T>> {
        self.add_behaviour(
            trigger,
            TriggerBehaviour::Dynamic {
                selector: Rc::new(selector),
                guard,
                description: description.into(),
            },
        )
    }

    /// Declares `parent` as this state's superstate. Eagerly rejects cycles,
    /// since the hierarchy is purely structural and can be checked at
    /// configuration time (§4.12).
    pub fn substate_of(self, parent: S) -> Result<Self, Error<S, T>> {
        self.engine.guard_not_firing()?;
        {
            let mut states = self.engine.states.borrow_mut();
            states
                .entry(parent.clone())
                .or_insert_with(|| crate::state_representation::StateRepresentation::new(parent.clone()));

            let mut cursor = Some(parent.clone());
            while let Some(candidate) = cursor {
                if candidate == self.state {
                    return Err(Error::CyclicHierarchy {
                        child: self.state.clone(),
                        parent,
                    });
                }
                cursor = states.get(&candidate).and_then(|r| r.superstate.clone());
            }

            states
                .entry(self.state.clone())
                .or_insert_with(|| crate::state_representation::StateRepresentation::new(self.state.clone()));
            states.get_mut(&self.state).unwrap().superstate = Some(parent.clone());

            let child = self.state.clone();
            let parent_rep = states.get_mut(&parent).unwrap();
            if !parent_rep.substates.contains(&child) {
                parent_rep.substates.push(child);
            }
        }
        Ok(self)
    }

    /// Records a target to automatically descend into right after this state is
    /// entered. Whether `target` is actually a direct substate is checked at
    /// fire time (§4.4), not here.
    pub fn initial_transition(self, target: S) -> Self {
        self.engine.ensure_state(&target);
        {
            let mut states = self.engine.states.borrow_mut();
            if let Some(rep) = states.get_mut(&self.state) {
                rep.initial_transition_target = Some(target);
            }
        }
        self
    }

    pub fn on_entry(self, action: impl Fn(&Transition<S, T>, &mut C, &Recur<'_, S, T, C>) + 'static, description: impl Into<String>) -> Self {
        self.push_entry(None, action, description)
    }

    pub fn on_entry_from(
        self,
        trigger: T,
        action: impl Fn(&Transition<S, T>, &mut C, &Recur<'_, S, T, C>) + 'static,
        description: impl Into<String>,
    ) -> Self {
        self.push_entry(Some(trigger), action, description)
    }

    fn push_entry(
        self,
        from_trigger: Option<T>,
        action: impl Fn(&Transition<S, T>, &mut C, &Recur<'_, S, T, C>) + 'static,
        description: impl Into<String>,
    ) -> Self {
        {
            let mut states = self.engine.states.borrow_mut();
            let rep = states
                .entry(self.state.clone())
                .or_insert_with(|| crate::state_representation::StateRepresentation::new(self.state.clone()));
            rep.entry_actions.push(EntryAction {
                action: Rc::new(action),
                from_trigger,
                description: description.into(),
            });
        }
        self
    }

    pub fn on_exit(self, action: impl Fn(&Transition<S, T>, &mut C, &Recur<'_, S, T, C>) + 'static, description: impl Into<String>) -> Self {
        {
            let mut states = self.engine.states.borrow_mut();
            let rep = states
                .entry(self.state.clone())
                .or_insert_with(|| crate::state_representation::StateRepresentation::new(self.state.clone()));
            rep.exit_actions.push(ExitAction {
                action: Rc::new(action),
                description: description.into(),
            });
        }
        self
    }

    pub fn on_activate(self, action: impl Fn(&mut C) + 'static, description: impl Into<String>) -> Self {
        {
            let mut states = self.engine.states.borrow_mut();
            let rep = states
                .entry(self.state.clone())
                .or_insert_with(|| crate::state_representation::StateRepresentation::new(self.state.clone()));
            rep.activate_actions.push(LifecycleAction {
                action: Rc::new(action),
                description: description.into(),
            });
        }
        self
    }

    pub fn on_deactivate(self, action: impl Fn(&mut C) + 'static, description: impl Into<String>) -> Self {
        {
            let mut states = self.engine.states.borrow_mut();
            let rep = states
                .entry(self.state.clone())
                .or_insert_with(|| crate::state_representation::StateRepresentation::new(self.state.clone()));
            rep.deactivate_actions.push(LifecycleAction {
                action: Rc::new(action),
                description: description.into(),
            });
        }
        self
    }
}
