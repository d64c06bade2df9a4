//! Introspection snapshot consumed by diagram generators (§4.14, §6).

use std::fmt::Debug;
use std::hash::Hash;

use crate::state_representation::StateMap;
use crate::trigger_behaviour::TriggerBehaviour;

/// One outgoing transition from a state, classified by how its destination
/// is determined.
#[derive(Debug, Clone)]
pub enum TransitionInfo<S, T> {
    /// A Transitioning or Reentry behaviour: destination known at configuration time.
    Fixed(FixedTransitionInfo<S, T>),
    /// A Dynamic behaviour: destination computed at fire time from a selector.
    Dynamic(DynamicTransitionInfo<T>),
    /// An Ignored behaviour: trigger consumed, no state change.
    Ignored(IgnoredTransitionInfo<T>),
}

#[derive(Debug, Clone)]
pub struct FixedTransitionInfo<S, T> {
    pub trigger: T,
    pub destination: S,
    pub is_reentry: bool,
    pub guard_descriptions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DynamicTransitionInfo<T> {
    pub trigger: T,
    pub selector_description: String,
    pub guard_descriptions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct IgnoredTransitionInfo<T> {
    pub trigger: T,
    pub guard_descriptions: Vec<String>,
}

/// One node in the snapshot graph: everything known about a single state.
#[derive(Debug, Clone)]
pub struct StateInfo<S, T> {
    pub state: S,
    pub superstate: Option<S>,
    pub substates: Vec<S>,
    pub entry_action_descriptions: Vec<String>,
    pub exit_action_descriptions: Vec<String>,
    pub activate_action_descriptions: Vec<String>,
    pub deactivate_action_descriptions: Vec<String>,
    pub transitions: Vec<TransitionInfo<S, T>>,
}

/// The full snapshot graph returned by `get_info` (§4.14).
#[derive(Debug, Clone)]
pub struct StateMachineInfo<S, T> {
    pub initial_state: S,
    pub states: Vec<StateInfo<S, T>>,
}

/// Builds a deterministic snapshot in declaration order (`IndexMap`-backed
/// everywhere underneath, so iteration order matches configuration order).
pub(crate) fn build_info<S, T, C>(states: &StateMap<S, T, C>, initial_state: S) -> StateMachineInfo<S, T>
where
    S: Eq + Hash + Clone + Debug,
    T: Eq + Hash + Clone + Debug,
{
    let nodes = states
        .values()
        .map(|rep| {
            let mut transitions = Vec::new();
            for (trigger, behaviours) in rep.trigger_behaviours.iter() {
                for behaviour in behaviours {
                    if let Some(info) = describe(trigger, behaviour) {
                        transitions.push(info);
                    }
                }
            }
            StateInfo {
                state: rep.state.clone(),
                superstate: rep.superstate.clone(),
                substates: rep.substates.clone(),
                entry_action_descriptions: rep.entry_actions.iter().map(|a| a.description.clone()).collect(),
                exit_action_descriptions: rep.exit_actions.iter().map(|a| a.description.clone()).collect(),
                activate_action_descriptions: rep.activate_actions.iter().map(|a| a.description.clone()).collect(),
                deactivate_action_descriptions: rep.deactivate_actions.iter().map(|a| a.description.clone()).collect(),
                transitions,
            }
        })
        .collect();
    StateMachineInfo {
        initial_state,
        states: nodes,
    }
}

/// Describes one behaviour as a graph edge. Internal transitions have no
/// state-change semantics to report and are omitted (§4.14 names only Fixed,
/// Dynamic, and Ignored).
fn describe<S, T, C>(trigger: &T, behaviour: &TriggerBehaviour<S, T, C>) -> Option<TransitionInfo<S, T>>
where
    S: Clone,
    T: Clone,
{
    Some(match behaviour {
        TriggerBehaviour::Transitioning { destination, guard } => TransitionInfo::Fixed(FixedTransitionInfo {
            trigger: trigger.clone(),
            destination: destination.clone(),
            is_reentry: false,
            guard_descriptions: guard.descriptions(),
        }),
        TriggerBehaviour::Reentry { destination, guard } => TransitionInfo::Fixed(FixedTransitionInfo {
            trigger: trigger.clone(),
            destination: destination.clone(),
            is_reentry: true,
            guard_descriptions: guard.descriptions(),
        }),
        TriggerBehaviour::Dynamic { guard, description, .. } => TransitionInfo::Dynamic(DynamicTransitionInfo {
            trigger: trigger.clone(),
            selector_description: description.clone(),
            guard_descriptions: guard.descriptions(),
        }),
        TriggerBehaviour::Ignored { guard } => TransitionInfo::Ignored(IgnoredTransitionInfo {
            trigger: trigger.clone(),
            guard_descriptions: guard.descriptions(),
        }),
        TriggerBehaviour::Internal { .. } => return None,
    })
}
