//! Action behaviours: entry, exit, activate, deactivate (§2 item 4, §4.4).

use std::rc::Rc;

use crate::recur::Recur;
use crate::transition::Transition;

pub type TransitionAction<S, T, C> = Rc<dyn Fn(&Transition<S, T>, &mut C, &Recur<'_, S, T, C>)>;
pub type PlainAction<C> = Rc<dyn Fn(&mut C)>;

/// An entry action, optionally filtered to run only when entry is reached via
/// one particular trigger.
#[derive(Clone)]
pub struct EntryAction<S, T, C> {
    pub action: TransitionAction<S, T, C>,
    pub from_trigger: Option<T>,
    pub description: String,
}

impl<S, T, C> EntryAction<S, T, C>
where
    T: PartialEq,
{
    pub fn applies_to(&self, trigger: &T) -> bool {
        match &self.from_trigger {
            Some(t) => t == trigger,
            None => true,
        }
    }
}

/// An exit action. Exit actions are never filtered by trigger.
#[derive(Clone)]
pub struct ExitAction<S, T, C> {
    pub action: TransitionAction<S, T, C>,
    pub description: String,
}

/// An activate or deactivate action; these run outside the context of any
/// particular transition, so they receive only the context.
#[derive(Clone)]
pub struct LifecycleAction<C> {
    pub action: PlainAction<C>,
    pub description: String,
}

impl<S, T, C> std::fmt::Debug for EntryAction<S, T, C>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryAction")
            .field("from_trigger", &self.from_trigger)
            .field("description", &self.description)
            .finish()
    }
}

impl<S, T, C> std::fmt::Debug for ExitAction<S, T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitAction")
            .field("description", &self.description)
            .finish()
    }
}

impl<C> std::fmt::Debug for LifecycleAction<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleAction")
            .field("description", &self.description)
            .finish()
    }
}
