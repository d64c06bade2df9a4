//! A hierarchical finite-state-machine dispatch engine.
//!
//! An [`Engine`] owns state configuration; a [`Handle`] binds one context to
//! one engine and is the object clients actually call `fire` on.

mod actions;
mod args;
mod builder;
mod context;
mod error;
mod guard;
mod handle;
mod machine;
mod recur;
mod reflection;
mod state_representation;
mod transition;
mod trigger_behaviour;

pub use args::{Args, ParameterDescriptor, TypeTag};
pub use builder::StateConfiguration;
pub use context::Stateful;
pub use error::Error;
pub use guard::Guard;
pub use handle::Handle;
pub use machine::{Engine, FiringMode};
pub use recur::Recur;
pub use reflection::{DynamicTransitionInfo, FixedTransitionInfo, IgnoredTransitionInfo, StateInfo, StateMachineInfo, TransitionInfo};
pub use transition::Transition;

pub type Result<T, S, U> = std::result::Result<T, Error<S, U>>;
