//! Type-erased fire arguments and the trigger parameter registry (§4.1).

use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::Error;

/// A reference-counted, type-erased argument tuple passed to a single `fire`.
///
/// Cloning is an `Rc` bump, not a deep copy: the same tuple is threaded,
/// read-only, through guard evaluation, handler resolution, every
/// exit/entry action along a transition's path, and both observers.
#[derive(Clone)]
pub struct Args(Rc<Vec<Box<dyn Any>>>);

impl Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Args(<{} erased value(s)>)", self.0.len())
    }
}

impl Args {
    pub fn none() -> Self {
        Args(Rc::new(Vec::new()))
    }

    pub fn from_vec(values: Vec<Box<dyn Any>>) -> Self {
        Args(Rc::new(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fetches the argument at `index`, downcast to `V`. Returns `None` if the
    /// index is out of range or the stored value is not a `V`.
    pub fn get<V: 'static>(&self, index: usize) -> Option<&V> {
        self.0.get(index).and_then(|boxed| boxed.downcast_ref::<V>())
    }

    fn type_ids(&self) -> Vec<TypeId> {
        self.0.iter().map(|b| (**b).type_id()).collect()
    }
}

/// The declared shape of a trigger's parameters: one type tag per position.
#[derive(Clone, Debug)]
pub struct ParameterDescriptor {
    type_ids: Vec<TypeId>,
    type_names: Vec<&'static str>,
}

impl ParameterDescriptor {
    pub fn arity(&self) -> usize {
        self.type_ids.len()
    }

    pub fn type_names(&self) -> &[&'static str] {
        &self.type_names
    }
}

/// One type tag describing a single declared parameter position.
#[derive(Clone, Copy, Debug)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<V: 'static>() -> Self {
        TypeTag {
            id: TypeId::of::<V>(),
            name: std::any::type_name::<V>(),
        }
    }
}

/// Records, per trigger, the argument types `fire` must supply.
#[derive(Debug)]
pub struct ParameterRegistry<S, T> {
    descriptors: IndexMap<T, ParameterDescriptor>,
    _state: std::marker::PhantomData<S>,
}

impl<S, T> Default for ParameterRegistry<S, T> {
    fn default() -> Self {
        ParameterRegistry {
            descriptors: IndexMap::new(),
            _state: std::marker::PhantomData,
        }
    }
}

impl<S, T> ParameterRegistry<S, T>
where
    S: Debug,
    T: Eq + std::hash::Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_parameters(&mut self, trigger: T, tags: Vec<TypeTag>) -> Result<(), Error<S, T>> {
        if self.descriptors.contains_key(&trigger) {
            return Err(Error::Reconfiguration { trigger });
        }
        let (type_ids, type_names) = tags.into_iter().map(|t| (t.id, t.name)).unzip();
        self.descriptors.insert(
            trigger,
            ParameterDescriptor {
                type_ids,
                type_names,
            },
        );
        Ok(())
    }

    pub fn descriptor(&self, trigger: &T) -> Option<&ParameterDescriptor> {
        self.descriptors.get(trigger)
    }

    /// Validates `args` against the trigger's declared parameter shape, if any
    /// is registered. Untyped (unregistered) triggers are not validated.
    pub fn validate(&self, trigger: &T, args: &Args) -> Result<(), Error<S, T>> {
        let descriptor = match self.descriptors.get(trigger) {
            Some(d) => d,
            None => return Ok(()),
        };
        if args.len() != descriptor.arity() {
            return Err(Error::ArityMismatch {
                trigger: trigger.clone(),
                expected: descriptor.arity(),
                actual: args.len(),
            });
        }
        let actual_ids = args.type_ids();
        for (index, (expected_id, expected_name)) in descriptor
            .type_ids
            .iter()
            .zip(descriptor.type_names.iter())
            .enumerate()
        {
            if actual_ids[index] != *expected_id {
                return Err(Error::TypeMismatch {
                    trigger: trigger.clone(),
                    index,
                    expected: expected_name,
                    actual: "<erased>",
                });
            }
        }
        Ok(())
    }
}
