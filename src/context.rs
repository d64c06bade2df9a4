//! The context capability the engine requires of a client object (§3, §9).

/// A client-owned object holding one mutable field of type `S` — its current
/// state. This is the context's sole contract with the engine: no base class,
/// no required trait object hierarchy, just a gettable/settable field.
pub trait Stateful<S> {
    fn state(&self) -> &S;
    fn set_state(&mut self, state: S);
}
