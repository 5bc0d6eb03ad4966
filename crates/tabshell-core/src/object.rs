//! Object model shared by the registry, the disconnect table, and the
//! placement connectors.
//!
//! Resolved objects and their views are reference-counted trait objects;
//! identity is the allocation address, never structural equality.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// An application object the shell can open, place, and close.
///
/// Capabilities are queried, not assumed: an object that owns resources
/// overrides [`ShellObject::as_disposable`], an object that can re-read its
/// parameters overrides [`ShellObject::as_refreshable`], and an object the
/// sidebar may reuse views for overrides [`ShellObject::identity_key`].
pub trait ShellObject: Any {
    /// Stable identity key for view reuse across batched reconciliations.
    /// Objects without a key always receive a fresh view.
    fn identity_key(&self) -> Option<String> {
        None
    }

    /// Resource-owning objects expose their teardown here.
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }

    /// Objects that pull their current parameters on a refresh broadcast.
    fn as_refreshable(&self) -> Option<&dyn Refreshable> {
        None
    }
}

/// Teardown for objects and views that own resources.
pub trait Disposable {
    fn dispose(&self);
}

/// No-argument self-refresh, invoked through the broadcast channel
/// addressed by resolved id.
pub trait Refreshable {
    fn refresh(&self);
}

/// Shared handle to a resolved object or a view.
pub type SharedObject = Rc<dyn ShellObject>;

/// Reference identity of a [`SharedObject`]: two handles compare equal
/// exactly when they point at the same allocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectKey(usize);

impl ObjectKey {
    pub fn of(object: &SharedObject) -> Self {
        Self(Rc::as_ptr(object).cast::<()>() as usize)
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({:#x})", self.0)
    }
}

/// Downcast a shared object to a concrete type, if compatible.
pub fn downcast_object<T: Any>(object: &SharedObject) -> Option<&T> {
    let any: &dyn Any = object.as_ref();
    any.downcast_ref::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;
    impl ShellObject for Plain {}

    struct Keyed(String);
    impl ShellObject for Keyed {
        fn identity_key(&self) -> Option<String> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn object_key_is_reference_identity() {
        let a: SharedObject = Rc::new(Plain);
        let b: SharedObject = Rc::new(Plain);
        let a_again = a.clone();

        assert_eq!(ObjectKey::of(&a), ObjectKey::of(&a_again));
        assert_ne!(ObjectKey::of(&a), ObjectKey::of(&b));
    }

    #[test]
    fn downcast_reaches_the_concrete_type() {
        let keyed: SharedObject = Rc::new(Keyed("figures".into()));

        assert!(downcast_object::<Keyed>(&keyed).is_some());
        assert!(downcast_object::<Plain>(&keyed).is_none());
        assert_eq!(keyed.identity_key().as_deref(), Some("figures"));
    }

    #[test]
    fn capabilities_default_to_absent() {
        let plain: SharedObject = Rc::new(Plain);

        assert!(plain.identity_key().is_none());
        assert!(plain.as_disposable().is_none());
        assert!(plain.as_refreshable().is_none());
    }
}
