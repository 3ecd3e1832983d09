pub mod body;
pub mod composition;
pub mod filtered;
pub mod instance;

use std::any::{type_name, Any};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::CompositionError;
use crate::value::Value;
use body::Body;
use composition::MixinDescriptor;
use instance::MixinContext;

/// Identity of a mixin (a leaf body or a descriptor), assigned once by a
/// [`Composer`](composition::Composer).
///
/// Identity, not structure, is the key for deduplication, instance table
/// lookup and member ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MixinId(u64);

impl MixinId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MixinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mixin#{}", self.0)
    }
}

type MethodFn =
    dyn Fn(&mut dyn Any, &MixinContext<'_>, &[Value]) -> Result<Value, CompositionError>;

/// A member implementation bound to the instance state of one mixin.
///
/// The closure is shared by every instance of the mixin; the state it
/// operates on is handed in at call time.
#[derive(Clone)]
pub struct Method(Rc<MethodFn>);

impl Method {
    pub fn new<S, F>(f: F) -> Self
    where
        S: 'static,
        F: Fn(&mut S, &MixinContext<'_>, &[Value]) -> Result<Value, CompositionError> + 'static,
    {
        Self::erased(move |state, ctx, args| {
            let state = state
                .downcast_mut::<S>()
                .ok_or(CompositionError::StateType {
                    mixin: ctx.mixin_id(),
                    expected: type_name::<S>(),
                })?;
            f(state, ctx, args)
        })
    }

    fn erased<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Any, &MixinContext<'_>, &[Value]) -> Result<Value, CompositionError> + 'static,
    {
        Self(Rc::new(f))
    }

    pub(crate) fn invoke(
        &self,
        state: &mut dyn Any,
        ctx: &MixinContext<'_>,
        args: &[Value],
    ) -> Result<Value, CompositionError> {
        (self.0)(state, ctx, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Method(..)")
    }
}

/// What a body's initializer produces for one composite construction.
///
/// `state` is exclusively owned by the instance table entry. `members` are
/// per-instance members; they are only accepted when the descriptor binds
/// members per instance.
pub struct Instance {
    pub(crate) state: Box<dyn Any>,
    pub(crate) members: IndexMap<String, Method>,
}

impl Instance {
    pub fn new<S: 'static>(state: S) -> Self {
        Self {
            state: Box::new(state),
            members: IndexMap::new(),
        }
    }

    /// An instance with no state of its own.
    pub fn stateless() -> Self {
        Self::new(())
    }

    /// Attach a member to this instance only. Later calls with the same name overwrite.
    pub fn with_member<S, F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        S: 'static,
        F: Fn(&mut S, &MixinContext<'_>, &[Value]) -> Result<Value, CompositionError> + 'static,
    {
        self.members.insert(name.into(), Method::new(f));
        self
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A dependency handed to the composer: either a bare body (a leaf with no
/// dependencies of its own) or a composed descriptor.
#[derive(Clone, Debug)]
pub enum MixinRef {
    Leaf(Body),
    Descriptor(MixinDescriptor),
}

impl MixinRef {
    /// The body instantiated for this dependency.
    pub fn body(&self) -> &Body {
        match self {
            MixinRef::Leaf(body) => body,
            MixinRef::Descriptor(descriptor) => descriptor.body(),
        }
    }

    /// Whether both refer to the very same mixin: the same leaf body, or the
    /// same descriptor. A leaf and a descriptor over one body are different mixins.
    pub fn same_as(&self, other: &MixinRef) -> bool {
        match (self, other) {
            (MixinRef::Leaf(a), MixinRef::Leaf(b)) => a.same_as(b),
            (MixinRef::Descriptor(a), MixinRef::Descriptor(b)) => a.same_as(b),
            _ => false,
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.body().name()
    }
}

impl From<Body> for MixinRef {
    fn from(body: Body) -> Self {
        MixinRef::Leaf(body)
    }
}

impl From<&Body> for MixinRef {
    fn from(body: &Body) -> Self {
        MixinRef::Leaf(body.clone())
    }
}

impl From<MixinDescriptor> for MixinRef {
    fn from(descriptor: MixinDescriptor) -> Self {
        MixinRef::Descriptor(descriptor)
    }
}

impl From<&MixinDescriptor> for MixinRef {
    fn from(descriptor: &MixinDescriptor) -> Self {
        MixinRef::Descriptor(descriptor.clone())
    }
}

/// Anything that names a mixin for instance table lookups.
pub trait Identified {
    /// `None` if the mixin never took part in a composition.
    fn identity(&self) -> Option<MixinId>;

    /// Human-readable label for diagnostics.
    fn label(&self) -> String {
        match self.identity() {
            Some(id) => id.to_string(),
            None => "unidentified mixin".to_string(),
        }
    }
}

impl Identified for MixinId {
    fn identity(&self) -> Option<MixinId> {
        Some(*self)
    }
}

impl Identified for Body {
    fn identity(&self) -> Option<MixinId> {
        self.id()
    }

    fn label(&self) -> String {
        match self.id() {
            Some(id) => format!("{} ('{}')", id, self.name()),
            None => format!("unidentified body '{}'", self.name()),
        }
    }
}

impl Identified for MixinDescriptor {
    fn identity(&self) -> Option<MixinId> {
        Some(self.id())
    }

    fn label(&self) -> String {
        format!("{} ('{}')", self.id(), self.name())
    }
}

impl Identified for MixinRef {
    fn identity(&self) -> Option<MixinId> {
        match self {
            MixinRef::Leaf(body) => body.identity(),
            MixinRef::Descriptor(descriptor) => descriptor.identity(),
        }
    }

    fn label(&self) -> String {
        match self {
            MixinRef::Leaf(body) => body.label(),
            MixinRef::Descriptor(descriptor) => descriptor.label(),
        }
    }
}

impl<T: Identified + ?Sized> Identified for &T {
    fn identity(&self) -> Option<MixinId> {
        (**self).identity()
    }

    fn label(&self) -> String {
        (**self).label()
    }
}
