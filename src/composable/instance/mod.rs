mod context;

pub use context::{MixinContext, Sibling};

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::trace;

use crate::composable::body::Body;
use crate::composable::composition::{MemberBinding, MixinDescriptor};
use crate::composable::{Identified, Instance, Method, MixinId};
use crate::error::CompositionError;
use crate::value::Value;

/// One constructed mixin instance inside a composite.
pub(crate) struct Entry {
    body: Body,
    state: RefCell<Box<dyn Any>>,
    members: IndexMap<String, Method>,
}

impl Entry {
    /// Per-instance members first, then the body's declared ones.
    fn member(&self, name: &str) -> Option<&Method> {
        self.members.get(name).or_else(|| self.body.member(name))
    }
}

/// Mixin identity → instance, for one composite construction.
#[derive(Default)]
pub(crate) struct InstanceTable {
    entries: RefCell<IndexMap<MixinId, Rc<Entry>>>,
}

impl InstanceTable {
    fn get(&self, id: MixinId) -> Option<Rc<Entry>> {
        self.entries.borrow().get(&id).cloned()
    }

    fn insert(&self, id: MixinId, entry: Entry) {
        self.entries.borrow_mut().insert(id, Rc::new(entry));
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

pub(crate) struct CompositeCore {
    descriptor: MixinDescriptor,
    table: InstanceTable,
    /// Public per-instance members, name → owning mixin. Empty unless the
    /// descriptor binds members per instance. Never holds a name that a later
    /// mixin declares statically.
    instance_members: RefCell<IndexMap<String, MixinId>>,
    ready: Cell<bool>,
}

impl CompositeCore {
    fn new(descriptor: MixinDescriptor) -> Self {
        Self {
            descriptor,
            table: InstanceTable::default(),
            instance_members: RefCell::new(IndexMap::new()),
            ready: Cell::new(false),
        }
    }

    fn register(&self, id: MixinId, body: &Body, instance: Instance) -> Result<(), CompositionError> {
        let Instance { state, members } = instance;
        let config = self.descriptor.config();

        if let Some(member) = members.keys().next() {
            if config.binding() == MemberBinding::PerDescriptor {
                return Err(CompositionError::InstanceMembersDisabled {
                    mixin: id,
                    member: member.clone(),
                });
            }
        }

        let mut instance_members = self.instance_members.borrow_mut();
        for name in members.keys().filter(|name| !config.is_private(name)) {
            if self.shadowed_by_later(id, name) {
                trace!(%id, member = name.as_str(), "per-instance member shadowed by a later mixin");
                continue;
            }
            instance_members.insert(name.clone(), id);
        }

        self.table.insert(
            id,
            Entry {
                body: body.clone(),
                state: RefCell::new(state),
                members,
            },
        );
        Ok(())
    }

    /// Whether a mixin after `id` in resolved order declares `name` statically.
    fn shadowed_by_later(&self, id: MixinId, name: &str) -> bool {
        let Some(member) = self.descriptor.public_member(name) else {
            return false;
        };
        match (self.descriptor.position(member.owner), self.descriptor.position(id)) {
            (Some(owner), Some(here)) => owner > here,
            _ => false,
        }
    }

    pub(crate) fn entry(&self, id: MixinId) -> Result<Rc<Entry>, CompositionError> {
        self.table
            .get(id)
            .ok_or_else(|| CompositionError::MixinNotFound { mixin: id.to_string() })
    }

    pub(crate) fn lookup(&self, mixin: &dyn Identified) -> Result<(MixinId, Rc<Entry>), CompositionError> {
        let not_found = || CompositionError::MixinNotFound { mixin: mixin.label() };
        let id = mixin.identity().ok_or_else(not_found)?;
        let entry = self.table.get(id).ok_or_else(not_found)?;
        Ok((id, entry))
    }

    fn call_public(self: &Rc<Self>, name: &str, args: &[Value]) -> Result<Value, CompositionError> {
        if !self.ready.get() {
            return Err(CompositionError::Incomplete);
        }

        let not_found = || CompositionError::MemberNotFound { member: name.to_string() };
        let instance_owner = self.instance_members.borrow().get(name).copied();

        let (owner, method) = match instance_owner {
            Some(owner) => {
                let entry = self.entry(owner)?;
                let method = entry.members.get(name).cloned().ok_or_else(not_found)?;
                (owner, method)
            }
            None => {
                let member = self.descriptor.public_member(name).ok_or_else(not_found)?;
                (member.owner, member.method.clone())
            }
        };

        trace!(member = name, %owner, "dispatching public member");
        self.invoke(owner, &method, args)
    }

    pub(crate) fn invoke(
        self: &Rc<Self>,
        owner: MixinId,
        method: &Method,
        args: &[Value],
    ) -> Result<Value, CompositionError> {
        let entry = self.entry(owner)?;
        let mut state = entry
            .state
            .try_borrow_mut()
            .map_err(|_| CompositionError::InstanceBusy { mixin: owner })?;
        let ctx = MixinContext::new(self, owner);
        method.invoke(&mut **state, &ctx, args)
    }

    fn members(&self) -> Vec<String> {
        let mut names: Vec<String> = self.descriptor.members().map(str::to_string).collect();
        for name in self.instance_members.borrow().keys() {
            if !self.descriptor.has_member(name) {
                names.push(name.clone());
            }
        }
        names
    }

    fn has_member(&self, name: &str) -> bool {
        self.descriptor.has_member(name) || self.instance_members.borrow().contains_key(name)
    }
}

/// Build one composite: instantiate every mixin in resolved order, each
/// seeing the instances registered before it.
pub(crate) fn construct(
    descriptor: &MixinDescriptor,
    args: &[Value],
) -> Result<Composite, CompositionError> {
    let core = Rc::new(CompositeCore::new(descriptor.clone()));

    for (id, body) in descriptor.lineage() {
        let ctx = MixinContext::new(&core, id);
        let instance = body.instantiate(&ctx, args)?;
        trace!(%id, body = body.name(), "instantiated mixin");
        core.register(id, body, instance)?;
    }

    core.ready.set(true);
    trace!(
        descriptor = %descriptor.id(),
        instances = core.table.len(),
        "composite constructed"
    );
    Ok(Composite { core })
}

/// The object returned by [`MixinDescriptor::construct`].
///
/// Its surface is the descriptor's public member map (plus per-instance
/// members when bound per instance); every call delegates to the owning
/// mixin's instance. Clones refer to the same composite.
#[derive(Clone)]
pub struct Composite {
    core: Rc<CompositeCore>,
}

impl Composite {
    /// Invoke a public member.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, CompositionError> {
        self.core.call_public(name, args)
    }

    pub fn members(&self) -> Vec<String> {
        self.core.members()
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.core.has_member(name)
    }

    pub fn descriptor(&self) -> &MixinDescriptor {
        &self.core.descriptor
    }

    /// The instance a specific mixin contributed to this composite.
    pub fn mixin(&self, mixin: impl Identified) -> Result<Sibling<'_>, CompositionError> {
        Sibling::lookup(&self.core, &mixin)
    }

    pub fn downgrade(&self) -> CompositeRef {
        CompositeRef {
            core: Rc::downgrade(&self.core),
        }
    }
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("descriptor", &self.core.descriptor.id())
            .field("members", &self.members())
            .finish()
    }
}

/// Weak back-reference to a composite, handed to mixins during construction.
#[derive(Clone)]
pub struct CompositeRef {
    core: Weak<CompositeCore>,
}

impl CompositeRef {
    pub fn upgrade(&self) -> Option<Composite> {
        self.core.upgrade().map(|core| Composite { core })
    }

    /// Invoke a public member of the composite.
    ///
    /// Fails with `Incomplete` while the composite is still being
    /// constructed and `Unavailable` once it has been dropped.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, CompositionError> {
        let core = self.core.upgrade().ok_or(CompositionError::Unavailable)?;
        core.call_public(name, args)
    }
}

impl fmt::Debug for CompositeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeRef")
            .field("alive", &(self.core.strong_count() > 0))
            .finish()
    }
}
