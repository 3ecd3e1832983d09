use std::any::type_name;
use std::rc::Rc;

use crate::composable::{Identified, MixinId};
use crate::error::CompositionError;
use crate::value::Value;

use super::{CompositeCore, CompositeRef, Entry};

/// What a body initializer or member sees of the composite it belongs to.
///
/// During construction only the mixins earlier in resolved order are
/// registered, and the composite's public surface is not callable yet.
pub struct MixinContext<'a> {
    core: &'a Rc<CompositeCore>,
    mixin: MixinId,
}

impl<'a> MixinContext<'a> {
    pub(crate) fn new(core: &'a Rc<CompositeCore>, mixin: MixinId) -> Self {
        Self { core, mixin }
    }

    /// Identity of the mixin this context was handed to.
    pub fn mixin_id(&self) -> MixinId {
        self.mixin
    }

    /// Look up the instance another mixin contributed to the same composite.
    pub fn sibling(&self, mixin: impl Identified) -> Result<Sibling<'a>, CompositionError> {
        Sibling::lookup(self.core, &mixin)
    }

    /// Back-reference to the composite under construction.
    pub fn composite(&self) -> CompositeRef {
        CompositeRef {
            core: Rc::downgrade(self.core),
        }
    }

    /// Call a member through the composite's public surface.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, CompositionError> {
        self.core.call_public(name, args)
    }
}

/// One mixin's instance within a composite.
///
/// Unlike the composite surface, a sibling exposes the mixin's private
/// members and its per-instance members.
pub struct Sibling<'a> {
    core: &'a Rc<CompositeCore>,
    id: MixinId,
    entry: Rc<Entry>,
}

impl<'a> Sibling<'a> {
    pub(crate) fn lookup(
        core: &'a Rc<CompositeCore>,
        mixin: &dyn Identified,
    ) -> Result<Self, CompositionError> {
        let (id, entry) = core.lookup(mixin)?;
        Ok(Self { core, id, entry })
    }

    pub fn id(&self) -> MixinId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.entry.body.name()
    }

    /// Names this instance answers to, per-instance members first.
    pub fn members(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entry.members.keys().map(String::as_str).collect();
        for name in self.entry.body.members() {
            if !self.entry.members.contains_key(name) {
                names.push(name);
            }
        }
        names
    }

    /// Invoke a member of this mixin directly, private ones included.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, CompositionError> {
        let method = self
            .entry
            .member(name)
            .cloned()
            .ok_or_else(|| CompositionError::MemberNotFound {
                member: name.to_string(),
            })?;
        self.core.invoke(self.id, &method, args)
    }

    /// Borrow the instance state as `S`.
    pub fn with_state<S: 'static, R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, CompositionError> {
        let mut state = self
            .entry
            .state
            .try_borrow_mut()
            .map_err(|_| CompositionError::InstanceBusy { mixin: self.id })?;
        let state = state.downcast_mut::<S>().ok_or(CompositionError::StateType {
            mixin: self.id,
            expected: type_name::<S>(),
        })?;
        Ok(f(state))
    }
}
