mod composer;
mod config;
mod projection;
mod resolve;

pub use composer::Composer;
pub use config::{ComposerConfig, MemberBinding};
pub(crate) use projection::PublicMember;

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::composable::body::Body;
use crate::composable::instance::{self, Composite};
use crate::composable::{MixinId, MixinRef};
use crate::error::CompositionError;
use crate::value::Value;

use projection::PublicMemberMap;

struct DescriptorInner {
    id: MixinId,
    body: Body,
    dependencies: IndexMap<MixinId, MixinRef>,
    members: PublicMemberMap,
    config: ComposerConfig,
}

/// The reusable result of composing dependencies with a body.
///
/// A descriptor is a mixin of its own: its identity is assigned when it is
/// composed and is distinct from its body's, so two descriptors over the
/// same body stay two mixins.
///
/// Holds the resolved dependency list (flattened, deduplicated,
/// dependency-first) and the public member map, both fixed at composition
/// time and shared by every composite constructed from it.
#[derive(Clone)]
pub struct MixinDescriptor(Rc<DescriptorInner>);

impl MixinDescriptor {
    pub(crate) fn new(
        id: MixinId,
        body: Body,
        dependencies: IndexMap<MixinId, MixinRef>,
        members: PublicMemberMap,
        config: ComposerConfig,
    ) -> Self {
        Self(Rc::new(DescriptorInner {
            id,
            body,
            dependencies,
            members,
            config,
        }))
    }

    pub fn id(&self) -> MixinId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        self.0.body.name()
    }

    pub fn body(&self) -> &Body {
        &self.0.body
    }

    /// Bodies of the resolved dependencies in instantiation order. Excludes the descriptor's own body.
    pub fn dependencies(&self) -> impl ExactSizeIterator<Item = &Body> + '_ {
        self.0.dependencies.values().map(MixinRef::body)
    }

    pub fn dependency_ids(&self) -> Vec<MixinId> {
        self.0.dependencies.keys().copied().collect()
    }

    /// Public member names in first-declaration order.
    pub fn members(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.members.keys().map(String::as_str)
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.0.members.contains_key(name)
    }

    /// The mixin whose implementation the composite's `name` delegates to.
    pub fn owner_of(&self, name: &str) -> Option<MixinId> {
        self.0.members.get(name).map(|member| member.owner)
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.0.config
    }

    /// Construct a composite, forwarding `args` to every body in resolved order.
    pub fn construct(&self, args: &[Value]) -> Result<Composite, CompositionError> {
        instance::construct(self, args)
    }

    pub(crate) fn resolved(&self) -> impl Iterator<Item = (MixinId, &MixinRef)> + '_ {
        self.0.dependencies.iter().map(|(id, mixin)| (*id, mixin))
    }

    /// Dependencies followed by the descriptor's own body.
    pub(crate) fn lineage(&self) -> impl Iterator<Item = (MixinId, &Body)> + '_ {
        self.resolved()
            .map(|(id, mixin)| (id, mixin.body()))
            .chain(std::iter::once((self.0.id, &self.0.body)))
    }

    /// Index of a mixin in instantiation order, the descriptor itself last.
    pub(crate) fn position(&self, id: MixinId) -> Option<usize> {
        if id == self.0.id {
            Some(self.0.dependencies.len())
        } else {
            self.0.dependencies.get_index_of(&id)
        }
    }

    pub(crate) fn same_as(&self, other: &MixinDescriptor) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn public_member(&self, name: &str) -> Option<&PublicMember> {
        self.0.members.get(name)
    }
}

impl fmt::Debug for MixinDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixinDescriptor")
            .field("id", &self.0.id)
            .field("name", &self.name())
            .field("dependencies", &self.dependency_ids())
            .field("members", &self.members().collect::<Vec<_>>())
            .finish()
    }
}
