use std::cell::Cell;

use tracing::{debug, trace};

use crate::composable::body::Body;
use crate::composable::{MixinId, MixinRef};
use crate::error::CompositionError;

use super::config::ComposerConfig;
use super::projection::project;
use super::resolve::resolve;
use super::MixinDescriptor;

const FIRST_ID: u64 = 1;

/// Composition context: owns the identity counter and the configuration
/// applied to every descriptor it composes.
///
/// Bodies keep their identity for life, so all compositions that share
/// bodies should go through the same composer.
#[derive(Debug)]
pub struct Composer {
    config: ComposerConfig,
    next_id: Cell<u64>,
}

impl Composer {
    pub fn new() -> Self {
        Self::with_config(ComposerConfig::default())
    }

    pub fn with_config(config: ComposerConfig) -> Self {
        Self {
            config,
            next_id: Cell::new(FIRST_ID),
        }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Return the body's identity, assigning the next one on first encounter.
    pub fn identify(&self, body: &Body) -> MixinId {
        if let Some(id) = body.id() {
            return id;
        }

        let id = self.next_identity();
        body.assign_id(id);
        trace!(%id, body = body.name(), "assigned mixin identity");
        id
    }

    /// Identity of a dependency: a leaf takes its body's, a descriptor has its own.
    pub(crate) fn identify_mixin(&self, mixin: &MixinRef) -> MixinId {
        match mixin {
            MixinRef::Leaf(body) => self.identify(body),
            MixinRef::Descriptor(descriptor) => descriptor.id(),
        }
    }

    fn next_identity(&self) -> MixinId {
        let id = MixinId::new(self.next_id.get());
        self.next_id.set(id.get() + 1);
        id
    }

    /// Rewind the identity counter. Bodies identified before the reset keep
    /// their identity; mixing them with bodies identified afterwards is
    /// reported as an identity conflict.
    pub fn reset(&self) {
        debug!(next = self.next_id.get(), "resetting mixin identity counter");
        self.next_id.set(FIRST_ID);
    }

    /// Compose `dependencies` (in declared order) with a new `body`.
    ///
    /// Resolves the flattened dependency list, gives the descriptor a fresh
    /// identity and computes the public member map once for all future
    /// composites. The body may back other descriptors too; it is rejected
    /// only when it already appears among its own dependencies.
    pub fn compose(
        &self,
        dependencies: &[MixinRef],
        body: Body,
    ) -> Result<MixinDescriptor, CompositionError> {
        let resolved = resolve(self, dependencies)?;

        let id = self.next_identity();
        if resolved.contains_key(&id) {
            return Err(CompositionError::IdentityConflict { id });
        }
        if resolved.values().any(|dependency| dependency.body().same_as(&body)) {
            return Err(CompositionError::SelfDependency {
                body: body.name().to_string(),
            });
        }

        let members = project(
            &self.config,
            resolved
                .iter()
                .map(|(dep_id, dep)| (*dep_id, dep.body()))
                .chain(std::iter::once((id, &body))),
        );

        debug!(
            %id,
            body = body.name(),
            dependencies = resolved.len(),
            members = members.len(),
            "composed mixin"
        );

        Ok(MixinDescriptor::new(
            id,
            body,
            resolved,
            members,
            self.config.clone(),
        ))
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composable::composition::MemberBinding;
    use crate::value::Value;

    fn leaf(name: &str) -> Body {
        Body::builder(name).build().unwrap()
    }

    #[test]
    fn identities_increase_monotonically() {
        let composer = Composer::new();
        let a = leaf("a");
        let b = leaf("b");

        let first = composer.identify(&a);
        let second = composer.identify(&b);

        assert!(second > first);
        assert_eq!(composer.identify(&a), first);
    }

    #[test]
    fn dependencies_are_identified_before_the_descriptor() {
        let composer = Composer::new();
        let dep = leaf("dep");
        let descriptor = composer.compose(&[(&dep).into()], leaf("top")).unwrap();

        assert!(dep.id().unwrap() < descriptor.id());
        assert_eq!(descriptor.body().id(), None);
    }

    #[test]
    fn each_descriptor_gets_its_own_identity() {
        let composer = Composer::new();
        let shared = leaf("shared");

        let first = composer.compose(&[], shared.clone()).unwrap();
        let second = composer.compose(&[], shared.clone()).unwrap();

        assert_ne!(first.id(), second.id());
        assert!(first.body().same_as(second.body()));
    }

    #[test]
    fn reset_rewinds_the_counter() {
        let composer = Composer::new();
        let first = composer.identify(&leaf("a"));
        composer.identify(&leaf("b"));

        composer.reset();
        assert_eq!(composer.identify(&leaf("c")), first);
    }

    #[test]
    fn body_depending_on_itself_is_rejected() {
        let composer = Composer::new();
        let body = leaf("loop");

        let err = composer.compose(&[(&body).into()], body.clone()).unwrap_err();
        assert!(matches!(err, CompositionError::SelfDependency { ref body } if body == "loop"));
    }

    #[test]
    fn body_reached_through_a_descriptor_is_a_self_dependency() {
        let composer = Composer::new();
        let body = leaf("loop");
        let inner = composer.compose(&[], body.clone()).unwrap();

        let err = composer.compose(&[(&inner).into()], body).unwrap_err();
        assert!(matches!(err, CompositionError::SelfDependency { ref body } if body == "loop"));
    }

    #[test]
    fn descriptor_records_member_owners() {
        let composer = Composer::new();
        let base = composer
            .compose(
                &[],
                Body::builder("base")
                    .method("describe", |_: &mut (), _, _| Ok(Value::from("base")))
                    .method("_hidden", |_: &mut (), _, _| Ok(Value::Unit))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let derived = composer
            .compose(
                &[(&base).into()],
                Body::builder("derived")
                    .method("describe", |_: &mut (), _, _| Ok(Value::from("derived")))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        assert_eq!(derived.owner_of("describe"), Some(derived.id()));
        assert_eq!(base.owner_of("describe"), Some(base.id()));
        assert!(!derived.has_member("_hidden"));
    }

    #[test]
    fn descriptors_capture_the_composer_config() {
        let composer = Composer::with_config(
            ComposerConfig::default().with_binding(MemberBinding::PerInstance),
        );
        let descriptor = composer.compose(&[], leaf("a")).unwrap();

        assert_eq!(descriptor.config().binding(), MemberBinding::PerInstance);
    }
}
