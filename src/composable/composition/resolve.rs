use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::warn;

use crate::composable::{MixinId, MixinRef};
use crate::error::CompositionError;

use super::Composer;

/// Flatten declared dependencies into a deduplicated, dependency-first list.
///
/// Each declared dependency not yet present is preceded by those of its own
/// resolved dependencies not yet present. A dependency shared by two
/// declared ones lands where the first of them puts it.
pub(crate) fn resolve(
    composer: &Composer,
    declared: &[MixinRef],
) -> Result<IndexMap<MixinId, MixinRef>, CompositionError> {
    let mut resolved: IndexMap<MixinId, MixinRef> = IndexMap::new();

    for dependency in declared {
        let id = composer.identify_mixin(dependency);
        if present(&resolved, id, dependency)? {
            continue;
        }

        if let MixinRef::Descriptor(descriptor) = dependency {
            for (transitive_id, transitive) in descriptor.resolved() {
                admit(&mut resolved, transitive_id, transitive)?;
            }
        }

        admit(&mut resolved, id, dependency)?;
    }

    Ok(resolved)
}

/// Whether `mixin` is already in the list. A different mixin under the same
/// identity is a conflict.
fn present(
    resolved: &IndexMap<MixinId, MixinRef>,
    id: MixinId,
    mixin: &MixinRef,
) -> Result<bool, CompositionError> {
    match resolved.get(&id) {
        Some(existing) if existing.same_as(mixin) => Ok(true),
        Some(existing) => Err(conflict(id, existing, mixin)),
        None => Ok(false),
    }
}

/// Append `mixin` unless it is already in the list. Never replaces an entry.
fn admit(
    resolved: &mut IndexMap<MixinId, MixinRef>,
    id: MixinId,
    mixin: &MixinRef,
) -> Result<(), CompositionError> {
    match resolved.entry(id) {
        Entry::Occupied(existing) if existing.get().same_as(mixin) => Ok(()),
        Entry::Occupied(existing) => Err(conflict(id, existing.get(), mixin)),
        Entry::Vacant(slot) => {
            slot.insert(mixin.clone());
            Ok(())
        }
    }
}

fn conflict(id: MixinId, held: &MixinRef, claimed: &MixinRef) -> CompositionError {
    warn!(
        %id,
        held_by = held.name(),
        claimed_by = claimed.name(),
        "identity conflict during dependency resolution"
    );
    CompositionError::IdentityConflict { id }
}
