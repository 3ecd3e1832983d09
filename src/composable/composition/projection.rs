use indexmap::IndexMap;

use crate::composable::body::Body;
use crate::composable::{Method, MixinId};

use super::config::ComposerConfig;

/// A public member and the mixin instance it delegates to.
#[derive(Clone, Debug)]
pub(crate) struct PublicMember {
    pub owner: MixinId,
    pub method: Method,
}

/// Maps export name → owning mixin for deterministic routing.
pub(crate) type PublicMemberMap = IndexMap<String, PublicMember>;

/// Build the public member map over mixins in resolved order.
///
/// Last writer wins: a mixin later in the order shadows a same-named
/// member of an earlier one. Private members never appear.
pub(crate) fn project<'a>(
    config: &ComposerConfig,
    lineage: impl IntoIterator<Item = (MixinId, &'a Body)>,
) -> PublicMemberMap {
    let mut members = PublicMemberMap::new();

    for (owner, body) in lineage {
        for (name, method) in body.declared() {
            if config.is_private(name) {
                continue;
            }
            members.insert(
                name.to_string(),
                PublicMember {
                    owner,
                    method: method.clone(),
                },
            );
        }
    }

    members
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::value::Value;

    fn body(name: &str, members: &[&str]) -> Body {
        members
            .iter()
            .fold(Body::builder(name), |builder, member| {
                builder.method(*member, |_: &mut (), _, _| Ok(Value::Unit))
            })
            .build()
            .unwrap()
    }

    fn owners(map: &PublicMemberMap) -> Vec<(&str, u64)> {
        map.iter()
            .map(|(name, member)| (name.as_str(), member.owner.get()))
            .collect()
    }

    #[test]
    fn later_mixin_wins() {
        let base = body("base", &["describe", "id"]);
        let derived = body("derived", &["describe", "extra"]);

        let map = project(
            &ComposerConfig::default(),
            [(MixinId::new(1), &base), (MixinId::new(2), &derived)],
        );

        assert_eq!(owners(&map), vec![("describe", 2), ("id", 1), ("extra", 2)]);
    }

    #[test]
    fn private_members_are_excluded() {
        let base = body("base", &["_secret", "open"]);

        let map = project(&ComposerConfig::default(), [(MixinId::new(1), &base)]);
        assert_eq!(owners(&map), vec![("open", 1)]);
    }

    #[test]
    fn private_prefix_is_configurable() {
        let base = body("base", &["_open", "internal_x"]);
        let config = ComposerConfig::default().with_private_prefix("internal_");

        let map = project(&config, [(MixinId::new(1), &base)]);
        assert_eq!(owners(&map), vec![("_open", 1)]);
    }

    #[test]
    fn empty_prefix_makes_everything_public() {
        let base = body("base", &["_a", "b"]);
        let config = ComposerConfig::default().with_private_prefix("");

        let map = project(&config, [(MixinId::new(1), &base)]);
        assert_eq!(owners(&map), vec![("_a", 1), ("b", 1)]);
    }
}
