use super::body::Body;

/// Extension methods for narrowing the member manifest of a body.
///
/// The filtered body is a new mixin: it shares the initializer but gets
/// its own identity on first composition. Filtered-out members are gone
/// entirely, including from sibling lookups.
pub trait ExportFilter {
    /// Keep members matching the predicate.
    fn filter_members(&self, f: impl Fn(&str) -> bool) -> Body;

    /// Keep only members whose names are in `allow`.
    fn exposing(&self, allow: &[&str]) -> Body {
        self.filter_members(|name| allow.contains(&name))
    }

    /// Remove members whose names are in `deny`; keep everything else.
    fn hiding(&self, deny: &[&str]) -> Body {
        self.filter_members(|name| !deny.contains(&name))
    }
}

impl ExportFilter for Body {
    fn filter_members(&self, f: impl Fn(&str) -> bool) -> Body {
        self.with_members(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn shape() -> Body {
        Body::builder("shape")
            .method("width", |_: &mut (), _, _| Ok(Value::Int(2)))
            .method("height", |_: &mut (), _, _| Ok(Value::Int(3)))
            .method("_scale", |_: &mut (), _, _| Ok(Value::Int(1)))
            .build()
            .unwrap()
    }

    #[test]
    fn exposing_keeps_only_allowed() {
        let filtered = shape().exposing(&["height"]);
        assert_eq!(filtered.members().collect::<Vec<_>>(), ["height"]);
    }

    #[test]
    fn hiding_drops_denied() {
        let filtered = shape().hiding(&["width"]);
        assert_eq!(filtered.members().collect::<Vec<_>>(), ["height", "_scale"]);
    }

    #[test]
    fn filtered_body_is_a_distinct_mixin() {
        let original = shape();
        let filtered = original.exposing(&["width"]);
        assert!(!filtered.same_as(&original));
        assert_eq!(filtered.name(), "shape");
    }
}
