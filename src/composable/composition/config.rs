/// Where public member delegation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberBinding {
    /// Members come only from body manifests; delegation is computed once
    /// per descriptor and shared by every composite.
    #[default]
    PerDescriptor,
    /// Bodies may also return members for the instance they construct.
    /// Those are merged over the descriptor's map for that one composite,
    /// still in resolved order: a per-instance member overrides static ones
    /// from the same or earlier mixins, and a later mixin's static member
    /// overrides it.
    PerInstance,
}

/// Settings a [`Composer`](super::Composer) applies to every descriptor it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerConfig {
    private_prefix: String,
    binding: MemberBinding,
}

impl ComposerConfig {
    pub fn new() -> Self {
        Self {
            private_prefix: "_".to_string(),
            binding: MemberBinding::default(),
        }
    }

    /// Members starting with this prefix stay off the composite surface.
    /// An empty prefix makes every member public.
    pub fn with_private_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.private_prefix = prefix.into();
        self
    }

    pub fn with_binding(mut self, binding: MemberBinding) -> Self {
        self.binding = binding;
        self
    }

    pub fn private_prefix(&self) -> &str {
        &self.private_prefix
    }

    pub fn binding(&self) -> MemberBinding {
        self.binding
    }

    pub fn is_private(&self, member: &str) -> bool {
        !self.private_prefix.is_empty() && member.starts_with(&self.private_prefix)
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self::new()
    }
}
