use thiserror::Error;

use crate::composable::MixinId;

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("member not found: '{member}'")]
    MemberNotFound { member: String },

    #[error("{mixin} has no instance in this composite")]
    MixinNotFound { mixin: String },

    #[error("malformed body '{body}': {reason}")]
    MalformedBody { body: String, reason: String },

    #[error("identity {id} is already held by a different body")]
    IdentityConflict { id: MixinId },

    #[error("body '{body}' appears in its own dependency list")]
    SelfDependency { body: String },

    #[error("{mixin} returned per-instance member '{member}', but members are bound per descriptor")]
    InstanceMembersDisabled { mixin: MixinId, member: String },

    #[error("instance state of {mixin} is not a `{expected}`")]
    StateType { mixin: MixinId, expected: &'static str },

    #[error("instance of {mixin} is already in use by an in-flight call")]
    InstanceBusy { mixin: MixinId },

    #[error("composite invoked before construction completed")]
    Incomplete,

    #[error("composite unavailable")]
    Unavailable,

    #[error("argument {index}: expected {expected}")]
    BadArgument { index: usize, expected: &'static str },

    #[error(transparent)]
    Runtime(#[from] anyhow::Error),
}
