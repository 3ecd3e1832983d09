//! Compose mixins into a single object.
//!
//! A [`Composer`] turns dependency mixins plus a new [`Body`] into a
//! reusable [`MixinDescriptor`]. Shared transitive dependencies are
//! resolved once, so a base mixin reachable through several paths is
//! instantiated a single time per [`Composite`].
//!
//! ```
//! use mixin_runtime_composer::{mix, Args, Body, Composer, Instance, Value};
//!
//! let composer = Composer::new();
//! let counter = Body::builder("counter")
//!     .init(|_, args| Ok(Instance::new(args.int(0)?)))
//!     .method("next", |n: &mut i64, _, _| Ok(Value::Int(*n + 1)))
//!     .build()?;
//!
//! let descriptor = mix!(composer; counter)?;
//! let composite = descriptor.construct(&[Value::Int(5)])?;
//! assert_eq!(composite.call("next", &[])?, Value::Int(6));
//! # Ok::<(), mixin_runtime_composer::CompositionError>(())
//! ```

pub mod composable;
pub mod error;
pub mod value;

pub use composable::body::{Body, BodyBuilder};
pub use composable::composition::{Composer, ComposerConfig, MemberBinding, MixinDescriptor};
pub use composable::filtered::ExportFilter;
pub use composable::instance::{Composite, CompositeRef, MixinContext, Sibling};
pub use composable::{Identified, Instance, Method, MixinId, MixinRef};
pub use error::CompositionError;
pub use value::{Args, Value};

/// Variadic composition: `mix!(composer; dep1, dep2 => body)`.
///
/// Dependencies are bodies or descriptors, taken by reference and resolved
/// left to right. `mix!(composer; body)` composes a body with no dependencies.
#[macro_export]
macro_rules! mix {
    ($composer:expr; $body:expr) => {
        $composer.compose(&[], $body)
    };
    ($composer:expr; $($dependency:expr),+ => $body:expr) => {
        $composer.compose(
            &[$($crate::MixinRef::from(&$dependency)),+],
            $body,
        )
    };
}
