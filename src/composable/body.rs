use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::CompositionError;
use crate::value::Value;

use super::instance::MixinContext;
use super::{Instance, Method, MixinId};

pub(crate) type InitFn = dyn Fn(&MixinContext<'_>, &[Value]) -> Result<Instance, CompositionError>;

struct BodyInner {
    name: String,
    init: Rc<InitFn>,
    members: IndexMap<String, Method>,
    id: OnceCell<MixinId>,
}

/// The constructor of one mixin plus the manifest of members it declares.
///
/// Cloning is cheap and preserves identity: all clones share the same
/// write-once identity cell.
#[derive(Clone)]
pub struct Body(Rc<BodyInner>);

impl Body {
    pub fn builder(name: impl Into<String>) -> BodyBuilder {
        BodyBuilder {
            name: name.into(),
            init: None,
            members: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Assigned the first time the body takes part in a composition.
    pub fn id(&self) -> Option<MixinId> {
        self.0.id.get().copied()
    }

    /// Declared member names, in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.0.members.keys().map(String::as_str)
    }

    pub(crate) fn member(&self, name: &str) -> Option<&Method> {
        self.0.members.get(name)
    }

    pub(crate) fn declared(&self) -> impl Iterator<Item = (&str, &Method)> {
        self.0.members.iter().map(|(name, method)| (name.as_str(), method))
    }

    /// Whether two handles are the very same body.
    pub fn same_as(&self, other: &Body) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Record the identity. Panics if one was already recorded.
    pub(crate) fn assign_id(&self, id: MixinId) {
        let assigned = self.0.id.set(id);
        assert!(
            assigned.is_ok(),
            "body '{}' was assigned a second identity ({})",
            self.0.name,
            id
        );
    }

    pub(crate) fn instantiate(
        &self,
        ctx: &MixinContext<'_>,
        args: &[Value],
    ) -> Result<Instance, CompositionError> {
        (self.0.init)(ctx, args)
    }

    /// A new, unidentified body sharing this body's initializer with a narrowed manifest.
    pub(crate) fn with_members(&self, keep: impl Fn(&str) -> bool) -> Body {
        let members = self
            .0
            .members
            .iter()
            .filter(|(name, _)| keep(name))
            .map(|(name, method)| (name.clone(), method.clone()))
            .collect();
        Body(Rc::new(BodyInner {
            name: self.0.name.clone(),
            init: self.0.init.clone(),
            members,
            id: OnceCell::new(),
        }))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("name", &self.0.name)
            .field("id", &self.id())
            .field("members", &self.0.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn stateless(_: &MixinContext<'_>, _: &[Value]) -> Result<Instance, CompositionError> {
    Ok(Instance::stateless())
}

/// Declares a body: its initializer and its member manifest.
pub struct BodyBuilder {
    name: String,
    init: Option<Rc<InitFn>>,
    members: Vec<(String, Method)>,
}

impl BodyBuilder {
    /// Set the initializer. Without one the body is stateless.
    pub fn init<F>(mut self, f: F) -> Self
    where
        F: Fn(&MixinContext<'_>, &[Value]) -> Result<Instance, CompositionError> + 'static,
    {
        self.init = Some(Rc::new(f));
        self
    }

    /// Declare a member operating on instance state of type `S`.
    pub fn method<S, F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        S: 'static,
        F: Fn(&mut S, &MixinContext<'_>, &[Value]) -> Result<Value, CompositionError> + 'static,
    {
        self.members.push((name.into(), Method::new(f)));
        self
    }

    pub fn build(self) -> Result<Body, CompositionError> {
        let malformed = |reason: String| CompositionError::MalformedBody {
            body: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(malformed("body name is empty".to_string()));
        }

        let mut members: IndexMap<String, Method> = IndexMap::with_capacity(self.members.len());
        for (name, method) in self.members {
            if name.is_empty() {
                return Err(malformed("member name is empty".to_string()));
            }
            if members.contains_key(&name) {
                return Err(malformed(format!("member '{}' declared twice", name)));
            }
            members.insert(name, method);
        }

        let init: Rc<InitFn> = match self.init {
            Some(init) => init,
            None => Rc::new(stateless),
        };

        Ok(Body(Rc::new(BodyInner {
            name: self.name,
            init,
            members,
            id: OnceCell::new(),
        })))
    }
}
