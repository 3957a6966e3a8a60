//! Property Descriptors
//!
//! Bindable properties are declared with explicit descriptor structs
//! registered against the owning type at construction time: default value,
//! parser, interpolation, metadata flags, and optional owner-supplied
//! getter/setter hooks. The signal layer binds to the hooks when present
//! and falls back to its own storage otherwise.
//!
//! Requesting a property that was never registered is a wiring fault: it is
//! reported to the logger sink and the operation becomes a no-op.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::events::Subscription;
use crate::log::{self, LogPayload};
use crate::reactive::signal::{Signal, SignalBuilder};
use crate::tween::Interpolation;

/// Configuration for one bindable property.
pub struct PropertyDescriptor<T>
where
    T: Clone + Send + Sync + 'static,
{
    default: T,
    parser: Option<Arc<dyn Fn(T) -> T + Send + Sync>>,
    interpolation: Option<Interpolation<T>>,
    cloneable: bool,
    inspectable: bool,
    /// Owner-supplied initial-value hook; when present it overrides the
    /// declared default at instantiation time.
    getter: Option<Arc<dyn Fn() -> T + Send + Sync>>,
    /// Owner-supplied write hook; when present, every committed write is
    /// mirrored into the owner.
    setter: Option<Arc<dyn Fn(&T) + Send + Sync>>,
}

impl<T> PropertyDescriptor<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(default: T) -> Self {
        Self {
            default,
            parser: None,
            interpolation: None,
            cloneable: true,
            inspectable: true,
            getter: None,
            setter: None,
        }
    }

    pub fn parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    pub fn interpolation<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &T, f64) -> T + Send + Sync + 'static,
    {
        self.interpolation = Some(Arc::new(f));
        self
    }

    pub fn cloneable(mut self, cloneable: bool) -> Self {
        self.cloneable = cloneable;
        self
    }

    pub fn inspectable(mut self, inspectable: bool) -> Self {
        self.inspectable = inspectable;
        self
    }

    /// Bind the owner's initial-value hook.
    pub fn getter<F>(mut self, getter: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    /// Bind the owner's write hook.
    pub fn setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }
}

/// A property instantiated from a descriptor: the backing signal plus the
/// owner-mirror subscription, kept alive for the property's lifetime.
pub struct Property<T>
where
    T: Clone + Send + Sync + 'static,
{
    signal: Signal<T>,
    _mirror: Option<Subscription>,
}

impl<T> Property<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// The backing signal.
    pub fn signal(&self) -> &Signal<T> {
        &self.signal
    }

    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn set(&self, value: impl Into<T>) {
        self.signal.set(value);
    }

    pub fn reset(&self) {
        self.signal.reset();
    }
}

/// Ordered name -> descriptor table for one owning type.
pub struct PropertyRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    owner: String,
    entries: IndexMap<String, PropertyDescriptor<T>>,
}

impl<T> PropertyRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a registry for the named owning type.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            entries: IndexMap::new(),
        }
    }

    /// Declare a property. Re-declaring a name replaces the descriptor.
    pub fn register(&mut self, name: impl Into<String>, descriptor: PropertyDescriptor<T>) {
        self.entries.insert(name.into(), descriptor);
    }

    /// Registered property names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Build the signal for a registered property.
    ///
    /// When the descriptor carries owner hooks, the getter supplies the
    /// initial value and the setter receives every committed write;
    /// otherwise the signal is its own storage. An unregistered name is
    /// reported and yields `None`.
    pub fn instantiate(&self, name: &str) -> Option<Property<T>> {
        let Some(descriptor) = self.entries.get(name) else {
            log::report(
                LogPayload::message(format!(
                    "property \"{name}\" is not registered on {}",
                    self.owner
                ))
                .with_inspect(serde_json::json!({
                    "owner": &self.owner,
                    "property": name,
                })),
            );
            return None;
        };

        let initial = match &descriptor.getter {
            Some(getter) => getter(),
            None => descriptor.default.clone(),
        };

        let mut builder: SignalBuilder<T> = Signal::builder(initial)
            .key(format!("{}.{}", self.owner, name))
            .cloneable(descriptor.cloneable)
            .inspectable(descriptor.inspectable);
        if let Some(parser) = &descriptor.parser {
            let parser = Arc::clone(parser);
            builder = builder.parser(move |value| parser(value));
        }
        if let Some(interpolation) = &descriptor.interpolation {
            let interpolation = Arc::clone(interpolation);
            builder = builder.interpolation(move |from, to, p| interpolation(from, to, p));
        }
        let signal = builder.build();

        let mirror = descriptor.setter.as_ref().map(|setter| {
            let setter = Arc::clone(setter);
            signal.subscribe(move |value| setter(value))
        });

        Some(Property {
            signal,
            _mirror: mirror,
        })
    }
}
