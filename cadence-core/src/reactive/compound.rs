//! Compound Signals
//!
//! A compound signal is a structured aggregate of named scalar sub-signals,
//! e.g. a 2D vector made of `x` and `y`. The whole value and the components
//! are both reactive: writing the compound fans out to each child's setter,
//! and reading the whole assembles from the children, so a computed value
//! that reads the compound depends on every component.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::log::{self, LogPayload};
use crate::reactive::signal::Signal;
use crate::tween::Lerp;

/// Counter for generating unique compound-signal IDs.
static COMPOUND_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_compound_id() -> u64 {
    COMPOUND_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A value type that decomposes into named scalar components.
///
/// Key order is the component order; `component` and `from_components` must
/// agree on it.
pub trait CompoundValue: Clone + Send + Sync + 'static {
    /// Component keys, in order.
    const KEYS: &'static [&'static str];

    /// Project the component named `key`.
    fn component(&self, key: &str) -> f64;

    /// Assemble a value from per-key components.
    fn from_components(components: &IndexMap<&'static str, f64>) -> Self;
}

/// A signal whose value is a structured aggregate of named sub-signals.
///
/// Cloning shares the underlying children.
pub struct CompoundSignal<V>
where
    V: CompoundValue,
{
    id: u64,
    children: Arc<IndexMap<&'static str, Signal<f64>>>,
    parser: Option<Arc<dyn Fn(V) -> V + Send + Sync>>,
    default: V,
}

impl<V> CompoundSignal<V>
where
    V: CompoundValue,
{
    /// Create a compound signal with one child per component key.
    pub fn new(default: V) -> Self {
        Self::with_parser_opt(default, None)
    }

    /// Create a compound signal whose whole-value writes are normalized by
    /// `parser` before fanning out.
    pub fn with_parser<F>(default: V, parser: F) -> Self
    where
        F: Fn(V) -> V + Send + Sync + 'static,
    {
        Self::with_parser_opt(default, Some(Arc::new(parser)))
    }

    fn with_parser_opt(default: V, parser: Option<Arc<dyn Fn(V) -> V + Send + Sync>>) -> Self {
        let default = match &parser {
            Some(parse) => parse(default.clone()),
            None => default,
        };
        let children = V::KEYS
            .iter()
            .map(|key| (*key, Signal::new(default.component(key))))
            .collect();
        Self {
            id: next_compound_id(),
            children: Arc::new(children),
            parser,
            default,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Read the whole value, assembled from the children.
    ///
    /// Each child read registers its own dependency, so a collecting
    /// computation becomes a dependent of every component.
    pub fn get(&self) -> V {
        let components = self
            .children
            .iter()
            .map(|(key, signal)| (*key, signal.get()))
            .collect();
        V::from_components(&components)
    }

    /// Read the whole value without registering dependencies.
    pub fn get_untracked(&self) -> V {
        let components = self
            .children
            .iter()
            .map(|(key, signal)| (*key, signal.get_untracked()))
            .collect();
        V::from_components(&components)
    }

    /// Write the whole value: parse, then fan out per-key to each child.
    pub fn set(&self, value: impl Into<V>) {
        let mut value = value.into();
        if let Some(parser) = &self.parser {
            value = parser(value);
        }
        for (key, signal) in self.children.iter() {
            signal.set(value.component(key));
        }
    }

    /// The sub-signal for one component.
    ///
    /// Unknown keys are a wiring fault: reported to the logger sink, `None`
    /// returned.
    pub fn child(&self, key: &str) -> Option<&Signal<f64>> {
        let found = self.children.get(key);
        if found.is_none() {
            log::report(
                LogPayload::message(format!("unknown compound component \"{key}\""))
                    .with_inspect(serde_json::json!({
                        "compound": self.id,
                        "keys": V::KEYS,
                    })),
            );
        }
        found
    }

    /// Component keys, in order.
    pub fn keys(&self) -> &'static [&'static str] {
        V::KEYS
    }

    /// Restore every child to the compound default.
    pub fn reset(&self) {
        for (key, signal) in self.children.iter() {
            signal.set(self.default.component(key));
        }
    }
}

impl<V> Clone for CompoundSignal<V>
where
    V: CompoundValue,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            children: Arc::clone(&self.children),
            parser: self.parser.clone(),
            default: self.default.clone(),
        }
    }
}

impl<V> std::fmt::Debug for CompoundSignal<V>
where
    V: CompoundValue + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompoundSignal")
            .field("id", &self.id)
            .field("value", &self.get_untracked())
            .finish()
    }
}

/// A 2D vector, the canonical compound value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl CompoundValue for Vec2 {
    const KEYS: &'static [&'static str] = &["x", "y"];

    fn component(&self, key: &str) -> f64 {
        match key {
            "x" => self.x,
            "y" => self.y,
            other => panic!("Vec2 has no component \"{other}\""),
        }
    }

    fn from_components(components: &IndexMap<&'static str, f64>) -> Self {
        Self {
            x: components.get("x").copied().unwrap_or_default(),
            y: components.get("y").copied().unwrap_or_default(),
        }
    }
}

impl Lerp for Vec2 {
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        Self {
            x: f64::lerp(&from.x, &to.x, progress),
            y: f64::lerp(&from.y, &to.y, progress),
        }
    }
}
