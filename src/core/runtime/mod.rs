//! The runtime surface generated code talks to: a builder store, an instance
//! cache, and the resolve protocol tying them together.
//!
//! Everything here is single-threaded and cooperative. Values move as
//! `Rc<dyn Any>`; builder closures receive the resolving container as a
//! borrowed handle and must not capture it, which keeps the container
//! reclaimable once external holders let go.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::core::types::{AbstractType, CompositeType, Scope};

/// One resolve argument as it enters the instance identity: its declared
/// type plus the canonical rendering of its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterKey {
    pub ty: CompositeType,
    pub description: String,
}

/// Canonical cache identity: the declared abstract type plus the ordered
/// parameter entries. This is the sole identity the cache uses; resolves
/// with differently-typed or differently-valued parameters cache
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub abstract_type: AbstractType,
    pub parameters: Vec<ParameterKey>,
}

impl InstanceKey {
    pub fn new(abstract_type: AbstractType, parameters: Vec<ParameterKey>) -> Self {
        Self {
            abstract_type,
            parameters,
        }
    }

    pub fn of(ty: CompositeType) -> Self {
        Self::new(AbstractType(ty), Vec::new())
    }

    /// The registration-time identity: abstract type plus parameter types.
    /// Builders are stored under this signature, since parameter values only
    /// exist at resolve time.
    fn signature(&self) -> StoreKey {
        StoreKey {
            abstract_type: self.abstract_type.clone(),
            parameter_types: self.parameters.iter().map(|p| p.ty.clone()).collect(),
        }
    }
}

pub type Instance = Rc<dyn Any>;

/// A caller-supplied resolve argument with its declared type.
#[derive(Clone)]
pub struct Parameter {
    pub ty: CompositeType,
    pub value: Instance,
    description: String,
}

impl Parameter {
    pub fn new<T: Any + std::fmt::Display>(ty: CompositeType, value: T) -> Self {
        let description = value.to_string();
        Parameter {
            ty,
            value: Rc::new(value),
            description,
        }
    }

    /// For parameter values without a canonical rendering of their own.
    pub fn with_description<T: Any>(ty: CompositeType, value: T, description: String) -> Self {
        Parameter {
            ty,
            value: Rc::new(value),
            description,
        }
    }

    fn key(&self) -> ParameterKey {
        ParameterKey {
            ty: self.ty.clone(),
            description: self.description.clone(),
        }
    }
}

/// Builders take the resolving container as a non-owning handle so they can
/// resolve their own dependencies without creating a retain cycle.
pub type BuilderFn = Rc<dyn Fn(&Container, &[Parameter]) -> Instance>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StoreKey {
    abstract_type: AbstractType,
    parameter_types: Vec<CompositeType>,
}

#[derive(Clone)]
struct StoreEntry {
    scope: Scope,
    builder: BuilderFn,
}

/// Maps instance keys to `(scope, builder)`. Mutated during registration,
/// read-only during resolution. Lookups fall back to the enclosing
/// container's store.
#[derive(Default)]
pub struct BuilderStore {
    entries: RefCell<HashMap<StoreKey, StoreEntry>>,
    parent: Option<Rc<BuilderStore>>,
}

impl BuilderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Rc<BuilderStore>) -> Self {
        BuilderStore {
            entries: RefCell::new(HashMap::new()),
            parent: Some(parent),
        }
    }

    pub fn set(&self, key: InstanceKey, scope: Scope, builder: BuilderFn) {
        self.entries
            .borrow_mut()
            .insert(key.signature(), StoreEntry { scope, builder });
    }

    fn get(&self, key: &InstanceKey) -> Option<StoreEntry> {
        self.get_signature(&key.signature())
    }

    fn get_signature(&self, signature: &StoreKey) -> Option<StoreEntry> {
        if let Some(entry) = self.entries.borrow().get(signature) {
            return Some(entry.clone());
        }
        self.parent
            .as_ref()
            .and_then(|parent| parent.get_signature(signature))
    }
}

/// Cache slot lifecycle for container-lived scopes.
enum CacheState {
    Building,
    Built(Instance),
    /// `weak`: held through a non-owning handle; upgraded on resolve and
    /// rebuilt once every strong holder is gone.
    Released(Weak<dyn Any>),
}

/// Materializes instances according to scope. Owns its entries; `graph`
/// entries live only until the outermost resolve returns.
#[derive(Default)]
pub struct InstanceCache {
    container_scoped: RefCell<HashMap<InstanceKey, CacheState>>,
    graph_scoped: RefCell<HashMap<InstanceKey, Instance>>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a value for `key` under `scope`, calling `build` only when the
    /// scope's reuse rule requires a fresh instance.
    pub fn resolve(
        &self,
        key: &InstanceKey,
        scope: Scope,
        build: impl FnOnce() -> Instance,
    ) -> Instance {
        match scope {
            Scope::Transient => build(),
            Scope::Graph => {
                if let Some(instance) = self.graph_scoped.borrow().get(key) {
                    return instance.clone();
                }
                let instance = build();
                self.graph_scoped
                    .borrow_mut()
                    .insert(key.clone(), instance.clone());
                instance
            }
            Scope::Container | Scope::Lazy => {
                match self.container_scoped.borrow().get(key) {
                    Some(CacheState::Built(instance)) => return instance.clone(),
                    Some(CacheState::Building) => {
                        panic!("re-entrant resolve of {key:?} during its own build")
                    }
                    Some(CacheState::Released(_)) | None => {}
                }
                self.container_scoped
                    .borrow_mut()
                    .insert(key.clone(), CacheState::Building);
                let instance = build();
                self.container_scoped
                    .borrow_mut()
                    .insert(key.clone(), CacheState::Built(instance.clone()));
                instance
            }
            Scope::Weak => {
                match self.container_scoped.borrow().get(key) {
                    Some(CacheState::Released(weak)) => {
                        if let Some(instance) = weak.upgrade() {
                            return instance;
                        }
                    }
                    Some(CacheState::Built(instance)) => return instance.clone(),
                    Some(CacheState::Building) => {
                        panic!("re-entrant resolve of {key:?} during its own build")
                    }
                    None => {}
                }
                self.container_scoped
                    .borrow_mut()
                    .insert(key.clone(), CacheState::Building);
                let instance = build();
                self.container_scoped
                    .borrow_mut()
                    .insert(key.clone(), CacheState::Released(Rc::downgrade(&instance)));
                instance
            }
        }
    }

    /// Drops graph-scoped values; called when the outermost resolve returns.
    fn release_graph(&self) {
        self.graph_scoped.borrow_mut().clear();
    }
}

/// A dependency container: registration surface plus the resolve protocol.
pub struct Container {
    store: Rc<BuilderStore>,
    cache: InstanceCache,
    resolve_depth: Cell<usize>,
}

impl Container {
    pub fn new() -> Self {
        Container {
            store: Rc::new(BuilderStore::new()),
            cache: InstanceCache::new(),
            resolve_depth: Cell::new(0),
        }
    }

    /// A child container whose store lookups fall back to `parent`'s store.
    pub fn with_parent(parent: &Container) -> Self {
        Container {
            store: Rc::new(BuilderStore::with_parent(parent.store.clone())),
            cache: InstanceCache::new(),
            resolve_depth: Cell::new(0),
        }
    }

    pub fn register(
        &self,
        key: InstanceKey,
        scope: Scope,
        builder: impl Fn(&Container, &[Parameter]) -> Instance + 'static,
    ) {
        self.store.set(key, scope, Rc::new(builder));
    }

    /// Computes the instance key from the requested type and the parameters,
    /// looks up the builder, and materializes through the cache. `None` when
    /// nothing registered the signature, here or in a parent store.
    pub fn resolve(&self, ty: &AbstractType, parameters: &[Parameter]) -> Option<Instance> {
        let key = InstanceKey::new(
            ty.clone(),
            parameters.iter().map(|p| p.key()).collect(),
        );
        let entry = self.store.get(&key)?;

        self.resolve_depth.set(self.resolve_depth.get() + 1);
        let instance = self
            .cache
            .resolve(&key, entry.scope, || (entry.builder)(self, parameters));
        let depth = self.resolve_depth.get() - 1;
        self.resolve_depth.set(depth);
        if depth == 0 {
            self.cache.release_graph();
        }
        Some(instance)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/t_runtime.rs"]
mod tests;
