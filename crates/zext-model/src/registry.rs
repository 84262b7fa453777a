//! Class Registry
//!
//! Owns every class and interface definition known to a compilation, keyed by
//! its lowercased qualified name. Definitions refer to each other through
//! [`ClassId`] handles; the registry is the only owner.
//!
//! Runtime classes are imported lazily: a [`ClassRegistry::resolve`] miss is
//! forwarded to the [`RuntimeReflector`] and the answer cached as a bundled
//! definition.
//!
//! Locking: the registry's own table lock is never held while a definition
//! lock is taken, so callers may hold a definition guard while resolving.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::definition::{ClassDefinition, Provenance};
use crate::error::{ClassError, ClassResult};
use crate::naming;
use crate::reflection::{BuiltinCatalog, ReflectionError, RuntimeReflector};

/// Non-owning handle to a registered definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Shared, lockable definition
pub type ClassHandle = Arc<RwLock<ClassDefinition>>;

#[derive(Default)]
struct RegistryInner {
    classes: Vec<ClassHandle>,
    by_name: FxHashMap<String, ClassId>,
    /// Native symbol fragment -> qualified name of its owner
    symbols: FxHashMap<String, String>,
}

/// Registry of every class definition of one compilation
pub struct ClassRegistry {
    inner: RwLock<RegistryInner>,
    reflector: Box<dyn RuntimeReflector>,
    /// Serializes rank accumulation across rankers
    rank_section: Mutex<()>,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    /// Registry backed by the builtin runtime catalog
    pub fn new() -> Self {
        Self::with_reflector(BuiltinCatalog::new())
    }

    pub fn with_reflector(reflector: impl RuntimeReflector + 'static) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            reflector: Box::new(reflector),
            rank_section: Mutex::new(()),
        }
    }

    /// Exclusive section for dependency-rank updates.
    ///
    /// Held for a whole ranking pass so passes over this registry never
    /// interleave. Take it before any definition lock.
    pub fn rank_section(&self) -> MutexGuard<'_, ()> {
        self.rank_section.lock()
    }

    /// Register a definition.
    ///
    /// Fails when the qualified name is taken, or when a user-defined class
    /// would share its native symbols with another one.
    pub fn declare(&self, definition: ClassDefinition) -> ClassResult<ClassId> {
        let name = definition.complete_name();
        let key = naming::normalize(&name);
        let symbol = (!definition.is_bundled()).then(|| definition.symbol_fragment());

        let mut inner = self.inner.write();
        if inner.by_name.contains_key(&key) {
            return Err(ClassError::DuplicateClass {
                name,
                location: definition.location().cloned(),
            });
        }
        if let Some(symbol) = &symbol {
            if let Some(first) = inner.symbols.get(symbol) {
                return Err(ClassError::SymbolCollision {
                    first: first.clone(),
                    second: name,
                    symbol: symbol.clone(),
                    location: definition.location().cloned(),
                });
            }
        }

        let id = ClassId(inner.classes.len() as u32);
        inner.classes.push(Arc::new(RwLock::new(definition)));
        inner.by_name.insert(key, id);
        if let Some(symbol) = symbol {
            inner.symbols.insert(symbol, name.clone());
        }
        debug!(class = %name, id = id.0, "declared class");
        Ok(id)
    }

    /// Definition behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by another registry.
    pub fn get(&self, id: ClassId) -> ClassHandle {
        Arc::clone(&self.inner.read().classes[id.index()])
    }

    /// Already registered definition, without consulting the runtime
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.inner.read().by_name.get(&naming::normalize(name)).copied()
    }

    pub fn find(&self, name: &str) -> Option<ClassHandle> {
        self.lookup(name).map(|id| self.get(id))
    }

    /// Resolve a name, importing runtime classes on a miss.
    ///
    /// `Ok(None)` means neither the compilation nor the runtime knows it.
    pub fn resolve(&self, name: &str) -> ClassResult<Option<ClassId>> {
        if let Some(id) = self.lookup(name) {
            return Ok(Some(id));
        }

        let reflected = match self.reflector.reflect(name.trim_start_matches(naming::NAMESPACE_SEPARATOR)) {
            Ok(reflected) => reflected,
            Err(ReflectionError::ClassNotFound(_)) => return Ok(None),
            Err(err) => {
                return Err(ClassError::Reflection {
                    class: name.to_string(),
                    message: err.to_string(),
                    location: None,
                })
            }
        };
        let definition = ClassDefinition::from_reflection(&reflected)?;
        let key = naming::normalize(&definition.complete_name());
        let requested = naming::normalize(name);

        let mut inner = self.inner.write();
        // Another thread may have imported it meanwhile
        let id = match inner.by_name.get(&key) {
            Some(id) => *id,
            None => {
                let id = ClassId(inner.classes.len() as u32);
                inner.classes.push(Arc::new(RwLock::new(definition)));
                inner.by_name.insert(key, id);
                trace!(class = %reflected.name, id = id.0, "imported runtime class");
                id
            }
        };
        inner.by_name.entry(requested).or_insert(id);
        Ok(Some(id))
    }

    /// A user-declared (non-runtime) class
    pub fn is_class(&self, name: &str) -> bool {
        self.find(name).is_some_and(|handle| {
            let definition = handle.read();
            !definition.is_bundled() && definition.is_class()
        })
    }

    /// A user-declared (non-runtime) interface
    pub fn is_interface(&self, name: &str) -> bool {
        self.find(name).is_some_and(|handle| {
            let definition = handle.read();
            !definition.is_bundled() && definition.is_interface()
        })
    }

    /// A class provided by the runtime
    pub fn is_bundled_class(&self, name: &str) -> bool {
        self.bundled(name).is_some_and(|handle| handle.read().is_class())
    }

    /// An interface provided by the runtime
    pub fn is_bundled_interface(&self, name: &str) -> bool {
        self.bundled(name).is_some_and(|handle| handle.read().is_interface())
    }

    /// Runtime definition of `name`, imported on first use
    pub fn internal_class_definition(&self, name: &str) -> ClassResult<Option<ClassHandle>> {
        let Some(id) = self.resolve(name)? else {
            return Ok(None);
        };
        let handle = self.get(id);
        let bundled = handle.read().is_bundled();
        Ok(bundled.then_some(handle))
    }

    fn bundled(&self, name: &str) -> Option<ClassHandle> {
        match self.internal_class_definition(name) {
            Ok(handle) => handle,
            Err(err) => {
                debug!(class = name, error = %err, "runtime class lookup failed");
                None
            }
        }
    }

    /// Every registered id in registration order
    pub fn ids(&self) -> Vec<ClassId> {
        (0..self.inner.read().classes.len() as u32).map(ClassId).collect()
    }

    /// Ids of definitions the compilation emits
    pub fn user_ids(&self) -> Vec<ClassId> {
        self.ids()
            .into_iter()
            .filter(|id| self.get(*id).read().provenance() == Provenance::UserDefined)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
