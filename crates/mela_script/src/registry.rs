//! Type registry.
//!
//! Owns every descriptor and hands out dynamic objects that borrow it.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};

use mela_core::{FastHashMap, fast_map_new};
use tracing::{debug, trace};

use crate::builder::TypeBuilder;
use crate::descriptor::{TypeDesc, TypeTag, select_overload};
use crate::errors::{ScriptError, ScriptResult, messages};
use crate::holder::{Holder, Policy};
use crate::object::DynObject;
use crate::provider::{StdTypeProvider, TypeProvider};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`TypeSystem`], recorded in each descriptor it owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistryId(u64);

impl RegistryId {
    fn next() -> Self {
        RegistryId(NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub struct TypeSystem {
    id: RegistryId,
    // Boxed so a descriptor keeps its address when the vector grows.
    descs: Vec<Box<TypeDesc>>,
    by_key: FastHashMap<TypeId, usize>,
    by_name: FastHashMap<String, usize>,
}

impl TypeSystem {
    /// A registry with the built-in types installed.
    pub fn new() -> Self {
        let mut types = Self::empty();
        // A fresh registry has no names that could clash.
        let installed = types.install(&StdTypeProvider);
        debug_assert!(installed.is_ok(), "built-in types: {installed:?}");
        types
    }

    pub fn empty() -> Self {
        Self {
            id: RegistryId::next(),
            descs: Vec::new(),
            by_key: fast_map_new(),
            by_name: fast_map_new(),
        }
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    pub fn install(&mut self, provider: &dyn TypeProvider) -> ScriptResult<()> {
        provider.install(self)
    }

    /// Registers `T` under `name`, or reopens it when it already carries
    /// exactly that name.
    pub fn register_type<T: Any + Clone>(
        &mut self,
        name: &str,
    ) -> ScriptResult<TypeBuilder<'_, T>> {
        let key = TypeId::of::<T>();
        if let Some(&idx) = self.by_key.get(&key) {
            let existing = &self.descs[idx];
            if existing.name != name {
                return Err(ScriptError::TypeAlreadyRegistered {
                    ty: std::any::type_name::<T>().to_string(),
                    existing: existing.name.clone(),
                });
            }
            return Ok(TypeBuilder::new(&mut self.descs[idx]));
        }
        if let Some(&idx) = self.by_name.get(name) {
            return Err(ScriptError::TypeAlreadyRegistered {
                ty: self.descs[idx].rust_name.to_string(),
                existing: name.to_string(),
            });
        }

        trace!(name, rust = std::any::type_name::<T>(), "register type");
        let idx = self.push(TypeDesc::new::<T>(name, self.id));
        Ok(TypeBuilder::new(&mut self.descs[idx]))
    }

    /// Like [`register_type`](Self::register_type), but an existing `T` is
    /// reopened whatever its name.
    pub fn ensure_type<T: Any + Clone>(
        &mut self,
        name: &str,
    ) -> ScriptResult<TypeBuilder<'_, T>> {
        match self.by_key.get(&TypeId::of::<T>()) {
            Some(&idx) => Ok(TypeBuilder::new(&mut self.descs[idx])),
            None => self.register_type::<T>(name),
        }
    }

    /// Owned object holding `value`.
    pub fn object<T: Any>(&self, value: T) -> ScriptResult<DynObject<'_>> {
        self.wrap(Holder::owned(value), TypeTag::of::<T>())
    }

    /// Shared object taking ownership of `value`.
    pub fn share<T: Any>(&self, value: T) -> ScriptResult<DynObject<'_>> {
        self.wrap(Holder::shared(value), TypeTag::of::<T>())
    }

    /// Object referring to `value` without owning it.
    pub fn reference<'a, T: Any>(&'a self, value: &'a mut T) -> ScriptResult<DynObject<'a>> {
        self.wrap(Holder::Borrowed(value), TypeTag::of::<T>())
    }

    pub fn bind<'a, T: Any + Clone>(
        &'a self,
        value: &'a mut T,
        policy: Policy,
    ) -> ScriptResult<DynObject<'a>> {
        match policy {
            Policy::Copy => self.object(value.clone()),
            Policy::WrapReference => self.reference(value),
            Policy::Share => self.share(value.clone()),
        }
    }

    /// Builds a `T` through the constructor overload matching `args`.
    pub fn construct<T: Any>(&self, args: &[DynObject<'_>]) -> ScriptResult<DynObject<'_>> {
        let desc = self.lookup(TypeId::of::<T>()).ok_or_else(|| {
            ScriptError::type_error(messages::REGISTERED_TYPE, std::any::type_name::<T>())
        })?;
        self.construct_with(desc, args)
    }

    pub fn construct_by_name(
        &self,
        name: &str,
        args: &[DynObject<'_>],
    ) -> ScriptResult<DynObject<'_>> {
        let desc = self.descriptor_by_name(name).ok_or_else(|| {
            ScriptError::member_not_found(name, "constructor", messages::UNKNOWN_TYPE_NAME)
        })?;
        self.construct_with(desc, args)
    }

    /// Copies every descriptor of `other` into this registry.
    ///
    /// Nothing is copied unless every descriptor can be adopted.
    pub fn import(&mut self, other: &TypeSystem) -> ScriptResult<()> {
        for desc in &other.descs {
            self.check_adoptable(desc)?;
        }
        for desc in &other.descs {
            self.adopt(desc);
        }
        debug!(from = ?other.id, into = ?self.id, count = other.descs.len(), "imported types");
        Ok(())
    }

    pub fn import_type<T: Any>(&mut self, other: &TypeSystem) -> ScriptResult<()> {
        let desc = other.lookup(TypeId::of::<T>()).ok_or_else(|| {
            ScriptError::type_error(messages::REGISTERED_TYPE, std::any::type_name::<T>())
        })?;
        self.check_adoptable(desc)?;
        self.adopt(desc);
        Ok(())
    }

    /// Registered name of `T`. Without `strict`, an unregistered type
    /// reports its Rust name instead of failing.
    pub fn type_name<T: Any>(&self, strict: bool) -> ScriptResult<&str> {
        match self.lookup(TypeId::of::<T>()) {
            Some(desc) => Ok(desc.name.as_str()),
            None if strict => Err(ScriptError::type_error(
                messages::REGISTERED_TYPE,
                std::any::type_name::<T>(),
            )),
            None => Ok(std::any::type_name::<T>()),
        }
    }

    pub fn descriptor<T: Any>(&self) -> Option<&TypeDesc> {
        self.lookup(TypeId::of::<T>())
    }

    pub fn descriptor_by_name(&self, name: &str) -> Option<&TypeDesc> {
        self.by_name.get(name).map(|&idx| &*self.descs[idx])
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.by_key.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.descs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    /// Registered names in registration order.
    pub fn type_names(&self) -> Vec<&str> {
        self.descs.iter().map(|d| d.name.as_str()).collect()
    }

    pub(crate) fn lookup(&self, key: TypeId) -> Option<&TypeDesc> {
        self.by_key.get(&key).map(|&idx| &*self.descs[idx])
    }

    pub(crate) fn name_of(&self, tag: TypeTag) -> &str {
        self.lookup(tag.id())
            .map_or(tag.rust_name(), |desc| desc.name.as_str())
    }

    pub(crate) fn wrap<'a>(
        &'a self,
        holder: Holder<'a>,
        tag: TypeTag,
    ) -> ScriptResult<DynObject<'a>> {
        let desc = self
            .lookup(tag.id())
            .ok_or_else(|| ScriptError::type_error(messages::REGISTERED_TYPE, tag.rust_name()))?;
        Ok(DynObject::from_parts(holder, desc, self))
    }

    fn construct_with<'a>(
        &'a self,
        desc: &'a TypeDesc,
        args: &[DynObject<'_>],
    ) -> ScriptResult<DynObject<'a>> {
        if desc.constructors.is_empty() {
            return Err(ScriptError::member_not_found(
                &desc.name,
                "constructor",
                messages::NO_CONSTRUCTOR,
            ));
        }
        let keys: Vec<TypeId> = args.iter().map(|a| a.descriptor().key).collect();
        let overload = select_overload(&desc.constructors, &keys).ok_or_else(|| {
            ScriptError::member_not_found(
                &desc.name,
                "constructor",
                crate::object::no_overload_detail(&desc.constructors, args.len()),
            )
        })?;
        if overload.is_unbound() {
            return Err(ScriptError::no_referent(&desc.name, "constructor"));
        }
        let values = args
            .iter()
            .map(DynObject::clone_value)
            .collect::<ScriptResult<Vec<_>>>()?;
        let holder = (overload.invoke)(None, values)
            .ok_or_else(|| ScriptError::type_error(&desc.name, messages::FOREIGN_VALUE))?;
        Ok(DynObject::from_parts(holder, desc, self))
    }

    fn push(&mut self, desc: TypeDesc) -> usize {
        let idx = self.descs.len();
        self.by_key.insert(desc.key, idx);
        self.by_name.insert(desc.name.clone(), idx);
        self.descs.push(Box::new(desc));
        idx
    }

    fn check_adoptable(&self, desc: &TypeDesc) -> ScriptResult<()> {
        if let Some(existing) = self.lookup(desc.key) {
            if existing.name != desc.name {
                return Err(ScriptError::TypeAlreadyRegistered {
                    ty: desc.rust_name.to_string(),
                    existing: existing.name.clone(),
                });
            }
        } else if let Some(existing) = self.descriptor_by_name(&desc.name) {
            return Err(ScriptError::TypeAlreadyRegistered {
                ty: existing.rust_name.to_string(),
                existing: desc.name.clone(),
            });
        }
        Ok(())
    }

    // Replacing the boxed contents in place keeps the descriptor's address.
    fn adopt(&mut self, desc: &TypeDesc) {
        let mut copy = desc.clone();
        copy.owner = self.id;
        trace!(name = %copy.name, "adopt type");
        match self.by_key.get(&copy.key) {
            Some(&idx) => *self.descs[idx] = copy,
            None => {
                self.push(copy);
            }
        }
    }
}

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeSystem")
            .field("id", &self.id)
            .field("types", &self.type_names())
            .finish()
    }
}
