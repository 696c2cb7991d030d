//! Type descriptors: the metadata a registry keeps per native type.

use std::any::{Any, TypeId};
use std::rc::Rc;

use mela_core::{FastHashMap, fast_map_new};
use smallvec::SmallVec;

use crate::holder::{Holder, ProjectFn};
use crate::registry::RegistryId;

pub(crate) type CloneFn = fn(&dyn Any) -> Option<Box<dyn Any>>;
pub(crate) type ReadFn = Rc<dyn Fn(&dyn Any) -> Option<Holder<'static>>>;
pub(crate) type DetachFn = Rc<dyn Fn(&mut dyn Any) -> Option<Holder<'static>>>;
pub(crate) type WriteFn = Rc<dyn Fn(&mut dyn Any, Box<dyn Any>) -> bool>;
pub(crate) type InvokeFn = Rc<dyn Fn(Option<&mut dyn Any>, Vec<Box<dyn Any>>) -> Option<Holder<'static>>>;
pub(crate) type ConvertFn = Rc<dyn Fn(&dyn Any) -> Option<Box<dyn Any>>>;
pub(crate) type WalkFn = Rc<dyn Fn(&dyn Any, &mut dyn FnMut(Holder<'static>)) -> bool>;
pub(crate) type DisplayFn = Rc<dyn Fn(&dyn Any) -> Option<String>>;
pub(crate) type FallbackReadFn = Rc<dyn Fn(&dyn Any, &str) -> Option<Holder<'static>>>;
pub(crate) type FallbackWriteFn = Rc<dyn Fn(&mut dyn Any, &str, Box<dyn Any>) -> bool>;

/// Runtime identity of a native type, carrying its Rust name for diagnostics.
#[derive(Clone, Copy, Debug)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn rust_name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl std::hash::Hash for TypeTag {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

pub(crate) fn clone_any<T: Any + Clone>(value: &dyn Any) -> Option<Box<dyn Any>> {
    value
        .downcast_ref::<T>()
        .map(|v| Box::new(v.clone()) as Box<dyn Any>)
}

// Constructors for the erased callables. Passing closures through an `Fn`
// bound lets their reference parameters stay higher-ranked.

pub(crate) fn reader<F>(f: F) -> ReadFn
where
    F: Fn(&dyn Any) -> Option<Holder<'static>> + 'static,
{
    Rc::new(f)
}

pub(crate) fn detacher<F>(f: F) -> DetachFn
where
    F: Fn(&mut dyn Any) -> Option<Holder<'static>> + 'static,
{
    Rc::new(f)
}

pub(crate) fn writer<F>(f: F) -> WriteFn
where
    F: Fn(&mut dyn Any, Box<dyn Any>) -> bool + 'static,
{
    Rc::new(f)
}

pub(crate) fn projector<F>(f: F) -> Rc<ProjectFn>
where
    F: Fn(&mut dyn Any) -> Option<&mut dyn Any> + 'static,
{
    Rc::new(f)
}

pub(crate) fn invoker<F>(f: F) -> InvokeFn
where
    F: Fn(Option<&mut dyn Any>, Vec<Box<dyn Any>>) -> Option<Holder<'static>> + 'static,
{
    Rc::new(f)
}

pub(crate) fn converter<F>(f: F) -> ConvertFn
where
    F: Fn(&dyn Any) -> Option<Box<dyn Any>> + 'static,
{
    Rc::new(f)
}

pub(crate) fn walker<F>(f: F) -> WalkFn
where
    F: Fn(&dyn Any, &mut dyn FnMut(Holder<'static>)) -> bool + 'static,
{
    Rc::new(f)
}

pub(crate) fn displayer<F>(f: F) -> DisplayFn
where
    F: Fn(&dyn Any) -> Option<String> + 'static,
{
    Rc::new(f)
}

pub(crate) fn fallback_reader<F>(f: F) -> FallbackReadFn
where
    F: Fn(&dyn Any, &str) -> Option<Holder<'static>> + 'static,
{
    Rc::new(f)
}

pub(crate) fn fallback_writer<F>(f: F) -> FallbackWriteFn
where
    F: Fn(&mut dyn Any, &str, Box<dyn Any>) -> bool + 'static,
{
    Rc::new(f)
}

#[derive(Clone)]
pub(crate) enum Getter {
    /// Computes a fresh value from the owner. `unbound` marks a value getter
    /// registered under `WrapReference`, which has nothing to refer to.
    Value {
        ret: TypeTag,
        read: ReadFn,
        unbound: bool,
    },
    /// Reaches into the owner. `detach` copies the field out when the
    /// result must not borrow, `by_ref` marks `WrapReference` fields.
    Field {
        ret: TypeTag,
        project: Rc<ProjectFn>,
        detach: DetachFn,
        by_ref: bool,
    },
}

#[derive(Clone)]
pub(crate) struct Setter {
    pub(crate) arg: TypeTag,
    pub(crate) write: WriteFn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Receiver {
    Static,
    Ref,
    Mut,
}

/// One callable signature inside a method or constructor bucket.
#[derive(Clone)]
pub struct Overload {
    pub(crate) params: SmallVec<[TypeTag; 4]>,
    pub(crate) ret: TypeTag,
    pub(crate) receiver: Receiver,
    pub(crate) invoke: InvokeFn,
    pub(crate) unbound: bool,
}

impl Overload {
    pub(crate) fn new(
        params: SmallVec<[TypeTag; 4]>,
        ret: TypeTag,
        receiver: Receiver,
        invoke: InvokeFn,
    ) -> Self {
        Self {
            params,
            ret,
            receiver,
            invoke,
            unbound: false,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[TypeTag] {
        &self.params
    }

    pub fn return_type(&self) -> TypeTag {
        self.ret
    }

    pub fn is_static(&self) -> bool {
        self.receiver == Receiver::Static
    }

    /// Registered under [`Policy::WrapReference`](crate::Policy) while
    /// returning by value; invoking it fails.
    pub fn is_unbound(&self) -> bool {
        self.unbound
    }

    fn accepts(&self, args: &[TypeId]) -> bool {
        self.params.iter().zip(args).all(|(p, a)| p.id == *a)
    }
}

/// Adds `overload`, replacing an earlier one with the same parameter list.
pub(crate) fn push_overload(bucket: &mut Vec<Overload>, overload: Overload) {
    match bucket.iter_mut().find(|o| o.params == overload.params) {
        Some(slot) => *slot = overload,
        None => bucket.push(overload),
    }
}

/// Exact arity, then exact per-argument type, first match in registration order.
pub(crate) fn select_overload<'o>(bucket: &'o [Overload], args: &[TypeId]) -> Option<&'o Overload> {
    bucket
        .iter()
        .filter(|o| o.arity() == args.len())
        .find(|o| o.accepts(args))
}

pub(crate) fn bucket_arities(bucket: &[Overload]) -> SmallVec<[usize; 4]> {
    let mut arities: SmallVec<[usize; 4]> = bucket.iter().map(Overload::arity).collect();
    arities.sort_unstable();
    arities.dedup();
    arities
}

#[derive(Clone)]
pub(crate) struct Converter {
    pub(crate) implicit: bool,
    pub(crate) convert: ConvertFn,
}

#[derive(Clone)]
pub(crate) struct FallbackGetter {
    pub(crate) ret: TypeTag,
    pub(crate) read: FallbackReadFn,
    pub(crate) unbound: bool,
}

#[derive(Clone)]
pub(crate) struct FallbackSetter {
    pub(crate) arg: TypeTag,
    pub(crate) write: FallbackWriteFn,
}

#[derive(Clone)]
pub(crate) struct IterAdapter {
    pub(crate) item: TypeTag,
    pub(crate) walk: WalkFn,
    pub(crate) unbound: bool,
}

/// A zero-argument method returning a reference into its receiver.
#[derive(Clone)]
pub(crate) struct RefProjection {
    pub(crate) ret: TypeTag,
    pub(crate) project: Rc<ProjectFn>,
}

/// Metadata for one registered native type.
///
/// Identity (`key`, `name`) is fixed at registration; everything else is
/// filled in through a [`TypeBuilder`](crate::TypeBuilder).
#[derive(Clone)]
pub struct TypeDesc {
    pub(crate) key: TypeId,
    pub(crate) name: String,
    pub(crate) rust_name: &'static str,
    pub(crate) owner: RegistryId,
    pub(crate) clone_value: CloneFn,
    pub(crate) getters: FastHashMap<String, Getter>,
    pub(crate) setters: FastHashMap<String, Setter>,
    pub(crate) methods: FastHashMap<String, Vec<Overload>>,
    pub(crate) ref_methods: FastHashMap<String, RefProjection>,
    pub(crate) constructors: Vec<Overload>,
    pub(crate) converters: FastHashMap<TypeId, Converter>,
    pub(crate) fallback_getter: Option<FallbackGetter>,
    pub(crate) fallback_setter: Option<FallbackSetter>,
    pub(crate) iter: Option<IterAdapter>,
    pub(crate) display: Option<DisplayFn>,
}

impl TypeDesc {
    pub(crate) fn new<T: Any + Clone>(name: &str, owner: RegistryId) -> Self {
        Self {
            key: TypeId::of::<T>(),
            name: name.to_string(),
            rust_name: std::any::type_name::<T>(),
            owner,
            clone_value: clone_any::<T>,
            getters: fast_map_new(),
            setters: fast_map_new(),
            methods: fast_map_new(),
            ref_methods: fast_map_new(),
            constructors: Vec::new(),
            converters: fast_map_new(),
            fallback_getter: None,
            fallback_setter: None,
            iter: None,
            display: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> TypeId {
        self.key
    }

    /// Rust path of the native type, as reported by `std::any::type_name`.
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    pub fn owner(&self) -> RegistryId {
        self.owner
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.getters.contains_key(name)
    }

    pub fn is_writable(&self, name: &str) -> bool {
        self.setters.contains_key(name)
    }

    /// Attribute names, sorted.
    pub fn attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.getters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Method names, sorted. Includes reference-returning methods.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .methods
            .keys()
            .chain(self.ref_methods.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Whether `method` was registered with
    /// [`add_method_ref`](crate::TypeBuilder::add_method_ref).
    pub fn returns_reference(&self, method: &str) -> bool {
        self.ref_methods.contains_key(method)
    }

    pub fn overloads(&self, method: &str) -> &[Overload] {
        self.methods.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn constructors(&self) -> &[Overload] {
        &self.constructors
    }

    pub fn converts_to(&self, target: TypeId) -> bool {
        self.converters.contains_key(&target)
    }

    pub fn converts_implicitly_to(&self, target: TypeId) -> bool {
        self.converters.get(&target).is_some_and(|c| c.implicit)
    }

    pub fn has_fallback_getter(&self) -> bool {
        self.fallback_getter.is_some()
    }

    pub fn has_fallback_setter(&self) -> bool {
        self.fallback_setter.is_some()
    }

    pub fn is_iterable(&self) -> bool {
        self.iter.is_some()
    }

    pub fn is_printable(&self) -> bool {
        self.display.is_some()
    }
}

impl std::fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDesc")
            .field("name", &self.name)
            .field("rust_name", &self.rust_name)
            .field("owner", &self.owner)
            .field("attributes", &self.attributes())
            .field("methods", &self.methods())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}
