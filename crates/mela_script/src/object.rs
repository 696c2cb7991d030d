//! Dynamic objects: a type-erased value paired with its descriptor.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::trace;

use crate::descriptor::{
    FallbackSetter, Getter, Overload, Setter, TypeDesc, TypeTag, bucket_arities, select_overload,
};
use crate::errors::{ScriptError, ScriptResult, messages};
use crate::holder::{Holder, Storage};
use crate::registry::TypeSystem;

/// Handle to a native value registered in a [`TypeSystem`].
///
/// The storage mode ([`Storage`]) is fixed when the object is created. A
/// borrowed object cannot outlive the value it refers to.
pub struct DynObject<'a> {
    holder: Holder<'a>,
    desc: &'a TypeDesc,
    types: &'a TypeSystem,
}

enum SetTarget<'d> {
    Named(&'d Setter),
    Fallback(&'d FallbackSetter),
}

impl SetTarget<'_> {
    fn arg(&self) -> TypeTag {
        match self {
            SetTarget::Named(setter) => setter.arg,
            SetTarget::Fallback(setter) => setter.arg,
        }
    }
}

pub(crate) fn no_overload_detail(bucket: &[Overload], argc: usize) -> String {
    format!(
        "no overload takes these {argc} argument(s); registered arities: {:?}",
        bucket_arities(bucket).as_slice()
    )
}

impl<'a> DynObject<'a> {
    pub(crate) fn from_parts(holder: Holder<'a>, desc: &'a TypeDesc, types: &'a TypeSystem) -> Self {
        Self {
            holder,
            desc,
            types,
        }
    }

    pub fn type_name(&self) -> &'a str {
        &self.desc.name
    }

    pub fn descriptor(&self) -> &'a TypeDesc {
        self.desc
    }

    pub fn registry(&self) -> &'a TypeSystem {
        self.types
    }

    pub fn mode(&self) -> Storage {
        self.holder.storage()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.desc.key == TypeId::of::<T>()
    }

    /// Walks `path` from this object, one attribute per step.
    pub fn get(&mut self, path: &[&str]) -> ScriptResult<DynObject<'_>> {
        let Some((first, rest)) = path.split_first() else {
            return Err(ScriptError::member_not_found(
                &self.desc.name,
                "",
                messages::EMPTY_PATH,
            ));
        };
        let holder = self
            .holder
            .reborrow()
            .ok_or_else(|| ScriptError::borrowed(&self.desc.name))?;
        let mut current = DynObject {
            holder,
            desc: self.desc,
            types: self.types,
        };
        current = current.into_attr(first)?;
        for name in rest {
            current = current.into_attr(name)?;
        }
        Ok(current)
    }

    /// Dotted form of [`get`](Self::get): `"origin.x"`.
    pub fn get_path(&mut self, path: &str) -> ScriptResult<DynObject<'_>> {
        if path.is_empty() {
            return Err(ScriptError::member_not_found(
                &self.desc.name,
                path,
                messages::EMPTY_PATH,
            ));
        }
        let names: SmallVec<[&str; 4]> = path.split('.').collect();
        self.get(&names)
    }

    fn into_attr(self, name: &str) -> ScriptResult<DynObject<'a>> {
        let DynObject {
            mut holder,
            desc,
            types,
        } = self;

        match desc.getters.get(name) {
            Some(Getter::Value { ret, read, unbound }) => {
                if *unbound {
                    return Err(ScriptError::no_referent(&desc.name, name));
                }
                let produced = {
                    let value = holder
                        .read()
                        .ok_or_else(|| ScriptError::borrowed(&desc.name))?;
                    read(&*value)
                };
                let produced = produced
                    .ok_or_else(|| ScriptError::type_error(&desc.name, messages::FOREIGN_VALUE))?;
                types.wrap(produced, *ret)
            }
            Some(Getter::Field {
                ret,
                project,
                detach,
                by_ref,
            }) => {
                if *by_ref {
                    // Owned and shared holders come back in `Err` and are
                    // copied out below.
                    match holder.project(&**project) {
                        Ok(Some(inner)) => return types.wrap(inner, *ret),
                        Ok(None) => {
                            return Err(ScriptError::type_error(
                                &desc.name,
                                messages::FOREIGN_VALUE,
                            ));
                        }
                        Err(back) => holder = back,
                    }
                }
                let produced = {
                    let mut value = holder
                        .write()
                        .ok_or_else(|| ScriptError::borrowed(&desc.name))?;
                    detach(&mut *value)
                };
                let produced = produced
                    .ok_or_else(|| ScriptError::type_error(&desc.name, messages::FOREIGN_VALUE))?;
                types.wrap(produced, *ret)
            }
            None => {
                let Some(fallback) = &desc.fallback_getter else {
                    return Err(ScriptError::member_not_found(
                        &desc.name,
                        name,
                        messages::NO_ATTRIBUTE,
                    ));
                };
                if fallback.unbound {
                    return Err(ScriptError::no_referent(&desc.name, name));
                }
                let produced = {
                    let value = holder
                        .read()
                        .ok_or_else(|| ScriptError::borrowed(&desc.name))?;
                    (fallback.read)(&*value, name)
                };
                match produced {
                    Some(produced) => types.wrap(produced, fallback.ret),
                    None => Err(ScriptError::member_not_found(
                        &desc.name,
                        name,
                        messages::FALLBACK_DECLINED,
                    )),
                }
            }
        }
    }

    /// Writes `value` to attribute `name`. The value must already have the
    /// attribute's type; no conversion is attempted.
    pub fn set(&mut self, name: &str, value: &DynObject<'_>) -> ScriptResult<()> {
        let target = self.set_target(name)?;
        if value.desc.key != target.arg().id() {
            return Err(ScriptError::type_error(
                self.types.name_of(target.arg()),
                &value.desc.name,
            ));
        }
        let payload = value.clone_value()?;
        self.apply_set(name, target, payload)
    }

    /// Like [`set`](Self::set), but a value of another type passes through
    /// its implicit converter to the attribute's type.
    pub fn set_converted(&mut self, name: &str, value: &DynObject<'_>) -> ScriptResult<()> {
        let target = self.set_target(name)?;
        let arg = target.arg();
        let payload = if value.desc.key == arg.id() {
            value.clone_value()?
        } else {
            value.implicit_into(arg, self.types)?
        };
        self.apply_set(name, target, payload)
    }

    fn set_target(&self, name: &str) -> ScriptResult<SetTarget<'a>> {
        let desc: &'a TypeDesc = self.desc;
        if let Some(setter) = desc.setters.get(name) {
            return Ok(SetTarget::Named(setter));
        }
        if let Some(fallback) = &desc.fallback_setter {
            return Ok(SetTarget::Fallback(fallback));
        }
        let detail = if desc.getters.contains_key(name) {
            messages::READ_ONLY
        } else {
            messages::NO_ATTRIBUTE
        };
        Err(ScriptError::member_not_found(&desc.name, name, detail))
    }

    fn apply_set(
        &mut self,
        name: &str,
        target: SetTarget<'_>,
        payload: Box<dyn Any>,
    ) -> ScriptResult<()> {
        let desc = self.desc;
        let mut value = self
            .holder
            .write()
            .ok_or_else(|| ScriptError::borrowed(&desc.name))?;
        match target {
            SetTarget::Named(setter) => {
                if (setter.write)(&mut *value, payload) {
                    Ok(())
                } else {
                    Err(ScriptError::type_error(&desc.name, messages::FOREIGN_VALUE))
                }
            }
            SetTarget::Fallback(fallback) => {
                if (fallback.write)(&mut *value, name, payload) {
                    Ok(())
                } else {
                    Err(ScriptError::member_not_found(
                        &desc.name,
                        name,
                        messages::FALLBACK_DECLINED,
                    ))
                }
            }
        }
    }

    fn implicit_into(&self, target: TypeTag, types: &TypeSystem) -> ScriptResult<Box<dyn Any>> {
        let converter = self
            .desc
            .converters
            .get(&target.id())
            .filter(|c| c.implicit)
            .ok_or_else(|| ScriptError::type_error(types.name_of(target), &self.desc.name))?;
        let value = self
            .holder
            .read()
            .ok_or_else(|| ScriptError::borrowed(&self.desc.name))?;
        let converted = (converter.convert)(&*value);
        converted.ok_or_else(|| ScriptError::type_error(&self.desc.name, messages::FOREIGN_VALUE))
    }

    /// Invokes method `name` with `args`.
    ///
    /// Overloads are filtered by arity, then the first whose parameter types
    /// all match, in registration order, is invoked.
    pub fn call(&mut self, name: &str, args: &[DynObject<'_>]) -> ScriptResult<DynObject<'a>> {
        let desc = self.desc;
        let types = self.types;
        let bucket = desc.methods.get(name).ok_or_else(|| {
            let detail = if desc.returns_reference(name) {
                messages::RETURNS_REFERENCE
            } else {
                messages::NO_METHOD
            };
            ScriptError::member_not_found(&desc.name, name, detail)
        })?;
        let keys: SmallVec<[TypeId; 4]> = args.iter().map(|a| a.desc.key).collect();
        let overload = select_overload(bucket, &keys).ok_or_else(|| {
            ScriptError::member_not_found(&desc.name, name, no_overload_detail(bucket, args.len()))
        })?;
        if overload.unbound {
            return Err(ScriptError::no_referent(&desc.name, name));
        }
        trace!(ty = %desc.name, method = name, arity = args.len(), "call");

        let values = args
            .iter()
            .map(DynObject::clone_value)
            .collect::<ScriptResult<Vec<_>>>()?;
        let produced = if overload.is_static() {
            (overload.invoke)(None, values)
        } else {
            let mut value = self
                .holder
                .write()
                .ok_or_else(|| ScriptError::borrowed(&desc.name))?;
            (overload.invoke)(Some(&mut *value), values)
        };
        let produced =
            produced.ok_or_else(|| ScriptError::type_error(&desc.name, messages::FOREIGN_VALUE))?;
        types.wrap(produced, overload.ret)
    }

    /// Invokes a method registered with
    /// [`add_method_ref`](crate::TypeBuilder::add_method_ref). The result
    /// borrows this object, so writes to it reach the native value.
    pub fn call_ref(&mut self, name: &str) -> ScriptResult<DynObject<'_>> {
        let desc = self.desc;
        let types = self.types;
        let method = desc
            .ref_methods
            .get(name)
            .ok_or_else(|| ScriptError::member_not_found(&desc.name, name, messages::NO_METHOD))?;
        trace!(ty = %desc.name, method = name, "call_ref");

        let holder = self
            .holder
            .reborrow()
            .ok_or_else(|| ScriptError::borrowed(&desc.name))?;
        match holder.project(&*method.project) {
            Ok(Some(inner)) => types.wrap(inner, method.ret),
            Ok(None) => Err(ScriptError::type_error(&desc.name, messages::FOREIGN_VALUE)),
            // A reborrowed holder is never owned or shared.
            Err(_) => Err(ScriptError::borrowed(&desc.name)),
        }
    }

    /// Copies the native value out.
    pub fn cast<T: Any + Clone>(&self) -> ScriptResult<T> {
        if !self.is::<T>() {
            return Err(self.mismatch::<T>());
        }
        let value = self
            .holder
            .read()
            .ok_or_else(|| ScriptError::borrowed(&self.desc.name))?;
        let out = (*value).downcast_ref::<T>().cloned();
        out.ok_or_else(|| self.mismatch::<T>())
    }

    /// [`cast`](Self::cast), falling back to a converter registered directly
    /// from this type to `T`. Converters are not chained.
    pub fn converted_cast<T: Any + Clone>(&self) -> ScriptResult<T> {
        if self.is::<T>() {
            return self.cast::<T>();
        }
        let boxed = self.convert_value(TypeTag::of::<T>())?;
        boxed
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| self.mismatch::<T>())
    }

    /// New owned object holding this value converted to `T`.
    pub fn convert_to<T: Any + Clone>(&self) -> ScriptResult<DynObject<'a>> {
        let target = self.types.lookup(TypeId::of::<T>()).ok_or_else(|| {
            ScriptError::type_error(messages::REGISTERED_TYPE, std::any::type_name::<T>())
        })?;
        let holder = if self.is::<T>() {
            Holder::Owned(self.clone_value()?)
        } else {
            Holder::Owned(self.convert_value(TypeTag::of::<T>())?)
        };
        Ok(DynObject::from_parts(holder, target, self.types))
    }

    fn convert_value(&self, target: TypeTag) -> ScriptResult<Box<dyn Any>> {
        let converter = self.desc.converters.get(&target.id()).ok_or_else(|| {
            ScriptError::member_not_found(
                &self.desc.name,
                self.types.name_of(target),
                messages::NO_CONVERTER,
            )
        })?;
        let value = self
            .holder
            .read()
            .ok_or_else(|| ScriptError::borrowed(&self.desc.name))?;
        let converted = (converter.convert)(&*value);
        converted.ok_or_else(|| ScriptError::type_error(&self.desc.name, messages::FOREIGN_VALUE))
    }

    pub fn with_ref<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> ScriptResult<R> {
        if !self.is::<T>() {
            return Err(self.mismatch::<T>());
        }
        let value = self
            .holder
            .read()
            .ok_or_else(|| ScriptError::borrowed(&self.desc.name))?;
        let target = (*value)
            .downcast_ref::<T>()
            .ok_or_else(|| self.mismatch::<T>())?;
        Ok(f(target))
    }

    pub fn with_mut<T: Any, R>(&mut self, f: impl FnOnce(&mut T) -> R) -> ScriptResult<R> {
        if !self.is::<T>() {
            return Err(self.mismatch::<T>());
        }
        let desc = self.desc;
        let types = self.types;
        let mut value = self
            .holder
            .write()
            .ok_or_else(|| ScriptError::borrowed(&desc.name))?;
        let target = (*value).downcast_mut::<T>().ok_or_else(|| {
            ScriptError::type_error(types.name_of(TypeTag::of::<T>()), &desc.name)
        })?;
        Ok(f(target))
    }

    /// Moves an owned value out; other storage modes yield a copy.
    pub fn into_inner<T: Any + Clone>(self) -> ScriptResult<T> {
        if !self.is::<T>() {
            return Err(self.mismatch::<T>());
        }
        let DynObject {
            holder,
            desc,
            types,
        } = self;
        let mismatch = || ScriptError::type_error(types.name_of(TypeTag::of::<T>()), &desc.name);
        match holder {
            Holder::Owned(boxed) => boxed.downcast::<T>().map(|v| *v).map_err(|_| mismatch()),
            other => {
                let value = other
                    .read()
                    .ok_or_else(|| ScriptError::borrowed(&desc.name))?;
                let out = (*value).downcast_ref::<T>().cloned();
                out.ok_or_else(mismatch)
            }
        }
    }

    /// Feeds each element produced by the type's iteration adapter to `visitor`.
    pub fn iterate<V>(&self, mut visitor: V) -> ScriptResult<()>
    where
        V: FnMut(DynObject<'a>),
    {
        let desc = self.desc;
        let types = self.types;
        let adapter = desc.iter.as_ref().ok_or_else(|| {
            ScriptError::member_not_found(&desc.name, "iterate", messages::NOT_ITERABLE)
        })?;
        if adapter.unbound {
            return Err(ScriptError::no_referent(&desc.name, "iterate"));
        }
        let item = types.lookup(adapter.item.id()).ok_or_else(|| {
            ScriptError::type_error(messages::REGISTERED_TYPE, adapter.item.rust_name())
        })?;
        let value = self
            .holder
            .read()
            .ok_or_else(|| ScriptError::borrowed(&desc.name))?;
        let mut emit = |holder: Holder<'static>| visitor(DynObject::from_parts(holder, item, types));
        if (adapter.walk)(&*value, &mut emit) {
            Ok(())
        } else {
            Err(ScriptError::type_error(&desc.name, messages::FOREIGN_VALUE))
        }
    }

    /// Collects the elements of [`iterate`](Self::iterate).
    pub fn items(&self) -> ScriptResult<Vec<DynObject<'a>>> {
        let mut out = Vec::new();
        self.iterate(|item| out.push(item))?;
        Ok(out)
    }

    /// Owned copy of the current value.
    pub fn copy(&self) -> ScriptResult<DynObject<'a>> {
        Ok(DynObject::from_parts(
            Holder::Owned(self.clone_value()?),
            self.desc,
            self.types,
        ))
    }

    /// Another handle to the same shared value; `None` unless shared.
    pub fn share_handle(&self) -> Option<DynObject<'a>> {
        match &self.holder {
            Holder::Shared(cell) => Some(DynObject::from_parts(
                Holder::Shared(Rc::clone(cell)),
                self.desc,
                self.types,
            )),
            _ => None,
        }
    }

    /// Whether the descriptor belongs to the carried registry and the held
    /// value has the descriptor's type.
    pub fn is_consistent(&self) -> bool {
        let owned_here = self.desc.owner == self.types.id()
            && self
                .types
                .lookup(self.desc.key)
                .is_some_and(|d| std::ptr::eq(d, self.desc));
        let value_matches = self
            .holder
            .read()
            .is_none_or(|value| (*value).type_id() == self.desc.key);
        owned_here && value_matches
    }

    pub(crate) fn clone_value(&self) -> ScriptResult<Box<dyn Any>> {
        let value = self
            .holder
            .read()
            .ok_or_else(|| ScriptError::borrowed(&self.desc.name))?;
        let cloned = (self.desc.clone_value)(&*value);
        cloned.ok_or_else(|| ScriptError::type_error(&self.desc.name, messages::FOREIGN_VALUE))
    }

    fn mismatch<T: Any>(&self) -> ScriptError {
        ScriptError::type_error(self.types.name_of(TypeTag::of::<T>()), &self.desc.name)
    }
}

/// The display function when one is registered, otherwise the type name.
impl fmt::Display for DynObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = match (&self.desc.display, self.holder.read()) {
            (Some(display), Some(value)) => display(&*value),
            _ => None,
        };
        match rendered {
            Some(text) => f.write_str(&text),
            None => f.write_str(&self.desc.name),
        }
    }
}

impl fmt::Debug for DynObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynObject")
            .field("type", &self.desc.name)
            .field("mode", &self.mode())
            .field("value", &format_args!("{self}"))
            .finish()
    }
}
