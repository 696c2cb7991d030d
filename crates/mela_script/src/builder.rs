use std::any::{Any, TypeId};
use std::fmt::Display;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::warn;

use crate::callable::{MutMethod, RefMethod, StaticMethod};
use crate::descriptor::{
    Converter, FallbackGetter, FallbackSetter, Getter, IterAdapter, RefProjection, Setter,
    TypeDesc, TypeTag, converter, detacher, displayer, fallback_reader, fallback_writer,
    projector, push_overload, reader, walker, writer,
};
use crate::holder::{Holder, Policy};

/// Fills in the descriptor of `T`.
///
/// Every method consumes and returns the builder, so registrations chain in
/// any order:
///
/// ```ignore
/// types
///     .register_type::<Point>("point")?
///     .constructor(|x: i64, y: i64| Point { x, y })
///     .add_field("x", |p: &mut Point| &mut p.x)
///     .add_method("norm", Point::norm);
/// ```
///
/// The builder carries a binding [`Policy`] that is captured by each getter,
/// method and constructor registered after [`with_policy`](Self::with_policy).
/// Only [`add_field`](Self::add_field) and
/// [`add_method_ref`](Self::add_method_ref) have a referent for
/// [`Policy::WrapReference`]; by-value members registered under it fail with
/// [`ScriptError::NoReferent`](crate::ScriptError::NoReferent) when used.
pub struct TypeBuilder<'r, T> {
    desc: &'r mut TypeDesc,
    policy: Policy,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T: Any + Clone> TypeBuilder<'r, T> {
    pub(crate) fn new(desc: &'r mut TypeDesc) -> Self {
        Self {
            desc,
            policy: Policy::default(),
            _marker: PhantomData,
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn descriptor(&self) -> &TypeDesc {
        self.desc
    }

    pub fn add_readonly<R, F>(self, name: &str, getter: F) -> Self
    where
        R: Any,
        F: Fn(&T) -> R + 'static,
    {
        let policy = self.policy;
        let read = reader(move |owner| {
            let owner = owner.downcast_ref::<T>()?;
            Some(Holder::with_policy(getter(owner), policy))
        });
        let getter = Getter::Value {
            ret: TypeTag::of::<R>(),
            read,
            unbound: self.unbound(name),
        };
        self.install_getter(name, getter, None)
    }

    /// Read-only attribute that ignores the owning value.
    pub fn add_readonly_static<R, F>(self, name: &str, getter: F) -> Self
    where
        R: Any,
        F: Fn() -> R + 'static,
    {
        let policy = self.policy;
        let read = reader(move |_| Some(Holder::with_policy(getter(), policy)));
        let getter = Getter::Value {
            ret: TypeTag::of::<R>(),
            read,
            unbound: self.unbound(name),
        };
        self.install_getter(name, getter, None)
    }

    /// Read-only attribute yielding a copy of `value`.
    pub fn add_constant<R: Any + Clone>(self, name: &str, value: R) -> Self {
        let policy = self.policy;
        let read = reader(move |_| Some(Holder::with_policy(value.clone(), policy)));
        let getter = Getter::Value {
            ret: TypeTag::of::<R>(),
            read,
            unbound: self.unbound(name),
        };
        self.install_getter(name, getter, None)
    }

    pub fn add_readwrite<R, V, G, S>(self, name: &str, getter: G, setter: S) -> Self
    where
        R: Any,
        V: Any,
        G: Fn(&T) -> R + 'static,
        S: Fn(&mut T, V) + 'static,
    {
        let policy = self.policy;
        let read = reader(move |owner| {
            let owner = owner.downcast_ref::<T>()?;
            Some(Holder::with_policy(getter(owner), policy))
        });
        let write = writer(move |owner, value| {
            let (Some(owner), Ok(value)) = (owner.downcast_mut::<T>(), value.downcast::<V>())
            else {
                return false;
            };
            setter(owner, *value);
            true
        });
        let setter = Setter {
            arg: TypeTag::of::<V>(),
            write,
        };
        let getter = Getter::Value {
            ret: TypeTag::of::<R>(),
            read,
            unbound: self.unbound(name),
        };
        self.install_getter(name, getter, Some(setter))
    }

    /// Attribute reading and writing through a field projection.
    ///
    /// Under [`Policy::WrapReference`] a read yields a reference into the
    /// owning value, so writes to the result land in the owner.
    pub fn add_field<F, P>(self, name: &str, field: P) -> Self
    where
        F: Any + Clone,
        P: Fn(&mut T) -> &mut F + 'static,
    {
        let policy = self.policy;
        let field = Rc::new(field);

        let access = Rc::clone(&field);
        let project = projector(move |owner| {
            let owner = owner.downcast_mut::<T>()?;
            Some(access(owner) as &mut dyn Any)
        });

        let access = Rc::clone(&field);
        let detach = detacher(move |owner| {
            let owner = owner.downcast_mut::<T>()?;
            Some(Holder::with_policy(access(owner).clone(), policy))
        });

        let write = writer(move |owner, value| {
            let (Some(owner), Ok(value)) = (owner.downcast_mut::<T>(), value.downcast::<F>())
            else {
                return false;
            };
            *field(owner) = *value;
            true
        });

        let getter = Getter::Field {
            ret: TypeTag::of::<F>(),
            project,
            detach,
            by_ref: policy == Policy::WrapReference,
        };
        let setter = Setter {
            arg: TypeTag::of::<F>(),
            write,
        };
        self.install_getter(name, getter, Some(setter))
    }

    pub fn add_method<Args, R, M>(self, name: &str, method: M) -> Self
    where
        M: RefMethod<T, Args, R>,
    {
        let mut overload = method.into_overload(self.policy);
        overload.unbound = self.unbound(name);
        push_overload(self.desc.methods.entry(name.to_string()).or_default(), overload);
        self
    }

    pub fn add_method_mut<Args, R, M>(self, name: &str, method: M) -> Self
    where
        M: MutMethod<T, Args, R>,
    {
        let mut overload = method.into_overload(self.policy);
        overload.unbound = self.unbound(name);
        push_overload(self.desc.methods.entry(name.to_string()).or_default(), overload);
        self
    }

    pub fn add_static<Args, R, M>(self, name: &str, method: M) -> Self
    where
        M: StaticMethod<Args, R>,
    {
        let mut overload = method.into_overload(self.policy);
        overload.unbound = self.unbound(name);
        push_overload(self.desc.methods.entry(name.to_string()).or_default(), overload);
        self
    }

    /// Zero-argument method returning a reference into the receiver, invoked
    /// through [`DynObject::call_ref`](crate::DynObject::call_ref).
    ///
    /// The result always borrows the receiver, so writes to it land in the
    /// native value whatever the builder's policy.
    pub fn add_method_ref<R, P>(self, name: &str, method: P) -> Self
    where
        R: Any,
        P: Fn(&mut T) -> &mut R + 'static,
    {
        let project = projector(move |owner| {
            let owner = owner.downcast_mut::<T>()?;
            Some(method(owner) as &mut dyn Any)
        });
        self.desc.ref_methods.insert(
            name.to_string(),
            RefProjection {
                ret: TypeTag::of::<R>(),
                project,
            },
        );
        self
    }

    /// A constructor with the same parameter list as an earlier one replaces it.
    pub fn constructor<Args, C>(self, ctor: C) -> Self
    where
        C: StaticMethod<Args, T>,
    {
        let mut overload = ctor.into_overload(self.policy);
        overload.unbound = self.unbound("constructor");
        push_overload(&mut self.desc.constructors, overload);
        self
    }

    pub fn constructor_from<A>(self) -> Self
    where
        A: Any,
        T: From<A>,
    {
        self.constructor(|a: A| T::from(a))
    }

    pub fn constructor_default(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// Converter applied only when explicitly requested.
    pub fn conversion<U, F>(self, convert: F) -> Self
    where
        U: Any,
        F: Fn(&T) -> U + 'static,
    {
        self.install_converter(false, convert)
    }

    /// Converter also used by [`DynObject::set_converted`](crate::DynObject::set_converted).
    pub fn implicit_conversion<U, F>(self, convert: F) -> Self
    where
        U: Any,
        F: Fn(&T) -> U + 'static,
    {
        self.install_converter(true, convert)
    }

    /// Consulted for names with no registered attribute. `None` declines.
    pub fn fallback_getter<R, F>(self, getter: F) -> Self
    where
        R: Any,
        F: Fn(&T, &str) -> Option<R> + 'static,
    {
        let policy = self.policy;
        let read = fallback_reader(move |owner, name| {
            let owner = owner.downcast_ref::<T>()?;
            getter(owner, name).map(|v| Holder::with_policy(v, policy))
        });
        let unbound = self.unbound("fallback_getter");
        self.desc.fallback_getter = Some(FallbackGetter {
            ret: TypeTag::of::<R>(),
            read,
            unbound,
        });
        self
    }

    pub fn fallback_getter_static<R, F>(self, getter: F) -> Self
    where
        R: Any,
        F: Fn(&str) -> Option<R> + 'static,
    {
        let policy = self.policy;
        let read = fallback_reader(move |_, name| {
            getter(name).map(|v| Holder::with_policy(v, policy))
        });
        let unbound = self.unbound("fallback_getter");
        self.desc.fallback_getter = Some(FallbackGetter {
            ret: TypeTag::of::<R>(),
            read,
            unbound,
        });
        self
    }

    /// Consulted for names with no registered setter. Returning `false`
    /// declines the name.
    pub fn fallback_setter<V, F>(self, setter: F) -> Self
    where
        V: Any,
        F: Fn(&mut T, &str, V) -> bool + 'static,
    {
        let write = fallback_writer(move |owner, name, value| {
            let (Some(owner), Ok(value)) = (owner.downcast_mut::<T>(), value.downcast::<V>())
            else {
                return false;
            };
            setter(owner, name, *value)
        });
        self.desc.fallback_setter = Some(FallbackSetter {
            arg: TypeTag::of::<V>(),
            write,
        });
        self
    }

    /// Iterates the value through its `&T: IntoIterator` implementation,
    /// copying each element out.
    pub fn make_iterable<E>(self) -> Self
    where
        E: Any + Clone,
        for<'x> &'x T: IntoIterator<Item = &'x E>,
    {
        let policy = self.policy;
        let walk = walker(move |owner, visit| {
            let Some(owner) = owner.downcast_ref::<T>() else {
                return false;
            };
            for element in owner {
                visit(Holder::with_policy(element.clone(), policy));
            }
            true
        });
        let unbound = self.unbound("iterate");
        self.desc.iter = Some(IterAdapter {
            item: TypeTag::of::<E>(),
            walk,
            unbound,
        });
        self
    }

    /// Iterates in whatever order `iter` produces, e.g. reversed.
    pub fn make_iterable_with<E, F>(self, iter: F) -> Self
    where
        E: Any,
        F: for<'x> Fn(&'x T) -> Box<dyn Iterator<Item = E> + 'x> + 'static,
    {
        let policy = self.policy;
        let walk = walker(move |owner, visit| {
            let Some(owner) = owner.downcast_ref::<T>() else {
                return false;
            };
            for element in iter(owner) {
                visit(Holder::with_policy(element, policy));
            }
            true
        });
        let unbound = self.unbound("iterate");
        self.desc.iter = Some(IterAdapter {
            item: TypeTag::of::<E>(),
            walk,
            unbound,
        });
        self
    }

    pub fn make_printable(self) -> Self
    where
        T: Display,
    {
        self.with_display(|v: &T| v.to_string())
    }

    pub fn with_display<F>(self, render: F) -> Self
    where
        F: Fn(&T) -> String + 'static,
    {
        self.desc.display = Some(displayer(move |v| v.downcast_ref::<T>().map(&render)));
        self
    }

    fn unbound(&self, member: &str) -> bool {
        let unbound = self.policy == Policy::WrapReference;
        if unbound {
            warn!(
                ty = %self.desc.name,
                member,
                "by-value member registered under WrapReference; using it will fail"
            );
        }
        unbound
    }

    fn install_getter(self, name: &str, getter: Getter, setter: Option<Setter>) -> Self {
        self.desc.getters.insert(name.to_string(), getter);
        match setter {
            Some(setter) => {
                self.desc.setters.insert(name.to_string(), setter);
            }
            None => {
                self.desc.setters.remove(name);
            }
        }
        self
    }

    fn install_converter<U, F>(self, implicit: bool, convert: F) -> Self
    where
        U: Any,
        F: Fn(&T) -> U + 'static,
    {
        let convert = converter(move |v| {
            v.downcast_ref::<T>()
                .map(|v| Box::new(convert(v)) as Box<dyn Any>)
        });
        self.desc
            .converters
            .insert(TypeId::of::<U>(), Converter { implicit, convert });
        self
    }
}
