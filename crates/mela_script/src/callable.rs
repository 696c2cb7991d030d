//! Conversion of native callables into erased overloads.
//!
//! A callable's signature is read from its `Fn` implementation, so the same
//! registration call accepts closures, free functions and inherent methods
//! (`Point::area`) alike. Arities 0 through 4 are supported.

use std::any::Any;

use smallvec::smallvec;

use crate::descriptor::{Overload, Receiver, TypeTag, invoker};
use crate::holder::{Holder, Policy};

/// A callable taking the owning value by shared reference first.
pub trait RefMethod<T, Args, R>: 'static {
    fn into_overload(self, policy: Policy) -> Overload;
}

/// A callable taking the owning value by mutable reference first.
pub trait MutMethod<T, Args, R>: 'static {
    fn into_overload(self, policy: Policy) -> Overload;
}

/// A callable without an owning value: static methods and constructors.
pub trait StaticMethod<Args, R>: 'static {
    fn into_overload(self, policy: Policy) -> Overload;
}

macro_rules! impl_callables {
    ($($arg:ident $val:ident),*) => {
        impl<T, F, R, $($arg,)*> RefMethod<T, ($($arg,)*), R> for F
        where
            T: Any,
            R: Any,
            $($arg: Any,)*
            F: Fn(&T, $($arg),*) -> R + 'static,
        {
            #[allow(unused_mut, unused_variables)]
            fn into_overload(self, policy: Policy) -> Overload {
                let f = self;
                let invoke = invoker(move |recv, args| {
                    let mut args = args.into_iter();
                    $(let $val = *args.next()?.downcast::<$arg>().ok()?;)*
                    let recv: &mut dyn Any = recv?;
                    let recv = recv.downcast_ref::<T>()?;
                    Some(Holder::with_policy(f(recv, $($val),*), policy))
                });
                Overload::new(
                    smallvec![$(TypeTag::of::<$arg>()),*],
                    TypeTag::of::<R>(),
                    Receiver::Ref,
                    invoke,
                )
            }
        }

        impl<T, F, R, $($arg,)*> MutMethod<T, ($($arg,)*), R> for F
        where
            T: Any,
            R: Any,
            $($arg: Any,)*
            F: Fn(&mut T, $($arg),*) -> R + 'static,
        {
            #[allow(unused_mut, unused_variables)]
            fn into_overload(self, policy: Policy) -> Overload {
                let f = self;
                let invoke = invoker(move |recv, args| {
                    let mut args = args.into_iter();
                    $(let $val = *args.next()?.downcast::<$arg>().ok()?;)*
                    let recv: &mut dyn Any = recv?;
                    let recv = recv.downcast_mut::<T>()?;
                    Some(Holder::with_policy(f(recv, $($val),*), policy))
                });
                Overload::new(
                    smallvec![$(TypeTag::of::<$arg>()),*],
                    TypeTag::of::<R>(),
                    Receiver::Mut,
                    invoke,
                )
            }
        }

        impl<F, R, $($arg,)*> StaticMethod<($($arg,)*), R> for F
        where
            R: Any,
            $($arg: Any,)*
            F: Fn($($arg),*) -> R + 'static,
        {
            #[allow(unused_mut, unused_variables)]
            fn into_overload(self, policy: Policy) -> Overload {
                let f = self;
                let invoke = invoker(move |_recv, args| {
                    let mut args = args.into_iter();
                    $(let $val = *args.next()?.downcast::<$arg>().ok()?;)*
                    Some(Holder::with_policy(f($($val),*), policy))
                });
                Overload::new(
                    smallvec![$(TypeTag::of::<$arg>()),*],
                    TypeTag::of::<R>(),
                    Receiver::Static,
                    invoke,
                )
            }
        }
    };
}

impl_callables!();
impl_callables!(A1 a1);
impl_callables!(A1 a1, A2 a2);
impl_callables!(A1 a1, A2 a2, A3 a3);
impl_callables!(A1 a1, A2 a2, A3 a3, A4 a4);
