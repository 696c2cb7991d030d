//! Type-erased storage behind a dynamic object.
//!
//! Owned, shared and borrowed values have different lifetimes, so each
//! keeps its own variant instead of being funnelled through one pointer.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// How a produced value becomes a dynamic object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Owning copy.
    #[default]
    Copy,
    /// Non-owning reference into the value it came from.
    WrapReference,
    /// Shared ownership; clones of the handle see each other's writes.
    Share,
}

/// Storage mode of a dynamic object, fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Storage {
    Owned,
    Shared,
    Borrowed,
}

pub(crate) type SharedCell = Rc<RefCell<dyn Any>>;

pub(crate) enum Holder<'a> {
    Owned(Box<dyn Any>),
    Shared(SharedCell),
    Borrowed(&'a mut dyn Any),
    /// Reference into a shared value; keeps the cell mutably borrowed.
    Guarded(RefMut<'a, dyn Any>),
}

pub(crate) enum ValueRef<'b> {
    Plain(&'b dyn Any),
    Cell(Ref<'b, dyn Any>),
}

impl Deref for ValueRef<'_> {
    type Target = dyn Any;

    fn deref(&self) -> &dyn Any {
        match self {
            ValueRef::Plain(v) => *v,
            ValueRef::Cell(r) => &**r,
        }
    }
}

pub(crate) enum ValueMut<'b> {
    Plain(&'b mut dyn Any),
    Cell(RefMut<'b, dyn Any>),
}

impl Deref for ValueMut<'_> {
    type Target = dyn Any;

    fn deref(&self) -> &dyn Any {
        match self {
            ValueMut::Plain(v) => &**v,
            ValueMut::Cell(r) => &**r,
        }
    }
}

impl DerefMut for ValueMut<'_> {
    fn deref_mut(&mut self) -> &mut dyn Any {
        match self {
            ValueMut::Plain(v) => &mut **v,
            ValueMut::Cell(r) => &mut **r,
        }
    }
}

pub(crate) type ProjectFn = dyn Fn(&mut dyn Any) -> Option<&mut dyn Any>;

impl<'a> Holder<'a> {
    pub(crate) fn owned<V: Any>(value: V) -> Holder<'static> {
        Holder::Owned(Box::new(value))
    }

    pub(crate) fn shared<V: Any>(value: V) -> Holder<'static> {
        let cell: SharedCell = Rc::new(RefCell::new(value));
        Holder::Shared(cell)
    }

    /// Storage for a by-value result. Members registered under
    /// `WrapReference` are refused before they get here.
    pub(crate) fn with_policy<V: Any>(value: V, policy: Policy) -> Holder<'static> {
        match policy {
            Policy::Share => Holder::shared(value),
            Policy::Copy | Policy::WrapReference => Holder::owned(value),
        }
    }

    pub(crate) fn storage(&self) -> Storage {
        match self {
            Holder::Owned(_) => Storage::Owned,
            Holder::Shared(_) => Storage::Shared,
            Holder::Borrowed(_) | Holder::Guarded(_) => Storage::Borrowed,
        }
    }

    /// `None` when a shared value is mutably borrowed elsewhere.
    pub(crate) fn read(&self) -> Option<ValueRef<'_>> {
        match self {
            Holder::Owned(b) => Some(ValueRef::Plain(&**b)),
            Holder::Shared(c) => c.try_borrow().ok().map(ValueRef::Cell),
            Holder::Borrowed(r) => Some(ValueRef::Plain(&**r)),
            Holder::Guarded(g) => Some(ValueRef::Plain(&**g)),
        }
    }

    pub(crate) fn write(&mut self) -> Option<ValueMut<'_>> {
        match self {
            Holder::Owned(b) => Some(ValueMut::Plain(&mut **b)),
            Holder::Shared(c) => c.try_borrow_mut().ok().map(ValueMut::Cell),
            Holder::Borrowed(r) => Some(ValueMut::Plain(&mut **r)),
            Holder::Guarded(g) => Some(ValueMut::Plain(&mut **g)),
        }
    }

    /// A borrowed view of this holder, usable as the start of a path walk.
    pub(crate) fn reborrow(&mut self) -> Option<Holder<'_>> {
        match self {
            Holder::Owned(b) => Some(Holder::Borrowed(&mut **b)),
            Holder::Shared(c) => c.try_borrow_mut().ok().map(Holder::Guarded),
            Holder::Borrowed(r) => Some(Holder::Borrowed(&mut **r)),
            Holder::Guarded(g) => Some(Holder::Borrowed(&mut **g)),
        }
    }

    /// Narrows a borrowed holder to a part of its value. Owned and shared
    /// holders are handed back untouched in `Err`.
    pub(crate) fn project(self, project: &ProjectFn) -> Result<Option<Holder<'a>>, Holder<'a>> {
        match self {
            Holder::Borrowed(r) => Ok(project(r).map(Holder::Borrowed)),
            Holder::Guarded(g) => Ok(RefMut::filter_map(g, |v| project(v)).ok().map(Holder::Guarded)),
            other => Err(other),
        }
    }
}
