#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt;

use mela_script::{DynObject, Policy, ScriptError, TypeSystem};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn norm2(&self) -> i64 {
        self.x * self.x + self.y * self.y
    }

    pub fn translate(&mut self, dx: i64, dy: i64) {
        self.x += dx;
        self.y += dy;
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: i64, y: i64, w: f64, h: f64) -> Self {
        Self {
            origin: Point { x, y },
            w,
            h,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Countdown(pub Vec<i64>);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    pub values: BTreeMap<String, i64>,
}

pub fn register_point(types: &mut TypeSystem) {
    types
        .register_type::<Point>("point")
        .unwrap()
        .constructor_default()
        .constructor(|x: i64, y: i64| Point { x, y })
        .add_field("x", |p| &mut p.x)
        .add_field("y", |p| &mut p.y)
        .add_method("norm2", Point::norm2)
        .add_method_mut("translate", Point::translate)
        .make_printable();
}

pub fn register_rect(types: &mut TypeSystem) {
    types
        .register_type::<Rect>("rect")
        .unwrap()
        .constructor(|origin: Point, w: f64, h: f64| Rect { origin, w, h })
        .add_field("origin", |r| &mut r.origin)
        .add_readwrite("width", |r| r.w, |r: &mut Rect, w: f64| r.w = w)
        .add_readonly("height", |r| r.h)
        .add_readonly_static("sides", || 4_i64)
        .add_constant("kind", "rectangle".to_string())
        .add_method("area", |r: &Rect| r.w * r.h)
        .add_method("area", |r: &Rect, scale: f64| r.w * r.h * scale)
        .add_static("unit", || Rect::new(0, 0, 1.0, 1.0))
        .with_policy(Policy::WrapReference)
        .add_field("corner", |r| &mut r.origin);
}

pub fn register_collections(types: &mut TypeSystem) {
    types
        .register_type::<Vec<i64>>("int_list")
        .unwrap()
        .add_readonly("len", |v| v.len() as i64)
        .add_method_mut("push", |v: &mut Vec<i64>, x: i64| v.push(x))
        .make_iterable::<i64>();

    types
        .register_type::<Countdown>("countdown")
        .unwrap()
        .make_iterable_with::<i64, _>(|c| Box::new(c.0.iter().rev().copied()));
}

pub fn register_settings(types: &mut TypeSystem) {
    types
        .register_type::<Settings>("settings")
        .unwrap()
        .constructor_default()
        .add_readonly("count", |s| s.values.len() as i64)
        .fallback_getter(|s, name| s.values.get(name).copied())
        .fallback_setter(|s: &mut Settings, name: &str, value: i64| {
            if name.starts_with('_') {
                return false;
            }
            s.values.insert(name.to_string(), value);
            true
        });
}

/// Built-in types plus every fixture above.
pub fn registry() -> TypeSystem {
    let mut types = TypeSystem::new();
    register_point(&mut types);
    register_rect(&mut types);
    register_collections(&mut types);
    register_settings(&mut types);
    types
}

pub fn int(types: &TypeSystem, v: i64) -> DynObject<'_> {
    types.object(v).unwrap()
}

pub fn float(types: &TypeSystem, v: f64) -> DynObject<'_> {
    types.object(v).unwrap()
}

pub fn string<'a>(types: &'a TypeSystem, v: &str) -> DynObject<'a> {
    types.object(v.to_string()).unwrap()
}

pub fn detail(err: &ScriptError) -> &str {
    match err {
        ScriptError::MemberNotFound { detail, .. } => detail,
        other => panic!("expected MemberNotFound, got {other:?}"),
    }
}
