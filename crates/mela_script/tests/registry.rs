mod common;

use common::{Point, Rect, int, register_point, register_rect, registry};
use mela_script::{ScriptError, StdTypeProvider, TypeDesc, TypeSystem};

#[test]
fn builtin_types_are_installed_by_default() {
    let types = TypeSystem::new();
    assert_eq!(types.type_names(), vec!["unit", "bool", "int", "float", "string"]);
    assert!(types.contains::<i64>());
    assert!(TypeSystem::empty().is_empty());

    let mut empty = TypeSystem::empty();
    empty.install(&StdTypeProvider).unwrap();
    assert_eq!(empty.len(), 5);
}

#[test]
fn builtin_provider_installs_again_without_error() {
    let mut types = TypeSystem::default();
    assert_eq!(types.len(), 5);
    types.install(&StdTypeProvider).unwrap();
    types.install(&StdTypeProvider).unwrap();
    assert_eq!(types.type_names(), vec!["unit", "bool", "int", "float", "string"]);
}

#[test]
fn reregistering_under_the_same_name_is_idempotent() {
    let mut types = registry();
    let before = types.len();
    types
        .register_type::<Point>("point")
        .unwrap()
        .add_readonly("sum", |p| p.x + p.y);
    assert_eq!(types.len(), before);

    let mut p = types.object(Point { x: 1, y: 2 }).unwrap();
    assert_eq!(p.get(&["sum"]).unwrap().cast::<i64>().unwrap(), 3);
    assert_eq!(p.get(&["x"]).unwrap().cast::<i64>().unwrap(), 1);
}

#[test]
fn conflicting_registrations_fail() {
    let mut types = registry();
    let err = types.register_type::<Point>("vec2").err().unwrap();
    assert_eq!(
        err,
        ScriptError::TypeAlreadyRegistered {
            ty: std::any::type_name::<Point>().into(),
            existing: "point".into(),
        }
    );

    #[derive(Clone)]
    struct Other;
    let err = types.register_type::<Other>("point").err().unwrap();
    assert!(matches!(err, ScriptError::TypeAlreadyRegistered { .. }));
    assert!(!types.contains::<Other>());
}

#[test]
fn ensure_type_reopens_whatever_the_name() {
    let mut types = registry();
    let builder = types.ensure_type::<Point>("vec2").unwrap();
    assert_eq!(builder.descriptor().name(), "point");
    assert!(types.descriptor_by_name("vec2").is_none());

    #[derive(Clone)]
    struct Fresh;
    types.ensure_type::<Fresh>("fresh").unwrap();
    assert_eq!(types.type_name::<Fresh>(true).unwrap(), "fresh");
}

#[test]
fn descriptors_keep_their_address() {
    let mut types = TypeSystem::new();
    register_point(&mut types);
    let before: *const TypeDesc = types.descriptor::<Point>().unwrap();

    register_rect(&mut types);
    macro_rules! filler {
        ($($name:ident),*) => {
            $(
                #[derive(Clone)]
                struct $name;
                types.register_type::<$name>(stringify!($name)).unwrap();
            )*
        };
    }
    filler!(F0, F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12, F13, F14, F15);

    let after: *const TypeDesc = types.descriptor::<Point>().unwrap();
    assert_eq!(before, after);
}

#[test]
fn import_copies_descriptors_into_an_independent_registry() {
    let mut source = registry();
    let mut target = TypeSystem::new();
    target.import(&source).unwrap();

    assert!(target.contains::<Point>());
    assert_eq!(target.descriptor::<Rect>().unwrap().owner(), target.id());
    assert_ne!(target.id(), source.id());

    let mut p = target
        .construct::<Point>(&[int(&target, 1), int(&target, 2)])
        .unwrap();
    assert!(p.is_consistent());
    assert_eq!(p.get(&["y"]).unwrap().cast::<i64>().unwrap(), 2);

    // Later changes to the source stay there.
    source
        .register_type::<Point>("point")
        .unwrap()
        .add_readonly("sum", |p| p.x + p.y);
    assert!(source.descriptor::<Point>().unwrap().has_attribute("sum"));
    assert!(!target.descriptor::<Point>().unwrap().has_attribute("sum"));
}

#[test]
fn import_is_all_or_nothing() {
    let source = registry();
    let mut target = TypeSystem::new();
    target.register_type::<Point>("pt").unwrap();

    let err = target.import(&source).unwrap_err();
    assert!(matches!(err, ScriptError::TypeAlreadyRegistered { .. }));
    assert!(!target.contains::<Rect>());
    assert_eq!(target.type_name::<Point>(true).unwrap(), "pt");
}

#[test]
fn import_type_copies_a_single_descriptor() {
    let source = registry();
    let mut target = TypeSystem::new();
    target.import_type::<Point>(&source).unwrap();
    assert!(target.contains::<Point>());
    assert!(!target.contains::<Rect>());

    let err = target.import_type::<u8>(&source).unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn registries_have_distinct_ids() {
    let a = TypeSystem::empty();
    let b = TypeSystem::empty();
    assert_ne!(a.id(), b.id());
}

#[test]
fn descriptor_reports_its_members() {
    let types = registry();
    let desc = types.descriptor_by_name("rect").unwrap();
    assert_eq!(
        desc.attributes(),
        vec!["corner", "height", "kind", "origin", "sides", "width"]
    );
    assert_eq!(desc.methods(), vec!["area", "unit"]);
    assert_eq!(desc.overloads("area").len(), 2);
    assert!(desc.overloads("perimeter").is_empty());
    assert!(desc.is_writable("width"));
    assert!(!desc.is_writable("height"));
    assert!(!desc.is_printable());
    assert_eq!(desc.rust_name(), std::any::type_name::<Rect>());
}
