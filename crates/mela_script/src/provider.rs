use crate::errors::ScriptResult;
use crate::registry::TypeSystem;

/// A bundle of type registrations installed in one step.
pub trait TypeProvider {
    fn install(&self, types: &mut TypeSystem) -> ScriptResult<()>;
}

/// Unit, booleans, integers, floats and strings.
pub struct StdTypeProvider;

impl TypeProvider for StdTypeProvider {
    fn install(&self, types: &mut TypeSystem) -> ScriptResult<()> {
        types
            .ensure_type::<()>("unit")?
            .with_display(|_: &()| "()".to_string());

        types
            .ensure_type::<bool>("bool")?
            .make_printable()
            .implicit_conversion(|v: &bool| i64::from(*v))
            .conversion(|v: &bool| v.to_string());

        types
            .ensure_type::<i64>("int")?
            .make_printable()
            .implicit_conversion(|v: &i64| *v as f64)
            .conversion(|v: &i64| v.to_string())
            .add_method("abs", |v: &i64| v.wrapping_abs());

        // float -> int truncates toward zero and saturates.
        types
            .ensure_type::<f64>("float")?
            .make_printable()
            .conversion(|v: &f64| *v as i64)
            .conversion(|v: &f64| v.to_string())
            .add_method("abs", |v: &f64| v.abs())
            .add_method("floor", |v: &f64| v.floor());

        types
            .ensure_type::<String>("string")?
            .make_printable()
            .add_readonly("len", |s: &String| s.len() as i64)
            .add_method("is_empty", |s: &String| s.is_empty())
            .add_method("contains", |s: &String, needle: String| s.contains(&needle))
            .add_method("to_upper", |s: &String| s.to_uppercase())
            .add_method("to_lower", |s: &String| s.to_lowercase());

        Ok(())
    }
}
