//! Names visible to one render: variables and callable helpers

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::error::EvalError;
use super::helpers;
use super::value::Value;
use crate::theme::Theme;

/// A function callable from template expressions
pub type Helper = Arc<dyn Fn(Args<'_>) -> Result<Value, EvalError> + Send + Sync>;

/// Arguments passed to a helper, with typed accessors that report
/// failures under the helper's name
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    helper: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(helper: &'a str, values: &'a [Value]) -> Self {
        Self { helper, values }
    }

    pub fn helper(&self) -> &'a str {
        self.helper
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// An error reported under this helper's name
    pub fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::helper(self.helper, message)
    }

    /// Fail unless the argument count is within `min..=max`
    pub fn arity(&self, min: usize, max: usize) -> Result<(), EvalError> {
        let n = self.values.len();
        if n < min || n > max {
            let expected = if min == max {
                format!("{}", min)
            } else {
                format!("{} to {}", min, max)
            };
            return Err(self.error(format!(
                "expected {} arguments, got {}",
                expected, n
            )));
        }
        Ok(())
    }

    pub fn value(&self, index: usize) -> Result<&'a Value, EvalError> {
        self.values
            .get(index)
            .ok_or_else(|| self.error(format!("missing argument {}", index + 1)))
    }

    pub fn number(&self, index: usize) -> Result<f64, EvalError> {
        let value = self.value(index)?;
        value.as_f64().ok_or_else(|| {
            self.error(format!(
                "argument {} must be a number, not {}",
                index + 1,
                value.type_name()
            ))
        })
    }

    pub fn int(&self, index: usize) -> Result<i64, EvalError> {
        match self.value(index)? {
            Value::Int(n) => Ok(*n),
            other => Err(self.error(format!(
                "argument {} must be an int, not {}",
                index + 1,
                other.type_name()
            ))),
        }
    }

    pub fn string(&self, index: usize) -> Result<&'a str, EvalError> {
        let value = self.value(index)?;
        value.as_str().ok_or_else(|| {
            self.error(format!(
                "argument {} must be a string, not {}",
                index + 1,
                value.type_name()
            ))
        })
    }

    /// Optional trailing int argument
    pub fn int_or(&self, index: usize, default: i64) -> Result<i64, EvalError> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(default),
            Some(_) => self.int(index),
        }
    }
}

/// Variables and helpers for a single render call.
///
/// Assignments inside the template write here, so build a fresh context
/// for every render.
#[derive(Clone, Default)]
pub struct RenderContext {
    variables: HashMap<String, Value>,
    helpers: IndexMap<String, Helper>,
}

impl RenderContext {
    /// A context with the formatting helpers installed
    pub fn new() -> Self {
        let mut context = Self::default();
        helpers::register_formatting(&mut context);
        context
    }

    /// A context with the formatting helpers and the style helpers bound
    /// to `theme`
    pub fn with_theme(theme: Arc<Theme>) -> Self {
        let mut context = Self::new();
        helpers::register_theme(&mut context, theme);
        context
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert every entry of a map value; other values are ignored
    pub fn extend_from(&mut self, values: Value) {
        match values {
            Value::Map(entries) => self.variables.extend(entries),
            Value::Null => {}
            other => log::warn!(
                "render values must be a map, ignoring {}",
                other.type_name()
            ),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn register_helper<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: Fn(Args<'_>) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(helper));
    }

    pub fn helper(&self, name: &str) -> Option<&Helper> {
        self.helpers.get(name)
    }

    pub fn helper_names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    /// Call the helper registered as `name`
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let helper = self
            .helpers
            .get(name)
            .ok_or_else(|| EvalError::NotCallable(name.to_string()))?;
        helper(Args::new(name, args))
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("variables", &self.variables)
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let context = RenderContext::new().with_value("total", 12);
        assert_eq!(context.get("total"), Some(&Value::Int(12)));
        assert_eq!(context.get("missing"), None);
    }

    #[test]
    fn test_extend_from_map() {
        let mut context = RenderContext::default();
        context.extend_from(Value::map([("a", 1), ("b", 2)]));
        assert_eq!(context.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_custom_helper() {
        let mut context = RenderContext::default();
        context.register_helper("double", |args: Args<'_>| {
            args.arity(1, 1)?;
            Ok(Value::Float(args.number(0)? * 2.0))
        });
        assert_eq!(context.call("double", &[Value::Int(4)]), Ok(Value::Float(8.0)));
        assert_eq!(
            context.call("double", &[]),
            Err(EvalError::helper("double", "expected 1 arguments, got 0"))
        );
    }

    #[test]
    fn test_unknown_helper() {
        let context = RenderContext::default();
        assert_eq!(
            context.call("nope", &[]),
            Err(EvalError::NotCallable("nope".to_string()))
        );
    }

    #[test]
    fn test_theme_helpers_installed() {
        let context = RenderContext::with_theme(Arc::new(crate::theme::default_theme()));
        let names: Vec<_> = context.helper_names().collect();
        assert!(names.contains(&"css"));
        assert!(names.contains(&"gradient"));
        assert!(names.contains(&"pct"));
    }

    #[test]
    fn test_args_accessors() {
        let values = [Value::from("a"), Value::Int(3), Value::Float(0.5)];
        let args = Args::new("f", &values);
        assert_eq!(args.string(0), Ok("a"));
        assert_eq!(args.int(1), Ok(3));
        assert_eq!(args.number(2), Ok(0.5));
        assert_eq!(args.int_or(3, 7), Ok(7));
        assert!(args.number(0).is_err());
        assert!(args.arity(1, 2).is_err());
    }
}
