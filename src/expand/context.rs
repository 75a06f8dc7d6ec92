use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar context value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// String form used during expansion. `Null` has none.
    pub fn to_expansion(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Str(s) => Some(Cow::Borrowed(s)),
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Name → value lookup used to resolve variable references.
///
/// `None` means the name is absent or bound to null; both expand to `""`.
pub trait Context {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>>;

    /// Whether `name` is bound at all, null included.
    fn defines(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

impl Context for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).and_then(Value::to_expansion)
    }

    fn defines(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl Context for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).and_then(Value::to_expansion)
    }

    fn defines(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl Context for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|s| Cow::Borrowed(s.as_str()))
    }
}

impl Context for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|s| Cow::Borrowed(s.as_str()))
    }
}

impl<C: Context + ?Sized> Context for &C {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).lookup(name)
    }

    fn defines(&self, name: &str) -> bool {
        (**self).defines(name)
    }
}

/// The process environment. Non-UTF-8 values are treated as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvContext;

impl Context for EnvContext {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        if name.is_empty() || name.contains(['=', '\0']) {
            return None;
        }
        std::env::var(name).ok().map(Cow::Owned)
    }
}

/// Two contexts stacked; `top` wins wherever it defines a name. A null
/// bound in `top` hides `bottom` and expands to `""`.
#[derive(Debug, Clone)]
pub struct Layered<T, B> {
    pub top: T,
    pub bottom: B,
}

impl<T, B> Layered<T, B> {
    pub fn new(top: T, bottom: B) -> Self {
        Self { top, bottom }
    }
}

impl<T: Context, B: Context> Context for Layered<T, B> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        if self.top.defines(name) {
            self.top.lookup(name)
        } else {
            self.bottom.lookup(name)
        }
    }

    fn defines(&self, name: &str) -> bool {
        self.top.defines(name) || self.bottom.defines(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_string_forms() {
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::from(42i64).to_string(), "42");
        assert_eq!(Value::from(1.5f64).to_string(), "1.5");
        assert_eq!(Value::from(2.0f64).to_string(), "2");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::Null.to_expansion(), None);
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Str("a".into()));
    }

    #[test]
    fn value_deserializes_untagged() {
        let v: BTreeMap<String, Value> =
            serde_json::from_str(r#"{"a":"s","b":3,"c":0.5,"d":false,"e":null}"#).unwrap();
        assert_eq!(v["a"], Value::Str("s".into()));
        assert_eq!(v["b"], Value::Int(3));
        assert_eq!(v["c"], Value::Float(0.5));
        assert_eq!(v["d"], Value::Bool(false));
        assert_eq!(v["e"], Value::Null);
    }

    #[test]
    fn map_lookup_skips_null() {
        let mut ctx: HashMap<String, Value> = HashMap::new();
        ctx.insert("SET".into(), "v".into());
        ctx.insert("NULL".into(), Value::Null);
        assert_eq!(ctx.lookup("SET").as_deref(), Some("v"));
        assert_eq!(ctx.lookup("NULL"), None);
        assert_eq!(ctx.lookup("MISSING"), None);
    }

    #[test]
    fn layered_prefers_top() {
        let top: BTreeMap<String, String> = [("A".to_string(), "top".to_string())].into();
        let bottom: BTreeMap<String, String> = [
            ("A".to_string(), "bottom".to_string()),
            ("B".to_string(), "b".to_string()),
        ]
        .into();
        let ctx = Layered::new(top, bottom);
        assert_eq!(ctx.lookup("A").as_deref(), Some("top"));
        assert_eq!(ctx.lookup("B").as_deref(), Some("b"));
        assert_eq!(ctx.lookup("C"), None);
    }

    #[test]
    fn layered_null_in_top_hides_bottom() {
        let top: HashMap<String, Value> = [("X".to_string(), Value::Null)].into();
        let bottom: HashMap<String, Value> = [
            ("X".to_string(), Value::from("env")),
            ("Y".to_string(), Value::from("y")),
        ]
        .into();
        let ctx = Layered::new(&top, &bottom);
        assert_eq!(ctx.lookup("X"), None);
        assert!(ctx.defines("X"));
        assert_eq!(ctx.lookup("Y").as_deref(), Some("y"));
        assert!(!ctx.defines("Z"));
    }

    #[test]
    fn env_rejects_invalid_names() {
        assert_eq!(EnvContext.lookup(""), None);
        assert_eq!(EnvContext.lookup("A=B"), None);
    }
}
