//! # Dynamically-shaped arguments.
//!
//! [`Args`] holds an ordered list of positional values plus a map of named
//! values, for handlers whose call shape is not known at compile time (log
//! formatters, scripting bridges). Typed handlers should prefer a tuple or a
//! struct as their argument type.
//!
//! ## Example
//! ```rust
//! use offload::args;
//!
//! let a = args!["hello", 3; wait = 0.02];
//! assert_eq!(a.get(0).and_then(|v| v.as_str()), Some("hello"));
//! assert_eq!(a.get(1).and_then(|v| v.as_i64()), Some(3));
//! assert_eq!(a.named("wait").and_then(|v| v.as_f64()), Some(0.02));
//! assert_eq!(a.to_string(), r#"("hello", 3, wait=0.02)"#);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Positional and named argument values.
///
/// Named keys are unique; setting a key twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Args {
    #[serde(default)]
    positional: Vec<Value>,
    #[serde(default)]
    named: BTreeMap<String, Value>,
}

impl Args {
    /// Empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional value.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named value, replacing any previous value for `key`.
    #[must_use]
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    /// Positional value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Named value for `key`.
    pub fn named(&self, key: &str) -> Option<&Value> {
        self.named.get(key)
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn named_args(&self) -> &BTreeMap<String, Value> {
        &self.named
    }

    /// Total number of values, positional and named.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.positional().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        let mut sep = !self.positional().is_empty();
        for (key, value) in self.named_args() {
            if sep {
                f.write_str(", ")?;
            }
            sep = true;
            write!(f, "{key}={value}")?;
        }
        f.write_str(")")
    }
}

/// Builds an [`Args`] from positional values, optionally followed by
/// `;` and `name = value` pairs.
#[macro_export]
macro_rules! args {
    ($($pos:expr),* $(,)? $(; $($key:ident = $val:expr),* $(,)?)?) => {
        $crate::Args::new()
            $( .arg($pos) )*
            $( $( .kwarg(stringify!($key), $val) )* )?
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_are_unique() {
        let a = Args::new().kwarg("wait", 1).kwarg("wait", 2);
        assert_eq!(a.len(), 1);
        assert_eq!(a.named("wait"), Some(&Value::from(2)));
    }

    #[test]
    fn macro_handles_empty_and_named_only() {
        assert!(args![].is_empty());

        let a = args![; level = "warn"];
        assert!(a.positional().is_empty());
        assert_eq!(a.to_string(), r#"(level="warn")"#);
    }

    #[test]
    fn serde_shape_is_stable() {
        let a = args![1, "x"; flag = true];
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "positional": [1, "x"], "named": { "flag": true } })
        );

        let back: Args = serde_json::from_value(json).unwrap();
        assert_eq!(back, a);
    }
}
