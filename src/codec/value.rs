//! The XML-RPC value domain.
//!
//! A [`Value`] is the tagged union carried inside `<value>` elements:
//! 32-bit signed integers, booleans, UTF-8 strings, doubles, naive
//! ISO-8601 date-times, base64 byte strings, ordered arrays and named
//! structs. Nesting is arbitrary within server limits.

use chrono::NaiveDateTime;

/// A single XML-RPC value.
#[derive(Debug, Clone)]
pub enum Value {
    /// `<i4>` / `<int>`.
    Int(i32),
    /// `<boolean>`, wire literals `0`/`1`.
    Bool(bool),
    /// `<string>` or bare text inside `<value>`.
    String(String),
    /// `<double>`.
    Double(f64),
    /// `<dateTime.iso8601>`, a naive local date-time.
    DateTime(NaiveDateTime),
    /// `<base64>`, the decoded bytes.
    Base64(Vec<u8>),
    /// `<array><data>…</data></array>`, order preserved.
    Array(Vec<Value>),
    /// `<struct>`, member order preserved as emitted. Parsing collapses
    /// duplicate names (last write wins), so live structs have unique keys.
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// The integer payload, if this is an `Int`.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The string payload, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// The double payload, if this is a `Double`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The array elements, if this is an `Array`.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a struct member by name.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Structs compare as maps: equal name sets, equal value per name.
/// Member order is preserved for emission but does not affect equality.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            // Bit-exact: 0.0 and -0.0 differ. NaN never equals itself.
            (Value::Double(a), Value::Double(b)) => {
                !a.is_nan() && !b.is_nan() && a.to_bits() == b.to_bits()
            }
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Base64(a), Value::Base64(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => struct_eq(a, b),
            _ => false,
        }
    }
}

/// Length-preserving bijection on `(name, value)` pairs: every member of
/// `a` claims exactly one so-far-unclaimed equal member of `b`.
fn struct_eq(a: &[(String, Value)], b: &[(String, Value)]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut claimed = vec![false; b.len()];
    a.iter().all(|(name, value)| {
        let unclaimed_match = b.iter().enumerate().position(|(i, (other_name, other_value))| {
            !claimed[i] && name == other_name && value == other_value
        });
        match unclaimed_match {
            Some(i) => {
                claimed[i] = true;
                true
            }
            None => false,
        }
    })
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_equality_ignores_member_order() {
        let a = Value::Struct(vec![
            ("code".to_string(), Value::Int(1)),
            ("name".to_string(), Value::String("x".to_string())),
        ]);
        let b = Value::Struct(vec![
            ("name".to_string(), Value::String("x".to_string())),
            ("code".to_string(), Value::Int(1)),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_struct_equality_detects_name_set_mismatch() {
        let a = Value::Struct(vec![("code".to_string(), Value::Int(1))]);
        let b = Value::Struct(vec![("kode".to_string(), Value::Int(1))]);
        assert_ne!(a, b);

        let c = Value::Struct(vec![
            ("code".to_string(), Value::Int(1)),
            ("extra".to_string(), Value::Int(2)),
        ]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_struct_equality_is_a_bijection() {
        // Repeated pairs on one side must not reuse a single match.
        let a = Value::Struct(vec![
            ("k".to_string(), Value::String("x".to_string())),
            ("k".to_string(), Value::String("x".to_string())),
        ]);
        let b = Value::Struct(vec![
            ("k".to_string(), Value::String("x".to_string())),
            ("j".to_string(), Value::String("y".to_string())),
        ]);
        assert_ne!(a, b);
        assert_ne!(b, a);

        // Repeated names still compare equal under reordering.
        let c = Value::Struct(vec![
            ("k".to_string(), Value::Int(1)),
            ("k".to_string(), Value::Int(2)),
        ]);
        let d = Value::Struct(vec![
            ("k".to_string(), Value::Int(2)),
            ("k".to_string(), Value::Int(1)),
        ]);
        assert_eq!(c, d);
    }

    #[test]
    fn test_array_equality_is_ordered() {
        let a = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::Array(vec![Value::Int(2), Value::Int(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_cross_type_inequality() {
        assert_ne!(Value::Int(1), Value::Bool(true));
        assert_ne!(Value::String("1".to_string()), Value::Int(1));
    }

    #[test]
    fn test_member_lookup() {
        let v = Value::Struct(vec![
            ("faultCode".to_string(), Value::Int(-1000)),
            ("faultString".to_string(), Value::String("nope".to_string())),
        ]);
        assert_eq!(v.member("faultCode").and_then(Value::as_i32), Some(-1000));
        assert_eq!(v.member("faultString").and_then(Value::as_str), Some("nope"));
        assert!(v.member("missing").is_none());
        assert!(Value::Int(0).member("faultCode").is_none());
    }

    #[test]
    fn test_double_equality_bit_exact() {
        assert_eq!(Value::Double(0.5), Value::Double(0.5));
        assert_ne!(Value::Double(0.5), Value::Double(0.25));
        // Positive and negative zero have distinct bit patterns.
        assert_eq!(Value::Double(0.0), Value::Double(0.0));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
        // NaN never equals itself.
        assert_ne!(Value::Double(f64::NAN), Value::Double(f64::NAN));
    }
}
