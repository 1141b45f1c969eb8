//! Output schemas: turn an untrusted JSON body into a typed value.
//!
//! A [`Shape`] describes what the JSON must look like and reports the first
//! mismatch with a field path such as `$.members[2].email`. [`Typed`] checks a
//! shape and then deserializes into a Rust type.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// A body that did not match its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: expected {expected}, found {actual}")]
pub struct ValidationError {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Validator/transformer from raw JSON to a typed result. Must be pure.
pub trait OutputSchema {
    type Output;

    fn validate(&self, value: Value) -> Result<Self::Output, ValidationError>;
}

/// Identity schema used when no output schema is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawJson;

impl OutputSchema for RawJson {
    type Output = Value;

    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Any,
    String,
    Integer,
    /// Non-negative integer, for `u64`/`u32` fields
    Unsigned,
    Number,
    Boolean,
    Nullable(Box<Shape>),
    Array(Box<Shape>),
    Object(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
    pub required: bool,
}

impl Shape {
    pub fn object() -> Self {
        Shape::Object(Vec::new())
    }

    pub fn array(items: Shape) -> Self {
        Shape::Array(Box::new(items))
    }

    pub fn nullable(self) -> Self {
        Shape::Nullable(Box::new(self))
    }

    /// Add a required field. No-op on non-object shapes.
    pub fn field(self, name: &str, shape: Shape) -> Self {
        self.push_field(name, shape, true)
    }

    /// Add a field that may be absent or null.
    pub fn optional(self, name: &str, shape: Shape) -> Self {
        self.push_field(name, shape, false)
    }

    fn push_field(mut self, name: &str, shape: Shape, required: bool) -> Self {
        if let Shape::Object(fields) = &mut self {
            fields.push(Field {
                name: name.to_string(),
                shape,
                required,
            });
        }
        self
    }

    /// Check `value`, reporting the first mismatch relative to the root `$`.
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        self.check_at(value, &mut String::from("$"))
    }

    fn check_at(&self, value: &Value, path: &mut String) -> Result<(), ValidationError> {
        match (self, value) {
            (Shape::Any, _) => Ok(()),
            (Shape::Nullable(_), Value::Null) => Ok(()),
            (Shape::Nullable(inner), _) => inner.check_at(value, path),
            (Shape::String, Value::String(_)) => Ok(()),
            (Shape::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(()),
            (Shape::Unsigned, Value::Number(n)) if n.is_u64() => Ok(()),
            (Shape::Number, Value::Number(_)) => Ok(()),
            (Shape::Boolean, Value::Bool(_)) => Ok(()),
            (Shape::Array(items), Value::Array(values)) => {
                for (index, item) in values.iter().enumerate() {
                    let len = path.len();
                    path.push_str(&format!("[{}]", index));
                    items.check_at(item, path)?;
                    path.truncate(len);
                }
                Ok(())
            }
            (Shape::Object(fields), Value::Object(map)) => {
                for field in fields {
                    let len = path.len();
                    path.push('.');
                    path.push_str(&field.name);
                    match map.get(&field.name) {
                        None | Some(Value::Null) if !field.required => {}
                        None => {
                            return Err(ValidationError::new(path.clone(), field.shape.to_string(), "missing"));
                        }
                        Some(inner) => field.shape.check_at(inner, path)?,
                    }
                    path.truncate(len);
                }
                Ok(())
            }
            (expected, actual) => Err(ValidationError::new(
                path.clone(),
                expected.to_string(),
                describe(actual),
            )),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Any => write!(f, "any"),
            Shape::String => write!(f, "string"),
            Shape::Integer => write!(f, "integer"),
            Shape::Unsigned => write!(f, "unsigned integer"),
            Shape::Number => write!(f, "number"),
            Shape::Boolean => write!(f, "boolean"),
            Shape::Nullable(inner) => write!(f, "{} or null", inner),
            Shape::Array(items) => write!(f, "array of {}", items),
            Shape::Object(_) => write!(f, "object"),
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

/// Checks a [`Shape`], then deserializes into `T`.
pub struct Typed<T> {
    shape: Shape,
    _output: PhantomData<fn() -> T>,
}

impl<T> Typed<T> {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            _output: PhantomData,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        Self::new(self.shape.clone())
    }
}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typed")
            .field("output", &std::any::type_name::<T>())
            .field("shape", &self.shape)
            .finish()
    }
}

impl<T: DeserializeOwned> OutputSchema for Typed<T> {
    type Output = T;

    fn validate(&self, value: Value) -> Result<T, ValidationError> {
        self.shape.check(&value)?;
        // The shape and the type can disagree (e.g. enum values); report that at the root
        serde_json::from_value(value).map_err(|e| {
            ValidationError::new("$", std::any::type_name::<T>(), e.to_string())
        })
    }
}

/// Types that know their own wire shape.
pub trait Schema: DeserializeOwned {
    fn shape() -> Shape;

    fn schema() -> Typed<Self> {
        Typed::new(Self::shape())
    }
}
