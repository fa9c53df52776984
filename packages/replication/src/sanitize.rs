//! # Sanitizer
//!
//! Converts arbitrary values into the scalar/array/map shapes a replicated
//! document accepts.
//!
//! - `null` and `None` become [`Any::Null`]
//! - Booleans, finite numbers and strings pass through
//! - Non-finite floats collapse to null
//! - Arrays and objects recurse element by element
//! - Date-times become RFC 3339 strings
//! - Anything else can go through [`sanitize_display`] and becomes its string form
//!
//! Sanitizing never fails: values that cannot be represented degrade.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use serde_json::{Map, Value};
use yrs::Any;

pub trait Sanitize {
    fn sanitize(&self) -> Any;
}

/// Fallback for types without a structural mapping
pub fn sanitize_display<T: Display + ?Sized>(value: &T) -> Any {
    Any::String(Arc::from(value.to_string()))
}

fn number(n: f64) -> Any {
    if n.is_finite() {
        Any::Number(n)
    } else {
        Any::Null
    }
}

impl Sanitize for Value {
    fn sanitize(&self) -> Any {
        match self {
            Value::Null => Any::Null,
            Value::Bool(b) => Any::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(Any::Null, number),
            Value::String(s) => s.sanitize(),
            Value::Array(items) => items.as_slice().sanitize(),
            Value::Object(map) => map.sanitize(),
        }
    }
}

impl Sanitize for Map<String, Value> {
    fn sanitize(&self) -> Any {
        let entries = self
            .iter()
            .map(|(key, value)| (key.clone(), value.sanitize()))
            .collect::<HashMap<_, _>>();
        Any::Map(Arc::new(entries))
    }
}

impl Sanitize for bool {
    fn sanitize(&self) -> Any {
        Any::Bool(*self)
    }
}

impl Sanitize for f64 {
    fn sanitize(&self) -> Any {
        number(*self)
    }
}

impl Sanitize for f32 {
    fn sanitize(&self) -> Any {
        number(f64::from(*self))
    }
}

macro_rules! sanitize_integer {
    ($($ty:ty),*) => {
        $(
            impl Sanitize for $ty {
                fn sanitize(&self) -> Any {
                    number(*self as f64)
                }
            }
        )*
    };
}

sanitize_integer!(i32, i64, u32, u64, usize);

impl Sanitize for str {
    fn sanitize(&self) -> Any {
        Any::String(Arc::from(self))
    }
}

impl Sanitize for String {
    fn sanitize(&self) -> Any {
        self.as_str().sanitize()
    }
}

impl<Tz> Sanitize for DateTime<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    fn sanitize(&self) -> Any {
        Any::String(Arc::from(self.to_rfc3339()))
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&self) -> Any {
        self.as_ref().map_or(Any::Null, Sanitize::sanitize)
    }
}

impl<T: Sanitize> Sanitize for [T] {
    fn sanitize(&self) -> Any {
        let items: Vec<Any> = self.iter().map(Sanitize::sanitize).collect();
        Any::Array(items.into())
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(&self) -> Any {
        self.as_slice().sanitize()
    }
}

impl<T: Sanitize> Sanitize for HashMap<String, T> {
    fn sanitize(&self) -> Any {
        let entries = self
            .iter()
            .map(|(key, value)| (key.clone(), value.sanitize()))
            .collect::<HashMap<_, _>>();
        Any::Map(Arc::new(entries))
    }
}

impl<T: Sanitize> Sanitize for BTreeMap<String, T> {
    fn sanitize(&self) -> Any {
        let entries = self
            .iter()
            .map(|(key, value)| (key.clone(), value.sanitize()))
            .collect::<HashMap<_, _>>();
        Any::Map(Arc::new(entries))
    }
}
