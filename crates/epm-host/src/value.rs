use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Error;

/// The dynamic value an entry point exchanges with an embedding language.
/// Deliberately small: just enough shapes (string, integer, bool, path,
/// ordered list, record, callback) to carry every argument and result in
/// the entry-point table without this crate knowing anything about the
/// embedding side's own value representation.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
    Path(PathBuf),
    List(Vec<Value>),
    Table(Vec<(String, Value)>),
    /// A host-supplied callback (progress reporter, lock wait/err handler).
    /// Holds no return value: every callback in the entry-point list is
    /// invoked purely for its side effect.
    Callback(Arc<dyn Fn(&[Value]) + Send + Sync>),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Path(p) => write!(f, "Path({p:?})"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Table(fields) => f.debug_map().entries(fields.iter().map(|(k, v)| (k, v))).finish(),
            Value::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Value::Path(p)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

pub(crate) fn arg<'a>(args: &'a [Value], op: &'static str, index: usize) -> Result<&'a Value, Error> {
    args.get(index).ok_or(Error::WrongArgumentCount { op, expected: index + 1, actual: args.len() })
}

pub(crate) fn arg_str<'a>(args: &'a [Value], op: &'static str, index: usize) -> Result<&'a str, Error> {
    match arg(args, op, index)? {
        Value::Str(s) => Ok(s.as_str()),
        _ => Err(Error::WrongArgumentType { op, index, expected: "string" }),
    }
}

pub(crate) fn arg_path<'a>(args: &'a [Value], op: &'static str, index: usize) -> Result<&'a Path, Error> {
    match arg(args, op, index)? {
        Value::Path(p) => Ok(p.as_path()),
        Value::Str(s) => Ok(Path::new(s.as_str())),
        _ => Err(Error::WrongArgumentType { op, index, expected: "path" }),
    }
}

pub(crate) fn arg_int(args: &[Value], op: &'static str, index: usize) -> Result<i64, Error> {
    match arg(args, op, index)? {
        Value::Int(i) => Ok(*i),
        _ => Err(Error::WrongArgumentType { op, index, expected: "int" }),
    }
}

pub(crate) fn opt_str<'a>(args: &'a [Value], index: usize) -> Option<&'a str> {
    match args.get(index) {
        Some(Value::Str(s)) => Some(s.as_str()),
        _ => None,
    }
}

pub(crate) fn opt_bool(args: &[Value], index: usize) -> bool {
    matches!(args.get(index), Some(Value::Bool(true)))
}

pub(crate) fn opt_callback(args: &[Value], index: usize) -> Option<Arc<dyn Fn(&[Value]) + Send + Sync>> {
    match args.get(index) {
        Some(Value::Callback(f)) => Some(Arc::clone(f)),
        _ => None,
    }
}
