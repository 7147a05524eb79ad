//! Scalar functions registered on every store connection.
//!
//! SQLite ships without a `REGEXP` implementation, a Unicode-aware `upper`
//! or a lenient numeric cast. These fill the gap:
//!
//! - `regexp(pattern, text)`, backing the `x REGEXP p` operator
//! - `regexp_replace(text, pattern, replacement)`, replacing every match
//! - `unicode_upper(text)`
//! - `try_real(value)`, a real number or NULL when the value does not parse
//!
//! Callers may register further text-to-text functions, see [`TextFunction`].

use std::borrow::Cow;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use regex::Regex;
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Value, ValueRef};

/// Signature of a pluggable text function.
pub type TextFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A named text-to-text function that can be registered on a store session.
///
/// NULL input yields NULL; any other value is rendered as text first.
#[derive(Clone)]
pub struct TextFunction {
    name: &'static str,
    func: TextFn,
}

impl TextFunction {
    pub fn new<F>(name: &'static str, func: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            name,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, input: &str) -> String {
        (self.func)(input)
    }
}

impl fmt::Debug for TextFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn deterministic() -> FunctionFlags {
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC
}

/// Render a stored value as text. Numbers use their shortest round-trip form.
pub(crate) fn value_text(value: ValueRef<'_>) -> Option<Cow<'_, str>> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(Cow::Owned(i.to_string())),
        ValueRef::Real(f) => Some(Cow::Owned(f.to_string())),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(String::from_utf8_lossy(bytes)),
    }
}

/// Lenient real parse: surrounding whitespace is ignored, NaN is rejected.
pub(crate) fn parse_real(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| !f.is_nan())
}

pub(crate) fn register_builtins(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function("regexp", 2, deterministic(), |ctx| {
        let regex: Arc<Regex> = ctx.get_or_create_aux(0, |vr| -> Result<_, BoxError> {
            Ok(Regex::new(vr.as_str()?)?)
        })?;
        Ok(value_text(ctx.get_raw(1)).map(|text| regex.is_match(&text)))
    })?;

    conn.create_scalar_function("regexp_replace", 3, deterministic(), |ctx| {
        let regex: Arc<Regex> = ctx.get_or_create_aux(1, |vr| -> Result<_, BoxError> {
            Ok(Regex::new(vr.as_str()?)?)
        })?;
        let replacement: String = ctx.get(2)?;
        Ok(value_text(ctx.get_raw(0))
            .map(|text| regex.replace_all(&text, replacement.as_str()).into_owned()))
    })?;

    // Numbers pass through untouched so comparisons keep their storage class.
    conn.create_scalar_function("unicode_upper", 1, deterministic(), |ctx| {
        Ok(match ctx.get_raw(0) {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Value::Text(String::from_utf8_lossy(bytes).to_uppercase())
            }
        })
    })?;

    conn.create_scalar_function("try_real", 1, deterministic(), |ctx| {
        Ok(match ctx.get_raw(0) {
            ValueRef::Null | ValueRef::Blob(_) => None,
            ValueRef::Integer(i) => Some(i as f64),
            ValueRef::Real(f) => Some(f).filter(|f| !f.is_nan()),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().and_then(parse_real),
        })
    })?;

    Ok(())
}

pub(crate) fn register_text_function(
    conn: &Connection,
    function: &TextFunction,
) -> rusqlite::Result<()> {
    let func = AssertUnwindSafe(Arc::clone(&function.func));
    conn.create_scalar_function(function.name, 1, deterministic(), move |ctx| {
        // Borrow the wrapper whole so the closure captures it, not its field.
        let func = &func;
        Ok(value_text(ctx.get_raw(0)).map(|text| (func.0)(&text)))
    })
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
