//! Core types for hookdom.
//!
//! These types flow through every layer: declared props carry [`Value`]s,
//! the projection layer turns them into attribute strings, and the hooks
//! store compares them when deciding whether an effect must re-run.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Key
// =============================================================================

/// Declared sibling key. Compared by content.
pub type Key = Rc<str>;

// =============================================================================
// Value
// =============================================================================

/// A prop value.
///
/// Scalars compare by value, [`Style`] compares by reference. This mirrors
/// the "identity or primitive equality" rule used when patching props and
/// when comparing effect dependencies.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value. Clears an attribute or style entry.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Style(Style),
}

impl Value {
    /// Identity / primitive equality.
    ///
    /// Numbers follow `Object.is` rules: `NaN` equals itself, `0.0` and `-0.0`
    /// differ, and integers compare equal to floats of the same value.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => same_number(*a, *b),
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                same_number(*a as f64, *b)
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Style(a), Value::Style(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Check for [`Value::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness, used for boolean DOM properties.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Style(_) => true,
        }
    }

    /// String form used for attributes. `None` for [`Value::Null`].
    pub fn to_attr(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(format_number(*f)),
            Value::Str(s) => Some(s.to_string()),
            Value::Style(style) => Some(style.to_css()),
        }
    }

    /// Borrow the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Read an integer payload, accepting integral floats.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Borrow the style payload, if any.
    pub fn as_style(&self) -> Option<&Style> {
        match self {
            Value::Style(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{}", format_number(*x)),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Style(s) => write!(f, "{s:?}"),
        }
    }
}

fn same_number(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    a.to_bits() == b.to_bits()
}

/// Stringify a number the way a browser would (`1.0` → `"1"`, `1e21` →
/// `"1e+21"`, `1e-7` → `"1e-7"`).
///
/// Uses the shortest digits that round-trip, written in plain decimal when
/// the decimal exponent is in `-6..21` and in exponent form otherwise.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if value == 0.0 {
        return "0".into();
    }

    // `{:e}` gives the shortest round-trip digits as `d.ddde<exp>`
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let count = digits.len() as i32;
    // value = 0.<digits> * 10^point
    let point = exponent.parse::<i32>().unwrap_or(0) + 1;

    let body = if count <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - count) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else {
        let exp = point - 1;
        let sign = if exp < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{sign}{}", exp.unsigned_abs())
        } else {
            format!("{first}.{rest}e{sign}{}", exp.unsigned_abs())
        }
    };

    if value < 0.0 { format!("-{body}") } else { body }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<Rc<str>> for Value {
    fn from(value: Rc<str>) -> Self {
        Value::Str(value)
    }
}

impl From<Style> for Value {
    fn from(value: Style) -> Self {
        Value::Style(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// Style
// =============================================================================

/// Inline style object. Shared; cloning keeps identity.
#[derive(Clone, Default)]
pub struct Style(Rc<BTreeMap<String, Value>>);

impl Style {
    /// Create an empty style object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one declaration.
    ///
    /// Must be called before the style is shared, otherwise the entries are
    /// copied and identity is lost.
    #[must_use]
    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        Rc::make_mut(&mut self.0).insert(property.into(), value.into());
        self
    }

    /// Same object?
    #[inline]
    pub fn ptr_eq(&self, other: &Style) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.0.get(property)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.0.contains_key(property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize as an inline `style` attribute.
    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .filter_map(|(k, v)| v.to_attr().map(|v| format!("{k}: {v};")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Style {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(Rc::new(
            iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

// =============================================================================
// Events
// =============================================================================

/// The closed set of events a prop can listen to.
///
/// Listener props are declared through this tag instead of being sniffed
/// from an `on` prefix on the prop name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    DoubleClick,
    Input,
    Change,
    Submit,
    KeyDown,
    KeyUp,
    Focus,
    Blur,
    MouseDown,
    MouseUp,
    MouseEnter,
    MouseLeave,
    MouseMove,
}

impl EventKind {
    /// Live event name (lowercase).
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::DoubleClick => "dblclick",
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Submit => "submit",
            EventKind::KeyDown => "keydown",
            EventKind::KeyUp => "keyup",
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
            EventKind::MouseEnter => "mouseenter",
            EventKind::MouseLeave => "mouseleave",
            EventKind::MouseMove => "mousemove",
        }
    }

    /// Declared prop name (`onClick`, `onKeyDown`, ...).
    pub const fn prop_name(self) -> &'static str {
        match self {
            EventKind::Click => "onClick",
            EventKind::DoubleClick => "onDoubleClick",
            EventKind::Input => "onInput",
            EventKind::Change => "onChange",
            EventKind::Submit => "onSubmit",
            EventKind::KeyDown => "onKeyDown",
            EventKind::KeyUp => "onKeyUp",
            EventKind::Focus => "onFocus",
            EventKind::Blur => "onBlur",
            EventKind::MouseDown => "onMouseDown",
            EventKind::MouseUp => "onMouseUp",
            EventKind::MouseEnter => "onMouseEnter",
            EventKind::MouseLeave => "onMouseLeave",
            EventKind::MouseMove => "onMouseMove",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Boolean DOM properties (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Boolean DOM properties that live on the element and are mirrored into
    /// a reflected attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BoolProps: u8 {
        const CHECKED = 1 << 0;
        const DISABLED = 1 << 1;
        const READ_ONLY = 1 << 2;
        const SELECTED = 1 << 3;
    }
}

impl BoolProps {
    /// Resolve a declared prop name. `selected` only counts when
    /// `include_selected` is set.
    pub fn from_prop(name: &str, include_selected: bool) -> Option<Self> {
        match name {
            "checked" => Some(Self::CHECKED),
            "disabled" => Some(Self::DISABLED),
            "readOnly" => Some(Self::READ_ONLY),
            "selected" if include_selected => Some(Self::SELECTED),
            _ => None,
        }
    }

    /// Reflected attribute name of a single flag.
    pub fn attr_name(self) -> &'static str {
        if self == Self::CHECKED {
            "checked"
        } else if self == Self::DISABLED {
            "disabled"
        } else if self == Self::READ_ONLY {
            "readonly"
        } else {
            "selected"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_same_scalars() {
        assert!(Value::from(1).same(&Value::from(1)));
        assert!(Value::from(1).same(&Value::from(1.0)));
        assert!(Value::from(f64::NAN).same(&Value::from(f64::NAN)));
        assert!(!Value::from(0.0).same(&Value::from(-0.0)));
        assert!(Value::from("a").same(&Value::from(String::from("a"))));
        assert!(!Value::from("a").same(&Value::Null));
    }

    #[test]
    fn test_value_same_style_is_identity() {
        let a = Style::new().with("color", "red");
        let b = Style::new().with("color", "red");
        assert!(Value::from(a.clone()).same(&Value::from(a.clone())));
        assert!(!Value::from(a).same(&Value::from(b)));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(-1234.5), "-1234.5");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn test_format_number_exponent_forms() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(-1.5e-7), "-1.5e-7");
        assert_eq!(format_number(1.2345e25), "1.2345e+25");
    }

    #[test]
    fn test_style_css() {
        let style: Style = [("color", Value::from("red")), ("width", Value::from(10))]
            .into_iter()
            .collect();
        assert_eq!(style.to_css(), "color: red; width: 10;");
    }

    #[test]
    fn test_bool_props_from_prop() {
        assert_eq!(BoolProps::from_prop("checked", false), Some(BoolProps::CHECKED));
        assert_eq!(BoolProps::from_prop("selected", false), None);
        assert_eq!(BoolProps::from_prop("selected", true), Some(BoolProps::SELECTED));
        assert_eq!(BoolProps::READ_ONLY.attr_name(), "readonly");
    }
}
