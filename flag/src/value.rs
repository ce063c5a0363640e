//! The textual value contract shared by every flag.
//!
//! A flag's value is anything implementing [`Value`]: it can update itself
//! from text and render itself back as text. Two optional capability markers
//! change how the parser and listings treat a value:
//!
//! - [`Value::is_bool_flag`]: the flag takes no argument; a bare `--name`
//!   means `true`.
//! - [`Value::is_hidden`]: the flag is left out of user-facing listings.
//!
//! Built-in variants store their data in a [`Var<T>`], a cloneable shared
//! cell. The code that registers a flag keeps a clone and reads the parsed
//! value from it once parsing is done.
//!
//! # Examples
//!
//! ```
//! use cmder_flag::{Value, Var};
//!
//! let count = Var::new(12u32);
//! let mut handle = count.clone();
//! handle.set("0x10").unwrap();
//!
//! assert_eq!(count.get(), 16);
//! assert_eq!(handle.to_text(), "16");
//! ```

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::ValueError;

/// A flag value shared between every name it is registered under.
///
/// Aliases are two registry entries holding clones of the same `SharedValue`.
pub type SharedValue = Rc<RefCell<dyn Value>>;

/// Display category of a value, used to infer a placeholder name in usage
/// listings when the usage text does not name one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Duration,
    Strings,
    Map,
    Time,
    Func,
    Other,
}

impl ValueKind {
    /// Placeholder name shown next to the flag (`--count=<uint>`).
    ///
    /// Boolean flags have no placeholder.
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Bool => "",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::String => "string",
            Self::Duration => "duration",
            Self::Time => "time",
            Self::Strings | Self::Map | Self::Func | Self::Other => "value",
        }
    }
}

/// A value that can be updated from and rendered to text.
pub trait Value {
    /// Updates the value from `text`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] when `text` is not acceptable. A failed
    /// `set` leaves the value unchanged.
    fn set(&mut self, text: &str) -> Result<(), ValueError>;

    /// Renders the current value as text.
    fn to_text(&self) -> String;

    /// Flag takes no argument; an omitted value means `"true"`.
    fn is_bool_flag(&self) -> bool {
        false
    }

    /// Flag is excluded from user-facing listings.
    fn is_hidden(&self) -> bool {
        false
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Other
    }

    /// Address of the underlying storage, if the value has one.
    ///
    /// Listings group flags whose storage is the same as aliases, even when
    /// they were registered separately against clones of one [`Var`].
    fn storage_id(&self) -> Option<usize> {
        None
    }
}

/// Identity of a shared value for alias grouping.
///
/// Falls back to the address of the shared cell when the value has no
/// storage of its own.
pub fn value_identity(value: &SharedValue) -> usize {
    value
        .borrow()
        .storage_id()
        .unwrap_or_else(|| Rc::as_ptr(value) as *const () as usize)
}

impl Value for SharedValue {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        self.borrow_mut().set(text)
    }

    fn to_text(&self) -> String {
        self.borrow().to_text()
    }

    fn is_bool_flag(&self) -> bool {
        self.borrow().is_bool_flag()
    }

    fn is_hidden(&self) -> bool {
        self.borrow().is_hidden()
    }

    fn kind(&self) -> ValueKind {
        self.borrow().kind()
    }

    fn storage_id(&self) -> Option<usize> {
        Some(value_identity(self))
    }
}

/// Conversion between a Rust type and flag text.
///
/// Implemented for the primitive, duration, structured and timestamp types
/// this crate supports; [`Var<T>`] turns any of them into a [`Value`].
pub trait FlagType {
    fn kind() -> ValueKind;

    fn is_bool_flag() -> bool {
        false
    }

    /// Applies `text` to `self`: scalars replace, collections merge.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] and leaves `self` untouched when `text` is
    /// rejected.
    fn apply(&mut self, text: &str) -> Result<(), ValueError>;

    /// Canonical text form; re-applying it reproduces the value.
    fn render(&self) -> String;
}

/// Shared, interior-mutable storage for a typed flag value.
///
/// Cloning a `Var` yields another handle to the same storage.
pub struct Var<T>(Rc<RefCell<T>>);

impl<T> Var<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Stores `value`, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    /// Borrows the current value.
    ///
    /// # Panics
    ///
    /// Panics if the value is being updated at the same time, which only
    /// happens when a borrow is held across a parse.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Returns `true` if both handles point at the same storage.
    pub fn same_as(&self, other: &Var<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl<T: Clone> Var<T> {
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T> Clone for Var<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Default> Default for Var<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Var").field(&*self.0.borrow()).finish()
    }
}

impl<T: FlagType> Value for Var<T> {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        self.0.borrow_mut().apply(text)
    }

    fn to_text(&self) -> String {
        self.0.borrow().render()
    }

    fn is_bool_flag(&self) -> bool {
        T::is_bool_flag()
    }

    fn kind(&self) -> ValueKind {
        T::kind()
    }

    fn storage_id(&self) -> Option<usize> {
        Some(self.addr())
    }
}

/// Wraps a value so it is left out of listings and usage text.
///
/// The flag still parses normally.
#[derive(Debug, Clone)]
pub struct Hidden<V>(pub V);

impl<V: Value> Value for Hidden<V> {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        self.0.set(text)
    }

    fn to_text(&self) -> String {
        self.0.to_text()
    }

    fn is_bool_flag(&self) -> bool {
        self.0.is_bool_flag()
    }

    fn is_hidden(&self) -> bool {
        true
    }

    fn kind(&self) -> ValueKind {
        self.0.kind()
    }

    fn storage_id(&self) -> Option<usize> {
        self.0.storage_id()
    }
}

type Callback = Box<dyn FnMut(&str) -> Result<(), ValueError>>;

/// A value that hands every occurrence's text to a closure.
///
/// Useful for flags with side effects or custom accumulation. Renders as
/// empty text, so it never shows a default.
pub struct FuncValue(Callback);

impl FuncValue {
    pub fn new(f: impl FnMut(&str) -> Result<(), ValueError> + 'static) -> Self {
        Self(Box::new(f))
    }
}

impl Value for FuncValue {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        (self.0)(text)
    }

    fn to_text(&self) -> String {
        String::new()
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Func
    }
}

/// Boolean-flag variant of [`FuncValue`]: the closure receives `"true"` when
/// the flag is given without a value.
pub struct BoolFuncValue(Callback);

impl BoolFuncValue {
    pub fn new(f: impl FnMut(&str) -> Result<(), ValueError> + 'static) -> Self {
        Self(Box::new(f))
    }
}

impl Value for BoolFuncValue {
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        (self.0)(text)
    }

    fn to_text(&self) -> String {
        String::new()
    }

    fn is_bool_flag(&self) -> bool {
        true
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Func
    }
}

/// Adapts any type with a text form of its own into a [`Value`].
///
/// `T` is parsed with [`FromStr`] and rendered with [`Display`](fmt::Display);
/// the data lives in a [`Var<T>`] like the built-in variants.
///
/// # Examples
///
/// ```
/// use std::net::SocketAddr;
/// use cmder_flag::{TextValue, Value, Var};
///
/// let addr = Var::new(SocketAddr::from(([127, 0, 0, 1], 8080)));
/// let mut value = TextValue::new(addr.clone());
/// value.set("10.0.0.1:9000").unwrap();
///
/// assert_eq!(addr.get().port(), 9000);
/// assert!(value.set("not-an-address").is_err());
/// ```
pub struct TextValue<T>(Var<T>);

impl<T> TextValue<T> {
    pub fn new(var: Var<T>) -> Self {
        Self(var)
    }
}

impl<T> Value for TextValue<T>
where
    T: FromStr + fmt::Display,
    T::Err: fmt::Display,
{
    fn set(&mut self, text: &str) -> Result<(), ValueError> {
        let parsed = text.parse::<T>().map_err(ValueError::custom)?;
        self.0.replace(parsed);
        Ok(())
    }

    fn to_text(&self) -> String {
        self.0.borrow().to_string()
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Other
    }

    fn storage_id(&self) -> Option<usize> {
        Some(self.0.addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_clones_share_storage() {
        let a = Var::new(String::from("x"));
        let mut b = a.clone();
        b.set("y").unwrap();
        assert_eq!(a.get(), "y");
        assert!(a.same_as(&b));
        assert_eq!(a.storage_id(), b.storage_id());
    }

    #[test]
    fn test_hidden_delegates_everything_but_visibility() {
        let inner = Var::new(false);
        let hidden = Hidden(inner.clone());
        assert!(hidden.is_hidden());
        assert!(hidden.is_bool_flag());
        assert_eq!(hidden.kind(), ValueKind::Bool);
        assert_eq!(hidden.storage_id(), inner.storage_id());
    }

    #[test]
    fn test_shared_value_identity_follows_storage() {
        let var = Var::new(3i64);
        let first: SharedValue = Rc::new(RefCell::new(var.clone()));
        let second: SharedValue = Rc::new(RefCell::new(var));
        assert_eq!(value_identity(&first), value_identity(&second));

        let func: SharedValue = Rc::new(RefCell::new(FuncValue::new(|_| Ok(()))));
        let other: SharedValue = Rc::new(RefCell::new(FuncValue::new(|_| Ok(()))));
        assert_ne!(value_identity(&func), value_identity(&other));
        assert_eq!(value_identity(&func), value_identity(&Rc::clone(&func)));
    }

    #[test]
    fn test_func_values_receive_text() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut value = BoolFuncValue::new(move |text| {
            sink.borrow_mut().push(text.to_string());
            Ok(())
        });
        value.set("true").unwrap();
        value.set("false").unwrap();
        assert!(value.is_bool_flag());
        assert_eq!(value.to_text(), "");
        assert_eq!(*seen.borrow(), vec!["true", "false"]);
    }

    #[test]
    fn test_text_value_uses_from_str_and_display() {
        use std::net::{IpAddr, Ipv4Addr};

        let ip = Var::new(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let mut value = TextValue::new(ip.clone());
        assert_eq!(value.to_text(), "127.0.0.1");
        assert_eq!(value.kind(), ValueKind::Other);
        assert_eq!(value.storage_id(), Some(ip.addr()));

        value.set("::1").unwrap();
        assert_eq!(ip.get().to_string(), "::1");

        assert!(matches!(value.set("300.1.1.1"), Err(ValueError::Custom(_))));
        assert_eq!(value.to_text(), "::1");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(ValueKind::Bool.placeholder(), "");
        assert_eq!(ValueKind::Uint.placeholder(), "uint");
        assert_eq!(ValueKind::Map.placeholder(), "value");
    }
}
