//! Flag bindings and the typed handles returned at registration.

use std::fmt;
use std::marker::PhantomData;

use crate::FlagSet;

/// The value cell of one registered flag.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Int(isize),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    /// Incremented once per occurrence.
    IntCounter(isize),
    StringList(Vec<String>),
    IntList(Vec<isize>),
}

impl FlagValue {
    /// Whether the flag consumes a value (`-f x`, `-f=x`, `-fx`).
    pub fn takes_value(&self) -> bool {
        !matches!(self, Self::Bool(_) | Self::IntCounter(_))
    }

    /// Kinds for which repeating the flag is never a duplicate.
    pub(crate) fn repeatable(&self) -> bool {
        matches!(
            self,
            Self::Bool(_) | Self::IntCounter(_) | Self::StringList(_) | Self::IntList(_)
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float64(_) => "float64",
            Self::IntCounter(_) => "counter",
            Self::StringList(_) => "string list",
            Self::IntList(_) => "int list",
        }
    }
}

/// A registered flag: its names and its binding.
#[derive(Debug, Clone)]
pub(crate) struct FlagDef {
    pub(crate) names: Vec<String>,
    pub(crate) value: FlagValue,
    pub(crate) set: bool,
    pub(crate) from_env: bool,
    pub(crate) optional: bool,
}

impl FlagDef {
    pub(crate) fn canonical(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Marker types naming the flag kinds, used as the parameter of [`Flag`].
pub mod kind {
    use super::{FlagValue, Kind, sealed};

    macro_rules! kinds {
        ($($(#[$doc:meta])* $name:ident => $variant:ident($ty:ty);)*) => {
            $(
                $(#[$doc])*
                #[derive(Debug, Clone, Copy, PartialEq, Eq)]
                pub enum $name {}

                impl sealed::Sealed for $name {}

                impl Kind for $name {
                    type Value = $ty;

                    fn wrap(value: $ty) -> FlagValue {
                        FlagValue::$variant(value)
                    }

                    fn unwrap_ref(value: &FlagValue) -> Option<&$ty> {
                        match value {
                            FlagValue::$variant(v) => Some(v),
                            _ => None,
                        }
                    }

                    fn unwrap_mut(value: &mut FlagValue) -> Option<&mut $ty> {
                        match value {
                            FlagValue::$variant(v) => Some(v),
                            _ => None,
                        }
                    }
                }
            )*
        };
    }

    kinds! {
        Bool => Bool(bool);
        Str => String(String);
        Int => Int(isize);
        Int32 => Int32(i32);
        Int64 => Int64(i64);
        Float64 => Float64(f64);
        /// Counts occurrences: `-vvv` is 3.
        IntCounter => IntCounter(isize);
        StringList => StringList(Vec<String>);
        IntList => IntList(Vec<isize>);
    }
}

/// Maps a marker type from [`kind`] to its [`FlagValue`] variant.
pub trait Kind: sealed::Sealed {
    type Value;

    fn wrap(value: Self::Value) -> FlagValue;
    fn unwrap_ref(value: &FlagValue) -> Option<&Self::Value>;
    fn unwrap_mut(value: &mut FlagValue) -> Option<&mut Self::Value>;
}

/// Handle to a registered flag.
///
/// The value lives in the [`FlagSet`] that returned the handle; read it with
/// [`Flag::get`] or [`FlagSet::get`] after parsing.
pub struct Flag<K: Kind> {
    pub(crate) set_id: u64,
    pub(crate) index: usize,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Kind> Flag<K> {
    pub(crate) fn new(set_id: u64, index: usize) -> Self {
        Self {
            set_id,
            index,
            _kind: PhantomData,
        }
    }

    pub fn get<'a>(&self, flags: &'a FlagSet) -> &'a K::Value {
        flags.get(self)
    }

    /// Whether the flag was given on the command line or through the
    /// environment.
    pub fn is_set(&self, flags: &FlagSet) -> bool {
        flags.is_set(self)
    }
}

impl<K: Kind> Flag<K>
where
    K::Value: Copy,
{
    pub fn value(&self, flags: &FlagSet) -> K::Value {
        *flags.get(self)
    }
}

impl Flag<kind::StringList> {
    /// All values split on `sep` and trimmed, so `-skip=a,b` reads the same
    /// as `-skip=a -skip=b`.
    pub fn strings_split(&self, flags: &FlagSet, sep: &str) -> Vec<String> {
        flags
            .get(self)
            .iter()
            .flat_map(|v| v.split(sep))
            .map(|s| s.trim().to_string())
            .collect()
    }
}

impl<K: Kind> Clone for Flag<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: Kind> Copy for Flag<K> {}

impl<K: Kind> fmt::Debug for Flag<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("set_id", &self.set_id)
            .field("index", &self.index)
            .finish()
    }
}
