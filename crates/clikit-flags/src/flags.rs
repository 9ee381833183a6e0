use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::value::{Flag, FlagDef, FlagValue, Kind, kind};

static NEXT_SET_ID: AtomicU64 = AtomicU64::new(1);

/// Name collection for flag registration: the first name is canonical, the
/// rest are aliases.
///
/// Accepts a single name or multiple names via array/slice.
pub trait FlagNames<'a> {
    type Iter: Iterator<Item = &'a str>;
    fn iter(self) -> Self::Iter;
}

impl<'a> FlagNames<'a> for &'a str {
    type Iter = std::iter::Once<&'a str>;

    fn iter(self) -> Self::Iter {
        std::iter::once(self)
    }
}

impl<'a> FlagNames<'a> for &'a [&'a str] {
    type Iter = std::iter::Copied<std::slice::Iter<'a, &'a str>>;

    fn iter(self) -> Self::Iter {
        self.iter().copied()
    }
}

impl<'a, const N: usize> FlagNames<'a> for [&'a str; N] {
    type Iter = std::array::IntoIter<&'a str, N>;

    fn iter(self) -> Self::Iter {
        self.into_iter()
    }
}

/// A set of flags and the arguments they are parsed from.
///
/// The rules for parsing are as follows:
///
/// - Flags start with one or more `-`; `-a` and `--a` are identical, as are
///   `-long` and `--long`. Names are case-insensitive and `_` equals `-`.
/// - Values follow the flag after a space or `=`: `-f x`, `-f=x`. A
///   single-letter flag that takes a value may also be fused: `-w8`.
/// - Single-letter flags can be grouped; `-ab` is `-a -b`. Long flags are
///   never split, and a long name wins over a grouping of single letters.
/// - Anything that doesn't start with `-`, a lone `-`, and everything after
///   `--` is a positional argument. Positionals and flags may be mixed.
#[derive(Debug, Clone)]
pub struct FlagSet {
    program: String,
    pub(crate) args: Vec<String>,
    pub(crate) flags: Vec<FlagDef>,
    optional: bool,
    id: u64,
}

impl FlagSet {
    /// Create a flag set from a full `argv`; element 0 is the program.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv
            .next()
            .map(|arg0| {
                Path::new(&arg0)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or(arg0)
            })
            .unwrap_or_default();

        Self {
            program,
            args: argv.collect(),
            flags: Vec::new(),
            optional: false,
            id: NEXT_SET_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Create a flag set from the process arguments.
    pub fn from_env_args() -> Self {
        Self::new(std::env::args_os().map(|arg| arg.to_string_lossy().into_owned()))
    }

    /// Base name of `argv[0]`.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments still to be parsed; after [`FlagSet::parse`] only the
    /// positional arguments remain.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn set_args(&mut self, args: Vec<String>) {
        self.args = args;
    }

    pub fn into_args(self) -> Vec<String> {
        self.args
    }

    /// The next registered flag may be given without a value, in which case
    /// it keeps its default.
    ///
    /// ```
    /// # use clikit_flags::FlagSet;
    /// let mut f = FlagSet::new(["prog", "-s1", "-s2", "val"]);
    /// let s1 = f.optional().string("def1", "s1");
    /// let s2 = f.string("def2", "s2");
    /// f.parse().unwrap();
    /// assert_eq!(s1.get(&f), "def1");
    /// assert_eq!(s2.get(&f), "val");
    /// ```
    pub fn optional(&mut self) -> &mut Self {
        self.optional = true;
        self
    }

    pub fn bool<'a>(&mut self, default: bool, names: impl FlagNames<'a>) -> Flag<kind::Bool> {
        self.register::<kind::Bool>(default, names)
    }

    pub fn string<'a>(
        &mut self,
        default: impl Into<String>,
        names: impl FlagNames<'a>,
    ) -> Flag<kind::Str> {
        self.register::<kind::Str>(default.into(), names)
    }

    pub fn int<'a>(&mut self, default: isize, names: impl FlagNames<'a>) -> Flag<kind::Int> {
        self.register::<kind::Int>(default, names)
    }

    pub fn int32<'a>(&mut self, default: i32, names: impl FlagNames<'a>) -> Flag<kind::Int32> {
        self.register::<kind::Int32>(default, names)
    }

    pub fn int64<'a>(&mut self, default: i64, names: impl FlagNames<'a>) -> Flag<kind::Int64> {
        self.register::<kind::Int64>(default, names)
    }

    pub fn float64<'a>(
        &mut self,
        default: f64,
        names: impl FlagNames<'a>,
    ) -> Flag<kind::Float64> {
        self.register::<kind::Float64>(default, names)
    }

    /// A flag that counts its occurrences, e.g. `-v -v` or `-vv` is 2.
    pub fn int_counter<'a>(
        &mut self,
        default: isize,
        names: impl FlagNames<'a>,
    ) -> Flag<kind::IntCounter> {
        self.register::<kind::IntCounter>(default, names)
    }

    /// A flag that collects every value it is given, in order.
    pub fn string_list<'a>(
        &mut self,
        default: Vec<String>,
        names: impl FlagNames<'a>,
    ) -> Flag<kind::StringList> {
        self.register::<kind::StringList>(default, names)
    }

    pub fn int_list<'a>(
        &mut self,
        default: Vec<isize>,
        names: impl FlagNames<'a>,
    ) -> Flag<kind::IntList> {
        self.register::<kind::IntList>(default, names)
    }

    fn register<'a, K: Kind>(&mut self, default: K::Value, names: impl FlagNames<'a>) -> Flag<K> {
        let names: Vec<String> = names
            .iter()
            .map(normalize_name)
            .filter(|name| !name.is_empty())
            .collect();
        let optional = std::mem::take(&mut self.optional);

        self.flags.push(FlagDef {
            names,
            value: K::wrap(default),
            set: false,
            from_env: false,
            optional,
        });
        Flag::new(self.id, self.flags.len() - 1)
    }

    /// Current value of a flag.
    ///
    /// # Panics
    ///
    /// Panics if `flag` was returned by a different `FlagSet`.
    pub fn get<K: Kind>(&self, flag: &Flag<K>) -> &K::Value {
        match K::unwrap_ref(&self.def(flag).value) {
            Some(value) => value,
            None => unreachable!("flag handle kind does not match its binding"),
        }
    }

    /// Mutable access to a flag's value, e.g. to fill in a computed default.
    ///
    /// # Panics
    ///
    /// Panics if `flag` was returned by a different `FlagSet`.
    pub fn get_mut<K: Kind>(&mut self, flag: &Flag<K>) -> &mut K::Value {
        self.check_handle(flag);
        match K::unwrap_mut(&mut self.flags[flag.index].value) {
            Some(value) => value,
            None => unreachable!("flag handle kind does not match its binding"),
        }
    }

    /// Whether the flag was given on the command line or the environment.
    pub fn is_set<K: Kind>(&self, flag: &Flag<K>) -> bool {
        self.def(flag).set
    }

    /// Whether the current value of the flag came from the environment.
    pub fn is_from_env<K: Kind>(&self, flag: &Flag<K>) -> bool {
        self.def(flag).from_env
    }

    /// Registered flags as `(canonical name, value)`, in registration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
        self.flags.iter().map(|def| (def.canonical(), &def.value))
    }

    fn def<K: Kind>(&self, flag: &Flag<K>) -> &FlagDef {
        self.check_handle(flag);
        &self.flags[flag.index]
    }

    fn check_handle<K: Kind>(&self, flag: &Flag<K>) {
        assert_eq!(
            flag.set_id, self.id,
            "flag handle used with a FlagSet that did not create it"
        );
    }

    /// Find the flag for a token such as `-name`, `--name=value` or a bare
    /// name. The most recently registered match wins.
    pub(crate) fn lookup(&self, token: &str) -> Option<usize> {
        let needle = normalize_name(token);
        self.flags
            .iter()
            .rposition(|def| def.names.iter().any(|name| name_matches(&needle, name)))
    }

    /// Like [`FlagSet::lookup`], but single-letter names never match.
    pub(crate) fn lookup_long(&self, token: &str) -> Option<usize> {
        let needle = normalize_name(token);
        self.flags.iter().rposition(|def| {
            def.names
                .iter()
                .filter(|name| name.chars().count() >= 2)
                .any(|name| name_matches(&needle, name))
        })
    }
}

/// Strip leading dashes, fold case, and treat `_` as `-`.
pub(crate) fn normalize_name(raw: &str) -> String {
    raw.trim_start_matches('-').replace('_', "-").to_lowercase()
}

fn name_matches(needle: &str, name: &str) -> bool {
    needle == name
        || needle
            .strip_prefix(name)
            .is_some_and(|rest| rest.starts_with('='))
}
