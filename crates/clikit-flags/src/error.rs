use thiserror::Error;

use crate::parse::Positional;

pub type FlagResult<T> = Result<T, FlagError>;

/// Why a numeric literal was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("invalid syntax")]
    Syntax,
    #[error("value out of range")]
    Range,
}

/// Errors from [`FlagSet::parse`](crate::FlagSet::parse) and
/// [`FlagSet::shift_command`](crate::FlagSet::shift_command).
///
/// Every variant except [`FlagError::UnknownEnv`] stops parsing; bindings
/// updated before the error keep their new values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlagError {
    /// A token starting with `-` that matches no registered flag.
    #[error("unknown flag: {flag:?}")]
    Unknown { flag: String },

    /// A single-value flag given more than once.
    #[error("flag given more than once: {flag:?}")]
    Duplicate { flag: String },

    /// A flag that requires a value was last on the line, or followed by
    /// something that looks like another flag.
    #[error("{flag}: needs an argument")]
    NeedsArgument { flag: String },

    #[error("{flag}: {source} (must be a {kind})")]
    Invalid {
        flag: String,
        #[source]
        source: NumberError,
        kind: &'static str,
    },

    /// A boolean environment variable that is not a recognised token.
    #[error("invalid value {value:?} for boolean {flag:?}")]
    InvalidBool { flag: String, value: String },

    /// A matching environment variable could not be converted.
    #[error("environment variable {key:?}: {source}")]
    Env {
        key: String,
        #[source]
        source: Box<FlagError>,
    },

    #[error("{}", positional_message(.bounds, .given))]
    Positional { bounds: Positional, given: usize },

    #[error("no command given")]
    NoCommand,

    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("ambiguous command: {cmd:?}; matches: {}", quote_list(.matches))]
    AmbiguousCommand { cmd: String, matches: Vec<String> },

    /// Environment variables with the configured prefix that don't belong to
    /// any flag. Returned after everything else was applied, so it is safe
    /// to log and carry on.
    #[error("unknown environment variables starting with {prefix:?}: {}", quote_list(.vars))]
    UnknownEnv { prefix: String, vars: Vec<String> },
}

impl FlagError {
    /// Whether the error leaves a fully parsed flag set behind.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::UnknownEnv { .. })
    }
}

fn quote_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("{item:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "argument" } else { "arguments" }
}

fn positional_message(bounds: &Positional, given: &usize) -> String {
    let given = *given;
    match *bounds {
        Positional::Any => format!("{given} positional {} given", plural(given)),
        Positional::None => {
            format!("no positional arguments accepted, but {given} given")
        }
        Positional::Bounds { min, max } if min == max => format!(
            "exactly {min} positional {} required, but {given} given",
            plural(min)
        ),
        Positional::Bounds { min, max: 0 } => format!(
            "at least {min} positional {} required, but {given} given",
            plural(min)
        ),
        Positional::Bounds { min: 0, max } => format!(
            "at most {max} positional {} accepted, but {given} given",
            plural(max)
        ),
        Positional::Bounds { min, max } => format!(
            "between {min} and {max} positional arguments accepted, but {given} given"
        ),
    }
}
