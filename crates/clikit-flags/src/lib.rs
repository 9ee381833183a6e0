//! Flag parsing for command-line programs.
//!
//! Register flags on a [`FlagSet`], parse, and read the values back through
//! the returned handles:
//!
//! ```
//! use clikit_flags::FlagSet;
//!
//! let mut f = FlagSet::new(["example", "-vv", "-f=csv", "-a", "xx", "yy"]);
//! let verbose = f.int_counter(0, "v");
//! let all = f.bool(false, "a");
//! let format = f.string("", "f");
//! f.parse().unwrap();
//!
//! assert_eq!(verbose.value(&f), 2);
//! assert!(all.value(&f));
//! assert_eq!(format.get(&f), "csv");
//! assert_eq!(f.args(), ["xx", "yy"]);
//! ```
//!
//! Single-letter flags group (`-vv`, `-ab`), long flags take one or two
//! dashes, and [`ParseOptions::from_env`] lets environment variables supply
//! defaults. [`FlagSet::shift_command`] picks a subcommand from the
//! remaining arguments, and [`Usage`] highlights a help text.

mod color;
mod command;
mod env;
mod error;
mod flags;
mod literal;
mod parse;
mod usage;
mod value;

pub use color::{Ansi, Attr, Colorize, Plain};
pub use error::{FlagError, FlagResult, NumberError};
pub use flags::{FlagNames, FlagSet};
pub use parse::{ParseOptions, Positional};
pub use usage::{Usage, UsageOptions};
pub use value::{Flag, FlagValue, Kind, kind};
