use crate::error::{FlagError, FlagResult};
use crate::flags::FlagSet;
use crate::literal;
use crate::value::FlagValue;

/// Bounds on the number of positional arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Positional {
    /// No limit (the default).
    #[default]
    Any,
    /// No positional arguments at all.
    None,
    /// `min` and `max` of zero mean "no lower bound" and "no upper bound".
    Bounds { min: usize, max: usize },
}

impl Positional {
    fn rejects(self, given: usize) -> bool {
        match self {
            Self::Any => false,
            Self::None => given > 0,
            Self::Bounds { min, max } => (min > 0 && given < min) || (max > 0 && given > max),
        }
    }
}

/// Options for [`FlagSet::parse_with`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    allow_unknown: bool,
    allow_multiple: bool,
    positional: Positional,
    env_prefix: Option<String>,
    env: Option<Vec<(String, String)>>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown flags become positional arguments instead of an error.
    ///
    /// Useful for parsing global flags first and command flags later:
    ///
    /// ```
    /// # use clikit_flags::{FlagSet, ParseOptions};
    /// let mut f = FlagSet::new(["prog", "-global", "serve", "-port=8080"]);
    /// let global = f.bool(false, "global");
    /// f.parse_with(ParseOptions::new().allow_unknown()).unwrap();
    ///
    /// assert_eq!(f.shift_command(&["serve", "status"]).unwrap(), "serve");
    /// let port = f.int(80, "port");
    /// f.parse().unwrap();
    /// assert!(global.value(&f));
    /// assert_eq!(port.value(&f), 8080);
    /// ```
    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    /// Giving a single-value flag more than once is not an error; the last
    /// value wins.
    pub fn allow_multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    /// Require between `min` and `max` positional arguments.
    ///
    /// | call | meaning |
    /// |---|---|
    /// | `positional(0, 0)` | no limit (the default) |
    /// | `positional(1, 0)` | at least one |
    /// | `positional(1, 1)` | exactly one |
    /// | `positional(0, 3)` | up to three |
    pub fn positional(mut self, min: usize, max: usize) -> Self {
        self.positional = if min == 0 && max == 0 {
            Positional::Any
        } else {
            Positional::Bounds { min, max }
        };
        self
    }

    /// Reject any positional argument.
    pub fn no_positional(mut self) -> Self {
        self.positional = Positional::None;
        self
    }

    /// Read defaults from `PREFIX_NAME` environment variables.
    ///
    /// Flags with names of at least two letters can be set this way; dashes
    /// in names become underscores, so `-no-color` is `PREFIX_NO_COLOR`.
    /// Values from the environment are overridden by the command line.
    ///
    /// Variables starting with the prefix that match no flag produce a
    /// [`FlagError::UnknownEnv`] after everything else is parsed.
    pub fn from_env(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Use these variables instead of the process environment.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

/// Where a flag's value came from, if anywhere.
enum Operand<'a> {
    Inline(&'a str),
    Next(&'a str),
    Absent,
}

impl FlagSet {
    /// Parse [`FlagSet::args`] with the default options.
    pub fn parse(&mut self) -> FlagResult<()> {
        self.parse_with(ParseOptions::default())
    }

    /// Parse [`FlagSet::args`], binding flag values and leaving only the
    /// positional arguments behind.
    ///
    /// This can be called more than once; every call works on the arguments
    /// as they are at that point.
    pub fn parse_with(&mut self, options: ParseOptions) -> FlagResult<()> {
        let mut soft_error = None;
        if let Some(prefix) = &options.env_prefix {
            let vars = match &options.env {
                Some(vars) => vars.clone(),
                None => std::env::vars_os()
                    .map(|(k, v)| {
                        (
                            k.to_string_lossy().into_owned(),
                            v.to_string_lossy().into_owned(),
                        )
                    })
                    .collect(),
            };
            match self.apply_env(prefix, vars) {
                Ok(()) => {}
                Err(err) if err.is_soft() => soft_error = Some(err),
                Err(err) => return Err(err),
            }
        }

        let args = std::mem::take(&mut self.args);
        self.args = self.expand_groups(args);
        tracing::trace!(args = ?self.args, "expanded flag groups");

        let positionals = self.consume(&options)?;
        if options.positional.rejects(positionals.len()) {
            return Err(FlagError::Positional {
                bounds: options.positional,
                given: positionals.len(),
            });
        }
        self.args = positionals;

        match soft_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Rewrite grouped single-letter flags: `-ab` becomes `-a -b`, and
    /// `-bw8` becomes `-b -w=8` when `-w` takes a value. Tokens from `--` on
    /// are left alone.
    fn expand_groups(&self, args: Vec<String>) -> Vec<String> {
        let mut out = Vec::with_capacity(args.len());
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--" {
                out.push(arg);
                out.extend(args);
                break;
            }
            if !arg.starts_with('-')
                || arg == "-"
                || arg.starts_with("--")
                || self.lookup(&arg).is_some()
            {
                out.push(arg);
                continue;
            }
            match self.split_group(&arg) {
                Some(tokens) => out.extend(tokens),
                // "-arg -42"; unknown flags are rejected later.
                None => out.push(arg),
            }
        }
        out
    }

    fn split_group(&self, arg: &str) -> Option<Vec<String>> {
        let letters = &arg[1..];
        let mut tokens = Vec::new();
        for (pos, c) in letters.char_indices() {
            let mut buf = [0u8; 4];
            let idx = self.lookup(c.encode_utf8(&mut buf))?;
            tokens.push(format!("-{c}"));

            // Everything after a letter that takes a value is that value,
            // as in `cut -f1` or `cut -wf1`.
            if self.flags[idx].value.takes_value() {
                let rest = &letters[pos + c.len_utf8()..];
                if !rest.is_empty() {
                    let rest = rest.strip_prefix('=').unwrap_or(rest);
                    if let Some(last) = tokens.last_mut() {
                        last.push('=');
                        last.push_str(rest);
                    }
                }
                break;
            }
        }
        Some(tokens)
    }

    /// Single left-to-right pass over the (expanded) arguments; returns the
    /// positional arguments.
    fn consume(&mut self, options: &ParseOptions) -> FlagResult<Vec<String>> {
        let args = self.args.clone();
        let mut positionals = Vec::new();
        let mut seen = vec![false; self.flags.len()];

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            i += 1;

            if arg.is_empty() || arg == "-" || !arg.starts_with('-') {
                positionals.push(arg.to_string());
                continue;
            }
            if arg == "--" {
                positionals.extend(args[i..].iter().cloned());
                break;
            }

            let Some(idx) = self.lookup(arg) else {
                if options.allow_unknown {
                    positionals.push(arg.to_string());
                    continue;
                }
                return Err(FlagError::Unknown {
                    flag: arg.to_string(),
                });
            };

            let def = &self.flags[idx];
            if seen[idx] && !options.allow_multiple && !def.value.repeatable() {
                return Err(FlagError::Duplicate {
                    flag: arg.to_string(),
                });
            }
            seen[idx] = true;

            let value = if def.value.takes_value() {
                match operand(&args, i - 1) {
                    Operand::Inline(v) => Some(v),
                    Operand::Next(v) => {
                        i += 1;
                        Some(v)
                    }
                    Operand::Absent if def.optional => None,
                    Operand::Absent => {
                        return Err(FlagError::NeedsArgument {
                            flag: arg.to_string(),
                        });
                    }
                }
            } else {
                None
            };

            self.bind(idx, arg, value)?;
        }

        Ok(positionals)
    }

    /// Store one command line occurrence of a flag.
    fn bind(&mut self, idx: usize, token: &str, value: Option<&str>) -> FlagResult<()> {
        let invalid = |source| FlagError::Invalid {
            flag: token.to_string(),
            source,
            kind: "number",
        };

        let def = &mut self.flags[idx];
        // Lists start over on their first command line value, dropping
        // defaults and anything taken from the environment.
        let fresh = !def.set || def.from_env;

        match &mut def.value {
            // Any inline value is ignored: `-b=false` still sets `-b`.
            FlagValue::Bool(v) => *v = true,
            FlagValue::String(v) => {
                if let Some(raw) = value {
                    *v = raw.to_string();
                }
            }
            FlagValue::Int(v) => {
                if let Some(raw) = value {
                    *v = literal::parse_isize(raw).map_err(invalid)?;
                }
            }
            FlagValue::Int32(v) => {
                if let Some(raw) = value {
                    *v = literal::parse_i32(raw).map_err(invalid)?;
                }
            }
            FlagValue::Int64(v) => {
                if let Some(raw) = value {
                    *v = literal::parse_int(raw).map_err(invalid)?;
                }
            }
            FlagValue::Float64(v) => {
                if let Some(raw) = value {
                    *v = literal::parse_float(raw).map_err(invalid)?;
                }
            }
            FlagValue::IntCounter(n) => {
                if def.from_env {
                    *n = 0;
                }
                *n = n.saturating_add(1);
            }
            FlagValue::StringList(list) => {
                if let Some(raw) = value {
                    if fresh {
                        list.clear();
                    }
                    list.push(raw.to_string());
                }
            }
            FlagValue::IntList(list) => {
                if let Some(raw) = value {
                    let n = literal::parse_isize(raw).map_err(invalid)?;
                    if fresh {
                        list.clear();
                    }
                    list.push(n);
                }
            }
        }

        def.set = true;
        def.from_env = false;
        Ok(())
    }
}

/// The value for the flag at `args[i]`: after `=` in the same token, or the
/// next token unless that looks like a flag itself.
fn operand(args: &[String], i: usize) -> Operand<'_> {
    if let Some((_, v)) = args[i].split_once('=') {
        return Operand::Inline(v);
    }
    match args.get(i + 1) {
        Some(next) if next.len() > 1 && next.starts_with('-') => Operand::Absent,
        Some(next) => Operand::Next(next),
        None => Operand::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(args: &[&str]) -> FlagSet {
        FlagSet::new(std::iter::once("prog").chain(args.iter().copied()))
    }

    #[test]
    fn groups_split_into_single_letters() {
        let mut f = flags(&[]);
        f.bool(false, "a");
        f.bool(false, "b");
        f.int(0, "w");
        let expanded = f.expand_groups(vec!["-ab".into(), "-bw8".into(), "-w".into()]);
        assert_eq!(expanded, ["-a", "-b", "-b", "-w=8", "-w"]);
    }

    #[test]
    fn group_with_value_letter_last_leaves_value_for_next_token() {
        let mut f = flags(&[]);
        f.bool(false, "b");
        f.string("", "o");
        let expanded = f.expand_groups(vec!["-bo".into(), "out.txt".into()]);
        assert_eq!(expanded, ["-b", "-o", "out.txt"]);
    }

    #[test]
    fn fused_value_keeps_leading_dash() {
        let mut f = flags(&[]);
        f.int(0, "w");
        assert_eq!(f.expand_groups(vec!["-w-5".into()]), ["-w=-5"]);
        assert_eq!(f.expand_groups(vec!["-w=5".into()]), ["-w=5"]);
    }

    #[test]
    fn failed_group_is_kept_whole() {
        let mut f = flags(&[]);
        f.bool(false, "a");
        let expanded = f.expand_groups(vec!["-ax".into(), "--aa".into(), "-".into(), "x".into()]);
        assert_eq!(expanded, ["-ax", "--aa", "-", "x"]);
    }

    #[test]
    fn operand_sources() {
        let args: Vec<String> = ["-s=a", "-s", "b", "-s", "-x", "-s", "-", "-s"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(matches!(operand(&args, 0), Operand::Inline("a")));
        assert!(matches!(operand(&args, 1), Operand::Next("b")));
        assert!(matches!(operand(&args, 3), Operand::Absent));
        assert!(matches!(operand(&args, 5), Operand::Next("-")));
        assert!(matches!(operand(&args, 7), Operand::Absent));
    }

    #[test]
    fn positional_bounds() {
        assert!(!Positional::Any.rejects(100));
        assert!(Positional::None.rejects(1));
        assert!(!Positional::None.rejects(0));
        assert!(Positional::Bounds { min: 1, max: 1 }.rejects(2));
        assert!(Positional::Bounds { min: 3, max: 0 }.rejects(2));
        assert!(!Positional::Bounds { min: 3, max: 0 }.rejects(30));
        assert!(!Positional::Bounds { min: 0, max: 2 }.rejects(0));
    }

    #[test]
    fn options_positional_zero_zero_is_unbounded() {
        assert_eq!(ParseOptions::new().positional(0, 0).positional, Positional::Any);
        assert_eq!(
            ParseOptions::new().positional(1, 0).positional,
            Positional::Bounds { min: 1, max: 0 }
        );
    }
}
