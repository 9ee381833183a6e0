use tracing::debug;

use crate::error::{FlagError, FlagResult};
use crate::flags::FlagSet;
use crate::literal;
use crate::value::FlagValue;

impl FlagSet {
    /// Bind `PREFIX_NAME` variables to their flags.
    ///
    /// Runs before the command line pass, so anything given there wins.
    /// Variables that match no flag are collected into a single
    /// [`FlagError::UnknownEnv`], which is returned only after every other
    /// variable was applied.
    pub(crate) fn apply_env(&mut self, prefix: &str, vars: Vec<(String, String)>) -> FlagResult<()> {
        let prefix = normalize_prefix(prefix);
        let mut unknown = Vec::new();

        for (key, raw) in vars {
            let upper = key.to_uppercase().replace('-', "_");
            let Some(name) = upper.strip_prefix(&prefix) else {
                continue;
            };
            // Single letters are too easy to set by accident.
            if name.chars().count() < 2 {
                continue;
            }

            let Some(idx) = self.lookup_long(name) else {
                debug!(key = %key, "environment variable matches no flag");
                unknown.push(key);
                continue;
            };

            self.bind_env(idx, &raw).map_err(|source| FlagError::Env {
                key: key.clone(),
                source: Box::new(source),
            })?;
            debug!(key = %key, flag = self.flags[idx].canonical(), "flag set from environment");
        }

        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort();
        Err(FlagError::UnknownEnv {
            prefix,
            vars: unknown,
        })
    }

    fn bind_env(&mut self, idx: usize, raw: &str) -> FlagResult<()> {
        let def = &mut self.flags[idx];
        let flag = format!("-{}", def.canonical());
        let invalid = |source| FlagError::Invalid {
            flag: flag.clone(),
            source,
            kind: "number",
        };

        let value = match &def.value {
            FlagValue::Bool(_) => FlagValue::Bool(literal::parse_bool(raw).ok_or_else(|| {
                FlagError::InvalidBool {
                    flag: flag.clone(),
                    value: raw.to_string(),
                }
            })?),
            FlagValue::String(_) => FlagValue::String(raw.to_string()),
            FlagValue::Int(_) => FlagValue::Int(literal::parse_isize(raw).map_err(invalid)?),
            FlagValue::Int32(_) => FlagValue::Int32(literal::parse_i32(raw).map_err(invalid)?),
            FlagValue::Int64(_) => FlagValue::Int64(literal::parse_int(raw).map_err(invalid)?),
            FlagValue::Float64(_) => {
                FlagValue::Float64(literal::parse_float(raw).map_err(invalid)?)
            }
            // Either a count or a boolean switch: `PREFIX_VERBOSE=1`, `=true`, `=3`.
            FlagValue::IntCounter(_) => FlagValue::IntCounter(match literal::parse_bool(raw) {
                Some(on) => isize::from(on),
                None => literal::parse_isize(raw).map_err(invalid)?,
            }),
            FlagValue::StringList(_) => {
                FlagValue::StringList(raw.split(',').map(str::to_string).collect())
            }
            FlagValue::IntList(_) => FlagValue::IntList(
                raw.split(',')
                    .map(literal::parse_isize)
                    .collect::<Result<_, _>>()
                    .map_err(invalid)?,
            ),
        };

        def.value = value;
        def.set = true;
        def.from_env = true;
        Ok(())
    }
}

/// `"my-app"` becomes `"MY_APP_"`; an empty prefix stays empty.
fn normalize_prefix(prefix: &str) -> String {
    let mut prefix = prefix.to_uppercase().replace('-', "_");
    while prefix.ends_with('_') {
        prefix.pop();
    }
    if !prefix.is_empty() {
        prefix.push('_');
    }
    prefix
}
