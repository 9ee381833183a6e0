use crate::error::{FlagError, FlagResult};
use crate::flags::FlagSet;

impl FlagSet {
    /// Remove and return the first remaining argument.
    pub fn shift(&mut self) -> Option<String> {
        if self.args.is_empty() {
            return None;
        }
        Some(self.args.remove(0))
    }

    /// Find the first argument that is not a flag and match it against a
    /// list of commands; flags before it are kept in place.
    ///
    /// The match is case-insensitive and any unique prefix works. An entry
    /// `"alias=target"` adds `alias` as another name for `target`. With an
    /// empty list the argument is returned as-is (lowercased).
    ///
    /// ```
    /// # use clikit_flags::FlagSet;
    /// let mut f = FlagSet::new(["prog", "-v", "SERV", "-port=1"]);
    /// let cmd = f.shift_command(&["serve", "status", "up=serve"]).unwrap();
    /// assert_eq!(cmd, "serve");
    /// assert_eq!(f.args(), ["-v", "-port=1"]);
    /// ```
    pub fn shift_command(&mut self, known: &[&str]) -> FlagResult<String> {
        let mut skipped = Vec::new();
        let found = loop {
            match self.shift() {
                Some(arg) if arg.starts_with('-') || arg.contains('=') => skipped.push(arg),
                Some(arg) if !arg.is_empty() => break Some(arg),
                _ => break None,
            }
        };
        skipped.append(&mut self.args);
        self.args = skipped;

        let Some(cmd) = found.map(|c| c.to_lowercase()) else {
            return Err(FlagError::NoCommand);
        };
        if known.is_empty() {
            return Ok(cmd);
        }

        let mut matches: Vec<String> = Vec::new();
        for &entry in known {
            let (name, target) = entry.split_once('=').unwrap_or((entry, entry));
            if name == cmd {
                return Ok(target.to_string());
            }
            if name.starts_with(&cmd) && !matches.iter().any(|m| m == target) {
                matches.push(target.to_string());
            }
        }

        match matches.len() {
            0 => Err(FlagError::UnknownCommand(cmd)),
            1 => Ok(matches.remove(0)),
            _ => Err(FlagError::AmbiguousCommand { cmd, matches }),
        }
    }
}
