use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::color::{Attr, Colorize};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w[\w -]+:$").expect("static regex must compile"));
static FLAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\B-{1,2}[a-z0-9=-]+\b").expect("static regex must compile"));

/// Which formatting [`Usage`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageOptions {
    /// Remove leading and trailing whitespace and end with one newline.
    pub trim: bool,
    /// Highlight `Header:` lines that start the text or follow a blank line.
    pub headers: bool,
    /// Highlight `-f`, `-flag`, `--flag=foo` and the like.
    pub flags: bool,
}

impl UsageOptions {
    pub fn all() -> Self {
        Self {
            trim: true,
            headers: true,
            flags: true,
        }
    }
}

impl Default for UsageOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Formats a help text for display.
///
/// ```
/// # use clikit_flags::{Ansi, Usage, UsageOptions};
/// let text = Usage::new(UsageOptions::all()).render("\nUsage: prog [-v]\n\n", &Ansi);
/// assert_eq!(text, "Usage: prog [\x1b[4m-v\x1b[0m]\n");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Usage {
    options: UsageOptions,
    header: Attr,
    flag: Attr,
}

impl Usage {
    pub fn new(options: UsageOptions) -> Self {
        Self {
            options,
            header: Attr::BOLD,
            flag: Attr::UNDERLINE,
        }
    }

    pub fn header_attr(mut self, attr: Attr) -> Self {
        self.header = attr;
        self
    }

    pub fn flag_attr(mut self, attr: Attr) -> Self {
        self.flag = attr;
        self
    }

    pub fn render(&self, text: &str, color: &dyn Colorize) -> String {
        let mut text = if self.options.trim {
            format!("{}\n", text.trim())
        } else {
            text.to_string()
        };

        if self.options.headers {
            let lines: Vec<&str> = text.split('\n').collect();
            text = lines
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    if HEADER_RE.is_match(line) && (i == 0 || lines[i - 1].is_empty()) {
                        color.colorize(line, self.header)
                    } else {
                        line.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
        }

        if self.options.flags {
            text = FLAG_RE
                .replace_all(&text, |caps: &Captures<'_>| color.colorize(&caps[0], self.flag))
                .into_owned();
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Ansi, Plain};

    const HELP: &str = "
prog does things.

Usage: prog [flags] file..

Flags:
    -v, --verbose     More output.
    -format=csv       Output format.
";

    #[test]
    fn plain_only_trims() {
        let out = Usage::new(UsageOptions::all()).render(HELP, &Plain);
        assert_eq!(out, format!("{}\n", HELP.trim()));
    }

    #[test]
    fn no_options_is_identity() {
        let opts = UsageOptions {
            trim: false,
            headers: false,
            flags: false,
        };
        assert_eq!(Usage::new(opts).render(HELP, &Ansi), HELP);
    }

    #[test]
    fn headers_need_blank_line_before() {
        let opts = UsageOptions {
            trim: true,
            headers: true,
            flags: false,
        };
        let out = Usage::new(opts).render("Top:\nNot a header:\n\nFlags:\n", &Ansi);
        assert_eq!(
            out,
            "\x1b[1mTop:\x1b[0m\nNot a header:\n\n\x1b[1mFlags:\x1b[0m\n"
        );
    }

    #[test]
    fn flags_are_highlighted() {
        let opts = UsageOptions {
            trim: false,
            headers: false,
            flags: true,
        };
        let usage = Usage::new(opts).flag_attr(Attr::RED);
        assert_eq!(
            usage.render("use -v or --format=csv, not a-b", &Ansi),
            "use \x1b[31m-v\x1b[0m or \x1b[31m--format=csv\x1b[0m, not a-b"
        );
    }
}
