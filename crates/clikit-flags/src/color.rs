//! Terminal attributes for usage highlighting.

use std::ops::BitOr;

/// A set of terminal attributes and an optional 16-color foreground.
///
/// Attributes occupy the low bits; the foreground color (plus one, so zero
/// means "none") is stored from bit 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Attr(u64);

const FG_OFFSET: u32 = 16;
const FG_MASK: u64 = 0xff << FG_OFFSET;

impl Attr {
    pub const RESET: Attr = Attr(0);
    pub const BOLD: Attr = Attr(1);
    pub const DIM: Attr = Attr(1 << 1);
    pub const ITALIC: Attr = Attr(1 << 2);
    pub const UNDERLINE: Attr = Attr(1 << 3);
    pub const REVERSE: Attr = Attr(1 << 6);
    pub const STRIKE_OUT: Attr = Attr(1 << 8);

    pub const BLACK: Attr = Attr::fg(0);
    pub const RED: Attr = Attr::fg(1);
    pub const GREEN: Attr = Attr::fg(2);
    pub const YELLOW: Attr = Attr::fg(3);
    pub const BLUE: Attr = Attr::fg(4);
    pub const MAGENTA: Attr = Attr::fg(5);
    pub const CYAN: Attr = Attr::fg(6);
    pub const WHITE: Attr = Attr::fg(7);

    const fn fg(n: u64) -> Attr {
        Attr((n + 1) << FG_OFFSET)
    }

    pub fn is_reset(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Attr) -> bool {
        let attrs = other.0 & !FG_MASK;
        let fg = other.0 & FG_MASK;
        self.0 & attrs == attrs && (fg == 0 || self.0 & FG_MASK == fg)
    }

    /// SGR parameters for this set, e.g. `"1;31"`. Empty for [`Attr::RESET`].
    pub fn sgr(self) -> String {
        const ATTRS: [(Attr, &str); 6] = [
            (Attr::BOLD, "1"),
            (Attr::DIM, "2"),
            (Attr::ITALIC, "3"),
            (Attr::UNDERLINE, "4"),
            (Attr::REVERSE, "7"),
            (Attr::STRIKE_OUT, "9"),
        ];

        let mut out = String::new();
        for (attr, code) in ATTRS {
            if self.contains(attr) {
                push_param(&mut out, code);
            }
        }
        let fg = (self.0 & FG_MASK) >> FG_OFFSET;
        if fg > 0 {
            push_param(&mut out, &(29 + fg).to_string());
        }
        out
    }
}

fn push_param(out: &mut String, code: &str) {
    if !out.is_empty() {
        out.push(';');
    }
    out.push_str(code);
}

impl BitOr for Attr {
    type Output = Attr;

    fn bitor(self, rhs: Attr) -> Attr {
        // Only one foreground; the right-hand side wins.
        if rhs.0 & FG_MASK != 0 {
            Attr((self.0 & !FG_MASK) | rhs.0)
        } else {
            Attr(self.0 | rhs.0)
        }
    }
}

/// Applies attributes to a piece of text.
pub trait Colorize {
    fn colorize(&self, text: &str, attr: Attr) -> String;
}

/// Leaves text untouched; for pipes, files and `NO_COLOR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Colorize for Plain {
    fn colorize(&self, text: &str, _attr: Attr) -> String {
        text.to_string()
    }
}

/// ANSI escape sequences; every colored span ends with a reset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ansi;

impl Colorize for Ansi {
    fn colorize(&self, text: &str, attr: Attr) -> String {
        if attr.is_reset() {
            return text.to_string();
        }
        format!("\x1b[{}m{text}\x1b[0m", attr.sgr())
    }
}
