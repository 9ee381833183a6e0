use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clikit_flags::{Attr, Colorize};
use regex::Regex;
use serde::Serialize;

const MATCH: Attr = Attr::RED;
const LINE_NR: Attr = Attr::MAGENTA;

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub only_matching: bool,
    pub quiet: bool,
    pub json: bool,
    /// Stop reading an input after this many matching lines.
    pub max_count: Option<usize>,
    /// Print the path once above its matches instead of before every line.
    pub heading: bool,
}

/// One matching line in `-json` output.
#[derive(Debug, Serialize)]
struct LineMatch<'a> {
    path: &'a str,
    line: u64,
    text: &'a str,
    matches: Vec<Submatch<'a>>,
}

#[derive(Debug, Serialize)]
struct Submatch<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

pub struct Searcher<'a> {
    re: &'a Regex,
    opts: &'a Options,
    color: &'a dyn Colorize,
}

impl<'a> Searcher<'a> {
    pub fn new(re: &'a Regex, opts: &'a Options, color: &'a dyn Colorize) -> Self {
        Self { re, opts, color }
    }

    /// Search one input and return the number of matching lines.
    ///
    /// In quiet mode this returns after the first match without writing
    /// anything.
    pub fn search(&self, path: &str, reader: impl BufRead, out: &mut dyn Write) -> Result<usize> {
        let mut matched = 0;
        let mut shown_path = false;

        for (i, raw) in reader.split(b'\n').enumerate() {
            if self.opts.max_count.is_some_and(|max| matched >= max) {
                break;
            }

            let raw = raw.with_context(|| format!("{path}: read failed"))?;
            let decoded = String::from_utf8_lossy(&raw);
            let line = decoded.strip_suffix('\r').unwrap_or(&decoded);

            let spans: Vec<(usize, usize)> = self
                .re
                .find_iter(line)
                .map(|m| (m.start(), m.end()))
                .collect();
            if spans.is_empty() {
                continue;
            }
            matched += 1;
            if self.opts.quiet {
                return Ok(matched);
            }

            let line_nr = i as u64 + 1;
            if self.opts.json {
                self.write_json(out, path, line_nr, line, &spans)?;
            } else {
                self.write_text(out, path, line_nr, line, &spans, &mut shown_path)?;
            }
        }

        Ok(matched)
    }

    fn write_text(
        &self,
        out: &mut dyn Write,
        path: &str,
        line_nr: u64,
        line: &str,
        spans: &[(usize, usize)],
        shown_path: &mut bool,
    ) -> Result<()> {
        let bodies: Vec<String> = if self.opts.only_matching {
            spans
                .iter()
                .map(|&(start, end)| self.color.colorize(&line[start..end], MATCH))
                .collect()
        } else {
            vec![self.highlight(line, spans)]
        };

        if self.opts.heading && !*shown_path {
            let heading = self.color.colorize(path, Attr::BOLD | Attr::UNDERLINE);
            writeln!(out, "{heading}")?;
            *shown_path = true;
        }

        let nr = self.color.colorize(&line_nr.to_string(), LINE_NR);
        for body in bodies {
            if !self.opts.heading {
                write!(out, "{path}:")?;
            }
            writeln!(out, "{nr}:{body}")?;
        }
        Ok(())
    }

    fn highlight(&self, line: &str, spans: &[(usize, usize)]) -> String {
        let mut out = String::with_capacity(line.len());
        let mut last = 0;
        for &(start, end) in spans {
            out.push_str(&line[last..start]);
            out.push_str(&self.color.colorize(&line[start..end], MATCH));
            last = end;
        }
        out.push_str(&line[last..]);
        out
    }

    fn write_json(
        &self,
        out: &mut dyn Write,
        path: &str,
        line_nr: u64,
        line: &str,
        spans: &[(usize, usize)],
    ) -> Result<()> {
        let record = LineMatch {
            path,
            line: line_nr,
            text: line,
            matches: spans
                .iter()
                .map(|&(start, end)| Submatch {
                    start,
                    end,
                    text: &line[start..end],
                })
                .collect(),
        };
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
        Ok(())
    }
}
