mod search;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, IsTerminal, Write};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clikit_flags::{
    Ansi, Colorize, Flag, FlagSet, ParseOptions, Plain, Usage, UsageOptions, kind,
};
use regex::RegexBuilder;
use tracing::{debug, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use crate::search::{Options, Searcher};

const ENV_PREFIX: &str = "CLIKIT_GREP";

type LogFilter = reload::Handle<EnvFilter, Registry>;

const USAGE: &str = "
Usage:
    clikit-grep [options..] pattern [file..]
    clikit-grep [options..] -e pattern [-e pattern..] [file..]

Description:
    clikit-grep searches for a regular expression in each file.

Options:
    pattern
        A regular expression.

    file [file..]
        Zero or more files; stdin is read if none are given, or for -.

    -e, -regexp=pattern
        Search for this pattern; can be given more than once.

    -i, -ignore-case
        Match without regard to case.

    -o, -only-matching
        Print only the matching parts, each on its own line.

    -q, -quiet, -silent
        Don't show any output, exit with 0 on the first match found.

    -m, -max-count[=n]
        Stop reading a file after n matching lines (1 if n is omitted).

    -json
        Print one JSON object for every matching line.

    -color=when, -colour=when
        When to display colors: auto (default), never, or always.

    -d, -debug
        Log to stderr; repeat for more detail.

    -h, -help
        Show this help.

Environment:
    Flags can also be set as CLIKIT_GREP_<FLAG>, for example
    CLIKIT_GREP_IGNORE_CASE=1 or CLIKIT_GREP_COLOR=never. A .env file in
    the working directory is read first. RUST_LOG takes precedence over
    -debug and also covers flag parsing.

Exit code:
    0 if a pattern is found, 1 if nothing is found, 2 if there was an error.
";

struct Flags {
    only_matching: Flag<kind::Bool>,
    quiet: Flag<kind::Bool>,
    ignore_case: Flag<kind::Bool>,
    json: Flag<kind::Bool>,
    help: Flag<kind::Bool>,
    color: Flag<kind::Str>,
    max_count: Flag<kind::Int>,
    patterns: Flag<kind::StringList>,
    debug: Flag<kind::IntCounter>,
}

impl Flags {
    fn register(f: &mut FlagSet) -> Self {
        Self {
            only_matching: f.bool(false, ["o", "only-matching"]),
            quiet: f.bool(false, ["q", "quiet", "silent"]),
            ignore_case: f.bool(false, ["i", "ignore-case"]),
            json: f.bool(false, "json"),
            help: f.bool(false, ["h", "help"]),
            color: f.string("auto", ["color", "colour"]),
            max_count: f.optional().int(1, ["m", "max-count"]),
            patterns: f.string_list(Vec::new(), ["e", "regexp"]),
            debug: f.int_counter(0, ["d", "debug"]),
        }
    }
}

fn main() -> ExitCode {
    let log_filter = init_tracing();
    let dotenv = dotenvy::dotenv();

    let mut f = FlagSet::from_env_args();
    let flags = Flags::register(&mut f);
    let parsed = f.parse_with(ParseOptions::new().from_env(ENV_PREFIX));

    raise_log_level(&log_filter, flags.debug.value(&f));
    match &dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!("ignoring .env: {err}"),
    }

    match parsed {
        Ok(()) => {}
        Err(err) if err.is_soft() => warn!("{err}"),
        Err(err) => {
            let color =
                colorizer(flags.color.get(&f), io::stderr().is_terminal()).unwrap_or(&Plain);
            eprint!("{}", usage(color));
            eprintln!("\n{}: {err}", f.program());
            return ExitCode::from(2);
        }
    }

    match run(&mut f, &flags) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}: {err:#}", f.program());
            ExitCode::from(2)
        }
    }
}

fn run(f: &mut FlagSet, flags: &Flags) -> Result<ExitCode> {
    let stdout = io::stdout();
    let tty = stdout.is_terminal();
    let color = colorizer(flags.color.get(f), tty)?;

    if flags.help.value(f) {
        print!("{}", usage(color));
        return Ok(ExitCode::SUCCESS);
    }

    let mut patterns = flags.patterns.get(f).clone();
    if patterns.is_empty() {
        match f.shift() {
            Some(pattern) => patterns.push(pattern),
            None => {
                let color = colorizer(flags.color.get(f), io::stderr().is_terminal())?;
                eprint!("{}", usage(color));
                bail!("need a pattern");
            }
        }
    }

    let source = match patterns.as_slice() {
        [one] => one.clone(),
        many => many
            .iter()
            .map(|p| format!("(?:{p})"))
            .collect::<Vec<_>>()
            .join("|"),
    };
    let re = RegexBuilder::new(&source)
        .case_insensitive(flags.ignore_case.value(f))
        .build()
        .with_context(|| format!("invalid pattern {source:?}"))?;
    debug!(pattern = %re, "compiled pattern");

    let max_count = if flags.max_count.is_set(f) {
        let n = flags.max_count.value(f);
        Some(usize::try_from(n).map_err(|_| anyhow!("-max-count must not be negative: {n}"))?)
    } else {
        None
    };
    let opts = Options {
        only_matching: flags.only_matching.value(f),
        quiet: flags.quiet.value(f),
        json: flags.json.value(f),
        max_count,
        heading: tty && !flags.json.value(f),
    };

    let paths = if f.args().is_empty() {
        vec!["-".to_string()]
    } else {
        f.args().to_vec()
    };

    let searcher = Searcher::new(&re, &opts, color);
    let mut out = BufWriter::new(stdout.lock());
    let mut matched = false;
    let mut failed = false;
    for path in &paths {
        let result = if path == "-" {
            searcher.search("(standard input)", io::stdin().lock(), &mut out)
        } else {
            File::open(path)
                .with_context(|| format!("{path}: cannot open"))
                .and_then(|file| searcher.search(path, BufReader::new(file), &mut out))
        };

        match result {
            Ok(0) => debug!(path = %path, "no match"),
            Ok(lines) => {
                debug!(path = %path, lines, "matched");
                matched = true;
                if opts.quiet {
                    return Ok(ExitCode::SUCCESS);
                }
            }
            Err(err) => {
                eprintln!("{}: {err:#}", f.program());
                failed = true;
            }
        }
    }
    out.flush().context("failed to write to stdout")?;

    Ok(match (failed, matched) {
        (true, _) => ExitCode::from(2),
        (false, true) => ExitCode::SUCCESS,
        (false, false) => ExitCode::from(1),
    })
}

fn usage(color: &dyn Colorize) -> String {
    Usage::new(UsageOptions::all()).render(USAGE, color)
}

/// Pick a colorizer for `-color` and whether the output is a terminal.
fn colorizer(when: &str, tty: bool) -> Result<&'static dyn Colorize> {
    let enabled = match when {
        "always" => true,
        "never" => false,
        "auto" => tty && std::env::var_os("NO_COLOR").is_none_or(|v| v.is_empty()),
        other => bail!("invalid -color value {other:?}: must be auto, never, or always"),
    };
    let color: &'static dyn Colorize = if enabled { &Ansi } else { &Plain };
    Ok(color)
}

fn init_tracing() -> LogFilter {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(io::stderr)
                .compact(),
        )
        .init();
    handle
}

/// Apply `-debug` once the flags are parsed; `RUST_LOG` wins when set.
fn raise_log_level(handle: &LogFilter, debug: isize) {
    let level = match debug {
        ..=0 => return,
        1 => "debug",
        _ => "trace",
    };
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    if let Err(err) = handle.reload(EnvFilter::new(level)) {
        warn!("cannot change the log level: {err}");
    }
}
