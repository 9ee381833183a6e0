use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn make_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before UNIX_EPOCH")
        .as_nanos();
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("clikit-grep-integ-{prefix}-{pid}-{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write test file");
    path
}

/// Runs in `dir` so a stray `.env` elsewhere can't leak in, with the
/// variables this binary reads cleared.
fn grep(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_clikit-grep"));
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("NO_COLOR")
        .stdin(Stdio::null());
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().to_uppercase().starts_with("CLIKIT_GREP_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn help_works() {
    let dir = make_temp_dir("help");
    let out = grep(&dir)
        .arg("-help")
        .output()
        .expect("failed to run clikit-grep -help");
    assert!(
        out.status.success(),
        "clikit-grep -help failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        stderr(&out),
    );
    let text = stdout(&out);
    assert!(
        text.starts_with("Usage:") && text.contains("-only-matching") && text.contains("Exit code:"),
        "unexpected help output:\n{text}"
    );
    assert!(!text.contains('\x1b'), "help to a pipe must not be colored:\n{text}");
}

#[test]
fn finds_matches_in_files() {
    let dir = make_temp_dir("files");
    write_file(&dir, "a.txt", "alpha\nbeta\ngamma\n");
    write_file(&dir, "b.txt", "delta\n");

    let out = grep(&dir)
        .args(["a$", "a.txt", "b.txt"])
        .output()
        .expect("failed to run clikit-grep");
    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));
    assert_eq!(
        stdout(&out),
        "a.txt:1:alpha\na.txt:2:beta\na.txt:3:gamma\nb.txt:1:delta\n"
    );
}

#[test]
fn no_match_exits_one() {
    let dir = make_temp_dir("nomatch");
    write_file(&dir, "a.txt", "alpha\n");

    let out = grep(&dir).args(["zzz", "a.txt"]).output().expect("run");
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).is_empty());
}

#[test]
fn grouped_flags_and_patterns() {
    let dir = make_temp_dir("grouped");
    write_file(&dir, "a.txt", "Foo bar\nfoo\nnothing\n");

    let out = grep(&dir)
        .args(["-io", "-e", "FOO", "-e=bar", "a.txt"])
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));
    assert_eq!(stdout(&out), "a.txt:1:Foo\na.txt:1:bar\na.txt:2:foo\n");
}

#[test]
fn quiet_prints_nothing() {
    let dir = make_temp_dir("quiet");
    write_file(&dir, "a.txt", "x\n");

    let out = grep(&dir).args(["-silent", "x", "a.txt"]).output().expect("run");
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).is_empty());
}

#[test]
fn max_count_with_and_without_value() {
    let dir = make_temp_dir("maxcount");
    write_file(&dir, "a.txt", "x1\nx2\nx3\n");

    let out = grep(&dir).args(["x", "a.txt", "-m"]).output().expect("run");
    assert_eq!(stdout(&out), "a.txt:1:x1\n");

    let out = grep(&dir).args(["-m2", "x", "a.txt"]).output().expect("run");
    assert_eq!(stdout(&out), "a.txt:1:x1\na.txt:2:x2\n");
}

#[test]
fn reads_stdin() {
    let dir = make_temp_dir("stdin");
    let mut child = grep(&dir)
        .args(["-o", "b+", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn clikit-grep");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(b"abba\ncc\n")
        .expect("failed to write stdin");
    let out = child.wait_with_output().expect("failed to wait");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "(standard input):1:bb\n");
}

#[test]
fn json_output() {
    let dir = make_temp_dir("json");
    write_file(&dir, "a.txt", "one two\n");

    let out = grep(&dir)
        .args(["--json", "t(w)o", "a.txt"])
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr(&out));
    let value: serde_json::Value =
        serde_json::from_str(stdout(&out).trim()).expect("output is one JSON object");
    assert_eq!(value["path"], "a.txt");
    assert_eq!(value["line"], 1);
    assert_eq!(value["matches"][0]["text"], "two");
}

#[test]
fn color_always_highlights() {
    let dir = make_temp_dir("color");
    write_file(&dir, "a.txt", "xay\n");

    let out = grep(&dir)
        .args(["-colour=always", "a", "a.txt"])
        .output()
        .expect("run");
    assert_eq!(stdout(&out), "a.txt:\x1b[35m1\x1b[0m:x\x1b[31ma\x1b[0my\n");
}

#[test]
fn environment_and_dotenv_supply_defaults() {
    let dir = make_temp_dir("env");
    write_file(&dir, "a.txt", "Hello\nhello\n");

    let out = grep(&dir)
        .env("CLIKIT_GREP_IGNORE_CASE", "true")
        .args(["hello", "a.txt"])
        .output()
        .expect("run");
    assert_eq!(stdout(&out), "a.txt:1:Hello\na.txt:2:hello\n");

    write_file(&dir, ".env", "CLIKIT_GREP_MAX_COUNT=1\n");
    let out = grep(&dir).args(["-i", "hello", "a.txt"]).output().expect("run");
    assert_eq!(stdout(&out), "a.txt:1:Hello\n");
}

#[test]
fn unknown_environment_variable_is_a_warning() {
    let dir = make_temp_dir("envwarn");
    write_file(&dir, "a.txt", "x\n");

    let out = grep(&dir)
        .env("CLIKIT_GREP_NOPE", "1")
        .args(["x", "a.txt"])
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(0));
    assert!(
        stderr(&out).contains("CLIKIT_GREP_NOPE"),
        "expected a warning:\n{}",
        stderr(&out)
    );
}

#[test]
fn usage_errors_exit_two() {
    let dir = make_temp_dir("errors");

    let out = grep(&dir).arg("-x").output().expect("run");
    assert_eq!(out.status.code(), Some(2));
    let err = stderr(&out);
    assert!(err.contains("Usage:") && err.contains(r#"unknown flag: "-x""#), "{err}");

    let out = grep(&dir).output().expect("run");
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("need a pattern"));

    let out = grep(&dir).args(["x", "missing.txt"]).output().expect("run");
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("missing.txt: cannot open"));

    let out = grep(&dir).args(["(", "-"]).output().expect("run");
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("invalid pattern"));
}

#[test]
fn logging_covers_environment_flags() {
    let dir = make_temp_dir("logging");
    write_file(&dir, "a.txt", "x\n");

    let out = grep(&dir)
        .env("RUST_LOG", "debug")
        .env("CLIKIT_GREP_IGNORE_CASE", "1")
        .args(["x", "a.txt"])
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(0));
    let err = stderr(&out);
    assert!(err.contains("flag set from environment"), "{err}");

    let out = grep(&dir).args(["-d", "x", "a.txt"]).output().expect("run");
    let err = stderr(&out);
    assert!(err.contains("compiled pattern"), "{err}");
    assert!(!err.contains("flag set from environment"), "{err}");
}
