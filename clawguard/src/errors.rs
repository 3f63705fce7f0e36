//! User-facing error display for the CLI subcommands.
//!
//! The `check` hook path never reaches this: its failures are coerced into
//! deny decisions instead. Everything here goes to stderr.

use std::io::IsTerminal;

/// Print `err` and its causal chain to stderr.
pub fn display_error(err: &anyhow::Error, verbose: bool) {
    eprint!("{}", render(err, verbose, use_color()));
}

/// Rendered form:
///   error: top-level message
///     caused by (1): next cause
///     caused by (2): root cause
/// followed by either a pointer at `--verbose` or, when verbose, the full
/// Debug chain.
fn render(err: &anyhow::Error, verbose: bool, color: bool) -> String {
    use std::fmt::Write;

    let (bold_red, dim, reset) = if color {
        ("\x1b[1;31m", "\x1b[2m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    let mut out = String::new();
    let _ = writeln!(out, "{bold_red}error{reset}: {err}");

    let causes: Vec<_> = err.chain().skip(1).collect();
    for (i, cause) in causes.iter().enumerate() {
        let _ = writeln!(out, "  {dim}caused by ({}): {cause}{reset}", i + 1);
    }

    if verbose {
        let _ = writeln!(out, "\nFull error chain:\n{err:?}");
    } else if !causes.is_empty() {
        let _ = writeln!(out, "\n  run with --verbose for full details");
    }
    out
}

fn use_color() -> bool {
    std::env::var("NO_COLOR").is_err() && std::io::stderr().is_terminal()
}
