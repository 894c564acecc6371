use std::sync::LazyLock;

use regex::Regex;

use crate::record::ParsedEntry;

/// Prefix every zsh extended-history entry starts with.
pub const ENTRY_PREFIX: &str = ": ";

#[allow(clippy::expect_used)]
static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^: ([0-9]+):([0-9]+);(.*)").expect("valid entry pattern"));

/// Whether a (trimmed) line looks like the start of a history entry.
///
/// Continuation lines of multi-line commands and blank lines return `false`
/// and are dropped without a warning.
pub fn is_entry_line(line: &str) -> bool {
    line.starts_with(ENTRY_PREFIX)
}

/// Parse one `": <epoch>:<exit code>;<command>"` line.
///
/// The command is everything after the first `;`, verbatim. Returns `None`
/// when the line does not have that shape or a numeric field does not fit.
pub fn parse_line(line: &str) -> Option<ParsedEntry> {
    let caps = ENTRY_RE.captures(line)?;
    let epoch_time = caps[1].parse::<i64>().ok()?;
    let exit_code = caps[2].parse::<i32>().ok()?;
    let command = caps[3].to_string();
    tracing::debug!(epoch_time, exit_code, command = %command, "parsed history line");
    Some(ParsedEntry {
        epoch_time,
        exit_code,
        command,
    })
}
