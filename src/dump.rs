use crate::config::{COPY_TERMINATOR, NULL_SENTINEL};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Header line opening a COPY block. The column list is matched but never
/// parsed; field identification is positional per table.
static COPY_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^COPY\s+(?:[A-Za-z_][A-Za-z0-9_$]*\.)?([A-Za-z_][A-Za-z0-9_$]*)\s*\([^)]*\)\s+FROM\s+stdin;\s*$")
        .unwrap()
});

/// Collapses `\r\n` and bare `\r` to `\n` so block matching sees one
/// line-ending convention.
pub fn normalize_line_endings(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}

/// Returns the data lines of `table`'s COPY block, in dump order.
///
/// The scan is forward-only: the first header naming `table` opens the
/// block and the first terminator after it closes the block. Blank lines
/// and `--` comments inside the block are discarded. A missing block is
/// a warning, not an error; the caller proceeds with zero rows.
pub fn extract_table_block<'a>(dump: &'a str, table: &str) -> Vec<&'a str> {
    let mut lines = dump.lines();

    let mut in_block = false;
    for line in lines.by_ref() {
        if let Some(caps) = COPY_HEADER_REGEX.captures(line) {
            if &caps[1] == table {
                in_block = true;
                break;
            }
        }
    }

    if !in_block {
        warn!(table = table, "No COPY block found for table");
        return Vec::new();
    }

    let mut rows = Vec::new();
    let mut terminated = false;
    for line in lines {
        let line = line.trim();
        if line == COPY_TERMINATOR {
            terminated = true;
            break;
        }
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        rows.push(line);
    }

    if !terminated {
        warn!(table = table, "COPY block has no terminator, read to EOF");
    }

    debug!(table = table, rows = rows.len(), "Extracted COPY block");
    rows
}

/// Splits one data line into its positional fields. Tab is the sole
/// separator; there is no quoting or escaping beyond the `\N` sentinel.
pub fn decode_row(line: &str) -> Vec<&str> {
    line.split('\t').collect()
}

pub fn is_null(field: &str) -> bool {
    field == NULL_SENTINEL
}

/// Treats the null sentinel and the empty string as absent.
pub fn non_empty(field: &str) -> Option<&str> {
    if field.is_empty() || is_null(field) {
        None
    } else {
        Some(field)
    }
}

/// Single-character boolean-like token from the dump: `t` is true,
/// anything else is false.
pub fn parse_bool_token(token: &str) -> bool {
    token == "t"
}
