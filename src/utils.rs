use std::path::Path;

/// Computes the 1-based line and 0-based column of a byte offset.
pub fn line_and_column(content: &str, byte_offset: usize) -> (usize, usize) {
    let upto = &content[..byte_offset.min(content.len())];
    let line = upto.bytes().filter(|&b| b == b'\n').count() + 1;
    let line_start = upto.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, byte_offset - line_start)
}

/// Returns the full line containing the given byte offset.
pub fn line_at(content: &str, byte_offset: usize) -> &str {
    let offset = byte_offset.min(content.len());
    let start = content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = content[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(content.len());
    &content[start..end]
}

/// Checks whether a byte offset sits inside a comment span.
///
/// A match is suppressed when a `//` marker appears between the start of its
/// line and the match, or when the nearest `/*` before it is still unclosed.
/// Scanning backward from the offset is O(file length) per match, an accepted
/// cost for small source units.
pub fn in_comment(content: &str, byte_offset: usize) -> bool {
    let offset = byte_offset.min(content.len());
    let line_start = content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    if content[line_start..offset].contains("//") {
        return true;
    }

    let before = &content[..offset];
    let last_open = before.rfind("/*");
    let last_close = before.rfind("*/");
    match (last_open, last_close) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Heuristic for import/require lines that are noise for most rules.
pub fn is_import_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("import ")
        || trimmed.starts_with("export ") && trimmed.contains(" from ")
        || trimmed.contains("require(")
}

/// Test-named files get relaxed reporting for low-impact rules.
pub fn is_test_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if name.contains(".test.") || name.contains(".spec.") || name.starts_with("test_") {
        return true;
    }
    path.components().any(|c| {
        let part = c.as_os_str().to_string_lossy();
        part == "__tests__" || part == "__mocks__"
    })
}

/// Checks a path's extension against an allow-list.
pub fn has_any_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| extensions.contains(&ext))
}
