//! Field tokenizing on raw line bytes

/// Locate field `col` in a line, treating commas inside double quotes as content
pub fn quoted_field(line: &[u8], col: usize) -> Option<&[u8]> {
    let mut current = 0;
    let mut start = 0;
    let mut in_quotes = false;

    for (i, &byte) in line.iter().enumerate() {
        match byte {
            b'"' => in_quotes = !in_quotes,
            b',' if !in_quotes => {
                if current == col {
                    return Some(&line[start..i]);
                }
                current += 1;
                start = i + 1;
            }
            _ => {}
        }
    }

    (current == col).then(|| &line[start..])
}

/// Locate field `col` in a line, splitting on every comma
pub fn plain_field(line: &[u8], col: usize) -> Option<&[u8]> {
    line.split(|&b| b == b',').nth(col)
}

/// Decode a field as text: whitespace trimmed, then one layer of quotes removed
pub fn field_text(field: &[u8]) -> String {
    let text = String::from_utf8_lossy(field);
    let trimmed = text.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.to_string()
}

/// Parse a field as a float straight from its bytes
pub fn parse_number(field: &[u8]) -> Option<f64> {
    let trimmed = field.trim_ascii();
    if trimmed.is_empty() {
        return None;
    }
    fast_float2::parse::<f64, _>(trimmed).ok()
}
