/// Convert raw file content into the canonical form the rest of the pipeline
/// operates on.
///
/// - A leading byte-order mark is dropped.
/// - `\r\n` pairs and lone `\r` both become `\n`, so line counting is stable
///   across platforms.
/// - Horizontal tabs expand to `tab_width` spaces; a width of zero deletes
///   them.
///
/// All offsets used by the lexer, segmenter and engine are char offsets into
/// the returned string. The newline count is preserved, which keeps segment
/// line numbers aligned with the (normalized) source.
pub fn normalize(input: &str, tab_width: usize) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.strip_prefix('\u{feff}').unwrap_or(input).chars().peekable();

    while let Some(char) = chars.next() {
        match char {
            '\r' => {
                chars.next_if_eq(&'\n');
                output.push('\n');
            }
            '\t' => {
                for _ in 0..tab_width {
                    output.push(' ');
                }
            }
            other => output.push(other),
        }
    }

    output
}
