/// Calculates the byte offset of a 1-based line and column in the source
/// text. This is only called when a JSON parse error needs a span, so it is
/// fine that it walks the text from the start.
pub fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let mut current_line = 1;
    let mut current_column = 1;
    for (i, c) in source.char_indices() {
        if current_line == line && current_column == column {
            return i;
        }
        if c == '\n' {
            current_line += 1;
            current_column = 1;
        } else {
            current_column += 1;
        }
    }
    source.len()
}
