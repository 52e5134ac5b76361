/// Maps byte offsets to line/column positions within source text.
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.bytes().enumerate().filter(|&(_, b)| b == b'\n').map(|(i, _)| i + 1))
            .collect();
        SourceMap { line_starts }
    }

    /// Returns (line, col), both 1-based.
    pub fn lookup(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        (line + 1, offset.saturating_sub(self.line_starts[line]) + 1)
    }

    /// Returns the text of the given 1-based line, without its line ending.
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> &'a str {
        if line == 0 || line > self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[line - 1];
        let end = self.line_starts.get(line).copied().unwrap_or(source.len());
        source[start..end].trim_end_matches('\n').trim_end_matches('\r')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "a int = 2 * 5\nb int = 13 - 3\na == b\n";

    #[test]
    fn lookup_first_line() {
        let sm = SourceMap::new(PROGRAM);
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.lookup(8), (1, 9));
    }

    #[test]
    fn lookup_later_lines() {
        let sm = SourceMap::new(PROGRAM);
        assert_eq!(sm.lookup(14), (2, 1));
        assert_eq!(sm.lookup(29), (3, 1));
        assert_eq!(sm.lookup(34), (3, 6));
    }

    #[test]
    fn newline_belongs_to_its_line() {
        let sm = SourceMap::new(PROGRAM);
        assert_eq!(sm.lookup(13), (1, 14));
    }

    #[test]
    fn line_text_per_line() {
        let sm = SourceMap::new(PROGRAM);
        assert_eq!(sm.line_text(PROGRAM, 1), "a int = 2 * 5");
        assert_eq!(sm.line_text(PROGRAM, 3), "a == b");
        assert_eq!(sm.line_text(PROGRAM, 4), "");
    }

    #[test]
    fn line_text_out_of_bounds() {
        let sm = SourceMap::new("1");
        assert_eq!(sm.line_text("1", 0), "");
        assert_eq!(sm.line_text("1", 9), "");
    }

    #[test]
    fn crlf_is_trimmed() {
        let src = "1 + 1\r\n2";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 1), "1 + 1");
        assert_eq!(sm.lookup(7), (2, 1));
    }
}
