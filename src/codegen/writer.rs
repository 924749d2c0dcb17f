/// Indentation-aware text buffer. One tab per level.
#[derive(Debug, Default)]
pub struct CodeWriter {
    buf: String,
    indent: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub fn newline(&mut self) {
        self.buf.push('\n');
    }

    pub fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.buf.push('\t');
        }
    }

    /// Writes `s` on its own line at the current indentation.
    pub fn line(&mut self, s: &str) {
        self.write_indent();
        self.write(s);
        self.newline();
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn finish(self) -> String {
        self.buf
    }
}
