/// Accumulates input lines until a statement terminator is seen.
#[derive(Debug, Default)]
pub struct Buffer {
    lines: Vec<String>,
}

impl Buffer {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Removes all lines from the buffer.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Appends an input line.
    pub fn push_line(&mut self, line: &str) {
        self.lines.push(line.trim_end_matches(['\r', '\n']).to_string());
    }

    /// Combines all lines into a single String with spaces between lines.
    pub fn build(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<&str>>()
            .join(" ")
    }

    /// True once the buffered text ends with `;` or `\g`.
    pub fn is_complete(&self) -> bool {
        let text = self.build();
        text.ends_with(';') || text.ends_with("\\g")
    }

    pub fn is_empty(&self) -> bool {
        self.build().is_empty()
    }
}
