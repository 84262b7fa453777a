//! Indented line printer for generated C

use std::fmt::Write;

/// Accumulates generated lines at a tab indentation level
#[derive(Debug, Default, Clone)]
pub struct CodePrinter {
    code: String,
    level: usize,
    last_blank: bool,
    lines: usize,
}

impl CodePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print one line at the current level
    pub fn output(&mut self, line: &str) {
        for _ in 0..self.level {
            self.code.push('\t');
        }
        let _ = writeln!(self.code, "{}", line);
        self.last_blank = false;
        self.lines += 1;
    }

    /// Print every line of `text` at the current level
    pub fn output_lines(&mut self, text: &str) {
        for line in text.lines() {
            self.output(line);
        }
    }

    pub fn output_blank_line(&mut self) {
        self.code.push('\n');
        self.last_blank = true;
        self.lines += 1;
    }

    /// Blank line unless the previous line already is one
    pub fn output_blank_line_if_needed(&mut self) {
        if !self.last_blank {
            self.output_blank_line();
        }
    }

    /// Print a raw docblock as a C comment
    pub fn output_doc_block(&mut self, doc_block: &str) {
        let body = doc_block
            .trim()
            .trim_start_matches('/')
            .trim_start_matches('*')
            .trim_end_matches('/')
            .trim_end_matches('*')
            .trim();
        self.output("/**");
        for line in body.lines() {
            let line = line.trim().trim_start_matches('*').trim_end();
            if line.is_empty() {
                self.output(" *");
            } else {
                self.output(&format!(" *{}", prefixed(line)));
            }
        }
        self.output(" */");
    }

    pub fn increase_level(&mut self) {
        self.level += 1;
    }

    pub fn decrease_level(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn line_count(&self) -> usize {
        self.lines
    }

    pub fn output_str(&self) -> &str {
        &self.code
    }

    pub fn into_output(self) -> String {
        self.code
    }
}

fn prefixed(line: &str) -> String {
    if line.starts_with(' ') {
        line.to_string()
    } else {
        format!(" {}", line)
    }
}
