use std::rc::Rc;

/// A cursor into a source file, tracked alongside every token and AST node
/// so that diagnostics can point back at the exact place they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    idx: isize,
    ln: usize,
    col: isize,
    file_name: Rc<str>,
    file_text: Rc<str>,
}

impl Position {
    pub fn new(idx: isize, ln: usize, col: isize, file_name: Rc<str>, file_text: Rc<str>) -> Self {
        Self {
            idx,
            ln,
            col,
            file_name,
            file_text,
        }
    }

    pub fn idx(&self) -> isize {
        self.idx
    }

    pub fn ln(&self) -> usize {
        self.ln
    }

    pub fn col(&self) -> isize {
        self.col
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_text(&self) -> &str {
        &self.file_text
    }

    /// Advances past `current_char`, rolling the line/column over on `\n`.
    pub fn advance(&mut self, current_char: Option<char>) {
        self.idx += 1;
        self.col += 1;

        if current_char == Some('\n') {
            self.ln += 1;
            self.col = 0;
        }
    }

    pub fn advanced(&self, current_char: Option<char>) -> Self {
        let mut copy = self.clone();
        copy.advance(current_char);
        copy
    }
}
