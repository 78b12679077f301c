use std::fmt;
use std::rc::Rc;

use colored::Colorize;

use crate::context::Context;
use crate::position::Position;

/// A runtime error additionally carries the `Context` it occurred in, so a
/// full call-stack traceback can be rendered.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub message: String,
    pub start: Position,
    pub end: Position,
    pub context: Rc<Context>,
}

#[derive(Debug, Clone)]
pub enum Error {
    IllegalCharacter {
        message: String,
        start: Position,
        end: Position,
    },
    ExpectedCharacter {
        message: String,
        start: Position,
        end: Position,
    },
    InvalidSyntax {
        message: String,
        start: Position,
        end: Position,
    },
    Runtime(RuntimeError),
}

impl Error {
    fn name(&self) -> &'static str {
        match self {
            Error::IllegalCharacter { .. } => "Illegal Character",
            Error::ExpectedCharacter { .. } => "Expected Character",
            Error::InvalidSyntax { .. } => "Invalid Syntax",
            Error::Runtime(_) => "Runtime Error",
        }
    }

    fn span(&self) -> (&Position, &Position) {
        match self {
            Error::IllegalCharacter { start, end, .. }
            | Error::ExpectedCharacter { start, end, .. }
            | Error::InvalidSyntax { start, end, .. } => (start, end),
            Error::Runtime(e) => (&e.start, &e.end),
        }
    }

    fn message(&self) -> &str {
        match self {
            Error::IllegalCharacter { message, .. }
            | Error::ExpectedCharacter { message, .. }
            | Error::InvalidSyntax { message, .. } => message,
            Error::Runtime(e) => &e.message,
        }
    }

    fn traceback(&self) -> String {
        let Error::Runtime(e) = self else {
            return String::new();
        };

        let mut lines = Vec::new();
        let mut pos = Some(e.start.clone());
        let mut ctx = Some(e.context.clone());

        while let (Some(p), Some(c)) = (pos.clone(), ctx.clone()) {
            lines.push(format!(
                "  File {}, line {}, in {}",
                p.file_name(),
                p.ln() + 1,
                c.display_name
            ));
            pos = c.parent_entry_pos.clone();
            ctx = c.parent.clone();
        }

        lines.reverse();
        if lines.is_empty() {
            String::new()
        } else {
            format!("Traceback (most recent call last):\n{}\n", lines.join("\n"))
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = self.span();
        let header = format!(
            "{}: {}",
            self.name().red().bold(),
            self.message()
        );
        let location = format!("File {}, line {}", start.file_name(), start.ln() + 1);
        let arrows = string_with_arrows(start.file_text(), start, end);

        write!(f, "{}{header}\n{location}\n\n{arrows}", self.traceback())
    }
}

impl std::error::Error for Error {}

/// Renders the source line(s) an error spans, with a caret underline beneath
/// the offending range. Multi-line spans get one caret row per line.
pub fn string_with_arrows(text: &str, start: &Position, end: &Position) -> String {
    let mut result = String::new();

    let idx_start = text[..start.idx().max(0) as usize]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let idx_end = text[idx_start..]
        .find('\n')
        .map(|i| i + idx_start)
        .unwrap_or(text.len());

    let line_count = (end.ln() - start.ln()) + 1;
    let mut line_start = idx_start;
    let mut line_end = idx_end;

    for i in 0..line_count {
        let line = &text[line_start..line_end.min(text.len())];

        let col_start = if i == 0 { start.col().max(0) as usize } else { 0 };
        let col_end = if i == line_count - 1 {
            end.col().max(0) as usize
        } else {
            line.len()
        };

        result.push_str(line);
        result.push('\n');
        result.push_str(&" ".repeat(col_start));
        result.push_str(&"^".repeat(col_end.saturating_sub(col_start).max(1)));

        if i != line_count - 1 {
            result.push('\n');
        }

        line_start = line_end + 1;
        if line_start >= text.len() {
            break;
        }
        line_end = text[line_start..]
            .find('\n')
            .map(|idx| idx + line_start)
            .unwrap_or(text.len());
    }

    result.replace('\t', "")
}
