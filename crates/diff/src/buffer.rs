use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Result};
use derive_more::Display;
use ropey::Rope;

use crate::line_range::LineRange;

/// Process-unique identity of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(fmt = "buffer-{}", _0)]
pub struct BufferId(u64);

impl BufferId {
    /// Mint a fresh id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A mutable sequence of lines taking part in a comparison
///
/// Lines are `\n`-terminated; a trailing newline does not open an extra line,
/// so `"A\nB\n"` and `"A\nB"` both hold two lines. Line text is handed out
/// without its terminator.
pub trait Buffer {
    fn id(&self) -> BufferId;

    fn line_count(&self) -> usize;

    /// The text of every line in `range`
    fn lines(&self, range: LineRange) -> Result<Vec<String>>;

    /// The full contents
    fn text(&self) -> String;

    /// Replace the lines in `range` with `lines`
    ///
    /// An empty range inserts before line `range.start`, an empty `lines`
    /// deletes. `lines` hold no line breaks, and the line count changes by
    /// exactly `lines.len() - range.len()`.
    fn replace_lines(&mut self, range: LineRange, lines: &[String]) -> Result<()>;
}

/// The stock buffer, backed by a rope
#[derive(Debug, Clone)]
pub struct RopeBuffer {
    id: BufferId,
    rope: Rope,
}

impl RopeBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            id: BufferId::next(),
            rope: Rope::from_str(text),
        }
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    fn ends_with_newline(&self) -> bool {
        let len = self.rope.len_chars();
        len > 0 && self.rope.char(len - 1) == '\n'
    }

    fn check_range(&self, range: LineRange) -> Result<()> {
        if !range.is_well_formed() || range.end > self.line_count() {
            bail!(
                "line range {} is outside {} ({} lines)",
                range,
                self.id,
                self.line_count()
            );
        }
        Ok(())
    }
}

impl Default for RopeBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl From<&str> for RopeBuffer {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl Buffer for RopeBuffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn line_count(&self) -> usize {
        if self.rope.len_chars() == 0 {
            0
        } else if self.ends_with_newline() {
            self.rope.len_lines() - 1
        } else {
            self.rope.len_lines()
        }
    }

    fn lines(&self, range: LineRange) -> Result<Vec<String>> {
        self.check_range(range)?;

        Ok(range
            .to_range()
            .map(|line| {
                let text = self.rope.line(line).to_string();
                match text.strip_suffix('\n') {
                    Some(stripped) => stripped.to_string(),
                    None => text,
                }
            })
            .collect())
    }

    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn replace_lines(&mut self, range: LineRange, lines: &[String]) -> Result<()> {
        self.check_range(range)?;
        if lines.iter().any(|line| line.contains('\n')) {
            bail!("replacement lines for {} in {} contain a line break", range, self.id);
        }

        let line_count = self.line_count();
        let len = self.rope.len_chars();
        let start = self.rope.line_to_char(range.start);

        // The last line has no terminator and the edit touches the end
        if range.end == line_count && line_count > 0 && !self.ends_with_newline() {
            let mut joined = lines.join("\n");
            // an empty last line only survives with a terminator after it
            if lines.last().is_some_and(|line| line.is_empty()) {
                joined.push('\n');
            }
            if range.start < line_count {
                if lines.is_empty() && range.start > 0 {
                    // drop the separator that ended the preceding line
                    self.rope.remove(start - 1..len);
                } else {
                    self.rope.remove(start..len);
                    self.rope.insert(start, &joined);
                }
            } else if !lines.is_empty() {
                self.rope.insert(len, &format!("\n{}", joined));
            }
            return Ok(());
        }

        let end = self.rope.line_to_char(range.end);
        let replacement: String = lines.iter().map(|line| format!("{}\n", line)).collect();
        self.rope.remove(start..end);
        self.rope.insert(start, &replacement);
        Ok(())
    }
}
