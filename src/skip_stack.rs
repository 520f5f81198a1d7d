use crate::errors::{PreprocessError, Result};

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Skip flag of the enclosing region when this one opened.
    inherited: bool,
    /// 1-based line of the `@if` that opened this region.
    line: usize,
}

/// Nesting state for `@if`/`@endif` regions.
///
/// Depth always equals the number of unmatched opens. Once a region is
/// suppressed every region nested inside it stays suppressed.
#[derive(Debug, Default)]
pub struct SkipStack {
    frames: Vec<Frame>,
    skip: bool,
}

impl SkipStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_skipping(&self) -> bool {
        self.skip
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn open(&mut self, condition: bool, line: usize) {
        self.frames.push(Frame {
            inherited: self.skip,
            line,
        });
        self.skip = self.skip || !condition;
    }

    pub fn close(&mut self, line: usize) -> Result<()> {
        let frame = self.frames.pop().ok_or_else(|| PreprocessError::Structure {
            message: "unmatched /* @endif */ with no open /* @if(...) */".into(),
            line: Some(line),
        })?;
        self.skip = frame.inherited;
        Ok(())
    }

    /// Ensure every region was closed.
    pub fn finish(self) -> Result<()> {
        match self.frames.first() {
            None => Ok(()),
            Some(outermost) => Err(PreprocessError::Structure {
                message: format!(
                    "{} unmatched /* @if(...) */ block(s); missing /* @endif */ for the block opened at line {}",
                    self.frames.len(),
                    outermost.line
                ),
                line: Some(outermost.line),
            }),
        }
    }
}
