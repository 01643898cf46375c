// src/common/frame.rs

/// Longest unfinished line kept between reads. Anything longer is line noise.
pub const MAX_PARTIAL_LINE: usize = 256;

/// Splits a serial byte stream into complete lines.
///
/// The pad gives no guarantee that a line arrives in one read, so the
/// unfinished tail of each chunk is held back and joined to the head of the
/// next one. Lines end in `\n`; a preceding `\r` is stripped. Empty lines are
/// dropped.
#[derive(Debug, Default, Clone)]
pub struct FrameAssembler {
    partial: Vec<u8>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every line it completes, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.partial.extend_from_slice(&rest[..pos]);
            rest = &rest[pos + 1..];

            let mut line = std::mem::take(&mut self.partial);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if !line.is_empty() {
                lines.push(String::from_utf8_lossy(&line).into_owned());
            }
        }

        self.partial.extend_from_slice(rest);
        if self.partial.len() > MAX_PARTIAL_LINE {
            log::warn!(
                "discarding {} bytes of unterminated serial input",
                self.partial.len()
            );
            self.partial.clear();
        }

        lines
    }

    /// True while an unfinished line is buffered.
    #[inline]
    pub fn has_partial(&self) -> bool {
        !self.partial.is_empty()
    }

    /// The buffered unfinished line, if any.
    pub fn partial(&self) -> &[u8] {
        &self.partial
    }

    /// Drops any buffered unfinished line.
    pub fn clear(&mut self) {
        self.partial.clear();
    }
}
