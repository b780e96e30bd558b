use crate::constants::{CARRIAGE_RETURN, LINE_DELIMITER, MAX_LINE_LENGTH};

/// Splits a byte stream into text lines.
///
/// Lines end with `\n`; one trailing `\r` is stripped so CR+LF firmware
/// frames the same way. Empty lines are skipped and invalid UTF-8 is
/// replaced rather than rejected. A partial line that grows past
/// `MAX_LINE_LENGTH` is noise: it is dropped up to and including its
/// delimiter.
#[derive(Debug, Default)]
pub(crate) struct LineFramer {
    buffer: Vec<u8>,
    discarding: bool,
}

impl LineFramer {
    pub(crate) fn new() -> LineFramer {
        LineFramer::default()
    }

    /// Appends `data` and returns every line it completed, in order.
    pub(crate) fn push(&mut self, data: &[u8]) -> Vec<String> {
        let mut data = data;
        if self.discarding {
            match find_delimiter(data) {
                Some(end) => {
                    self.discarding = false;
                    data = &data[end + 1..];
                }
                None => return Vec::new(),
            }
        }
        self.buffer.extend_from_slice(data);

        let mut lines = Vec::new();
        while let Some(end) = find_delimiter(&self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            if let Some(text) = to_line(&line[..end]) {
                lines.push(text);
            }
        }

        if self.buffer.len() > MAX_LINE_LENGTH {
            tracing::debug!(
                "Discarding {} bytes without a line delimiter",
                self.buffer.len()
            );
            self.buffer.clear();
            self.discarding = true;
        }
        lines
    }

    /// Drops any partial line, e.g. after the link was re-opened.
    pub(crate) fn clear(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    buffer.iter().position(|&b| b == LINE_DELIMITER)
}

fn to_line(bytes: &[u8]) -> Option<String> {
    let bytes = match bytes.last() {
        Some(&CARRIAGE_RETURN) => &bytes[..bytes.len() - 1],
        _ => bytes,
    };
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.to_string())
}
