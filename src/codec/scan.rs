//! Byte-offset line scanner over an in-memory file image.
//!
//! The whole file is read into memory before parsing so the transition
//! from the text header to the binary data region is an exact byte
//! offset: the first byte after the single newline following
//! `tag-BEGIN-DATA`, on every platform.

use std::path::{Path, PathBuf};

use crate::util::{Error, Result};

pub(crate) struct LineScanner<'a> {
    data: &'a [u8],
    pos: usize,
    line: u64,
    path: PathBuf,
}

impl<'a> LineScanner<'a> {
    pub fn new(data: &'a [u8], path: &Path) -> Self {
        Self {
            data,
            pos: 0,
            line: 0,
            path: path.to_path_buf(),
        }
    }

    /// Byte offset of the next unread byte.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Current 1-based line number (of the last line returned).
    #[inline]
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Rewind to a previously saved position.
    pub fn seek(&mut self, pos: usize, line: u64) {
        self.pos = pos;
        self.line = line;
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Bytes from the current position to the end of the image.
    pub fn remainder(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Read the next line, without its terminator. A trailing `\r` is
    /// stripped. Returns `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<&'a str>> {
        if self.at_end() {
            return Ok(None);
        }
        let start = self.pos;
        let end = self.data[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| start + i)
            .unwrap_or(self.data.len());
        self.pos = if end < self.data.len() { end + 1 } else { self.data.len() };
        self.line += 1;

        let mut bytes = &self.data[start..end];
        if bytes.last() == Some(&b'\r') {
            bytes = &bytes[..bytes.len() - 1];
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|_| self.format_error("line is not valid UTF-8"))?;
        Ok(Some(text))
    }

    /// Build a format error at the current line.
    pub fn format_error(&self, detail: impl Into<String>) -> Error {
        Error::format(&self.path, self.line, detail)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
