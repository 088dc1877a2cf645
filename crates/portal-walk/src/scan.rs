//! Bounded readers for content checks.
//!
//! The walker never limits how much of a file a check reads, so checks
//! should go through these instead of slurping the stream.

use std::io::{self, BufRead, BufReader, Read};

/// Default cap for whole-file reads, in bytes.
pub const MAX_FILE_SIZE: u64 = 64 * 1024;

/// Longest line `LineScanner` accepts, in bytes, excluding the newline.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Read the whole stream, failing if it holds more than `limit` bytes.
pub fn read_bounded<R: Read + ?Sized>(r: &mut R, limit: u64) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    Read::take(&mut *r, limit.saturating_add(1)).read_to_end(&mut buf)?;
    if buf.len() as u64 > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("content exceeds {limit} bytes"),
        ));
    }
    Ok(buf)
}

/// Iterator over the lines of a stream with a per-line size cap.
///
/// Yields lines without their `\n` or `\r\n` terminator. Invalid UTF-8 is
/// replaced. A line longer than [`MAX_LINE_LEN`] yields an `InvalidData`
/// error and ends the iteration.
pub struct LineScanner<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    done: bool,
}

impl<R: Read> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
            done: false,
        }
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        // One extra byte leaves room for the newline of a maximal line
        let limit = MAX_LINE_LEN as u64 + 1;
        let n = (&mut self.reader).take(limit).read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        } else if self.buf.len() > MAX_LINE_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line exceeds {MAX_LINE_LEN} bytes"),
            ));
        }

        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

impl<R: Read> Iterator for LineScanner<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
