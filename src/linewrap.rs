//! Line-wrap restreamer (component D): transparent fixed-width line
//! framing around the ISO 2709 codec.
//!
//! The framing newline is never counted by any length field the codec
//! computes and must not be confused with an embedded `\n`/`\r`/`\r\n`
//! inside a field value. `LineWrapWriter` and `LineUnwrapReader` are
//! thin stream adapters, not parsers: they count raw bytes, not
//! scan for newline characters.

use std::io::{self, Read, Write};

pub const DEFAULT_LINE_LEN: usize = 80;
pub const DEFAULT_NEWLINE: u8 = b'\n';

/// Wraps an underlying writer, inserting `newline` after every
/// `line_len` bytes written and guaranteeing the output ends with
/// `newline` (unless nothing was ever written). `line_len == 0` makes
/// this a transparent pass-through with no forced trailing byte.
pub struct LineWrapWriter<W> {
    inner: W,
    line_len: usize,
    newline: u8,
    col: usize,
    wrote_any: bool,
}

impl<W: Write> LineWrapWriter<W> {
    pub fn new(inner: W, line_len: usize, newline: u8) -> Self {
        LineWrapWriter { inner, line_len, newline, col: 0, wrote_any: false }
    }

    pub fn defaults(inner: W) -> Self {
        Self::new(inner, DEFAULT_LINE_LEN, DEFAULT_NEWLINE)
    }

    /// Flush any pending trailing newline and hand back the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.line_len != 0 && self.wrote_any && self.col > 0 {
            self.inner.write_all(&[self.newline])?;
        }
        Ok(self.inner)
    }
}

impl<W: Write> Write for LineWrapWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.line_len == 0 {
            self.inner.write_all(buf)?;
            return Ok(buf.len());
        }
        let mut start = 0;
        while start < buf.len() {
            let room = self.line_len - self.col;
            let take = room.min(buf.len() - start);
            self.inner.write_all(&buf[start..start + take])?;
            self.col += take;
            start += take;
            self.wrote_any = true;
            if self.col == self.line_len {
                self.inner.write_all(&[self.newline])?;
                self.col = 0;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Unwraps an underlying reader, stripping the framing byte inserted
/// after every `line_len` content bytes, plus the single trailing
/// framing byte `LineWrapWriter::finish` appends when the last line is
/// short. Never treats an embedded newline inside a content run as
/// framing: both skips are driven purely by content byte count and
/// stream position, not by scanning for `\n`.
pub struct LineUnwrapReader<R> {
    inner: R,
    line_len: usize,
    #[allow(dead_code)]
    newline: u8,
    col: usize,
    eof: bool,
    peeked: Option<u8>,
}

impl<R: Read> LineUnwrapReader<R> {
    pub fn new(inner: R, line_len: usize, newline: u8) -> Self {
        LineUnwrapReader { inner, line_len, newline, col: 0, eof: false, peeked: None }
    }

    pub fn defaults(inner: R) -> Self {
        Self::new(inner, DEFAULT_LINE_LEN, DEFAULT_NEWLINE)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_raw_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        let mut byte = [0u8; 1];
        match self.inner.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Returns the next content byte, transparently dropping framing.
    ///
    /// A byte read while `col == line_len` is always a mid-stream
    /// framing byte (the writer inserts one after every full line
    /// unconditionally). A byte read while `col > 0` but short of
    /// `line_len` might instead be the one-off trailing framing byte
    /// `finish` appends after a short last line -- that's only true if
    /// nothing follows it, so such a byte is held back and only
    /// emitted once a further byte proves it wasn't the last one.
    fn next_content_byte(&mut self) -> io::Result<Option<u8>> {
        if self.eof {
            return Ok(None);
        }
        loop {
            let b = match self.read_raw_byte()? {
                Some(b) => b,
                None => {
                    self.eof = true;
                    return Ok(None);
                }
            };
            if self.col == self.line_len {
                log::trace!("stripped line-wrap framing byte {b:#04x}");
                self.col = 0;
                continue;
            }
            if self.col > 0 {
                match self.read_raw_byte()? {
                    Some(next) => self.peeked = Some(next),
                    None => {
                        log::trace!("stripped trailing line-wrap framing byte {b:#04x}");
                        self.eof = true;
                        return Ok(None);
                    }
                }
            }
            self.col += 1;
            return Ok(Some(b));
        }
    }
}

impl<R: Read> Read for LineUnwrapReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.line_len == 0 {
            return self.inner.read(buf);
        }
        let mut total = 0;
        while total < buf.len() {
            match self.next_content_byte()? {
                Some(b) => {
                    buf[total] = b;
                    total += 1;
                }
                None => break,
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(data: &[u8], line_len: usize) -> Vec<u8> {
        let mut w = LineWrapWriter::new(Vec::new(), line_len, b'\n');
        w.write_all(data).unwrap();
        w.finish().unwrap()
    }

    fn unwrap(data: &[u8], line_len: usize) -> Vec<u8> {
        let mut r = LineUnwrapReader::new(data, line_len, b'\n');
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn round_trip_shorter_than_one_line() {
        let data = b"short record body";
        let wrapped = wrap(data, 80);
        assert_eq!(wrapped, [data.as_slice(), b"\n"].concat());
        assert_eq!(unwrap(&wrapped, 80), data);
    }

    #[test]
    fn round_trip_exact_multiple_of_line_len() {
        let data = vec![b'x'; 160];
        let wrapped = wrap(&data, 80);
        // Exactly 2 inserted newlines, no extra trailing one.
        assert_eq!(wrapped.len(), 162);
        assert_eq!(unwrap(&wrapped, 80), data);
    }

    #[test]
    fn round_trip_non_multiple_of_line_len() {
        let data = vec![b'y'; 90];
        let wrapped = wrap(&data, 80);
        assert_eq!(wrapped.len(), 92); // ceil(90/80) == 2 inserted bytes
        assert_eq!(unwrap(&wrapped, 80), data);
    }

    #[test]
    fn embedded_newlines_are_content_not_framing() {
        let data = b"a\nb\r\nc\rd";
        let wrapped = wrap(data, 80);
        assert_eq!(unwrap(&wrapped, 80), data);
    }

    #[test]
    fn zero_line_len_is_pass_through() {
        let data = b"no wrapping at all";
        assert_eq!(wrap(data, 0), data);
        assert_eq!(unwrap(data, 0), data);
    }

    #[test]
    fn empty_input_round_trips_to_empty() {
        assert_eq!(wrap(b"", 80), b"");
        assert_eq!(unwrap(b"", 80), b"");
    }
}
