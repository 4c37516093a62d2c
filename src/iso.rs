//! ISO stream iterator (component E) and its write-side counterpart.
//!
//! `IsoReader` lazily produces records from a byte stream by reading a
//! leader, learning `total_len`, then reading exactly that many bytes
//! and handing them to [`decode_record`]. Composing line-wrap
//! unwrapping is just wrapping the inner reader in a
//! [`LineUnwrapReader`][crate::linewrap::LineUnwrapReader] beforehand --
//! this type has no special-cased optionality of its own.

use std::io::{self, Read, Write};

use crate::error::{IsisError, Result};
use crate::geometry::Geometry;
use crate::leader::{self, LEADER_LEN};
use crate::record::{decode_record, encode_record, IsoRecord};

/// Lazily reads a sequence of ISO 2709 records from `R`.
pub struct IsoReader<R> {
    reader: R,
    geom: Geometry,
    records_read: usize,
}

impl<R: Read> IsoReader<R> {
    pub fn new(reader: R, geom: Geometry) -> Self {
        IsoReader { reader, geom, records_read: 0 }
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    fn read_record(&mut self) -> Result<Option<IsoRecord>> {
        let mut leader_buf = [0u8; LEADER_LEN];
        match self.reader.read_exact(&mut leader_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let total_len = leader::read_digits(&leader_buf, 0, 5, "total_len")?;
        if total_len < LEADER_LEN {
            return Err(IsisError::format(
                format!("total_len {total_len} smaller than the leader itself"),
                0,
            ));
        }

        let mut full = Vec::with_capacity(total_len);
        full.extend_from_slice(&leader_buf);
        full.resize(total_len, 0);
        self.reader.read_exact(&mut full[LEADER_LEN..]).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                IsisError::truncated("stream ended mid-record", LEADER_LEN)
            } else {
                IsisError::Io(e)
            }
        })?;

        let (record, _consumed) = decode_record(&self.geom, &full)?;
        self.records_read += 1;
        Ok(Some(record))
    }
}

impl<R: Read> Iterator for IsoReader<R> {
    type Item = Result<IsoRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Writes a sequence of ISO 2709 records to `W`. Composing line-wrap
/// wrapping is wrapping `W` in a
/// [`LineWrapWriter`][crate::linewrap::LineWrapWriter] beforehand and
/// calling `.finish()` on it after this writer is done.
pub struct IsoWriter<W> {
    writer: W,
    geom: Geometry,
}

impl<W: Write> IsoWriter<W> {
    pub fn new(writer: W, geom: Geometry) -> Self {
        IsoWriter { writer, geom }
    }

    pub fn write_record(&mut self, record: &IsoRecord) -> Result<()> {
        let bytes = encode_record(&self.geom, record)?;
        self.writer.write_all(&bytes)?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
