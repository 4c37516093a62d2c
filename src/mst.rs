//! MST reader (component F): random access into a CDS/ISIS Master File
//! by MFN, via its companion XRF cross-reference index.
//!
//! The on-disk layouts here are not byte-compatible with any single
//! real CDS/ISIS build -- the family has several incompatible variants
//! and this crate's Non-goals exclude a write path that would let us
//! validate against a specific one. What's implemented follows the
//! structural description in the data model exactly (32-byte leader,
//! 512-byte blocks, a 4-byte packed XRF pointer, and width-dependent
//! directory entries) with one concrete, internally consistent packing
//! chosen where the format leaves a gap; those choices are recorded in
//! the crate's design notes. The `Isis16`/`Ffi32` distinction is always
//! an explicit caller parameter -- this reader never guesses it.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{IsisError, Result};
use crate::record::RawField;

pub const BLOCK_SIZE: u64 = 512;
const MST_LEADER_LEN: usize = 32;
const XRF_ENTRY_LEN: u64 = 4;

/// Which MST record-width variant to read. See the module docs: this
/// is never auto-detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MstWidth {
    /// 16-bit directory fields, 32-bit record length.
    Isis16,
    /// 32-bit directory fields, 64-bit record length.
    Ffi32,
}

impl MstWidth {
    fn dir_entry_field_width(self) -> usize {
        match self {
            MstWidth::Isis16 => 2,
            MstWidth::Ffi32 => 4,
        }
    }

    fn dir_entry_len(self) -> usize {
        self.dir_entry_field_width() * 3 // tag, pos, len
    }
}

/// A decoded XRF pointer for one MFN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct XrfPointer {
    raw: u32,
}

const XRF_ACTIVE_BIT: u32 = 1 << 31;
const XRF_BLOCK_SHIFT: u32 = 9;
const XRF_OFFSET_MASK: u32 = (1 << 9) - 1;

impl XrfPointer {
    fn never_written(self) -> bool {
        self.raw == 0
    }

    fn active(self) -> bool {
        self.raw & XRF_ACTIVE_BIT != 0
    }

    fn block(self) -> u64 {
        ((self.raw & !XRF_ACTIVE_BIT) >> XRF_BLOCK_SHIFT) as u64
    }

    fn offset(self) -> u64 {
        (self.raw & XRF_OFFSET_MASK) as u64
    }

    fn byte_address(self) -> u64 {
        (self.block() - 1) * BLOCK_SIZE + self.offset()
    }
}

/// One record read out of an MST, with its MFN and active flag
/// surfaced alongside the decoded fields (component G consumes these
/// as the reserved `mfn`/`active` dictionary keys).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MstRecord {
    pub mfn: u32,
    pub active: bool,
    pub fields: Vec<RawField>,
}

/// Holds exclusive read handles to the `.mst`/`.xrf` pair. Serializes
/// the two seeks a single record read requires so interleaved use from
/// one thread can't interleave the two files' cursors incorrectly.
pub struct MstReader {
    mst: File,
    xrf: File,
    width: MstWidth,
    next_mfn: u32,
}

fn sibling_with_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

impl MstReader {
    /// Opens `<name>.mst` and locates `<name>.xrf` alongside it.
    pub fn open(path: &Path, width: MstWidth) -> Result<Self> {
        let mst = File::open(path)?;
        let xrf_path = sibling_with_extension(path, "xrf");
        let xrf = File::open(&xrf_path)?;

        let xrf_len = xrf.metadata()?.len();
        if xrf_len % XRF_ENTRY_LEN != 0 {
            return Err(IsisError::xrf(
                format!("xrf file length {xrf_len} is not a multiple of the 4-byte pointer size"),
                None,
            ));
        }
        // MFN 0 is the reserved control entry; MFNs 1..=next_mfn-1 are data.
        let next_mfn = (xrf_len / XRF_ENTRY_LEN) as u32;

        Ok(MstReader { mst, xrf, width, next_mfn })
    }

    /// Total record slots addressable by this XRF (MFN range is `1..next_mfn`).
    pub fn next_mfn(&self) -> u32 {
        self.next_mfn
    }

    fn read_xrf_pointer(&mut self, mfn: u32) -> Result<XrfPointer> {
        if mfn == 0 || mfn >= self.next_mfn {
            return Err(IsisError::xrf(format!("mfn {mfn} out of range"), Some(mfn)));
        }
        self.xrf.seek(SeekFrom::Start(mfn as u64 * XRF_ENTRY_LEN))?;
        let raw = self.xrf.read_u32::<LittleEndian>()?;
        Ok(XrfPointer { raw })
    }

    /// Read the record for `mfn`. Fails with `IsisError::Xrf` if the
    /// MFN is out of range or was never written.
    pub fn read_record(&mut self, mfn: u32) -> Result<MstRecord> {
        let ptr = self.read_xrf_pointer(mfn)?;
        if ptr.never_written() {
            return Err(IsisError::xrf(format!("mfn {mfn} was never written"), Some(mfn)));
        }

        let addr = ptr.byte_address();
        self.mst.seek(SeekFrom::Start(addr))?;

        let mut leader_buf = [0u8; MST_LEADER_LEN];
        self.mst.read_exact(&mut leader_buf).map_err(|e| io_to_truncated(e, addr))?;
        let mut cursor: &[u8] = &leader_buf;

        let leader_mfn = cursor.read_u32::<LittleEndian>()?;
        let record_len: u64 = match self.width {
            MstWidth::Isis16 => cursor.read_u32::<LittleEndian>()? as u64,
            MstWidth::Ffi32 => cursor.read_u64::<LittleEndian>()?,
        };
        let base = cursor.read_u32::<LittleEndian>()? as u64;
        let nvf = cursor.read_u32::<LittleEndian>()? as usize;

        if leader_mfn != mfn {
            log::warn!("xrf pointed at mfn {mfn} but mst leader says {leader_mfn}");
        }
        if record_len < base {
            return Err(IsisError::format(
                format!("mst record_len {record_len} smaller than base {base}"),
                addr as usize,
            ));
        }

        let dir_entry_len = self.width.dir_entry_len();
        let mut dir_bytes = vec![0u8; dir_entry_len * nvf];
        self.mst.read_exact(&mut dir_bytes).map_err(|e| io_to_truncated(e, addr + MST_LEADER_LEN as u64))?;

        let field_area_len = (record_len - base) as usize;
        let mut field_bytes = vec![0u8; field_area_len];
        self.mst.read_exact(&mut field_bytes).map_err(|e| {
            io_to_truncated(e, addr + MST_LEADER_LEN as u64 + dir_bytes.len() as u64)
        })?;

        let field_width = self.width.dir_entry_field_width();
        let mut fields = Vec::with_capacity(nvf);
        for i in 0..nvf {
            let mut entry: &[u8] = &dir_bytes[i * dir_entry_len..(i + 1) * dir_entry_len];
            let (tag, pos, len) = match field_width {
                2 => (
                    entry.read_u16::<LittleEndian>()? as u32,
                    entry.read_u16::<LittleEndian>()? as usize,
                    entry.read_u16::<LittleEndian>()? as usize,
                ),
                _ => (
                    entry.read_u32::<LittleEndian>()?,
                    entry.read_u32::<LittleEndian>()? as usize,
                    entry.read_u32::<LittleEndian>()? as usize,
                ),
            };
            if pos + len > field_bytes.len() {
                return Err(IsisError::format(
                    format!("mst directory entry for tag {tag} points past the field area"),
                    (addr + MST_LEADER_LEN as u64 + dir_bytes.len() as u64) as usize + pos,
                ));
            }
            let value = field_bytes[pos..pos + len].to_vec();
            fields.push(RawField { tag: tag.to_string().into_bytes(), custom: Vec::new(), value });
        }

        Ok(MstRecord { mfn, active: ptr.active(), fields })
    }

    /// Walk MFN `1..next_mfn`, optionally skipping logically-deleted
    /// records. Deleted-but-never-written slots are always skipped:
    /// there is no record to yield.
    pub fn iter_records(&mut self, only_active: bool) -> MstIter<'_> {
        MstIter { reader: self, mfn: 1, only_active }
    }
}

fn io_to_truncated(e: std::io::Error, offset: u64) -> IsisError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        IsisError::truncated("mst file ended mid-record", offset as usize)
    } else {
        IsisError::Io(e)
    }
}

/// Iterator returned by [`MstReader::iter_records`].
pub struct MstIter<'a> {
    reader: &'a mut MstReader,
    mfn: u32,
    only_active: bool,
}

impl<'a> Iterator for MstIter<'a> {
    type Item = Result<MstRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.mfn < self.reader.next_mfn {
            let mfn = self.mfn;
            self.mfn += 1;
            match self.reader.read_xrf_pointer(mfn) {
                Ok(ptr) if ptr.never_written() => continue,
                Ok(ptr) if self.only_active && !ptr.active() => continue,
                Ok(_) => return Some(self.reader.read_record(mfn)),
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
