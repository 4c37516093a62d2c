//! ISO 2709 record codec (component C): leader + directory + fields.
//!
//! `encode_record`/`decode_record` are pure functions, not methods on a
//! stateful type, per the strategy recommended for this format: a
//! `Geometry` value plus two free functions, no reflection or late
//! binding (see Design Notes).

use crate::error::{IsisError, Result};
use crate::geometry::Geometry;
use crate::leader::{self, Leader, LEADER_LEN};

/// One field as stored on the wire: its tag, its `custom_len` custom
/// bytes (usually empty), and its value bytes (never containing the
/// active field terminator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub tag: Vec<u8>,
    pub custom: Vec<u8>,
    pub value: Vec<u8>,
}

impl RawField {
    pub fn new(tag: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        RawField { tag: tag.into(), custom: Vec::new(), value: value.into() }
    }
}

/// A single parsed or to-be-built ISO 2709 record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoRecord {
    pub leader: Leader,
    pub fields: Vec<RawField>,
}

impl IsoRecord {
    pub fn new(fields: Vec<RawField>) -> Self {
        IsoRecord { leader: Leader::default(), fields }
    }

    /// Human-readable one-line-per-field rendering for troubleshooting
    /// malformed input: tag, computed pos/len, and the first 40 bytes
    /// of the value (non-printable bytes shown as `.`). Output-only --
    /// there is no parser for this text.
    pub fn to_debug_string(&self) -> String {
        let mut out = String::new();
        let mut pos = 0usize;
        for f in &self.fields {
            let len = f.value.len() + 1;
            let tag = String::from_utf8_lossy(&f.tag);
            let preview: String = f
                .value
                .iter()
                .take(40)
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();
            out.push_str(&format!("={tag} [pos={pos} len={len}] {preview}\n"));
            pos += len;
        }
        out
    }
}

/// Build the exact byte string of `record` under `geom` (no line-wrap).
///
/// Implements the six-step Build contract: field data, directory,
/// leader, concatenation, in that order, per the data model's
/// invariants 1-5.
pub fn encode_record(geom: &Geometry, record: &IsoRecord) -> Result<Vec<u8>> {
    // Step 1: field-data region.
    let mut field_data = Vec::new();
    let mut positions = Vec::with_capacity(record.fields.len());
    for f in &record.fields {
        if f.tag.len() != geom.tag_len {
            return Err(IsisError::overflow("tag", format!(
                "tag `{:?}` does not match configured tag_len {}", f.tag, geom.tag_len,
            )));
        }
        if f.custom.len() != geom.custom_len {
            return Err(IsisError::overflow("custom", format!(
                "custom bytes length {} does not match configured custom_len {}",
                f.custom.len(), geom.custom_len,
            )));
        }
        if f.value.contains(&geom.field_terminator) {
            return Err(IsisError::overflow("value", format!(
                "field value for tag `{:?}` contains the field terminator byte", f.tag,
            )));
        }
        let pos = field_data.len();
        let len = f.value.len() + 1; // + field_terminator
        positions.push((pos, len));
        field_data.extend_from_slice(&f.value);
        field_data.push(geom.field_terminator);
    }

    // Step 2/3: directory region.
    let entry_size = geom.entry_size();
    let mut directory = Vec::with_capacity(entry_size * record.fields.len());
    for (f, (pos, len)) in record.fields.iter().zip(&positions) {
        directory.extend_from_slice(&f.tag);
        leader::write_digits(&mut directory, *len, geom.len_len, "len")?;
        leader::write_digits(&mut directory, *pos, geom.pos_len, "pos")?;
        directory.extend_from_slice(&f.custom);
    }
    directory.push(geom.field_terminator);

    // Step 4: base_addr and total_len.
    let base_addr = LEADER_LEN + entry_size * record.fields.len() + 1;
    let total_len = base_addr + field_data.len() + 1; // + record_terminator

    // Step 5: leader. Field order follows the ISO 2709 convention this
    // format inherits: total_len, status, type, custom_2, coding,
    // indicator_count, identifier_len, base_addr, custom_3, entry map.
    let mut out = Vec::with_capacity(total_len);
    leader::write_digits(&mut out, total_len, 5, "total_len")?;
    out.push(record.leader.status);
    out.push(record.leader.type_);
    out.extend_from_slice(&record.leader.custom_2);
    out.push(record.leader.coding);
    out.push(b'0' + (record.leader.indicator_count % 10));
    out.push(b'0' + (record.leader.identifier_len % 10));
    leader::write_digits(&mut out, base_addr, 5, "base_addr")?;
    out.extend_from_slice(&record.leader.custom_3);
    out.push(b'0' + (geom.len_len as u8 % 10));
    out.push(b'0' + (geom.pos_len as u8 % 10));
    out.push(b'0' + (geom.custom_len as u8 % 10));
    out.push(record.leader.reserved);

    // Step 6.
    out.extend_from_slice(&directory);
    out.extend_from_slice(&field_data);
    out.push(geom.record_terminator);

    Ok(out)
}

/// Parse one record from the front of `bytes`. Returns the record and
/// the number of bytes consumed so the caller (component E) can
/// advance past it.
///
/// `geom.tag_len`, `geom.field_terminator`, and `geom.record_terminator`
/// come from the caller; `len_len`/`pos_len`/`custom_len` are read back
/// off the leader's own entry map, since the wire format is
/// self-describing for those widths (this is what lets scenario-style
/// per-record custom geometries round-trip).
pub fn decode_record(geom: &Geometry, bytes: &[u8]) -> Result<(IsoRecord, usize)> {
    if bytes.len() < LEADER_LEN {
        return Err(IsisError::truncated("record shorter than the 24-byte leader", bytes.len()));
    }
    let leader = Leader::parse(bytes)?;
    let entry_map = Leader::entry_map(bytes)?;

    let total_len = leader::read_digits(bytes, 0, 5, "total_len")?;
    let base_addr = leader::read_digits(bytes, Leader::IDENTIFIER_LEN + 1, 5, "base_addr")?;

    if total_len < base_addr + 1 {
        return Err(IsisError::format(
            format!("total_len {total_len} smaller than base_addr+1 {}", base_addr + 1),
            0,
        ));
    }
    if bytes.len() < total_len {
        return Err(IsisError::truncated(
            format!("record declares total_len {total_len} but only {} bytes available", bytes.len()),
            bytes.len(),
        ));
    }

    let entry_size = geom.tag_len + entry_map.len_len + entry_map.pos_len + entry_map.custom_len;
    if entry_size == 0 && base_addr != LEADER_LEN + 1 {
        return Err(IsisError::format("zero-width directory entry but base_addr implies entries", LEADER_LEN));
    }
    let dir_region_len = base_addr.saturating_sub(LEADER_LEN + 1);
    if entry_size != 0 && dir_region_len % entry_size != 0 {
        return Err(IsisError::format(
            format!("directory region of {dir_region_len} bytes is not a multiple of entry size {entry_size}"),
            LEADER_LEN,
        ));
    }
    let n_entries = if entry_size == 0 { 0 } else { dir_region_len / entry_size };

    // Directory.
    let mut entries = Vec::with_capacity(n_entries);
    let mut cursor = LEADER_LEN;
    for _ in 0..n_entries {
        let tag = bytes[cursor..cursor + geom.tag_len].to_vec();
        cursor += geom.tag_len;
        let len = leader::read_digits(bytes, cursor, entry_map.len_len, "len")?;
        cursor += entry_map.len_len;
        let pos = leader::read_digits(bytes, cursor, entry_map.pos_len, "pos")?;
        cursor += entry_map.pos_len;
        let custom = bytes[cursor..cursor + entry_map.custom_len].to_vec();
        cursor += entry_map.custom_len;
        entries.push((tag, pos, len, custom));
    }

    // Directory terminator.
    let dir_term_offset = LEADER_LEN + n_entries * entry_size;
    if bytes.get(dir_term_offset) != Some(&geom.field_terminator) {
        return Err(IsisError::format("missing directory terminator", dir_term_offset));
    }
    if dir_term_offset + 1 != base_addr {
        return Err(IsisError::format(
            format!("base_addr {base_addr} inconsistent with computed directory end {}", dir_term_offset + 1),
            dir_term_offset,
        ));
    }

    // Field data: exactly total_len - base_addr - 1 bytes, per the parse contract.
    let field_data_len = total_len - base_addr - 1;
    let field_data = &bytes[base_addr..base_addr + field_data_len];

    let mut fields = Vec::with_capacity(entries.len());
    for (tag, pos, len, custom) in entries {
        if pos + len > field_data.len() {
            return Err(IsisError::format(
                format!("directory entry for tag `{tag:?}` points past the field-data region"),
                base_addr + pos,
            ));
        }
        let slice = &field_data[pos..pos + len];
        let (value, term) = slice.split_at(len - 1);
        if term != [geom.field_terminator] {
            return Err(IsisError::format(
                format!("field for tag `{tag:?}` is missing its terminator"),
                base_addr + pos + len - 1,
            ));
        }
        fields.push(RawField { tag, custom, value: value.to_vec() });
    }

    let record_term_offset = base_addr + field_data_len;
    if bytes.get(record_term_offset) != Some(&geom.record_terminator) {
        return Err(IsisError::format("missing record terminator", record_term_offset));
    }

    Ok((IsoRecord { leader, fields }, total_len))
}
