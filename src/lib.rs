#![forbid(unsafe_code)]

//! Converts bibliographic records between ISO 2709, CDS/ISIS Master
//! File (MST+XRF), and line-delimited JSON.
//!
//! The crate is organized as a handful of small, composable codecs
//! rather than one monolithic converter:
//!
//! - [`geometry`]/[`leader`]/[`record`]: the ISO 2709 wire format itself.
//! - [`subfield`]: the `^key value` mini-language inside a field value.
//! - [`linewrap`]: the optional fixed-width line framing some ISO 2709
//!   streams are wrapped in.
//! - [`iso`]: stream-level reading/writing of concatenated records.
//! - [`mst`]: random access into a CDS/ISIS Master File by MFN.
//! - [`dict`]: the `{tag: [value, ...]}` view the JSONL front end uses.
//! - [`encoding`]: byte encoding transcoding shared by all of the above.
//! - [`error`]: the error taxonomy every codec in this crate returns.

pub mod dict;
pub mod encoding;
pub mod error;
pub mod geometry;
pub mod iso;
pub mod leader;
pub mod linewrap;
pub mod mst;
pub mod record;
pub mod subfield;

pub use dict::Dict;
pub use error::{IsisError, Result};
pub use geometry::Geometry;
pub use iso::{IsoReader, IsoWriter};
pub use leader::Leader;
pub use linewrap::{LineUnwrapReader, LineWrapWriter};
pub use mst::{MstReader, MstRecord, MstWidth};
pub use record::{IsoRecord, RawField};
pub use subfield::{SubfieldMode, SubfieldValue};
