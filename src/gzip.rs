//! `C2`: RFC 1952 GZIP member-header skipping.
//!
//! This crate owns the header parsing itself rather than handing the
//! whole stream to `flate2::read::GzDecoder`, so that the inflater only
//! ever sees a raw DEFLATE stream. This mirrors the split between
//! header parsing and the DEFLATE codec in the original C client.

use crate::error::{Error, GzipError};
use crate::io::ByteReader;
use flate2::read::DeflateDecoder;
use std::io::Read;

const FLAG_FTEXT: u8 = 0x01;
const FLAG_FHCRC: u8 = 0x02;
const FLAG_FEXTRA: u8 = 0x04;
const FLAG_FNAME: u8 = 0x08;
const FLAG_FCOMMENT: u8 = 0x10;

/// Narrows a short read to [`GzipError::Truncated`]; any other I/O
/// failure keeps propagating as [`Error::Io`] rather than being
/// misreported as a truncated header.
fn truncated(e: Error) -> Error {
    match e {
        Error::UnexpectedEof => GzipError::Truncated.into(),
        other => other,
    }
}

/// Consumes a GZIP member header from `reader` and wraps the remainder
/// in a raw DEFLATE decoder. `reader` must be positioned at the very
/// start of the GZIP stream.
pub fn skip_header_and_inflate<R: Read>(
    mut reader: ByteReader<R>,
) -> Result<DeflateDecoder<R>, Error> {
    let magic = reader.read_u16_le().map_err(truncated)?;
    if magic != 0x8B1F {
        return Err(GzipError::BadMagic.into());
    }
    let method = reader.read_u8().map_err(truncated)?;
    if method != 8 {
        return Err(GzipError::UnsupportedMethod.into());
    }
    let flags = reader.read_u8().map_err(truncated)?;
    // mtime (4), xfl (1), os (1)
    reader.skip(6).map_err(truncated)?;

    if flags & FLAG_FEXTRA != 0 {
        let extra_len = reader.read_u16_le().map_err(truncated)? as usize;
        reader.skip(extra_len).map_err(truncated)?;
    }
    if flags & FLAG_FNAME != 0 {
        skip_cstring(&mut reader)?;
    }
    if flags & FLAG_FCOMMENT != 0 {
        skip_cstring(&mut reader)?;
    }
    if flags & FLAG_FHCRC != 0 {
        reader.skip(2).map_err(truncated)?;
    }

    Ok(DeflateDecoder::new(reader.into_inner()))
}

fn skip_cstring<R: Read>(reader: &mut ByteReader<R>) -> Result<(), Error> {
    loop {
        let b = reader.read_u8().map_err(truncated)?;
        if b == 0 {
            return Ok(());
        }
    }
}
