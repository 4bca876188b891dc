//! `C8`: file-extension based format dispatch, plus the `load`
//! convenience wrapper that logs and re-raises decode failures the way
//! the original client's `Map_LoadFrom` did.

pub mod cw;
pub mod dat;
pub mod fcm;
pub mod lvl;
pub mod schematic;

use crate::error::Error;
use crate::world::World;
use std::io::Read;
use std::path::Path;

/// One of the four recognized map container formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Lvl,
    Fcm,
    Cw,
    Dat,
}

impl Format {
    /// Matches a file extension case-insensitively, as the original
    /// client's importer table does.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_ascii_lowercase().as_str() {
            "lvl" => Some(Format::Lvl),
            "fcm" => Some(Format::Fcm),
            "cw" => Some(Format::Cw),
            "dat" => Some(Format::Dat),
            _ => None,
        }
    }
}

/// Decodes `reader` according to `format`.
pub fn decode<R: Read>(format: Format, reader: R) -> Result<World, Error> {
    match format {
        Format::Lvl => lvl::decode(reader),
        Format::Fcm => fcm::decode(reader),
        Format::Cw => cw::decode(reader, None),
        Format::Dat => dat::decode(reader),
    }
}

/// Looks up the format from `path`'s extension, decodes the file, and
/// logs a warning (rather than panicking or discarding the error
/// silently) if anything goes wrong — mirroring `Map_LoadFrom`'s
/// `Logger_Warn2` call sites.
pub fn load(path: &Path) -> Result<World, Error> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::UnrecognizedExtension(format!("{:?}", path)))?;
    let format = Format::from_extension(ext)
        .ok_or_else(|| Error::UnrecognizedExtension(ext.to_string()))?;

    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            log::warn!("error opening {}: {}", path.display(), e);
            return Err(e.into());
        }
    };

    match decode(format, file) {
        Ok(world) => Ok(world),
        Err(err) => {
            log::warn!("error decoding {}: {}", path.display(), err);
            Err(err)
        }
    }
}
