//! Crate-wide error taxonomy.
//!
//! One variant family per decoder/encoder namespace, mirroring the
//! error codes a caller would have seen from the original C client
//! (`LVL_ERR_VERSION`, `CW_ERR_ROOT_TAG`, `DAT_ERR_JCLASS_TYPE`, ...).

use std::io;

/// Everything that can go wrong decoding or encoding a world.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read ran off the end of the available data.
    #[error("unexpected end of file")]
    UnexpectedEof,

    /// Any other I/O failure (stream closed, permission denied, ...).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The GZIP member header was malformed or used an unsupported method.
    #[error("bad gzip header: {0}")]
    Gzip(#[from] GzipError),

    /// NBT structural errors.
    #[error("NBT error: {0}")]
    Nbt(#[from] NbtError),

    /// MCSharp LVL structural errors.
    #[error("LVL error: {0}")]
    Lvl(#[from] LvlError),

    /// fCraft FCM structural errors.
    #[error("FCM error: {0}")]
    Fcm(#[from] FcmError),

    /// ClassicWorld structural errors.
    #[error("ClassicWorld error: {0}")]
    Cw(#[from] CwError),

    /// Minecraft Classic DAT structural errors.
    #[error("DAT error: {0}")]
    Dat(#[from] DatError),

    /// The format dispatcher did not recognize a file extension.
    #[error("unrecognized map extension: {0:?}")]
    UnrecognizedExtension(String),
}

/// `C2`: GZIP member-header errors (RFC 1952 §2.3).
#[derive(Debug, thiserror::Error)]
pub enum GzipError {
    #[error("bad gzip magic")]
    BadMagic,
    #[error("unsupported compression method (only DEFLATE/8 is supported)")]
    UnsupportedMethod,
    #[error("truncated gzip header")]
    Truncated,
}

/// `C3`: NBT reader errors.
#[derive(Debug, thiserror::Error)]
pub enum NbtError {
    #[error("unexpected TAG_End")]
    UnexpectedEndTag,
    #[error("unknown tag id {tag} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },
    #[error("TAG_Int_Array (I32S) is not supported")]
    Int32SUnsupported,
    #[error("string exceeds maximum length")]
    StringTooLong,
    #[error("root tag was {0}, expected TAG_Compound")]
    IncorrectRootTag(u8),
}

/// `C4`: LVL errors.
#[derive(Debug, thiserror::Error)]
pub enum LvlError {
    #[error("bad LVL version magic {0:#06x}, expected 0x0752")]
    BadVersion(u16),
}

/// `C5`: FCM errors.
#[derive(Debug, thiserror::Error)]
pub enum FcmError {
    #[error("bad FCM identifier {0:#010x}")]
    BadIdentifier(u32),
    #[error("bad FCM revision {0}, expected 13")]
    BadRevision(u8),
}

/// `C6`: ClassicWorld errors.
#[derive(Debug, thiserror::Error)]
pub enum CwError {
    #[error("root tag is not a compound named ClassicWorld")]
    RootTagNotDict,
    #[error("UUID tag was {0} bytes, expected 16")]
    BadUuid(usize),
}

/// `C7`: DAT (Java object stream) errors.
#[derive(Debug, thiserror::Error)]
pub enum DatError {
    #[error("bad DAT identifier {0:#010x}, expected 0x271BB788")]
    BadIdentifier(u32),
    #[error("bad DAT version {0}, expected 2")]
    BadVersion(u8),
    #[error("bad Java stream magic {0:#06x}, expected 0xACED")]
    BadJavaIdentifier(u16),
    #[error("bad Java stream version {0}, expected 5")]
    BadJavaVersion(u16),
    #[error("root object type code {0:#04x}, expected TC_OBJECT")]
    BadRootType(u8),
    #[error("Java UTF string exceeds maximum length")]
    StringTooLong,
    #[error("bad class descriptor type code {0:#04x}")]
    BadClassType(u8),
    #[error("class descriptor has too many fields ({0})")]
    TooManyFields(usize),
    #[error("missing TC_ENDBLOCKDATA after class annotations")]
    MissingEndBlockData,
    #[error("bad field class-name type code {0:#04x}")]
    BadFieldClassName(u8),
    #[error("bad object field type code {0:#04x}")]
    BadObjectType(u8),
    #[error("bad array field type code {0:#04x}")]
    BadArrayType(u8),
    #[error("array class descriptor did not describe a byte array")]
    BadArrayContent,
}

