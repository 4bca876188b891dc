//! `C3`: the NBT tagged-tree reader.
//!
//! Unlike the teacher crate this module is descended from — which
//! materializes a whole borrowed [`Tag`] tree before a caller inspects
//! it — this reader drives a visitor callback once per tag, in post
//! order, matching the recursive-descent shape of the original decoder.
//! A tag's ancestry is tracked as an explicit name stack rather than a
//! linked parent pointer, since a literal `parent: &'a Tag<'a>` field
//! would require a self-referential lifetime that recursive-descent
//! parsing cannot produce in safe Rust (see `DESIGN.md`).

mod writer;

pub use writer::{CompoundWriter, ListWriter, NbtWriter};

use crate::error::{Error, NbtError};
use byteorder::{BigEndian, ByteOrder};

/// Maximum length (in bytes, pre-UTF8-validation) of any NBT name or
/// string value, matching the original client's fixed
/// `NBT_STRING_SIZE*4` buffer (`uint8_t buffer[NBT_STRING_SIZE*4]` in
/// `Nbt_ReadString`) — lengths up to and including this bound decode;
/// only a longer value is `CW_ERR_STRING_LEN`. Unlike the original's
/// fixed buffer, this reader slices directly into the document, so
/// nothing truncates below this bound.
pub const MAX_STRING_LEN: usize = 256;

/// Byte-array payloads at or below this size are copied into an inline
/// buffer rather than heap-allocated.
pub const SMALL_ARRAY_SIZE: usize = 64;

/// One of the twelve NBT tag kinds understood by this format. `I32Array`
/// is recognized only so it can be rejected with a precise error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    I8 = 1,
    I16 = 2,
    I32 = 3,
    I64 = 4,
    F32 = 5,
    R64 = 6,
    I8Array = 7,
    String = 8,
    List = 9,
    Dict = 10,
    I32Array = 11,
}

impl TagKind {
    fn from_byte(byte: u8, offset: usize) -> Result<TagKind, Error> {
        Ok(match byte {
            0 => TagKind::End,
            1 => TagKind::I8,
            2 => TagKind::I16,
            3 => TagKind::I32,
            4 => TagKind::I64,
            5 => TagKind::F32,
            6 => TagKind::R64,
            7 => TagKind::I8Array,
            8 => TagKind::String,
            9 => TagKind::List,
            10 => TagKind::Dict,
            11 => TagKind::I32Array,
            _ => return Err(NbtError::UnknownTag { tag: byte, offset }.into()),
        })
    }
}

/// A byte-array tag's payload: small arrays are copied inline, large
/// ones are heap-owned and may be taken by a visitor.
#[derive(Debug)]
pub enum ByteArrayValue {
    Small([u8; SMALL_ARRAY_SIZE], usize),
    Big(Option<Vec<u8>>),
}

impl ByteArrayValue {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            ByteArrayValue::Small(buf, len) => &buf[..*len],
            ByteArrayValue::Big(Some(v)) => v,
            ByteArrayValue::Big(None) => &[],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ByteArrayValue::Small(_, len) => *len,
            ByteArrayValue::Big(v) => v.as_ref().map_or(0, |v| v.len()),
        }
    }

    /// Copies the payload into an owned buffer. Always allocates.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Takes ownership of a heap-backed payload without copying.
    /// Returns `None` for small (inline) arrays — those must be copied
    /// with [`ByteArrayValue::to_vec`] instead.
    pub fn take(&mut self) -> Option<Vec<u8>> {
        match self {
            ByteArrayValue::Big(v) => v.take(),
            ByteArrayValue::Small(..) => None,
        }
    }
}

/// The decoded value carried by a tag. Container tags (`List`/`Dict`)
/// carry only their shape; their children have already been dispatched
/// to the visitor by the time the container's own callback fires.
#[derive(Debug)]
pub enum TagValue<'a> {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    R64(f64),
    ByteArray(ByteArrayValue),
    Str(&'a str),
    List { child_kind: TagKind, len: u32 },
    Dict,
}

/// One decoded NBT tag, handed to the visitor by reference (or mutable
/// reference, for byte arrays that may be taken).
#[derive(Debug)]
pub struct Tag<'a> {
    pub kind: TagKind,
    pub name: &'a str,
    pub value: TagValue<'a>,
}

impl<'a> Tag<'a> {
    pub fn as_i16(&self) -> Option<i16> {
        match self.value {
            TagValue::I16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self.value {
            TagValue::I32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self.value {
            TagValue::I8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self.value {
            TagValue::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self.value {
            TagValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&ByteArrayValue> {
        match &self.value {
            TagValue::ByteArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_byte_array_mut(&mut self) -> Option<&mut ByteArrayValue> {
        match &mut self.value {
            TagValue::ByteArray(v) => Some(v),
            _ => None,
        }
    }
}

/// Zero-copy cursor over an in-memory buffer, used once a document's
/// DEFLATE payload has been fully decompressed into a `Vec<u8>`.
pub struct Reader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buffer: &'a [u8]) -> Reader<'a> {
        Reader { buffer, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn advance(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if self.buffer.len() < self.position + n {
            return Err(Error::UnexpectedEof);
        }
        let slice = &self.buffer[self.position..self.position + n];
        self.position += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.advance(1)?[0])
    }

    fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.advance(1)?[0] as i8)
    }

    fn read_u16_be(&mut self) -> Result<u16, Error> {
        Ok(BigEndian::read_u16(self.advance(2)?))
    }

    fn read_i16_be(&mut self) -> Result<i16, Error> {
        Ok(BigEndian::read_i16(self.advance(2)?))
    }

    fn read_i32_be(&mut self) -> Result<i32, Error> {
        Ok(BigEndian::read_i32(self.advance(4)?))
    }

    fn read_u32_be(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.advance(4)?))
    }

    fn read_i64_be(&mut self) -> Result<i64, Error> {
        Ok(BigEndian::read_i64(self.advance(8)?))
    }

    fn read_f32_be(&mut self) -> Result<f32, Error> {
        Ok(BigEndian::read_f32(self.advance(4)?))
    }

    fn read_f64_be(&mut self) -> Result<f64, Error> {
        Ok(BigEndian::read_f64(self.advance(8)?))
    }
}

/// A stack of ancestor names, pushed on entering a `List`/`Dict` level
/// and popped on leaving it. This is the sole replacement for a
/// `tag.parent` pointer chain (see module docs).
pub type Ancestors<'a> = [&'a str];

/// Visitor invoked once per tag, in post order: every descendant of a
/// container has already been visited by the time the container itself
/// is. `depth` counts from the root tag (depth 0).
pub trait Visitor<'a> {
    fn visit(&mut self, tag: &mut Tag<'a>, depth: usize, ancestors: &Ancestors<'a>) -> Result<(), Error>;
}

impl<'a, F> Visitor<'a> for F
where
    F: FnMut(&mut Tag<'a>, usize, &Ancestors<'a>) -> Result<(), Error>,
{
    fn visit(&mut self, tag: &mut Tag<'a>, depth: usize, ancestors: &Ancestors<'a>) -> Result<(), Error> {
        self(tag, depth, ancestors)
    }
}

/// Reads one document: a root tag, which must be `TAG_Dict`, driving
/// `visitor` once per tag in post order.
pub fn read_document<'a>(data: &'a [u8], visitor: &mut dyn Visitor<'a>) -> Result<(), Error> {
    let mut reader = Reader::new(data);
    let offset = reader.position();
    let kind = TagKind::from_byte(reader.read_u8()?, offset)?;
    if kind != TagKind::Dict {
        return Err(NbtError::IncorrectRootTag(kind as u8).into());
    }
    let mut ancestors: Vec<&'a str> = Vec::new();
    let mut root = read_named_tag(&mut reader, kind, &mut ancestors, 0, visitor)?;
    visitor.visit(&mut root, 0, &ancestors)
}

fn read_nbt_string<'a>(reader: &mut Reader<'a>) -> Result<&'a str, Error> {
    let len = reader.read_u16_be()? as usize;
    if len > MAX_STRING_LEN {
        return Err(NbtError::StringTooLong.into());
    }
    let bytes = reader.advance(len)?;
    std::str::from_utf8(bytes).map_err(|_| NbtError::StringTooLong.into())
}

fn read_named_tag<'a>(
    reader: &mut Reader<'a>,
    kind: TagKind,
    ancestors: &mut Vec<&'a str>,
    depth: usize,
    visitor: &mut dyn Visitor<'a>,
) -> Result<Tag<'a>, Error> {
    let name = read_nbt_string(reader)?;
    read_tag_body(reader, kind, name, ancestors, depth, visitor)
}

fn read_byte_array<'a>(reader: &mut Reader<'a>) -> Result<ByteArrayValue, Error> {
    let len = reader.read_u32_be()? as usize;
    if len <= SMALL_ARRAY_SIZE {
        let mut buf = [0u8; SMALL_ARRAY_SIZE];
        buf[..len].copy_from_slice(reader.advance(len)?);
        Ok(ByteArrayValue::Small(buf, len))
    } else {
        Ok(ByteArrayValue::Big(Some(reader.advance(len)?.to_vec())))
    }
}

fn read_tag_body<'a>(
    reader: &mut Reader<'a>,
    kind: TagKind,
    name: &'a str,
    ancestors: &mut Vec<&'a str>,
    depth: usize,
    visitor: &mut dyn Visitor<'a>,
) -> Result<Tag<'a>, Error> {
    let value = match kind {
        TagKind::End => return Err(NbtError::UnexpectedEndTag.into()),
        TagKind::I8 => TagValue::I8(reader.read_i8()?),
        TagKind::I16 => TagValue::I16(reader.read_i16_be()?),
        TagKind::I32 => TagValue::I32(reader.read_i32_be()?),
        TagKind::I64 => TagValue::I64(reader.read_i64_be()?),
        TagKind::F32 => TagValue::F32(reader.read_f32_be()?),
        TagKind::R64 => TagValue::R64(reader.read_f64_be()?),
        TagKind::I8Array => TagValue::ByteArray(read_byte_array(reader)?),
        TagKind::String => TagValue::Str(read_nbt_string(reader)?),
        TagKind::I32Array => return Err(NbtError::Int32SUnsupported.into()),
        TagKind::List => {
            let offset = reader.position();
            let child_kind = TagKind::from_byte(reader.read_u8()?, offset)?;
            let count = reader.read_u32_be()?;
            ancestors.push(name);
            for _ in 0..count {
                let mut child = read_tag_body(reader, child_kind, "", ancestors, depth + 1, visitor)?;
                visitor.visit(&mut child, depth + 1, ancestors)?;
            }
            ancestors.pop();
            TagValue::List { child_kind, len: count }
        }
        TagKind::Dict => {
            ancestors.push(name);
            loop {
                let offset = reader.position();
                let child_kind = TagKind::from_byte(reader.read_u8()?, offset)?;
                if child_kind == TagKind::End {
                    break;
                }
                let mut child = read_named_tag(reader, child_kind, ancestors, depth + 1, visitor)?;
                visitor.visit(&mut child, depth + 1, ancestors)?;
            }
            ancestors.pop();
            TagValue::Dict
        }
    };
    Ok(Tag { kind, name, value })
}
