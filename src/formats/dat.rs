//! `C7`: Minecraft Classic DAT decoder.
//!
//! A small outer container (magic + version) wraps a GZIP member whose
//! payload is a Java object-serialization stream (JLS/JVMS "Object
//! Serialization Stream Protocol") holding one serialized `Level`-like
//! object. This module implements only as much of that protocol as the
//! known on-disk layout needs: class descriptors, primitive and string
//! field values, byte arrays, and a hardcoded structural skip for the
//! legacy `HashMap`-backed block storage some servers wrote instead of
//! a plain `byte[]` (see [`skip_hashmap_body`]).

use crate::error::{DatError, Error};
use crate::gzip;
use crate::io::ByteReader;
use crate::world::World;
use std::collections::HashMap;
use std::io::{Cursor, Read};

const TC_NULL: u8 = 0x70;
const TC_REFERENCE: u8 = 0x71;
const TC_CLASSDESC: u8 = 0x72;
const TC_OBJECT: u8 = 0x73;
const TC_STRING: u8 = 0x74;
const TC_ARRAY: u8 = 0x75;
const TC_ENDBLOCKDATA: u8 = 0x78;

/// `JNAME_SIZE` in the original decoder — every length-prefixed string
/// this grammar reads (class names, field names, array element class
/// names) shares the same cap.
const MAX_JAVA_STRING_LEN: usize = 48;

/// Size of the fixed `JFieldDesc[22]` array the original decoder reads
/// class descriptor fields into.
const MAX_CLASS_FIELDS: usize = 22;

const DAT_IDENTIFIER: u32 = 0x271B_B788;
const DAT_VERSION: u8 = 2;
const JAVA_STREAM_MAGIC: u16 = 0xACED;
const JAVA_STREAM_VERSION: u16 = 5;

/// A decoded Java field value. Containers (`Object`/`Array`) are not
/// resolved any further than the fields this decoder actually reads.
#[derive(Debug)]
enum JavaValue {
    Null,
    Bool(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    ByteArray(Vec<u8>),
    Object(HashMap<String, JavaValue>),
    /// A value this decoder structurally consumed but did not interpret
    /// (back-references, the legacy `HashMap` block-storage body).
    Unresolved,
}

impl JavaValue {
    fn as_int(&self) -> Option<i32> {
        match self {
            JavaValue::Int(v) => Some(*v),
            JavaValue::Short(v) => Some(*v as i32),
            JavaValue::Byte(v) => Some(*v as i32),
            _ => None,
        }
    }
}

struct FieldDesc {
    type_char: u8,
    name: String,
}

struct ClassDesc {
    name: String,
    fields: Vec<FieldDesc>,
    super_desc: Option<Box<ClassDesc>>,
}

type JReader<'b> = ByteReader<Cursor<&'b [u8]>>;

fn read_utf(reader: &mut JReader<'_>) -> Result<String, Error> {
    let len = reader.read_u16_be()? as usize;
    if len > MAX_JAVA_STRING_LEN {
        return Err(DatError::StringTooLong.into());
    }
    let bytes = reader.read_vec(len)?;
    String::from_utf8(bytes).map_err(|_| DatError::StringTooLong.into())
}

fn read_field_class_name(reader: &mut JReader<'_>) -> Result<String, Error> {
    let tag = reader.read_u8()?;
    match tag {
        TC_STRING => read_utf(reader),
        TC_REFERENCE => {
            reader.read_u32_be()?;
            Ok(String::new())
        }
        other => Err(DatError::BadFieldClassName(other).into()),
    }
}

fn read_class_desc(reader: &mut JReader<'_>) -> Result<Option<ClassDesc>, Error> {
    let tag = reader.read_u8()?;
    match tag {
        TC_NULL => Ok(None),
        TC_REFERENCE => {
            reader.read_u32_be()?;
            Ok(None)
        }
        TC_CLASSDESC => {
            let name = read_utf(reader)?;
            // 8-byte serialVersionUID + 1-byte flags, both unexamined —
            // the original decoder skips this span wholesale rather than
            // branching on the `SC_WRITE_METHOD` bit it carries.
            reader.skip(9)?;
            let field_count = reader.read_u16_be()? as usize;
            if field_count > MAX_CLASS_FIELDS {
                return Err(DatError::TooManyFields(field_count).into());
            }
            let mut fields = Vec::with_capacity(field_count);
            for _ in 0..field_count {
                let type_char = reader.read_u8()?;
                let field_name = read_utf(reader)?;
                if type_char == b'L' || type_char == b'[' {
                    read_field_class_name(reader)?;
                }
                fields.push(FieldDesc { type_char, name: field_name });
            }
            let marker = reader.read_u8()?;
            if marker != TC_ENDBLOCKDATA {
                return Err(DatError::MissingEndBlockData.into());
            }
            let super_desc = read_class_desc(reader)?.map(Box::new);
            Ok(Some(ClassDesc { name, fields, super_desc }))
        }
        other => Err(DatError::BadClassType(other).into()),
    }
}

/// Reads one scalar field value. Object (`L`) and array (`[`) fields
/// aren't handled here — both need the enclosing field's name to decide
/// how to read them, so [`read_classdata`] dispatches those itself.
fn read_scalar(reader: &mut JReader<'_>, type_char: u8) -> Result<JavaValue, Error> {
    Ok(match type_char {
        b'B' => JavaValue::Byte(reader.read_i8()?),
        b'C' => JavaValue::Char(reader.read_u16_be()?),
        b'D' => JavaValue::Double(reader.read_f64_be()?),
        b'F' => JavaValue::Float(reader.read_f32_be()?),
        b'I' => JavaValue::Int(reader.read_i32_be()?),
        b'J' => JavaValue::Long(reader.read_i64_be()?),
        b'S' => JavaValue::Short(reader.read_i16_be()?),
        b'Z' => JavaValue::Bool(reader.read_i8()? != 0),
        other => return Err(DatError::BadObjectType(other).into()),
    })
}

/// Reads one class hierarchy's worth of instance data, superclass first,
/// matching wire order.
///
/// Object (`L`) fields follow the original decoder's field-name-driven
/// rule rather than any class-level flag: only a field literally named
/// `blockMap` is read at all, as the legacy `HashMap`-backed block
/// storage (structurally skipped, never parsed — see
/// [`skip_hashmap_body`]). Any other object field ends field processing
/// for the enclosing object right there — the original never even reads
/// a type-code byte for what follows. See `DESIGN.md`.
fn read_classdata(reader: &mut JReader<'_>, desc: &ClassDesc, out: &mut HashMap<String, JavaValue>) -> Result<(), Error> {
    if let Some(super_desc) = &desc.super_desc {
        read_classdata(reader, super_desc, out)?;
    }
    for field in &desc.fields {
        match field.type_char {
            b'L' => {
                if !field.name.eq_ignore_ascii_case("blockMap") {
                    return Ok(());
                }
                match reader.read_u8()? {
                    TC_OBJECT => skip_hashmap_body(reader)?,
                    TC_NULL => {}
                    other => return Err(DatError::BadObjectType(other).into()),
                }
            }
            b'[' => match reader.read_u8()? {
                TC_NULL => {}
                TC_ARRAY => {
                    let arr_desc = read_class_desc(reader)?.ok_or(DatError::BadArrayType(TC_NULL))?;
                    if arr_desc.name.as_bytes().get(1) != Some(&b'B') {
                        return Err(DatError::BadArrayContent.into());
                    }
                    let len = reader.read_i32_be()?.max(0) as usize;
                    out.insert(field.name.clone(), JavaValue::ByteArray(reader.read_vec(len)?));
                }
                other => return Err(DatError::BadArrayType(other).into()),
            },
            type_char => {
                out.insert(field.name.clone(), read_scalar(reader, type_char)?);
            }
        }
    }
    Ok(())
}

/// `java.util.HashMap` writes its bucket table itself (`writeObject`),
/// not through default field serialization, so a generic class-data
/// reader can't walk it. The exact byte counts below were measured
/// against one canonical `blockMap`-shaped level file rather than
/// derived from `HashMap`'s serialized form in general — this decoder
/// does not recover block data stored this way, it only consumes the
/// bytes structurally so the fields that follow can still be read.
/// Called directly off a raw `TC_OBJECT` read, without first parsing a
/// nested class descriptor for the map object — the original never
/// reads one here either, and doing so would misalign every offset
/// below. Ends after the final skip with no trailing marker read: in
/// Java's alphabetical field ordering `blockMap` precedes `blocks`, so
/// the byte right after this skip is `blocks`'s own type code, not an
/// end-of-object marker — consuming it here would misalign the array
/// read that follows.
fn skip_hashmap_body(reader: &mut JReader<'_>) -> Result<(), Error> {
    reader.skip(315)?;
    let count = reader.read_i32_be()?.max(0) as usize;
    reader.skip(17 * count)?;
    reader.skip(152)?;
    Ok(())
}

/// Reads one tagged value. Only ever reached for the root object in
/// [`decode`] — field-level object/array values are read directly by
/// [`read_classdata`], which needs the field name to know how.
fn read_content(reader: &mut JReader<'_>, tag: u8) -> Result<JavaValue, Error> {
    match tag {
        TC_NULL => Ok(JavaValue::Null),
        TC_REFERENCE => {
            reader.read_u32_be()?;
            Ok(JavaValue::Unresolved)
        }
        TC_STRING => Ok(JavaValue::Str(read_utf(reader)?)),
        TC_OBJECT => {
            let desc = read_class_desc(reader)?.ok_or(DatError::BadClassType(TC_NULL))?;
            let mut fields = HashMap::new();
            read_classdata(reader, &desc, &mut fields)?;
            Ok(JavaValue::Object(fields))
        }
        TC_ARRAY => {
            let desc = read_class_desc(reader)?.ok_or(DatError::BadArrayType(TC_NULL))?;
            if desc.name.as_bytes().get(1) != Some(&b'B') {
                return Err(DatError::BadArrayContent.into());
            }
            let len = reader.read_i32_be()?.max(0) as usize;
            Ok(JavaValue::ByteArray(reader.read_vec(len)?))
        }
        other => Err(DatError::BadObjectType(other).into()),
    }
}

fn field_int(fields: &HashMap<String, JavaValue>, names: &[&str]) -> Option<i32> {
    names.iter().find_map(|n| fields.get(*n).and_then(JavaValue::as_int))
}

/// Decodes a GZIP-compressed Minecraft Classic `.dat` level file.
pub fn decode<R: Read>(stream: R) -> Result<World, Error> {
    let mut outer = ByteReader::new(stream);
    let identifier = outer.read_u32_be()?;
    if identifier != DAT_IDENTIFIER {
        return Err(DatError::BadIdentifier(identifier).into());
    }
    let version = outer.read_u8()?;
    if version != DAT_VERSION {
        return Err(DatError::BadVersion(version).into());
    }

    let mut deflate = gzip::skip_header_and_inflate(outer)?;
    let mut data = Vec::new();
    deflate.read_to_end(&mut data)?;

    let mut reader = ByteReader::new(Cursor::new(data.as_slice()));
    let magic = reader.read_u16_be()?;
    if magic != JAVA_STREAM_MAGIC {
        return Err(DatError::BadJavaIdentifier(magic).into());
    }
    let stream_version = reader.read_u16_be()?;
    if stream_version != JAVA_STREAM_VERSION {
        return Err(DatError::BadJavaVersion(stream_version).into());
    }

    let root_tag = reader.read_u8()?;
    if root_tag != TC_OBJECT {
        return Err(DatError::BadRootType(root_tag).into());
    }
    let fields = match read_content(&mut reader, root_tag)? {
        JavaValue::Object(fields) => fields,
        _ => return Err(DatError::BadRootType(root_tag).into()),
    };

    // Wire field names don't line up with this crate's axes: the wire's
    // `height` is the map's length, and its `depth` is the map's height.
    // See `skip_hashmap_body` and `DESIGN.md` for why `blockMap` itself
    // is never a source of block bytes.
    let width = field_int(&fields, &["width"]).unwrap_or(0).max(0) as u16;
    let length = field_int(&fields, &["height"]).unwrap_or(0).max(0) as u16;
    let height = field_int(&fields, &["depth"]).unwrap_or(0).max(0) as u16;

    let mut world = World::new(width, height, length);

    if let Some(JavaValue::ByteArray(bytes)) = fields.get("blocks") {
        world.blocks = bytes.clone();
    } // otherwise legacy HashMap-backed storage: left zero-filled, see skip_hashmap_body

    if let Some(JavaValue::Int(x)) = fields.get("xSpawn").or_else(|| fields.get("x")) {
        world.spawn.x = *x as f32;
    }
    if let Some(JavaValue::Int(y)) = fields.get("ySpawn").or_else(|| fields.get("y")) {
        world.spawn.y = *y as f32;
    }
    if let Some(JavaValue::Int(z)) = fields.get("zSpawn").or_else(|| fields.get("z")) {
        world.spawn.z = *z as f32;
    }

    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor as StdCursor, Write};

    fn utf(s: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(s.len() as u16).to_be_bytes());
        out.extend_from_slice(s.as_bytes());
        out
    }

    /// Builds a minimal Java object stream for one class with the wire's
    /// own field names — `width`, `depth`, `height` in that on-wire
    /// order, per the canonical `Level` class this format was lifted
    /// from — plus a `byte[]` field (blocks), no superclass, no custom
    /// `writeObject` body.
    fn build_level_object(wire_width: i32, wire_depth: i32, wire_height: i32, blocks: &[u8]) -> Vec<u8> {
        let mut s = Vec::new();
        s.extend_from_slice(&JAVA_STREAM_MAGIC.to_be_bytes());
        s.extend_from_slice(&JAVA_STREAM_VERSION.to_be_bytes());
        s.push(TC_OBJECT);
        s.push(TC_CLASSDESC);
        s.extend(utf("Level"));
        s.extend_from_slice(&0i64.to_be_bytes()); // serialVersionUID
        s.push(0); // flags: no SC_WRITE_METHOD
        s.extend_from_slice(&4u16.to_be_bytes()); // field count
        s.push(b'I');
        s.extend(utf("width"));
        s.push(b'I');
        s.extend(utf("depth"));
        s.push(b'I');
        s.extend(utf("height"));
        s.push(b'[');
        s.extend(utf("blocks"));
        s.push(TC_STRING);
        s.extend(utf("[B"));
        s.push(TC_ENDBLOCKDATA); // class annotation (empty)
        s.push(TC_NULL); // no superclass
        // classdata, in field-declaration order: width, depth, height, blocks
        s.extend_from_slice(&wire_width.to_be_bytes());
        s.extend_from_slice(&wire_depth.to_be_bytes());
        s.extend_from_slice(&wire_height.to_be_bytes());
        s.push(TC_ARRAY);
        s.push(TC_CLASSDESC);
        s.extend(utf("[B"));
        s.extend_from_slice(&0i64.to_be_bytes());
        s.push(0);
        s.extend_from_slice(&0u16.to_be_bytes());
        s.push(TC_ENDBLOCKDATA);
        s.push(TC_NULL);
        s.extend_from_slice(&(blocks.len() as i32).to_be_bytes());
        s.extend_from_slice(blocks);
        s
    }

    fn wrap(java_stream: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(java_stream).unwrap();
        let gz = enc.finish().unwrap();
        let mut out = Vec::new();
        out.extend_from_slice(&DAT_IDENTIFIER.to_be_bytes());
        out.push(DAT_VERSION);
        out.extend_from_slice(&gz);
        out
    }

    #[test]
    fn rejects_bad_identifier() {
        let data = wrap(&build_level_object(1, 1, 1, &[0]));
        let mut bad = data;
        bad[0] = 0;
        let err = decode(StdCursor::new(bad)).unwrap_err();
        assert!(matches!(err, Error::Dat(DatError::BadIdentifier(_))));
    }

    #[test]
    fn decodes_minimal_level_object() {
        let data = wrap(&build_level_object(2, 3, 4, &[0u8; 24]));
        let world = decode(StdCursor::new(data)).unwrap();
        assert_eq!((world.width, world.height, world.length), (2, 3, 4));
        assert_eq!(world.blocks.len(), 24);
    }

    /// A field typed `L` that isn't named `blockMap` ends field
    /// processing for the enclosing object right there — no byte is
    /// even read for it, let alone for anything declared after it.
    #[test]
    fn non_blockmap_object_field_halts_remaining_fields() {
        let mut s = Vec::new();
        s.extend_from_slice(&JAVA_STREAM_MAGIC.to_be_bytes());
        s.extend_from_slice(&JAVA_STREAM_VERSION.to_be_bytes());
        s.push(TC_OBJECT);
        s.push(TC_CLASSDESC);
        s.extend(utf("Level"));
        s.extend_from_slice(&0i64.to_be_bytes());
        s.push(0);
        s.extend_from_slice(&2u16.to_be_bytes());
        s.push(b'I');
        s.extend(utf("width"));
        s.push(b'L');
        s.extend(utf("foo"));
        s.push(TC_STRING);
        s.extend(utf("java/lang/String"));
        s.push(TC_ENDBLOCKDATA);
        s.push(TC_NULL);
        s.extend_from_slice(&7i32.to_be_bytes()); // width; nothing follows for "foo"

        let world = decode(StdCursor::new(wrap(&s))).unwrap();
        assert_eq!(world.width, 7);
        assert_eq!(world.length, 0);
    }

    /// A field named `blockMap` is read structurally (see
    /// [`skip_hashmap_body`]) and processing continues to later fields.
    #[test]
    fn blockmap_field_is_skipped_and_later_fields_still_parse() {
        let mut s = Vec::new();
        s.extend_from_slice(&JAVA_STREAM_MAGIC.to_be_bytes());
        s.extend_from_slice(&JAVA_STREAM_VERSION.to_be_bytes());
        s.push(TC_OBJECT);
        s.push(TC_CLASSDESC);
        s.extend(utf("Level"));
        s.extend_from_slice(&0i64.to_be_bytes());
        s.push(0);
        s.extend_from_slice(&2u16.to_be_bytes());
        s.push(b'L');
        s.extend(utf("blockMap"));
        s.push(TC_STRING);
        s.extend(utf("java/util/HashMap"));
        s.push(b'I');
        s.extend(utf("height"));
        s.push(TC_ENDBLOCKDATA);
        s.push(TC_NULL);
        // classdata: blockMap body, then height. No end marker between
        // the 152-byte skip and `height`'s data: in Java's alphabetical
        // field order `blockMap` precedes `blocks`/`height`, so the next
        // field's bytes start immediately.
        s.push(TC_OBJECT);
        s.extend(vec![0u8; 315]);
        s.extend_from_slice(&0i32.to_be_bytes()); // bucket count
        s.extend(vec![0u8; 152]);
        s.extend_from_slice(&9i32.to_be_bytes()); // height

        let world = decode(StdCursor::new(wrap(&s))).unwrap();
        assert_eq!(world.length, 9);
    }

    /// An array field whose class descriptor doesn't describe a byte
    /// array is a hard error, not a silently-generalized read.
    #[test]
    fn rejects_non_byte_array_field_content() {
        let mut s = Vec::new();
        s.extend_from_slice(&JAVA_STREAM_MAGIC.to_be_bytes());
        s.extend_from_slice(&JAVA_STREAM_VERSION.to_be_bytes());
        s.push(TC_OBJECT);
        s.push(TC_CLASSDESC);
        s.extend(utf("Level"));
        s.extend_from_slice(&0i64.to_be_bytes());
        s.push(0);
        s.extend_from_slice(&1u16.to_be_bytes());
        s.push(b'[');
        s.extend(utf("blocks"));
        s.push(TC_STRING);
        s.extend(utf("[I"));
        s.push(TC_ENDBLOCKDATA);
        s.push(TC_NULL);
        s.push(TC_ARRAY);
        s.push(TC_CLASSDESC);
        s.extend(utf("[I"));
        s.extend_from_slice(&0i64.to_be_bytes());
        s.push(0);
        s.extend_from_slice(&0u16.to_be_bytes());
        s.push(TC_ENDBLOCKDATA);
        s.push(TC_NULL);
        s.extend_from_slice(&0i32.to_be_bytes());

        let err = decode(StdCursor::new(wrap(&s))).unwrap_err();
        assert!(matches!(err, Error::Dat(DatError::BadArrayContent)));
    }
}
