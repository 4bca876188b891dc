//! Builder-pattern NBT encoder, generalized from a borrow-everything
//! reader into a write side with the same "cannot produce an invalid
//! document" discipline: every open compound/list panics on drop
//! unless `finish()` was called first.
//!
//! Strings are plain UTF-8 here (see the crate's `DESIGN.md` for why
//! this NBT dialect does not use Java's modified CESU-8).

use crate::nbt::TagKind;
use byteorder::{BigEndian, ByteOrder};
use std::fmt;

/// Owns the output buffer for one NBT document.
#[derive(Default)]
pub struct NbtWriter {
    output: Vec<u8>,
    done: bool,
}

impl NbtWriter {
    pub fn new() -> NbtWriter {
        NbtWriter { output: vec![], done: false }
    }

    /// Starts the root `TAG_Dict` and returns a builder for its fields.
    pub fn root(&mut self, name: &str) -> CompoundWriter<'_> {
        self.done = true;
        self.write_tag(TagKind::Dict);
        self.write_string(name);
        CompoundWriter::new(self)
    }

    /// Consumes the writer, returning the finished buffer.
    ///
    /// # Panics
    /// Panics if [`NbtWriter::root`] was never called.
    pub fn finish(self) -> Vec<u8> {
        if !self.done {
            panic!("NbtWriter::finish called without calling root() first");
        }
        self.output
    }

    fn get_vec(&mut self) -> &mut Vec<u8> {
        &mut self.output
    }

    fn write_i8(&mut self, value: i8) {
        self.output.push(value as u8);
    }

    fn write_i16(&mut self, value: i16) {
        let mut buf = [0; 2];
        BigEndian::write_i16(&mut buf, value);
        self.output.extend(&buf);
    }

    fn write_i32(&mut self, value: i32) {
        let mut buf = [0; 4];
        BigEndian::write_i32(&mut buf, value);
        self.output.extend(&buf);
    }

    fn write_u16(&mut self, value: u16) {
        let mut buf = [0; 2];
        BigEndian::write_u16(&mut buf, value);
        self.output.extend(&buf);
    }

    fn write_u32(&mut self, value: u32) {
        let mut buf = [0; 4];
        BigEndian::write_u32(&mut buf, value);
        self.output.extend(&buf);
    }

    fn write_f32(&mut self, value: f32) {
        let mut buf = [0; 4];
        BigEndian::write_f32(&mut buf, value);
        self.output.extend(&buf);
    }

    fn write_bytes(&mut self, data: &[u8]) {
        self.output.extend(data);
    }

    fn write_tag(&mut self, tag: TagKind) {
        self.output.push(tag as u8);
    }

    fn write_string(&mut self, input: &str) {
        self.write_u16(input.len() as u16);
        self.write_bytes(input.as_bytes());
    }
}

impl fmt::Debug for NbtWriter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NbtWriter")
            .field("bytes_written", &self.output.len())
            .field("done", &self.done)
            .finish()
    }
}

/// Builder for a `TAG_Dict`'s fields. Must call [`finish`](Self::finish)
/// before going out of scope.
pub struct CompoundWriter<'a> {
    writer: &'a mut NbtWriter,
    done: bool,
}

impl<'a> CompoundWriter<'a> {
    fn new(writer: &'a mut NbtWriter) -> CompoundWriter<'a> {
        CompoundWriter { writer, done: false }
    }

    fn header(&mut self, tag: TagKind, name: &str) {
        self.writer.write_tag(tag);
        self.writer.write_string(name);
    }

    pub fn byte(&mut self, name: &str, value: i8) {
        self.header(TagKind::I8, name);
        self.writer.write_i8(value);
    }

    pub fn short(&mut self, name: &str, value: i16) {
        self.header(TagKind::I16, name);
        self.writer.write_i16(value);
    }

    pub fn int(&mut self, name: &str, value: i32) {
        self.header(TagKind::I32, name);
        self.writer.write_i32(value);
    }

    pub fn float(&mut self, name: &str, value: f32) {
        self.header(TagKind::F32, name);
        self.writer.write_f32(value);
    }

    pub fn string(&mut self, name: &str, value: &str) {
        self.header(TagKind::String, name);
        self.writer.write_string(value);
    }

    pub fn byte_array(&mut self, name: &str, data: &[u8]) {
        self.header(TagKind::I8Array, name);
        self.writer.write_u32(data.len() as u32);
        self.writer.write_bytes(data);
    }

    /// Writes a zero-filled `TAG_I8Array` of `len` bytes, streamed in
    /// fixed-size chunks so the caller never allocates a parallel
    /// `len`-byte buffer just to fill it with zeros.
    pub fn zero_byte_array(&mut self, name: &str, len: usize) {
        const CHUNK: usize = 8192;
        self.header(TagKind::I8Array, name);
        self.writer.write_u32(len as u32);
        let zeros = [0u8; CHUNK];
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(CHUNK);
            self.writer.write_bytes(&zeros[..n]);
            remaining -= n;
        }
    }

    /// Writes an empty `TAG_List` of the given child kind.
    pub fn empty_list(&mut self, name: &str, child_kind: TagKind) {
        self.header(TagKind::List, name);
        self.writer.write_tag(child_kind);
        self.writer.write_u32(0);
    }

    pub fn compound_field<'b>(&'b mut self, name: &str) -> CompoundWriter<'b> {
        self.header(TagKind::Dict, name);
        CompoundWriter::new(self.writer)
    }

    pub fn compound_list_field<'b>(&'b mut self, name: &str) -> ListWriter<'b> {
        self.header(TagKind::List, name);
        ListWriter::new(self.writer)
    }

    /// Finishes the compound by writing its `TAG_End` terminator.
    pub fn finish(mut self) {
        self.writer.write_tag(TagKind::End);
        self.done = true;
    }
}

impl<'a> Drop for CompoundWriter<'a> {
    fn drop(&mut self) {
        if !self.done {
            panic!("CompoundWriter dropped without calling finish()");
        }
    }
}

/// Builder for a `TAG_List` of `TAG_Dict` elements, backpatching the
/// element count once all elements have been written.
pub struct ListWriter<'a> {
    writer: &'a mut NbtWriter,
    count_offset: usize,
    count: u32,
    done: bool,
}

impl<'a> ListWriter<'a> {
    fn new(writer: &'a mut NbtWriter) -> ListWriter<'a> {
        writer.write_tag(TagKind::Dict);
        let count_offset = writer.get_vec().len();
        writer.write_u32(0);
        ListWriter { writer, count_offset, count: 0, done: false }
    }

    pub fn element(&mut self) -> CompoundWriter<'_> {
        self.count += 1;
        CompoundWriter::new(self.writer)
    }

    pub fn finish(mut self) {
        self.done = true;
        let mut bytes = [0; 4];
        BigEndian::write_u32(&mut bytes, self.count);
        let vec = self.writer.get_vec();
        vec[self.count_offset..self.count_offset + 4].copy_from_slice(&bytes);
    }
}

impl<'a> Drop for ListWriter<'a> {
    fn drop(&mut self) {
        if !self.done {
            panic!("ListWriter dropped without calling finish()");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_document_round_trips_through_the_nbt_reader() {
        let mut writer = NbtWriter::new();
        {
            let mut root = writer.root("ClassicWorld");
            root.short("X", 1);
            root.byte_array("BlockArray", &[7]);
            root.finish();
        }
        let bytes = writer.finish();

        let mut saw_x = false;
        let mut saw_blocks = false;
        crate::nbt::read_document(&bytes, &mut |tag: &mut crate::nbt::Tag, _d: usize, _a: &crate::nbt::Ancestors| {
            if tag.name == "X" {
                saw_x = true;
                assert_eq!(tag.as_i16(), Some(1));
            }
            if tag.name == "BlockArray" {
                saw_blocks = true;
                assert_eq!(tag.as_byte_array().unwrap().as_slice(), &[7]);
            }
            Ok(())
        })
        .unwrap();
        assert!(saw_x && saw_blocks);
    }

    #[test]
    fn empty_compound_list_writes_zero_count() {
        let mut writer = NbtWriter::new();
        {
            let mut root = writer.root("Schematic");
            root.compound_list_field("Entities").finish();
            root.finish();
        }
        let bytes = writer.finish();
        let mut saw_entities = false;
        crate::nbt::read_document(&bytes, &mut |tag: &mut crate::nbt::Tag, _d: usize, _a: &crate::nbt::Ancestors| {
            if tag.name == "Entities" {
                saw_entities = true;
                if let crate::nbt::TagValue::List { len, .. } = &tag.value {
                    assert_eq!(*len, 0);
                }
            }
            Ok(())
        })
        .unwrap();
        assert!(saw_entities);
    }
}
