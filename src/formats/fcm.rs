//! `C5`: fCraft FCM decoder.
//!
//! A 79-byte uncompressed header (little-endian) followed by a
//! GZIP-compressed tail: counted metadata triples (discarded) and then
//! the raw block array.

use crate::error::{Error, FcmError};
use crate::gzip;
use crate::io::ByteReader;
use crate::world::{PackedAngle, World};
use std::io::Read;

const MAGIC: u32 = 0x0FC2_AF40;
const REVISION: u8 = 13;

/// Decodes an fCraft `.fcm` stream.
pub fn decode<R: Read>(stream: R) -> Result<World, Error> {
    let mut header_reader = ByteReader::new(stream);

    let magic = header_reader.read_u32_le()?;
    if magic != MAGIC {
        return Err(FcmError::BadIdentifier(magic).into());
    }
    let revision = header_reader.read_u8()?;
    if revision != REVISION {
        return Err(FcmError::BadRevision(revision).into());
    }

    let width = header_reader.read_u16_le()?;
    let height = header_reader.read_u16_le()?;
    let length = header_reader.read_u16_le()?;

    let spawn_x = header_reader.read_i32_le()?;
    let spawn_y = header_reader.read_i32_le()?;
    let spawn_z = header_reader.read_i32_le()?;
    let yaw = header_reader.read_u8()?;
    let pitch = header_reader.read_u8()?;

    header_reader.skip(4)?; // date modified
    header_reader.skip(4)?; // date created

    let mut uuid = [0u8; 16];
    header_reader.read_exact(&mut uuid)?;

    header_reader.skip(26)?; // layer index

    let meta_count = header_reader.read_u32_le()?;

    let mut world = World::new(width, height, length);
    world.uuid = uuid;
    world.spawn.x = spawn_x as f32 / 32.0;
    world.spawn.y = spawn_y as f32 / 32.0;
    world.spawn.z = spawn_z as f32 / 32.0;
    world.spawn.yaw = PackedAngle(yaw);
    world.spawn.pitch = PackedAngle(pitch);

    let deflate = gzip::skip_header_and_inflate(header_reader)?;
    let mut reader = ByteReader::new(deflate);

    for _ in 0..meta_count {
        read_string(&mut reader)?; // group
        read_string(&mut reader)?; // key
        read_string(&mut reader)?; // value
    }

    reader.read_exact(&mut world.blocks)?;
    Ok(world)
}

fn read_string<R: Read>(reader: &mut ByteReader<R>) -> Result<(), Error> {
    let len = reader.read_u16_le()? as usize;
    reader.skip(len)
}
