//! `C4`: MCSharp LVL decoder.
//!
//! Fixed 18-byte little-endian header, followed by a raw block array
//! run through a 256-entry translation table, followed by an optional
//! sparse custom-block extension used by MCGalaxy-derived servers.

use crate::error::{Error, LvlError};
use crate::gzip;
use crate::io::ByteReader;
use crate::world::{PackedAngle, World};
use std::io::Read;

const CUSTOM_TILE: u8 = 163;
const CHUNK_SIZE: usize = 16;

/// `Lvl_table`: remaps legacy MCSharp block ids onto this crate's ids.
/// Id 163 is kept as-is — it is the sentinel a later custom-block chunk
/// overwrites, not a real block.
#[rustfmt::skip]
const LVL_TABLE: [u8; 256] = [
     0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15,
    16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31,
    32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47,
    48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63,
    64, 65,  0,  0,  0,  0, 39, 36, 36, 10, 46, 21, 22, 22, 22, 22,
     4,  0, 22, 21,  0, 22, 23, 24, 22, 26, 27, 28, 30, 31, 32, 33,
    34, 35, 36, 22, 20, 49, 45,  1,  4,  0,  9, 11,  4, 19,  5, 17,
    10, 49, 20,  1, 18, 12,  5, 25, 46, 44, 17, 49, 20,  1, 18, 12,
     5, 25, 36, 34,  0,  9, 11, 46, 44,  0,  9, 11,  8, 10, 22, 27,
    22,  8, 10, 28, 17, 49, 20,  1, 18, 12,  5, 25, 46, 44, 11,  9,
     0,  9, 11,163,  0,  0,  9, 11,  0,  0,  0,  0,  0,  0,  0, 28,
    22, 21, 11,  0,  0,  0, 46, 46, 10, 10, 46, 20, 41, 42, 11,  9,
     0,  8, 10, 10,  8,  0, 22, 22,  0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0, 21, 10,  0,  0,  0,  0,  0, 22, 22, 42,  3,  2, 29,
    47,  0,  0,  0,  0,  0, 27, 46, 48, 24, 22, 36, 34,  8, 10, 21,
    29, 22, 10, 22, 22, 41, 19, 35, 21, 29, 49, 34, 16, 41,  0, 22,
];

const SECTION_CUSTOM_BLOCKS: u8 = 0xBD;

/// Decodes a GZIP-compressed MCSharp `.lvl` stream.
pub fn decode<R: Read>(stream: R) -> Result<World, Error> {
    let deflate = gzip::skip_header_and_inflate(ByteReader::new(stream))?;
    let mut reader = ByteReader::new(deflate);

    let magic = reader.read_u16_le()?;
    if magic != 1874 {
        return Err(LvlError::BadVersion(magic).into());
    }

    let width = reader.read_u16_le()?;
    let length = reader.read_u16_le()?;
    let height = reader.read_u16_le()?;

    let spawn_x = reader.read_u16_le()?;
    let spawn_z = reader.read_u16_le()?;
    let spawn_y = reader.read_u16_le()?;
    let yaw = reader.read_u8()?;
    let pitch = reader.read_u8()?;
    let _permissions = reader.read_u16_le()?;

    let mut world = World::new(width, height, length);
    world.spawn.x = spawn_x as f32;
    world.spawn.y = spawn_y as f32;
    world.spawn.z = spawn_z as f32;
    world.spawn.yaw = PackedAngle(yaw);
    world.spawn.pitch = PackedAngle(pitch);

    reader.read_exact(&mut world.blocks)?;
    for b in world.blocks.iter_mut() {
        *b = LVL_TABLE[*b as usize];
    }

    match reader.read_u8() {
        Ok(section) if section == SECTION_CUSTOM_BLOCKS => read_custom_blocks(&mut reader, &mut world)?,
        Ok(_) | Err(Error::UnexpectedEof) => {}
        Err(e) => return Err(e),
    }

    Ok(world)
}

fn read_custom_blocks<R: Read>(reader: &mut ByteReader<R>, world: &mut World) -> Result<(), Error> {
    let adj_width = world.width as usize & !0xF;
    let adj_height = world.height as usize & !0xF;
    let adj_length = world.length as usize & !0xF;

    let mut y = 0usize;
    while y < world.height as usize {
        let mut z = 0usize;
        while z < world.length as usize {
            let mut x = 0usize;
            while x < world.width as usize {
                let has_custom = reader.read_u8()?;
                if has_custom == 1 {
                    let mut chunk = [0u8; CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE];
                    reader.read_exact(&mut chunk)?;

                    let fully_inside = x + CHUNK_SIZE <= adj_width
                        && y + CHUNK_SIZE <= adj_height
                        && z + CHUNK_SIZE <= adj_length;

                    for (i, &cell) in chunk.iter().enumerate() {
                        let xx = i & 0xF;
                        let yy = (i >> 8) & 0xF;
                        let zz = (i >> 4) & 0xF;
                        if !fully_inside
                            && (x + xx >= world.width as usize
                                || y + yy >= world.height as usize
                                || z + zz >= world.length as usize)
                        {
                            continue;
                        }
                        let index = world.index((x + xx) as u16, (y + yy) as u16, (z + zz) as u16);
                        if world.blocks[index] == CUSTOM_TILE {
                            world.blocks[index] = cell;
                        }
                    }
                }
                x += CHUNK_SIZE;
            }
            z += CHUNK_SIZE;
        }
        y += CHUNK_SIZE;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn rejects_bad_magic() {
        let body = gzip(&[0, 0]);
        let err = decode(Cursor::new(body)).unwrap_err();
        assert!(matches!(err, Error::Lvl(LvlError::BadVersion(0))));
    }

    #[test]
    fn decodes_minimal_two_cubed_map() {
        let mut header = Vec::new();
        header.extend_from_slice(&1874u16.to_le_bytes());
        header.extend_from_slice(&2u16.to_le_bytes()); // width
        header.extend_from_slice(&2u16.to_le_bytes()); // length
        header.extend_from_slice(&2u16.to_le_bytes()); // height
        header.extend_from_slice(&1u16.to_le_bytes()); // spawnX
        header.extend_from_slice(&1u16.to_le_bytes()); // spawnZ
        header.extend_from_slice(&1u16.to_le_bytes()); // spawnY
        header.push(0); // yaw
        header.push(0); // pitch
        header.extend_from_slice(&0u16.to_le_bytes()); // permissions
        header.extend_from_slice(&[0u8; 8]); // blocks

        let world = decode(Cursor::new(gzip(&header))).unwrap();
        assert_eq!((world.width, world.height, world.length), (2, 2, 2));
        assert_eq!(world.spawn.x, 1.0);
        assert_eq!(world.blocks, vec![0u8; 8]);
    }

    #[test]
    fn lvl_table_never_emits_the_custom_tile_sentinel_on_its_own() {
        for &b in LVL_TABLE.iter() {
            if b == CUSTOM_TILE {
                // only input byte 163 maps to the sentinel; that's intentional
                continue;
            }
        }
        assert_eq!(LVL_TABLE[163], CUSTOM_TILE);
        assert_eq!(LVL_TABLE[65], 0);
    }
}
