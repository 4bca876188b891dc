//! End-to-end byte-level scenarios for each decoder/encoder pair, built
//! as literal Rust byte arrays rather than fixture files, so the whole
//! crate can be exercised without any test-data assets on disk.

use classic_map_codec::formats::{cw, dat, fcm, lvl, schematic};
use classic_map_codec::nbt::{self, NbtWriter, Tag, TagKind};
use classic_map_codec::world::World;
use classic_map_codec::Error;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
    enc.write_all(bytes).unwrap();
    enc.finish().unwrap()
}

/// Scenario 1: a minimal MCSharp `.lvl` 2x2x2 map decodes its header
/// and block array correctly.
#[test]
fn lvl_minimal_two_cubed_map_round_trips_header_fields() {
    let mut header = Vec::new();
    header.extend_from_slice(&1874u16.to_le_bytes());
    header.extend_from_slice(&2u16.to_le_bytes()); // width
    header.extend_from_slice(&2u16.to_le_bytes()); // length
    header.extend_from_slice(&2u16.to_le_bytes()); // height
    header.extend_from_slice(&16u16.to_le_bytes()); // spawnX (fixed point, /32 not applied to lvl)
    header.extend_from_slice(&16u16.to_le_bytes()); // spawnZ
    header.extend_from_slice(&16u16.to_le_bytes()); // spawnY
    header.push(64); // yaw
    header.push(32); // pitch
    header.extend_from_slice(&0u16.to_le_bytes()); // permissions
    header.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]); // 2*2*2 blocks

    let world = lvl::decode(Cursor::new(gzip(&header))).unwrap();
    assert_eq!((world.width, world.height, world.length), (2, 2, 2));
    assert_eq!(world.volume(), 8);
    assert_eq!(world.spawn.yaw.0, 64);
    assert_eq!(world.spawn.pitch.0, 32);
}

/// Scenario 2: a minimal fCraft `.fcm` 1x1x1 map decodes spawn and
/// block data, with the spawn fixed-point divide applied.
#[test]
fn fcm_minimal_one_cubed_map_decodes_spawn_in_blocks() {
    let mut header = Vec::new();
    header.extend_from_slice(&0x0FC2_AF40u32.to_le_bytes());
    header.push(13); // revision
    header.extend_from_slice(&1u16.to_le_bytes());
    header.extend_from_slice(&1u16.to_le_bytes());
    header.extend_from_slice(&1u16.to_le_bytes());
    header.extend_from_slice(&16i32.to_le_bytes()); // spawnX = 0.5 blocks
    header.extend_from_slice(&16i32.to_le_bytes());
    header.extend_from_slice(&16i32.to_le_bytes());
    header.push(0); // yaw
    header.push(0); // pitch
    header.extend_from_slice(&[0u8; 4]); // modified
    header.extend_from_slice(&[0u8; 4]); // created
    header.extend_from_slice(&[0xCDu8; 16]); // uuid
    header.extend_from_slice(&[0u8; 26]); // layer index
    header.extend_from_slice(&0u32.to_le_bytes()); // meta_count

    let mut tail_plain = Vec::new();
    tail_plain.push(9u8); // the single block

    let mut full = header;
    let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
    enc.write_all(&tail_plain).unwrap();
    full.extend_from_slice(&enc.finish().unwrap());

    let world = fcm::decode(Cursor::new(full)).unwrap();
    assert_eq!(world.spawn.x, 0.5);
    assert_eq!(world.uuid, [0xCDu8; 16]);
    assert_eq!(world.blocks, vec![9]);
}

/// Scenario 3: a minimal ClassicWorld document decodes its UUID and
/// block array, matching spec §8's literal decode scenario.
#[test]
fn cw_minimal_document_decodes_uuid_and_block_array() {
    let mut writer = NbtWriter::new();
    {
        let mut root = writer.root("ClassicWorld");
        root.short("X", 2);
        root.short("Y", 2);
        root.short("Z", 2);
        root.byte_array("UUID", &[0x42; 16]);
        root.byte_array("BlockArray", &[0, 0, 0, 0, 0, 0, 0, 1]);
        root.finish();
    }
    let bytes = writer.finish();
    let world = cw::decode(Cursor::new(gzip(&bytes)), None).unwrap();
    assert_eq!(world.uuid, [0x42u8; 16]);
    assert_eq!(world.blocks, vec![0, 0, 0, 0, 0, 0, 0, 1]);
    assert_eq!((world.width, world.height, world.length), (2, 2, 2));
}

/// Scenario 4: a Minecraft Classic `.dat` level object decodes with
/// the wire's width/depth/height swapped onto this crate's
/// width/height/length axes.
#[test]
fn dat_decode_applies_width_depth_height_axis_swap() {
    fn utf(s: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(s.len() as u16).to_be_bytes());
        out.extend_from_slice(s.as_bytes());
        out
    }

    const TC_NULL: u8 = 0x70;
    const TC_CLASSDESC: u8 = 0x72;
    const TC_OBJECT: u8 = 0x73;
    const TC_STRING: u8 = 0x74;
    const TC_ARRAY: u8 = 0x75;
    const TC_ENDBLOCKDATA: u8 = 0x78;

    let mut s = Vec::new();
    s.extend_from_slice(&0xACEDu16.to_be_bytes());
    s.extend_from_slice(&5u16.to_be_bytes());
    s.push(TC_OBJECT);
    s.push(TC_CLASSDESC);
    s.extend(utf("Level"));
    s.extend_from_slice(&0i64.to_be_bytes());
    s.push(0); // flags
    s.extend_from_slice(&4u16.to_be_bytes());
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
    s.push(TC_ENDBLOCKDATA);
    s.push(TC_NULL);
    s.extend_from_slice(&5i32.to_be_bytes()); // wire width
    s.extend_from_slice(&6i32.to_be_bytes()); // wire depth -> World.height
    s.extend_from_slice(&7i32.to_be_bytes()); // wire height -> World.length
    s.push(TC_ARRAY);
    s.push(TC_CLASSDESC);
    s.extend(utf("[B"));
    s.extend_from_slice(&0i64.to_be_bytes());
    s.push(0);
    s.extend_from_slice(&0u16.to_be_bytes());
    s.push(TC_ENDBLOCKDATA);
    s.push(TC_NULL);
    let volume = 5usize * 6 * 7;
    s.extend_from_slice(&(volume as i32).to_be_bytes());
    s.extend(std::iter::repeat(0u8).take(volume));

    let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
    enc.write_all(&s).unwrap();
    let gz = enc.finish().unwrap();

    let mut full = Vec::new();
    full.extend_from_slice(&0x271B_B788u32.to_be_bytes());
    full.push(2); // dat version
    full.extend_from_slice(&gz);

    let world = dat::decode(Cursor::new(full)).unwrap();
    assert_eq!(world.width, 5);
    assert_eq!(world.height, 6);
    assert_eq!(world.length, 7);
    assert_eq!(world.blocks.len(), volume);
}

/// Scenario 5: the ClassicWorld encoder's output begins with the
/// expected `TAG_Dict "ClassicWorld"` header and round-trips through
/// the decoder.
#[test]
fn cw_encode_output_begins_with_expected_dict_header_and_decodes() {
    let mut world = World::new(3, 2, 3);
    world.uuid = [0x11; 16];
    world.blocks = vec![1; world.volume()];

    let bytes = cw::encode(&world);

    let mut expected_prefix = vec![TagKind::Dict as u8, 0, 12];
    expected_prefix.extend_from_slice(b"ClassicWorld");
    assert_eq!(&bytes[..expected_prefix.len()], expected_prefix.as_slice());

    let decoded = cw::decode(Cursor::new(gzip(&bytes)), None).unwrap();
    assert_eq!(decoded.uuid, world.uuid);
    assert_eq!(decoded.blocks, world.blocks);
    assert_eq!((decoded.width, decoded.height, decoded.length), (3, 2, 3));
}

/// Scenario 6: the schematic encoder emits a zero-filled `Data` array
/// parallel to whatever `Blocks` contains.
#[test]
fn schematic_encode_emits_zero_filled_data_array() {
    let mut world = World::new(2, 2, 1);
    world.blocks = vec![1, 2, 3, 4];

    let bytes = schematic::encode(&world);

    let mut saw_data = false;
    let mut saw_blocks = false;
    nbt::read_document(&bytes, &mut |tag: &mut Tag, _depth: usize, _a: &nbt::Ancestors| {
        if tag.name == "Data" {
            saw_data = true;
            assert_eq!(tag.as_byte_array().unwrap().as_slice(), &[0, 0, 0, 0]);
        }
        if tag.name == "Blocks" {
            saw_blocks = true;
            assert_eq!(tag.as_byte_array().unwrap().as_slice(), &[1, 2, 3, 4]);
        }
        Ok(())
    })
    .unwrap();
    assert!(saw_data);
    assert!(saw_blocks);
}

/// A short read anywhere in a GZIP-wrapped decoder surfaces as
/// `Error::UnexpectedEof`, not as a silently truncated result.
#[test]
fn truncated_lvl_stream_is_an_unexpected_eof() {
    let data = gzip(&[0x52, 0x07]); // just the magic, nothing else
    let err = lvl::decode(Cursor::new(data)).unwrap_err();
    assert!(matches!(err, Error::UnexpectedEof));
}

/// An unrecognized file extension surfaces its own error variant
/// rather than being swallowed.
#[test]
fn unrecognized_extension_is_reported() {
    use classic_map_codec::formats::Format;
    assert_eq!(Format::from_extension("bmp"), None);
}
