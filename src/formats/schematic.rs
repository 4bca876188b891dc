//! `C10`: minimal WorldEdit-style schematic export.
//!
//! This is a secondary write target alongside the native ClassicWorld
//! encoder (`formats::cw`): a `Schematic` NBT dict wrapping the current
//! block array plus a zero-filled parallel `Data` array (WorldEdit's
//! per-block metadata nibble, which this crate never populates — the
//! decoders this codec is paired with never produced anything but air
//! in that plane).

use crate::nbt::TagKind;
use crate::world::World;

/// Encodes `world` as a minimal `.schematic` NBT document.
pub fn encode(world: &World) -> Vec<u8> {
    let mut writer = crate::nbt::NbtWriter::new();
    {
        let mut root = writer.root("Schematic");
        root.string("Materials", "Classic");
        root.short("Width", world.width as i16);
        root.short("Height", world.height as i16);
        root.short("Length", world.length as i16);
        root.byte_array("Blocks", &world.blocks);
        root.zero_byte_array("Data", world.volume());
        root.compound_list_field("Entities").finish();
        root.compound_list_field("TileEntities").finish();
        root.finish();
    }
    writer.finish()
}
