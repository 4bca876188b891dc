//! `C6`/`C9`: ClassicWorld decode and encode.
//!
//! The decoder drives [`crate::nbt::read_document`] with a visitor that
//! dispatches on tag depth (root is depth 0) plus the immediate parent
//! name, exactly mirroring the original `Cw_Callback_1/2/4/5` depth
//! switch — just without a `tag->parent` pointer chain (see
//! `crate::nbt` module docs and `DESIGN.md`).

use crate::error::{CwError, Error};
use crate::gzip;
use crate::io::ByteReader;
use crate::nbt::{self, Ancestors, NbtWriter, Tag, TagKind};
use crate::world::{BlockDef, Env, PackedAngle, Rgb, World, DRAW_SPRITE};
use std::io::Read;

/// Accumulates the three `R`/`G`/`B` children of an `EnvColors` sub-dict
/// until the sub-dict's own (post-order) callback fires.
#[derive(Default)]
struct ColorAccum {
    r: u16,
    g: u16,
    b: u16,
}

#[derive(Default)]
struct BlockDefBuilder {
    def: BlockDef,
    raw_shape: u8,
}

struct CwVisitor<'w> {
    world: &'w mut World,
    color: ColorAccum,
    cur_id: u16,
    building: BlockDefBuilder,
    on_texture_url: Option<&'w mut dyn FnMut(&str)>,
}

impl<'a, 'w> CwVisitor<'w> {
    fn visit_depth1(&mut self, tag: &mut Tag<'a>) -> Result<(), Error> {
        match tag.name {
            "X" => self.world.width = tag.as_i16().unwrap_or(0) as u16,
            "Y" => self.world.height = tag.as_i16().unwrap_or(0) as u16,
            "Z" => self.world.length = tag.as_i16().unwrap_or(0) as u16,
            "UUID" => {
                if let Some(arr) = tag.as_byte_array() {
                    if arr.len() != 16 {
                        return Err(CwError::BadUuid(arr.len()).into());
                    }
                    self.world.uuid.copy_from_slice(arr.as_slice());
                }
            }
            "BlockArray" => {
                if let Some(arr) = tag.as_byte_array_mut() {
                    self.world.blocks = arr.take().unwrap_or_else(|| arr.to_vec());
                }
            }
            "BlockArray2" => {
                #[cfg(feature = "extended-blocks")]
                {
                    if let Some(arr) = tag.as_byte_array_mut() {
                        self.world.blocks_upper = Some(arr.take().unwrap_or_else(|| arr.to_vec()));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn visit_depth2_spawn(&mut self, tag: &mut Tag<'a>) {
        match tag.name {
            "X" => self.world.spawn.x = tag.as_i16().unwrap_or(0) as f32,
            "Y" => self.world.spawn.y = tag.as_i16().unwrap_or(0) as f32,
            "Z" => self.world.spawn.z = tag.as_i16().unwrap_or(0) as f32,
            "H" => self.world.spawn.yaw = PackedAngle(tag.as_i8().unwrap_or(0) as u8),
            "P" => self.world.spawn.pitch = PackedAngle(tag.as_i8().unwrap_or(0) as u8),
            _ => {}
        }
    }

    fn visit_depth4(&mut self, tag: &mut Tag<'a>, parent: &str) -> Result<(), Error> {
        match parent {
            "ClickDistance" => {
                if tag.name == "Distance" {
                    // reach distance is not part of World/Env in this crate's
                    // data model; exposed separately would require a wider
                    // API surface than the spec calls for, so it is parsed
                    // and discarded like an unrecognized tag.
                }
            }
            "EnvWeatherType" => {
                if tag.name == "WeatherType" {
                    self.world.env.weather = tag.as_i8().unwrap_or(0) as u8;
                }
            }
            "EnvMapAppearance" => match tag.name {
                "SideBlock" => self.world.env.side_block = tag.as_i8().unwrap_or(0) as u8,
                "EdgeBlock" => self.world.env.edge_block = tag.as_i8().unwrap_or(0) as u8,
                "SideLevel" => self.world.env.edge_height = tag.as_i16().unwrap_or(0),
                "TextureURL" => {
                    if let Some(url) = tag.as_str() {
                        if !url.is_empty() {
                            if let Some(cb) = self.on_texture_url.as_mut() {
                                (**cb)(url);
                            }
                        }
                        self.world.env.texture_url = Some(url.to_string());
                    }
                }
                _ => {}
            },
            "EnvColors" => {
                let default = |name: &str| -> Rgb {
                    match name {
                        "Sky" => crate::world::DEFAULT_SKY_COLOR,
                        "Ambient" => crate::world::DEFAULT_SHADOW,
                        _ => crate::world::DEFAULT_WHITE,
                    }
                };
                let parsed = Rgb::from_wide_or_default(self.color.r, self.color.g, self.color.b, default(tag.name));
                match tag.name {
                    "Sky" => self.world.env.sky_color = parsed,
                    "Cloud" => self.world.env.cloud_color = parsed,
                    "Fog" => self.world.env.fog_color = parsed,
                    "Sunlight" => self.world.env.sunlight_color = parsed,
                    "Ambient" => self.world.env.shadow_color = parsed,
                    _ => {}
                }
                self.color = ColorAccum::default();
            }
            "BlockDefinitions" => {
                if tag.name.len() >= 5 && tag.name[..5].eq_ignore_ascii_case("Block") {
                    // Sprite-draw fix-up: can't rely on tag arrival order,
                    // so this runs once the whole block's dict has closed.
                    if self.building.raw_shape == 0 {
                        self.building.def.sprite_offset = self.building.def.draw;
                        self.building.def.draw = DRAW_SPRITE;
                    } else {
                        self.building.def.sprite_offset = 0;
                    }
                    self.building.def.id = self.cur_id;
                    self.world.block_defs.push(std::mem::take(&mut self.building.def));
                    self.building = BlockDefBuilder::default();
                    self.cur_id = 0;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn visit_depth5(&mut self, tag: &mut Tag<'a>, grandparent: &str) {
        match grandparent {
            "EnvColors" => match tag.name {
                "R" => self.color.r = tag.as_i16().unwrap_or(0) as u16,
                "G" => self.color.g = tag.as_i16().unwrap_or(0) as u16,
                "B" => self.color.b = tag.as_i16().unwrap_or(0) as u16,
                _ => {}
            },
            "BlockDefinitions" => self.visit_block_def_field(tag),
            _ => {}
        }
    }

    fn visit_block_def_field(&mut self, tag: &mut Tag<'a>) {
        let def = &mut self.building.def;
        match tag.name {
            "ID" => self.cur_id = tag.as_i8().unwrap_or(0) as u8 as u16,
            "ID2" => self.cur_id = tag.as_i16().unwrap_or(0) as u16,
            "CollideType" => def.collide_type = tag.as_i8().unwrap_or(0) as u8,
            "Speed" => def.speed = tag.as_f32().unwrap_or(1.0),
            "TransmitsLight" => def.blocks_light = tag.as_i8().unwrap_or(0) == 0,
            "FullBright" => def.full_bright = tag.as_i8().unwrap_or(0) != 0,
            "BlockDraw" => def.draw = tag.as_i8().unwrap_or(0) as u8,
            "Shape" => self.building.raw_shape = tag.as_i8().unwrap_or(0) as u8,
            "Name" => {
                if let Some(s) = tag.as_str() {
                    def.name = s.to_string();
                }
            }
            "Textures" => {
                if let Some(arr) = tag.as_byte_array() {
                    let bytes = arr.as_slice();
                    if bytes.len() >= 6 {
                        for i in 0..6 {
                            def.textures[i] = bytes[i] as u16;
                        }
                        if bytes.len() >= 12 {
                            for i in 0..6 {
                                def.textures[i] |= (bytes[6 + i] as u16) << 8;
                            }
                        }
                    }
                }
            }
            "WalkSound" => def.dig_sound = tag.as_i8().unwrap_or(0) as u8,
            "Fog" => {
                if let Some(arr) = tag.as_byte_array() {
                    let bytes = arr.as_slice();
                    if bytes.len() >= 4 {
                        // A 0xFF density byte is a fix-up for older ClassicalSharp
                        // versions that saved a bogus value; everything else follows
                        // the (D+1)/128 formula, including D == 0.
                        def.fog.density = if bytes[0] == 0xFF { 0.0 } else { (bytes[0] as f32 + 1.0) / 128.0 };
                        def.fog.color = Rgb::new(bytes[1], bytes[2], bytes[3]);
                    }
                }
            }
            "Coords" => {
                if let Some(arr) = tag.as_byte_array() {
                    let bytes = arr.as_slice();
                    if bytes.len() >= 6 {
                        let s = |b: u8| b as i8;
                        def.bounding_box.min = (s(bytes[0]), s(bytes[1]), s(bytes[2]));
                        def.bounding_box.max = (s(bytes[3]), s(bytes[4]), s(bytes[5]));
                    }
                }
            }
            _ => {}
        }
    }
}

impl<'a, 'w> nbt::Visitor<'a> for CwVisitor<'w> {
    fn visit(&mut self, tag: &mut Tag<'a>, depth: usize, ancestors: &Ancestors<'a>) -> Result<(), Error> {
        match depth {
            1 => self.visit_depth1(tag)?,
            2 => {
                if ancestors.last() == Some(&"Spawn") {
                    self.visit_depth2_spawn(tag);
                }
            }
            4 => {
                if ancestors.get(2) == Some(&"CPE") {
                    let parent = ancestors[3];
                    self.visit_depth4(tag, parent)?;
                }
            }
            5 => {
                if ancestors.get(2) == Some(&"CPE") {
                    let grandparent = ancestors[3];
                    self.visit_depth5(tag, grandparent);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Decodes a GZIP-compressed ClassicWorld stream. `on_texture_url`, if
/// given, is invoked with the map's texture-pack URL exactly once, iff
/// the URL is non-empty — the crate itself never performs the fetch.
pub fn decode<R: Read>(stream: R, on_texture_url: Option<&mut dyn FnMut(&str)>) -> Result<World, Error> {
    let mut deflate = gzip::skip_header_and_inflate(ByteReader::new(stream))?;
    let mut data = Vec::new();
    deflate.read_to_end(&mut data)?;

    if data.first().copied() != Some(TagKind::Dict as u8) {
        return Err(CwError::RootTagNotDict.into());
    }

    let mut world = World::new(0, 0, 0);
    {
        let mut visitor = CwVisitor {
            world: &mut world,
            color: ColorAccum::default(),
            cur_id: 0,
            building: BlockDefBuilder::default(),
            on_texture_url,
        };
        nbt::read_document(&data, &mut visitor)?;
    }

    rescale_legacy_spawn(&mut world);
    Ok(world)
}

/// Older writers multiplied spawn coordinates by 32; if the floored
/// spawn position falls outside the world, assume that happened and
/// divide it back out.
fn rescale_legacy_spawn(world: &mut World) {
    let (x, y, z) = (world.spawn.x.floor(), world.spawn.y.floor(), world.spawn.z.floor());
    let inside = x >= 0.0
        && y >= 0.0
        && z >= 0.0
        && (x as u32) < world.width as u32
        && (y as u32) < world.height as u32
        && (z as u32) < world.length as u32;
    if !inside {
        log::debug!("rescaling legacy x32 spawn coordinates");
        world.spawn.x /= 32.0;
        world.spawn.y /= 32.0;
        world.spawn.z /= 32.0;
    }
}

/// Encodes `world` as a ClassicWorld NBT document.
pub fn encode(world: &World) -> Vec<u8> {
    let mut writer = NbtWriter::new();
    {
        let mut root = writer.root("ClassicWorld");
        root.byte("FormatVersion", 1);
        root.byte_array("UUID", &world.uuid);
        root.short("X", world.width as i16);
        root.short("Y", world.height as i16);
        root.short("Z", world.length as i16);
        {
            let mut spawn = root.compound_field("Spawn");
            spawn.short("X", world.spawn.x as i16);
            spawn.short("Y", world.spawn.y as i16);
            spawn.short("Z", world.spawn.z as i16);
            spawn.byte("H", world.spawn.yaw.0 as i8);
            spawn.byte("P", world.spawn.pitch.0 as i8);
            spawn.finish();
        }
        root.byte_array("BlockArray", &world.blocks);

        #[cfg(feature = "extended-blocks")]
        if let Some(upper) = &world.blocks_upper {
            if upper != &world.blocks {
                root.byte_array("BlockArray2", upper);
            }
        }

        {
            let mut metadata = root.compound_field("Metadata");
            {
                let mut cpe = metadata.compound_field("CPE");
                write_click_distance(&mut cpe);
                write_weather(&mut cpe, world.env.weather);
                write_env_colors(&mut cpe, &world.env);
                write_map_appearance(&mut cpe, &world.env);
                write_block_definitions(&mut cpe, world);
                cpe.finish();
            }
            metadata.finish();
        }
        root.finish();
    }
    writer.finish()
}

fn write_click_distance(cpe: &mut crate::nbt::CompoundWriter<'_>) {
    let mut d = cpe.compound_field("ClickDistance");
    d.short("Distance", 160); // 5 blocks, the default reach
    d.finish();
}

fn write_weather(cpe: &mut crate::nbt::CompoundWriter<'_>, weather: u8) {
    let mut w = cpe.compound_field("EnvWeatherType");
    w.byte("WeatherType", weather as i8);
    w.finish();
}

fn write_rgb(parent: &mut crate::nbt::CompoundWriter<'_>, name: &str, color: Rgb) {
    let mut c = parent.compound_field(name);
    c.short("R", color.r as i16);
    c.short("G", color.g as i16);
    c.short("B", color.b as i16);
    c.finish();
}

fn write_env_colors(cpe: &mut crate::nbt::CompoundWriter<'_>, env: &Env) {
    let mut colors = cpe.compound_field("EnvColors");
    write_rgb(&mut colors, "Sky", env.sky_color);
    write_rgb(&mut colors, "Cloud", env.cloud_color);
    write_rgb(&mut colors, "Fog", env.fog_color);
    write_rgb(&mut colors, "Ambient", env.shadow_color);
    write_rgb(&mut colors, "Sunlight", env.sunlight_color);
    colors.finish();
}

fn write_map_appearance(cpe: &mut crate::nbt::CompoundWriter<'_>, env: &Env) {
    let mut appearance = cpe.compound_field("EnvMapAppearance");
    appearance.byte("SideBlock", env.side_block as i8);
    appearance.byte("EdgeBlock", env.edge_block as i8);
    appearance.short("SideLevel", env.edge_height);
    appearance.string("TextureURL", env.texture_url.as_deref().unwrap_or(""));
    appearance.finish();
}

fn write_block_definitions(cpe: &mut crate::nbt::CompoundWriter<'_>, world: &World) {
    let mut defs = cpe.compound_field("BlockDefinitions");
    // Written high id to low: readers that only understand the 8-bit
    // `ID` tag still end up with the correct first 256 definitions.
    let mut ordered: Vec<&BlockDef> = world.block_defs.iter().collect();
    ordered.sort_by(|a, b| b.id.cmp(&a.id));
    for def in ordered {
        write_block_def(&mut defs, def);
    }
    defs.finish();
}

fn write_block_def(defs: &mut crate::nbt::CompoundWriter<'_>, def: &BlockDef) {
    let name = format!("Block{:04x}", def.id);
    let mut b = defs.compound_field(&name);
    b.byte("ID", def.id as u8 as i8);
    b.short("ID2", def.id as i16);
    b.byte("CollideType", def.collide_type as i8);
    b.float("Speed", def.speed);

    let mut textures = [0u8; 12];
    for i in 0..6 {
        textures[i] = def.textures[i] as u8;
        textures[6 + i] = (def.textures[i] >> 8) as u8;
    }
    b.byte_array("Textures", &textures);

    b.byte("TransmitsLight", if def.blocks_light { 0 } else { 1 });
    b.byte("WalkSound", def.dig_sound as i8);
    b.byte("FullBright", if def.full_bright { 1 } else { 0 });

    let sprite = def.draw == DRAW_SPRITE;
    let shape = if sprite { 0 } else { def.bounding_box.max.1 as u8 };
    b.byte("Shape", shape as i8);
    let draw = if sprite { def.sprite_offset } else { def.draw };
    b.byte("BlockDraw", draw as i8);

    let fog_density_byte = if def.fog.density == 0.0 { 0 } else { (128.0 * def.fog.density - 1.0) as u8 };
    let fog = [fog_density_byte, def.fog.color.r, def.fog.color.g, def.fog.color.b];
    b.byte_array("Fog", &fog);

    let bb = def.bounding_box;
    let coords = [bb.min.0 as u8, bb.min.1 as u8, bb.min.2 as u8, bb.max.0 as u8, bb.max.1 as u8, bb.max.2 as u8];
    b.byte_array("Coords", &coords);

    b.string("Name", &def.name);
    b.finish();
}
