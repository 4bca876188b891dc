//! `C3` data model: the in-memory aggregates every decoder populates and
//! every encoder reads back from.

/// Default sky color, `#99CCFF`.
pub const DEFAULT_SKY_COLOR: Rgb = Rgb { r: 0x99, g: 0xCC, b: 0xFF };
/// Default cloud/fog/sunlight color, `#FFFFFF`.
pub const DEFAULT_WHITE: Rgb = Rgb { r: 0xFF, g: 0xFF, b: 0xFF };
/// Default ambient/shadow color, `#9B9B9B`.
pub const DEFAULT_SHADOW: Rgb = Rgb { r: 0x9B, g: 0x9B, b: 0x9B };

/// `BlockDraw` value meaning "drawn as a cross-sprite", matching the
/// original client's `DrawType` enum ordering (Opaque, Transparent,
/// Translucent, Gas, Sprite).
pub const DRAW_SPRITE: u8 = 4;

/// Sound ids the `WalkSound` downgrade rule cares about.
pub const SOUND_GLASS: u8 = 6;
pub const SOUND_STONE: u8 = 4;

/// An RGB color, one byte per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// Builds a color from three 16-bit channels, falling back to
    /// `default` if any channel overflows a byte — this is the
    /// `EnvColors` clamp rule from the ClassicWorld decoder.
    pub fn from_wide_or_default(r: u16, g: u16, b: u16, default: Rgb) -> Rgb {
        if r > 0xFF || g > 0xFF || b > 0xFF {
            default
        } else {
            Rgb::new(r as u8, g as u8, b as u8)
        }
    }
}

/// A packed one-byte orientation angle: `deg = byte * 360 / 256`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PackedAngle(pub u8);

impl PackedAngle {
    pub fn to_degrees(self) -> f32 {
        self.0 as f32 * 360.0 / 256.0
    }

    pub fn from_degrees(deg: f32) -> PackedAngle {
        let scaled = (deg * 256.0 / 360.0).round();
        // Java/Rust `%` on negatives would give the wrong residue here;
        // rem_euclid keeps it in 0..256 regardless of sign.
        let wrapped = (scaled as i64).rem_euclid(256) as u8;
        PackedAngle(wrapped)
    }
}

/// Player spawn position and facing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Spawn {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: PackedAngle,
    pub pitch: PackedAngle,
}

/// Environment appearance settings.
#[derive(Clone, Debug)]
pub struct Env {
    pub sky_color: Rgb,
    pub cloud_color: Rgb,
    pub fog_color: Rgb,
    pub sunlight_color: Rgb,
    pub shadow_color: Rgb,
    pub edge_block: u8,
    pub side_block: u8,
    pub edge_height: i16,
    pub weather: u8,
    pub texture_url: Option<String>,
}

impl Default for Env {
    fn default() -> Env {
        Env {
            sky_color: DEFAULT_SKY_COLOR,
            cloud_color: DEFAULT_WHITE,
            fog_color: DEFAULT_WHITE,
            sunlight_color: DEFAULT_WHITE,
            shadow_color: DEFAULT_SHADOW,
            edge_block: 7,  // BlockID::Bedrock
            side_block: 8,  // BlockID::Water
            edge_height: 0,
            weather: 0,
            texture_url: None,
        }
    }
}

/// Density + color fog override for a custom block.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fog {
    pub density: f32,
    pub color: Rgb,
}

/// An axis-aligned bounding box, expressed in sixteenths of a block
/// (matching the on-wire `Coords` tag).
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundingBox {
    pub min: (i8, i8, i8),
    pub max: (i8, i8, i8),
}

/// Per-id custom block attributes (`BlockDefinitions` in ClassicWorld).
#[derive(Clone, Debug)]
pub struct BlockDef {
    pub id: u16,
    pub name: String,
    pub collide_type: u8,
    pub speed: f32,
    /// Face texture ids in YMax, YMin, XMin, XMax, ZMin, ZMax order.
    pub textures: [u16; 6],
    pub blocks_light: bool,
    /// The raw on-wire `WalkSound` byte. The original client fans this
    /// single value out into both a dig sound and a (possibly
    /// downgraded, see [`BlockDef::step_sound`]) step sound; only this
    /// raw value is ever re-serialized.
    pub dig_sound: u8,
    pub full_bright: bool,
    /// Final draw mode, after the sprite-draw fix-up (see `formats::cw`).
    pub draw: u8,
    /// The pre-fix-up draw mode for blocks where `draw == DRAW_SPRITE`;
    /// zero otherwise. Round-trips the `Shape`/`BlockDraw` swap the
    /// original decoder performs, so re-encoding produces the same
    /// bytes it read.
    pub sprite_offset: u8,
    pub fog: Fog,
    pub bounding_box: BoundingBox,
}

impl BlockDef {
    /// The sound played on footsteps, derived from [`BlockDef::dig_sound`]
    /// by the original client's glass-to-stone downgrade rule. Informational
    /// only — the wire format only ever stores `dig_sound`.
    pub fn step_sound(&self) -> u8 {
        if self.dig_sound == SOUND_GLASS {
            SOUND_STONE
        } else {
            self.dig_sound
        }
    }
}

impl Default for BlockDef {
    fn default() -> BlockDef {
        BlockDef {
            id: 0,
            name: String::new(),
            collide_type: 0,
            speed: 1.0,
            textures: [0; 6],
            blocks_light: true,
            dig_sound: 0,
            full_bright: false,
            draw: 0,
            sprite_offset: 0,
            fog: Fog::default(),
            bounding_box: BoundingBox::default(),
        }
    }
}

/// A decoded or to-be-encoded voxel world.
#[derive(Clone, Debug)]
pub struct World {
    pub width: u16,
    pub height: u16,
    pub length: u16,
    pub uuid: [u8; 16],
    pub blocks: Vec<u8>,
    #[cfg(feature = "extended-blocks")]
    pub blocks_upper: Option<Vec<u8>>,
    pub spawn: Spawn,
    pub env: Env,
    pub block_defs: Vec<BlockDef>,
}

impl World {
    /// `width * height * length`, the required length of `blocks`.
    pub fn volume(&self) -> usize {
        self.width as usize * self.height as usize * self.length as usize
    }

    /// Linear index of cell `(x, y, z)`: `((y * length) + z) * width + x`.
    pub fn index(&self, x: u16, y: u16, z: u16) -> usize {
        ((y as usize * self.length as usize) + z as usize) * self.width as usize + x as usize
    }

    pub fn new(width: u16, height: u16, length: u16) -> World {
        let volume = width as usize * height as usize * length as usize;
        World {
            width,
            height,
            length,
            uuid: [0; 16],
            blocks: vec![0; volume],
            #[cfg(feature = "extended-blocks")]
            blocks_upper: None,
            spawn: Spawn::default(),
            env: Env::default(),
            block_defs: Vec::new(),
        }
    }

    #[cfg(feature = "uuid")]
    pub fn uuid_typed(&self) -> uuid::Uuid {
        uuid::Uuid::from_bytes(self.uuid)
    }
}
