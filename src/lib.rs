//! Decoders and encoders for classic block-game world map formats.
//!
//! Four historically distinct binary containers are understood on the
//! read side — MCSharp `.lvl`, fCraft `.fcm`, ClassicWorld `.cw`, and
//! Minecraft Classic `.dat` — and two on the write side: ClassicWorld
//! itself, and a minimal WorldEdit-style schematic export. All four
//! decoders populate the same [`world::World`] aggregate, so a caller
//! that only needs the block array and spawn point never has to care
//! which container it came from.
//!
//! ```no_run
//! use classic_map_codec::formats;
//! use std::path::Path;
//!
//! let world = formats::load(Path::new("map.cw"))?;
//! println!("{}x{}x{}", world.width, world.height, world.length);
//! # Ok::<(), classic_map_codec::error::Error>(())
//! ```
//!
//! The hard parts live one level down: [`nbt`] is a post-order,
//! callback-driven reader for the recursive tagged binary tree format
//! three of the four containers are built from or on top of, and
//! [`formats::cw`] drives it with depth-and-ancestor-name dispatch to
//! reconstruct a world, its environment, and any custom block
//! definitions. See `DESIGN.md` for where each piece of this crate is
//! grounded.

pub mod cp437;
pub mod error;
pub mod formats;
pub mod gzip;
pub mod io;
pub mod nbt;
pub mod world;

pub use error::Error;
pub use world::{BlockDef, Env, Spawn, World};
