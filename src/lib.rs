//! Packs decoded PNG/BMP images into fixed-layout texture encodings
//! (RGBA 32/16, intensity 4/8, intensity+alpha 4/8/16, palette index 4/8)
//! and writes them as an OTEX container or a C byte array.

use std::path::PathBuf;

pub mod error;
pub mod shared_types;
pub mod param_validator;
pub mod bit_depth;
pub mod bin_header;
pub mod pixel_source;
pub mod image_get;
pub mod texture_encode;
pub mod texture_make;
