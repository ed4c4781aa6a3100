use std::fmt;
use std::str::FromStr;

use crate::error::TexError;
use crate::PathBuf;

#[derive(Debug, Clone)]
pub struct Parameters {
	pub source_path: PathBuf,
	pub target_path: PathBuf,
	pub format: TextureFormat,
	pub output_mode: OutputMode,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum OutputMode {
	// OTEX container named 'texture'
	Binary,
	// 'texture.c' holding a byte array literal
	CSource,
}


#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum TextureFormat {
	FullColor32,
	FullColor16,
	Palette4,
	Palette8,
	Gray4,
	Gray8,
	GrayAlpha4,
	GrayAlpha8,
	GrayAlpha16,
}

/// Fixed per-format facts: command-line code, 4-byte container tag and
/// packing density.
#[derive(Debug)]
pub struct FormatInfo {
	pub code: &'static str,
	pub tag: [u8; 4],
	pub bits_per_pixel: u32,
}

static FULL_COLOR_32: FormatInfo = FormatInfo { code: "rgba32", tag: *b"RG32", bits_per_pixel: 32 };
static FULL_COLOR_16: FormatInfo = FormatInfo { code: "rgba16", tag: *b"RG16", bits_per_pixel: 16 };
static PALETTE_4: FormatInfo = FormatInfo { code: "ci4", tag: *b"CI4\0", bits_per_pixel: 4 };
static PALETTE_8: FormatInfo = FormatInfo { code: "ci8", tag: *b"CI8\0", bits_per_pixel: 8 };
static GRAY_4: FormatInfo = FormatInfo { code: "i4", tag: *b"I4\0\0", bits_per_pixel: 4 };
static GRAY_8: FormatInfo = FormatInfo { code: "i8", tag: *b"I8\0\0", bits_per_pixel: 8 };
static GRAY_ALPHA_4: FormatInfo = FormatInfo { code: "ia4", tag: *b"IA4\0", bits_per_pixel: 4 };
static GRAY_ALPHA_8: FormatInfo = FormatInfo { code: "ia8", tag: *b"IA8\0", bits_per_pixel: 8 };
static GRAY_ALPHA_16: FormatInfo = FormatInfo { code: "ia16", tag: *b"IA16", bits_per_pixel: 16 };

impl TextureFormat {
	pub const ALL: [TextureFormat; 9] = [
		TextureFormat::FullColor32,
		TextureFormat::FullColor16,
		TextureFormat::Palette4,
		TextureFormat::Palette8,
		TextureFormat::Gray4,
		TextureFormat::Gray8,
		TextureFormat::GrayAlpha4,
		TextureFormat::GrayAlpha8,
		TextureFormat::GrayAlpha16,
	];

	pub fn info(self) -> &'static FormatInfo {
		match self {
			TextureFormat::FullColor32 => &FULL_COLOR_32,
			TextureFormat::FullColor16 => &FULL_COLOR_16,
			TextureFormat::Palette4 => &PALETTE_4,
			TextureFormat::Palette8 => &PALETTE_8,
			TextureFormat::Gray4 => &GRAY_4,
			TextureFormat::Gray8 => &GRAY_8,
			TextureFormat::GrayAlpha4 => &GRAY_ALPHA_4,
			TextureFormat::GrayAlpha8 => &GRAY_ALPHA_8,
			TextureFormat::GrayAlpha16 => &GRAY_ALPHA_16,
		}
	}

	pub fn code(self) -> &'static str {
		self.info().code
	}

	pub fn tag(self) -> [u8; 4] {
		self.info().tag
	}

	/// True for the formats that pack two pixels into one byte.
	pub fn is_nibble_packed(self) -> bool {
		self.info().bits_per_pixel == 4
	}

	pub fn is_palette(self) -> bool {
		matches!(self, TextureFormat::Palette4 | TextureFormat::Palette8)
	}

	pub fn row_len(self, width: u32) -> usize {
		(width as usize * self.info().bits_per_pixel as usize) / 8
	}

	pub fn payload_len(self, width: u32, height: u32) -> usize {
		self.row_len(width) * height as usize
	}

	pub fn from_tag(tag: [u8; 4]) -> Option<TextureFormat> {
		TextureFormat::ALL.into_iter().find(|format| format.tag() == tag)
	}
}

impl FromStr for TextureFormat {
	type Err = TexError;

	fn from_str(code: &str) -> Result<TextureFormat, TexError> {
		let lowered: String = code.to_ascii_lowercase();

		return TextureFormat::ALL
			.into_iter()
			.find(|format| format.code() == lowered)
			.ok_or_else(|| TexError::UnknownFormat(code.to_string()));
	}
}

impl fmt::Display for TextureFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.code())
	}
}


/// Pixel layout of a decoded image, already normalized to 8 bits per sample.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum SourceColorMode {
	Rgba8,
	Rgb8,
	Palette8,
	GrayscaleAsRgb8,
	GrayscaleAlphaAsRgba8,
}

impl SourceColorMode {
	pub fn bytes_per_pixel(self) -> usize {
		match self {
			SourceColorMode::Rgba8 | SourceColorMode::GrayscaleAlphaAsRgba8 => 4,
			SourceColorMode::Rgb8 | SourceColorMode::GrayscaleAsRgb8 => 3,
			SourceColorMode::Palette8 => 1,
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			SourceColorMode::Rgba8 => "RGBA-8",
			SourceColorMode::Rgb8 => "RGB-8",
			SourceColorMode::Palette8 => "palette-8",
			SourceColorMode::GrayscaleAsRgb8 => "grayscale-8 (as RGB)",
			SourceColorMode::GrayscaleAlphaAsRgba8 => "grayscale+alpha-8 (as RGBA)",
		}
	}
}


/// Decoded pixels: `height` rows of `stride` bytes each, stored back to back.
#[derive(Debug, Clone)]
pub struct DecodedImage {
	pub width: u32,
	pub height: u32,
	pub stride: usize,
	pub mode: SourceColorMode,
	pub pixels: Vec<u8>,
}

impl DecodedImage {
	pub fn row_offset(&self, y: u32) -> usize {
		y as usize * self.stride
	}

	pub fn row(&self, y: u32) -> &[u8] {
		let start: usize = self.row_offset(y);
		return &self.pixels[start..start + self.stride];
	}
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTexture {
	pub format: TextureFormat,
	pub width: u32,
	pub height: u32,
	pub bytes: Vec<u8>,
}
