use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, TexError>;

#[derive(Debug, thiserror::Error)]
pub enum TexError {
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	#[error("could not decode PNG: {0}")]
	PngDecode(#[from] png::DecodingError),

	#[error("could not locate source file '{}'", .0.display())]
	MissingInput(PathBuf),

	#[error("could not prepare output directory '{}': {source}", .path.display())]
	OutputDirectory { path: PathBuf, source: io::Error },

	#[error("unsupported input: {0}")]
	UnsupportedInput(String),

	#[error("unsupported source color mode: {0}")]
	UnsupportedColorMode(String),

	#[error("invalid pixel layout: {0}")]
	InvalidLayout(String),

	#[error("unknown texture format '{0}' (expected rgba32, rgba16, i4, i8, ia4, ia8, ia16, ci4 or ci8)")]
	UnknownFormat(String),

	#[error("format {format} packs two pixels per byte and needs an even width, got {width}")]
	OddWidth { format: &'static str, width: u32 },

	#[error("palette index {index} at ({x}, {y}) does not fit in 4 bits")]
	PaletteIndexOutOfRange { x: u32, y: u32, index: u8 },

	#[error("format {format} cannot be encoded from a {mode} source")]
	SourceMismatch { format: &'static str, mode: &'static str },

	#[error("dimensions too large: {width}x{height}")]
	DimensionsTooLarge { width: u64, height: u64 },

	#[error("invalid OTEX header: {0}")]
	InvalidHeader(String),
}
