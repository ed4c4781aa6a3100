use crate::error::{Result, TexError};
use crate::shared_types::{DecodedImage, SourceColorMode};

/// Read-only per-pixel view over a decoded image. Hides the source layout
/// from the encoders: every pixel comes back as R, G, B, A.
#[derive(Debug, Clone, Copy)]
pub struct PixelSource<'a> {
	image: &'a DecodedImage,
	bytes_per_pixel: usize,
}

impl<'a> PixelSource<'a> {
	pub fn new(image: &'a DecodedImage) -> Result<PixelSource<'a>> {
		let bytes_per_pixel: usize = image.mode.bytes_per_pixel();
		let min_stride: usize = image.width as usize * bytes_per_pixel;

		if image.stride < min_stride {
			return Err(TexError::InvalidLayout(format!(
				"row stride {} is shorter than {} pixels of {} bytes",
				image.stride, image.width, bytes_per_pixel
			)));
		}

		let expected_len: usize = image.stride * image.height as usize;

		if image.pixels.len() != expected_len {
			return Err(TexError::InvalidLayout(format!(
				"pixel buffer holds {} bytes, {} rows of {} bytes need {}",
				image.pixels.len(), image.height, image.stride, expected_len
			)));
		}

		return Ok(PixelSource {
			image: image,
			bytes_per_pixel: bytes_per_pixel,
		});
	}

	pub fn width(&self) -> u32 {
		self.image.width
	}

	pub fn height(&self) -> u32 {
		self.image.height
	}

	pub fn mode(&self) -> SourceColorMode {
		self.image.mode
	}

	/// Channels of the pixel at (x, y). Sources without alpha report 0xFF.
	/// For palette sources R holds the raw index and G, B, A are zero.
	pub fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
		let row: &[u8] = self.image.row(y);
		let offset: usize = x as usize * self.bytes_per_pixel;

		match self.image.mode {
			SourceColorMode::Rgba8 | SourceColorMode::GrayscaleAlphaAsRgba8 => [
				row[offset],
				row[offset + 1],
				row[offset + 2],
				row[offset + 3],
			],

			SourceColorMode::Rgb8 | SourceColorMode::GrayscaleAsRgb8 => [
				row[offset],
				row[offset + 1],
				row[offset + 2],
				0xFF,
			],

			SourceColorMode::Palette8 => [row[offset], 0, 0, 0],
		}
	}

	fn first_byte(&self, x: u32, y: u32) -> u8 {
		self.image.pixels[self.image.row_offset(y) + x as usize * self.bytes_per_pixel]
	}

	/// Grayscale value: the red channel.
	pub fn gray(&self, x: u32, y: u32) -> u8 {
		self.first_byte(x, y)
	}

	pub fn alpha(&self, x: u32, y: u32) -> u8 {
		self.rgba(x, y)[3]
	}

	/// Raw palette index. Only meaningful for palette sources.
	pub fn index(&self, x: u32, y: u32) -> u8 {
		self.first_byte(x, y)
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	fn image(mode: SourceColorMode, width: u32, height: u32, stride: usize, pixels: Vec<u8>) -> DecodedImage {
		DecodedImage { width, height, stride, mode, pixels }
	}

	#[test]
	fn reads_rgba_with_padded_stride() {
		let decoded = image(SourceColorMode::Rgba8, 1, 2, 6, vec![
			1, 2, 3, 4, 0xEE, 0xEE,
			5, 6, 7, 8, 0xEE, 0xEE,
		]);
		let source = PixelSource::new(&decoded).unwrap();

		assert_eq!(source.rgba(0, 0), [1, 2, 3, 4]);
		assert_eq!(source.rgba(0, 1), [5, 6, 7, 8]);
	}

	#[test]
	fn rgb_sources_are_opaque() {
		let decoded = image(SourceColorMode::Rgb8, 2, 1, 6, vec![10, 20, 30, 40, 50, 60]);
		let source = PixelSource::new(&decoded).unwrap();

		assert_eq!(source.rgba(1, 0), [40, 50, 60, 0xFF]);
		assert_eq!(source.alpha(0, 0), 0xFF);
	}

	#[test]
	fn palette_index_is_red_channel() {
		let decoded = image(SourceColorMode::Palette8, 3, 1, 3, vec![3, 7, 255]);
		let source = PixelSource::new(&decoded).unwrap();

		assert_eq!(source.index(2, 0), 255);
		assert_eq!(source.rgba(1, 0)[0], 7);
	}

	#[test]
	fn short_stride_is_rejected() {
		let decoded = image(SourceColorMode::Rgba8, 2, 1, 7, vec![0; 7]);
		assert!(matches!(PixelSource::new(&decoded), Err(TexError::InvalidLayout(_))));
	}

	#[test]
	fn truncated_buffer_is_rejected() {
		let decoded = image(SourceColorMode::Palette8, 4, 2, 4, vec![0; 7]);
		assert!(matches!(PixelSource::new(&decoded), Err(TexError::InvalidLayout(_))));
	}
}
