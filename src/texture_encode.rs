use bitstream_io::{BigEndian, BitWrite, BitWriter};
use rayon::prelude::*;

use crate::error::{Result, TexError};
use crate::pixel_source::PixelSource;
use crate::shared_types::{DecodedImage, EncodedTexture, SourceColorMode, TextureFormat};

type RowWriter<'w> = BitWriter<&'w mut Vec<u8>, BigEndian>;
type RowEncoder = fn(&PixelSource<'_>, u32, &mut RowWriter<'_>) -> Result<()>;


/// Encodes the whole image into `format`. Rows are independent and are
/// encoded in parallel, then joined in row order.
pub fn encode(image: &DecodedImage, format: TextureFormat) -> Result<EncodedTexture> {
	let source: PixelSource = PixelSource::new(image)?;
	check_source(&source, format)?;

	// Two pixels per byte: an odd trailing pixel has no partner
	if format.is_nibble_packed() && source.width() % 2 != 0 {
		return Err(TexError::OddWidth {
			format: format.code(),
			width: source.width(),
		});
	}

	let row_encoder: RowEncoder = match format {
		TextureFormat::FullColor32 => encode_rgba32,
		TextureFormat::FullColor16 => encode_rgba16,
		TextureFormat::Gray4 => encode_i4,
		TextureFormat::Gray8 => encode_i8,
		TextureFormat::GrayAlpha4 => encode_ia4,
		TextureFormat::GrayAlpha8 => encode_ia8,
		TextureFormat::GrayAlpha16 => encode_ia16,
		TextureFormat::Palette4 => encode_ci4,
		TextureFormat::Palette8 => encode_ci8,
	};

	let rows: Vec<Vec<u8>> = (0..source.height())
		.into_par_iter()
		.map(|y| encode_row(&source, y, format, row_encoder))
		.collect::<Result<Vec<Vec<u8>>>>()?;

	let bytes: Vec<u8> = rows.concat();
	debug_assert_eq!(bytes.len(), format.payload_len(source.width(), source.height()));

	return Ok(EncodedTexture {
		format: format,
		width: source.width(),
		height: source.height(),
		bytes: bytes,
	});
}


fn check_source(source: &PixelSource, format: TextureFormat) -> Result<()> {
	let palette_source: bool = source.mode() == SourceColorMode::Palette8;

	if format.is_palette() != palette_source {
		return Err(TexError::SourceMismatch {
			format: format.code(),
			mode: source.mode().name(),
		});
	}

	return Ok(());
}


fn encode_row(source: &PixelSource, y: u32, format: TextureFormat, row_encoder: RowEncoder) -> Result<Vec<u8>> {
	let mut row: Vec<u8> = Vec::with_capacity(format.row_len(source.width()));
	let mut bit_writer = BitWriter::endian(&mut row, BigEndian);

	row_encoder(source, y, &mut bit_writer)?;

	bit_writer.byte_align()?;
	bit_writer.into_writer();

	return Ok(row);
}


// R, G, B, A copied as-is
fn encode_rgba32(source: &PixelSource, y: u32, bit_writer: &mut RowWriter) -> Result<()> {
	for x in 0..source.width() {
		bit_writer.write_bytes(&source.rgba(x, y))?;
	}

	return Ok(());
}


// RRRRRGGGGGBBBBBA, big-endian. Channels are truncated, not rounded.
fn encode_rgba16(source: &PixelSource, y: u32, bit_writer: &mut RowWriter) -> Result<()> {
	for x in 0..source.width() {
		let [red, green, blue, alpha] = source.rgba(x, y);

		bit_writer.write(5, red / 8)?;
		bit_writer.write(5, green / 8)?;
		bit_writer.write(5, blue / 8)?;
		bit_writer.write_bit(alpha != 0)?;
	}

	return Ok(());
}


fn encode_i8(source: &PixelSource, y: u32, bit_writer: &mut RowWriter) -> Result<()> {
	for x in 0..source.width() {
		bit_writer.write(8, source.gray(x, y))?;
	}

	return Ok(());
}


// Even pixel lands in the high nibble, odd pixel in the low one.
// Each pixel is read at its own offset, whatever the source layout.
fn encode_i4(source: &PixelSource, y: u32, bit_writer: &mut RowWriter) -> Result<()> {
	for x in 0..source.width() {
		bit_writer.write(4, source.gray(x, y) / 16)?;
	}

	return Ok(());
}


fn encode_ia16(source: &PixelSource, y: u32, bit_writer: &mut RowWriter) -> Result<()> {
	for x in 0..source.width() {
		bit_writer.write(8, source.gray(x, y))?;
		bit_writer.write(8, source.alpha(x, y))?;
	}

	return Ok(());
}


fn encode_ia8(source: &PixelSource, y: u32, bit_writer: &mut RowWriter) -> Result<()> {
	for x in 0..source.width() {
		bit_writer.write(4, source.gray(x, y) / 16)?;
		bit_writer.write(4, source.alpha(x, y) / 16)?;
	}

	return Ok(());
}


// Per pixel: 3-bit intensity then 1-bit "alpha is non-zero", two pixels per byte
fn encode_ia4(source: &PixelSource, y: u32, bit_writer: &mut RowWriter) -> Result<()> {
	for x in 0..source.width() {
		bit_writer.write(3, source.gray(x, y) / 32)?;
		bit_writer.write_bit(source.alpha(x, y) != 0)?;
	}

	return Ok(());
}


fn encode_ci8(source: &PixelSource, y: u32, bit_writer: &mut RowWriter) -> Result<()> {
	for x in 0..source.width() {
		bit_writer.write(8, source.index(x, y))?;
	}

	return Ok(());
}


fn encode_ci4(source: &PixelSource, y: u32, bit_writer: &mut RowWriter) -> Result<()> {
	for x in 0..source.width() {
		let index: u8 = source.index(x, y);

		if index > 0xF {
			return Err(TexError::PaletteIndexOutOfRange { x: x, y: y, index: index });
		}

		bit_writer.write(4, index)?;
	}

	return Ok(());
}


#[cfg(test)]
mod tests {
	use super::*;

	fn rgba_image(width: u32, height: u32, pixels: Vec<u8>) -> DecodedImage {
		DecodedImage {
			width,
			height,
			stride: width as usize * 4,
			mode: SourceColorMode::Rgba8,
			pixels,
		}
	}

	fn gray_alpha_image(width: u32, samples: &[(u8, u8)]) -> DecodedImage {
		let mut pixels: Vec<u8> = Vec::new();
		for &(gray, alpha) in samples {
			pixels.extend_from_slice(&[gray, gray, gray, alpha]);
		}

		DecodedImage {
			width,
			height: samples.len() as u32 / width,
			stride: width as usize * 4,
			mode: SourceColorMode::GrayscaleAlphaAsRgba8,
			pixels,
		}
	}

	fn palette_image(width: u32, height: u32, indices: Vec<u8>) -> DecodedImage {
		DecodedImage {
			width,
			height,
			stride: width as usize,
			mode: SourceColorMode::Palette8,
			pixels: indices,
		}
	}

	#[test]
	fn rgba32_copies_channels() {
		let pixels: Vec<u8> = vec![1, 2, 3, 4, 250, 251, 252, 253];
		let encoded = encode(&rgba_image(2, 1, pixels.clone()), TextureFormat::FullColor32).unwrap();

		assert_eq!(encoded.bytes, pixels);
		assert_eq!((encoded.width, encoded.height), (2, 1));
	}

	#[test]
	fn rgba16_truncates_and_is_big_endian() {
		let encoded = encode(&rgba_image(1, 1, vec![248, 255, 8, 255]), TextureFormat::FullColor16).unwrap();
		assert_eq!(encoded.bytes, vec![0xFF, 0xC3]);

		// 7 / 8 == 0: truncation, not rounding; zero alpha clears the low bit
		let encoded = encode(&rgba_image(1, 1, vec![7, 0, 0, 0]), TextureFormat::FullColor16).unwrap();
		assert_eq!(encoded.bytes, vec![0x00, 0x00]);
	}

	#[test]
	fn rgba16_alpha_comes_from_alpha_channel() {
		// Blue is zero but alpha is set
		let encoded = encode(&rgba_image(1, 1, vec![0, 0, 0, 1]), TextureFormat::FullColor16).unwrap();
		assert_eq!(encoded.bytes, vec![0x00, 0x01]);
	}

	#[test]
	fn i8_places_gray_at_row_major_position() {
		let mut pixels: Vec<u8> = vec![0; 3 * 2 * 4];
		// (x = 2, y = 1)
		pixels[(1 * 3 + 2) * 4] = 200;

		let encoded = encode(&rgba_image(3, 2, pixels), TextureFormat::Gray8).unwrap();
		assert_eq!(encoded.bytes[1 * 3 + 2], 200);
		assert_eq!(encoded.bytes.iter().filter(|&&b| b != 0).count(), 1);
	}

	#[test]
	fn i4_reads_each_pixel_at_its_own_offset() {
		// RGB source: 3 bytes per pixel, the second pixel starts at byte 3
		let image = DecodedImage {
			width: 2,
			height: 1,
			stride: 6,
			mode: SourceColorMode::GrayscaleAsRgb8,
			pixels: vec![0xA0, 0xA0, 0xA0, 0x30, 0x30, 0x30],
		};

		let encoded = encode(&image, TextureFormat::Gray4).unwrap();
		assert_eq!(encoded.bytes, vec![0xA3]);
	}

	#[test]
	fn ia16_passes_gray_and_alpha_through() {
		let encoded = encode(&gray_alpha_image(2, &[(17, 34), (200, 0)]), TextureFormat::GrayAlpha16).unwrap();
		assert_eq!(encoded.bytes, vec![17, 34, 200, 0]);
	}

	#[test]
	fn ia8_packs_nibbles() {
		let encoded = encode(&gray_alpha_image(1, &[(130, 64)]), TextureFormat::GrayAlpha8).unwrap();
		assert_eq!(encoded.bytes, vec![0x84]);
	}

	#[test]
	fn ia4_packs_three_bit_gray_and_alpha_flag() {
		// 255 / 32 = 7 -> 0b1111 ; 64 / 32 = 2 with zero alpha -> 0b0100
		let encoded = encode(&gray_alpha_image(2, &[(255, 1), (64, 0)]), TextureFormat::GrayAlpha4).unwrap();
		assert_eq!(encoded.bytes, vec![0xF4]);
	}

	#[test]
	fn ci8_copies_indices() {
		let encoded = encode(&palette_image(3, 1, vec![3, 7, 255]), TextureFormat::Palette8).unwrap();
		assert_eq!(encoded.bytes, vec![3, 7, 255]);
	}

	#[test]
	fn ci4_packs_pairs() {
		let encoded = encode(&palette_image(2, 1, vec![1, 2]), TextureFormat::Palette4).unwrap();
		assert_eq!(encoded.bytes, vec![0x12]);

		let encoded = encode(&palette_image(4, 2, vec![0, 15, 3, 4, 5, 6, 14, 1]), TextureFormat::Palette4).unwrap();
		assert_eq!(encoded.bytes, vec![0x0F, 0x34, 0x56, 0xE1]);
	}

	#[test]
	fn ci4_rejects_wide_indices() {
		match encode(&palette_image(2, 1, vec![1, 16]), TextureFormat::Palette4) {
			Err(TexError::PaletteIndexOutOfRange { x, y, index }) => assert_eq!((x, y, index), (1, 0, 16)),
			other => panic!("expected PaletteIndexOutOfRange, got {:?}", other),
		}
	}

	#[test]
	fn odd_width_is_rejected_for_packed_formats() {
		let image: DecodedImage = rgba_image(3, 1, vec![0; 12]);

		for format in [TextureFormat::Gray4, TextureFormat::GrayAlpha4] {
			assert!(matches!(encode(&image, format), Err(TexError::OddWidth { width: 3, .. })));
		}

		assert!(matches!(
			encode(&palette_image(3, 1, vec![0; 3]), TextureFormat::Palette4),
			Err(TexError::OddWidth { .. })
		));

		// Byte-per-pixel formats take odd widths
		assert!(encode(&image, TextureFormat::Gray8).is_ok());
	}

	#[test]
	fn palette_and_color_sources_do_not_mix() {
		assert!(matches!(
			encode(&palette_image(2, 1, vec![0, 1]), TextureFormat::FullColor32),
			Err(TexError::SourceMismatch { .. })
		));
		assert!(matches!(
			encode(&rgba_image(2, 1, vec![0; 8]), TextureFormat::Palette8),
			Err(TexError::SourceMismatch { .. })
		));
	}

	#[test]
	fn row_padding_is_skipped() {
		let image = DecodedImage {
			width: 2,
			height: 2,
			stride: 4,
			mode: SourceColorMode::Palette8,
			pixels: vec![1, 2, 0xAA, 0xAA, 3, 4, 0xAA, 0xAA],
		};

		let encoded = encode(&image, TextureFormat::Palette8).unwrap();
		assert_eq!(encoded.bytes, vec![1, 2, 3, 4]);
	}

	#[test]
	fn encoding_is_deterministic() {
		let pixels: Vec<u8> = (0..64u8).map(|v| v.wrapping_mul(37)).collect();
		let image: DecodedImage = rgba_image(4, 4, pixels);

		for format in TextureFormat::ALL.into_iter().filter(|f| !f.is_palette()) {
			assert_eq!(encode(&image, format).unwrap(), encode(&image, format).unwrap());
		}
	}

	mod density {
		use super::{palette_image, rgba_image};
		use crate::shared_types::{DecodedImage, EncodedTexture, TextureFormat};
		use crate::texture_encode::encode;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn payload_length_follows_format_density(half_width in 1u32..9, height in 1u32..9, seed in any::<u8>()) {
				let width: u32 = half_width * 2;
				let count: usize = (width * height) as usize;

				let rgba: DecodedImage = rgba_image(width, height, (0..count * 4).map(|i| seed.wrapping_add(i as u8)).collect());
				let indexed: DecodedImage = palette_image(width, height, (0..count).map(|i| seed.wrapping_add(i as u8) & 0xF).collect());

				for format in TextureFormat::ALL {
					let image: &DecodedImage = if format.is_palette() { &indexed } else { &rgba };
					let encoded: EncodedTexture = encode(image, format).unwrap();

					prop_assert_eq!(encoded.bytes.len(), count * format.info().bits_per_pixel as usize / 8);
				}
			}
		}
	}
}
