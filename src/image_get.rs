use std::fs;
use std::io::{Cursor, Read};
use bmp_rust::bmp::{BMP, BITMAPFILEHEADER, DIBHEADER};

use crate::{
	PathBuf,
	bit_depth,
	error::{Result, TexError},
	shared_types::{DecodedImage, SourceColorMode},
};

const FILE_HEADER_SIZE: usize = 14;
const BMP_MIN_SIZE: usize = FILE_HEADER_SIZE + 12;
const COMPRESSION_OFFSET: usize = FILE_HEADER_SIZE + 16;
const MASKS_OFFSET: usize = FILE_HEADER_SIZE + 40;
const V5_INTENT_OFFSET: usize = FILE_HEADER_SIZE + 108;

const BI_RGB: u32 = 0;
const BI_RLE8: u32 = 1;
const BI_RLE4: u32 = 2;
const BI_BITFIELDS: u32 = 3;
const BI_JPEG: u32 = 4;
const BI_PNG: u32 = 5;
const BI_ALPHABITFIELDS: u32 = 6;

// 32-bit BI_RGB pixels: the top byte is unused, so they are opaque
const X8R8G8B8_MASKS: [u32; 4] = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0];

// Largest image we agree to hold in memory: 4 bytes per pixel must fit in a u32 length
const MAX_PIXELS: u64 = (u32::MAX / 4) as u64;


/// Loads the image at `source_file`, picking the decoder from its extension.
pub fn get_image(source_file: &PathBuf) -> Result<DecodedImage> {
	let extension: String = source_file
		.extension()
		.and_then(|os_str| os_str.to_str())
		.map(|ext| ext.to_ascii_lowercase())
		.unwrap_or_default();

	match extension.as_str() {
		"png" => (),
		"bmp" => (),
		_ => {
			return Err(TexError::UnsupportedInput(format!(
				"'{}' is not a PNG or BMP file", source_file.display()
			)));
		},
	}

	let bytes: Vec<u8> = fs::read(source_file)?;
	tracing::debug!(path = %source_file.display(), size = bytes.len(), "Read source image");

	if extension == "png" {
		return decode_png(Cursor::new(bytes));
	}

	return decode_bmp(bytes);
}


fn check_dimensions(width: u64, height: u64) -> Result<()> {
	if width == 0 || height == 0 {
		return Err(TexError::UnsupportedInput(format!("empty image ({}x{})", width, height)));
	}

	if width > u32::MAX as u64 || height > u32::MAX as u64 || width * height > MAX_PIXELS {
		return Err(TexError::DimensionsTooLarge { width: width, height: height });
	}

	return Ok(());
}


/// Decodes a PNG stream into one of the 8-bit source layouts. 16-bit samples
/// are stripped, grayscale is widened to RGB (or RGBA with alpha) and low-depth
/// palette rows are unpacked to one index per byte.
pub fn decode_png<R: Read>(source: R) -> Result<DecodedImage> {
	let mut decoder = png::Decoder::new(source);
	decoder.set_transformations(png::Transformations::STRIP_16);
	let mut reader = decoder.read_info()?;

	let mut buffer: Vec<u8> = vec![0; reader.output_buffer_size()];
	let frame = reader.next_frame(&mut buffer)?;

	check_dimensions(frame.width as u64, frame.height as u64)?;

	let width: u32 = frame.width;
	let height: u32 = frame.height;
	let line_size: usize = frame.line_size;
	let depth: u32 = frame.bit_depth as u32;
	let source_bytes: &[u8] = &buffer[..frame.buffer_size()];

	tracing::debug!(width, height, depth, color_type = ?frame.color_type, "Decoded PNG");

	if depth > 8 {
		return Err(TexError::UnsupportedColorMode(format!("{}-bit PNG samples survived stripping", depth)));
	}

	let image: DecodedImage = match frame.color_type {
		png::ColorType::Rgba => DecodedImage {
			width: width,
			height: height,
			stride: line_size,
			mode: SourceColorMode::Rgba8,
			pixels: source_bytes.to_vec(),
		},

		png::ColorType::Rgb => DecodedImage {
			width: width,
			height: height,
			stride: line_size,
			mode: SourceColorMode::Rgb8,
			pixels: source_bytes.to_vec(),
		},

		png::ColorType::Indexed => {
			let mut pixels: Vec<u8> = Vec::with_capacity(width as usize * height as usize);

			for row in source_bytes.chunks_exact(line_size) {
				pixels.extend(bit_depth::unpack_samples(row, depth, width as usize)?);
			}

			DecodedImage {
				width: width,
				height: height,
				stride: width as usize,
				mode: SourceColorMode::Palette8,
				pixels: pixels,
			}
		},

		png::ColorType::Grayscale => {
			let mut pixels: Vec<u8> = Vec::with_capacity(width as usize * height as usize * 3);

			for row in source_bytes.chunks_exact(line_size) {
				for level in bit_depth::unpack_samples(row, depth, width as usize)? {
					let gray: u8 = bit_depth::scale_to_8bit(level, depth);
					pixels.extend_from_slice(&[gray, gray, gray]);
				}
			}

			DecodedImage {
				width: width,
				height: height,
				stride: width as usize * 3,
				mode: SourceColorMode::GrayscaleAsRgb8,
				pixels: pixels,
			}
		},

		png::ColorType::GrayscaleAlpha => {
			let mut pixels: Vec<u8> = Vec::with_capacity(width as usize * height as usize * 4);

			for row in source_bytes.chunks_exact(line_size) {
				for pixel in row[..width as usize * 2].chunks_exact(2) {
					pixels.extend_from_slice(&[pixel[0], pixel[0], pixel[0], pixel[1]]);
				}
			}

			DecodedImage {
				width: width,
				height: height,
				stride: width as usize * 4,
				mode: SourceColorMode::GrayscaleAlphaAsRgba8,
				pixels: pixels,
			}
		},
	};

	return Ok(image);
}


/// Decodes an uncompressed BMP. Indexed images keep their raw indices,
/// 24- and 32-bit images are reordered from BGR(A) to RGB(A).
pub fn decode_bmp(bytes: Vec<u8>) -> Result<DecodedImage> {
	if bytes.len() < BMP_MIN_SIZE || &bytes[0..2] != b"BM" {
		return Err(TexError::UnsupportedInput("not a BMP file".to_string()));
	}

	// bmp_rust indexes the header bytes without bounds checks, so check them here first
	let dib_size: usize = read_u32_le(&bytes, FILE_HEADER_SIZE) as usize;

	if bytes.len() < FILE_HEADER_SIZE + dib_size {
		return Err(TexError::UnsupportedInput(format!(
			"BMP DIB header of {} bytes is truncated, file holds {}", dib_size, bytes.len()
		)));
	}

	let compression: u32 = match dib_size {
		12 => BI_RGB,
		40 | 108 | 124 => read_u32_le(&bytes, COMPRESSION_OFFSET),
		_ => return Err(TexError::UnsupportedInput(format!("BMP DIB header of {} bytes", dib_size))),
	};

	match compression {
		BI_RGB | BI_BITFIELDS | BI_ALPHABITFIELDS => (),
		BI_RLE8 | BI_RLE4 | BI_JPEG | BI_PNG => {
			return Err(TexError::UnsupportedInput(format!("compressed BMP (compression {})", compression)));
		},
		_ => return Err(TexError::UnsupportedInput(format!("unknown BMP compression {}", compression))),
	}

	if dib_size == 124 && read_u32_le(&bytes, V5_INTENT_OFFSET) > 4 {
		return Err(TexError::UnsupportedInput("unknown BMP rendering intent".to_string()));
	}

	// Not using BMP::new_from_file, it panics on read failure
	let mut bmp: BMP = BMP::new(1i32, 1u32, Some([0u8, 0u8, 0u8, 0u8]));
	bmp.contents = bytes;

	let file_header: BITMAPFILEHEADER = BMP::get_header(&bmp);

	let dib_header: DIBHEADER = match BMP::get_dib_header(&bmp) {
		Ok(header) => header,
		_ => return Err(TexError::UnsupportedInput("could not read BMP DIB header".to_string())),
	};

	let bit_count: u32 = dib_header.bitcount as u32;
	let raw_height: i64 = dib_header.height as i64;
	let width: u64 = dib_header.width as u64;
	let height: u64 = raw_height.unsigned_abs();
	check_dimensions(width, height)?;

	let (mode, bytes_per_pixel): (SourceColorMode, usize) = match (bit_count, compression) {
		(1 | 2 | 4 | 8, BI_RGB) => (SourceColorMode::Palette8, 1),
		(24, BI_RGB) => (SourceColorMode::Rgb8, 3),
		(32, _) => (SourceColorMode::Rgba8, 4),
		_ => {
			return Err(TexError::UnsupportedColorMode(format!(
				"{}-bit BMP (compression {})", bit_count, compression
			)));
		},
	};

	let masks: [u32; 4] = match compression {
		BI_RGB => X8R8G8B8_MASKS,
		_ => bitfield_masks(&bmp.contents, dib_size, compression)?,
	};

	// Rows are padded to 4 bytes
	let row_size: usize = ((bit_count as usize * width as usize + 31) / 32) * 4;
	let start: usize = file_header.bfOffBits as usize;
	let end: usize = start + row_size * height as usize;

	if bmp.contents.len() < end {
		return Err(TexError::InvalidLayout(format!(
			"BMP pixel array needs {} bytes, file holds {}", end, bmp.contents.len()
		)));
	}

	let pixel_array: &[u8] = &bmp.contents[start..end];
	let width: u32 = width as u32;
	let height: u32 = height as u32;

	// Positive height means the last row comes first
	let rows: Vec<&[u8]> = if raw_height > 0 {
		pixel_array.chunks_exact(row_size).rev().collect()
	} else {
		pixel_array.chunks_exact(row_size).collect()
	};

	tracing::debug!(width, height, bit_count, compression, "Decoded BMP header");

	let mut pixels: Vec<u8> = Vec::with_capacity(width as usize * height as usize * bytes_per_pixel);

	for row in rows {
		match bit_count {
			24 => {
				for pixel in row[..width as usize * 3].chunks_exact(3) {
					pixels.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
				}
			},

			32 => {
				for pixel in row[..width as usize * 4].chunks_exact(4) {
					let value: u32 = u32::from_le_bytes([pixel[0], pixel[1], pixel[2], pixel[3]]);

					pixels.push(mask_channel(value, masks[0]).unwrap_or(0));
					pixels.push(mask_channel(value, masks[1]).unwrap_or(0));
					pixels.push(mask_channel(value, masks[2]).unwrap_or(0));
					pixels.push(mask_channel(value, masks[3]).unwrap_or(0xFF));
				}
			},

			_ => pixels.extend(bit_depth::unpack_samples(row, bit_count, width as usize)?),
		}
	}

	return Ok(DecodedImage {
		width: width,
		height: height,
		stride: width as usize * bytes_per_pixel,
		mode: mode,
		pixels: pixels,
	});
}


fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
	return u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]]);
}


/// Red, green, blue and alpha masks of a BI_BITFIELDS or BI_ALPHABITFIELDS image.
/// They follow a 40-byte header and sit inside V4/V5 headers, at the same offset.
fn bitfield_masks(bytes: &[u8], dib_size: usize, compression: u32) -> Result<[u32; 4]> {
	let mask_count: usize = if compression == BI_ALPHABITFIELDS || dib_size >= 108 { 4 } else { 3 };
	let end: usize = MASKS_OFFSET + mask_count * 4;

	if bytes.len() < end {
		return Err(TexError::InvalidLayout(format!(
			"BMP bit masks need {} bytes, file holds {}", end, bytes.len()
		)));
	}

	let mut masks: [u32; 4] = [0; 4];

	for (i, mask) in masks.iter_mut().take(mask_count).enumerate() {
		*mask = read_u32_le(bytes, MASKS_OFFSET + i * 4);
	}

	return Ok(masks);
}


/// Extracts the channel selected by `mask` and widens it to 8 bits.
/// An empty mask means the channel is absent.
fn mask_channel(pixel: u32, mask: u32) -> Option<u8> {
	if mask == 0 {
		return None;
	}

	let shift: u32 = mask.trailing_zeros();
	let bits: u32 = (mask >> shift).count_ones();
	let value: u32 = (pixel & mask) >> shift;

	if bits >= 8 {
		return Some((value >> (bits - 8)) as u8);
	}

	return Some(bit_depth::scale_to_8bit(value as u8, bits));
}
