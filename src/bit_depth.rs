use std::io::Cursor;
use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::error::{Result, TexError};


/// Splits a packed row of 1-, 2-, 4- or 8-bit samples into one byte per sample.
/// Samples are stored most significant bits first, as in PNG and BMP rows.
pub fn unpack_samples(row: &[u8], bit_depth: u32, sample_count: usize) -> Result<Vec<u8>> {
	match bit_depth {
		1 | 2 | 4 | 8 => (),
		_ => return Err(TexError::UnsupportedColorMode(format!("{}-bit samples", bit_depth))),
	}

	if row.len() * 8 < sample_count * bit_depth as usize {
		return Err(TexError::InvalidLayout(format!(
			"row of {} bytes cannot hold {} samples of {} bits",
			row.len(), sample_count, bit_depth
		)));
	}

	let mut samples: Vec<u8> = Vec::with_capacity(sample_count);
	let mut bit_reader = BitReader::endian(Cursor::new(row), BigEndian);

	for _i in 0..sample_count {
		samples.push(bit_reader.read::<u8>(bit_depth)?);
	}

	return Ok(samples);
}


/// Stretches a low-depth grayscale level over the full 0-255 range,
/// so that the maximum level maps to 255.
pub fn scale_to_8bit(value: u8, bit_depth: u32) -> u8 {
	if bit_depth >= 8 {
		return value;
	}

	let max_level: u32 = (1u32 << bit_depth) - 1;
	return (value as u32 * 255 / max_level) as u8;
}
