use std::io::Cursor;
use bitstream_io::{ByteRead, ByteReader, ByteWrite, ByteWriter, LittleEndian};

use crate::error::{Result, TexError};
use crate::shared_types::TextureFormat;

pub const HEADER_SIZE: usize = 0x50;

// "OTEX"
pub const RESOURCE_TYPE: u32 = 0x4F544558;
pub const ASSET_ID: u64 = 0x0715112907151129;
const RESERVED_SIZE: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtexHeader {
	pub format: TextureFormat,
	pub width: u32,
	pub height: u32,
	pub payload_size: u32,
}


pub fn get_bytes(header: &OtexHeader) -> Result<Vec<u8>> {
	let mut header_data: Vec<u8> = Vec::with_capacity(HEADER_SIZE);
	let mut byte_writer = ByteWriter::endian(&mut header_data, LittleEndian);

	byte_writer.write(0u32)?; // Endianness | 0x00
	byte_writer.write(RESOURCE_TYPE)?; // Resource type | 0x04
	byte_writer.write(0u32)?; // Major version | 0x08
	byte_writer.write(ASSET_ID)?; // Asset ID | 0x0C
	byte_writer.write(0u32)?; // Small version | 0x14
	byte_writer.write(0u64)?; // ROM CRC | 0x18
	byte_writer.write(0u32)?; // ROM enum version | 0x20
	byte_writer.write_bytes(&[0u8; RESERVED_SIZE])?; // Reserved | 0x24

	byte_writer.write_bytes(&header.format.tag())?; // 0x40
	byte_writer.write(header.width)?; // 0x44
	byte_writer.write(header.height)?; // 0x48
	byte_writer.write(header.payload_size)?; // 0x4C

	byte_writer.into_writer();
	return Ok(header_data);
}


pub fn get_header(data: &[u8]) -> Result<OtexHeader> {
	if data.len() < HEADER_SIZE {
		return Err(TexError::InvalidHeader(format!("{} bytes, expected at least {}", data.len(), HEADER_SIZE)));
	}

	let mut byte_reader = ByteReader::endian(Cursor::new(&data[..HEADER_SIZE]), LittleEndian);

	let _endianness: u32 = byte_reader.read()?;
	let resource_type: u32 = byte_reader.read()?;

	if resource_type != RESOURCE_TYPE {
		return Err(TexError::InvalidHeader(format!("resource type {:#010X} is not OTEX", resource_type)));
	}

	// Versions, asset ID, ROM fields and reserved block
	let mut skipped: [u8; 0x40 - 0x08] = [0; 0x40 - 0x08];
	byte_reader.read_bytes(&mut skipped)?;

	let mut tag: [u8; 4] = [0; 4];
	byte_reader.read_bytes(&mut tag)?;
	let format: TextureFormat = TextureFormat::from_tag(tag)
		.ok_or_else(|| TexError::InvalidHeader(format!("unknown format tag {:?}", tag)))?;

	return Ok(OtexHeader {
		format: format,
		width: byte_reader.read()?,
		height: byte_reader.read()?,
		payload_size: byte_reader.read()?,
	});
}


#[cfg(test)]
mod tests {
	use super::*;

	fn sample_header() -> OtexHeader {
		OtexHeader {
			format: TextureFormat::GrayAlpha16,
			width: 32,
			height: 16,
			payload_size: 32 * 16 * 2,
		}
	}

	#[test]
	fn fields_sit_at_fixed_offsets() {
		let data: Vec<u8> = get_bytes(&sample_header()).unwrap();

		assert_eq!(data.len(), HEADER_SIZE);
		assert_eq!(&data[0x00..0x04], &[0, 0, 0, 0]);
		assert_eq!(&data[0x04..0x08], &0x4F544558u32.to_le_bytes());
		assert_eq!(&data[0x0C..0x14], &[0x29, 0x11, 0x15, 0x07, 0x29, 0x11, 0x15, 0x07]);
		assert!(data[0x14..0x40].iter().all(|&b| b == 0));
		assert_eq!(&data[0x40..0x44], b"IA16");
		assert_eq!(&data[0x44..0x48], &32u32.to_le_bytes());
		assert_eq!(&data[0x48..0x4C], &16u32.to_le_bytes());
		assert_eq!(&data[0x4C..0x50], &1024u32.to_le_bytes());
	}

	#[test]
	fn short_tags_are_zero_padded() {
		let mut header: OtexHeader = sample_header();
		header.format = TextureFormat::Gray4;

		let data: Vec<u8> = get_bytes(&header).unwrap();
		assert_eq!(&data[0x40..0x44], b"I4\0\0");
	}

	#[test]
	fn parses_what_it_writes() {
		let data: Vec<u8> = get_bytes(&sample_header()).unwrap();
		assert_eq!(get_header(&data).unwrap(), sample_header());
	}

	#[test]
	fn rejects_foreign_resource_type() {
		let mut data: Vec<u8> = get_bytes(&sample_header()).unwrap();
		data[0x04] = 0;

		assert!(matches!(get_header(&data), Err(TexError::InvalidHeader(_))));
	}

	#[test]
	fn rejects_truncated_header() {
		assert!(matches!(get_header(&[0u8; 0x20]), Err(TexError::InvalidHeader(_))));
	}
}
