use std::fmt::Write as _;
use std::io::{Write, BufWriter};
use std::fs::{self, File};
use std::path::Path;

use crate::{
	PathBuf,
	bin_header,
	bin_header::OtexHeader,
	error::{Result, TexError},
	shared_types::{EncodedTexture, OutputMode, Parameters},
};

pub const BINARY_FILE_NAME: &str = "texture";
pub const C_FILE_NAME: &str = "texture.c";


/// Writes the encoded texture in the requested output mode and returns the
/// path of the file written.
pub fn make_texture(parameters: &Parameters, texture: &EncodedTexture) -> Result<PathBuf> {
	match parameters.output_mode {
		OutputMode::Binary => make_binary(&parameters.target_path, texture),
		OutputMode::CSource => make_c_source(&parameters.target_path, texture),
	}
}


pub fn container_bytes(texture: &EncodedTexture) -> Result<Vec<u8>> {
	let payload_size: u32 = match u32::try_from(texture.bytes.len()) {
		Ok(size) => size,
		_ => {
			return Err(TexError::DimensionsTooLarge {
				width: texture.width as u64,
				height: texture.height as u64,
			});
		},
	};

	let mut container: Vec<u8> = bin_header::get_bytes(&OtexHeader {
		format: texture.format,
		width: texture.width,
		height: texture.height,
		payload_size: payload_size,
	})?;

	container.extend_from_slice(&texture.bytes);
	return Ok(container);
}


/// `unsigned char tex[] = {` followed by one `0x..,` per byte.
pub fn c_array(texture: &EncodedTexture) -> String {
	let mut source: String = String::with_capacity(32 + texture.bytes.len() * 5);
	source.push_str("unsigned char tex[] = {\n\t");

	for byte in &texture.bytes {
		let _ = write!(source, "0x{:x},", byte);
	}

	source.push_str("\n};");
	return source;
}


fn make_binary(target_dir: &Path, texture: &EncodedTexture) -> Result<PathBuf> {
	let container: Vec<u8> = container_bytes(texture)?;
	let target_path: PathBuf = target_dir.join(BINARY_FILE_NAME);

	write_file(&target_path, &container)?;
	return Ok(target_path);
}


fn make_c_source(target_dir: &Path, texture: &EncodedTexture) -> Result<PathBuf> {
	let source: String = c_array(texture);
	let target_path: PathBuf = target_dir.join(C_FILE_NAME);

	write_file(&target_path, source.as_bytes())?;
	return Ok(target_path);
}


/// Creates the output directory if needed. Only called once the data to write
/// is complete, so a failed conversion leaves the disk untouched.
fn create_target_dir(target_dir: &Path) -> Result<()> {
	match target_dir.try_exists() {
		Ok(true) => (),

		Ok(false) => {
			if let Err(error) = fs::create_dir_all(target_dir) {
				return Err(TexError::OutputDirectory { path: target_dir.to_path_buf(), source: error });
			}
			tracing::debug!(path = %target_dir.display(), "Created output directory");
		},

		Err(error) => return Err(TexError::OutputDirectory { path: target_dir.to_path_buf(), source: error }),
	}

	return Ok(());
}


fn write_file(target_path: &Path, data: &[u8]) -> Result<()> {
	if let Some(target_dir) = target_path.parent() {
		create_target_dir(target_dir)?;
	}

	let file: File = File::create(target_path)?;
	let mut buffer = BufWriter::new(file);

	buffer.write_all(data)?;
	buffer.flush()?;

	tracing::debug!(path = %target_path.display(), size = data.len(), "Wrote output file");
	return Ok(());
}
