use clap::Parser;

use crate::{
	PathBuf,
	error::{Result, TexError},
	shared_types::{OutputMode, Parameters, TextureFormat},
};

const C_OUTPUT_FLAG: &str = "out_C";

/// Converts a PNG or BMP image into a packed texture and writes it either as
/// an OTEX container ('texture') or as a C byte array ('texture.c').
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
	/// Source image (.png or .bmp)
	pub input: PathBuf,

	/// Target texture format: rgba32, rgba16, i4, i8, ia4, ia8, ia16, ci4, ci8
	pub format: String,

	/// Pass 'out_C' to write a C array instead of the binary container
	pub output_mode: Option<String>,

	/// Directory the output file is written to, created if missing
	#[arg(short, long, default_value = ".")]
	pub output: PathBuf,

	/// Log every processing step
	#[arg(short, long, default_value_t = false)]
	pub verbose: bool,
}


pub fn validate(args: Args) -> Result<Parameters> {
	let format: TextureFormat = args.format.parse()?;

	let output_mode: OutputMode = match args.output_mode.as_deref() {
		Some(C_OUTPUT_FLAG) => OutputMode::CSource,
		Some(other) => {
			tracing::debug!(argument = other, "Unrecognized output mode, writing binary container");
			OutputMode::Binary
		},
		None => OutputMode::Binary,
	};

	match args.input.try_exists() {
		Ok(true) if args.input.is_file() => (),
		Ok(_) => return Err(TexError::MissingInput(args.input)),
		Err(error) => return Err(TexError::Io(error)),
	}

	return Ok(Parameters {
		source_path: args.input,
		target_path: args.output,
		format: format,
		output_mode: output_mode,
	});
}
