use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use texotr::{
	image_get,
	param_validator,
	texture_encode,
	texture_make,
	error::Result,
	param_validator::Args,
	shared_types::{DecodedImage, EncodedTexture, Parameters},
};


pub fn main() -> ExitCode {
	let args: Args = Args::parse();
	init_logging(args.verbose);

	match run(args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(error) => {
			tracing::error!("{}", error);
			ExitCode::FAILURE
		},
	}
}


fn init_logging(verbose: bool) {
	let default_level: &str = if verbose { "debug" } else { "info" };
	let filter: EnvFilter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}


fn run(args: Args) -> Result<()> {
	let parameters: Parameters = param_validator::validate(args)?;

	tracing::info!("Working...");
	let instant = Instant::now();

	let image: DecodedImage = image_get::get_image(&parameters.source_path)?;
	tracing::debug!(
		width = image.width,
		height = image.height,
		stride = image.stride,
		mode = image.mode.name(),
		"Loaded source image"
	);

	// Encode fully before any output file is opened
	let texture: EncodedTexture = texture_encode::encode(&image, parameters.format)?;
	let target_path: PathBuf = texture_make::make_texture(&parameters, &texture)?;

	tracing::info!(
		format = %parameters.format,
		bytes = texture.bytes.len(),
		output = %target_path.display(),
		"Converted 1 texture in {}ms.",
		instant.elapsed().as_millis()
	);

	return Ok(());
}
