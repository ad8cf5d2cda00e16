
use std::path::PathBuf;

use anyhow::{Context, Result};
use gumdrop::Options;

use crate::config::Config;
use crate::{particles, star};


#[derive(Options)]
pub struct Args {

	/// A STAR file with an _rlnImageName column, or a cryoSPARC .cs file
	#[options(free, required)]
	metadata: PathBuf,

	/// Folder holding the particle stacks, instead of the paths in the metadata
	#[options(no_short)]
	datadir: Option<PathBuf>
}


/// Prints the 0-based index and stack path of every particle image
pub fn run(config: &Config, args: Args) -> Result<()> {

	let datadir = args.datadir.as_ref()
		.or(config.particles.datadir.as_ref());

	let is_cs = args.metadata.extension()
		.map(|ext| ext == "cs")
		.unwrap_or(false);
	let result =
		if is_cs {
			particles::from_cs(&args.metadata, datadir.map(PathBuf::as_path))
		} else {
			let table = star::read_path(&args.metadata)
				.context(format!("Failed to read STAR file: {}", args.metadata.to_string_lossy()))?;
			particles::from_star(&table, datadir.map(PathBuf::as_path))
		};
	let set = result
		.context(format!("Failed to find particles of: {}", args.metadata.to_string_lossy()))?;

	println!("# {} particles, {}x{} pixels", set.len(), set.side_length, set.side_length);
	for r in &set.refs {
		println!("{}\t{}", r.index, r.path.to_string_lossy());
	}

	Ok(())
}
