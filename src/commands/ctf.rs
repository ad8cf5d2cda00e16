
use std::path::PathBuf;

use anyhow::{Context, Result};
use gumdrop::Options;

use crate::config::Config;
use crate::{ctf, star};


#[derive(Options)]
pub struct Args {

	/// The STAR file to read
	#[options(free, required)]
	star: PathBuf,

	/// Image side length, in pixels
	#[options(required, no_short)]
	size: u32,

	/// Pixel size, in Angstroms, instead of the one in the file
	#[options(no_short)]
	apix: Option<f64>
}


/// Prints the CTF parameters of every particle, one tab-separated line each
pub fn run(config: &Config, args: Args) -> Result<()> {

	let table = star::read_path(&args.star)
		.context(format!("Failed to read STAR file: {}", args.star.to_string_lossy()))?;

	let params = ctf::extract(&table, args.size, args.apix.or(config.ctf.pixel_size))
		.context("Failed to read CTF parameters")?;

	for p in params {
		let line = p.to_array()
			.iter()
			.map(f64::to_string)
			.collect::<Vec<_>>()
			.join("\t");
		println!("{}", line);
	}

	Ok(())
}
