
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use gumdrop::Options;
use ndarray::Axis;
use tracing::info;

use crate::config::Config;
use crate::{ctf, mrc, star};


#[derive(Options)]
pub struct Args {

	/// The STAR file to read
	#[options(free, required)]
	star: PathBuf,

	/// Image side length, in pixels
	#[options(required, no_short)]
	size: u32,

	/// The MRC file to write
	#[options(required, no_short)]
	out: PathBuf,

	/// Which particle, counting from 0
	#[options(no_short, default = "0")]
	particle: usize,

	/// Pixel size, in Angstroms, instead of the one in the file
	#[options(no_short)]
	apix: Option<f64>,

	/// B-factor for the envelope, in Angstroms^2
	#[options(no_short)]
	bfactor: Option<f64>
}


/// Writes the 2D CTF of one particle as a single-image MRC file
pub fn run(config: &Config, args: Args) -> Result<()> {

	let table = star::read_path(&args.star)
		.context(format!("Failed to read STAR file: {}", args.star.to_string_lossy()))?;

	let params = ctf::extract(&table, args.size, args.apix.or(config.ctf.pixel_size))
		.context("Failed to read CTF parameters")?;
	let Some(params) = params.get(args.particle)
		else { bail!("No particle {}, the file has {} particles", args.particle, params.len()); };

	let map = ctf::map(params, args.bfactor.or(config.ctf.bfactor))
		.mapv(|v| v as f32)
		.insert_axis(Axis(0));
	mrc::write_stack(&args.out, &map)
		.context(format!("Failed to write MRC file: {}", args.out.to_string_lossy()))?;
	info!("wrote CTF of particle {} to {}", args.particle, args.out.to_string_lossy());

	Ok(())
}
