
use std::path::PathBuf;

use anyhow::{Context, Result};
use gumdrop::Options;

use crate::{pose, star};


#[derive(Options)]
pub struct Args {

	/// The STAR file to read
	#[options(free, required)]
	star: PathBuf
}


/// Prints rot, tilt, psi, tx, ty, then the rotation matrix (row-major) of every particle
pub fn run(args: Args) -> Result<()> {

	let table = star::read_path(&args.star)
		.context(format!("Failed to read STAR file: {}", args.star.to_string_lossy()))?;

	let poses = pose::extract(&table)
		.context("Failed to read particle poses")?;

	for p in poses {
		let r = p.rotation;
		let values = p.euler.iter()
			.chain(p.translation.iter())
			.copied()
			.chain((0 .. 3).flat_map(|i| (0 .. 3).map(move |j| r[(i, j)])))
			.map(|v| v.to_string())
			.collect::<Vec<_>>();
		println!("{}", values.join("\t"));
	}

	Ok(())
}
