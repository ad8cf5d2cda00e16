
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use gumdrop::Options;

use crate::mrc::{self, LazyImage};
use crate::noise;


#[derive(Options)]
pub struct Args {

	/// An MRC stack of particle images
	#[options(free, required)]
	stack: PathBuf
}


/// Prints the background noise variance of an image stack
pub fn run(args: Args) -> Result<()> {

	let path = &args.stack;
	let header = mrc::read_header(path)
		.context(format!("Failed to read MRC header: {}", path.to_string_lossy()))?;

	if header.mode != mrc::MODE_F32 || header.nx != header.ny {
		bail!("Expected a stack of square 32-bit float images, not mode {} {}x{}", header.mode, header.nx, header.ny);
	}

	// read all the images in the stack
	let d = header.nx as usize;
	let images = (0 .. header.nz as u64)
		.map(|i| {
			LazyImage::new(path, (d, d), header.data_offset() + i*mrc::image_stride(d))
				.get()
		})
		.collect::<crate::Result<Vec<_>>>()
		.context(format!("Failed to read images: {}", path.to_string_lossy()))?;
	let views = images.iter()
		.map(|img| img.view())
		.collect::<Vec<_>>();
	let stack = ndarray::stack(ndarray::Axis(0), &views)
		.context("Failed to stack images")?;

	let variance = noise::estimate(stack.view())
		.context("Failed to estimate noise")?;
	println!("{}", variance);

	Ok(())
}
