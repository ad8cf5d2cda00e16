
use std::path::PathBuf;

use anyhow::{Context, Result};
use gumdrop::Options;
use tracing::info;

use crate::star;


#[derive(Options)]
pub struct Args {

	/// The STAR file to read
	#[options(free, required)]
	input: PathBuf,

	/// The STAR file to write, gzipped if it ends in .gz
	#[options(free, required)]
	output: PathBuf,

	/// New column order, comma-separated. Must name every column
	#[options(no_short)]
	order: Option<String>
}


pub fn run(args: Args) -> Result<()> {

	let mut table = star::read_path(&args.input)
		.context(format!("Failed to read STAR file: {}", args.input.to_string_lossy()))?;

	if let Some(order) = &args.order {
		let order = order.split(',')
			.map(str::trim)
			.filter(|c| !c.is_empty())
			.collect::<Vec<_>>();
		table.reorder(&order)
			.context("Failed to reorder columns")?;
	}

	star::write_path(&table, &args.output)
		.context(format!("Failed to write STAR file: {}", args.output.to_string_lossy()))?;
	info!("wrote {} rows of {} columns to {}", table.len(), table.columns().len(), args.output.to_string_lossy());

	Ok(())
}
