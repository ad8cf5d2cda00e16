
use std::path::{Path, PathBuf};

use ndarray::{Array3, Axis};
use tracing::{debug, info};

use crate::cs;
use crate::error::{Error, Result};
use crate::mrc::{self, LazyImage, MrcHeader};
use crate::paths;
use crate::star::MetadataTable;


pub const COL_IMAGE_NAME: &str = "_rlnImageName";


/// One particle image: the stack it's in, and where
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRef {
	pub path: PathBuf,
	/// 0-based
	pub index: u64
}


#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSet {
	pub refs: Vec<ParticleRef>,
	/// image side length, in pixels
	pub side_length: usize,
	/// where the images start in each stack, past the MRC headers
	pub data_offset: u64
}

impl ParticleSet {

	pub fn len(&self) -> usize {
		self.refs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.refs.is_empty()
	}

	pub fn lazy_images(&self) -> Vec<LazyImage> {
		let d = self.side_length;
		self.refs.iter()
			.map(|r| LazyImage::new(&r.path, (d, d), self.data_offset + r.index*mrc::image_stride(d)))
			.collect()
	}

	/// Reads every image into one (particles, rows, columns) array
	pub fn load(&self) -> Result<Array3<f32>> {
		let d = self.side_length;
		let mut stack = Array3::<f32>::zeros((self.len(), d, d));
		for (i, image) in self.lazy_images().iter().enumerate() {
			stack.index_axis_mut(Axis(0), i)
				.assign(&image.get()?);
		}
		info!("loaded {} particle images of {}x{}", self.len(), d, d);
		Ok(stack)
	}
}


/// Parses a RELION image name, eg `000012@Extract/job007/mic1.mrcs`, into a 0-based index and a path
pub fn parse_image_name(name: &str) -> Result<(u64,&str)> {

	let invalid = || Error::InvalidNumber {
		column: COL_IMAGE_NAME.to_string(),
		row: 0,
		value: name.to_string()
	};

	let Some((index, path)) = name.split_once('@')
		else { return Err(invalid()); };

	// image names count from 1
	let index = index.parse::<u64>()
		.map_err(|_| invalid())?
		.checked_sub(1)
		.ok_or_else(invalid)?;

	Ok((index, path))
}


/// Finds the particle images of a STAR file, using the `_rlnImageName` column.
///
/// The image side length comes from the header of the first stack.
pub fn from_star(table: &MetadataTable, datadir: Option<&Path>) -> Result<ParticleSet> {

	let names = table.strings(COL_IMAGE_NAME)?;
	let mut indices = Vec::with_capacity(names.len());
	let mut stacks = Vec::with_capacity(names.len());
	for (row, name) in names.into_iter().enumerate() {
		let (index, path) = parse_image_name(name)
			.map_err(|e| match e {
				Error::InvalidNumber { column, value, .. } => Error::InvalidNumber { column, row, value },
				e => e
			})?;
		indices.push(index);
		stacks.push(path);
	}

	let stacks = paths::resolve(&stacks, datadir)?;

	let header = first_header(&stacks)?;
	let side_length = header
		.map(|h| h.nx as usize)
		.unwrap_or(0);

	Ok(assemble(stacks, indices, side_length, header))
}


/// Finds the particle images of a cryoSPARC .cs file
pub fn from_cs(path: impl AsRef<Path>, datadir: Option<&Path>) -> Result<ParticleSet> {

	let blobs = cs::read_path(path)?;
	let stacks = paths::resolve(&blobs.paths, datadir)?;

	let header = first_header(&stacks)?;
	if let Some(header) = &header {
		if header.nx as usize != blobs.side_length {
			return Err(Error::InvalidMrc(format!(
				"cs file says images are {} pixels on a side, but the stacks hold {}x{} images",
				blobs.side_length, header.nx, header.ny
			)));
		}
	}

	Ok(assemble(stacks, blobs.indices, blobs.side_length, header))
}


/// all the stacks are assumed to share the layout of the first one
fn first_header(stacks: &[PathBuf]) -> Result<Option<MrcHeader>> {
	let Some(path) = stacks.first()
		else { return Ok(None); };
	let header = mrc::read_header(path)?;
	check_stack(path, &header)?;
	Ok(Some(header))
}


fn assemble(stacks: Vec<PathBuf>, indices: Vec<u64>, side_length: usize, header: Option<MrcHeader>) -> ParticleSet {
	let refs = stacks.into_iter()
		.zip(indices)
		.map(|(path, index)| ParticleRef {
			path,
			index
		})
		.collect::<Vec<_>>();
	debug!("found {} particles, {} pixels on a side", refs.len(), side_length);
	ParticleSet {
		refs,
		side_length,
		data_offset: header
			.map(|h| h.data_offset())
			.unwrap_or(mrc::HEADER_SIZE)
	}
}


fn check_stack(path: &Path, header: &MrcHeader) -> Result<()> {
	if header.mode != mrc::MODE_F32 {
		return Err(Error::InvalidMrc(format!(
			"{}: particle stacks must hold 32-bit floats (mode {}), not mode {}",
			path.to_string_lossy(), mrc::MODE_F32, header.mode
		)));
	}
	if header.nx != header.ny {
		return Err(Error::InvalidMrc(format!(
			"{}: particle images must be square, not {}x{}",
			path.to_string_lossy(), header.nx, header.ny
		)));
	}
	Ok(())
}
