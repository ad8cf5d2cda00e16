
// MRC file (from the Medical Research Council, in the UK)
// https://en.wikipedia.org/wiki/MRC_(file_format)

// format specification:
// https://www.ccpem.ac.uk/mrc_format/mrc2014.php

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use ndarray::{Array2, Array3};

use crate::error::{Error, Result};


/// The header is 256 (4-byte) words, or 1024 bytes total
pub const HEADER_SIZE: u64 = 1024;

/// 32-bit float voxels, the only kind particle stacks use
pub const MODE_F32: u32 = 2;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MrcHeader {
	pub nx: u32,
	pub ny: u32,
	pub nz: u32,
	pub mode: u32,
	/// size of the extended header, in bytes
	pub nsymbt: u32
}

impl MrcHeader {

	/// where the voxels start
	pub fn data_offset(&self) -> u64 {
		HEADER_SIZE + self.nsymbt as u64
	}
}


/// bytes per square float image of side length d
pub fn image_stride(d: usize) -> u64 {
	(std::mem::size_of::<f32>()*d*d) as u64
}


pub fn read_header(path: impl AsRef<Path>) -> Result<MrcHeader> {
	let path = path.as_ref();
	let mut reader = BufReader::new(File::open(path)?);
	read_header_from(&mut reader)
		.map_err(|e| match e {
			Error::InvalidMrc(msg) => Error::InvalidMrc(format!("{}: {}", path.to_string_lossy(), msg)),
			e => e
		})
}


pub fn read_header_from(reader: &mut impl Read) -> Result<MrcHeader> {

	let mut header = [0u8; HEADER_SIZE as usize];
	reader.read_exact(&mut header)
		.map_err(|e| Error::InvalidMrc(format!("file too small for the header: {}", e)))?;

	// the machine stamp (word 54) says which byte order the rest of the header uses
	let big_endian = header[212] == 0x11;

	let word = |i: usize| -> u32 {
		let b = [header[i*4], header[i*4 + 1], header[i*4 + 2], header[i*4 + 3]];
		if big_endian {
			u32::from_be_bytes(b)
		} else {
			u32::from_le_bytes(b)
		}
	};

	let mrc = MrcHeader {
		nx: word(0),
		ny: word(1),
		nz: word(2),
		mode: word(3),
		nsymbt: word(23)
	};

	if big_endian {
		return Err(Error::InvalidMrc("big-endian data is not supported".to_string()));
	}
	if mrc.nx == 0 || mrc.ny == 0 {
		return Err(Error::InvalidMrc(format!("empty image dimensions: {}x{}", mrc.nx, mrc.ny)));
	}

	Ok(mrc)
}


/// A single 2D float image inside an MRC stack, read only when asked for
#[derive(Debug, Clone, PartialEq)]
pub struct LazyImage {
	pub path: PathBuf,
	/// rows, columns
	pub shape: (usize,usize),
	pub offset: u64
}

impl LazyImage {

	pub fn new(path: impl Into<PathBuf>, shape: (usize,usize), offset: u64) -> Self {
		Self {
			path: path.into(),
			shape,
			offset
		}
	}

	pub fn get(&self) -> Result<Array2<f32>> {

		let mut file = File::open(&self.path)?;
		file.seek(SeekFrom::Start(self.offset))?;
		let mut reader = BufReader::new(file);

		let (rows, cols) = self.shape;
		let mut voxels = vec![0f32; rows*cols];
		reader.read_f32_into::<LE>(&mut voxels)
			.map_err(|e| Error::InvalidMrc(format!(
				"{}: can't read {}x{} image at byte {}: {}",
				self.path.to_string_lossy(), rows, cols, self.offset, e
			)))?;

		Array2::from_shape_vec(self.shape, voxels)
			.map_err(|e| Error::InvalidMrc(e.to_string()))
	}
}


/// Writes a stack of float images, shape (images, rows, columns), as a little-endian MRC file
pub fn write_stack(path: impl AsRef<Path>, images: &Array3<f32>) -> Result<()> {

	let path = path.as_ref();
	let (nz, ny, nx) = images.dim();
	let dim = |n: usize| -> Result<u32> {
		u32::try_from(n)
			.map_err(|_| Error::InvalidMrc(format!("dimension too large: {}", n)))
	};

	let file = File::create(path)?;
	let mut writer = BufWriter::new(file);

	// write the dimensions (words 1-3)
	writer.write_u32::<LE>(dim(nx)?)?;
	writer.write_u32::<LE>(dim(ny)?)?;
	writer.write_u32::<LE>(dim(nz)?)?;

	// use mode 2: 32 bit float
	writer.write_u32::<LE>(MODE_F32)?;

	// we're at word 5 now: skip to word 8
	writer.write_all(&[0u8; 4*(8 - 5)])?;

	// sampling along each axis (words 8-10), one image per section
	writer.write_u32::<LE>(dim(nx)?)?;
	writer.write_u32::<LE>(dim(ny)?)?;
	writer.write_u32::<LE>(dim(nz)?)?;

	// cell dimensions (words 11-13) match the sampling, for 1 A/pix, then the cell angles (words 14-16)
	writer.write_f32::<LE>(nx as f32)?;
	writer.write_f32::<LE>(ny as f32)?;
	writer.write_f32::<LE>(nz as f32)?;
	for _ in 0 .. 3 {
		writer.write_f32::<LE>(90.0)?;
	}

	// axis mapping (words 17-19): columns, rows, sections = x, y, z
	writer.write_u32::<LE>(1)?;
	writer.write_u32::<LE>(2)?;
	writer.write_u32::<LE>(3)?;

	// min, max, mean density (words 20-22)
	let (min, max, sum) = images.iter()
		.fold((f32::INFINITY, f32::NEG_INFINITY, 0f64), |(min, max, sum), &v| {
			(min.min(v), max.max(v), sum + v as f64)
		});
	let mean =
		if images.is_empty() {
			0.0
		} else {
			(sum/(images.len() as f64)) as f32
		};
	if images.is_empty() {
		writer.write_all(&[0u8; 4*2])?;
	} else {
		writer.write_f32::<LE>(min)?;
		writer.write_f32::<LE>(max)?;
	}
	writer.write_f32::<LE>(mean)?;

	// we're at word 23 now: space group 0 means a stack of images
	writer.write_u32::<LE>(0)?;

	// we're not using any extra header space, so zero out nsymbt
	writer.write_u32::<LE>(0)?;

	// we're at word 25 now: skip to word 53
	writer.write_all(&[0u8; 4*(53 - 25)])?;

	// the MAP tag, then the machine stamp: signal little-endianess (note 11)
	writer.write_all(b"MAP ")?;
	writer.write_all(&[0x44, 0x44, 0x00, 0x00])?;

	// we're at word 55 now: skip to the end of the header (word 257)
	writer.write_all(&[0u8; 4*(257 - 55)])?;

	// write the voxels: z(y(x)) order
	for &v in images.iter() {
		writer.write_f32::<LE>(v)?;
	}

	// write buffers should be flushed before dropping
	writer.flush()?;

	Ok(())
}
