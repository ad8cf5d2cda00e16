
use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::TempDir;
use ndarray::Array3;

use star_ctf::mrc;


/// A temporary folder to hold metadata files and particle stacks
pub struct WorkDir {
	dir: TempDir
}

impl WorkDir {

	pub fn new() -> WorkDir {
		Self {
			dir: TempDir::new()
				.expect("Failed to make temp folder")
		}
	}

	pub fn path(&self, path: impl AsRef<Path>) -> PathBuf {
		self.dir.path().join(path.as_ref())
	}

	pub fn write(&self, path: impl AsRef<Path>, txt: impl AsRef<str>) -> PathBuf {
		let path = self.path(path);
		self.mkdirs(&path);
		fs::write(&path, txt.as_ref())
			.expect(&format!("Failed to write file: {}", path.to_string_lossy()));
		path
	}

	pub fn write_bytes(&self, path: impl AsRef<Path>, bytes: &[u8]) -> PathBuf {
		let path = self.path(path);
		self.mkdirs(&path);
		fs::write(&path, bytes)
			.expect(&format!("Failed to write file: {}", path.to_string_lossy()));
		path
	}

	/// Writes a stack of `n` images of size `d`, where every pixel of image `i` is `i`
	pub fn write_stack(&self, path: impl AsRef<Path>, n: usize, d: usize) -> PathBuf {
		let path = self.path(path);
		self.mkdirs(&path);
		let images = Array3::from_shape_fn((n, d, d), |(i, _, _)| i as f32);
		mrc::write_stack(&path, &images)
			.expect(&format!("Failed to write stack: {}", path.to_string_lossy()));
		path
	}

	pub fn read(&self, path: impl AsRef<Path>) -> String {
		let path = self.path(path);
		fs::read_to_string(&path)
			.expect(&format!("Failed to read file: {}", path.to_string_lossy()))
	}

	fn mkdirs(&self, path: &Path) {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.expect(&format!("Failed to make folder: {}", parent.to_string_lossy()));
		}
	}
}

impl AsRef<Path> for WorkDir {
	fn as_ref(&self) -> &Path {
		self.dir.path()
	}
}
