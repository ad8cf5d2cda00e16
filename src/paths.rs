
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};


/// Finds the files named by the metadata, optionally relocated under another folder.
///
/// With a data folder, first tries `dir/filename` for every path, then `dir/path` for every path.
/// Without one, the paths must exist as written.
pub fn resolve(paths: &[impl AsRef<Path>], datadir: Option<&Path>) -> Result<Vec<PathBuf>> {

	let Some(datadir) = datadir
		else {
			let paths = paths.iter()
				.map(|p| p.as_ref().to_path_buf())
				.collect::<Vec<_>>();
			check_exist(&paths)?;
			return Ok(paths);
		};

	// try the file names in the data folder first
	let by_name = paths.iter()
		.map(|p| {
			let p = p.as_ref();
			match p.file_name() {
				Some(name) => datadir.join(name),
				None => datadir.join(p)
			}
		})
		.collect::<Vec<_>>();
	if check_exist(&by_name).is_ok() {
		debug!("resolved {} paths by file name in {}", paths.len(), datadir.to_string_lossy());
		return Ok(by_name);
	}

	// then try the whole relative path
	let by_path = paths.iter()
		.map(|p| datadir.join(p.as_ref()))
		.collect::<Vec<_>>();
	check_exist(&by_path)?;
	debug!("resolved {} paths relative to {}", paths.len(), datadir.to_string_lossy());
	Ok(by_path)
}


fn check_exist(paths: &[PathBuf]) -> Result<()> {
	let mut checked = HashSet::<&Path>::new();
	for path in paths {
		if checked.insert(path.as_path()) && !path.is_file() {
			return Err(Error::PathResolution(path.clone()));
		}
	}
	Ok(())
}
