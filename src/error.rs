
use std::path::PathBuf;


/// Everything that can go wrong while reading particle metadata or deriving parameters from it.
#[derive(Debug, thiserror::Error)]
pub enum Error {

	#[error("malformed STAR file at line {line}: {reason}")]
	MalformedFormat {
		line: usize,
		reason: String
	},

	/// a table built or rearranged in memory that couldn't be written as STAR
	#[error("invalid table: {0}")]
	InvalidTable(String),

	#[error("missing required column: {0}")]
	MissingField(String),

	#[error("file not found: {}", .0.to_string_lossy())]
	PathResolution(PathBuf),

	#[error("numeric validation failed: {0}")]
	NumericValidation(String),

	#[error("column {column}, row {row}: not a number: {value:?}")]
	InvalidNumber {
		column: String,
		row: usize,
		value: String
	},

	#[error("row {row} out of range, table has {len} rows")]
	RowOutOfRange {
		row: usize,
		len: usize
	},

	#[error("invalid MRC file: {0}")]
	InvalidMrc(String),

	#[error("invalid cs file: {0}")]
	InvalidCs(String),

	#[error(transparent)]
	Io(#[from] std::io::Error)
}

impl Error {

	pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
		Self::MalformedFormat {
			line,
			reason: reason.into()
		}
	}
}


pub type Result<T> = std::result::Result<T,Error>;
