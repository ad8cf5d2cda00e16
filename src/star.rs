
// STAR files (Self-defining Text Archiving and Retrieval), as written by RELION
// only the single data block, single loop subset is supported here

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::{Error, Result};


const BLOCK_MARKER: &str = "data_";
const LOOP_MARKER: &str = "loop_";
const FIELD_MARKER: &str = "_";
const COMMENT_MARKER: &str = "#";


/// A single STAR loop: ordered column names and row-major string values
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTable {
	columns: Vec<String>,
	rows: Vec<Vec<String>>
}

impl MetadataTable {

	/// Builds a table, checking it can be written out and read back unchanged:
	/// column names are unique `_name` tokens, rows match the columns,
	/// and values are non-empty tokens that can't be mistaken for STAR syntax at the start of a line.
	pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {

		let mut seen = HashSet::<&str>::new();
		for column in &columns {
			if !column.starts_with(FIELD_MARKER) || column.len() == FIELD_MARKER.len() || has_whitespace(column) {
				return Err(Error::InvalidTable(format!("bad column name: {:?}", column)));
			}
			if !seen.insert(column.as_str()) {
				return Err(Error::InvalidTable(format!("duplicate column: {}", column)));
			}
		}

		for (rowi, row) in rows.iter().enumerate() {
			if row.len() != columns.len() {
				return Err(Error::InvalidTable(format!(
					"row {} has {} values, but there are {} columns",
					rowi, row.len(), columns.len()
				)));
			}
			for value in row {
				if value.is_empty() || has_whitespace(value) {
					return Err(Error::InvalidTable(format!("row {}: values must be single tokens, not {:?}", rowi, value)));
				}
			}
			// only the start of a line is significant to the parser
			if let Some(first) = row.first() {
				if [FIELD_MARKER, COMMENT_MARKER, BLOCK_MARKER].iter().any(|m| first.starts_with(m)) {
					return Err(Error::InvalidTable(format!("row {}: a row can't start with {:?}", rowi, first)));
				}
			}
		}

		Ok(Self {
			columns,
			rows
		})
	}

	pub fn columns(&self) -> &[String] {
		&self.columns
	}

	pub fn rows(&self) -> &[Vec<String>] {
		&self.rows
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn has_column(&self, name: impl AsRef<str>) -> bool {
		let name = name.as_ref();
		self.columns.iter()
			.any(|c| c == name)
	}

	pub fn column_index(&self, name: impl AsRef<str>) -> Result<usize> {
		let name = name.as_ref();
		self.columns.iter()
			.position(|c| c == name)
			.ok_or_else(|| Error::MissingField(name.to_string()))
	}

	/// Permutes the columns (and every row along with them) into the given order.
	/// The order must name every current column exactly once.
	pub fn reorder(&mut self, order: &[impl AsRef<str>]) -> Result<()> {

		let indices = order.iter()
			.map(|name| self.column_index(name))
			.collect::<Result<Vec<_>>>()?;

		let distinct = indices.iter()
			.collect::<HashSet<_>>()
			.len();
		if indices.len() != self.columns.len() || distinct != indices.len() {
			return Err(Error::InvalidTable(format!(
				"column order must be a permutation of the {} existing columns",
				self.columns.len()
			)));
		}

		self.columns = indices.iter()
			.map(|&i| self.columns[i].clone())
			.collect();
		for row in &mut self.rows {
			*row = indices.iter()
				.map(|&i| std::mem::take(&mut row[i]))
				.collect();
		}

		Ok(())
	}
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	SeekingBlock,
	SeekingLoop,
	CollectingFields,
	CollectingRows,
	Done
}


struct Parser {
	state: State,
	columns: Vec<String>,
	rows: Vec<Vec<String>>
}

impl Parser {

	fn new() -> Self {
		Self {
			state: State::SeekingBlock,
			columns: Vec::new(),
			rows: Vec::new()
		}
	}

	fn line(&mut self, linei: usize, line: &str) -> Result<()> {
		match self.state {

			State::SeekingBlock => {
				if line.starts_with(BLOCK_MARKER) {
					debug!("found data block at line {}", linei);
					self.state = State::SeekingLoop;
				}
			}

			State::SeekingLoop => {
				if line.starts_with(LOOP_MARKER) {
					self.state = State::CollectingFields;
				}
			}

			State::CollectingFields => {
				if line.starts_with(FIELD_MARKER) {
					// the name is the first token, anything after it (usually #n) is just annotation
					let Some(name) = line.split_whitespace().next()
						else { return Err(Error::malformed(linei, "empty field declaration")); };
					if name == FIELD_MARKER {
						return Err(Error::malformed(linei, "field declaration with no name"));
					}
					if self.columns.iter().any(|c| c == name) {
						return Err(Error::malformed(linei, format!("duplicate column: {}", name)));
					}
					self.columns.push(name.to_string());
				} else if self.columns.is_empty() {
					let trimmed = line.trim();
					if !trimmed.is_empty() && !trimmed.starts_with(COMMENT_MARKER) {
						return Err(Error::malformed(linei, "no field declarations after loop_"));
					}
				} else {
					debug!("read {} columns", self.columns.len());
					self.state = State::CollectingRows;
					self.row(linei, line)?;
				}
			}

			State::CollectingRows => self.row(linei, line)?,

			State::Done => ()
		}

		Ok(())
	}

	fn row(&mut self, linei: usize, line: &str) -> Result<()> {

		let line = line.trim_start();
		if line.is_empty() || line.starts_with(COMMENT_MARKER) {
			return Ok(());
		}

		if line.starts_with(FIELD_MARKER) {
			return Err(Error::malformed(linei, "field declaration after the data rows started"));
		}

		if line.starts_with(BLOCK_MARKER) {
			warn!("ignoring additional data block at line {}: only the first block is read", linei);
			self.state = State::Done;
			return Ok(());
		}

		let row = line.split_whitespace()
			.map(str::to_string)
			.collect::<Vec<_>>();
		if row.len() != self.columns.len() {
			return Err(Error::malformed(linei, format!(
				"expected {} values, found {}",
				self.columns.len(), row.len()
			)));
		}
		self.rows.push(row);

		Ok(())
	}

	fn finish(self, num_lines: usize) -> Result<MetadataTable> {
		match self.state {
			State::SeekingBlock => Err(Error::malformed(num_lines, "no data_ block found")),
			State::SeekingLoop => Err(Error::malformed(num_lines, "no loop_ found after data_ block")),
			State::CollectingFields if self.columns.is_empty() =>
				Err(Error::malformed(num_lines, "no field declarations after loop_")),
			_ => {
				debug!("read {} rows", self.rows.len());
				MetadataTable::new(self.columns, self.rows)
			}
		}
	}
}


/// Reads a STAR table from any text source.
pub fn load(reader: impl BufRead) -> Result<MetadataTable> {
	let mut parser = Parser::new();
	let mut num_lines = 0;
	for (i, line) in reader.lines().enumerate() {
		let line = line?;
		num_lines = i + 1;
		parser.line(num_lines, &line)?;
		if parser.state == State::Done {
			break;
		}
	}
	parser.finish(num_lines)
}


pub fn load_str(text: impl AsRef<str>) -> Result<MetadataTable> {
	load(text.as_ref().as_bytes())
}


/// Reads a STAR file, gunzipping it first if the name ends in `.gz`
pub fn read_path(path: impl AsRef<Path>) -> Result<MetadataTable> {
	let path = path.as_ref();
	let file = File::open(path)?;
	let reader: Box<dyn Read> =
		if is_gzip(path) {
			Box::new(GzDecoder::new(file))
		} else {
			Box::new(file)
		};
	load(BufReader::new(reader))
}


/// Writes the table as a single-block STAR file, using the table's current column order.
pub fn write(table: &MetadataTable, mut writer: impl Write) -> Result<()> {

	writeln!(writer, "# Created {}", timestamp())?;
	writeln!(writer)?;
	writeln!(writer, "{}", BLOCK_MARKER)?;
	writeln!(writer)?;
	writeln!(writer, "{}", LOOP_MARKER)?;

	for (i, column) in table.columns().iter().enumerate() {
		writeln!(writer, "{} #{}", column, i + 1)?;
	}

	for row in table.rows() {
		writeln!(writer, "{}", row.join(" "))?;
	}

	writer.flush()?;

	Ok(())
}


pub fn write_string(table: &MetadataTable) -> Result<String> {
	let mut buf = Vec::<u8>::new();
	write(table, &mut buf)?;
	String::from_utf8(buf)
		.map_err(|e| Error::InvalidTable(format!("STAR output was not UTF-8: {}", e)))
}


/// Writes a STAR file, gzipping it if the name ends in `.gz`
pub fn write_path(table: &MetadataTable, path: impl AsRef<Path>) -> Result<()> {
	let path = path.as_ref();
	let file = File::create(path)?;
	if is_gzip(path) {
		let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
		write(table, &mut encoder)?;
		encoder.finish()?
			.flush()?;
	} else {
		write(table, BufWriter::new(file))?;
	}
	Ok(())
}


fn has_whitespace(s: &str) -> bool {
	s.chars()
		.any(char::is_whitespace)
}


fn is_gzip(path: &Path) -> bool {
	path.extension()
		.map(|ext| ext == "gz")
		.unwrap_or(false)
}


fn timestamp() -> String {
	let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
	let now = OffsetDateTime::now_local()
		.unwrap_or_else(|_| OffsetDateTime::now_utc());
	now.format(format)
		.unwrap_or_else(|_| now.to_string())
}
