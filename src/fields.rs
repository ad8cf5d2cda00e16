
// typed access to the string-valued STAR columns

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::star::MetadataTable;


impl MetadataTable {

	/// Checks that every named column exists, failing on the first one that doesn't.
	pub fn require_columns(&self, names: &[&str]) -> Result<()> {
		for name in names {
			self.column_index(name)?;
		}
		Ok(())
	}

	/// Returns every value of the column, as strings.
	pub fn strings(&self, column: impl AsRef<str>) -> Result<Vec<&str>> {
		let i = self.column_index(column)?;
		Ok(self.rows().iter()
			.map(|row| row[i].as_str())
			.collect())
	}

	pub fn get_str(&self, row: usize, column: impl AsRef<str>) -> Result<&str> {
		let i = self.column_index(column)?;
		let Some(row) = self.rows().get(row)
			else { return Err(Error::RowOutOfRange { row, len: self.len() }); };
		Ok(row[i].as_str())
	}

	pub fn get_f64(&self, row: usize, column: impl AsRef<str>) -> Result<f64> {
		let column = column.as_ref();
		let value = self.get_str(row, column)?;
		parse_value(column, row, value)
	}

	/// Parses every value of the column as a float.
	pub fn floats(&self, column: impl AsRef<str>) -> Result<Vec<f64>> {
		self.parsed(column)
	}

	/// Parses every value of the column, reporting the first value that won't parse.
	pub fn parsed<T>(&self, column: impl AsRef<str>) -> Result<Vec<T>>
		where
			T: FromStr
	{
		let column = column.as_ref();
		self.strings(column)?
			.into_iter()
			.enumerate()
			.map(|(row, value)| parse_value(column, row, value))
			.collect()
	}
}


fn parse_value<T>(column: &str, row: usize, value: &str) -> Result<T>
	where
		T: FromStr
{
	value.parse::<T>()
		.map_err(|_| Error::InvalidNumber {
			column: column.to_string(),
			row,
			value: value.to_string()
		})
}
