
// cryoSPARC .cs particle metadata
// these are NumPy .npy files holding a 1D array of structured records:
// https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html
// only the blob/path, blob/idx and blob/shape fields are read, everything else is skipped over

use std::fs;
use std::path::Path;

use byteorder::{ByteOrder, BE, LE};
use tracing::debug;

use crate::error::{Error, Result};


const MAGIC: &[u8] = b"\x93NUMPY";

pub const FIELD_PATH: &str = "blob/path";
pub const FIELD_IDX: &str = "blob/idx";
pub const FIELD_SHAPE: &str = "blob/shape";


/// The blob fields of every particle in a .cs file
#[derive(Debug, Clone, PartialEq)]
pub struct CsBlobs {
	pub paths: Vec<String>,
	/// 0-based index of each particle image in its stack
	pub indices: Vec<u64>,
	/// image side length, in pixels, from the first record
	pub side_length: usize
}


pub fn read_path(path: impl AsRef<Path>) -> Result<CsBlobs> {
	let path = path.as_ref();
	let bytes = fs::read(path)?;
	read(&bytes)
		.map_err(|e| match e {
			Error::InvalidCs(msg) => Error::InvalidCs(format!("{}: {}", path.to_string_lossy(), msg)),
			e => e
		})
}


pub fn read(bytes: &[u8]) -> Result<CsBlobs> {

	let (header, data) = split_header(bytes)?;
	let array = ArrayHeader::parse(header)?;
	debug!("cs file has {} records of {} bytes", array.num_records, array.record_size);

	let path_field = array.field(FIELD_PATH)?;
	let idx_field = array.field(FIELD_IDX)?;
	let shape_field = array.field(FIELD_SHAPE)?;

	let expected = array.num_records.checked_mul(array.record_size)
		.ok_or_else(|| Error::InvalidCs(format!("{} records of {} bytes is too large", array.num_records, array.record_size)))?;
	if data.len() < expected {
		return Err(Error::InvalidCs(format!("expected {} bytes of records, found {}", expected, data.len())));
	}

	let records = data[.. expected]
		.chunks_exact(array.record_size.max(1))
		.take(array.num_records)
		.collect::<Vec<_>>();

	let paths = records.iter()
		.map(|record| path_field.read_bytes_str(record))
		.collect::<Result<Vec<_>>>()?;
	let indices = records.iter()
		.map(|record| idx_field.read_uint(record, 0))
		.collect::<Result<Vec<_>>>()?;
	let side_length = match records.first() {
		Some(record) => shape_field.read_uint(record, 0)? as usize,
		None => 0
	};

	Ok(CsBlobs {
		paths,
		indices,
		side_length
	})
}


fn split_header(bytes: &[u8]) -> Result<(&str,&[u8])> {

	if !bytes.starts_with(MAGIC) || bytes.len() < MAGIC.len() + 2 {
		return Err(Error::InvalidCs("not a NumPy array file".to_string()));
	}
	let major = bytes[MAGIC.len()];

	// the header length is a u16 in version 1, a u32 after that
	let (len_size, header_len) = match major {
		1 if bytes.len() >= 10 => (2, LE::read_u16(&bytes[8 .. 10]) as usize),
		2 | 3 if bytes.len() >= 12 => (4, LE::read_u32(&bytes[8 .. 12]) as usize),
		_ => return Err(Error::InvalidCs(format!("unsupported NumPy format version: {}", major)))
	};

	let start = MAGIC.len() + 2 + len_size;
	let end = start + header_len;
	if bytes.len() < end {
		return Err(Error::InvalidCs("truncated header".to_string()));
	}
	let header = std::str::from_utf8(&bytes[start .. end])
		.map_err(|e| Error::InvalidCs(format!("header is not text: {}", e)))?;

	Ok((header, &bytes[end ..]))
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
	Little,
	Big
}


#[derive(Debug, Clone, PartialEq)]
struct Field {
	name: String,
	/// byte offset within the record
	offset: usize,
	endian: Endian,
	kind: char,
	/// bytes per element
	size: usize,
	count: usize
}

impl Field {

	fn read_uint(&self, record: &[u8], i: usize) -> Result<u64> {

		if i >= self.count {
			return Err(Error::InvalidCs(format!("{} has no element {}", self.name, i)));
		}
		let start = self.offset + i*self.size;
		let b = &record[start .. start + self.size];

		let value = match (self.kind, self.size, self.endian) {
			('u', 4, Endian::Little) => LE::read_u32(b) as i64,
			('u', 4, Endian::Big) => BE::read_u32(b) as i64,
			('i', 4, Endian::Little) => LE::read_i32(b) as i64,
			('i', 4, Endian::Big) => BE::read_i32(b) as i64,
			('u', 8, Endian::Little) => LE::read_u64(b) as i64,
			('u', 8, Endian::Big) => BE::read_u64(b) as i64,
			('i', 8, Endian::Little) => LE::read_i64(b),
			('i', 8, Endian::Big) => BE::read_i64(b),
			_ => return Err(Error::InvalidCs(format!("{} is not a 32 or 64 bit integer field", self.name)))
		};

		u64::try_from(value)
			.map_err(|_| Error::InvalidCs(format!("{} is negative: {}", self.name, value)))
	}

	fn read_bytes_str(&self, record: &[u8]) -> Result<String> {

		if self.kind != 'S' {
			return Err(Error::InvalidCs(format!("{} is not a byte string field", self.name)));
		}
		let b = &record[self.offset .. self.offset + self.size];

		// byte strings are NUL-padded
		let end = b.iter()
			.position(|&c| c == 0)
			.unwrap_or(b.len());
		Ok(String::from_utf8_lossy(&b[.. end]).to_string())
	}
}


#[derive(Debug, Clone, PartialEq)]
struct ArrayHeader {
	fields: Vec<Field>,
	record_size: usize,
	num_records: usize
}

impl ArrayHeader {

	fn parse(header: &str) -> Result<Self> {

		let dict = Literal::parse(header)?;
		let Literal::Dict(entries) = dict
			else { return Err(Error::InvalidCs("header is not a dict".to_string())); };
		let get = |key: &str| -> Result<&Literal> {
			entries.iter()
				.find(|(k, _)| k == key)
				.map(|(_, v)| v)
				.ok_or_else(|| Error::InvalidCs(format!("header has no {}", key)))
		};

		if let Literal::Bool(true) = get("fortran_order")? {
			return Err(Error::InvalidCs("Fortran-ordered arrays are not supported".to_string()));
		}

		let num_records = match get("shape")? {
			Literal::Tuple(dims) => match dims.as_slice() {
				[Literal::Int(n)] => dimension(*n)?,
				_ => return Err(Error::InvalidCs(format!("expected a 1D array, not shape {:?}", dims)))
			},
			other => return Err(Error::InvalidCs(format!("shape is not a tuple: {:?}", other)))
		};

		let Literal::List(descr) = get("descr")?
			else { return Err(Error::InvalidCs("descr is not a list of fields, not a structured array".to_string())); };

		let mut fields = Vec::<Field>::with_capacity(descr.len());
		let mut offset = 0;
		for entry in descr {
			let field = Self::field_from(entry, offset)?;
			offset = field.size.checked_mul(field.count)
				.and_then(|n| offset.checked_add(n))
				.ok_or_else(|| Error::InvalidCs(format!("field {} is too large", field.name)))?;
			fields.push(field);
		}

		Ok(Self {
			fields,
			record_size: offset,
			num_records
		})
	}

	fn field_from(entry: &Literal, offset: usize) -> Result<Field> {

		let Literal::Tuple(parts) = entry
			else { return Err(Error::InvalidCs(format!("field description is not a tuple: {:?}", entry))); };

		let (name, dtype, subshape) = match parts.as_slice() {
			[Literal::Str(name), Literal::Str(dtype)] => (name, dtype, None),
			[Literal::Str(name), Literal::Str(dtype), Literal::Tuple(shape)] => (name, dtype, Some(shape)),
			_ => return Err(Error::InvalidCs(format!("unsupported field description: {:?}", entry)))
		};

		let count = match subshape {
			None => 1,
			Some(shape) => shape.iter()
				.try_fold(1usize, |count, dim| {
					let Literal::Int(n) = dim
						else { return Err(Error::InvalidCs(format!("bad shape for field {}", name))); };
					count.checked_mul(dimension(*n)?)
						.ok_or_else(|| Error::InvalidCs(format!("shape of field {} is too large", name)))
				})?
		};

		let (endian, kind, size) = parse_dtype(dtype)
			.ok_or_else(|| Error::InvalidCs(format!("unsupported dtype for field {}: {}", name, dtype)))?;

		Ok(Field {
			name: name.clone(),
			offset,
			endian,
			kind,
			size,
			count
		})
	}

	fn field(&self, name: &str) -> Result<&Field> {
		self.fields.iter()
			.find(|f| f.name == name)
			.ok_or_else(|| Error::MissingField(name.to_string()))
	}
}


fn dimension(n: i64) -> Result<usize> {
	usize::try_from(n)
		.map_err(|_| Error::InvalidCs(format!("negative dimension: {}", n)))
}


/// parses eg `<u4`, `|S43`, `<f8`, into (byte order, kind, bytes per element)
fn parse_dtype(dtype: &str) -> Option<(Endian,char,usize)> {

	let mut chars = dtype.chars().peekable();
	let endian = match chars.peek()? {
		'>' => {
			chars.next();
			Endian::Big
		}
		'<' | '|' | '=' => {
			chars.next();
			Endian::Little
		}
		_ => Endian::Little
	};

	let kind = chars.next()?;
	let digits = chars.take_while(|c| c.is_ascii_digit())
		.collect::<String>();
	let n = digits.parse::<usize>().ok()?;

	let size = match kind {
		'b' | 'i' | 'u' | 'f' | 'c' | 'S' | 'V' | 'M' | 'm' => n,
		// unicode strings are UCS-4
		'U' => n.checked_mul(4)?,
		// python objects can't be read from the raw bytes
		_ => return None
	};

	Some((endian, kind, size))
}


/// Just enough of the Python literal syntax to read .npy headers
#[derive(Debug, Clone, PartialEq)]
enum Literal {
	Str(String),
	Int(i64),
	Bool(bool),
	None,
	List(Vec<Literal>),
	Tuple(Vec<Literal>),
	Dict(Vec<(String,Literal)>)
}

impl Literal {

	fn parse(text: &str) -> Result<Self> {
		let mut cursor = Cursor {
			chars: text.chars().collect(),
			pos: 0
		};
		cursor.value()
	}
}


struct Cursor {
	chars: Vec<char>,
	pos: usize
}

impl Cursor {

	fn error(&self, msg: impl AsRef<str>) -> Error {
		Error::InvalidCs(format!("bad header at char {}: {}", self.pos, msg.as_ref()))
	}

	fn skip_whitespace(&mut self) {
		while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
			self.pos += 1;
		}
	}

	fn peek(&mut self) -> Option<char> {
		self.skip_whitespace();
		self.chars.get(self.pos).copied()
	}

	fn expect(&mut self, c: char) -> Result<()> {
		if self.peek() == Some(c) {
			self.pos += 1;
			Ok(())
		} else {
			Err(self.error(format!("expected '{}'", c)))
		}
	}

	fn value(&mut self) -> Result<Literal> {
		match self.peek() {
			Some('{') => self.dict(),
			Some('[') => self.sequence('[', ']').map(Literal::List),
			Some('(') => self.sequence('(', ')').map(Literal::Tuple),
			Some('\'') | Some('"') => self.string().map(Literal::Str),
			Some(c) if c == '-' || c.is_ascii_digit() => self.int(),
			Some(c) if c.is_alphabetic() => self.word(),
			Some(c) => Err(self.error(format!("unexpected '{}'", c))),
			None => Err(self.error("unexpected end"))
		}
	}

	/// comma-separated values, trailing comma allowed
	fn sequence(&mut self, open: char, close: char) -> Result<Vec<Literal>> {
		self.expect(open)?;
		let mut items = Vec::new();
		loop {
			if self.peek() == Some(close) {
				self.pos += 1;
				return Ok(items);
			}
			items.push(self.value()?);
			match self.peek() {
				Some(',') => self.pos += 1,
				Some(c) if c == close => (),
				_ => return Err(self.error(format!("expected ',' or '{}'", close)))
			}
		}
	}

	fn dict(&mut self) -> Result<Literal> {
		self.expect('{')?;
		let mut entries = Vec::new();
		loop {
			if self.peek() == Some('}') {
				self.pos += 1;
				return Ok(Literal::Dict(entries));
			}
			let key = self.string()?;
			self.expect(':')?;
			let value = self.value()?;
			entries.push((key, value));
			match self.peek() {
				Some(',') => self.pos += 1,
				Some('}') => (),
				_ => return Err(self.error("expected ',' or '}'"))
			}
		}
	}

	fn string(&mut self) -> Result<String> {
		let Some(quote) = self.peek().filter(|c| *c == '\'' || *c == '"')
			else { return Err(self.error("expected a string")); };
		self.pos += 1;
		let start = self.pos;
		while let Some(&c) = self.chars.get(self.pos) {
			if c == quote {
				let s = self.chars[start .. self.pos].iter().collect();
				self.pos += 1;
				return Ok(s);
			}
			self.pos += 1;
		}
		Err(self.error("unterminated string"))
	}

	fn int(&mut self) -> Result<Literal> {
		let start = self.pos;
		if self.chars.get(self.pos) == Some(&'-') {
			self.pos += 1;
		}
		while self.chars.get(self.pos).is_some_and(|c| c.is_ascii_digit()) {
			self.pos += 1;
		}
		// python 2 era headers sometimes have long suffixes, eg 10L
		let digits = self.chars[start .. self.pos].iter().collect::<String>();
		if self.chars.get(self.pos) == Some(&'L') {
			self.pos += 1;
		}
		digits.parse::<i64>()
			.map(Literal::Int)
			.map_err(|_| self.error(format!("bad integer: {}", digits)))
	}

	fn word(&mut self) -> Result<Literal> {
		let start = self.pos;
		while self.chars.get(self.pos).is_some_and(|c| c.is_alphanumeric() || *c == '_') {
			self.pos += 1;
		}
		let word = self.chars[start .. self.pos].iter().collect::<String>();
		match word.as_str() {
			"True" => Ok(Literal::Bool(true)),
			"False" => Ok(Literal::Bool(false)),
			"None" => Ok(Literal::None),
			_ => Err(self.error(format!("unexpected word: {}", word)))
		}
	}
}
