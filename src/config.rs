
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use toml::{Table, Value};


pub const DEFAULT_PATH: &str = "./star-ctf.toml";


/// Config is the contents of star-ctf.toml
/// Every setting is optional, and command-line arguments take precedence over all of them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
	pub log: ConfigLog,
	pub particles: ConfigParticles,
	pub ctf: ConfigCtf
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigLog {
	pub filter: Option<String>
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigParticles {
	/// where to look for particle stacks, instead of the paths in the metadata
	pub datadir: Option<PathBuf>
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigCtf {
	/// Angstroms per pixel
	pub pixel_size: Option<f64>,
	/// Angstroms^2
	pub bfactor: Option<f64>
}

impl Config {

	/// Reads the config file at the given path, or the default path if it exists.
	/// No file at the default path just means the default config.
	pub fn read(path: Option<&Path>) -> Result<Self> {
		match path {
			Some(path) => Self::read_file(path),
			None => {
				let path = Path::new(DEFAULT_PATH);
				if path.exists() {
					Self::read_file(path)
				} else {
					Ok(Self::default())
				}
			}
		}
	}

	pub fn read_file(path: &Path) -> Result<Self> {
		let toml = fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file at: {}", path.to_string_lossy()))?;
		Self::parse(&toml)
			.with_context(|| format!("Failed to parse config file at: {}", path.to_string_lossy()))
	}

	pub fn parse(toml: &str) -> Result<Self> {

		let toml = toml.parse::<Table>()?;

		let log = match section(&toml, "log")? {
			Some(t) => ConfigLog {
				filter: get_str(t, "log", "filter")?
			},
			None => ConfigLog::default()
		};

		let particles = match section(&toml, "particles")? {
			Some(t) => ConfigParticles {
				datadir: get_str(t, "particles", "datadir")?
					.map(PathBuf::from)
			},
			None => ConfigParticles::default()
		};

		let ctf = match section(&toml, "ctf")? {
			Some(t) => ConfigCtf {
				pixel_size: get_f64(t, "ctf", "pixel_size")?,
				bfactor: get_f64(t, "ctf", "bfactor")?
			},
			None => ConfigCtf::default()
		};

		Ok(Config {
			log,
			particles,
			ctf
		})
	}
}


fn section<'t>(toml: &'t Table, name: &str) -> Result<Option<&'t Table>> {
	toml.get(name)
		.map(|v| {
			v.as_table()
				.with_context(|| format!("{} key is not a table", name))
		})
		.transpose()
}


fn get_str(table: &Table, section: &str, key: &str) -> Result<Option<String>> {
	table.get(key)
		.map(|v| {
			v.as_str()
				.map(str::to_string)
				.with_context(|| format!("{}.{} was not a string", section, key))
		})
		.transpose()
}


fn get_f64(table: &Table, section: &str, key: &str) -> Result<Option<f64>> {
	table.get(key)
		.map(|v| -> Result<f64> {
			match v {
				Value::Float(f) => Ok(*f),
				// let people write whole numbers without the .0
				Value::Integer(i) => Ok(*i as f64),
				_ => bail!("{}.{} was not a number", section, key)
			}
		})
		.transpose()
}
