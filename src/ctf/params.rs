
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::star::MetadataTable;

use super::CtfParams;


pub const COL_DEFOCUS_U: &str = "_rlnDefocusU";
pub const COL_DEFOCUS_V: &str = "_rlnDefocusV";
pub const COL_DEFOCUS_ANGLE: &str = "_rlnDefocusAngle";
pub const COL_VOLTAGE: &str = "_rlnVoltage";
pub const COL_SPHERICAL_ABERRATION: &str = "_rlnSphericalAberration";
pub const COL_AMPLITUDE_CONTRAST: &str = "_rlnAmplitudeContrast";
pub const COL_PHASE_SHIFT: &str = "_rlnPhaseShift";

pub const COL_DETECTOR_PIXEL_SIZE: &str = "_rlnDetectorPixelSize";
pub const COL_MAGNIFICATION: &str = "_rlnMagnification";

pub const CTF_COLUMNS: [&str; 7] = [
	COL_DEFOCUS_U,
	COL_DEFOCUS_V,
	COL_DEFOCUS_ANGLE,
	COL_VOLTAGE,
	COL_SPHERICAL_ABERRATION,
	COL_AMPLITUDE_CONTRAST,
	COL_PHASE_SHIFT
];

pub const FALLBACK_PIXEL_SIZE: f64 = 1.0;


/// Where the pixel size for an extraction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelSizeSource {
	Override,
	/// detector pixel size (microns) and magnification columns
	Derived,
	/// a placeholder, not a measurement
	Fallback
}


/// Picks the pixel size: the explicit override wins, then the detector columns, then 1 A/pix.
pub fn resolve_pixel_size(table: &MetadataTable, pixel_size: Option<f64>) -> Result<(f64,PixelSizeSource)> {

	if let Some(pixel_size) = pixel_size {
		return Ok((pixel_size, PixelSizeSource::Override));
	}

	if !table.is_empty() && table.has_column(COL_DETECTOR_PIXEL_SIZE) && table.has_column(COL_MAGNIFICATION) {
		let detector_pixel_size = table.get_f64(0, COL_DETECTOR_PIXEL_SIZE)?;
		let magnification = table.get_f64(0, COL_MAGNIFICATION)?;
		return Ok((detector_pixel_size*10000.0/magnification, PixelSizeSource::Derived));
	}

	warn!(
		"No pixel size given and no {} and {} columns: using {} A/pix as a placeholder, CTF values will not be physical",
		COL_DETECTOR_PIXEL_SIZE, COL_MAGNIFICATION, FALLBACK_PIXEL_SIZE
	);
	Ok((FALLBACK_PIXEL_SIZE, PixelSizeSource::Fallback))
}


/// Reads the CTF parameters of every particle in the table.
///
/// `image_size` and the resolved pixel size are shared by all particles.
/// All the CTF columns are checked before any row is read.
pub fn extract(table: &MetadataTable, image_size: u32, pixel_size: Option<f64>) -> Result<Vec<CtfParams>> {

	table.require_columns(&CTF_COLUMNS)?;

	if image_size == 0 {
		return Err(Error::NumericValidation("image size must be positive".to_string()));
	}
	let (pixel_size, source) = resolve_pixel_size(table, pixel_size)?;
	if !(pixel_size.is_finite() && pixel_size > 0.0) {
		return Err(Error::NumericValidation(format!("pixel size must be positive, not {} ({:?})", pixel_size, source)));
	}

	let columns = CTF_COLUMNS.iter()
		.map(|c| table.floats(c))
		.collect::<Result<Vec<_>>>()?;

	let params = (0 .. table.len())
		.map(|i| {
			let params = CtfParams {
				image_size: image_size as f64,
				pixel_size,
				defocus_u: columns[0][i],
				defocus_v: columns[1][i],
				defocus_angle: columns[2][i],
				voltage: columns[3][i],
				spherical_aberration: columns[4][i],
				amplitude_contrast: columns[5][i],
				phase_shift: columns[6][i]
			};
			validate(&params)
				.map_err(|msg| Error::NumericValidation(format!("particle {}: {}", i, msg)))?;
			Ok(params)
		})
		.collect::<Result<Vec<_>>>()?;

	if let Some(first) = params.first() {
		info!("CTF parameters for first particle:");
		first.log();
	}

	Ok(params)
}


fn validate(params: &CtfParams) -> std::result::Result<(),String> {

	for (name, value) in [
		("DefocusU", params.defocus_u),
		("DefocusV", params.defocus_v),
		("DefocusAngle", params.defocus_angle),
		("PhaseShift", params.phase_shift)
	] {
		if !value.is_finite() {
			return Err(format!("{} is not finite: {}", name, value));
		}
	}

	if !(params.voltage.is_finite() && params.voltage > 0.0) {
		return Err(format!("voltage must be positive, not {} kV", params.voltage));
	}
	if !(params.spherical_aberration.is_finite() && params.spherical_aberration >= 0.0) {
		return Err(format!("spherical aberration must be non-negative, not {} mm", params.spherical_aberration));
	}
	if !(0.0 ..= 1.0).contains(&params.amplitude_contrast) {
		return Err(format!("amplitude contrast must be in [0,1], not {}", params.amplitude_contrast));
	}

	Ok(())
}
