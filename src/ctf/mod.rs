
// Contrast Transfer Function
// the frequency-domain modulation the microscope optics impose on each recorded image

pub mod model;
pub mod params;

use ndarray::Array2;
use tracing::info;

pub use model::{evaluate, wavelength};
pub use params::{extract, resolve_pixel_size, PixelSizeSource};


/// Per-particle CTF parameters, in the order RELION-derived tools pass them around
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CtfParams {
	/// image side length, in pixels
	pub image_size: f64,
	/// Angstroms per pixel
	pub pixel_size: f64,
	/// Angstroms
	pub defocus_u: f64,
	/// Angstroms
	pub defocus_v: f64,
	/// degrees
	pub defocus_angle: f64,
	/// kV
	pub voltage: f64,
	/// mm
	pub spherical_aberration: f64,
	/// ratio, in [0,1]
	pub amplitude_contrast: f64,
	/// degrees
	pub phase_shift: f64
}

impl CtfParams {

	pub const NUM_FIELDS: usize = 9;

	pub fn to_array(&self) -> [f64; Self::NUM_FIELDS] {
		[
			self.image_size,
			self.pixel_size,
			self.defocus_u,
			self.defocus_v,
			self.defocus_angle,
			self.voltage,
			self.spherical_aberration,
			self.amplitude_contrast,
			self.phase_shift
		]
	}

	pub fn from_array(a: [f64; Self::NUM_FIELDS]) -> Self {
		let [image_size, pixel_size, defocus_u, defocus_v, defocus_angle, voltage, spherical_aberration, amplitude_contrast, phase_shift] = a;
		Self {
			image_size,
			pixel_size,
			defocus_u,
			defocus_v,
			defocus_angle,
			voltage,
			spherical_aberration,
			amplitude_contrast,
			phase_shift
		}
	}

	/// Writes the parameters to the log, one per line
	pub fn log(&self) {
		info!("Image size (pix)  : {}", self.image_size as u64);
		info!("A/pix             : {}", self.pixel_size);
		info!("DefocusU (A)      : {}", self.defocus_u);
		info!("DefocusV (A)      : {}", self.defocus_v);
		info!("Dfang (deg)       : {}", self.defocus_angle);
		info!("voltage (kV)      : {}", self.voltage);
		info!("cs (mm)           : {}", self.spherical_aberration);
		info!("w                 : {}", self.amplitude_contrast);
		info!("Phase shift (deg) : {}", self.phase_shift);
	}
}


/// Evaluates the CTF over the full DxD frequency plane of one particle image.
///
/// Element `[i, j]` holds the value at spatial frequency `(l[j], l[i])/pixel_size`,
/// where `l[k] = -0.5 + k/D`, so the DC term sits at `[D/2, D/2]`.
pub fn map(params: &CtfParams, bfactor: Option<f64>) -> Array2<f64> {

	let d = params.image_size as usize;
	let axis = (0 .. d)
		.map(|k| (-0.5 + (k as f64)/(d as f64))/params.pixel_size)
		.collect::<Vec<_>>();

	let freqs = axis.iter()
		.flat_map(|&fy| axis.iter().map(move |&fx| [fx, fy]))
		.collect::<Vec<_>>();

	let values = evaluate(&freqs, params, bfactor);
	Array2::from_shape_fn((d, d), |(i, j)| values[i*d + j])
}
