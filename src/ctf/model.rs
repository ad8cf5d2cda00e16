
use std::f64::consts::PI;

use num_traits::AsPrimitive;

use super::CtfParams;


/// Relativistic electron wavelength, in Angstroms, for an accelerating voltage in volts
pub fn wavelength(volts: f64) -> f64 {
	// lambda = sqrt(h^2/(2*m*e*Vr)), Vr = V + (e/(2*m*c^2))*V^2
	12.2639/(volts + 0.97845e-6*volts*volts).sqrt()
}


/// The CTF parameters, converted to the units the phase calculation wants
struct Optics {
	defocus_u: f64,
	defocus_v: f64,
	/// radians
	defocus_angle: f64,
	/// Angstroms
	lambda: f64,
	/// Angstroms
	cs: f64,
	w: f64,
	/// radians
	phase_shift: f64
}

impl Optics {

	fn from(params: &CtfParams) -> Self {
		Self {
			defocus_u: params.defocus_u,
			defocus_v: params.defocus_v,
			defocus_angle: params.defocus_angle.to_radians(),
			lambda: wavelength(params.voltage*1000.0),
			cs: params.spherical_aberration*1e7,
			w: params.amplitude_contrast,
			phase_shift: params.phase_shift.to_radians()
		}
	}

	fn at(&self, fx: f64, fy: f64, bfactor: Option<f64>) -> f64 {

		let ang = fy.atan2(fx);
		let s2 = fx*fx + fy*fy;

		// astigmatism: defocus depends on the azimuth of the frequency
		let df = 0.5*(self.defocus_u + self.defocus_v)
			+ 0.5*(self.defocus_u - self.defocus_v)*(2.0*(ang - self.defocus_angle)).cos();

		let lambda = self.lambda;
		let gamma = 2.0*PI*(-0.5*df*lambda*s2 + 0.25*self.cs*lambda.powi(3)*s2*s2) - self.phase_shift;
		let ctf = (1.0 - self.w*self.w).sqrt()*gamma.sin() - self.w*gamma.cos();

		match bfactor {
			Some(b) => ctf*(-b/4.0*s2).exp(),
			None => ctf
		}
	}
}


/// Evaluates the CTF at each 2D spatial frequency (in 1/Angstroms).
///
/// Only the defocus, angle, voltage, cs, amplitude contrast and phase shift fields of the parameters are used.
/// The optional B-factor (in Angstroms^2) applies a Gaussian envelope.
/// Values come back at the same precision as the frequencies.
pub fn evaluate<T>(freqs: &[[T; 2]], params: &CtfParams, bfactor: Option<f64>) -> Vec<T>
	where
		T: AsPrimitive<f64>,
		f64: AsPrimitive<T>
{
	let optics = Optics::from(params);
	freqs.iter()
		.map(|&[fx, fy]| optics.at(fx.as_(), fy.as_(), bfactor).as_())
		.collect()
}
