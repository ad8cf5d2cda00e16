
mod util;


use galvanic_assert::{assert_that, matchers::*};

use star_ctf::{ctf, logging, star, Error};
use star_ctf::ctf::{CtfParams, PixelSizeSource};

use crate::util::fixtures::{assert_close, CTF_ONLY_STAR, PARTICLES_STAR};


fn params() -> CtfParams {
	CtfParams {
		image_size: 64.0,
		pixel_size: 1.2,
		defocus_u: 15000.0,
		defocus_v: 14000.0,
		defocus_angle: 30.0,
		voltage: 300.0,
		spherical_aberration: 2.7,
		amplitude_contrast: 0.1,
		phase_shift: 0.0
	}
}


#[test]
fn wavelength() {
	assert_close(ctf::wavelength(300000.0), 0.019687, 1e-6);
	assert_close(ctf::wavelength(200000.0), 0.025079, 1e-6);
}


#[test]
fn zero_frequency() {
	let values = ctf::evaluate(&[[0.0f64, 0.0]], &params(), None);
	assert_close(values[0], -0.1, 1e-12);

	// a quarter-wave phase shift turns the DC term into the phase contrast term
	let shifted = CtfParams {
		phase_shift: 90.0,
		.. params()
	};
	let values = ctf::evaluate(&[[0.0f64, 0.0]], &shifted, None);
	assert_close(values[0], -(1.0f64 - 0.01).sqrt(), 1e-12);
}


#[test]
fn values_stay_in_range() {
	let freqs = (0 .. 100)
		.map(|i| [i as f64*0.004, -(i as f64)*0.002])
		.collect::<Vec<_>>();
	for v in ctf::evaluate(&freqs, &params(), None) {
		assert_that!(&(v.abs() <= 1.0 + 1e-12), eq(true));
	}
}


#[test]
fn isotropic_without_astigmatism() {
	let p = CtfParams {
		defocus_v: 15000.0,
		.. params()
	};
	let f = 0.1;
	let d = f/2f64.sqrt();
	let values = ctf::evaluate(&[[f, 0.0], [0.0, f], [-d, d], [0.0, -f]], &p, None);
	for v in &values[1 ..] {
		assert_close(*v, values[0], 1e-9);
	}
}


#[test]
fn astigmatism_follows_the_angle() {
	// rotating the defocus angle and the frequency together leaves the value alone
	let p = params();
	let rotated = CtfParams {
		defocus_angle: p.defocus_angle + 40.0,
		.. p
	};
	let (f, a) = (0.12f64, 10f64.to_radians());
	let b = a + 40f64.to_radians();
	let v = ctf::evaluate(&[[f*a.cos(), f*a.sin()]], &p, None);
	let vr = ctf::evaluate(&[[f*b.cos(), f*b.sin()]], &rotated, None);
	assert_close(vr[0], v[0], 1e-9);
}


#[test]
fn bfactor_damps() {
	let freqs = [[0.05f64, 0.02], [0.1, -0.1], [0.0, 0.2]];
	let plain = ctf::evaluate(&freqs, &params(), None);
	let damped = ctf::evaluate(&freqs, &params(), Some(100.0));
	for ((f, p), d) in freqs.iter().zip(plain).zip(damped) {
		let s2 = f[0]*f[0] + f[1]*f[1];
		assert_close(d, p*(-25.0*s2).exp(), 1e-12);
		assert_that!(&(d.abs() <= p.abs()), eq(true));
	}
}


#[test]
fn precision_follows_the_input() {
	let freqs64 = [[0.05f64, 0.02], [0.1, -0.1]];
	let freqs32 = [[0.05f32, 0.02], [0.1, -0.1]];
	let v64: Vec<f64> = ctf::evaluate(&freqs64, &params(), None);
	let v32: Vec<f32> = ctf::evaluate(&freqs32, &params(), None);
	for (a, b) in v64.iter().zip(&v32) {
		assert_close(*a, *b as f64, 1e-4);
	}
}


#[test]
fn array_order() {
	let p = params();
	assert_that!(&p.to_array(), eq([64.0, 1.2, 15000.0, 14000.0, 30.0, 300.0, 2.7, 0.1, 0.0]));
	assert_that!(&CtfParams::from_array(p.to_array()), eq(p));
}


#[test]
fn extract_with_derived_pixel_size() {
	let _logging = logging::init_test();

	let table = star::load_str(PARTICLES_STAR)
		.unwrap();

	assert_that!(&ctf::resolve_pixel_size(&table, None).unwrap().1, eq(PixelSizeSource::Derived));

	let all = ctf::extract(&table, 128, None)
		.unwrap();
	assert_that!(&all.len(), eq(3));
	assert_close(all[0].pixel_size, 1.4, 1e-12);
	assert_that!(&all[1].to_array()[2 ..].to_vec(), eq(vec![16000.0, 15800.0, -45.5, 300.0, 2.7, 0.1, 0.0]));
	assert_that!(&all[2].phase_shift, eq(90.0));
	for p in &all {
		assert_that!(&p.image_size, eq(128.0));
	}
}


#[test]
fn extract_with_override() {
	let _logging = logging::init_test();

	let table = star::load_str(PARTICLES_STAR)
		.unwrap();

	let (apix, source) = ctf::resolve_pixel_size(&table, Some(0.9))
		.unwrap();
	assert_that!(&apix, eq(0.9));
	assert_that!(&source, eq(PixelSizeSource::Override));

	let all = ctf::extract(&table, 64, Some(0.9))
		.unwrap();
	assert_that!(&all[2].pixel_size, eq(0.9));
}


#[test]
fn extract_with_fallback() {
	let _logging = logging::init_test();

	let table = star::load_str(CTF_ONLY_STAR)
		.unwrap();

	assert_that!(&ctf::resolve_pixel_size(&table, None).unwrap(), eq((1.0, PixelSizeSource::Fallback)));

	let all = ctf::extract(&table, 64, None)
		.unwrap();
	assert_that!(&all[0].to_array(), eq([64.0, 1.0, 12000.0, 11000.0, 15.0, 200.0, 2.0, 0.07, 0.0]));
}


#[test]
fn extract_missing_column() {
	let _logging = logging::init_test();

	let text = CTF_ONLY_STAR
		.replace("_rlnVoltage", "_rlnNotVoltage");
	let table = star::load_str(&text)
		.unwrap();

	match ctf::extract(&table, 64, None) {
		Err(Error::MissingField(name)) => assert_that!(&name.as_str(), eq("_rlnVoltage")),
		r => panic!("unexpected result: {:?}", r)
	}
}


#[test]
fn extract_rejects_bad_values() {
	let _logging = logging::init_test();

	let bad_rows = [
		"12000 11000 15 -200 2.0 0.07 0",
		"12000 11000 15 200 -2.0 0.07 0",
		"12000 11000 15 200 2.0 1.5 0",
		"12000 inf 15 200 2.0 0.07 0"
	];
	for row in bad_rows {
		let text = CTF_ONLY_STAR
			.replace("12000 11000 15 200 2.0 0.07 0", row);
		let table = star::load_str(&text)
			.unwrap();
		match ctf::extract(&table, 64, None) {
			Err(Error::NumericValidation(msg)) => assert_that!(&msg.starts_with("particle 0:"), eq(true)),
			r => panic!("unexpected result for {}: {:?}", row, r)
		}
	}

	let table = star::load_str(CTF_ONLY_STAR)
		.unwrap();
	assert_that!(&matches!(ctf::extract(&table, 0, None), Err(Error::NumericValidation(..))), eq(true));
	assert_that!(&matches!(ctf::extract(&table, 64, Some(-1.0)), Err(Error::NumericValidation(..))), eq(true));
}


#[test]
fn extract_no_rows() {
	let _logging = logging::init_test();

	let text = CTF_ONLY_STAR
		.replace("12000 11000 15 200 2.0 0.07 0\n", "");
	let table = star::load_str(&text)
		.unwrap();
	assert_that!(&ctf::extract(&table, 64, None).unwrap().len(), eq(0));
}


#[test]
fn map() {
	let p = CtfParams {
		image_size: 8.0,
		.. params()
	};
	let m = ctf::map(&p, None);

	assert_that!(&m.dim(), eq((8, 8)));

	// DC sits in the middle
	assert_close(m[[4, 4]], -0.1, 1e-12);

	// columns step along x, rows along y
	let fx = (-0.5 + 6.0/8.0)/p.pixel_size;
	let fy = (-0.5 + 1.0/8.0)/p.pixel_size;
	let exp = ctf::evaluate(&[[fx, fy]], &p, None);
	assert_close(m[[1, 6]], exp[0], 1e-12);
}
