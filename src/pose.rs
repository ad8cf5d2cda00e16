
use nalgebra::Matrix3;
use tracing::info;

use crate::error::{Error, Result};
use crate::star::MetadataTable;


pub const COL_ROT: &str = "_rlnAngleRot";
pub const COL_TILT: &str = "_rlnAngleTilt";
pub const COL_PSI: &str = "_rlnAnglePsi";
pub const COL_ORIGIN_X: &str = "_rlnOriginX";
pub const COL_ORIGIN_Y: &str = "_rlnOriginY";

const ORTHONORMAL_TOLERANCE: f64 = 1e-6;


/// Orientation and in-plane shift of one particle
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
	/// rot, tilt, psi, in degrees
	pub euler: [f64; 3],
	/// x, y origin offsets, in pixels
	pub translation: [f64; 2],
	pub rotation: Matrix3<f64>
}


pub fn extract(table: &MetadataTable) -> Result<Vec<Pose>> {

	table.require_columns(&[COL_ROT, COL_TILT, COL_PSI, COL_ORIGIN_X, COL_ORIGIN_Y])?;

	let rot = table.floats(COL_ROT)?;
	let tilt = table.floats(COL_TILT)?;
	let psi = table.floats(COL_PSI)?;
	let origin_x = table.floats(COL_ORIGIN_X)?;
	let origin_y = table.floats(COL_ORIGIN_Y)?;

	let poses = (0 .. table.len())
		.map(|i| {
			let euler = [rot[i], tilt[i], psi[i]];
			Ok(Pose {
				euler,
				translation: [origin_x[i], origin_y[i]],
				rotation: checked_rotation(euler)
					.map_err(|e| match e {
						Error::NumericValidation(msg) => Error::NumericValidation(format!("particle {}: {}", i, msg)),
						e => e
					})?
			})
		})
		.collect::<Result<Vec<_>>>()?;

	if let Some(first) = poses.first() {
		info!("Euler angles (Rot, Tilt, Psi): {:?}", first.euler);
		info!("Rotation matrix: {}", first.rotation);
		info!("Translations: {:?}", first.translation);
	}

	Ok(poses)
}


/// Builds the rotation matrix for RELION Euler angles (in degrees).
///
/// The ZYZ product is followed by negating four off-diagonal entries,
/// which is what RELION-compatible tools expect. Keep the flips as-is.
pub fn rotation_from_euler(rot: f64, tilt: f64, psi: f64) -> Matrix3<f64> {

	let (sa, ca) = rot.to_radians().sin_cos();
	let (sb, cb) = tilt.to_radians().sin_cos();
	let (sy, cy) = psi.to_radians().sin_cos();

	let ra = Matrix3::new(
		ca, -sa, 0.0,
		sa, ca, 0.0,
		0.0, 0.0, 1.0
	);
	let rb = Matrix3::new(
		cb, 0.0, -sb,
		0.0, 1.0, 0.0,
		sb, 0.0, cb
	);
	let ry = Matrix3::new(
		cy, -sy, 0.0,
		sy, cy, 0.0,
		0.0, 0.0, 1.0
	);

	let mut r = ry*rb*ra;
	for (i, j) in [(0, 1), (1, 0), (1, 2), (2, 1)] {
		r[(i, j)] = -r[(i, j)];
	}
	r
}


/// Like [rotation_from_euler], but rejects anything that isn't a proper rotation,
/// which usually means the angles themselves were garbage (eg NaN).
pub fn checked_rotation(euler: [f64; 3]) -> Result<Matrix3<f64>> {

	if euler.iter().any(|a| !a.is_finite()) {
		return Err(Error::NumericValidation(format!("non-finite Euler angles: {:?}", euler)));
	}

	let [rot, tilt, psi] = euler;
	let r = rotation_from_euler(rot, tilt, psi);

	let err = (r*r.transpose() - Matrix3::identity()).abs().max();
	if !(err < ORTHONORMAL_TOLERANCE) {
		return Err(Error::NumericValidation(format!(
			"rotation for Euler angles {:?} is not orthonormal: max |R*R^T - I| = {}",
			euler, err
		)));
	}

	let det = r.determinant();
	if !((det - 1.0).abs() < ORTHONORMAL_TOLERANCE) {
		return Err(Error::NumericValidation(format!(
			"rotation for Euler angles {:?} has determinant {}",
			euler, det
		)));
	}

	Ok(r)
}
