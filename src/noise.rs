
use ndarray::{ArrayView3, Axis, Zip};

use crate::error::{Error, Result};
use crate::grid;


/// Estimates the background noise variance of a (particles, rows, columns) image stack.
///
/// Only the pixels outside the inscribed circle (normalized radius >= 1) count as background,
/// so the particle in the middle of each image doesn't contribute.
pub fn estimate(stack: ArrayView3<f32>) -> Result<f64> {

	let (n, rows, cols) = stack.dim();
	if rows != cols {
		return Err(Error::NumericValidation(format!("images must be square, not {}x{}", rows, cols)));
	}

	let g = grid::grid_2d(rows, false, true);
	let mask = g.r.mapv(|r| r >= 1.0);
	let masked_pixels = mask.iter()
		.filter(|&&m| m)
		.count();
	if n == 0 || masked_pixels == 0 {
		return Err(Error::NumericValidation(format!(
			"no background pixels to estimate noise from: {} images of {}x{}",
			n, rows, cols
		)));
	}

	let mut sum = 0f64;
	let mut sum_sq = 0f64;
	for image in stack.axis_iter(Axis(0)) {
		Zip::from(&image)
			.and(&mask)
			.for_each(|&v, &m| {
				if m {
					let v = v as f64;
					sum += v;
					sum_sq += v*v;
				}
			});
	}

	let count = (n*masked_pixels) as f64;
	let first_moment = sum/count;
	let second_moment = sum_sq/count;

	Ok(second_moment - first_moment*first_moment)
}
