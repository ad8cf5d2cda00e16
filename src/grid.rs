
use ndarray::{Array1, Array2, Zip};


/// Cartesian and polar coordinates of every point on an n x n grid
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2d {
	pub x: Array2<f64>,
	pub y: Array2<f64>,
	/// azimuth, atan2(y, x)
	pub phi: Array2<f64>,
	/// distance from the origin
	pub r: Array2<f64>
}


pub fn cart2pol(x: f64, y: f64) -> (f64,f64) {
	(y.atan2(x), x.hypot(y))
}


/// The 1D coordinates along each axis of [grid_2d]
pub fn axis(n: usize, shifted: bool, normalized: bool) -> Array1<f64> {

	let half = (n as f64)/2.0;
	let shift_even = shifted && n % 2 == 0;

	let coords = (0 .. n)
		.map(|i| {
			if shift_even {
				-half + 0.5 + (i as f64)
			} else {
				(-half + (i as f64)).ceil()
			}
		})
		.collect::<Array1<f64>>();

	if !normalized {
		coords
	} else if shift_even {
		coords/(half - 0.5)
	} else {
		coords/half
	}
}


/// Makes a 2D grid, `x` varying along the first axis and `y` along the second.
///
/// With `shifted`, even-sized grids are centered between pixels instead of on one.
/// With `normalized`, coordinates fall in [-1, 1].
pub fn grid_2d(n: usize, shifted: bool, normalized: bool) -> Grid2d {

	let g = axis(n, shifted, normalized);

	let x = Array2::from_shape_fn((n, n), |(i, _)| g[i]);
	let y = Array2::from_shape_fn((n, n), |(_, j)| g[j]);

	let mut phi = Array2::<f64>::zeros((n, n));
	let mut r = Array2::<f64>::zeros((n, n));
	Zip::from(&mut phi)
		.and(&mut r)
		.and(&x)
		.and(&y)
		.for_each(|phi, r, &x, &y| {
			(*phi, *r) = cart2pol(x, y);
		});

	Grid2d {
		x,
		y,
		phi,
		r
	}
}
