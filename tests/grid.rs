
mod util;


use std::f64::consts::PI;

use galvanic_assert::{assert_that, matchers::*};

use star_ctf::grid;

use crate::util::fixtures::assert_close;


fn assert_axis(n: usize, shifted: bool, normalized: bool, exp: &[f64]) {
	let obs = grid::axis(n, shifted, normalized);
	assert_that!(&obs.len(), eq(exp.len()));
	for (o, e) in obs.iter().zip(exp) {
		assert_close(*o, *e, 1e-12);
	}
}


#[test]
fn axes() {
	assert_axis(4, false, true, &[-1.0, -0.5, 0.0, 0.5]);
	assert_axis(4, true, true, &[-1.0, -1.0/3.0, 1.0/3.0, 1.0]);
	assert_axis(5, false, true, &[-0.8, -0.4, 0.0, 0.4, 0.8]);
	assert_axis(5, true, true, &[-0.8, -0.4, 0.0, 0.4, 0.8]);
	assert_axis(4, false, false, &[-2.0, -1.0, 0.0, 1.0]);
	assert_axis(4, true, false, &[-1.5, -0.5, 0.5, 1.5]);
	assert_axis(1, false, true, &[0.0]);
}


#[test]
fn normalized_bounds() {
	for n in 1 ..= 9 {
		for shifted in [false, true] {
			let g = grid::grid_2d(n, shifted, true);
			for v in g.x.iter().chain(g.y.iter()) {
				assert_that!(&(-1.0 <= *v && *v <= 1.0), eq(true));
			}
		}
	}
}


#[test]
fn layout() {
	let g = grid::grid_2d(4, false, false);

	assert_that!(&g.x.dim(), eq((4, 4)));

	// x varies down the rows, y across the columns
	assert_that!(&g.x[[0, 3]], eq(-2.0));
	assert_that!(&g.x[[3, 0]], eq(1.0));
	assert_that!(&g.y[[0, 3]], eq(1.0));
	assert_that!(&g.y[[3, 0]], eq(-2.0));

	// the origin is at n/2
	assert_that!(&g.r[[2, 2]], eq(0.0));
	assert_close(g.r[[0, 0]], 8f64.sqrt(), 1e-12);
	assert_close(g.phi[[0, 0]], -3.0*PI/4.0, 1e-12);
	assert_close(g.phi[[3, 2]], 0.0, 1e-12);
	assert_close(g.phi[[2, 3]], PI/2.0, 1e-12);
}


#[test]
fn cart2pol() {
	let (phi, r) = grid::cart2pol(3.0, 4.0);
	assert_close(r, 5.0, 1e-12);
	assert_close(phi, 4f64.atan2(3.0), 1e-12);

	let (phi, r) = grid::cart2pol(-1.0, 0.0);
	assert_close(r, 1.0, 1e-12);
	assert_close(phi, PI, 1e-12);
}
