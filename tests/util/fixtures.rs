
use indoc::indoc;


/// Three particles from two stacks, with CTF, pose, and optics columns
pub const PARTICLES_STAR: &str = indoc! { "
	# version 30001

	data_

	loop_
	_rlnImageName #1
	_rlnDefocusU #2
	_rlnDefocusV #3
	_rlnDefocusAngle #4
	_rlnVoltage #5
	_rlnSphericalAberration #6
	_rlnAmplitudeContrast #7
	_rlnPhaseShift #8
	_rlnDetectorPixelSize #9
	_rlnMagnification #10
	_rlnAngleRot #11
	_rlnAngleTilt #12
	_rlnAnglePsi #13
	_rlnOriginX #14
	_rlnOriginY #15
	000001@stacks/mic1.mrcs 15000.0 14500.0 30.0 300 2.7 0.1 0.0 14.0 100000.0 0.0 0.0 0.0 0.0 0.0
	000002@stacks/mic1.mrcs 16000.0 15800.0 -45.5 300 2.7 0.1 0.0 14.0 100000.0 90.0 45.0 -30.0 1.5 -2.25
	000001@stacks/mic2.mrcs 21000.0 21000.0 10.0 300 2.7 0.1 90.0 14.0 100000.0 -170.0 170.0 120.0 -3.0 4.0

" };


/// Only the CTF columns, no optics columns to derive the pixel size from
pub const CTF_ONLY_STAR: &str = indoc! { "
	data_
	loop_
	_rlnDefocusU
	_rlnDefocusV
	_rlnDefocusAngle
	_rlnVoltage
	_rlnSphericalAberration
	_rlnAmplitudeContrast
	_rlnPhaseShift
	12000 11000 15 200 2.0 0.07 0
" };


pub fn assert_close(obs: f64, exp: f64, eps: f64) {
	assert!((obs - exp).abs() <= eps, "expected {} +/- {}, got {}", exp, eps, obs);
}


/// Builds a version 1 .npy file holding a structured array, like cryoSPARC writes
pub fn npy(descr: &str, num_records: usize, data: &[u8]) -> Vec<u8> {
	npy_shaped(descr, &format!("({},)", num_records), data)
}


/// Like [npy], but the shape is written out as-is, even if it's nonsense
pub fn npy_shaped(descr: &str, shape: &str, data: &[u8]) -> Vec<u8> {

	let mut header = format!(
		"{{'descr': {}, 'fortran_order': False, 'shape': {}, }}",
		descr, shape
	);

	// pad the header with spaces so the data is 64-byte aligned, ending in a newline
	let unpadded = 10 + header.len() + 1;
	let padding = (64 - unpadded % 64) % 64;
	header.push_str(&" ".repeat(padding));
	header.push('\n');

	let mut bytes = Vec::new();
	bytes.extend_from_slice(b"\x93NUMPY");
	bytes.push(1);
	bytes.push(0);
	bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
	bytes.extend_from_slice(header.as_bytes());
	bytes.extend_from_slice(data);
	bytes
}


/// One cryoSPARC-style record: uid, blob/path (|S20), blob/idx, blob/shape, blob/psize_A
pub const CS_DESCR: &str = "[('uid', '<u8'), ('blob/path', '|S20'), ('blob/idx', '<u4'), ('blob/shape', '<u4', (2,)), ('blob/psize_A', '<f4')]";

pub fn cs_record(uid: u64, path: &str, idx: u32, d: u32) -> Vec<u8> {
	let mut record = Vec::new();
	record.extend_from_slice(&uid.to_le_bytes());
	let mut path_bytes = [0u8; 20];
	path_bytes[.. path.len()].copy_from_slice(path.as_bytes());
	record.extend_from_slice(&path_bytes);
	record.extend_from_slice(&idx.to_le_bytes());
	record.extend_from_slice(&d.to_le_bytes());
	record.extend_from_slice(&d.to_le_bytes());
	record.extend_from_slice(&1.2f32.to_le_bytes());
	record
}
