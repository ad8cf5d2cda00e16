
pub mod ctf;
pub mod ctfmap;
pub mod noise;
pub mod particles;
pub mod pose;
pub mod rewrite;
