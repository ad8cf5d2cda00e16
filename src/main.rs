
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use gumdrop::Options;
use tracing::debug;

use star_ctf::commands;
use star_ctf::config::Config;
use star_ctf::logging::{self, ResultExt};


#[derive(Options)]
struct Args {

	#[options(help_flag)]
	help: bool,

	/// settings for log output, overrides the config file
	log: Option<String>,

	/// config file to use, instead of ./star-ctf.toml
	config: Option<PathBuf>,

	#[options(command)]
	cmd: Option<Command>
}

#[derive(Options)]
enum Command {

	/// Print the CTF parameters of every particle
	Ctf(commands::ctf::Args),

	/// Print the Euler angles, shifts and rotation matrix of every particle
	Pose(commands::pose::Args),

	/// Rewrite a STAR file, optionally reordering its columns
	Rewrite(commands::rewrite::Args),

	/// Write the 2D CTF of one particle to an MRC file
	Ctfmap(commands::ctfmap::Args),

	/// List the particle images of a STAR or cs file
	Particles(commands::particles::Args),

	/// Estimate the background noise of a particle stack
	Noise(commands::noise::Args)
}


fn main() -> ExitCode {

	// parse arguments
	let args = Args::parse_args_default_or_exit();

	// read the config before logging starts, since it can set the log filter
	let config = Config::read(args.config.as_deref());
	let log = args.log.clone()
		.or_else(|| {
			config.as_ref()
				.ok()
				.and_then(|c| c.log.filter.clone())
		});

	// init logging
	let Ok(_) = logging::init(log.as_deref())
		.log_err()
		else { return ExitCode::FAILURE; };

	let Ok(config) = config
		.log_err()
		else { return ExitCode::FAILURE; };

	let Ok(_) = run(config, args)
		.log_err()
		else { return ExitCode::FAILURE; };

	// we finished! =)
	ExitCode::SUCCESS
}


#[tracing::instrument(skip_all, level = 5, name = "StarCtf")]
fn run(config: Config, args: Args) -> Result<()> {

	debug!("config: {:?}", config);

	match args.cmd {
		Some(Command::Ctf(ctf_args)) => commands::ctf::run(&config, ctf_args),
		Some(Command::Pose(pose_args)) => commands::pose::run(pose_args),
		Some(Command::Rewrite(rewrite_args)) => commands::rewrite::run(rewrite_args),
		Some(Command::Ctfmap(ctfmap_args)) => commands::ctfmap::run(&config, ctfmap_args),
		Some(Command::Particles(particles_args)) => commands::particles::run(&config, particles_args),
		Some(Command::Noise(noise_args)) => commands::noise::run(noise_args),
		None => bail!("No command, try one of:\n{}", Args::command_list().unwrap_or_default())
	}
}
