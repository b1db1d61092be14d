use std::{path::PathBuf, time::Duration};

use bevy::app::ScheduleRunnerPlugin;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mimir::prelude::*;

/// Runs the decision core of a soccer robot.
#[derive(Parser, Debug)]
#[clap(about = "Runs the decision core of a soccer robot")]
struct Args {
    /// Directory containing the main config files.
    #[clap(long, default_value = "mimir/config")]
    config: PathBuf,
    /// Name of the robot, selects the player number and the config overlay.
    #[clap(long)]
    robot: String,
    /// Number of cycles per second.
    #[clap(long, default_value_t = 83)]
    frame_rate: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    miette::set_panic_hook();

    let args = Args::parse();
    if args.frame_rate == 0 {
        return Err(miette::miette!("the frame rate has to be at least one cycle per second"));
    }
    let cycle = Duration::from_secs(1) / args.frame_rate;
    tracing::info!(robot = %args.robot, ?cycle, "starting");

    let exit = App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(cycle)))
        .add_plugins(ConfigPlugin {
            main_dir: args.config,
            robot: args.robot,
        })
        .add_plugins((InterfacePlugins, BehaviorPlugins))
        .run();

    match exit {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => Err(miette::miette!("decision core exited with code {code}")),
    }
}
