use argh::FromArgs;
use std::path::PathBuf;

use cv_stereonet::{config::Params, io, pipeline::StereoNetwork};

#[derive(FromArgs)]
/// Predict and evaluate stereo disparity for remote sensing tiles
struct Args {
    #[argh(subcommand)]
    command: Command,

    /// path to a JSON parameter file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Predict(PredictArgs),
    Evaluate(EvaluateArgs)
}

#[derive(FromArgs)]
#[argh(subcommand, name = "predict")]
/// Estimate a disparity raster for every left/right pair
struct PredictArgs {
    /// directory of left images
    #[argh(option, short = 'l')]
    left: PathBuf,

    /// directory of right images
    #[argh(option, short = 'r')]
    right: PathBuf,

    /// output directory
    #[argh(option, short = 'o', default = "PathBuf::from(\"prediction\")")]
    output: PathBuf
}

#[derive(FromArgs)]
#[argh(subcommand, name = "evaluate")]
/// Compute EPE and D1 of estimated rasters against ground truth
struct EvaluateArgs {
    /// directory of estimated rasters
    #[argh(option, short = 'e', default = "PathBuf::from(\"prediction\")")]
    estimates: PathBuf,

    /// directory of ground truth rasters
    #[argh(option, short = 'g')]
    ground_truth: PathBuf,

    /// where to draw the per tile chart (statistics feature only)
    #[argh(option)]
    plot: Option<PathBuf>
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    let params = match &args.config {
        Some(path) => Params::from_file(path)?,
        None => Params::default()
    };
    log::debug!("Parameters: {:?}", params);

    match args.command {
        Command::Predict(cmd) => {
            let net = StereoNetwork::classical(&params);
            let written = io::predict_dir(&net, &cmd.left, &cmd.right, &cmd.output, &params)?;
            println!("Wrote {} disparity maps to {:?}", written.len(), cmd.output);
        }
        Command::Evaluate(cmd) => {
            let reports = io::evaluate_dir(&cmd.estimates, &cmd.ground_truth, &params)?;

            for report in &reports {
                println!("Tile: {}, EPE: {:.6}, D1: {:.6}", report.tile, report.epe, report.d1);
            }

            if let Some(plot) = cmd.plot {
                #[cfg(feature = "statistics")]
                {
                    if let Some(parent) = plot.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    cv_stereonet::statistics::plot_reports(&reports, &plot)?;
                }

                #[cfg(not(feature = "statistics"))]
                log::warn!("Built without the statistics feature, not plotting to {:?}", plot);
            }
        }
    }

    Ok(())
}
