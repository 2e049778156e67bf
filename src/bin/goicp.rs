//! Command-line front end for point cloud registration with the Go-ICP
//! algorithm.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;

use go_icp::{config::ConfigMap, pointcloud, GoIcp, Result};

/// Globally optimal rigid 3D point cloud registration.
#[derive(Parser, Debug)]
#[command(name = "goicp", version, about)]
struct Args {
    /// Model (reference) point cloud file.
    #[arg(default_value = "model.txt")]
    model: PathBuf,

    /// Data point cloud file to register against the model.
    #[arg(default_value = "data.txt")]
    data: PathBuf,

    /// Use only the first N data points (0 disables downsampling; assumes
    /// the data points are stored in random order).
    #[arg(default_value_t = 0)]
    nd_downsampled: usize,

    /// Config file of `key value` registration parameters.
    #[arg(default_value = "config.txt")]
    config: PathBuf,

    /// Where to write the elapsed time, rotation matrix and translation
    /// vector.
    #[arg(default_value = "output.txt")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("model file: {}", args.model.display());
    info!("data file: {}", args.data.display());
    info!("Nd downsampled: {}", args.nd_downsampled);
    info!("config file: {}", args.config.display());
    info!("output file: {}", args.output.display());

    let config = ConfigMap::load(&args.config)?;
    println!("CONFIG:");
    config.print();
    println!();
    let registration_config = config.to_registration_config();

    let model = pointcloud::load(&args.model)?;
    let mut data = pointcloud::load(&args.data)?;

    if args.nd_downsampled > 0 && args.nd_downsampled < data.len() {
        data.truncate(args.nd_downsampled);
    }

    println!(
        "Model ID: {} ({}), Data ID: {} ({})",
        args.model.display(),
        model.len(),
        args.data.display(),
        data.len()
    );

    println!("Building Distance Transform...");
    let build_start = Instant::now();
    let mut goicp = GoIcp::new(model, data, &registration_config);
    println!("{:.3}s", build_start.elapsed().as_secs_f64());

    println!("Registering...");
    let register_start = Instant::now();
    let outcome = goicp.register();
    let elapsed = register_start.elapsed().as_secs_f64();

    println!("Optimal Rotation Matrix:\n{}", outcome.opt_r);
    println!("Optimal Translation Vector:\n{}", outcome.opt_t);
    println!("Finished in {elapsed}");

    let report = format!(
        "{}\n{}\n{}\n",
        elapsed, outcome.opt_r, outcome.opt_t
    );
    std::fs::write(&args.output, report).map_err(|source| go_icp::GoIcpError::Io {
        path: args.output.clone(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_arguments_resolve_to_documented_defaults() {
        let args = Args::parse_from(["goicp"]);
        assert_eq!(args.model, PathBuf::from("model.txt"));
        assert_eq!(args.data, PathBuf::from("data.txt"));
        assert_eq!(args.nd_downsampled, 0);
        assert_eq!(args.config, PathBuf::from("config.txt"));
        assert_eq!(args.output, PathBuf::from("output.txt"));
    }

    #[test]
    fn positional_arguments_override_defaults() {
        let args = Args::parse_from(["goicp", "m.txt", "d.txt", "50", "c.txt", "o.txt"]);
        assert_eq!(args.model, PathBuf::from("m.txt"));
        assert_eq!(args.data, PathBuf::from("d.txt"));
        assert_eq!(args.nd_downsampled, 50);
        assert_eq!(args.config, PathBuf::from("c.txt"));
        assert_eq!(args.output, PathBuf::from("o.txt"));
    }
}
