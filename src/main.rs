mod args;
mod dash;

use clap::Parser;
use log::{debug, error, info};
use snafu::ErrorCompat;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    debug!("args: {:?}", args);

    let config_path = match args.config {
        Some(p) => p,
        None => {
            error!("No configuration file given, see --help");
            std::process::exit(2);
        }
    };

    let res = dash::run_dashboard(config_path, args.reference, args.out, args.interactive);

    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        if let Some(backtrace) = ErrorCompat::backtrace(&e) {
            eprintln!("{}", backtrace);
        }
        std::process::exit(1);
    }
    info!("done");
}
