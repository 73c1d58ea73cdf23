use clap::Parser;
use dockitems::{dock, LogDiagnostics, MountedVolume, OutputFormat, OutputParams};
use std::path::PathBuf;

/// Extract the Dock items of every user on a mounted macOS volume
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Root of the mounted volume (the directory containing `Users`)
    root: PathBuf,

    /// Directory receiving the output files
    #[arg(short, long, default_value = "dockitems-output")]
    output: PathBuf,

    /// Output format, may be repeated (csv, sqlite)
    #[arg(short, long = "format", default_value = "csv")]
    formats: Vec<OutputFormat>,

    /// Copy every parsed plist into this directory
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .parse_default_env()
        .init();

    let mut volume = MountedVolume::open(&args.root, LogDiagnostics)?;
    if let Some(export) = &args.export {
        volume = volume.export_to(export);
    }

    let params = OutputParams::new(&args.output).formats(args.formats);
    let mut writer = params.open_writer()?;

    let rows = dock::run(&volume, &mut writer, &LogDiagnostics)?;
    println!("Wrote {} dock items to {}", rows, args.output.display());
    Ok(())
}
