use clap::Parser;
use dockitems::time::{convert, local_time_from_utc};
use dockitems::{EpochKind, LogDiagnostics, Timestamp};

/// Convert raw Mac timestamps to UTC
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Epoch kind: hfs, mac-absolute, apfs or unix
    kind: EpochKind,

    /// Raw values, as found in the artifact
    #[arg(required = true)]
    values: Vec<String>,

    /// Also print the time in the local time zone
    #[arg(short, long)]
    local: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    for value in &args.values {
        let ts = convert(args.kind, value.as_str(), &LogDiagnostics);
        match ts {
            Timestamp::Unavailable => println!("{:>24}  <unavailable>", value),
            Timestamp::Utc(utc) if args.local => {
                let local = local_time_from_utc(&utc)
                    .map(|l| l.to_string())
                    .unwrap_or_default();
                println!("{:>24}  {}  {}", value, utc, local);
            }
            Timestamp::Utc(utc) => println!("{:>24}  {}", value, utc),
        }
    }
}
