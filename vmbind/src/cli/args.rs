//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::domain::CollectorVariant;

#[derive(Parser, Debug)]
#[command(
    name = "vmbind",
    about = "Resolve HotSpot internal entry points and report what an agent could bind",
    after_help = "\
EXAMPLES:
    vmbind --pid 1234                              Probe libjvm.so mapped in a live JVM
    vmbind --image $JAVA_HOME/lib/server/libjvm.so Probe an image on disk
    vmbind --pid 1234 --json > report.json         Machine-readable report"
)]
pub struct Args {
    /// JVM process to probe (image path and load base read from /proc)
    #[arg(short, long, conflicts_with = "image")]
    pub pid: Option<i32>,

    /// Runtime image on disk
    #[arg(short, long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    /// Load base of --image, in hex (default: link-time addresses)
    #[arg(long, value_name = "HEX", requires = "image", value_parser = parse_hex)]
    pub base: Option<u64>,

    /// Runtime library file name prefix to look for with --pid
    #[arg(long, default_value = crate::registry::DEFAULT_LIBRARY)]
    pub library: String,

    /// Active collector, when known (parallel, shared-heap, other)
    #[arg(long, value_name = "VARIANT")]
    pub collector: Option<CollectorVariant>,

    /// Fail when more than one collector signature is present
    #[arg(long)]
    pub strict_collector: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_hex(s: &str) -> Result<u64, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid hex address '{s}': {e}"))
}
