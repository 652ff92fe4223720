//! # vmbind - Probe Entry Point
//!
//! Runs the agent's resolution pass against a runtime image and prints
//! which capabilities would bind:
//! - **Live** (`--pid <PID>`): image and load base from `/proc/<pid>/maps`
//! - **On disk** (`--image <PATH>`): link-time addresses, or `--base`

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use vmbind::cli::Args;
use vmbind::export::AttachReport;
use vmbind::preflight::{check_proc_access, run_preflight_checks};
use vmbind::registry::{ResolveOptions, Resolution};
use vmbind::resolution::{AmbiguityPolicy, HOTSPOT};
use vmbind::symbolization::{locate_in_process, LoadedImage, SymbolSource};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(true) => EXIT_SUCCESS,
        Ok(false) => EXIT_ERROR,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = err.to_string().to_lowercase();
    if msg.contains("permission denied") {
        EXIT_NOPERM
    } else if msg.contains("missing required argument") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

/// Resolve the image to probe from CLI arguments.
fn resolve_image(args: &Args) -> Result<LoadedImage> {
    if let Some(pid) = args.pid {
        check_proc_access(pid)?;
        return locate_in_process(pid, &args.library);
    }

    if let Some(ref path) = args.image {
        let path = std::fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve path: {}", path.display()))?;
        return Ok(match args.base {
            Some(base) => LoadedImage::mapped_at(path, base),
            None => LoadedImage::on_disk(path),
        });
    }

    anyhow::bail!(
        "Missing required argument: --pid or --image\n\n\
         Usage:\n  \
         vmbind --pid 1234              Probe a live JVM\n  \
         vmbind --image libjvm.so       Probe an image on disk\n\n\
         Run 'vmbind --help' for more options"
    )
}

/// Returns whether every mandatory capability bound.
fn run() -> Result<bool> {
    let args = Args::parse();
    let image = resolve_image(&args)?;
    run_preflight_checks(&image.path, args.quiet)?;

    let options = ResolveOptions {
        collector_hint: args.collector,
        ambiguity: if args.strict_collector {
            AmbiguityPolicy::Strict
        } else {
            AmbiguityPolicy::ByPriority
        },
    };

    let name = image.describe();
    let resolution = image.load_symbols().and_then(|table| {
        info!("Indexed {} symbols ({})", table.len(), table.pointer_width());
        Resolution::run(&table, &HOTSPOT, options)
    });
    let report = match resolution {
        Ok(resolution) => {
            if !args.quiet {
                warn_outside_image(&image, &resolution);
            }
            AttachReport::from_resolution(name, &resolution)
        }
        Err(e) => AttachReport::from_error(name, &e),
    };

    if args.json {
        report.write_json(std::io::stdout().lock())?;
    } else {
        println!("{report}");
    }
    Ok(report.ready)
}

/// Flag bindings that fall outside the mapped image, a sign of a wrong base
fn warn_outside_image(image: &LoadedImage, resolution: &Resolution) {
    let Some(range) = image.range else {
        return;
    };
    if range.start == range.end {
        // Base given by hand, extent unknown
        return;
    }
    for outcome in &resolution.outcomes {
        if let Ok(bound) = &outcome.result {
            if !image.contains(bound.address()) {
                eprintln!(
                    "warning: {} resolved to {} outside the mapped image",
                    outcome.capability,
                    bound.address()
                );
            }
        }
    }
}
