//! create-matlab-linker-stub CLI entry point.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use matlab_stub::{
    env_var_names, roots_from_env, Arch, Discovery, PackageOutcome, Packager, StubOptions,
    TarArchiver, ToolInspector, CORE_MATLAB_LIBS, DEFAULT_OUTDIR, DEFAULT_STUB_BASE_NAME,
};

/// Build linkable MATLAB stubs from every MATLAB root reachable from the given directories
#[derive(Parser, Debug)]
#[command(name = "create-matlab-linker-stub")]
#[command(
    long_about = "Build linkable MATLAB stubs from every MATLAB root reachable from the given directories.\n\n\
Each root found produces <name>-<arch>-<version>.tar.bz2 in the output directory, holding \
the headers, version metadata and the shared libraries needed to link MEX files.\n\n\
When no directories are given, MATLAB_ROOT, MATLAB_ROOTS and their _<ARCH> variants are read."
)]
#[command(version)]
struct Cli {
    /// Restrict to one or more architectures (glnxa64, win64) [default: all]
    #[arg(short = 'a', long, num_args = 1.., value_name = "ARCH")]
    archs: Vec<Arch>,

    /// Output directory for archive files
    #[arg(short = 'o', long, default_value = DEFAULT_OUTDIR, value_name = "DIR")]
    outdir: PathBuf,

    /// Overwrite existing stub archives
    #[arg(short = 'f', long)]
    force: bool,

    /// Additional library names from bin/<arch>/ to include (lib prefix and extension optional)
    #[arg(short = 'l', long, num_args = 1.., value_name = "NAME")]
    libs: Vec<String>,

    /// Stub base name for output archives
    #[arg(short = 'n', long, default_value = DEFAULT_STUB_BASE_NAME)]
    name: String,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// MATLAB root directories or parent directories of MATLAB roots
    #[arg(value_name = "MATLAB_ROOTS")]
    matlab_roots: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    debug!(version = env!("CARGO_PKG_VERSION"), "starting");

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "run aborted");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing subscriber.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "matlab_stub=debug,create_matlab_linker_stub=debug"
    } else {
        "matlab_stub=info,create_matlab_linker_stub=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut archs = if cli.archs.is_empty() {
        Arch::ALL.to_vec()
    } else {
        cli.archs
    };
    archs.sort();
    archs.dedup();

    let roots = if cli.matlab_roots.is_empty() {
        roots_from_env(&archs, |name| std::env::var(name).ok())
    } else {
        cli.matlab_roots
    };
    if roots.is_empty() {
        eprintln!(
            "Error: No matlab roots given on command line or in environment variables: {:?}",
            env_var_names(&archs)
        );
        return Ok(ExitCode::FAILURE);
    }

    let mut libs: Vec<String> = CORE_MATLAB_LIBS.iter().map(|s| s.to_string()).collect();
    libs.extend(cli.libs);

    println!("Matlab Roots: {roots:?}");
    println!("Linked Matlab Libs: {libs:?}");
    println!(
        "Matlab Archs: {:?}",
        archs.iter().map(Arch::as_str).collect::<Vec<_>>()
    );

    let options = StubOptions {
        outdir: cli.outdir,
        base_name: cli.name,
        force: cli.force,
        libs,
        archs,
    };
    let packager = Packager::new(&options, &ToolInspector, &TarArchiver);

    let mut discovery = Discovery::new();
    let mut discovered = 0usize;
    let mut selected = 0usize;
    let mut failed = 0usize;

    for item in discovery.roots(roots.iter()) {
        // An unreadable marker, an unknown version or an unsupported
        // architecture aborts the whole run.
        let root = item?;
        discovered += 1;

        match packager.package(&root) {
            Ok(PackageOutcome::Excluded(arch)) => {
                info!(%arch, root = %root.path.display(), "architecture not selected, skipping");
                continue;
            }
            Ok(PackageOutcome::Written(path)) => {
                println!(
                    "Resolved MATLAB [{}] {}({}): {}",
                    root.arch,
                    root.release,
                    root.version,
                    root.path.display()
                );
                println!("   * Archived --> {}", path.display());
            }
            Ok(PackageOutcome::Skipped(path)) => {
                println!(
                    "File exists. Unable to make archive [--force to override]: {}",
                    path.display()
                );
            }
            Err(e) => {
                error!(root = %root.path.display(), error = %e, "packaging failed");
                eprintln!("Error: {}: {e:#}", root.path.display());
                failed += 1;
            }
        }
        selected += 1;
    }

    if discovered == 0 {
        eprintln!("Error: No matlab roots found under: {roots:?}");
        return Ok(ExitCode::FAILURE);
    }
    if selected == 0 {
        eprintln!(
            "Error: Found {discovered} matlab root(s), none for the selected archs: {:?}",
            options.archs.iter().map(Arch::as_str).collect::<Vec<_>>()
        );
        return Ok(ExitCode::FAILURE);
    }
    if failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
