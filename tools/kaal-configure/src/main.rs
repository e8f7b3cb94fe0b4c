//! kaal-configure - container configuration for KaaL builds
//!
//! Commands:
//! - `kaal-configure validate <manifest>` - Check a container manifest
//! - `kaal-configure generate` - Write config header, capability lists and snapshot
//! - `kaal-configure show` - Print the current configuration
//!
//! Paths default to `kaal-config.toml` settings, then to the build layout
//! (`build/kconfig.h`, `include/l4/config.h`, `build/cinfo.c`,
//! `build/configdata.toml`).

mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use kaal_config::caps::synthesize;
use kaal_config::manifest::ContainerRecord;
use kaal_config::{Configuration, Platform, Snapshot};

use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "kaal-configure")]
#[command(version)]
#[command(
    about = "Validate container manifests and generate the kernel configuration",
    long_about = None
)]
struct Cli {
    /// Settings file (default: ./kaal-config.toml when present)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a container manifest
    Validate {
        /// Manifest path
        manifest: Option<PathBuf>,

        /// Print nothing on success
        #[arg(short, long)]
        quiet: bool,
    },

    /// Generate config header, capability lists and snapshot
    Generate {
        /// Manifest path
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Kernel feature header
        #[arg(short, long)]
        kconfig: Option<PathBuf>,

        /// Output configuration header
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output capability list source
        #[arg(long)]
        cinfo: Option<PathBuf>,

        /// Output snapshot
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Show the configuration from a snapshot, or from a fresh run
    Show {
        /// Snapshot to read
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Run the pipeline on this manifest instead of reading a snapshot
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Kernel feature header (with --manifest)
        #[arg(short, long)]
        kconfig: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.settings.as_deref())?;

    match cli.command {
        Commands::Validate { manifest, quiet } => {
            validate_manifest(settings.manifest(manifest)?, quiet)?;
        }

        Commands::Generate {
            manifest,
            kconfig,
            output,
            cinfo,
            snapshot,
        } => {
            let outputs = Outputs {
                header: settings.header(output),
                cinfo: settings.cinfo(cinfo),
                snapshot: settings.snapshot(snapshot),
            };
            generate(settings.manifest(manifest)?, settings.kconfig(kconfig), &outputs)?;
        }

        Commands::Show {
            snapshot,
            manifest,
            kconfig,
        } => {
            let snapshot = match manifest {
                Some(manifest) => build(&manifest, &settings.kconfig(kconfig))?.snapshot(),
                None => {
                    let path = settings.snapshot(snapshot);
                    Snapshot::load(&path).with_context(|| {
                        format!("No usable snapshot at {} (run 'generate' first)", path.display())
                    })?
                }
            };
            show(&snapshot);
        }
    }

    Ok(())
}

fn validate_manifest(path: PathBuf, quiet: bool) -> Result<()> {
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let tree = kaal_config::parse(&text)?;
    let manifest = kaal_config::validate(&tree)?;

    if quiet {
        return Ok(());
    }

    println!(
        "{} Manifest valid: {} container(s)",
        "✅".green(),
        manifest.containers.len()
    );
    for container in &manifest.containers {
        println!("  {}", describe(container));
    }
    Ok(())
}

struct Outputs {
    header: PathBuf,
    cinfo: PathBuf,
    snapshot: PathBuf,
}

fn build(manifest: &Path, kconfig: &Path) -> Result<Configuration> {
    log::info!("Loading kernel features from {}", kconfig.display());
    log::info!("Loading container manifest from {}", manifest.display());
    Ok(Configuration::load(kconfig, manifest)?)
}

fn generate(manifest: PathBuf, kconfig: PathBuf, outputs: &Outputs) -> Result<()> {
    println!("{} Generating configuration...", "🔨".green());

    let config = build(&manifest, &kconfig)?;
    log::info!(
        "  {} container(s), {} symbols",
        config.containers().len(),
        config.symbols.len()
    );

    config.write_header(&outputs.header)?;
    log::info!("Configuration header written to {}", outputs.header.display());

    config.write_cinfo(&outputs.cinfo)?;
    log::info!("Capability lists written to {}", outputs.cinfo.display());

    config.snapshot().save(&outputs.snapshot)?;
    log::info!("Snapshot written to {}", outputs.snapshot.display());

    println!("{} Configuration complete: {}", "✅".green(), outputs.header.display());
    Ok(())
}

fn show(snapshot: &Snapshot) {
    show_platform(&snapshot.platform);

    for container in &snapshot.containers {
        println!("\n{}", format!("Container {}", container.id).bold());
        println!("------------");
        println!("Type:               {}", container.container_type);
        println!("Name:               {}", container.name);
        if let Some(project) = container.project {
            println!("Project:            {}", project.name());
        }
        println!("Pager LMA:          {:#x}", container.pager.lma);
        println!("Pager VMA:          {:#x}", container.pager.vma);
        if let Some(regions) = &container.pager_regions {
            let spans = [
                ("shm", regions.shm),
                ("task", regions.task),
                ("utcb", regions.utcb),
            ];
            for (label, span) in spans {
                println!("Pager {:<5} region: {:#x} - {:#x}", label, span.start, span.end);
            }
        }
        for region in &container.physical {
            println!("Physical region:    {:#x} - {:#x}", region.start, region.end);
        }
        for region in &container.virtual_regions {
            println!("Virtual region:     {:#x} - {:#x}", region.start, region.end);
        }

        let lists = synthesize(container);
        let pager: Vec<_> = lists.pager.iter().map(|d| d.kind.name()).collect();
        let own: Vec<_> = lists.container.iter().map(|d| d.kind.name()).collect();
        println!("Pager capabilities: {}", pager.join(", "));
        if !own.is_empty() {
            println!("Capabilities:       {}", own.join(", "));
        }
        if !container.devices.is_empty() {
            println!("Devices:            {}", container.devices.join(", "));
        }
    }

    println!("\n{} symbols", snapshot.symbols.len());
}

fn show_platform(platform: &Platform) {
    println!("{}", "KaaL Configuration".bold().green());
    println!("Arch:               {} ({})", platform.arch, platform.subarch);
    println!("Platform:           {}", platform.platform);
    println!("CPU:                {}", platform.cpu);
    if let Some(flag) = &platform.gcc_arch_flag {
        println!("gcc -march:         {}", flag);
    }
    if let Some(toolchain) = &platform.toolchain_kernel {
        println!("Kernel toolchain:   {}", toolchain);
    }
    if let Some(toolchain) = &platform.toolchain_userspace {
        println!("User toolchain:     {}", toolchain);
    }
    if platform.smp {
        println!("SMP:                {} CPUs", platform.ncpu);
    }
}

fn describe(container: &ContainerRecord) -> String {
    let mut line = format!(
        "[{}] {} ({}",
        container.id, container.name, container.container_type
    );
    if let Some(project) = container.project {
        line.push_str(&format!(", project {}", project.name()));
    }
    line.push_str(&format!(
        ", {} physical / {} virtual region(s))",
        container.physical.len(),
        container.virtual_regions.len()
    ));
    line
}
