// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fig::{PackageIdentity, Repository, RepositoryConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "fig")]
#[command(author, version, about = "Package repository client with atomic installs and rollback", long_about = None)]
struct Cli {
    /// Local repository root (default: ~/.fighome)
    #[arg(long, env = "FIG_HOME", global = true)]
    home: Option<PathBuf>,

    /// Remote repository URL or path
    #[arg(long, env = "FIG_REMOTE_URL", global = true)]
    remote: Option<String>,

    /// User for uploads to the remote repository
    #[arg(long, env = "FIG_REMOTE_USER", global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List installed packages
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Publish a package to the remote repository and install it locally
    Publish {
        /// Package to publish (name/version)
        package: PackageIdentity,
        /// Descriptor to publish
        #[arg(short, long, default_value = "package.fig")]
        file: PathBuf,
    },
    /// Sync a package from the remote repository if it changed
    Install {
        /// Package to install (name/version)
        package: PackageIdentity,
    },
    /// Reinstall a package from its local descriptor
    Reinstall {
        /// Package to reinstall (name/version)
        package: PackageIdentity,
    },
    /// Show a package descriptor
    Show {
        /// Package to show (name/version)
        package: PackageIdentity,
        /// Read the descriptor from the remote repository without installing
        #[arg(long)]
        remote: bool,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an installed package
    Remove {
        /// Package to remove (name/version)
        package: PackageIdentity,
    },
}

fn default_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".fighome"))
        .unwrap_or_else(|| PathBuf::from(".fighome"))
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = RepositoryConfig::new(cli.home.unwrap_or_else(default_home));
    config.remote_url = cli.remote;
    config.remote_user = cli.user;
    info!("Using local repository {}", config.local_root.display());

    let repo = Repository::open(config)?;

    match cli.command {
        Some(Commands::List { json }) => {
            let packages = repo.list_packages()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&packages)?);
            } else if packages.is_empty() {
                println!("No packages found.");
            } else {
                for package in &packages {
                    println!("{}", package);
                }
                println!("\nTotal: {} package(s)", packages.len());
            }
            Ok(())
        }
        Some(Commands::Publish { package, file }) => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read descriptor {}", file.display()))?;
            let statements = fig::Parser::new().parse_statements(&package, &content)?;

            info!("Publishing {} ({} statements)", package, statements.len());
            repo.publish_package(&statements, &package)?;

            println!("Published package: {}", package);
            println!("  Installed to: {}", repo.local_dir_for_package(&package).display());
            Ok(())
        }
        Some(Commands::Install { package }) => {
            let loaded = repo.load_package(&package)?;
            println!("Installed package: {}", loaded.identity);
            println!("  Archives: {}", loaded.archive_urls().len());
            println!("  Resources: {}", loaded.resource_urls().len());
            Ok(())
        }
        Some(Commands::Reinstall { package }) => {
            repo.install_package(&package)?;
            println!("Reinstalled package: {}", package);
            Ok(())
        }
        Some(Commands::Show {
            package,
            remote,
            json,
        }) => {
            let loaded = if remote {
                repo.read_remote_package(&package)?
            } else {
                repo.read_local_package(&package)?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&loaded)?);
            } else {
                println!("{}", loaded.unparse());
            }
            Ok(())
        }
        Some(Commands::Remove { package }) => {
            repo.remove_package(&package)?;
            println!("Removed package: {}", package);
            Ok(())
        }
        None => {
            println!("Fig Package Repository v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'fig --help' for usage information");
            Ok(())
        }
    }
}
