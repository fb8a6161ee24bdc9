// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn package_arg(help: &'static str) -> Arg {
    Arg::new("package").required(true).help(help)
}

fn build_cli() -> Command {
    Command::new("fig")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Fig Contributors")
        .about("Package repository client with atomic installs and rollback")
        .subcommand_required(false)
        .arg(
            Arg::new("home")
                .long("home")
                .value_name("PATH")
                .env("FIG_HOME")
                .help("Local repository root (default: ~/.fighome)"),
        )
        .arg(
            Arg::new("remote")
                .long("remote")
                .value_name("URL")
                .env("FIG_REMOTE_URL")
                .help("Remote repository URL or path"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .value_name("USER")
                .env("FIG_REMOTE_USER")
                .help("User for uploads to the remote repository"),
        )
        .subcommand(
            Command::new("list").about("List installed packages").arg(
                Arg::new("json")
                    .long("json")
                    .action(clap::ArgAction::SetTrue)
                    .help("Print as JSON"),
            ),
        )
        .subcommand(
            Command::new("publish")
                .about("Publish a package to the remote repository and install it locally")
                .arg(package_arg("Package to publish (name/version)"))
                .arg(
                    Arg::new("file")
                        .short('f')
                        .long("file")
                        .default_value("package.fig")
                        .help("Descriptor to publish"),
                ),
        )
        .subcommand(
            Command::new("install")
                .about("Sync a package from the remote repository if it changed")
                .arg(package_arg("Package to install (name/version)")),
        )
        .subcommand(
            Command::new("reinstall")
                .about("Reinstall a package from its local descriptor")
                .arg(package_arg("Package to reinstall (name/version)")),
        )
        .subcommand(
            Command::new("show")
                .about("Show a package descriptor")
                .arg(package_arg("Package to show (name/version)"))
                .arg(
                    Arg::new("remote")
                        .long("remote")
                        .action(clap::ArgAction::SetTrue)
                        .help("Read the descriptor from the remote repository without installing"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(clap::ArgAction::SetTrue)
                        .help("Print as JSON"),
                ),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove an installed package")
                .arg(package_arg("Package to remove (name/version)")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("fig.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
