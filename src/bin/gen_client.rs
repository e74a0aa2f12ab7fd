use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use pve_apigen::codegen::{generate, write_atomic};
use pve_apigen::config::GenConfig;
use pve_apigen::tree::ResourceTree;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = Command::new("gen_client")
        .about("Generate a typed Rust client from the Proxmox VE API descriptor")
        .arg(Arg::new("schema").long("schema").required(true))
        .arg(Arg::new("out").long("out").required_unless_present("dry-run"))
        .arg(Arg::new("config").long("config").help("YAML generator config"))
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Print generated code instead of writing it"),
        )
        .get_matches();

    let schema_path = matches
        .get_one::<String>("schema")
        .context("schema path missing")?;
    let config = match matches.get_one::<String>("config") {
        Some(path) => GenConfig::load(Path::new(path))?,
        None => GenConfig::default(),
    };

    let raw = fs::read_to_string(schema_path)
        .with_context(|| format!("read schema {}", schema_path))?;
    let tree = ResourceTree::from_text(&raw).context("parse api descriptor")?;
    let code = generate(&tree, &config)?;

    if matches.get_flag("dry-run") {
        print!("{code}");
        return Ok(());
    }

    let out_path = matches.get_one::<String>("out").context("out path missing")?;
    write_atomic(Path::new(out_path), &code)?;
    tracing::info!(path = %out_path, resources = tree.len(), "wrote client");
    Ok(())
}
