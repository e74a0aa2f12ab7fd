use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command};
use pve_apigen::client::{Client, Params, Verb};
use pve_apigen::error::ClientError;
use pve_apigen::explorer;
use pve_apigen::http::HttpTransport;
use pve_apigen::locate::{bind_keys, locate};
use pve_apigen::tree::{NodeId, ResourceTree};
use serde_json::{Value, json};
use std::{env, fs, io::Write};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let matches = build_cli().get_matches();
    let tree = load_tree(matches.get_one::<String>("schema"))?;

    match matches.subcommand() {
        Some(("ls", sub)) => handle_ls(&tree, sub),
        Some(("usage", sub)) => handle_usage(&tree, sub),
        Some(("tree", sub)) => handle_tree(&tree, sub),
        Some(("call", sub)) => handle_call(&tree, sub, matches.get_flag("pretty")),
        _ => Err(anyhow!("command required")),
    }
}

fn build_cli() -> Command {
    Command::new("pve")
        .about("Proxmox VE API explorer (schema-powered)")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("schema")
                .long("schema")
                .global(true)
                .value_name("PATH")
                .help("API descriptor (apidoc.js or JSON); defaults to $PVE_SCHEMA"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Pretty-print JSON output"),
        )
        .subcommand(
            Command::new("ls")
                .about("List child resources of a path")
                .arg(Arg::new("path").default_value("/"))
                .arg(
                    Arg::new("remote")
                        .long("remote")
                        .action(ArgAction::SetTrue)
                        .help("Resolve placeholder children through a GET on the server"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Emit machine-readable JSON"),
                ),
        )
        .subcommand(
            Command::new("usage")
                .about("Show usage for the methods of a path")
                .arg(Arg::new("path").required(true))
                .arg(
                    Arg::new("verb")
                        .long("verb")
                        .value_name("METHOD")
                        .help("Only this HTTP method"),
                )
                .arg(
                    Arg::new("verbose")
                        .long("verbose")
                        .short('v')
                        .action(ArgAction::SetTrue)
                        .help("Describe parameters and returned fields"),
                ),
        )
        .subcommand(
            Command::new("tree").about("Show the full resource tree").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Emit machine-readable JSON"),
            ),
        )
        .subcommand(
            Command::new("call")
                .about("Call a resource method")
                .arg(Arg::new("method").required(true))
                .arg(Arg::new("path").required(true))
                .arg(
                    Arg::new("render")
                        .long("render")
                        .action(ArgAction::SetTrue)
                        .help("Format returned fields using their renderer hints"),
                )
                .arg(
                    Arg::new("param")
                        .action(ArgAction::Append)
                        .value_name("KEY=VALUE")
                        .help("Request parameter (repeatable)"),
                ),
        )
}

fn load_tree(schema: Option<&String>) -> Result<ResourceTree> {
    let path = match schema {
        Some(path) => path.clone(),
        None => env::var("PVE_SCHEMA").context("--schema or PVE_SCHEMA required")?,
    };
    let raw = fs::read_to_string(&path).with_context(|| format!("read schema {path}"))?;
    ResourceTree::from_text(&raw).with_context(|| format!("load schema {path}"))
}

fn resolve(tree: &ResourceTree, path: &str) -> Result<NodeId> {
    locate(tree, path).ok_or_else(|| anyhow!("unknown resource {path}"))
}

fn handle_ls(tree: &ResourceTree, matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("path")
        .ok_or_else(|| anyhow!("path required"))?;
    let id = resolve(tree, path)?;

    if matches.get_flag("json") {
        let out: Vec<Value> = tree
            .children(id)
            .map(|(_, child)| {
                json!({
                    "name": child.name,
                    "path": child.resource_path,
                    "flags": explorer::child_flags(child),
                })
            })
            .collect();
        write_stdout_line(&serde_json::to_string_pretty(&out)?)?;
        return Ok(());
    }

    let lines = if matches.get_flag("remote") && tree.node(id).has_method(Verb::Get) {
        let client = connect()?;
        let result = client.execute(Verb::Get, path, Params::new())?;
        explorer::list_values(tree, id, &result)
    } else {
        explorer::list_children(tree, id)
    };
    for line in lines {
        write_stdout_line(&line)?;
    }
    Ok(())
}

fn handle_usage(tree: &ResourceTree, matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("path")
        .ok_or_else(|| anyhow!("path required"))?;
    let verbose = matches.get_flag("verbose");
    let id = resolve(tree, path)?;

    let blocks = match matches.get_one::<String>("verb") {
        Some(verb) => {
            let verb: Verb = verb.parse()?;
            let usage = explorer::usage(tree, id, verb, verbose).ok_or_else(|| {
                ClientError::UnsupportedVerb {
                    verb: verb.to_string(),
                    path: tree.node(id).resource_path.clone(),
                }
            })?;
            vec![usage]
        }
        None => explorer::usage_all(tree, id, verbose),
    };

    if blocks.is_empty() {
        return Err(anyhow!("no methods on {path}"));
    }
    let separator = if verbose { "\n\n" } else { "\n" };
    write_stdout_line(&blocks.join(separator))
}

fn handle_tree(tree: &ResourceTree, matches: &ArgMatches) -> Result<()> {
    if matches.get_flag("json") {
        write_stdout_line(&serde_json::to_string_pretty(tree)?)?;
        return Ok(());
    }

    for id in tree.descendants(tree.root()) {
        let node = tree.node(id);
        let verbs: Vec<&str> = node.methods.iter().map(|m| m.verb.as_str()).collect();
        if verbs.is_empty() {
            write_stdout_line(&node.resource_path)?;
        } else {
            write_stdout_line(&format!("{} ({})", node.resource_path, verbs.join(", ")))?;
        }
    }
    Ok(())
}

fn handle_call(tree: &ResourceTree, matches: &ArgMatches, pretty: bool) -> Result<()> {
    let verb: Verb = matches
        .get_one::<String>("method")
        .ok_or_else(|| anyhow!("method required"))?
        .parse()?;
    let path = matches
        .get_one::<String>("path")
        .ok_or_else(|| anyhow!("path required"))?;

    let id = resolve(tree, path)?;
    let node = tree.node(id);
    let method = node.method(verb).ok_or_else(|| ClientError::UnsupportedVerb {
        verb: verb.to_string(),
        path: node.resource_path.clone(),
    })?;

    let keys = bind_keys(tree, path).unwrap_or_default();
    let mut params = Params::new();
    if let Some(values) = matches.get_many::<String>("param") {
        for value in values {
            let (k, v) = split_key_value(value)
                .ok_or_else(|| anyhow!("invalid parameter '{value}', expected KEY=VALUE"))?;
            params.set(k, v);
        }
    }
    for param in method.required_parameters() {
        let bound = keys.iter().any(|(key, _)| key == &param.wire_name);
        let supplied = if param.is_indexed_family {
            params.has_family(&param.wire_name)
        } else {
            params.get(&param.wire_name).is_some()
        };
        if !bound && !supplied {
            return Err(ClientError::MissingParameter(param.wire_name.clone()).into());
        }
    }

    let client = connect()?;
    let result = client.execute(verb, path, params)?;
    if matches.get_flag("render") {
        return write_json_output(explorer::render_result(method, &result), pretty);
    }
    write_json_output(result, pretty)
}

fn connect() -> Result<Client> {
    let host = env::var("PVE_HOST").context("PVE_HOST missing")?;
    let token = env::var("PVE_API_TOKEN").context("PVE_API_TOKEN missing")?;
    Ok(Client::new(HttpTransport::new(host, token)?))
}

fn split_key_value(value: &str) -> Option<(&str, &str)> {
    if let Some((k, v)) = value.split_once('=') {
        return Some((k, v));
    }
    if let Some((k, v)) = value.split_once(':') {
        return Some((k, v));
    }
    None
}

fn write_json_output(value: Value, pretty: bool) -> Result<()> {
    if pretty {
        write_stdout_line(&serde_json::to_string_pretty(&value)?)?;
    } else {
        write_stdout_line(&serde_json::to_string(&value)?)?;
    }
    Ok(())
}

fn write_stdout_line(line: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(line.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}
