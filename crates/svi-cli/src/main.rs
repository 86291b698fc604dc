//! `svi` - prepare datasets and resolve selections against a JSON host fixture

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::path::PathBuf;
use svi_core::slug::{normalize, sanitize};
use svi_engine::{Engine, EngineConfig, FilterQuery, MatchKind, MemoryHost, ProductId};
use tracing_subscriber::EnvFilter;

fn fixture_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("fixture")
                .long("fixture")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON host fixture"),
        )
        .arg(
            Arg::new("product")
                .long("product")
                .required(true)
                .value_parser(value_parser!(u64))
                .help("Displayed product id"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration (TOML)"),
        )
}

fn cli() -> Command {
    Command::new("svi")
        .version(svi_engine::VERSION)
        .about("Smart variation images engine")
        .subcommand_required(true)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(
            fixture_args(Command::new("dataset").about("Print the prepared dataset of a product")).arg(
                Arg::new("translate")
                    .long("translate")
                    .action(ArgAction::SetTrue)
                    .help("Translate slugs to the displayed language"),
            ),
        )
        .subcommand(
            fixture_args(Command::new("resolve").about("Resolve an attribute selection to an image")).arg(
                Arg::new("select")
                    .long("select")
                    .action(ArgAction::Append)
                    .value_name("ATTRIBUTE=VALUE")
                    .help("Selected attribute value, repeatable and kept in order"),
            ),
        )
        .subcommand(
            fixture_args(Command::new("filter").about("Images for a filter query string")).arg(
                Arg::new("query")
                    .long("query")
                    .required(true)
                    .help("Query string, e.g. filter_pa_color=red,blue"),
            ),
        )
        .subcommand(fixture_args(Command::new("thumbnails").about("Loop thumbnails of a product")))
        .subcommand(
            Command::new("slugify").about("Sanitize values and list candidate keys").arg(
                Arg::new("values")
                    .num_args(1..)
                    .required(true)
                    .help("Raw attribute values"),
            ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("SVI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn engine(args: &ArgMatches) -> Result<(Engine<MemoryHost>, ProductId)> {
    let path = args
        .get_one::<PathBuf>("fixture")
        .context("--fixture is required")?;
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading fixture {}", path.display()))?;
    let host = MemoryHost::from_json(&raw).with_context(|| format!("parsing fixture {}", path.display()))?;

    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let product = args.get_one::<u64>("product").copied().context("--product is required")?;
    tracing::debug!(fixture = %path.display(), product, "loaded host fixture");
    Ok((Engine::with_config(host, config), ProductId::new(product)))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct Resolution {
    candidates: Vec<String>,
    image: Option<u64>,
    key: Option<String>,
    score: Option<f64>,
}

#[derive(Serialize)]
struct Slugified {
    slugs: Vec<String>,
    candidates: Vec<String>,
}

fn selection_value(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(_, value)| value)
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("dataset", args)) => {
            let (engine, product) = engine(args)?;
            let dataset = engine.load_product(product, args.get_flag("translate"))?;
            print_json(&dataset)
        }
        Some(("resolve", args)) => {
            let (engine, product) = engine(args)?;
            let values: Vec<&str> = args
                .get_many::<String>("select")
                .into_iter()
                .flatten()
                .map(|pair| selection_value(pair))
                .collect();
            let candidates = normalize(&values);
            let found = engine.resolve_candidates(product, &candidates);
            print_json(&Resolution {
                candidates: candidates.as_slice().to_vec(),
                image: found.as_ref().map(|m| m.image.get()),
                key: found.as_ref().map(|m| m.key.clone()),
                score: found.as_ref().map(|m| match m.kind {
                    MatchKind::Exact => 100.0,
                    MatchKind::Fuzzy { score } => score,
                }),
            })
        }
        Some(("filter", args)) => {
            let (engine, product) = engine(args)?;
            let raw = args.get_one::<String>("query").context("--query is required")?;
            let matches = match FilterQuery::parse(raw) {
                Some(query) => engine.filtered_images(product, &query)?,
                None => Vec::new(),
            };
            print_json(&matches)
        }
        Some(("thumbnails", args)) => {
            let (engine, product) = engine(args)?;
            print_json(&engine.loop_thumbnails(product)?)
        }
        Some(("slugify", args)) => {
            let values: Vec<&String> = args.get_many::<String>("values").into_iter().flatten().collect();
            print_json(&Slugified {
                slugs: values.iter().map(|v| sanitize(v)).collect(),
                candidates: normalize(&values).as_slice().to_vec(),
            })
        }
        _ => Ok(()),
    }
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));
    run(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn selection_pairs_keep_value() {
        assert_eq!(selection_value("attribute_pa_color=Red"), "Red");
        assert_eq!(selection_value("Large"), "Large");
        assert_eq!(selection_value("size=a=b"), "a=b");
    }
}
