use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kimquery::app::{App, ProgressEvent, ProgressSink};
use kimquery::config::ConfigLoader;
use kimquery::domain::Structure;
use kimquery::error::KimQueryError;
use kimquery::fetch::Fetcher;
use kimquery::openkim::KimHttpClient;
use kimquery::options::{Options, QueryArgs};
use kimquery::output::{self, OutputFormat};
use kimquery::store::write_atomic;

#[derive(Parser)]
#[command(name = "kimquery")]
#[command(about = "Retrieve, cache and filter OpenKIM property data")]
#[command(version, author)]
struct Cli {
    /// Property codes or full-match patterns, comma separated (`list` to show all)
    #[arg(short = 'p', long = "props", value_delimiter = ',')]
    props: Option<Vec<String>>,

    /// Crystal structures, comma separated (`list` to show all)
    #[arg(short = 's', long = "structs", value_delimiter = ',')]
    structs: Option<Vec<String>>,

    /// Element symbols, comma separated
    #[arg(short = 'e', long = "elems", value_delimiter = ',')]
    elems: Option<Vec<String>>,

    /// Model identifiers or full-match patterns, comma separated
    #[arg(short = 'm', long = "models", value_delimiter = ',')]
    models: Option<Vec<String>>,

    /// Fetch the newest data from OpenKIM and update the cache
    #[arg(short = 'n', long = "update", alias = "newest")]
    update: bool,

    /// Cache file to read and update
    #[arg(long)]
    cache: Option<String>,

    /// Settings file (defaults to ./kimquery.json when present)
    #[arg(long)]
    config: Option<String>,

    #[arg(short = 'f', long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the result to this file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<String>,
}

struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<KimQueryError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KimQueryError) -> u8 {
    match error {
        KimQueryError::InvalidProperty(_)
        | KimQueryError::InvalidStructure(_)
        | KimQueryError::InvalidElement(_)
        | KimQueryError::InvalidModel(_)
        | KimQueryError::EmptySelection(_)
        | KimQueryError::UnknownProperty(_)
        | KimQueryError::InvalidPropertyMeta { .. } => 2,
        KimQueryError::KimHttp(_)
        | KimQueryError::KimStatus { .. }
        | KimQueryError::KimParse(_)
        | KimQueryError::FetchExhausted { .. }
        | KimQueryError::UpdateIncomplete { .. } => 3,
        _ => 1,
    }
}

fn is_list(values: &Option<Vec<String>>) -> bool {
    matches!(values.as_deref(), Some([only]) if only == "list")
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let resolved = ConfigLoader::resolve(cli.config.as_deref())?;

    let list_props = is_list(&cli.props);
    let list_structs = is_list(&cli.structs);
    if list_props || list_structs {
        if list_props {
            println!(
                "Available properties: {}",
                resolved.catalog.list_codes().join(", ")
            );
        }
        if list_structs {
            let structures: Vec<&str> = Structure::ALL.iter().map(Structure::as_str).collect();
            println!("Available structures: {}", structures.join(", "));
        }
        return Ok(());
    }

    let args = QueryArgs {
        properties: cli.props,
        structures: cli.structs,
        elements: cli.elems,
        models: cli.models,
        update: cli.update,
        cache: None,
    };
    let cache_path = resolved.cache_path(cli.cache.map(Utf8PathBuf::from))?;
    let options = Options::resolve(args, &resolved.catalog, cache_path)?;
    tracing::debug!(?options, "resolved options");
    eprintln!("Properties: {}", options.properties.join(", "));

    let client = KimHttpClient::new(&resolved.api_url, resolved.timeout)?;
    let app = App::new(
        resolved.catalog,
        Fetcher::new(client, resolved.retry),
        resolved.task_interval,
    );

    let report = app.run(&options, &ConsoleSink)?;
    if let Some(err) = &report.persist_error {
        eprintln!("Warning: {err}");
    }

    let filtered = app.filter(&report.dataset, &options);
    let content = output::render(&filtered, cli.format.unwrap_or_default())?;
    match cli.output {
        Some(path) => {
            let path = Utf8PathBuf::from(path);
            write_atomic(&path, content.as_bytes())
                .map_err(|err| KimQueryError::Filesystem(format!("{path}: {err}")))?;
            eprintln!("Result saved to: {path}");
        }
        None => println!("{content}"),
    }

    if let Some(err) = report.incomplete_error() {
        for failure in &report.failures {
            eprintln!("Failed: {}", failure.error);
        }
        return Err(err.into());
    }
    Ok(())
}
