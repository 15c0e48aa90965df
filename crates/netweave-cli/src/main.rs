use netweave_core::{MapConfig, build_map, codec};
use netweave_db::TopologyRepository;
use std::path::PathBuf;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Core(netweave_core::Error),
    Db(netweave_db::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Core(err) => write!(f, "{err}"),
            CliError::Db(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<netweave_core::Error> for CliError {
    fn from(value: netweave_core::Error) -> Self {
        Self::Core(value)
    }
}

impl From<netweave_db::Error> for CliError {
    fn from(value: netweave_db::Error) -> Self {
        Self::Db(value)
    }
}

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    header: Option<PathBuf>,
    out: Option<PathBuf>,
    dry_run: bool,
}

fn usage() -> &'static str {
    "netweave\n\
\n\
USAGE:\n\
  netweave [--config <path>] [--header <path>] [--out <path>] [--dry-run]\n\
\n\
NOTES:\n\
  - --config defaults to ./netweave.yaml; a missing file means defaults.\n\
  - --header and --out override the template and output paths from config.\n\
  - --dry-run prints the generated document to stdout instead of writing.\n\
  - The output file is only written once the whole derivation succeeded.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();
    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "--dry-run" => args.dry_run = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(PathBuf::from(path));
            }
            "--header" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.header = Some(PathBuf::from(path));
            }
            "--out" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(PathBuf::from(path));
            }
            _ => return Err(CliError::Usage(usage())),
        }
    }
    Ok(args)
}

async fn run(args: Args) -> Result<(), CliError> {
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from("netweave.yaml"));
    let config = MapConfig::load(&config_path)?;

    let header = args.header.unwrap_or_else(|| config.weathermap.header.clone());
    let out = args.out.unwrap_or_else(|| config.weathermap.output.clone());

    let template = codec::load(&header)?;

    let repository = TopologyRepository::connect(&config.database).await?;
    let devices = repository.devices().await?;
    let links = repository.links(config.links.min_speed).await?;

    let map = build_map(template, &devices, &links, &config);
    let text = codec::dump(&map);

    if args.dry_run {
        print!("{text}");
    } else {
        std::fs::write(&out, text)?;
        tracing::info!(
            nodes = map.nodes.len(),
            links = map.links.len(),
            out = %out.display(),
            "weathermap written"
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let argv: Vec<String> = std::env::args().collect();
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(args).await {
        eprintln!("netweave: {err}");
        std::process::exit(1);
    }
}
