use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use playground::bindings::{BindingSet, BindingValue};
use playground::config::{PlaygroundDefinition, SandboxConfig};
use playground::normalize;
use playground::output;
use playground::sandbox::QuickJs;
use playground::{Outcome, Playground};

#[derive(Parser, Debug)]
#[command(name = "playground")]
#[command(about = "Run JavaScript snippets against injected libraries and capture their output")]
struct Args {
    /// Sandbox limits (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Stop a run after this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a snippet file
    Run {
        /// Snippet source
        file: PathBuf,

        /// Bind a JavaScript expression file, as NAME=PATH
        #[arg(long = "lib", value_parser = parse_binding)]
        libs: Vec<(String, PathBuf)>,

        /// Bind a JSON data file, as NAME=PATH
        #[arg(long = "json", value_parser = parse_binding)]
        data: Vec<(String, PathBuf)>,
    },
    /// Run a playground definition (TOML)
    Play {
        definition: PathBuf,
    },
    /// Print a snippet with its imports stripped
    Strip {
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn parse_binding(raw: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got `{}`", raw))?;
    Ok((name.trim().to_string(), PathBuf::from(path.trim())))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref(), args.timeout_ms)?;

    match args.command {
        Command::Run { file, libs, data } => {
            let source = read(&file)?;
            let bindings = build_bindings(&libs, &data)?;
            warn_unbound_imports(&source, &bindings);

            let title = file.display().to_string();
            let mut playground = Playground::new(title, source, Arc::new(bindings))
                .with_interpreter(Arc::new(QuickJs::new(config)));
            finish(&mut playground, args.format).await
        }
        Command::Play { definition } => {
            let definition = PlaygroundDefinition::load(&definition)
                .with_context(|| format!("Failed to load definition {}", definition.display()))?;
            let mut playground = Playground::from_definition(&definition, config)?;
            warn_unbound_imports(playground.snippet(), playground.bindings());
            finish(&mut playground, args.format).await
        }
        Command::Strip { file } => {
            let body = normalize::strip_imports(&read(&file)?);
            match args.format {
                Format::Text => output::print_stripped(&body),
                Format::Json => println!("{}", serde_json::to_string(&body)?),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>, timeout_ms: Option<u64>) -> Result<SandboxConfig> {
    let mut config = match path {
        Some(path) => SandboxConfig::load(path)?,
        None => SandboxConfig::default(),
    };
    if timeout_ms.is_some() {
        config.timeout_ms = timeout_ms;
    }
    tracing::debug!(?config, "sandbox config");
    Ok(config)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn build_bindings(libs: &[(String, PathBuf)], data: &[(String, PathBuf)]) -> Result<BindingSet> {
    let mut bindings = BindingSet::new();
    for (name, path) in libs {
        bindings.insert(name.clone(), BindingValue::Script(read(path)?))?;
    }
    for (name, path) in data {
        let value: serde_json::Value = serde_json::from_str(&read(path)?)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        bindings.insert(name.clone(), BindingValue::Json(value))?;
    }
    Ok(bindings)
}

fn warn_unbound_imports(source: &str, bindings: &BindingSet) {
    for name in normalize::imported_names(source) {
        if bindings.get(&name).is_none() {
            tracing::warn!("`{}` is imported but not bound; referencing it will fail", name);
        }
    }
}

async fn finish(playground: &mut Playground, format: Format) -> Result<ExitCode> {
    let title = playground.title().to_string();
    let outcome = playground.run().await?;

    match format {
        Format::Text => output::print_outcome(&title, outcome),
        Format::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
    }

    Ok(match outcome {
        Outcome::Success { .. } => ExitCode::SUCCESS,
        Outcome::Failure { .. } => ExitCode::FAILURE,
    })
}
