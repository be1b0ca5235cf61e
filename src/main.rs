use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod config;
mod logging;
mod parser;
mod render;

use cli::commands::RenderSettings;
use config::Config;
use render::{Format, LinkMap, RenderOptions};

#[derive(Parser)]
#[command(name = "podium")]
#[command(author, version, about = "podium - render POD documentation as text or HTML")]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a POD file
    Render {
        /// Input POD file
        input: PathBuf,

        /// Output file (`-` for stdout)
        output: PathBuf,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<Format>,

        #[command(flatten)]
        refs: RefArgs,

        /// Wrap HTML output in a complete page
        #[arg(long)]
        standalone: bool,

        /// Treat unresolved references as errors
        #[arg(long)]
        strict: bool,
    },

    /// Check files for parse errors and unresolved references
    Check {
        /// File or directory to check
        path: PathBuf,

        #[command(flatten)]
        refs: RefArgs,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// List cross-references in a file
    Refs {
        /// Input POD file
        input: PathBuf,

        #[command(flatten)]
        refs: RefArgs,
    },

    /// Show the heading outline of a file
    Outline {
        /// Input POD file
        input: PathBuf,
    },

    /// Create the default config file
    InitConfig,
}

/// Reference map options shared by several commands
#[derive(clap::Args)]
struct RefArgs {
    /// Reference map file (.toml or .yaml)
    #[arg(long)]
    links: Option<PathBuf>,

    /// Reference map entry (name=location), repeatable
    #[arg(long = "link", value_name = "NAME=LOCATION")]
    link: Vec<String>,
}

impl RefArgs {
    /// Config entries, then the --links file, then --link pairs
    fn link_map(&self, config: &Config) -> Result<LinkMap> {
        let mut links = config.link_map()?;

        if let Some(path) = &self.links {
            links.merge(LinkMap::load(path)?);
        }

        for pair in &self.link {
            let (name, location) = LinkMap::parse_pair(pair)?;
            links.insert(name, location);
        }

        tracing::debug!(entries = links.len(), "reference map ready");
        Ok(links)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Commands::InitConfig = cli.command {
        return cli::commands::init_config(cli.config.as_deref());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let code = match cli.command {
        Commands::Render { input, output, format, refs, standalone, strict } => {
            let settings = RenderSettings {
                options: RenderOptions {
                    format: format.or(config.format).unwrap_or_default(),
                    standalone: standalone || config.standalone,
                },
                links: refs.link_map(&config)?,
                strict: strict || config.strict,
            };
            cli::commands::render(&input, &output, &settings)?
        }
        Commands::Check { path, refs, strict } => {
            cli::commands::check(&path, &refs.link_map(&config)?, strict || config.strict)?
        }
        Commands::Refs { input, refs } => cli::commands::refs(&input, &refs.link_map(&config)?)?,
        Commands::Outline { input } => cli::commands::outline(&input)?,
        Commands::InitConfig => 0,
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
