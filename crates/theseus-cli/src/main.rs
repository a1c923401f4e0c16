use std::path::PathBuf;

use clap::{Parser, Subcommand};
use theseus_core::TheseusConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "theseus",
    about = "Theseus: gated canary rollouts for Kubernetes & Istio",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Config file (default: $HOME/.theseus.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More debug
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check kubectl, the cluster and istioctl against the minimum versions.
    ///
    /// Reads text captured from `kubectl version` and `istioctl version`
    /// (use `-` for stdin), or explicit versions. Exits non-zero if any
    /// component is too old or its version cannot be parsed.
    Versions {
        /// File holding `kubectl version` output
        #[arg(long, conflicts_with_all = ["kubectl_client", "kubectl_server"])]
        kubectl: Option<String>,
        /// kubectl client version, instead of captured output
        #[arg(long, requires = "kubectl_server")]
        kubectl_client: Option<String>,
        /// Kubernetes server version, instead of captured output
        #[arg(long, requires = "kubectl_client")]
        kubectl_server: Option<String>,
        /// File holding `istioctl version` output
        #[arg(long, conflicts_with = "istioctl_client")]
        istioctl: Option<String>,
        /// istioctl version, instead of captured output
        #[arg(long)]
        istioctl_client: Option<String>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Show the route rule currently in force for a destination
    Active {
        /// File holding route rules as YAML (`-` for stdin)
        #[arg(short, long, default_value = "-")]
        rules: String,
        /// Print every rule, highest precedence first
        #[arg(long)]
        ranked: bool,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Show which rollout step the active rule corresponds to
    Step {
        #[arg(short, long, default_value = "-")]
        rules: String,
        /// Value of the pods being rolled out (.metadata.labels)
        #[arg(long)]
        tag: String,
        /// Label key of the tag (default: from config, else `version`)
        #[arg(long)]
        tag_name: Option<String>,
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Generate the route rule for the next canary step
    Generate {
        #[arg(short, long, default_value = "-")]
        rules: String,
        #[command(flatten)]
        canary: commands::generate::CanaryArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.debug { "theseus=debug" } else { "theseus=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_directive.parse()?),
        )
        .init();

    let config = TheseusConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Versions {
            kubectl,
            kubectl_client,
            kubectl_server,
            istioctl,
            istioctl_client,
            format,
        } => {
            let sources = commands::versions::VersionSources {
                kubectl,
                kubectl_client,
                kubectl_server,
                istioctl,
                istioctl_client,
            };
            commands::versions::check(&config, &sources, &format)
        }
        Commands::Active { rules, ranked, format } => {
            let text = commands::read_input(&rules)?;
            println!("{}", commands::rules::active(&text, ranked, &format)?);
            Ok(())
        }
        Commands::Step { rules, tag, tag_name, format } => {
            let text = commands::read_input(&rules)?;
            let tag_name = tag_name.unwrap_or_else(|| config.rollout.tag_name.clone());
            println!("{}", commands::rules::step(&text, &tag_name, &tag, &format)?);
            Ok(())
        }
        Commands::Generate { rules, canary } => {
            let text = commands::read_input(&rules)?;
            print!("{}", commands::generate::generate(&text, &canary, &config)?);
            Ok(())
        }
    }
}
