use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod context;
mod format;
mod logging;

/// Cantus - Docker Registry v2 gateway
///
/// Reads image metadata and tags from Docker Registry v2 endpoints and copies
/// images between registries.
#[derive(Parser, Debug)]
#[command(name = "cantus")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(long, global = true, env = "CANTUS_CONFIG")]
    config: Option<PathBuf>,

    /// Output format: pretty, json, yaml
    #[arg(short, long, global = true, default_value = "pretty")]
    format: format::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Display version information
    Version,
    /// Show the effective configuration and the file it was read from
    Config,
    /// Show normalized metadata for one or more tagged images
    Manifest {
        /// Image references (registry/group/name:tag)
        #[arg(required = true)]
        references: Vec<String>,
        /// Registry token
        #[arg(long, env = "CANTUS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// List the classified tags of a repository
    Tags {
        /// Repository reference (registry/group/name)
        reference: String,
        /// Only show tags containing this text
        #[arg(long)]
        filter: Option<String>,
        /// Registry token
        #[arg(long, env = "CANTUS_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Copy an image to a new tag, possibly in another registry
    Tag {
        /// Source image (registry/group/name:tag)
        from: String,
        /// Destination image (registry/group/name:tag)
        to: String,
        /// Token for the source registry
        #[arg(long, env = "CANTUS_TOKEN", hide_env_values = true)]
        from_token: Option<String>,
        /// Token for the destination registry
        #[arg(long, env = "CANTUS_TOKEN", hide_env_values = true)]
        to_token: Option<String>,
    },
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);


    let result = match cli.command {
        Commands::Version => {
            commands::version::print_version();
            Ok(())
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
        command => match context::AppContext::build(cli.config.as_deref(), cli.format) {
            Ok(ctx) => run(&ctx, command).await,
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            format::status(format::Status::Failed, &e);
            ExitCode::FAILURE
        }
    }
}

async fn run(ctx: &context::AppContext, command: Commands) -> Result<(), String> {
    if let Commands::Config = command {
        return commands::config::handle_config(ctx);
    }
    let cantus = ctx.cantus()?;

    match command {
        Commands::Manifest { references, token } => {
            commands::manifest::handle_manifest(ctx, &cantus, &references, token.as_deref()).await
        }
        Commands::Tags {
            reference,
            filter,
            token,
        } => {
            commands::tags::handle_tags(
                ctx,
                &cantus,
                &reference,
                filter.as_deref(),
                token.as_deref(),
            )
            .await
        }
        Commands::Tag {
            from,
            to,
            from_token,
            to_token,
        } => {
            commands::tag::handle_tag(
                ctx,
                &cantus,
                &from,
                from_token.as_deref(),
                &to,
                to_token.as_deref(),
            )
            .await
        }
        Commands::Version | Commands::Config | Commands::Completion { .. } => Ok(()),
    }
}
