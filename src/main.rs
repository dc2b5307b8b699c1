use clap::{Parser, Subcommand};
use docs_chat::Result;
use docs_chat::commands::{rebuild_index, run_chat, show_config};
use docs_chat::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docs-chat")]
#[command(about = "Local retrieval-augmented Q&A over a directory of documents")]
#[command(version)]
struct Cli {
    /// Directory containing .md and .txt documents
    #[arg(long)]
    docs_dir: Option<PathBuf>,

    /// Directory where the vector index is persisted
    #[arg(long)]
    index_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive question-answering session (default)
    Chat,
    /// Delete the persisted index and rebuild it from the document set
    Rebuild,
    /// Show the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(docs_dir) = cli.docs_dir {
        config.docs_dir = docs_dir;
    }
    if let Some(index_dir) = cli.index_dir {
        config.index_dir = index_dir;
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(config).await?,
        Commands::Rebuild => rebuild_index(config).await?,
        Commands::Config => show_config(&config),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_defaults_to_chat() {
        let cli = Cli::try_parse_from(["docs-chat"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(parsed.command.is_none());
            assert!(parsed.docs_dir.is_none());
        }
    }

    #[test]
    fn rebuild_command() {
        let cli = Cli::try_parse_from(["docs-chat", "rebuild"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Some(Commands::Rebuild)));
        }
    }

    #[test]
    fn docs_dir_override() {
        let cli = Cli::try_parse_from(["docs-chat", "--docs-dir", "/tmp/docs", "chat"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert_eq!(parsed.docs_dir, Some(PathBuf::from("/tmp/docs")));
            assert!(matches!(parsed.command, Some(Commands::Chat)));
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["docs-chat", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["docs-chat", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
