use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// NovelShelf: browse a folder of novel chapters in any common Chinese encoding
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Select a library directory and remember it
    Open {
        dir: PathBuf,
    },

    /// List chapter files of the library
    Scan {
        /// Nest files by folder instead of a flat list
        #[arg(long)]
        tree: bool,

        /// Print the entries as JSON
        #[arg(long)]
        json: bool,

        /// Open this directory first
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Print the decoded beginning of a chapter
    Preview {
        file: PathBuf,

        /// Characters to show (default: previewLength setting)
        #[arg(long, value_name = "N")]
        length: Option<usize>,
    },

    /// Copy a chapter's raw bytes to a file or directory
    Export {
        file: PathBuf,
        dest: PathBuf,
    },

    /// Open a chapter in the configured editor
    Edit {
        file: PathBuf,
    },

    /// Show a chapter in its folder
    Reveal {
        file: PathBuf,
    },

    /// Inspect or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Re-list the library whenever chapter files change
    Watch {
        #[arg(long)]
        tree: bool,
    },

    /// Serve the library over HTTP
    Serve {
        /// Listen address (default: server.bind_addr)
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,

        /// Open this directory first
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print the current settings as JSON
    Show,
    /// Change one or more settings
    Set(SetArgs),
    /// Restore default settings
    Reset,
}

#[derive(Args, Debug, Default)]
pub struct SetArgs {
    /// Editor program used by `edit`
    #[arg(long)]
    pub editor: Option<String>,

    #[arg(long)]
    pub theme: Option<String>,

    #[arg(long, value_name = "N")]
    pub preview_length: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::try_parse_from(["novel-shelf", "scan", "--tree", "--dir", "/books"]).unwrap();
        match cli.command {
            Command::Scan { tree, json, dir } => {
                assert!(tree);
                assert!(!json);
                assert_eq!(dir, Some(PathBuf::from("/books")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_settings_set() {
        let cli = Cli::try_parse_from([
            "novel-shelf",
            "--config",
            "/tmp/c.toml",
            "settings",
            "set",
            "--theme",
            "dark",
            "--preview-length",
            "500",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        match cli.command {
            Command::Settings { action: SettingsAction::Set(args) } => {
                assert_eq!(args.theme.as_deref(), Some("dark"));
                assert_eq!(args.preview_length, Some(500));
                assert!(args.editor.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_bind() {
        let cli = Cli::try_parse_from(["novel-shelf", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Serve { bind: Some(addr), dir: None } if addr.port() == 8080
        ));
        assert!(Cli::try_parse_from(["novel-shelf", "serve", "--bind", "nope"]).is_err());
    }
}
