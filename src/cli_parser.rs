// ============================================================================
// L2.11: CLI PARSER SUBSYSTEM
// ============================================================================
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "table_mirror",
    version,
    about = "Mirror SQL Server and MySQL tables side by side and insert rows into the source"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show every table pair, refreshing the selected one on a timer (default)
    Watch,
    /// Insert one row into a source table interactively
    Insert,
    /// List the tables of the source database
    Tables,
    /// Show the columns of a source table
    Columns {
        /// Table name, optionally schema-qualified
        table: String,
    },
    /// Verify both connections and count rows of every table pair
    Health,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Watch,
    Insert,
    Tables,
    Columns(String),
    Health,
}

impl From<Option<Command>> for RunMode {
    fn from(command: Option<Command>) -> Self {
        match command {
            None | Some(Command::Watch) => RunMode::Watch,
            Some(Command::Insert) => RunMode::Insert,
            Some(Command::Tables) => RunMode::Tables,
            Some(Command::Columns { table }) => RunMode::Columns(table),
            Some(Command::Health) => RunMode::Health,
        }
    }
}

pub fn parse_arguments() -> RunMode {
    Cli::parse().command.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(args: &[&str]) -> RunMode {
        Cli::try_parse_from(args).unwrap().command.into()
    }

    #[test]
    fn defaults_to_watch() {
        assert_eq!(mode(&["table_mirror"]), RunMode::Watch);
        assert_eq!(mode(&["table_mirror", "watch"]), RunMode::Watch);
    }

    #[test]
    fn parses_subcommands() {
        assert_eq!(mode(&["table_mirror", "insert"]), RunMode::Insert);
        assert_eq!(mode(&["table_mirror", "health"]), RunMode::Health);
        assert_eq!(
            mode(&["table_mirror", "columns", "sales.Orders"]),
            RunMode::Columns("sales.Orders".into())
        );
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(Cli::try_parse_from(["table_mirror", "sync"]).is_err());
        assert!(Cli::try_parse_from(["table_mirror", "columns"]).is_err());
    }
}
