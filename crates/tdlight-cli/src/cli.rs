use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Terminal front end for the TD-light light-curve portal.
#[derive(Parser, Debug)]
#[command(name = "tdlight", version, about)]
pub struct Cli {
    /// Settings file (defaults to ./tdlight.toml).
    #[arg(long, global = true, env = "TDLIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding the settings file.
    #[arg(long, global = true, env = "TDLIGHT_BACKEND_URL")]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read or change the backend configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// List or drop databases.
    #[command(subcommand)]
    Databases(DatabaseCommand),
    /// Search the catalog and print the matching objects.
    Search {
        #[command(subcommand)]
        target: SearchTarget,
        /// Merge these source ids into the result list.
        #[arg(long = "append-ids", global = true, num_args = 1..)]
        append_ids: Vec<String>,
        /// Write object_list.csv into this directory.
        #[arg(long, global = true)]
        export: Option<PathBuf>,
        /// Draw the results on a sky map.
        #[arg(long, global = true)]
        map: bool,
    },
    /// Show one object's metadata and light curve.
    Lightcurve {
        source_id: String,
        /// Write lightcurve_<id>.csv into this directory.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Search, then classify the objects found.
    Classify {
        #[command(subcommand)]
        target: SearchTarget,
        /// Leave these source ids out of the submission.
        #[arg(long = "skip", global = true)]
        skip: Vec<String>,
    },
    /// Import catalog or light-curve files into the database.
    #[command(subcommand)]
    Import(ImportCommand),
    /// Work through the queue of unclassified light curves.
    #[command(subcommand)]
    Auto(AutoCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the backend configuration.
    Show,
    /// Save changed fields to the backend config file.
    Save {
        #[command(flatten)]
        fields: ConfigFields,
    },
    /// Save changed fields, leaving import worker counts out, and have the
    /// backend reload its config file.
    Reload {
        #[command(flatten)]
        fields: ConfigFields,
    },
    /// Reload the backend config file and print the import defaults.
    Sync,
}

#[derive(Args, Debug, Default)]
pub struct ConfigFields {
    #[arg(long)]
    pub db_name: Option<String>,
    #[arg(long)]
    pub db_host: Option<String>,
    #[arg(long)]
    pub db_port: Option<String>,
    #[arg(long)]
    pub db_user: Option<String>,
    #[arg(long)]
    pub threads: Option<String>,
    #[arg(long)]
    pub vgroups: Option<String>,
    #[arg(long)]
    pub threshold: Option<String>,
    #[arg(long)]
    pub model_path: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum DatabaseCommand {
    /// List user databases.
    List,
    /// Drop a database and everything in it.
    Drop {
        name: String,
        /// Confirm the drop.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SearchTarget {
    /// Objects within RADIUS degrees of (RA, DEC).
    #[command(allow_negative_numbers = true)]
    Cone { ra: f64, dec: f64, radius: f64 },
    /// Objects inside an RA/DEC box.
    #[command(allow_negative_numbers = true)]
    Region {
        ra_min: f64,
        ra_max: f64,
        dec_min: f64,
        dec_max: f64,
    },
    /// Objects by source id.
    Ids {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Directory holding the files to import.
    pub path: String,
    /// Coordinates file mapping source ids to positions.
    #[arg(long)]
    pub coords: String,
    /// Target database (defaults to the backend's current one).
    #[arg(long)]
    pub db: Option<String>,
    #[arg(long)]
    pub nside: Option<String>,
    #[arg(long)]
    pub threads: Option<String>,
    #[arg(long)]
    pub vgroups: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ImportCommand {
    /// Import a catalog directory.
    Catalog(ImportArgs),
    /// Import a light-curve directory.
    Lightcurve(ImportArgs),
    /// Stop the running import.
    Stop,
}

#[derive(Subcommand, Debug)]
pub enum AutoCommand {
    /// Rescan the database for unclassified light curves.
    Check {
        #[arg(long)]
        db: Option<String>,
    },
    /// Show the current queue without rescanning.
    Candidates {
        #[arg(long)]
        db: Option<String>,
    },
    /// Classify the queue batch by batch.
    Start {
        #[arg(long)]
        db: Option<String>,
        #[arg(long)]
        batch_size: Option<String>,
        /// Continue a paused run.
        #[arg(long)]
        resume: bool,
    },
    /// Stop after the current batch.
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cone_accepts_negative_declination() {
        let cli = Cli::parse_from(["tdlight", "search", "cone", "10.5", "-5.25", "0.5"]);
        match cli.command {
            Command::Search { target: SearchTarget::Cone { ra, dec, radius }, append_ids, export, map } => {
                assert_eq!((ra, dec, radius), (10.5, -5.25, 0.5));
                assert!(append_ids.is_empty());
                assert!(export.is_none());
                assert!(!map);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn classify_collects_skips() {
        let cli = Cli::parse_from([
            "tdlight", "classify", "ids", "1", "2", "3", "--skip", "2",
        ]);
        match cli.command {
            Command::Classify { target: SearchTarget::Ids { ids }, skip } => {
                assert_eq!(ids, vec!["1", "2", "3"]);
                assert_eq!(skip, vec!["2"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
