use clap::{ArgGroup, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "logre")]
/// Logre command line administration of RDF triple stores
pub struct Args {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "logre.json", value_hint = ValueHint::FilePath)]
    pub config: PathBuf,
    /// Data bundle to work on
    ///
    /// By default the default data bundle of the configuration is used.
    #[arg(short, long, global = true)]
    pub bundle: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the data bundles of the configuration
    Bundles,
    /// List the classes of the model with their number of instances
    Classes,
    /// Find entities by label and class
    Find {
        /// Case-insensitive part of the label
        #[arg(short, long)]
        label: Option<String>,
        /// Class of the entities
        #[arg(long)]
        class: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Show the card and the statements of an entity
    Entity {
        /// URI of the entity, absolute or prefixed
        uri: String,
    },
    /// Show one page of the data table of a class
    Table {
        /// URI of the class, absolute or prefixed
        class: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Column to sort on: a column name, a property URI or "uri"
        #[arg(long)]
        sort: Option<String>,
        /// Sort in descending order
        #[arg(long, requires = "sort")]
        desc: bool,
        /// Column to filter on
        #[arg(long, requires = "filter_value")]
        filter_column: Option<String>,
        /// Case-insensitive part of the values to keep
        #[arg(long, requires = "filter_column")]
        filter_value: Option<String>,
        /// Print the whole table as CSV
        #[arg(long)]
        csv: bool,
    },
    /// Run a SPARQL query or update on the endpoint of the data bundle
    #[command(group(ArgGroup::new("source").required(true).args(["text", "file", "saved"])))]
    Query {
        /// Text of the query
        #[arg(long)]
        text: Option<String>,
        /// File holding the query
        #[arg(long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Name of a saved query
        #[arg(long)]
        saved: Option<String>,
    },
    /// Save a SPARQL query in the configuration, overwriting the one with the same name
    #[command(group(ArgGroup::new("source").required(true).args(["text", "file"])))]
    SaveQuery {
        name: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },
    /// Export the data bundle into a directory
    Dump {
        format: DumpFormat,
        /// Output directory
        #[arg(short, long, default_value = ".", value_hint = ValueHint::DirPath)]
        output: PathBuf,
    },
    /// Import a file into a graph of the data bundle
    Import {
        format: DumpFormat,
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Graph to import into: data, model or metadata
        ///
        /// Ignored for N-Quads, whose quads select their graphs.
        #[arg(short, long, default_value = "data")]
        graph: String,
    },
    /// Register a prefix shared by every data bundle
    AddPrefix { short: String, long: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DumpFormat {
    Nq,
    Ttl,
    Csv,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let args = Args::try_parse_from([
            "logre", "--bundle", "People", "table", "crm:E21", "--sort", "uri", "--desc",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("logre.json"));
        assert_eq!(args.bundle.as_deref(), Some("People"));
        assert!(matches!(
            args.command,
            Command::Table { ref sort, desc: true, .. } if sort.as_deref() == Some("uri")
        ));
    }

    #[test]
    fn test_query_needs_a_source() {
        assert!(Args::try_parse_from(["logre", "query"]).is_err());
        assert!(Args::try_parse_from(["logre", "query", "--text", "ASK {}", "--saved", "x"]).is_err());
        assert!(Args::try_parse_from(["logre", "dump", "nq", "-o", "out"]).is_ok());
    }
}
