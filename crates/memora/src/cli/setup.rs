use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "memora",
    bin_name = "memora",
    version,
    disable_help_subcommand = true,
    about = "Vocabulary cards and study logs, stored on your machine",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the stores (overrides MEMORA_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Config file to read instead of the default memora.toml
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Vocabulary cards
    #[command(subcommand)]
    Vocab(VocabCommands),

    /// Writing-analysis log
    #[command(subcommand)]
    Writing(WritingCommands),

    /// Classical-text log
    #[command(subcommand)]
    Classical(ClassicalCommands),

    /// Write a backup file of every collection
    #[command(display_order = 10)]
    Export {
        /// Directory to write the backup into
        #[arg(long, short, value_name = "DIR", default_value = ".")]
        out: PathBuf,
    },

    /// Merge a backup file into the library
    #[command(display_order = 11)]
    Import {
        /// Backup file to read
        file: PathBuf,

        /// Confirm the merge without being asked
        #[arg(long, short)]
        yes: bool,
    },

    /// Show the resolved configuration
    #[command(display_order = 20)]
    Config,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Print records as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum VocabCommands {
    /// List cards, most recent first
    #[command(alias = "ls")]
    List {
        /// Only cards carrying this tag
        #[arg(long, short)]
        tag: Option<String>,

        #[command(flatten)]
        args: ListArgs,
    },

    /// Add a card
    #[command(alias = "a")]
    Add {
        word: String,

        #[arg(long, short)]
        definition: String,

        #[arg(long, short = 'T')]
        translation: Option<String>,

        #[arg(long, short)]
        example: Option<String>,

        #[arg(long, short)]
        phonetic: Option<String>,

        #[arg(long, short)]
        mnemonic: Option<String>,

        /// Where the word was met
        #[arg(long, short)]
        context: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag", short = 't', value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Remove cards by word
    #[command(alias = "rm")]
    Remove {
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },

    /// Add or remove tags on a card
    Tag {
        word: String,

        /// Tag to add (repeatable)
        #[arg(long = "add", short = 'a', value_name = "TAG")]
        add: Vec<String>,

        /// Tag to remove (repeatable)
        #[arg(long = "remove", short = 'r', value_name = "TAG")]
        remove: Vec<String>,
    },

    /// Attach an image file to a card, or detach it with --clear
    Image {
        word: String,

        #[arg(required_unless_present = "clear")]
        file: Option<PathBuf>,

        #[arg(long, conflicts_with = "file")]
        clear: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum WritingCommands {
    /// List entries, most recent first
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        args: ListArgs,
    },

    /// Log an analysed piece of writing
    #[command(alias = "a")]
    Add {
        original: String,

        #[arg(long, short)]
        corrected: Option<String>,

        #[arg(long, short)]
        improved: Option<String>,

        #[arg(long, short)]
        feedback: Option<String>,

        /// Label for where the text came from
        #[arg(long, short = 'x')]
        context: Option<String>,
    },

    /// Remove entries by id
    #[command(alias = "rm")]
    Remove {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ClassicalCommands {
    /// List entries, most recent first
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        args: ListArgs,
    },

    /// Log a classical passage and its translation
    #[command(alias = "a")]
    Add {
        original: String,

        #[arg(long, short)]
        translation: String,

        #[arg(long, short)]
        origin: Option<String>,

        #[arg(long, short)]
        usage: Option<String>,
    },

    /// Remove entries by id
    #[command(alias = "rm")]
    Remove {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("memora").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_vocab_add_with_repeated_tags() {
        let cli = parse(&[
            "vocab", "add", "lucid", "-d", "clear", "-t", "exam", "--tag", "style",
        ]);
        match cli.command {
            Commands::Vocab(VocabCommands::Add {
                word,
                definition,
                tags,
                ..
            }) => {
                assert_eq!(word, "lucid");
                assert_eq!(definition, "clear");
                assert_eq!(tags, vec!["exam", "style"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["export", "--data-dir", "/tmp/m", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/m")));
        assert!(matches!(cli.command, Commands::Export { ref out } if out == &PathBuf::from(".")));
    }

    #[test]
    fn test_import_requires_file() {
        assert!(Cli::try_parse_from(["memora", "import"]).is_err());
        let cli = parse(&["import", "backup.json", "--yes"]);
        assert!(matches!(cli.command, Commands::Import { yes: true, .. }));
    }

    #[test]
    fn test_image_needs_file_or_clear() {
        assert!(Cli::try_parse_from(["memora", "vocab", "image", "lucid"]).is_err());
        assert!(Cli::try_parse_from(["memora", "vocab", "image", "lucid", "--clear"]).is_ok());
        assert!(
            Cli::try_parse_from(["memora", "vocab", "image", "lucid", "a.png", "--clear"]).is_err()
        );
    }

    #[test]
    fn test_remove_needs_at_least_one_key() {
        assert!(Cli::try_parse_from(["memora", "writing", "remove"]).is_err());
    }
}
