use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use kit::areas::repository::Repository;
use kit::artifacts::diff::tree_diff::DiffFilter;
use kit::artifacts::merge::MergeOutcome;
use kit::commands::plumbing::cat_file::CatFileMode;
use kit::commands::porcelain::diff::DiffOptions;
use kit::commands::porcelain::log::LogOptions;
use kit::config::Config;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kit",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A small content-addressed version control system",
    long_about = "kit stores snapshots of a directory as blobs, trees and commits, \
    keeps branches and tags as refs, and merges diverged histories with a three-way merge.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "hash-object",
        about = "Compute the blob ID of a file and optionally store it"
    )]
    HashObject {
        #[arg(short, long, required = false, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "cat-file",
        about = "Print the content or the type of an object",
        group(ArgGroup::new("mode").required(true).args(["pretty", "kind"]))
    )]
    CatFile {
        #[arg(short = 'p', help = "Pretty-print the object content")]
        pretty: bool,
        #[arg(short = 't', help = "Print the object type")]
        kind: bool,
        #[arg(index = 1, help = "The object to print")]
        object: String,
    },
    #[command(name = "write-tree", about = "Store the index as tree objects")]
    WriteTree,
    #[command(
        name = "read-tree",
        about = "Load a tree into the index and the working tree"
    )]
    ReadTree {
        #[arg(index = 1)]
        revision: String,
    },
    #[command(name = "add", about = "Stage files for the next commit")]
    Add {
        #[arg(required = true, help = "Files or directories to stage")]
        paths: Vec<String>,
    },
    #[command(name = "commit", about = "Record the index as a new commit")]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(name = "log", about = "Show commit history")]
    Log {
        revisions: Vec<String>,
        #[arg(long, help = "One line per commit")]
        oneline: bool,
        #[arg(short = 'n', long = "max-count", help = "Limit the number of commits")]
        max_count: Option<usize>,
    },
    #[command(name = "branch", about = "List, create or delete branches")]
    Branch {
        #[arg(index = 1)]
        name: Option<String>,
        #[arg(index = 2, requires = "name")]
        start: Option<String>,
        #[arg(short = 'd', long = "delete", conflicts_with_all = ["name", "start"])]
        delete: Option<String>,
    },
    #[command(name = "tag", about = "List or create tags")]
    Tag {
        #[arg(index = 1)]
        name: Option<String>,
        #[arg(index = 2, requires = "name")]
        revision: Option<String>,
    },
    #[command(name = "checkout", about = "Switch branches or detach HEAD at a revision")]
    Checkout {
        #[arg(index = 1)]
        revision: String,
    },
    #[command(
        name = "reset",
        about = "Move the current branch and reload the index, keeping the working tree"
    )]
    Reset {
        #[arg(index = 1)]
        revision: String,
    },
    #[command(name = "status", about = "Show the working tree status")]
    Status,
    #[command(name = "diff", about = "Show line changes")]
    Diff {
        #[arg(long, help = "Compare the index against HEAD or the given revision")]
        cached: bool,
        #[arg(long, help = "Show only the status letter and path of each change")]
        name_status: bool,
        #[arg(
            long,
            value_parser = parse_diff_filter,
            help = "Only show changes of these kinds (A, D, M)"
        )]
        diff_filter: Option<DiffFilter>,
        #[arg(index = 1)]
        revision: Option<String>,
    },
    #[command(name = "merge", about = "Merge a revision into HEAD")]
    Merge {
        #[arg(index = 1)]
        revision: String,
        #[arg(short, long, help = "The merge commit message")]
        message: Option<String>,
    },
    #[command(name = "merge-base", about = "Find the nearest common ancestor of two commits")]
    MergeBase {
        #[arg(index = 1)]
        a: String,
        #[arg(index = 2)]
        b: String,
    },
    #[command(name = "fetch", about = "Copy the branches of another repository")]
    Fetch {
        #[arg(index = 1)]
        remote: PathBuf,
    },
    #[command(name = "push", about = "Publish a branch to another repository")]
    Push {
        #[arg(index = 1)]
        remote: PathBuf,
        #[arg(index = 2)]
        branch: String,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_env("KIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let pwd = std::env::current_dir()?;

    if let Commands::Init { path } = &cli.command {
        let path = path.clone().unwrap_or_else(|| pwd.clone());
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let repository = Repository::new(&path, config, Box::new(std::io::stdout()))?;
        repository.init()?;

        return Ok(ExitCode::SUCCESS);
    }

    let repository = open_repository(&pwd, config)?;

    match &cli.command {
        Commands::Init { .. } => {}
        Commands::HashObject { write, file } => repository.hash_object(file, *write)?,
        Commands::CatFile { pretty, object, .. } => {
            let mode = if *pretty { CatFileMode::Pretty } else { CatFileMode::Type };
            repository.cat_file(object, mode)?
        }
        Commands::WriteTree => repository.write_tree_command()?,
        Commands::ReadTree { revision } => repository.read_tree_command(revision)?,
        Commands::Add { paths } => repository.add(paths)?,
        Commands::Commit { message } => {
            repository.commit(message)?;
        }
        Commands::Log {
            revisions,
            oneline,
            max_count,
        } => {
            let opts = LogOptions {
                oneline: *oneline,
                max_count: *max_count,
            };
            repository.log(revisions, &opts)?
        }
        Commands::Branch {
            name,
            start,
            delete,
        } => match (name, delete) {
            (_, Some(delete)) => repository.delete_branch(delete)?,
            (Some(name), None) => repository.branch(name, start.as_deref())?,
            (None, None) => repository.list_branches()?,
        },
        Commands::Tag { name, revision } => match name {
            Some(name) => repository.tag(name, revision.as_deref())?,
            None => repository.list_tags()?,
        },
        Commands::Checkout { revision } => repository.checkout(revision)?,
        Commands::Reset { revision } => repository.reset(revision)?,
        Commands::Status => repository.status()?,
        Commands::Diff {
            cached,
            name_status,
            diff_filter,
            revision,
        } => {
            let opts = DiffOptions {
                cached: *cached,
                name_status: *name_status,
                filter: diff_filter.unwrap_or_else(DiffFilter::all),
            };
            repository.diff(revision.as_deref(), &opts)?
        }
        Commands::Merge { revision, message } => {
            let outcome = repository.merge_command(revision, message.as_deref())?;
            if matches!(outcome, MergeOutcome::Conflicted { .. }) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::MergeBase { a, b } => {
            if repository.merge_base_command(a, b)?.is_none() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Fetch { remote } => repository.fetch_command(&absolute(&pwd, remote))?,
        Commands::Push { remote, branch } => {
            repository.push_command(&absolute(&pwd, remote), branch)?
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn open_repository(pwd: &Path, config: Config) -> Result<Repository> {
    Repository::discover(pwd, config, Box::new(std::io::stdout()))
        .with_context(|| format!("not a kit repository (or any of the parent directories): {}", pwd.display()))
}

fn parse_diff_filter(value: &str) -> std::result::Result<DiffFilter, String> {
    DiffFilter::try_parse(value).ok_or_else(|| format!("invalid diff filter '{value}'"))
}

fn absolute(pwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        pwd.join(path)
    }
}
