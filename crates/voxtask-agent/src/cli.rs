use clap::{Parser, Subcommand};

/// Voice function handlers for the voxtask assistant
#[derive(Parser, Debug)]
#[command(name = "voxtask", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the voice function declarations as JSON
    Functions,
    /// Run one voice function and print its reply
    Call(CallCommand),
    /// Serve line-delimited JSON requests on stdin
    Serve,
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct CallCommand {
    /// Function name, e.g. createTask
    pub function: String,
    /// Participant identity (`user_<uuid>` or a bare uuid)
    #[clap(short, long)]
    pub user: String,
    /// Function arguments as a JSON object
    #[clap(short, long, default_value = "{}")]
    pub args: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UserCommand {
    /// Create a user and select the default categories for them
    Add {
        #[clap(short, long)]
        email: String,
        /// Display name
        #[clap(short, long)]
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryCommand {
    /// List categories, optionally only those a user has selected
    List {
        #[clap(short, long)]
        user: Option<String>,
    },
    /// Add a category to a user's selection
    Select(SelectionArgs),
    /// Remove a category from a user's selection
    Deselect(SelectionArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct SelectionArgs {
    #[clap(short, long)]
    pub user: String,
    /// Category id
    #[clap(short, long)]
    pub category: String,
}
