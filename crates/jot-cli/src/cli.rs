use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jot")]
#[command(about = "Color-coded pocket notes from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the backend session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// List notes, pinned first then most recently updated
    List {
        /// Restrict to notes whose title matches
        #[arg(long, value_name = "QUERY")]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note title
        title: String,
        /// Note body
        content: String,
        /// Palette color name or hex value
        #[arg(long, default_value = "default")]
        color: String,
        /// Attach an image file
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
    },
    /// Edit an existing note
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// New title (unchanged when omitted)
        #[arg(long)]
        title: Option<String>,
        /// New body (unchanged when omitted)
        #[arg(long)]
        content: Option<String>,
        /// New palette color name or hex value
        #[arg(long)]
        color: Option<String>,
        /// Replace the attached image
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
        /// Remove the attached image
        #[arg(long, conflicts_with = "image")]
        remove_image: bool,
    },
    /// Pin or unpin a note
    Pin {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Delete a note and its attached image
    #[command(alias = "rm")]
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account and sign in
    Register {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
        /// Display name
        #[arg(long, value_name = "NAME", default_value = "")]
        name: String,
    },
    /// Sign in with email/password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show the signed-in account
    Status,
    /// Sign out and clear the stored session
    Logout,
}
