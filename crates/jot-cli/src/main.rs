//! Jot CLI - drive the note synchronizer from the terminal.
//!
//! Thin front end over `jot-core`: it restores the stored session, wires the
//! session context and remote store into a synchronizer, and maps
//! subcommands onto synchronizer operations.

mod cli;
mod error;
mod session_store;

use std::path::Path;

use clap::Parser;
use serde::Serialize;

use jot_core::auth::{AccountClient, AuthSession, SessionPersistence};
use jot_core::config::RemoteConfig;
use jot_core::models::ImageAsset;
use jot_core::remote::AppwriteNoteStore;
use jot_core::session::SessionContext;
use jot_core::sync::{NoteEdit, NoteSynchronizer};
use jot_core::Note;

use crate::cli::{AuthCommands, Cli, Commands};
use crate::error::CliError;
use crate::session_store::CliSessionStore;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jot=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Auth { command } => run_auth(command).await,
        Commands::List { search, json } => run_list(search.as_deref(), json).await,
        Commands::Add {
            title,
            content,
            color,
            image,
        } => run_add(&title, &content, &color, image.as_deref()).await,
        Commands::Edit {
            id,
            title,
            content,
            color,
            image,
            remove_image,
        } => {
            run_edit(
                &id,
                title.as_deref(),
                content.as_deref(),
                color.as_deref(),
                image.as_deref(),
                remove_image,
            )
            .await
        }
        Commands::Pin { id } => run_pin(&id).await,
        Commands::Delete { id } => run_delete(&id).await,
    }
}

/// Store + synchronizer wired to the stored session.
struct AppContext {
    store: AppwriteNoteStore,
    sync: NoteSynchronizer<AppwriteNoteStore>,
}

fn signed_in_context() -> Result<AppContext, CliError> {
    let config = RemoteConfig::from_env()?;
    let session = CliSessionStore
        .load_session()?
        .ok_or(CliError::NotSignedIn)?;

    let store = AppwriteNoteStore::new(config)?.with_session(session.secret.clone());
    let session_context = SessionContext::with_user(session.user);
    let sync = NoteSynchronizer::new(store.clone(), session_context);
    Ok(AppContext { store, sync })
}

async fn run_auth(command: AuthCommands) -> Result<(), CliError> {
    match command {
        AuthCommands::Register {
            email,
            password,
            name,
        } => {
            let account = account_client()?;
            let session = account.register(&email, &password, &name).await?;
            CliSessionStore.save_session(&session)?;
            println!("Registered and signed in as {}", describe_session(&session));
            Ok(())
        }
        AuthCommands::Login { email, password } => {
            let account = account_client()?;
            let session = account.login(&email, &password).await?;
            CliSessionStore.save_session(&session)?;
            println!("Signed in as {}", describe_session(&session));
            Ok(())
        }
        AuthCommands::Status => {
            let Some(session) = CliSessionStore.load_session()? else {
                println!("Not signed in");
                return Ok(());
            };
            let account = account_client()?;
            match account.current_user(&session.secret).await {
                Ok(user) => println!(
                    "Signed in as {}",
                    user.email.as_deref().unwrap_or(&user.id)
                ),
                Err(jot_core::Error::Auth(_)) => {
                    println!("Session expired. Run `jot auth login` again.");
                }
                Err(error) => return Err(error.into()),
            }
            Ok(())
        }
        AuthCommands::Logout => {
            if let Some(session) = CliSessionStore.load_session()? {
                let account = account_client()?;
                if let Err(error) = account.logout(&session.secret).await {
                    tracing::warn!("failed to close remote session: {error}");
                }
            }
            CliSessionStore.clear_session()?;
            println!("Signed out");
            Ok(())
        }
    }
}

fn account_client() -> Result<AccountClient, CliError> {
    let config = RemoteConfig::from_env()?;
    Ok(AccountClient::new(&config)?)
}

fn describe_session(session: &AuthSession) -> String {
    session
        .user
        .email
        .clone()
        .unwrap_or_else(|| session.user.id.clone())
}

#[derive(Debug, Serialize)]
struct NoteListItem {
    id: String,
    title: String,
    content: String,
    color: String,
    pinned: bool,
    image_url: Option<String>,
    created_at: String,
    updated_at: String,
}

fn note_to_list_item(note: &Note, store: &AppwriteNoteStore) -> NoteListItem {
    NoteListItem {
        id: note.id.clone(),
        title: note.title.clone(),
        content: note.content.clone(),
        color: note.color.name().to_string(),
        pinned: note.pinned,
        image_url: note
            .image_id
            .as_deref()
            .map(|image_id| store.image_preview_url(image_id)),
        created_at: note.created_at.to_rfc3339(),
        updated_at: note.updated_at.to_rfc3339(),
    }
}

fn format_note_lines(notes: &[Note], store: &AppwriteNoteStore) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let pin = if note.pinned { "*" } else { " " };
            let mut line = format!(
                "{pin} {}  [{}] {}",
                note.id,
                note.color.name(),
                note.title
            );
            if let Some(image_id) = note.image_id.as_deref() {
                line.push_str(&format!("  (image: {})", store.image_preview_url(image_id)));
            }
            line
        })
        .collect()
}

async fn run_list(search: Option<&str>, as_json: bool) -> Result<(), CliError> {
    let context = signed_in_context()?;
    context.sync.fetch(search).await?;
    let notes = context.sync.notes();

    if as_json {
        let items: Vec<NoteListItem> = notes
            .iter()
            .map(|note| note_to_list_item(note, &context.store))
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if notes.is_empty() {
        println!("No notes");
    } else {
        for line in format_note_lines(&notes, &context.store) {
            println!("{line}");
        }
    }

    Ok(())
}

async fn run_add(
    title: &str,
    content: &str,
    color: &str,
    image_path: Option<&Path>,
) -> Result<(), CliError> {
    let context = signed_in_context()?;
    let color = color.parse()?;
    let image = image_path.map(load_image_asset).transpose()?;

    let note = context
        .sync
        .add(title, content, color, image.as_ref())
        .await?;
    println!("{}", note.id);
    Ok(())
}

async fn run_edit(
    id: &str,
    title: Option<&str>,
    content: Option<&str>,
    color: Option<&str>,
    image_path: Option<&Path>,
    remove_image: bool,
) -> Result<(), CliError> {
    let context = signed_in_context()?;
    context.sync.fetch(None).await?;
    let notes = context.sync.notes();
    let note = resolve_note(&notes, id)?.clone();

    let edit = NoteEdit {
        title: title.unwrap_or(&note.title).to_string(),
        content: content.unwrap_or(&note.content).to_string(),
        color: match color {
            Some(raw) => raw.parse()?,
            None => note.color,
        },
        pinned: None,
        new_image: image_path.map(load_image_asset).transpose()?,
        old_image_id: note.image_id.clone(),
        remove_image,
    };

    let updated = context.sync.update(&note.id, edit).await?;
    println!("{}", updated.id);
    Ok(())
}

async fn run_pin(id: &str) -> Result<(), CliError> {
    let context = signed_in_context()?;
    context.sync.fetch(None).await?;
    let notes = context.sync.notes();
    let note = resolve_note(&notes, id)?.clone();

    let updated = context.sync.toggle_pin(&note).await?;
    println!(
        "{} {}",
        updated.id,
        if updated.pinned { "pinned" } else { "unpinned" }
    );
    Ok(())
}

async fn run_delete(id: &str) -> Result<(), CliError> {
    let context = signed_in_context()?;
    context.sync.fetch(None).await?;
    let notes = context.sync.notes();
    let note = resolve_note(&notes, id)?.clone();

    context
        .sync
        .delete(&note.id, note.image_id.as_deref())
        .await?;
    println!("{}", note.id);
    Ok(())
}

/// Resolve a note by exact id or unique id prefix.
fn resolve_note<'a>(notes: &'a [Note], target: &str) -> Result<&'a Note, CliError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(CliError::EmptyNoteId);
    }

    if let Some(exact) = notes.iter().find(|note| note.id == target) {
        return Ok(exact);
    }

    let matches: Vec<&Note> = notes
        .iter()
        .filter(|note| note.id.starts_with(target))
        .collect();
    match matches.as_slice() {
        [] => Err(CliError::NoteNotFound(target.to_string())),
        [single] => Ok(single),
        _ => Err(CliError::AmbiguousNoteId(format!(
            "Note id prefix '{target}' matches {} notes",
            matches.len()
        ))),
    }
}

fn load_image_asset(path: &Path) -> Result<ImageAsset, CliError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image")
        .to_string();
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok(ImageAsset::new(file_name, mime_type, bytes))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use jot_core::NoteColor;
    use pretty_assertions::assert_eq;

    use super::*;

    fn test_note(id: &str) -> Note {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        Note {
            id: id.to_string(),
            title: "Title".to_string(),
            content: "Content".to_string(),
            owner_id: "user-1".to_string(),
            color: NoteColor::Default,
            pinned: false,
            image_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn resolve_note_matches_exact_id_first() {
        let notes = vec![test_note("abc"), test_note("abcdef")];
        assert_eq!(resolve_note(&notes, "abc").unwrap().id, "abc");
    }

    #[test]
    fn resolve_note_accepts_unique_prefix() {
        let notes = vec![test_note("abcdef"), test_note("xyz123")];
        assert_eq!(resolve_note(&notes, "abc").unwrap().id, "abcdef");
    }

    #[test]
    fn resolve_note_rejects_ambiguous_prefix() {
        let notes = vec![test_note("abc1"), test_note("abc2")];
        assert!(matches!(
            resolve_note(&notes, "abc"),
            Err(CliError::AmbiguousNoteId(_))
        ));
    }

    #[test]
    fn resolve_note_rejects_unknown_and_empty_ids() {
        let notes = vec![test_note("abc")];
        assert!(matches!(
            resolve_note(&notes, "zzz"),
            Err(CliError::NoteNotFound(_))
        ));
        assert!(matches!(
            resolve_note(&notes, "  "),
            Err(CliError::EmptyNoteId)
        ));
    }

    #[test]
    fn list_lines_mark_pinned_notes_and_images() {
        let config = RemoteConfig::new("https://cloud.example.com/v1", "proj").unwrap();
        let store = AppwriteNoteStore::new(config).unwrap();

        let mut pinned = test_note("abc");
        pinned.pinned = true;
        let mut with_image = test_note("def");
        with_image.image_id = Some("img-1".to_string());

        let lines = format_note_lines(&[pinned, with_image], &store);
        assert!(lines[0].starts_with("* abc"));
        assert!(lines[1].contains("/files/img-1/view"));
    }
}
