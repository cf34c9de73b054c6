//! Client-side note state synchronization.
//!
//! Owns the authoritative in-memory view of the signed-in user's notes and
//! keeps it reconciled against the remote store: optimistic mutation where
//! the contract allows it, resynchronization by refetch where it does not.
//! Every observable state change is a single atomic snapshot swap published
//! through a watch channel, so subscribers see either the old collection or
//! the new one, never a partial edit.
//!
//! Known consistency gap, accepted by design: a `fetch` that completes after
//! a newer local mutation replaces the whole collection and can briefly
//! revert that mutation until the next fetch.

use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::models::{validate_note_fields, ImageAsset, Note, NoteColor};
use crate::remote::{ImageField, NoteChanges, NoteDraft, NoteStore};
use crate::session::SessionContext;

/// Snapshot published to subscribers after every state transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesSnapshot {
    pub notes: Vec<Note>,
    pub loading: bool,
}

/// One edit submitted against an existing note.
///
/// `new_image` wins over `remove_image`; when neither is set the stored
/// image reference is left untouched.
#[derive(Debug, Clone, Default)]
pub struct NoteEdit {
    pub title: String,
    pub content: String,
    pub color: NoteColor,
    pub pinned: Option<bool>,
    pub new_image: Option<ImageAsset>,
    pub old_image_id: Option<String>,
    pub remove_image: bool,
}

/// Owns the ordered note collection for the current user.
///
/// Mutations run Submitting -> Committed | Failed; the committed path is the
/// only one that touches the published collection, except for the optimistic
/// removal in [`NoteSynchronizer::delete`].
pub struct NoteSynchronizer<S> {
    store: S,
    session: SessionContext,
    state: watch::Sender<NotesSnapshot>,
}

impl<S: NoteStore> NoteSynchronizer<S> {
    #[must_use]
    pub fn new(store: S, session: SessionContext) -> Self {
        let (state, _) = watch::channel(NotesSnapshot::default());
        Self {
            store,
            session,
            state,
        }
    }

    /// Subscribe to collection snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NotesSnapshot> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> NotesSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn notes(&self) -> Vec<Note> {
        self.state.borrow().notes.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Replace the collection with the server's view.
    ///
    /// Does nothing when no user is signed in. On failure the stale
    /// collection stays visible and only the loading flag clears.
    pub async fn fetch(&self, title_filter: Option<&str>) -> Result<()> {
        let Some(user) = self.session.current_user() else {
            return Ok(());
        };

        self.state.send_modify(|snapshot| snapshot.loading = true);
        match self.store.list(&user.id, title_filter).await {
            Ok(notes) => {
                self.state.send_modify(|snapshot| {
                    snapshot.notes = notes;
                    snapshot.loading = false;
                });
                Ok(())
            }
            Err(error) => {
                self.state.send_modify(|snapshot| snapshot.loading = false);
                Err(error)
            }
        }
    }

    /// Create a note for the signed-in user, uploading the image first when
    /// one is attached.
    ///
    /// An upload failure aborts the whole operation; no document is created
    /// and nothing is published.
    pub async fn add(
        &self,
        title: &str,
        content: &str,
        color: NoteColor,
        image: Option<&ImageAsset>,
    ) -> Result<Note> {
        validate_note_fields(title, content)?;
        let user = self
            .session
            .current_user()
            .ok_or_else(|| Error::Auth("no active session".to_string()))?;

        let image_id = match image {
            Some(asset) => Some(self.store.upload_image(asset).await?),
            None => None,
        };

        tracing::debug!(title, "submitting note create");
        let created = self
            .store
            .create(NoteDraft {
                title: title.to_string(),
                content: content.to_string(),
                owner_id: user.id,
                color,
                image_id,
            })
            .await?;

        self.commit_upsert(created.clone());
        Ok(created)
    }

    /// Apply an edit to an existing note.
    ///
    /// The image reference is resolved before the document write: a new
    /// asset uploads and replaces (the old file is deleted best-effort), the
    /// remove flag clears, otherwise the field is left untouched. A document
    /// failure leaves the local collection unchanged.
    pub async fn update(&self, id: &str, edit: NoteEdit) -> Result<Note> {
        validate_note_fields(&edit.title, &edit.content)?;

        let image = self.resolve_image_field(&edit).await?;

        tracing::debug!(id, "submitting note update");
        let updated = self
            .store
            .update(
                id,
                NoteChanges {
                    title: edit.title,
                    content: edit.content,
                    color: edit.color,
                    image,
                    pinned: edit.pinned,
                },
            )
            .await?;

        self.commit_upsert(updated.clone());
        Ok(updated)
    }

    /// Delete a note, optimistically removing it from the published
    /// collection before the remote call resolves.
    ///
    /// If the document delete fails, the collection is resynchronized with a
    /// full refetch and the original error is re-raised. The attached image,
    /// when given, is deleted best-effort after a successful document delete.
    pub async fn delete(&self, id: &str, image_id: Option<&str>) -> Result<()> {
        self.state
            .send_modify(|snapshot| snapshot.notes.retain(|note| note.id != id));

        tracing::debug!(id, "submitting note delete");
        if let Err(error) = self.store.delete(id).await {
            tracing::debug!(id, "note delete failed, resynchronizing");
            if let Err(refetch_error) = self.fetch(None).await {
                tracing::warn!(id, "resync after failed delete also failed: {refetch_error}");
            }
            return Err(error);
        }

        if let Some(image_id) = image_id {
            if let Err(error) = self.store.delete_image(image_id).await {
                tracing::warn!(image_id, "failed to delete image of removed note: {error}");
            }
        }
        Ok(())
    }

    /// Flip a note's pin flag, leaving every other field as it is.
    pub async fn toggle_pin(&self, note: &Note) -> Result<Note> {
        self.update(
            &note.id,
            NoteEdit {
                title: note.title.clone(),
                content: note.content.clone(),
                color: note.color,
                pinned: Some(!note.pinned),
                ..NoteEdit::default()
            },
        )
        .await
    }

    /// Drop all local state (sign-out path).
    pub fn clear(&self) {
        self.state.send_modify(|snapshot| {
            snapshot.notes.clear();
            snapshot.loading = false;
        });
    }

    /// Follow session identity changes: fetch on sign-in, clear on sign-out.
    ///
    /// Runs until the session context is dropped.
    pub async fn watch_session(&self) {
        let mut session = self.session.subscribe();
        loop {
            let signed_in = session.borrow_and_update().is_some();
            if signed_in {
                if let Err(error) = self.fetch(None).await {
                    tracing::warn!("fetch after sign-in failed: {error}");
                }
            } else {
                self.clear();
            }

            if session.changed().await.is_err() {
                break;
            }
        }
    }

    async fn resolve_image_field(&self, edit: &NoteEdit) -> Result<ImageField> {
        if let Some(asset) = &edit.new_image {
            // The new upload must succeed before anything else changes.
            let new_id = self.store.upload_image(asset).await?;
            if let Some(old_id) = &edit.old_image_id {
                if let Err(error) = self.store.delete_image(old_id).await {
                    tracing::warn!(
                        image_id = %old_id,
                        "failed to delete replaced image: {error}"
                    );
                }
            }
            return Ok(ImageField::Set(new_id));
        }

        if edit.remove_image {
            if let Some(old_id) = &edit.old_image_id {
                if let Err(error) = self.store.delete_image(old_id).await {
                    tracing::warn!(
                        image_id = %old_id,
                        "failed to delete removed image: {error}"
                    );
                }
                return Ok(ImageField::Clear);
            }
        }

        Ok(ImageField::Keep)
    }

    /// Commit point for create/update: replace any entry with the same id,
    /// re-sort, publish.
    fn commit_upsert(&self, note: Note) {
        tracing::debug!(id = %note.id, "note mutation committed");
        self.state.send_modify(|snapshot| {
            snapshot.notes.retain(|existing| existing.id != note.id);
            snapshot.notes.insert(0, note);
            sort_notes(&mut snapshot.notes);
        });
    }
}

/// Pinned notes first, then most recently updated. Stable within ties.
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
}
