// src/diary.rs

use crate::storage::{self, SharedStore, NOTES_KEY};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const UNTITLED: &str = "Untitled";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(alias = "text")]
    pub body: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiaryError {
    #[error("no note with id '{0}'")]
    NotFound(String),
    #[error("a note needs a title or some text")]
    Empty,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The `n` most recently updated of `notes`, newest first.
pub fn most_recent(notes: &[Note], n: usize) -> Vec<Note> {
    let mut notes = notes.to_vec();
    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    notes.truncate(n);
    notes
}

/// Note CRUD persisted as one JSON list under the notes key.
pub struct DiaryStore {
    store: SharedStore,
}

impl DiaryStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Notes in stored order (newest creation first).
    pub fn list(&self) -> Vec<Note> {
        storage::get_json(&*self.store, NOTES_KEY, Vec::new())
    }

    fn write(&self, notes: &[Note]) {
        storage::set_json(&*self.store, NOTES_KEY, notes);
    }

    /// Creates a note when `id` is `None`, otherwise updates that note in place.
    pub fn save(&self, id: Option<&str>, title: &str, text: &str) -> Result<Note, DiaryError> {
        let title = title.trim();
        if title.is_empty() && text.trim().is_empty() {
            return Err(DiaryError::Empty);
        }
        let title = if title.is_empty() { UNTITLED } else { title };

        let mut notes = self.list();
        let now = now_millis();

        let Some(id) = id else {
            let note = Note {
                id: uuid::Uuid::new_v4().to_string(),
                title: title.to_string(),
                body: text.to_string(),
                created_at: now,
                updated_at: now,
            };
            notes.insert(0, note.clone());
            self.write(&notes);
            log::debug!("Created note {}", note.id);
            return Ok(note);
        };

        let note = notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DiaryError::NotFound(id.to_string()))?;
        note.title = title.to_string();
        note.body = text.to_string();
        // Keep updates strictly ordered even within the same millisecond.
        note.updated_at = now.max(note.updated_at.saturating_add(1));
        let updated = note.clone();

        self.write(&notes);
        log::debug!("Updated note {}", updated.id);
        Ok(updated)
    }

    /// Removes the note with `id`. Unknown ids are ignored.
    pub fn delete(&self, id: &str) -> Vec<Note> {
        let mut notes = self.list();
        let before = notes.len();
        notes.retain(|n| n.id != id);
        if notes.len() != before {
            self.write(&notes);
            log::debug!("Deleted note {}", id);
        }
        notes
    }
}
