//! Domain models for the playlist store
//!
//! Records map one-to-one onto the SQLite tables. [`TagSet`] is the only way
//! to hand tag names to a write, so a blank or duplicated tag never reaches
//! the database.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{LibraryError, Result};

/// A submitted playlist as stored locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PlaylistRecord {
    /// Remote playlist id
    pub id: String,
    /// Remote user id of the submitter
    pub user_id: String,
    /// Unix millis; set when soft-deleted
    pub deleted_at: Option<i64>,
    pub created_at: i64,
    /// Unix millis; primary sort key of every listing (descending)
    pub updated_at: i64,
}

impl PlaylistRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Tag row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct Tag {
    /// Opaque generated id
    pub id: String,
    /// Unique, case-sensitive
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }
}

/// A playlist record together with its tag names (sorted ascending)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedPlaylist {
    pub record: PlaylistRecord,
    pub tags: Vec<String>,
}

/// Non-empty list of distinct, non-blank tag names.
///
/// Names are kept exactly as given (no trimming, no case folding) and in
/// input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSet(Vec<String>);

impl TagSet {
    /// Validate a caller-supplied list of tag names
    ///
    /// # Errors
    ///
    /// `LibraryError::InvalidInput` when the list is empty, a name is blank,
    /// or a name appears more than once.
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(invalid("You must include at least one tag".to_string()));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() {
                return Err(invalid("Tag names cannot be blank".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(invalid(format!("Duplicate tag '{}'", name)));
            }
        }

        Ok(Self(names))
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn invalid(message: String) -> LibraryError {
    LibraryError::InvalidInput {
        field: "tags".to_string(),
        message,
    }
}

/// Filter for active-playlist listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistFilter {
    /// Keep playlists carrying at least one of these tags. `None` or an
    /// empty list disables tag filtering.
    pub tag_names: Option<Vec<String>>,
    /// Keep playlists submitted by this user
    pub owner_user_id: Option<String>,
}

impl PlaylistFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tag_names = Some(tags);
        self
    }

    pub fn owned_by(mut self, user_id: impl Into<String>) -> Self {
        self.owner_user_id = Some(user_id.into());
        self
    }

    /// Tag names to filter on, if tag filtering is active
    pub fn active_tags(&self) -> Option<&[String]> {
        self.tag_names
            .as_deref()
            .filter(|tags| !tags.is_empty())
    }
}

/// What `create_or_restore` did to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    /// No record existed
    Created,
    /// A soft-deleted record was made active again
    Restored,
    /// An active record already existed; its tags were replaced
    Resubmitted,
}
