use bridge_traits::playlist_source::RemotePlaylist;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer token for remote calls, tagged with whose token it is.
///
/// A rejected caller token means the caller has to sign in again; a rejected
/// app token is a server-side failure the caller cannot fix.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    Caller(&'a str),
    App(&'a str),
}

impl<'a> Credential<'a> {
    pub fn token(&self) -> &'a str {
        match self {
            Credential::Caller(token) | Credential::App(token) => token,
        }
    }
}

impl fmt::Debug for Credential<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Caller(_) => f.write_str("Caller([REDACTED])"),
            Credential::App(_) => f.write_str("App([REDACTED])"),
        }
    }
}

/// Remote summary of a submitted playlist plus its local tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredPlaylist {
    #[serde(flatten)]
    pub playlist: RemotePlaylist,
    /// Sorted ascending
    pub tags: Vec<String>,
}
