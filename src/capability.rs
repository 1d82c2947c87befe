//! Not-yet-available collaborator surface.
//!
//! The table, tournament, draft and game subsystems live outside this core.
//! Their session entry points exist so callers have a stable, typed surface,
//! but every request is answered with an explicit
//! [`crate::SessionError::CapabilityUnavailable`] until a backing
//! implementation is wired in.

use std::fmt;

/// Domain subsystems reachable through the session once implemented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Creating, joining and watching tables.
    Tables,
    /// Tournament play and standings.
    Tournaments,
    /// Draft participation and card picks.
    Drafts,
    /// In-game player actions.
    GameActions,
    /// Replaying finished games.
    Replays,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Capability::Tables => "table play",
            Capability::Tournaments => "tournament play",
            Capability::Drafts => "drafting",
            Capability::GameActions => "game actions",
            Capability::Replays => "game replay",
        };
        f.write_str(label)
    }
}
