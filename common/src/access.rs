//! Who is allowed to run what.
use std::str::FromStr;

use crate::Error;

/// Guild roles the bot knows about. Parsed from the role's display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Administrator,
    Moderator,
    Mechanic,
    Developer,
    Curator,
    Archivist,
    Hacker,
    Hunter,
}

impl FromStr for Role {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Administrator" => Ok(Self::Administrator),
            "Moderator" => Ok(Self::Moderator),
            "Mechanic" => Ok(Self::Mechanic),
            "Developer" => Ok(Self::Developer),
            "Curator" => Ok(Self::Curator),
            "Archivist" => Ok(Self::Archivist),
            "Hacker" => Ok(Self::Hacker),
            "Hunter" => Ok(Self::Hunter),
            _ => Err(Error::UnknownRole(s.to_string())),
        }
    }
}

const STAFF: &[Role] = &[
    Role::Mechanic,
    Role::Developer,
    Role::Curator,
    Role::Archivist,
    Role::Hacker,
    Role::Hunter,
    Role::Administrator,
];

/// Requirement a caller has to meet before a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Everyone,
    /// caller needs at least one of these roles
    AnyRole(&'static [Role]),
    /// like `AnyRole`, but bot guys get in regardless
    AnyRoleOrBotGuy(&'static [Role]),
}

impl Access {
    pub fn permits(&self, roles: &[Role], bot_guy: bool) -> bool {
        match self {
            Access::Everyone => true,
            Access::AnyRole(needed) => roles.iter().any(|r| needed.contains(r)),
            Access::AnyRoleOrBotGuy(needed) => {
                bot_guy || roles.iter().any(|r| needed.contains(r))
            }
        }
    }
}

/// Every command the utilities bot exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtilityCommand {
    CheckLc,
    Ping,
    Approve,
    Pin,
    Unpin,
    GetFixes,
    Hell,
    Mood,
}

impl UtilityCommand {
    pub const ALL: [UtilityCommand; 8] = [
        Self::CheckLc,
        Self::Ping,
        Self::Approve,
        Self::Pin,
        Self::Unpin,
        Self::GetFixes,
        Self::Hell,
        Self::Mood,
    ];

    /// the name users type
    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckLc => "check-lc",
            Self::Ping => "ping",
            Self::Approve => "approve",
            Self::Pin => "pin",
            Self::Unpin => "unpin",
            Self::GetFixes => "get-fixes",
            Self::Hell => "hell",
            Self::Mood => "mood",
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Self::CheckLc => Access::Everyone,
            Self::Ping | Self::Hell => Access::AnyRole(&[Role::Administrator]),
            Self::Mood => Access::AnyRole(&[Role::Moderator]),
            Self::Approve | Self::GetFixes => Access::AnyRoleOrBotGuy(&[Role::Moderator]),
            Self::Pin | Self::Unpin => Access::AnyRole(STAFF),
        }
    }
}

impl FromStr for UtilityCommand {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::UnknownCommand(s.to_string()))
    }
}
