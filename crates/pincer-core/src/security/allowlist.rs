use crate::identity::UserId;
use std::collections::HashSet;

/// The set of callers allowed to use the bot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AllowList {
    /// Everyone passes
    #[default]
    Unrestricted,
    /// Only these identities pass
    Only(HashSet<UserId>),
}

impl AllowList {
    /// Restrict to the given identities
    pub fn only<I, U>(ids: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        Self::Only(ids.into_iter().map(Into::into).collect())
    }

    /// Parse a comma-separated id list; blank means unrestricted
    #[must_use]
    pub fn parse(list: &str) -> Self {
        let ids: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if ids.is_empty() {
            Self::Unrestricted
        } else {
            Self::only(ids)
        }
    }

    /// Whether the identity may pass
    #[must_use]
    pub fn contains(&self, user: &UserId) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Only(ids) => ids.contains(user),
        }
    }

    /// Whether everyone passes
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }
}
