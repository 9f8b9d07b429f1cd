use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A user's reaction state on one subject after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub active: bool,
    pub count: usize,
}

/// What a reaction is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Blog,
    Discussion,
    Favorite,
}

/// Flip `user`'s presence in `set`. The count is always the set size, so a
/// toggle moves it by exactly one and two toggles restore it.
pub fn toggle(set: &mut BTreeSet<String>, user: &str) -> Reaction {
    let active = if set.remove(user) {
        false
    } else {
        set.insert(user.to_string());
        true
    };
    Reaction {
        active,
        count: set.len(),
    }
}
