use serde::{Deserialize, Serialize};

/// Trip style shared by blogs and groups. Blogs default to `Other`,
/// groups to `Mixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Wild,
    Mountain,
    International,
    Beaches,
    Religious,
    Cultural,
    Adventure,
    Luxury,
    Budget,
    Family,
    Solo,
    Mixed,
    Other,
}
