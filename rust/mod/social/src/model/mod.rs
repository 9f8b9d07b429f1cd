mod blog;
mod category;
mod feed;
mod group;
mod poll;
mod reaction;
mod user;

pub use blog::*;
pub use category::*;
pub use feed::*;
pub use group::*;
pub use poll::*;
pub use reaction::*;
pub use user::*;
