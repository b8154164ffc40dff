pub mod actions;
mod app_state;
mod conversation;
pub mod events;
mod scroll;
mod sessions;

pub use app_state::*;
pub use conversation::*;
pub use scroll::*;
pub use sessions::*;
