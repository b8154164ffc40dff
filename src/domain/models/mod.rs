mod action;
mod chat_type;
mod event;
mod loading;
mod message;
mod responder;
mod session;
mod storage;
mod textarea;

pub use action::*;
pub use chat_type::*;
pub use event::*;
pub use loading::*;
pub use message::*;
pub use responder::*;
pub use session::*;
pub use storage::*;
pub use textarea::*;
