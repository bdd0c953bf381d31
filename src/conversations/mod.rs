pub mod single_conversation;
pub mod types;

pub use single_conversation::{process_single_conversation, APOLOGY_SUFFIX};
pub use types::{Transcript, Turn};
