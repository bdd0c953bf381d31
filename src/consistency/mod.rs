//! The consistency-context subsystem: decide when an image should be
//! generated, assemble the visual facts relevant to the request, and build
//! the final image prompt from them.

pub mod prompt;
pub mod resolver;
pub mod store;
pub mod trigger;

pub use prompt::build_prompt;
pub use resolver::resolve_context;
pub use store::{image_key, ContextSnapshot, ContextStore, ImageRecord, PersonaProfile};
pub use trigger::should_generate_image;
