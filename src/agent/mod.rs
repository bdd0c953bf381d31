//! Model-backend plumbing: the stateless LLM seam, provider factory and the
//! persona agent that owns the in-memory conversation history.

pub mod persona_agent;
pub mod stateless_llm;
pub mod stateless_llm_factory;

pub use persona_agent::PersonaAgent;
pub use stateless_llm::{ChatMessage, StatelessLLMInterface};
pub use stateless_llm_factory::StatelessLLMFactory;
