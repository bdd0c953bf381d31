pub mod ollama_llm;
pub mod stateless_llm_interface;

pub use ollama_llm::OllamaLLM;
pub use stateless_llm_interface::{ChatMessage, StatelessLLMInterface};
