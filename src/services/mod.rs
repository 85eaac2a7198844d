pub mod editor;
pub mod export;
pub mod imagery;
pub mod llm;
pub mod render;
pub mod script;
pub mod workflow;
