pub mod gemini;
pub mod library_persistence;
pub mod mock;
