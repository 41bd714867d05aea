// Library interface for feedfinder modules
// This allows tests and the binary to import modules

pub mod candidates;
pub mod favicon;
pub mod fetcher;
pub mod finder;
pub mod llm;
pub mod server;
pub mod validation;
