// Library interface for pagemark modules
// This allows tests and other binaries to import modules

pub mod cookies;
pub mod extract;
pub mod image_search;
pub mod llm;
pub mod markdown;
pub mod scraping;
pub mod server;
