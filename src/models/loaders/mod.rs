pub mod toml_loader;

pub use toml_loader::{load_requests, parse_requests};
