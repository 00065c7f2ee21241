// Web interface module root
pub mod routes;
pub mod server;
pub mod types;

// Re-export commonly used items
pub use routes::*;
pub use server::*;
