pub mod functions;
pub mod handlers;
pub mod shopping;

pub use functions::*;
pub use handlers::*;
