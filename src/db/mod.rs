pub mod pool;
pub mod queries;
pub mod queries_functions;
pub mod store;

pub use pool::create_pool;
pub use queries::*;
pub use queries_functions::*;
pub use store::{PgReceiptStore, ReceiptStore};
