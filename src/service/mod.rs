pub mod audit;
pub mod capture;
pub mod category;
pub mod duplicate;
pub mod extraction;
pub mod jobs;
pub mod mfa;
pub mod offline;
pub mod points;
pub mod rate_limit;
pub mod recommender;
pub mod sessions;
pub mod shopping;
pub mod totp;

pub use capture::{CaptureInput, CaptureOutcome, CaptureService};
pub use category::guess_category;
pub use duplicate::{check_for_duplicates, DuplicateCheck, ReceiptHistory};
pub use extraction::{
    parse_receipt_text, HttpOcrRecognizer, PlainTextRecognizer, ReceiptParser, TextRecognizer,
};
pub use jobs::JobService;
pub use mfa::MfaService;
pub use offline::{OfflineQueue, SubmissionTransport, SyncBatch, SYNC_TAG};
pub use points::calculate_points;
pub use recommender::{generate_mock_store_recommendations, StoreCatalog};
pub use sessions::SessionMap;
pub use shopping::{ShoppingList, ShoppingService};
