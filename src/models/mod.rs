pub mod challenge;
pub mod mfa;
pub mod points;
pub mod receipt;
pub mod shopping;

pub use challenge::{Challenge, ChallengeTemplate, DailyChallengeReport, MonthlyResetReport};
pub use mfa::{TotpSetup, TotpVerification, UserMfa};
pub use points::{NewPointsTransaction, PointsSource, PointsSummary, PointsTransaction};
pub use receipt::{
    ManualReceipt, NewReceipt, ProcessedReceipt, Receipt, ReceiptData, ReceiptItem, SavedCapture,
};
pub use shopping::{Category, ItemPrice, PriceMatch, ShoppingItem, StoreRecommendation};
