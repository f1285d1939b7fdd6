//! Extracting transaction details from photos of receipts.
//!
//! The image is sent to a generative AI service which is asked to reply with
//! the total amount, the date and a suggested category as JSON.

mod endpoint;
mod parse;
mod scanner;

pub use endpoint::scan_receipt_endpoint;
pub use scanner::{DEFAULT_GEMINI_BASE_URL, GeminiScanner, ReceiptScanner};

/// The largest receipt image accepted, in bytes.
pub const MAX_RECEIPT_SIZE: usize = 5 * 1024 * 1024;

/// The multipart field that holds the receipt image.
pub const RECEIPT_FIELD: &str = "receipt";
