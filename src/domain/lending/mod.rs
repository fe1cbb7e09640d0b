//! Lending domain - the flash-loan provider and the borrower callback

mod fee;
mod lender_interface;

pub use fee::{compute_flash_fee, FeeRounding};
pub use lender_interface::{FlashBorrower, FlashLender};
