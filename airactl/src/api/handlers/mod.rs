//! HTTP request handlers.
//!
//! Handlers are thin: they authenticate, validate, and delegate to the
//! repositories and providers. Anything that has to be atomic (debit + number
//! insert + ledger row, webhook transition + credit) runs inside a single
//! SQLx transaction here.

pub mod numbers;
pub mod payments;
pub mod voice;
pub mod wallet;
