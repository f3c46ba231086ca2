// Library exports for the binary and integration tests
pub mod clock;
pub mod config;
pub mod handlers;
pub mod ledger;
pub mod notify;
