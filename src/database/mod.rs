pub mod connection;
pub mod memory_store;
pub mod otp_store;

pub use connection::*;
pub use memory_store::MemoryOtpStore;
pub use otp_store::{OtpStore, SeaOrmOtpStore};
