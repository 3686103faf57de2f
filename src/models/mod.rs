pub mod common;
pub mod otp;
pub mod session;

pub use common::*;
pub use otp::*;
pub use session::*;
