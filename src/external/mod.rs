pub mod fast2sms;
pub mod sms;

pub use fast2sms::*;
pub use sms::*;
