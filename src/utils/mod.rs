pub mod jwt;
pub mod phone;
pub mod otp_hash;
pub mod code_generator;

pub use jwt::*;
pub use phone::*;
pub use otp_hash::*;
pub use code_generator::generate_six_digit_code;
