pub mod otp_records;

pub use otp_records as otp_record_entity;
