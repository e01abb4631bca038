pub mod compile;
pub mod doctor;
pub mod filter;
