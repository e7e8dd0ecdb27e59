pub mod filter;
pub mod period;
pub mod window;
