pub mod mip;
pub mod network;
pub mod utils;
