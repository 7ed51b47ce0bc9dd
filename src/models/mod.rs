pub mod booking;
pub mod review;
pub mod service;
pub mod token_blacklist;
pub mod user;
