pub mod booking_service;
pub mod catalog_service;
pub mod review_service;
pub mod user_service;
