pub mod booking_dto;
pub mod review_dto;
pub mod service_dto;
pub mod user_dto;
