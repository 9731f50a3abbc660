pub mod price;
pub mod status;
pub mod subscriber;
