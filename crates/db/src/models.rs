pub mod tenant;
pub mod user;
