pub mod share;
pub mod user;
pub mod video;
