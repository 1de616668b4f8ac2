pub mod prelude;

pub mod share_tokens;
pub mod users;
pub mod videos;
