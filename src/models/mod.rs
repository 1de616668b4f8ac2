pub mod share;
pub mod video;

pub use share::{ShareOptions, ShareToken};
pub use video::{Video, VideoFilter};
