pub mod access;
pub use access::{AccessDecision, AccessError, AccessGateway, AccessRoute, DenyReason};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod share_service;
pub mod share_service_impl;
pub use share_service::{ShareError, ShareLink, ShareService};
pub use share_service_impl::SeaOrmShareService;

pub mod video_service;
pub mod video_service_impl;
pub use video_service::{UploadRequest, VideoError, VideoService};
pub use video_service_impl::SeaOrmVideoService;
