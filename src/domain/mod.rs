//! Domain primitives shared by the services.
//!
//! Time and randomness are injected through the [`Clock`] and [`RandomSource`]
//! traits so that expiry checks and token generation are deterministic in tests.

pub mod clock;
pub mod random;

pub use clock::{Clock, ManualClock, SystemClock};
pub use random::{OsRandom, RandomSource, SeededRandom};

use serde::Serialize;

/// Identity of the caller as seen by the access gateway.
///
/// Built from the session at the HTTP boundary; the core never authenticates.
///
/// # Examples
///
/// ```rust
/// use vidshare::domain::Requester;
///
/// let anon = Requester::anonymous();
/// assert!(!anon.is_authenticated());
///
/// let admin = Requester::user(1, true);
/// assert!(admin.is_authenticated() && admin.is_admin);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Requester {
    pub user_id: Option<i32>,
    pub is_admin: bool,
}

impl Requester {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            user_id: None,
            is_admin: false,
        }
    }

    #[must_use]
    pub const fn user(user_id: i32, is_admin: bool) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}
