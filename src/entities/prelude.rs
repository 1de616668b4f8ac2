pub use super::share_tokens::Entity as ShareTokens;
pub use super::users::Entity as Users;
pub use super::videos::Entity as Videos;
