mod admin;
mod cleanup;
mod database;

pub use admin::cmd_create_admin;
pub use cleanup::cmd_cleanup_files;
pub use database::cmd_init_db;
