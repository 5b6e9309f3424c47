pub mod blog;
pub mod comment;
pub mod session;
pub mod settings;
pub mod user;
