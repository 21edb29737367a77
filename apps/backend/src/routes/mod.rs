pub mod chat;
pub mod courses;
pub mod learning_path;
pub mod problems;
pub mod users;
