pub mod category;
pub mod function;
pub mod user;
