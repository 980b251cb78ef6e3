pub mod contact;
pub mod env;
pub mod fixture;
pub mod init;
pub mod user;
