pub mod account;
pub mod auth;
pub mod friends;
pub mod home;
