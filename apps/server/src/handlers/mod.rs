pub(crate) mod auth;
pub(crate) mod command;
pub(crate) mod health;
