pub mod api;
pub mod auth;
pub mod avatar;

pub use api::SearchClient;
pub use auth::{AppCredentials, Authenticator, TokenStore};
pub use avatar::AvatarLoader;

#[cfg(test)]
mod tests;
