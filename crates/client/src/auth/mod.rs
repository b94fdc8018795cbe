//! Bearer-token lifecycle: login strategies, caching, refresh, revocation.

mod cache;
mod login;
mod token;

pub use token::BearerToken;

pub(crate) use cache::TokenCache;
