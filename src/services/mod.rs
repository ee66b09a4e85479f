pub mod ai;
pub mod auth;
pub mod pro_cache;
pub mod stripe;
pub mod subscription;
