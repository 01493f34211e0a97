//! Authentication: JWT tokens, password hashing, extractors, rate limiting

pub mod extractor;
pub mod jwt;
pub mod password;
pub mod rate_limit;

pub use extractor::{AdminUser, MaybeUser};
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use password::{hash_password, verify_password};
pub use rate_limit::RateLimiter;
