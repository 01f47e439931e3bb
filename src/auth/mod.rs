pub mod extract;
pub mod password;
pub mod tokens;

pub use extract::{AuthUser, MaybeUser};
pub use tokens::{Claims, TokenKind, TokenPair};
