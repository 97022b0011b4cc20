pub mod password;
pub mod tokens;

pub use password::{PasswordError, PasswordService};
pub use tokens::{Claims, TokenError, TokenService};
