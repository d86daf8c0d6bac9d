pub mod jwt;
pub mod markdown;
pub mod password;
pub mod random;

pub use jwt::encode_token;
pub use markdown::render_markdown;
pub use password::{hash_password, verify_password};
pub use random::{generate_otp_code, generate_password};
