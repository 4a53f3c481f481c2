pub mod session;
pub mod token;
pub mod token_store;

pub use session::{Session, SharedSession};
pub use token::decode_claims;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
