pub mod claim_store;
pub mod codec;
pub mod refresh;

pub use claim_store::{ClaimStore, Claims};
pub use codec::{HmacTokenCodec, TOKEN_ALGORITHM, TokenCodec, TokenError};
pub use refresh::{RefreshConfig, TokenRefresh, bearer_token};
