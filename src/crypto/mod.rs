//! Master secret management and envelope encryption.

mod envelope;
mod key;

pub use envelope::{EnvelopeCipher, derive_work_key, open, seal};
pub use key::{KeyManager, MASTER_KEY_BLOB, MASTER_SECRET_LEN, MasterSecret};
