pub use std::result::Result as StdResult;
pub use std::time::Instant;

pub use anyhow::{anyhow, Context};
pub use tracing::{debug, info, instrument, warn};

pub type AHashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
pub type Result<T = (), E = anyhow::Error> = StdResult<T, E>;
