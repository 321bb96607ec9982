use std::sync::Arc;

use crate::engine::{ClEngine, CryptoEngine};

/// Entry point of the protocol layer. Issuer, holder, registry and verifier operations are
/// implemented on this type across the crate's modules; all of them delegate the
/// cryptography to the configured [`CryptoEngine`].
#[derive(Debug, Clone)]
pub struct AnonCreds {
    engine: Arc<dyn CryptoEngine>,
}

impl AnonCreds {
    pub fn new(engine: Arc<dyn CryptoEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &dyn CryptoEngine {
        self.engine.as_ref()
    }
}

impl Default for AnonCreds {
    fn default() -> Self {
        Self::new(Arc::new(ClEngine))
    }
}
