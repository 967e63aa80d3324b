//! Successor chaining strategies.
//!
//! Newer platform decoders can be told which decoder follows them and start
//! it themselves the instant they finish. Older ones cannot; for those the
//! engine keeps a non-owning link to the successor and starts it by hand
//! after a short delay once the completion signal arrives. The strategy is
//! picked once per decoder by probing
//! [`MediaDecoder::supports_next_decoder`].

use crate::config::ChainingMode;
use bridge_traits::error::Result;
use bridge_traits::MediaDecoder;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::warn;

/// Links a decoder to the decoder that plays after it.
pub(crate) trait ChainStrategy: Send + Sync {
    fn mode(&self) -> ChainingMode;

    /// Point `decoder` at `successor`, or clear the link with `None`.
    fn link(
        &self,
        decoder: &Arc<dyn MediaDecoder>,
        successor: Option<&Arc<dyn MediaDecoder>>,
    ) -> Result<()>;

    /// Decoder that must be started by hand when `decoder` completes.
    ///
    /// Always `None` for native chaining: the platform already started it.
    fn relay_target(&self) -> Option<Arc<dyn MediaDecoder>>;
}

/// Chaining through the platform primitive.
#[derive(Debug, Default)]
pub(crate) struct NativeChain;

impl ChainStrategy for NativeChain {
    fn mode(&self) -> ChainingMode {
        ChainingMode::Native
    }

    fn link(
        &self,
        decoder: &Arc<dyn MediaDecoder>,
        successor: Option<&Arc<dyn MediaDecoder>>,
    ) -> Result<()> {
        decoder.set_next_decoder(successor.cloned())
    }

    fn relay_target(&self) -> Option<Arc<dyn MediaDecoder>> {
        None
    }
}

/// Manual relay on completion.
///
/// Holds only a `Weak` link: the handoff controller owns the successor, and
/// once it releases it the relay silently has nothing to start.
#[derive(Default)]
pub(crate) struct RelayChain {
    successor: Mutex<Option<Weak<dyn MediaDecoder>>>,
}

impl ChainStrategy for RelayChain {
    fn mode(&self) -> ChainingMode {
        ChainingMode::Relay
    }

    fn link(
        &self,
        _decoder: &Arc<dyn MediaDecoder>,
        successor: Option<&Arc<dyn MediaDecoder>>,
    ) -> Result<()> {
        *self.successor.lock() = successor.map(Arc::downgrade);
        Ok(())
    }

    fn relay_target(&self) -> Option<Arc<dyn MediaDecoder>> {
        self.successor.lock().as_ref().and_then(Weak::upgrade)
    }
}

impl fmt::Debug for RelayChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayChain")
            .field("linked", &self.relay_target().is_some())
            .finish()
    }
}

/// Choose the strategy for `decoder`.
pub(crate) fn select(mode: ChainingMode, decoder: &dyn MediaDecoder) -> Box<dyn ChainStrategy> {
    match mode {
        ChainingMode::Relay => Box::new(RelayChain::default()),
        ChainingMode::Auto if decoder.supports_next_decoder() => Box::new(NativeChain),
        ChainingMode::Auto => Box::new(RelayChain::default()),
        ChainingMode::Native if decoder.supports_next_decoder() => Box::new(NativeChain),
        ChainingMode::Native => {
            warn!("Native chaining requested but decoder does not support it; using relay");
            Box::new(RelayChain::default())
        }
    }
}
