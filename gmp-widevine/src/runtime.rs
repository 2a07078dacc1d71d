use crate::{
    AdapterConfig, Error, Result,
    callbacks::EngineCallbacks,
    engine::{CdmFactory, ContentDecryptionModule},
    host::{DecryptorCallback, Platform},
    session::SessionBridge,
};
use log::{debug, info, warn};
use std::sync::{Arc, PoisonError, RwLock};

/// CDM timestamps are in microseconds, the host clock in milliseconds.
pub const ENGINE_TICKS_PER_MS: i64 = 1000;

/// State shared by every object one plugin instance hands to the host.
///
/// Holds the single CDM instance, the decryptor callback registered by the host and the
/// pending session requests. Components receive it at construction instead of reaching for
/// process wide globals, so several independent instances can live side by side.
pub struct Runtime {
    config: AdapterConfig,
    platform: Arc<dyn Platform>,
    engine: RwLock<Option<Arc<dyn ContentDecryptionModule>>>,
    decryptor_host: RwLock<Option<Arc<dyn DecryptorCallback>>>,
    sessions: SessionBridge,
}

impl Runtime {
    pub fn new(config: AdapterConfig, platform: Arc<dyn Platform>) -> Arc<Self> {
        Arc::new(Self {
            config,
            platform,
            engine: RwLock::new(None),
            decryptor_host: RwLock::new(None),
            sessions: SessionBridge::default(),
        })
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    /// Create the CDM instance through `factory`. Does nothing when one already exists.
    pub fn create_engine(self: &Arc<Self>, factory: &dyn CdmFactory) -> Result<()> {
        let mut engine = self.engine.write().unwrap_or_else(PoisonError::into_inner);

        if engine.is_some() {
            warn!("CDM instance already exists, keeping it.");
            return Ok(());
        }

        let host = Arc::new(EngineCallbacks::new(Arc::downgrade(self)));
        let instance = factory
            .create(self.config.interface_version, &self.config.key_system, host)
            .ok_or(Error::EngineUnavailable)?;

        info!(
            "Created CDM instance for {} (interface {}).",
            self.config.key_system, self.config.interface_version
        );
        *engine = Some(instance);
        Ok(())
    }

    /// Drop the CDM instance. Returns whether one was held.
    pub fn release_engine(&self) -> bool {
        let released = self
            .engine
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();

        if released {
            debug!("Released CDM instance.");
        }

        released
    }

    pub fn engine(&self) -> Option<Arc<dyn ContentDecryptionModule>> {
        self.engine
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn decryptor_host(&self) -> Option<Arc<dyn DecryptorCallback>> {
        self.decryptor_host
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_decryptor_host(&self, host: Option<Arc<dyn DecryptorCallback>>) {
        *self
            .decryptor_host
            .write()
            .unwrap_or_else(PoisonError::into_inner) = host;
    }

    pub(crate) fn sessions(&self) -> &SessionBridge {
        &self.sessions
    }

    /// Current wall clock time in CDM units.
    pub fn engine_timestamp(&self) -> i64 {
        self.platform
            .current_time_ms()
            .saturating_mul(ENGINE_TICKS_PER_MS)
    }
}
