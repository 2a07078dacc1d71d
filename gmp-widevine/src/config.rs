use crate::{
    Error, Result,
    engine::{CDM_INTERFACE_VERSION, WIDEVINE_KEY_SYSTEM},
    host::{CAP_DECRYPT_AND_DECODE_VIDEO, CAP_DECRYPT_AUDIO, CAP_DECRYPT_VIDEO},
};

/// Settings shared by every component of a plugin instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Key system requested from the CDM.
    pub key_system: String,
    /// CDM interface version requested from the factory.
    pub interface_version: i32,
    pub allow_distinctive_identifier: bool,
    pub allow_persistent_state: bool,
    /// Capability flags reported to the host on decryptor init.
    pub capabilities: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            key_system: WIDEVINE_KEY_SYSTEM.to_owned(),
            interface_version: CDM_INTERFACE_VERSION,
            allow_distinctive_identifier: false,
            allow_persistent_state: true,
            capabilities: CAP_DECRYPT_AUDIO | CAP_DECRYPT_VIDEO | CAP_DECRYPT_AND_DECODE_VIDEO,
        }
    }
}

impl AdapterConfig {
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::new()
    }
}

/// Builder for [`AdapterConfig`].
///
/// # Example
///
/// ```
/// use gmp_widevine::AdapterConfig;
///
/// let config = AdapterConfig::builder()
///     .key_system("com.widevine.alpha")
///     .allow_persistent_state(false)
///     .build()?;
/// # Ok::<(), gmp_widevine::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct AdapterConfigBuilder {
    config: AdapterConfig,
}

impl AdapterConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_system<T: Into<String>>(mut self, key_system: T) -> Self {
        self.config.key_system = key_system.into();
        self
    }

    pub fn interface_version(mut self, version: i32) -> Self {
        self.config.interface_version = version;
        self
    }

    pub fn allow_distinctive_identifier(mut self, allow: bool) -> Self {
        self.config.allow_distinctive_identifier = allow;
        self
    }

    pub fn allow_persistent_state(mut self, allow: bool) -> Self {
        self.config.allow_persistent_state = allow;
        self
    }

    pub fn capabilities(mut self, capabilities: u64) -> Self {
        self.config.capabilities = capabilities;
        self
    }

    pub fn build(self) -> Result<AdapterConfig> {
        if self.config.key_system.trim().is_empty() {
            return Err(Error::InvalidConfig("key system is empty".to_owned()));
        }

        if self.config.interface_version <= 0 {
            return Err(Error::InvalidConfig(format!(
                "interface version {} is not positive",
                self.config.interface_version
            )));
        }

        Ok(self.config)
    }
}
