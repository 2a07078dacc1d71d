use crate::{
    AdapterConfig, Decryptor, Result, Runtime, VideoDecoder,
    engine::CdmFactory,
    host::{AsyncShutdownHost, GmpErr, Platform},
};
use log::{error, info, warn};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

pub const API_DECRYPTOR: &str = "eme-decryptor";
pub const API_VIDEO_DECODER: &str = "decode-video";
pub const API_ASYNC_SHUTDOWN: &str = "async-shutdown";

/// Host object passed along with an API request.
#[derive(Clone, Default)]
pub enum HostApi {
    #[default]
    None,
    AsyncShutdownHost(Arc<dyn AsyncShutdownHost>),
}

/// Plugin object handed back for an API request.
pub enum PluginApi {
    Decryptor(Decryptor),
    VideoDecoder(VideoDecoder),
    AsyncShutdown(AsyncShutdown),
}

/// One loaded plugin: the CDM module, its single instance and the objects built on top.
pub struct Plugin {
    runtime: Arc<Runtime>,
    factory: Arc<dyn CdmFactory>,
}

impl Plugin {
    pub fn init(
        platform: Arc<dyn Platform>,
        factory: Arc<dyn CdmFactory>,
        config: AdapterConfig,
    ) -> Result<Self> {
        factory.initialize_module();
        info!("CDM version {}", factory.version());

        let runtime = Runtime::new(config, platform);

        if let Err(e) = runtime.create_engine(factory.as_ref()) {
            error!("Cannot create CDM instance: {}", e);
            factory.deinitialize_module();
            return Err(e);
        }

        Ok(Self { runtime, factory })
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Build the object the host asked for by name.
    pub fn get_api(&self, name: &str, host_api: HostApi) -> std::result::Result<PluginApi, GmpErr> {
        info!("API requested: {}", name);

        let runtime = self.runtime.clone();
        let api = panic::catch_unwind(AssertUnwindSafe(move || match name {
            API_DECRYPTOR => Ok(PluginApi::Decryptor(Decryptor::new(runtime))),
            API_VIDEO_DECODER => Ok(PluginApi::VideoDecoder(VideoDecoder::new(runtime))),
            API_ASYNC_SHUTDOWN => match host_api {
                HostApi::AsyncShutdownHost(host) => {
                    Ok(PluginApi::AsyncShutdown(AsyncShutdown::new(runtime, host)))
                }
                HostApi::None => {
                    warn!("{} requested without a shutdown host.", name);
                    Err(GmpErr::InvalidArgErr)
                }
            },
            _ => Err(GmpErr::NotImplementedErr),
        }));

        api.unwrap_or_else(|_| {
            error!("Building {} panicked.", name);
            Err(GmpErr::NotImplementedErr)
        })
    }

    pub fn shutdown(self) {
        info!("Plugin shutdown.");
        self.runtime.release_engine();
        self.factory.deinitialize_module();
    }
}

/// Lets the host wait for the CDM to be released before unloading the plugin.
pub struct AsyncShutdown {
    runtime: Arc<Runtime>,
    host: Arc<dyn AsyncShutdownHost>,
}

impl AsyncShutdown {
    pub fn new(runtime: Arc<Runtime>, host: Arc<dyn AsyncShutdownHost>) -> Self {
        Self { runtime, host }
    }

    pub fn begin_shutdown(self) {
        if !self.runtime.release_engine() {
            warn!("Async shutdown without a CDM instance.");
        }

        self.host.shutdown_complete();
    }
}
