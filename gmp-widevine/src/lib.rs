#![cfg_attr(docsrs, feature(doc_cfg))]

//! This crate bridges a media host speaking the session/decoder plugin protocol onto a content
//! decryption module (CDM) that speaks an asynchronous promise/callback protocol.
//!
//! The host drives a [`Plugin`], which hands out a [`Decryptor`], a [`VideoDecoder`] and an
//! [`AsyncShutdown`] object. Everything the host provides (callbacks, main thread dispatch,
//! record storage) is reached through the traits in [`host`], and the CDM itself through the
//! traits in [`engine`].
//!
//! # Example
//!
//! ```no_run
//! use gmp_widevine::{AdapterConfig, Plugin, PluginApi, HostApi, engine::CdmFactory, host::Platform};
//! use std::sync::Arc;
//!
//! fn start(
//!     platform: Arc<dyn Platform>,
//!     factory: Arc<dyn CdmFactory>,
//! ) -> gmp_widevine::Result<()> {
//!     let plugin = Plugin::init(platform, factory, AdapterConfig::default())?;
//!
//!     if let Ok(PluginApi::Decryptor(decryptor)) = plugin.get_api("eme-decryptor", HostApi::None) {
//!         // decryptor.init(callback) ...
//! #       drop(decryptor);
//!     }
//!
//!     plugin.shutdown();
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod engine;
pub mod host;
pub mod reframe;
pub mod status;

mod callbacks;
mod config;
mod decoder;
mod decryptor;
mod error;
mod plugin;
mod reader;
mod runtime;
mod session;
mod storage;

pub use config::{AdapterConfig, AdapterConfigBuilder};
pub use decoder::{DecoderState, VideoDecoder};
pub use decryptor::Decryptor;
pub use error::Error;
pub use plugin::{
    API_ASYNC_SHUTDOWN, API_DECRYPTOR, API_VIDEO_DECODER, AsyncShutdown, HostApi, Plugin,
    PluginApi,
};
pub use reader::Reader;
pub use runtime::Runtime;

/// A `Result` alias where the `Err` case is `gmp_widevine::Error`.
pub type Result<T> = std::result::Result<T, Error>;
