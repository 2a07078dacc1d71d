use crate::{
    Runtime,
    buffer::DecryptedBlock,
    engine::{ContentDecryptionModule, InputBuffer, Status},
    host::{DecryptorCallback, EncryptedBufferMetadata, GmpErr, HostBuffer, HostSessionType},
};
use log::{debug, info, warn};
use std::sync::Arc;

/// Host facing decryptor: session management and decrypt-only calls.
///
/// Every call made before [`Decryptor::init`] or after the CDM was released is logged and
/// ignored.
pub struct Decryptor {
    runtime: Arc<Runtime>,
    callback: Option<Arc<dyn DecryptorCallback>>,
}

impl Decryptor {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            runtime,
            callback: None,
        }
    }

    pub fn init(&mut self, callback: Arc<dyn DecryptorCallback>) {
        let config = self.runtime.config();
        info!("Decryptor init, capabilities {:#x}.", config.capabilities);

        self.runtime.set_decryptor_host(Some(callback.clone()));
        callback.set_capabilities(config.capabilities);
        self.callback = Some(callback);

        match self.runtime.engine() {
            Some(engine) => engine.initialize(
                config.allow_distinctive_identifier,
                config.allow_persistent_state,
            ),
            None => warn!("Decryptor init without a CDM instance."),
        }
    }

    pub fn create_session(
        &self,
        create_session_token: u32,
        promise_id: u32,
        init_data_type: &str,
        init_data: &[u8],
        session_type: HostSessionType,
    ) {
        debug!(
            "create_session token={} promise={} type={} size={} {:?}",
            create_session_token,
            promise_id,
            init_data_type,
            init_data.len(),
            session_type
        );

        if let Some((engine, callback)) = self.bound("create_session") {
            self.runtime.sessions().create_session(
                engine.as_ref(),
                callback.as_ref(),
                create_session_token,
                promise_id,
                init_data_type,
                init_data,
                session_type,
            );
        }
    }

    pub fn load_session(&self, promise_id: u32, session_id: &str) {
        debug!("load_session promise={} session={}", promise_id, session_id);

        if let Some((engine, callback)) = self.bound("load_session") {
            self.runtime.sessions().load_session(
                engine.as_ref(),
                callback.as_ref(),
                promise_id,
                session_id,
            );
        }
    }

    pub fn update_session(&self, promise_id: u32, session_id: &str, response: &[u8]) {
        debug!(
            "update_session promise={} session={} size={}",
            promise_id,
            session_id,
            response.len()
        );

        if let Some((engine, _)) = self.bound("update_session") {
            engine.update_session(promise_id, session_id, response);
        }
    }

    pub fn close_session(&self, promise_id: u32, session_id: &str) {
        debug!("close_session promise={} session={}", promise_id, session_id);

        if let Some((engine, _)) = self.bound("close_session") {
            engine.close_session(promise_id, session_id);
        }
    }

    pub fn remove_session(&self, promise_id: u32, session_id: &str) {
        debug!("remove_session promise={} session={}", promise_id, session_id);

        if let Some((engine, _)) = self.bound("remove_session") {
            engine.remove_session(promise_id, session_id);
        }
    }

    pub fn set_server_certificate(&self, promise_id: u32, certificate: &[u8]) {
        debug!(
            "set_server_certificate promise={} size={}",
            promise_id,
            certificate.len()
        );

        if let Some((engine, _)) = self.bound("set_server_certificate") {
            engine.set_server_certificate(promise_id, certificate);
        }
    }

    /// Decrypt `buffer` in place and hand it back through
    /// [`DecryptorCallback::decrypted`] exactly once.
    pub fn decrypt(&self, mut buffer: HostBuffer, metadata: &EncryptedBufferMetadata) {
        let Some((engine, callback)) = self.bound("decrypt") else {
            return;
        };

        let subsamples = metadata.subsamples();
        let input = InputBuffer {
            data: &buffer.data,
            key_id: &metadata.key_id,
            iv: &metadata.iv,
            subsamples: &subsamples,
            timestamp: self.runtime.engine_timestamp(),
        };

        let mut block = DecryptedBlock::new();
        let status = engine.decrypt(&input, &mut block);

        let result = match (status, block.take_decrypted_buffer()) {
            (Status::Success, Some(decrypted)) => {
                buffer.data.clear();
                buffer.data.extend_from_slice(decrypted.data());
                GmpErr::NoErr
            }
            (Status::Success, None) => {
                warn!("Buffer {} decrypted without output data.", buffer.id);
                GmpErr::GenericErr
            }
            (status, _) => {
                debug!(
                    "Buffer {} (kid {}) failed to decrypt: {:?}",
                    buffer.id,
                    hex::encode(&metadata.key_id),
                    status
                );
                GmpErr::from(status)
            }
        };

        callback.decrypted(buffer, result);
    }

    pub fn decrypting_complete(self) {
        info!("Decrypting complete.");
        self.runtime.set_decryptor_host(None);
    }

    fn bound(
        &self,
        call: &str,
    ) -> Option<(Arc<dyn ContentDecryptionModule>, &Arc<dyn DecryptorCallback>)> {
        let Some(callback) = &self.callback else {
            warn!("Ignoring {} before init.", call);
            return None;
        };

        let Some(engine) = self.runtime.engine() else {
            warn!("Ignoring {}, no CDM instance.", call);
            return None;
        };

        Some((engine, callback))
    }
}
