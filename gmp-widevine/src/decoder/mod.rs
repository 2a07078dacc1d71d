//! Host video decoder backed by the CDM's decrypt-and-decode path.
//!
//! Frames are reframed and decoded on one worker thread per decoder, in submission order.
//! Results travel back to the host through the platform's main thread dispatcher.

mod frame;
mod job;
mod worker;

use crate::{
    Error, Result, Runtime,
    buffer::{Size, VideoFormat},
    engine::{Status, StreamType, VideoCodec, VideoCodecProfile, VideoDecoderConfig},
    host::{EncodedFrame, HostVideoCodecType, VideoCodecSettings, VideoDecoderCallback},
    reframe,
};
use job::EncodedFrameJob;
use log::{debug, error, info};
use std::sync::Arc;
use worker::{Outlet, Worker, WorkerCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderState {
    Uninitialized,
    Configured,
    Decoding,
    Draining,
    Complete,
}

pub struct VideoDecoder {
    runtime: Arc<Runtime>,
    state: DecoderState,
    outlet: Option<Outlet>,
    codec_config: Arc<[u8]>,
    worker: Option<Worker>,
}

impl VideoDecoder {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            runtime,
            state: DecoderState::Uninitialized,
            outlet: None,
            codec_config: Arc::from(Vec::<u8>::new()),
            worker: None,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Configure the CDM decoder for `settings`.
    ///
    /// `codec_specific` is the host's codec specific data: one byte followed by the avcC
    /// record. Only H.264 is supported, other codecs fail before the CDM is involved.
    pub fn init_decode(
        &mut self,
        settings: &VideoCodecSettings,
        codec_specific: &[u8],
        callback: Arc<dyn VideoDecoderCallback>,
    ) -> Result<()> {
        if self.state != DecoderState::Uninitialized {
            return Err(Error::InvalidState(self.state));
        }

        if settings.codec_type != HostVideoCodecType::H264 {
            return Err(Error::UnsupportedCodec(settings.codec_type));
        }

        let engine = self.runtime.engine().ok_or(Error::EngineUnavailable)?;

        let (avcc, avc) = reframe::parse_codec_specific(codec_specific)?;

        let config = VideoDecoderConfig {
            codec: VideoCodec::H264,
            profile: VideoCodecProfile::from_h264_profile_idc(avc.profile_idc),
            format: VideoFormat::I420,
            coded_size: Size::new(settings.width, settings.height),
            extra_data: avcc.to_vec(),
        };

        info!(
            "Initializing {:?} decoder {}x{} ({} SPS, {} PPS).",
            config.profile,
            settings.width,
            settings.height,
            avc.sps.len(),
            avc.pps.len()
        );

        match engine.initialize_video_decoder(&config) {
            Status::Success => {}
            status => {
                return Err(Error::Engine {
                    operation: "initialize the video decoder",
                    status,
                });
            }
        }

        self.codec_config = Arc::from(avc.to_start_codes());
        self.outlet = Some(Outlet::new(self.runtime.platform().clone(), callback));
        self.state = DecoderState::Configured;
        Ok(())
    }

    /// Queue `frame` for decoding. Never waits for the CDM.
    pub fn decode(&mut self, frame: EncodedFrame) -> Result<()> {
        let outlet = match self.state {
            DecoderState::Configured | DecoderState::Decoding | DecoderState::Draining => {
                self.outlet.clone().ok_or(Error::NotInitialized)?
            }
            state => return Err(Error::InvalidState(state)),
        };

        if self.worker.is_none() {
            match Worker::spawn(self.runtime.clone(), outlet.clone(), self.codec_config.clone()) {
                Ok(worker) => self.worker = Some(worker),
                Err(e) => {
                    error!("Cannot start decode worker: {}", e);
                    outlet.callback().error(e.gmp_err());
                    return Ok(());
                }
            }
        }

        self.state = DecoderState::Decoding;

        match &self.worker {
            Some(worker) => worker.send(WorkerCommand::Decode(EncodedFrameJob::from(frame))),
            None => Err(Error::WorkerGone),
        }
    }

    /// Reset the CDM decoder and report completion right away.
    pub fn reset(&mut self) -> Result<()> {
        let outlet = self.ready()?;
        let engine = self.runtime.engine().ok_or(Error::EngineUnavailable)?;

        engine.reset_decoder(StreamType::Video);
        self.state = DecoderState::Configured;
        outlet.callback().reset_complete();
        Ok(())
    }

    /// Report drain completion after the results of every frame queued so far.
    pub fn drain(&mut self) -> Result<()> {
        let outlet = self.ready()?;
        self.state = DecoderState::Draining;

        match &self.worker {
            Some(worker) => worker.send(WorkerCommand::Drain),
            None => {
                if let Some(engine) = self.runtime.engine() {
                    engine.reset_decoder(StreamType::Video);
                }
                outlet.callback().drain_complete();
                Ok(())
            }
        }
    }

    /// Finish every queued frame, then release the CDM decoder.
    pub fn decoding_complete(mut self) {
        self.finish();
    }

    fn ready(&self) -> Result<Outlet> {
        match self.state {
            DecoderState::Uninitialized | DecoderState::Complete => {
                Err(Error::InvalidState(self.state))
            }
            _ => self.outlet.clone().ok_or(Error::NotInitialized),
        }
    }

    fn finish(&mut self) {
        if self.state == DecoderState::Complete {
            return;
        }

        let initialized = self.state != DecoderState::Uninitialized;
        self.state = DecoderState::Complete;

        if let Some(worker) = self.worker.take() {
            worker.join();
        }

        if let Some(outlet) = self.outlet.take() {
            outlet.detach();
        }

        if initialized {
            match self.runtime.engine() {
                Some(engine) => engine.deinitialize_decoder(StreamType::Video),
                None => debug!("CDM already released, skipping decoder deinitialization."),
            }
        }

        info!("Decoding complete.");
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        self.finish();
    }
}
