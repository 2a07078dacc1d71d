use super::{frame, job::EncodedFrameJob};
use crate::{
    Error, Result, Runtime,
    buffer::VideoFrame,
    engine::{Status, StreamType},
    host::{BufferType, GmpErr, Platform, VideoDecoderCallback},
    reframe,
};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, trace, warn};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
};

pub(crate) enum WorkerCommand {
    Decode(EncodedFrameJob),
    Drain,
}

/// Delivers results to the host decoder callback on the main thread.
///
/// Once detached, tasks that are still queued on the main thread are dropped instead of
/// reaching the host.
#[derive(Clone)]
pub(crate) struct Outlet {
    platform: Arc<dyn Platform>,
    callback: Arc<dyn VideoDecoderCallback>,
    attached: Arc<AtomicBool>,
}

impl Outlet {
    pub(crate) fn new(platform: Arc<dyn Platform>, callback: Arc<dyn VideoDecoderCallback>) -> Self {
        Self {
            platform,
            callback,
            attached: Arc::new(AtomicBool::new(true)),
        }
    }

    /// The host callback, for calls made on the host thread itself.
    pub(crate) fn callback(&self) -> &dyn VideoDecoderCallback {
        self.callback.as_ref()
    }

    pub(crate) fn post<F>(&self, deliver: F)
    where
        F: FnOnce(&dyn VideoDecoderCallback) + Send + 'static,
    {
        let callback = self.callback.clone();
        let attached = self.attached.clone();

        self.platform.run_on_main_thread(Box::new(move || {
            if attached.load(Ordering::Acquire) {
                deliver(callback.as_ref());
            } else {
                debug!("Dropping decoder result, decoding is complete.");
            }
        }));
    }

    pub(crate) fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }
}

struct WorkerContext {
    runtime: Arc<Runtime>,
    outlet: Outlet,
    codec_config: Arc<[u8]>,
}

impl WorkerContext {
    fn run(self, receiver: Receiver<WorkerCommand>) {
        debug!("Decode worker started.");

        for command in receiver {
            match command {
                WorkerCommand::Decode(job) => {
                    let timestamp = job.timestamp;

                    if panic::catch_unwind(AssertUnwindSafe(|| self.decode(job))).is_err() {
                        error!("Decoding frame at {} panicked.", timestamp);
                        self.outlet.post(|callback| callback.error(GmpErr::GenericErr));
                    }
                }
                WorkerCommand::Drain => self.drain(),
            }
        }

        debug!("Decode worker finished.");
    }

    fn decode(&self, job: EncodedFrameJob) {
        if job.buffer_type != BufferType::Length32 {
            warn!(
                "Dropping frame at {} with {:?} framing.",
                job.timestamp, job.buffer_type
            );
            return;
        }

        let Some(engine) = self.runtime.engine() else {
            warn!("Frame at {} arrived after the CDM was released.", job.timestamp);
            self.outlet.post(|callback| callback.error(GmpErr::GenericErr));
            return;
        };

        let job = match self.reframe(job) {
            Ok(job) => job,
            Err(e) => {
                warn!("Cannot reframe frame: {}", e);
                let code = e.gmp_err();
                self.outlet.post(move |callback| callback.error(code));
                return;
            }
        };

        let mut output = VideoFrame::new();
        let status = engine.decrypt_and_decode_frame(&job.input(), &mut output);
        trace!("Frame at {} decoded: {:?}", job.timestamp, status);

        match status {
            Status::NeedMoreData => self.outlet.post(|callback| callback.input_data_exhausted()),
            Status::Success => match frame::decoded_frame(&mut output, job.duration) {
                Ok(decoded) => self.outlet.post(move |callback| {
                    callback.decoded(decoded);
                    callback.input_data_exhausted();
                }),
                Err(e) => {
                    error!("Cannot copy decoded frame at {}: {}", job.timestamp, e);
                    let code = e.gmp_err();
                    self.outlet.post(move |callback| callback.error(code));
                }
            },
            status => {
                debug!("Frame at {} failed: {:?}", job.timestamp, status);
                let code = GmpErr::from(status);
                self.outlet.post(move |callback| callback.error(code));
            }
        }
    }

    fn reframe(&self, mut job: EncodedFrameJob) -> Result<EncodedFrameJob> {
        reframe::to_start_codes(&mut job.data)?;

        if job.key_frame {
            job.data = reframe::inject_config(job.data, &mut job.subsamples, &self.codec_config);
        }

        Ok(job)
    }

    fn drain(&self) {
        if let Some(engine) = self.runtime.engine() {
            engine.reset_decoder(StreamType::Video);
        }

        self.outlet.post(|callback| callback.drain_complete());
    }
}

/// Handle to the thread decoding one decoder instance's frames in submission order.
pub(crate) struct Worker {
    sender: Option<Sender<WorkerCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub(crate) fn spawn(
        runtime: Arc<Runtime>,
        outlet: Outlet,
        codec_config: Arc<[u8]>,
    ) -> Result<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let platform = runtime.platform().clone();
        let context = WorkerContext {
            runtime,
            outlet,
            codec_config,
        };

        let handle =
            platform.spawn_thread("gmp-video-decode", Box::new(move || context.run(receiver)))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub(crate) fn send(&self, command: WorkerCommand) -> Result<()> {
        self.sender
            .as_ref()
            .ok_or(Error::WorkerGone)?
            .send(command)
            .map_err(|_| Error::WorkerGone)
    }

    /// Close the queue and wait until every queued command has been handled.
    pub(crate) fn join(mut self) {
        self.sender.take();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Decode worker panicked.");
            }
        }
    }
}
