//! Test doubles for process execution

use crate::error::SquishResult;
use crate::orchestration::runner::{Invocation, ProcessOutput, ProcessRunner};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&Invocation) -> ProcessOutput + Send + Sync>;

/// Records every invocation and answers with a scripted outcome
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    handler: Handler,
}

impl RecordingRunner {
    pub(crate) fn succeeding() -> Self {
        Self::with_handler(|_| ProcessOutput::exited(0))
    }

    pub(crate) fn with_handler(
        handler: impl Fn(&Invocation) -> ProcessOutput + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> SquishResult<ProcessOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        Ok((self.handler)(invocation))
    }
}

/// Simulate a download the way Coursier lays it out under `COURSIER_CACHE`
pub(crate) fn fake_download(invocation: &Invocation, url: &str, body: &[u8]) {
    let cache = PathBuf::from(
        invocation
            .env_var("COURSIER_CACHE")
            .expect("invocation carries COURSIER_CACHE"),
    );
    let path = cache.join(crate::cache::path::encode(url).unwrap());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}
