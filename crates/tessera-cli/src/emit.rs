//! Backend wrapper that keeps a copy of every build request.

use tessera_codegen::{KernelBackend, KernelBuildRequest, RecordingBackend, Result};

/// Records each request, then forwards it to the wrapped backend.
pub struct EmittingBackend<'a> {
    inner: &'a dyn KernelBackend,
    recorder: RecordingBackend,
}

impl<'a> EmittingBackend<'a> {
    pub fn new(inner: &'a dyn KernelBackend) -> Self {
        Self {
            inner,
            recorder: RecordingBackend::new(),
        }
    }

    /// Requests seen so far, in build order.
    pub fn requests(&self) -> Vec<KernelBuildRequest> {
        self.recorder.requests()
    }

    /// The recorded requests as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.requests())
    }
}

impl KernelBackend for EmittingBackend<'_> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn build(&self, request: &KernelBuildRequest) -> Result<()> {
        self.recorder.build(request)?;
        self.inner.build(request)
    }
}
