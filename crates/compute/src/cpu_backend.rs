use crate::{ComputeBackend, ComputeError, Kernel, Workgroup};

/// Runs every group on the calling thread, in slot order.
#[derive(Default, Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for CpuBackend {
    fn dispatch(
        &self,
        kernel: Kernel,
        groups: &mut [&mut dyn Workgroup],
    ) -> Result<(), ComputeError> {
        tracing::trace!(?kernel, groups = groups.len(), "cpu dispatch");
        for group in groups.iter_mut() {
            group.run(kernel);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cpu"
    }
}
