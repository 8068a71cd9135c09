use crate::{ComputeError, Kernel};

/// One independent unit of work for a dispatch, typically a chain instance.
///
/// Implementations own disjoint mutable state, so groups can run on any
/// thread in any order.
pub trait Workgroup: Send {
    fn run(&mut self, kernel: Kernel);
}

pub trait ComputeBackend: Send + Sync + 'static {
    /// Runs `kernel` on every group.
    ///
    /// # Arguments
    /// * `kernel`: The pass to execute.
    /// * `groups`: The work groups. Each group sees only its own state.
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` once every group has completed the kernel. Nothing
    /// from a later dispatch may start before this returns.
    fn dispatch(&self, kernel: Kernel, groups: &mut [&mut dyn Workgroup])
        -> Result<(), ComputeError>;

    /// Short human-readable backend name for logs.
    fn name(&self) -> &'static str;
}
