use tracing::trace;

use crate::error::Result;

use super::backend::GpuFence;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[must_use]
pub struct FenceValue {
    v: u64,
}

impl FenceValue {
    pub fn new(v: u64) -> Self {
        Self { v }
    }

    pub fn get(self) -> u64 {
        self.v
    }

    pub fn next(self) -> Self {
        Self { v: self.v + 1 }
    }
}

/// A monotonically increasing target value over a [`GpuFence`].
pub struct FenceCounter<F> {
    fence: F,
    target: FenceValue,
}

impl<F: GpuFence> FenceCounter<F> {
    pub fn new(fence: F) -> Self {
        let target = FenceValue::new(fence.completed_value());
        Self { fence, target }
    }

    /// Posts the next target value to the queue and stores it.
    pub fn signal(&mut self) -> Result<FenceValue> {
        let next = self.target.next();
        self.fence.signal(next.get())?;
        self.target = next;
        trace!(value = next.get(), "signaled fence");
        Ok(next)
    }

    /// Blocks until the GPU has reached the last signaled value.
    pub fn wait(&self) -> Result<()> {
        let target = self.target.get();
        while self.fence.completed_value() < target {
            self.fence.block_until(target)?;
        }
        trace!(value = target, "fence reached");
        Ok(())
    }

    pub fn target(&self) -> FenceValue {
        self.target
    }

    pub fn completed_value(&self) -> u64 {
        self.fence.completed_value()
    }

    pub fn is_idle(&self) -> bool {
        self.completed_value() >= self.target.get()
    }

    pub fn get(&self) -> &F {
        &self.fence
    }
}
