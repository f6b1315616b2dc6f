use tracing::debug;

use crate::error::{Error, Result};

use super::backend::SwapChain;

/// CPU address of a render-target descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetView {
    pub ptr: usize,
}

/// Start address and stride of a descriptor heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorHeapLayout {
    pub start: usize,
    pub increment: u32,
}

impl DescriptorHeapLayout {
    pub fn view(&self, index: usize) -> RenderTargetView {
        RenderTargetView {
            ptr: self.start + index * self.increment as usize,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresentMode {
    /// Wait for one vertical blank.
    #[default]
    Vsync,
    Immediate,
}

impl PresentMode {
    pub fn sync_interval(self) -> u32 {
        match self {
            Self::Vsync => 1,
            Self::Immediate => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentImage {
    pub index: usize,
    pub view: RenderTargetView,
}

pub struct PresentationSurface<S> {
    swap_chain: S,
    views: Vec<RenderTargetView>,
    present_mode: PresentMode,
}

impl<S: SwapChain> PresentationSurface<S> {
    pub fn create(swap_chain: S, present_mode: PresentMode) -> Self {
        Self {
            swap_chain,
            views: Vec::new(),
            present_mode,
        }
    }

    /// Creates one render-target view per backbuffer, spaced by the heap's
    /// descriptor increment.
    pub fn create_render_target_views(&mut self) -> Result<&[RenderTargetView]> {
        let heap = self.swap_chain.rtv_heap();
        let count = self.swap_chain.image_count();

        let mut views = Vec::with_capacity(count);
        for i in 0..count {
            let view = heap.view(i);
            self.swap_chain.create_render_target_view(i, view)?;
            views.push(view);
        }
        self.views = views;

        debug!(count, increment = heap.increment, "created render target views");
        Ok(&self.views)
    }

    /// The image the swap chain reports as current. Never cached.
    pub fn current_image(&self) -> Result<CurrentImage> {
        let index = self.swap_chain.current_image_index();
        let count = self.swap_chain.image_count();
        if index >= count {
            return Err(Error::ImageIndexOutOfRange { index, count });
        }

        let view = *self
            .views
            .get(index)
            .ok_or(Error::MissingRenderTargetView(index))?;
        Ok(CurrentImage { index, view })
    }

    pub fn present(&mut self) -> Result<()> {
        self.swap_chain
            .present(self.present_mode.sync_interval())
    }

    pub fn image_count(&self) -> usize {
        self.swap_chain.image_count()
    }

    pub fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    pub fn views(&self) -> &[RenderTargetView] {
        &self.views
    }

    pub fn get(&self) -> &S {
        &self.swap_chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSwapChain {
        count: usize,
        index: usize,
        created: Vec<(usize, RenderTargetView)>,
        intervals: Vec<u32>,
    }

    impl SwapChain for FixedSwapChain {
        fn image_count(&self) -> usize {
            self.count
        }

        fn current_image_index(&self) -> usize {
            self.index
        }

        fn rtv_heap(&self) -> DescriptorHeapLayout {
            DescriptorHeapLayout {
                start: 0x1000,
                increment: 32,
            }
        }

        fn create_render_target_view(&mut self, image: usize, view: RenderTargetView) -> Result<()> {
            self.created.push((image, view));
            Ok(())
        }

        fn present(&mut self, sync_interval: u32) -> Result<()> {
            self.intervals.push(sync_interval);
            Ok(())
        }
    }

    fn swap_chain(count: usize, index: usize) -> FixedSwapChain {
        FixedSwapChain {
            count,
            index,
            created: Vec::new(),
            intervals: Vec::new(),
        }
    }

    #[test]
    fn views_are_spaced_by_increment() {
        let mut surface = PresentationSurface::create(swap_chain(3, 0), PresentMode::Vsync);
        let views = surface.create_render_target_views().unwrap().to_vec();

        assert_eq!(
            views,
            vec![
                RenderTargetView { ptr: 0x1000 },
                RenderTargetView { ptr: 0x1020 },
                RenderTargetView { ptr: 0x1040 },
            ]
        );
        assert_eq!(surface.get().created.len(), 3);
        assert_eq!(surface.get().created[2], (2, RenderTargetView { ptr: 0x1040 }));
    }

    #[test]
    fn current_image_needs_views() {
        let surface = PresentationSurface::create(swap_chain(2, 1), PresentMode::Vsync);
        assert!(matches!(
            surface.current_image(),
            Err(Error::MissingRenderTargetView(1))
        ));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let mut surface = PresentationSurface::create(swap_chain(2, 2), PresentMode::Vsync);
        surface.create_render_target_views().unwrap();
        assert!(matches!(
            surface.current_image(),
            Err(Error::ImageIndexOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn present_uses_configured_interval() {
        let mut vsync = PresentationSurface::create(swap_chain(2, 0), PresentMode::Vsync);
        vsync.present().unwrap();
        assert_eq!(vsync.get().intervals, vec![1]);

        let mut immediate = PresentationSurface::create(swap_chain(2, 0), PresentMode::Immediate);
        immediate.present().unwrap();
        assert_eq!(immediate.get().intervals, vec![0]);
    }
}
