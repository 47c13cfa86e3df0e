//! Frame scheduling and surface lifecycle.
//!
//! [`FrameScheduler`] owns the control flow of the render loop: which frame
//! slot runs next, whether the presentation surface is usable, and when it
//! gets torn down and rebuilt. It drives an abstract [`FrameDriver`] so the
//! protocol can be exercised without a GPU.
//!
//! # Frame protocol
//!
//! A rendered frame walks through five driver calls in order: acquire an
//! image with the slot's image-available semaphore, wait on and reset the
//! slot's fence, write the slot's uniform data, submit the acquired image's
//! command buffer, and present. The fence wait is the only thing gating
//! reuse of a slot's uniform buffers, which is why writes never happen
//! before it.
//!
//! # Surface lifecycle
//!
//! The surface is `Valid` until a resize arrives or the swapchain reports
//! it out of date or suboptimal. An invalidated surface is torn down and
//! rebuilt at the top of the next iteration; no frame is rendered in the
//! same iteration as a rebuild. While the drawable size is zero the
//! scheduler stays in `Rebuilding` with nothing allocated, and resumes
//! once the window regains area.

use tracing::{debug, info};

use crate::error::{RenderError, RenderResult};

/// Lifecycle state of the presentation surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceState {
    /// Surface resources exist and match the window; frames can render.
    Valid,
    /// The surface no longer matches the window; resources must be torn
    /// down and rebuilt before the next frame renders.
    Invalidated,
    /// Resources are torn down; rendering is suspended until a rebuild
    /// succeeds (the drawable size may currently be zero).
    Rebuilding,
}

/// Result of acquiring a swapchain image.
#[derive(Clone, Copy, Debug)]
pub struct AcquiredImage {
    /// Index of the acquired image, which selects the command buffer to
    /// submit.
    pub image_index: usize,
    /// The image is usable but the surface no longer matches the window
    /// exactly; the surface should be rebuilt after this frame.
    pub suboptimal: bool,
}

/// The operations the scheduler needs from a rendering backend.
///
/// The production implementation talks to Vulkan; tests substitute a mock
/// that records the call sequence.
pub trait FrameDriver {
    /// Current drawable size in physical pixels. Either axis may be zero
    /// while the window is minimized.
    fn drawable_extent(&self) -> (u32, u32);

    /// Waits for the device to idle and destroys all surface resources.
    /// Called once per invalidation; must tolerate an already-released
    /// surface.
    fn release_surface(&mut self);

    /// Builds surface resources for the given nonzero drawable size and
    /// returns the new frame slot count.
    fn rebuild_surface(&mut self, width: u32, height: u32) -> RenderResult<usize>;

    /// Acquires the next swapchain image, signaling the slot's
    /// image-available semaphore.
    fn acquire_image(&mut self, slot: usize) -> RenderResult<AcquiredImage>;

    /// Blocks until the slot's previous frame retires, then resets the
    /// fence for this frame's submission.
    fn wait_and_reset_fence(&mut self, slot: usize) -> RenderResult<()>;

    /// Writes this frame's uniform data into the slot's buffers. Only
    /// called after the slot's fence wait.
    fn write_frame_data(&mut self, slot: usize) -> RenderResult<()>;

    /// Submits the acquired image's command buffer, waiting on the slot's
    /// image-available semaphore and signaling its render-finished
    /// semaphore and fence.
    fn submit(&mut self, slot: usize, image_index: usize) -> RenderResult<()>;

    /// Presents the image, waiting on the slot's render-finished
    /// semaphore. Returns true if the surface is suboptimal.
    fn present(&mut self, slot: usize, image_index: usize) -> RenderResult<bool>;
}

/// Drives frame pacing and the surface lifecycle state machine.
pub struct FrameScheduler {
    /// Current surface lifecycle state.
    state: SurfaceState,
    /// Frame slot used by the next rendered frame.
    current_frame: usize,
    /// Number of frame slots in the live surface.
    frame_count: usize,
    /// Incremented on every successful rebuild.
    generation: u64,
    /// A resize signal arrived since the last iteration.
    pending_resize: bool,
}

impl FrameScheduler {
    /// Creates a scheduler for a freshly built surface with `frame_count`
    /// slots.
    pub fn new(frame_count: usize) -> Self {
        debug_assert!(frame_count > 0);
        Self {
            state: SurfaceState::Valid,
            current_frame: 0,
            frame_count,
            generation: 0,
            pending_resize: false,
        }
    }

    /// Records that the drawable size may have changed.
    ///
    /// Multiple signals between iterations coalesce into a single rebuild;
    /// only the size at rebuild time matters.
    pub fn notify_resize(&mut self) {
        self.pending_resize = true;
    }

    /// Returns the current surface lifecycle state.
    #[inline]
    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// Returns the slot index the next rendered frame will use.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Returns the number of frame slots.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Returns the surface generation, incremented on every successful
    /// rebuild.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Runs one loop iteration: either renders a frame or advances the
    /// surface lifecycle.
    ///
    /// An iteration that tears down or rebuilds the surface renders
    /// nothing; the next iteration renders on slot 0 of the new surface.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions (timeout, device loss,
    /// creation failure). Out-of-date and suboptimal surfaces are absorbed
    /// into the state machine.
    pub fn run_frame<D: FrameDriver>(&mut self, driver: &mut D) -> RenderResult<()> {
        // Fold any resize signal into the state machine first
        if self.pending_resize {
            self.pending_resize = false;
            if self.state == SurfaceState::Valid {
                self.state = SurfaceState::Invalidated;
            }
        }

        match self.state {
            SurfaceState::Invalidated => {
                driver.release_surface();
                self.state = SurfaceState::Rebuilding;
                self.try_rebuild(driver)
            }
            SurfaceState::Rebuilding => self.try_rebuild(driver),
            SurfaceState::Valid => self.render(driver),
        }
    }

    /// Attempts a rebuild; stays suspended while the drawable size is
    /// zero.
    fn try_rebuild<D: FrameDriver>(&mut self, driver: &mut D) -> RenderResult<()> {
        let (width, height) = driver.drawable_extent();
        if width == 0 || height == 0 {
            debug!("Surface rebuild suspended: drawable size is zero");
            return Ok(());
        }

        let frame_count = driver.rebuild_surface(width, height)?;
        if frame_count == 0 {
            return Err(RenderError::Internal(
                "surface rebuilt with zero frame slots".to_string(),
            ));
        }

        self.frame_count = frame_count;
        self.current_frame = 0;
        self.generation += 1;
        self.state = SurfaceState::Valid;

        info!(
            generation = self.generation,
            frame_count, width, height, "Surface rebuilt"
        );
        Ok(())
    }

    /// Renders one frame on the current slot.
    fn render<D: FrameDriver>(&mut self, driver: &mut D) -> RenderResult<()> {
        let slot = self.current_frame;

        let acquired = match driver.acquire_image(slot) {
            Ok(acquired) => acquired,
            Err(RenderError::OutOfDate) => {
                // Nothing was submitted; the slot stays put for the frame
                // after the rebuild
                self.state = SurfaceState::Invalidated;
                debug!("Acquire reported out of date; surface invalidated");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        driver.wait_and_reset_fence(slot)?;
        driver.write_frame_data(slot)?;
        driver.submit(slot, acquired.image_index)?;

        let mut needs_rebuild = acquired.suboptimal;
        match driver.present(slot, acquired.image_index) {
            Ok(suboptimal) => needs_rebuild |= suboptimal,
            Err(RenderError::OutOfDate) => needs_rebuild = true,
            Err(e) => return Err(e),
        }

        if needs_rebuild {
            self.state = SurfaceState::Invalidated;
            debug!("Present reported stale surface; rebuild scheduled");
        }

        // The frame was submitted either way, so the slot advances; its
        // fence gates the next reuse
        self.current_frame = (self.current_frame + 1) % self.frame_count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use ash::vk;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Event {
        Release,
        Build { width: u32, height: u32 },
        Acquire { slot: usize },
        FenceWait { slot: usize },
        Write { slot: usize },
        Submit { slot: usize, image: usize },
        Present { slot: usize, image: usize },
    }

    /// Scripted driver that records every call.
    ///
    /// Unscripted acquires return image == slot (FIFO lockstep) and
    /// unscripted presents succeed without suboptimality.
    struct MockDriver {
        log: Vec<Event>,
        extent: (u32, u32),
        next_frame_count: usize,
        surface_alive: bool,
        live_releases: usize,
        builds: usize,
        acquire_plan: VecDeque<RenderResult<AcquiredImage>>,
        present_plan: VecDeque<RenderResult<bool>>,
        fence_plan: VecDeque<RenderResult<()>>,
        build_plan: VecDeque<RenderResult<()>>,
    }

    impl MockDriver {
        fn new(frame_count: usize) -> Self {
            Self {
                log: Vec::new(),
                extent: (800, 600),
                next_frame_count: frame_count,
                surface_alive: true,
                live_releases: 0,
                builds: 0,
                acquire_plan: VecDeque::new(),
                present_plan: VecDeque::new(),
                fence_plan: VecDeque::new(),
                build_plan: VecDeque::new(),
            }
        }

        fn submits(&self) -> Vec<(usize, usize)> {
            self.log
                .iter()
                .filter_map(|event| match event {
                    Event::Submit { slot, image } => Some((*slot, *image)),
                    _ => None,
                })
                .collect()
        }

        fn count<F: Fn(&Event) -> bool>(&self, pred: F) -> usize {
            self.log.iter().filter(|event| pred(event)).count()
        }
    }

    impl FrameDriver for MockDriver {
        fn drawable_extent(&self) -> (u32, u32) {
            self.extent
        }

        fn release_surface(&mut self) {
            if self.surface_alive {
                self.surface_alive = false;
                self.live_releases += 1;
            }
            self.log.push(Event::Release);
        }

        fn rebuild_surface(&mut self, width: u32, height: u32) -> RenderResult<usize> {
            if let Some(Err(e)) = self.build_plan.pop_front() {
                return Err(e);
            }
            self.builds += 1;
            self.surface_alive = true;
            self.log.push(Event::Build { width, height });
            Ok(self.next_frame_count)
        }

        fn acquire_image(&mut self, slot: usize) -> RenderResult<AcquiredImage> {
            self.log.push(Event::Acquire { slot });
            self.acquire_plan.pop_front().unwrap_or_else(|| {
                Ok(AcquiredImage {
                    image_index: slot,
                    suboptimal: false,
                })
            })
        }

        fn wait_and_reset_fence(&mut self, slot: usize) -> RenderResult<()> {
            self.log.push(Event::FenceWait { slot });
            self.fence_plan.pop_front().unwrap_or(Ok(()))
        }

        fn write_frame_data(&mut self, slot: usize) -> RenderResult<()> {
            self.log.push(Event::Write { slot });
            Ok(())
        }

        fn submit(&mut self, slot: usize, image_index: usize) -> RenderResult<()> {
            self.log.push(Event::Submit {
                slot,
                image: image_index,
            });
            Ok(())
        }

        fn present(&mut self, slot: usize, image_index: usize) -> RenderResult<bool> {
            self.log.push(Event::Present {
                slot,
                image: image_index,
            });
            self.present_plan.pop_front().unwrap_or(Ok(false))
        }
    }

    fn run_frames(scheduler: &mut FrameScheduler, driver: &mut MockDriver, count: usize) {
        for _ in 0..count {
            scheduler.run_frame(driver).unwrap();
        }
    }

    #[test]
    fn test_slots_rotate_round_robin() {
        let mut scheduler = FrameScheduler::new(3);
        let mut driver = MockDriver::new(3);

        run_frames(&mut scheduler, &mut driver, 7);

        let expected: Vec<(usize, usize)> =
            vec![(0, 0), (1, 1), (2, 2), (0, 0), (1, 1), (2, 2), (0, 0)];
        assert_eq!(driver.submits(), expected);
        assert_eq!(scheduler.current_frame(), 1);

        // One fence wait per iteration, always on the slot being reused
        let fence_waits: Vec<usize> = driver
            .log
            .iter()
            .filter_map(|event| match event {
                Event::FenceWait { slot } => Some(*slot),
                _ => None,
            })
            .collect();
        assert_eq!(fence_waits, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_frame_steps_run_in_protocol_order() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);

        run_frames(&mut scheduler, &mut driver, 4);

        // Each iteration is exactly acquire, fence wait, write, submit,
        // present, all on the same slot
        assert_eq!(driver.log.len(), 20);
        for (iteration, steps) in driver.log.chunks_exact(5).enumerate() {
            let slot = iteration % 2;
            assert_eq!(steps[0], Event::Acquire { slot });
            assert_eq!(steps[1], Event::FenceWait { slot });
            assert_eq!(steps[2], Event::Write { slot });
            assert_eq!(steps[3], Event::Submit { slot, image: slot });
            assert_eq!(steps[4], Event::Present { slot, image: slot });
        }
    }

    #[test]
    fn test_no_write_between_submit_and_next_fence_wait() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);

        run_frames(&mut scheduler, &mut driver, 6);

        // Between a slot's submit and its next fence wait there is no
        // write targeting that slot
        for slot in 0..2 {
            let mut submitted = false;
            for event in &driver.log {
                match event {
                    Event::Submit { slot: s, .. } if *s == slot => submitted = true,
                    Event::FenceWait { slot: s } if *s == slot => submitted = false,
                    Event::Write { slot: s } if *s == slot => {
                        assert!(!submitted, "slot {} written while possibly in flight", slot);
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_resize_rebuilds_before_next_frame() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);

        run_frames(&mut scheduler, &mut driver, 3);
        assert_eq!(scheduler.current_frame(), 1);

        driver.extent = (1024, 768);
        driver.next_frame_count = 3;
        scheduler.notify_resize();

        // The rebuild iteration renders nothing
        let before = driver.submits().len();
        let acquires = driver.count(|e| matches!(e, Event::Acquire { .. }));
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.submits().len(), before);
        assert_eq!(driver.count(|e| matches!(e, Event::Acquire { .. })), acquires);
        assert_eq!(driver.live_releases, 1);
        assert_eq!(driver.builds, 1);
        assert_eq!(
            driver.log.last(),
            Some(&Event::Build {
                width: 1024,
                height: 768
            })
        );

        // The new surface's slot count applies and rendering restarts at
        // slot 0
        assert_eq!(scheduler.frame_count(), 3);
        assert_eq!(scheduler.state(), SurfaceState::Valid);
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.submits().last(), Some(&(0, 0)));
    }

    #[test]
    fn test_rebuild_bumps_generation_once() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);
        assert_eq!(scheduler.generation(), 0);

        scheduler.notify_resize();
        run_frames(&mut scheduler, &mut driver, 3);
        assert_eq!(scheduler.generation(), 1);

        scheduler.notify_resize();
        run_frames(&mut scheduler, &mut driver, 1);
        assert_eq!(scheduler.generation(), 2);
    }

    #[test]
    fn test_coalesced_resize_signals_rebuild_once() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);

        scheduler.notify_resize();
        scheduler.notify_resize();
        scheduler.notify_resize();

        run_frames(&mut scheduler, &mut driver, 4);
        assert_eq!(driver.builds, 1);
        assert_eq!(driver.live_releases, 1);
    }

    #[test]
    fn test_resize_while_rebuilding_releases_once() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);

        driver.extent = (0, 0);
        scheduler.notify_resize();
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.live_releases, 1);

        // A resize arriving mid-rebuild does not tear down a second time
        scheduler.notify_resize();
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.live_releases, 1);
        assert_eq!(driver.count(|e| matches!(e, Event::Release)), 1);
        assert_eq!(driver.builds, 0);

        driver.extent = (800, 600);
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.builds, 1);
        assert_eq!(scheduler.state(), SurfaceState::Valid);
    }

    #[test]
    fn test_zero_extent_suspends_rendering() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);

        driver.extent = (0, 0);
        scheduler.notify_resize();

        // Teardown happens immediately, allocation does not
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.live_releases, 1);
        assert_eq!(driver.builds, 0);
        assert_eq!(scheduler.state(), SurfaceState::Rebuilding);

        // Suspended iterations neither render nor allocate
        let log_len = driver.log.len();
        run_frames(&mut scheduler, &mut driver, 3);
        assert_eq!(driver.builds, 0);
        assert_eq!(driver.log.len(), log_len);
        assert_eq!(scheduler.state(), SurfaceState::Rebuilding);

        // Rendering resumes once the window regains area
        driver.extent = (640, 480);
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.builds, 1);
        assert_eq!(scheduler.state(), SurfaceState::Valid);
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.submits(), vec![(0, 0)]);
    }

    #[test]
    fn test_out_of_date_acquire_skips_frame() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);

        driver.acquire_plan.push_back(Err(RenderError::OutOfDate));

        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.count(|e| matches!(e, Event::Acquire { .. })), 1);
        assert_eq!(driver.count(|e| matches!(e, Event::FenceWait { .. })), 0);
        assert_eq!(driver.submits().len(), 0);
        assert_eq!(scheduler.state(), SurfaceState::Invalidated);
        assert_eq!(scheduler.current_frame(), 0);

        // Next iteration rebuilds, the one after renders slot 0
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.builds, 1);
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.submits(), vec![(0, 0)]);
    }

    #[test]
    fn test_suboptimal_acquire_still_renders() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);

        driver.acquire_plan.push_back(Ok(AcquiredImage {
            image_index: 0,
            suboptimal: true,
        }));

        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.submits(), vec![(0, 0)]);
        assert_eq!(scheduler.state(), SurfaceState::Invalidated);
        assert_eq!(scheduler.current_frame(), 1);
    }

    #[test]
    fn test_suboptimal_present_schedules_rebuild() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);

        driver.present_plan.push_back(Ok(true));

        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.submits().len(), 1);
        assert_eq!(scheduler.state(), SurfaceState::Invalidated);

        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.builds, 1);
        assert_eq!(scheduler.generation(), 1);
    }

    #[test]
    fn test_out_of_date_present_completes_frame() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);

        driver.present_plan.push_back(Err(RenderError::OutOfDate));

        // The frame was submitted, so the iteration succeeds and the slot
        // advances; only the surface is marked stale
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.submits().len(), 1);
        assert_eq!(scheduler.state(), SurfaceState::Invalidated);
        assert_eq!(scheduler.current_frame(), 1);
    }

    #[test]
    fn test_fatal_errors_propagate() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);
        driver.fence_plan.push_back(Err(RenderError::DeviceLost));

        let result = scheduler.run_frame(&mut driver);
        assert!(matches!(result, Err(RenderError::DeviceLost)));

        let mut driver = MockDriver::new(2);
        driver
            .acquire_plan
            .push_back(Err(RenderError::Vulkan(vk::Result::ERROR_SURFACE_LOST_KHR)));
        let mut scheduler = FrameScheduler::new(2);
        let result = scheduler.run_frame(&mut driver);
        assert!(matches!(result, Err(RenderError::Vulkan(_))));
    }

    #[test]
    fn test_failed_rebuild_retries_next_iteration() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);

        driver.build_plan.push_back(Err(RenderError::Creation(
            prism_rhi::RhiError::SwapchainError("no formats".to_string()),
        )));
        scheduler.notify_resize();

        let result = scheduler.run_frame(&mut driver);
        assert!(matches!(result, Err(RenderError::Creation(_))));
        assert_eq!(scheduler.state(), SurfaceState::Rebuilding);
        assert_eq!(scheduler.generation(), 0);

        // A caller that chooses to continue retries the rebuild
        scheduler.run_frame(&mut driver).unwrap();
        assert_eq!(driver.builds, 1);
        assert_eq!(scheduler.state(), SurfaceState::Valid);
        assert_eq!(scheduler.generation(), 1);
    }

    #[test]
    fn test_zero_slot_rebuild_is_an_error() {
        let mut scheduler = FrameScheduler::new(2);
        let mut driver = MockDriver::new(2);
        driver.next_frame_count = 0;
        scheduler.notify_resize();

        let result = scheduler.run_frame(&mut driver);
        assert!(matches!(result, Err(RenderError::Internal(_))));
    }

    #[test]
    fn test_new_scheduler_starts_valid() {
        let scheduler = FrameScheduler::new(3);
        assert_eq!(scheduler.state(), SurfaceState::Valid);
        assert_eq!(scheduler.current_frame(), 0);
        assert_eq!(scheduler.frame_count(), 3);
        assert_eq!(scheduler.generation(), 0);
    }
}
