//! The interactive threshold controller
//!
//! Owns the threshold, the prepared session, and both UI surfaces, and runs
//! the cooperative event loop. The loop is single threaded: polling the two
//! surfaces from one place keeps recoloring and rendering ordered, so a
//! threshold-triggered recolor is applied to the render surface strictly
//! before that geometry is next drawn.

use crate::session::SegmentationSession;
use crate::surface::{ControlPanel, PanelEvent, RenderSurface};
use curvseg_core::Result;

/// Lifecycle of an interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Ticking: polling surfaces and reacting to slider input
    Running,
    /// A quit signal was observed; surfaces are about to be released
    Terminating,
    /// Terminal: both surfaces released, no further ticks
    Closed,
}

/// Drives the dual-surface interactive loop
///
/// The threshold and slider position are owned exclusively by the
/// controller and mutated only from its own tick logic.
pub struct InteractiveController<R: RenderSurface, P: ControlPanel> {
    session: SegmentationSession,
    renderer: R,
    panel: P,
    state: SessionState,
    slider_position: u32,
    tau: f32,
}

impl<R: RenderSurface, P: ControlPanel> InteractiveController<R, P> {
    /// Attach surfaces to a prepared session
    ///
    /// Pushes the session's initial classification colors to the render
    /// surface so the first frame is already classified.
    pub fn new(session: SegmentationSession, renderer: R, panel: P) -> Result<Self> {
        let slider_position = session.config().initial_slider_position();
        let tau = session.config().initial_tau;

        let mut controller = Self {
            session,
            renderer,
            panel,
            state: SessionState::Running,
            slider_position,
            tau,
        };
        controller.renderer.update_colors(controller.session.cloud())?;
        Ok(controller)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current threshold
    pub fn tau(&self) -> f32 {
        self.tau
    }

    pub fn slider_position(&self) -> u32 {
        self.slider_position
    }

    pub fn session(&self) -> &SegmentationSession {
        &self.session
    }

    /// Run until a quit signal, releasing both surfaces on the way out
    ///
    /// Surfaces are released even when a tick fails; the tick error is
    /// reported after the release has happened.
    pub fn run(&mut self) -> Result<()> {
        let loop_result = self.run_loop();
        let close_result = self.close();
        loop_result.and(close_result)
    }

    fn run_loop(&mut self) -> Result<()> {
        while self.state == SessionState::Running {
            self.tick()?;
        }
        Ok(())
    }

    /// One iteration of the cooperative loop
    ///
    /// Order per tick: redraw the render surface, then poll the panel for a
    /// bounded interval, then react to slider input. A recolor therefore
    /// lands on the render surface before the following tick's redraw.
    pub fn tick(&mut self) -> Result<()> {
        if self.state != SessionState::Running {
            return Ok(());
        }

        let renderer_alive = self.renderer.poll_events()?;
        if !renderer_alive {
            log::info!("render surface closed, terminating session");
            self.state = SessionState::Terminating;
            return Ok(());
        }

        match self.panel.poll(self.session.config().poll_interval)? {
            PanelEvent::Idle => {}
            PanelEvent::SliderMoved(position) => {
                // Clamp before comparing so an out-of-range position the
                // panel keeps reporting does not retrigger the recolor.
                let position = position.min(self.session.config().slider_scale);
                if position != self.slider_position {
                    self.apply_slider_position(position)?;
                }
            }
            PanelEvent::Quit => {
                log::info!("quit signal received, terminating session");
                self.state = SessionState::Terminating;
            }
        }

        Ok(())
    }

    /// Recompute the threshold from a slider position, reclassify, and push
    /// the new colors to the render surface
    ///
    /// `position` must already be clamped to the slider scale.
    fn apply_slider_position(&mut self, position: u32) -> Result<()> {
        let config = self.session.config();
        self.slider_position = position;
        self.tau = config.tau_for_position(position);

        self.session.reclassify(self.tau);
        self.renderer.update_colors(self.session.cloud())?;

        log::info!("updated tau: {:.4}", self.tau);
        Ok(())
    }

    /// Release both surfaces and enter the terminal state
    ///
    /// Idempotent; both releases are attempted even if the first fails.
    pub fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Terminating;

        let renderer_result = self.renderer.release();
        let panel_result = self.panel.release();

        self.state = SessionState::Closed;
        renderer_result.and(panel_result)
    }
}

impl<R: RenderSurface, P: ControlPanel> Drop for InteractiveController<R, P> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("error while releasing UI surfaces: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;
    use curvseg_core::{ColoredPoint3f, Error, Point3f, PointCloud, Rgb};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::time::Duration;

    /// What a mock surface observed, in order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum SurfaceCall {
        ColorsUpdated(Vec<Rgb>),
        Redraw,
        RendererReleased,
        PanelReleased,
    }

    type CallLog = Rc<RefCell<Vec<SurfaceCall>>>;

    struct MockRenderer {
        log: CallLog,
        fail_poll_on_call: Option<usize>,
        polls: usize,
    }

    impl RenderSurface for MockRenderer {
        fn update_colors(&mut self, cloud: &PointCloud<ColoredPoint3f>) -> Result<()> {
            self.log
                .borrow_mut()
                .push(SurfaceCall::ColorsUpdated(cloud.colors()));
            Ok(())
        }

        fn poll_events(&mut self) -> Result<bool> {
            self.polls += 1;
            if self.fail_poll_on_call == Some(self.polls) {
                return Err(Error::Visualization("render surface lost".to_string()));
            }
            self.log.borrow_mut().push(SurfaceCall::Redraw);
            Ok(true)
        }

        fn release(&mut self) -> Result<()> {
            self.log.borrow_mut().push(SurfaceCall::RendererReleased);
            Ok(())
        }
    }

    struct ScriptedPanel {
        log: CallLog,
        script: VecDeque<PanelEvent>,
    }

    impl ControlPanel for ScriptedPanel {
        fn poll(&mut self, _timeout: Duration) -> Result<PanelEvent> {
            Ok(self.script.pop_front().unwrap_or(PanelEvent::Quit))
        }

        fn release(&mut self) -> Result<()> {
            self.log.borrow_mut().push(SurfaceCall::PanelReleased);
            Ok(())
        }
    }

    fn test_session() -> SegmentationSession {
        let mut points = Vec::new();
        for i in 0..8 {
            for j in 0..8 {
                let x = i as f32;
                let y = j as f32;
                let z = if i >= 4 { (x * 1.3).sin() } else { 0.0 };
                points.push(Point3f::new(x, y, z));
            }
        }
        let config = SessionConfig {
            voxel_size: 0.5,
            k: 8,
            ..SessionConfig::default()
        };
        SegmentationSession::prepare(&PointCloud::from_points(points), config).unwrap()
    }

    fn controller_with_script(
        script: Vec<PanelEvent>,
        fail_poll_on_call: Option<usize>,
    ) -> (InteractiveController<MockRenderer, ScriptedPanel>, CallLog) {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let renderer = MockRenderer {
            log: Rc::clone(&log),
            fail_poll_on_call,
            polls: 0,
        };
        let panel = ScriptedPanel {
            log: Rc::clone(&log),
            script: script.into(),
        };
        let controller = InteractiveController::new(test_session(), renderer, panel).unwrap();
        (controller, log)
    }

    #[test]
    fn test_initial_colors_pushed_before_first_redraw() {
        let (mut controller, log) = controller_with_script(vec![PanelEvent::Quit], None);
        controller.run().unwrap();

        let calls = log.borrow();
        assert!(matches!(calls[0], SurfaceCall::ColorsUpdated(_)));
        assert_eq!(calls[1], SurfaceCall::Redraw);
    }

    #[test]
    fn test_slider_change_recolors_before_next_redraw() {
        let (mut controller, log) = controller_with_script(
            vec![
                PanelEvent::Idle,
                PanelEvent::SliderMoved(5_000),
                PanelEvent::Quit,
            ],
            None,
        );
        controller.run().unwrap();
        assert_eq!(controller.state(), SessionState::Closed);

        let calls = log.borrow();
        // After the slider event there must be a color update before any
        // further redraw.
        let slider_update = calls
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, c)| matches!(c, SurfaceCall::ColorsUpdated(_)))
            .map(|(i, _)| i)
            .expect("slider must trigger a color update");
        let redraw_after = calls[slider_update..]
            .iter()
            .position(|c| *c == SurfaceCall::Redraw);
        // The session quits right after, so either no redraw follows or it
        // comes only after the update.
        if let Some(offset) = redraw_after {
            assert!(offset > 0);
        }
    }

    #[test]
    fn test_slider_updates_tau_and_colors() {
        let (mut controller, _log) =
            controller_with_script(vec![PanelEvent::SliderMoved(9_000), PanelEvent::Quit], None);
        controller.run().unwrap();

        assert_eq!(controller.slider_position(), 9_000);
        assert!((controller.tau() - 0.9).abs() < 1e-6);
        // tau = 0.9 exceeds the maximum possible curvature of 1/3, so
        // everything is smooth.
        assert!(controller
            .session()
            .cloud()
            .iter()
            .all(|p| p.color == curvseg_algorithms::SMOOTH_COLOR));
    }

    #[test]
    fn test_unchanged_slider_position_does_not_recolor() {
        let initial = SessionConfig::default().initial_slider_position();
        let (mut controller, log) = controller_with_script(
            vec![PanelEvent::SliderMoved(initial), PanelEvent::Quit],
            None,
        );
        controller.run().unwrap();

        let updates = log
            .borrow()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::ColorsUpdated(_)))
            .count();
        // Only the initial push from construction.
        assert_eq!(updates, 1);
    }

    #[test]
    fn test_repeated_out_of_range_position_recolors_once() {
        let scale = SessionConfig::default().slider_scale;
        let beyond = scale * 2;
        let (mut controller, log) = controller_with_script(
            vec![
                PanelEvent::SliderMoved(beyond),
                PanelEvent::SliderMoved(beyond),
                PanelEvent::SliderMoved(scale),
                PanelEvent::Quit,
            ],
            None,
        );
        controller.run().unwrap();

        // All three events clamp to the same position, so only the first
        // changes anything.
        assert_eq!(controller.slider_position(), scale);
        let updates = log
            .borrow()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::ColorsUpdated(_)))
            .count();
        // The initial push plus one recolor.
        assert_eq!(updates, 2);
    }

    #[test]
    fn test_quit_releases_both_surfaces() {
        let (mut controller, log) = controller_with_script(vec![PanelEvent::Quit], None);
        controller.run().unwrap();

        assert_eq!(controller.state(), SessionState::Closed);
        let calls = log.borrow();
        assert!(calls.contains(&SurfaceCall::RendererReleased));
        assert!(calls.contains(&SurfaceCall::PanelReleased));
    }

    #[test]
    fn test_tick_failure_still_releases_both_surfaces() {
        let (mut controller, log) = controller_with_script(
            vec![PanelEvent::Idle, PanelEvent::Idle, PanelEvent::Idle],
            Some(2),
        );
        let result = controller.run();

        assert!(result.is_err());
        assert_eq!(controller.state(), SessionState::Closed);
        let calls = log.borrow();
        assert!(calls.contains(&SurfaceCall::RendererReleased));
        assert!(calls.contains(&SurfaceCall::PanelReleased));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut controller, log) = controller_with_script(vec![PanelEvent::Quit], None);
        controller.run().unwrap();
        controller.close().unwrap();
        controller.close().unwrap();

        let releases = log
            .borrow()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::RendererReleased))
            .count();
        assert_eq!(releases, 1);
    }

    #[test]
    fn test_renderer_gone_terminates_session() {
        struct DeadRenderer {
            log: CallLog,
        }
        impl RenderSurface for DeadRenderer {
            fn update_colors(&mut self, _cloud: &PointCloud<ColoredPoint3f>) -> Result<()> {
                Ok(())
            }
            fn poll_events(&mut self) -> Result<bool> {
                Ok(false)
            }
            fn release(&mut self) -> Result<()> {
                self.log.borrow_mut().push(SurfaceCall::RendererReleased);
                Ok(())
            }
        }

        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let renderer = DeadRenderer { log: Rc::clone(&log) };
        let panel = ScriptedPanel {
            log: Rc::clone(&log),
            script: VecDeque::new(),
        };
        let mut controller = InteractiveController::new(test_session(), renderer, panel).unwrap();
        controller.run().unwrap();

        assert_eq!(controller.state(), SessionState::Closed);
        assert!(log.borrow().contains(&SurfaceCall::RendererReleased));
    }
}
