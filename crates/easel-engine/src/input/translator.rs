use std::collections::VecDeque;

use crate::host::{blocking_section, HostScheduler};

use super::pump::{EventPump, PumpStatus, Wait};
use super::types::{InputEvent, RawButton, RawEvent};

/// Classifies and coalesces raw platform events into [`InputEvent`]s.
///
/// Owns the queue of events the pump has delivered and the tracked window
/// size. The size changes only through configure notifications.
#[derive(Debug)]
pub struct EventTranslator {
    queue: VecDeque<RawEvent>,
    window_width: u32,
    window_height: u32,
    close_requested: bool,
}

impl EventTranslator {
    pub fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            window_width,
            window_height,
            close_requested: false,
        }
    }

    /// Tracked `(width, height)` in device pixels.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// True once the window manager has asked to close the window.
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Raw events delivered but not yet translated.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Returns the next logical event, pumping `pump` as needed.
    ///
    /// Non-blocking calls only look at what the platform has already
    /// delivered. Blocking calls park on the platform inside a
    /// [`blocking_section`] until an event translates, looping over spurious
    /// wakes and discarded events. A lost connection or a latched close
    /// request ends the wait with `None` once the queue is drained.
    pub fn poll<P>(&mut self, pump: &mut P, host: &dyn HostScheduler, blocking: bool) -> Option<InputEvent>
    where
        P: EventPump + ?Sized,
    {
        if pump.pump(Wait::Pending, &mut self.queue) == PumpStatus::Disconnected {
            log::debug!("display connection lost while polling");
        }

        if let Some(ev) = self.next_queued() {
            return Some(ev);
        }

        if !blocking || self.close_requested {
            return None;
        }

        loop {
            let status = blocking_section(host, || pump.pump(Wait::Block, &mut self.queue));

            if let Some(ev) = self.next_queued() {
                return Some(ev);
            }

            if status == PumpStatus::Disconnected {
                log::debug!("display connection lost while waiting for input");
                return None;
            }

            if self.close_requested {
                log::debug!("close requested while waiting for input");
                return None;
            }

            log::trace!("woke without a translatable event; waiting again");
        }
    }

    /// Translates queued events until one yields an [`InputEvent`] or the
    /// queue runs dry.
    pub fn next_queued(&mut self) -> Option<InputEvent> {
        while let Some(first) = self.queue.pop_front() {
            let ev = self.coalesce(first);
            if let Some(out) = self.classify(ev) {
                log::trace!("translated {ev:?} -> {out:?}");
                return Some(out);
            }
        }
        None
    }

    /// Folds the run of same-class events behind `first` into its last member.
    fn coalesce(&mut self, first: RawEvent) -> RawEvent {
        let class = first.class();
        if !class.coalesces() {
            return first;
        }

        let mut last = first;
        let mut dropped = 0usize;
        while self.queue.front().is_some_and(|next| next.class() == class) {
            if let Some(next) = self.queue.pop_front() {
                last = next;
                dropped += 1;
            }
        }

        if dropped > 0 {
            log::trace!("coalesced {dropped} queued {class:?} events");
        }
        last
    }

    fn classify(&mut self, ev: RawEvent) -> Option<InputEvent> {
        let (window_width, window_height) = self.window_size();

        match ev {
            RawEvent::Motion { x, y, .. } => Some(InputEvent::Move {
                x,
                y,
                window_width,
                window_height,
            }),

            RawEvent::ButtonPress { button, x, y, shifted } => match button {
                RawButton::Primary | RawButton::Secondary | RawButton::Tertiary => {
                    Some(InputEvent::Click {
                        x,
                        y,
                        window_width,
                        window_height,
                        shifted,
                    })
                }
                RawButton::WheelUp => Some(InputEvent::Zoom {
                    x,
                    y,
                    window_width,
                    window_height,
                    shifted,
                }),
                RawButton::WheelDown => Some(InputEvent::Unzoom {
                    x,
                    y,
                    window_width,
                    window_height,
                }),
                RawButton::Other(_) => None,
            },

            RawEvent::ButtonRelease { button, x, y } => match button {
                RawButton::Primary | RawButton::Secondary | RawButton::Tertiary => {
                    Some(InputEvent::Unclick {
                        x,
                        y,
                        window_width,
                        window_height,
                    })
                }
                RawButton::WheelUp | RawButton::WheelDown | RawButton::Other(_) => None,
            },

            // Exposure only tells us which area is damaged, not the window size.
            RawEvent::Expose => Some(InputEvent::Resize {
                width: window_width,
                height: window_height,
            }),

            RawEvent::Configure { width, height } => {
                if (width, height) == (window_width, window_height) {
                    return None;
                }
                self.window_width = width;
                self.window_height = height;
                Some(InputEvent::Resize { width, height })
            }

            RawEvent::KeyPress => None,

            RawEvent::CloseRequested => {
                if !self.close_requested {
                    log::debug!("window manager requested close");
                }
                self.close_requested = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Unmanaged;
    use crate::input::ScriptedPump;

    fn motion(x: i32, y: i32) -> RawEvent {
        RawEvent::Motion { x, y, primary_held: false }
    }

    fn press(button: RawButton, shifted: bool) -> RawEvent {
        RawEvent::ButtonPress { button, x: 3, y: 4, shifted }
    }

    fn poll(t: &mut EventTranslator, pump: &mut ScriptedPump, blocking: bool) -> Option<InputEvent> {
        t.poll(pump, &Unmanaged, blocking)
    }

    // ── coalescing ────────────────────────────────────────────────────────

    #[test]
    fn motion_burst_yields_last_payload() {
        let mut t = EventTranslator::new(800, 480);
        let mut pump = ScriptedPump::new();
        pump.deliver([motion(1, 1), motion(2, 2), motion(3, 3), motion(40, 50)]);

        assert_eq!(
            poll(&mut t, &mut pump, true),
            Some(InputEvent::Move { x: 40, y: 50, window_width: 800, window_height: 480 })
        );
        assert_eq!(t.queued(), 0);
        assert_eq!(poll(&mut t, &mut pump, false), None);
    }

    #[test]
    fn drag_motion_is_plain_move() {
        let mut t = EventTranslator::new(10, 10);
        let mut pump = ScriptedPump::new();
        pump.deliver([RawEvent::Motion { x: 5, y: 6, primary_held: true }]);

        assert_eq!(
            poll(&mut t, &mut pump, false),
            Some(InputEvent::Move { x: 5, y: 6, window_width: 10, window_height: 10 })
        );
    }

    #[test]
    fn coalescing_stops_at_a_different_class() {
        let mut t = EventTranslator::new(100, 100);
        let mut pump = ScriptedPump::new();
        pump.deliver([
            motion(1, 1),
            motion(2, 2),
            press(RawButton::Primary, false),
            motion(7, 7),
            motion(8, 8),
        ]);

        assert!(matches!(poll(&mut t, &mut pump, false), Some(InputEvent::Move { x: 2, y: 2, .. })));
        assert!(matches!(poll(&mut t, &mut pump, false), Some(InputEvent::Click { .. })));
        assert!(matches!(poll(&mut t, &mut pump, false), Some(InputEvent::Move { x: 8, y: 8, .. })));
        assert_eq!(poll(&mut t, &mut pump, false), None);
    }

    #[test]
    fn button_presses_are_never_coalesced() {
        let mut t = EventTranslator::new(100, 100);
        let mut pump = ScriptedPump::new();
        pump.deliver([press(RawButton::Primary, false), press(RawButton::Primary, true)]);

        assert!(matches!(poll(&mut t, &mut pump, false), Some(InputEvent::Click { shifted: false, .. })));
        assert!(matches!(poll(&mut t, &mut pump, false), Some(InputEvent::Click { shifted: true, .. })));
    }

    #[test]
    fn expose_burst_yields_one_resize() {
        let mut t = EventTranslator::new(320, 200);
        let mut pump = ScriptedPump::new();
        pump.deliver([RawEvent::Expose, RawEvent::Expose, RawEvent::Expose]);

        assert_eq!(poll(&mut t, &mut pump, true), Some(InputEvent::Resize { width: 320, height: 200 }));
        assert_eq!(poll(&mut t, &mut pump, false), None);
    }

    // ── resize tracking ───────────────────────────────────────────────────

    #[test]
    fn configure_with_same_size_is_suppressed() {
        let mut t = EventTranslator::new(800, 480);
        let mut pump = ScriptedPump::new();
        pump.deliver([RawEvent::Configure { width: 800, height: 480 }]);

        assert_eq!(poll(&mut t, &mut pump, false), None);
        assert_eq!(t.window_size(), (800, 480));
    }

    #[test]
    fn configure_with_new_size_updates_tracking() {
        let mut t = EventTranslator::new(800, 480);
        let mut pump = ScriptedPump::new();
        pump.deliver([RawEvent::Configure { width: 640, height: 360 }]);

        assert_eq!(poll(&mut t, &mut pump, false), Some(InputEvent::Resize { width: 640, height: 360 }));
        assert_eq!(t.window_size(), (640, 360));
    }

    #[test]
    fn configure_storm_ending_at_tracked_size_emits_nothing() {
        let mut t = EventTranslator::new(800, 480);
        let mut pump = ScriptedPump::new();
        pump.deliver([
            RawEvent::Configure { width: 700, height: 400 },
            RawEvent::Configure { width: 760, height: 450 },
            RawEvent::Configure { width: 800, height: 480 },
        ]);

        assert_eq!(poll(&mut t, &mut pump, false), None);
    }

    #[test]
    fn expose_reports_size_even_when_unchanged() {
        let mut t = EventTranslator::new(800, 480);
        let mut pump = ScriptedPump::new();
        pump.deliver([RawEvent::Configure { width: 640, height: 360 }, RawEvent::Expose]);

        assert_eq!(poll(&mut t, &mut pump, false), Some(InputEvent::Resize { width: 640, height: 360 }));
        assert_eq!(poll(&mut t, &mut pump, false), Some(InputEvent::Resize { width: 640, height: 360 }));
    }

    #[test]
    fn pointer_events_snapshot_tracked_size() {
        let mut t = EventTranslator::new(800, 480);
        let mut pump = ScriptedPump::new();
        pump.deliver([RawEvent::Configure { width: 1024, height: 768 }, motion(9, 9)]);

        poll(&mut t, &mut pump, false);
        assert_eq!(
            poll(&mut t, &mut pump, false),
            Some(InputEvent::Move { x: 9, y: 9, window_width: 1024, window_height: 768 })
        );
    }

    // ── classification ────────────────────────────────────────────────────

    #[test]
    fn wheel_maps_to_zoom_and_unzoom() {
        let mut t = EventTranslator::new(50, 50);
        let mut pump = ScriptedPump::new();
        pump.deliver([press(RawButton::WheelUp, true), press(RawButton::WheelDown, true)]);

        assert_eq!(
            poll(&mut t, &mut pump, false),
            Some(InputEvent::Zoom { x: 3, y: 4, window_width: 50, window_height: 50, shifted: true })
        );
        assert_eq!(
            poll(&mut t, &mut pump, false),
            Some(InputEvent::Unzoom { x: 3, y: 4, window_width: 50, window_height: 50 })
        );
    }

    #[test]
    fn every_pointer_button_clicks_and_unclicks() {
        let mut t = EventTranslator::new(50, 50);
        let mut pump = ScriptedPump::new();
        for button in [RawButton::Primary, RawButton::Secondary, RawButton::Tertiary] {
            pump.deliver([press(button, false), RawEvent::ButtonRelease { button, x: 1, y: 2 }]);
            assert!(matches!(poll(&mut t, &mut pump, false), Some(InputEvent::Click { .. })));
            assert_eq!(
                poll(&mut t, &mut pump, false),
                Some(InputEvent::Unclick { x: 1, y: 2, window_width: 50, window_height: 50 })
            );
        }
    }

    #[test]
    fn keys_and_extra_buttons_are_discarded() {
        let mut t = EventTranslator::new(50, 50);
        let mut pump = ScriptedPump::new();
        pump.deliver([
            RawEvent::KeyPress,
            press(RawButton::Other(8), false),
            RawEvent::ButtonRelease { button: RawButton::Other(8), x: 0, y: 0 },
            RawEvent::KeyPress,
            motion(4, 4),
        ]);

        assert!(matches!(poll(&mut t, &mut pump, false), Some(InputEvent::Move { x: 4, y: 4, .. })));
    }

    #[test]
    fn close_request_is_latched_not_delivered() {
        let mut t = EventTranslator::new(50, 50);
        let mut pump = ScriptedPump::new();
        pump.deliver([RawEvent::CloseRequested]);

        assert_eq!(poll(&mut t, &mut pump, false), None);
        assert!(t.close_requested());
    }

    // ── waiting ───────────────────────────────────────────────────────────

    #[test]
    fn non_blocking_poll_never_waits() {
        let mut t = EventTranslator::new(50, 50);
        let mut pump = ScriptedPump::new();

        assert_eq!(poll(&mut t, &mut pump, false), None);
        assert_eq!(pump.waits(), 0);
    }

    #[test]
    fn blocking_poll_waits_through_spurious_wakes_and_keys() {
        let mut t = EventTranslator::new(50, 50);
        let mut pump = ScriptedPump::new();
        pump.spurious_wake();
        pump.deliver([RawEvent::KeyPress]);
        pump.spurious_wake();
        pump.deliver([motion(6, 7)]);

        // The first pending pump consumes the first (empty) batch.
        assert!(matches!(poll(&mut t, &mut pump, true), Some(InputEvent::Move { x: 6, y: 7, .. })));
        assert_eq!(pump.waits(), 3);
    }

    #[test]
    fn close_request_ends_a_blocking_wait() {
        let mut t = EventTranslator::new(50, 50);
        let mut pump = ScriptedPump::new();
        pump.spurious_wake();
        pump.deliver([RawEvent::CloseRequested]);
        pump.spurious_wake();
        pump.deliver([motion(1, 1)]);

        assert_eq!(poll(&mut t, &mut pump, true), None);
        assert!(t.close_requested());
        assert_eq!(pump.waits(), 1);

        // Later blocking polls drain what is queued but no longer park.
        assert_eq!(poll(&mut t, &mut pump, true), None);
        assert_eq!(pump.waits(), 1);
        assert!(matches!(poll(&mut t, &mut pump, true), Some(InputEvent::Move { x: 1, y: 1, .. })));
        assert_eq!(pump.waits(), 1);
    }

    #[test]
    fn blocking_poll_returns_none_when_connection_is_lost() {
        let mut t = EventTranslator::new(50, 50);
        let mut pump = ScriptedPump::new();

        assert_eq!(poll(&mut t, &mut pump, true), None);
        assert_eq!(pump.waits(), 1);
    }
}
