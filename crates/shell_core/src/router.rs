use std::time::Duration;

use shared::domain::ViewId;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(200);

const SLIDE_DISTANCE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    ExitStarted(ViewId),
    EnterStarted(ViewId),
    EnterCompleted(ViewId),
    /// A pending enter for this view was dropped by a newer switch.
    Preempted(ViewId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Exiting,
    Entering,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentFrame {
    pub view: ViewId,
    pub phase: TransitionPhase,
    pub opacity: f32,
    pub offset_x: f32,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: Option<ViewId>,
    to: ViewId,
    started_at: Instant,
    enter_announced: bool,
}

pub struct ViewRouter {
    current: ViewId,
    span: Duration,
    in_flight: Option<Transition>,
    events: Vec<TransitionEvent>,
}

impl ViewRouter {
    pub fn new(initial: ViewId, span: Duration, now: Instant) -> Self {
        let mut router = Self {
            current: initial,
            span,
            in_flight: Some(Transition {
                from: None,
                to: initial,
                started_at: now,
                enter_announced: true,
            }),
            events: Vec::new(),
        };
        router.events.push(TransitionEvent::EnterStarted(initial));
        router
    }

    pub fn current(&self) -> ViewId {
        self.current
    }

    pub fn is_transitioning(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Returns `false` without side effects when `view` is already active.
    pub fn switch_to(&mut self, view: ViewId, now: Instant) -> bool {
        if view == self.current {
            return false;
        }
        self.poll(now);

        // Last switch wins: whatever is on screen now becomes the outgoing view.
        let outgoing = match self.in_flight.take() {
            Some(previous) => {
                self.events.push(TransitionEvent::Preempted(previous.to));
                self.visible_during(&previous, now)
            }
            None => self.current,
        };

        debug!(from = %outgoing, to = %view, "switching view");
        self.current = view;
        self.in_flight = Some(Transition {
            from: Some(outgoing),
            to: view,
            started_at: now,
            enter_announced: false,
        });
        self.events.push(TransitionEvent::ExitStarted(outgoing));
        true
    }

    /// Advances the in-flight transition. Call once per frame.
    pub fn poll(&mut self, now: Instant) {
        let Some(mut transition) = self.in_flight else {
            return;
        };

        let elapsed = now.saturating_duration_since(transition.started_at);
        let exit_span = self.exit_span(&transition);
        if !transition.enter_announced && elapsed >= exit_span {
            transition.enter_announced = true;
            self.events.push(TransitionEvent::EnterStarted(transition.to));
        }

        if elapsed >= exit_span + self.span {
            self.in_flight = None;
            self.events.push(TransitionEvent::EnterCompleted(transition.to));
            debug!(view = %transition.to, "view transition completed");
        } else {
            self.in_flight = Some(transition);
        }
    }

    pub fn frame(&self, now: Instant) -> ContentFrame {
        let Some(transition) = self.in_flight else {
            return ContentFrame {
                view: self.current,
                phase: TransitionPhase::Settled,
                opacity: 1.0,
                offset_x: 0.0,
            };
        };

        let elapsed = now.saturating_duration_since(transition.started_at);
        let exit_span = self.exit_span(&transition);
        match transition.from {
            Some(from) if elapsed < exit_span => {
                let t = ease_in_out(fraction(elapsed, self.span));
                ContentFrame {
                    view: from,
                    phase: TransitionPhase::Exiting,
                    opacity: 1.0 - t,
                    offset_x: -SLIDE_DISTANCE * t,
                }
            }
            _ => {
                let t = ease_in_out(fraction(elapsed.saturating_sub(exit_span), self.span));
                ContentFrame {
                    view: transition.to,
                    phase: TransitionPhase::Entering,
                    opacity: t,
                    offset_x: SLIDE_DISTANCE * (1.0 - t),
                }
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<TransitionEvent> {
        std::mem::take(&mut self.events)
    }

    fn exit_span(&self, transition: &Transition) -> Duration {
        if transition.from.is_some() {
            self.span
        } else {
            Duration::ZERO
        }
    }

    fn visible_during(&self, transition: &Transition, now: Instant) -> ViewId {
        let elapsed = now.saturating_duration_since(transition.started_at);
        match transition.from {
            Some(from) if elapsed < self.exit_span(transition) => from,
            _ => transition.to,
        }
    }
}

fn fraction(elapsed: Duration, span: Duration) -> f32 {
    if span.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / span.as_secs_f32()).clamp(0.0, 1.0)
}

pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
