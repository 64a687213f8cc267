//! Confirmed-input history and prediction for a single player.
//!
//! Storage is a ring of the most recent confirmed inputs; frames form a
//! contiguous suffix ending just below `next_frame_to_store`. Retrieval
//! beyond the stored suffix returns a *prediction*, a repeat of the last
//! confirmed input, which in typical action-game pacing is right far more
//! often than wrong, because players change inputs much slower than the
//! simulation rate.
//!
//! The prediction value is captured once, when prediction mode begins, and
//! held until confirmed inputs catch back up to everything the simulation
//! consumed. That matters: comparing a late-arriving confirmed input against
//! the *current* last-confirmed value instead of against the value actually
//! used would miss rollbacks.

use crate::containers::RingBuffer;
use crate::input::{CharacterInput, InputHistoryArray};
use crate::report_violation;
use crate::telemetry::{ViolationKind, ViolationSeverity};
use crate::{Frame, MAX_INPUT_DELAY, MAX_ROLLBACK};

/// Ring capacity: the rollback window, the widest input delay, and the
/// current frame. Covers the worst case of maximum delay combined with a
/// rollback to the oldest reachable frame.
pub(crate) const INPUT_STORE_LEN: usize = (MAX_ROLLBACK + MAX_INPUT_DELAY) as usize + 1;

/// Whether a retrieved input was confirmed by its player or predicted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// The player's actual input for the frame.
    Confirmed,
    /// Repeat-last-confirmed placeholder; subject to rollback correction.
    Predicted,
}

#[derive(Debug, Clone)]
struct Prediction {
    /// The value every predicted frame was simulated with.
    value: CharacterInput,
    /// Earliest frame whose confirmed input contradicted `value`.
    first_incorrect: Option<Frame>,
}

/// Input storage for one spot.
#[derive(Debug, Clone)]
pub struct PerPlayerInputs {
    confirmed: RingBuffer<CharacterInput, INPUT_STORE_LEN>,
    /// The only frame `add_input` will accept next.
    next_frame_to_store: Frame,
    /// Total confirmed inputs ever stored this session (bounds early reads).
    stored_count: u64,
    /// Newest frame the simulation consumed from this store.
    last_requested_frame: Option<Frame>,
    prediction: Option<Prediction>,
}

impl Default for PerPlayerInputs {
    fn default() -> Self {
        Self::new()
    }
}

impl PerPlayerInputs {
    /// Creates an empty store expecting frame 0 first.
    #[must_use]
    pub fn new() -> Self {
        Self {
            confirmed: RingBuffer::new(),
            next_frame_to_store: Frame::new(0),
            stored_count: 0,
            last_requested_frame: None,
            prediction: None,
        }
    }

    /// Wipes all state for a new session.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Stores `count` default inputs for the leading frames. Positive input
    /// delay prefills so the fetched input at tick N lands on frame
    /// N + delay while frames 0..delay read neutral inputs.
    pub fn prefill(&mut self, count: u32) {
        for _ in 0..count {
            self.confirmed.push(CharacterInput::default());
            self.next_frame_to_store = self.next_frame_to_store.next();
            self.stored_count += 1;
        }
    }

    /// Appends the confirmed input for exactly `next_frame_to_store`.
    ///
    /// Re-adding an already stored frame is an idempotent no-op (redundant
    /// wire deliveries land here). A gap is a design error: reported, and
    /// the input is dropped.
    pub fn add_input(&mut self, frame: Frame, input: CharacterInput) {
        let ahead = frame.delta(self.next_frame_to_store);
        if ahead < 0 {
            tracing::trace!(
                frame = frame.number(),
                next = self.next_frame_to_store.number(),
                "ignoring duplicate confirmed input"
            );
            return;
        }
        if ahead > 0 {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::InputStore,
                "input for frame {} would leave a gap (expected frame {})",
                frame,
                self.next_frame_to_store
            );
            return;
        }

        self.confirmed.push(input);
        self.next_frame_to_store = frame.next();
        self.stored_count += 1;

        if let Some(prediction) = &mut self.prediction {
            // only frames the simulation consumed were predicted
            let was_consumed = self
                .last_requested_frame
                .is_some_and(|requested| frame.delta(requested) <= 0);
            if was_consumed
                && prediction.first_incorrect.is_none()
                && input != prediction.value
            {
                prediction.first_incorrect = Some(frame);
            }

            // leave prediction mode once confirmed inputs cover everything
            // consumed, unless a misprediction is waiting for rollback
            let caught_up = self
                .last_requested_frame
                .is_some_and(|requested| self.next_frame_to_store.delta(requested) > 0);
            if caught_up && prediction.first_incorrect.is_none() {
                self.prediction = None;
            }
        }
    }

    /// Retrieves the input to simulate `frame` with: confirmed when stored,
    /// otherwise the prediction.
    ///
    /// Requests outside the stored-or-predictable window are a design error
    /// (the caller should have stalled); reported, with the prediction
    /// returned as a safe default.
    pub fn input_for_frame(&mut self, frame: Frame) -> (CharacterInput, InputKind) {
        self.last_requested_frame = Some(frame);

        let ahead = frame.delta(self.next_frame_to_store);
        if ahead < 0 {
            // within the stored suffix; 1 back = newest stored
            let back = u64::from((-ahead) as u32);
            if back > self.stored_count || back > INPUT_STORE_LEN as u64 {
                report_violation!(
                    ViolationSeverity::Error,
                    ViolationKind::InputStore,
                    "input for frame {} has left the stored window (next to store {})",
                    frame,
                    self.next_frame_to_store
                );
                return (self.latest_confirmed(), InputKind::Predicted);
            }
            let offset = -(back as i32 - 1);
            return (*self.confirmed.get(offset), InputKind::Confirmed);
        }

        if self.is_frame_outside_get_range(frame) {
            report_violation!(
                ViolationSeverity::Error,
                ViolationKind::InputStore,
                "input for frame {} requested beyond the prediction window (next to store {})",
                frame,
                self.next_frame_to_store
            );
            // fall through: prediction is still the safest answer
        }

        let value = match &self.prediction {
            Some(prediction) => prediction.value,
            None => {
                let value = self.latest_confirmed();
                self.prediction = Some(Prediction {
                    value,
                    first_incorrect: None,
                });
                value
            },
        };
        (value, InputKind::Predicted)
    }

    /// The newest confirmed frame, `None` before any input is stored.
    #[must_use]
    pub fn last_stored_frame(&self) -> Option<Frame> {
        if self.stored_count == 0 {
            None
        } else {
            Some(self.next_frame_to_store.previous())
        }
    }

    /// The frame `add_input` expects next.
    #[must_use]
    pub fn next_frame_to_store(&self) -> Frame {
        self.next_frame_to_store
    }

    /// True when `frame` is stored (confirmed input exists for it now or
    /// existed before falling out of the ring).
    #[must_use]
    pub fn has_confirmed(&self, frame: Frame) -> bool {
        self.stored_count > 0 && frame.delta(self.next_frame_to_store) < 0
    }

    /// True when `frame` is beyond even the prediction window, i.e. the
    /// simulation must stall rather than consume this store.
    #[must_use]
    pub fn is_frame_outside_get_range(&self, frame: Frame) -> bool {
        let max_predictable = self.next_frame_to_store.offset(MAX_ROLLBACK as i32 - 1);
        frame.delta(max_predictable) > 0
    }

    /// Earliest frame whose confirmed input contradicted the prediction it
    /// was simulated with. Cleared by [`reset_prediction`](Self::reset_prediction).
    #[must_use]
    pub fn first_incorrect_frame(&self) -> Option<Frame> {
        self.prediction
            .as_ref()
            .and_then(|prediction| prediction.first_incorrect)
    }

    /// Drops prediction bookkeeping. Called when a rollback begins; the
    /// replay re-derives any prediction still needed from the corrected
    /// inputs.
    pub fn reset_prediction(&mut self) {
        self.prediction = None;
        self.last_requested_frame = None;
    }

    /// The value predictions repeat: the newest confirmed input, or the
    /// neutral input before any arrive.
    #[must_use]
    pub fn latest_confirmed(&self) -> CharacterInput {
        if self.stored_count == 0 {
            CharacterInput::default()
        } else {
            *self.confirmed.get(0)
        }
    }

    /// The redundant broadcast window: newest stored frame plus the inputs
    /// for it and the preceding frames, newest first. `None` before any
    /// input is stored.
    #[must_use]
    pub fn history(&self) -> Option<(Frame, InputHistoryArray)> {
        let newest = self.last_stored_frame()?;
        let mut inputs: InputHistoryArray = Default::default();
        let available = self
            .stored_count
            .min(MAX_ROLLBACK as u64)
            .min(inputs.len() as u64) as usize;
        for (back, slot) in inputs.iter_mut().enumerate().take(available) {
            *slot = *self.confirmed.get(-(back as i32));
        }
        Some((newest, inputs))
    }
}

// #########
// # TESTS #
// #########
