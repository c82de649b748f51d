//! Outbound transport seam.
//!
//! The bus never talks to a socket directly; it writes through a
//! [`ConnectionSink`] injected per connection. Production wires a real
//! transport in, tests wire in [`RecordingSink`].

use perpmatch_types::Result;

/// One client connection's outbound half.
pub trait ConnectionSink {
    /// Deliver one text frame.
    ///
    /// # Errors
    /// `Transport` when the peer is gone or the write fails; the bus
    /// responds by terminating this connection only.
    fn send(&mut self, text: &str) -> Result<()>;

    /// Probe liveness.
    ///
    /// # Errors
    /// `Transport` when the ping cannot be written.
    fn ping(&mut self) -> Result<()>;

    /// Tear the connection down. Idempotent.
    fn close(&mut self);
}

#[cfg(any(test, feature = "test-helpers"))]
pub use recording::RecordingSink;

#[cfg(any(test, feature = "test-helpers"))]
mod recording {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use perpmatch_types::{PerpmatchError, Result};

    use super::ConnectionSink;

    #[derive(Debug, Default)]
    struct SinkState {
        sent: Vec<String>,
        pings: usize,
        closed: bool,
        failed_sends: VecDeque<String>,
        failed_pings: VecDeque<String>,
    }

    /// In-memory sink that records everything written through it.
    ///
    /// Clones share state: hand one clone to the bus, keep another to
    /// inspect what was delivered.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingSink {
        state: Rc<RefCell<SinkState>>,
    }

    impl RecordingSink {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Frames delivered so far, in order.
        #[must_use]
        pub fn sent(&self) -> Vec<String> {
            self.state.borrow().sent.clone()
        }

        /// Delivered frames parsed back to JSON.
        ///
        /// # Panics
        /// If a recorded frame is not valid JSON; the bus only sends JSON.
        #[must_use]
        pub fn sent_json(&self) -> Vec<serde_json::Value> {
            self.sent()
                .iter()
                .map(|text| serde_json::from_str(text).expect("sink recorded non-JSON frame"))
                .collect()
        }

        #[must_use]
        pub fn ping_count(&self) -> usize {
            self.state.borrow().pings
        }

        #[must_use]
        pub fn is_closed(&self) -> bool {
            self.state.borrow().closed
        }

        /// Script the next `send` to fail with a transport error.
        pub fn fail_next_send(&self, reason: &str) {
            self.state
                .borrow_mut()
                .failed_sends
                .push_back(reason.to_string());
        }

        /// Script the next `ping` to fail with a transport error.
        pub fn fail_next_ping(&self, reason: &str) {
            self.state
                .borrow_mut()
                .failed_pings
                .push_back(reason.to_string());
        }
    }

    impl ConnectionSink for RecordingSink {
        fn send(&mut self, text: &str) -> Result<()> {
            let mut state = self.state.borrow_mut();
            if let Some(reason) = state.failed_sends.pop_front() {
                return Err(PerpmatchError::Transport { reason });
            }
            state.sent.push(text.to_string());
            Ok(())
        }

        fn ping(&mut self) -> Result<()> {
            let mut state = self.state.borrow_mut();
            if let Some(reason) = state.failed_pings.pop_front() {
                return Err(PerpmatchError::Transport { reason });
            }
            state.pings += 1;
            Ok(())
        }

        fn close(&mut self) {
            self.state.borrow_mut().closed = true;
        }
    }
}
