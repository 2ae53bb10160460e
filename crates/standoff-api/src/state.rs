//! Shared application state.

use std::sync::Arc;

use standoff_core::clock::Clock;
use standoff_core::decision::DecisionAdapter;
use standoff_core::speech::SpeechSynthesizer;
use standoff_session::application::settings::SessionSettings;
use standoff_session::application::store::SessionStore;

use crate::channel::hub::SessionHub;

/// Application state shared across all request handlers and connections.
#[derive(Clone)]
pub struct AppState {
    /// Clock for timestamps.
    pub clock: Arc<dyn Clock>,
    /// Every live session.
    pub store: Arc<SessionStore>,
    /// Scenario and decision deadline.
    pub settings: Arc<SessionSettings>,
    /// Per-session workers and connection links.
    pub hub: SessionHub,
    /// Text-to-speech backend for the synthesis route, when configured.
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl AppState {
    /// Create new application state with an empty session store.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        adapter: Arc<dyn DecisionAdapter>,
        settings: SessionSettings,
    ) -> Self {
        let store = Arc::new(SessionStore::new());
        let settings = Arc::new(settings);
        let hub = SessionHub::new(
            Arc::clone(&clock),
            Arc::clone(&store),
            adapter,
            Arc::clone(&settings),
        );
        Self {
            clock,
            store,
            settings,
            hub,
            speech: None,
        }
    }

    /// Serves the synthesis route through `speech`.
    #[must_use]
    pub fn with_speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(speech);
        self
    }
}
