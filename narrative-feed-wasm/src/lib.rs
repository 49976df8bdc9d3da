//! WASM bindings for narrative-feed: drives the feed from the browser.
//!
//! JavaScript glue forwards pointer events and audio, speech, animation, and
//! timer completions as JSON events, then executes the JSON commands the
//! session hands back against the DOM, Web Audio, and Speech Synthesis.

use wasm_bindgen::prelude::*;

use narrative_feed::core::config::FeedConfig;
use narrative_feed::core::feed::FeedController;
use narrative_feed::schema::event::FeedEvent;
use narrative_feed::story;

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------
fn parse_event(event_json: &str) -> Result<FeedEvent, JsError> {
    serde_json::from_str(event_json).map_err(|e| JsError::new(&format!("Invalid event JSON: {e}")))
}

// ---------------------------------------------------------------------------
// FeedSession: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct FeedSession {
    feed: FeedController,
    started: bool,
}

#[wasm_bindgen]
impl FeedSession {
    /// Create a session. `config_ron` overrides the default feed settings.
    #[wasm_bindgen(constructor)]
    pub fn new(config_ron: Option<String>) -> Result<FeedSession, JsError> {
        let config = match config_ron {
            Some(src) => FeedConfig::parse_ron(&src)
                .map_err(|e| JsError::new(&format!("Config parse error: {e}")))?,
            None => FeedConfig::default(),
        };
        let feed = FeedController::new(config)
            .map_err(|e| JsError::new(&format!("Feed build error: {e}")))?;
        Ok(FeedSession {
            feed,
            started: false,
        })
    }

    /// Open input, enqueue the intro script, and display the first entry.
    /// Call once, from the user gesture that unlocks audio.
    pub fn start(&mut self) -> Result<(), JsError> {
        if self.started {
            return Err(JsError::new("Session already started"));
        }
        self.feed
            .initialize()
            .map_err(|e| JsError::new(&format!("Feed error: {e}")))?;
        story::intro(self.feed.queue_mut());
        self.feed
            .advance()
            .map_err(|e| JsError::new(&format!("Feed error: {e}")))?;
        self.started = true;
        Ok(())
    }

    pub fn press_start(&mut self) -> Result<(), JsError> {
        self.apply(FeedEvent::PressStart)
    }

    pub fn press_end(&mut self) -> Result<(), JsError> {
        self.apply(FeedEvent::PressEnd)
    }

    /// Report a completion described by a JSON string.
    ///
    /// Expected JSON shape:
    /// ```json
    /// { "type": "utterance_ended", "utterance": 3 }
    /// ```
    pub fn handle_event(&mut self, event_json: &str) -> Result<(), JsError> {
        let event = parse_event(event_json)?;
        self.apply(event)
    }

    /// Return a JSON array of the commands produced since the last call.
    pub fn drain_commands(&mut self) -> Result<String, JsError> {
        let commands = self.feed.drain_commands();
        serde_json::to_string(&commands)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Number of entries currently displayed.
    pub fn history_len(&self) -> usize {
        self.feed.history_len()
    }

    /// Anchor id of the entry that receives gestures, if any.
    pub fn current_anchor(&self) -> Option<String> {
        self.feed.current().map(|entry| entry.id().anchor())
    }
}

// Private helpers
impl FeedSession {
    fn apply(&mut self, event: FeedEvent) -> Result<(), JsError> {
        self.feed
            .handle(event)
            .map_err(|e| JsError::new(&format!("Feed error: {e}")))
    }
}
