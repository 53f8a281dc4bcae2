//! The primitive action surface and driver session collaborators.
//!
//! The synthesis core is agnostic to how "click", "set text" and "read text"
//! are executed against a live page. Implementations of [`DriverSession`]
//! own the transport and the element-finding wait policy; they locate the
//! target internally and fail with
//! [`ManejarError::ElementNotFound`](crate::ManejarError::ElementNotFound)
//! if it never appears.
//!
//! [`ScriptedSession`] is the in-memory implementation used by unit tests
//! and examples: it records every primitive invocation and replays scripted
//! element texts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::locator::Locator;
use crate::result::{ManejarError, ManejarResult};

/// Default timeout for element finding (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval for element finding (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Wait/retry policy for the element-finding collaborator.
///
/// Plain configuration data: the core never blocks on it, the driver
/// implementation consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinderPolicy {
    /// How long a primitive may wait for its element
    pub timeout: Duration,
    /// Polling interval while waiting
    pub poll_interval: Duration,
}

impl Default for FinderPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl FinderPolicy {
    /// Set the finding timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// One live browser session: the primitive action surface plus session
/// accessors.
///
/// Primitives execute strictly sequentially against one logical tab; any
/// wait/retry behavior is internal to the implementation.
pub trait DriverSession: Send + Sync {
    /// Click the element the locator resolves to
    ///
    /// # Errors
    ///
    /// [`ManejarError::ElementNotFound`] if the element never appears, or a
    /// driver-level error.
    fn click(&self, locator: &Locator) -> ManejarResult<()>;

    /// Type a value into the element the locator resolves to
    ///
    /// # Errors
    ///
    /// [`ManejarError::ElementNotFound`] if the element never appears, or a
    /// driver-level error.
    fn set_text(&self, locator: &Locator, value: &str) -> ManejarResult<()>;

    /// Read the text of the element the locator resolves to.
    ///
    /// Implementations reading form inputs conventionally return the
    /// control's value rather than its (empty) text.
    ///
    /// # Errors
    ///
    /// [`ManejarError::ElementNotFound`] if the element never appears, or a
    /// driver-level error.
    fn read_text(&self, locator: &Locator) -> ManejarResult<String>;

    /// Read an attribute of the element the locator resolves to
    ///
    /// # Errors
    ///
    /// [`ManejarError::ElementNotFound`] if the element never appears, or a
    /// driver-level error.
    fn read_attribute(&self, locator: &Locator, attribute: &str) -> ManejarResult<String>;

    /// The session's current URL
    ///
    /// # Errors
    ///
    /// Driver-level errors only.
    fn current_url(&self) -> ManejarResult<String>;

    /// Direct the session to load a URL
    ///
    /// # Errors
    ///
    /// [`ManejarError::Navigation`] on failure.
    fn navigate(&self, url: &str) -> ManejarResult<()>;

    /// Capture a screenshot of the current page state.
    ///
    /// Returns `Ok(None)` when the transport cannot take screenshots.
    ///
    /// # Errors
    ///
    /// Driver-level errors only.
    fn screenshot(&self) -> ManejarResult<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// Builds driver sessions for a test run
pub trait SessionProvider {
    /// Produce a live session configured with the given finder policy
    ///
    /// # Errors
    ///
    /// Driver-level errors while starting the session.
    fn provide(&self, finder: &FinderPolicy) -> ManejarResult<Arc<dyn DriverSession>>;
}

/// A primitive invocation recorded by [`ScriptedSession`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerformedAction {
    /// A click
    Click {
        /// Resolved locator, rendered with [`std::fmt::Display`]
        locator: String,
    },
    /// A text entry
    SetText {
        /// Resolved locator
        locator: String,
        /// Value typed
        value: String,
    },
    /// A text read
    ReadText {
        /// Resolved locator
        locator: String,
    },
    /// An attribute read
    ReadAttribute {
        /// Resolved locator
        locator: String,
        /// Attribute name
        attribute: String,
    },
    /// A navigation
    Navigate {
        /// Target URL
        url: String,
    },
}

#[derive(Debug, Default)]
struct ScriptedState {
    texts: HashMap<String, String>,
    attributes: HashMap<(String, String), String>,
    actions: Vec<PerformedAction>,
    url: Option<String>,
    screenshot: Option<Vec<u8>>,
}

/// In-memory driver session for tests and examples.
///
/// Clicks and text entries always succeed and are recorded; reads replay
/// texts scripted per locator value and fail with `ElementNotFound` for
/// anything unscripted, the way a live finder would for a missing element.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    state: Mutex<ScriptedState>,
}

impl ScriptedSession {
    /// Create an empty scripted session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the text read back for a locator value
    #[must_use]
    pub fn with_text(self, locator_value: impl Into<String>, text: impl Into<String>) -> Self {
        self.state
            .lock()
            .expect("scripted state poisoned")
            .texts
            .insert(locator_value.into(), text.into());
        self
    }

    /// Script an attribute read back for a locator value
    #[must_use]
    pub fn with_attribute(
        self,
        locator_value: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.state
            .lock()
            .expect("scripted state poisoned")
            .attributes
            .insert((locator_value.into(), attribute.into()), value.into());
        self
    }

    /// Script the bytes returned by [`DriverSession::screenshot`]
    #[must_use]
    pub fn with_screenshot(self, bytes: Vec<u8>) -> Self {
        self.state
            .lock()
            .expect("scripted state poisoned")
            .screenshot = Some(bytes);
        self
    }

    /// Everything the session has been asked to do, in order
    #[must_use]
    pub fn actions(&self) -> Vec<PerformedAction> {
        self.state
            .lock()
            .expect("scripted state poisoned")
            .actions
            .clone()
    }

    fn record(&self, action: PerformedAction) {
        self.state
            .lock()
            .expect("scripted state poisoned")
            .actions
            .push(action);
    }
}

impl DriverSession for ScriptedSession {
    fn click(&self, locator: &Locator) -> ManejarResult<()> {
        self.record(PerformedAction::Click {
            locator: locator.to_string(),
        });
        Ok(())
    }

    fn set_text(&self, locator: &Locator, value: &str) -> ManejarResult<()> {
        self.record(PerformedAction::SetText {
            locator: locator.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn read_text(&self, locator: &Locator) -> ManejarResult<String> {
        self.record(PerformedAction::ReadText {
            locator: locator.to_string(),
        });
        let state = self.state.lock().expect("scripted state poisoned");
        state
            .texts
            .get(locator.value())
            .cloned()
            .ok_or_else(|| ManejarError::ElementNotFound {
                locator: locator.to_string(),
            })
    }

    fn read_attribute(&self, locator: &Locator, attribute: &str) -> ManejarResult<String> {
        self.record(PerformedAction::ReadAttribute {
            locator: locator.to_string(),
            attribute: attribute.to_string(),
        });
        let state = self.state.lock().expect("scripted state poisoned");
        state
            .attributes
            .get(&(locator.value().to_string(), attribute.to_string()))
            .cloned()
            .ok_or_else(|| ManejarError::ElementNotFound {
                locator: locator.to_string(),
            })
    }

    fn current_url(&self) -> ManejarResult<String> {
        let state = self.state.lock().expect("scripted state poisoned");
        Ok(state.url.clone().unwrap_or_else(|| "about:blank".to_string()))
    }

    fn navigate(&self, url: &str) -> ManejarResult<()> {
        self.record(PerformedAction::Navigate {
            url: url.to_string(),
        });
        self.state.lock().expect("scripted state poisoned").url = Some(url.to_string());
        Ok(())
    }

    fn screenshot(&self) -> ManejarResult<Option<Vec<u8>>> {
        let state = self.state.lock().expect("scripted state poisoned");
        Ok(state.screenshot.clone())
    }
}

impl SessionProvider for Arc<ScriptedSession> {
    fn provide(&self, _finder: &FinderPolicy) -> ManejarResult<Arc<dyn DriverSession>> {
        Ok(Arc::clone(self) as Arc<dyn DriverSession>)
    }
}
