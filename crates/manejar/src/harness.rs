//! Browser test harness: session lifecycle, page navigation, screenshots.
//!
//! Thin glue over the synthesis core. A [`BrowserHarness`] owns one driver
//! session for a test run, opens page contracts by rendering their address
//! templates against a configured base URL, and captures screenshots when a
//! test body fails.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{error, info};
use url::form_urlencoded;

use crate::contract::PageLike;
use crate::driver::{DriverSession, FinderPolicy, SessionProvider};
use crate::factory::{PageFactory, PageHandle};
use crate::query::QueryParams;
use crate::result::{ManejarError, ManejarResult};

/// An argument to a page's address template.
///
/// String and integer arguments feed the template's `%s` / `%d` placeholders
/// in the order they appear; every [`QueryParams`] argument is merged and
/// rendered onto the end of the query string.
#[derive(Debug, Clone)]
pub enum UrlArg {
    /// Positional string, percent-encoded before substitution
    Str(String),
    /// Positional integer
    Int(i64),
    /// Query-string pairs appended after substitution
    Params(QueryParams),
}

impl From<&str> for UrlArg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for UrlArg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for UrlArg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for UrlArg {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<QueryParams> for UrlArg {
    fn from(value: QueryParams) -> Self {
        Self::Params(value)
    }
}

/// Configuration for a harness, applied before the session starts
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL the page address templates are appended to
    pub base_url: String,
    /// Element-finding policy handed to the session provider
    pub finder: FinderPolicy,
    /// Directory error screenshots are written into
    pub screenshot_dir: PathBuf,
    /// Capture a screenshot when a test body fails
    pub screenshot_on_error: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            finder: FinderPolicy::default(),
            screenshot_dir: PathBuf::from("target"),
            screenshot_on_error: true,
        }
    }
}

impl HarnessConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the element-finding policy
    #[must_use]
    pub const fn with_finder(mut self, finder: FinderPolicy) -> Self {
        self.finder = finder;
        self
    }

    /// Set the screenshot directory
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    /// Toggle screenshot-on-error
    #[must_use]
    pub const fn with_screenshot_on_error(mut self, enabled: bool) -> Self {
        self.screenshot_on_error = enabled;
        self
    }
}

/// Manages a driver session for a test run and produces page instances
pub struct BrowserHarness {
    config: HarnessConfig,
    session: Arc<dyn DriverSession>,
    factory: PageFactory,
}

impl BrowserHarness {
    /// Start a harness: the provider builds the session, the factory is
    /// wired to it.
    ///
    /// # Errors
    ///
    /// Whatever the provider raises while starting the session.
    pub fn start(config: HarnessConfig, provider: &dyn SessionProvider) -> ManejarResult<Self> {
        let session = provider.provide(&config.finder)?;
        let factory = PageFactory::new(Arc::clone(&session)).with_finder(config.finder);
        Ok(Self {
            config,
            session,
            factory,
        })
    }

    /// The factory wired to this harness's session
    #[must_use]
    pub const fn factory(&self) -> &PageFactory {
        &self.factory
    }

    /// Navigate to a page contract's address and synthesize its instance
    ///
    /// # Errors
    ///
    /// [`ManejarError::Navigation`] for missing or misdeclared address
    /// templates, plus synthesis and driver errors.
    pub fn open<T: PageLike>(&self) -> ManejarResult<PageHandle<T>> {
        self.open_with::<T>(&[])
    }

    /// Navigate to a page contract's address, substituting template args,
    /// and synthesize its instance.
    ///
    /// # Errors
    ///
    /// As [`BrowserHarness::open`].
    pub fn open_with<T: PageLike>(&self, args: &[UrlArg]) -> ManejarResult<PageHandle<T>> {
        let spec = T::describe();
        let template = spec.url_template().ok_or_else(|| ManejarError::Navigation {
            url: self.config.base_url.clone(),
            message: format!("page contract {} declares no address template", spec.name()),
        })?;

        let url = build_url(&self.config.base_url, template, args)?;
        info!("[{}] opening {}", T::display_name(), url);
        self.session.navigate(&url)?;
        self.factory.create::<T>()
    }

    /// Run a test body, capturing an error screenshot if it fails.
    ///
    /// The label names the test in logs and screenshot files. Errors
    /// propagate unchanged after the capture attempt.
    ///
    /// # Errors
    ///
    /// Whatever the body raises.
    pub fn run<R>(
        &self,
        label: &str,
        body: impl FnOnce(&Self) -> ManejarResult<R>,
    ) -> ManejarResult<R> {
        info!("beginning {label}");
        match body(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                error!("{label} ended in error: {err}");
                if self.config.screenshot_on_error {
                    self.capture_error_screenshot(label, &err);
                }
                Err(err)
            }
        }
    }

    /// Capture a screenshot named after the given base.
    ///
    /// Returns the written path, or `None` when the session does not
    /// support screenshots.
    ///
    /// # Errors
    ///
    /// Driver and I/O errors while capturing or writing.
    pub fn take_screenshot(&self, base: &str) -> ManejarResult<Option<PathBuf>> {
        let Some(bytes) = self.session.screenshot()? else {
            return Ok(None);
        };
        self.write_screenshot(base, "capture", &bytes).map(Some)
    }

    fn capture_error_screenshot(&self, label: &str, err: &ManejarError) {
        // a driver that attached page state to the failure saves a round trip
        let saved = match err {
            ManejarError::Driver {
                screenshot: Some(payload),
                ..
            } => BASE64
                .decode(payload)
                .map_err(|e| ManejarError::Screenshot {
                    message: e.to_string(),
                })
                .and_then(|bytes| self.write_screenshot("error-screenshot", label, &bytes))
                .map(Some),
            _ => self
                .session
                .screenshot()
                .and_then(|bytes| match bytes {
                    Some(bytes) => self
                        .write_screenshot("error-screenshot", label, &bytes)
                        .map(Some),
                    None => Ok(None),
                }),
        };
        match saved {
            Ok(Some(path)) => info!("saved error state screenshot {}", path.display()),
            Ok(None) => {}
            Err(e) => error!("couldn't save the error screenshot: {e}"),
        }
    }

    fn write_screenshot(&self, base: &str, label: &str, bytes: &[u8]) -> ManejarResult<PathBuf> {
        fs::create_dir_all(&self.config.screenshot_dir)?;
        let path = self
            .config
            .screenshot_dir
            .join(screenshot_name(base, label));
        fs::write(&path, bytes)?;
        info!("saved {}", path.display());
        Ok(path)
    }
}

impl std::fmt::Debug for BrowserHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserHarness")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn screenshot_name(base: &str, label: &str) -> String {
    let stamp = chrono::Local::now().format("%Y.%m.%d.%H.%M.%S.%3f");
    format!("{base}-{label}[{stamp}].png")
}

/// Render a page address: base URL plus template, with positional args
/// substituted and query pairs appended.
fn build_url(base: &str, template: &str, args: &[UrlArg]) -> ManejarResult<String> {
    let mut positional = Vec::new();
    let mut params = QueryParams::default();
    for arg in args {
        match arg {
            UrlArg::Str(s) => {
                positional.push(form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>());
            }
            UrlArg::Int(i) => positional.push(i.to_string()),
            UrlArg::Params(p) => params = params.and_params(p.clone()),
        }
    }

    let template = format!("{base}{template}");
    let mut url = String::with_capacity(template.len());
    let mut next = 0usize;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            url.push(c);
            continue;
        }
        match chars.peek() {
            Some('s' | 'd') => {
                chars.next();
                let value = positional.get(next).ok_or_else(|| ManejarError::Navigation {
                    url: template.clone(),
                    message: format!(
                        "address template expects more than {next} positional args"
                    ),
                })?;
                url.push_str(value);
                next += 1;
            }
            Some('%') => {
                chars.next();
                url.push('%');
            }
            _ => url.push('%'),
        }
    }
    if next != positional.len() {
        return Err(ManejarError::Navigation {
            url: template,
            message: format!(
                "address template takes {next} positional args, got {}",
                positional.len()
            ),
        });
    }

    if !params.is_empty() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&params.to_string());
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Contract, ContractSpec, OperationSpec};
    use crate::driver::{PerformedAction, ScriptedSession};
    use crate::locator::LocatorTemplate;

    struct Results;
    impl Contract for Results {
        fn display_name() -> &'static str {
            "Results"
        }
        fn describe() -> ContractSpec {
            ContractSpec::page("Results").with_url("/results?q=%s").with_operation(
                OperationSpec::new("readQuery")
                    .with_locator(LocatorTemplate::id("query"))
                    .returns_text(),
            )
        }
    }
    impl PageLike for Results {}

    struct Unaddressed;
    impl Contract for Unaddressed {
        fn display_name() -> &'static str {
            "Unaddressed"
        }
        fn describe() -> ContractSpec {
            ContractSpec::page("Unaddressed").with_operation(
                OperationSpec::new("readAnything")
                    .with_locator(LocatorTemplate::css("p"))
                    .returns_text(),
            )
        }
    }
    impl PageLike for Unaddressed {}

    fn harness(session: &Arc<ScriptedSession>) -> BrowserHarness {
        let config = HarnessConfig::new()
            .with_base_url("http://test.local")
            .with_screenshot_dir(std::env::temp_dir());
        BrowserHarness::start(config, session).unwrap()
    }

    mod build_url_tests {
        use super::*;

        #[test]
        fn test_positional_substitution_encodes_strings() {
            let url =
                build_url("http://test.local", "/results?q=%s", &["selenium rocks".into()])
                    .unwrap();
            assert_eq!(url, "http://test.local/results?q=selenium+rocks");
        }

        #[test]
        fn test_integer_substitution() {
            let url = build_url("http://test.local", "/users/%d", &[42.into()]).unwrap();
            assert_eq!(url, "http://test.local/users/42");
        }

        #[test]
        fn test_query_params_append_with_question_mark() {
            let url = build_url(
                "http://test.local",
                "/search",
                &[QueryParams::query("q", "selenium").into()],
            )
            .unwrap();
            assert_eq!(url, "http://test.local/search?q=selenium");
        }

        #[test]
        fn test_query_params_append_with_ampersand_after_existing_query() {
            let url = build_url(
                "http://test.local",
                "/search?lang=en",
                &[QueryParams::query("q", "selenium").into()],
            )
            .unwrap();
            assert_eq!(url, "http://test.local/search?lang=en&q=selenium");
        }

        #[test]
        fn test_missing_positional_arg_is_navigation_error() {
            let err = build_url("http://test.local", "/results?q=%s", &[]).unwrap_err();
            assert!(matches!(err, ManejarError::Navigation { .. }));
        }

        #[test]
        fn test_surplus_positional_arg_is_navigation_error() {
            let err =
                build_url("http://test.local", "/results", &["surplus".into()]).unwrap_err();
            assert!(matches!(err, ManejarError::Navigation { .. }));
        }
    }

    mod open_tests {
        use super::*;

        #[test]
        fn test_open_navigates_then_synthesizes() {
            let session = Arc::new(ScriptedSession::new().with_text("query", "selenium"));
            let harness = harness(&session);
            let results = harness.open_with::<Results>(&["selenium".into()]).unwrap();
            assert_eq!(results.read("readQuery").unwrap(), "selenium");
            assert_eq!(
                session.actions().first(),
                Some(&PerformedAction::Navigate {
                    url: "http://test.local/results?q=selenium".to_string()
                })
            );
        }

        #[test]
        fn test_open_requires_an_address_template() {
            let session = Arc::new(ScriptedSession::new());
            let harness = harness(&session);
            let err = harness.open::<Unaddressed>().unwrap_err();
            assert!(matches!(err, ManejarError::Navigation { .. }));
        }
    }

    mod screenshot_tests {
        use super::*;

        #[test]
        fn test_take_screenshot_writes_bytes() {
            let dir = tempfile::tempdir().unwrap();
            let session = Arc::new(ScriptedSession::new().with_screenshot(vec![1, 2, 3]));
            let config = HarnessConfig::new().with_screenshot_dir(dir.path());
            let harness = BrowserHarness::start(config, &session).unwrap();
            let path = harness.take_screenshot("screenshot").unwrap().unwrap();
            assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
        }

        #[test]
        fn test_take_screenshot_without_support_is_none() {
            let session = Arc::new(ScriptedSession::new());
            let harness = harness(&session);
            assert!(harness.take_screenshot("screenshot").unwrap().is_none());
        }

        #[test]
        fn test_run_captures_screenshot_on_error() {
            let dir = tempfile::tempdir().unwrap();
            let session = Arc::new(ScriptedSession::new().with_screenshot(vec![9, 9]));
            let config = HarnessConfig::new().with_screenshot_dir(dir.path());
            let harness = BrowserHarness::start(config, &session).unwrap();
            let result: ManejarResult<()> = harness.run("failing_test", |_| {
                Err(ManejarError::driver("boom"))
            });
            assert!(result.is_err());
            let shots: Vec<_> = fs::read_dir(dir.path())
                .unwrap()
                .filter_map(Result::ok)
                .filter(|e| {
                    e.file_name()
                        .to_string_lossy()
                        .starts_with("error-screenshot-failing_test")
                })
                .collect();
            assert_eq!(shots.len(), 1);
        }

        #[test]
        fn test_run_prefers_the_payload_attached_to_the_error() {
            let dir = tempfile::tempdir().unwrap();
            let session = Arc::new(ScriptedSession::new());
            let config = HarnessConfig::new().with_screenshot_dir(dir.path());
            let harness = BrowserHarness::start(config, &session).unwrap();
            let payload = BASE64.encode([7, 7, 7]);
            let result: ManejarResult<()> = harness.run("payload_test", |_| {
                Err(ManejarError::Driver {
                    message: "boom".to_string(),
                    screenshot: Some(payload.clone()),
                })
            });
            assert!(result.is_err());
            let shot = fs::read_dir(dir.path())
                .unwrap()
                .filter_map(Result::ok)
                .find(|e| {
                    e.file_name()
                        .to_string_lossy()
                        .starts_with("error-screenshot-payload_test")
                })
                .unwrap();
            assert_eq!(fs::read(shot.path()).unwrap(), vec![7, 7, 7]);
        }

        #[test]
        fn test_run_passes_success_through() {
            let session = Arc::new(ScriptedSession::new());
            let harness = harness(&session);
            let value = harness.run("passing_test", |_| Ok(41 + 1)).unwrap();
            assert_eq!(value, 42);
        }
    }
}
