//! Drive a page the way a browser test would, against a scripted session.
//!
//! Mirrors the classic first test against example.com: declare the page as
//! data, open it through the harness, read the heading.

use std::sync::Arc;

use manejar::{
    BrowserHarness, Contract, ContractSpec, HarnessConfig, LocatorTemplate, ManejarResult,
    OperationSpec, PageLike, ScriptedSession,
};

struct Index;

impl Contract for Index {
    fn display_name() -> &'static str {
        "Index"
    }

    fn describe() -> ContractSpec {
        ContractSpec::page("Index")
            .with_url("/")
            .with_operation(
                OperationSpec::new("readHeading")
                    .with_locator(LocatorTemplate::css("div:first-child > h1:first-child"))
                    .returns_text(),
            )
            .with_operation(
                OperationSpec::new("readMoreInformation")
                    .with_locator(LocatorTemplate::css("a"))
                    .returns_text(),
            )
    }
}
impl PageLike for Index {}

fn main() -> ManejarResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // a live run would hand the harness a real driver provider instead
    let session = Arc::new(
        ScriptedSession::new()
            .with_text("div:first-child > h1:first-child", "Example Domain")
            .with_text("a", "More information..."),
    );

    let config = HarnessConfig::new().with_base_url("http://example.com");
    let harness = BrowserHarness::start(config, &session)?;

    harness.run("load_the_home_page", |harness| {
        let index = harness.open::<Index>()?;
        let heading = index.read("readHeading")?;
        let more = index.read("readMoreInformation")?;
        println!("heading: {heading}");
        println!("link:    {more}");
        assert_eq!(heading, "Example Domain");
        assert_eq!(more, "More information...");
        Ok(())
    })
}
