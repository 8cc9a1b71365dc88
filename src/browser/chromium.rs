//! Chromium-backed browser session using chromiumoxide.
//!
//! Element handles are indices into a registry array kept on the page's
//! `window`, so XPath lookups can be scoped to a previously found element and
//! every element operation is a single `evaluate` round trip. The registry is
//! discarded with the document on every navigation.

use super::{BrowserError, BrowserResult, BrowserSession, Element, Key, Locator, Strategy};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromiumConfig};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const REGISTRY: &str = "(window.__feedTide = window.__feedTide || [])";
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A single Chromium tab driven through the DevTools protocol
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

#[derive(Debug, Deserialize)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl ChromiumSession {
    /// Launches Chromium and opens a blank tab
    pub async fn launch(config: &BrowserConfig) -> BrowserResult<Self> {
        let mut builder = ChromiumConfig::builder().arg("--disable-notifications");
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }
        if let Some(profile) = &config.user_data_dir {
            builder = builder.user_data_dir(profile);
        }
        if !config.headless {
            builder = builder.with_head();
        }
        let chromium_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(chromium_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Closes the browser and stops the protocol handler
    pub async fn shutdown(mut self) -> BrowserResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| BrowserError::Driver(e.to_string()))?;
        self.handler.abort();
        Ok(())
    }

    async fn eval(&self, script: String) -> BrowserResult<Value> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?
            .into_value::<Value>()
            .map_err(|e| BrowserError::Script(format!("{e:?}")))
    }

    /// Runs `body` with `el` bound to the registered element.
    ///
    /// `body` must `return` the value handed back to Rust.
    async fn on_element<T: DeserializeOwned>(&self, element: Element, body: &str) -> BrowserResult<T> {
        let script = format!(
            "(() => {{ const el = {REGISTRY}[{id}]; \
             if (!el || !el.isConnected) return {{ stale: true }}; \
             const value = (() => {{ {body} }})(); \
             return {{ value: value === undefined ? null : value }}; }})()",
            id = element.id(),
        );
        let reply = self.eval(script).await?;
        if reply.get("stale").and_then(Value::as_bool) == Some(true) {
            return Err(BrowserError::StaleElement(element));
        }
        let value = reply.get("value").cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| BrowserError::Script(e.to_string()))
    }
}

fn lookup_script(scope: Option<Element>, locator: &Locator) -> BrowserResult<String> {
    let expression =
        serde_json::to_string(locator.expression).map_err(|e| BrowserError::Script(e.to_string()))?;
    let scope = scope
        .map(|e| e.id().to_string())
        .unwrap_or_else(|| "null".to_string());
    let collect = match locator.strategy {
        Strategy::XPath => format!(
            "const snap = document.evaluate({expression}, root, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
             for (let i = 0; i < snap.snapshotLength; i++) nodes.push(snap.snapshotItem(i));"
        ),
        Strategy::Css => format!("nodes.push(...root.querySelectorAll({expression}));"),
    };
    Ok(format!(
        "(() => {{ const reg = {REGISTRY}; const scope = {scope}; let root = document; \
         if (scope !== null) {{ root = reg[scope]; if (!root || !root.isConnected) return {{ stale: true }}; }} \
         const nodes = []; {collect} \
         return {{ ids: nodes.map(n => {{ reg.push(n); return reg.length - 1; }}) }}; }})()"
    ))
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Driver(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    async fn find_one(&self, scope: Option<Element>, locator: &Locator) -> BrowserResult<Element> {
        self.find_all(scope, locator)
            .await?
            .into_iter()
            .next()
            .ok_or(BrowserError::NoSuchElement(*locator))
    }

    async fn find_all(
        &self,
        scope: Option<Element>,
        locator: &Locator,
    ) -> BrowserResult<Vec<Element>> {
        let reply = self.eval(lookup_script(scope, locator)?).await?;
        if reply.get("stale").and_then(Value::as_bool) == Some(true) {
            if let Some(scope) = scope {
                return Err(BrowserError::StaleElement(scope));
            }
        }
        let ids: Vec<u64> = serde_json::from_value(reply.get("ids").cloned().unwrap_or_default())
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(ids.into_iter().map(Element::new).collect())
    }

    async fn wait_until_present(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> BrowserResult<Element> {
        let started = Instant::now();
        loop {
            if let Some(element) = self.find_all(None, locator).await?.into_iter().next() {
                return Ok(element);
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::Timeout {
                    locator: *locator,
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn run_script(&self, code: &str, args: &[Element]) -> BrowserResult<Value> {
        let args = args
            .iter()
            .map(|e| format!("reg[{}]", e.id()))
            .collect::<Vec<_>>()
            .join(", ");
        let script = format!(
            "(() => {{ const reg = {REGISTRY}; \
             const value = (function() {{ {code} }}).apply(null, [{args}]); \
             return {{ value: value === undefined ? null : value }}; }})()"
        );
        let reply = self.eval(script).await?;
        Ok(reply.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn screenshot_element(&self, element: Element) -> BrowserResult<Vec<u8>> {
        let rect: Rect = self
            .on_element(
                element,
                "el.scrollIntoView({ block: 'center' }); const r = el.getBoundingClientRect(); \
                 return { x: r.left + window.scrollX, y: r.top + window.scrollY, \
                 width: r.width, height: r.height };",
            )
            .await?;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .clip(Viewport {
                x: rect.x,
                y: rect.y,
                width: rect.width.max(1.0),
                height: rect.height.max(1.0),
                scale: 1.0,
            })
            .capture_beyond_viewport(true)
            .build();

        self.page
            .screenshot(params)
            .await
            .map_err(|e| BrowserError::Driver(format!("screenshot failed: {e}")))
    }

    async fn rendered_size(&self) -> BrowserResult<usize> {
        let size = self
            .eval("document.documentElement.outerHTML.length".to_string())
            .await?;
        size.as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| BrowserError::Script("rendered size is not a number".to_string()))
    }

    async fn text(&self, element: Element) -> BrowserResult<String> {
        self.on_element(element, "return el.innerText || el.textContent || '';")
            .await
    }

    async fn attribute(&self, element: Element, name: &str) -> BrowserResult<Option<String>> {
        let name = serde_json::to_string(name).map_err(|e| BrowserError::Script(e.to_string()))?;
        self.on_element(element, &format!("return el.getAttribute({name});"))
            .await
    }

    async fn outer_html(&self, element: Element) -> BrowserResult<String> {
        self.on_element(element, "return el.outerHTML;").await
    }

    async fn is_displayed(&self, element: Element) -> BrowserResult<bool> {
        self.on_element(
            element,
            "const style = window.getComputedStyle(el); \
             return style.visibility !== 'hidden' && style.display !== 'none' && \
             !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);",
        )
        .await
    }

    async fn click(&self, element: Element) -> BrowserResult<()> {
        let outcome: String = self
            .on_element(
                element,
                "el.scrollIntoView({ block: 'center' }); const r = el.getBoundingClientRect(); \
                 const hit = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2); \
                 if (hit && hit !== el && !el.contains(hit)) return 'intercepted'; \
                 el.click(); return 'clicked';",
            )
            .await?;
        if outcome == "intercepted" {
            return Err(BrowserError::ClickIntercepted(element));
        }
        Ok(())
    }

    async fn hover(&self, element: Element) -> BrowserResult<()> {
        self.on_element::<Value>(
            element,
            "for (const type of ['mouseover', 'mouseenter', 'mousemove']) \
             el.dispatchEvent(new MouseEvent(type, { bubbles: true, view: window })); \
             return null;",
        )
        .await?;
        Ok(())
    }

    async fn press_key(&self, key: Key) -> BrowserResult<()> {
        for event in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            self.page
                .execute(key_event(event, key)?)
                .await
                .map_err(|e| BrowserError::Driver(format!("key press {} failed: {e}", key.as_str())))?;
        }
        Ok(())
    }
}

/// Trusted key event as dispatched by the DevTools input domain
fn key_event(event: DispatchKeyEventType, key: Key) -> BrowserResult<DispatchKeyEventParams> {
    DispatchKeyEventParams::builder()
        .r#type(event)
        .key(key.as_str())
        .code(key.as_str())
        .windows_virtual_key_code(key.virtual_key_code())
        .native_virtual_key_code(key.virtual_key_code())
        .build()
        .map_err(BrowserError::Driver)
}
