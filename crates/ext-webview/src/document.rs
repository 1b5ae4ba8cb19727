//! Webview document assembly.
//!
//! Panel HTML is a fragment (or occasionally a full document) authored by an
//! extension. Before the hosting UI loads it into a sandboxed surface it is
//! wrapped in a shell that pins a content security policy and injects the
//! bridge bootstrap script so the page can talk to the host.

use ext_runtime::WebviewPanel;
use serde_json::Value;

/// Field carrying the envelope discriminator in bridge messages.
pub const MESSAGE_SOURCE_FIELD: &str = "source";
/// Envelope value for messages posted by page code via `postMessage`.
pub const MESSAGE_SOURCE_POST: &str = "webview";
/// Envelope value for bridge-internal state updates via `setState`.
pub const MESSAGE_SOURCE_STATE: &str = "webview-state";
/// Field carrying the user payload in bridge messages.
pub const MESSAGE_PAYLOAD_FIELD: &str = "payload";

/// The CSP applied to every rendered webview document.
///
/// Inline styles and https resources are allowed since typical extension UI
/// relies on them; script execution is granted only when the panel opted in.
pub fn content_security_policy(enable_scripts: bool) -> String {
    let mut directives = vec![
        "default-src 'none'",
        "img-src https: data: blob:",
        "style-src 'unsafe-inline' https:",
        "font-src https: data:",
        "connect-src https:",
    ];
    if enable_scripts {
        directives.push("script-src 'unsafe-inline' https:");
    }
    directives.join("; ")
}

/// Wrap a panel's HTML in a renderable, sandbox-ready document.
///
/// Fragments get a full shell; HTML that is already a complete document only
/// has the CSP meta tag and bootstrap script injected into its head. The
/// panel's saved state is embedded so `getState` resolves immediately after
/// a reload.
pub fn build_document(panel: &WebviewPanel, initial_state: Option<&Value>) -> String {
    let html = panel.html();
    let csp_meta = format!(
        r#"<meta http-equiv="Content-Security-Policy" content="{}">"#,
        content_security_policy(panel.options().enable_scripts)
    );
    let bootstrap = bootstrap_script(initial_state);

    if let Some(html_tag) = find_tag_ci(&html, "<html") {
        return inject_into_document(&html, html_tag, &csp_meta, &bootstrap);
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         {csp_meta}\n{bootstrap}\n</head>\n<body>\n{html}\n</body>\n</html>"
    )
}

/// Inject the CSP and bootstrap into an already-complete document, right
/// after `<head ...>` when present, otherwise as a new head after `<html>`.
fn inject_into_document(html: &str, html_tag: usize, csp_meta: &str, bootstrap: &str) -> String {
    if let Some(head_tag) = find_tag_ci(html, "<head") {
        if let Some(close) = html[head_tag..].find('>') {
            let insert_at = head_tag + close + 1;
            return format!(
                "{}\n{}\n{}{}",
                &html[..insert_at],
                csp_meta,
                bootstrap,
                &html[insert_at..]
            );
        }
    }
    match html[html_tag..].find('>') {
        Some(close) => {
            let insert_at = html_tag + close + 1;
            format!(
                "{}\n<head>\n{}\n{}\n</head>{}",
                &html[..insert_at],
                csp_meta,
                bootstrap,
                &html[insert_at..]
            )
        }
        None => format!("{csp_meta}\n{bootstrap}\n{html}"),
    }
}

/// Case-insensitive search for an HTML tag prefix.
fn find_tag_ci(html: &str, tag: &str) -> Option<usize> {
    let haystack = html.as_bytes();
    let needle = tag.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// The bootstrap script: defines `acquireVsCodeApi` with `postMessage`,
/// `setState`, and `getState`, and relays window `message` events into a
/// page-defined `__onHostMessage` hook.
fn bootstrap_script(initial_state: Option<&Value>) -> String {
    let state_json = initial_state
        .map(|state| serde_json::to_string(state).unwrap_or_else(|_| "null".to_string()))
        .unwrap_or_else(|| "null".to_string());
    // A `</` inside the embedded JSON would close the script element early.
    let state_json = state_json.replace("</", "<\\/");

    format!(
        r#"<script>
(function () {{
  var state = {state_json};
  var bridge = {{
    postMessage: function (message) {{
      window.parent.postMessage({{ source: "{post}", payload: message }}, "*");
    }},
    setState: function (next) {{
      state = next;
      window.parent.postMessage({{ source: "{state_src}", payload: next }}, "*");
      return next;
    }},
    getState: function () {{
      return state;
    }}
  }};
  window.acquireVsCodeApi = function () {{ return bridge; }};
  window.addEventListener("message", function (event) {{
    if (typeof window.__onHostMessage === "function") {{
      window.__onHostMessage(event.data);
    }}
  }});
}})();
</script>"#,
        post = MESSAGE_SOURCE_POST,
        state_src = MESSAGE_SOURCE_STATE,
    )
}
