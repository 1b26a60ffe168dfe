//! Render Supervisor
//!
//! Mounts an executed component inside a failure boundary and converts
//! the outcome into host types. A throw anywhere in construction,
//! render, or queued lifecycle callbacks is contained by the boundary
//! and surfaced as a render failure carrying the component stack; it
//! never crosses the script boundary as an engine panic.

use tracing::debug;

use jsx_preview_types::{PreviewError, RenderedPreview};

use crate::sandbox::{js_string, ComponentHandle, ScriptHost};

const RENDER_HARNESS: &str = include_str!("runtime/render_harness.js");

/// Render the component under the handle to markup, capturing console
/// output produced along the way.
pub fn render_supervised(
    host: &mut ScriptHost,
    handle: &ComponentHandle,
) -> Result<RenderedPreview, PreviewError> {
    let invocation = format!("{}({})", RENDER_HARNESS, js_string(handle.slot));
    let report = host
        .eval_json_expr(&invocation)
        .map_err(|message| PreviewError::RenderFailed {
            message: format!("render harness failed: {}", message),
            component_stack: None,
        })?;

    let console = report
        .get("console")
        .and_then(|v| v.as_array())
        .map(|lines| {
            lines
                .iter()
                .filter_map(|l| l.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    if report.get("ok").and_then(|v| v.as_bool()) == Some(true) {
        let markup = report
            .get("markup")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        debug!(markup_len = markup.len(), "render settled");
        return Ok(RenderedPreview { markup, console });
    }

    let message = report
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or("render failed")
        .to_string();
    let component_stack = report
        .get("componentStack")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from);
    Err(PreviewError::RenderFailed {
        message,
        component_stack,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::HostRuntime;

    fn executed(code: &str, entry: &str) -> (ScriptHost, ComponentHandle) {
        let runtime = HostRuntime::default();
        let mut host = ScriptHost::new(&runtime).unwrap();
        let scan = crate::scanner::scan("");
        let bindings = crate::sandbox::resolve_bindings(&mut host, &runtime, &scan, &[]);
        let handle = host.execute(code, entry, &bindings).unwrap();
        (host, handle)
    }

    #[test]
    fn function_component_renders_to_markup() {
        let (mut host, handle) = executed(
            "function Widget() { return React.createElement('div', { className: 'card' }, 'hello'); }",
            "Widget",
        );
        let preview = render_supervised(&mut host, &handle).unwrap();
        assert_eq!(preview.markup, "<div class=\"card\">hello</div>");
        assert!(preview.console.is_empty());
    }

    #[test]
    fn console_output_is_captured() {
        let (mut host, handle) = executed(
            "function Widget() { console.log('mounting', 42); return React.createElement('p', null, 'ok'); }",
            "Widget",
        );
        let preview = render_supervised(&mut host, &handle).unwrap();
        assert_eq!(preview.console, vec!["mounting 42".to_string()]);
    }

    #[test]
    fn nested_components_render_depth_first() {
        let (mut host, handle) = executed(
            r#"
            function Inner(props) { return React.createElement('span', null, props.label); }
            function Widget() {
                return React.createElement('div', null,
                    React.createElement(Inner, { label: 'a' }),
                    React.createElement(Inner, { label: 'b' }));
            }
            "#,
            "Widget",
        );
        let preview = render_supervised(&mut host, &handle).unwrap();
        assert_eq!(preview.markup, "<div><span>a</span><span>b</span></div>");
    }

    #[test]
    fn class_component_renders_and_mounts() {
        let (mut host, handle) = executed(
            r#"
            class Panel {
                constructor(props) { this.props = props; }
                componentDidMount() { console.log('mounted'); }
                render() { return React.createElement('section', null, 'panel'); }
            }
            "#,
            "Panel",
        );
        let preview = render_supervised(&mut host, &handle).unwrap();
        assert_eq!(preview.markup, "<section>panel</section>");
        assert_eq!(preview.console, vec!["mounted".to_string()]);
    }

    #[test]
    fn effects_run_after_render_inside_the_boundary() {
        let (mut host, handle) = executed(
            r#"
            function Widget() {
                useEffect(function () {
                    console.log('effect');
                    return function () { console.log('cleanup'); };
                });
                return React.createElement('div', null, 'x');
            }
            "#,
            "Widget",
        );
        let preview = render_supervised(&mut host, &handle).unwrap();
        assert_eq!(
            preview.console,
            vec!["effect".to_string(), "cleanup".to_string()]
        );
    }

    #[test]
    fn throw_during_render_reports_component_stack() {
        let (mut host, handle) = executed(
            r#"
            function Broken() { throw new Error('render blew up'); }
            function Widget() { return React.createElement('div', null, React.createElement(Broken, null)); }
            "#,
            "Widget",
        );
        let err = render_supervised(&mut host, &handle).unwrap_err();
        match err {
            PreviewError::RenderFailed {
                message,
                component_stack,
            } => {
                assert!(message.contains("render blew up"));
                let stack = component_stack.unwrap();
                assert!(stack.contains("in Broken"));
                assert!(stack.contains("in Widget"));
            }
            other => panic!("expected RenderFailed, got {:?}", other),
        }
    }

    #[test]
    fn non_function_entry_is_a_render_failure() {
        let (mut host, handle) = executed("var Widget = 42;", "Widget");
        let err = render_supervised(&mut host, &handle).unwrap_err();
        assert!(matches!(err, PreviewError::RenderFailed { .. }));
    }

    #[test]
    fn fragment_and_boolean_children_are_transparent() {
        let (mut host, handle) = executed(
            r#"
            function Widget() {
                return React.createElement(React.Fragment, null,
                    false,
                    React.createElement('em', null, 'only'));
            }
            "#,
            "Widget",
        );
        let preview = render_supervised(&mut host, &handle).unwrap();
        assert_eq!(preview.markup, "<em>only</em>");
    }
}
