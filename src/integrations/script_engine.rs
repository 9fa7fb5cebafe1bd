// src/integrations/script_engine.rs
//
// JavaScript evaluation for scripted LibRedirect rules (boa).
//
// A fresh Context per call: rule scripts share no state and the
// Context never leaves the calling thread.

use boa_engine::{Context, Source};

use crate::error::{AppError, AppResult};

/// Evaluate `script`, then call `redirect(url, instance)`.
///
/// Returns `None` when the function yields null, undefined or an empty
/// string.
pub fn run_redirect_script(script: &str, url: &str, instance: &str) -> AppResult<Option<String>> {
    let mut context = Context::default();

    context
        .eval(Source::from_bytes(script))
        .map_err(|e| AppError::Script(format!("Rule script failed to load: {}", e)))?;

    let call = format!(
        "redirect({}, {})",
        serde_json::to_string(url)?,
        serde_json::to_string(instance)?
    );

    let value = context
        .eval(Source::from_bytes(call.as_str()))
        .map_err(|e| AppError::Script(format!("redirect() failed: {}", e)))?;

    if value.is_null_or_undefined() {
        return Ok(None);
    }

    let result = value
        .to_string(&mut context)
        .map_err(|e| AppError::Script(format!("redirect() returned a non-string: {}", e)))?
        .to_std_string_escaped();

    Ok((!result.is_empty()).then_some(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_rewrites_url() {
        let script = "function redirect(url, instance) { return url.replace(/^https?:\\/\\/[^\\/]+/, instance); }";
        let result = run_redirect_script(script, "https://www.youtube.com/watch?v=1", "https://piped.video").unwrap();
        assert_eq!(result.as_deref(), Some("https://piped.video/watch?v=1"));
    }

    #[test]
    fn test_script_arguments_are_escaped() {
        let script = "function redirect(url, instance) { return url; }";
        let tricky = "https://example.com/?q=\"');alert(1);//";
        assert_eq!(run_redirect_script(script, tricky, "x").unwrap().as_deref(), Some(tricky));
    }

    #[test]
    fn test_script_null_means_no_redirect() {
        let script = "function redirect(url, instance) { return null; }";
        assert_eq!(run_redirect_script(script, "https://a.com/", "https://b.com").unwrap(), None);
    }

    #[test]
    fn test_script_errors_are_reported() {
        assert!(matches!(
            run_redirect_script("function (", "https://a.com/", "https://b.com"),
            Err(AppError::Script(_))
        ));
        assert!(matches!(
            run_redirect_script("var x = 1;", "https://a.com/", "https://b.com"),
            Err(AppError::Script(_))
        ));
    }
}
