// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Code Context Classifier
 * Framework and minification signatures used to adjust finding confidence
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::ResponseContext;
use once_cell::sync::Lazy;
use regex::Regex;

/// Context derived for one analyzed script. Not persisted; consumed at
/// finding-creation time to adjust confidence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeContext {
    pub is_framework: bool,
    pub framework_name: Option<String>,
    pub is_minified: bool,
    /// Response carried a CSP that would block unsafe-eval/unsafe-inline
    pub has_csp: bool,
}

static FRAMEWORK_SIGNATURES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "Angular",
            Regex::new(r"@(Component|NgModule|Injectable|Directive)\s*\(").unwrap(),
        ),
        (
            "React",
            Regex::new(r#"React\.createElement|_jsxs?\(|dangerouslySetInnerHTML|from\s+["']react["']"#)
                .unwrap(),
        ),
        (
            "Vue",
            Regex::new(r#"new Vue\s*\(|Vue\.component\s*\(|createApp\s*\(|v-(if|for|model|html|bind)="#)
                .unwrap(),
        ),
        (
            "Svelte",
            Regex::new(r"SvelteComponent|svelte/internal").unwrap(),
        ),
    ]
});

static BUNDLER_BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"webpackJsonp|__webpack_require__|webpack_modules|parcelRequire|System\.register\(")
        .unwrap()
});

static MODULE_WRAPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"typeof exports\s*==+\s*["']object["']\s*&&\s*typeof module"#).unwrap()
});

// Runs of short comma-separated identifiers typical of minifier output,
// e.g. function(e,t,n,r,o)
static DENSE_IDENTIFIERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"function\s*\(\s*[a-z]\s*(?:,\s*[a-z]\s*){3,}\)").unwrap());

const MINIFIED_LINE_LENGTH: usize = 500;

pub struct ContextClassifier;

impl ContextClassifier {
    /// Classify one script source, considering the response headers when
    /// the script came from a live fetch
    pub fn classify(source: &str, ctx: Option<&ResponseContext>) -> CodeContext {
        let framework_name = FRAMEWORK_SIGNATURES
            .iter()
            .find(|(_, pattern)| pattern.is_match(source))
            .map(|(name, _)| name.to_string());

        let is_minified = source.lines().any(|l| l.len() > MINIFIED_LINE_LENGTH)
            || BUNDLER_BOILERPLATE.is_match(source)
            || MODULE_WRAPPER.is_match(source)
            || DENSE_IDENTIFIERS.is_match(source);

        let has_csp = ctx
            .and_then(|c| c.csp())
            .map(csp_blocks_unsafe_eval)
            .unwrap_or(false);

        CodeContext {
            is_framework: framework_name.is_some(),
            framework_name,
            is_minified,
            has_csp,
        }
    }
}

/// A CSP restricts eval only when a script-src (or fallback default-src)
/// is declared without the unsafe-eval and unsafe-inline keywords
fn csp_blocks_unsafe_eval(csp: &str) -> bool {
    let lower = csp.to_lowercase();
    let has_script_directive = lower.contains("script-src") || lower.contains("default-src");
    has_script_directive && !lower.contains("'unsafe-eval'") && !lower.contains("'unsafe-inline'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn csp_context(value: &str) -> ResponseContext {
        let mut headers = HashMap::new();
        headers.insert("content-security-policy".to_string(), value.to_string());
        ResponseContext { headers }
    }

    #[test]
    fn test_plain_script_has_no_context() {
        let ctx = ContextClassifier::classify("function add(a, b) { return a + b; }", None);
        assert!(!ctx.is_framework);
        assert!(!ctx.is_minified);
        assert!(!ctx.has_csp);
    }

    #[test]
    fn test_detects_angular_decorator() {
        let source = "@Component({ selector: 'app-root' })\nexport class AppComponent {}";
        let ctx = ContextClassifier::classify(source, None);
        assert!(ctx.is_framework);
        assert_eq!(ctx.framework_name.as_deref(), Some("Angular"));
    }

    #[test]
    fn test_detects_react_create_element() {
        let source = "return React.createElement('div', null, children);";
        let ctx = ContextClassifier::classify(source, None);
        assert_eq!(ctx.framework_name.as_deref(), Some("React"));
    }

    #[test]
    fn test_detects_vue_directive() {
        let source = "<div v-html=\"content\"></div>";
        let ctx = ContextClassifier::classify(source, None);
        assert_eq!(ctx.framework_name.as_deref(), Some("Vue"));
    }

    #[test]
    fn test_detects_minified_long_line() {
        let source = "a".repeat(600);
        assert!(ContextClassifier::classify(&source, None).is_minified);
    }

    #[test]
    fn test_detects_webpack_bootstrap() {
        let source = "(function(){var n={};function r(e){__webpack_require__(e)}})();";
        assert!(ContextClassifier::classify(source, None).is_minified);
    }

    #[test]
    fn test_detects_dense_identifier_run() {
        let source = "!function(e,t,n,r,o){o(e,t)}();";
        assert!(ContextClassifier::classify(source, None).is_minified);
    }

    #[test]
    fn test_csp_blocking_eval() {
        let ctx = csp_context("default-src 'self'; script-src 'self'");
        let code = ContextClassifier::classify("eval(x)", Some(&ctx));
        assert!(code.has_csp);
    }

    #[test]
    fn test_csp_with_unsafe_eval_does_not_block() {
        let ctx = csp_context("script-src 'self' 'unsafe-eval'");
        let code = ContextClassifier::classify("eval(x)", Some(&ctx));
        assert!(!code.has_csp);
    }
}
