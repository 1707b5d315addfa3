// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Static Analyzers
 * Pattern-based source inspection independent of the crawler
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::Finding;
use std::collections::HashMap;

pub mod context;
pub mod deps;
pub mod markup;
pub mod script;

pub use context::{CodeContext, ContextClassifier};
pub use deps::DependencyAnalyzer;
pub use markup::MarkupAnalyzer;
pub use script::ScriptAnalyzer;

/// Response metadata available when the analyzed source came from a live
/// fetch; lets analyzers consider headers such as Content-Security-Policy.
#[derive(Debug, Clone, Default)]
pub struct ResponseContext {
    /// Header names lowercased
    pub headers: HashMap<String, String>,
}

impl ResponseContext {
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        Self {
            headers: headers.clone(),
        }
    }

    pub fn csp(&self) -> Option<&str> {
        self.headers
            .get("content-security-policy")
            .map(|s| s.as_str())
    }
}

/// Uniform contract: raw source text in, findings out. Malformed input
/// yields an empty result, never an error.
pub trait StaticAnalyzer {
    fn name(&self) -> &'static str;

    fn analyze(
        &self,
        source: &str,
        locator: &str,
        ctx: Option<&ResponseContext>,
    ) -> Vec<Finding>;
}
