//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn title() -> String {
        "Letters".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn assets() -> PathBuf {
        "assets".into()
    }

    pub fn layout() -> Option<PathBuf> {
        None
    }

    pub fn copy() -> Vec<PathBuf> {
        vec!["images".into()]
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        4567
    }

    pub fn workers() -> usize {
        4
    }

    pub mod cache {
        pub fn max_age() -> u32 {
            300
        }
    }
}

// ============================================================================
// [[pages]] Defaults
// ============================================================================

/// The lettersrb.com route table.
pub fn pages() -> Vec<super::PageConfig> {
    [
        (
            "/",
            "index",
            "The tiny debugging library for Ruby",
            "Letters brings Ruby debugging into the 21st century. It leverages print, the debugger, control transfer, even computer beeps to let you see into your code's state.",
        ),
        (
            "/api",
            "api",
            "The API",
            "Letters lets you debug using these methods -- starting with 'A' and ending with 'Z'",
        ),
        (
            "/ideas",
            "ideas",
            "Ideas",
            "Have an idea for a new letter? Tell us what Letters should do next.",
        ),
        (
            "/resources",
            "resources",
            "Resources",
            "Talks, articles and source code for learning more about Letters and Ruby debugging.",
        ),
    ]
    .into_iter()
    .map(|(route, content, title, description)| super::PageConfig {
        route: route.into(),
        content: content.into(),
        title: title.into(),
        description: description.into(),
    })
    .collect()
}
