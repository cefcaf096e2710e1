//! Token Rewriter Module
//!
//! Cached pages embed the security token of the visitor they were rendered
//! for. Before a page is served again, that token is swapped for a fresh one.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use tracing::debug;

static STATIC_TOKEN_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"static_token ?= ?'([a-f0-9]{32})'").expect("valid token pattern"));

static FORM_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"name="token" value="[a-f0-9]{32}"#).expect("valid form token pattern")
});

static QUERY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"token=[a-f0-9]{32}""#).expect("valid query token pattern"));

static STATIC_TOKEN_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"static_token ?= ?'[a-f0-9]{32}").expect("valid token pattern"));

// == Token Generator ==
/// Produces the token to embed into a page being served.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Whether served pages get their security token refreshed.
#[derive(Clone, Copy)]
pub enum TokenProtection<'a> {
    Disabled,
    Enabled(&'a dyn TokenGenerator),
}

// == Rewrite ==
/// Replaces the embedded token in `content` with `new_token`.
///
/// When a `static_token = '<hex>'` assignment is present, its value is the
/// old token and every literal occurrence of it is replaced. Otherwise the
/// form field, query parameter and assignment prefix patterns are rewritten
/// independently.
pub fn rewrite_token(content: &str, new_token: &str) -> String {
    if let Some(old_token) = STATIC_TOKEN_VALUE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    {
        debug!("Rewriting static page token");
        return content.replace(old_token, new_token);
    }

    debug!("No static token found, rewriting token patterns");
    let content = FORM_TOKEN.replace_all(
        content,
        NoExpand(&format!(r#"name="token" value="{}"#, new_token)),
    );
    let content = QUERY_TOKEN.replace_all(&content, NoExpand(&format!(r#"token={}""#, new_token)));
    let content = STATIC_TOKEN_PREFIX.replace_all(
        &content,
        NoExpand(&format!("static_token = '{}", new_token)),
    );
    content.into_owned()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const OLD: &str = "deadbeefdeadbeefdeadbeefdeadbeef";
    const NEW: &str = "cafebabecafebabecafebabecafebabe";

    #[test]
    fn test_static_token_replaces_every_occurrence() {
        let page = format!(
            "<script>var static_token = '{old}';</script>\
             <form><input name=\"token\" value=\"{old}\"></form>\
             <a href=\"/cart?token={old}\">cart</a><!-- {old} -->",
            old = OLD
        );

        let rewritten = rewrite_token(&page, NEW);

        assert_eq!(rewritten, page.replace(OLD, NEW));
        assert_eq!(rewritten.matches(NEW).count(), 4);
        assert!(!rewritten.contains(OLD));
    }

    #[test]
    fn test_static_token_without_spaces() {
        let page = format!("static_token='{}'", OLD);
        assert_eq!(rewrite_token(&page, NEW), format!("static_token='{}'", NEW));
    }

    #[test]
    fn test_fallback_patterns() {
        let form_token = "0123456789abcdef0123456789abcdef";
        let query_token = "ffffffffffffffffffffffffffffffff";
        let page = format!(
            "<input name=\"token\" value=\"{form}\"><a href=\"?token={query}\">x</a>",
            form = form_token,
            query = query_token
        );

        let rewritten = rewrite_token(&page, NEW);

        assert_eq!(
            rewritten,
            format!(
                "<input name=\"token\" value=\"{new}\"><a href=\"?token={new}\">x</a>",
                new = NEW
            )
        );
    }

    #[test]
    fn test_fallback_static_token_prefix() {
        // 33 hex characters: the full assignment pattern does not match
        let page = format!("static_token = '{}a'", OLD);
        assert_eq!(
            rewrite_token(&page, NEW),
            format!("static_token = '{}a'", NEW)
        );
    }

    #[test]
    fn test_page_without_token_is_untouched() {
        let page = "<p>token=short\" and static_token = 'nothex'</p>";
        assert_eq!(rewrite_token(page, NEW), page);
    }

    #[test]
    fn test_dollar_in_new_token_is_literal() {
        let page = format!("<input name=\"token\" value=\"{}\">", OLD);
        assert_eq!(
            rewrite_token(&page, "$1"),
            "<input name=\"token\" value=\"$1\">"
        );
    }
}
