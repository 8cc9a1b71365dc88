//! Comment thread expansion and normalization

use super::{CrawlIssues, ExtractContext};
use crate::browser::{
    find_optional, BrowserError, BrowserResult, BrowserSession, Element, SCROLL_INTO_VIEW,
    SCROLL_TO_TOP,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Entry text cue: the post has at least one comment
pub const REPLY_CUE: &str = "Reply";

/// Entry text cue: part of the thread is still collapsed
pub const MORE_COMMENTS_CUE: &str = "more comments";

const HIDE_OR_REPORT: &str = "Hide or report this";

fn ui_tail() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\nLike\n · Reply ·.*$").expect("valid regex"))
}

fn reaction_count() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\d+\s*$").expect("valid regex"))
}

fn normalize_step(raw: &str) -> String {
    let text = ui_tail().replace(raw, "");
    let text = reaction_count().replace(&text, "");
    let text = text.trim();
    let text = text.strip_suffix(HIDE_OR_REPORT).unwrap_or(text);
    text.trim().to_string()
}

/// Strips the UI furniture the feed renders around a comment.
///
/// Removes the trailing "Like · Reply · <age>" block, a trailing reaction
/// count and the "Hide or report this" control, then trims whitespace. The
/// steps repeat until nothing changes, so the result is a fixed point.
pub fn normalize_comment(raw: &str) -> String {
    let mut current = normalize_step(raw);
    loop {
        let next = normalize_step(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Expands and reads the comment thread of `entry`.
///
/// Returns an empty list when the entry has no comments. Comments are
/// returned in document order, top-level and first-level replies interleaved
/// as rendered.
pub async fn collect_comments<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    entry: Element,
    entry_text: &str,
    issues: &mut CrawlIssues,
) -> BrowserResult<Vec<String>>
where
    S: BrowserSession + ?Sized,
{
    if !entry_text.contains(REPLY_CUE) {
        return Ok(Vec::new());
    }

    expand_thread(session, ctx, entry, issues).await?;

    let nodes = session
        .find_all(Some(entry), &ctx.kind.locators().comments)
        .await?;
    let mut comments = Vec::with_capacity(nodes.len());
    for node in nodes {
        comments.push(normalize_comment(&session.text(node).await?));
    }
    Ok(comments)
}

async fn expand_thread<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    entry: Element,
    issues: &mut CrawlIssues,
) -> BrowserResult<()>
where
    S: BrowserSession + ?Sized,
{
    let locators = ctx.kind.locators();

    session.run_script(SCROLL_INTO_VIEW, &[entry]).await?;
    session.hover(entry).await?;
    ctx.pacing.after_action().await;

    let mut expansions = 0;
    while session.text(entry).await?.contains(MORE_COMMENTS_CUE) {
        if expansions >= ctx.limits.max_comment_expansions {
            warn!(
                "Comment thread still collapsed after {} expansions, reading what is loaded",
                expansions
            );
            break;
        }

        session.run_script(SCROLL_TO_TOP, &[]).await?;
        let Some(more) = find_optional(session, Some(entry), &locators.more_comments).await?
        else {
            break;
        };
        match session.click(more).await {
            Ok(()) => {}
            Err(BrowserError::ClickIntercepted(_)) => {
                debug!("'more comments' click intercepted");
                issues.blocked_clicks += 1;
                break;
            }
            Err(e) => return Err(e),
        }
        ctx.pacing.after_scroll().await;
        expansions += 1;
    }

    for button in session
        .find_all(Some(entry), &locators.more_replies)
        .await?
    {
        session.run_script(SCROLL_TO_TOP, &[]).await?;
        match session.click(button).await {
            Ok(()) => ctx.pacing.after_action().await,
            Err(BrowserError::ClickIntercepted(_)) => {
                debug!("Reply pager click intercepted");
                issues.blocked_clicks += 1;
            }
            Err(e) if e.is_missing() => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
