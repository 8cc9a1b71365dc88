//! Extraction of one feed entry into a post record

use super::comments::collect_comments;
use super::gallery::walk_gallery;
use super::media::{media_path, save_screenshot};
use super::timestamp::parse_post_timestamp;
use super::{CrawlIssues, ExtractContext};
use crate::browser::{
    find_first_of, find_optional, BrowserError, BrowserResult, BrowserSession, Element,
    SCROLL_INTO_VIEW,
};
use crate::feed::{LinkPolicy, Media, PostRecord};
use crate::{FeedError, Result};
use tracing::{debug, warn};

/// Entry text shown in place of a removed or restricted post
pub const UNAVAILABLE_PHRASE: &str = "This content isn't available right now";

/// Entry text cue for a truncated post body
pub const SEE_MORE_CUE: &str = "See More";

/// Raw `title` of the entry's timestamp element, as rendered
pub async fn read_raw_timestamp<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    entry: Element,
) -> BrowserResult<Option<String>>
where
    S: BrowserSession + ?Sized,
{
    let Some(element) = find_first_of(session, Some(entry), ctx.kind.locators().timestamp).await?
    else {
        return Ok(None);
    };
    Ok(session
        .attribute(element, "title")
        .await?
        .filter(|title| !title.trim().is_empty()))
}

async fn read_author<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    entry: Element,
) -> BrowserResult<Option<String>>
where
    S: BrowserSession + ?Sized,
{
    let Some(element) = find_first_of(session, Some(entry), ctx.kind.locators().author).await?
    else {
        return Ok(None);
    };
    let name = session.text(element).await?;
    let name = name.trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

/// Extracts one post record from a rendered entry.
///
/// # Arguments
///
/// * `session` - Browser session with the feed loaded
/// * `ctx` - Extraction context of the current target
/// * `entry` - Handle to the entry container
/// * `issues` - Counters for recoverable problems
///
/// # Returns
///
/// The record, or [`FeedError::MalformedEntry`] when the entry has neither an
/// author nor a timestamp. Browser failures while reading the entry text,
/// author or timestamp are returned as [`FeedError::Browser`]. Failures in
/// any later field leave that field empty and count in
/// [`CrawlIssues::failed_fields`].
pub async fn extract_entry<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    entry: Element,
    issues: &mut CrawlIssues,
) -> Result<PostRecord>
where
    S: BrowserSession + ?Sized,
{
    let entry_text = session.text(entry).await?;

    let unavailable = entry_text.contains(UNAVAILABLE_PHRASE);

    let author = read_author(session, ctx, entry).await?;
    let raw_timestamp = read_raw_timestamp(session, ctx, entry).await?;
    if author.is_none() && raw_timestamp.is_none() {
        return Err(FeedError::MalformedEntry {
            reason: "entry has neither author nor timestamp".to_string(),
        });
    }
    let timestamp = raw_timestamp.as_deref().and_then(parse_post_timestamp);
    if timestamp.is_none() {
        debug!("Unparseable post timestamp {:?}", raw_timestamp);
    }

    let page = ctx.page;

    let comments = collect_comments(session, ctx, entry, &entry_text, issues).await;
    let mut comments = field_or_default(page, "comments", comments, issues);
    comments.truncate(ctx.limits.max_comments);

    if entry_text.contains(SEE_MORE_CUE) {
        let expanded = expand_text(session, ctx, entry, issues).await;
        field_or_default(page, "see more", expanded, issues);
    }

    let text = read_text(session, ctx, entry).await;
    let text = field_or_default(page, "text", text, issues);

    let link = read_link(session, ctx, entry, &entry_text).await;
    let link = field_or_default(page, "link", link, issues);

    let media = read_media(
        session,
        ctx,
        entry,
        author.as_deref(),
        timestamp.as_ref(),
        issues,
    )
    .await;
    let media = field_or_default(page, "media", media, issues);

    Ok(PostRecord {
        unavailable,
        author,
        timestamp,
        text,
        link,
        comments,
        media,
        page: ctx.page.to_string(),
    })
}

/// Keeps a field's value, or counts the failure and falls back to the
/// field's absent value
fn field_or_default<T: Default>(
    page: &str,
    field: &str,
    result: BrowserResult<T>,
    issues: &mut CrawlIssues,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("'{}': could not read {} of entry: {}", page, field, e);
            issues.failed_fields += 1;
            T::default()
        }
    }
}

/// Clicks "See More" so the full body renders
async fn expand_text<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    entry: Element,
    issues: &mut CrawlIssues,
) -> BrowserResult<()>
where
    S: BrowserSession + ?Sized,
{
    let Some(button) = find_optional(session, Some(entry), &ctx.kind.locators().see_more).await?
    else {
        return Ok(());
    };
    match session.click(button).await {
        Ok(()) => {
            ctx.pacing.after_action().await;
            Ok(())
        }
        Err(BrowserError::ClickIntercepted(_)) => {
            debug!("'See More' click intercepted, keeping truncated text");
            issues.blocked_clicks += 1;
            Ok(())
        }
        Err(e) if e.is_missing() => Ok(()),
        Err(e) => Err(e),
    }
}

async fn read_text<S>(session: &S, ctx: &ExtractContext<'_>, entry: Element) -> BrowserResult<String>
where
    S: BrowserSession + ?Sized,
{
    match find_optional(session, Some(entry), &ctx.kind.locators().post_message).await? {
        Some(message) => session.text(message).await,
        None => Ok(String::new()),
    }
}

async fn read_link<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    entry: Element,
    entry_text: &str,
) -> BrowserResult<Option<String>>
where
    S: BrowserSession + ?Sized,
{
    let locator = &ctx.kind.locators().link;

    match ctx.kind.link_policy() {
        LinkPolicy::TextCue(cue) => {
            if !entry_text.contains(cue) {
                return Ok(None);
            }
            session.run_script(SCROLL_INTO_VIEW, &[entry]).await?;
            session.hover(entry).await?;
            ctx.pacing.after_action().await;

            match find_optional(session, Some(entry), locator).await? {
                Some(link) => session.attribute(link, "href").await,
                None => Ok(None),
            }
        }
        LinkPolicy::AlwaysLookup => {
            let Some(link) = find_optional(session, Some(entry), locator).await? else {
                return Ok(None);
            };
            if !session.is_displayed(link).await? {
                return Ok(None);
            }
            // The real target is only written into href once hovered
            session.run_script(SCROLL_INTO_VIEW, &[entry]).await?;
            session.hover(link).await?;
            ctx.pacing.after_action().await;
            session.attribute(link, "href").await
        }
    }
}

async fn read_media<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    entry: Element,
    author: Option<&str>,
    timestamp: Option<&chrono::NaiveDateTime>,
    issues: &mut CrawlIssues,
) -> BrowserResult<Media>
where
    S: BrowserSession + ?Sized,
{
    let locators = ctx.kind.locators();
    let images = session
        .find_all(Some(entry), &locators.theater_images)
        .await?;
    let first_visible = match images.first() {
        Some(&first) => session.is_displayed(first).await?,
        None => false,
    };

    if first_visible && images.len() == 1 {
        let path = media_path(&ctx.folders.images, author, timestamp, None);
        return Ok(save_screenshot(session, images[0], path, issues)
            .await
            .map(Media::Inline)
            .unwrap_or_default());
    }

    if first_visible {
        let frames = walk_gallery(session, ctx, entry, issues).await?;
        return Ok(if frames.is_empty() {
            Media::None
        } else {
            Media::Gallery(frames)
        });
    }

    match find_first_of(session, Some(entry), locators.thumbnails).await? {
        Some(thumbnail) => {
            let path = media_path(&ctx.folders.thumbnails, author, timestamp, None);
            Ok(save_screenshot(session, thumbnail, path, issues)
                .await
                .map(Media::Thumbnail)
                .unwrap_or_default())
        }
        None => Ok(Media::None),
    }
}
