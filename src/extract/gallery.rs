//! Lightbox walk over a multi-image post
//!
//! The lightbox does not stop at the last image of a post: "Next" carries on
//! into images of neighbouring posts. The walk therefore stops at whichever
//! comes first of the expected image count, the image cap, a frame dated on a
//! different day than the first one, or a missing "Next" control.

use super::media::{media_path, save_screenshot};
use super::timestamp::parse_lightbox_timestamp;
use super::{CrawlIssues, ExtractContext};
use crate::browser::{find_optional, BrowserError, BrowserResult, BrowserSession, Element, Key};
use crate::feed::LIGHTBOX;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Number of images the badge leaves out: it reads "+N" over the fourth
/// thumbnail, with three thumbnails shown before it
const BADGE_OFFSET: usize = 3;

/// Parses the "+N" badge text into a total image count
pub fn badge_image_count(badge: &str) -> Option<usize> {
    badge
        .trim()
        .trim_start_matches('+')
        .trim()
        .parse::<usize>()
        .ok()
        .map(|n| n + BADGE_OFFSET)
}

/// Screenshots the images of a multi-image post through the lightbox.
///
/// # Arguments
///
/// * `session` - Browser session with the feed loaded
/// * `ctx` - Extraction context of the current target
/// * `entry` - The post whose images are walked
/// * `issues` - Counters for recoverable problems
///
/// # Returns
///
/// Saved image paths in visitation order. An empty list when the lightbox
/// never opened. The lightbox is closed again on every path out.
pub async fn walk_gallery<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    entry: Element,
    issues: &mut CrawlIssues,
) -> BrowserResult<Vec<PathBuf>>
where
    S: BrowserSession + ?Sized,
{
    let expected = expected_image_count(session, ctx, entry).await?;
    let limit = expected.min(ctx.limits.max_images);
    debug!("Gallery expects {} images, walking up to {}", expected, limit);
    if limit == 0 {
        return Ok(Vec::new());
    }

    let walked = match open_lightbox(session, ctx, entry, issues).await {
        Ok(true) => walk_frames(session, ctx, limit, issues).await,
        Ok(false) => Ok(Vec::new()),
        Err(e) => Err(e),
    };

    close_lightbox(session, ctx).await;
    walked
}

async fn expected_image_count<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    entry: Element,
) -> BrowserResult<usize>
where
    S: BrowserSession + ?Sized,
{
    let locators = ctx.kind.locators();

    if let Some(badge) = find_optional(session, Some(entry), &locators.more_images_badge).await? {
        if let Some(count) = badge_image_count(&session.text(badge).await?) {
            return Ok(count);
        }
    }

    let mut visible = 0;
    for image in session
        .find_all(Some(entry), &locators.theater_images)
        .await?
    {
        if session.is_displayed(image).await? {
            visible += 1;
        }
    }
    Ok(visible)
}

/// Clicks the first clickable theater image and waits for the lightbox.
/// Returns `false` when it never opened.
async fn open_lightbox<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    entry: Element,
    issues: &mut CrawlIssues,
) -> BrowserResult<bool>
where
    S: BrowserSession + ?Sized,
{
    let images = session
        .find_all(Some(entry), &ctx.kind.locators().theater_images)
        .await?;

    let mut clicked = false;
    for image in images {
        match session.click(image).await {
            Ok(()) => {
                clicked = true;
                break;
            }
            Err(BrowserError::ClickIntercepted(_)) => {
                debug!("Theater image click intercepted, trying the next one");
                issues.blocked_clicks += 1;
            }
            Err(e) => return Err(e),
        }
    }
    if !clicked {
        return Ok(false);
    }

    ctx.pacing.after_action().await;
    match session
        .wait_until_present(&LIGHTBOX.timestamp, ctx.pacing.wait_timeout)
        .await
    {
        Ok(_) => Ok(true),
        Err(BrowserError::Timeout { .. }) => {
            warn!("Lightbox did not open for gallery in '{}'", ctx.page);
            issues.gallery_open_timeouts += 1;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

async fn walk_frames<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    limit: usize,
    issues: &mut CrawlIssues,
) -> BrowserResult<Vec<PathBuf>>
where
    S: BrowserSession + ?Sized,
{
    let mut files = Vec::new();
    let mut post_date: Option<NaiveDate> = None;

    for frame in 0..limit {
        let Some(taken_at) = frame_timestamp(session).await? else {
            debug!("Lightbox frame {} has no readable date, stopping", frame);
            break;
        };
        match post_date {
            None => post_date = Some(taken_at.date()),
            Some(date) if date != taken_at.date() => {
                debug!("Lightbox frame {} belongs to another post, stopping", frame);
                break;
            }
            Some(_) => {}
        }

        let Some(image) = find_optional(session, None, &LIGHTBOX.image).await? else {
            break;
        };
        let author = frame_author(session).await?;
        let path = media_path(
            &ctx.folders.images,
            author.as_deref(),
            Some(&taken_at),
            Some(frame),
        );
        if let Some(saved) = save_screenshot(session, image, path, issues).await {
            files.push(saved);
        }

        if frame + 1 == limit || !advance(session, ctx, image, issues).await? {
            break;
        }
    }

    Ok(files)
}

/// Moves the lightbox to the next frame. Returns `false` when there is none.
async fn advance<S>(
    session: &S,
    ctx: &ExtractContext<'_>,
    image: Element,
    issues: &mut CrawlIssues,
) -> BrowserResult<bool>
where
    S: BrowserSession + ?Sized,
{
    // The controls only render while the pointer is over the image
    session.hover(image).await?;
    ctx.pacing.after_action().await;

    let Some(next) = find_optional(session, None, &LIGHTBOX.next).await? else {
        return Ok(false);
    };
    if !session.is_displayed(next).await? {
        return Ok(false);
    }

    session.hover(next).await?;
    match session.click(next).await {
        Ok(()) => {
            ctx.pacing.after_action().await;
            Ok(true)
        }
        Err(BrowserError::ClickIntercepted(_)) => {
            issues.blocked_clicks += 1;
            Ok(false)
        }
        Err(e) if e.is_missing() => Ok(false),
        Err(e) => Err(e),
    }
}

async fn frame_timestamp<S>(session: &S) -> BrowserResult<Option<NaiveDateTime>>
where
    S: BrowserSession + ?Sized,
{
    let Some(abbr) = find_optional(session, None, &LIGHTBOX.timestamp_title).await? else {
        return Ok(None);
    };
    Ok(session
        .attribute(abbr, "title")
        .await?
        .as_deref()
        .and_then(parse_lightbox_timestamp))
}

async fn frame_author<S>(session: &S) -> BrowserResult<Option<String>>
where
    S: BrowserSession + ?Sized,
{
    let Some(link) = find_optional(session, None, &LIGHTBOX.author).await? else {
        return Ok(None);
    };
    let name = match session.attribute(link, "title").await? {
        Some(title) if !title.trim().is_empty() => title,
        _ => session.text(link).await?,
    };
    let name = name.trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

async fn close_lightbox<S>(session: &S, ctx: &ExtractContext<'_>)
where
    S: BrowserSession + ?Sized,
{
    if let Err(e) = session.press_key(Key::Escape).await {
        warn!("Failed to close lightbox: {}", e);
    }
    ctx.pacing.after_action().await;
}
