//! Feed model: target kinds, their markup locators, and extracted records

mod kind;
mod record;

pub use kind::{FeedKind, LightboxLocators, LinkPolicy, LocatorSet, PageTarget, LIGHTBOX};
pub use record::{Media, MediaItem, PostRecord};
