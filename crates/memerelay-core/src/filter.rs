use crate::item::PostRecord;

/// Caption markers of promotional or otherwise unwanted posts, lowercase.
pub const CAPTION_DENY_LIST: &[&str] = &["bet9ja", "promoted", "live", "download"];

/// Decides whether a scraped post may enter the queue.
///
/// A post is rejected when its caption contains a deny-listed marker (case
/// insensitive), when it is a video or reel, or when it carries no image URL.
#[must_use]
pub fn admit(post: &PostRecord) -> bool {
    if post.image_url().is_none() || post.is_video() {
        return false;
    }
    !is_ad(post.caption_text())
}

fn is_ad(caption: &str) -> bool {
    let caption = caption.to_lowercase();
    CAPTION_DENY_LIST
        .iter()
        .any(|marker| caption.contains(marker))
}
