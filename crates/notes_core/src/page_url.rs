use url::Url;

const WATCH_PATH_PREFIX: &str = "/watch";
const VIDEO_ID_PARAM: &str = "v";

/// True when `location` is a video watch page of the host site.
pub fn is_watch_page(location: &str) -> bool {
    Url::parse(location)
        .map(|url| url.path().starts_with(WATCH_PATH_PREFIX))
        .unwrap_or(false)
}

/// Video id from the `v` query parameter; `None` when absent or empty.
pub fn watch_video_id(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == VIDEO_ID_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
