/// Localization markers appended to titles by catalog sites.
const TITLE_MARKERS: [&str; 4] = ["(ITA)", "(Dub)", "(Dub ID)", "(Dublado)"];

/// Normalize a display title before catalog id lookup.
///
/// Removes the dub/localization markers and quote characters, then trims
/// surrounding whitespace.
pub fn normalize_title(title: &str) -> String {
    let mut normalized = title.to_owned();
    for marker in TITLE_MARKERS {
        normalized = normalized.replace(marker, "");
    }
    normalized.retain(|c| c != '"');
    normalized.trim().to_owned()
}
