use m3u8_rs::{MasterPlaylist, Playlist};
use tracing::{debug, trace};
use url::Url;

use crate::label::QualityLabel;

/// A selectable variant of one media item.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityVariant {
    pub label: QualityLabel,
    /// URI exactly as written in the manifest
    pub uri: String,
    /// URI resolved against the manifest URL
    pub url: Url,
}

/// Ordered set of selectable quality variants, highest quality first.
///
/// Built once per manifest and read-only afterwards. An empty ladder means the
/// source has a single fixed quality and should be played from the manifest
/// URL directly.
///
/// Variants sharing a label are all kept, in manifest order. Lookups by label
/// return the first-seen entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityLadder {
    variants: Vec<QualityVariant>,
}

impl QualityLadder {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse manifest text into a ladder.
    ///
    /// Never fails: malformed manifests and media (non-master) playlists
    /// produce an empty ladder.
    pub fn from_manifest(text: &str, manifest_url: &Url) -> Self {
        match m3u8_rs::parse_playlist_res(text.as_bytes()) {
            Ok(Playlist::MasterPlaylist(pl)) => Self::from_master(&pl, manifest_url),
            Ok(Playlist::MediaPlaylist(_)) => {
                debug!("{manifest_url} is a media playlist, no quality ladder");
                Self::empty()
            }
            Err(e) => {
                debug!("Failed to parse manifest {manifest_url}: {e}");
                Self::empty()
            }
        }
    }

    pub fn from_master(playlist: &MasterPlaylist, manifest_url: &Url) -> Self {
        let mut variants = Vec::with_capacity(playlist.variants.len());

        for variant in playlist.variants.iter().filter(|v| !v.is_i_frame) {
            let Some(resolution) = variant.resolution else {
                trace!("Variant {} has no resolution hint, skipping", variant.uri);
                continue;
            };
            let Some(label) = QualityLabel::from_height(resolution.height) else {
                trace!(
                    "Variant {} with height {} matches no canonical label",
                    variant.uri, resolution.height
                );
                continue;
            };
            let url = match manifest_url.join(&variant.uri) {
                Ok(url) => url,
                Err(e) => {
                    debug!("Could not join {manifest_url} with {}: {e}", variant.uri);
                    continue;
                }
            };
            variants.push(QualityVariant {
                label,
                uri: variant.uri.clone(),
                url,
            });
        }

        // stable: duplicates keep manifest order
        variants.sort_by_key(|v| v.label.rank());

        debug!(
            "Built quality ladder with {} variants from {} entries",
            variants.len(),
            playlist.variants.len()
        );
        Self { variants }
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn get(&self, index: usize) -> Option<&QualityVariant> {
        self.variants.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QualityVariant> {
        self.variants.iter()
    }

    pub fn labels(&self) -> Vec<QualityLabel> {
        self.variants.iter().map(|v| v.label).collect()
    }

    /// Index of the first variant whose label matches `label`, ignoring case.
    pub fn position_of(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        self.variants
            .iter()
            .position(|v| v.label.as_str().eq_ignore_ascii_case(label))
    }

    /// Pick the variant to start playback with.
    ///
    /// Tries `preferred` first, then the canonical labels from highest to
    /// lowest; when none of them exist the last entry is chosen. Returns
    /// `None` only for an empty ladder.
    pub fn select(&self, preferred: Option<&str>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }

        preferred
            .into_iter()
            .chain(QualityLabel::CANONICAL.iter().map(|l| l.as_str()))
            .find_map(|label| self.position_of(label))
            .or(Some(self.variants.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_url() -> Url {
        Url::parse("https://cdn.example.com/show/ep1/master.m3u8").unwrap()
    }

    const MIXED_MASTER: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-STREAM-INF:BANDWIDTH=1400000,RESOLUTION=1280x720
720/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080
1080/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=300000,RESOLUTION=426x240
240/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
https://other.example.com/360/index.m3u8
";

    #[test]
    fn test_ladder_is_in_canonical_order() {
        let ladder = QualityLadder::from_manifest(MIXED_MASTER, &manifest_url());

        assert_eq!(
            ladder.labels(),
            vec![QualityLabel::P1080, QualityLabel::P720, QualityLabel::P360]
        );
    }

    #[test]
    fn test_variant_urls_are_resolved() {
        let ladder = QualityLadder::from_manifest(MIXED_MASTER, &manifest_url());

        assert_eq!(
            ladder.get(0).unwrap().url.as_str(),
            "https://cdn.example.com/show/ep1/1080/index.m3u8"
        );
        assert_eq!(ladder.get(0).unwrap().uri, "1080/index.m3u8");
        assert_eq!(
            ladder.get(2).unwrap().url.as_str(),
            "https://other.example.com/360/index.m3u8"
        );
    }

    #[test]
    fn test_unrecognized_only_manifest_is_empty() {
        let manifest = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=300000,RESOLUTION=426x240
240/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=9000000,RESOLUTION=2560x1440
1440/index.m3u8
";
        let ladder = QualityLadder::from_manifest(manifest, &manifest_url());
        assert!(ladder.is_empty());
        assert_eq!(ladder.select(Some("720p")), None);
    }

    #[test]
    fn test_media_playlist_is_empty() {
        let manifest = "#EXTM3U
#EXT-X-TARGETDURATION:10
#EXTINF:9.009,
segment0.ts
#EXT-X-ENDLIST
";
        assert!(QualityLadder::from_manifest(manifest, &manifest_url()).is_empty());
    }

    #[test]
    fn test_garbage_is_empty() {
        let ladder = QualityLadder::from_manifest("<html>not found</html>", &manifest_url());
        assert!(ladder.is_empty());
    }

    #[test]
    fn test_variant_without_resolution_is_skipped() {
        let manifest = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=1400000
audio/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=854x480
480/index.m3u8
";
        let ladder = QualityLadder::from_manifest(manifest, &manifest_url());
        assert_eq!(ladder.labels(), vec![QualityLabel::P480]);
    }

    #[test]
    fn test_duplicate_labels_are_kept_first_seen_selected() {
        let manifest = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720
a/720.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=1500000,RESOLUTION=1280x720
b/720.m3u8
";
        let ladder = QualityLadder::from_manifest(manifest, &manifest_url());
        assert_eq!(ladder.len(), 2);

        let selected = ladder.select(None).unwrap();
        assert_eq!(ladder.get(selected).unwrap().uri, "a/720.m3u8");
    }

    #[test]
    fn test_select_prefers_highest_without_preference() {
        let ladder = QualityLadder::from_manifest(MIXED_MASTER, &manifest_url());
        let index = ladder.select(None).unwrap();
        assert_eq!(ladder.get(index).unwrap().label, QualityLabel::P1080);
    }

    #[test]
    fn test_select_honours_saved_preference() {
        let ladder = QualityLadder::from_manifest(MIXED_MASTER, &manifest_url());
        let index = ladder.select(Some("720P")).unwrap();
        assert_eq!(ladder.get(index).unwrap().label, QualityLabel::P720);
    }

    #[test]
    fn test_select_ignores_missing_preference() {
        let ladder = QualityLadder::from_manifest(MIXED_MASTER, &manifest_url());
        let index = ladder.select(Some("480p")).unwrap();
        assert_eq!(ladder.get(index).unwrap().label, QualityLabel::P1080);
    }
}
