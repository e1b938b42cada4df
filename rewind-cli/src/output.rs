use anyhow::Result;
use hls::QualityLadder;
use playback_engine::format::{format_remaining, format_time};
use playback_engine::{ProgressRecord, SessionView};
use serde_json::{Value, json};
use skip_times::SkipInterval;

use crate::cli::OutputFormat;

pub struct OutputManager {
    format: OutputFormat,
}

impl OutputManager {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn emit(&self, pretty: String, value: Value) -> Result<String> {
        match self.format {
            OutputFormat::Pretty => Ok(pretty),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&value)?),
        }
    }

    pub fn format_ladder(&self, ladder: &QualityLadder, selected: Option<usize>) -> Result<String> {
        let mut pretty = String::new();
        if ladder.is_empty() {
            pretty.push_str("No recognized variants; the manifest URL would be played directly\n");
        }
        for (index, variant) in ladder.iter().enumerate() {
            let marker = if Some(index) == selected { "*" } else { " " };
            pretty.push_str(&format!(
                "{} {:>5}  {}\n",
                marker, variant.label, variant.url
            ));
        }

        let variants: Vec<Value> = ladder
            .iter()
            .enumerate()
            .map(|(index, variant)| {
                json!({
                    "label": variant.label.as_str(),
                    "uri": variant.uri,
                    "url": variant.url.as_str(),
                    "selected": Some(index) == selected,
                })
            })
            .collect();
        self.emit(pretty, json!({ "variants": variants }))
    }

    pub fn format_intervals(&self, intervals: &[SkipInterval]) -> Result<String> {
        let mut pretty = String::new();
        if intervals.is_empty() {
            pretty.push_str("No skip intervals\n");
        }
        for interval in intervals {
            pretty.push_str(&format!(
                "{:<6} {} - {}  ({})\n",
                interval.kind,
                format_time(interval.start_seconds),
                format_time(interval.end_seconds),
                interval.skip_id
            ));
        }
        self.emit(pretty, json!({ "intervals": intervals }))
    }

    pub fn format_vote(&self, skip_id: &str, vote: &str) -> Result<String> {
        self.emit(
            format!("Sent {vote} for {skip_id}"),
            json!({ "status": "ok", "skip_id": skip_id, "vote": vote }),
        )
    }

    /// One line per view update; JSON output is compact so it streams.
    pub fn format_view(&self, view: &SessionView) -> Result<String> {
        match self.format {
            OutputFormat::Pretty => {
                let mut line = format!(
                    "[{:<7}] {} {}",
                    view.state.to_string(),
                    view.elapsed_label,
                    view.remaining_label
                );
                if let Some(quality) = &view.current_quality {
                    line.push_str(&format!(" {quality}"));
                }
                if let Some(speed) = &view.speed_indicator {
                    line.push_str(&format!(" ({speed})"));
                }
                for skip in &view.visible_skips {
                    line.push_str(&format!(" [skip {}]", skip.kind));
                }
                if let Some(subtitle) = &view.subtitle {
                    line.push_str(&format!(" \"{subtitle}\""));
                }
                if view.vote_prompt {
                    line.push_str(" [rate skip times]");
                }
                Ok(line)
            }
            OutputFormat::Json => Ok(serde_json::to_string(&view_json(view))?),
        }
    }

    pub fn format_record(&self, record: &ProgressRecord) -> Result<String> {
        let pretty = format!(
            "Saved {} episode {} at {} ({})",
            record.title,
            record.episode_number,
            format_time(record.position_seconds),
            format_remaining(record.remaining_seconds()),
        );
        self.emit(pretty, serde_json::to_value(record)?)
    }
}

fn view_json(view: &SessionView) -> Value {
    let skips: Vec<String> = view
        .visible_skips
        .iter()
        .map(|skip| skip.kind.to_string())
        .collect();
    json!({
        "state": view.state.to_string(),
        "position": view.position,
        "duration": if view.duration.is_finite() { Some(view.duration) } else { None },
        "progress": view.progress,
        "elapsed": view.elapsed_label,
        "remaining": view.remaining_label,
        "quality": view.current_quality,
        "rate": view.rate,
        "skips": skips,
        "subtitle": view.subtitle,
        "vote_prompt": view.vote_prompt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use playback_engine::PlaybackState;
    use skip_times::SkipKind;
    use url::Url;

    const MASTER: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
360/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080
1080/index.m3u8
";

    fn ladder() -> QualityLadder {
        let url = Url::parse("https://cdn.example.org/show/master.m3u8").unwrap();
        QualityLadder::from_manifest(MASTER, &url)
    }

    #[test]
    fn test_pretty_ladder_marks_selection() {
        let ladder = ladder();
        let selected = ladder.select(Some("360p"));
        let out = OutputManager::new(OutputFormat::Pretty)
            .format_ladder(&ladder, selected)
            .unwrap();

        let selected_line = out.lines().find(|l| l.starts_with('*')).unwrap();
        assert!(selected_line.contains("360p"));
        assert!(selected_line.contains("https://cdn.example.org/show/360/index.m3u8"));
    }

    #[test]
    fn test_json_intervals() {
        let intervals = vec![SkipInterval {
            kind: SkipKind::Intro,
            start_seconds: 30.0,
            end_seconds: 120.0,
            skip_id: "op-1".to_string(),
        }];
        let out = OutputManager::new(OutputFormat::Json)
            .format_intervals(&intervals)
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["intervals"][0]["kind"], "intro");
        assert_eq!(value["intervals"][0]["skip_id"], "op-1");
    }

    #[test]
    fn test_pretty_view_line() {
        let view = SessionView {
            state: PlaybackState::Playing,
            current_quality: Some("1080p".to_string()),
            ..SessionView::default()
        };
        let line = OutputManager::new(OutputFormat::Pretty)
            .format_view(&view)
            .unwrap();

        assert!(line.starts_with("[playing]"));
        assert!(line.ends_with("1080p"));
    }
}
