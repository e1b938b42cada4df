// Label formatting for the session view

/// `mm:ss` below an hour, `h:mm:ss` above. Unknown times render as `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_owned();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

pub fn format_remaining(seconds: f64) -> String {
    format!("-{}", format_time(seconds))
}

/// Speed badge text, hidden at normal speed.
pub fn speed_indicator(rate: f32) -> Option<String> {
    if (rate - 1.0).abs() < f32::EPSILON {
        None
    } else {
        Some(format!("{rate:?}x Speed"))
    }
}
