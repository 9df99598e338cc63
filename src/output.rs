use chrono::TimeDelta;
use serde::Serialize;

use crate::api::Story;
use crate::feed::{FeedView, Status};

/// "3h ago" style age of a unix timestamp relative to `now`.
pub fn format_relative(timestamp: u64, now: i64) -> String {
    let delta = TimeDelta::seconds(now.saturating_sub(timestamp as i64).max(0));
    if delta.num_minutes() < 1 {
        "just now".to_string()
    } else if delta.num_hours() < 1 {
        format!("{}m ago", delta.num_minutes())
    } else if delta.num_days() < 1 {
        format!("{}h ago", delta.num_hours())
    } else {
        format!("{}d ago", delta.num_days())
    }
}

/// Renders stories numbered from `first_rank`, two lines each.
pub fn render_text(stories: &[Story], first_rank: usize, now: i64) -> String {
    stories
        .iter()
        .enumerate()
        .map(|(i, story)| {
            let comments = match story.descendants {
                1 => "1 comment".to_string(),
                n => format!("{n} comments"),
            };
            format!(
                "{}. {} ({})\n   {} points by {} {} | {}",
                first_rank + i,
                story.title,
                story.domain(),
                story.score,
                story.by,
                format_relative(story.time, now),
                comments
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct RankedStory<'a> {
    rank: usize,
    #[serde(flatten)]
    story: &'a Story,
    hn_url: String,
}

/// One JSON object per line.
pub fn render_json(stories: &[Story], first_rank: usize) -> Result<String, serde_json::Error> {
    let lines = stories
        .iter()
        .enumerate()
        .map(|(i, story)| {
            serde_json::to_string(&RankedStory {
                rank: first_rank + i,
                story,
                hn_url: story.hn_url(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

/// Short summary of the feed for stderr.
pub fn render_status<Q, T>(view: &FeedView<'_, Q, T>) -> String {
    let shown = view.items.len();
    let total = view
        .total_available
        .map(|t| format!(" of {t}"))
        .unwrap_or_default();
    match view.status {
        Status::Loading => "loading...".to_string(),
        Status::LoadingMore => format!("{shown}{total} shown, loading more..."),
        Status::Error => {
            let msg = view.error.map(|e| e.user_message()).unwrap_or_default();
            format!("{shown}{total} shown, error: {msg}")
        }
        Status::Idle if shown == 0 && !view.has_more => "no stories".to_string(),
        Status::Idle if view.has_more => format!("{shown}{total} shown, more available"),
        Status::Idle => format!("{shown}{total} shown, end of feed"),
    }
}
