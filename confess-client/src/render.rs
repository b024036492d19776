//! Plain-text rendering for the terminal front end

use chrono::{DateTime, Datelike, Timelike, Utc};
use confess_common::session::SessionFlag;
use confess_common::{Confession, Verification};

use crate::admin::AdminStats;
use crate::like::LikeState;
use crate::share::permalink;

const MONTHS_ID: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

pub const WELCOME_BANNER: &str = "Welcome to ConfessWorld 💌 Say what you never got to say.";

/// `18 Oktober 2026 14.05` (UTC)
pub fn format_date(at: &DateTime<Utc>) -> String {
    format!(
        "{} {} {} {:02}.{:02}",
        at.day(),
        MONTHS_ID[at.month0() as usize],
        at.year(),
        at.hour(),
        at.minute()
    )
}

/// Banner shown once per session
pub fn welcome_banner(shown: &SessionFlag) -> Option<&'static str> {
    shown.mark().then_some(WELCOME_BANNER)
}

/// One confession card
pub fn card(confession: &Confession, likes: &LikeState, site_url: &str) -> String {
    let badge = if confession.is_verified { " ✔ verified" } else { "" };
    let mut out = format!("To: {}{}\n{}\n", confession.target_name, badge, confession.message);

    let song = confession
        .song_embed_url()
        .or_else(|| confession.song_url.clone().filter(|_| confession.has_song()));
    if let Some(song) = song {
        out.push_str(&format!("♪ {}\n", song));
    }

    let heart = if likes.liked { "♥" } else { "♡" };
    let pending = if likes.is_pending() { " …" } else { "" };
    out.push_str(&format!(
        "{}  {} {}{}  👁 {}\n",
        format_date(&confession.created_at),
        heart,
        likes.count,
        pending,
        confession.views.unwrap_or(0)
    ));
    out.push_str(&permalink(site_url, &confession.unique_slug));
    out
}

/// One row of the admin list
pub fn admin_row(confession: &Confession) -> String {
    let mut flags = Vec::new();
    if !confession.is_approved {
        flags.push("unapproved");
    }
    if confession.is_verified {
        flags.push("verified");
    }
    if confession.has_song() {
        flags.push("with song");
    }

    let mut out = format!(
        "{}  {}  To: {}",
        confession.id,
        format_date(&confession.created_at),
        confession.target_name
    );
    if !flags.is_empty() {
        out.push_str(&format!("  [{}]", flags.join(", ")));
    }
    out.push_str(&format!("\n    {}", confession.message));
    out
}

pub fn stats(stats: &AdminStats) -> String {
    format!("Total: {}  With Songs: {}", stats.total, stats.with_song)
}

/// Live feedback for the recipient-name field
pub fn verification(result: &Verification) -> String {
    if result.verified {
        format!("✔ Verified with {} → To: {}", result.code, result.target_name)
    } else {
        format!("Not verified → To: {}", result.target_name)
    }
}
