//! Static player page.
//!
//! The page is regenerated from the manifest on every run, so each `<img>`
//! and `<audio>` it contains points at a file the manifest lists.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use slideclip_media::fs_utils::write_atomic;
use slideclip_media::AudioFormat;
use slideclip_models::timestamp::format_seconds;
use slideclip_models::{ClipRecord, Manifest};

use crate::config::PLAYER_FILE;
use crate::error::PipelineResult;

const DEFAULT_TITLE: &str = "Slides";

const STYLE: &str = "\
body { font-family: sans-serif; margin: 0 auto; max-width: 960px; padding: 1rem; }
section { border-bottom: 1px solid #ddd; padding: 1rem 0; }
section img { display: block; max-width: 100%; }
section audio { width: 100%; margin-top: 0.5rem; }
.meta { color: #666; font-size: 0.85rem; }";

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn mime_type(audio: &str) -> &'static str {
    AudioFormat::from_path(audio)
        .unwrap_or(AudioFormat::Mp3)
        .mime_type()
}

fn render_clip(out: &mut String, clip: &ClipRecord) {
    let image = escape_html(&clip.image);
    let audio = escape_html(&clip.audio);

    let _ = writeln!(out, "<section id=\"section-{}\">", clip.section);
    let _ = writeln!(
        out,
        "  <h2>Section {} <span class=\"meta\">{} to {}</span></h2>",
        clip.section,
        format_seconds(clip.start_time),
        format_seconds(clip.end_time)
    );
    let _ = writeln!(
        out,
        "  <img src=\"{}\" alt=\"Slide {}\" loading=\"lazy\">",
        image, clip.section
    );
    let _ = writeln!(out, "  <audio controls preload=\"none\">");
    let _ = writeln!(
        out,
        "    <source src=\"{}\" type=\"{}\">",
        audio,
        mime_type(&clip.audio)
    );
    let _ = writeln!(out, "  </audio>");
    let _ = writeln!(
        out,
        "  <p class=\"meta\">{:.1}s of {:.1}s</p>",
        clip.duration, clip.original_duration
    );
    let _ = writeln!(out, "</section>");
}

/// Render the player page for `manifest`.
pub fn render_player(manifest: &Manifest, title: &str) -> String {
    let title = escape_html(title);
    let mut out = String::new();

    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html lang=\"en\">");
    let _ = writeln!(out, "<head>");
    let _ = writeln!(out, "<meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>{}</title>", title);
    let _ = writeln!(out, "<style>\n{}\n</style>", STYLE);
    let _ = writeln!(out, "</head>");
    let _ = writeln!(out, "<body>");
    let _ = writeln!(out, "<h1>{}</h1>", title);

    for clip in manifest.iter() {
        render_clip(&mut out, clip);
    }

    let _ = writeln!(out, "</body>");
    let _ = writeln!(out, "</html>");
    out
}

/// Write `index.html` into `output_dir`, titled after the directory.
pub fn write_player(output_dir: &Path, manifest: &Manifest) -> PipelineResult<PathBuf> {
    let title = output_dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_TITLE);

    let path = output_dir.join(PLAYER_FILE);
    write_atomic(&path, render_player(manifest, title).as_bytes())?;

    tracing::info!(path = %path.display(), clips = manifest.len(), "Wrote player page");
    Ok(path)
}
