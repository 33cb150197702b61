//! Terminal output: notices, object tables and job progress bars.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tdlight_common::entities::ConfidenceBand;
use tdlight_common::{JobKind, JobProgress, LightCurve};
use tdlight_portal::display::{position_label, MetadataView, ResultRow};
use tdlight_portal::skymap::Viewport;
use tdlight_portal::{AppState, Notice, NoticeLevel};
use tokio::sync::broadcast;

// ── Notices ─────────────────────────────────────────────────

pub fn notice_line(notice: &Notice) -> String {
    let message = notice.message();
    match notice.level {
        NoticeLevel::Success => format!("{} {}", style("✔").green(), message),
        NoticeLevel::Info    => format!("{} {}", style("ℹ").cyan(), message),
        NoticeLevel::Warning => format!("{} {}", style("⚠").yellow(), style(message).yellow()),
        NoticeLevel::Error   => format!("{} {}", style("✖").red(), style(message).red()),
    }
}

/// Print every notice queued on `rx`. Lines go above `bar` when one is
/// being drawn.
pub fn drain_notices(rx: &mut broadcast::Receiver<Notice>, bar: Option<&ProgressBar>) {
    loop {
        match rx.try_recv() {
            Ok(notice) => match bar {
                Some(bar) => bar.println(notice_line(&notice)),
                None      => println!("{}", notice_line(&notice)),
            },
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Notice output lagged");
            }
            Err(_) => break,
        }
    }
}

// ── Tables ──────────────────────────────────────────────────

pub fn print_objects(state: &AppState) {
    for entry in state.selection.entries() {
        let obj = &entry.object;
        let mark = if entry.selected { style("●").green() } else { style("○").dim() };
        println!(
            "{} {:<20} {:<32} {}",
            mark,
            obj.source_id.as_str(),
            position_label(obj),
            style(obj.object_class.as_deref().unwrap_or("-")).dim(),
        );
    }
    println!("{}", style(format!("{} objects", state.selection.len())).bold());
}

pub fn print_metadata(view: &MetadataView) {
    let rows = [
        ("Source ID", &view.source_id),
        ("HEALPix",   &view.healpix_id),
        ("RA",        &view.ra),
        ("DEC",       &view.dec),
        ("Class",     &view.object_class),
        ("Points",    &view.point_count),
    ];
    for (label, value) in rows {
        println!("{:>10}  {}", style(label).bold(), value);
    }
}

pub fn print_light_curve_summary(curve: &LightCurve) {
    let bands = curve.bands();
    println!(
        "{:>10}  {}",
        style("Bands").bold(),
        if bands.is_empty() { "-".to_string() } else { bands.join(", ") }
    );
    if let Some((first, last)) = curve.observation_span() {
        println!(
            "{:>10}  {} .. {} ({} days)",
            style("Observed").bold(),
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M"),
            (last - first).num_days()
        );
    }
}

/// Nearest xterm-256 colour-cube index for a `#rrggbb` badge colour.
pub fn ansi256(hex: &str) -> Option<u8> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| {
        u8::from_str_radix(hex.get(i..i + 2)?, 16)
            .ok()
            .map(|v| ((v as u16 * 5 + 127) / 255) as u8)
    };
    Some(16 + 36 * channel(0)? + 6 * channel(2)? + channel(4)?)
}

pub fn print_results(state: &AppState) {
    println!(
        "{}",
        style(format!("{:<20} {:<20} {:<10} {}", "Source ID", "Position", "Class", "Confidence")).bold()
    );
    for res in &state.results {
        let row = ResultRow::from(res);
        let confidence = match row.band {
            ConfidenceBand::High   => style(row.confidence).green(),
            ConfidenceBand::Medium => style(row.confidence).yellow(),
            ConfidenceBand::Low    => style(row.confidence).red(),
        };
        let prediction = format!("{:<10}", row.prediction);
        let prediction = match ansi256(row.class_color) {
            Some(code) => style(prediction).color256(code),
            None       => style(prediction),
        };
        println!("{:<20} {:<20} {} {}", row.source_id, row.position, prediction, confidence);
    }
}

// ── Sky map ─────────────────────────────────────────────────

const CELL_W: f64 = 10.0;
const CELL_H: f64 = 20.0;

/// Character-cell sky map of the listed objects, `cols` x `rows` cells.
/// `*` marks the highlighted object, `o` the rest, `.` the outline of the
/// last cone search.
pub fn sky_map(state: &AppState, cols: usize, rows: usize) -> Vec<String> {
    let width = cols as f64 * CELL_W;
    let height = rows as f64 * CELL_H;
    let Some(viewport) = Viewport::fit(width, height, state.selection.objects()) else {
        return Vec::new();
    };
    let mut grid = vec![vec![' '; cols]; rows];
    let mut plot = |x: f64, y: f64, mark: char| {
        let (col, row) = ((x / CELL_W).floor(), (y / CELL_H).floor());
        if col < 0.0 || row < 0.0 {
            return;
        }
        if let Some(cell) = grid.get_mut(row as usize).and_then(|r| r.get_mut(col as usize)) {
            if mark != '.' || *cell == ' ' {
                *cell = mark;
            }
        }
    };

    if let Some(cone) = &state.cone {
        let circle = viewport.cone(cone);
        let steps = 96;
        for i in 0..steps {
            let t = i as f64 / steps as f64 * std::f64::consts::TAU;
            plot(circle.x + circle.r * t.cos(), circle.y + circle.r * t.sin(), '.');
        }
    }
    for point in viewport.points(state.selection.objects()) {
        let mark = if state.highlighted.as_ref() == Some(&point.object.source_id) { '*' } else { 'o' };
        plot(point.x, point.y, mark);
    }

    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect()
}

pub fn print_sky_map(state: &AppState) {
    let lines = sky_map(state, 72, 20);
    if lines.is_empty() {
        return;
    }
    let caption = state
        .cone
        .map(|c| format!("cone {:.3}°, {:.3}° r={}°", c.ra, c.dec, c.radius));
    println!("{}", style("─".repeat(72)).dim());
    for line in lines {
        println!("{}", line);
    }
    println!("{}", style("─".repeat(72)).dim());
    if let Some(caption) = caption {
        println!("{}", style(caption).dim());
    }
}

// ── Progress ────────────────────────────────────────────────

pub fn progress_bar(kind: JobKind) -> ProgressBar {
    let bar = ProgressBar::new(100);
    let template = format!("{} [{{bar:40.cyan/blue}}] {{pos:>3}}% {{msg}}", kind);
    if let Ok(progress_style) = ProgressStyle::with_template(&template) {
        bar.set_style(progress_style.progress_chars("=> "));
    }
    bar
}

/// One status line for `progress`: stage, message and counters.
pub fn progress_message(kind: JobKind, progress: &JobProgress) -> String {
    let mut line = match progress.stage_label(kind) {
        Some(stage) => format!("[{}] {}", stage, progress.message),
        None        => progress.message.clone(),
    };
    if let Some(batch) = &progress.batch {
        line.push_str(&format!(
            " (batch {}/{}, {}/{} in batch, {} updated)",
            batch.current_batch, batch.total_batches, batch.processed, batch.batch_total, batch.updated
        ));
    }
    if let Some(stats) = &progress.stats {
        line.push_str(&format!(
            " ({} files, {} records, {} tables)",
            stats.processed_files, stats.inserted_records, stats.created_tables
        ));
    }
    line
}

pub fn render_progress(bar: &ProgressBar, kind: JobKind, progress: &JobProgress) {
    bar.set_position(progress.percent.clamp(0.0, 100.0) as u64);
    bar.set_message(progress_message(kind, progress));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdlight_common::progress::BatchProgress;

    #[test]
    fn batch_counters_follow_message() {
        let progress = JobProgress {
            percent: 40.0,
            message: "Classifying".into(),
            batch: Some(BatchProgress {
                current_batch: 2,
                total_batches: 5,
                batch_progress: 0.5,
                processed: 250,
                batch_total: 500,
                updated: 240,
            }),
            ..Default::default()
        };
        assert_eq!(
            progress_message(JobKind::AutoClassify, &progress),
            "Classifying (batch 2/5, 250/500 in batch, 240 updated)"
        );
    }

    #[test]
    fn badge_colours_map_onto_the_colour_cube() {
        assert_eq!(ansi256("#000000"), Some(16));
        assert_eq!(ansi256("#ffffff"), Some(231));
        assert_eq!(ansi256("#06b6d4"), Some(44));
        assert_eq!(ansi256("06b6d4"), None);
        assert_eq!(ansi256("#06b6"), None);
    }

    #[test]
    fn sky_map_marks_objects_and_cone() {
        use tdlight_common::CelestialObject;
        use tdlight_portal::skymap::ConeOverlay;

        let mut state = AppState::default();
        state.selection.replace(vec![
            CelestialObject::new("a").with_position(10.0, 0.0),
            CelestialObject::new("b").with_position(11.0, 1.0),
        ]);
        state.highlighted = Some("b".into());
        state.cone = Some(ConeOverlay { ra: 10.5, dec: 0.5, radius: 0.5 });

        let lines = sky_map(&state, 48, 14);
        assert_eq!(lines.len(), 14);
        let text = lines.join("\n");
        assert_eq!(text.matches('*').count(), 1);
        assert_eq!(text.matches('o').count(), 1);
        assert!(text.contains('.'));
        // RA grows rightwards, DEC upwards: b sits above and right of a.
        let find = |mark: char| {
            lines.iter().enumerate().find_map(|(row, l)| l.find(mark).map(|col| (row, col)))
        };
        let (a, b) = (find('o').unwrap(), find('*').unwrap());
        assert!(b.0 < a.0 && b.1 > a.1);

        assert!(sky_map(&AppState::default(), 48, 14).is_empty());
    }

    #[test]
    fn classify_message_carries_stage() {
        let progress = JobProgress {
            percent: 50.0,
            message: "Extracting features".into(),
            stage: Some(1),
            ..Default::default()
        };
        assert_eq!(
            progress_message(JobKind::Classify, &progress),
            "[Features] Extracting features"
        );
    }
}
