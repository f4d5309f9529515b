//! Progress reporting for per-track loops.
//!
//! [`TrackProgress`] drives an `indicatif` bar (feature `progress`) whose message
//! shows the smoothed time spent on one track and the overall track rate.
//! Without the feature the bar disappears but the timing is still collected, so
//! callers never need `cfg` guards and can log [`TrackProgress::avg`] at the end.
use std::time::{Duration, Instant};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Weight of the newest duration in the smoothed per-track time.
const SMOOTHING: f64 = 0.2;

/// `253µs`, `42ms` or `3.14s` depending on the scale.
pub fn fmt_dur(d: Duration) -> String {
    match d.as_micros() {
        us @ 0..=999 => format!("{us}µs"),
        us @ 1_000..=999_999 => format!("{}ms", us / 1_000),
        _ => format!("{:.2}s", d.as_secs_f64()),
    }
}

/// Exponentially smoothed duration, in seconds. Empty until the first sample.
#[derive(Debug, Clone, Copy, Default)]
struct Smoothed(Option<f64>);

impl Smoothed {
    fn push(&mut self, sample: Duration) {
        let x = sample.as_secs_f64();
        self.0 = Some(match self.0 {
            None => x,
            Some(prev) => prev + SMOOTHING * (x - prev),
        });
    }

    fn get(&self) -> Duration {
        self.0.map_or(Duration::ZERO, Duration::from_secs_f64)
    }
}

/// Progress of one pass over a track collection.
pub struct TrackProgress {
    #[cfg(feature = "progress")]
    bar: ProgressBar,
    started: Instant,
    last: Instant,
    done: u64,
    per_track: Smoothed,
}

impl TrackProgress {
    /// Start a bar for `total` tracks, labelled with `stage`.
    pub fn new(total: usize, stage: &str) -> Self {
        #[cfg(feature = "progress")]
        let bar = {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{prefix:>12} [{bar:40.cyan/blue}] {pos}/{len} tracks | {elapsed_precise} | {msg}",
            ) {
                bar.set_style(style.progress_chars("=> "));
            }
            bar.set_prefix(stage.to_string());
            bar
        };
        #[cfg(not(feature = "progress"))]
        let _ = (total, stage);

        let now = Instant::now();
        TrackProgress {
            #[cfg(feature = "progress")]
            bar,
            started: now,
            last: now,
            done: 0,
            per_track: Smoothed::default(),
        }
    }

    /// Mark one more track as processed.
    pub fn inc(&mut self) {
        let now = Instant::now();
        self.per_track.push(now - self.last);
        self.last = now;
        self.done += 1;

        #[cfg(feature = "progress")]
        {
            // message refreshed every 64 tracks
            if self.done % 64 == 1 {
                self.bar
                    .set_message(format!("{}/track, {:.0} tracks/s", fmt_dur(self.avg()), self.rate()));
            }
            self.bar.inc(1);
        }
    }

    /// Smoothed duration of one track.
    pub fn avg(&self) -> Duration {
        self.per_track.get()
    }

    /// Tracks processed per second since the start.
    pub fn rate(&self) -> f64 {
        let secs = self.started.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.done as f64 / secs
        } else {
            0.0
        }
    }

    pub fn finish(self) {
        #[cfg(feature = "progress")]
        self.bar.finish_and_clear();
    }
}
