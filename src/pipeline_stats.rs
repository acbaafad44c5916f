use chrono;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const STATS_INTERVAL_SECS: u64 = 10;
const STATS_LOG_FILE: &str = "detection_stats.log";

/// Stores statistics about detection pipeline performance
#[derive(Default, Clone)]
pub struct PipelineStats {
    pub frames_processed: usize,
    pub frames_failed: usize,
    pub stable_events: usize,
    pub accepted_updates: usize,
    pub total_classify_time: f32,
    pub max_classify_time: f32,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successfully classified frame and how long it took.
    pub fn record_frame(&mut self, classify_time: f32) {
        self.frames_processed += 1;
        self.total_classify_time += classify_time;
        self.max_classify_time = self.max_classify_time.max(classify_time);
    }

    pub fn record_failure(&mut self) {
        self.frames_failed += 1;
    }

    pub fn record_stable_event(&mut self) {
        self.stable_events += 1;
    }

    pub fn record_accepted_update(&mut self) {
        self.accepted_updates += 1;
    }

    pub fn avg_classify_time(&self) -> f32 {
        if self.frames_processed == 0 {
            0.0
        } else {
            self.total_classify_time / self.frames_processed as f32
        }
    }

    pub fn report(&self) -> String {
        format!(
            "Detection Statistics:\n\
             - Frames processed: {}\n\
             - Frames failed: {}\n\
             - Stable gesture events: {}\n\
             - Accepted translation updates: {}\n\
             - Average classify time: {:.3}ms\n\
             - Max classify time: {:.3}ms",
            self.frames_processed,
            self.frames_failed,
            self.stable_events,
            self.accepted_updates,
            self.avg_classify_time() * 1000.0,
            self.max_classify_time * 1000.0,
        )
    }

    /// Logs the statistics to a file
    pub fn log_to_file(&self, is_final: bool) {
        if self.frames_processed == 0 {
            return;
        }
        let stats_report = self.report();
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let report_type = if is_final {
            "Final Report"
        } else {
            "Periodic Report"
        };
        let file_content = format!("\n--- {} ({}) ---\n{}\n", timestamp, report_type, stats_report);

        match OpenOptions::new().append(true).create(true).open(STATS_LOG_FILE) {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", file_content) {
                    eprintln!("Failed to write to stats file: {}", e);
                }
            }
            Err(e) => eprintln!("Failed to open stats file: {}", e),
        }
    }
}

/// Handles reporting of detection pipeline statistics
pub struct StatsReporter {
    stats: Arc<Mutex<PipelineStats>>,
    running: Arc<AtomicBool>,
    enabled: bool,
}

impl StatsReporter {
    pub fn new(stats: Arc<Mutex<PipelineStats>>, running: Arc<AtomicBool>, enabled: bool) -> Self {
        Self {
            stats,
            running,
            enabled,
        }
    }

    /// Start periodic reporting to console and the stats log file.
    pub fn start_periodic_reporting(&self) {
        if !self.enabled {
            println!("Stats reporting disabled - no statistics will be logged");
            return;
        }

        println!(
            "Stats reporting enabled - will report every {} seconds to console and {}",
            STATS_INTERVAL_SECS, STATS_LOG_FILE
        );

        // Create or truncate the stats file
        if let Err(e) = File::create(STATS_LOG_FILE) {
            eprintln!("Failed to create stats file: {}", e);
        }

        let stats = self.stats.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(STATS_INTERVAL_SECS));
            while running.load(Ordering::Relaxed) {
                interval.tick().await;
                if let Some(stats) = stats.try_lock() {
                    if stats.frames_processed > 0 {
                        println!("\n--- Periodic Detection Statistics ---");
                        println!("{}", stats.report());
                        println!("--------------------------------------\n");
                        stats.log_to_file(false);
                    }
                }
            }
            println!("Stats reporting stopped");
        });
    }

    /// Print current statistics on demand
    pub fn print_stats(&self) {
        if !self.enabled {
            println!("Stats reporting disabled - no statistics will be logged on demand");
            return;
        }

        if let Some(stats) = self.stats.try_lock() {
            if stats.frames_processed > 0 {
                println!("\n--- Current Detection Statistics ---");
                println!("{}", stats.report());
                println!("-------------------------------------\n");
                stats.log_to_file(false);
            } else {
                println!("No detection statistics available yet.");
            }
        } else {
            println!("Could not access detection statistics (locked).");
        }
    }
}
