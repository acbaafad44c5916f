use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod config;
mod control_messages;
mod detection_stabilizer;
mod gesture_classifier;
mod hand_landmarks;
mod obs_poller;
mod overlay_presenter;
mod pipeline_stats;
mod settings_store;
mod speech_announcer;
mod surface_sync;
mod translation_controller;
mod translation_session;

use config::{read_app_config, AppConfig};
use detection_stabilizer::DetectionStabilizer;
use gesture_classifier::{GeometricClassifier, GeometricConfig, GestureClassifier, SimulatedClassifier};
use obs_poller::ObsOverlayPoller;
use overlay_presenter::OverlayPresenter;
use settings_store::JsonFileStore;
use speech_announcer::{ConsoleSpeechBackend, SpeechAnnouncer};
use surface_sync::{SurfaceSync, SyncEvent};
use translation_controller::TranslationController;
use translation_session::{SyntheticFrameSource, TranslationSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Loading configuration...");
    let app_config = read_app_config();

    // Browser-source mode drives a standalone overlay off the detection
    // server instead of running the local pipeline.
    if std::env::args().any(|arg| arg == "--obs-overlay") {
        return run_obs_overlay(&app_config).await;
    }

    let classifier: Box<dyn GestureClassifier> = match app_config.classifier.as_str() {
        "geometric" => Box::new(GeometricClassifier::new(GeometricConfig::default())),
        "simulated" => Box::new(SimulatedClassifier::new()),
        other => {
            println!("Unknown classifier '{}', using simulated", other);
            Box::new(SimulatedClassifier::new())
        }
    };

    let store = JsonFileStore::new(&app_config.state_file);
    let sync = SurfaceSync::new(app_config.history_limit, Some(Box::new(store)));
    let overlay = OverlayPresenter::new(app_config.overlay.to_overlay_config());
    let announcer = SpeechAnnouncer::new(
        Box::new(ConsoleSpeechBackend),
        app_config.tts.to_announcer_config(&app_config.language),
    );
    let controller = TranslationController::new(
        app_config.controller.to_controller_config(),
        overlay,
        announcer,
        sync,
    );

    let mut session = TranslationSession::new(
        Box::new(SyntheticFrameSource),
        classifier,
        DetectionStabilizer::new(app_config.stabilizer.to_stabilizer_config()),
        controller,
        Duration::from_millis(app_config.frame_interval_ms),
        app_config.log_stats_enabled,
    );

    // Mirror accepted translations to the console like any other surface.
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SyncEvent::TranslationUpdate {
                    text, confidence, ..
                } => {
                    println!("Translation: {} ({:.0}%)", text, confidence * 100.0);
                }
                SyncEvent::StatusUpdate { status } => {
                    if cfg!(debug_assertions) {
                        println!("Status: {}", status);
                    }
                }
                SyncEvent::Error { message } => eprintln!("Error: {}", message),
            }
        }
    });

    session.start()?;
    println!("Translation session running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    println!("Shutting down...");
    session.stop();
    println!("{}", session.get_stats_report());

    Ok(())
}

async fn run_obs_overlay(app_config: &AppConfig) -> anyhow::Result<()> {
    let presenter = OverlayPresenter::new(app_config.overlay.to_overlay_config());
    let poller = ObsOverlayPoller::new(
        &app_config.obs.server_url,
        presenter,
        Duration::from_millis(app_config.obs.poll_interval_ms),
    )?;

    let running = Arc::new(AtomicBool::new(true));
    let run_flag = running.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        run_flag.store(false, Ordering::SeqCst);
    });

    poller.run(running).await;
    Ok(())
}
