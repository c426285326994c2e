use anyhow::{bail, Context, Result};
use crabpose::capture::AutoCaptureOrchestrator;
use crabpose::session::{CaptureSession, SessionHandle};
use crabpose::testing::{MockCamera, PoseTrace};
use crabpose::timing::SampleClock;
use crabpose::{AngleProfile, CrabPoseConfig, PoseTracker};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

fn usage() -> ! {
    eprintln!("Usage: crabpose-sim <command> [args]");
    eprintln!("  run [trace.json] [--config <path>] [--speed <x>] [--json]");
    eprintln!("      --speed also shortens the countdown by the same factor");
    eprintln!("  trace [--rate <hz>] [--hold <secs>]");
    eprintln!("  profiles [--json]");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    crabpose::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    match args[1].as_str() {
        "run" => cmd_run(&args).await,
        "trace" => cmd_trace(&args),
        "profiles" => cmd_profiles(&args),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            usage();
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn cmd_profiles(args: &[String]) -> Result<()> {
    let profiles = AngleProfile::all();
    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(profiles)?);
        return Ok(());
    }
    for p in profiles {
        let axis = |a: Option<crabpose::profile::AxisTarget>| {
            a.map_or_else(|| "-".to_string(), |a| format!("{}±{}", a.target, a.tolerance))
        };
        println!(
            "{:<14} pitch {:<8} yaw {:<8} roll {}",
            p.angle.title(),
            format!("{}±{}", p.pitch.target, p.pitch.tolerance),
            axis(p.yaw),
            axis(p.roll)
        );
    }
    Ok(())
}

fn cmd_trace(args: &[String]) -> Result<()> {
    let rate: f64 = flag_value(args, "--rate").unwrap_or("30").parse()?;
    let hold: f64 = flag_value(args, "--hold").unwrap_or("4").parse()?;
    if rate <= 0.0 || hold <= 0.0 {
        bail!("--rate and --hold must be positive");
    }
    println!("{}", serde_json::to_string(&PoseTrace::full_session(rate, hold))?);
    Ok(())
}

fn load_trace(path: Option<&str>) -> Result<PoseTrace> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading trace {}", path))?;
            serde_json::from_str(&text).with_context(|| format!("parsing trace {}", path))
        }
        None => Ok(PoseTrace::full_session(30.0, 4.0)),
    }
}

async fn cmd_run(args: &[String]) -> Result<()> {
    let json = args.iter().any(|a| a == "--json");
    let speed: f64 = flag_value(args, "--speed").unwrap_or("1").parse()?;
    if speed <= 0.0 {
        bail!("--speed must be positive");
    }
    let config = match flag_value(args, "--config") {
        Some(path) => CrabPoseConfig::load_from_file(PathBuf::from(path))?,
        None => CrabPoseConfig::load_or_default(),
    };
    let mut trace_path = None;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "--speed" => i += 1,
            "--json" => {}
            other => trace_path = Some(other),
        }
        i += 1;
    }
    let trace = load_trace(trace_path)?;
    log::info!("Replaying {} samples ({:.1}s) at {}x", trace.samples.len(), trace.duration(), speed);

    let session = SessionHandle::new(CaptureSession::new());
    let camera = MockCamera::new().with_latency(Duration::from_millis(150));
    // Poses are scored in trace time, so the countdown must run on it too.
    let orchestrator = AutoCaptureOrchestrator::new(session.clone(), camera, config.countdown.scaled(speed));

    let printers = [
        tokio::spawn(print_events(orchestrator.subscribe(), json)),
        tokio::spawn(print_events(session.subscribe(), json)),
    ];
    let mut session_events = session.subscribe();

    let (pose_tx, pose_rx) = watch::channel(None);
    let runner = tokio::spawn(orchestrator.run(pose_rx));

    let mut tracker = PoseTracker::new(session.current_angle().await, &config);
    let clock = SampleClock::new();
    for sample in &trace.samples {
        let due = clock.instant_at(sample.t / speed);
        tokio::time::sleep_until(tokio::time::Instant::from_std(due)).await;

        tracker.sync(&mut session_events);
        if session.is_complete().await {
            break;
        }

        let tracked = tracker.update(sample.orientation.as_ref(), sample.detection.as_ref(), sample.t);
        if let Some(cue) = tracked.cue {
            log::info!("{}: {:?} ({})", tracker.angle(), cue, tracked.validation.primary_feedback.message());
        }
        if pose_tx.send(Some(tracked.validation)).is_err() {
            break;
        }
    }

    drop(pose_tx);
    runner.await.context("orchestrator task panicked")?;
    // Let the printers drain what is already queued.
    tokio::task::yield_now().await;
    for printer in printers {
        printer.abort();
    }

    let summary = session.summary().await;
    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "Session {}: {}/{} angles captured{}",
            summary.session_id,
            summary.captured_angles.len(),
            crabpose::CaptureAngle::COUNT,
            if summary.is_complete { " (complete)" } else { "" }
        );
        for (angle, stats) in &summary.stats {
            println!(
                "  {:<14} attempts {} time {:.1}s{}",
                angle.title(),
                stats.attempts,
                stats.time_spent.as_secs_f64(),
                if stats.completed { "" } else { " (missing)" }
            );
        }
    }
    Ok(())
}

async fn print_events<E>(mut events: broadcast::Receiver<E>, json: bool)
where
    E: Clone + std::fmt::Debug + serde::Serialize + Send + 'static,
{
    loop {
        match events.recv().await {
            Ok(event) if json => match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => log::warn!("Failed to encode event: {}", e),
            },
            Ok(event) => println!("{:?}", event),
            Err(broadcast::error::RecvError::Lagged(n)) => log::warn!("Dropped {} events", n),
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
