use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use vanguard_ai::{GeminiClient, RecognitionClient};
use vanguard_core::campus::{self, DESTINATIONS, PURPOSES};
use vanguard_core::visitor::{ManualEntry, Visitor};
use vanguard_core::{analytics, ScanResult};
use vanguard_hw::{Camera, FrameSource};
use vanguard_kiosk::assistant;
use vanguard_kiosk::config::Config;
use vanguard_kiosk::scanner::{Scanner, ScannerConfig, ScannerError, ScannerEvent};
use vanguard_kiosk::session::{Session, Step};

#[derive(Parser)]
#[command(name = "vanguard-kiosk", about = "Vanguard visitor-enrollment kiosk")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive kiosk flow
    Run,
    /// Ask the campus assistant a one-off question
    Ask {
        /// The question text
        question: Vec<String>,
    },
    /// Print the security dashboard (mock analytics)
    Dashboard,
    /// Probe the kiosk camera
    Diagnose,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Run => cmd_run(config).await,
        Commands::Ask { question } => cmd_ask(config, question.join(" ")).await,
        Commands::Dashboard => {
            cmd_dashboard();
            Ok(())
        }
        Commands::Diagnose => cmd_diagnose(&config),
    }
}

fn recognition_client(config: &Config) -> Result<Arc<dyn RecognitionClient>> {
    let api_key = config
        .api_key
        .clone()
        .context("VANGUARD_API_KEY is not set")?;
    Ok(Arc::new(GeminiClient::new(api_key, config.model.clone())))
}

async fn cmd_run(config: Config) -> Result<()> {
    let client = recognition_client(&config)?;

    // Camera acquired once for the whole kiosk session. Permission
    // denial or a missing device leaves only the manual-entry path.
    let frames: Option<Arc<dyn FrameSource>> = match Camera::open(&config.camera_device) {
        Ok(camera) => Some(Arc::new(camera)),
        Err(e) => {
            tracing::error!(error = %e, "camera unavailable; manual entry only");
            println!("Camera Unavailable — switching to officer manual entry.");
            None
        }
    };

    let scanner_config = ScannerConfig {
        poll_interval: config.poll_interval,
        poll_backoff: config.poll_backoff,
        match_threshold: config.match_threshold,
        locate_delay: config.locate_delay,
        sim_scan_delay: config.sim_scan_delay,
        sim_match_delay: config.sim_match_delay,
        ..ScannerConfig::default()
    };

    // Liveness flag for the scanner's poll loop; dropped to false on exit.
    let (live_tx, live_rx) = watch::channel(true);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut session = Session::new(StdRng::from_entropy());

    let result = kiosk_loop(
        &mut session,
        client,
        frames,
        scanner_config,
        live_rx,
        &mut stdin,
    )
    .await;

    let _ = live_tx.send(false);
    result
}

async fn kiosk_loop(
    session: &mut Session<StdRng>,
    client: Arc<dyn RecognitionClient>,
    frames: Option<Arc<dyn FrameSource>>,
    scanner_config: ScannerConfig,
    live: watch::Receiver<bool>,
    stdin: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    loop {
        match session.step() {
            Step::Scan => {
                let Some(frames) = frames.clone() else {
                    session.request_manual_entry();
                    continue;
                };
                println!();
                println!("=== Welcome to Vanguard HQ ===");
                println!("Please present your National ID or Staff Badge to the camera.");
                match run_enrollment(
                    session,
                    client.clone(),
                    frames,
                    scanner_config.clone(),
                    live.clone(),
                    stdin,
                )
                .await?
                {
                    EnrollmentOutcome::Done => {}
                    EnrollmentOutcome::ManualRequested => session.request_manual_entry(),
                    EnrollmentOutcome::Quit => return Ok(()),
                }
            }
            Step::AuthManualEntry => {
                println!();
                println!("--- Security Override: Auxiliary Police Only ---");
                let Some(badge) = prompt(stdin, "Officer badge ID (blank to cancel): ").await?
                else {
                    return Ok(());
                };
                if badge.trim().is_empty() {
                    session.cancel_to_scan();
                } else {
                    session.authorize_officer(&badge);
                }
            }
            Step::ManualEntry => {
                println!();
                println!(
                    "--- Manual Visitor Entry (Officer {}) ---",
                    session.officer_badge().unwrap_or("?")
                );
                match read_manual_entry(stdin).await? {
                    Some(entry) => {
                        session.submit_manual_entry(entry, Utc::now())?;
                    }
                    None => session.cancel_to_scan(),
                }
            }
            Step::Details => {
                if run_details(session, stdin).await?.is_none() {
                    return Ok(());
                }
            }
            Step::KioskSuccess => {
                println!();
                println!("Registration Complete — scan this code with your mobile device:");
                print_qr(7, 0.7);
                if prompt(stdin, "Press Enter to continue...").await?.is_none() {
                    return Ok(());
                }
                session.proceed_to_pass()?;
            }
            Step::Pass => {
                if let Some(pass) = session.pass() {
                    print_pass(pass);
                }
                let Some(choice) =
                    prompt(stdin, "[n]avigate live, [d]one: ").await?
                else {
                    return Ok(());
                };
                if choice.trim().eq_ignore_ascii_case("n") {
                    let est = session.navigate()?;
                    println!();
                    println!("--- Premise Map ---");
                    for node in campus::MAP_NODES {
                        println!("  {:<22} ({:>4.0}, {:>4.0})", node.label, node.x, node.y);
                    }
                    println!("Est. arrival: {} min ({} m)", est.minutes, est.distance_m);
                } else {
                    session.reset();
                }
            }
            Step::Navigation => {
                let Some(_) = prompt(stdin, "Press Enter to finish...").await? else {
                    return Ok(());
                };
                session.reset();
            }
        }
    }
}

enum EnrollmentOutcome {
    Done,
    ManualRequested,
    Quit,
}

/// Drive one enrollment attempt: poll for an ID, confirm, verify face.
async fn run_enrollment(
    session: &mut Session<StdRng>,
    client: Arc<dyn RecognitionClient>,
    frames: Arc<dyn FrameSource>,
    scanner_config: ScannerConfig,
    live: watch::Receiver<bool>,
    stdin: &mut Lines<BufReader<Stdin>>,
) -> Result<EnrollmentOutcome> {
    let (mut scanner, mut events) = Scanner::new(client, frames, scanner_config, live);
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(event);
        }
    });

    let outcome = loop {
        match scanner.run_id_scan().await {
            Ok(()) => {}
            Err(ScannerError::CameraUnavailable(e)) => {
                tracing::error!(error = %e, "camera lost during scan");
                break EnrollmentOutcome::ManualRequested;
            }
            Err(ScannerError::Cancelled) => break EnrollmentOutcome::Quit,
        }

        if let Some(identity) = scanner.identity() {
            println!(
                "  Captured: {} ({}){}",
                identity.name,
                identity.id,
                identity
                    .department
                    .as_deref()
                    .map(|d| format!(" — {d}"))
                    .unwrap_or_default()
            );
        }

        let Some(choice) =
            prompt(stdin, "Press Enter to verify face match, or type 'manual': ").await?
        else {
            break EnrollmentOutcome::Quit;
        };
        if choice.trim().eq_ignore_ascii_case("manual") {
            break EnrollmentOutcome::ManualRequested;
        }

        match scanner.verify_face().await {
            Ok(Some(result)) => {
                complete(session, result)?;
                break EnrollmentOutcome::Done;
            }
            Ok(None) => {
                let Some(choice) =
                    prompt(stdin, "Verification failed. [r]etry or [m]anual entry: ").await?
                else {
                    break EnrollmentOutcome::Quit;
                };
                if choice.trim().eq_ignore_ascii_case("m") {
                    break EnrollmentOutcome::ManualRequested;
                }
                scanner.retry();
            }
            Err(ScannerError::CameraUnavailable(_)) => break EnrollmentOutcome::ManualRequested,
            Err(ScannerError::Cancelled) => break EnrollmentOutcome::Quit,
        }
    };

    printer.abort();
    Ok(outcome)
}

fn complete(session: &mut Session<StdRng>, result: ScanResult) -> Result<()> {
    session.complete_scan(result)?;
    Ok(())
}

/// Destination / purpose / duration pickers, seeded from the scan.
async fn run_details(
    session: &mut Session<StdRng>,
    stdin: &mut Lines<BufReader<Stdin>>,
) -> Result<Option<()>> {
    println!();
    if let Some(scan) = session.scanned() {
        println!("Hi, {} — where are you heading?", scan.name);
    }
    for (i, d) in DESTINATIONS.iter().enumerate() {
        println!("  {}. {} (parking: {})", i + 1, d.label, d.parking_zone);
    }
    if let Some(choice) = prompt(stdin, "Destination [1-4]: ").await? {
        if let Ok(n) = choice.trim().parse::<usize>() {
            if (1..=DESTINATIONS.len()).contains(&n) {
                session.set_destination(DESTINATIONS[n - 1]);
            }
        }
    } else {
        return Ok(None);
    }

    for (i, p) in PURPOSES.iter().enumerate() {
        println!("  {}. {}", i + 1, p.label);
    }
    let default_purpose = session.details().purpose.label;
    if let Some(choice) =
        prompt(stdin, &format!("Purpose [1-6, Enter = {default_purpose}]: ")).await?
    {
        if let Ok(n) = choice.trim().parse::<usize>() {
            if (1..=PURPOSES.len()).contains(&n) {
                session.set_purpose(PURPOSES[n - 1]);
            }
        }
    } else {
        return Ok(None);
    }

    let default_hours = session.details().duration_hours;
    if let Some(choice) =
        prompt(stdin, &format!("Duration in hours [Enter = {default_hours}]: ")).await?
    {
        if let Ok(h) = choice.trim().parse::<f64>() {
            if (1.0..=12.0).contains(&h) {
                session.set_duration(h);
            }
        }
    } else {
        return Ok(None);
    }

    session.generate_pass(Utc::now())?;
    Ok(Some(()))
}

async fn read_manual_entry(
    stdin: &mut Lines<BufReader<Stdin>>,
) -> Result<Option<ManualEntry>> {
    let mut entry = ManualEntry {
        purpose_label: PURPOSES[0].label.to_string(),
        venue_id: DESTINATIONS[0].id.to_string(),
        duration_hours: 2.0,
        ..Default::default()
    };

    let Some(name) = prompt(stdin, "Full name: ").await? else { return Ok(None) };
    if name.trim().is_empty() {
        return Ok(None);
    }
    entry.name = name.trim().to_string();

    let Some(ic) = prompt(stdin, "IC / Passport no.: ").await? else { return Ok(None) };
    if ic.trim().is_empty() {
        return Ok(None);
    }
    entry.ic = ic.trim().to_string();

    if let Some(email) = prompt(stdin, "Email: ").await? {
        entry.email = email.trim().to_string();
    }
    if let Some(phone) = prompt(stdin, "Phone: ").await? {
        entry.phone = phone.trim().to_string();
    }
    if let Some(company) = prompt(stdin, "Company: ").await? {
        entry.company = company.trim().to_string();
    }

    for (i, p) in PURPOSES.iter().enumerate() {
        println!("  {}. {}", i + 1, p.label);
    }
    if let Some(choice) = prompt(stdin, "Purpose [1-6]: ").await? {
        if let Ok(n) = choice.trim().parse::<usize>() {
            if (1..=PURPOSES.len()).contains(&n) {
                entry.purpose_label = PURPOSES[n - 1].label.to_string();
            }
        }
    }
    for (i, d) in DESTINATIONS.iter().enumerate() {
        println!("  {}. {}", i + 1, d.label);
    }
    if let Some(choice) = prompt(stdin, "Venue [1-4]: ").await? {
        if let Ok(n) = choice.trim().parse::<usize>() {
            if (1..=DESTINATIONS.len()).contains(&n) {
                entry.venue_id = DESTINATIONS[n - 1].id.to_string();
            }
        }
    }
    if let Some(choice) = prompt(stdin, "Duration in hours [Enter = 2]: ").await? {
        if let Ok(h) = choice.trim().parse::<f64>() {
            if (1.0..=12.0).contains(&h) {
                entry.duration_hours = h;
            }
        }
    }

    Ok(Some(entry))
}

fn print_event(event: ScannerEvent) {
    match event {
        ScannerEvent::Status(msg) => println!("  > {msg}"),
        ScannerEvent::SimulationMode => println!("  [SIMULATION MODE]"),
        ScannerEvent::MatchScore(score) => println!("  similarity: {score:.0}%"),
        ScannerEvent::Phase(phase) => tracing::debug!(?phase, "scanner phase"),
        ScannerEvent::IdCaptured(_) => {}
    }
}

fn print_pass(pass: &Visitor) {
    println!();
    println!("=== Digital Visitor Pass ===");
    println!("  Name:        {}", pass.name);
    println!("  ID:          {}", pass.nric);
    println!("  Destination: {} — {}", pass.tower, pass.floor);
    println!("  Purpose:     {}", pass.purpose);
    if let Some(dept) = &pass.department {
        println!("  Department:  {dept}");
    }
    if let Some(slot) = &pass.parking_slot {
        println!("  Parking:     {slot}");
    }
    println!(
        "  Expiry:      {} ({}h limit)",
        pass.expiry().format("%H:%M"),
        pass.duration_hours
    );
    println!("  Scan at turnstile ({}):", pass.qr_code);
    print_qr(5, 0.6);
}

/// Render the decorative QR-like grid as terminal blocks.
fn print_qr(side: usize, density: f64) {
    let mut rng = StdRng::from_entropy();
    let cells = campus::qr_grid(&mut rng, side, density);
    for row in cells.chunks(side) {
        let line: String = row.iter().map(|&c| if c { "██" } else { "  " }).collect();
        println!("    {line}");
    }
}

async fn prompt(
    stdin: &mut Lines<BufReader<Stdin>>,
    message: &str,
) -> Result<Option<String>> {
    use std::io::Write;
    print!("{message}");
    std::io::stdout().flush()?;
    Ok(stdin.next_line().await?)
}

async fn cmd_ask(config: Config, question: String) -> Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("empty question");
    }
    let client = recognition_client(&config)?;
    let answer = assistant::ask(client.as_ref(), &question).await;
    println!("{answer}");
    Ok(())
}

fn cmd_dashboard() {
    println!("=== Security Intelligence ===");
    println!("Peak visitors today: {}", analytics::peak_visitors());
    println!();
    println!("Traffic by hour:");
    for point in analytics::TRAFFIC_BY_HOUR {
        let bar: String = "#".repeat((point.visitors / 4) as usize);
        println!("  {}  {:>3} visitors / {} guards  {bar}", point.time, point.visitors, point.guards);
    }
    println!();
    println!("Alerts:");
    for alert in analytics::ALERTS {
        println!(
            "  [{:?}] {} — {} ({})",
            alert.level, alert.timestamp, alert.message, alert.location
        );
    }
    println!();
    let mut rng = StdRng::from_entropy();
    let bays = analytics::seed_parking(&mut rng, 20);
    let available = bays
        .iter()
        .filter(|b| b.status == analytics::BayStatus::Available)
        .count();
    println!("Parking: {available}/{} bays available on P1", bays.len());
}

fn cmd_diagnose(config: &Config) -> Result<()> {
    println!("Discovered capture devices:");
    for device in Camera::list_devices() {
        println!("  {}  {} ({})", device.path, device.name, device.driver);
    }
    match Camera::open(&config.camera_device) {
        Ok(camera) => {
            println!(
                "Opened {} at {}x{} ({:?})",
                camera.device_path, camera.width, camera.height, camera.fourcc
            );
            let frame = camera.capture_jpeg()?;
            println!("Captured test frame: {} bytes JPEG", frame.data.len());
        }
        Err(e) => println!("Camera check failed: {e}"),
    }
    Ok(())
}
