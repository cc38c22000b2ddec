use anyhow::{Context, Result};
use medchat::advice::{AdvicePipeline, OfflineAdvisor};
use medchat::conversation::SessionEvent;
use medchat::hospitals::{format_entry, Coordinates, HospitalFinder};
use medchat::integration::{AssistantConfig, Orchestrator, OrchestratorHandle, CONFIG_PATH_ENV};
use medchat::language::Language;
use medchat::speech::{ConsoleMicrophone, ConsoleSpeechInput, ConsoleSpeechOutput};
use medchat::MedchatError;
use parking_lot::RwLock;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Type your symptoms and press enter. Commands:
  /lang en|hi|mr            switch language (starts a new session)
  /mic                      open or close the microphone
  /say <text>               speak into the open microphone
  /mute, /unmute            read replies aloud or not
  /reset                    start a new session
  /hospitals <lat> <lng> [name]  list nearby hospitals
  /quit";

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medchat=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    info!("Starting medchat symptom assistant");

    let config = load_config()?;
    let (orchestrator, handle) = Orchestrator::new(config.clone())?;
    let notifier = orchestrator.notifier();

    let (input, mic) = ConsoleSpeechInput::new(notifier.clone());
    let output = ConsoleSpeechOutput::new(notifier.clone());

    let (controller_thread, advice_worker) = if config.advice.offline {
        info!("Offline mode: answering with local keyword advice");
        let worker = orchestrator.start(input, output, OfflineAdvisor::new(notifier))?;
        (worker, None)
    } else {
        let pipeline = AdvicePipeline::new(config.advice.clone(), notifier);
        let advice = pipeline.handle();
        let pipeline_thread = pipeline.start_worker()?;
        let worker = orchestrator.start(input, output, advice.clone())?;
        (worker, Some((advice, pipeline_thread)))
    };

    let language = Arc::new(RwLock::new(config.language));
    let printer = spawn_printer(&handle, Arc::clone(&language));

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let finder = HospitalFinder::new(&config.hospitals)?;

    println!("{}", HELP);
    run_repl(&handle, &mic, &language, &runtime, &finder)?;

    handle.shutdown()?;
    if controller_thread.join().is_err() {
        warn!("Orchestrator thread panicked");
    }
    if let Some((advice, pipeline_thread)) = advice_worker {
        advice.shutdown()?;
        if pipeline_thread.join().is_err() {
            warn!("Advice worker panicked");
        }
    }
    if printer.join().is_err() {
        warn!("Printer thread panicked");
    }

    info!("Goodbye");
    Ok(())
}

fn load_config() -> Result<AssistantConfig> {
    let config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => AssistantConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        Err(_) => AssistantConfig::default(),
    };

    Ok(config.with_env_overrides()?)
}

fn spawn_printer(
    handle: &OrchestratorHandle,
    language: Arc<RwLock<Language>>,
) -> thread::JoinHandle<()> {
    let events = handle.event_receiver();

    thread::spawn(move || {
        for event in events.iter() {
            match event {
                SessionEvent::SessionReset { language: lang, .. } => {
                    *language.write() = lang;
                    println!("\n── new session ({}) ──", lang);
                }
                SessionEvent::MessageAppended(message) => {
                    let who = if message.is_user() { "you" } else { "med-ai" };
                    println!("{}> {}", who, message.text());
                }
                SessionEvent::CaptureOpened => {
                    println!("🎤 {}", language.read().phrases().listening);
                }
                SessionEvent::CaptureUnavailable(failure) => {
                    let err = MedchatError::CaptureError(failure.to_string());
                    println!("⚠ {}", err.user_message());
                }
                SessionEvent::Shutdown => break,
                _ => {}
            }
        }
    })
}

fn run_repl(
    handle: &OrchestratorHandle,
    mic: &ConsoleMicrophone,
    language: &RwLock<Language>,
    runtime: &tokio::runtime::Runtime,
    finder: &HospitalFinder,
) -> Result<()> {
    let stdin = io::stdin();
    let mut buf = String::new();

    loop {
        print!("{}", language.read().input_prompt());
        io::stdout().flush()?;

        buf.clear();
        if stdin.lock().read_line(&mut buf)? == 0 {
            break;
        }
        let line = buf.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/lang" => match rest.parse::<Language>() {
                Ok(lang) => handle.change_language(lang)?,
                Err(e) => println!("{}", e),
            },
            "/mic" => handle.toggle_capture()?,
            "/say" => {
                if !mic.speak_line(rest) {
                    println!("The microphone is closed; use /mic first.");
                }
            }
            "/mute" => handle.set_muted(true)?,
            "/unmute" => handle.set_muted(false)?,
            "/reset" => handle.reset()?,
            "/hospitals" => {
                let lang = *language.read();
                show_hospitals(rest, lang, runtime, finder);
            }
            _ if line.is_empty() => {}
            _ if mic.is_listening() => {
                mic.speak_line(line);
            }
            _ => handle.submit(line)?,
        }

        io::stdout().flush()?;
    }

    Ok(())
}

fn show_hospitals(
    args: &str,
    language: Language,
    runtime: &tokio::runtime::Runtime,
    finder: &HospitalFinder,
) {
    let mut parts = args.split_whitespace();
    let origin = match (
        parts.next().and_then(|v| v.parse::<f64>().ok()),
        parts.next().and_then(|v| v.parse::<f64>().ok()),
    ) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
        _ => {
            println!("Usage: /hospitals <lat> <lng> [name]");
            return;
        }
    };
    let term: Vec<&str> = parts.collect();

    println!("{}", language.phrases().locating);
    let mut listing = runtime.block_on(finder.listing(origin));
    if !term.is_empty() {
        listing = listing.filtered(&term.join(" "));
    }

    println!("{}", listing.status(language));
    for record in listing.records() {
        println!("{}", format_entry(record, language));
        if let Ok(url) = record.maps_search_url() {
            println!("   {}", url);
        }
    }
}
