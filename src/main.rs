use clap::Parser;
use crossbeam::channel::unbounded;
use dialoguer::{theme::ColorfulTheme, Select};
use scorescribe::{
    cli::{handle_device_list, handle_output_device_list, validate_device, Args},
    event_loop::{run_input_pump, EngineControl, EventLoop},
    logging,
    midi::{DefaultMidiEngine, Epoch},
    playback::MidiEcho,
    ui::StatusDisplay,
    RecordingState, ScoreHandle, SessionAction, Settings, TranscriptionEngine,
};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() {
    let args = parse_command_line_arguments();
    let settings = load_settings(&args);
    initialize_logging(&settings);

    let devices = handle_device_list();
    if args.device_list {
        list_available_devices(&devices);
        return;
    }

    let device_name = match &args.bind_to_device {
        Some(name) => {
            exit_on_error(validate_device(name, &devices));
            name.clone()
        }
        None => choose_device(&devices),
    };

    let epoch = Epoch::now();
    let input = match DefaultMidiEngine::open_input(&device_name, epoch) {
        Ok(engine) => {
            log::info!("Successfully connected to MIDI device: {}", device_name);
            println!("Successfully connected to MIDI device: {}", device_name);
            engine
        }
        Err(e) => fail(format!("Error connecting to MIDI device: {}", e)),
    };

    let mut engine = TranscriptionEngine::new(settings);
    if let Some(echo_name) = &args.echo_to {
        attach_echo(&mut engine, echo_name);
    }
    if let Err(e) = engine.arm() {
        fail(format!("Could not arm recording: {}", e));
    }

    let handle = engine.handle();
    let (tx, rx) = unbounded();
    let control = EngineControl::new(tx.clone(), epoch);
    let loop_thread = EventLoop::new(engine, rx).spawn();
    let _pump = run_input_pump(input, tx);

    let running = Arc::new(AtomicBool::new(true));
    let display = StatusDisplay::new(handle.clone()).spawn(running.clone());

    run_session(&control, &handle, args.output.as_deref());

    running.store(false, Ordering::SeqCst);
    if let Err(e) = control.shutdown() {
        log::warn!("Event loop already gone: {}", e);
    }
    if display.join().is_err() {
        log::error!("Status display thread panicked");
    }
    if loop_thread.join().is_err() {
        log::error!("Event loop thread panicked");
    }
    log::info!("Application exiting");
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn load_settings(args: &Args) -> Settings {
    let mut settings = exit_on_error(Settings::load(args.config.as_deref()).map_err(|e| e.to_string()));
    args.apply_to(&mut settings);
    exit_on_error(settings.validate().map_err(|e| e.to_string()));
    settings
}

fn initialize_logging(settings: &Settings) {
    match logging::init_logger(&settings.log_level, settings.log_dir.as_deref()) {
        Ok(path) => log::info!("Application starting, logging to {}", path.display()),
        Err(e) => eprintln!("Logger initialization failed: {}", e),
    }
}

fn list_available_devices(devices: &[String]) {
    println!("Available MIDI devices:");
    for device in devices {
        println!("  - {}", device);
    }
}

fn choose_device(devices: &[String]) -> String {
    if devices.is_empty() {
        fail("No MIDI input devices found".to_string());
    }
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a MIDI input device")
        .items(devices)
        .default(0)
        .interact();
    match selection {
        Ok(index) => devices[index].clone(),
        Err(e) => fail(format!("Device selection failed: {}", e)),
    }
}

fn attach_echo(engine: &mut TranscriptionEngine, echo_name: &str) {
    exit_on_error(validate_device(echo_name, &handle_output_device_list()));
    match DefaultMidiEngine::open_output(echo_name) {
        Ok(output) => {
            let (echo, _thread) = MidiEcho::spawn(output);
            engine.add_sink(Box::new(echo));
        }
        Err(e) => fail(format!("Error connecting to MIDI output: {}", e)),
    }
}

/// Offers one action at a time until the user quits the prompt.
fn run_session(control: &EngineControl, handle: &ScoreHandle, output: Option<&Path>) {
    let mut action = SessionAction::Start;
    loop {
        if action == SessionAction::Start && handle.recording_state() == RecordingState::Recording {
            action = action.next();
        }

        let items = [action.description(), "Quit"];
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Recording is {}", handle.recording_state()))
            .items(&items)
            .default(0)
            .interact();
        match choice {
            Ok(0) => {}
            Ok(_) => break,
            Err(e) => {
                log::error!("Prompt failed: {}", e);
                break;
            }
        }

        match action.command() {
            Some(command) => {
                if control.send(command).is_err() {
                    log::error!("Event loop is gone, ending session");
                    break;
                }
            }
            None => save_score(handle, output),
        }
        action = action.next();
    }
}

fn save_score(handle: &ScoreHandle, output: Option<&Path>) {
    let xml = handle.serialize();
    match output {
        Some(path) => match fs::write(path, xml) {
            Ok(()) => {
                log::info!("Score saved to {}", path.display());
                println!("Score saved to {}", path.display());
            }
            Err(e) => {
                log::error!("Could not write {}: {}", path.display(), e);
                eprintln!("Could not write {}: {}", path.display(), e);
            }
        },
        None => println!("{}", xml),
    }
}

fn exit_on_error<T>(result: Result<T, String>) -> T {
    match result {
        Ok(value) => value,
        Err(error_msg) => fail(error_msg),
    }
}

fn fail(error_msg: String) -> ! {
    log::error!("{}", error_msg);
    eprintln!("{}", error_msg);
    std::process::exit(1);
}
