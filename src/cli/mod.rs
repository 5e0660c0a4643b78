use crate::config::Settings;
use crate::midi::MidirEngine;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available MIDI input devices
    #[arg(long)]
    pub device_list: bool,

    /// Record from a specific MIDI input device
    #[arg(long)]
    pub bind_to_device: Option<String>,

    /// Echo incoming notes to a MIDI output device
    #[arg(long)]
    pub echo_to: Option<String>,

    /// Settings file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where saved MusicXML goes; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Beats per measure
    #[arg(long)]
    pub beats: Option<u32>,

    /// Note value that gets one beat (1, 2, 4 or 8)
    #[arg(long)]
    pub beat_type: Option<u32>,

    /// Work title written into the score header
    #[arg(long)]
    pub title: Option<String>,
}

impl Args {
    /// Command-line values win over anything loaded from file or environment.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(beats) = self.beats {
            settings.beats = beats;
        }
        if let Some(beat_type) = self.beat_type {
            settings.beat_type = beat_type;
        }
        if let Some(title) = &self.title {
            settings.title = title.clone();
        }
    }
}

pub fn handle_device_list() -> Vec<String> {
    MidirEngine::list_input_devices()
}

pub fn handle_output_device_list() -> Vec<String> {
    MidirEngine::list_output_devices()
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
