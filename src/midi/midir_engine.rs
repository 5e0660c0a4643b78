use crate::midi::{Epoch, MidiEngine, MidiError, NoteEvent, RawMessage, Result};
use crossbeam::channel::{unbounded, Receiver};
use log::{debug, info};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

const CLIENT_NAME: &str = "scorescribe";

pub struct MidirEngine {
    #[allow(dead_code)]
    input: Option<MidiInputConnection<()>>,
    output: Option<MidiOutputConnection>,
    rx: Option<Receiver<RawMessage>>,
}

impl MidirEngine {
    /// Connects to the first input port whose name contains `device_name`.
    /// Messages are stamped against `epoch` as they arrive.
    pub fn open_input(device_name: &str, epoch: Epoch) -> Result<Self> {
        let mut midi_in = MidiInput::new(&format!("{}-in", CLIENT_NAME))
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
        midi_in.ignore(Ignore::None);

        let in_ports = midi_in.ports();
        let in_port = in_ports
            .iter()
            .find(|p| {
                midi_in
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(device_name)
            })
            .ok_or_else(|| {
                MidiError::ConnectionError(format!("input device '{}' not found", device_name))
            })?;
        let port_name = midi_in
            .port_name(in_port)
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        let (tx, rx) = unbounded();
        let input = midi_in
            .connect(
                in_port,
                &format!("{}-input", CLIENT_NAME),
                move |_stamp, message, _| {
                    let _ = tx.send(RawMessage::new(message.to_vec(), epoch.stamp()));
                },
                (),
            )
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
        info!("Listening on MIDI input port: {}", port_name);

        Ok(MidirEngine {
            input: Some(input),
            output: None,
            rx: Some(rx),
        })
    }

    /// Connects to the first output port whose name contains `device_name`.
    pub fn open_output(device_name: &str) -> Result<Self> {
        let midi_out = MidiOutput::new(&format!("{}-out", CLIENT_NAME))
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        let out_ports = midi_out.ports();
        let out_port = out_ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(device_name)
            })
            .ok_or_else(|| {
                MidiError::ConnectionError(format!("output device '{}' not found", device_name))
            })?;
        let output = midi_out
            .connect(out_port, &format!("{}-output", CLIENT_NAME))
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
        info!("Echoing notes to MIDI output device: {}", device_name);

        Ok(MidirEngine {
            input: None,
            output: Some(output),
            rx: None,
        })
    }

    pub fn list_input_devices() -> Vec<String> {
        match MidiInput::new(&format!("{}-list", CLIENT_NAME)) {
            Ok(midi_in) => midi_in
                .ports()
                .iter()
                .filter_map(|p| midi_in.port_name(p).ok())
                .collect(),
            Err(e) => {
                debug!("Could not enumerate MIDI inputs: {}", e);
                Vec::new()
            }
        }
    }

    pub fn list_output_devices() -> Vec<String> {
        match MidiOutput::new(&format!("{}-list", CLIENT_NAME)) {
            Ok(midi_out) => midi_out
                .ports()
                .iter()
                .filter_map(|p| midi_out.port_name(p).ok())
                .collect(),
            Err(e) => {
                debug!("Could not enumerate MIDI outputs: {}", e);
                Vec::new()
            }
        }
    }
}

impl MidiEngine for MidirEngine {
    fn send(&mut self, event: &NoteEvent) -> Result<()> {
        if let Some(output) = &mut self.output {
            output
                .send(&event.to_bytes())
                .map_err(|e| MidiError::SendError(e.to_string()))?;
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<RawMessage> {
        match &self.rx {
            Some(rx) => rx.recv().map_err(|_| MidiError::Disconnected),
            None => Err(MidiError::RecvError("No input connection".to_string())),
        }
    }

    fn list_devices(&self) -> Vec<String> {
        if self.output.is_some() {
            Self::list_output_devices()
        } else {
            Self::list_input_devices()
        }
    }
}
