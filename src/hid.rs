use std::time::Duration;

use anyhow::{anyhow, Result};
use crossbeam_channel::Sender;
use uinput::device::Device;
use uinput::event::keyboard;

use crate::action::KeySink;
use crate::types::ControlKey;

/// Comando para el hilo de inyección HID
#[derive(Debug, Clone, Copy)]
pub enum KeyCommand {
    Press(ControlKey),
    Release(ControlKey),
    Tap(ControlKey),
}

/// Salida HID virtual sobre /dev/uinput
pub struct HidOutput {
    dev: Device,
}

impl HidOutput {
    pub fn new() -> Result<Self, uinput::Error> {
        let dev = uinput::default()?
            .name("pugil-pose-hid")?
            .event(uinput::event::Keyboard::All)?
            .create()?;

        Ok(HidOutput { dev })
    }

    fn sync(&mut self) -> Result<(), uinput::Error> {
        self.dev.synchronize()
    }

    fn map_key(key: ControlKey) -> keyboard::Key {
        match key {
            ControlKey::A => keyboard::Key::A,
            ControlKey::B => keyboard::Key::B,
            ControlKey::C => keyboard::Key::C,
            ControlKey::D => keyboard::Key::D,
            ControlKey::S => keyboard::Key::S,
            ControlKey::V => keyboard::Key::V,
            ControlKey::W => keyboard::Key::W,
            ControlKey::X => keyboard::Key::X,
            ControlKey::Z => keyboard::Key::Z,
            ControlKey::Space => keyboard::Key::Space,
            ControlKey::Up => keyboard::Key::Up,
            ControlKey::Down => keyboard::Key::Down,
            ControlKey::Left => keyboard::Key::Left,
            ControlKey::Right => keyboard::Key::Right,
        }
    }

    pub fn key_press(&mut self, key: ControlKey) -> Result<(), uinput::Error> {
        self.dev.press(&keyboard::Keyboard::Key(Self::map_key(key)))?;
        self.sync()
    }

    pub fn key_release(&mut self, key: ControlKey) -> Result<(), uinput::Error> {
        self.dev
            .release(&keyboard::Keyboard::Key(Self::map_key(key)))?;
        self.sync()
    }

    pub fn key_tap(&mut self, key: ControlKey) -> Result<(), uinput::Error> {
        let mapped = keyboard::Keyboard::Key(Self::map_key(key));
        self.dev.press(&mapped)?;
        self.sync()?;
        std::thread::sleep(Duration::from_millis(10));
        self.dev.release(&mapped)?;
        self.sync()
    }

    /// Ejecuta un comando recibido del hilo de control
    pub fn run(&mut self, command: KeyCommand) -> Result<(), uinput::Error> {
        match command {
            KeyCommand::Press(key) => self.key_press(key),
            KeyCommand::Release(key) => self.key_release(key),
            KeyCommand::Tap(key) => self.key_tap(key),
        }
    }
}

impl KeySink for HidOutput {
    fn press(&mut self, key: ControlKey) -> Result<()> {
        self.key_press(key).map_err(|e| anyhow!("uinput: {}", e))
    }

    fn release(&mut self, key: ControlKey) -> Result<()> {
        self.key_release(key).map_err(|e| anyhow!("uinput: {}", e))
    }

    fn tap(&mut self, key: ControlKey) -> Result<()> {
        self.key_tap(key).map_err(|e| anyhow!("uinput: {}", e))
    }
}

/// Sink que encola comandos hacia el hilo HID por un canal crossbeam
pub struct ChannelSink {
    tx: Sender<KeyCommand>,
}

impl ChannelSink {
    pub fn new(tx: Sender<KeyCommand>) -> Self {
        Self { tx }
    }
}

impl KeySink for ChannelSink {
    fn press(&mut self, key: ControlKey) -> Result<()> {
        self.tx
            .send(KeyCommand::Press(key))
            .map_err(|_| anyhow!("El hilo HID terminó"))
    }

    fn release(&mut self, key: ControlKey) -> Result<()> {
        self.tx
            .send(KeyCommand::Release(key))
            .map_err(|_| anyhow!("El hilo HID terminó"))
    }

    fn tap(&mut self, key: ControlKey) -> Result<()> {
        self.tx
            .send(KeyCommand::Tap(key))
            .map_err(|_| anyhow!("El hilo HID terminó"))
    }
}
