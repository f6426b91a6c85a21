use std::time::{Duration, Instant};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::types::{ControlKey, GestureLabel};

/// Sumidero de eventos de teclado. Lo implementa la salida HID real y los
/// sinks de prueba/replay.
pub trait KeySink {
    fn press(&mut self, key: ControlKey) -> Result<()>;
    fn release(&mut self, key: ControlKey) -> Result<()>;
    /// Pulsación momentánea (press + release en un solo evento lógico)
    fn tap(&mut self, key: ControlKey) -> Result<()>;
}

/// Tabla estática gesto → tecla
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub tilt_izq: ControlKey,
    pub tilt_der: ControlKey,
    pub jump: ControlKey,
    pub punch: ControlKey,
    pub kick: ControlKey,
}

impl Default for KeyBindings {
    fn default() -> Self {
        // Esquema WASD clásico: A/D direcciones, W salto, C/V golpes
        Self {
            tilt_izq: ControlKey::A,
            tilt_der: ControlKey::D,
            jump: ControlKey::W,
            punch: ControlKey::C,
            kick: ControlKey::V,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionParams {
    /// Margen que sostiene una dirección ante cortes breves de detección
    pub release_delay_secs: f32,
    pub bindings: KeyBindings,
}

impl Default for ActionParams {
    fn default() -> Self {
        Self {
            release_delay_secs: 0.15,
            bindings: KeyBindings::default(),
        }
    }
}

/// Dirección mantenida por la sub-máquina direccional
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldDirection {
    Center,
    Left,
    Right,
}

/// Máquina de estados de acciones.
///
/// Las inclinaciones son teclas mantenidas: un par press/release encierra
/// exactamente cada intervalo de hold, con histéresis para no parpadear
/// ante huecos de detección de un frame. Punch/kick/jump son taps
/// instantáneos independientes del estado direccional.
pub struct ActionDriver {
    params: ActionParams,
    hold: HoldDirection,
    is_holding: bool,
    last_directional_signal: Option<Instant>,
}

impl ActionDriver {
    pub fn new(params: ActionParams) -> Self {
        Self {
            params,
            hold: HoldDirection::Center,
            is_holding: false,
            last_directional_signal: None,
        }
    }

    pub fn hold(&self) -> HoldDirection {
        self.hold
    }

    pub fn is_holding(&self) -> bool {
        self.is_holding
    }

    /// Aplica el gesto de un frame al sink. Devuelve la tecla sobre la que
    /// se actuó (para el feedback en pantalla), si hubo alguna.
    pub fn apply(
        &mut self,
        gesture: GestureLabel,
        now: Instant,
        sink: &mut impl KeySink,
    ) -> Result<Option<ControlKey>> {
        let mut active = None;

        let target = match gesture {
            GestureLabel::TiltIzq => HoldDirection::Left,
            GestureLabel::TiltDer => HoldDirection::Right,
            _ => HoldDirection::Center,
        };

        if target != HoldDirection::Center {
            self.last_directional_signal = Some(now);
        }

        // Histéresis: un hueco más corto que release_delay desde la última
        // señal direccional mantiene la dirección actual en vez de soltarla
        let mut effective = target;
        if target == HoldDirection::Center && self.is_holding {
            if let Some(last) = self.last_directional_signal {
                let delay = Duration::from_secs_f32(self.params.release_delay_secs);
                if now.duration_since(last) < delay {
                    effective = self.hold;
                }
            }
        }

        if effective != self.hold {
            if self.is_holding {
                if let Some(key) = self.direction_key(self.hold) {
                    sink.release(key)?;
                }
                self.is_holding = false;
            }
            if let Some(key) = self.direction_key(effective) {
                sink.press(key)?;
                self.is_holding = true;
                active = Some(key);
            }
            self.hold = effective;
        } else if self.is_holding {
            active = self.direction_key(self.hold);
        }

        // Acciones instantáneas, independientes del hold direccional
        let tap_key = match gesture {
            GestureLabel::Punch => Some(self.params.bindings.punch),
            GestureLabel::Kick => Some(self.params.bindings.kick),
            GestureLabel::Jump => Some(self.params.bindings.jump),
            _ => None,
        };
        if let Some(key) = tap_key {
            sink.tap(key)?;
            active = Some(key);
        }

        Ok(active)
    }

    /// Suelta cualquier dirección mantenida (fin de sesión o de replay)
    pub fn reset(&mut self, sink: &mut impl KeySink) -> Result<()> {
        if self.is_holding {
            if let Some(key) = self.direction_key(self.hold) {
                sink.release(key)?;
            }
        }
        self.hold = HoldDirection::Center;
        self.is_holding = false;
        self.last_directional_signal = None;
        Ok(())
    }

    fn direction_key(&self, dir: HoldDirection) -> Option<ControlKey> {
        match dir {
            HoldDirection::Center => None,
            HoldDirection::Left => Some(self.params.bindings.tilt_izq),
            HoldDirection::Right => Some(self.params.bindings.tilt_der),
        }
    }
}
