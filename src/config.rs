use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::action::ActionParams;
use crate::recognizer::RecognizerParams;

/// Configuración completa del controlador: umbrales del reconocedor,
/// histéresis de la máquina de acciones y tabla de bindings.
/// Todos los campos tienen default, el JSON solo necesita los overrides.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub recognizer: RecognizerParams,
    pub action: ActionParams,
}

impl ControllerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer la configuración {:?}", path))?;
        let config: ControllerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Configuración inválida en {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("Configuración inválida en {:?}", path))?;
        Ok(config)
    }

    /// Rechaza valores que romperían el bucle por frame: las duraciones se
    /// convierten con `Duration::from_secs_f32`, que no admite negativos
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.recognizer.strike_cooldown_secs >= 0.0,
            "strike_cooldown_secs no puede ser negativo (valor: {})",
            self.recognizer.strike_cooldown_secs
        );
        ensure!(
            self.action.release_delay_secs >= 0.0,
            "release_delay_secs no puede ser negativo (valor: {})",
            self.action.release_delay_secs
        );
        Ok(())
    }
}
