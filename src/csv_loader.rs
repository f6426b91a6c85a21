use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, bail, ensure, Context, Result};
use csv::ReaderBuilder;

use crate::types::{Landmark, PoseFrame, NUM_LANDMARKS};

/// Carga una sesión de pose grabada desde un CSV en el formato
/// sample,landmark,x,y,z ordenado por sample.
/// Los landmarks no listados en un sample quedan ausentes (oclusión).
pub fn load_frames_from_csv(path: impl AsRef<Path>) -> Result<Vec<PoseFrame>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("No se pudo abrir el CSV {:?}", path))?;

    let mut samples: BTreeMap<usize, PoseFrame> = BTreeMap::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("Fila {} inválida en {:?}", row_idx + 1, path))?;
        if record.len() < 5 {
            bail!("La fila {} no tiene 5 columnas", row_idx + 1);
        }

        let sample: usize = record[0]
            .parse()
            .with_context(|| format!("sample inválido en fila {}", row_idx + 1))?;
        let landmark: usize = record[1]
            .parse()
            .with_context(|| format!("landmark inválido en fila {}", row_idx + 1))?;

        if landmark >= NUM_LANDMARKS {
            bail!("Landmark {} fuera de rango (fila {})", landmark, row_idx + 1);
        }

        let x: f32 = record[2].parse()?;
        let y: f32 = record[3].parse()?;
        let z: f32 = record[4].parse()?;

        let frame = samples.entry(sample).or_insert_with(PoseFrame::empty);
        frame.set_raw(landmark, Landmark::new(x, y, z));
    }

    if samples.is_empty() {
        return Err(anyhow!("El CSV {:?} no contiene datos", path));
    }

    let (&min_sample, _) = samples.iter().next().unwrap();
    ensure!(
        min_sample == 0,
        "El CSV debe iniciar en sample=0 (encontrado sample={})",
        min_sample
    );
    let max_sample = *samples.keys().max().unwrap();

    let mut frames = Vec::with_capacity(max_sample + 1);
    for sample_idx in 0..=max_sample {
        match samples.remove(&sample_idx) {
            Some(frame) => frames.push(frame),
            // Hueco en la numeración: frame sin persona detectada
            None => frames.push(PoseFrame::empty()),
        }
    }

    Ok(frames)
}

/// Graba frames de pose a CSV según llegan, para replay posterior
pub struct SessionRecorder {
    file: File,
    sample_idx: usize,
}

impl SessionRecorder {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::create(path)
            .with_context(|| format!("No se pudo crear el CSV de grabación {:?}", path))?;
        writeln!(file, "sample,landmark,x,y,z")?;
        Ok(Self {
            file,
            sample_idx: 0,
        })
    }

    /// Escribe un frame. Los landmarks ausentes no generan filas; un frame
    /// sin persona consume igualmente un número de sample.
    pub fn push(&mut self, frame: &PoseFrame) -> Result<()> {
        for (idx, landmark) in frame.landmarks.iter().enumerate() {
            if let Some(lm) = landmark {
                writeln!(
                    self.file,
                    "{},{},{},{},{}",
                    self.sample_idx, idx, lm.x, lm.y, lm.z
                )?;
            }
        }
        self.sample_idx += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.sample_idx
    }
}
