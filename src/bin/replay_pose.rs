use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use pugil::action::{ActionDriver, KeySink};
use pugil::config::ControllerConfig;
use pugil::csv_loader::load_frames_from_csv;
use pugil::geometry;
use pugil::recognizer::GestureRecognizer;
use pugil::types::{ControlKey, GestureLabel, LandmarkIndex, FRAME_RATE};

struct ReplayOptions {
    dump_angles: bool,
}

fn parse_args() -> Result<(PathBuf, ReplayOptions)> {
    let mut dump_angles = false;
    let mut csv_path: Option<PathBuf> = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--dump-angles" => dump_angles = true,
            _ => {
                if csv_path.is_some() {
                    bail!("Uso: replay_pose [--dump-angles] <sesion.csv>");
                }
                csv_path = Some(PathBuf::from(arg));
            }
        }
    }

    let csv_path = csv_path.ok_or_else(|| anyhow!("Debes especificar un archivo CSV"))?;
    Ok((csv_path, ReplayOptions { dump_angles }))
}

/// Sink que imprime los eventos en vez de inyectarlos por uinput
#[derive(Default)]
struct PrintSink;

impl KeySink for PrintSink {
    fn press(&mut self, key: ControlKey) -> Result<()> {
        println!("  ⌨️  press   {:?}", key);
        Ok(())
    }

    fn release(&mut self, key: ControlKey) -> Result<()> {
        println!("  ⌨️  release {:?}", key);
        Ok(())
    }

    fn tap(&mut self, key: ControlKey) -> Result<()> {
        println!("  ⌨️  tap     {:?}", key);
        Ok(())
    }
}

fn dump_elbow_angles(frame: &pugil::types::PoseFrame, idx: usize) {
    let izq = geometry::coords(frame, LandmarkIndex::LeftShoulder)
        .and_then(|s| {
            let e = geometry::coords(frame, LandmarkIndex::LeftElbow)?;
            let w = geometry::coords(frame, LandmarkIndex::LeftWrist)?;
            geometry::joint_angle(s, e, w)
        });
    let der = geometry::coords(frame, LandmarkIndex::RightShoulder)
        .and_then(|s| {
            let e = geometry::coords(frame, LandmarkIndex::RightElbow)?;
            let w = geometry::coords(frame, LandmarkIndex::RightWrist)?;
            geometry::joint_angle(s, e, w)
        });

    let fmt = |angle: Result<f32, geometry::GeometryError>| match angle {
        Ok(a) => format!("{:>6.1}°", a),
        Err(_) => "   ---".to_string(),
    };
    println!("  {:04} codo izq {}  codo der {}", idx, fmt(izq), fmt(der));
}

fn main() -> Result<()> {
    let (csv_path, opts) = parse_args()?;
    println!("🎞️  Reproduciendo sesión de pose desde {:?}", csv_path);

    let frames = load_frames_from_csv(&csv_path)?;
    println!("📄 {} frames cargados\n", frames.len());

    let config = ControllerConfig::default();
    let mut recognizer = GestureRecognizer::new(config.recognizer);
    let mut driver = ActionDriver::new(config.action);
    let mut sink = PrintSink::default();

    // Reloj simulado a la cadencia nominal de la cámara
    let start = Instant::now();
    let mut last_gesture = GestureLabel::None;
    let mut counts: HashMap<GestureLabel, usize> = HashMap::new();

    for (idx, frame) in frames.iter().enumerate() {
        let now = start + Duration::from_secs_f32(idx as f32 / FRAME_RATE);

        if opts.dump_angles {
            dump_elbow_angles(frame, idx);
        }

        let gesture = recognizer.recognize(frame, now);
        *counts.entry(gesture).or_insert(0) += 1;
        driver.apply(gesture, now, &mut sink)?;

        if gesture != last_gesture {
            println!("  🎮 frame {:04}: {}", idx, gesture);
            last_gesture = gesture;
        }
    }

    driver.reset(&mut sink)?;

    println!("\nResumen de gestos:");
    let mut summary: Vec<(GestureLabel, usize)> = counts.into_iter().collect();
    summary.sort_by(|a, b| b.1.cmp(&a.1));
    for (gesture, count) in summary {
        println!("  {:<16} {:>5} frames", gesture.to_string(), count);
    }

    Ok(())
}
