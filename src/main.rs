/*
Pugil - Controlador de juego por pose corporal

Convierte el stream de landmarks de un estimador de pose externo en
eventos de teclado vía /dev/uinput:
1. Recibe frames de pose como JSON Lines (stdin o archivo)
2. Clasifica gestos con GestureRecognizer (strikes, salto, inclinación)
3. ActionDriver traduce gestos a press/release/tap con histéresis
4. Un hilo HID inyecta las teclas por uinput

El estimador de pose corre como proceso aparte y emite un objeto JSON por
frame ({"landmarks": [...]}) o "null" cuando no hay persona:

    python pose_bridge.py | ./target/release/pugil -

Para debug con teclado (reproduce CSVs grabados por tecla):
    sg input -c './target/debug/pugil'
*/

use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use crossbeam_channel::unbounded;

use pugil::action::{ActionDriver, KeySink};
use pugil::config::ControllerConfig;
use pugil::csv_loader::{load_frames_from_csv, SessionRecorder};
use pugil::hid::{ChannelSink, HidOutput, KeyCommand};
use pugil::recognizer::GestureRecognizer;
use pugil::types::{GestureLabel, PoseFrame, FRAME_RATE};

struct CliOptions {
    config: Option<PathBuf>,
    record: Option<PathBuf>,
    stream: Option<PathBuf>,
}

fn parse_args() -> Result<CliOptions> {
    let mut config = None;
    let mut record = None;
    let mut stream = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requiere una ruta"))?;
                config = Some(PathBuf::from(path));
            }
            "--record" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--record requiere una ruta"))?;
                record = Some(PathBuf::from(path));
            }
            _ => {
                if stream.is_some() {
                    bail!("Uso: pugil [--config cfg.json] [--record sesion.csv] [stream.jsonl | -]");
                }
                stream = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(CliOptions {
        config,
        record,
        stream,
    })
}

fn main() -> Result<()> {
    println!("🥊 Pugil - Controlador de juego por pose corporal\n");

    let opts = parse_args()?;

    let config = match &opts.config {
        Some(path) => {
            let cfg = ControllerConfig::from_file(path)?;
            println!("⚙️  Configuración cargada desde {:?}", path);
            cfg
        }
        None => ControllerConfig::default(),
    };

    match &opts.stream {
        None => {
            println!("🔧 Modo: DEBUG - Teclado Interactivo\n");
            debug_mode(config)
        }
        Some(source) => {
            println!("🔧 Modo: Stream de pose en tiempo real\n");
            stream_mode(config, source, opts.record.as_deref())
        }
    }
}

/// Lanza el hilo que ejecuta los comandos de teclado sobre uinput
fn spawn_hid_thread() -> crossbeam_channel::Sender<KeyCommand> {
    let (tx, rx) = unbounded::<KeyCommand>();

    std::thread::spawn(move || {
        let mut hid = match HidOutput::new() {
            Ok(h) => {
                println!("✅ HID inicializado (/dev/uinput)");
                h
            }
            Err(e) => {
                eprintln!("❌ No se pudo inicializar HID: {}", e);
                return;
            }
        };

        while let Ok(command) = rx.recv() {
            if let Err(e) = hid.run(command) {
                eprintln!("❌ Error enviando tecla {:?}: {}", command, e);
            }
        }
    });

    tx
}

fn stream_mode(
    config: ControllerConfig,
    source: &std::path::Path,
    record: Option<&std::path::Path>,
) -> Result<()> {
    let reader: Box<dyn BufRead> = if source.as_os_str() == "-" {
        println!("📥 Leyendo frames de pose desde stdin");
        Box::new(BufReader::new(io::stdin()))
    } else {
        println!("📥 Leyendo frames de pose desde {:?}", source);
        Box::new(BufReader::new(File::open(source)?))
    };

    let mut recorder = match record {
        Some(path) => {
            println!("💾 Grabando sesión en {:?}", path);
            Some(SessionRecorder::new(path)?)
        }
        None => None,
    };

    let tx = spawn_hid_thread();
    let mut sink = ChannelSink::new(tx);

    let mut recognizer = GestureRecognizer::new(config.recognizer);
    let mut driver = ActionDriver::new(config.action);
    let mut last_gesture = GestureLabel::None;

    println!("🎬 Controlador activo. Fin de stream para salir.\n");

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        // "null" = frame sin persona detectada; sigue pasando por la
        // máquina de acciones para que los holds se suelten a tiempo
        let frame = match serde_json::from_str::<Option<PoseFrame>>(&line) {
            Ok(parsed) => parsed.unwrap_or_else(PoseFrame::empty),
            Err(e) => {
                eprintln!("❌ Frame inválido en línea {}: {}", line_idx + 1, e);
                continue;
            }
        };

        let now = Instant::now();
        let gesture = recognizer.recognize(&frame, now);
        let active = driver.apply(gesture, now, &mut sink)?;

        if gesture != last_gesture {
            match active {
                Some(key) => println!("🎮 {} → tecla {:?}", gesture, key),
                None => println!("🎮 {}", gesture),
            }
            last_gesture = gesture;
        }

        if let Some(rec) = recorder.as_mut() {
            rec.push(&frame)?;
        }
    }

    // Fin del stream: soltar cualquier dirección que quedara presionada
    driver.reset(&mut sink)?;

    if let Some(rec) = recorder.as_ref() {
        println!("💾 Sesión grabada: {} frames", rec.frames_written());
    }
    println!("👋 Stream finalizado");
    Ok(())
}

/// Reproduce una sesión grabada contra el reconocedor y el sink dados,
/// respetando la cadencia nominal de la cámara
fn run_frames(
    frames: &[PoseFrame],
    recognizer: &mut GestureRecognizer,
    driver: &mut ActionDriver,
    sink: &mut impl KeySink,
) -> Result<()> {
    let mut last_gesture = GestureLabel::None;

    for frame in frames {
        let now = Instant::now();
        let gesture = recognizer.recognize(frame, now);
        let active = driver.apply(gesture, now, sink)?;

        if gesture != last_gesture {
            match active {
                Some(key) => println!("  🎮 {} → tecla {:?}", gesture, key),
                None => println!("  🎮 {}", gesture),
            }
            last_gesture = gesture;
        }

        std::thread::sleep(Duration::from_secs_f32(1.0 / FRAME_RATE));
    }

    driver.reset(sink)
}

/// Modo DEBUG: lee teclas y reproduce sesiones de pose grabadas
fn debug_mode(config: ControllerConfig) -> Result<()> {
    use evdev::{Device, InputEventKind, Key};
    use std::fs;

    println!("🔍 Buscando teclado...");

    let mut keyboard_device: Option<Device> = None;

    for entry in fs::read_dir("/dev/input")? {
        if let Ok(entry) = entry {
            let path = entry.path();
            if let Some(name) = path.file_name() {
                if name.to_string_lossy().starts_with("event") {
                    if let Ok(device) = Device::open(&path) {
                        if let Some(dev_name) = device.name() {
                            let dev_name_lc = dev_name.to_lowercase();
                            if dev_name_lc.contains("keyboard")
                                || dev_name_lc.contains("at translated")
                            {
                                println!(
                                    "✅ Teclado encontrado: {} ({})",
                                    dev_name,
                                    path.display()
                                );
                                keyboard_device = Some(device);
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    let mut device = keyboard_device.ok_or_else(|| {
        anyhow!("No se encontró ningún dispositivo de teclado en /dev/input")
    })?;

    println!("✅ Captura de teclado global activada\n");

    let tx = spawn_hid_thread();
    let mut sink = ChannelSink::new(tx);
    let mut recognizer = GestureRecognizer::new(config.recognizer);
    let mut driver = ActionDriver::new(config.action);

    println!("Presiona teclas para reproducir sesiones grabadas:");
    println!("  p → poses/punch");
    println!("  k → poses/kick");
    println!("  j → poses/jump");
    println!("  l → poses/tilt-izquierda");
    println!("  r → poses/tilt-derecha");
    println!("  q → salir\n");

    let key_to_folder: std::collections::HashMap<Key, (&str, &str)> = [
        (Key::KEY_P, ("poses/punch", "p")),
        (Key::KEY_K, ("poses/kick", "k")),
        (Key::KEY_J, ("poses/jump", "j")),
        (Key::KEY_L, ("poses/tilt-izquierda", "l")),
        (Key::KEY_R, ("poses/tilt-derecha", "r")),
    ]
    .iter()
    .cloned()
    .collect();

    println!("🎧 Escuchando teclas globales...\n");

    loop {
        for ev in device.fetch_events()? {
            if let InputEventKind::Key(key) = ev.kind() {
                if ev.value() == 1 {
                    if key == Key::KEY_Q {
                        println!("\n👋 Saliendo...");
                        driver.reset(&mut sink)?;
                        return Ok(());
                    }

                    if let Some((folder_name, key_char)) = key_to_folder.get(&key) {
                        println!("\n🔑 Tecla presionada: '{}'", key_char);
                        println!("📂 Buscando CSV en: {}/", folder_name);

                        let folder_path = PathBuf::from(folder_name);

                        if !folder_path.exists() {
                            eprintln!("❌ Carpeta no existe: {}", folder_name);
                            continue;
                        }

                        let csv_files: Vec<PathBuf> = fs::read_dir(&folder_path)?
                            .filter_map(|entry| entry.ok())
                            .map(|entry| entry.path())
                            .filter(|path| {
                                path.extension()
                                    .and_then(|ext| ext.to_str())
                                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                                    .unwrap_or(false)
                            })
                            .collect();

                        if csv_files.is_empty() {
                            eprintln!("❌ No hay archivos CSV en {}", folder_name);
                            continue;
                        }

                        use rand::Rng;
                        let random_idx = rand::thread_rng().gen_range(0..csv_files.len());
                        let csv_path = &csv_files[random_idx];
                        let file_name = csv_path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown.csv");

                        println!("📄 Archivo: {}", file_name);

                        match load_frames_from_csv(csv_path) {
                            Ok(frames) => {
                                println!("🎞️  Reproduciendo {} frames", frames.len());
                                if let Err(e) =
                                    run_frames(&frames, &mut recognizer, &mut driver, &mut sink)
                                {
                                    eprintln!("❌ Error reproduciendo sesión: {}", e);
                                }
                            }
                            Err(e) => {
                                eprintln!("❌ Error cargando CSV: {}", e);
                            }
                        }
                    }
                }
            }
        }

        std::thread::sleep(Duration::from_millis(10));
    }
}
