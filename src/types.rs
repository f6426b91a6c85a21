use serde::{Deserialize, Serialize};

/// Número de landmarks del esqueleto (topología MediaPipe Pose)
pub const NUM_LANDMARKS: usize = 33;

/// Tasa nominal de frames de la cámara (Hz)
pub const FRAME_RATE: f32 = 30.0;

/// Un punto del cuerpo en coordenadas normalizadas de imagen.
/// x, y en rango ~[0, 1]; z es profundidad relativa a la cadera.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Índices con nombre de la topología del esqueleto.
/// Los valores numéricos corresponden al modelo de 33 puntos de MediaPipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkIndex {
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
}

impl LandmarkIndex {
    pub fn idx(self) -> usize {
        self as usize
    }
}

/// Frame de detección: los 33 landmarks de una pasada del estimador.
/// Un landmark ausente (oclusión) se representa como `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoseFrame {
    pub landmarks: Vec<Option<Landmark>>,
}

impl PoseFrame {
    /// Frame sin persona detectada (todos los landmarks ausentes)
    pub fn empty() -> Self {
        Self {
            landmarks: Vec::new(),
        }
    }

    pub fn get(&self, index: LandmarkIndex) -> Option<Landmark> {
        self.landmarks.get(index.idx()).copied().flatten()
    }

    pub fn set(&mut self, index: LandmarkIndex, landmark: Landmark) {
        self.set_raw(index.idx(), landmark);
    }

    pub fn set_raw(&mut self, index: usize, landmark: Landmark) {
        if self.landmarks.len() < NUM_LANDMARKS {
            self.landmarks.resize(NUM_LANDMARKS, None);
        }
        self.landmarks[index] = Some(landmark);
    }
}

/// Vocabulario cerrado de gestos: cada frame produce exactamente una etiqueta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureLabel {
    #[default]
    None,
    Punch,
    Kick,
    Jump,
    TiltIzq,
    TiltDer,
}

impl std::fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GestureLabel::None => "centro",
            GestureLabel::Punch => "punch",
            GestureLabel::Kick => "kick",
            GestureLabel::Jump => "jump",
            GestureLabel::TiltIzq => "tilt-izquierda",
            GestureLabel::TiltDer => "tilt-derecha",
        };
        write!(f, "{}", name)
    }
}

/// Teclas que el controlador puede inyectar vía uinput
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKey {
    A,
    B,
    C,
    D,
    S,
    V,
    W,
    X,
    Z,
    Space,
    Up,
    Down,
    Left,
    Right,
}
