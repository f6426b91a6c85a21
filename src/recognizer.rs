use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::geometry::{self, GeometryError};
use crate::types::{GestureLabel, Landmark, LandmarkIndex, PoseFrame};

/// Umbrales del reconocedor. Los defaults son los valores convergidos
/// tras la calibración manual frente a la cámara.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerParams {
    /// Ángulo mínimo del codo para considerar el brazo extendido (grados)
    pub punch_angle_deg: f32,
    /// Desplazamiento mínimo de la muñeca entre frames (coords normalizadas)
    pub punch_velocity: f32,
    /// Tiempo mínimo entre strikes aceptados (segundos)
    pub strike_cooldown_secs: f32,
    /// Cuánto deben subir los hombros sobre el baseline para un salto
    pub jump_sensitivity: f32,
    /// Diferencia de altura entre hombros para detectar inclinación
    pub tilt_sensitivity: f32,
}

impl Default for RecognizerParams {
    fn default() -> Self {
        Self {
            punch_angle_deg: 130.0,
            punch_velocity: 0.05,
            strike_cooldown_secs: 0.5,
            jump_sensitivity: 0.15,
            tilt_sensitivity: 0.18,
        }
    }
}

/// Lado del cuerpo para la detección de strikes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Izq,
    Der,
}

impl Side {
    fn joints(self) -> (LandmarkIndex, LandmarkIndex, LandmarkIndex) {
        match self {
            Side::Izq => (
                LandmarkIndex::LeftShoulder,
                LandmarkIndex::LeftElbow,
                LandmarkIndex::LeftWrist,
            ),
            Side::Der => (
                LandmarkIndex::RightShoulder,
                LandmarkIndex::RightElbow,
                LandmarkIndex::RightWrist,
            ),
        }
    }

    fn index(self) -> usize {
        match self {
            Side::Izq => 0,
            Side::Der => 1,
        }
    }
}

/// Reconocedor de gestos con memoria entre frames.
///
/// Mantiene la última posición de cada muñeca (para la velocidad), el
/// baseline de altura de hombros (para el salto) y el instante del último
/// strike aceptado (para el cooldown). Una instancia por sesión; se muta
/// exactamente una vez por frame desde `recognize`.
pub struct GestureRecognizer {
    params: RecognizerParams,
    prev_wrist: [Option<Landmark>; 2],
    baseline_shoulder_y: Option<f32>,
    last_strike: Option<Instant>,
}

impl GestureRecognizer {
    pub fn new(params: RecognizerParams) -> Self {
        Self {
            params,
            prev_wrist: [None, None],
            baseline_shoulder_y: None,
            last_strike: None,
        }
    }

    /// Baseline latcheado de altura de hombros, si ya hubo un frame válido
    pub fn baseline_shoulder_y(&self) -> Option<f32> {
        self.baseline_shoulder_y
    }

    /// Clasifica un frame. Total: siempre devuelve exactamente una etiqueta,
    /// incluso con el frame vacío. `now` es el reloj monotónico leído una
    /// vez por frame por el caller.
    ///
    /// Prioridad fija: strike izquierdo, strike derecho, salto, inclinación.
    /// Un strike detectado pero suprimido por cooldown cae a los chequeos
    /// posturales, no corta la evaluación.
    pub fn recognize(&mut self, frame: &PoseFrame, now: Instant) -> GestureLabel {
        // Ambos lados se evalúan siempre, para que la memoria de muñecas
        // avance frame a frame aunque solo un lado esté golpeando
        let strike_izq = self.detect_strike(frame, Side::Izq);
        let strike_der = self.detect_strike(frame, Side::Der);

        let cooldown = Duration::from_secs_f32(self.params.strike_cooldown_secs);
        let cooldown_ok = self
            .last_strike
            .map_or(true, |t| now.duration_since(t) > cooldown);

        if cooldown_ok {
            // Mapeo lado → etiqueta del esquema de control: izquierda
            // golpea (punch), derecha patea (kick)
            if strike_izq {
                self.last_strike = Some(now);
                return GestureLabel::Punch;
            }
            if strike_der {
                self.last_strike = Some(now);
                return GestureLabel::Kick;
            }
        }

        self.recognize_posture(frame)
    }

    /// Strike = brazo sustancialmente extendido + muñeca en movimiento rápido.
    /// Landmark ausente o geometría degenerada cuentan como "sin strike".
    fn detect_strike(&mut self, frame: &PoseFrame, side: Side) -> bool {
        self.try_detect_strike(frame, side).unwrap_or(false)
    }

    fn try_detect_strike(&mut self, frame: &PoseFrame, side: Side) -> Result<bool, GeometryError> {
        let (s_idx, e_idx, w_idx) = side.joints();

        // La muñeca se lee y se guarda antes que el resto del brazo: aunque
        // el hombro o el codo estén ocluidos, la memoria avanza igual y la
        // velocidad sigue siendo frame-a-frame, nunca contra un frame más
        // antiguo
        let wrist = geometry::coords(frame, w_idx)?;
        let prev = self.prev_wrist[side.index()];
        self.prev_wrist[side.index()] = Some(wrist);

        let shoulder = geometry::coords(frame, s_idx)?;
        let elbow = geometry::coords(frame, e_idx)?;

        let angle = geometry::joint_angle(shoulder, elbow, wrist)?;
        let vel = geometry::velocity(wrist, prev);

        Ok(angle > self.params.punch_angle_deg && vel > self.params.punch_velocity)
    }

    fn recognize_posture(&mut self, frame: &PoseFrame) -> GestureLabel {
        let (Some(l_sh), Some(r_sh)) = (
            frame.get(LandmarkIndex::LeftShoulder),
            frame.get(LandmarkIndex::RightShoulder),
        ) else {
            return GestureLabel::None;
        };

        let avg_y = (l_sh.y + r_sh.y) / 2.0;

        // El baseline se fija una sola vez con el primer frame válido y no
        // se recalcula nunca, aunque la persona cambie de postura
        let baseline = *self.baseline_shoulder_y.get_or_insert(avg_y);

        // En coordenadas de imagen y crece hacia abajo: subir = y menor
        if baseline - avg_y > self.params.jump_sensitivity {
            return GestureLabel::Jump;
        }

        if r_sh.y - l_sh.y > self.params.tilt_sensitivity {
            GestureLabel::TiltIzq
        } else if l_sh.y - r_sh.y > self.params.tilt_sensitivity {
            GestureLabel::TiltDer
        } else {
            GestureLabel::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frame de pie con hombros nivelados y brazos flexionados
    fn standing_frame() -> PoseFrame {
        let mut frame = PoseFrame::empty();
        frame.set(LandmarkIndex::LeftShoulder, Landmark::new(0.4, 0.5, 0.0));
        frame.set(LandmarkIndex::RightShoulder, Landmark::new(0.6, 0.5, 0.0));
        frame.set(LandmarkIndex::LeftElbow, Landmark::new(0.35, 0.6, 0.0));
        frame.set(LandmarkIndex::LeftWrist, Landmark::new(0.4, 0.7, 0.0));
        frame.set(LandmarkIndex::RightElbow, Landmark::new(0.65, 0.6, 0.0));
        frame.set(LandmarkIndex::RightWrist, Landmark::new(0.6, 0.7, 0.0));
        frame
    }

    /// Frame con el brazo izquierdo extendido y la muñeca en `wrist_x`
    fn extended_left_arm(wrist_x: f32) -> PoseFrame {
        let mut frame = standing_frame();
        frame.set(LandmarkIndex::LeftShoulder, Landmark::new(0.2, 0.5, 0.0));
        frame.set(LandmarkIndex::LeftElbow, Landmark::new(0.45, 0.5, 0.0));
        frame.set(LandmarkIndex::LeftWrist, Landmark::new(wrist_x, 0.5, 0.0));
        frame
    }

    fn extended_right_arm(wrist_x: f32) -> PoseFrame {
        let mut frame = standing_frame();
        frame.set(LandmarkIndex::RightShoulder, Landmark::new(0.8, 0.5, 0.0));
        frame.set(LandmarkIndex::RightElbow, Landmark::new(0.55, 0.5, 0.0));
        frame.set(LandmarkIndex::RightWrist, Landmark::new(wrist_x, 0.5, 0.0));
        frame
    }

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn frame_vacio_devuelve_centro() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let label = rec.recognize(&PoseFrame::empty(), Instant::now());
        assert_eq!(label, GestureLabel::None);
    }

    #[test]
    fn oclusion_del_hombro_no_congela_la_memoria_de_muneca() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let t0 = Instant::now();

        rec.recognize(&extended_left_arm(0.60), t0);

        // El hombro izquierdo desaparece unos frames mientras la muñeca
        // deriva lento, por debajo del umbral de velocidad
        for (i, wrist_x) in [0.63, 0.66, 0.69].iter().enumerate() {
            let mut occluded = extended_left_arm(*wrist_x);
            occluded.landmarks[LandmarkIndex::LeftShoulder.idx()] = None;
            let label = rec.recognize(&occluded, t0 + secs(0.03 * (i + 1) as f32));
            assert_eq!(label, GestureLabel::None);
        }

        // Al recuperar el hombro la velocidad debe ser contra el frame
        // anterior (0.03), no contra la última lectura completa (0.12)
        let label = rec.recognize(&extended_left_arm(0.72), t0 + secs(0.12));
        assert_eq!(label, GestureLabel::None);
    }

    #[test]
    fn geometria_degenerada_no_es_strike() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let t0 = Instant::now();

        // Codo coincidente con el hombro (glitch del detector), muñeca rápida
        let mut glitched = standing_frame();
        glitched.set(LandmarkIndex::LeftShoulder, Landmark::new(0.4, 0.5, 0.0));
        glitched.set(LandmarkIndex::LeftElbow, Landmark::new(0.4, 0.5, 0.0));
        glitched.set(LandmarkIndex::LeftWrist, Landmark::new(0.6, 0.5, 0.0));
        assert_eq!(rec.recognize(&glitched, t0), GestureLabel::None);

        let mut glitched2 = glitched.clone();
        glitched2.set(LandmarkIndex::LeftWrist, Landmark::new(0.8, 0.5, 0.0));
        assert_eq!(rec.recognize(&glitched2, t0 + secs(0.03)), GestureLabel::None);
    }

    #[test]
    fn brazo_extendido_sin_velocidad_no_es_strike() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let t0 = Instant::now();
        let frame = extended_left_arm(0.7);
        assert_eq!(rec.recognize(&frame, t0), GestureLabel::None);
        // Mismo frame otra vez: ángulo ~180° pero velocidad 0
        assert_eq!(rec.recognize(&frame, t0 + secs(0.03)), GestureLabel::None);
    }

    #[test]
    fn muneca_rapida_con_brazo_extendido_es_punch() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let t0 = Instant::now();
        rec.recognize(&extended_left_arm(0.7), t0);
        let label = rec.recognize(&extended_left_arm(0.8), t0 + secs(0.03));
        assert_eq!(label, GestureLabel::Punch);
    }

    #[test]
    fn lado_derecho_produce_kick() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let t0 = Instant::now();
        rec.recognize(&extended_right_arm(0.3), t0);
        let label = rec.recognize(&extended_right_arm(0.2), t0 + secs(0.03));
        assert_eq!(label, GestureLabel::Kick);
    }

    #[test]
    fn cooldown_suprime_el_segundo_strike() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let t0 = Instant::now();
        rec.recognize(&extended_left_arm(0.6), t0);
        assert_eq!(
            rec.recognize(&extended_left_arm(0.7), t0 + secs(0.03)),
            GestureLabel::Punch
        );
        // Sigue moviéndose dentro del cooldown: cae a postura neutra
        assert_eq!(
            rec.recognize(&extended_left_arm(0.8), t0 + secs(0.06)),
            GestureLabel::None
        );
        // Pasado el cooldown vuelve a aceptar strikes
        assert_eq!(
            rec.recognize(&extended_left_arm(0.9), t0 + secs(0.63)),
            GestureLabel::Punch
        );
    }

    #[test]
    fn el_strike_tiene_prioridad_sobre_la_inclinacion() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let t0 = Instant::now();

        // Frame que cumple strike izquierdo e inclinación a la vez
        let mut tilted = extended_left_arm(0.7);
        tilted.set(LandmarkIndex::RightShoulder, Landmark::new(0.8, 0.75, 0.0));
        rec.recognize(&tilted, t0);

        let mut tilted2 = extended_left_arm(0.8);
        tilted2.set(LandmarkIndex::RightShoulder, Landmark::new(0.8, 0.75, 0.0));
        assert_eq!(rec.recognize(&tilted2, t0 + secs(0.03)), GestureLabel::Punch);
    }

    #[test]
    fn hombro_derecho_bajo_es_tilt_izquierda() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let t0 = Instant::now();

        // Baseline con hombros a 0.5
        assert_eq!(rec.recognize(&standing_frame(), t0), GestureLabel::None);

        let mut tilted = standing_frame();
        tilted.set(LandmarkIndex::RightShoulder, Landmark::new(0.6, 0.7, 0.0));
        assert_eq!(
            rec.recognize(&tilted, t0 + secs(0.03)),
            GestureLabel::TiltIzq
        );

        let mut tilted_der = standing_frame();
        tilted_der.set(LandmarkIndex::LeftShoulder, Landmark::new(0.4, 0.7, 0.0));
        assert_eq!(
            rec.recognize(&tilted_der, t0 + secs(0.06)),
            GestureLabel::TiltDer
        );
    }

    #[test]
    fn subir_sobre_el_baseline_es_salto() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let t0 = Instant::now();
        rec.recognize(&standing_frame(), t0);

        let mut airborne = standing_frame();
        airborne.set(LandmarkIndex::LeftShoulder, Landmark::new(0.4, 0.3, 0.0));
        airborne.set(LandmarkIndex::RightShoulder, Landmark::new(0.6, 0.3, 0.0));
        assert_eq!(rec.recognize(&airborne, t0 + secs(0.03)), GestureLabel::Jump);
    }

    #[test]
    fn el_baseline_se_fija_una_sola_vez() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let t0 = Instant::now();
        rec.recognize(&standing_frame(), t0);
        assert_eq!(rec.baseline_shoulder_y(), Some(0.5));

        // Agacharse no mueve el baseline
        let mut crouched = standing_frame();
        crouched.set(LandmarkIndex::LeftShoulder, Landmark::new(0.4, 0.8, 0.0));
        crouched.set(LandmarkIndex::RightShoulder, Landmark::new(0.6, 0.8, 0.0));
        rec.recognize(&crouched, t0 + secs(0.03));
        rec.recognize(&crouched, t0 + secs(0.06));
        assert_eq!(rec.baseline_shoulder_y(), Some(0.5));
    }

    #[test]
    fn sin_hombros_no_se_fija_baseline() {
        let mut rec = GestureRecognizer::new(RecognizerParams::default());
        let t0 = Instant::now();

        let mut no_shoulders = PoseFrame::empty();
        no_shoulders.set(LandmarkIndex::LeftWrist, Landmark::new(0.4, 0.7, 0.0));
        assert_eq!(rec.recognize(&no_shoulders, t0), GestureLabel::None);
        assert_eq!(rec.baseline_shoulder_y(), None);
    }
}
