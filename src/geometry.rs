use thiserror::Error;

use crate::types::{Landmark, LandmarkIndex, PoseFrame};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Landmark {0:?} ausente en el frame")]
    MissingJoint(LandmarkIndex),

    #[error("Geometría degenerada: segmento de longitud cero")]
    DegenerateGeometry,
}

/// Extrae las coordenadas de un landmark, fallando si está ocluido
pub fn coords(frame: &PoseFrame, index: LandmarkIndex) -> Result<Landmark, GeometryError> {
    frame.get(index).ok_or(GeometryError::MissingJoint(index))
}

/// Ángulo en grados en el vértice `b`, formado por los rayos b→a y b→c.
/// El coseno se recorta a [-1, 1] antes del arccos para evitar que el
/// redondeo flotante lo saque del dominio.
pub fn joint_angle(a: Landmark, b: Landmark, c: Landmark) -> Result<f32, GeometryError> {
    let ba = (a.x - b.x, a.y - b.y, a.z - b.z);
    let bc = (c.x - b.x, c.y - b.y, c.z - b.z);

    let norm_ba = (ba.0 * ba.0 + ba.1 * ba.1 + ba.2 * ba.2).sqrt();
    let norm_bc = (bc.0 * bc.0 + bc.1 * bc.1 + bc.2 * bc.2).sqrt();

    if norm_ba < 1e-6 || norm_bc < 1e-6 {
        return Err(GeometryError::DegenerateGeometry);
    }

    let dot = ba.0 * bc.0 + ba.1 * bc.1 + ba.2 * bc.2;
    let cosine = (dot / (norm_ba * norm_bc)).clamp(-1.0, 1.0);

    Ok(cosine.acos().to_degrees())
}

/// Distancia euclídea entre dos landmarks
pub fn distance(p: Landmark, q: Landmark) -> f32 {
    let dx = p.x - q.x;
    let dy = p.y - q.y;
    let dz = p.z - q.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Desplazamiento frame-a-frame de un landmark.
/// Sin posición previa (primer frame) la velocidad es 0, no "desconocida".
pub fn velocity(current: Landmark, previous: Option<Landmark>) -> f32 {
    match previous {
        Some(prev) => distance(current, prev),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brazo_recto_da_180_grados() {
        let shoulder = Landmark::new(0.0, 0.0, 0.0);
        let elbow = Landmark::new(0.5, 0.0, 0.0);
        let wrist = Landmark::new(1.0, 0.0, 0.0);
        let angle = joint_angle(shoulder, elbow, wrist).unwrap();
        assert!((angle - 180.0).abs() < 0.5);
    }

    #[test]
    fn brazo_flexionado_da_90_grados() {
        let shoulder = Landmark::new(0.0, 0.0, 0.0);
        let elbow = Landmark::new(0.5, 0.0, 0.0);
        let wrist = Landmark::new(0.5, 0.5, 0.0);
        let angle = joint_angle(shoulder, elbow, wrist).unwrap();
        assert!((angle - 90.0).abs() < 0.5);
    }

    #[test]
    fn puntos_coincidentes_son_degenerados() {
        let p = Landmark::new(0.3, 0.3, 0.0);
        let q = Landmark::new(0.7, 0.1, 0.0);
        assert_eq!(joint_angle(p, p, q), Err(GeometryError::DegenerateGeometry));
    }

    #[test]
    fn coords_falla_con_landmark_ausente() {
        let frame = PoseFrame::empty();
        assert_eq!(
            coords(&frame, LandmarkIndex::LeftWrist),
            Err(GeometryError::MissingJoint(LandmarkIndex::LeftWrist))
        );
    }

    #[test]
    fn velocidad_sin_posicion_previa_es_cero() {
        let wrist = Landmark::new(0.5, 0.5, 0.1);
        assert_eq!(velocity(wrist, None), 0.0);
    }

    #[test]
    fn velocidad_es_distancia_frame_a_frame() {
        let prev = Landmark::new(0.5, 0.5, 0.0);
        let curr = Landmark::new(0.5, 0.4, 0.0);
        let v = velocity(curr, Some(prev));
        assert!((v - 0.1).abs() < 1e-6);
    }
}
