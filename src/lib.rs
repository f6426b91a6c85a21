//! Pugil: reconocimiento de gestos corporales → eventos de teclado.
//!
//! Pipeline por frame: landmarks → geometría → clasificador con memoria →
//! máquina de estados de acciones → inyección HID.

pub mod action;
pub mod config;
pub mod csv_loader;
pub mod geometry;
pub mod hid;
pub mod recognizer;
pub mod types;
