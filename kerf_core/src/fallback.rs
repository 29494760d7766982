//! Data-free parameter formulas, used when no usable experiment pool exists.
//!
//! Deterministic per-process linear models over thickness, with
//! per-material base/multiplier constants. Unrecognized materials silently
//! take the generic constants, never an error.

use crate::record::{ProcessKind, ProcessParams, clamp_passes, clamp_power_pct, clamp_speed};

/// (base power %, power multiplier per mm)
fn cutting_power_base(material: &str) -> (f32, f32) {
    match material {
        "ahşap" | "ahsap" | "wood" => (65.0, 3.0),
        "mdf" => (70.0, 3.5),
        "plexiglass" | "akrilik" | "acrylic" => (55.0, 2.5),
        "karton" | "cardboard" => (35.0, 2.0),
        "deri" | "leather" => (40.0, 1.5),
        _ => (70.0, 3.0),
    }
}

/// (base speed, speed multiplier per mm)
fn cutting_speed_base(material: &str) -> (f32, f32) {
    match material {
        "ahşap" | "ahsap" | "wood" => (320.0, 18.0),
        "mdf" => (300.0, 20.0),
        "plexiglass" | "akrilik" | "acrylic" => (380.0, 25.0),
        "karton" | "cardboard" => (450.0, 15.0),
        "deri" | "leather" => (400.0, 12.0),
        _ => (300.0, 20.0),
    }
}

/// Compute parameters for one process from material and thickness alone.
pub fn predict_static(material: &str, thickness_mm: f32, process: ProcessKind) -> ProcessParams {
    let material = material.trim().to_lowercase();
    let (power, speed, passes) = match process {
        ProcessKind::Cutting => {
            let (base_power, power_mult) = cutting_power_base(&material);
            let (base_speed, speed_mult) = cutting_speed_base(&material);
            (
                base_power + thickness_mm * power_mult,
                base_speed - thickness_mm * speed_mult,
                (thickness_mm / 4.0) as i64,
            )
        }
        ProcessKind::Engraving => (
            40.0 + thickness_mm * 2.0,
            500.0 - thickness_mm * 15.0,
            1,
        ),
        ProcessKind::Scoring => (
            55.0 + thickness_mm * 2.5,
            400.0 - thickness_mm * 18.0,
            1,
        ),
    };

    ProcessParams {
        power_pct: (clamp_power_pct(power) * 10.0).round() / 10.0,
        speed: clamp_speed(speed).round(),
        passes: clamp_passes(passes),
    }
}
