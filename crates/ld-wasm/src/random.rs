//! Browser randomness

use ld_draw::RandomSource;

/// `Math.random()`; keeps getrandom out of the wasm build
#[derive(Debug, Clone, Copy, Default)]
pub struct MathRandom;

impl RandomSource for MathRandom {
    fn next_f64(&mut self) -> f64 {
        js_sys::Math::random()
    }
}
