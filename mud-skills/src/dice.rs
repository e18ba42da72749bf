//! Dice rolling for skill resolution.
//!
//! Every roll in the engine has the shape `count` dice of `faces` sides plus a
//! flat `bonus`. Face counts are frequently derived from proficiency
//! (`train_level / 10`), so they may be fractional; a fractional face count is
//! floored before drawing. A roll with no dice (count or faces below one)
//! yields just the bonus.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of randomness for skill checks.
///
/// Implementors only supply single draws; [`RandomSource::roll`] builds the
/// summed roll on top so every implementation shares the same arithmetic.
pub trait RandomSource: Send {
    /// Draw one die, uniformly in `[1, faces]`. `faces` is always at least 1.
    fn draw(&mut self, faces: u32) -> u32;

    /// Sum `count` draws of a `faces`-sided die, plus `bonus`.
    fn roll(&mut self, count: i32, faces: f64, bonus: i32) -> i32 {
        let faces = whole_faces(faces);
        if count <= 0 || faces == 0 {
            return bonus;
        }

        (0..count).fold(bonus, |total, _| {
            let face = i32::try_from(self.draw(faces)).unwrap_or(i32::MAX);
            total.saturating_add(face)
        })
    }

    /// Percentile roll, `[1, 100]`.
    fn percentile(&mut self) -> i32 {
        self.roll(1, 100.0, 0)
    }
}

/// Floor a face count to a whole number of sides. Non-finite or sub-one
/// values mean "no die".
pub fn whole_faces(faces: f64) -> u32 {
    if !faces.is_finite() || faces < 1.0 {
        0
    } else if faces >= u32::MAX as f64 {
        u32::MAX
    } else {
        faces.floor() as u32
    }
}

/// Smallest and largest totals a roll can produce.
pub fn roll_bounds(count: i32, faces: f64, bonus: i32) -> (i32, i32) {
    let faces = whole_faces(faces);
    if count <= 0 || faces == 0 {
        return (bonus, bonus);
    }
    let faces = i32::try_from(faces).unwrap_or(i32::MAX);
    (
        bonus.saturating_add(count),
        bonus.saturating_add(count.saturating_mul(faces)),
    )
}

/// A [`RandomSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDice<R> {
    rng: R,
}

impl<R: Rng + Send> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDice<StdRng> {
    /// Dice seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible dice (useful for replays and testing).
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl Default for RngDice<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng + Send> RandomSource for RngDice<R> {
    fn draw(&mut self, faces: u32) -> u32 {
        self.rng.gen_range(1..=faces.max(1))
    }
}
