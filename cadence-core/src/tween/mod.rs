//! Interpolation
//!
//! Tweening writes intermediate signal values at increasing progress
//! fractions in `[0, 1]`. A signal may carry an explicit interpolation
//! function; when it does not, the [`Lerp`] trait supplies the structural
//! fallback: numeric leaves interpolate linearly, composites interpolate
//! member-wise.

mod easing;

pub use easing::{
    ease_in_cubic, ease_in_out_cubic, ease_in_out_sine, ease_out_cubic, linear, EasingFn,
};

use std::sync::Arc;

/// Interpolation function: `(from, to, progress) -> value`.
///
/// Progress is always in `[0, 1]`; implementations must return `from` at 0
/// and `to` at 1 exactly.
pub type Interpolation<T> = Arc<dyn Fn(&T, &T, f64) -> T + Send + Sync>;

/// Structural interpolation fallback.
pub trait Lerp: Clone {
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        from + (to - from) * progress
    }
}

impl Lerp for f32 {
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        from + (to - from) * progress as f32
    }
}

macro_rules! lerp_int_impl {
    ($($ty:ty),*) => {$(
        impl Lerp for $ty {
            fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
                let value = *from as f64 + (*to as f64 - *from as f64) * progress;
                value.round() as $ty
            }
        }
    )*};
}

lerp_int_impl!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

// Discrete values step at the midpoint.
impl Lerp for bool {
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        if progress < 0.5 {
            *from
        } else {
            *to
        }
    }
}

impl<A: Lerp, B: Lerp> Lerp for (A, B) {
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        (
            A::lerp(&from.0, &to.0, progress),
            B::lerp(&from.1, &to.1, progress),
        )
    }
}

impl<T: Lerp, const N: usize> Lerp for [T; N] {
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        std::array::from_fn(|i| T::lerp(&from[i], &to[i], progress))
    }
}

// Member-wise over matching prefixes; a length mismatch steps discretely.
impl<T: Lerp> Lerp for Vec<T> {
    fn lerp(from: &Self, to: &Self, progress: f64) -> Self {
        if from.len() != to.len() {
            return if progress < 0.5 {
                from.clone()
            } else {
                to.clone()
            };
        }
        from.iter()
            .zip(to.iter())
            .map(|(a, b)| T::lerp(a, b, progress))
            .collect()
    }
}

/// The default interpolation for any `Lerp` type, as an [`Interpolation`].
pub fn lerp_interpolation<T: Lerp + Send + Sync + 'static>() -> Interpolation<T> {
    Arc::new(|from, to, progress| T::lerp(from, to, progress))
}
