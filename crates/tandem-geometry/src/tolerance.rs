use cgmath::AbsDiffEq;
use std::fmt::Debug;

pub const TOLERANCE: f64 = 1.0e-6;

pub trait Tolerance: AbsDiffEq<Epsilon = f64> + Debug {
    fn near(&self, other: &Self) -> bool {
        self.abs_diff_eq(other, TOLERANCE)
    }

    fn near_within(&self, other: &Self, epsilon: f64) -> bool {
        self.abs_diff_eq(other, epsilon)
    }
}

impl<T: AbsDiffEq<Epsilon = f64> + Debug> Tolerance for T {}

#[macro_export]
macro_rules! assert_near {
    ($left: expr, $right: expr $(,)?) => {{
        let (left, right) = ($left, $right);
        assert!(
            $crate::tolerance::Tolerance::near(&left, &right),
            "assertion failed: `left` is near `right`\nleft: {left:?},\nright: {right:?}",
        )
    }};
    ($left: expr, $right: expr, eps = $eps: expr $(,)?) => {{
        let (left, right) = ($left, $right);
        assert!(
            $crate::tolerance::Tolerance::near_within(&left, &right, $eps),
            "assertion failed: `left` is within {} of `right`\nleft: {left:?},\nright: {right:?}",
            $eps,
        )
    }};
}
