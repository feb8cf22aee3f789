use core::{
    ops::{Add, AddAssign, Sub},
    time::Duration,
};

/// Unsigned microseconds since the start of a file
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UMicros(u64);

impl UMicros {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates a new instance of microseconds
    #[inline]
    pub const fn new(microseconds: u64) -> Self {
        Self(microseconds)
    }

    /// Returns the microseconds as a u64
    #[inline]
    pub const fn us(&self) -> u64 {
        self.0
    }

    /// ms -> us
    #[inline]
    pub const fn from_ms(ms: u64) -> Self {
        Self(ms * 1_000)
    }

    /// Returns seconds
    #[inline]
    pub const fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000.
    }

    /// Returns the span as a [`Duration`]
    #[inline]
    pub const fn as_duration(&self) -> Duration {
        Duration::from_micros(self.0)
    }

    /// Returns no time if I am less than other.
    pub const fn saturating_sub(&self, other: Self) -> UMicros {
        if self.0 < other.0 {
            UMicros(0)
        } else {
            UMicros(self.0 - other.0)
        }
    }
}

impl Add for UMicros {
    type Output = UMicros;
    fn add(self, rhs: Self) -> Self::Output {
        UMicros(self.0 + rhs.0)
    }
}

impl AddAssign for UMicros {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for UMicros {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        UMicros(self.0 - rhs.0)
    }
}

impl From<UMicros> for Duration {
    fn from(value: UMicros) -> Self {
        value.as_duration()
    }
}

#[test]
fn micros_arithmetic() {
    use pretty_assertions::assert_eq;
    let a = UMicros::from_ms(1_500);
    let b = UMicros::new(500_000);
    assert_eq!((a - b).us(), 1_000_000);
    assert_eq!(b.saturating_sub(a), UMicros::ZERO);
    assert_eq!((a + b).as_secs_f64(), 2.0);
    assert_eq!(Duration::from(a), Duration::from_millis(1_500));
}
