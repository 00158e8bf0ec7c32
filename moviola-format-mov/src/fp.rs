// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-point numbers as stored in QuickTime atoms.
//!
//! Every type keeps the raw stored value so that a value that is read and then written again is
//! bit-exact.

use std::fmt;

/// Unsigned 16.16 fixed-point number.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FpU16(u32);

impl FpU16 {
    pub fn new(val: u16) -> Self {
        Self(u32::from(val) << 16)
    }

    pub fn parse_raw(val: u32) -> Self {
        Self(val)
    }

    pub fn from_f64(val: f64) -> Self {
        Self((val * f64::from(1u32 << 16)).round() as u32)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl From<FpU16> for f64 {
    fn from(fp: FpU16) -> Self {
        f64::from(fp.0) / f64::from(1u32 << 16)
    }
}

/// Signed 16.16 fixed-point number.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FpI16(i32);

impl FpI16 {
    pub fn new(val: i16) -> Self {
        Self(i32::from(val) * 0x1_0000)
    }

    pub fn parse_raw(val: i32) -> Self {
        Self(val)
    }

    pub fn from_f64(val: f64) -> Self {
        Self((val * f64::from(1u32 << 16)).round() as i32)
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

impl From<FpI16> for f64 {
    fn from(fp: FpI16) -> Self {
        f64::from(fp.0) / f64::from(1u32 << 16)
    }
}

/// Unsigned 8.8 fixed-point number.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FpU8(u16);

impl FpU8 {
    pub fn new(val: u8) -> Self {
        Self(u16::from(val) << 8)
    }

    pub fn parse_raw(val: u16) -> Self {
        Self(val)
    }

    pub fn from_f64(val: f64) -> Self {
        Self((val * f64::from(1u16 << 8)).round() as u16)
    }

    pub fn raw(self) -> u16 {
        self.0
    }
}

impl From<FpU8> for f64 {
    fn from(fp: FpU8) -> Self {
        f64::from(fp.0) / f64::from(1u16 << 8)
    }
}

impl From<FpU8> for f32 {
    fn from(fp: FpU8) -> Self {
        f32::from(fp.0) / f32::from(1u16 << 8)
    }
}

/// Signed 8.8 fixed-point number.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FpI8(i16);

impl FpI8 {
    pub fn new(val: i8) -> Self {
        Self(i16::from(val) * 0x100)
    }

    pub fn parse_raw(val: i16) -> Self {
        Self(val)
    }

    pub fn from_f64(val: f64) -> Self {
        Self((val * f64::from(1u16 << 8)).round() as i16)
    }

    pub fn raw(self) -> i16 {
        self.0
    }
}

impl From<FpI8> for f64 {
    fn from(fp: FpI8) -> Self {
        f64::from(fp.0) / f64::from(1u16 << 8)
    }
}

impl From<FpI8> for f32 {
    fn from(fp: FpI8) -> Self {
        f32::from(fp.0) / f32::from(1u16 << 8)
    }
}

/// Signed 2.30 fixed-point number, used by the projective column of a transformation matrix.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Fp2_30(i32);

impl Fp2_30 {
    /// The value 1.0.
    pub const ONE: Fp2_30 = Fp2_30(1 << 30);

    pub fn parse_raw(val: i32) -> Self {
        Self(val)
    }

    pub fn from_f64(val: f64) -> Self {
        Self((val * f64::from(1u32 << 30)).round() as i32)
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

impl From<Fp2_30> for f64 {
    fn from(fp: Fp2_30) -> Self {
        f64::from(fp.0) / f64::from(1u32 << 30)
    }
}

macro_rules! display_as_f64 {
    ($($fp:ty),*) => {
        $(
            impl fmt::Display for $fp {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", f64::from(*self))
                }
            }
        )*
    };
}

display_as_f64!(FpU16, FpI16, FpU8, FpI8, Fp2_30);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_fixed_point_values() {
        assert_eq!(FpU16::new(1).raw(), 0x0001_0000);
        assert_eq!(f64::from(FpU16::parse_raw(0x0001_8000)), 1.5);
        assert_eq!(FpU16::from_f64(72.0), FpU16::new(72));

        assert_eq!(FpI16::from_f64(-1.0).raw(), -0x1_0000);
        assert_eq!(f64::from(FpI16::new(-2)), -2.0);

        assert_eq!(FpU8::new(1).raw(), 0x0100);
        assert_eq!(f32::from(FpU8::parse_raw(0x0080)), 0.5);

        assert_eq!(FpI8::from_f64(-0.5).raw(), -0x80);
        assert_eq!(f64::from(FpI8::new(-1)), -1.0);

        assert_eq!(Fp2_30::ONE.raw(), 0x4000_0000);
        assert_eq!(f64::from(Fp2_30::from_f64(-0.25)), -0.25);
    }

    #[test]
    fn verify_display() {
        assert_eq!(FpU16::new(600).to_string(), "600");
        assert_eq!(FpI8::parse_raw(-0x80).to_string(), "-0.5");
        assert_eq!(Fp2_30::ONE.to_string(), "1");
    }
}
