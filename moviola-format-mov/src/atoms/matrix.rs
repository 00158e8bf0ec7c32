// Moviola
// Copyright (c) 2026 The Moviola Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use moviola_core::errors::Result;
use moviola_core::io::{ReadBytes, WriteBytes};

use crate::atoms::dump_line;
use crate::fp::{Fp2_30, FpI16};

/// A 3x3 transformation matrix, stored row by row as `a b u / c d v / x y w`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Matrix {
    pub a: FpI16,
    pub b: FpI16,
    pub u: Fp2_30,
    pub c: FpI16,
    pub d: FpI16,
    pub v: Fp2_30,
    pub x: FpI16,
    pub y: FpI16,
    pub w: Fp2_30,
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::identity()
    }
}

impl Matrix {
    pub fn identity() -> Self {
        Matrix {
            a: FpI16::new(1),
            b: FpI16::default(),
            u: Fp2_30::default(),
            c: FpI16::default(),
            d: FpI16::new(1),
            v: Fp2_30::default(),
            x: FpI16::default(),
            y: FpI16::default(),
            w: Fp2_30::ONE,
        }
    }

    pub(crate) fn read<B: ReadBytes>(reader: &mut B) -> Result<Self> {
        Ok(Matrix {
            a: FpI16::parse_raw(reader.read_be_i32()?),
            b: FpI16::parse_raw(reader.read_be_i32()?),
            u: Fp2_30::parse_raw(reader.read_be_i32()?),
            c: FpI16::parse_raw(reader.read_be_i32()?),
            d: FpI16::parse_raw(reader.read_be_i32()?),
            v: Fp2_30::parse_raw(reader.read_be_i32()?),
            x: FpI16::parse_raw(reader.read_be_i32()?),
            y: FpI16::parse_raw(reader.read_be_i32()?),
            w: Fp2_30::parse_raw(reader.read_be_i32()?),
        })
    }

    pub(crate) fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        for val in [self.a.raw(), self.b.raw(), self.u.raw()] {
            writer.write_be_i32(val)?;
        }
        for val in [self.c.raw(), self.d.raw(), self.v.raw()] {
            writer.write_be_i32(val)?;
        }
        for val in [self.x.raw(), self.y.raw(), self.w.raw()] {
            writer.write_be_i32(val)?;
        }
        Ok(())
    }

    pub(crate) fn dump(&self, out: &mut dyn fmt::Write, indent: usize) -> fmt::Result {
        dump_line!(out, indent, "matrix")?;
        dump_line!(out, indent + 1, "{} {} {}", self.a, self.b, self.u)?;
        dump_line!(out, indent + 1, "{} {} {}", self.c, self.d, self.v)?;
        dump_line!(out, indent + 1, "{} {} {}", self.x, self.y, self.w)
    }
}

#[cfg(test)]
mod tests {
    use moviola_core::io::BufReader;

    use super::Matrix;
    use crate::fp::{Fp2_30, FpI16};

    #[test]
    fn verify_identity_layout() {
        let mut buf = Vec::new();
        Matrix::identity().write(&mut buf).unwrap();

        assert_eq!(buf.len(), 36);
        assert_eq!(&buf[0..4], &[0x00, 0x01, 0x00, 0x00]);
        assert_eq!(&buf[16..20], &[0x00, 0x01, 0x00, 0x00]);
        assert_eq!(&buf[32..36], &[0x40, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn verify_signed_values() {
        let matrix = Matrix {
            a: FpI16::from_f64(-1.0),
            x: FpI16::from_f64(-320.5),
            v: Fp2_30::from_f64(-0.5),
            ..Matrix::identity()
        };

        let mut buf = Vec::new();
        matrix.write(&mut buf).unwrap();

        assert_eq!(Matrix::read(&mut BufReader::new(&buf)).unwrap(), matrix);
    }
}
