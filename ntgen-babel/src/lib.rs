/*
Structure file writers.

Two output flavours are supported, dispatched on a format name the same way
a parser would dispatch on a file extension:

- "aims": FHI-aims geometry.in. `lattice_vector x y z` per box vector (only
  for periodic structures), then `atom x y z symbol` per site, cartesian
  coordinates in angstrom.
- "xyz": extxyz. First line the atom count, then a comment line carrying
  `Lattice="ax ay az bx by bz cx cy cz"` (periodic structures only) and
  `Properties=species:S:1:pos:R:3`, then one `symbol x y z` row per atom.

Positions are always written in cartesian angstrom; a Crystal converts out
of its internal fractional representation on the way through.
*/
use std::io::Write;

use ntgen_core::{Crystal, Molecule};

#[derive(Debug)]
pub enum DumpError {
    UnknownFormat { ext: String },
    WriteFailed { source: std::io::Error },
}

impl std::fmt::Display for DumpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DumpError::UnknownFormat { ext } => write!(f, "unknown dump format '{ext}'"),
            DumpError::WriteFailed { source } => write!(f, "writing failed - {source}"),
        }
    }
}

impl std::error::Error for DumpError {}

impl From<std::io::Error> for DumpError {
    fn from(source: std::io::Error) -> Self {
        DumpError::WriteFailed { source }
    }
}

#[derive(Debug)]
pub enum Structure {
    Crystal(Crystal),
    Molecule(Molecule),
}

/// Write `structure` to `w` in the format named by `ext` ("aims" or "xyz").
///
/// # Errors
/// `ext` is not a supported format, or the writer fails.
pub fn dump<W>(structure: &Structure, w: &mut W, ext: &str) -> Result<(), DumpError>
where
    W: Write,
{
    match ext {
        "aims" => dump_aims(structure, w),
        "xyz" => dump_xyz(structure, w),
        _ => Err(DumpError::UnknownFormat {
            ext: ext.to_string(),
        }),
    }
}

fn dump_aims<W>(structure: &Structure, w: &mut W) -> Result<(), DumpError>
where
    W: Write,
{
    if let Structure::Crystal(c) = structure {
        let latt = c.lattice();
        for v in [latt.a(), latt.b(), latt.c()] {
            writeln!(
                w,
                "lattice_vector {:15.9} {:15.9} {:15.9}",
                f64::from(v[0]),
                f64::from(v[1]),
                f64::from(v[2]),
            )?;
        }
    }

    let (positions, species) = match structure {
        Structure::Crystal(c) => (c.positions(), c.species()),
        Structure::Molecule(m) => (m.positions(), m.species()),
    };

    for (pos, sp) in positions.iter().zip(species) {
        writeln!(
            w,
            "atom {:15.9} {:15.9} {:15.9} {}",
            f64::from(pos[0]),
            f64::from(pos[1]),
            f64::from(pos[2]),
            sp.symbol(),
        )?;
    }

    Ok(())
}

fn dump_xyz<W>(structure: &Structure, w: &mut W) -> Result<(), DumpError>
where
    W: Write,
{
    let (positions, species) = match structure {
        Structure::Crystal(c) => (c.positions(), c.species()),
        Structure::Molecule(m) => (m.positions(), m.species()),
    };

    writeln!(w, "{}", positions.len())?;

    if let Structure::Crystal(c) = structure {
        let latt = c.lattice();
        write!(w, "Lattice=\"")?;
        for (i, v) in [latt.a(), latt.b(), latt.c()].iter().enumerate() {
            if i > 0 {
                write!(w, " ")?;
            }
            write!(
                w,
                "{:.9} {:.9} {:.9}",
                f64::from(v[0]),
                f64::from(v[1]),
                f64::from(v[2]),
            )?;
        }
        write!(w, "\" ")?;
    }
    writeln!(w, "Properties=species:S:1:pos:R:3")?;

    for (pos, sp) in positions.iter().zip(species) {
        writeln!(
            w,
            "{} {:15.9} {:15.9} {:15.9}",
            sp.symbol(),
            f64::from(pos[0]),
            f64::from(pos[1]),
            f64::from(pos[2]),
        )?;
    }

    Ok(())
}
