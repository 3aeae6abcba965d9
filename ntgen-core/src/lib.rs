mod atomic;
pub use atomic::{atomic_number_from_symbol, symbol_from_atomic_number, UnknownElementError};

mod structure;
pub use structure::{
    Angstrom, Crystal, CrystalBuilder, CrystalValidateError, FracCoord, InvAngstrom, Lattice,
    LatticeReciprocal, Molecule, MoleculeBuilder, MoleculeValidateError, Rad, SiteCartesian,
    SiteFraction, Specie, Volume,
};

pub mod math;
