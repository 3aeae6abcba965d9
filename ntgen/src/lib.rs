/* Single-wall nanotube generator.
 *
 * Rolls one translational cell of a graphene sheet onto a cylinder from the
 * chiral indices (n, m). For the notation (chiral vector Ch, translation
 * vector T, the gcd based dR rule) see
 * http://www.photon.t.u-tokyo.ac.jp/~maruyama/kataura/chirality.html
 */

use tracing::{debug, warn};

use ntgen_core::math::{Vector2, Vector3};
use ntgen_core::{
    atomic_number, Angstrom, Crystal, CrystalBuilder, Lattice, MoleculeBuilder, SiteCartesian,
};

/// Default atom-atom bond distance, the C-C distance of graphene in angstrom.
pub const BOND_LENGTH_GRAPHENE: Angstrom = Angstrom(1.421);

/// Tolerance of the half-open unit interval test selecting one cell of
/// lattice points: the lower boundary is kept, its periodic image at the
/// upper boundary is not.
const PROJ_TOL: f64 = 1e-10;

/// Padding of the periodic box around the tube, in units of the diameter.
const VACUUM: f64 = 4.0;

#[derive(Debug)]
pub enum NanotubeError {
    /// Both chiral indices are zero, no tube is defined.
    InvalidChirality,
    /// Bond length must be positive.
    InvalidBondLength { value: f64 },
    /// Exactly two species are needed, one per graphene sublattice.
    InvalidSpeciesCount { count: usize },
    /// The dR rule guarantees exact division for valid (n, m); hitting this
    /// means an internal invariant is broken.
    ArithmeticInconsistency { numerator: i64, divisor: i64 },
}

impl std::fmt::Display for NanotubeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NanotubeError::InvalidChirality => {
                write!(f, "chiral indices (0, 0) do not define a nanotube")
            }
            NanotubeError::InvalidBondLength { value } => {
                write!(f, "bond length must be positive, got {value}")
            }
            NanotubeError::InvalidSpeciesCount { count } => {
                write!(f, "expected a pair of species for the two sublattices, got {count}")
            }
            NanotubeError::ArithmeticInconsistency { numerator, divisor } => {
                write!(
                    f,
                    "translation index {numerator}/{divisor} is not an integer, the dR rule is broken"
                )
            }
        }
    }
}

impl std::error::Error for NanotubeError {}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

fn exact_div(numerator: i64, divisor: i64) -> Result<i64, NanotubeError> {
    if numerator % divisor != 0 {
        return Err(NanotubeError::ArithmeticInconsistency { numerator, divisor });
    }
    Ok(numerator / divisor)
}

/// Integer coefficients (t1, t2) of the translation vector T = t1 a1 + t2 a2,
/// the shortest graphene lattice vector orthogonal to the chiral vector.
///
/// t1 = (2m + n) / dR and t2 = -(2n + m) / dR with dR = 3d when 3d divides
/// (n - m), else d, where d = gcd(n, m). Both divisions are exact for every
/// valid (n, m); this is checked rather than floored so a broken invariant
/// surfaces instead of silently producing a skewed cell.
fn translation_indices(n: u32, m: u32) -> Result<(i64, i64), NanotubeError> {
    let d = i64::from(gcd(n, m));
    let (n, m) = (i64::from(n), i64::from(m));

    let d_r = if (n - m) % (3 * d) == 0 { 3 * d } else { d };
    let t1 = exact_div(2 * m + n, d_r)?;
    let t2 = -exact_div(2 * n + m, d_r)?;

    Ok((t1, t2))
}

/// Builds the periodic unit cell of a single-wall nanotube.
///
/// The tube axis is z; the periodic box leaves vacuum around the tube in x
/// and y and repeats with the translation period along z.
///
/// # Examples
///
/// ```
/// use ntgen::NanotubeBuilder;
///
/// let tube = NanotubeBuilder::new(6, 6).build().unwrap();
/// assert_eq!(tube.natoms(), 24);
/// ```
#[derive(Debug, Clone)]
pub struct NanotubeBuilder {
    n: u32,
    m: u32,
    repeat: usize,
    target_length: Option<Angstrom>,
    bond_length: Angstrom,
    species: Vec<u8>,
    centered: bool,
}

impl NanotubeBuilder {
    #[must_use]
    pub fn new(n: u32, m: u32) -> Self {
        NanotubeBuilder {
            n,
            m,
            repeat: 1,
            target_length: None,
            bond_length: BOND_LENGTH_GRAPHENE,
            species: vec![atomic_number!(C), atomic_number!(C)],
            centered: false,
        }
    }

    /// Number of translational cells stacked along the tube axis.
    #[must_use]
    pub fn with_repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat;
        self
    }

    /// Minimum tube length; overrides the repeat count with
    /// ceil(length / |T|) so the produced tube is at least this long.
    #[must_use]
    pub fn with_target_length(mut self, length: Angstrom) -> Self {
        self.target_length = Some(length);
        self
    }

    #[must_use]
    pub fn with_bond_length(mut self, bond_length: Angstrom) -> Self {
        self.bond_length = bond_length;
        self
    }

    /// Atomic numbers for the two graphene sublattices, e.g. (B, N) for a
    /// boron nitride tube. Anything but exactly two species fails `build`.
    #[must_use]
    pub fn with_species<I>(mut self, species: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        self.species = species.into_iter().collect();
        self
    }

    /// Shift the tube so it sits centered in the periodic box in x and y.
    #[must_use]
    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    /// Generate the tube.
    ///
    /// Deterministic: atom order follows the lattice point enumeration
    /// (i1, i2), then the sublattice, then the axial repeat index.
    ///
    /// # Errors
    /// Input validation per [`NanotubeError`]; no error can occur once atom
    /// generation has started.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn build(&self) -> Result<Crystal, NanotubeError> {
        if self.n == 0 && self.m == 0 {
            return Err(NanotubeError::InvalidChirality);
        }
        let a = f64::from(self.bond_length);
        if a <= 0.0 {
            return Err(NanotubeError::InvalidBondLength { value: a });
        }
        if self.species.len() != 2 {
            return Err(NanotubeError::InvalidSpeciesCount {
                count: self.species.len(),
            });
        }

        let (t1, t2) = translation_indices(self.n, self.m)?;
        debug!(t1, t2, "translation vector indices");

        // graphene lattice vectors, bond along -y from the first basis atom
        let a1 = Vector2([f64::sqrt(3.0) * a, 0.0]);
        let a2 = Vector2([f64::sqrt(3.0) / 2.0 * a, -1.5 * a]);

        let (n, m) = (i64::from(self.n), i64::from(self.m));
        let ch = (n as f64) * a1 + (m as f64) * a2;
        let t = (t1 as f64) * a1 + (t2 as f64) * a2;
        let t_norm = t.norm();

        let repeat = match self.target_length {
            Some(length) => {
                let length = f64::from(length);
                if length < t_norm {
                    warn!("target length {length} below one translation period {t_norm}");
                }
                (length / t_norm).ceil() as usize
            }
            None => self.repeat,
        };
        debug!(repeat, t_norm, "axial repetition");

        // projections normalized so one fundamental cell maps onto [0, 1)^2
        let ch_proj = (1.0 / ch.dot(&ch)) * ch;
        let t_proj = (1.0 / t.dot(&t)) * t;

        let basis = [Vector2([0.0, 0.0]), (1.0 / 3.0) * (a1 + a2)];
        let diameter = ch.norm() / std::f64::consts::PI;

        let mut sites: Vec<SiteCartesian> = Vec::new();
        for i1 in 0..=(n + t1) {
            for i2 in t2..=m {
                let shift = (i1 as f64) * a1 + (i2 as f64) * a2;
                for (&specie, &offset) in self.species.iter().zip(basis.iter()) {
                    let pt = offset + shift;
                    let u = pt.dot(&ch_proj);
                    let v = pt.dot(&t_proj);
                    if !(in_unit_interval(u) && in_unit_interval(v)) {
                        continue;
                    }
                    // wrap onto the cylinder; u is invariant under the axial
                    // repeat since Ch and T are orthogonal
                    let phi = 2.0 * std::f64::consts::PI * u;
                    for k in 0..repeat {
                        let z = (v + k as f64) * t_norm;
                        let position = Vector3([
                            Angstrom(diameter / 2.0 * phi.cos()),
                            Angstrom(diameter / 2.0 * phi.sin()),
                            Angstrom(z),
                        ]);
                        sites.push(SiteCartesian::new(position, specie));
                    }
                }
            }
        }

        let molecule = MoleculeBuilder::new().with_sites(sites).build_uncheck();
        let molecule = if self.centered {
            let half_box = diameter * (VACUUM + 1.0) / 2.0;
            molecule.shifted(Vector3([
                Angstrom(half_box),
                Angstrom(half_box),
                Angstrom(0.0),
            ]))
        } else {
            molecule
        };

        let box_xy = (VACUUM + 1.0) * diameter;
        let lattice = Lattice::from_angstroms([
            [box_xy, 0.0, 0.0],
            [0.0, box_xy, 0.0],
            [0.0, 0.0, (repeat as f64) * t_norm],
        ]);

        Ok(CrystalBuilder::new()
            .with_lattice(&lattice)
            .with_cart_sites(molecule.into_sites())
            .build_uncheck())
    }
}

/// Half-open unit interval test with the boundary tolerance: a point sitting
/// on the lower cell boundary counts, its periodic image at the upper
/// boundary does not.
fn in_unit_interval(x: f64) -> bool {
    -PROJ_TOL < x && x < 1.0 - PROJ_TOL
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use ntgen_core::atomic_number;

    use super::*;

    macro_rules! assert_eq_approx {
        ($a:expr, $b:expr) => {{
            assert_eq_approx!($a, $b, 1e-12)
        }};
        ($a:expr, $b:expr, $tol:expr) => {{
            let (left, right) = ($a, $b);
            if (left - right).abs() > $tol {
                panic!(
                    "assertion failed: `{} ≈ {}`, diff:  `{}`, tol: `{}`",
                    left,
                    right,
                    (left - right).abs(),
                    $tol
                );
            }
        }};
    }

    #[test]
    fn translation_indices_known_tubes() {
        // zigzag, armchair, and two chiral tubes with negative t2 beyond -n
        assert_eq!(translation_indices(6, 0).unwrap(), (1, -2));
        assert_eq!(translation_indices(6, 6).unwrap(), (1, -1));
        assert_eq!(translation_indices(6, 3).unwrap(), (4, -5));
        assert_eq!(translation_indices(4, 2).unwrap(), (4, -5));
        assert_eq!(translation_indices(7, 4).unwrap(), (5, -6));
    }

    #[test]
    fn exact_div_rejects_remainder() {
        assert_eq!(exact_div(6, 3).unwrap(), 2);
        assert!(matches!(
            exact_div(7, 3),
            Err(NanotubeError::ArithmeticInconsistency {
                numerator: 7,
                divisor: 3
            })
        ));
    }

    #[test]
    fn atom_count_per_cell() {
        // 4 (n^2 + n m + m^2) / dR atoms in one translational cell
        for (n, m, natoms) in [
            (6, 0, 24),
            (5, 0, 20),
            (6, 6, 24),
            (4, 4, 16),
            (6, 3, 84),
            (4, 2, 56),
        ] {
            let tube = NanotubeBuilder::new(n, m).build().unwrap();
            assert_eq!(tube.natoms(), natoms, "atom count of ({n}, {m})");
        }
    }

    #[test]
    fn armchair_diameter() {
        // |Ch| = |n (a1 + a2)| = 3 n a for an armchair tube
        let tube = NanotubeBuilder::new(6, 6).build().unwrap();
        let diameter = 3.0 * 6.0 * f64::from(BOND_LENGTH_GRAPHENE) / std::f64::consts::PI;

        let (a, b, _, _, _, _) = tube.lattice().lattice_params();
        assert_eq_approx!(f64::from(a), (VACUUM + 1.0) * diameter, 1e-9);
        assert_eq_approx!(f64::from(b), (VACUUM + 1.0) * diameter, 1e-9);

        // every atom sits on the cylinder surface
        for pos in tube.positions() {
            let r = f64::hypot(f64::from(pos[0]), f64::from(pos[1]));
            assert_eq_approx!(r, diameter / 2.0, 1e-8);
        }
    }

    #[test]
    fn box_is_orthorhombic() {
        let tube = NanotubeBuilder::new(6, 3).build().unwrap();
        let (_, _, _, alpha, beta, gamma) = tube.lattice().lattice_params();
        for angle in [alpha, beta, gamma] {
            assert_eq_approx!(f64::from(angle), std::f64::consts::FRAC_PI_2);
        }
    }

    #[test]
    fn axial_period_and_volume() {
        // |T| of an armchair tube is sqrt(3) a
        let a = f64::from(BOND_LENGTH_GRAPHENE);
        let tube = NanotubeBuilder::new(6, 6).build().unwrap();

        let c = tube.lattice().c();
        assert_eq_approx!(f64::from(c[2]), f64::sqrt(3.0) * a, 1e-9);

        let diameter = 18.0 * a / std::f64::consts::PI;
        let box_xy = (VACUUM + 1.0) * diameter;
        assert_eq_approx!(
            f64::from(tube.volume()),
            box_xy * box_xy * f64::sqrt(3.0) * a,
            1e-6
        );
    }

    #[test]
    fn deterministic() {
        let first = NanotubeBuilder::new(6, 3).build().unwrap();
        let second = NanotubeBuilder::new(6, 3).build().unwrap();

        assert_eq!(first.natoms(), second.natoms());
        for (p, q) in first.positions().iter().zip(second.positions()) {
            assert_eq!(*p, q);
        }
    }

    #[test]
    fn bond_length_scales_everything() {
        let a = f64::from(BOND_LENGTH_GRAPHENE);
        let tube = NanotubeBuilder::new(5, 2).build().unwrap();
        let doubled = NanotubeBuilder::new(5, 2)
            .with_bond_length(Angstrom(2.0 * a))
            .build()
            .unwrap();

        assert_eq!(tube.natoms(), doubled.natoms());
        for (p, q) in tube.positions().iter().zip(doubled.positions()) {
            for i in 0..3 {
                assert_eq_approx!(2.0 * f64::from(p[i]), f64::from(q[i]), 1e-8);
            }
        }
        assert_eq_approx!(
            2.0 * f64::from(tube.lattice().c()[2]),
            f64::from(doubled.lattice().c()[2]),
            1e-9
        );
    }

    #[test]
    fn repeat_stacks_along_axis() {
        let single = NanotubeBuilder::new(6, 0).build().unwrap();
        let double = NanotubeBuilder::new(6, 0).with_repeat(2).build().unwrap();

        assert_eq!(double.natoms(), 2 * single.natoms());

        // atom order is point first, repeat second: entries 2j and 2j+1 are
        // the same sheet point in consecutive cells
        let t_norm = f64::from(single.lattice().c()[2]);
        let positions = double.positions();
        for (j, p) in single.positions().iter().enumerate() {
            let base = positions[2 * j];
            let lifted = positions[2 * j + 1];
            for i in 0..3 {
                assert_eq_approx!(f64::from(base[i]), f64::from(p[i]), 1e-8);
            }
            assert_eq_approx!(f64::from(lifted[0]), f64::from(base[0]), 1e-8);
            assert_eq_approx!(f64::from(lifted[1]), f64::from(base[1]), 1e-8);
            assert_eq_approx!(f64::from(lifted[2]), f64::from(base[2]) + t_norm, 1e-8);
        }

        assert_eq_approx!(f64::from(double.lattice().c()[2]), 2.0 * t_norm, 1e-9);
    }

    #[test]
    fn target_length_rounds_up() {
        // |T| = sqrt(3) * 1.421 = 2.4612..., so 10 A needs 5 cells
        let tube = NanotubeBuilder::new(6, 6)
            .with_target_length(Angstrom(10.0))
            .build()
            .unwrap();

        assert_eq!(tube.natoms(), 5 * 24);
        let c = f64::from(tube.lattice().c()[2]);
        assert!(c >= 10.0);
        assert_eq_approx!(c, 5.0 * f64::sqrt(3.0) * 1.421, 1e-9);
    }

    #[traced_test]
    #[test]
    fn target_length_below_one_period_warns() {
        let tube = NanotubeBuilder::new(6, 6)
            .with_target_length(Angstrom(1.0))
            .build()
            .unwrap();

        assert_eq!(tube.natoms(), 24);
        assert!(logs_contain("below one translation period"));
    }

    #[test]
    fn centered_shifts_in_plane_only() {
        let plain = NanotubeBuilder::new(6, 0).build().unwrap();
        let centered = NanotubeBuilder::new(6, 0).centered(true).build().unwrap();

        let diameter = 6.0 * f64::sqrt(3.0) * f64::from(BOND_LENGTH_GRAPHENE) / std::f64::consts::PI;
        let shift = diameter * (VACUUM + 1.0) / 2.0;

        for (p, q) in plain.positions().iter().zip(centered.positions()) {
            assert_eq_approx!(f64::from(p[0]) + shift, f64::from(q[0]), 1e-8);
            assert_eq_approx!(f64::from(p[1]) + shift, f64::from(q[1]), 1e-8);
            assert_eq_approx!(f64::from(p[2]), f64::from(q[2]), 1e-8);
        }
    }

    #[test]
    fn boundary_atom_kept_once() {
        let tube = NanotubeBuilder::new(6, 0).build().unwrap();
        let positions = tube.positions();

        // the sheet origin projects to (0, 0) and must be in the cell,
        // landing on the cylinder at (r, 0, 0)
        let r = 6.0 * f64::sqrt(3.0) * f64::from(BOND_LENGTH_GRAPHENE) / (2.0 * std::f64::consts::PI);
        assert!(positions.iter().any(|p| {
            f64::abs(f64::from(p[0]) - r) < 1e-8
                && f64::abs(f64::from(p[1])) < 1e-8
                && f64::abs(f64::from(p[2])) < 1e-8
        }));

        // periodic images at projection 1 are excluded, so no two atoms may
        // coincide
        for (i, p) in positions.iter().enumerate() {
            for q in positions.iter().skip(i + 1) {
                let dist2 = (0..3)
                    .map(|k| (f64::from(p[k]) - f64::from(q[k])).powi(2))
                    .sum::<f64>();
                assert!(dist2 > 1e-12, "duplicate atom at {p:?}");
            }
        }
    }

    #[test]
    fn species_assigned_to_sublattices() {
        let tube = NanotubeBuilder::new(4, 0)
            .with_species([atomic_number!(B), atomic_number!(N)])
            .build()
            .unwrap();

        let nb = tube.species().iter().filter(|s| s.symbol() == "B").count();
        let nn = tube.species().iter().filter(|s| s.symbol() == "N").count();
        assert_eq!(nb, nn);
        assert_eq!(nb + nn, tube.natoms());
    }

    #[test]
    fn invalid_chirality() {
        let err = NanotubeBuilder::new(0, 0).build().unwrap_err();
        assert!(matches!(err, NanotubeError::InvalidChirality));
    }

    #[test]
    fn invalid_bond_length() {
        for bad in [0.0, -1.421] {
            let err = NanotubeBuilder::new(6, 6)
                .with_bond_length(Angstrom(bad))
                .build()
                .unwrap_err();
            assert!(matches!(err, NanotubeError::InvalidBondLength { .. }));
        }
    }

    #[test]
    fn invalid_species_count() {
        for count in [1, 3] {
            let err = NanotubeBuilder::new(6, 6)
                .with_species(vec![atomic_number!(C); count])
                .build()
                .unwrap_err();
            assert!(matches!(
                err,
                NanotubeError::InvalidSpeciesCount { count: c } if c == count
            ));
        }
    }

    #[test]
    fn every_small_tube_builds() {
        for n in 0..=4u32 {
            for m in 0..=4u32 {
                if n == 0 && m == 0 {
                    continue;
                }
                let tube = NanotubeBuilder::new(n, m).build().unwrap();
                assert!(tube.natoms() > 0, "({n}, {m}) produced no atoms");
            }
        }
    }
}
