/*
 * structure.rs holds the structure containers the generator emits into.
 * notes:
 * Angstrom is the internal and default API unit for cartesian quantities.
 * A Crystal stores its sites as ``FracCoord`` so positions stay put if the
 * lattice is rescaled; a Molecule has no lattice and stays cartesian.
 *
 * Compile time errors include:
 * - fractional coordinate literals x not satisfying 0 <= x < 1.0 (frac!).
 * - multi-set of lattice and sites, or building before both are set.
 *
 * Runtime validation:
 * - positions/species length mismatch on build().
 */

use std::ops::Add;

use crate::math::Vector3;
use crate::symbol_from_atomic_number;

macro_rules! impl_f64_wrapper {
    ($($t:ident),+ $(,)?) => {
        $(
            impl From<$t> for f64 {
                fn from(value: $t) -> Self {
                    value.0
                }
            }

            impl From<f64> for $t {
                fn from(value: f64) -> Self {
                    $t(value)
                }
            }
        )+
    };
}

/// Cartesian length in Å.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angstrom(pub f64);

impl Add<Angstrom> for Angstrom {
    type Output = Angstrom;

    fn add(self, rhs: Angstrom) -> Self::Output {
        Angstrom::from(f64::from(self) + f64::from(rhs))
    }
}

/// Inverse Angstrom 1/Å for reciprocal space vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvAngstrom(pub f64);

/// Dimensionless coordinate relative to the lattice vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FracCoord(pub f64);

impl std::fmt::Display for FracCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:15.9}", self.0)
    }
}

/// f64 wrapper for radians.
#[derive(Debug, Copy, Clone)]
pub struct Rad(f64);

/// f64 wrapper for a cell volume (Å^3).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Volume(f64);

impl_f64_wrapper!(Angstrom, InvAngstrom, FracCoord, Rad, Volume);

impl Vector3<FracCoord> {
    #[must_use]
    pub fn into_cartesian(&self, latt: &Lattice) -> Vector3<Angstrom> {
        let (x, y, z): (f64, f64, f64) = (self[0].into(), self[1].into(), self[2].into());
        x * latt.a() + y * latt.b() + z * latt.c()
    }
}

impl Vector3<Angstrom> {
    #[must_use]
    pub fn into_fraction(&self, latt: &Lattice) -> Vector3<FracCoord> {
        // use the reciprocal basis so no matrix inverse is needed here
        let recip = latt.reciprocal();

        // Angstrom * InvAngstrom -> FracCoord
        let coord: Vector3<f64> = Vector3([self[0].into(), self[1].into(), self[2].into()]);
        let a_star = Vector3(recip.a_star().map(f64::from));
        let b_star = Vector3(recip.b_star().map(f64::from));
        let c_star = Vector3(recip.c_star().map(f64::from));

        let factor = 1.0 / (2.0 * std::f64::consts::PI);
        let x = factor * dot(&coord, &a_star);
        let y = factor * dot(&coord, &b_star);
        let z = factor * dot(&coord, &c_star);

        Vector3([FracCoord::from(x), FracCoord::from(y), FracCoord::from(z)])
    }
}

/// `frac!` macro to create `FracCoord` and validate the value is in between
/// [0.0, 1.0) at compile time.
#[macro_export]
macro_rules! frac {
    ($x:expr) => {{
        let frac_coord = $crate::FracCoord($x);
        const {
            assert!(
                (0.0 <= $x && $x < 1.0),
                "invalid fractional coordinate: must satisfy 0.0 <= x < 1.0"
            );
        }
        frac_coord
    }};
}

/// `angstrom!` macro to create `Angstrom`.
#[macro_export]
macro_rules! angstrom {
    ($x:expr) => {{
        let cart_coord = $crate::Angstrom($x);
        cart_coord
    }};
}

/// macro to set the sites (in fraction coordinate)
///
/// # Examples
///
/// ```
/// use ntgen_core::sites_frac_coord;
///
/// let _ = sites_frac_coord![
///     (0.0, 0.0, 0.0), 6;
///     (0.0, 0.0, 0.5), 6;
/// ];
/// ```
#[macro_export]
macro_rules! sites_frac_coord {
    () => {
        Vec::new()
    };
    ( $(
        ($x:expr,$y:expr,$z:expr), $kind:expr
      );+ $(;)?
    ) => {{
        let sites = vec![
            $(
                $crate::SiteFraction::new(
                    $crate::math::Vector3::<$crate::FracCoord>([
                        $crate::frac!($x),
                        $crate::frac!($y),
                        $crate::frac!($z),
                    ]),
                    $kind,
                )
            ),+
        ];
        sites
    }};
}

/// macro to set the sites (in cartesian coordinate in the unit of angstrom)
///
/// # Examples
///
/// ```
/// use ntgen_core::sites_cart_coord;
///
/// let _ = sites_cart_coord![
///     (2.35, 0.0, 0.0), 6;
///     (0.0, 0.0, 1.23), 6;
/// ];
/// ```
#[macro_export]
macro_rules! sites_cart_coord {
    () => {
        Vec::new()
    };
    ( $(
        ($x:expr,$y:expr,$z:expr), $kind:expr
      );+ $(;)?
    ) => {{
        let sites = vec![
            $(
                $crate::SiteCartesian::new(
                    $crate::math::Vector3::<$crate::Angstrom>([
                        $crate::angstrom!($x),
                        $crate::angstrom!($y),
                        $crate::angstrom!($z),
                    ]),
                    $kind,
                )
            ),+
        ];
        sites
    }};
}

/// Create a [`Lattice`] from three vectors expressed in **Ångström** units.
///
/// Both `(x, y, z)` and `[x, y, z]` syntax are supported per vector, in a
/// **named** (`a = ..., b = ..., c = ...`) or **positional** form:
///
/// ```
/// use ntgen_core::lattice_angstrom;
///
/// let latt = lattice_angstrom!(
///     a = (1.0, 0.0, 0.0),
///     b = (0.0, 1.0, 0.0),
///     c = (0.0, 0.0, 1.0),
/// );
/// let same = lattice_angstrom!([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
/// ```
#[macro_export]
macro_rules! lattice_angstrom {
    (
        a = $a:tt,
        b = $b:tt,
        c = $c:tt $(,)?
    ) => {
        $crate::lattice_angstrom!($a, $b, $c)
    };
    (
        $a:tt,
        $b:tt,
        $c:tt $(,)?
    ) => {{
        macro_rules! __vec3_angstrom {
            ([$x:expr, $y:expr, $z:expr]) => {
                $crate::math::Vector3::<$crate::Angstrom>([
                    $crate::Angstrom($x),
                    $crate::Angstrom($y),
                    $crate::Angstrom($z),
                ])
            };
            (($x:expr, $y:expr, $z:expr)) => {
                $crate::math::Vector3::<$crate::Angstrom>([
                    $crate::Angstrom($x),
                    $crate::Angstrom($y),
                    $crate::Angstrom($z),
                ])
            };
        }

        $crate::Lattice::new(
            __vec3_angstrom!($a),
            __vec3_angstrom!($b),
            __vec3_angstrom!($c),
        )
    }};
}

/// dot product
fn dot(v: &Vector3<f64>, u: &Vector3<f64>) -> f64 {
    v[0] * u[0] + v[1] * u[1] + v[2] * u[2]
}

/// cross product
fn cross(u: &Vector3<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::<f64>([
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ])
}

/// Periodic box of the crystal, three cartesian row vectors.
#[derive(Debug, Clone)]
pub struct Lattice {
    a: Vector3<Angstrom>,
    b: Vector3<Angstrom>,
    c: Vector3<Angstrom>,
}

impl Lattice {
    #[must_use]
    pub fn new(a: Vector3<Angstrom>, b: Vector3<Angstrom>, c: Vector3<Angstrom>) -> Self {
        Lattice { a, b, c }
    }

    /// Constructs the lattice from a 3×3 array where each row is one lattice
    /// vector `(a, b, c)` in cartesian angstrom components.
    ///
    /// # Example
    ///
    /// ```
    /// use ntgen_core::Lattice;
    ///
    /// let latt = Lattice::from_angstroms([
    ///     [11.75, 0.0, 0.0],
    ///     [0.0, 11.75, 0.0],
    ///     [0.0, 0.0, 2.46],
    /// ]);
    /// ```
    #[must_use]
    pub fn from_angstroms(latt: [[f64; 3]; 3]) -> Self {
        let a: Vector3<Angstrom> = Vector3(latt[0].map(Angstrom::from));
        let b: Vector3<Angstrom> = Vector3(latt[1].map(Angstrom::from));
        let c: Vector3<Angstrom> = Vector3(latt[2].map(Angstrom::from));
        Self { a, b, c }
    }

    #[must_use]
    pub fn a(&self) -> Vector3<Angstrom> {
        self.a
    }

    #[must_use]
    pub fn b(&self) -> Vector3<Angstrom> {
        self.b
    }

    #[must_use]
    pub fn c(&self) -> Vector3<Angstrom> {
        self.c
    }

    /// Cell lengths and angles `(a, b, c, alpha, beta, gamma)`.
    pub fn lattice_params(&self) -> (Angstrom, Angstrom, Angstrom, Rad, Rad, Rad) {
        let va = self.a.map(f64::from);
        let vb = self.b.map(f64::from);
        let vc = self.c.map(f64::from);

        let length_a = f64::sqrt(va[0] * va[0] + va[1] * va[1] + va[2] * va[2]);
        let length_b = f64::sqrt(vb[0] * vb[0] + vb[1] * vb[1] + vb[2] * vb[2]);
        let length_c = f64::sqrt(vc[0] * vc[0] + vc[1] * vc[1] + vc[2] * vc[2]);

        let cos_alpha = (vb[0] * vc[0] + vb[1] * vc[1] + vb[2] * vc[2]) / (length_b * length_c);
        let cos_beta = (va[0] * vc[0] + va[1] * vc[1] + va[2] * vc[2]) / (length_a * length_c);
        let cos_gamma = (va[0] * vb[0] + va[1] * vb[1] + va[2] * vb[2]) / (length_a * length_b);

        (
            length_a.into(),
            length_b.into(),
            length_c.into(),
            cos_alpha.acos().into(),
            cos_beta.acos().into(),
            cos_gamma.acos().into(),
        )
    }

    #[must_use]
    pub fn volume(&self) -> Volume {
        let (a, b, c) = (self.a.into(), self.b.into(), self.c.into());

        // a⋅(b×c)
        Volume(dot(&a, &cross(&b, &c)))
    }

    #[must_use]
    pub fn reciprocal(&self) -> LatticeReciprocal {
        let (a, b, c) = (self.a.into(), self.b.into(), self.c.into());
        let volume: f64 = Volume(dot(&a, &cross(&b, &c))).into();
        let a_star = 1.0 / volume * (2.0 * std::f64::consts::PI) * cross(&b, &c);
        let b_star = 1.0 / volume * (2.0 * std::f64::consts::PI) * cross(&c, &a);
        let c_star = 1.0 / volume * (2.0 * std::f64::consts::PI) * cross(&a, &b);

        let a_star = Vector3(a_star.map(InvAngstrom::from));
        let b_star = Vector3(b_star.map(InvAngstrom::from));
        let c_star = Vector3(c_star.map(InvAngstrom::from));

        LatticeReciprocal::new(a_star, b_star, c_star)
    }
}

pub struct LatticeReciprocal {
    // internal use a not a_star, but the API is a_star to make it very explicit.
    a: Vector3<InvAngstrom>,
    b: Vector3<InvAngstrom>,
    c: Vector3<InvAngstrom>,
}

impl LatticeReciprocal {
    #[must_use]
    pub fn new(
        a_star: Vector3<InvAngstrom>,
        b_star: Vector3<InvAngstrom>,
        c_star: Vector3<InvAngstrom>,
    ) -> Self {
        LatticeReciprocal {
            a: a_star,
            b: b_star,
            c: c_star,
        }
    }

    #[must_use]
    pub fn a_star(&self) -> Vector3<InvAngstrom> {
        self.a
    }

    #[must_use]
    pub fn b_star(&self) -> Vector3<InvAngstrom> {
        self.b
    }

    #[must_use]
    pub fn c_star(&self) -> Vector3<InvAngstrom> {
        self.c
    }
}

#[derive(Debug)]
pub struct MoleculeValidateError {
    message: String,
}

impl std::fmt::Display for MoleculeValidateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for MoleculeValidateError {}

#[derive(Debug)]
pub struct CrystalValidateError {
    message: String,
}

impl std::fmt::Display for CrystalValidateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CrystalValidateError {}

pub struct LatticeSet;
pub struct LatticeNotSet;
pub struct SitesSet;
pub struct SitesNotSet;

// TODO: partial occupation on sites
#[derive(Debug, Clone)]
pub struct Specie {
    atomic_number: u8,
}

impl Specie {
    fn new(atomic_number: u8) -> Self {
        Specie { atomic_number }
    }

    #[must_use]
    pub fn atomic_number(&self) -> u8 {
        self.atomic_number
    }

    #[must_use]
    pub fn symbol(&self) -> &'static str {
        symbol_from_atomic_number(self.atomic_number()).expect("not a valid atomic number")
    }
}

/// A site in fractional coordinates plus its chemical identity.
///
/// Components typically lie in `[0, 1)` but this is not enforced at runtime;
/// the `frac!` macro enforces it for literals at compile time.
#[derive(Debug)]
pub struct SiteFraction {
    position: Vector3<FracCoord>,
    specie: Specie,
}

impl SiteFraction {
    #[must_use]
    pub fn new(position: Vector3<FracCoord>, atomic_number: u8) -> Self {
        SiteFraction {
            position,
            specie: Specie::new(atomic_number),
        }
    }

    #[must_use]
    pub fn position(&self) -> Vector3<FracCoord> {
        self.position
    }
}

/// A site in cartesian coordinates (angstrom) plus its chemical identity.
#[derive(Debug)]
pub struct SiteCartesian {
    position: Vector3<Angstrom>,
    specie: Specie,
}

impl SiteCartesian {
    #[must_use]
    pub fn new(position: Vector3<Angstrom>, atomic_number: u8) -> Self {
        SiteCartesian {
            position,
            specie: Specie::new(atomic_number),
        }
    }

    #[must_use]
    pub fn position(&self) -> Vector3<Angstrom> {
        self.position
    }
}

/// Ordered set of atoms without a periodic box.
#[derive(Debug, Clone)]
pub struct Molecule {
    positions: Vec<Vector3<Angstrom>>,
    species: Vec<Specie>,
}

#[derive(Debug)]
pub struct MoleculeBuilder<SiteSetState> {
    molecule: Molecule,
    _sites: std::marker::PhantomData<SiteSetState>,
}

impl MoleculeBuilder<SitesNotSet> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for MoleculeBuilder<SitesNotSet> {
    fn default() -> Self {
        Self {
            molecule: Molecule {
                positions: vec![],
                species: vec![],
            },
            _sites: std::marker::PhantomData,
        }
    }
}

impl MoleculeBuilder<SitesNotSet> {
    /// Set the sites (in cartesian coordinate) for the molecule.
    ///
    /// # Examples
    /// ```
    /// use ntgen_core::*;
    ///
    /// let sites = sites_cart_coord![
    ///     (0.0, 0.0, 0.0), atomic_number!(C);
    ///     (0.0, 0.0, 1.42), atomic_number!(C);
    /// ];
    /// let mol = MoleculeBuilder::new().with_sites(sites).build().unwrap();
    /// ```
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn with_sites<I>(self, sites: I) -> MoleculeBuilder<SitesSet>
    where
        I: IntoIterator<Item = SiteCartesian>,
    {
        let (positions, species) = sites
            .into_iter()
            .map(|site| (site.position, site.specie))
            .collect();

        MoleculeBuilder {
            molecule: Molecule { positions, species },
            _sites: std::marker::PhantomData,
        }
    }
}

impl MoleculeBuilder<SitesSet> {
    fn validate(&self) -> Result<(), MoleculeValidateError> {
        if self.molecule.positions.len() != self.molecule.species.len() {
            return Err(MoleculeValidateError {
                message: "number of positions and species differ".to_string(),
            });
        }
        Ok(())
    }

    // build without runtime validation, for call sites where the sites are
    // known to be consistent.
    #[must_use]
    pub fn build_uncheck(self) -> Molecule {
        debug_assert!(self.molecule.positions.len() == self.molecule.species.len());

        self.molecule
    }

    /// build and validate that it is a valid molecule.
    ///
    /// # Errors
    /// Positions and species out of sync.
    pub fn build(self) -> Result<Molecule, MoleculeValidateError> {
        self.validate()?;

        let mol = self.build_uncheck();

        Ok(mol)
    }
}

impl Molecule {
    /// vec of positions in cartesian coordinate
    #[must_use]
    pub fn positions(&self) -> Vec<Vector3<Angstrom>> {
        self.positions.clone()
    }

    #[must_use]
    pub fn species(&self) -> &[Specie] {
        &self.species
    }

    #[must_use]
    pub fn natoms(&self) -> usize {
        self.positions.len()
    }

    /// Same molecule with every atom translated by `delta`.
    #[must_use]
    pub fn shifted(&self, delta: Vector3<Angstrom>) -> Molecule {
        let positions = self.positions.iter().map(|p| *p + delta).collect();
        Molecule {
            positions,
            species: self.species.clone(),
        }
    }

    /// Consume the molecule into cartesian sites, keeping the atom order.
    #[must_use]
    pub fn into_sites(self) -> Vec<SiteCartesian> {
        self.positions
            .into_iter()
            .zip(self.species)
            .map(|(position, specie)| SiteCartesian { position, specie })
            .collect()
    }
}

/// Periodic structure: lattice plus sites.
///
/// Inner fields stay private so the fractional representation can be kept as
/// an invariant; use [`CrystalBuilder`] to construct one.
///
/// # Example
/// ```
/// use ntgen_core::*;
///
/// let lattice = lattice_angstrom![
///     a = (1.0, 0.0, 0.0),
///     b = (0.0, 1.0, 0.0),
///     c = (0.0, 0.0, 1.0),
/// ];
/// let sites = vec![];
/// let crystal = CrystalBuilder::new()
///     .with_lattice(&lattice)
///     .with_frac_sites(sites)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct CrystalBuilder<LatticeSetState, SiteSetState> {
    crystal: Crystal,
    _lattice: std::marker::PhantomData<LatticeSetState>,
    _sites: std::marker::PhantomData<SiteSetState>,
}

impl Default for CrystalBuilder<LatticeNotSet, SitesNotSet> {
    fn default() -> Self {
        Self {
            crystal: Crystal {
                lattice: lattice_angstrom!([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0],),
                positions: vec![],
                species: vec![],
            },
            _lattice: std::marker::PhantomData,
            _sites: std::marker::PhantomData,
        }
    }
}

impl CrystalBuilder<LatticeNotSet, SitesNotSet> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> CrystalBuilder<LatticeNotSet, S> {
    /// Set the periodic box for the crystal.
    #[must_use]
    pub fn with_lattice(self, lattice: &Lattice) -> CrystalBuilder<LatticeSet, S> {
        CrystalBuilder {
            crystal: Crystal {
                lattice: lattice.clone(),
                ..self.crystal
            },
            _lattice: std::marker::PhantomData,
            _sites: std::marker::PhantomData,
        }
    }
}

impl<L> CrystalBuilder<L, SitesNotSet> {
    /// Set the sites (in fraction coordinate) for the crystal.
    ///
    /// # Examples
    /// ```
    /// use ntgen_core::*;
    /// let sites = sites_frac_coord![
    ///     (0.0, 0.0, 0.0), atomic_number!(C);
    ///     (0.5, 0.5, 0.5), atomic_number!(C);
    /// ];
    /// ```
    #[must_use]
    pub fn with_frac_sites<I>(self, sites: I) -> CrystalBuilder<L, SitesSet>
    where
        I: IntoIterator<Item = SiteFraction>,
    {
        let (positions, species) = sites
            .into_iter()
            .map(|site| (site.position, site.specie))
            .collect();

        CrystalBuilder {
            crystal: Crystal {
                positions,
                species,
                ..self.crystal
            },
            _lattice: std::marker::PhantomData,
            _sites: std::marker::PhantomData,
        }
    }
}

impl CrystalBuilder<LatticeSet, SitesNotSet> {
    /// Set the sites (in cartesian coordinate) for the crystal. Unlike
    /// `with_frac_sites` this can only be called after `with_lattice`, since
    /// converting into fractional coordinates needs the lattice.
    #[must_use]
    pub fn with_cart_sites<I>(self, sites: I) -> CrystalBuilder<LatticeSet, SitesSet>
    where
        I: IntoIterator<Item = SiteCartesian>,
    {
        let latt = self.crystal.lattice();
        let (positions, species) = sites
            .into_iter()
            .map(|site| {
                let pos = site.position.into_fraction(&latt);
                (pos, site.specie)
            })
            .collect();

        CrystalBuilder {
            crystal: Crystal {
                positions,
                species,
                ..self.crystal
            },
            _lattice: std::marker::PhantomData,
            _sites: std::marker::PhantomData,
        }
    }
}

impl CrystalBuilder<LatticeSet, SitesSet> {
    fn validate(&self) -> Result<(), CrystalValidateError> {
        if self.crystal.positions.len() != self.crystal.species.len() {
            return Err(CrystalValidateError {
                message: "number of positions and species differ".to_string(),
            });
        }
        Ok(())
    }

    // build without runtime validation, used inside the workspace where the
    // crystal is constructed consistently by construction.
    #[must_use]
    pub fn build_uncheck(self) -> Crystal {
        debug_assert!(self.crystal.positions.len() == self.crystal.species.len());

        self.crystal
    }

    /// build and validate that it is a valid crystal.
    ///
    /// # Errors
    /// Positions and species out of sync.
    pub fn build(self) -> Result<Crystal, CrystalValidateError> {
        self.validate()?;

        let crystal = self.build_uncheck();

        Ok(crystal)
    }
}

#[derive(Debug, Clone)]
pub struct Crystal {
    lattice: Lattice,
    positions: Vec<Vector3<FracCoord>>,
    species: Vec<Specie>,
}

impl Crystal {
    #[must_use]
    pub fn lattice(&self) -> Lattice {
        self.lattice.clone()
    }

    /// vec of positions in fractional coordinate
    #[must_use]
    pub fn positions_fraction(&self) -> Vec<Vector3<FracCoord>> {
        self.positions.clone()
    }

    /// vec of positions in cartesian coordinate
    #[must_use]
    pub fn positions(&self) -> Vec<Vector3<Angstrom>> {
        self.positions
            .iter()
            .map(|p| p.into_cartesian(&self.lattice()))
            .collect()
    }

    #[must_use]
    pub fn species(&self) -> &[Specie] {
        &self.species
    }

    #[must_use]
    pub fn natoms(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn volume(&self) -> Volume {
        self.lattice.volume()
    }

    /// Wrap the fractional positions back into the cell, for the periodic
    /// directions of the structure.
    pub fn wrap_frac_positions(&mut self) {
        for p in &mut self.positions {
            let p_ = p.map(|i| FracCoord::from(f64::from(i) - f64::from(i).floor()));
            *p = Vector3(p_);
        }
    }
}
