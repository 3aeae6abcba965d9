use clap::Parser;

use ntgen::NanotubeBuilder;
use ntgen_babel::{dump, Structure};
use ntgen_core::{atomic_number_from_symbol, Angstrom};

#[derive(Parser)]
#[command(name = "ntgen")]
#[command(about = "Generate the periodic unit cell of a single-wall nanotube")]
#[command(version)]
struct Cli {
    /// First chiral index
    n: u32,

    /// Second chiral index
    m: u32,

    /// Minimum tube length along the axis (angstrom)
    length: f64,

    /// Atom-atom bond distance (angstrom)
    #[arg(short = 'a', value_name = "DIST", default_value_t = 1.421)]
    bond_length: f64,

    /// Comma-separated pair of species, one per sublattice
    #[arg(long, value_name = "SP", default_value = "C,C")]
    species: String,

    /// Center the tube in its periodic box
    #[arg(long)]
    centered: bool,

    /// Output format (aims or xyz)
    #[arg(long, value_name = "FMT", default_value = "aims")]
    format: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    // logs go to stderr, the structure itself to stdout
    let max_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();

    let species = cli
        .species
        .split(',')
        .map(str::trim)
        .map(atomic_number_from_symbol)
        .collect::<Result<Vec<u8>, _>>()?;

    let tube = NanotubeBuilder::new(cli.n, cli.m)
        .with_target_length(Angstrom(cli.length))
        .with_bond_length(Angstrom(cli.bond_length))
        .with_species(species)
        .centered(cli.centered)
        .build()?;

    let mut stdout = std::io::stdout().lock();
    dump(&Structure::Crystal(tube), &mut stdout, &cli.format)?;

    Ok(())
}
