/// Implementation of `picdump inspect`.
///
/// # Output format
///
/// ```text
/// Config: v2.0, dimension 2, 8 ranks
/// Mesh:   512×256×1 cells, output 128×64×1, momentum 200 bins
/// Time:   dt = 0.05, snapshot every 400 steps
/// Species 1: Ion  mass 3672  charge 1  load: density function (x profile)
/// Species 2: Electron  mass 1  charge -1
/// Laser:  a0 = 3, λ = 0.8, polarization p
/// Constants: E × 1.2e12, B × 4e9, energy unit 510998 eV
/// ```
use anyhow::Result;
use picdump_types::{NormalizationConstants, ParticleSpeciesConfig, SimulationConfig};

use crate::{InspectArgs, load_config};

/// Run the `picdump inspect` command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be read or decoded.
pub fn run(args: &InspectArgs) -> Result<()> {
    let config = load_config(&args.config, args.decode.options())?;
    let constants = NormalizationConstants::from_config(&config);

    if args.full {
        println!("{config:#?}");
        println!("{constants:#?}");
        return Ok(());
    }

    print_summary(&config);
    println!(
        "Constants: E × {:e}, B × {:e}, energy unit {} eV",
        constants.electric, constants.magnetic, constants.energy
    );
    Ok(())
}

fn print_summary(config: &SimulationConfig) {
    let [mx, my, mz] = config.mesh_number;
    let [ox, oy, oz] = config.output_mesh_number;
    println!(
        "Config: {}, dimension {}, {} rank{}",
        config.version,
        config.dimension,
        config.parallel_number,
        if config.parallel_number == 1 { "" } else { "s" }
    );
    println!(
        "Mesh:   {mx}×{my}×{mz} cells, output {ox}×{oy}×{oz}, momentum {} bins",
        config.momentum_mesh_number
    );
    println!(
        "Time:   dt = {}, snapshot every {} steps",
        config.delt_time, config.int_snap
    );
    if config.ionize.is_enabled() {
        println!(
            "Ionize: field {}, collisional {}",
            config.ionize.used_field_ionize, config.ionize.used_collisional_ionize
        );
    }

    for (i, species) in config.species.iter().enumerate() {
        let common = species.common();
        let load = match species {
            ParticleSpeciesConfig::IonDensityFunction { profile, .. } => {
                format!("  load: density function ({} profile)", profile.code())
            }
            ParticleSpeciesConfig::IonClusterLoaded { cluster, .. } => {
                format!("  load: {} clusters", cluster.number_cluster)
            }
            ParticleSpeciesConfig::Electron { .. } => String::new(),
        };
        let atom = species
            .ionization()
            .map(|ion| format!("  atom {} (Z0 = {})", ion.atom, ion.initial_charge))
            .unwrap_or_default();
        println!(
            "Species {}: {}  mass {}  charge {}{load}{atom}",
            i + 1,
            species.kind(),
            common.particle_mass,
            common.particle_charge
        );
    }

    let laser = &config.laser;
    println!(
        "Laser:  a0 = {}, λ = {}, polarization {}",
        laser.a0_0, laser.lambda, laser.polarize
    );
}
