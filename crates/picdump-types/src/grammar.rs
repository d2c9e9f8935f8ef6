//! Chunk layouts of the configuration file, in the producer's write order.
//!
//! ```text
//! HEADER
//! ION_SPECIES        × ion_number
//! ELECTRON_SPECIES   × (total_species - ion_number)
//! RESERVED           × 1
//! LASER
//! ```
//!
//! Each table entry is one chunk. A reader walks a table with
//! [`ChunkSpec::read`]; the encoder walks the same table with
//! [`ChunkSpec::write`].

use crate::schema::{ChunkSpec, Presence, array, chunk, chunk_if, field, sized_by};

use crate::schema::Kind::{F32, F64, I32, Logical, Tag, Text};

pub const HEADER: &[ChunkSpec] = &[
    chunk(&[field("version", Text)]),
    chunk(&[field("parallel_number", I32)]),
    chunk(&[field("dimension", I32)]),
    chunk(&[
        field("velocity_light", F64),
        field("delt_time", F64),
        array("delt_x", F64, 3),
    ]),
    chunk(&[array("system_l", F64, 3)]),
    chunk(&[field("average_density", F64)]),
    chunk(&[array("mesh_number", I32, 3)]),
    chunk(&[field("field_boundary_condition", I32)]),
    chunk(&[field("total_particle_number", I32)]),
    chunk(&[
        field("total_species", I32),
        field("ion_number", I32),
        field("electron_number", I32),
    ]),
    chunk(&[sized_by("load_type", I32, "total_species")]),
    chunk(&[field("cluster_option", Logical)]),
    chunk_if(Presence::IfSet("cluster_option"), &[field("cluster_number", I32)]),
    chunk(&[field("collision_option", Logical)]),
    chunk_if(Presence::IfSet("collision_option"), &[field("ncol", I32)]),
    // Seven logicals; the last five all land in the same field.
    chunk(&[
        field("used_ionize", Logical),
        field("used_field_ionize", Logical),
        field("used_collisional_ionize", Logical),
        field("used_collisional_ionize", Logical),
        field("used_collisional_ionize", Logical),
        field("used_collisional_ionize", Logical),
        field("used_collisional_ionize", Logical),
    ]),
    chunk_if(Presence::IfSet("used_ionize"), &[field("ion_step", I32)]),
    chunk(&[field("ll_dumping_option", Logical)]),
    chunk(&[field("used_local_solver", Logical)]),
    chunk(&[field("real_lx", F64)]),
    chunk(&[field("int_snap", I32)]),
    chunk(&[array("output_mesh_number", I32, 3)]),
    chunk(&[
        field("momentum_mesh_number", I32),
        array("space_mesh_number_for_momentum", I32, 2),
    ]),
];

pub const ION_SPECIES: &[ChunkSpec] = &[
    chunk(&[field("load_type", I32)]),
    chunk(&[field("n_p", I32)]),
    chunk(&[field("np", I32)]),
    chunk(&[field("nps", I32)]),
    chunk(&[field("particle_mass", F64)]),
    chunk(&[field("particle_charge", F64)]),
    chunk(&[field("temperature_function", I32)]),
    chunk(&[field("temperature", F64)]),
    chunk(&[field("rns_b", F64)]),
    // load_type 0: density function
    chunk_if(Presence::IfEq("load_type", 0), &[field("density_function_type", Tag)]),
    chunk_if(
        Presence::IfTag("density_function_type", "x"),
        &[field("nx_func", I32), array("nix", F32, 4)],
    ),
    chunk_if(
        Presence::IfTag("density_function_type", "y"),
        &[field("ny_func", I32), array("niy", F32, 4)],
    ),
    // load_type 1: cluster loading
    chunk_if(Presence::IfEq("load_type", 1), &[field("rds", F64)]),
    chunk_if(Presence::IfEq("load_type", 1), &[field("cluster_loading_option", I32)]),
    chunk_if(Presence::IfEq("load_type", 1), &[field("cluster_shape", I32)]),
    chunk_if(Presence::IfEq("load_type", 1), &[field("number_cluster", I32)]),
    chunk_if(
        Presence::IfEq("load_type", 1),
        &[array("xclr", F64, 2), array("yclr", F64, 2)],
    ),
    chunk_if(Presence::IfEq("load_type", 1), &[field("cluster_distance", F64)]),
    chunk(&[field("ll_dumping", Logical)]),
    chunk(&[field("particle_out_going_x", Logical)]),
    chunk(&[field("particle_out_going_y", Logical)]),
    chunk(&[field("particle_out_going_z", Logical)]),
    chunk_if(Presence::IfSet("used_ionize"), &[field("atom", Tag)]),
    chunk_if(Presence::IfSet("used_ionize"), &[field("initial_charge", F64)]),
];

pub const ELECTRON_SPECIES: &[ChunkSpec] = &[
    chunk(&[field("n_p", I32)]),
    chunk(&[field("np", I32)]),
    chunk(&[field("nps", I32)]),
    chunk(&[field("particle_mass", F64)]),
    chunk(&[field("particle_charge", F64)]),
    chunk(&[field("temperature_function", I32)]),
    chunk(&[field("temperature", F64)]),
    chunk(&[field("rns_b", F64)]),
    chunk(&[field("ll_dumping", Logical)]),
    chunk(&[field("particle_out_going_x", Logical)]),
    chunk(&[field("particle_out_going_y", Logical)]),
    chunk(&[field("particle_out_going_z", Logical)]),
];

/// Chunks between the species list and the laser record.
pub const RESERVED_BEFORE_LASER: usize = 1;

pub const LASER: &[ChunkSpec] = &[
    chunk(&[
        field("rlw", F64),
        field("x0", F64),
        field("x1", F64),
        field("y1", F64),
        field("rlx", F64),
        field("rly", F64),
        field("e0", F64),
    ]),
    chunk(&[
        field("is_laser_rise", Logical),
        field("polarize", Tag),
        field("direction", I32),
    ]),
    chunk(&[
        field("a0_0", F64),
        field("tau0", F64),
        field("t_0", F64),
        field("lambda", F64),
        field("dy0", F64),
    ]),
    chunk(&[field("laser_focus", Logical), field("focus_length", F64)]),
    chunk(&[field("external_current", F64)]),
    chunk(&[array("estc", F64, 3)]),
];

// ── Snapshot layout ───────────────────────────────────────────────────
//
// Snapshot records are fixed-shape float arrays sized by the config, so
// only the reserved chunk counts need to be shared between reader and
// writer.

/// Chunks after each phase-space record that are read and discarded:
/// one, then three velocity–velocity and six position–velocity
/// histograms.
pub const PHASE_RESERVED_CHUNKS: usize = 1 + 3 + 6;

/// Reserved chunks after each of the two energy histograms.
pub const ENERGY_RESERVED_CHUNKS: usize = 2;

/// Reserved chunks per species at the end of every timestep.
pub const TRAILING_RESERVED_CHUNKS: usize = 12;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_chunk_count() {
        assert_eq!(HEADER.len(), 23);
        assert_eq!(HEADER.iter().filter(|c| c.presence != Presence::Always).count(), 3);
    }

    #[test]
    fn species_tables_end_with_common_flags() {
        let tail: Vec<_> = ELECTRON_SPECIES[8..].iter().map(ChunkSpec::label).collect();
        assert_eq!(
            tail,
            ["ll_dumping", "particle_out_going_x", "particle_out_going_y", "particle_out_going_z"]
        );
        assert!(ION_SPECIES.iter().any(|c| c.label() == "atom"));
    }

    #[test]
    fn laser_table_is_six_chunks() {
        assert_eq!(LASER.len(), 6);
        assert_eq!(LASER[1].fields.len(), 3);
    }

    #[test]
    fn laser_focus_is_a_full_logical_word() {
        let focus = LASER[3];
        assert_eq!(focus.label(), "laser_focus");
        let widths: Vec<_> = focus.fields.iter().map(|f| f.kind.width()).collect();
        assert_eq!(widths, [Some(4), Some(8)]);
    }
}
