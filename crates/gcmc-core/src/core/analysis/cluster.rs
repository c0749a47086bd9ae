use super::{AnalysisError, check_frames};
use crate::core::io::pdb::{PdbAtomRecord, PdbFile};
use crate::core::models::atom::Element;
use crate::core::models::topology::Topology;
use crate::core::models::trajectory::Trajectory;
use crate::core::units::nm_to_angstrom;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeSet;
use std::io::{self, Write};
use tracing::debug;

/// A hydration site: water oxygens from many frames that cluster together.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterCluster {
    /// Mean position of the member oxygens, in nm.
    pub centroid: Point3<f64>,
    /// Fraction of frames in which at least one member was present.
    pub occupancy: f64,
    /// Number of member observations.
    pub members: usize,
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    frame: usize,
    position: Point3<f64>,
}

/// Oxygen atom index of every water residue.
pub fn water_oxygens(topology: &Topology) -> Vec<usize> {
    topology
        .residues()
        .filter(|residue| residue.is_water())
        .filter_map(|residue| {
            residue
                .atoms()
                .iter()
                .filter_map(|&id| topology.atom(id))
                .find(|atom| atom.element == Element::O)
                .map(|atom| atom.index)
        })
        .collect()
}

/// Clusters the water oxygens found inside the GCMC sphere over a trajectory.
///
/// Every water oxygen within `radius` of the frame's sphere centre is one observation.
/// Observations are grouped by average-linkage hierarchical clustering and the dendrogram
/// is cut at `cutoff`, so two observations share a cluster exactly when the average
/// linkage height joining them is at most `cutoff`.
///
/// # Arguments
///
/// * `centres` - Sphere centre of each frame (nm).
/// * `radius` - Sphere radius (nm).
/// * `cutoff` - Linkage distance cut (nm).
///
/// # Return
///
/// Clusters sorted by decreasing occupancy; ties keep the order of first observation.
pub fn cluster_waters(
    topology: &Topology,
    trajectory: &Trajectory,
    centres: &[Point3<f64>],
    radius: f64,
    cutoff: f64,
) -> Result<Vec<WaterCluster>, AnalysisError> {
    check_frames(topology, trajectory)?;
    if centres.len() != trajectory.len() {
        return Err(AnalysisError::InvalidParameter(format!(
            "{} sphere centres given for {} frames",
            centres.len(),
            trajectory.len()
        )));
    }
    if radius <= 0.0 || cutoff <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "radius ({} nm) and cutoff ({} nm) must be positive",
            radius, cutoff
        )));
    }

    let oxygens = water_oxygens(topology);
    let observations: Vec<Observation> = trajectory
        .frames
        .iter()
        .zip(centres)
        .enumerate()
        .flat_map(|(frame_index, (frame, centre))| {
            oxygens.iter().filter_map(move |&i| {
                let position = frame.positions[i];
                ((position - *centre).norm() <= radius).then_some(Observation {
                    frame: frame_index,
                    position,
                })
            })
        })
        .collect();

    let positions: Vec<Point3<f64>> = observations.iter().map(|o| o.position).collect();
    let labels = average_linkage_labels(&positions, cutoff);

    let cluster_count = labels.iter().copied().max().map_or(0, |max| max + 1);
    let mut sums = vec![Vector3::zeros(); cluster_count];
    let mut counts = vec![0usize; cluster_count];
    let mut frames: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); cluster_count];
    for (observation, &label) in observations.iter().zip(&labels) {
        sums[label] += observation.position.coords;
        counts[label] += 1;
        frames[label].insert(observation.frame);
    }

    let frame_count = trajectory.len() as f64;
    let mut clusters: Vec<WaterCluster> = (0..cluster_count)
        .map(|label| WaterCluster {
            centroid: Point3::from(sums[label] / counts[label] as f64),
            occupancy: frames[label].len() as f64 / frame_count,
            members: counts[label],
        })
        .collect();
    clusters.sort_by(|a, b| b.occupancy.total_cmp(&a.occupancy));

    debug!(
        observations = observations.len(),
        clusters = clusters.len(),
        "Clustered sphere waters"
    );
    Ok(clusters)
}

/// Flat cluster labels from average-linkage clustering cut at `cutoff`.
///
/// Uses the nearest-neighbour-chain algorithm with Lance-Williams updates. Labels are
/// numbered in order of each cluster's first point.
pub fn average_linkage_labels(points: &[Point3<f64>], cutoff: f64) -> Vec<usize> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }

    let mut distances = vec![0.0f64; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = (points[i] - points[j]).norm();
            distances[i * n + j] = d;
            distances[j * n + i] = d;
        }
    }
    let mut sizes = vec![1usize; n];
    let mut active = vec![true; n];
    let mut remaining = n;
    let mut merges: Vec<(usize, usize, f64)> = Vec::with_capacity(n - 1);
    let mut chain: Vec<usize> = Vec::new();

    while remaining > 1 {
        if chain.is_empty() {
            if let Some(first) = active.iter().position(|&a| a) {
                chain.push(first);
            }
        }
        loop {
            let Some(&a) = chain.last() else {
                break;
            };
            let previous = chain.len().checked_sub(2).map(|i| chain[i]);
            let mut best = previous;
            let mut best_distance = previous.map_or(f64::INFINITY, |p| distances[a * n + p]);
            for k in 0..n {
                if k != a && active[k] && distances[a * n + k] < best_distance {
                    best = Some(k);
                    best_distance = distances[a * n + k];
                }
            }
            let Some(b) = best else {
                break;
            };
            if Some(b) == previous {
                break;
            }
            chain.push(b);
        }

        let (Some(b), Some(a)) = (chain.pop(), chain.pop()) else {
            break;
        };
        let (keep, absorb) = (a.min(b), a.max(b));
        merges.push((keep, absorb, distances[keep * n + absorb]));

        let (size_keep, size_absorb) = (sizes[keep] as f64, sizes[absorb] as f64);
        for k in 0..n {
            if active[k] && k != keep && k != absorb {
                let d = (size_keep * distances[keep * n + k] + size_absorb * distances[absorb * n + k])
                    / (size_keep + size_absorb);
                distances[keep * n + k] = d;
                distances[k * n + keep] = d;
            }
        }
        sizes[keep] += sizes[absorb];
        active[absorb] = false;
        remaining -= 1;
    }

    let mut parent: Vec<usize> = (0..n).collect();
    for &(a, b, height) in &merges {
        if height <= cutoff {
            let (root_a, root_b) = (find(&mut parent, a), find(&mut parent, b));
            if root_a != root_b {
                parent[root_a.max(root_b)] = root_a.min(root_b);
            }
        }
    }

    let mut label_of_root = vec![usize::MAX; n];
    let mut next = 0;
    (0..n)
        .map(|i| {
            let root = find(&mut parent, i);
            if label_of_root[root] == usize::MAX {
                label_of_root[root] = next;
                next += 1;
            }
            label_of_root[root]
        })
        .collect()
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Writes clusters as water oxygens, occupancy in the occupancy column.
pub fn write_clusters_pdb(
    writer: &mut impl Write,
    clusters: &[WaterCluster],
    cutoff: f64,
) -> io::Result<()> {
    PdbFile::write_remark(
        writer,
        &format!(
            "{} WATER CLUSTERS, AVERAGE LINKAGE CUTOFF = {:.3} ANGSTROMS",
            clusters.len(),
            nm_to_angstrom(cutoff)
        ),
    )?;
    for (i, cluster) in clusters.iter().enumerate() {
        PdbFile::write_atom_record(
            writer,
            &PdbAtomRecord {
                hetero: true,
                serial: i + 1,
                name: "O",
                residue_name: "HOH",
                chain_id: 'W',
                residue_number: i as isize + 1,
                position: cluster.centroid,
                occupancy: cluster.occupancy,
                temp_factor: 0.0,
                element: "O",
            },
        )?;
    }
    writeln!(writer, "END")
}
