//! Face-connected component labeling of a voxel volume.

use tracing::debug;

use crate::error::{ArgumentError, InvariantError, Result};
use crate::volume::{Volume3D, VoxelLabel};

#[derive(Debug, Clone, Copy)]
struct Node {
    parent: u32,
    rank: u16,
}

/// Union-find forest over `0..len`, stored as a flat arena.
#[derive(Debug, Clone)]
struct DisjointSets {
    nodes: Vec<Node>,
}

impl DisjointSets {
    fn new(len: u32) -> Self {
        Self {
            nodes: (0..len).map(|parent| Node { parent, rank: 0 }).collect(),
        }
    }

    /// Root of `i`, compressing the path behind it.
    fn find(&mut self, i: u32) -> u32 {
        let mut root = i;
        while self.nodes[root as usize].parent != root {
            root = self.nodes[root as usize].parent;
        }
        let mut cur = i;
        while cur != root {
            let next = self.nodes[cur as usize].parent;
            self.nodes[cur as usize].parent = root;
            cur = next;
        }
        root
    }

    /// Merges the sets of `a` and `b` by rank. On equal ranks the root of
    /// `a` becomes the parent.
    fn union(&mut self, a: u32, b: u32) -> Result<()> {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return Ok(());
        }
        let (rank_a, rank_b) = (self.nodes[ra as usize].rank, self.nodes[rb as usize].rank);
        if rank_a < rank_b {
            self.nodes[ra as usize].parent = rb;
        } else {
            if rank_a == rank_b {
                self.nodes[ra as usize].rank =
                    rank_a.checked_add(1).ok_or(InvariantError::RankOverflow)?;
            }
            self.nodes[rb as usize].parent = ra;
        }
        Ok(())
    }
}

/// Size and input value of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentStatistics<T> {
    pub voxel_count: usize,
    pub input_label: T,
}

/// Result of [`ConnectedComponents`].
///
/// `labels` holds `0` for background and `k` for the `k`-th component,
/// numbered by the first voxel of each component in Z, Y, X scan order.
/// Component `k` is described by `components[k - 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentLabeling<T> {
    labels: Volume3D<u32>,
    components: Vec<ComponentStatistics<T>>,
}

impl<T> ComponentLabeling<T> {
    #[must_use]
    pub fn labels(&self) -> &Volume3D<u32> {
        &self.labels
    }

    #[must_use]
    pub fn components(&self) -> &[ComponentStatistics<T>] {
        &self.components
    }

    /// Statistics of component `label`; `None` for background or an unknown
    /// label.
    #[must_use]
    pub fn component(&self, label: u32) -> Option<&ComponentStatistics<T>> {
        let index = usize::try_from(label).ok()?.checked_sub(1)?;
        self.components.get(index)
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn into_parts(self) -> (Volume3D<u32>, Vec<ComponentStatistics<T>>) {
        (self.labels, self.components)
    }
}

/// Labels maximal face-connected groups of equal-valued voxels.
///
/// Voxels equal to the background value are never part of a component.
/// Two voxels are connected when they differ by one along exactly one axis
/// and hold the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConnectedComponents<T> {
    background: T,
}

impl<T: VoxelLabel> ConnectedComponents<T> {
    #[must_use]
    pub fn new(background: T) -> Self {
        Self { background }
    }

    /// Labels `volume`.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::VolumeTooLarge` if the volume has more voxels
    /// than a `u32` label can index, or `InvariantError::RankOverflow` if the
    /// union-find ranks overflow.
    #[allow(clippy::cast_possible_truncation)]
    pub fn execute(&self, volume: &Volume3D<T>) -> Result<ComponentLabeling<T>> {
        let len = volume.len();
        let count = u32::try_from(len).map_err(|_| ArgumentError::VolumeTooLarge(len))?;
        let (dx, dy, dz) = (volume.dim_x(), volume.dim_y(), volume.dim_z());
        let plane = dx * dy;
        let data = volume.data();

        let mut sets = DisjointSets::new(count);
        let mut i = 0;
        for z in 0..dz {
            for y in 0..dy {
                for x in 0..dx {
                    let v = data[i];
                    if v != self.background {
                        if x > 0 && data[i - 1] == v {
                            sets.union(i as u32 - 1, i as u32)?;
                        }
                        if y > 0 && data[i - dx] == v {
                            sets.union((i - dx) as u32, i as u32)?;
                        }
                        if z > 0 && data[i - plane] == v {
                            sets.union((i - plane) as u32, i as u32)?;
                        }
                    }
                    i += 1;
                }
            }
        }

        let mut root_label = vec![0u32; len];
        let mut labels = vec![0u32; len];
        let mut components: Vec<ComponentStatistics<T>> = Vec::new();
        for (i, &v) in data.iter().enumerate() {
            if v == self.background {
                continue;
            }
            let root = sets.find(i as u32) as usize;
            if root_label[root] == 0 {
                components.push(ComponentStatistics {
                    voxel_count: 0,
                    input_label: v,
                });
                root_label[root] = components.len() as u32;
            }
            let label = root_label[root];
            labels[i] = label;
            components[label as usize - 1].voxel_count += 1;
        }

        debug!(
            voxels = len,
            components = components.len(),
            "labeled connected components"
        );
        Ok(ComponentLabeling {
            labels: Volume3D::from_vec(dx, dy, dz, labels)?,
            components,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn all_background_has_no_components() {
        let vol = Volume3D::new_fill(3, 3, 3, 0u8);
        let result = ConnectedComponents::new(0u8).execute(&vol).unwrap();
        assert_eq!(result.component_count(), 0);
        assert!(result.labels().data().iter().all(|&l| l == 0));
    }

    #[test]
    fn face_neighbors_join() {
        let mut vol = Volume3D::new_fill(3, 3, 3, 0u8);
        vol.set(1, 1, 1, 5);
        vol.set(1, 1, 2, 5);
        let result = ConnectedComponents::new(0u8).execute(&vol).unwrap();
        assert_eq!(
            result.components(),
            &[ComponentStatistics {
                voxel_count: 2,
                input_label: 5
            }]
        );
        assert_eq!(result.labels().get(1, 1, 2), Some(&1));
    }

    #[test]
    fn corner_neighbors_stay_apart() {
        let mut vol = Volume3D::new_fill(3, 3, 1, 0u8);
        vol.set(0, 0, 0, 1);
        vol.set(1, 1, 0, 1);
        let result = ConnectedComponents::new(0u8).execute(&vol).unwrap();
        assert_eq!(result.component_count(), 2);
        assert_eq!(result.labels().get(0, 0, 0), Some(&1));
        assert_eq!(result.labels().get(1, 1, 0), Some(&2));
    }

    #[test]
    fn different_values_are_different_components() {
        let vol = Volume3D::from_vec(4, 1, 1, vec![1u8, 1, 2, 2]).unwrap();
        let result = ConnectedComponents::new(0u8).execute(&vol).unwrap();
        assert_eq!(result.component_count(), 2);
        assert_eq!(result.component(1).unwrap().input_label, 1);
        assert_eq!(result.component(2).unwrap().input_label, 2);
        assert!(result.component(0).is_none());
        assert!(result.component(3).is_none());
    }

    #[test]
    fn u_shape_merges_late() {
        // The two arms only meet on the last row.
        #[rustfmt::skip]
        let data = vec![
            1, 0, 1,
            1, 0, 1,
            1, 1, 1u8,
        ];
        let vol = Volume3D::from_vec(3, 3, 1, data).unwrap();
        let result = ConnectedComponents::new(0u8).execute(&vol).unwrap();
        assert_eq!(result.component_count(), 1);
        assert_eq!(result.components()[0].voxel_count, 7);
        assert!(result
            .labels()
            .data()
            .iter()
            .all(|&l| l == 0 || l == 1));
    }

    #[test]
    fn labels_follow_scan_order() {
        let mut vol = Volume3D::new_fill(4, 4, 2, 0u16);
        vol.set(3, 3, 1, 7);
        vol.set(0, 2, 1, 7);
        vol.set(2, 0, 0, 7);
        let result = ConnectedComponents::new(0u16).execute(&vol).unwrap();
        assert_eq!(result.labels().get(2, 0, 0), Some(&1));
        assert_eq!(result.labels().get(0, 2, 1), Some(&2));
        assert_eq!(result.labels().get(3, 3, 1), Some(&3));
    }

    #[test]
    fn nonzero_background_value() {
        let vol = Volume3D::from_vec(3, 1, 1, vec![9u8, 0, 9]).unwrap();
        let result = ConnectedComponents::new(9u8).execute(&vol).unwrap();
        assert_eq!(result.component_count(), 1);
        assert_eq!(result.components()[0].input_label, 0);
    }

    #[test]
    fn rank_overflow_is_reported() {
        let mut sets = DisjointSets::new(2);
        sets.nodes[0].rank = u16::MAX;
        sets.nodes[1].rank = u16::MAX;
        let err = sets.union(0, 1).unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn find_compresses_paths() {
        let mut sets = DisjointSets::new(4);
        sets.nodes[1].parent = 0;
        sets.nodes[2].parent = 1;
        sets.nodes[3].parent = 2;
        assert_eq!(sets.find(3), 0);
        assert!(sets.nodes.iter().all(|n| n.parent == 0));
    }
}
