//! Experiment matrix enumeration: resolves every (size, density, replica)
//! tuple to a graph instance file under the dataset root.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// One graph instance of the experiment matrix.
///
/// Instances are immutable once discovered; `available` records whether the
/// resolved file existed at catalog-build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub size: u32,
    pub density: String,
    pub replica: u32,
    pub path: PathBuf,
    pub available: bool,
}

impl Instance {
    /// Base name of the instance file, used as the run attribution key.
    pub fn id(&self) -> String {
        format!("erdos_n{}_p0c{}_{}", self.size, self.density, self.replica)
    }
}

/// Resolves instance file paths using the dataset's fixed naming convention:
/// `<root>/new_<size>_dataset/erdos_n<size>_p0c<density>_<replica>.graph`.
pub fn instance_path(root: &Path, size: u32, density: &str, replica: u32) -> PathBuf {
    root.join(format!("new_{size}_dataset"))
        .join(format!("erdos_n{size}_p0c{density}_{replica}.graph"))
}

/// Immutable catalog of the full experiment matrix.
#[derive(Debug, Clone)]
pub struct InstanceCatalog {
    instances: Vec<Instance>,
}

impl InstanceCatalog {
    /// Enumerates the matrix in deterministic order: sizes outer, then
    /// densities, then replica ids ascending. Missing files (or a missing
    /// dataset directory for a whole size) yield unavailable instances
    /// instead of aborting; the sweep must tolerate a partially populated
    /// dataset.
    pub fn enumerate(
        root: &Path,
        sizes: &[u32],
        densities: &[String],
        replicas: RangeInclusive<u32>,
    ) -> Self {
        let mut instances = Vec::new();
        for &size in sizes {
            let dataset_dir = root.join(format!("new_{size}_dataset"));
            if !dataset_dir.is_dir() {
                tracing::warn!(
                    size,
                    dir = %dataset_dir.display(),
                    "dataset directory not found; all instances of this size are unavailable"
                );
            }
            for density in densities {
                for replica in replicas.clone() {
                    let path = instance_path(root, size, density, replica);
                    let available = path.is_file();
                    instances.push(Instance {
                        size,
                        density: density.clone(),
                        replica,
                        path,
                        available,
                    });
                }
            }
        }
        Self { instances }
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Instances of one size, in enumeration order.
    pub fn instances_for(&self, size: u32) -> impl Iterator<Item = &Instance> {
        self.instances.iter().filter(move |i| i.size == size)
    }

    /// Instances of one (size, density) group, in replica order.
    pub fn group(&self, size: u32, density: &str) -> Vec<&Instance> {
        self.instances
            .iter()
            .filter(|i| i.size == size && i.density == density)
            .collect()
    }

    pub fn available_count(&self) -> usize {
        self.instances.iter().filter(|i| i.available).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn densities(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn enumeration_order_is_sizes_then_densities_then_replicas() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = InstanceCatalog::enumerate(
            dir.path(),
            &[1000, 2000],
            &densities(&["0.1", "0.2"]),
            1..=2,
        );
        let keys: Vec<_> = catalog
            .instances()
            .iter()
            .map(|i| (i.size, i.density.clone(), i.replica))
            .collect();
        assert_eq!(
            keys,
            vec![
                (1000, "0.1".to_string(), 1),
                (1000, "0.1".to_string(), 2),
                (1000, "0.2".to_string(), 1),
                (1000, "0.2".to_string(), 2),
                (2000, "0.1".to_string(), 1),
                (2000, "0.1".to_string(), 2),
                (2000, "0.2".to_string(), 1),
                (2000, "0.2".to_string(), 2),
            ]
        );
    }

    #[test]
    fn missing_files_are_flagged_not_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dataset = dir.path().join("new_1000_dataset");
        fs::create_dir_all(&dataset).expect("dataset dir");
        fs::write(dataset.join("erdos_n1000_p0c0.5_1.graph"), "p 1000 0\n").expect("instance");

        let catalog =
            InstanceCatalog::enumerate(dir.path(), &[1000], &densities(&["0.5"]), 1..=3);
        let flags: Vec<_> = catalog.instances().iter().map(|i| i.available).collect();
        assert_eq!(flags, vec![true, false, false]);
        assert_eq!(catalog.available_count(), 1);
        assert_eq!(catalog.instances().len(), 3);
    }

    #[test]
    fn instance_id_matches_file_naming_convention() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog =
            InstanceCatalog::enumerate(dir.path(), &[3000], &densities(&["0.7"]), 4..=4);
        let instance = &catalog.instances()[0];
        assert_eq!(instance.id(), "erdos_n3000_p0c0.7_4");
        assert!(instance
            .path
            .ends_with("new_3000_dataset/erdos_n3000_p0c0.7_4.graph"));
    }
}
