use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use misp_bench::{AlgorithmSpec, FlagContract, ParamSet, SignConvention, SweepConfig};

/// Writes an executable shell script standing in for a solver binary.
pub fn fake_solver(dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("write solver script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod solver script");
    path
}

/// Creates one benchmark instance file under the conventional dataset layout.
pub fn write_instance(root: &Path, size: u32, density: &str, replica: u32) {
    let dir = root.join(format!("new_{size}_dataset"));
    fs::create_dir_all(&dir).expect("create dataset dir");
    let path = dir.join(format!("erdos_n{size}_p0c{density}_{replica}.graph"));
    fs::write(&path, "p edge 10 0\n").expect("write instance");
}

pub fn algorithm(name: &str, binary: PathBuf) -> AlgorithmSpec {
    AlgorithmSpec {
        name: name.to_string(),
        binary,
        flags: FlagContract::input_only(),
        sign: SignConvention::NonNegative,
        params: ParamSet::default(),
    }
}

/// A small single-size sweep over density 0.5, replicas 1..=3.
pub fn small_config(
    dataset_root: &Path,
    output_dir: &Path,
    algorithms: Vec<AlgorithmSpec>,
) -> SweepConfig {
    SweepConfig::builder()
        .dataset_root(dataset_root)
        .output_dir(output_dir)
        .sizes([1000])
        .densities(["0.5"])
        .replicas(1..=3)
        .time_budget(Duration::from_secs(5))
        .grace(Duration::from_secs(5))
        .workers(2)
        .algorithms(algorithms)
        .build()
        .expect("test config should validate")
}
