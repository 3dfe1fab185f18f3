#![cfg(unix)]

mod support;

use std::fs;

use anyhow::Result;
use misp_bench::{init_tracing, Runner, SweepOutcome};
use support::{algorithm, fake_solver, small_config, write_instance};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sweep_records_successes_and_skips_missing_inputs() -> Result<()> {
    init_tracing();
    let data = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    // replica 2 deliberately absent
    write_instance(data.path(), 1000, "0.5", 1);
    write_instance(data.path(), 1000, "0.5", 3);
    let binary = fake_solver(data.path(), "greedy", "echo 42");

    let config = small_config(
        data.path(),
        out.path(),
        vec![algorithm("greedy", binary)],
    );
    let runner = Runner::new(config);
    let outcome = runner.run().await?;
    assert_eq!(outcome, SweepOutcome::Completed);

    let snapshot = runner.telemetry().snapshot();
    assert_eq!(snapshot.successes, 2);
    assert_eq!(snapshot.missing_inputs, 1);

    let runs = fs::read_to_string(out.path().join("results1000_greedy.csv"))?;
    assert_eq!(runs, "DENSITY,INSTANCE,VALOR\n0.5,1,42\n0.5,3,42\n");

    let summary = fs::read_to_string(out.path().join("results1000_greedy_summary.csv"))?;
    assert_eq!(summary, "DENSITY,MEDIA_CALIDAD,STD_CALIDAD\n0.5,42,0\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn results_are_attributed_per_algorithm() -> Result<()> {
    init_tracing();
    let data = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    for replica in 1..=3 {
        write_instance(data.path(), 1000, "0.5", replica);
    }
    let greedy = fake_solver(data.path(), "greedy", "echo 10");
    let sa = fake_solver(data.path(), "sa", "echo 20");

    let config = small_config(
        data.path(),
        out.path(),
        vec![algorithm("greedy", greedy), algorithm("sa", sa)],
    );
    let outcome = Runner::new(config).run().await?;
    assert_eq!(outcome, SweepOutcome::Completed);

    let greedy_runs = fs::read_to_string(out.path().join("results1000_greedy.csv"))?;
    assert_eq!(greedy_runs, "DENSITY,INSTANCE,VALOR\n0.5,1,10\n0.5,2,10\n0.5,3,10\n");
    let sa_runs = fs::read_to_string(out.path().join("results1000_sa.csv"))?;
    assert_eq!(sa_runs, "DENSITY,INSTANCE,VALOR\n0.5,1,20\n0.5,2,20\n0.5,3,20\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rerunning_a_sweep_rewrites_identical_tables() -> Result<()> {
    init_tracing();
    let data = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    for replica in 1..=3 {
        write_instance(data.path(), 1000, "0.5", replica);
    }
    let binary = fake_solver(data.path(), "greedy", "echo 42");

    let config = small_config(
        data.path(),
        out.path(),
        vec![algorithm("greedy", binary)],
    );

    Runner::new(config.clone()).run().await?;
    let first = fs::read(out.path().join("results1000_greedy.csv"))?;
    let first_summary = fs::read(out.path().join("results1000_greedy_summary.csv"))?;

    Runner::new(config).run().await?;
    let second = fs::read(out.path().join("results1000_greedy.csv"))?;
    let second_summary = fs::read(out.path().join("results1000_greedy_summary.csv"))?;

    assert_eq!(first, second, "rerun must overwrite, not append");
    assert_eq!(first_summary, second_summary);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_sweep_still_writes_tables() -> Result<()> {
    init_tracing();
    let data = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    write_instance(data.path(), 1000, "0.5", 1);
    let binary = fake_solver(data.path(), "greedy", "echo 42");

    let config = small_config(
        data.path(),
        out.path(),
        vec![algorithm("greedy", binary)],
    );
    let runner = Runner::new(config);
    runner.cancellation_token().cancel();

    let outcome = runner.run().await?;
    assert_eq!(outcome, SweepOutcome::Cancelled);
    assert_eq!(runner.telemetry().snapshot().dispatched, 0);

    let runs = fs::read_to_string(out.path().join("results1000_greedy.csv"))?;
    assert_eq!(runs, "DENSITY,INSTANCE,VALOR\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sweep_without_usable_data_reports_it() -> Result<()> {
    init_tracing();
    let data = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    // dataset root exists but holds no instance files
    let binary = fake_solver(data.path(), "greedy", "echo 42");

    let config = small_config(
        data.path(),
        out.path(),
        vec![algorithm("greedy", binary)],
    );
    let runner = Runner::new(config);
    let outcome = runner.run().await?;
    assert_eq!(outcome, SweepOutcome::NoUsableData);
    assert_eq!(runner.telemetry().snapshot().missing_inputs, 3);

    let runs = fs::read_to_string(out.path().join("results1000_greedy.csv"))?;
    assert_eq!(runs, "DENSITY,INSTANCE,VALOR\n");
    let summary = fs::read_to_string(out.path().join("results1000_greedy_summary.csv"))?;
    assert_eq!(summary, "DENSITY,MEDIA_CALIDAD,STD_CALIDAD\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failing_solver_does_not_abort_the_sweep() -> Result<()> {
    init_tracing();
    let data = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    for replica in 1..=3 {
        write_instance(data.path(), 1000, "0.5", replica);
    }
    let greedy = fake_solver(data.path(), "greedy", "echo 42");
    let crash = fake_solver(data.path(), "crash", "echo 'no solution' >&2\nexit 1");

    let config = small_config(
        data.path(),
        out.path(),
        vec![algorithm("greedy", greedy), algorithm("crash", crash)],
    );
    let runner = Runner::new(config);
    let outcome = runner.run().await?;
    assert_eq!(outcome, SweepOutcome::Completed);

    let snapshot = runner.telemetry().snapshot();
    assert_eq!(snapshot.successes, 3);
    assert_eq!(snapshot.failures, 3);

    let crash_runs = fs::read_to_string(out.path().join("results1000_crash.csv"))?;
    assert_eq!(crash_runs, "DENSITY,INSTANCE,VALOR\n");
    let greedy_runs = fs::read_to_string(out.path().join("results1000_greedy.csv"))?;
    assert_eq!(greedy_runs, "DENSITY,INSTANCE,VALOR\n0.5,1,42\n0.5,2,42\n0.5,3,42\n");
    Ok(())
}
