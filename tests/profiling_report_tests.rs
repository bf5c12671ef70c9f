//! Profiling pipeline tests: extraction, aggregation, report rendering

use std::sync::Arc;

use clforge::{
    DummyDevice, Execution, PoolDescriptor, PoolExecution, PoolType, ProfilingSample,
    ProfilingSession, Tensor, TensorShape, WorkGroupTuner,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn test_interval_derivation_reference_values() {
    let sample = ProfilingSample::from_timestamps(1_000_000, 2_500_000, 4_000_000, 9_000_000);
    assert_eq!(sample.enqueue_time, 1.5);
    assert_eq!(sample.submit_time, 1.5);
    assert_eq!(sample.kernel_time, 5.0);
    assert!(sample.enqueue_time >= 0.0);
    assert!(sample.submit_time >= 0.0);
    assert!(sample.kernel_time >= 0.0);
}

#[test]
fn test_report_ranks_operators_by_kernel_time() -> anyhow::Result<()> {
    init_tracing();
    // two pooling operators with very different synthetic kernel costs,
    // keyed apart by their global sizes
    let device = Arc::new(DummyDevice::new().with_cost_model(|global, _| {
        if global[0] >= 8 {
            9_000_000
        } else {
            1_000_000
        }
    }));

    let mut session = ProfilingSession::enabled();
    let mut tuner = WorkGroupTuner::new();

    let desc = PoolDescriptor::new(PoolType::Max, [2, 2], [2, 2]);
    let mut cheap = PoolExecution::new("pool_cheap", &desc, device.clone());
    let input = Tensor::new(TensorShape::new(1, 8, 8, 4), device.fake_buffer());
    let output = Tensor::new(TensorShape::new(1, 4, 4, 4), device.fake_buffer());
    cheap.resize(&[input], &[output], &mut tuner)?;

    let mut costly = PoolExecution::new("pool_costly", &desc, device.clone());
    let input = Tensor::new(TensorShape::new(1, 16, 16, 4), device.fake_buffer());
    let output = Tensor::new(TensorShape::new(1, 8, 8, 4), device.fake_buffer());
    costly.resize(&[input], &[output], &mut tuner)?;

    cheap.execute(&mut session)?;
    costly.execute(&mut session)?;

    let table = session.report("Pooling Cost", &["name", "kernel(ms)"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0][0], "pool_costly");
    assert_eq!(table.rows[0][1], "9.000");
    assert_eq!(table.rows[1][0], "pool_cheap");
    assert_eq!(table.rows[1][1], "1.000");
    Ok(())
}

#[test]
fn test_rendered_table_geometry() {
    let mut session = ProfilingSession::enabled();
    session.record("pool_main", &[4.25, 0.125]);
    session.record("pool_aux", &[0.5, 0.0]);

    let rendered = session
        .report("Operator Cost", &["name", "kernel(ms)", "enqueue(ms)"])
        .render();
    let lines: Vec<&str> = rendered.lines().collect();

    // rule before title, after title, after header, after last data row
    let dash_lines: Vec<&&str> = lines.iter().filter(|l| l.starts_with('-')).collect();
    assert_eq!(dash_lines.len(), 4);

    // every rule and framed row spans the same width
    let width = lines[0].len();
    for line in lines
        .iter()
        .filter(|l| l.starts_with('-') || l.starts_with('|'))
    {
        assert_eq!(line.len(), width);
    }

    // headers + 2 data rows framed with '|'
    let framed: Vec<&&str> = lines.iter().filter(|l| l.starts_with('|')).collect();
    assert_eq!(framed.len(), 3);

    // the exactly-zero enqueue value is filtered to a blank cell
    let aux_row = framed.iter().find(|l| l.contains("pool_aux")).unwrap();
    assert!(!aux_row.contains("0.000"));
    assert!(aux_row.ends_with("|"));
}

#[test]
fn test_title_offset_matches_reference_formula() {
    let mut session = ProfilingSession::enabled();
    session.record("convA", &[2.0]);
    let rendered = session.report("Summary", &["name", "cost"]).render();
    let lines: Vec<&str> = rendered.lines().collect();

    let rule_len = lines[0].len();
    let title_line = lines[1];
    // right-justified at rule_len / 2 + title_len / 2, integer truncation
    assert_eq!(title_line.len(), rule_len / 2 + "Summary".len() / 2);
    assert!(title_line.ends_with("Summary"));
}

#[test]
fn test_session_reset_between_measurement_runs() -> anyhow::Result<()> {
    init_tracing();
    let device = Arc::new(DummyDevice::new());
    let desc = PoolDescriptor::new(PoolType::Average, [2, 2], [2, 2]);
    let mut pool = PoolExecution::new("pool_run", &desc, device.clone());
    let input = Tensor::new(TensorShape::new(1, 4, 4, 4), device.fake_buffer());
    let output = Tensor::new(TensorShape::new(1, 2, 2, 4), device.fake_buffer());
    let mut tuner = WorkGroupTuner::new();
    pool.resize(&[input], &[output], &mut tuner)?;

    let mut session = ProfilingSession::enabled();
    pool.execute(&mut session)?;
    assert!(!session.is_empty());

    session.reset();
    assert!(session.is_empty());
    let table = session.report("Empty Run", &["name", "kernel(ms)"]);
    assert!(table.rows.is_empty());
    Ok(())
}
