use sparse_allreduce_sim::{
    SimErr,
    sweep::{self, CSV_HEADER, SweepSpec},
};

fn spec(json: &str) -> SweepSpec {
    serde_json::from_str(json).unwrap()
}

#[test]
fn reports_come_back_in_grid_order() {
    let spec = spec(
        r#"{
            "num_workers": [2, 3],
            "block_sizes": [4, 8],
            "bf_widths": [1, 4],
            "sparsities": [0.9],
            "data_size": 512,
            "seed": 5
        }"#,
    );

    let reports = sweep::run_sweep(&spec).unwrap();
    assert_eq!(reports.len(), spec.len());

    for (report, point) in reports.iter().zip(spec.points()) {
        assert_eq!(report.block_size, point.block_size);
        assert_eq!(report.bf_width, point.bf_width);
        assert_eq!(report.num_workers, point.num_workers);
        assert!(report.final_time > 0);
        assert!(report.rounds > 0);
    }

    assert_eq!(sweep::run_sweep(&spec).unwrap(), reports);
}

#[test]
fn wider_fusion_takes_fewer_rounds() {
    let spec = spec(
        r#"{
            "num_workers": [4],
            "block_sizes": [16],
            "bf_widths": [1, 16],
            "sparsities": [0.0],
            "data_size": 4096,
            "granularity": "block",
            "seed": 1,
            "validation": "fast"
        }"#,
    );

    let reports = sweep::run_sweep(&spec).unwrap();
    assert_eq!(reports[0].rounds, 256);
    assert_eq!(reports[1].rounds, 16);
    assert!(reports[1].final_time < reports[0].final_time);
}

#[test]
fn misaligned_data_size_fails_the_sweep() {
    let spec = spec(
        r#"{
            "num_workers": [2],
            "block_sizes": [4, 7],
            "bf_widths": [1],
            "sparsities": [0.5],
            "data_size": 64
        }"#,
    );

    assert_eq!(
        sweep::run_sweep(&spec),
        Err(SimErr::SizeNotAligned {
            size: 64,
            block_size: 7
        })
    );
}

#[test]
fn csv_has_one_row_per_point() {
    let spec = spec(
        r#"{
            "num_workers": [2],
            "block_sizes": [8],
            "bf_widths": [2],
            "sparsities": [0.5, 0.99],
            "data_size": 256,
            "seed": 3,
            "cost": { "network_latency": 0 }
        }"#,
    );

    let reports = sweep::run_sweep(&spec).unwrap();
    let mut out = Vec::new();
    sweep::write_csv(&mut out, &reports).unwrap();

    let csv = String::from_utf8(out).unwrap();
    let lines: Vec<_> = csv.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].starts_with("8,2,0.5,2,"));
    assert!(lines[2].starts_with("8,2,0.99,2,"));
}
