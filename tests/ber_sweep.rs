use std::sync::atomic::AtomicBool;

use quadspread_rs::dsss::{LinkConfig, TrialRunner};
use quadspread_rs::sweep::{Silent, SweepOptions, SweepParams, run_sweep};

#[test]
fn average_ber_does_not_rise_with_snr() {
    let runner = TrialRunner::new(LinkConfig::default()).unwrap();
    let params = SweepParams {
        from_db: -40.0,
        to_db: -10.0,
        step_db: 10.0,
        repeat_count: 100,
    };
    let options = SweepOptions {
        workers: 4,
        seed: 7,
    };

    let report = run_sweep(&runner, &params, &options, &AtomicBool::new(false), &Silent).unwrap();
    assert!(!report.cancelled);

    let snrs: Vec<f64> = report.points.iter().map(|p| p.snr_db).collect();
    assert_eq!(snrs, vec![-40.0, -30.0, -20.0, -10.0]);
    assert!(report.points.iter().all(|p| p.trials == 100));

    for pair in report.points.windows(2) {
        assert!(
            pair[1].average_ber <= pair[0].average_ber + 0.05,
            "BER rose from {} at {} dB to {} at {} dB",
            pair[0].average_ber,
            pair[0].snr_db,
            pair[1].average_ber,
            pair[1].snr_db
        );
    }
    assert!(report.points[0].average_ber > report.points[3].average_ber);
}
