mod common;

use common::synthetic_image::{paint_cols, paint_segment, with_rows};
use li_core::{Error, Image, ImageView};
use li_detect::{
    BatchOutcome, DetectMode, InspectConfig, Orientation, Roi, Verdict, inspect, inspect_batch,
    roi_profiles,
};

#[test]
fn bright_row_is_one_global_defect_for_any_channel_count() {
    let img = with_rows(64, 64, 50, &[(30, 255)]);

    for channel_count in [1, 4] {
        let cfg = InspectConfig {
            channel_count,
            ..InspectConfig::default()
        };
        let res = inspect(&img.as_view(), &cfg).expect("inspection runs");

        assert_eq!(
            res.defects.len(),
            1,
            "channel_count={channel_count}: {:?}",
            res.defects
        );
        let d = &res.defects[0];
        assert_eq!(d.orientation, Orientation::Horizontal);
        assert_eq!(d.mode, DetectMode::Global);
        assert_eq!(d.index, 30);
        assert!(d.diff > 20.0, "diff={}", d.diff);
        assert_eq!(res.verdict(), Verdict::Fail);
    }
}

#[test]
fn uniform_image_has_no_defects() {
    let img = Image::new_fill(8, 8, 777u16);
    let res = inspect(&img.as_view(), &InspectConfig::default()).expect("inspection runs");
    assert!(res.defects.is_empty());
    assert_eq!(res.verdict(), Verdict::Pass);
}

#[test]
fn zero_sized_image_is_rejected() {
    let data: Vec<u16> = Vec::new();
    let view = ImageView::from_slice(16, 0, 16, &data).expect("valid empty view");
    let err = inspect(&view, &InspectConfig::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn strip_hides_defects_near_the_border() {
    let img = with_rows(64, 64, 50, &[(2, 255)]);
    let base = InspectConfig {
        channel_count: 1,
        ..InspectConfig::default()
    };

    let seen = inspect(&img.as_view(), &base).expect("inspection runs");
    assert_eq!(seen.defects.len(), 1);
    assert_eq!(seen.defects[0].index, 2);

    let stripped = InspectConfig { strip_h: 4, ..base };
    let hidden = inspect(&img.as_view(), &stripped).expect("inspection runs");
    assert!(hidden.defects.is_empty());
}

#[test]
fn local_segment_is_found_only_in_part_mode() {
    let img = paint_segment(with_rows(400, 400, 50, &[]), 125, 200..240, 200);
    let cfg = InspectConfig {
        channel_count: 1,
        ..InspectConfig::default()
    };
    let res = inspect(&img.as_view(), &cfg).expect("inspection runs");

    assert_eq!(res.defects.len(), 1, "{:?}", res.defects);
    let d = &res.defects[0];
    assert_eq!(d.orientation, Orientation::Horizontal);
    assert_eq!(d.index, 125);
    assert_eq!(d.mode, DetectMode::Part { by: 3, bx: 5 });
    assert!((d.diff - 112.5).abs() < 1e-3, "diff={}", d.diff);
    assert!(res.profiles.row_diff[125] < 20.0);
}

#[test]
fn short_column_segment_passes() {
    let mut data = vec![60u16; 100 * 100];
    for y in 70..80 {
        data[y * 100 + 44] = 0;
    }
    let img = Image::from_vec(100, 100, data).expect("valid image");
    let cfg = InspectConfig {
        channel_count: 1,
        ..InspectConfig::default()
    };
    let res = inspect(&img.as_view(), &cfg).expect("inspection runs");

    assert!(res.defects.is_empty(), "{:?}", res.defects);
    assert_eq!(res.verdict(), Verdict::Pass);
}

#[test]
fn output_is_sorted_unique_and_deterministic() {
    let img = paint_cols(with_rows(512, 512, 50, &[(100, 255), (301, 255)]), &[200], 0);
    let cfg = InspectConfig::default();

    let first = inspect(&img.as_view(), &cfg).expect("inspection runs");
    let second = inspect(&img.as_view(), &cfg).expect("inspection runs");
    assert_eq!(first, second);

    let keys: Vec<_> = first
        .defects
        .iter()
        .map(|d| (d.mode.rank(), d.index, d.orientation))
        .collect();
    assert!(keys.windows(2).all(|w| w[0] < w[1]), "{keys:?}");

    let lines: Vec<_> = first
        .defects
        .iter()
        .map(|d| (d.orientation, d.index, d.mode))
        .collect();
    assert_eq!(
        lines,
        vec![
            (Orientation::Horizontal, 100, DetectMode::Global),
            (Orientation::Vertical, 200, DetectMode::Global),
            (Orientation::Horizontal, 301, DetectMode::Global),
        ]
    );

    assert_eq!(first.profiles.row_diff.len(), 512);
    assert_eq!(first.channels.len(), 4);
    assert!(first.defects.iter().all(|d| d.diff >= 0.0));
}

#[test]
fn batch_reports_loader_failures_in_place() {
    let names = vec!["good.png", "missing.png", "bad_row.png"];
    let cfg = InspectConfig::default();
    let items = inspect_batch(names, &cfg, |name: &&str| match *name {
        "good.png" => Ok(Image::new_fill(64, 64, 120u16)),
        "bad_row.png" => Ok(with_rows(64, 64, 50, &[(30, 255)])),
        other => Err(format!("cannot open {other}")),
    })
    .expect("valid config");

    assert_eq!(items.len(), 3);
    assert_eq!(items[1].source, "missing.png");
    assert!(matches!(
        &items[0].outcome,
        BatchOutcome::Inspected {
            verdict: Verdict::Pass,
            ..
        }
    ));
    assert!(matches!(&items[1].outcome, BatchOutcome::Failed { .. }));
    assert!(matches!(
        &items[2].outcome,
        BatchOutcome::Inspected {
            verdict: Verdict::Fail,
            ..
        }
    ));
}

#[test]
fn roi_outside_image_is_out_of_bounds() {
    let img = with_rows(64, 64, 50, &[(30, 255)]);
    let err = roi_profiles(
        &img.as_view(),
        Roi::new(60, 60, 8, 8),
        &InspectConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err, Error::OutOfBounds);
}
