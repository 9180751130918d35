use neon_tokyo::charts::bar::{Bar, Orientation};
use neon_tokyo::charts::boxplot::BoxPlot;
use neon_tokyo::charts::hist::Hist;
use neon_tokyo::charts::joint::Joint;
use neon_tokyo::charts::pair::Pair;
use neon_tokyo::charts::pie::Pie;
use neon_tokyo::charts::scatter::Scatter;
use neon_tokyo::charts::violin::Violin;
use neon_tokyo::*;

fn tips() -> Dataset {
    Dataset::from_columns(vec![
        Column::text("day", ["Thu", "Fri", "Sat", "Sun", "Thu", "Fri", "Sat", "Sun"]),
        Column::text("sex", ["F", "M", "F", "M", "M", "F", "M", "F"]),
        Column::numeric("bill", [16.9, 10.3, 21.0, 23.7, 24.6, 25.3, 8.8, 26.9]),
        Column::numeric("tip", [1.0, 1.7, 3.5, 3.3, 3.6, 4.7, 1.3, 5.0]),
        Column::numeric("size", [2.0, 3.0, 3.0, 2.0, 4.0, 4.0, 2.0, 4.0]),
    ])
    .unwrap()
}

fn neon_err(err: &anyhow::Error) -> Option<&NeonError> {
    err.downcast_ref::<NeonError>()
}

#[test]
fn scatter_title_and_legend_follow_columns_and_hue() {
    let theme = Theme::default();
    let ds = tips();
    let chart = Scatter::new(&ds, "tip", "bill", ScatterOptions::default(), &theme).unwrap();
    assert_eq!(chart.title(), "bill by tip");
    assert!(chart.legend_items().is_empty());

    let opts = ScatterOptions {
        hue: Some("sex".into()),
        text: ChartText {
            title: Some("Tips".into()),
            ..ChartText::default()
        },
        ..ScatterOptions::default()
    };
    let chart = Scatter::new(&ds, "tip", "bill", opts, &theme).unwrap();
    assert_eq!(chart.title(), "Tips");
    let labels: Vec<String> = chart.legend_items().into_iter().map(|i| i.label).collect();
    assert_eq!(labels, vec!["F", "M"]);
}

#[test]
fn unknown_column_is_reported() {
    let theme = Theme::default();
    let err = Scatter::new(&tips(), "tip", "nope", ScatterOptions::default(), &theme)
        .err()
        .unwrap();
    assert!(matches!(neon_err(&err), Some(NeonError::MissingColumn(c)) if c == "nope"));
}

#[test]
fn barh_sorts_by_value_ascending() {
    let theme = Theme::default();
    let ds = Dataset::from_columns(vec![
        Column::text("city", ["Tokyo", "Osaka", "Nagoya"]),
        Column::numeric("pop", [37.0, 19.0, 9.5]),
    ])
    .unwrap();
    let chart = Bar::horizontal(&ds, "city", "pop", BarOptions::default(), &theme).unwrap();
    assert_eq!(chart.orientation(), Orientation::Horizontal);
    assert_eq!(chart.categories().unwrap(), ["Nagoya", "Osaka", "Tokyo"]);
    let (_, spans) = chart.groups().next().unwrap();
    let values: Vec<f64> = spans.iter().map(|s| s.value).collect();
    assert_eq!(values, vec![9.5, 19.0, 37.0]);

    let chart = Bar::vertical(&ds, "pop", "city", BarOptions::default(), &theme).unwrap();
    assert_eq!(chart.categories().unwrap(), ["Tokyo", "Osaka", "Nagoya"]);
}

#[test]
fn hist_defaults_title_to_column_and_displot_has_none() {
    let theme = Theme::default();
    let ds = tips();
    let h = Hist::new(&ds, "tip", HistOptions::default(), &theme).unwrap();
    assert_eq!(h.title().as_deref(), Some("tip"));
    assert_eq!(h.distributions().len(), 1);
    let hist = &h.distributions()[0].histogram;
    let area: f64 = hist
        .heights
        .iter()
        .zip(hist.edges.windows(2))
        .map(|(h, e)| h * (e[1] - e[0]))
        .sum();
    assert!((area - 1.0).abs() < 1e-9);

    let opts = DisplotOptions {
        hue: Some("day".into()),
        ..DisplotOptions::default()
    };
    let d = Hist::displot(&ds, "tip", opts, &theme).unwrap();
    assert_eq!(d.title(), None);
    assert_eq!(d.distributions().len(), 4);
}

#[test]
fn displot_with_an_empty_hue_column_draws_nothing() {
    let theme = Theme::default();
    let ds = Dataset::from_columns(vec![
        Column::numeric("v", [1.0, 2.0, 3.0]),
        Column::new("h", vec![Value::Missing; 3]),
    ])
    .unwrap();
    let opts = DisplotOptions {
        hue: Some("h".into()),
        ..DisplotOptions::default()
    };
    let d = Hist::displot(&ds, "v", opts, &theme).unwrap();
    assert!(d.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("empty.svg");
    let opts = DisplotOptions {
        hue: Some("h".into()),
        ..DisplotOptions::default()
    };
    assert!(!displot(&ds, "v", opts, &theme, &out).unwrap());
    assert!(!out.exists());
}

#[test]
fn displot_without_values_is_empty_data() {
    let theme = Theme::default();
    let ds = Dataset::from_columns(vec![
        Column::new("v", vec![Value::Missing; 3]),
        Column::text("h", ["x", "y", "x"]),
    ])
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nothing.svg");

    let err = displot(&ds, "v", DisplotOptions::default(), &theme, &out).unwrap_err();
    assert!(matches!(neon_err(&err), Some(NeonError::EmptyData)));
    assert!(!out.exists());

    // a hue with values does not excuse an empty y column
    let opts = DisplotOptions {
        hue: Some("h".into()),
        ..DisplotOptions::default()
    };
    let err = Hist::displot(&ds, "v", opts, &theme).err().unwrap();
    assert!(matches!(neon_err(&err), Some(NeonError::EmptyData)));
    let err = Hist::new(&ds, "v", HistOptions::default(), &theme).err().unwrap();
    assert!(matches!(neon_err(&err), Some(NeonError::EmptyData)));
}

#[test]
fn stacked_weighted_hist_sits_groups_on_each_other() {
    let theme = Theme::default();
    let ds = Dataset::from_columns(vec![
        Column::numeric("v", [1.0, 2.0, 3.0, 4.0]),
        Column::numeric("w", [1.0, 1.0, 2.0, 4.0]),
        Column::text("g", ["a", "a", "b", "b"]),
    ])
    .unwrap();
    let opts = HistOptions {
        hue: Some("g".into()),
        weights: Some("w".into()),
        stacked: true,
        bins: 3,
        ..HistOptions::default()
    };
    let h = Hist::new(&ds, "v", opts, &theme).unwrap();
    let d = h.distributions();
    assert_eq!(d.len(), 2);
    assert_eq!(d[0].histogram.edges, d[1].histogram.edges);
    assert!(d[0].bottom.iter().all(|b| *b == 0.0));
    assert_eq!(d[1].bottom, d[0].histogram.heights);
    // total weight 8 over bins of width 1
    let top_bin = d[1].bars()[2];
    assert!((top_bin[1].1 - 6.0 / 8.0).abs() < 1e-9);

    let neg = Dataset::from_columns(vec![
        Column::numeric("v", [1.0, 2.0]),
        Column::numeric("w", [1.0, -1.0]),
    ])
    .unwrap();
    let opts = HistOptions {
        weights: Some("w".into()),
        ..HistOptions::default()
    };
    let err = Hist::new(&neg, "v", opts, &theme).err().unwrap();
    assert!(matches!(neon_err(&err), Some(NeonError::InvalidInput(_))));
}

#[test]
fn violin_categories_and_split_halves() {
    let theme = Theme::default();
    let ds = tips();
    let chart = Violin::new(&ds, "tip", "day", ViolinOptions::default(), &theme).unwrap();
    assert_eq!(chart.categories(), ["Thu", "Fri", "Sat", "Sun"]);
    assert_eq!(chart.title(), "day by tip");

    let opts = ViolinOptions {
        hue: Some("sex".into()),
        split: true,
        ..ViolinOptions::default()
    };
    let chart = Violin::new(&ds, "tip", "day", opts, &theme).unwrap();
    assert!(!chart.too_many_hues());
    assert_eq!(chart.legend_items().len(), 2);
}

#[test]
fn pie_wedges_cover_the_circle() {
    let theme = Theme::default();
    let opts = PieOptions {
        labels: Some(vec!["a".into(), "b".into(), "c".into()]),
        ..PieOptions::default()
    };
    let pie = Pie::new(&[1.0, 1.0, 2.0], opts, &theme).unwrap();
    assert_eq!(pie.title(), "pie plot");
    let wedges = pie.wedges();
    assert_eq!(wedges.len(), 3);
    assert!((wedges.iter().map(|w| w.fraction).sum::<f64>() - 1.0).abs() < 1e-12);
    assert!((wedges[2].theta2 - wedges[0].theta1 - 360.0).abs() < 1e-9);
    assert_eq!(wedges[2].percent_text(), "50.0 %");
}

#[test]
fn pie_rejects_negative_and_all_zero_values() {
    let theme = Theme::default();
    let err = Pie::new(&[1.0, -2.0], PieOptions::default(), &theme).err().unwrap();
    assert!(matches!(neon_err(&err), Some(NeonError::InvalidInput(_))));
    let err = Pie::new(&[0.0, 0.0], PieOptions::default(), &theme).err().unwrap();
    assert!(matches!(neon_err(&err), Some(NeonError::EmptyData)));
}

#[test]
fn boxplot_keeps_empty_series_slots() {
    let theme = Theme::default();
    let series = vec![
        Series::new("a", vec![1.0, 2.0, 3.0, 4.0, 100.0]),
        Series::new("empty", vec![]),
        Series::new("c", vec![5.0, 6.0, 7.0]),
    ];
    let chart = BoxPlot::new(&series, BoxOptions::default(), &theme).unwrap();
    assert_eq!(chart.labels(), vec!["a", "empty", "c"]);
    let positions: Vec<f64> = chart.boxes().iter().map(|b| b.position).collect();
    assert_eq!(positions, vec![0.0, 2.0]);
    assert_eq!(chart.boxes()[0].stats.fliers, vec![100.0]);
}

#[test]
fn joint_rejects_hue_for_regression_kinds() {
    let theme = Theme::default();
    let opts = JointOptions {
        hue: Some("sex".into()),
        kind: JointKind::Reg,
        ..JointOptions::default()
    };
    let err = Joint::new(&tips(), "bill", "tip", opts, &theme).err().unwrap();
    assert!(matches!(neon_err(&err), Some(NeonError::InvalidInput(_))));

    let opts = JointOptions {
        kind: JointKind::Reg,
        ..JointOptions::default()
    };
    let joint = Joint::new(&tips(), "bill", "tip", opts, &theme).unwrap();
    let (slope, _) = joint.fit().unwrap();
    assert!(slope > 0.0);
}

#[test]
fn pairplot_corner_hides_the_upper_triangle() {
    let theme = Theme::default();
    let opts = PairOptions {
        hue: Some("sex".into()),
        corner: true,
        ..PairOptions::default()
    };
    let pair = Pair::new(&tips(), opts, &theme).unwrap();
    assert_eq!(pair.x_vars(), ["bill", "tip", "size"]);
    assert_eq!(pair.diag_kind(), DiagKind::Kde);
    let panels = pair.visible_panels();
    assert_eq!(panels.len(), 6);
    assert!(panels.iter().all(|(r, c)| c <= r));
}
