use neon_tokyo::charts::pie::Pie;
use neon_tokyo::charts::scatter::Scatter;
use neon_tokyo::*;
use std::fs;
use std::path::Path;

fn penguins() -> Dataset {
    let species = ["Adelie", "Gentoo", "Chinstrap"];
    let n = 24;
    Dataset::from_columns(vec![
        Column::text("species", (0..n).map(|i| species[i % 3])),
        Column::text("island", (0..n).map(|i| if i % 2 == 0 { "Biscoe" } else { "Dream" })),
        Column::numeric("flipper", (0..n).map(|i| 180.0 + (i % 3) as f64 * 15.0 + (i as f64 * 1.7) % 9.0)),
        Column::numeric("mass", (0..n).map(|i| 3300.0 + (i % 3) as f64 * 900.0 + (i as f64 * 37.0) % 400.0)),
        Column::numeric("bill", (0..n).map(|i| 38.0 + (i % 3) as f64 * 5.0 + (i as f64 * 0.9) % 4.0)),
    ])
    .unwrap()
}

fn font_missing(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<NeonError>(), Some(NeonError::FontUnavailable))
}

/// Run `make` with a scratch `.svg` path and check a non-empty SVG was
/// written. Returns false when the machine has no usable font.
fn renders(name: &str, make: impl FnOnce(&Path) -> anyhow::Result<()>) -> bool {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{name}.svg"));
    match make(&path) {
        Ok(()) => {
            let svg = fs::read_to_string(&path).expect("svg written");
            assert!(svg.starts_with("<svg"), "{name}: not an svg document");
            assert!(svg.len() > 500, "{name}: suspiciously small svg");
            true
        }
        Err(e) if font_missing(&e) => {
            eprintln!("skipping {name}: {e}");
            false
        }
        Err(e) => panic!("{name} failed: {e:#}"),
    }
}

#[test]
fn cartesian_kinds_render() {
    let ds = penguins();
    let theme = Theme::default();
    let hue = || Some("species".to_string());
    let text = || ChartText {
        annotation: "Palmer station, 2007 to 2009. Body mass measured in grams.".into(),
        ..ChartText::default()
    };

    if !renders("scatter", |p| {
        let opts = ScatterOptions { hue: hue(), text: text(), ..Default::default() };
        scatter(&ds, "mass", "flipper", opts, &theme, p)
    }) {
        return;
    }
    renders("bar", |p| {
        let opts = BarOptions { fill: BarFill::Full, ..Default::default() };
        bar(&ds, "mass", "species", opts, &theme, p)
    });
    renders("barh", |p| {
        let opts = BarOptions { fill: BarFill::Semi, hue: Some("island".into()), ..Default::default() };
        barh(&ds, "species", "mass", opts, &theme, p)
    });
    renders("line", |p| {
        let opts = LineOptions {
            hue: hue(),
            dash: LineDash::Dash,
            marker: Some(MarkerShape::Diamond),
            ..Default::default()
        };
        line(&ds, "mass", "flipper", opts, &theme, p)
    });
    renders("hist", |p| {
        let opts = HistOptions { hue: hue(), kde: true, ..Default::default() };
        hist(&ds, "mass", opts, &theme, p)
    });
    renders("hist_step", |p| {
        let opts = HistOptions { histtype: HistType::Step, cumulative: true, ..Default::default() };
        hist(&ds, "bill", opts, &theme, p)
    });
    renders("violin", |p| {
        let opts = ViolinOptions { hue: Some("island".into()), split: true, ..Default::default() };
        violin(&ds, "mass", "species", opts, &theme, p)
    });
    renders("displot", |p| {
        let opts = DisplotOptions { hue: hue(), kde: true, ..Default::default() };
        displot(&ds, "flipper", opts, &theme, p).map(|wrote| assert!(wrote))
    });
    renders("hist_stacked", |p| {
        let opts = HistOptions {
            hue: hue(),
            stacked: true,
            weights: Some("mass".into()),
            ..Default::default()
        };
        hist(&ds, "bill", opts, &theme, p)
    });
}

#[test]
fn figure_kinds_render() {
    let ds = penguins();
    let theme = Theme::extended();

    if !renders("pie", |p| {
        let opts = PieOptions {
            labels: Some(vec!["Adelie".into(), "Gentoo".into(), "Chinstrap".into()]),
            explode: Some(vec![0.1, 0.0, 0.0]),
            ratios: Some(vec![0.6, 0.3, 0.1]),
            ratio_labels: Some(vec!["Biscoe".into(), "Dream".into(), "Torgersen".into()]),
            side_title: Some("Islands".into()),
            side_lines: true,
            ..Default::default()
        };
        pie(&[152.0, 124.0, 68.0], opts, &theme, p)
    }) {
        return;
    }
    let series = ds.grouped_values("mass", "species").unwrap();
    renders("box", |p| {
        let opts = BoxOptions { notch: true, show_means: true, ..Default::default() };
        boxplot(&series, opts, &theme, p)
    });
    renders("scatterbox", |p| {
        let opts = ScatterboxOptions { legend: true, ..Default::default() };
        scatterbox(&series, opts, &theme, p)
    });
    for kind in [
        JointKind::Scatter,
        JointKind::Kde,
        JointKind::Hist,
        JointKind::Hex,
        JointKind::Reg,
        JointKind::Resid,
    ] {
        renders(&format!("joint_{}", kind.as_str()), |p| {
            let opts = JointOptions { kind, ..Default::default() };
            joint(&ds, "flipper", "mass", opts, &theme, p)
        });
    }
    renders("joint_kde_hue", |p| {
        let opts = JointOptions { kind: JointKind::Kde, hue: Some("species".into()), ..Default::default() };
        joint(&ds, "flipper", "mass", opts, &theme, p)
    });
    renders("pair", |p| {
        let opts = PairOptions { hue: Some("species".into()), title: Some("Penguins".into()), ..Default::default() };
        pairplot(&ds, opts, &theme, p)
    });
    renders("pair_corner_reg", |p| {
        let opts = PairOptions { kind: PairKind::Reg, corner: true, ..Default::default() };
        pairplot(&ds, opts, &theme, p)
    });
}

#[test]
fn svg_string_carries_the_background_and_title() {
    let ds = penguins();
    let theme = Theme::default();
    let chart = Scatter::new(&ds, "mass", "bill", ScatterOptions::default(), &theme).unwrap();
    match render_svg_string(&chart) {
        Ok(svg) => {
            assert!(svg.contains("bill by mass"));
            assert!(svg.to_ascii_uppercase().contains("#212946"));
        }
        Err(e) if font_missing(&e) => eprintln!("skipping: {e}"),
        Err(e) => panic!("{e:#}"),
    }
}

#[test]
fn png_output_is_chosen_by_extension() {
    let theme = Theme::default();
    let chart = Pie::new(&[3.0, 2.0, 1.0], PieOptions::default(), &theme).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("pie.png");
    match render(&chart, &out) {
        Ok(()) => {
            let bytes = fs::read(&out).unwrap();
            assert_eq!(&bytes[..4], b"\x89PNG");
        }
        Err(e) if font_missing(&e) => eprintln!("skipping: {e}"),
        Err(e) => panic!("{e:#}"),
    }
}
