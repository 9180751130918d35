use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use neon_tokyo::charts::{bar, boxplot, hist, joint, line, pair, pie, scatter, violin};
use neon_tokyo::{ChartText, Dataset, LineDash, MarkerShape, Series, Theme};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "neon",
    version,
    about = "Render neon styled charts from CSV or JSON tables"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scatter plot of two numeric columns.
    Scatter(XyArgs),
    /// Vertical bars, one per row.
    Bar(BarArgs),
    /// Horizontal bars sorted by value.
    Barh(BarArgs),
    /// Line chart, one line per hue value.
    Line(LineArgs),
    /// Histogram of one numeric column.
    Hist(HistArgs),
    /// Violins of a numeric column per category.
    Violin(ViolinArgs),
    /// Pie chart with an optional stacked side bar.
    Pie(PieArgs),
    /// Box plot of several columns or of one column grouped by another.
    #[command(name = "box")]
    Boxplot(BoxArgs),
    /// Box plot with the raw points scattered over each box.
    Scatterbox(ScatterboxArgs),
    /// Joint plot with marginal distributions.
    Joint(JointArgs),
    /// Histograms per hue value on a shared axis.
    Displot(DisplotArgs),
    /// Grid of pairwise plots over numeric columns.
    Pair(PairArgs),
}

#[derive(Args, Debug)]
struct Common {
    /// Input table (.csv, or .json holding an array of records).
    #[arg(short, long)]
    data: PathBuf,
    /// Output file; .svg selects SVG, anything else PNG.
    #[arg(short, long)]
    out: PathBuf,
    /// JSON file with theme overrides.
    #[arg(long)]
    theme: Option<PathBuf>,
    #[arg(long)]
    title: Option<String>,
    /// Display name of the x axis (defaults to the column name).
    #[arg(long)]
    x_name: Option<String>,
    #[arg(long)]
    y_name: Option<String>,
    /// Free text wrapped under the chart.
    #[arg(long, default_value = "")]
    annotation: String,
    /// Categorical column splitting the data into colored groups.
    #[arg(long)]
    hue: Option<String>,
    /// Figure width in pixels.
    #[arg(long)]
    width: Option<u32>,
    /// Figure height in pixels.
    #[arg(long)]
    height: Option<u32>,
}

impl Common {
    fn text(&self) -> ChartText {
        ChartText {
            title: self.title.clone(),
            x_name: self.x_name.clone(),
            y_name: self.y_name.clone(),
            annotation: self.annotation.clone(),
            ..ChartText::default()
        }
    }

    fn theme(&self) -> Result<Theme> {
        let theme = match &self.theme {
            Some(path) => Theme::from_json_file(path)?,
            None => Theme::default(),
        };
        let (w, h) = self.figsize_or(theme.figsize);
        Ok(theme.with_figsize(w, h))
    }

    /// `--width`/`--height` where given, `default` otherwise.
    fn figsize_or(&self, (w, h): (u32, u32)) -> (u32, u32) {
        (self.width.unwrap_or(w), self.height.unwrap_or(h))
    }

    fn dataset(&self) -> Result<Dataset> {
        load_dataset(&self.data)
    }
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv")
        .to_ascii_lowercase();
    match ext.as_str() {
        "json" => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            Dataset::from_json_records(&raw)
        }
        _ => Dataset::from_csv_path(path),
    }
}

#[derive(Args, Debug)]
struct XyArgs {
    #[command(flatten)]
    common: Common,
    #[arg(short, long)]
    x: String,
    #[arg(short, long)]
    y: String,
    /// Marker area.
    #[arg(long, default_value_t = 80.0)]
    s: f64,
    #[arg(long, default_value_t = 0.7)]
    alpha: f64,
}

#[derive(Args, Debug)]
struct BarArgs {
    #[command(flatten)]
    common: Common,
    #[arg(short, long)]
    x: String,
    #[arg(short, long)]
    y: String,
    /// empty, full or semi.
    #[arg(long, default_value = "empty")]
    fill: bar::BarFill,
    #[arg(long, default_value_t = 0.8)]
    bar_width: f64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DashArg {
    Solid,
    Dash,
    Dot,
}

impl From<DashArg> for LineDash {
    fn from(d: DashArg) -> Self {
        match d {
            DashArg::Solid => LineDash::Solid,
            DashArg::Dash => LineDash::Dash,
            DashArg::Dot => LineDash::Dot,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MarkerArg {
    Circle,
    Square,
    Triangle,
    Diamond,
    Cross,
    X,
}

impl From<MarkerArg> for MarkerShape {
    fn from(m: MarkerArg) -> Self {
        match m {
            MarkerArg::Circle => MarkerShape::Circle,
            MarkerArg::Square => MarkerShape::Square,
            MarkerArg::Triangle => MarkerShape::Triangle,
            MarkerArg::Diamond => MarkerShape::Diamond,
            MarkerArg::Cross => MarkerShape::Cross,
            MarkerArg::X => MarkerShape::X,
        }
    }
}

#[derive(Args, Debug)]
struct LineArgs {
    #[command(flatten)]
    common: Common,
    #[arg(short, long)]
    x: String,
    #[arg(short, long)]
    y: String,
    #[arg(long, value_enum, default_value = "solid")]
    dash: DashArg,
    #[arg(long, value_enum)]
    marker: Option<MarkerArg>,
}

#[derive(Args, Debug)]
struct HistArgs {
    #[command(flatten)]
    common: Common,
    #[arg(short, long)]
    y: String,
    #[arg(long, default_value_t = 20)]
    bins: usize,
    /// bar or step.
    #[arg(long, default_value = "bar")]
    histtype: hist::HistType,
    #[arg(long)]
    cumulative: bool,
    /// Numeric column weighting each row.
    #[arg(long)]
    weights: Option<String>,
    /// Stack the hue groups on shared bins.
    #[arg(long)]
    stacked: bool,
    /// Overlay a kernel density estimate.
    #[arg(long)]
    kde: bool,
}

#[derive(Args, Debug)]
struct ViolinArgs {
    #[command(flatten)]
    common: Common,
    /// Category column.
    #[arg(short, long)]
    x: String,
    #[arg(short, long)]
    y: String,
    /// Draw two hue groups as the halves of one violin.
    #[arg(long)]
    split: bool,
    #[arg(long, default_value_t = 0.5)]
    widths: f64,
    /// Outlines only.
    #[arg(long)]
    no_fill: bool,
    /// Leave out the quartile box inside each violin.
    #[arg(long)]
    no_box: bool,
}

#[derive(Args, Debug)]
struct PieArgs {
    #[command(flatten)]
    common: Common,
    /// Numeric column with the wedge sizes.
    #[arg(long)]
    values: String,
    /// Column with the wedge labels.
    #[arg(long)]
    labels: Option<String>,
    /// Radial offsets per wedge, comma separated.
    #[arg(long, value_delimiter = ',')]
    explode: Option<Vec<f64>>,
    #[arg(long, default_value_t = 0.0)]
    start_angle: f64,
    /// List labels in a legend instead of next to the wedges.
    #[arg(long)]
    legend: bool,
    /// Fractions for the stacked side bar, comma separated.
    #[arg(long, value_delimiter = ',')]
    ratios: Option<Vec<f64>>,
    #[arg(long, value_delimiter = ',')]
    ratio_labels: Option<Vec<String>>,
    #[arg(long)]
    side_title: Option<String>,
    /// 1 rose, 2 lemon, 3 ice, 4 violet, 5 orange.
    #[arg(long, default_value_t = 1)]
    side_bar_color: u8,
    /// Dashed connectors from the pie to the side bar.
    #[arg(long)]
    side_lines: bool,
}

#[derive(Args, Debug)]
struct SeriesArgs {
    /// Numeric columns, one box each.
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["y", "by"])]
    columns: Option<Vec<String>>,
    /// Numeric column split into one box per value of `--by`.
    #[arg(short, long, requires = "by")]
    y: Option<String>,
    #[arg(long, requires = "y")]
    by: Option<String>,
}

impl SeriesArgs {
    fn series(&self, data: &Dataset) -> Result<Vec<Series>> {
        if let (Some(y), Some(by)) = (&self.y, &self.by) {
            return data.grouped_values(y, by);
        }
        let names: Vec<String> = match &self.columns {
            Some(cols) => cols.clone(),
            None => data.numeric_columns().into_iter().map(str::to_string).collect(),
        };
        names
            .iter()
            .map(|name| {
                let values = data.numeric(name)?.into_iter().flatten().collect();
                Ok(Series::new(name.clone(), values))
            })
            .collect()
    }
}

#[derive(Args, Debug)]
struct BoxArgs {
    #[command(flatten)]
    common: Common,
    #[command(flatten)]
    series: SeriesArgs,
    #[arg(long, default_value_t = 1.5)]
    whis: f64,
    #[arg(long)]
    notch: bool,
    #[arg(long)]
    show_means: bool,
    #[arg(long)]
    hide_fliers: bool,
}

#[derive(Args, Debug)]
struct ScatterboxArgs {
    #[command(flatten)]
    common: Common,
    #[command(flatten)]
    series: SeriesArgs,
    #[arg(long)]
    legend: bool,
    #[arg(long, default_value_t = 30.0)]
    s: f64,
}

#[derive(Args, Debug)]
struct JointArgs {
    #[command(flatten)]
    common: Common,
    #[arg(short, long)]
    x: String,
    #[arg(short, long)]
    y: String,
    /// scatter, kde, hist, hex, reg or resid.
    #[arg(long, default_value = "scatter")]
    kind: joint::JointKind,
    #[arg(long, default_value_t = 6)]
    ratio: u32,
    #[arg(long, default_value_t = 0.2)]
    space: f64,
    /// 1-based palette color used without hue.
    #[arg(long, default_value_t = 1)]
    num: usize,
    #[arg(long, value_enum)]
    marker: Option<MarkerArg>,
}

#[derive(Args, Debug)]
struct DisplotArgs {
    #[command(flatten)]
    common: Common,
    #[arg(short, long)]
    y: String,
    #[arg(long, default_value_t = 30)]
    bins: usize,
    #[arg(long)]
    kde: bool,
}

#[derive(Args, Debug)]
struct PairArgs {
    #[command(flatten)]
    common: Common,
    /// Columns to include (defaults to every numeric column).
    #[arg(long, value_delimiter = ',')]
    vars: Option<Vec<String>>,
    /// Columns across the grid (defaults to --vars).
    #[arg(long, value_delimiter = ',')]
    x_vars: Option<Vec<String>>,
    /// Columns down the grid (defaults to --vars).
    #[arg(long, value_delimiter = ',')]
    y_vars: Option<Vec<String>>,
    /// Hue values to draw, in order.
    #[arg(long, value_delimiter = ',')]
    hue_order: Option<Vec<String>>,
    /// scatter, reg, hist or kde.
    #[arg(long, default_value = "scatter")]
    kind: pair::PairKind,
    /// auto, hist or kde.
    #[arg(long, default_value = "auto")]
    diag_kind: pair::DiagKind,
    /// Lower triangle only.
    #[arg(long)]
    corner: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Scatter(a) => cmd_scatter(a),
        Command::Bar(a) => cmd_bar(a, false),
        Command::Barh(a) => cmd_bar(a, true),
        Command::Line(a) => cmd_line(a),
        Command::Hist(a) => cmd_hist(a),
        Command::Violin(a) => cmd_violin(a),
        Command::Pie(a) => cmd_pie(a),
        Command::Boxplot(a) => cmd_box(a),
        Command::Scatterbox(a) => cmd_scatterbox(a),
        Command::Joint(a) => cmd_joint(a),
        Command::Displot(a) => cmd_displot(a),
        Command::Pair(a) => cmd_pair(a),
    }
}

fn done(out: &Path) -> Result<()> {
    eprintln!("Wrote chart to {}", out.display());
    Ok(())
}

fn cmd_scatter(a: XyArgs) -> Result<()> {
    let c = &a.common;
    let opts = scatter::ScatterOptions {
        text: c.text(),
        hue: c.hue.clone(),
        s: a.s,
        alpha: a.alpha,
    };
    scatter::scatter(&c.dataset()?, &a.y, &a.x, opts, &c.theme()?, &c.out)?;
    done(&c.out)
}

fn cmd_bar(a: BarArgs, horizontal: bool) -> Result<()> {
    let c = &a.common;
    let opts = bar::BarOptions {
        text: c.text(),
        hue: c.hue.clone(),
        fill: a.fill,
        width: a.bar_width,
    };
    let (data, theme) = (c.dataset()?, c.theme()?);
    if horizontal {
        bar::barh(&data, &a.y, &a.x, opts, &theme, &c.out)?;
    } else {
        bar::bar(&data, &a.y, &a.x, opts, &theme, &c.out)?;
    }
    done(&c.out)
}

fn cmd_line(a: LineArgs) -> Result<()> {
    let c = &a.common;
    let opts = line::LineOptions {
        text: c.text(),
        hue: c.hue.clone(),
        dash: a.dash.into(),
        marker: a.marker.map(Into::into),
    };
    line::line(&c.dataset()?, &a.y, &a.x, opts, &c.theme()?, &c.out)?;
    done(&c.out)
}

fn cmd_hist(a: HistArgs) -> Result<()> {
    let c = &a.common;
    let opts = hist::HistOptions {
        text: c.text(),
        hue: c.hue.clone(),
        bins: a.bins,
        histtype: a.histtype,
        cumulative: a.cumulative,
        weights: a.weights,
        stacked: a.stacked,
        kde: a.kde,
        palette: None,
    };
    hist::hist(&c.dataset()?, &a.y, opts, &c.theme()?, &c.out)?;
    done(&c.out)
}

fn cmd_violin(a: ViolinArgs) -> Result<()> {
    let c = &a.common;
    let opts = violin::ViolinOptions {
        text: c.text(),
        hue: c.hue.clone(),
        split: a.split,
        widths: a.widths,
        fill: !a.no_fill,
        inner_box: !a.no_box,
    };
    violin::violin(&c.dataset()?, &a.y, &a.x, opts, &c.theme()?, &c.out)?;
    done(&c.out)
}

fn cmd_pie(a: PieArgs) -> Result<()> {
    let c = &a.common;
    let data = c.dataset()?;
    let cells = data.numeric(&a.values)?;
    let rows: Vec<usize> = (0..data.len()).filter(|&r| cells[r].is_some()).collect();
    let values: Vec<f64> = rows.iter().filter_map(|&r| cells[r]).collect();
    let labels = match &a.labels {
        Some(col) => Some(
            rows.iter()
                .map(|&r| Ok(data.value(col, r)?.label().unwrap_or_default()))
                .collect::<Result<Vec<String>>>()?,
        ),
        None => None,
    };
    let opts = pie::PieOptions {
        text: c.text(),
        labels,
        explode: a.explode,
        start_angle: a.start_angle,
        legend: a.legend,
        ratios: a.ratios,
        ratio_labels: a.ratio_labels,
        side_title: a.side_title,
        side_bar_color: a.side_bar_color,
        side_lines: a.side_lines,
        ..pie::PieOptions::default()
    };
    pie::pie(&values, opts, &c.theme()?, &c.out)?;
    done(&c.out)
}

fn cmd_box(a: BoxArgs) -> Result<()> {
    let c = &a.common;
    let series = a.series.series(&c.dataset()?)?;
    let opts = boxplot::BoxOptions {
        text: c.text(),
        whis: a.whis,
        notch: a.notch,
        show_means: a.show_means,
        show_fliers: !a.hide_fliers,
        ..boxplot::BoxOptions::default()
    };
    boxplot::boxplot(&series, opts, &c.theme()?, &c.out)?;
    done(&c.out)
}

fn cmd_scatterbox(a: ScatterboxArgs) -> Result<()> {
    let c = &a.common;
    let series = a.series.series(&c.dataset()?)?;
    let defaults = boxplot::ScatterboxOptions::default();
    let opts = boxplot::ScatterboxOptions {
        boxes: boxplot::BoxOptions {
            text: c.text(),
            ..defaults.boxes.clone()
        },
        legend: a.legend,
        s: a.s,
        ..defaults
    };
    boxplot::scatterbox(&series, opts, &c.theme()?, &c.out)?;
    done(&c.out)
}

fn cmd_joint(a: JointArgs) -> Result<()> {
    let c = &a.common;
    let mut opts = joint::JointOptions {
        text: c.text(),
        hue: c.hue.clone(),
        kind: a.kind,
        ratio: a.ratio,
        space: a.space,
        num: a.num,
        marker: a.marker.map(Into::into),
        ..joint::JointOptions::default()
    };
    if let Some(side) = c.width.or(c.height) {
        opts.size = side;
    }
    joint::joint(&c.dataset()?, &a.x, &a.y, opts, &c.theme()?, &c.out)?;
    done(&c.out)
}

fn cmd_displot(a: DisplotArgs) -> Result<()> {
    let c = &a.common;
    let opts = hist::DisplotOptions {
        text: c.text(),
        hue: c.hue.clone(),
        bins: a.bins,
        kde: a.kde,
        figsize: c.figsize_or(hist::DisplotOptions::default().figsize),
    };
    if hist::displot(&c.dataset()?, &a.y, opts, &c.theme()?, &c.out)? {
        done(&c.out)?;
    }
    Ok(())
}

fn cmd_pair(a: PairArgs) -> Result<()> {
    let c = &a.common;
    let opts = pair::PairOptions {
        title: c.title.clone(),
        hue: c.hue.clone(),
        hue_order: a.hue_order,
        vars: a.vars,
        x_vars: a.x_vars,
        y_vars: a.y_vars,
        kind: a.kind,
        diag_kind: a.diag_kind,
        corner: a.corner,
        ..pair::PairOptions::default()
    };
    pair::pairplot(&c.dataset()?, opts, &c.theme()?, &c.out)?;
    done(&c.out)
}
