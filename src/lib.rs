//! neon_tokyo
//!
//! Neon/cyberpunk styled statistical charts on a dark background, rendered
//! with plotters to SVG or PNG. Pairs with the `neon` CLI.
//!
//! ### Features
//! - Scatter, bar, barh, line, histogram, violin, pie, box and scatterbox charts
//! - Joint plots (scatter, kde, hist, hex, reg, resid), displots and pair plots
//! - Glow effect from stacked translucent redraws of each shape
//! - Hue partitioning by a categorical column with a right-hand legend panel
//! - Wrapped free-text annotations under the axes
//!
//! ### Example
//! ```no_run
//! use neon_tokyo::{Dataset, Theme};
//! use neon_tokyo::charts::scatter::{scatter, ScatterOptions};
//!
//! let data = Dataset::from_csv_path("penguins.csv")?;
//! let opts = ScatterOptions {
//!     hue: Some("species".into()),
//!     ..Default::default()
//! };
//! scatter(&data, "body_mass_g", "flipper_length_mm", opts, &Theme::default(), "mass.svg")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod annotation;
pub mod charts;
pub mod dataset;
pub mod error;
pub mod glow;
pub mod hue;
pub mod stats;
pub mod theme;
pub mod viz;

pub use charts::ChartText;
pub use charts::bar::{BarFill, BarOptions, bar, barh};
pub use charts::boxplot::{BoxOptions, ScatterboxOptions, boxplot, scatterbox};
pub use charts::hist::{DisplotOptions, HistOptions, HistType, displot, hist};
pub use charts::joint::{JointKind, JointOptions, joint};
pub use charts::line::{LineOptions, line};
pub use charts::pair::{DiagKind, PairKind, PairOptions, pairplot};
pub use charts::pie::{PieOptions, pie};
pub use charts::scatter::{ScatterOptions, scatter};
pub use charts::violin::{ViolinOptions, violin};
pub use dataset::{Column, Dataset, Series, Value};
pub use error::NeonError;
pub use theme::{LineDash, MarkerShape, Palette, Rgb8, Theme};
pub use viz::{Chart, render, render_svg_string};
