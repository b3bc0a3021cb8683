use clap::{Parser, Subcommand};

/// Top-level CLI structure.
#[derive(Parser)]
#[command(
    name = "plotgrid",
    about = "Turn delimited text into colored, normalized 3D plot frames"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plot data from a delimited text file
    Csv(CsvArgs),
    /// Show accepted colour syntaxes
    Colors,
    /// Scatter random samples onto a bar grid
    Demo(DemoArgs),
    /// Print example invocations
    Examples,
}

/// `plotgrid csv …`
#[derive(Parser, Debug)]
pub struct CsvArgs {
    /// File path (use `-` for stdin)
    #[arg(value_name = "FILE", default_value = "-")]
    pub file: String,

    /// Column for the horizontal axis
    #[arg(long, default_value_t = 0)]
    pub x1: usize,
    /// Column for the vertical axis
    #[arg(long, default_value_t = 1)]
    pub x2: usize,
    /// Column for the depth axis
    #[arg(long, default_value_t = 2)]
    pub x3: usize,

    /// scatterplot, lineplot or barchart
    #[arg(short, long, default_value = "scatterplot")]
    pub mode: String,

    /// Column separator (detected when omitted)
    #[arg(short, long)]
    pub separator: Option<String>,

    /// First row is a header
    #[arg(long, conflicts_with = "no_header")]
    pub header: bool,
    /// First row is data
    #[arg(long)]
    pub no_header: bool,

    /// Skip per-cell type checks
    #[arg(long)]
    pub trusted: bool,

    /// Column that selects the colour of each row
    #[arg(long)]
    pub color_col: Option<usize>,
    /// Colour used without a colour column (`#rrggbb`, `rgb()`, `hsl()`, `0xrrggbb`)
    #[arg(long, default_value = "#000000")]
    pub default_color: String,
    /// Treat the colour column as class labels
    #[arg(long)]
    pub labeled: bool,
    /// Read numeric colour columns as packed RGB instead of a heat scale
    #[arg(long)]
    pub raw_color: bool,
    /// Rotate heat-scale hues
    #[arg(long, default_value_t = 0.0)]
    pub hue_offset: f64,

    /// Share of lines to plot, in (0, 1]
    #[arg(long, default_value_t = 1.0)]
    pub fraction: f64,
    /// Gap between bars, in [0, 1)
    #[arg(long, default_value_t = 0.5)]
    pub padding: f64,
    /// Hide bars below this share of the tallest one
    #[arg(long, default_value_t = 0.0)]
    pub threshold: f64,

    /// Plot title
    #[arg(short, long, default_value = "")]
    pub title: String,

    /// Print the frame as JSON instead of a preview
    #[arg(long)]
    pub json: bool,

    /// Emit timing diagnostics
    #[arg(long)]
    pub debug: bool,
}

/// `plotgrid demo …`
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Number of generated samples
    #[arg(long, default_value_t = 2000)]
    pub points: usize,
    /// Fixed seed (time based when omitted)
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long, default_value = "barchart")]
    pub mode: String,
    #[arg(long, default_value_t = false, help = "Emit timing diagnostics")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_defaults() {
        let cli = Cli::try_parse_from(["plotgrid", "csv", "data.csv"]).unwrap();
        let Command::Csv(a) = cli.cmd else {
            panic!("expected csv");
        };
        assert_eq!(a.file, "data.csv");
        assert_eq!((a.x1, a.x2, a.x3), (0, 1, 2));
        assert!(a.separator.is_none() && !a.header && !a.no_header);
    }

    #[test]
    fn test_header_flags_conflict() {
        assert!(Cli::try_parse_from(["plotgrid", "csv", "-", "--header", "--no-header"]).is_err());
    }

    #[test]
    fn test_demo_args() {
        let cli = Cli::try_parse_from(["plotgrid", "demo", "--points", "10", "--seed", "3"]).unwrap();
        let Command::Demo(a) = cli.cmd else {
            panic!("expected demo");
        };
        assert_eq!((a.points, a.seed), (10, Some(3)));
    }
}
