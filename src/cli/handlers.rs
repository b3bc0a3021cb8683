use tracing::debug;

use crate::{
    core::{
        bounds::{preview_dims, terminal_geometry},
        color::{AnsiCode, ColorValue, Rgb, colorize, heat, parse_color},
        config::{PlotMode, PlotOptions},
        constants::{COLOR_LIGHTNESS, COLOR_SATURATION},
        data::{Cell, Table, read_text_from_path},
        error::PlotError,
        rng::Lcg,
        session::Session,
    },
    pipeline::{plot_csv_str, plot_table},
    render::{PlotFrame, natural_size, render_preview},
};

use super::parse::{CsvArgs, DemoArgs};

fn show(frame: &PlotFrame, json: bool) -> Result<(), PlotError> {
    if json {
        println!("{}", frame.to_json()?);
    } else {
        let (cols, rows) = natural_size(frame);
        let dims = preview_dims(terminal_geometry(), cols, rows);
        print!("{}", render_preview(frame, dims));
    }
    Ok(())
}

pub fn csv(a: CsvArgs) -> Result<(), PlotError> {
    let text = read_text_from_path(&a.file)?;
    debug!(bytes = text.len(), file = %a.file, "read input");

    let header = match (a.header, a.no_header) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let opts = PlotOptions::builder()
        .mode(PlotMode::from_name(&a.mode))
        .columns(a.x1, a.x2, a.x3)
        .separator(a.separator.as_deref().unwrap_or(""))
        .header_opt(header)
        .trust_input(a.trusted)
        .color_column(a.color_col)
        .default_color(ColorValue::from(a.default_color.as_str()))
        .labeled(a.labeled)
        .filter_color(!a.raw_color)
        .hue_offset(a.hue_offset)
        .fraction(a.fraction)
        .bar_padding(a.padding)
        .bar_size_threshold(a.threshold)
        .title(a.title)
        .build();

    let mut session = Session::new();
    let frame = plot_csv_str(&mut session, &text, &opts)?;
    show(&frame, a.json)
}

/// Three Gaussian clusters. Bar mode counts samples per grid cell, the
/// point modes plot `x1 + x3` plus noise and colour by cluster.
pub fn demo(a: &DemoArgs) -> Result<(), PlotError> {
    const CENTERS: [(f64, f64); 3] = [(-1.5, -1.0), (1.0, 1.5), (1.5, -1.0)];
    const SPREAD: f64 = 0.6;

    let mut rng = a.seed.map_or_else(Lcg::seed_from_time, Lcg::seed);
    let mode = PlotMode::from_name(&a.mode);

    let rows = (0..a.points.max(1))
        .map(|_| {
            let k = rng.below(CENTERS.len());
            let (cx, cz) = CENTERS[k];
            let x = SPREAD.mul_add(rng.randn(), cx);
            let z = SPREAD.mul_add(rng.randn(), cz);
            let y = if mode == PlotMode::Barchart {
                1.0
            } else {
                0.2f64.mul_add(rng.randn(), x + z)
            };
            vec![
                Cell::Number(x),
                Cell::Number(y),
                Cell::Number(z),
                Cell::Text(format!("cluster {}", k + 1)),
            ]
        })
        .collect();
    let table = Table::from_rows(rows).with_header(vec![
        Cell::from("x"),
        Cell::from(if mode == PlotMode::Barchart { "count" } else { "height" }),
        Cell::from("z"),
        Cell::from("cluster"),
    ]);

    let opts = PlotOptions::builder()
        .mode(mode)
        .title("Gaussian clusters")
        .color_column(Some(3))
        .labeled(true)
        .bar_padding(0.1)
        .build();

    let mut session = Session::new();
    let frame = plot_table(&mut session, table, &opts)?;
    if let Some(bars) = frame.bars() {
        debug!(
            bars = bars.bars.len(),
            min = bars.value_range.0,
            max = bars.value_range.1,
            "demo grid"
        );
    }
    show(&frame, false)
}

/// Pretty-print accepted colour syntaxes with swatches.
pub fn colors() {
    let swatch = |rgb: Rgb| colorize(&AnsiCode::from(rgb), "■■");

    println!("\nColour syntaxes:");
    for example in ["#ff6600", "0x33cc33", "rgb(0.2,0.6,1)", "hsl(0.8,0.9,0.5)"] {
        match parse_color(&ColorValue::from(example)) {
            Ok(rgb) => println!("  {}  {example:<18} {}", swatch(rgb), rgb.to_hex()),
            Err(e) => println!("  ??  {example} ({e})"),
        }
    }

    print!("\nHeat scale (low → high): ");
    for i in 0..=10 {
        print!("{}", colorize(&AnsiCode::from(heat(f64::from(i), 0.0, 10.0, 0.0)), "█"));
    }

    print!("\nLabel hues (5 classes):   ");
    for i in 0..5 {
        let rgb = Rgb::from_hsl(f64::from(i) / 5.0, COLOR_SATURATION, COLOR_LIGHTNESS);
        print!("{} ", swatch(rgb));
    }
    println!("\n");
}

/// Print handy invocations for new users.
pub fn examples() {
    let bin = "plotgrid";
    println!(
        "
Example invocations
-------------------
• Scatter plot       : {bin} csv data.csv
• Pick columns       : {bin} csv data.csv --x1 0 --x2 3 --x3 1
• Header + labels    : {bin} csv iris.csv --header --color-col 4 --labeled
• Heat colours       : {bin} csv data.csv --color-col 1 --hue-offset 0.3
• Packed RGB column  : {bin} csv data.csv --color-col 3 --raw-color
• Bar chart          : {bin} csv data.csv --mode barchart --padding 0.2 --threshold 0.05
• First quarter      : {bin} csv big.csv --fraction 0.25
• JSON for renderer  : {bin} csv data.csv --json > frame.json
• From stdin         : cat data.csv | {bin} csv - --separator ';'
• Random demo        : {bin} demo --points 5000 --seed 7
• Debug timings      : {bin} csv data.csv --debug
"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_runs_with_seed() {
        let a = DemoArgs {
            points: 50,
            seed: Some(1),
            mode: "scatterplot".into(),
            debug: false,
        };
        assert!(demo(&a).is_ok());
    }
}
