// Chart renderer - Draws graphs with plotters and exports them as SVG or PNG
use crate::application::plot_renderer::{
    AxisRange, Axes, ExportedImage, ImageFormat, PlotRenderer, RenderError, RenderedPlot,
    SeriesStyle,
};
use crate::domain::render_options::RenderOptions;
use crate::domain::series::Series;
use crate::domain::units::{format_tick, track_label};
use chrono::DateTime;
use image::{codecs::png::PngEncoder, ImageEncoder};
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, DrawingAreaErrorKind};
use plotters::prelude::*;
use serde_json::{json, Value};

const DEFAULT_COLORS: [&str; 5] = ["#00A8F0", "#C0D800", "#CB4B4B", "#4DA74D", "#9440ED"];

#[derive(Debug, Clone, Copy)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new(800, 300)
    }
}

impl ChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl PlotRenderer for ChartRenderer {
    fn render(
        &self,
        container: &str,
        series: &[Series],
        options: &RenderOptions,
    ) -> Result<Box<dyn RenderedPlot>, RenderError> {
        let palette = palette(options);
        let styles = series
            .iter()
            .enumerate()
            .map(|(i, s)| SeriesStyle {
                label: s.label.clone(),
                color: s
                    .color
                    .clone()
                    .unwrap_or_else(|| palette[i % palette.len()].clone()),
                hidden: s.hide,
            })
            .collect();

        Ok(Box::new(ChartPlot {
            container: container.to_string(),
            axes: resolve_axes(series, options),
            series: series.to_vec(),
            styles,
            options: options.clone(),
            width: self.width,
            height: self.height,
        }))
    }
}

struct ChartPlot {
    container: String,
    series: Vec<Series>,
    styles: Vec<SeriesStyle>,
    axes: Axes,
    options: RenderOptions,
    width: u32,
    height: u32,
}

impl RenderedPlot for ChartPlot {
    fn axes(&self) -> Axes {
        self.axes
    }

    fn series_styles(&self) -> &[SeriesStyle] {
        &self.styles
    }

    fn document(&self) -> Value {
        let track = self.tracking();
        let series: Vec<Value> = self
            .series
            .iter()
            .zip(&self.styles)
            .map(|(s, style)| {
                let mut entry = json!({
                    "label": s.label,
                    "color": style.color,
                    "hide": s.hide,
                    "data": s.points,
                });
                if track {
                    entry["track"] = s
                        .points
                        .iter()
                        .map(|p| Value::String(track_label(&s.label, p.time_ms, p.value)))
                        .collect();
                }
                entry
            })
            .collect();

        json!({
            "container": self.container,
            "series": series,
            "axes": self.axes,
            "options": self.options,
        })
    }

    fn export_image(&self, format: ImageFormat) -> Result<ExportedImage, RenderError> {
        let bytes = match format {
            ImageFormat::Svg => self.to_svg()?.into_bytes(),
            ImageFormat::Png => self.to_png()?,
        };
        Ok(ExportedImage { format, bytes })
    }
}

impl ChartPlot {
    fn tracking(&self) -> bool {
        self.options
            .as_value()
            .pointer("/mouse/track")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn to_svg(&self) -> Result<String, RenderError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            self.draw(&root).map_err(failed)?;
            root.present().map_err(failed)?;
        }
        Ok(svg)
    }

    fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut pixels = vec![0u8; self.width as usize * self.height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root).map_err(failed)?;
            root.present().map_err(failed)?;
        }

        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(&pixels, self.width, self.height, image::ColorType::Rgb8)
            .map_err(failed)?;
        Ok(png)
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;
        let (Some(x), Some(y)) = (self.axes.x, self.axes.y) else {
            if let Some(title) = self.options.title() {
                root.titled(title, ("sans-serif", 16).into_font().color(&BLACK))?;
            }
            return Ok(());
        };

        let mut builder = ChartBuilder::on(root);
        builder.margin(10).x_label_area_size(30).y_label_area_size(80);
        if let Some(title) = self.options.title() {
            builder.caption(title, ("sans-serif", 16).into_font().color(&BLACK));
        }
        let mut chart = builder.build_cartesian_2d(x.min..upper(x), y.min..upper(y))?;

        let unit = self.options.y_unit();
        let y_formatter = |v: &f64| format_tick((v * 100.0).round() / 100.0, unit);
        let x_formatter = |t: &f64| {
            DateTime::from_timestamp_millis(*t as i64)
                .map(|t| t.format("%m-%d %H:%M").to_string())
                .unwrap_or_default()
        };
        chart
            .configure_mesh()
            .x_labels(6)
            .y_labels(5)
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&y_formatter)
            .light_line_style(BLACK.mix(0.05))
            .bold_line_style(BLACK.mix(0.1))
            .draw()?;

        for (series, style) in self.series.iter().zip(&self.styles) {
            let color = parse_color(&style.color).unwrap_or(BLACK);
            // Hidden series draw nothing but keep a hollow legend row.
            let points: Vec<(f64, f64)> = if series.hide {
                Vec::new()
            } else {
                series.points.iter().map(|p| (p.time_ms as f64, p.value)).collect()
            };
            let drawn = chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?;
            if !series.has_label() {
                continue;
            }
            let drawn = drawn.label(series.label.as_str());
            if series.hide {
                drawn.legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 8, y + 4)], color));
            } else {
                drawn.legend(move |(x, y)| {
                    Rectangle::new([(x, y - 4), (x + 8, y + 4)], color.filled())
                });
            }
        }

        if self.options.legend_shown() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .position(legend_position(&self.options))
                .draw()?;
        }
        Ok(())
    }
}

fn failed(e: impl std::fmt::Display) -> RenderError {
    RenderError::Failed(e.to_string())
}

/// A flat axis still needs a non-empty coordinate range.
fn upper(axis: AxisRange) -> f64 {
    if axis.max > axis.min { axis.max } else { axis.min + 1.0 }
}

fn legend_position(options: &RenderOptions) -> SeriesLabelPosition {
    match options.as_value().pointer("/legend/position").and_then(Value::as_str) {
        Some("nw") => SeriesLabelPosition::UpperLeft,
        Some("sw") => SeriesLabelPosition::LowerLeft,
        Some("se") => SeriesLabelPosition::LowerRight,
        _ => SeriesLabelPosition::UpperRight,
    }
}

fn parse_color(color: &str) -> Option<RGBColor> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

fn palette(options: &RenderOptions) -> Vec<String> {
    let configured: Vec<String> = options
        .as_value()
        .get("colors")
        .and_then(Value::as_array)
        .map(|colors| {
            colors
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if configured.is_empty() {
        DEFAULT_COLORS.iter().map(|c| c.to_string()).collect()
    } else {
        configured
    }
}

/// Extents of the visible data, with `xaxis`/`yaxis` `min`/`max` options taking precedence.
fn resolve_axes(series: &[Series], options: &RenderOptions) -> Axes {
    let visible = series.iter().filter(|s| !s.hide).flat_map(|s| &s.points);
    let mut x: Option<AxisRange> = None;
    let mut y: Option<AxisRange> = None;
    for point in visible {
        extend(&mut x, point.time_ms as f64);
        extend(&mut y, point.value);
    }

    Axes {
        x: apply_bounds(x, options.as_value().get("xaxis")),
        y: apply_bounds(y, options.as_value().get("yaxis")),
    }
}

fn extend(range: &mut Option<AxisRange>, value: f64) {
    match range {
        Some(r) => {
            r.min = r.min.min(value);
            r.max = r.max.max(value);
        }
        None => *range = Some(AxisRange { min: value, max: value }),
    }
}

fn apply_bounds(range: Option<AxisRange>, axis: Option<&Value>) -> Option<AxisRange> {
    let min = axis.and_then(|a| a.get("min")).and_then(Value::as_f64);
    let max = axis.and_then(|a| a.get("max")).and_then(Value::as_f64);
    match (range, min, max) {
        (Some(r), min, max) => Some(AxisRange {
            min: min.unwrap_or(r.min),
            max: max.unwrap_or(r.max),
        }),
        (None, Some(min), Some(max)) => Some(AxisRange { min, max }),
        (None, _, _) => None,
    }
}
