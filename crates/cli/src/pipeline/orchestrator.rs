//! Pipeline orchestrator - coordinates all components.
//!
//! Builds the calculator chain from the blueprint, wires the video driver
//! into the scheduler's I/O callbacks, and drives the frame loop until the
//! stream drains or a limit fires.

use std::cell::{Cell, RefCell};
use std::io::{BufRead, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use calculators::tags::{
    PARAM_BANNER_IMAGE, PARAM_BAYER_LEVEL, PARAM_BLUE_LEVELS, PARAM_GREEN_LEVELS,
    PARAM_OVERLAY_X, PARAM_OVERLAY_Y, PARAM_PIXEL_SHAPE, PARAM_PIXEL_SIZE, PARAM_RED_LEVELS,
    PARAM_SPREAD,
};
use calculators::{
    BannerCalculator, DitherCalculator, GrayscaleCalculator, PassthroughCalculator,
    PixelateCalculator,
};
use contracts::{
    Calculator, FilterBlueprint, FilterParams, Packet, SideParameters, Tag, TAG_INPUT, TAG_OUTPUT,
};
use imaging::Image;
use observability::record_frame;
use scheduler::Scheduler;

use super::PipelineStats;
use crate::video::{self, FrameReader, FrameWriter};

/// Consecutive output-idle frames after EOF before the loop gives up.
const DRAIN_FRAMES: u32 = 4;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The filter chain blueprint
    pub blueprint: FilterBlueprint,

    /// Maximum number of frames to emit (None = unlimited)
    pub max_frames: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion over the given video stream.
    pub fn run<R, W>(self, mut input: R, output: W) -> Result<PipelineStats>
    where
        R: BufRead + 'static,
        W: Write + 'static,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Parse the stream header
        let header = video::parse_header(&mut input).context("Failed to parse video header")?;
        info!(
            width = header.width,
            height = header.height,
            format = ?header.format,
            fps = header.fps,
            duration = header.duration,
            "Video stream header parsed"
        );

        // Build side parameters (loads banner assets)
        let side_parameters =
            Rc::new(build_side_parameters(blueprint).context("Failed to build side parameters")?);

        // Build and register the calculator chain
        let mut scheduler = Scheduler::with_config(&blueprint.scheduler);
        let chain = build_calculators(blueprint);
        let active_filters = chain.len();
        for calculator in chain {
            let name = calculator.name().to_string();
            scheduler
                .register_calculator(calculator, Rc::clone(&side_parameters))
                .with_context(|| format!("Failed to register calculator '{name}'"))?;
        }
        scheduler
            .connect_calculators()
            .context("Failed to connect pipeline")?;

        info!(
            filters = active_filters,
            frame_rate = blueprint.scheduler.frame_rate,
            "Pipeline connected"
        );

        // Wire the video driver into the scheduler callbacks
        let reader = Rc::new(RefCell::new(FrameReader::new(input, header)));
        let writer = Rc::new(RefCell::new(FrameWriter::new(output)));

        let eof = Rc::new(Cell::new(false));
        let write_failed = Rc::new(Cell::new(false));

        {
            let reader = Rc::clone(&reader);
            let eof = Rc::clone(&eof);
            scheduler.register_input_callback(move || {
                if eof.get() {
                    return Packet::empty();
                }
                match reader.borrow_mut().next_frame() {
                    Ok(Some(image)) => Packet::of(image),
                    Ok(None) => {
                        eof.set(true);
                        Packet::empty()
                    }
                    Err(e) => {
                        warn!(error = %e, "input stream failed, treating as end of stream");
                        eof.set(true);
                        Packet::empty()
                    }
                }
            });
        }

        {
            let writer = Rc::clone(&writer);
            let write_failed = Rc::clone(&write_failed);
            scheduler.register_output_callback(move |packet| {
                if !packet.is_valid() {
                    return;
                }
                match packet.get::<Image>() {
                    Ok(image) => {
                        if let Err(e) = writer.borrow_mut().write_frame(image) {
                            warn!(error = %e, "output sink failed");
                            write_failed.set(true);
                        }
                    }
                    Err(e) => warn!(error = %e, "non-image packet on output port dropped"),
                }
            });
        }

        // Frame loop
        let mut frame_metrics = observability::FrameMetricsAggregator::new();
        let mut last_frame = Instant::now();
        let mut idle_frames = 0u32;
        let mut last_emitted = 0u64;

        info!(max_frames = ?self.config.max_frames, "Pipeline running");

        loop {
            scheduler.run().context("Calculator failure")?;

            let delta_ms = last_frame.elapsed().as_secs_f64() * 1000.0;
            last_frame = Instant::now();
            record_frame(scheduler.stats().frames, delta_ms);
            frame_metrics.record_frame(delta_ms);

            let emitted = writer.borrow().frames_written();

            if write_failed.get() {
                anyhow::bail!("output sink failed, aborting pipeline");
            }

            if let Some(max) = self.config.max_frames {
                if emitted >= max {
                    info!(frames = emitted, "Reached max frames limit");
                    break;
                }
            }

            if let Some(timeout) = self.config.timeout {
                if start_time.elapsed() >= timeout {
                    warn!(timeout_secs = timeout.as_secs(), "Pipeline timed out");
                    break;
                }
            }

            if eof.get() {
                if emitted > last_emitted {
                    idle_frames = 0;
                } else {
                    idle_frames += 1;
                }
                last_emitted = emitted;

                if idle_frames >= DRAIN_FRAMES {
                    info!("Input drained, shutting down");
                    break;
                }
            }
        }

        let scheduler_stats = scheduler.stats();
        scheduler.stop();
        writer
            .borrow_mut()
            .flush()
            .context("Failed to flush output sink")?;

        let frames_read = reader.borrow().frames_read();
        let frames_written = writer.borrow().frames_written();
        frame_metrics.total_packets_in = frames_read;
        frame_metrics.total_packets_out = frames_written;
        frame_metrics
            .record_dropped(scheduler_stats.input_dropped_stale + scheduler_stats.input_dropped_capacity);

        let stats = PipelineStats {
            frames_read,
            frames_written,
            scheduler_frames: scheduler_stats.frames,
            scheduler_ticks: scheduler_stats.ticks,
            packets_dropped: scheduler_stats.input_dropped_stale
                + scheduler_stats.input_dropped_capacity,
            duration: start_time.elapsed(),
            active_filters,
            frame_metrics,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            frames = stats.frames_written,
            fps = format!("{:.2}", stats.fps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Build the calculator chain, threading output tags into downstream inputs.
///
/// The first calculator reads the external entry tag; each later one reads
/// its predecessor's output tag; the last one writes the external exit tag.
fn build_calculators(blueprint: &FilterBlueprint) -> Vec<Box<dyn Calculator>> {
    let count = blueprint.filters.len();
    let mut chain: Vec<Box<dyn Calculator>> = Vec::with_capacity(count);
    let mut input_tag: Tag = TAG_INPUT.into();

    for (index, filter) in blueprint.filters.iter().enumerate() {
        let output_tag: Tag = if index + 1 == count {
            TAG_OUTPUT.into()
        } else {
            // Filter ids are unique by validation, so they double as tags
            Tag::from(filter.id.as_str())
        };

        let calculator: Box<dyn Calculator> = match &filter.params {
            FilterParams::Passthrough => Box::new(
                PassthroughCalculator::new(filter.id.as_str())
                    .with_io_tags(input_tag.clone(), output_tag.clone()),
            ),
            FilterParams::Pixelate { .. } => Box::new(
                PixelateCalculator::new(filter.id.as_str())
                    .with_io_tags(input_tag.clone(), output_tag.clone()),
            ),
            FilterParams::Dither { .. } => Box::new(
                DitherCalculator::new(filter.id.as_str())
                    .with_io_tags(input_tag.clone(), output_tag.clone()),
            ),
            FilterParams::Grayscale => Box::new(
                GrayscaleCalculator::new(filter.id.as_str())
                    .with_io_tags(input_tag.clone(), output_tag.clone()),
            ),
            FilterParams::Banner { .. } => Box::new(
                BannerCalculator::new(filter.id.as_str())
                    .with_io_tags(input_tag.clone(), output_tag.clone()),
            ),
        };

        chain.push(calculator);
        input_tag = output_tag;
    }

    chain
}

/// Assemble the shared side-parameter map from the blueprint, loading
/// banner bitmaps from disk.
fn build_side_parameters(blueprint: &FilterBlueprint) -> Result<SideParameters> {
    let mut side = SideParameters::new();

    for filter in &blueprint.filters {
        match &filter.params {
            FilterParams::Pixelate { pixel_size, shape } => {
                side.insert(PARAM_PIXEL_SIZE.into(), Packet::of(*pixel_size as i32));
                side.insert(PARAM_PIXEL_SHAPE.into(), Packet::of(*shape));
            }
            FilterParams::Dither {
                red_levels,
                green_levels,
                blue_levels,
                spread,
                bayer_level,
            } => {
                side.insert(PARAM_RED_LEVELS.into(), Packet::of(*red_levels as i32));
                side.insert(PARAM_GREEN_LEVELS.into(), Packet::of(*green_levels as i32));
                side.insert(PARAM_BLUE_LEVELS.into(), Packet::of(*blue_levels as i32));
                side.insert(PARAM_SPREAD.into(), Packet::of(*spread as i32));
                side.insert(PARAM_BAYER_LEVEL.into(), Packet::of(*bayer_level as i32));
            }
            FilterParams::Banner {
                path,
                offset_x,
                offset_y,
            } => {
                let banner = imaging::read_bmp(path)
                    .with_context(|| format!("Failed to load banner '{}'", path.display()))?;
                info!(
                    path = %path.display(),
                    width = banner.width(),
                    height = banner.height(),
                    "Banner loaded"
                );
                side.insert(PARAM_BANNER_IMAGE.into(), Packet::of(banner));
                side.insert(PARAM_OVERLAY_X.into(), Packet::of(*offset_x as i32));
                side.insert(PARAM_OVERLAY_Y.into(), Packet::of(*offset_y as i32));
            }
            FilterParams::Passthrough | FilterParams::Grayscale => {}
        }
    }

    Ok(side)
}
