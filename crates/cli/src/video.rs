//! Video stream driver.
//!
//! The wire format is a newline-delimited textual header terminated by the
//! literal line `HEADER_END`, followed by raw frame bytes
//! (`width * height * bytes_per_pixel` per frame, no per-frame framing):
//!
//! ```text
//! WIDTH:640
//! HEIGHT:360
//! PIX_FMT:rgba
//! FPS:30
//! DURATION:12.5
//! HEADER_END
//! <raw frame bytes...>
//! ```
//!
//! Output is the processed frame bytes in the same layout, without a header.

use std::io::{BufRead, Read, Write};

use tracing::debug;

use imaging::{Image, PixelFormat};

use crate::error::CliError;

/// Parsed stream metadata.
#[derive(Debug, Clone, Copy)]
pub struct VideoHeader {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub fps: u32,
    pub duration: f64,
}

impl VideoHeader {
    /// Bytes per raw frame.
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Parse the stream header up to and including `HEADER_END`.
pub fn parse_header(reader: &mut impl BufRead) -> Result<VideoHeader, CliError> {
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut format: Option<PixelFormat> = None;
    let mut fps: u32 = 0;
    let mut duration: f64 = 0.0;
    let mut terminated = false;

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break; // EOF
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "HEADER_END" {
            terminated = true;
            break;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            return Err(CliError::header_parse(format!("malformed line '{trimmed}'")));
        };

        match key {
            "WIDTH" => {
                width = Some(parse_number(key, value)?);
            }
            "HEIGHT" => {
                height = Some(parse_number(key, value)?);
            }
            "PIX_FMT" => {
                format = Some(match value {
                    "rgba" => PixelFormat::Rgba32,
                    "rgb" => PixelFormat::Rgb24,
                    other => {
                        return Err(CliError::header_parse(format!(
                            "unsupported PIX_FMT '{other}'"
                        )))
                    }
                });
            }
            "FPS" => {
                fps = parse_number(key, value)?;
            }
            "DURATION" => {
                duration = value.trim().parse().map_err(|_| {
                    CliError::header_parse(format!("DURATION is not a number: '{value}'"))
                })?;
            }
            other => {
                debug!(key = other, "unknown header key ignored");
            }
        }
    }

    if !terminated {
        return Err(CliError::header_parse("stream ended before HEADER_END"));
    }

    let width = width.ok_or_else(|| CliError::header_parse("missing WIDTH"))?;
    let height = height.ok_or_else(|| CliError::header_parse("missing HEIGHT"))?;
    let format = format.ok_or_else(|| CliError::header_parse("missing PIX_FMT"))?;
    if width == 0 || height == 0 {
        return Err(CliError::header_parse(format!(
            "invalid dimensions {width}x{height}"
        )));
    }

    Ok(VideoHeader {
        width,
        height,
        format,
        fps,
        duration,
    })
}

fn parse_number(key: &str, value: &str) -> Result<u32, CliError> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::header_parse(format!("{key} is not a number: '{value}'")))
}

/// Pulls raw frames off the stream and wraps them as [`Image`]s.
pub struct FrameReader<R> {
    reader: R,
    header: VideoHeader,
    frames_read: u64,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R, header: VideoHeader) -> Self {
        Self {
            reader,
            header,
            frames_read: 0,
        }
    }

    /// Frames pulled so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Read the next frame.
    ///
    /// `Ok(None)` on clean end-of-stream; an error when the stream ends in
    /// the middle of a frame.
    pub fn next_frame(&mut self) -> Result<Option<Image>, CliError> {
        let frame_size = self.header.frame_size();
        let mut buffer = vec![0u8; frame_size];
        let mut filled = 0;

        while filled < frame_size {
            match self.reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < frame_size {
            return Err(CliError::unexpected_eof(format!(
                "frame {} truncated: got {} of {} bytes",
                self.frames_read, filled, frame_size
            )));
        }

        self.frames_read += 1;
        let image = Image::from_data(
            self.header.width,
            self.header.height,
            self.header.format,
            buffer,
        )
        .map_err(|e| CliError::header_parse(e.to_string()))?;
        Ok(Some(image))
    }
}

/// Writes processed frames back out as raw bytes.
pub struct FrameWriter<W> {
    writer: W,
    frames_written: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Emit one frame's raw bytes.
    pub fn write_frame(&mut self, image: &Image) -> Result<(), CliError> {
        self.writer.write_all(image.data())?;
        self.frames_written += 1;
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<(), CliError> {
        self.writer.flush()?;
        Ok(())
    }
}
