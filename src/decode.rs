//! Generic multimedia decode of scratch files.
//!
//! Both the container trial and the raw-unit scanner funnel candidate bytes
//! through [`decode_frames`]: open the file with FFmpeg, find the best video
//! stream, and decode forward from the start until the cap is hit or the
//! readable data runs out. Partial, truncated, and mislabelled inputs are
//! the normal case here, so the first decode or conversion error is treated
//! as end of data rather than a failure.
//!
//! Frames are handed to the caller one at a time, as they decode, so a
//! failure partway through a candidate never discards frames that were
//! already delivered, and no more than one decoded image is held in memory
//! at a time.

use std::path::Path;

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::Pixel,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::error::SalvageError;

/// Decode up to `max_frames` sequential frames from the file at `path`,
/// handing each to `on_frame` as it decodes.
///
/// Returns the number of frames delivered, possibly zero. An error from
/// `on_frame` stops the decode and propagates; frames delivered before it
/// stay delivered. Errors of this function's own are reserved for the file
/// not being openable as video at all.
pub(crate) fn decode_frames<F>(
    path: &Path,
    max_frames: u32,
    mut on_frame: F,
) -> Result<u32, SalvageError>
where
    F: FnMut(DynamicImage) -> Result<(), SalvageError>,
{
    if max_frames == 0 {
        return Ok(0);
    }

    // Safe to call repeatedly.
    ffmpeg_next::init()?;

    let mut input = ffmpeg_next::format::input(&path)?;

    let stream = input
        .streams()
        .best(Type::Video)
        .ok_or(SalvageError::NoVideoStream)?;
    let stream_index = stream.index();

    let decoder_context = CodecContext::from_parameters(stream.parameters())?;
    let mut decoder = decoder_context.decoder().video()?;

    let mut delivered = 0u32;
    let mut decoded_frame = VideoFrame::empty();
    let mut rgb_frame = VideoFrame::empty();
    // Built lazily from the first decoded frame; header-less candidates
    // often report zero dimensions until a frame is out.
    let mut scaler: Option<ScalingContext> = None;

    'packets: for (stream, packet) in input.packets() {
        if stream.index() != stream_index {
            continue;
        }

        if decoder.send_packet(&packet).is_err() {
            // End of readable data for a truncated candidate.
            break;
        }

        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            match convert_frame(&mut scaler, &decoded_frame, &mut rgb_frame) {
                Ok(Some(image)) => {
                    on_frame(image)?;
                    delivered += 1;
                    if delivered >= max_frames {
                        break 'packets;
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    log::debug!("Frame conversion failed mid-candidate: {error}");
                    break 'packets;
                }
            }
        }
    }

    // Flush any frames still buffered in the decoder.
    if delivered < max_frames && decoder.send_eof().is_ok() {
        'flush: while decoder.receive_frame(&mut decoded_frame).is_ok() {
            match convert_frame(&mut scaler, &decoded_frame, &mut rgb_frame) {
                Ok(Some(image)) => {
                    on_frame(image)?;
                    delivered += 1;
                    if delivered >= max_frames {
                        break 'flush;
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    log::debug!("Frame conversion failed during flush: {error}");
                    break 'flush;
                }
            }
        }
    }

    Ok(delivered)
}

/// Scale one decoded frame to RGB24 and convert it to an image.
///
/// Returns `Ok(None)` for frames with unusable dimensions.
fn convert_frame(
    scaler: &mut Option<ScalingContext>,
    decoded: &VideoFrame,
    rgb_frame: &mut VideoFrame,
) -> Result<Option<DynamicImage>, SalvageError> {
    let width = decoded.width();
    let height = decoded.height();
    if width == 0 || height == 0 {
        return Ok(None);
    }

    let scaler = match scaler {
        Some(existing)
            if existing.input().width == width
                && existing.input().height == height
                && existing.input().format == decoded.format() =>
        {
            existing
        }
        stale => stale.insert(ScalingContext::get(
            decoded.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?),
    };
    scaler.run(decoded, rgb_frame)?;

    let buffer = frame_to_rgb_buffer(rgb_frame, width, height);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        SalvageError::FrameDecode(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(Some(DynamicImage::ImageRgb8(rgb_image)))
}

/// Copy pixel data from an FFmpeg frame into a tightly-packed RGB24 buffer,
/// compensating for row padding in the frame's stride.
fn frame_to_rgb_buffer(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let row_bytes = width as usize * 3;
    let data = frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * height as usize].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}
