//! Render routine: sums playing channels into an output buffer

use crate::pool::{Channel, ChannelPool};
use crate::types::StereoFrame;

/// What happened during one render quantum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixReport {
    /// Frames written to the destination (silence included)
    pub frames: usize,
    /// Channels that contributed samples
    pub channels_mixed: usize,
    /// Whether any sum had to be clamped to the 16-bit range
    pub clipped: bool,
}

/// Mix every playing channel of `pool` into `dst`
///
/// Zeroes the first `frames` frames of `dst` (capped at its length), then
/// walks the active list and adds each playing channel's frames with
/// saturation. Non-looping channels that reach their end are rewound and
/// stop playing but stay allocated. Looping channels wrap as often as
/// needed to fill the quantum.
///
/// Never allocates, blocks or panics on pool state; an uninitialized pool
/// yields silence. Runs in time proportional to `channels_used × frames`.
pub fn render(pool: &mut ChannelPool, frames: usize, dst: &mut [StereoFrame]) -> MixReport {
    let frames = frames.min(dst.len());
    let dst = &mut dst[..frames];
    dst.fill(StereoFrame::silence());

    let mut report = MixReport {
        frames,
        ..MixReport::default()
    };

    if !pool.is_initialized() || frames == 0 {
        return report;
    }

    pool.for_each_active_mut(|channel| {
        if !channel.playing {
            return;
        }
        report.channels_mixed += 1;
        report.clipped |= mix_channel(channel, &mut *dst);
    });

    report
}

/// Mix one channel into `dst`, advancing its position
///
/// Returns true if any sample clipped.
fn mix_channel(channel: &mut Channel, dst: &mut [StereoFrame]) -> bool {
    let Some(stream) = channel.stream.as_ref() else {
        channel.playing = false;
        return false;
    };
    let src = stream.frames();
    let sample_count = channel.sample_count.min(src.len());

    if sample_count == 0 || channel.current_sample >= sample_count {
        channel.current_sample = 0;
        channel.playing = false;
        return false;
    }

    let mut clipped = false;
    let mut written = 0;

    while written < dst.len() {
        let start = channel.current_sample;
        let samples_left = sample_count - start;
        let samples_to_stream = (dst.len() - written).min(samples_left);

        for (out, frame) in dst[written..written + samples_to_stream]
            .iter_mut()
            .zip(&src[start..start + samples_to_stream])
        {
            clipped |= out.saturating_accumulate(*frame);
        }
        written += samples_to_stream;

        if channel.looping {
            channel.current_sample = (start + samples_to_stream) % sample_count;
        } else {
            channel.current_sample = start + samples_to_stream;
            if channel.current_sample >= sample_count {
                channel.current_sample = 0;
                channel.playing = false;
                break;
            }
        }
    }

    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SoundHandle, SoundStream};

    fn frames(values: &[(i16, i16)]) -> SoundStream {
        let frames: Vec<StereoFrame> = values.iter().map(|&(l, r)| StereoFrame::new(l, r)).collect();
        SoundStream::from_frames(&frames)
    }

    fn ramp(len: usize) -> SoundStream {
        let values: Vec<(i16, i16)> = (1..=len as i16).map(|v| (v, -v)).collect();
        frames(&values)
    }

    #[test]
    fn test_non_looping_plays_once_then_stops() {
        let mut pool = ChannelPool::new(4);
        let handle = pool.add(ramp(4), true, false).unwrap();
        let mut out = [StereoFrame::silence(); 4];

        let report = render(&mut pool, 4, &mut out);
        assert_eq!(
            out,
            [
                StereoFrame::new(1, -1),
                StereoFrame::new(2, -2),
                StereoFrame::new(3, -3),
                StereoFrame::new(4, -4),
            ]
        );
        assert_eq!(report.channels_mixed, 1);
        assert!(!pool.is_playing(handle));
        assert_eq!(pool.position(handle), Some(0));
        assert!(pool.is_active(handle));

        let report = render(&mut pool, 4, &mut out);
        assert_eq!(out, [StereoFrame::silence(); 4]);
        assert_eq!(report.channels_mixed, 0);
    }

    #[test]
    fn test_non_looping_shorter_than_request_pads_with_silence() {
        let mut pool = ChannelPool::new(1);
        let handle = pool.add(ramp(2), true, false).unwrap();
        let mut out = [StereoFrame::new(99, 99); 4];

        render(&mut pool, 4, &mut out);
        assert_eq!(out[..2], [StereoFrame::new(1, -1), StereoFrame::new(2, -2)]);
        assert_eq!(out[2..], [StereoFrame::silence(); 2]);
        assert!(!pool.is_playing(handle));
    }

    #[test]
    fn test_non_looping_resumes_across_quanta() {
        let mut pool = ChannelPool::new(1);
        let handle = pool.add(ramp(6), true, false).unwrap();
        let mut out = [StereoFrame::silence(); 4];

        render(&mut pool, 4, &mut out);
        assert_eq!(pool.position(handle), Some(4));
        assert!(pool.is_playing(handle));

        render(&mut pool, 4, &mut out);
        assert_eq!(out[..2], [StereoFrame::new(5, -5), StereoFrame::new(6, -6)]);
        assert_eq!(out[2..], [StereoFrame::silence(); 2]);
        assert_eq!(pool.position(handle), Some(0));
        assert!(!pool.is_playing(handle));
    }

    #[test]
    fn test_looping_wraps_within_quantum() {
        let mut pool = ChannelPool::new(1);
        let handle = pool.add(ramp(3), true, true).unwrap();
        let mut out = [StereoFrame::silence(); 5];

        render(&mut pool, 5, &mut out);
        let left: Vec<i16> = out.iter().map(|f| f.left).collect();
        assert_eq!(left, vec![1, 2, 3, 1, 2]);
        assert_eq!(pool.position(handle), Some(2));
        assert!(pool.is_playing(handle));
    }

    #[test]
    fn test_looping_wraps_many_times() {
        let mut pool = ChannelPool::new(1);
        let handle = pool.add(ramp(2), true, true).unwrap();
        let mut out = [StereoFrame::silence(); 7];

        render(&mut pool, 7, &mut out);
        let left: Vec<i16> = out.iter().map(|f| f.left).collect();
        assert_eq!(left, vec![1, 2, 1, 2, 1, 2, 1]);
        assert_eq!(pool.position(handle), Some(1));
    }

    #[test]
    fn test_saturation_clamps_instead_of_wrapping() {
        let mut pool = ChannelPool::new(2);
        pool.add(frames(&[(30000, -30000), (100, -100)]), true, false).unwrap();
        pool.add(frames(&[(10000, -10000), (100, -100)]), true, false).unwrap();
        let mut out = [StereoFrame::silence(); 2];

        let report = render(&mut pool, 2, &mut out);
        assert_eq!(out[0], StereoFrame::new(i16::MAX, i16::MIN));
        assert_eq!(out[1], StereoFrame::new(200, -200));
        assert!(report.clipped);
        assert_eq!(report.channels_mixed, 2);
    }

    #[test]
    fn test_paused_channel_is_skipped_and_keeps_position() {
        let mut pool = ChannelPool::new(2);
        let paused = pool.add(ramp(8), false, false).unwrap();
        let playing = pool.add(ramp(8), true, false).unwrap();
        let mut out = [StereoFrame::silence(); 3];

        render(&mut pool, 3, &mut out);
        assert_eq!(out[2], StereoFrame::new(3, -3));
        assert_eq!(pool.position(paused), Some(0));
        assert_eq!(pool.position(playing), Some(3));
    }

    #[test]
    fn test_restart_then_play_replays_from_start() {
        let mut pool = ChannelPool::new(1);
        let handle = pool.add(ramp(8), true, false).unwrap();
        let mut out = [StereoFrame::silence(); 3];

        render(&mut pool, 3, &mut out);
        pool.restart(handle).unwrap();
        render(&mut pool, 3, &mut out);
        assert_eq!(out, [StereoFrame::silence(); 3]);

        pool.play(handle).unwrap();
        render(&mut pool, 3, &mut out);
        assert_eq!(out[0], StereoFrame::new(1, -1));
    }

    #[test]
    fn test_zero_length_stream_stops_without_output() {
        let mut pool = ChannelPool::new(1);
        let handle = pool.add(SoundStream::from_interleaved(Vec::new()), true, true).unwrap();
        let mut out = [StereoFrame::new(5, 5); 4];

        render(&mut pool, 4, &mut out);
        assert_eq!(out, [StereoFrame::silence(); 4]);
        assert!(!pool.is_playing(handle));
        assert_eq!(pool.position(handle), Some(0));
    }

    #[test]
    fn test_uninitialized_pool_renders_silence() {
        let mut pool = ChannelPool::uninitialized();
        let mut out = [StereoFrame::new(7, 7); 8];

        let report = render(&mut pool, 8, &mut out);
        assert_eq!(out, [StereoFrame::silence(); 8]);
        assert_eq!(report.frames, 8);
    }

    #[test]
    fn test_request_larger_than_buffer_is_capped() {
        let mut pool = ChannelPool::new(1);
        let handle = pool.add(ramp(8), true, false).unwrap();
        let mut out = [StereoFrame::silence(); 2];

        let report = render(&mut pool, 16, &mut out);
        assert_eq!(report.frames, 2);
        assert_eq!(pool.position(handle), Some(2));
    }

    #[test]
    fn test_removed_channel_is_not_mixed() {
        let mut pool = ChannelPool::new(2);
        let mut gone = pool.add(ramp(4), true, false).unwrap();
        pool.add(frames(&[(10, 10); 4]), true, false).unwrap();
        pool.remove(&mut gone).unwrap();
        assert_eq!(gone, SoundHandle::INVALID);

        let mut out = [StereoFrame::silence(); 4];
        render(&mut pool, 4, &mut out);
        assert_eq!(out, [StereoFrame::new(10, 10); 4]);
    }
}
