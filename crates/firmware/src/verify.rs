//! Result verification: decode the received buffer and summarise it.

use core::iter::{Copied, Take};
use core::slice;

use heapless::Vec;

use crate::buffers::{SampleFrame, StereoSample};
use crate::config::REPORT_LEN;
use crate::log::info;

/// Lazy decoder over received stream words. Yields `(left, right)` as
/// [`StereoSample`]s.
///
/// A clone taken before consumption replays the same pairs, and calling
/// [`decode_buffer`] again starts over.
#[derive(Debug, Clone)]
pub struct DecodedSamples<'a> {
    words: Take<Copied<slice::Iter<'a, u32>>>,
}

impl Iterator for DecodedSamples<'_> {
    type Item = StereoSample;

    fn next(&mut self) -> Option<Self::Item> {
        self.words.next().map(|word| SampleFrame::from_bits(word).unpack())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.words.size_hint()
    }
}

impl ExactSizeIterator for DecodedSamples<'_> {}

/// Decode the first `count` words of `words`: high half-word is left, low
/// half-word is right. Fewer pairs come out if `words` is shorter.
///
/// Pure and read-only.
pub fn decode_buffer(words: &[u32], count: usize) -> DecodedSamples<'_> {
    DecodedSamples {
        words: words.iter().copied().take(count),
    }
}

/// Summary of a received buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerificationReport {
    decoded: usize,
    first: Vec<StereoSample, REPORT_LEN>,
    non_silent_frames: usize,
    peak_left: u16,
    peak_right: u16,
}

impl VerificationReport {
    /// Consume `samples` and summarise them.
    pub fn from_samples(samples: impl IntoIterator<Item = StereoSample>) -> Self {
        let mut report = Self::default();
        for sample in samples {
            report.decoded = report.decoded.saturating_add(1);
            // Full once REPORT_LEN samples are kept; later ones are only counted.
            let _ = report.first.push(sample);
            if !sample.is_silent() {
                report.non_silent_frames = report.non_silent_frames.saturating_add(1);
            }
            report.peak_left = report.peak_left.max(sample.left.unsigned_abs());
            report.peak_right = report.peak_right.max(sample.right.unsigned_abs());
        }
        report
    }

    /// Decode and summarise the first `count` words of `words`.
    pub fn from_words(words: &[u32], count: usize) -> Self {
        Self::from_samples(decode_buffer(words, count))
    }

    /// Number of pairs decoded.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// The first [`REPORT_LEN`] pairs.
    pub fn first_samples(&self) -> &[StereoSample] {
        &self.first
    }

    /// Pairs with at least one non-zero lane.
    pub fn non_silent_frames(&self) -> usize {
        self.non_silent_frames
    }

    /// Largest magnitude seen on each lane, `(left, right)`.
    pub fn peak(&self) -> (u16, u16) {
        (self.peak_left, self.peak_right)
    }

    /// Print the first pairs and the summary.
    pub fn log(&self) {
        for (index, sample) in self.first.iter().enumerate() {
            info!("Sample[{}]: L={}, R={}", index, sample.left, sample.right);
        }
        info!(
            "{} pairs decoded, {} non-silent, peak L={} R={}",
            self.decoded,
            self.non_silent_frames,
            self.peak_left,
            self.peak_right
        );
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::buffers::impulse_test_vector;

    #[test]
    fn impulse_word_decodes_to_10000_pair() {
        let decoded: std::vec::Vec<StereoSample> = decode_buffer(&[0x2710_2710], 1).collect();
        assert_eq!(decoded, [StereoSample::new(10_000, 10_000)]);
    }

    #[test]
    fn decode_stops_at_count_or_buffer_end() {
        let words = [1u32, 2, 3];
        assert_eq!(decode_buffer(&words, 2).len(), 2);
        assert_eq!(decode_buffer(&words, 10).len(), 3);
        assert_eq!(decode_buffer(&words, 0).count(), 0);
    }

    #[test]
    fn decoding_is_restartable() {
        let words = [0x0001_0002u32, 0xFFFF_0000];
        let decoder = decode_buffer(&words, 2);
        let first: std::vec::Vec<_> = decoder.clone().collect();
        let second: std::vec::Vec<_> = decoder.collect();
        assert_eq!(first, second);
        assert_eq!(first[1], StereoSample::new(-1, 0));
    }

    #[test]
    fn report_of_impulse() {
        let words: std::vec::Vec<u32> = impulse_test_vector(128).map(SampleFrame::bits).collect();
        let report = VerificationReport::from_words(&words, 128);

        assert_eq!(report.decoded(), 128);
        assert_eq!(report.first_samples().len(), REPORT_LEN);
        assert_eq!(report.first_samples()[0], StereoSample::new(10_000, 10_000));
        assert_eq!(report.non_silent_frames(), 1);
        assert_eq!(report.peak(), (10_000, 10_000));
    }

    #[test]
    fn peak_handles_most_negative_sample() {
        let report = VerificationReport::from_samples([StereoSample::new(i16::MIN, 5)]);
        assert_eq!(report.peak(), (32_768, 5));
    }
}
