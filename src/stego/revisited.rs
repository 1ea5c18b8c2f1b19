//! LSB matching revisited.
//!
//! Samples are taken in pairs of horizontal neighbours, `(x, x + 1)` for even
//! `x`, and each selected pair carries two message bits. The first bit is the
//! parity of the left sample, the second is the coupling
//! `f(a, b) = (a / 2 + b) mod 2` of the pair. At most one sample of a pair
//! moves, by one step.
use rand::Rng;

use super::{EmbedReport, parity};
use crate::sampling::Sampler;

/// Second bit carried by a pair.
///
/// The halving rounds toward zero, so `coupling` of the value below `0` is
/// taken as `coupling(0, b)`; callers pass `a.saturating_sub(1)` for it.
const fn coupling(a: u8, b: u8) -> u8
{
    (a >> 1).wrapping_add(b) & 1
}

/// One step up or down; the extremes stay where they are instead of
/// bouncing back.
const fn nudge(value: u8, increment: bool) -> u8
{
    if increment
    {
        value.saturating_add(1)
    }
    else
    {
        value.saturating_sub(1)
    }
}

/// Embeds into the interleaved `samples` of an image `width` pixels wide with
/// `channels` samples per pixel.
///
/// Every channel of a pixel pair is an independent pair. An odd last column
/// has no partner and is never touched.
pub(super) fn embed<R: Rng>(
    samples: &mut [u8],
    width: usize,
    channels: usize,
    sampler: &mut Sampler<R>,
) -> EmbedReport
{
    let mut report = EmbedReport {
        samples: samples.len(),
        ..EmbedReport::default()
    };

    let row_len = width * channels;
    if row_len == 0
    {
        return report;
    }

    for row in samples.chunks_exact_mut(row_len)
    {
        for pair in row.chunks_exact_mut(2 * channels)
        {
            let (left, right) = pair.split_at_mut(channels);
            for (xi, xj) in left.iter_mut().zip(right.iter_mut())
            {
                if !sampler.select()
                {
                    continue;
                }

                report.selected += 1;
                let (before_i, before_j) = (*xi, *xj);
                embed_pair(xi, xj, sampler);
                report.changed += usize::from(*xi != before_i)
                    + usize::from(*xj != before_j);
            }
        }
    }

    report
}

/// Embeds two drawn bits into one selected pair.
fn embed_pair<R: Rng>(xi: &mut u8, xj: &mut u8, sampler: &mut Sampler<R>)
{
    let mi = sampler.message_bit();
    let mj = sampler.message_bit();

    if mi == parity(*xi)
    {
        if mj != coupling(*xi, *xj)
        {
            *xj = nudge(*xj, sampler.increment());
        }
    }
    else if mj == coupling(xi.saturating_sub(1), *xj)
    {
        *xi = xi.saturating_sub(1);
    }
    else
    {
        *xi = xi.saturating_add(1);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::sampling::rng_from_seed;

    /// Replays the draws of [`embed`] over single-channel `cover` rows and
    /// returns the bits each pair was meant to carry.
    fn replay_bits(
        cover: &[u8],
        width: usize,
        seed: u64,
        probability: f64,
    ) -> Vec<Option<(u8, u8)>>
    {
        let mut replay = Sampler::new(rng_from_seed(Some(seed)), probability);
        let mut bits = Vec::new();
        for row in cover.chunks_exact(width)
        {
            for pair in row.chunks_exact(2)
            {
                let (xi, xj) = (pair[0], pair[1]);
                if !replay.select()
                {
                    bits.push(None);
                    continue;
                }
                let mi = replay.message_bit();
                let mj = replay.message_bit();
                if mi == parity(xi) && mj != coupling(xi, xj)
                {
                    replay.increment();
                }
                bits.push(Some((mi, mj)));
            }
        }
        bits
    }

    #[test]
    fn coupling_matches_definition()
    {
        for a in 0..=255u8
        {
            for b in [0u8, 1, 2, 127, 254, 255]
            {
                let expected = (u32::from(a) / 2 + u32::from(b)) % 2;
                assert_eq!(u32::from(coupling(a, b)), expected);
            }
        }
    }

    #[test]
    fn selected_pairs_decode_to_their_bits()
    {
        const WIDTH: usize = 16;
        // keep away from 0 and 255 so no step is clamped
        let cover: Vec<u8> = (0..WIDTH * 32)
            .map(|index| u8::try_from(2 + index * 7 % 250).expect("in range"))
            .collect();
        let mut stego = cover.clone();

        let bits = replay_bits(&cover, WIDTH, 17, 0.8);
        let mut sampler = Sampler::new(rng_from_seed(Some(17)), 0.8);
        embed(&mut stego, WIDTH, 1, &mut sampler);

        let pairs = cover.chunks_exact(2).zip(stego.chunks_exact(2));
        for ((before, after), bits) in pairs.zip(&bits)
        {
            match bits
            {
                Some((mi, mj)) =>
                {
                    assert_eq!(parity(after[0]), *mi);
                    assert_eq!(coupling(after[0], after[1]), *mj);
                },
                None => assert_eq!(before, after),
            }
        }
    }

    #[test]
    fn at_most_one_sample_per_pair_moves_by_one()
    {
        let mut rng = rng_from_seed(Some(3));
        let mut cover = vec![0u8; 3 * 20 * 10];
        rand::Rng::fill(&mut rng, cover.as_mut_slice());
        let mut stego = cover.clone();

        let mut sampler = Sampler::new(rng_from_seed(Some(4)), 1.0);
        let report = embed(&mut stego, 20, 3, &mut sampler);

        assert_eq!(report.selected, 3 * 10 * 10);
        let pixels = cover.chunks_exact(6).zip(stego.chunks_exact(6));
        for (before, after) in pixels
        {
            for channel in 0..3
            {
                let left = before[channel].abs_diff(after[channel]);
                let right = before[channel + 3].abs_diff(after[channel + 3]);
                assert!(left + right <= 1, "pair moved by {left} and {right}");
            }
        }
    }

    #[test]
    fn odd_last_column_is_untouched()
    {
        const WIDTH: usize = 5;
        let cover = vec![100u8; WIDTH * 40];
        let mut stego = cover.clone();

        let mut sampler = Sampler::new(rng_from_seed(Some(9)), 1.0);
        let report = embed(&mut stego, WIDTH, 1, &mut sampler);

        assert_eq!(report.selected, 2 * 40);
        assert!(report.changed > 0);
        for row in stego.chunks_exact(WIDTH)
        {
            assert_eq!(row[WIDTH - 1], 100);
        }
    }

    #[test]
    fn extremes_are_clamped()
    {
        for value in [0u8, 255]
        {
            let mut samples = vec![value; 2_000];
            let mut sampler = Sampler::new(rng_from_seed(Some(12)), 1.0);
            embed(&mut samples, 20, 1, &mut sampler);

            assert!(samples.iter().all(|&sample| sample.abs_diff(value) <= 1));
        }
    }
}
