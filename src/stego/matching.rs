//! LSB matching.
//!
//! A selected sample whose parity already equals the message bit is left
//! alone. Otherwise it moves one step up or down at random, which fixes the
//! parity without the pairs-of-values artifact of plain replacement.
use rand::Rng;

use super::{EmbedReport, parity, step};
use crate::sampling::Sampler;

/// Embeds into every channel sample independently.
pub(super) fn embed<R: Rng>(
    samples: &mut [u8],
    sampler: &mut Sampler<R>,
) -> EmbedReport
{
    let mut report = EmbedReport {
        samples: samples.len(),
        ..EmbedReport::default()
    };

    for sample in samples.iter_mut()
    {
        if !sampler.select()
        {
            continue;
        }

        report.selected += 1;
        if sampler.message_bit() == parity(*sample)
        {
            continue;
        }

        *sample = step(*sample, sampler.increment());
        report.changed += 1;
    }

    report
}
