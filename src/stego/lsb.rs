//! Plain LSB replacement.
//!
//! A selected sample has its least significant bit overwritten with the
//! message bit. Nothing else constrains the edit.
use rand::Rng;

use super::{EmbedReport, with_parity};
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
        let embedded = with_parity(*sample, sampler.message_bit());
        if embedded != *sample
        {
            report.changed += 1;
            *sample = embedded;
        }
    }

    report
}
