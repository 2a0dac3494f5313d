//! Co-registered, normalized multi-channel image stack.

use crate::domain::{ChannelMeta, Field};
use crate::fit::FitError;

/// N channel images of identical shape, already exposure-corrected and
/// divided by the reference channel.
///
/// The fitter only reads from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStack {
    channels: Vec<Field>,
    meta: Vec<ChannelMeta>,
}

impl ImageStack {
    /// Wrap already-normalized channel images.
    pub fn new(channels: Vec<Field>, meta: Vec<ChannelMeta>) -> Result<Self, FitError> {
        let Some(first) = channels.first() else {
            return Err(FitError::EmptyStack);
        };
        let shape = first.shape();
        for (index, ch) in channels.iter().enumerate() {
            if ch.shape() != shape {
                return Err(FitError::ShapeMismatch {
                    channel: index,
                    expected: shape,
                    found: ch.shape(),
                });
            }
        }
        if meta.len() != channels.len() {
            return Err(FitError::ChannelMismatch {
                expected: channels.len(),
                found: meta.len(),
            });
        }
        Ok(Self { channels, meta })
    }

    /// Normalize raw channel images.
    ///
    /// Every channel is divided by its exposure time and then by the
    /// exposure-corrected reference channel. Pixels where the reference has no
    /// usable signal become 0 in every channel, which the fitter treats as
    /// missing data.
    pub fn normalize(
        raw: Vec<Field>,
        meta: Vec<ChannelMeta>,
        reference: usize,
    ) -> Result<Self, FitError> {
        let mut stack = Self::new(raw, meta)?;
        if reference >= stack.n_channels() {
            return Err(FitError::ChannelMismatch {
                expected: reference + 1,
                found: stack.n_channels(),
            });
        }
        for (index, (ch, m)) in stack.channels.iter_mut().zip(stack.meta.iter()).enumerate() {
            if !(m.exposure_time.is_finite() && m.exposure_time > 0.0) {
                return Err(FitError::BadExposure {
                    channel: index,
                    exposure: m.exposure_time,
                });
            }
            *ch /= m.exposure_time;
        }

        let norm = stack.channels[reference].clone();
        for ch in &mut stack.channels {
            ch.zip_apply(&norm, |v, n| {
                *v = if n.is_finite() && n > 0.0 { *v / n } else { 0.0 };
            });
        }
        Ok(stack)
    }

    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    /// `(rows, cols)` of every channel.
    pub fn shape(&self) -> (usize, usize) {
        self.channels[0].shape()
    }

    pub fn channels(&self) -> &[Field] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&Field> {
        self.channels.get(index)
    }

    pub fn meta(&self) -> &[ChannelMeta] {
        &self.meta
    }

    /// Copy the observed vector at `(row, col)` into `out`.
    pub fn pixel_into(&self, row: usize, col: usize, out: &mut [f64]) {
        for (o, ch) in out.iter_mut().zip(self.channels.iter()) {
            *o = ch[(row, col)];
        }
    }
}
