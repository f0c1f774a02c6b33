use crate::common::*;

/// Encode boxes as normalized center/size deltas against anchor boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxDeltaCodec {
    pub means: [f64; 4],
    pub stds: [f64; 4],
}

impl BoxDeltaCodec {
    pub fn new(means: [f64; 4], stds: [f64; 4]) -> Result<Self> {
        ensure!(
            means.iter().all(|value| value.is_finite()),
            "delta means must be finite"
        );
        ensure!(
            stds.iter().all(|&value| value.is_finite() && value > 0.0),
            "delta stds must be positive"
        );
        Ok(Self { means, stds })
    }

    /// Compute `[dx, dy, dw, dh]` of `target` relative to `anchor`.
    pub fn encode(&self, anchor: &Pascal<f64>, target: &Pascal<f64>) -> Result<[f64; 4]> {
        let [acx, acy, aw, ah] = anchor.cxcywh();
        let [tcx, tcy, tw, th] = target.cxcywh();
        ensure!(aw > 0.0 && ah > 0.0, "anchor box must have positive size");
        ensure!(tw > 0.0 && th > 0.0, "target box must have positive size");

        let raw = [
            (tcx - acx) / aw,
            (tcy - acy) / ah,
            (tw / aw).ln(),
            (th / ah).ln(),
        ];
        let mut deltas = [0.0; 4];
        izip!(&mut deltas, &raw, &self.means, &self.stds)
            .for_each(|(delta, &raw, &mean, &std)| *delta = (raw - mean) / std);
        Ok(deltas)
    }

    /// Apply `[dx, dy, dw, dh]` to `anchor`.
    pub fn decode(&self, anchor: &Pascal<f64>, deltas: [f64; 4]) -> Result<Pascal<f64>> {
        let [acx, acy, aw, ah] = anchor.cxcywh();
        let mut raw = [0.0; 4];
        izip!(&mut raw, &deltas, &self.means, &self.stds)
            .for_each(|(raw, &delta, &mean, &std)| *raw = delta * std + mean);
        let [dx, dy, dw, dh] = raw;

        let cx = acx + dx * aw;
        let cy = acy + dy * ah;
        let w = dw.exp() * aw;
        let h = dh.exp() * ah;
        Pascal::try_from_xyxy([cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0])
    }

    /// Decode a batch of deltas aligned with `anchors`.
    pub fn decode_all(
        &self,
        anchors: &BoxSet<Pascal<f64>>,
        deltas: &[[f64; 4]],
    ) -> Result<BoxSet<Pascal<f64>>> {
        ensure!(
            anchors.len() == deltas.len(),
            "the number of anchors {} does not match the number of deltas {}",
            anchors.len(),
            deltas.len()
        );
        anchors
            .iter()
            .zip(deltas)
            .map(|(anchor, &delta)| self.decode(anchor, delta))
            .collect::<Result<Vec<_>>>()
            .map(BoxSet::new)
    }
}

impl Default for BoxDeltaCodec {
    fn default() -> Self {
        Self {
            means: [0.0; 4],
            stds: [0.1, 0.1, 0.2, 0.2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn decode_shifts_and_scales() -> Result<()> {
        let codec = BoxDeltaCodec::default();
        let anchor = Pascal::from_xyxy([2.0, 2.0, 20.0, 6.0]);
        let decoded = codec.decode(&anchor, [0.1, 0.1, 0.1, 0.1])?;

        let scale = 0.02f64.exp();
        let [cx, cy, w, h] = decoded.cxcywh();
        assert_abs_diff_eq!(cx, 11.0 + 0.01 * 18.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cy, 4.0 + 0.01 * 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(w, 18.0 * scale, epsilon = 1e-9);
        assert_abs_diff_eq!(h, 4.0 * scale, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn encode_inverts_decode() -> Result<()> {
        let codec = BoxDeltaCodec::default();
        let anchor = Pascal::from_xyxy([4.0, 2.0, 8.0, 6.0]);
        let target = Pascal::from_xyxy([3.0, 1.5, 10.0, 9.0]);
        let deltas = codec.encode(&anchor, &target)?;
        let restored = codec.decode(&anchor, deltas)?;

        target
            .xyxy()
            .iter()
            .zip(restored.xyxy().iter())
            .for_each(|(&lhs, &rhs)| assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-9));
        Ok(())
    }

    #[test]
    fn degenerate_boxes_are_rejected() {
        let codec = BoxDeltaCodec::default();
        let anchor = Pascal::from_xyxy([4.0, 2.0, 4.0, 6.0]);
        let target = Pascal::from_xyxy([3.0, 1.5, 10.0, 9.0]);
        assert!(codec.encode(&anchor, &target).is_err());
        assert!(BoxDeltaCodec::new([0.0; 4], [0.1, 0.0, 0.2, 0.2]).is_err());
        assert!(codec
            .decode_all(&BoxSet::new(vec![target]), &[])
            .is_err());
    }
}
