//! Network weights and the quantized forward pass.

use super::{Accumulator, FV_SCALE, HIDDEN_SIZE, L1_SIZE, L2_SIZE, QA, QO, WEIGHT_SHIFT};

/// A loaded NNUE network. Weights are read-only after loading and shared
/// between search threads behind an `Arc`.
pub struct NnueNetwork {
    /// Feature transformer bias, one per accumulator lane
    pub(crate) ft_bias: Box<[i16; HIDDEN_SIZE]>,
    /// Feature transformer weights, one column of `HIDDEN_SIZE` per input
    /// feature
    pub(crate) ft_weights: Vec<[i16; HIDDEN_SIZE]>,
    /// Dense layer 1: `2 * HIDDEN_SIZE` inputs -> `L1_SIZE`
    pub(crate) l1_bias: [i32; L1_SIZE],
    pub(crate) l1_weights: Vec<i8>,
    /// Dense layer 2: `L1_SIZE` -> `L2_SIZE`
    pub(crate) l2_bias: [i32; L2_SIZE],
    pub(crate) l2_weights: Vec<i8>,
    /// Output neuron: `L2_SIZE` -> 1
    pub(crate) out_bias: i32,
    pub(crate) out_weights: [i8; L2_SIZE],
    /// File header fields, kept for `uci` diagnostics
    pub(crate) version: u32,
    pub(crate) net_hash: u32,
    pub(crate) description: String,
}

impl NnueNetwork {
    /// Weight column for one input feature.
    #[inline]
    pub(crate) fn feature_column(&self, feature: usize) -> &[i16; HIDDEN_SIZE] {
        &self.ft_weights[feature]
    }

    /// Network version from the file header.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Network hash from the file header.
    #[must_use]
    pub fn net_hash(&self) -> u32 {
        self.net_hash
    }

    /// Free-text description embedded in the file.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Run the dense layers over the two perspective accumulators and
    /// return centipawns from the side to move's point of view.
    ///
    /// `us` must be the side-to-move accumulator. Inputs are clipped to
    /// `[0, QA]`, each dense layer accumulates in 32 bits over its int8
    /// weights and requantizes with a right shift, and the output sum is
    /// divided down to centipawns.
    #[must_use]
    pub fn evaluate(&self, us: &Accumulator, them: &Accumulator) -> i32 {
        let mut input = [0i32; 2 * HIDDEN_SIZE];
        for (dst, &src) in input[..HIDDEN_SIZE].iter_mut().zip(us.values.iter()) {
            *dst = i32::from(src.clamp(0, QA));
        }
        for (dst, &src) in input[HIDDEN_SIZE..].iter_mut().zip(them.values.iter()) {
            *dst = i32::from(src.clamp(0, QA));
        }

        let mut a1 = [0i32; L1_SIZE];
        for (n, out) in a1.iter_mut().enumerate() {
            let row = &self.l1_weights[n * 2 * HIDDEN_SIZE..(n + 1) * 2 * HIDDEN_SIZE];
            let mut sum = self.l1_bias[n];
            for (&w, &x) in row.iter().zip(input.iter()) {
                sum += i32::from(w) * x;
            }
            *out = (sum >> WEIGHT_SHIFT).clamp(0, QO);
        }

        let mut a2 = [0i32; L2_SIZE];
        for (n, out) in a2.iter_mut().enumerate() {
            let row = &self.l2_weights[n * L1_SIZE..(n + 1) * L1_SIZE];
            let mut sum = self.l2_bias[n];
            for (&w, &x) in row.iter().zip(a1.iter()) {
                sum += i32::from(w) * x;
            }
            *out = (sum >> WEIGHT_SHIFT).clamp(0, QO);
        }

        let mut sum = self.out_bias;
        for (&w, &x) in self.out_weights.iter().zip(a2.iter()) {
            sum += i32::from(w) * x;
        }

        sum / FV_SCALE
    }

    /// Fresh accumulator containing only the bias, before any features.
    #[must_use]
    pub(crate) fn bias_accumulator(&self) -> Accumulator {
        Accumulator {
            values: *self.ft_bias,
        }
    }

    /// Zero-weight network for tests: evaluates everything to the output
    /// bias regardless of position.
    #[cfg(test)]
    pub(crate) fn zeroed_for_tests() -> Self {
        NnueNetwork {
            ft_bias: Box::new([0; HIDDEN_SIZE]),
            ft_weights: vec![[0; HIDDEN_SIZE]; super::INPUT_SIZE],
            l1_bias: [0; L1_SIZE],
            l1_weights: vec![0; L1_SIZE * 2 * HIDDEN_SIZE],
            l2_bias: [0; L2_SIZE],
            l2_weights: vec![0; L2_SIZE * L1_SIZE],
            out_bias: 0,
            out_weights: [0; L2_SIZE],
            version: 0,
            net_hash: 0,
            description: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_network_evaluates_to_bias() {
        let mut net = NnueNetwork::zeroed_for_tests();
        net.out_bias = 32 * FV_SCALE;
        let acc = net.bias_accumulator();
        assert_eq!(net.evaluate(&acc, &acc), 32);
    }

    #[test]
    fn test_negative_accumulator_lanes_are_clipped() {
        let mut net = NnueNetwork::zeroed_for_tests();
        // One l1 neuron passes through lane 0 of "us"
        net.l1_weights[0] = 1;
        net.out_weights[0] = 1;

        let mut us = net.bias_accumulator();
        let them = net.bias_accumulator();

        us.values[0] = -500;
        let negative = net.evaluate(&us, &them);

        us.values[0] = 0;
        let zero = net.evaluate(&us, &them);

        assert_eq!(negative, zero, "negative activations must clip to zero");
    }

    #[test]
    fn test_activation_ceiling() {
        let mut net = NnueNetwork::zeroed_for_tests();
        net.l1_weights[0] = 1;
        net.out_weights[0] = 1;

        let mut us = net.bias_accumulator();
        let them = net.bias_accumulator();

        us.values[0] = i16::MAX;
        let saturated = net.evaluate(&us, &them);

        us.values[0] = QA;
        let at_ceiling = net.evaluate(&us, &them);

        assert_eq!(saturated, at_ceiling, "inputs must clip at QA");
    }
}
