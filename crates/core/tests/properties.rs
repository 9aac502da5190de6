use proptest::prelude::*;

use evm_core::amplify::AmplificationPolicy;
use evm_core::pyramid::{build_laplacian, max_levels, reconstruct};
use evm_core::temporal::IirBandpass;
use evm_core::{ColorSpaceConverter, Frame};

fn frame_strategy() -> impl Strategy<Value = Frame> {
    (2usize..40, 2usize..40).prop_flat_map(|(w, h)| {
        prop::collection::vec(prop::array::uniform3(0.0f32..=1.0), w * h)
            .prop_map(move |data| Frame::from_vec(w, h, data).expect("sized buffer"))
    })
}

proptest! {
    #[test]
    fn laplacian_collapse_restores_frame(frame in frame_strategy(), pick in 0usize..8) {
        let max = max_levels(frame.width(), frame.height());
        let levels = 1 + pick % max;
        let pyramid = build_laplacian(&frame, levels).expect("levels within bounds");
        prop_assert_eq!(pyramid.depth(), levels);

        let restored = reconstruct(pyramid);
        prop_assert_eq!(restored.dims(), frame.dims());
        prop_assert!(restored.max_abs_diff(&frame) < 1e-4);
    }

    #[test]
    fn yiq_round_trip_is_lossless(frame in frame_strategy()) {
        let converter = ColorSpaceConverter::new();
        let back = converter.inverse(converter.forward(frame.clone()));
        prop_assert!(back.max_abs_diff(&frame) < 1e-5);
    }

    #[test]
    fn first_iir_band_is_zero(frame in frame_strategy(), r2 in 0.01f64..0.5) {
        let levels = max_levels(frame.width(), frame.height()).min(3);
        let pyramid = build_laplacian(&frame, levels).expect("levels within bounds");
        let mut filter = IirBandpass::new((r2 * 1.5).min(1.0), r2).expect("ordered rates");
        let band = filter.filter(&pyramid).expect("fresh filter");
        for level in band.iter() {
            prop_assert_eq!(level.min_max(), (0.0, 0.0));
        }
    }

    #[test]
    fn amplification_never_exceeds_alpha(
        alpha in 0.0f64..50.0,
        lambda_c in 1.0f64..64.0,
        w in 16usize..2048,
        h in 16usize..2048,
        depth in 1usize..8,
    ) {
        let policy = AmplificationPolicy::new(alpha, lambda_c).expect("valid policy");
        let factors = policy.level_factors(depth, w, h);
        prop_assert_eq!(factors.len(), depth + 1);
        prop_assert_eq!(factors[0], 0.0);
        prop_assert_eq!(factors[depth], 0.0);
        for f in factors {
            prop_assert!(f >= 0.0 && f <= alpha as f32);
        }
    }
}
