//! Property tests for the differentiable kernels.

use proptest::prelude::*;
use svmeta::kernel::{
    ExponentialRbfKernel, Kernel, LinearKernel, NormalRbfKernel, PolynomialKernel, RationalKernel,
    SigmoidKernel, SvmKernel,
};

fn arb_kernel() -> impl Strategy<Value = SvmKernel> {
    prop_oneof![
        Just(SvmKernel::from(LinearKernel::new())),
        (2u32..4, 0.5..1.5f64, 0.5..1.5f64)
            .prop_map(|(d, a, c)| PolynomialKernel::new(f64::from(d), a, c).into()),
        (0.5..2.0f64).prop_map(|s| NormalRbfKernel::new(s).unwrap().into()),
        (0.5..2.0f64).prop_map(|s| ExponentialRbfKernel::new(s).unwrap().into()),
        (0.1..0.5f64, -0.5..0.5f64).prop_map(|(a, c)| SigmoidKernel::new(a, c).into()),
        (0.5..2.0f64).prop_map(|c| RationalKernel::new(c).unwrap().into()),
    ]
}

fn arb_points() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..4).prop_flat_map(|dim| {
        (
            proptest::collection::vec(-2.0..2.0f64, dim),
            proptest::collection::vec(-2.0..2.0f64, dim),
        )
    })
}

fn distance(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| (a - b) * (a - b)).sum::<f64>().sqrt()
}

fn close(analytic: f64, numeric: f64) -> bool {
    (analytic - numeric).abs() <= 1e-4 * (1.0 + analytic.abs())
}

const STEP: f64 = 1e-6;

proptest! {
    /// Property: K(x, y) == K(y, x)
    #[test]
    fn prop_kernel_is_symmetric(kernel in arb_kernel(), (x, y) in arb_points()) {
        let forward = kernel.value(&x, &y);
        let backward = kernel.value(&y, &x);
        prop_assert!((forward - backward).abs() <= 1e-12 * (1.0 + forward.abs()));
    }

    /// Property: the gradient matches central differences of the value
    #[test]
    fn prop_gradient_matches_finite_differences(kernel in arb_kernel(), (x, y) in arb_points()) {
        // The exponential kernel is not differentiable at x == y
        prop_assume!(!matches!(kernel, SvmKernel::ExponentialRbf(_)) || distance(&x, &y) > 0.1);

        let gradient = kernel.gradient(&x, &y);
        prop_assert_eq!(gradient.len(), x.len());
        for i in 0..x.len() {
            let mut plus = x.clone();
            let mut minus = x.clone();
            plus[i] += STEP;
            minus[i] -= STEP;
            let numeric = (kernel.value(&plus, &y) - kernel.value(&minus, &y)) / (2.0 * STEP);
            prop_assert!(
                close(gradient[i], numeric),
                "{} gradient[{}]: {} vs {}", kernel.name(), i, gradient[i], numeric
            );
        }
    }

    /// Property: the Hessian matches central differences of the gradient
    #[test]
    fn prop_hessian_matches_finite_differences(kernel in arb_kernel(), (x, y) in arb_points()) {
        prop_assume!(!matches!(kernel, SvmKernel::ExponentialRbf(_)) || distance(&x, &y) > 0.1);

        let hessian = kernel.hessian(&x, &y);
        prop_assert_eq!(hessian.dim(), x.len());
        for j in 0..x.len() {
            let mut plus = x.clone();
            let mut minus = x.clone();
            plus[j] += STEP;
            minus[j] -= STEP;
            let g_plus = kernel.gradient(&plus, &y);
            let g_minus = kernel.gradient(&minus, &y);
            for i in 0..x.len() {
                let numeric = (g_plus[i] - g_minus[i]) / (2.0 * STEP);
                prop_assert!(
                    close(hessian.get(i, j), numeric),
                    "{} hessian[{}][{}]: {} vs {}", kernel.name(), i, j, hessian.get(i, j), numeric
                );
                prop_assert_eq!(hessian.get(i, j), hessian.get(j, i));
            }
        }
    }

    /// Property: set_parameter accepts exactly what parameter() returns
    #[test]
    fn prop_parameter_round_trip(kernel in arb_kernel()) {
        let mut copy = kernel.clone();
        let parameter = kernel.parameter();
        prop_assert_eq!(parameter.len(), kernel.parameter_description().len());
        copy.set_parameter(&parameter).unwrap();
        prop_assert_eq!(&copy, &kernel);

        let mut too_long = parameter.clone();
        too_long.push(1.0);
        prop_assert!(copy.set_parameter(&too_long).is_err());
    }
}
