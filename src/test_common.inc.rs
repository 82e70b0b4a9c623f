    use crate::{rng_from_seed, simulate};

    fn mean(values: &[Interval]) -> f64 {
        values.iter().sum::<Interval>() as f64 / values.len() as f64
    }

    #[test]
    fn rejects_zero_average() {
        assert!(create(0).is_err());
    }

    #[test]
    fn reports_average() {
        let sampler = create(42).unwrap();
        assert_eq!(sampler.average(), 42.0);
    }

    #[test]
    fn sample_mean_close_to_average() {
        let sampler = create(10).unwrap();
        let mut rng = rng_from_seed(Some(1));
        let values = simulate(&sampler, 100_000, &mut rng);
        let m = mean(&values);
        assert!((m - 10.0).abs() < 0.5, "sample mean {} too far from 10", m);
    }

    #[test]
    fn large_average_mean() {
        let sampler = create(600).unwrap();
        let mut rng = rng_from_seed(Some(2));
        let values = simulate(&sampler, 20_000, &mut rng);
        let m = mean(&values);
        assert!((m - 600.0).abs() < 30.0, "sample mean {} too far from 600", m);
    }

    #[test]
    fn same_seed_same_intervals() {
        let sampler = create(100).unwrap();
        let first = simulate(&sampler, 5, &mut rng_from_seed(Some(7)));
        let second = simulate(&sampler, 5, &mut rng_from_seed(Some(7)));
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_count_is_empty() {
        let sampler = create(100).unwrap();
        assert!(simulate(&sampler, 0, &mut rng_from_seed(Some(7))).is_empty());
    }
