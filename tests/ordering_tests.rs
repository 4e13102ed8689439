use proptest::prelude::*;
use rstest::rstest;
use stenoforge::biphoneme::GroupStats;
use stenoforge::ordering::{
    build_orderer, ExactOrderer, InsertionOrderer, OrderResult, OrdererKind, PhonemeOrderer,
};
use stenoforge::phonology::PositionGroup;

fn worked_example() -> GroupStats {
    GroupStats::from_pairs(
        PositionGroup::Onset,
        [
            ("t", "R", 4110.0),
            ("R", "t", 1822.0),
            ("d", "R", 2265.0),
            ("R", "d", 1339.0),
        ],
    )
}

#[rstest]
#[case(OrdererKind::Auto)]
#[case(OrdererKind::Insertion)]
#[case(OrdererKind::Exact)]
fn test_worked_example(#[case] kind: OrdererKind) {
    let result = build_orderer(kind, 16).order(&worked_example());
    assert_eq!(result.permutation, vec!["d", "t", "R"]);
    assert!((result.ordered_score - 6375.0).abs() < 1e-9);
    assert!((result.disordered_score + 3161.0).abs() < 1e-9);

    let lost: Vec<(&str, &str)> = result
        .disordered_pairs
        .iter()
        .map(|p| (p.first.as_str(), p.second.as_str()))
        .collect();
    assert_eq!(lost, vec![("R", "t"), ("R", "d")]);
}

#[test]
fn test_empty_group() {
    let stats = GroupStats::new(PositionGroup::Coda, Vec::new());
    for kind in [OrdererKind::Insertion, OrdererKind::Exact] {
        let result = build_orderer(kind, 16).order(&stats);
        assert!(result.permutation.is_empty());
        assert_eq!(result.ordered_score, 0.0);
        assert_eq!(result.disordered_score, 0.0);
    }
}

#[test]
fn test_unpaired_symbols_are_kept() {
    let stats = GroupStats::new(
        PositionGroup::Nucleus,
        vec!["a".to_string(), "i".to_string(), "u".to_string()],
    );
    let result = ExactOrderer::default().order(&stats);
    let mut perm = result.permutation.clone();
    perm.sort();
    assert_eq!(perm, vec!["a", "i", "u"]);
}

#[test]
fn test_exact_above_limit_falls_back() {
    let pairs: Vec<(String, String, f64)> = (0..6)
        .map(|i| (format!("p{}", i), format!("p{}", i + 1), 10.0 + i as f64))
        .collect();
    let stats = GroupStats::from_pairs(
        PositionGroup::Onset,
        pairs.iter().map(|(a, b, f)| (a.as_str(), b.as_str(), *f)),
    );
    let limited = ExactOrderer { limit: 3 }.order(&stats);
    let heuristic = InsertionOrderer::default().order(&stats);
    assert_eq!(limited, heuristic);
}

// --- STRATEGIES ---

const SYMBOLS: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

prop_compose! {
    fn arb_stats(max: usize)
        (n in 2..=max)
        (weights in prop::collection::vec(0u32..50, n * n), n in Just(n))
        -> GroupStats {
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in 0..n {
                let w = weights[i * n + j];
                if i != j && w > 0 {
                    pairs.push((SYMBOLS[i], SYMBOLS[j], w as f64));
                }
            }
        }
        GroupStats::from_pairs(PositionGroup::Onset, pairs)
    }
}

fn is_permutation(result: &OrderResult, stats: &GroupStats) -> bool {
    let mut perm = result.permutation.clone();
    perm.sort();
    perm == stats.alphabet
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_conservation(stats in arb_stats(8)) {
        for result in [
            InsertionOrderer::default().order(&stats),
            ExactOrderer::default().order(&stats),
        ] {
            prop_assert!(is_permutation(&result, &stats));
            prop_assert!(result.disordered_score <= 0.0);
            let total = result.ordered_score - result.disordered_score;
            prop_assert!((total - stats.total_pair_mass()).abs() < 1e-6);
        }
    }

    #[test]
    fn prop_exact_never_loses(stats in arb_stats(7)) {
        let exact = ExactOrderer::default().order(&stats);
        let heuristic = InsertionOrderer::default().order(&stats);
        prop_assert!(exact.ordered_score >= heuristic.ordered_score - 1e-6);
    }

    #[test]
    fn prop_deterministic(stats in arb_stats(8)) {
        let a = InsertionOrderer::default().order(&stats);
        let b = InsertionOrderer::default().order(&stats.clone());
        prop_assert_eq!(&a, &b);
        let c = ExactOrderer::default().order(&stats);
        let d = ExactOrderer::default().order(&stats);
        prop_assert_eq!(&c, &d);
    }
}
