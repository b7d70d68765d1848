//! Pairwise set algebra: algebraic laws, count agreement, and the literal
//! intersection-count scenario.

use densebit::{setops, Bitset, SetOp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn bits(nbits: usize, indices: &[usize]) -> Bitset {
    let mut b = Bitset::new(nbits);
    b.set_many(indices);
    b
}

fn random_bitset(rng: &mut StdRng, nbits: usize) -> Bitset {
    let bytes: Vec<u8> = (0..densebit::buffer_size(nbits)).map(|_| rng.gen()).collect();
    Bitset::from_bytes(nbits, &bytes)
}

#[test]
fn basic_intersection_count_scenario() {
    let s = bits(1024, &[42, 100]);
    let t = bits(1024, &[42, 200]);
    assert_eq!(setops::intersection_count(Some(&s), Some(&t)), 1);
    assert_eq!(setops::union_count(Some(&s), Some(&t)), 3);
    assert_eq!(setops::symmetric_difference_count(Some(&s), Some(&t)), 2);
    assert_eq!(setops::difference_count(Some(&s), Some(&t)), 1);
}

#[test]
fn idempotence() {
    let s = bits(777, &[0, 100, 776]);
    assert_eq!(setops::union(Some(&s), Some(&s)), s);
    assert_eq!(setops::intersection(Some(&s), Some(&s)), s);

    // The same laws hold for distinct-but-equal operands.
    let twin = s.clone();
    assert_eq!(setops::union(Some(&s), Some(&twin)), s);
    assert_eq!(setops::intersection(Some(&s), Some(&twin)), s);
}

#[test]
fn commutativity() {
    let mut rng = StdRng::seed_from_u64(0xD15EA5E);
    for nbits in [64, 65, 1000] {
        let s = random_bitset(&mut rng, nbits);
        let t = random_bitset(&mut rng, nbits);
        assert_eq!(setops::union(Some(&s), Some(&t)), setops::union(Some(&t), Some(&s)));
        assert_eq!(
            setops::intersection(Some(&s), Some(&t)),
            setops::intersection(Some(&t), Some(&s))
        );
        assert_eq!(
            setops::symmetric_difference(Some(&s), Some(&t)),
            setops::symmetric_difference(Some(&t), Some(&s))
        );
    }
}

#[test]
fn count_agreement_randomized() {
    let mut rng = StdRng::seed_from_u64(42);
    for nbits in [1, 7, 8, 9, 63, 64, 65, 128, 1 << 16] {
        let s = random_bitset(&mut rng, nbits);
        let t = random_bitset(&mut rng, nbits);
        for op in SetOp::ALL {
            let materialized = setops::apply(op, Some(&s), Some(&t)).count();
            let counted = setops::count(op, Some(&s), Some(&t));
            assert_eq!(counted, materialized, "{} at length {nbits}", op.name());
        }
    }
}

#[test]
fn difference_decomposition() {
    // s = (s \ t) ∪ (s ∩ t), and the two parts are disjoint.
    let mut rng = StdRng::seed_from_u64(7);
    let s = random_bitset(&mut rng, 4096);
    let t = random_bitset(&mut rng, 4096);

    let minus = setops::difference(Some(&s), Some(&t));
    let both = setops::intersection(Some(&s), Some(&t));
    assert_eq!(setops::union(Some(&minus), Some(&both)), s);
    assert_eq!(setops::intersection_count(Some(&minus), Some(&both)), 0);

    // Symmetric difference splits the same way.
    assert_eq!(
        setops::symmetric_difference_count(Some(&s), Some(&t)),
        setops::difference_count(Some(&s), Some(&t))
            + setops::difference_count(Some(&t), Some(&s))
    );
}

#[test]
fn results_preserve_capacity_and_padding() {
    let s = bits(67, &[0, 65, 66]);
    let t = bits(67, &[1, 66]);
    for op in SetOp::ALL {
        let r = setops::apply(op, Some(&s), Some(&t));
        assert_eq!(r.len(), 67, "{}", op.name());
        // A flipped copy of the result must count exactly the complement.
        let mut flipped = r.clone();
        flipped.flip_range(0, 66);
        assert_eq!(flipped.count(), 67 - r.count(), "{}", op.name());
    }
}

#[test]
fn strict_subset_quirk_against_disjoint_sets() {
    // Disjoint non-empty sets: neither is a proper subset of the other.
    let s = bits(128, &[0]);
    let t = bits(128, &[1]);
    assert!(!s.is_proper_subset(&t));
    assert!(!t.is_proper_subset(&s));
}
