//! Host batched kernel: the literal container scenarios, worker-count
//! invariance, and a scaled-down large scan.

use densebit::{batch::host, setops, Bitset, BitsetPack, SetOp};

fn pack_with(nbits: usize, slots: &[&[usize]]) -> BitsetPack {
    let mut pack = BitsetPack::new(nbits, slots.len());
    for (i, indices) in slots.iter().enumerate() {
        let mut b = Bitset::new(nbits);
        b.set_many(indices);
        pack.put(i, &b);
    }
    pack
}

#[test]
fn container_batched_intersection_count() {
    let a = pack_with(65536, &[&[1, 3], &[1, 3, 7]]);
    let b = pack_with(65536, &[&[3, 5], &[3, 5, 7]]);
    assert_eq!(host::count_matrix(SetOp::Intersection, &a, &b, 0), vec![1, 1, 1, 2]);
}

#[test]
fn matrix_matches_pairwise_algebra() {
    let a = pack_with(2048, &[&[0, 1, 2047], &[100], &[]]);
    let b = pack_with(2048, &[&[1, 100], &[2047]]);
    for op in SetOp::ALL {
        let matrix = host::count_matrix(op, &a, &b, 2);
        for i in 0..a.nelem() {
            for j in 0..b.nelem() {
                let expected = setops::count(op, Some(&a.get(i)), Some(&b.get(j)));
                assert_eq!(
                    matrix[i * b.nelem() + j] as u64,
                    expected,
                    "{} at ({i},{j})",
                    op.name()
                );
            }
        }
    }
}

#[test]
fn large_scan_counts_and_worker_invariance() {
    // One probe with a long prefix run against many identical references
    // carrying a narrow band inside the prefix.
    const NREFS: usize = 20_000;
    let mut probe = Bitset::new(1024);
    probe.set_range(0, 516);

    let mut probes = BitsetPack::new(1024, 1);
    probes.put(0, &probe);

    let mut band = Bitset::new(1024);
    band.set_range(512, 516);
    let mut refs = BitsetPack::new(1024, NREFS);
    for j in 0..NREFS {
        refs.put(j, &band);
    }

    let serial = host::count_matrix(SetOp::Intersection, &probes, &refs, 1);
    assert_eq!(serial.len(), NREFS);
    assert!(serial.iter().all(|&c| c == 5), "every reference overlaps in exactly 5 bits");
    assert_eq!(serial.iter().copied().max(), Some(5));

    let parallel = host::count_matrix(SetOp::Intersection, &probes, &refs, 0);
    assert_eq!(serial, parallel, "worker counts 1 and N must agree");
}

#[test]
fn tall_and_wide_matrices_agree_with_transpose() {
    // count(op, a[i], b[j]) for symmetric ops must equal the transposed run.
    let a = pack_with(512, &[&[0, 5], &[1], &[2, 3, 4]]);
    let b = pack_with(512, &[&[5], &[0, 1, 2]]);
    for op in [SetOp::Union, SetOp::Intersection, SetOp::SymmetricDifference] {
        let ab = host::count_matrix(op, &a, &b, 2);
        let ba = host::count_matrix(op, &b, &a, 2);
        for i in 0..a.nelem() {
            for j in 0..b.nelem() {
                assert_eq!(
                    ab[i * b.nelem() + j],
                    ba[j * a.nelem() + i],
                    "{} at ({i},{j})",
                    op.name()
                );
            }
        }
    }
}

#[test]
fn caller_buffer_form() {
    let a = pack_with(128, &[&[0], &[1]]);
    let b = pack_with(128, &[&[0, 1]]);
    let mut out = vec![-1i32; 2];
    host::count_matrix_into(SetOp::Union, &a, &b, 1, &mut out);
    assert_eq!(out, vec![2, 2]);
}

#[test]
fn single_cell_matrix() {
    let a = pack_with(64, &[&[0, 1, 2]]);
    let b = pack_with(64, &[&[2, 3]]);
    assert_eq!(host::count_matrix(SetOp::Difference, &a, &b, 1), vec![2]);
}

#[test]
#[should_panic(expected = "hard cap")]
fn worker_cap_is_enforced() {
    let a = BitsetPack::new(64, 1);
    let b = BitsetPack::new(64, 1);
    let _ = host::count_matrix(SetOp::Union, &a, &b, 1025);
}

#[test]
#[should_panic(expected = "element length mismatch")]
fn mismatched_containers_are_fatal() {
    let a = BitsetPack::new(64, 1);
    let b = BitsetPack::new(128, 1);
    let _ = host::count_matrix(SetOp::Union, &a, &b, 1);
}
