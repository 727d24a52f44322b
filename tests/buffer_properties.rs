//! Property tests untuk staging buffer
//!
//! Usage:
//!   cargo test --test buffer_properties

use eddy::core::{Buffer, DYNAMIC_THRESHOLD};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Write(Vec<u8>),
    Retrieve(usize),
    Reserve(usize),
    Clear,
    Swap,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => proptest::collection::vec(any::<u8>(), 0..150).prop_map(Op::Write),
        3 => (0usize..200).prop_map(Op::Retrieve),
        1 => (0usize..300).prop_map(Op::Reserve),
        1 => Just(Op::Clear),
        1 => Just(Op::Swap),
    ]
}

fn check_cursors(buffer: &Buffer) {
    assert!(buffer.prependable() + buffer.readable() + buffer.writable() == buffer.capacity());
    assert_eq!(buffer.readable_slice().len(), buffer.readable());
}

proptest! {
    #[test]
    fn length_prefixed_roundtrip(s in ".*") {
        let mut buffer = Buffer::new();
        buffer.write_length_and_string(&s);
        prop_assert_eq!(buffer.read_length_and_string().unwrap(), s);
        prop_assert_eq!(buffer.readable(), 0);
    }

    #[test]
    fn terminated_roundtrip(s in "[^\\x00]*") {
        let mut buffer = Buffer::new();
        buffer.write_string(&s);
        buffer.write_u8(0);
        prop_assert_eq!(buffer.read_string().unwrap(), s);
        prop_assert_eq!(buffer.readable(), 1);
    }

    /// Buffer vs model `Vec<u8>`: isi readable selalu sama, cursor selalu valid,
    /// promosi tidak pernah mundur.
    #[test]
    fn operations_match_model(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let mut buffer = Buffer::new();
        let mut model: Vec<u8> = Vec::new();
        let mut other = Buffer::new();
        let mut other_model: Vec<u8> = Vec::new();

        for op in ops {
            let was_dynamic = buffer.is_dynamic();
            match op {
                Op::Write(data) => {
                    prop_assert_eq!(buffer.write(&data), data.len());
                    model.extend_from_slice(&data);
                }
                Op::Retrieve(n) => {
                    let n = n.min(buffer.readable());
                    buffer.retrieve(n);
                    model.drain(..n);
                }
                Op::Reserve(n) => buffer.reserve(n),
                Op::Clear => {
                    buffer.clear();
                    model.clear();
                }
                Op::Swap => {
                    buffer.swap(&mut other);
                    std::mem::swap(&mut model, &mut other_model);
                    check_cursors(&other);
                    prop_assert_eq!(other.readable_slice(), other_model.as_slice());
                    continue;
                }
            }

            check_cursors(&buffer);
            prop_assert_eq!(buffer.readable_slice(), model.as_slice());
            if was_dynamic {
                prop_assert!(buffer.is_dynamic());
            }
        }
    }

    #[test]
    fn compaction_never_allocates(
        filled in 1usize..=DYNAMIC_THRESHOLD,
        consumed_ratio in 0.0f64..1.0,
    ) {
        let mut buffer = Buffer::new();
        let data: Vec<u8> = (0..filled).map(|i| i as u8).collect();
        buffer.write(&data);
        let consumed = ((filled as f64) * consumed_ratio) as usize;
        buffer.retrieve(consumed);

        let free = buffer.writable() + buffer.prependable();
        let before = buffer.readable_slice().to_vec();
        buffer.ensure_writable_bytes(free);

        prop_assert!(!buffer.is_dynamic());
        prop_assert_eq!(buffer.capacity(), DYNAMIC_THRESHOLD);
        prop_assert_eq!(buffer.readable_slice(), before.as_slice());
        prop_assert!(buffer.writable() >= free);
    }

    #[test]
    fn growth_keeps_content(
        data in proptest::collection::vec(any::<u8>(), 0..100),
        extra in 1usize..4096,
    ) {
        let mut buffer = Buffer::from_slice(&data);
        let wanted = buffer.writable() + buffer.prependable() + extra;
        buffer.ensure_writable_bytes(wanted);

        prop_assert!(buffer.is_dynamic());
        prop_assert!(buffer.writable() >= wanted);
        prop_assert_eq!(buffer.readable_slice(), data.as_slice());
    }

    #[test]
    fn clone_is_independent(
        data in proptest::collection::vec(any::<u8>(), 0..200),
        tail in proptest::collection::vec(any::<u8>(), 1..50),
    ) {
        let original = Buffer::from_slice(&data);
        let mut copy = original.clone();
        copy.write(&tail);
        if !data.is_empty() {
            copy.retrieve(1);
        }

        prop_assert_eq!(original.readable_slice(), data.as_slice());
    }
}

#[test]
fn transfer_leaves_valid_empty_source() {
    let mut source = Buffer::from_slice(&[7u8; 300]);
    let mut target = source.transfer();

    assert_eq!(target.readable(), 300);
    assert_eq!(source.readable(), 0);
    assert!(!source.is_dynamic());
    assert_eq!(source.writable(), DYNAMIC_THRESHOLD);

    // Source tetap bisa dipakai
    source.write(b"reused");
    assert_eq!(source.readable_slice(), b"reused");
    target.retrieve(300);
    assert!(target.is_dynamic());
}
