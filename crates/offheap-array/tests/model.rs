//! Integration test: arrays against a `Vec` model.
//!
//! A seeded random operation sequence is applied to an array and to a
//! `Vec` side by side; after every step the two must agree. Property tests
//! then pin down the resize and copy contracts for arbitrary inputs.

use offheap_array::{Array, ArrayError, CollectArray};
use offheap_test_utils::{CountingAllocator, FailingAllocator};
use rand::prelude::*;
use rand::rngs::ChaCha8Rng;
use std::rc::Rc;

// ── Seeded soak ──────────────────────────────────────────────────

fn assert_matches_model(array: &Array<u32, &CountingAllocator>, model: &[u32]) {
    assert_eq!(array.len(), model.len());
    assert_eq!(array.as_slice(), model);
}

#[test]
fn random_operations_match_vec_model() {
    let counting = CountingAllocator::new();
    let mut rng = ChaCha8Rng::seed_from_u64(0x0ff_4ea9);
    let mut array = Array::<u32, _>::new_in(16, &counting).unwrap();
    let mut model = vec![0u32; 16];

    for _ in 0..2000 {
        match rng.random_range(0..6) {
            0 | 1 => {
                let index = rng.random_range(0..model.len() + 4);
                let value = rng.random::<u32>();
                let result = array.set(index, value);
                if index < model.len() {
                    assert_eq!(result, Ok(()));
                    model[index] = value;
                } else {
                    assert!(matches!(result, Err(ArrayError::IndexOutOfBounds { .. })));
                }
            }
            2 => {
                let index = rng.random_range(0..model.len() + 4);
                assert_eq!(array.get(index).ok(), model.get(index).copied());
            }
            3 => {
                let new_len = rng.random_range(0..64);
                array.resize(new_len).unwrap();
                model.resize(new_len, 0);
            }
            4 => {
                let value = rng.random_range(0..4);
                array.fill(value).unwrap();
                model.iter_mut().for_each(|v| *v = value);
            }
            _ => {
                let src: Vec<u32> = (0..rng.random_range(0..32)).map(|_| rng.random()).collect();
                let copied = array.copy_from(&src).unwrap();
                model[..copied].copy_from_slice(&src[..copied]);
            }
        }
        assert_matches_model(&array, &model);
    }

    drop(array);
    assert_eq!(counting.live_blocks(), 0);
    assert_eq!(counting.unknown_frees(), 0);
}

#[test]
fn random_failures_never_corrupt_contents() {
    let failing = FailingAllocator::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut array = Array::<u64, _>::from_fn_in(8, |i| i as u64, &failing).unwrap();
    let mut model: Vec<u64> = (0..8).collect();

    for _ in 0..200 {
        if rng.random_bool(0.3) {
            failing.fail_next();
        }
        let new_len = rng.random_range(1..40);
        match array.resize(new_len) {
            Ok(()) => model.resize(new_len, 0),
            Err(ArrayError::OutOfMemory { requested }) => assert_eq!(requested, new_len * 8),
            Err(other) => panic!("unexpected error: {other}"),
        }
        failing.reset();
        assert_eq!(array.as_slice(), model.as_slice());
    }
}

#[test]
fn indirect_values_are_released_exactly_once() {
    let tracked: Vec<Rc<u32>> = (0..16).map(Rc::new).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut array = Array::<Option<Rc<u32>>>::new(8).unwrap();

    for _ in 0..500 {
        let len = array.len();
        match rng.random_range(0..3) {
            0 if len > 0 => {
                let pick = &tracked[rng.random_range(0..tracked.len())];
                array.set(rng.random_range(0..len), Some(Rc::clone(pick))).unwrap();
            }
            1 => array.resize(rng.random_range(0..24)).unwrap(),
            _ => {
                let copy = array.copy().unwrap();
                assert_eq!(copy.iter().collect::<Vec<_>>(), array.iter().collect::<Vec<_>>());
            }
        }
        let held: usize = tracked.iter().map(|rc| Rc::strong_count(rc) - 1).sum();
        let slots = array.iter().filter(Option::is_some).count();
        assert_eq!(held, slots);
    }

    array.dispose();
    assert!(tracked.iter().all(|rc| Rc::strong_count(rc) == 1));
}

// ── Properties ───────────────────────────────────────────────────

#[cfg(not(miri))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn resize_keeps_prefix_and_zeroes_suffix(
            values in proptest::collection::vec(any::<i32>(), 0..128),
            new_len in 0usize..256,
        ) {
            let mut array = values.iter().copied().collect_array().unwrap();
            array.resize(new_len).unwrap();
            prop_assert_eq!(array.len(), new_len);
            let kept = values.len().min(new_len);
            prop_assert_eq!(&array.as_slice()[..kept], &values[..kept]);
            prop_assert!(array.as_slice()[kept..].iter().all(|&v| v == 0));
        }

        #[test]
        fn copy_round_trips_through_slices(
            values in proptest::collection::vec(any::<u16>(), 0..64),
            len in 0usize..96,
        ) {
            let mut array = Array::<u16>::new(len).unwrap();
            let written = array.copy_from(&values).unwrap();
            prop_assert_eq!(written, len.min(values.len()));
            let mut out = vec![0u16; values.len()];
            let read = array.copy_to(&mut out).unwrap();
            prop_assert_eq!(read, written);
            prop_assert_eq!(&out[..read], &values[..read]);
        }

        #[test]
        fn collected_strings_match_input(
            words in proptest::collection::vec("[a-z]{0,8}", 0..40),
        ) {
            let array = words.clone().into_iter().collect_array().unwrap();
            prop_assert_eq!(array.iter().collect::<Vec<_>>(), words);
        }

        #[test]
        fn get_is_checked_for_any_index(len in 0usize..64, index in any::<usize>()) {
            let array = Array::<u8>::new(len).unwrap();
            prop_assert_eq!(array.get(index).is_ok(), index < len);
        }
    }
}
