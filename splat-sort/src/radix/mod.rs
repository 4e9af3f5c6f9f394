//! LSD radix sort over the key/index grid, four bits per pass.
//!
//! Every pass runs for each digit in ascending order: count the digit into
//! the prefix chain, then scatter that digit's elements to
//! `bucket_base + rank` in the opposite grid. Scan and placement both follow
//! slot order, which keeps each pass stable.

mod prefix_sum;

pub use prefix_sum::{BucketPrefixSum, DigitSelector, key_digit};

use bevy::log::debug;
use constants::sorting::{MAX_PASS_COUNT, MIN_PASS_COUNT, RADIX_BITS, RADIX_BUCKETS};

use crate::error::{Result, SortError};
use crate::keys::{KeyIndexGrid, key_bits};
use crate::raster::{BlendMode, PointVertex, draw_fullscreen, draw_points, morton_decode};

/// Owns both ping-pong grids and the prefix resources. Sized once and
/// reused for every sort.
#[derive(Debug, Clone)]
pub struct RadixSortEngine {
    grids: [KeyIndexGrid; 2],
    /// Index into `grids` of the grid holding the current data.
    current: usize,
    prefix: BucketPrefixSum,
}

impl RadixSortEngine {
    pub fn new(resolution: u32) -> Result<Self> {
        Ok(Self {
            grids: [
                KeyIndexGrid::new("key_values_a", resolution)?,
                KeyIndexGrid::new("key_values_b", resolution)?,
            ],
            current: 0,
            prefix: BucketPrefixSum::new(resolution)?,
        })
    }

    pub fn resolution(&self) -> u32 {
        self.grids[0].resolution()
    }

    pub fn capacity(&self) -> usize {
        self.grids[0].capacity()
    }

    /// Grid A, where keys are written before a sort.
    pub fn key_values_mut(&mut self) -> &mut KeyIndexGrid {
        &mut self.grids[0]
    }

    /// Sorted pairs, ascending by key. Valid until the next sort starts.
    pub fn sorted_output(&self) -> &KeyIndexGrid {
        &self.grids[0]
    }

    pub fn clear_output(&mut self) {
        self.grids[0].clear_to_padding();
        self.current = 0;
    }

    /// Sort the first `count` slots of grid A by their `pass_count * 4` bit key.
    pub fn sort(&mut self, pass_count: u8, count: usize) -> Result<()> {
        if !(MIN_PASS_COUNT..=MAX_PASS_COUNT).contains(&pass_count) {
            return Err(SortError::InvalidConfiguration(format!(
                "pass count {pass_count} outside {MIN_PASS_COUNT}..={MAX_PASS_COUNT}"
            )));
        }
        if count > self.capacity() {
            return Err(SortError::CapacityExceeded {
                count,
                capacity: self.capacity(),
            });
        }

        self.current = 0;
        if count == 0 {
            return Ok(());
        }

        let bits = key_bits(pass_count);
        for pass in 0..pass_count as u32 {
            let selector = DigitSelector {
                key_bits: bits,
                shift: pass * RADIX_BITS,
                count,
            };
            self.run_pass(&selector);
            self.current ^= 1;
        }

        if self.current != 0 {
            self.copy_back();
        }

        debug!("Radix sorted {} elements in {} passes", count, pass_count);
        Ok(())
    }

    fn run_pass(&mut self, selector: &DigitSelector) {
        let Self {
            grids,
            current,
            prefix,
        } = self;
        let (first, second) = grids.split_at_mut(1);
        let (source, destination) = if *current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        };

        destination.clear_to_padding();
        prefix.reset();

        for digit in 0..RADIX_BUCKETS as u32 {
            prefix.count_digit(source, selector, digit);

            let base = prefix.bucket_base(digit);
            let prefix = &*prefix;
            draw_points(
                destination.texture_mut(),
                selector.count,
                BlendMode::Replace,
                |slot| {
                    let texel = morton_decode(slot as u32);
                    let pair = source.texture().load(texel);
                    if selector.digit_at(slot, pair)? != digit {
                        return None;
                    }
                    Some(PointVertex {
                        texel: morton_decode(base + prefix.rank(texel)),
                        value: pair,
                    })
                },
            );
        }
        debug_assert_eq!(prefix.counted() as usize, selector.count);
    }

    /// Odd pass counts leave the result in grid B.
    fn copy_back(&mut self) {
        let (first, second) = self.grids.split_at_mut(1);
        let source = second[0].texture();
        draw_fullscreen(first[0].texture_mut(), |texel| source.load(texel));
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PADDING_PAIR;
    use crate::raster::{draw_fullscreen, morton_encode};

    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }
    }

    fn load_keys(engine: &mut RadixSortEngine, keys: &[u32], bits: u32) {
        let max = ((1u32 << bits) - 1) as f32;
        draw_fullscreen(engine.key_values_mut().texture_mut(), |texel| {
            let slot = morton_encode(texel) as usize;
            match keys.get(slot) {
                Some(&k) => [k as f32 / max, slot as f32],
                None => PADDING_PAIR,
            }
        });
    }

    fn random_keys(seed: u64, count: usize, bits: u32) -> Vec<u32> {
        let mut rng = XorShift(seed);
        (0..count)
            .map(|_| (rng.next() % (1u64 << bits)) as u32)
            .collect()
    }

    fn assert_sorted_permutation(engine: &RadixSortEngine, keys: &[u32], bits: u32) {
        let output = engine.sorted_output();
        let indices = output.sorted_indices(keys.len());
        assert_eq!(indices.len(), keys.len());

        let mut seen = vec![false; keys.len()];
        for &index in &indices {
            assert!(!seen[index as usize], "duplicate index {index}");
            seen[index as usize] = true;
        }

        let sorted_keys: Vec<u32> = indices.iter().map(|&i| keys[i as usize]).collect();
        assert!(sorted_keys.windows(2).all(|w| w[0] <= w[1]));

        let max = ((1u32 << bits) - 1) as f32;
        for (slot, [key, index]) in output.pairs(keys.len()).enumerate() {
            assert_eq!(key, keys[index as usize] as f32 / max, "slot {slot}");
        }
    }

    #[test]
    fn sorts_random_keys_for_every_pass_count() {
        for pass_count in MIN_PASS_COUNT..=MAX_PASS_COUNT {
            let bits = key_bits(pass_count);
            let keys = random_keys(0x9E37_79B9 + pass_count as u64, 200, bits);
            let mut engine = RadixSortEngine::new(16).unwrap();
            load_keys(&mut engine, &keys, bits);

            engine.sort(pass_count, keys.len()).unwrap();
            assert_sorted_permutation(&engine, &keys, bits);
        }
    }

    #[test]
    fn full_grid_with_many_duplicates() {
        let bits = key_bits(2);
        let keys: Vec<u32> = random_keys(7, 256, 3);
        let mut engine = RadixSortEngine::new(16).unwrap();
        load_keys(&mut engine, &keys, bits);

        engine.sort(2, 256).unwrap();
        assert_sorted_permutation(&engine, &keys, bits);
    }

    #[test]
    fn equal_keys_keep_slot_order_within_one_sort() {
        let bits = key_bits(3);
        let keys = [5, 9, 5, 1, 5, 9];
        let mut engine = RadixSortEngine::new(4).unwrap();
        load_keys(&mut engine, &keys, bits);

        engine.sort(3, keys.len()).unwrap();
        assert_eq!(engine.sorted_output().sorted_indices(6), vec![3, 0, 2, 4, 1, 5]);
    }

    #[test]
    fn sorting_sorted_input_keeps_key_order() {
        let bits = key_bits(4);
        let mut keys = random_keys(42, 100, bits);
        keys.sort_unstable();
        let mut engine = RadixSortEngine::new(16).unwrap();
        load_keys(&mut engine, &keys, bits);

        engine.sort(4, keys.len()).unwrap();
        let first = engine.sorted_output().keys(keys.len());
        engine.sort(4, keys.len()).unwrap();
        assert_eq!(engine.sorted_output().keys(keys.len()), first);
        assert_sorted_permutation(&engine, &keys, bits);
    }

    #[test]
    fn odd_and_even_pass_counts_end_in_grid_a() {
        let keys = [3, 2, 1, 0];
        for pass_count in [3u8, 4] {
            let bits = key_bits(pass_count);
            let mut engine = RadixSortEngine::new(2).unwrap();
            load_keys(&mut engine, &keys, bits);
            engine.sort(pass_count, 4).unwrap();
            assert_eq!(engine.sorted_output().sorted_indices(4), vec![3, 2, 1, 0]);
        }
    }

    #[test]
    fn zero_and_one_elements() {
        let mut engine = RadixSortEngine::new(4).unwrap();
        engine.clear_output();
        engine.sort(3, 0).unwrap();
        assert!(engine.sorted_output().sorted_indices(16).is_empty());

        load_keys(&mut engine, &[77], key_bits(3));
        engine.sort(3, 1).unwrap();
        assert_eq!(engine.sorted_output().load_slot(0), [77.0 / 4095.0, 0.0]);
        assert_eq!(engine.sorted_output().load_slot(1), PADDING_PAIR);
    }

    #[test]
    fn rejects_bad_pass_count_and_capacity() {
        let mut engine = RadixSortEngine::new(2).unwrap();
        assert!(matches!(
            engine.sort(5, 1),
            Err(SortError::InvalidConfiguration(_))
        ));
        assert_eq!(
            engine.sort(2, 5),
            Err(SortError::CapacityExceeded {
                count: 5,
                capacity: 4
            })
        );
    }
}
