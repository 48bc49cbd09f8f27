//! Typed bitfields within a 32-bit register word.

use core::marker::PhantomData;

/// A value that occupies a bitfield.
///
/// `into_bits` produces the raw value, right-aligned. `from_bits`
/// returns `None` if the raw value doesn't describe a `Self`.
pub trait FieldValue: Copy {
    /// Convert to raw bits.
    fn into_bits(self) -> u32;
    /// Convert from raw bits, right-aligned and already masked.
    fn from_bits(bits: u32) -> Option<Self>;
}

impl FieldValue for u32 {
    fn into_bits(self) -> u32 {
        self
    }
    fn from_bits(bits: u32) -> Option<Self> {
        Some(bits)
    }
}

impl FieldValue for bool {
    fn into_bits(self) -> u32 {
        self as u32
    }
    fn from_bits(bits: u32) -> Option<Self> {
        Some(bits != 0)
    }
}

/// A bitfield of `mask << shift` within a 32-bit word, holding a `V`.
///
/// `mask` is right-aligned: a two-bit field has mask `0b11`, no matter
/// where it lives in the word.
pub struct Field<V> {
    mask: u32,
    shift: u32,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for Field<V> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<V> Copy for Field<V> {}

impl<V> core::fmt::Debug for Field<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Field")
            .field("mask", &self.mask)
            .field("shift", &self.shift)
            .finish()
    }
}

impl<V> Field<V> {
    /// Describe a field of `mask` bits starting at bit `shift`.
    pub const fn new(mask: u32, shift: u32) -> Self {
        assert!(shift < 32);
        assert!(mask.leading_zeros() >= shift);
        Self {
            mask,
            shift,
            _value: PhantomData,
        }
    }

    /// The field mask, in place.
    pub const fn mask(&self) -> u32 {
        self.mask << self.shift
    }

    /// The field position.
    pub const fn shift(&self) -> u32 {
        self.shift
    }

    /// Read the raw, right-aligned field bits from `word`.
    pub const fn read_bits(&self, word: u32) -> u32 {
        (word >> self.shift) & self.mask
    }

    /// Replace the field bits of `word` with `bits`.
    ///
    /// Bits that don't fit in the field are discarded.
    pub const fn write_bits(&self, word: u32, bits: u32) -> u32 {
        (word & !self.mask()) | ((bits & self.mask) << self.shift)
    }
}

impl<V: FieldValue> Field<V> {
    /// Write `value` into the field, leaving all other bits of `word` alone.
    ///
    /// `value` must fit in the field. Debug builds check this; release
    /// builds truncate, like the hardware would.
    pub fn set(&self, word: &mut u32, value: V) {
        let bits = value.into_bits();
        debug_assert!(
            bits & !self.mask == 0,
            "value {:#x} exceeds field mask {:#x}",
            bits,
            self.mask
        );
        *word = self.write_bits(*word, bits);
    }

    /// Read the field from `word`.
    pub fn get(&self, word: u32) -> Option<V> {
        V::from_bits(self.read_bits(word))
    }
}

#[cfg(test)]
mod tests {
    use super::Field;

    const NIBBLE: Field<u32> = Field::new(0xF, 8);
    const FLAG: Field<bool> = Field::new(0b1, 31);

    #[test]
    fn set_touches_only_the_field() {
        let mut word = 0xFFFF_FFFF;
        NIBBLE.set(&mut word, 0x5);
        assert_eq!(word, 0xFFFF_F5FF);
        assert_eq!(NIBBLE.get(word), Some(0x5));

        let mut word = 0;
        NIBBLE.set(&mut word, 0xA);
        assert_eq!(word, 0x0000_0A00);
    }

    #[test]
    fn every_value_survives() {
        for seed in [0u32, 0xFFFF_FFFF, 0xA5A5_A5A5, 0x1234_5678] {
            for value in 0..=0xF {
                let mut word = seed;
                NIBBLE.set(&mut word, value);
                assert_eq!(NIBBLE.get(word), Some(value));
                assert_eq!(word & !NIBBLE.mask(), seed & !NIBBLE.mask());
            }
        }
    }

    #[test]
    fn top_bit() {
        let mut word = 0;
        FLAG.set(&mut word, true);
        assert_eq!(word, 1 << 31);
        assert_eq!(FLAG.get(word), Some(true));
        FLAG.set(&mut word, false);
        assert_eq!(word, 0);
    }

    #[test]
    fn write_bits_truncates() {
        assert_eq!(NIBBLE.write_bits(0, 0x1F), 0xF00);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn oversized_value_asserts() {
        let mut word = 0;
        NIBBLE.set(&mut word, 0x10);
    }
}
