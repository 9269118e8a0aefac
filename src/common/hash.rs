use xxhash_rust::xxh3::{xxh3_64, Xxh3};

/// A hash that is stable across runs, used to key histogram buckets
/// when values are not mutually orderable. `std::hash::Hash` is not
/// enough here: the default hasher is randomly seeded per process, and
/// floats do not implement it at all.
pub trait StableHash {
    fn stable_hash(&self) -> u64;
}

impl StableHash for f64 {
    fn stable_hash(&self) -> u64 {
        // normalize so that -0.0 == 0.0 and every NaN shares a bucket
        let canonical = if self.is_nan() {
            f64::NAN.to_bits()
        } else if *self == 0.0 {
            0u64
        } else {
            self.to_bits()
        };
        xxh3_64(&canonical.to_le_bytes())
    }
}

impl StableHash for f32 {
    fn stable_hash(&self) -> u64 {
        (*self as f64).stable_hash()
    }
}

macro_rules! impl_stable_hash_int {
    ($($t:ty),*) => {
        $(impl StableHash for $t {
            fn stable_hash(&self) -> u64 {
                xxh3_64(&(*self as i64).to_le_bytes())
            }
        })*
    };
}

impl_stable_hash_int!(i64, i32, u32, usize);

impl StableHash for u64 {
    fn stable_hash(&self) -> u64 {
        xxh3_64(&self.to_le_bytes())
    }
}

impl StableHash for bool {
    fn stable_hash(&self) -> u64 {
        xxh3_64(&[*self as u8])
    }
}

impl StableHash for String {
    fn stable_hash(&self) -> u64 {
        xxh3_64(self.as_bytes())
    }
}

impl StableHash for &str {
    fn stable_hash(&self) -> u64 {
        xxh3_64(self.as_bytes())
    }
}

impl<V: StableHash> StableHash for Option<V> {
    fn stable_hash(&self) -> u64 {
        match self {
            None => xxh3_64(&[0u8]),
            Some(v) => {
                let mut hasher = Xxh3::with_seed(0);
                hasher.update(&[1u8]);
                hasher.update(&v.stable_hash().to_le_bytes());
                hasher.digest()
            }
        }
    }
}
