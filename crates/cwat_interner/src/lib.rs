use std::num::NonZeroU32;
use std::ops::Index;

use ahash::RandomState;
use hashbrown::hash_table::Entry;
use hashbrown::HashTable;

/// An interned string. Only meaningful together with the [`Interner`] that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Istr(NonZeroU32);

#[derive(Default)]
pub struct Interner {
    random_state: RandomState,
    lookup: HashTable<Slot>,

    strings: Vec<Box<str>>,
}

#[derive(Clone, Copy)]
struct Slot {
    index: usize,
    hash: u64,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Istr {
        let hash = self.random_state.hash_one(s);

        let entry = self.lookup.entry(
            hash,
            |entry| &*self.strings[entry.index] == s,
            |entry| entry.hash,
        );

        let index = match entry {
            Entry::Occupied(entry) => entry.get().index,
            Entry::Vacant(entry) => {
                let index = self.strings.len();
                self.strings.push(s.into());
                entry.insert(Slot { index, hash });
                index
            }
        };

        let n = u32::try_from(index + 1).expect("too many interned strings");
        Istr(NonZeroU32::new(n).expect("index + 1 is never zero"))
    }

    pub fn get(&self, istr: Istr) -> Option<&str> {
        let index = istr.0.get() as usize - 1;
        self.strings.get(index).map(|s| &**s)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Index<Istr> for Interner {
    type Output = str;

    /// # Panics
    /// Panics if `istr` was not created by this interner.
    fn index(&self, istr: Istr) -> &Self::Output {
        self.get(istr).expect("string not in interner")
    }
}
